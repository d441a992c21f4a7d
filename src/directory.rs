//! The directory capability the resolvers are driven by.
//!
//! A [`DirectoryClient`] exposes the listing and describe calls of an
//! organizations service. List calls are token-paginated: each call returns a
//! [`Page`] and the caller passes the page's `next_token` back in to get the
//! next one. [`Paginator`] wraps a list call into a lazy iterator of pages.

use std::marker::PhantomData;
use std::sync::Arc;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::error::DirectoryError;
use crate::types::{NodeKind, PolicySummary, PolicyType};

/// Every call a [`DirectoryClient`] can be asked to make.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum DirectoryOperation {
    ListRoots,
    ListChildren,
    ListParents,
    ListPoliciesForTarget,
    ListPolicies,
    ListAccounts,
    DescribeOrganizationalUnit,
    DescribeAccount,
    DescribePolicy,
}

/// Child filter for [`DirectoryClient::list_children`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ChildType {
    OrganizationalUnit,
    Account,
}

impl From<ChildType> for NodeKind {
    fn from(child_type: ChildType) -> Self {
        match child_type {
            ChildType::OrganizationalUnit => NodeKind::OrganizationalUnit,
            ChildType::Account => NodeKind::Account,
        }
    }
}

/// A reference to a node returned by child and parent listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeRef {
    pub id: String,
    #[serde(rename = "Type")]
    pub kind: NodeKind,
}

impl NodeRef {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        NodeRef {
            id: id.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RootSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrganizationalUnit {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Result of [`DirectoryClient::describe_policy`]: the summary plus the raw,
/// unparsed document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDescription {
    #[serde(rename = "PolicySummary")]
    pub summary: PolicySummary,
    pub content: String,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Page { items, next_token }
    }

    /// A final page with no continuation.
    pub fn last(items: Vec<T>) -> Self {
        Page {
            items,
            next_token: None,
        }
    }
}

/// The organizations service as seen by the resolvers.
///
/// Implementations own transport, credentials, timeouts and retries; the
/// resolvers call each method at most once per page and treat any error as
/// fatal for the resolution in progress.
pub trait DirectoryClient {
    fn list_roots(&self, next_token: Option<&str>) -> Result<Page<RootSummary>, DirectoryError>;

    fn list_children(
        &self,
        parent_id: &str,
        child_type: ChildType,
        next_token: Option<&str>,
    ) -> Result<Page<NodeRef>, DirectoryError>;

    /// Parents of a node. In a well-formed directory this is exactly one entry
    /// for every non-root node.
    fn list_parents(
        &self,
        child_id: &str,
        next_token: Option<&str>,
    ) -> Result<Page<NodeRef>, DirectoryError>;

    fn list_policies_for_target(
        &self,
        target_id: &str,
        filter: PolicyType,
        next_token: Option<&str>,
    ) -> Result<Page<PolicySummary>, DirectoryError>;

    fn list_policies(
        &self,
        filter: PolicyType,
        next_token: Option<&str>,
    ) -> Result<Page<PolicySummary>, DirectoryError>;

    fn list_accounts(&self, next_token: Option<&str>) -> Result<Page<Account>, DirectoryError>;

    fn describe_organizational_unit(&self, id: &str)
    -> Result<OrganizationalUnit, DirectoryError>;

    fn describe_account(&self, id: &str) -> Result<Account, DirectoryError>;

    fn describe_policy(&self, id: &str) -> Result<PolicyDescription, DirectoryError>;
}

macro_rules! forward_directory_client {
    ($($wrapper:ty),+ $(,)?) => {$(
        impl<D: DirectoryClient + ?Sized> DirectoryClient for $wrapper {
            fn list_roots(&self, next_token: Option<&str>) -> Result<Page<RootSummary>, DirectoryError> {
                (**self).list_roots(next_token)
            }

            fn list_children(
                &self,
                parent_id: &str,
                child_type: ChildType,
                next_token: Option<&str>,
            ) -> Result<Page<NodeRef>, DirectoryError> {
                (**self).list_children(parent_id, child_type, next_token)
            }

            fn list_parents(
                &self,
                child_id: &str,
                next_token: Option<&str>,
            ) -> Result<Page<NodeRef>, DirectoryError> {
                (**self).list_parents(child_id, next_token)
            }

            fn list_policies_for_target(
                &self,
                target_id: &str,
                filter: PolicyType,
                next_token: Option<&str>,
            ) -> Result<Page<PolicySummary>, DirectoryError> {
                (**self).list_policies_for_target(target_id, filter, next_token)
            }

            fn list_policies(
                &self,
                filter: PolicyType,
                next_token: Option<&str>,
            ) -> Result<Page<PolicySummary>, DirectoryError> {
                (**self).list_policies(filter, next_token)
            }

            fn list_accounts(&self, next_token: Option<&str>) -> Result<Page<Account>, DirectoryError> {
                (**self).list_accounts(next_token)
            }

            fn describe_organizational_unit(
                &self,
                id: &str,
            ) -> Result<OrganizationalUnit, DirectoryError> {
                (**self).describe_organizational_unit(id)
            }

            fn describe_account(&self, id: &str) -> Result<Account, DirectoryError> {
                (**self).describe_account(id)
            }

            fn describe_policy(&self, id: &str) -> Result<PolicyDescription, DirectoryError> {
                (**self).describe_policy(id)
            }
        }
    )+};
}

forward_directory_client!(&D, Box<D>, Arc<D>);

/// Lazily walks a token-paginated listing, one page per `next()`.
///
/// Iteration ends after the page without a continuation token, or right
/// after the first error.
pub struct Paginator<T, F> {
    fetch: F,
    next_token: Option<String>,
    done: bool,
    _item: PhantomData<fn() -> T>,
}

impl<T, F> Paginator<T, F>
where
    F: FnMut(Option<&str>) -> Result<Page<T>, DirectoryError>,
{
    pub fn new(fetch: F) -> Self {
        Paginator {
            fetch,
            next_token: None,
            done: false,
            _item: PhantomData,
        }
    }

    /// Drain every page into a single vector, stopping at the first error.
    pub fn collect_all(self) -> Result<Vec<T>, DirectoryError> {
        self.flatten_ok().collect()
    }
}

impl<T, F> Iterator for Paginator<T, F>
where
    F: FnMut(Option<&str>) -> Result<Page<T>, DirectoryError>,
{
    type Item = Result<Vec<T>, DirectoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match (self.fetch)(self.next_token.as_deref()) {
            Ok(page) => {
                self.next_token = page.next_token;
                self.done = self.next_token.is_none();
                Some(Ok(page.items))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
