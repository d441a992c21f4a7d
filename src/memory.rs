//! An in-process [`DirectoryClient`] backed by plain collections.
//!
//! Useful for tests, demos and offline snapshots of an organization. Build one
//! with [`InMemoryDirectory::builder`] or load a JSON fixture with
//! [`InMemoryDirectory::from_json_str`]:
//!
//! ```rust
//! use orgtree_core::InMemoryDirectory;
//!
//! let directory = InMemoryDirectory::from_json_str(r#"{
//!     "roots": ["r-ab12"],
//!     "organizational_units": [
//!         { "id": "ou-ab12-11111111", "name": "Workloads", "parent": "r-ab12" }
//!     ],
//!     "accounts": [
//!         { "id": "111111111111", "name": "prod", "parent": "ou-ab12-11111111" }
//!     ],
//!     "policies": [
//!         { "id": "p-FullAWSAccess", "name": "FullAWSAccess",
//!           "content": { "Version": "2012-10-17", "Statement": [] },
//!           "targets": ["r-ab12"] }
//!     ]
//! }"#).unwrap();
//! assert_eq!(directory.account_count(), 1);
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::directory::{
    Account, ChildType, DirectoryClient, DirectoryOperation, NodeRef, OrganizationalUnit, Page,
    PolicyDescription, RootSummary,
};
use crate::error::{DirectoryError, DirectoryErrorCode, OrgError};
use crate::types::{NodeKind, PolicySummary, PolicyType, ROOT_NAME};

/// One recorded call against an [`InMemoryDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryCall {
    pub operation: DirectoryOperation,
    /// The id the call was keyed by; empty for organization-wide listings.
    pub target: String,
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    operation: DirectoryOperation,
    target: Option<String>,
    error: DirectoryError,
    /// `None` fails forever.
    remaining: Option<usize>,
}

#[derive(Debug, Clone)]
struct StoredPolicy {
    summary: PolicySummary,
    content: String,
}

/// In-memory organization directory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    roots: Vec<RootSummary>,
    org_units: HashMap<String, OrganizationalUnit>,
    accounts: Vec<Account>,
    children: HashMap<String, Vec<NodeRef>>,
    parents: HashMap<String, Vec<String>>,
    policies: Vec<StoredPolicy>,
    attachments: HashMap<String, Vec<String>>,
    page_size: Option<usize>,
    failures: Mutex<Vec<InjectedFailure>>,
    calls: Mutex<Vec<DirectoryCall>>,
}

impl InMemoryDirectory {
    pub fn builder() -> InMemoryDirectoryBuilder {
        InMemoryDirectoryBuilder::default()
    }

    /// Load a directory from a JSON fixture.
    pub fn from_json_str(json: &str) -> Result<Self, OrgError> {
        let fixture: DirectoryFixture = serde_json::from_str(json)?;
        Ok(fixture.into_builder().build())
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Calls of one operation, in order.
    pub fn calls_for(&self, operation: DirectoryOperation) -> Vec<DirectoryCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.operation == operation)
            .collect()
    }

    pub fn reset_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn record(&self, operation: DirectoryOperation, target: &str) -> Result<(), DirectoryError> {
        debug!(event = "Directory", phase = "Call", operation = %operation, id = target);
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(DirectoryCall {
                operation,
                target: target.to_string(),
            });

        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        let hit = failures.iter_mut().find(|f| {
            f.operation == operation
                && f.target.as_deref().is_none_or(|t| t == target)
                && f.remaining != Some(0)
        });
        match hit {
            Some(failure) => {
                if let Some(remaining) = failure.remaining.as_mut() {
                    *remaining -= 1;
                }
                Err(failure.error.clone())
            }
            None => Ok(()),
        }
    }

    fn paginate<T: Clone>(&self, items: &[T], token: Option<&str>) -> Result<Page<T>, DirectoryError> {
        let start = match token {
            None => 0,
            Some(t) => t.parse::<usize>().map_err(|_| {
                DirectoryError::new(
                    DirectoryErrorCode::InvalidInput,
                    format!("invalid next token '{t}'"),
                )
            })?,
        };
        let size = self.page_size.unwrap_or(usize::MAX).max(1);
        let end = start.saturating_add(size).min(items.len());
        let page = items.get(start..end).unwrap_or_default().to_vec();
        let next_token = (end < items.len()).then(|| end.to_string());
        Ok(Page::new(page, next_token))
    }

    fn kind_of(&self, id: &str) -> NodeKind {
        if self.roots.iter().any(|r| r.id == id) {
            NodeKind::Root
        } else if self.org_units.contains_key(id) {
            NodeKind::OrganizationalUnit
        } else {
            NodeKind::Account
        }
    }

    fn is_known_target(&self, id: &str) -> bool {
        self.roots.iter().any(|r| r.id == id)
            || self.org_units.contains_key(id)
            || self.accounts.iter().any(|a| a.id == id)
    }

    fn policy(&self, id: &str) -> Option<&StoredPolicy> {
        self.policies.iter().find(|p| p.summary.id == id)
    }
}

impl DirectoryClient for InMemoryDirectory {
    fn list_roots(&self, next_token: Option<&str>) -> Result<Page<RootSummary>, DirectoryError> {
        self.record(DirectoryOperation::ListRoots, "")?;
        self.paginate(&self.roots, next_token)
    }

    fn list_children(
        &self,
        parent_id: &str,
        child_type: ChildType,
        next_token: Option<&str>,
    ) -> Result<Page<NodeRef>, DirectoryError> {
        self.record(DirectoryOperation::ListChildren, parent_id)?;
        if !self.is_known_target(parent_id) {
            return Err(DirectoryError::not_found(format!(
                "parent {parent_id} not found"
            )));
        }
        let kind = NodeKind::from(child_type);
        let children: Vec<NodeRef> = self
            .children
            .get(parent_id)
            .map(|all| all.iter().filter(|c| c.kind == kind).cloned().collect())
            .unwrap_or_default();
        self.paginate(&children, next_token)
    }

    fn list_parents(
        &self,
        child_id: &str,
        next_token: Option<&str>,
    ) -> Result<Page<NodeRef>, DirectoryError> {
        self.record(DirectoryOperation::ListParents, child_id)?;
        if !self.is_known_target(child_id) {
            return Err(DirectoryError::not_found(format!(
                "child {child_id} not found"
            )));
        }
        let parents: Vec<NodeRef> = self
            .parents
            .get(child_id)
            .map(|ids| {
                ids.iter()
                    .map(|id| NodeRef::new(id.clone(), self.kind_of(id)))
                    .collect()
            })
            .unwrap_or_default();
        self.paginate(&parents, next_token)
    }

    fn list_policies_for_target(
        &self,
        target_id: &str,
        filter: PolicyType,
        next_token: Option<&str>,
    ) -> Result<Page<PolicySummary>, DirectoryError> {
        self.record(DirectoryOperation::ListPoliciesForTarget, target_id)?;
        if !self.is_known_target(target_id) {
            return Err(DirectoryError::not_found(format!(
                "target {target_id} not found"
            )));
        }
        let attached: Vec<PolicySummary> = self
            .attachments
            .get(target_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.policy(id))
                    .filter(|p| p.summary.policy_type == filter)
                    .map(|p| p.summary.clone())
                    .collect()
            })
            .unwrap_or_default();
        self.paginate(&attached, next_token)
    }

    fn list_policies(
        &self,
        filter: PolicyType,
        next_token: Option<&str>,
    ) -> Result<Page<PolicySummary>, DirectoryError> {
        self.record(DirectoryOperation::ListPolicies, "")?;
        let all: Vec<PolicySummary> = self
            .policies
            .iter()
            .filter(|p| p.summary.policy_type == filter)
            .map(|p| p.summary.clone())
            .collect();
        self.paginate(&all, next_token)
    }

    fn list_accounts(&self, next_token: Option<&str>) -> Result<Page<Account>, DirectoryError> {
        self.record(DirectoryOperation::ListAccounts, "")?;
        self.paginate(&self.accounts, next_token)
    }

    fn describe_organizational_unit(
        &self,
        id: &str,
    ) -> Result<OrganizationalUnit, DirectoryError> {
        self.record(DirectoryOperation::DescribeOrganizationalUnit, id)?;
        self.org_units.get(id).cloned().ok_or_else(|| {
            DirectoryError::not_found(format!("organizational unit {id} not found"))
        })
    }

    fn describe_account(&self, id: &str) -> Result<Account, DirectoryError> {
        self.record(DirectoryOperation::DescribeAccount, id)?;
        self.accounts
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| DirectoryError::not_found(format!("account {id} not found")))
    }

    fn describe_policy(&self, id: &str) -> Result<PolicyDescription, DirectoryError> {
        self.record(DirectoryOperation::DescribePolicy, id)?;
        self.policy(id)
            .map(|p| PolicyDescription {
                summary: p.summary.clone(),
                content: p.content.clone(),
            })
            .ok_or_else(|| DirectoryError::not_found(format!("policy {id} not found")))
    }
}

/// Builder for [`InMemoryDirectory`]. Children and attachments keep insertion order.
#[derive(Debug, Default)]
pub struct InMemoryDirectoryBuilder {
    directory: InMemoryDirectory,
}

impl InMemoryDirectoryBuilder {
    pub fn root(mut self, id: impl Into<String>) -> Self {
        self.directory.roots.push(RootSummary {
            id: id.into(),
            name: ROOT_NAME.to_string(),
        });
        self
    }

    pub fn organizational_unit(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        parent: impl Into<String>,
    ) -> Self {
        let id = id.into();
        self.link(&id, NodeKind::OrganizationalUnit, parent.into());
        self.directory.org_units.insert(
            id.clone(),
            OrganizationalUnit {
                id,
                name: name.into(),
            },
        );
        self
    }

    pub fn account(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        parent: impl Into<String>,
    ) -> Self {
        self.push_account(id.into(), name.into(), parent.into(), None);
        self
    }

    pub fn policy(mut self, summary: PolicySummary, content: impl Into<String>) -> Self {
        self.directory.policies.push(StoredPolicy {
            summary,
            content: content.into(),
        });
        self
    }

    /// Shorthand for a service control policy.
    pub fn scp(self, id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.policy(
            PolicySummary::new(id, name, PolicyType::ServiceControlPolicy),
            content,
        )
    }

    /// Attach a policy to a target. Attaching twice makes the listing return it twice.
    pub fn attach(mut self, policy_id: impl Into<String>, target: impl Into<String>) -> Self {
        self.directory
            .attachments
            .entry(target.into())
            .or_default()
            .push(policy_id.into());
        self
    }

    /// Replace the parents reported for `child`, e.g. to model a corrupted directory.
    pub fn parents<I, S>(mut self, child: impl Into<String>, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directory
            .parents
            .insert(child.into(), parents.into_iter().map(Into::into).collect());
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.directory.page_size = Some(size);
        self
    }

    /// Make every call of `operation` (optionally only for `target`) fail.
    pub fn fail(
        self,
        operation: DirectoryOperation,
        target: Option<&str>,
        error: DirectoryError,
    ) -> Self {
        self.push_failure(operation, target, error, None)
    }

    /// Make the next `times` matching calls fail, then succeed.
    pub fn fail_times(
        self,
        operation: DirectoryOperation,
        target: Option<&str>,
        error: DirectoryError,
        times: usize,
    ) -> Self {
        self.push_failure(operation, target, error, Some(times))
    }

    pub fn build(self) -> InMemoryDirectory {
        self.directory
    }

    fn push_failure(
        self,
        operation: DirectoryOperation,
        target: Option<&str>,
        error: DirectoryError,
        remaining: Option<usize>,
    ) -> Self {
        self.directory
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(InjectedFailure {
                operation,
                target: target.map(str::to_string),
                error,
                remaining,
            });
        self
    }

    fn push_account(&mut self, id: String, name: String, parent: String, email: Option<String>) {
        self.link(&id, NodeKind::Account, parent);
        self.directory.accounts.push(Account { id, name, email });
    }

    fn link(&mut self, child: &str, kind: NodeKind, parent: String) {
        self.directory
            .children
            .entry(parent.clone())
            .or_default()
            .push(NodeRef::new(child, kind));
        self.directory
            .parents
            .insert(child.to_string(), vec![parent]);
    }
}

#[derive(Debug, Deserialize)]
struct DirectoryFixture {
    #[serde(default)]
    roots: Vec<String>,
    #[serde(default)]
    organizational_units: Vec<FixtureNode>,
    #[serde(default)]
    accounts: Vec<FixtureAccount>,
    #[serde(default)]
    policies: Vec<FixturePolicy>,
    page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct FixtureNode {
    id: String,
    name: String,
    parent: String,
}

#[derive(Debug, Deserialize)]
struct FixtureAccount {
    id: String,
    name: String,
    parent: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FixturePolicy {
    id: String,
    name: String,
    #[serde(default, rename = "type")]
    policy_type: PolicyType,
    description: Option<String>,
    #[serde(default)]
    aws_managed: bool,
    /// A JSON document, or a raw string stored verbatim.
    content: Value,
    #[serde(default)]
    targets: Vec<String>,
}

impl DirectoryFixture {
    fn into_builder(self) -> InMemoryDirectoryBuilder {
        let mut builder = InMemoryDirectory::builder();
        for root in self.roots {
            builder = builder.root(root);
        }
        for ou in self.organizational_units {
            builder = builder.organizational_unit(ou.id, ou.name, ou.parent);
        }
        for account in self.accounts {
            builder.push_account(account.id, account.name, account.parent, account.email);
        }
        for policy in self.policies {
            let content = match policy.content {
                Value::String(raw) => raw,
                other => other.to_string(),
            };
            let summary = PolicySummary {
                id: policy.id.clone(),
                name: policy.name,
                description: policy.description,
                policy_type: policy.policy_type,
                aws_managed: policy.aws_managed,
            };
            builder = builder.policy(summary, content);
            for target in policy.targets {
                builder = builder.attach(policy.id.clone(), target);
            }
        }
        if let Some(size) = self.page_size {
            builder = builder.page_size(size);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_directory() -> InMemoryDirectory {
        InMemoryDirectory::builder()
            .root("r-ab12")
            .organizational_unit("ou-ab12-11111111", "Workloads", "r-ab12")
            .organizational_unit("ou-ab12-22222222", "Sandbox", "r-ab12")
            .account("111111111111", "prod", "ou-ab12-11111111")
            .account("999999999999", "management", "r-ab12")
            .page_size(1)
            .build()
    }

    #[test]
    fn test_children_are_paginated_in_insertion_order() {
        let directory = small_directory();
        let first = directory
            .list_children("r-ab12", ChildType::OrganizationalUnit, None)
            .unwrap();
        assert_eq!(first.items, vec![NodeRef::new("ou-ab12-11111111", NodeKind::OrganizationalUnit)]);
        assert_eq!(first.next_token.as_deref(), Some("1"));

        let second = directory
            .list_children("r-ab12", ChildType::OrganizationalUnit, Some("1"))
            .unwrap();
        assert_eq!(second.items[0].id, "ou-ab12-22222222");
        assert!(second.next_token.is_none());

        let accounts = directory
            .list_children("r-ab12", ChildType::Account, None)
            .unwrap();
        assert_eq!(accounts.items, vec![NodeRef::new("999999999999", NodeKind::Account)]);
    }

    #[test]
    fn test_parents_report_kind() {
        let directory = small_directory();
        let parents = directory.list_parents("111111111111", None).unwrap();
        assert_eq!(
            parents.items,
            vec![NodeRef::new("ou-ab12-11111111", NodeKind::OrganizationalUnit)]
        );
        let root_parents = directory.list_parents("ou-ab12-22222222", None).unwrap();
        assert_eq!(root_parents.items[0].kind, NodeKind::Root);
    }

    #[test]
    fn test_invalid_token() {
        let directory = small_directory();
        let err = directory.list_accounts(Some("bogus")).unwrap_err();
        assert_eq!(err.code, DirectoryErrorCode::InvalidInput);
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let directory = small_directory();
        assert_eq!(
            directory.describe_account("222222222222").unwrap_err().code,
            DirectoryErrorCode::NotFound
        );
        assert_eq!(
            directory.list_parents("ou-ab12-99999999", None).unwrap_err().code,
            DirectoryErrorCode::NotFound
        );
    }

    #[test]
    fn test_failure_injection_counts_down() {
        let directory = InMemoryDirectory::builder()
            .root("r-ab12")
            .fail_times(
                DirectoryOperation::ListRoots,
                None,
                DirectoryError::throttling("rate exceeded"),
                2,
            )
            .build();
        assert!(directory.list_roots(None).is_err());
        assert!(directory.list_roots(None).is_err());
        assert_eq!(directory.list_roots(None).unwrap().items.len(), 1);
        assert_eq!(directory.calls_for(DirectoryOperation::ListRoots).len(), 3);
    }

    #[test]
    fn test_failure_injection_by_target() {
        let directory = InMemoryDirectory::builder()
            .root("r-ab12")
            .account("111111111111", "prod", "r-ab12")
            .account("222222222222", "dev", "r-ab12")
            .fail(
                DirectoryOperation::DescribeAccount,
                Some("222222222222"),
                DirectoryError::new(DirectoryErrorCode::AccessDenied, "denied"),
            )
            .build();
        assert!(directory.describe_account("111111111111").is_ok());
        assert!(directory.describe_account("222222222222").is_err());
    }

    #[test]
    fn test_policy_listing_filters_type() {
        let directory = InMemoryDirectory::builder()
            .root("r-ab12")
            .scp("p-scp", "DenyLeave", "{}")
            .policy(PolicySummary::new("p-tag", "Tags", PolicyType::TagPolicy), "{}")
            .attach("p-scp", "r-ab12")
            .attach("p-tag", "r-ab12")
            .build();
        let scps = directory
            .list_policies_for_target("r-ab12", PolicyType::ServiceControlPolicy, None)
            .unwrap();
        assert_eq!(scps.items.len(), 1);
        assert_eq!(scps.items[0].id, "p-scp");
        let tags = directory.list_policies(PolicyType::TagPolicy, None).unwrap();
        assert_eq!(tags.items[0].name, "Tags");
    }

    #[test]
    fn test_fixture_keeps_raw_string_content() {
        let directory = InMemoryDirectory::from_json_str(
            r#"{
                "roots": ["r-ab12"],
                "accounts": [{ "id": "111111111111", "name": "prod", "parent": "r-ab12", "email": "prod@example.com" }],
                "policies": [{ "id": "p-raw", "name": "Raw", "content": "not json", "targets": ["r-ab12"] }]
            }"#,
        )
        .unwrap();
        assert_eq!(directory.describe_policy("p-raw").unwrap().content, "not json");
        assert_eq!(
            directory.describe_account("111111111111").unwrap().email.as_deref(),
            Some("prod@example.com")
        );
    }

    #[test]
    fn test_fixture_rejects_invalid_json() {
        assert!(matches!(
            InMemoryDirectory::from_json_str("{"),
            Err(OrgError::Config(_))
        ));
    }
}
