//! Exponential backoff around any [`DirectoryClient`].
//!
//! The resolvers never retry. Rate limiting is handled here, at the client
//! layer, by wrapping the client before handing it to the resolver:
//!
//! ```rust
//! use orgtree_core::{InMemoryDirectory, OrgResolver, RetryConfig, RetryingDirectory};
//!
//! let directory = InMemoryDirectory::builder().root("r-ab12").build();
//! let client = RetryingDirectory::new(directory, RetryConfig::default());
//! let resolver = OrgResolver::new(client);
//! assert_eq!(resolver.resolve_path("r-ab12").unwrap().len(), 1);
//! ```

use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::directory::{
    Account, ChildType, DirectoryClient, DirectoryOperation, NodeRef, OrganizationalUnit, Page,
    PolicyDescription, RootSummary,
};
use crate::error::{DirectoryError, DirectoryErrorCode, OrgError};
use crate::types::{PolicySummary, PolicyType};

/// Backoff settings for [`RetryingDirectory`].
///
/// The delay before retry `n` (starting at 0) is
/// `base_delay * 2^n + uniform(0, jitter)`, capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries for error codes listed in `retry_on`.
    pub max_retries: u32,
    /// Retries for throttling errors, which are always retryable.
    pub throttle_max_retries: u32,
    #[serde(with = "duration_millis")]
    pub base_delay: Duration,
    #[serde(with = "duration_millis")]
    pub max_delay: Duration,
    #[serde(with = "duration_millis")]
    pub jitter: Duration,
    /// Non-throttling codes that are worth retrying.
    pub retry_on: Vec<DirectoryErrorCode>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_retries: 8,
            throttle_max_retries: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            jitter: Duration::from_secs(1),
            retry_on: Vec::new(),
        }
    }
}

impl RetryConfig {
    /// No sleeping between attempts. Intended for tests.
    pub fn immediate() -> Self {
        RetryConfig {
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: Duration::ZERO,
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, OrgError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_retry_on(mut self, codes: impl IntoIterator<Item = DirectoryErrorCode>) -> Self {
        self.retry_on = codes.into_iter().collect();
        self
    }

    /// How many retries `err` is allowed, or `None` if it should not be retried.
    pub fn retry_budget(&self, err: &DirectoryError) -> Option<u32> {
        if err.is_throttling() {
            Some(self.throttle_max_retries)
        } else if self.retry_on.contains(&err.code) {
            Some(self.max_retries)
        } else {
            None
        }
    }

    /// Delay before the retry numbered `attempt`, without jitter.
    pub fn base_backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let jitter = self.jitter.mul_f64(rand::random::<f64>());
        (self.base_backoff(attempt) + jitter).min(self.max_delay)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// A [`DirectoryClient`] that retries throttled and configured failures with
/// exponential backoff before giving up with the last error.
#[derive(Debug)]
pub struct RetryingDirectory<D> {
    inner: D,
    config: RetryConfig,
}

impl<D: DirectoryClient> RetryingDirectory<D> {
    pub fn new(inner: D, config: RetryConfig) -> Self {
        RetryingDirectory { inner, config }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    fn call<T>(
        &self,
        operation: DirectoryOperation,
        target: &str,
        mut f: impl FnMut(&D) -> Result<T, DirectoryError>,
    ) -> Result<T, DirectoryError> {
        let mut attempt = 0;
        loop {
            match f(&self.inner) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(budget) = self.config.retry_budget(&err) else {
                        return Err(err);
                    };
                    if attempt >= budget {
                        warn!(
                            event = "Retry",
                            phase = "Exhausted",
                            operation = %operation,
                            id = target,
                            attempts = attempt + 1,
                            error = %err
                        );
                        return Err(err);
                    }
                    let delay = self.config.backoff(attempt);
                    warn!(
                        event = "Retry",
                        phase = "Backoff",
                        operation = %operation,
                        id = target,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

impl<D: DirectoryClient> DirectoryClient for RetryingDirectory<D> {
    fn list_roots(&self, next_token: Option<&str>) -> Result<Page<RootSummary>, DirectoryError> {
        self.call(DirectoryOperation::ListRoots, "", |c| c.list_roots(next_token))
    }

    fn list_children(
        &self,
        parent_id: &str,
        child_type: ChildType,
        next_token: Option<&str>,
    ) -> Result<Page<NodeRef>, DirectoryError> {
        self.call(DirectoryOperation::ListChildren, parent_id, |c| {
            c.list_children(parent_id, child_type, next_token)
        })
    }

    fn list_parents(
        &self,
        child_id: &str,
        next_token: Option<&str>,
    ) -> Result<Page<NodeRef>, DirectoryError> {
        self.call(DirectoryOperation::ListParents, child_id, |c| {
            c.list_parents(child_id, next_token)
        })
    }

    fn list_policies_for_target(
        &self,
        target_id: &str,
        filter: PolicyType,
        next_token: Option<&str>,
    ) -> Result<Page<PolicySummary>, DirectoryError> {
        self.call(DirectoryOperation::ListPoliciesForTarget, target_id, |c| {
            c.list_policies_for_target(target_id, filter, next_token)
        })
    }

    fn list_policies(
        &self,
        filter: PolicyType,
        next_token: Option<&str>,
    ) -> Result<Page<PolicySummary>, DirectoryError> {
        self.call(DirectoryOperation::ListPolicies, "", |c| {
            c.list_policies(filter, next_token)
        })
    }

    fn list_accounts(&self, next_token: Option<&str>) -> Result<Page<Account>, DirectoryError> {
        self.call(DirectoryOperation::ListAccounts, "", |c| c.list_accounts(next_token))
    }

    fn describe_organizational_unit(
        &self,
        id: &str,
    ) -> Result<OrganizationalUnit, DirectoryError> {
        self.call(DirectoryOperation::DescribeOrganizationalUnit, id, |c| {
            c.describe_organizational_unit(id)
        })
    }

    fn describe_account(&self, id: &str) -> Result<Account, DirectoryError> {
        self.call(DirectoryOperation::DescribeAccount, id, |c| c.describe_account(id))
    }

    fn describe_policy(&self, id: &str) -> Result<PolicyDescription, DirectoryError> {
        self.call(DirectoryOperation::DescribePolicy, id, |c| c.describe_policy(id))
    }
}
