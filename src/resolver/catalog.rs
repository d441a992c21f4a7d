use tracing::{debug, info, warn};

use crate::directory::{DirectoryClient, DirectoryOperation, Paginator};
use crate::error::OrgError;
use crate::metrics::{self, Operation};
use crate::types::PolicySet;

use super::OrgResolver;

impl<D: DirectoryClient> OrgResolver<D> {
    /// Every policy of the configured type in the organization, with its
    /// parsed document, in listing order.
    pub fn all_policies(&self) -> Result<PolicySet, OrgError> {
        let policy_type = self.config.policy_type;
        metrics::measure(
            Operation::AllPolicies,
            policy_type.as_ref(),
            PolicySet::len,
            || {
                let mut set = PolicySet::new();
                let pages = Paginator::new(|token| self.client.list_policies(policy_type, token));
                for page in pages {
                    let page = page.map_err(|e| {
                        OrgError::directory(DirectoryOperation::ListPolicies, policy_type.to_string(), e)
                    })?;
                    for summary in page {
                        set.insert(self.describe_and_parse(&summary.id)?);
                    }
                }
                info!(
                    event = "AllPolicies",
                    phase = "Complete",
                    policy_type = %policy_type,
                    policies = set.len()
                );
                Ok(set)
            },
        )
    }

    /// Id of the first account whose name is exactly `name`.
    ///
    /// Stops paging as soon as a match is found.
    pub fn find_account_id(&self, name: &str) -> Result<String, OrgError> {
        metrics::measure(Operation::FindAccountId, name, |_| 1, || {
            let pages = Paginator::new(|token| self.client.list_accounts(token));
            for page in pages {
                let page = page
                    .map_err(|e| OrgError::directory(DirectoryOperation::ListAccounts, name, e))?;
                if let Some(account) = page.into_iter().find(|a| a.name == name) {
                    debug!(event = "FindAccount", phase = "Match", name, id = %account.id);
                    return Ok(account.id);
                }
            }
            warn!(event = "FindAccount", phase = "Missing", name);
            Err(OrgError::AccountNotFound(name.to_string()))
        })
    }

    /// Id of the organization root.
    pub fn root_id(&self) -> Result<String, OrgError> {
        let pages = Paginator::new(|token| self.client.list_roots(token));
        for page in pages {
            let page = page.map_err(|e| OrgError::directory(DirectoryOperation::ListRoots, "", e))?;
            if let Some(root) = page.into_iter().next() {
                return Ok(root.id);
            }
        }
        Err(OrgError::InvariantViolation(
            "organization has no root".to_string(),
        ))
    }
}
