use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::directory::{DirectoryClient, DirectoryOperation, Paginator};
use crate::error::OrgError;
use crate::types::{NodeKind, PolicySummary, ROOT_NAME};

mod catalog;
mod path;
mod policies;
mod tree;

#[cfg(test)]
mod tests;

/// Resolves organization hierarchies and inherited policies against an
/// injected [`DirectoryClient`].
///
/// All operations are synchronous and fail fast: the first failed directory
/// call aborts the whole resolution and nothing partial is returned.
///
/// ```rust
/// use orgtree_core::{InMemoryDirectory, OrgResolver};
///
/// let directory = InMemoryDirectory::builder()
///     .root("r-ab12")
///     .organizational_unit("ou-ab12-11111111", "Workloads", "r-ab12")
///     .account("111111111111", "prod", "ou-ab12-11111111")
///     .build();
///
/// let resolver = OrgResolver::new(directory);
/// let names: Vec<String> = resolver
///     .resolve_path("111111111111")
///     .unwrap()
///     .into_iter()
///     .map(|node| node.name)
///     .collect();
/// assert_eq!(names, vec!["Root", "Workloads", "prod"]);
/// ```
#[derive(Debug, Clone)]
pub struct OrgResolver<D> {
    client: D,
    config: ResolverConfig,
}

impl<D: DirectoryClient> OrgResolver<D> {
    pub fn new(client: D) -> Self {
        OrgResolver {
            client,
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(client: D, config: ResolverConfig) -> Result<Self, OrgError> {
        config.validate()?;
        Ok(OrgResolver { client, config })
    }

    pub fn client(&self) -> &D {
        &self.client
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Display name of a node: the literal root name, or the describe call's name.
    fn node_name(&self, id: &str, kind: NodeKind) -> Result<String, OrgError> {
        match kind {
            NodeKind::Root => Ok(ROOT_NAME.to_string()),
            NodeKind::OrganizationalUnit => self
                .client
                .describe_organizational_unit(id)
                .map(|ou| ou.name)
                .map_err(|e| {
                    OrgError::directory(DirectoryOperation::DescribeOrganizationalUnit, id, e)
                }),
            NodeKind::Account => self
                .client
                .describe_account(id)
                .map(|account| account.name)
                .map_err(|e| OrgError::directory(DirectoryOperation::DescribeAccount, id, e)),
        }
    }

    /// The single parent of a non-root node.
    fn parent_of(&self, id: &str) -> Result<String, OrgError> {
        let mut parents = Paginator::new(|token| self.client.list_parents(id, token))
            .collect_all()
            .map_err(|e| OrgError::directory(DirectoryOperation::ListParents, id, e))?;

        if parents.len() != 1 {
            warn!(
                event = "Invariant",
                phase = "Parents",
                id,
                parents = parents.len()
            );
            return Err(OrgError::InvariantViolation(format!(
                "expected exactly one parent for {id}, found {}",
                parents.len()
            )));
        }
        let parent = parents.remove(0);
        debug!(event = "Walk", phase = "Parent", id, parent = %parent.id);
        Ok(parent.id)
    }

    /// Every policy of the configured type attached directly to `target`, across all pages.
    fn attached_policies(&self, target: &str) -> Result<Vec<PolicySummary>, OrgError> {
        let policy_type = self.config.policy_type;
        Paginator::new(|token| {
            self.client
                .list_policies_for_target(target, policy_type, token)
        })
        .collect_all()
        .map_err(|e| OrgError::directory(DirectoryOperation::ListPoliciesForTarget, target, e))
    }

    fn depth_exceeded(&self, operation: &str, start: &str) -> OrgError {
        warn!(
            event = "Invariant",
            phase = "Depth",
            operation,
            id = start,
            max_depth = self.config.max_depth
        );
        OrgError::InvariantViolation(format!(
            "{operation} from {start} exceeded {} levels",
            self.config.max_depth
        ))
    }
}
