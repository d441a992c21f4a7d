use itertools::Itertools;
use tracing::{debug, info};

use crate::directory::{DirectoryClient, DirectoryOperation};
use crate::error::OrgError;
use crate::metrics::{self, Operation};
use crate::types::{NodeKind, PolicyDocument, PolicySet, ResolvedPolicy, is_root_id};

use super::OrgResolver;

impl<D: DirectoryClient> OrgResolver<D> {
    /// Ids of every policy that applies to `target`, most specific first.
    ///
    /// Walks from the target up to the root collecting the policies attached
    /// at each level. A policy attached at several levels is reported once,
    /// at its first (closest to the target) position.
    pub fn effective_policy_ids(&self, target: &str) -> Result<Vec<String>, OrgError> {
        metrics::measure(Operation::EffectivePolicyIds, target, Vec::len, || {
            self.collect_effective_ids(target)
        })
    }

    /// Describe each policy and parse its document, keeping the order of `ids`.
    /// Repeated ids are described once.
    pub fn fetch_policy_contents<S: AsRef<str>>(&self, ids: &[S]) -> Result<PolicySet, OrgError> {
        let label = ids.iter().map(AsRef::<str>::as_ref).join(",");
        metrics::measure(Operation::FetchPolicyContents, &label, PolicySet::len, || {
            ids.iter()
                .map(AsRef::<str>::as_ref)
                .unique()
                .map(|id| self.describe_and_parse(id))
                .collect()
        })
    }

    /// The effective policies of `target` with their documents.
    pub fn effective_policies(&self, target: &str) -> Result<PolicySet, OrgError> {
        let ids = self.effective_policy_ids(target)?;
        self.fetch_policy_contents(&ids)
    }

    fn collect_effective_ids(&self, target: &str) -> Result<Vec<String>, OrgError> {
        NodeKind::classify(target)?;

        let mut ids = Vec::new();
        let mut current = target.to_string();
        let mut depth = 0;

        loop {
            if depth >= self.config.max_depth {
                return Err(self.depth_exceeded("policy walk", target));
            }

            let attached = self.attached_policies(&current)?;
            debug!(
                event = "EffectivePolicies",
                phase = "Level",
                id = %current,
                attached = attached.len()
            );
            ids.extend(attached.into_iter().map(|policy| policy.id));

            if is_root_id(&current) {
                break;
            }
            current = self.parent_of(&current)?;
            depth += 1;
        }

        let ids: Vec<String> = ids.into_iter().unique().collect();
        info!(
            event = "EffectivePolicies",
            phase = "Complete",
            id = target,
            levels = depth + 1,
            policies = ids.len()
        );
        Ok(ids)
    }

    pub(super) fn describe_and_parse(&self, id: &str) -> Result<ResolvedPolicy, OrgError> {
        let description = self
            .client
            .describe_policy(id)
            .map_err(|e| OrgError::directory(DirectoryOperation::DescribePolicy, id, e))?;
        let content = PolicyDocument::parse(id, &description.content)?;
        Ok(ResolvedPolicy {
            summary: description.summary,
            content,
        })
    }
}
