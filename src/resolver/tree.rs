use itertools::Itertools;
use tracing::{debug, info};

use crate::directory::{ChildType, DirectoryClient, DirectoryOperation, Paginator};
use crate::error::OrgError;
use crate::metrics::{self, Operation};
use crate::types::{NodeKind, OrgNode};

use super::OrgResolver;

impl<D: DirectoryClient> OrgResolver<D> {
    /// Build the complete subtree below `id`, with the policies attached
    /// directly to each node.
    ///
    /// Child organizational units come first, then child accounts, each in
    /// the directory's listing order. Accounts are leaves and trigger no
    /// child listings.
    pub fn build_tree(&self, id: &str) -> Result<OrgNode, OrgError> {
        metrics::measure(Operation::BuildTree, id, OrgNode::node_count, || {
            let tree = self.build_subtree(id, 0)?;
            info!(
                event = "BuildTree",
                phase = "Complete",
                id,
                nodes = tree.node_count()
            );
            Ok(tree)
        })
    }

    /// Build the tree of the whole organization, starting from its root.
    pub fn build_organization_tree(&self) -> Result<OrgNode, OrgError> {
        let root = self.root_id()?;
        self.build_tree(&root)
    }

    fn build_subtree(&self, id: &str, depth: usize) -> Result<OrgNode, OrgError> {
        if depth >= self.config.max_depth {
            return Err(self.depth_exceeded("tree build", id));
        }

        let kind = NodeKind::classify(id)?;
        let policies: Vec<String> = self
            .attached_policies(id)?
            .into_iter()
            .map(|policy| policy.name)
            .unique()
            .collect();
        let name = self.node_name(id, kind)?;
        debug!(
            event = "BuildTree",
            phase = "Visit",
            id,
            kind = %kind,
            depth,
            policies = policies.len()
        );

        let mut node = OrgNode::new(id, name, kind, policies);
        if kind.is_leaf() {
            return Ok(node);
        }

        node.org_units = self.build_children(id, ChildType::OrganizationalUnit, depth)?;
        node.accounts = self.build_children(id, ChildType::Account, depth)?;
        Ok(node)
    }

    fn build_children(
        &self,
        parent: &str,
        child_type: ChildType,
        depth: usize,
    ) -> Result<Vec<OrgNode>, OrgError> {
        let mut children = Vec::new();
        let pages = Paginator::new(|token| self.client.list_children(parent, child_type, token));
        for page in pages {
            let page =
                page.map_err(|e| OrgError::directory(DirectoryOperation::ListChildren, parent, e))?;
            for child in page {
                children.push(self.build_subtree(&child.id, depth + 1)?);
            }
        }
        Ok(children)
    }
}
