//! Path and tree nodes produced by the resolvers.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::node_kind::{NodeKind, ROOT_NAME};

/// One element of an ancestor path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct PathNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: NodeKind,
}

impl PathNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        PathNode {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }

    pub fn root(id: impl Into<String>) -> Self {
        Self::new(id, ROOT_NAME, NodeKind::Root)
    }
}

impl Display for PathNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// A node of the organization tree with its directly attached policies and
/// all of its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrgNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: NodeKind,
    /// Names of policies attached to this node, not inherited ones.
    pub policies: Vec<String>,
    pub org_units: Vec<OrgNode>,
    pub accounts: Vec<OrgNode>,
}

impl OrgNode {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: NodeKind,
        policies: Vec<String>,
    ) -> Self {
        OrgNode {
            id: id.into(),
            name: name.into(),
            kind,
            policies,
            org_units: Vec::new(),
            accounts: Vec::new(),
        }
    }

    /// Pre-order traversal: the node, its organizational units, then its accounts.
    pub fn iter(&self) -> OrgNodeIter<'_> {
        OrgNodeIter { stack: vec![self] }
    }

    /// Find a node anywhere in this subtree by id.
    pub fn find(&self, id: &str) -> Option<&OrgNode> {
        self.iter().find(|node| node.id == id)
    }

    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    pub fn account_ids(&self) -> Vec<&str> {
        self.iter()
            .filter(|node| node.kind == NodeKind::Account)
            .map(|node| node.id.as_str())
            .collect()
    }
}

pub struct OrgNodeIter<'a> {
    stack: Vec<&'a OrgNode>,
}

impl<'a> Iterator for OrgNodeIter<'a> {
    type Item = &'a OrgNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Reversed so that org units pop before accounts, each in listing order.
        self.stack.extend(node.accounts.iter().rev());
        self.stack.extend(node.org_units.iter().rev());
        Some(node)
    }
}
