use tracing::{debug, info};

use crate::directory::DirectoryClient;
use crate::error::OrgError;
use crate::metrics::{self, Operation};
use crate::types::{NodeKind, PathNode, is_account_number};

use super::OrgResolver;

impl<D: DirectoryClient> OrgResolver<D> {
    /// The path from the organization root down to `id`, root first.
    ///
    /// A root id yields a single element. Unknown id formats fail before any
    /// directory call is made.
    pub fn resolve_path(&self, id: &str) -> Result<Vec<PathNode>, OrgError> {
        metrics::measure(Operation::ResolvePath, id, Vec::len, || self.walk_up(id))
    }

    /// Like [`resolve_path`](Self::resolve_path), but also accepts an account
    /// name, which is looked up among the organization's accounts first.
    pub fn resolve_account_path(&self, id_or_name: &str) -> Result<Vec<PathNode>, OrgError> {
        let id = if is_account_number(id_or_name) {
            id_or_name.to_string()
        } else {
            self.find_account_id(id_or_name)?
        };
        self.resolve_path(&id)
    }

    fn walk_up(&self, id: &str) -> Result<Vec<PathNode>, OrgError> {
        // Accumulated target first, reversed once at the end.
        let mut path = Vec::new();
        let mut current = id.to_string();

        loop {
            if path.len() >= self.config.max_depth {
                return Err(self.depth_exceeded("ancestor walk", id));
            }

            let kind = NodeKind::classify(&current)?;
            let name = self.node_name(&current, kind)?;
            debug!(
                event = "ResolvePath",
                phase = "Visit",
                id = %current,
                kind = %kind,
                name = %name
            );
            path.push(PathNode::new(current.clone(), name, kind));

            if kind == NodeKind::Root {
                break;
            }
            current = self.parent_of(&current)?;
        }

        path.reverse();
        info!(
            event = "ResolvePath",
            phase = "Complete",
            id,
            depth = path.len()
        );
        Ok(path)
    }
}
