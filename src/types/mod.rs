//! Data model types for organization nodes and policies.
//!
//! Identifier shapes:
//! - Root: `r-` prefix, e.g. `r-ab12`
//! - Organizational unit: `ou-` prefix, e.g. `ou-ab12-11111111`
//! - Account: contains a 12 digit run, e.g. `111122223333`

mod node;
mod node_kind;
mod policy;

pub use node::{OrgNode, OrgNodeIter, PathNode};
pub use node_kind::{
    NodeKind, ORGANIZATIONAL_UNIT_PREFIX, ROOT_NAME, ROOT_PREFIX, classify, is_account_number, is_root_id,
};
pub use policy::{PolicyDocument, PolicySet, PolicySummary, PolicyType, ResolvedPolicy};
