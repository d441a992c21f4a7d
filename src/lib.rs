//! Resolve AWS Organizations hierarchies and the policies inherited along them.
//!
//! The entry point is [`OrgResolver`], which is driven by any
//! [`DirectoryClient`] implementation and answers three questions:
//!
//! - the ancestry of a node ([`OrgResolver::resolve_path`]),
//! - the full tree below a node ([`OrgResolver::build_tree`]),
//! - the policies that apply to a target once inheritance is resolved
//!   ([`OrgResolver::effective_policy_ids`], [`OrgResolver::effective_policies`]).
pub use config::{DEFAULT_MAX_DEPTH, ResolverConfig};
pub use directory::{
    Account, ChildType, DirectoryClient, DirectoryOperation, NodeRef, OrganizationalUnit, Page,
    Paginator, PolicyDescription, RootSummary,
};
pub use error::{DirectoryError, DirectoryErrorCode, OrgError};
pub use memory::{DirectoryCall, InMemoryDirectory, InMemoryDirectoryBuilder};
pub use resolver::OrgResolver;
pub use retry::{RetryConfig, RetryingDirectory};
pub use types::*;

mod config;
mod directory;
mod error;
mod memory;
pub mod metrics;
mod resolver;
mod retry;
mod types;
