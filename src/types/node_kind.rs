//! Node kinds and the lexical identifier classifier.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::error::OrgError;

/// Prefix carried by every organization root id, e.g. `r-ab12`.
pub const ROOT_PREFIX: &str = "r-";

/// Prefix carried by every organizational unit id, e.g. `ou-ab12-11111111`.
pub const ORGANIZATIONAL_UNIT_PREFIX: &str = "ou-";

/// Display name given to the root, which has no describe call of its own.
pub const ROOT_NAME: &str = "Root";

// Unanchored on purpose: any id containing a 12 digit run is an account.
static ACCOUNT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{12}").unwrap());

/// The kind of a node in the organization tree.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Root,
    OrganizationalUnit,
    Account,
}

impl NodeKind {
    /// Classify an identifier by its lexical shape.
    ///
    /// Rules are checked in order: `r-` prefix, `ou-` prefix, then any run of
    /// twelve decimal digits anywhere in the string.
    pub fn classify(id: &str) -> Result<Self, OrgError> {
        if id.starts_with(ROOT_PREFIX) {
            Ok(NodeKind::Root)
        } else if id.starts_with(ORGANIZATIONAL_UNIT_PREFIX) {
            Ok(NodeKind::OrganizationalUnit)
        } else if ACCOUNT_ID.is_match(id) {
            Ok(NodeKind::Account)
        } else {
            Err(OrgError::UnknownIdentifierFormat(id.to_string()))
        }
    }

    /// Accounts never have children.
    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeKind::Account)
    }
}

/// Shorthand for [`NodeKind::classify`].
pub fn classify(id: &str) -> Result<NodeKind, OrgError> {
    NodeKind::classify(id)
}

/// Lexical root check used by the effective policy walk as its stop condition.
pub fn is_root_id(id: &str) -> bool {
    id.starts_with(ROOT_PREFIX)
}

/// True when `value` is exactly a 12 digit account number, as opposed to a
/// name that merely contains one.
pub fn is_account_number(value: &str) -> bool {
    value.len() == 12 && value.bytes().all(|b| b.is_ascii_digit())
}
