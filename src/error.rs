use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

use crate::directory::DirectoryOperation;

/// Errors surfaced by the resolvers.
///
/// Every variant is terminal for the call that produced it: resolvers never
/// return a partial path, tree or policy set alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum OrgError {
    #[error("unknown identifier format: {0}")]
    UnknownIdentifierFormat(String),

    #[error("directory call {operation} failed for '{target}': {source}")]
    DirectoryCallFailed {
        operation: DirectoryOperation,
        target: String,
        #[source]
        source: DirectoryError,
    },

    #[error("malformed content in policy {policy_id}: {reason}")]
    MalformedPolicyContent { policy_id: String, reason: String },

    #[error("directory invariant violated: {0}")]
    InvariantViolation(String),

    #[error("account '{0}' does not exist in this organization")]
    AccountNotFound(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl OrgError {
    /// Wrap a client failure with the operation and target it was issued for.
    pub fn directory(
        operation: DirectoryOperation,
        target: impl Into<String>,
        source: DirectoryError,
    ) -> Self {
        OrgError::DirectoryCallFailed {
            operation,
            target: target.into(),
            source,
        }
    }

    /// The underlying client error, if this is a directory failure.
    pub fn directory_error(&self) -> Option<&DirectoryError> {
        match self {
            OrgError::DirectoryCallFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for OrgError {
    fn from(err: serde_json::Error) -> Self {
        OrgError::Config(err.to_string())
    }
}

/// Provider error codes a [`DirectoryClient`](crate::DirectoryClient) reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "PascalCase")]
pub enum DirectoryErrorCode {
    Throttling,
    TooManyRequests,
    NotFound,
    AccessDenied,
    ServiceUnavailable,
    InvalidInput,
    Transport,
    Other,
}

/// A failed directory call, as reported by the client implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct DirectoryError {
    pub code: DirectoryErrorCode,
    pub message: String,
}

impl DirectoryError {
    pub fn new(code: DirectoryErrorCode, message: impl Into<String>) -> Self {
        DirectoryError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(DirectoryErrorCode::NotFound, message)
    }

    pub fn throttling(message: impl Into<String>) -> Self {
        Self::new(DirectoryErrorCode::Throttling, message)
    }

    /// Rate-limit rejections. These are retried more aggressively than other
    /// retryable codes by [`RetryingDirectory`](crate::RetryingDirectory).
    pub fn is_throttling(&self) -> bool {
        matches!(
            self.code,
            DirectoryErrorCode::Throttling | DirectoryErrorCode::TooManyRequests
        )
    }
}
