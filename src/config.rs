//! Resolver configuration.

use serde::{Deserialize, Serialize};

use crate::error::OrgError;
use crate::types::PolicyType;

/// Default ceiling for walk depth. Real organizations nest at most five OUs
/// below the root, so hitting this means the directory links are cyclic.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Settings shared by every resolution an [`OrgResolver`](crate::OrgResolver) performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Which policy type is listed when collecting attachments.
    pub policy_type: PolicyType,
    /// Maximum number of levels any walk may visit before failing with
    /// [`OrgError::InvariantViolation`].
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            policy_type: PolicyType::ServiceControlPolicy,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, OrgError> {
        let config: ResolverConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_policy_type(mut self, policy_type: PolicyType) -> Self {
        self.policy_type = policy_type;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn validate(&self) -> Result<(), OrgError> {
        if self.max_depth == 0 {
            return Err(OrgError::Config("max_depth must be at least 1".into()));
        }
        Ok(())
    }
}
