//! Policy summaries, documents and ordered policy sets.

use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::error::OrgError;

/// Policy types a directory can attach to a target.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyType {
    #[default]
    ServiceControlPolicy,
    ResourceControlPolicy,
    TagPolicy,
    BackupPolicy,
    AiservicesOptOutPolicy,
    ChatbotPolicy,
    #[serde(rename = "DECLARATIVE_POLICY_EC2")]
    #[strum(serialize = "DECLARATIVE_POLICY_EC2")]
    DeclarativePolicyEc2,
}

/// Listing entry for a policy, as returned by the policy listing calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct PolicySummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Type", default)]
    pub policy_type: PolicyType,
    #[serde(default)]
    pub aws_managed: bool,
}

impl PolicySummary {
    pub fn new(id: impl Into<String>, name: impl Into<String>, policy_type: PolicyType) -> Self {
        PolicySummary {
            id: id.into(),
            name: name.into(),
            description: None,
            policy_type,
            aws_managed: false,
        }
    }
}

/// A parsed policy document. The shape is provider-defined and never validated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyDocument(Value);

impl PolicyDocument {
    /// Parse raw policy content; unparsable content is a [`OrgError::MalformedPolicyContent`].
    pub fn parse(policy_id: &str, content: &str) -> Result<Self, OrgError> {
        serde_json::from_str(content)
            .map(PolicyDocument)
            .map_err(|e| OrgError::MalformedPolicyContent {
                policy_id: policy_id.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// The `Statement` entries, normalized to a slice (a single statement object
    /// is returned as a one-element slice).
    pub fn statements(&self) -> Vec<&Value> {
        match self.0.get("Statement") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(single @ Value::Object(_)) => vec![single],
            _ => Vec::new(),
        }
    }
}

/// A policy together with its parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResolvedPolicy {
    pub summary: PolicySummary,
    pub content: PolicyDocument,
}

/// Policies keyed by id, in insertion order.
///
/// Serializes as a JSON object mapping policy id to its document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySet {
    entries: Vec<ResolvedPolicy>,
    index: HashMap<String, usize>,
}

impl PolicySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a policy. Returns `false` and keeps the existing entry if the id
    /// is already present.
    pub fn insert(&mut self, policy: ResolvedPolicy) -> bool {
        if self.index.contains_key(&policy.summary.id) {
            return false;
        }
        self.index
            .insert(policy.summary.id.clone(), self.entries.len());
        self.entries.push(policy);
        true
    }

    pub fn get(&self, id: &str) -> Option<&ResolvedPolicy> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedPolicy> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|p| p.summary.id.as_str()).collect()
    }

    /// Documents keyed by policy name, for callers writing `<name>.json` files.
    pub fn by_name(&self) -> Vec<(&str, &PolicyDocument)> {
        self.entries
            .iter()
            .map(|p| (p.summary.name.as_str(), &p.content))
            .collect()
    }
}

impl IntoIterator for PolicySet {
    type Item = ResolvedPolicy;
    type IntoIter = std::vec::IntoIter<ResolvedPolicy>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<ResolvedPolicy> for PolicySet {
    fn from_iter<I: IntoIterator<Item = ResolvedPolicy>>(iter: I) -> Self {
        let mut set = PolicySet::new();
        for policy in iter {
            set.insert(policy);
        }
        set
    }
}

impl Serialize for PolicySet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for policy in &self.entries {
            map.serialize_entry(&policy.summary.id, &policy.content)?;
        }
        map.end()
    }
}
