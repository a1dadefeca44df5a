//! HelmRelease resource model and the lister abstraction.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Condition status value that counts as "true".
pub const CONDITION_TRUE: &str = "True";

/// Errors returned by a [`ReleaseLister`].
#[derive(Debug, Error)]
pub enum ListError {
    /// Kubernetes API request failed.
    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),

    /// A resource could not be decoded into a [`Release`].
    #[error("failed to decode release '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The list call did not finish within the configured deadline.
    #[error("list call timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Any other lister failure (used by non-kube listers).
    #[error("{0}")]
    Other(String),
}

/// A single HelmRelease as seen by the exporter.
///
/// This is a read-only snapshot; collectors never mutate it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// Resource name.
    pub name: String,
    /// Resource namespace.
    pub namespace: String,
    /// Observed status block.
    #[serde(default)]
    pub status: ReleaseStatusFields,
}

/// The `status` block of a HelmRelease.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReleaseStatusFields {
    /// Raw release status string, e.g. `DEPLOYED`.
    #[serde(deserialize_with = "null_as_default")]
    pub release_status: String,
    /// Name of the Helm release.
    #[serde(deserialize_with = "null_as_default")]
    pub release_name: String,
    /// Conditions in the order the operator reported them.
    #[serde(deserialize_with = "conditions_or_empty")]
    pub conditions: Vec<Condition>,
}

/// One condition record attached to a HelmRelease.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Condition {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub type_: String,
    /// `True`, `False` or `Unknown`.
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub reason: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    pub last_transition_time: Option<String>,
    pub last_update_time: Option<String>,
}

/// Decode an explicit `null` as the zero value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A `null` list is empty and a `null` entry is an empty condition.
fn conditions_or_empty<'de, D>(deserializer: D) -> Result<Vec<Condition>, D::Error>
where
    D: Deserializer<'de>,
{
    let conditions: Option<Vec<Option<Condition>>> = Option::deserialize(deserializer)?;
    Ok(conditions
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

impl Condition {
    /// Whether the condition status equals [`CONDITION_TRUE`].
    pub fn is_true(&self) -> bool {
        self.status == CONDITION_TRUE
    }
}

impl Release {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        release_status: impl Into<String>,
        release_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            status: ReleaseStatusFields {
                release_status: release_status.into(),
                release_name: release_name.into(),
                conditions: Vec::new(),
            },
        }
    }

    /// Append a condition.
    pub fn with_condition(
        mut self,
        type_: impl Into<String>,
        status: impl Into<String>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.status.conditions.push(Condition {
            type_: type_.into(),
            status: status.into(),
            reason: reason.into(),
            message: message.into(),
            ..Default::default()
        });
        self
    }
}

/// Source of HelmRelease snapshots.
///
/// Implementations are shared between every collector and the health check,
/// so they must tolerate concurrent calls.
#[async_trait::async_trait]
pub trait ReleaseLister: Send + Sync + 'static {
    /// List every HelmRelease in every namespace.
    async fn list_releases(&self) -> Result<Vec<Release>, ListError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_deserialize_camel_case() {
        let status: ReleaseStatusFields = serde_json::from_value(json!({
            "releaseStatus": "DEPLOYED",
            "releaseName": "team-a-app1",
            "conditions": [{
                "type": "Released",
                "status": "True",
                "reason": "Succeeded",
                "message": "ok",
                "lastTransitionTime": "2024-01-01T00:00:00Z"
            }]
        }))
        .unwrap();

        assert_eq!(status.release_status, "DEPLOYED");
        assert_eq!(status.release_name, "team-a-app1");
        assert_eq!(status.conditions.len(), 1);
        assert_eq!(status.conditions[0].type_, "Released");
        assert!(status.conditions[0].is_true());
        assert_eq!(status.conditions[0].last_update_time, None);
    }

    #[test]
    fn test_status_missing_fields_default() {
        let status: ReleaseStatusFields = serde_json::from_value(json!({})).unwrap();
        assert_eq!(status, ReleaseStatusFields::default());
    }

    #[test]
    fn test_status_null_fields_default() {
        let status: ReleaseStatusFields = serde_json::from_value(json!({
            "releaseStatus": null,
            "releaseName": null,
            "conditions": null
        }))
        .unwrap();
        assert_eq!(status, ReleaseStatusFields::default());
    }

    #[test]
    fn test_condition_null_fields_default() {
        let status: ReleaseStatusFields = serde_json::from_value(json!({
            "releaseStatus": "FAILED",
            "conditions": [
                {"type": "Released", "status": "False", "reason": null, "message": null},
                null
            ]
        }))
        .unwrap();

        assert_eq!(status.conditions.len(), 2);
        assert_eq!(status.conditions[0].type_, "Released");
        assert_eq!(status.conditions[0].reason, "");
        assert_eq!(status.conditions[0].message, "");
        assert_eq!(status.conditions[1], Condition::default());
    }

    #[test]
    fn test_condition_is_true_exact_match() {
        let release = Release::new("a", "b", "", "")
            .with_condition("Ready", "True", "", "")
            .with_condition("Ready", "true", "", "")
            .with_condition("Ready", "Unknown", "", "");
        let flags: Vec<bool> = release.status.conditions.iter().map(|c| c.is_true()).collect();
        assert_eq!(flags, vec![true, false, false]);
    }
}
