//! # ClusterLogForwarder Status
//!
//! Status types for tracking reconciliation state and conditions.

use serde::{Deserialize, Serialize};

/// Status of the ClusterLogForwarder resource.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterLogForwarderStatus {
    /// Conditions represent the latest available observations.
    /// `Ready=True` means a collector configuration was generated;
    /// `Degraded=True` means validation reported errors and the previous
    /// configuration (if any) is still in effect.
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Observed generation of the spec the conditions refer to.
    #[serde(default)]
    pub observed_generation: Option<i64>,
}

/// A single status condition.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type: `Ready` or `Degraded`.
    #[serde(rename = "type")]
    pub condition_type: String,

    /// `True`, `False`, or `Unknown`.
    pub status: String,

    /// Machine-readable reason, e.g. `ValidationFailure`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// RFC3339 time of the last transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

impl Condition {
    pub fn new(condition_type: &str, status: bool, reason: &str, message: &str) -> Self {
        Condition {
            condition_type: condition_type.to_string(),
            status: if status { "True" } else { "False" }.to_string(),
            reason: Some(reason.to_string()),
            message: Some(message.to_string()),
            last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}
