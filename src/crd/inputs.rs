//! # Input Selectors
//!
//! An input selects a category of log records, optionally narrowed by
//! namespace, container, or pod-label criteria, or opens a receiver port
//! for logs pushed from outside the node.

use serde::{Deserialize, Serialize};

/// InputSpec defines a selector of log messages.
///
/// Exactly one of the variant fields should be set; which one determines
/// the input's source category.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InputSpec {
    /// Name used to refer to the input of a `pipeline`.
    pub name: String,

    /// Application, if present, enables the named set of `application` logs,
    /// optionally narrowed by the selector fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<Application>,

    /// Infrastructure, if present, enables `infrastructure` logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure: Option<Infrastructure>,

    /// Audit, if present, enables `audit` logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<Audit>,

    /// Receiver, if present, opens a listener the collector accepts logs on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<ReceiverSpec>,
}

/// A label selector is a label query over a set of resources.
///
/// Only equality-based matching is supported; the requirements are ANDed.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_labels: Option<std::collections::BTreeMap<String, String>>,
}

/// Application log selector.
/// All conditions in the selector must be satisfied (logical AND) to select logs.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Namespaces from which to collect application logs.
    /// If absent or empty, logs are collected from all namespaces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,

    /// Namespaces to skip even when matched by `namespaces`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_namespaces: Vec<String>,

    /// Containers to include or exclude by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containers: Option<ContainerSelector>,

    /// Selector for logs from pods with matching labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,
}

/// Container include/exclude lists applied after namespace selection.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSelector {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

/// Infrastructure enables node journal and infrastructure-container logs.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
pub struct Infrastructure {}

/// Audit enables node logs related to security audits.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
pub struct Audit {}

/// ReceiverType names the protocol of a receiver input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ReceiverType {
    Http,
    Syslog,
}

/// ReceiverSpec opens a listening port on the collector.
#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiverSpec {
    #[serde(rename = "type")]
    pub receiver_type: ReceiverType,

    /// Port to listen on. Defaults to 8443 for http, 10514 for syslog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpReceiver>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syslog: Option<SyslogReceiver>,
}

/// Format of records accepted on an http receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum HttpReceiverFormat {
    /// Kubernetes API audit events, as shipped by an audit webhook.
    KubeAPIAudit,
}

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpReceiver {
    pub format: HttpReceiverFormat,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
pub struct SyslogReceiver {}

impl ReceiverSpec {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(match self.receiver_type {
            ReceiverType::Http => 8443,
            ReceiverType::Syslog => 10514,
        })
    }
}
