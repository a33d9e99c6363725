//! # Custom Resource Definitions
//!
//! CRD types for the log forwarder operator.
//!
//! The `ClusterLogForwarder` resource declares a log-forwarding topology:
//! named inputs (what to collect), named outputs (where to send it), named
//! filters (what to do on the way), and pipelines that wire them together.
//!
//! ## Module Structure
//!
//! - `spec.rs` - Main CRD specification and pipeline types
//! - `inputs.rs` - Input selectors (application/infrastructure/audit/receiver)
//! - `outputs.rs` - Output kinds and their kind-specific options
//! - `filters.rs` - Filter kinds (parse, detectMultilineException, kubeAPIAudit, prune, drop)
//! - `tuning.rs` - Per-output delivery/compression/retry tuning
//! - `status.rs` - Status conditions for tracking reconciliation state

mod filters;
mod inputs;
mod outputs;
mod spec;
mod status;
mod tuning;

// Re-export all public types
pub use filters::{
    AuditPolicyLevel, AuditPolicyRule, DropCondition, DropTest, FilterSpec, FilterType,
    GroupResources, KubeApiAudit, PruneFilterSpec,
};
pub use inputs::{
    Application, Audit, ContainerSelector, HttpReceiver, HttpReceiverFormat, Infrastructure,
    InputSpec, LabelSelector, ReceiverSpec, ReceiverType, SyslogReceiver,
};
pub use outputs::{
    AzureMonitor, Cloudwatch, Elasticsearch, FluentdForward, GoogleCloudLogging, Http, Kafka,
    LogGroupBy, Loki, OutputSecretSpec, OutputSpec, OutputTlsSpec, OutputType, Splunk, Syslog,
    SyslogRfc, TlsProfileType, TlsSecurityProfile,
};
pub use spec::{ClusterLogForwarder, ClusterLogForwarderSpec, PipelineSpec};
pub use status::{ClusterLogForwarderStatus, Condition};
pub use tuning::{Compression, DeliveryMode, TuningSpec};
