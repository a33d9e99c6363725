//! # Operator Configuration
//!
//! Runtime settings for the operator process, resolved from CLI flags and
//! environment variables.

use clap::Parser;

use crate::constants;
use crate::generator::CollectorKind;

/// Command-line and environment configuration for the operator binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "log-forwarder-operator", about = "Reconciles ClusterLogForwarder resources into collector configuration")]
pub struct OperatorConfig {
    /// Collector implementation to generate configuration for.
    #[arg(long, env = "COLLECTOR_KIND", default_value = "vector")]
    pub collector: String,

    /// Port for the metrics/health HTTP server.
    #[arg(long, env = "METRICS_PORT", default_value_t = constants::DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Namespace the collector-config Secret is written to. Defaults to
    /// the namespace of the reconciled resource.
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub namespace: Option<String>,

    /// Log filter, tracing-subscriber EnvFilter syntax.
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl OperatorConfig {
    pub fn collector_kind(&self) -> CollectorKind {
        match self.collector.as_str() {
            "fluentd" => CollectorKind::Fluentd,
            _ => CollectorKind::Vector,
        }
    }
}
