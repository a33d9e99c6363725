//! # Observability
//!
//! Tracing setup and prometheus metrics for the operator process. The
//! generator core itself emits nothing; only the reconciler paths are
//! instrumented.

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use tracing_subscriber::EnvFilter;

/// Initializes structured logging from the configured filter.
pub fn init_tracing(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Prometheus metrics exported by the operator.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,
    pub reconciliations_total: IntCounter,
    pub generation_failures_total: IntCounterVec,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let reconciliations_total = IntCounter::with_opts(Opts::new(
            "clf_reconciliations_total",
            "Number of ClusterLogForwarder reconciliations",
        ))?;
        let generation_failures_total = IntCounterVec::new(
            Opts::new(
                "clf_generation_failures_total",
                "Number of generation calls that produced Error diagnostics",
            ),
            &["resource"],
        )?;
        registry.register(Box::new(reconciliations_total.clone()))?;
        registry.register(Box::new(generation_failures_total.clone()))?;
        Ok(Metrics {
            registry,
            reconciliations_total,
            generation_failures_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_without_collision() {
        let metrics = Metrics::new().expect("metrics");
        metrics.reconciliations_total.inc();
        metrics
            .generation_failures_total
            .with_label_values(&["instance"])
            .inc();
        assert_eq!(metrics.registry.gather().len(), 2);
    }
}
