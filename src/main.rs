//! # Log Forwarder Operator
//!
//! Watches ClusterLogForwarder resources and reconciles each into a
//! collector configuration Secret, with status conditions reflecting
//! validation results.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use kube::{
    runtime::{watcher, Controller},
    Api, Client,
};
use tracing::{info, warn};

use log_forwarder_operator::config::OperatorConfig;
use log_forwarder_operator::controller::reconciler::{error_policy, reconcile, Reconciler};
use log_forwarder_operator::crd::ClusterLogForwarder;
use log_forwarder_operator::observability::{init_tracing, Metrics};
use log_forwarder_operator::server::{serve, ServerState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = OperatorConfig::parse();
    init_tracing(&config.log_level);
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();

    let client = Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;
    let metrics = Arc::new(Metrics::new()?);

    let server_state = ServerState {
        metrics: Arc::clone(&metrics),
    };
    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = serve(metrics_port, server_state).await {
            warn!(%e, "metrics server exited");
        }
    });

    let context = Arc::new(Reconciler {
        client: client.clone(),
        collector_kind: config.collector_kind(),
        metrics,
    });

    let clf_api: Api<ClusterLogForwarder> = match &config.namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    };

    info!(collector = context.collector_kind.as_str(), "starting controller");
    Controller::new(clf_api, watcher::Config::default())
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((object, _)) => info!(object = %object.name, "reconciled"),
                Err(e) => warn!(error = %e, "reconcile failed"),
            }
        })
        .await;

    Ok(())
}
