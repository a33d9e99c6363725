//! # Reconciler
//!
//! One reconciliation: read the ClusterLogForwarder, load the secrets its
//! outputs reference, run the generator, write the collector-config Secret,
//! and project the diagnostics onto the `Ready`/`Degraded` conditions.
//!
//! The reconciler deliberately stays thin; all interesting behavior lives
//! in the pure generator so it can be tested without a cluster.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::{
    api::{Api, ObjectMeta, Patch, PatchParams, PostParams},
    runtime::controller::Action,
    Client, ResourceExt,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::constants;
use crate::crd::{ClusterLogForwarder, ClusterLogForwarderStatus, Condition};
use crate::generator::{self, CollectorKind, GenerateOptions, GeneratedConfig};
use crate::generator::secrets::SecretMap;
use crate::observability::Metrics;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
    #[error("resource has no namespace")]
    MissingNamespace,
}

/// Shared context for all reconciliations.
#[derive(Clone)]
pub struct Reconciler {
    pub client: Client,
    pub collector_kind: CollectorKind,
    pub metrics: Arc<Metrics>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("collector_kind", &self.collector_kind)
            .finish_non_exhaustive()
    }
}

/// Loads every secret referenced by the spec's outputs into the in-memory
/// map the generator borrows. Absent secrets are simply missing from the
/// map; the generator reports them.
async fn load_referenced_secrets(
    api: &Api<Secret>,
    clf: &ClusterLogForwarder,
) -> Result<SecretMap, ReconcilerError> {
    let mut map = SecretMap::new();
    for output in &clf.spec.outputs {
        let Some(secret_ref) = &output.secret else { continue };
        if map.contains_key(&secret_ref.name) {
            continue;
        }
        match api.get_opt(&secret_ref.name).await? {
            Some(secret) => {
                let data: BTreeMap<String, Vec<u8>> = secret
                    .data
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(k, ByteString(v))| (k, v))
                    .collect();
                map.insert(secret_ref.name.clone(), data);
            }
            None => {
                warn!(secret = %secret_ref.name, "referenced secret not found");
            }
        }
    }
    Ok(map)
}

fn config_secret(namespace: &str, kind: CollectorKind, text: &str) -> Secret {
    let key = match kind {
        CollectorKind::Fluentd => constants::FLUENTD_CONFIG_KEY,
        CollectorKind::Vector => constants::VECTOR_CONFIG_KEY,
    };
    Secret {
        metadata: ObjectMeta {
            name: Some(constants::COLLECTOR_CONFIG_SECRET_NAME.to_string()),
            namespace: Some(namespace.to_string()),
            ..ObjectMeta::default()
        },
        data: Some(BTreeMap::from([(
            key.to_string(),
            ByteString(text.as_bytes().to_vec()),
        )])),
        ..Secret::default()
    }
}

/// Projects the generation result onto status conditions.
pub fn conditions_for(result: &GeneratedConfig) -> Vec<Condition> {
    if result.has_errors() {
        let message = result
            .diagnostics
            .iter()
            .filter(|d| d.severity == crate::generator::diagnostic::Severity::Error)
            .map(|d| format!("{}: {} ({})", d.kind.as_str(), d.message, d.ref_path))
            .collect::<Vec<_>>()
            .join("; ");
        vec![
            Condition::new("Ready", false, "ValidationFailure", &message),
            Condition::new("Degraded", true, "ValidationFailure", &message),
        ]
    } else {
        let warning_count = result.warnings().count();
        let message = if warning_count == 0 {
            "collector configuration generated".to_string()
        } else {
            format!("collector configuration generated with {warning_count} warning(s)")
        };
        vec![
            Condition::new("Ready", true, "GenerationSucceeded", &message),
            Condition::new("Degraded", false, "GenerationSucceeded", &message),
        ]
    }
}

pub async fn reconcile(
    clf: Arc<ClusterLogForwarder>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    ctx.metrics.reconciliations_total.inc();
    let name = clf.name_any();
    let namespace = clf.namespace().ok_or(ReconcilerError::MissingNamespace)?;
    let secret_api = Api::<Secret>::namespaced(ctx.client.clone(), &namespace);

    let secrets = load_referenced_secrets(&secret_api, &clf).await?;
    let result = generator::generate(
        &clf.spec,
        &secrets,
        ctx.collector_kind,
        &GenerateOptions {
            tuning: BTreeMap::new(),
            otel_schema: clf
                .annotations()
                .get(constants::OTEL_SCHEMA_ANNOTATION)
                .is_some_and(|v| v == "enabled"),
        },
    );

    if result.has_errors() {
        ctx.metrics
            .generation_failures_total
            .with_label_values(&[name.as_str()])
            .inc();
        warn!(resource = %name, diagnostics = result.diagnostics.len(), "generation failed validation");
    } else {
        let secret = config_secret(&namespace, ctx.collector_kind, &result.text);
        match secret_api.create(&PostParams::default(), &secret).await {
            Ok(_) => info!(resource = %name, "created collector-config secret"),
            Err(kube::Error::Api(ae)) if ae.reason == "AlreadyExists" => {
                secret_api
                    .replace(
                        constants::COLLECTOR_CONFIG_SECRET_NAME,
                        &PostParams::default(),
                        &secret,
                    )
                    .await?;
                info!(resource = %name, "updated collector-config secret");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let status = ClusterLogForwarderStatus {
        conditions: conditions_for(&result),
        observed_generation: clf.metadata.generation,
    };
    let clf_api = Api::<ClusterLogForwarder>::namespaced(ctx.client.clone(), &namespace);
    let patch = serde_json::json!({ "status": status });
    clf_api
        .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;

    Ok(Action::requeue(Duration::from_secs(
        constants::DEFAULT_RECONCILE_REQUEUE_SECS,
    )))
}

/// Requeue with a fixed backoff on failure; the watch stream keeps running.
pub fn error_policy(
    clf: Arc<ClusterLogForwarder>,
    error: &ReconcilerError,
    _ctx: Arc<Reconciler>,
) -> Action {
    warn!(resource = %clf.name_any(), %error, "reconciliation failed");
    Action::requeue(Duration::from_secs(
        constants::DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::diagnostic::{Diagnostic, DiagnosticKind};

    #[test]
    fn error_diagnostics_project_to_degraded() {
        let result = GeneratedConfig {
            text: String::new(),
            diagnostics: vec![Diagnostic::error(
                DiagnosticKind::UnknownOutputRef,
                "pipelines/p",
                "unknown output \"x\"",
            )],
        };
        let conditions = conditions_for(&result);
        assert_eq!(conditions[0].condition_type, "Ready");
        assert_eq!(conditions[0].status, "False");
        assert_eq!(conditions[1].condition_type, "Degraded");
        assert_eq!(conditions[1].status, "True");
        assert!(conditions[0].message.as_deref().unwrap().contains("UnknownOutputRef"));
    }

    #[test]
    fn warnings_leave_the_resource_ready() {
        let result = GeneratedConfig {
            text: "# config".to_string(),
            diagnostics: vec![Diagnostic::warning(
                DiagnosticKind::UnusedEntity,
                "inputs/i",
                "unused",
            )],
        };
        let conditions = conditions_for(&result);
        assert_eq!(conditions[0].status, "True");
        assert!(conditions[0].message.as_deref().unwrap().contains("1 warning"));
    }
}
