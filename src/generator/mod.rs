//! # Collector configuration generator
//!
//! The core of the operator: a pure function from a ClusterLogForwarder
//! spec, the referenced secrets, the collector kind, and per-output tuning
//! to a collector configuration artifact plus diagnostics.
//!
//! The pipeline is layered leaves-first: the schema model (`crate::crd`),
//! the security materializer, the filter encoders, the per-output encoders,
//! the composer, and the two dialect renderers. No state survives a call;
//! callers may invoke `generate` concurrently with independent inputs.

pub mod composer;
pub mod diagnostic;
pub mod filters;
pub mod fluentd;
pub mod helpers;
pub mod secrets;
pub mod security;
pub mod url;
pub mod validate;
pub mod vector;
pub mod viaq;

use std::collections::BTreeMap;

use crate::crd::{ClusterLogForwarderSpec, TuningSpec};
use diagnostic::{Diagnostic, Diagnostics, Severity};
use secrets::SecretMap;

/// Which collector daemon the configuration targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorKind {
    Fluentd,
    Vector,
}

impl CollectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectorKind::Fluentd => "fluentd",
            CollectorKind::Vector => "vector",
        }
    }
}

/// Caller-facing knobs that are not part of the CLF document.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Per-output tuning overriding any tuning embedded in the spec.
    pub tuning: BTreeMap<String, TuningSpec>,
    /// OTEL schema opt-in (the CLF annotation), honored by http sinks only.
    pub otel_schema: bool,
}

/// The result of one generation call. `text` is empty iff any diagnostic
/// has Error severity.
#[derive(Debug, Clone)]
pub struct GeneratedConfig {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl GeneratedConfig {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }
}

/// Parses a CLF document (YAML or JSON) into a spec.
///
/// Structural problems only: unknown fields, wrong types, malformed
/// syntax. Referential checks run later, inside `generate`.
pub fn parse_spec(document: &str) -> (Option<ClusterLogForwarderSpec>, Vec<Diagnostic>) {
    match serde_yaml::from_str::<ClusterLogForwarderSpec>(document) {
        Ok(spec) => (Some(spec), Vec::new()),
        Err(e) => (
            None,
            vec![Diagnostic::error(
                diagnostic::DiagnosticKind::Structural,
                "spec",
                format!("malformed document: {e}"),
            )],
        ),
    }
}

/// Generates the collector configuration for a validated spec.
///
/// Diagnostics accumulate across validation and composition; if any is an
/// Error the returned text is empty, while warnings alone do not suppress
/// output. The generated text is a deterministic function of the inputs.
pub fn generate(
    spec: &ClusterLogForwarderSpec,
    secrets: &SecretMap,
    kind: CollectorKind,
    options: &GenerateOptions,
) -> GeneratedConfig {
    let mut diagnostics = Diagnostics::new();
    validate::validate(spec, secrets, kind, &mut diagnostics);

    let spec = apply_tuning(spec, &options.tuning);
    let mut topology = composer::compose(&spec, secrets, &mut diagnostics);
    topology.otel_schema = options.otel_schema;

    if diagnostics.has_errors() {
        return GeneratedConfig {
            text: String::new(),
            diagnostics: diagnostics.into_sorted(),
        };
    }

    let text = match kind {
        CollectorKind::Fluentd => fluentd::conf(&topology),
        CollectorKind::Vector => vector::conf(&topology),
    };
    GeneratedConfig {
        text,
        diagnostics: diagnostics.into_sorted(),
    }
}

/// Caller tuning takes precedence over tuning embedded in the document.
fn apply_tuning(
    spec: &ClusterLogForwarderSpec,
    tuning: &BTreeMap<String, TuningSpec>,
) -> ClusterLogForwarderSpec {
    if tuning.is_empty() {
        return spec.clone();
    }
    let mut spec = spec.clone();
    for output in &mut spec.outputs {
        if let Some(override_tuning) = tuning.get(&output.name) {
            output.tuning = Some(override_tuning.clone());
        }
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{OutputSpec, OutputType, PipelineSpec};

    fn http_spec() -> ClusterLogForwarderSpec {
        ClusterLogForwarderSpec {
            inputs: vec![],
            outputs: vec![OutputSpec {
                name: "receiver".to_string(),
                output_type: OutputType::Http,
                url: Some("https://logs.example.com/ingest".to_string()),
                elasticsearch: None,
                fluentd_forward: None,
                loki: None,
                kafka: None,
                syslog: None,
                cloudwatch: None,
                splunk: None,
                http: None,
                google_cloud_logging: None,
                azure_monitor: None,
                tls: None,
                secret: None,
                tuning: None,
            }],
            filters: vec![],
            pipelines: vec![PipelineSpec {
                name: "all".to_string(),
                input_refs: vec!["application".to_string()],
                filter_refs: vec![],
                output_refs: vec!["receiver".to_string()],
                labels: None,
                parse: None,
                detect_multiline_errors: false,
            }],
            service_account_name: None,
        }
    }

    #[test]
    fn parse_spec_reports_structural_problems() {
        let (spec, diagnostics) = parse_spec(
            "pipelines:\n  - inputRefs: [application]\n    outputRefs: [default]\n",
        );
        assert!(spec.is_some());
        assert!(diagnostics.is_empty());

        let (spec, diagnostics) = parse_spec("pipelines: {not: a list}");
        assert!(spec.is_none());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, diagnostic::DiagnosticKind::Structural);

        let (spec, _) = parse_spec("unknownTopLevel: true");
        assert!(spec.is_none());
    }

    #[test]
    fn errors_suppress_the_text() {
        let mut spec = http_spec();
        spec.pipelines[0].output_refs = vec!["missing".to_string()];
        let result = generate(&spec, &SecretMap::new(), CollectorKind::Vector, &GenerateOptions::default());
        assert!(result.has_errors());
        assert!(result.text.is_empty());
    }

    #[test]
    fn warnings_do_not_suppress_the_text() {
        let mut spec = http_spec();
        // An unused filter only warns.
        spec.filters.push(crate::crd::FilterSpec {
            name: "unused".to_string(),
            filter_type: crate::crd::FilterType::Parse,
            kube_api_audit: None,
            drop: None,
            prune: None,
        });
        let result = generate(&spec, &SecretMap::new(), CollectorKind::Vector, &GenerateOptions::default());
        assert!(!result.has_errors());
        assert!(result.warnings().count() > 0);
        assert!(!result.text.is_empty());
    }

    #[test]
    fn both_dialects_are_deterministic() {
        let spec = http_spec();
        for kind in [CollectorKind::Fluentd, CollectorKind::Vector] {
            let a = generate(&spec, &SecretMap::new(), kind, &GenerateOptions::default());
            let b = generate(&spec, &SecretMap::new(), kind, &GenerateOptions::default());
            assert_eq!(a.text, b.text);
            assert_eq!(a.diagnostics, b.diagnostics);
        }
    }

    #[test]
    fn caller_tuning_overrides_document_tuning() {
        let mut spec = http_spec();
        spec.outputs[0].tuning = Some(crate::crd::TuningSpec {
            delivery: None,
            compression: Some(crate::crd::Compression::Gzip),
            min_retry_duration: None,
            max_retry_duration: None,
            max_write: None,
        });
        let mut tuning = BTreeMap::new();
        tuning.insert(
            "receiver".to_string(),
            crate::crd::TuningSpec {
                delivery: None,
                compression: Some(crate::crd::Compression::Zstd),
                min_retry_duration: None,
                max_retry_duration: None,
                max_write: None,
            },
        );
        let options = GenerateOptions { tuning, otel_schema: false };
        let result = generate(&spec, &SecretMap::new(), CollectorKind::Vector, &options);
        assert!(result.text.contains("compression = \"zstd\""));
    }
}
