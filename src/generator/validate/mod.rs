//! # Validation
//!
//! Structural and referential integrity checks over the CLF document.
//! Every check reports a `Diagnostic`; none of them abort the walk, so a
//! single call surfaces all findings at once.

mod name;

pub use name::is_dns1035_label;

use std::collections::BTreeSet;

use crate::constants;
use crate::crd::{ClusterLogForwarderSpec, FilterType, OutputSpec, OutputType};
use crate::generator::diagnostic::{DiagnosticKind, Diagnostics};
use crate::generator::secrets::{SecretMap, KNOWN_SECRET_KEYS};
use crate::generator::url;
use crate::generator::CollectorKind;

/// Runs all checks. Positions follow document order: inputs, outputs,
/// filters, pipelines.
pub fn validate(
    spec: &ClusterLogForwarderSpec,
    secrets: &SecretMap,
    kind: CollectorKind,
    diagnostics: &mut Diagnostics,
) {
    let mut position = 0usize;

    let mut input_names = BTreeSet::new();
    for input in &spec.inputs {
        diagnostics.at_position(position);
        position += 1;
        let ref_path = format!("inputs/{}", input.name);
        check_name(&input.name, &ref_path, diagnostics);
        let reserved = [
            constants::INPUT_APPLICATION,
            constants::INPUT_INFRASTRUCTURE,
            constants::INPUT_AUDIT,
        ];
        if reserved.contains(&input.name.as_str()) {
            // A custom input may shadow a reserved name only when it is the
            // matching variant.
            let matches_variant = (input.name == constants::INPUT_APPLICATION
                && input.application.is_some())
                || (input.name == constants::INPUT_INFRASTRUCTURE && input.infrastructure.is_some())
                || (input.name == constants::INPUT_AUDIT && input.audit.is_some());
            if !matches_variant {
                diagnostics.error(
                    DiagnosticKind::InvalidName,
                    &ref_path,
                    format!("input name {:?} is reserved", input.name),
                );
            }
        }
        if !input_names.insert(input.name.clone()) {
            diagnostics.error(
                DiagnosticKind::DuplicateName,
                &ref_path,
                format!("duplicate input name {:?}", input.name),
            );
        }
        if input.receiver.is_some() && kind == CollectorKind::Fluentd {
            diagnostics.error(
                DiagnosticKind::Unsupported,
                &ref_path,
                "receiver inputs are not supported by the fluentd collector",
            );
        }
    }

    let mut output_names = BTreeSet::new();
    for output in &spec.outputs {
        diagnostics.at_position(position);
        position += 1;
        let ref_path = format!("outputs/{}", output.name);
        check_name(&output.name, &ref_path, diagnostics);
        if !output_names.insert(output.name.clone()) {
            diagnostics.error(
                DiagnosticKind::DuplicateName,
                &ref_path,
                format!("duplicate output name {:?}", output.name),
            );
        }
        check_output_url(output, &ref_path, diagnostics);
        check_output_options(output, &ref_path, diagnostics);
        check_secret_keys(output, secrets, &ref_path, diagnostics);
    }

    let mut filter_names = BTreeSet::new();
    for filter in &spec.filters {
        diagnostics.at_position(position);
        position += 1;
        let ref_path = format!("filters/{}", filter.name);
        check_name(&filter.name, &ref_path, diagnostics);
        if !filter_names.insert(filter.name.clone()) {
            diagnostics.error(
                DiagnosticKind::DuplicateName,
                &ref_path,
                format!("duplicate filter name {:?}", filter.name),
            );
        }
        if filter.filter_type == FilterType::KubeAPIAudit && kind == CollectorKind::Fluentd {
            diagnostics.error(
                DiagnosticKind::Unsupported,
                &ref_path,
                "the kubeAPIAudit filter is not supported by the fluentd collector",
            );
        }
    }

    let mut pipeline_names = BTreeSet::new();
    let names = spec.pipeline_names();
    for (i, pipeline) in spec.pipelines.iter().enumerate() {
        diagnostics.at_position(position);
        position += 1;
        let name = &names[i];
        let ref_path = format!("pipelines/{name}");
        if !pipeline.name.is_empty() {
            check_name(&pipeline.name, &ref_path, diagnostics);
        }
        if !pipeline_names.insert(name.clone()) {
            diagnostics.error(
                DiagnosticKind::DuplicateName,
                &ref_path,
                format!("duplicate pipeline name {name:?}"),
            );
        }
        if pipeline.input_refs.is_empty() {
            diagnostics.error(
                DiagnosticKind::UnknownInputRef,
                &ref_path,
                "pipeline has no inputRefs",
            );
        }
        if pipeline.output_refs.is_empty() {
            diagnostics.error(
                DiagnosticKind::UnknownOutputRef,
                &ref_path,
                "pipeline has no outputRefs",
            );
        }
        for input_ref in &pipeline.input_refs {
            let reserved = [
                constants::INPUT_APPLICATION,
                constants::INPUT_INFRASTRUCTURE,
                constants::INPUT_AUDIT,
            ];
            if !reserved.contains(&input_ref.as_str()) && spec.input(input_ref).is_none() {
                diagnostics.error(
                    DiagnosticKind::UnknownInputRef,
                    &ref_path,
                    format!("unknown input {input_ref:?}"),
                );
            }
        }
        for output_ref in &pipeline.output_refs {
            if spec.output(output_ref).is_none() {
                diagnostics.error(
                    DiagnosticKind::UnknownOutputRef,
                    &ref_path,
                    format!("unknown output {output_ref:?}"),
                );
            }
        }
        for filter_ref in &pipeline.filter_refs {
            if spec.filter(filter_ref).is_none() {
                diagnostics.error(
                    DiagnosticKind::UnknownFilterRef,
                    &ref_path,
                    format!("unknown filter {filter_ref:?}"),
                );
            }
        }
        if let Some(parse) = pipeline.parse.as_deref() {
            if parse != "json" {
                diagnostics.error(
                    DiagnosticKind::ConflictingOptions,
                    &ref_path,
                    format!("unsupported parse value {parse:?}, only \"json\" is supported"),
                );
            }
        }
    }

    // Unreferenced entities are legal but almost always a mistake.
    for input in &spec.inputs {
        let used = spec
            .pipelines
            .iter()
            .any(|p| p.input_refs.iter().any(|r| r == &input.name));
        if !used {
            diagnostics.warning(
                DiagnosticKind::UnusedEntity,
                format!("inputs/{}", input.name),
                format!("input {:?} is not referenced by any pipeline", input.name),
            );
        }
    }
    for filter in &spec.filters {
        let used = spec
            .pipelines
            .iter()
            .any(|p| p.filter_refs.iter().any(|r| r == &filter.name));
        if !used {
            diagnostics.warning(
                DiagnosticKind::UnusedEntity,
                format!("filters/{}", filter.name),
                format!("filter {:?} is not referenced by any pipeline", filter.name),
            );
        }
    }
}

fn check_name(name: &str, ref_path: &str, diagnostics: &mut Diagnostics) {
    if !is_dns1035_label(name) {
        diagnostics.error(
            DiagnosticKind::InvalidName,
            ref_path,
            format!(
                "name {name:?} must be a valid DNS1035 label (lowercase alphanumeric or '-', starting with a letter)"
            ),
        );
    }
}

fn allowed_schemes(output_type: OutputType) -> &'static [&'static str] {
    match output_type {
        OutputType::Elasticsearch
        | OutputType::Loki
        | OutputType::Splunk
        | OutputType::Http
        | OutputType::AzureMonitor => &["http", "https"],
        OutputType::FluentdForward => &["tcp", "tls", "http", "https"],
        OutputType::Kafka => &["tcp", "tls"],
        OutputType::Syslog => &["tcp", "tls", "udp", "udps"],
        OutputType::Cloudwatch | OutputType::GoogleCloudLogging => &["https"],
    }
}

fn url_required(output_type: OutputType) -> bool {
    matches!(
        output_type,
        OutputType::Elasticsearch
            | OutputType::FluentdForward
            | OutputType::Loki
            | OutputType::Syslog
            | OutputType::Splunk
            | OutputType::Http
    )
}

fn check_output_url(output: &OutputSpec, ref_path: &str, diagnostics: &mut Diagnostics) {
    let has_brokers = output
        .kafka
        .as_ref()
        .map(|k| !k.brokers.is_empty())
        .unwrap_or(false);
    match output.url.as_deref().filter(|u| !u.is_empty()) {
        None => {
            if url_required(output.output_type)
                || (output.output_type == OutputType::Kafka && !has_brokers)
            {
                diagnostics.error(
                    DiagnosticKind::InvalidUrl,
                    ref_path,
                    format!("output type {:?} requires a URL", output.output_type.as_str()),
                );
            }
        }
        Some(raw) => match url::parse(raw) {
            None => diagnostics.error(
                DiagnosticKind::InvalidUrl,
                ref_path,
                format!("malformed URL {raw:?}"),
            ),
            Some(parsed) => {
                let allowed = allowed_schemes(output.output_type);
                if !allowed.contains(&parsed.scheme.as_str()) {
                    diagnostics.error(
                        DiagnosticKind::InvalidUrl,
                        ref_path,
                        format!(
                            "scheme {:?} not permitted for output type {:?} (allowed: {})",
                            parsed.scheme,
                            output.output_type.as_str(),
                            allowed.join(", ")
                        ),
                    );
                }
            }
        },
    }
}

fn check_output_options(output: &OutputSpec, ref_path: &str, diagnostics: &mut Diagnostics) {
    if let Some(gcl) = &output.google_cloud_logging {
        let parents = [
            gcl.billing_account_id.as_deref(),
            gcl.organization_id.as_deref(),
            gcl.folder_id.as_deref(),
            gcl.project_id.as_deref(),
        ]
        .iter()
        .flatten()
        .count();
        if parents != 1 {
            diagnostics.error(
                DiagnosticKind::ConflictingOptions,
                ref_path,
                "googleCloudLogging requires exactly one of billingAccountId, organizationId, folderId or projectId",
            );
        }
    }
    if let Some(splunk) = &output.splunk {
        if splunk.index_key.is_some() && splunk.index_name.is_some() {
            diagnostics.error(
                DiagnosticKind::ConflictingOptions,
                ref_path,
                "splunk indexKey and indexName are mutually exclusive",
            );
        }
    }
    if output.output_type == OutputType::Cloudwatch && output.cloudwatch.is_none() {
        diagnostics.error(
            DiagnosticKind::ConflictingOptions,
            ref_path,
            "cloudwatch outputs require the cloudwatch options block",
        );
    }
}

fn check_secret_keys(
    output: &OutputSpec,
    secrets: &SecretMap,
    ref_path: &str,
    diagnostics: &mut Diagnostics,
) {
    let Some(secret_ref) = &output.secret else { return };
    let Some(data) = secrets.get(&secret_ref.name) else {
        // Reported as MissingSecretKey by the security materializer.
        return;
    };
    for key in data.keys() {
        if !KNOWN_SECRET_KEYS.contains(&key.as_str()) {
            diagnostics.warning(
                DiagnosticKind::UnknownSecretKey,
                ref_path,
                format!("secret {:?} carries unrecognized key {key:?}", secret_ref.name),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{OutputSecretSpec, PipelineSpec};
    use crate::generator::diagnostic::Severity;

    fn minimal_output(name: &str, output_type: OutputType, url: Option<&str>) -> OutputSpec {
        OutputSpec {
            name: name.to_string(),
            output_type,
            url: url.map(String::from),
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
        }
    }

    fn spec_with(outputs: Vec<OutputSpec>, pipelines: Vec<PipelineSpec>) -> ClusterLogForwarderSpec {
        ClusterLogForwarderSpec {
            inputs: vec![],
            outputs,
            filters: vec![],
            pipelines,
            service_account_name: None,
        }
    }

    fn pipeline(input_refs: &[&str], output_refs: &[&str]) -> PipelineSpec {
        PipelineSpec {
            name: "p".to_string(),
            input_refs: input_refs.iter().map(ToString::to_string).collect(),
            filter_refs: vec![],
            output_refs: output_refs.iter().map(ToString::to_string).collect(),
            labels: None,
            parse: None,
            detect_multiline_errors: false,
        }
    }

    #[test]
    fn unknown_output_ref_is_an_error() {
        let spec = spec_with(vec![], vec![pipeline(&["application"], &["nowhere"])]);
        let mut ds = Diagnostics::new();
        validate(&spec, &SecretMap::new(), CollectorKind::Vector, &mut ds);
        let sorted = ds.into_sorted();
        assert!(sorted
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnknownOutputRef && d.severity == Severity::Error));
    }

    #[test]
    fn syslog_scheme_allow_list() {
        let ok = spec_with(
            vec![minimal_output("s", OutputType::Syslog, Some("udps://syslog.example.com:6514"))],
            vec![pipeline(&["application"], &["s"])],
        );
        let mut ds = Diagnostics::new();
        validate(&ok, &SecretMap::new(), CollectorKind::Vector, &mut ds);
        assert!(!ds.has_errors());

        let bad = spec_with(
            vec![minimal_output("s", OutputType::Syslog, Some("https://syslog.example.com"))],
            vec![pipeline(&["application"], &["s"])],
        );
        let mut ds = Diagnostics::new();
        validate(&bad, &SecretMap::new(), CollectorKind::Vector, &mut ds);
        assert!(ds.has_errors());
    }

    #[test]
    fn kafka_accepts_brokers_in_place_of_url() {
        let mut output = minimal_output("k", OutputType::Kafka, None);
        output.kafka = Some(crate::crd::Kafka {
            topic: None,
            brokers: vec!["tls://b1:9092".to_string()],
        });
        let spec = spec_with(vec![output], vec![pipeline(&["application"], &["k"])]);
        let mut ds = Diagnostics::new();
        validate(&spec, &SecretMap::new(), CollectorKind::Vector, &mut ds);
        assert!(!ds.has_errors());

        let without = spec_with(
            vec![minimal_output("k", OutputType::Kafka, None)],
            vec![pipeline(&["application"], &["k"])],
        );
        let mut ds = Diagnostics::new();
        validate(&without, &SecretMap::new(), CollectorKind::Vector, &mut ds);
        assert!(ds.has_errors());
    }

    #[test]
    fn invalid_names_are_rejected() {
        let spec = spec_with(
            vec![minimal_output("Bad_Name", OutputType::Http, Some("https://x.example"))],
            vec![pipeline(&["application"], &["Bad_Name"])],
        );
        let mut ds = Diagnostics::new();
        validate(&spec, &SecretMap::new(), CollectorKind::Vector, &mut ds);
        let sorted = ds.into_sorted();
        assert!(sorted.iter().any(|d| d.kind == DiagnosticKind::InvalidName));
    }

    #[test]
    fn unknown_secret_keys_warn_but_do_not_fail() {
        let mut output = minimal_output("h", OutputType::Http, Some("https://x.example"));
        output.secret = Some(OutputSecretSpec { name: "s".to_string() });
        let spec = spec_with(vec![output], vec![pipeline(&["application"], &["h"])]);
        let mut secrets = SecretMap::new();
        let mut data = std::collections::BTreeMap::new();
        data.insert("tls.crt".to_string(), b"x".to_vec());
        data.insert("typo-key".to_string(), b"x".to_vec());
        secrets.insert("s".to_string(), data);
        let mut ds = Diagnostics::new();
        validate(&spec, &secrets, CollectorKind::Vector, &mut ds);
        assert!(!ds.has_errors());
        let sorted = ds.into_sorted();
        assert!(sorted.iter().any(|d| d.kind == DiagnosticKind::UnknownSecretKey));
    }

    #[test]
    fn gcl_parent_ids_are_mutually_exclusive() {
        let mut output = minimal_output("g", OutputType::GoogleCloudLogging, None);
        output.google_cloud_logging = Some(crate::crd::GoogleCloudLogging {
            billing_account_id: Some("b".to_string()),
            organization_id: Some("o".to_string()),
            folder_id: None,
            project_id: None,
            log_id: Some("app".to_string()),
        });
        let spec = spec_with(vec![output], vec![pipeline(&["application"], &["g"])]);
        let mut ds = Diagnostics::new();
        validate(&spec, &SecretMap::new(), CollectorKind::Vector, &mut ds);
        let sorted = ds.into_sorted();
        assert!(sorted.iter().any(|d| d.kind == DiagnosticKind::ConflictingOptions));
    }
}
