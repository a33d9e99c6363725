//! # Pipeline composer
//!
//! Resolves a validated spec into a dialect-neutral topology: which source
//! categories are collected, how user-defined inputs select within them,
//! the per-pipeline filter chain, and the fan-out to outputs. Dialect
//! detail lives entirely in the render layers; this IR holds none.

use std::collections::BTreeMap;

use crate::crd::{
    ClusterLogForwarderSpec, FilterType, InputSpec, KubeApiAudit, OutputSpec, PipelineSpec,
    ReceiverSpec, TuningSpec,
};
use crate::generator::diagnostic::{DiagnosticKind, Diagnostics};
use crate::generator::filters::{
    compile_drop, compile_prune, CompiledDrop, CompiledPrune,
};
use crate::generator::helpers::label_name;
use crate::generator::secrets::{SecretMap, SecretRef};
use crate::generator::security::{self, SecurityFragment};

/// Source categories gathered from the pipelines' input refs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceTypes {
    pub application: bool,
    pub infrastructure: bool,
    pub audit: bool,
}

impl SourceTypes {
    pub fn containers(&self) -> bool {
        self.application || self.infrastructure
    }
}

/// One stage of a pipeline's filter chain, in declared order. Pipeline
/// shortcuts (`parse: json`, `detectMultilineErrors`) desugar to synthetic
/// leading stages.
#[derive(Debug, Clone)]
pub enum Stage {
    /// Static labels recorded under `openshift.labels`.
    Labels(BTreeMap<String, String>),
    ParseJson,
    DetectExceptions,
    AuditPolicy { filter_name: String, policy: KubeApiAudit },
    Prune { filter_name: String, prune: CompiledPrune },
    Drop { filter_name: String, drop: CompiledDrop },
}

/// How one pipeline input resolves.
#[derive(Debug, Clone)]
pub enum ResolvedInput {
    /// A reserved source type, or a user input that merely aliases one.
    Application,
    Infrastructure,
    Audit,
    /// A user-defined application input carrying selectors.
    SelectedApplication { name: String, input: InputSpec },
    /// A receiver input opening a listener.
    Receiver { name: String, receiver: ReceiverSpec },
}

/// One composed pipeline.
#[derive(Debug, Clone)]
pub struct PipelineIR {
    pub name: String,
    /// Uppercased routing label (without the `@`).
    pub label: String,
    pub inputs: Vec<ResolvedInput>,
    pub chain: Vec<Stage>,
    /// Output names, declared order.
    pub output_refs: Vec<String>,
}

/// One output with its materialized security fragment and effective tuning.
#[derive(Debug, Clone)]
pub struct OutputIR {
    pub spec: OutputSpec,
    pub label: String,
    pub security: SecurityFragment,
    pub tuning: Option<TuningSpec>,
    /// Labels of pipelines feeding this output, declared order.
    pub pipeline_labels: Vec<String>,
}

/// The composed topology handed to the dialect renderers.
#[derive(Debug, Clone)]
pub struct Topology {
    pub source_types: SourceTypes,
    pub pipelines: Vec<PipelineIR>,
    pub outputs: Vec<OutputIR>,
    /// Receiver inputs in declaration order, for source rendering.
    pub receivers: Vec<(String, ReceiverSpec)>,
    /// OTEL schema opt-in; only http sinks honor it.
    pub otel_schema: bool,
}

fn resolve_input(spec: &ClusterLogForwarderSpec, name: &str) -> Option<ResolvedInput> {
    match name {
        crate::constants::INPUT_APPLICATION => return Some(ResolvedInput::Application),
        crate::constants::INPUT_INFRASTRUCTURE => return Some(ResolvedInput::Infrastructure),
        crate::constants::INPUT_AUDIT => return Some(ResolvedInput::Audit),
        _ => {}
    }
    let input = spec.input(name)?;
    if let Some(receiver) = &input.receiver {
        return Some(ResolvedInput::Receiver {
            name: name.to_string(),
            receiver: receiver.clone(),
        });
    }
    if input.infrastructure.is_some() {
        return Some(ResolvedInput::Infrastructure);
    }
    if input.audit.is_some() {
        return Some(ResolvedInput::Audit);
    }
    if let Some(app) = &input.application {
        let has_selectors = !app.namespaces.is_empty()
            || !app.exclude_namespaces.is_empty()
            || app.containers.is_some()
            || app
                .selector
                .as_ref()
                .and_then(|s| s.match_labels.as_ref())
                .is_some_and(|m| !m.is_empty());
        if has_selectors {
            return Some(ResolvedInput::SelectedApplication {
                name: name.to_string(),
                input: input.clone(),
            });
        }
        return Some(ResolvedInput::Application);
    }
    // An input with no variant behaves as a plain application input.
    Some(ResolvedInput::Application)
}

fn compile_chain(
    spec: &ClusterLogForwarderSpec,
    pipeline: &PipelineSpec,
    diagnostics: &mut Diagnostics,
) -> Vec<Stage> {
    let mut chain = Vec::new();
    if let Some(labels) = &pipeline.labels {
        if !labels.is_empty() {
            chain.push(Stage::Labels(labels.clone()));
        }
    }
    if pipeline.parse.as_deref() == Some("json") {
        chain.push(Stage::ParseJson);
    }
    if pipeline.detect_multiline_errors {
        chain.push(Stage::DetectExceptions);
    }
    for filter_ref in &pipeline.filter_refs {
        // Unknown refs were already reported by the validator.
        let Some(filter) = spec.filter(filter_ref) else { continue };
        match filter.filter_type {
            FilterType::Parse => chain.push(Stage::ParseJson),
            FilterType::DetectMultilineException => chain.push(Stage::DetectExceptions),
            FilterType::KubeAPIAudit => chain.push(Stage::AuditPolicy {
                filter_name: filter.name.clone(),
                policy: filter.kube_api_audit.clone().unwrap_or_default(),
            }),
            FilterType::Prune => {
                let Some(prune_spec) = &filter.prune else {
                    diagnostics.error(
                        DiagnosticKind::ConflictingOptions,
                        format!("filters/{}", filter.name),
                        "prune filter requires a prune block",
                    );
                    continue;
                };
                if let Some(prune) = compile_prune(&filter.name, prune_spec, diagnostics) {
                    chain.push(Stage::Prune { filter_name: filter.name.clone(), prune });
                }
            }
            FilterType::Drop => {
                let tests = filter.drop.clone().unwrap_or_default();
                let drop = compile_drop(&filter.name, &tests, diagnostics);
                chain.push(Stage::Drop { filter_name: filter.name.clone(), drop });
            }
        }
    }
    chain
}

/// Composes the topology. Assumes the validator ran; unresolvable refs are
/// skipped here (they already produced Error diagnostics).
pub fn compose(
    spec: &ClusterLogForwarderSpec,
    secrets: &SecretMap,
    diagnostics: &mut Diagnostics,
) -> Topology {
    let mut source_types = SourceTypes::default();
    let mut pipelines = Vec::new();
    let names = spec.pipeline_names();

    for (i, pipeline) in spec.pipelines.iter().enumerate() {
        // Keep diagnostics attributable to their document position.
        diagnostics.at_position(spec.inputs.len() + spec.outputs.len() + spec.filters.len() + i);
        let name = names[i].clone();
        let mut inputs = Vec::new();
        for input_ref in &pipeline.input_refs {
            let Some(resolved) = resolve_input(spec, input_ref) else { continue };
            match &resolved {
                ResolvedInput::Application | ResolvedInput::SelectedApplication { .. } => {
                    source_types.application = true;
                }
                ResolvedInput::Infrastructure => source_types.infrastructure = true,
                ResolvedInput::Audit => source_types.audit = true,
                ResolvedInput::Receiver { .. } => {}
            }
            inputs.push(resolved);
        }
        let chain = compile_chain(spec, pipeline, diagnostics);
        pipelines.push(PipelineIR {
            label: label_name(&name),
            name,
            inputs,
            chain,
            output_refs: pipeline.output_refs.clone(),
        });
    }

    let mut outputs = Vec::new();
    for (i, output) in spec.outputs.iter().enumerate() {
        diagnostics.at_position(spec.inputs.len() + i);
        let referenced: Vec<String> = pipelines
            .iter()
            .filter(|p| p.output_refs.iter().any(|r| r == &output.name))
            .map(|p| p.label.clone())
            .collect();
        let secret_name = output.secret.as_ref().map(|s| s.name.as_str()).unwrap_or("");
        let secret = SecretRef::lookup(secrets, secret_name);
        let security = security::materialize(output, &secret, diagnostics);
        outputs.push(OutputIR {
            label: label_name(&output.name),
            spec: output.clone(),
            security,
            tuning: output.tuning.clone(),
            pipeline_labels: referenced,
        });
    }

    let mut receivers = Vec::new();
    for input in &spec.inputs {
        if let Some(receiver) = &input.receiver {
            let used = pipelines.iter().any(|p| {
                p.inputs.iter().any(|r| matches!(r, ResolvedInput::Receiver { name, .. } if name == &input.name))
            });
            if used {
                receivers.push((input.name.clone(), receiver.clone()));
            }
        }
    }

    Topology { source_types, pipelines, outputs, receivers, otel_schema: false }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::PipelineSpec;

    fn spec_with_pipeline(input_refs: Vec<&str>) -> ClusterLogForwarderSpec {
        ClusterLogForwarderSpec {
            inputs: vec![],
            outputs: vec![],
            filters: vec![],
            pipelines: vec![PipelineSpec {
                name: "p".to_string(),
                input_refs: input_refs.into_iter().map(String::from).collect(),
                filter_refs: vec![],
                output_refs: vec!["out".to_string()],
                labels: None,
                parse: None,
                detect_multiline_errors: false,
            }],
            service_account_name: None,
        }
    }

    #[test]
    fn reserved_inputs_gather_source_types() {
        let spec = spec_with_pipeline(vec!["application", "audit"]);
        let mut ds = Diagnostics::new();
        let topo = compose(&spec, &SecretMap::new(), &mut ds);
        assert!(topo.source_types.application);
        assert!(!topo.source_types.infrastructure);
        assert!(topo.source_types.audit);
        assert!(topo.source_types.containers());
    }

    #[test]
    fn shortcuts_desugar_to_leading_stages() {
        let mut spec = spec_with_pipeline(vec!["application"]);
        spec.pipelines[0].parse = Some("json".to_string());
        spec.pipelines[0].detect_multiline_errors = true;
        let mut ds = Diagnostics::new();
        let topo = compose(&spec, &SecretMap::new(), &mut ds);
        assert!(matches!(topo.pipelines[0].chain[0], Stage::ParseJson));
        assert!(matches!(topo.pipelines[0].chain[1], Stage::DetectExceptions));
    }

    #[test]
    fn pipeline_labels_are_uppercased() {
        let spec = spec_with_pipeline(vec!["application"]);
        let mut ds = Diagnostics::new();
        let topo = compose(&spec, &SecretMap::new(), &mut ds);
        assert_eq!(topo.pipelines[0].label, "P");
    }
}
