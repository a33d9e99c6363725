//! # vector dialect
//!
//! Renders the composed topology as a `vector.toml`. Transform inputs form
//! an explicit DAG: raw sources are normalized per category, container
//! records split into app/infra routes, user-defined inputs refine the
//! application stream, pipelines chain their filter transforms, and each
//! output renders its own transform prefix and sink tables.

pub mod elements;
pub mod normalize;
pub mod output;
mod sources;

use std::collections::BTreeMap;

use crate::generator::composer::{PipelineIR, ResolvedInput, Stage, Topology};
use crate::generator::filters::{self, drop_filter_condition, kube_api_audit};
use crate::generator::helpers::{component_id, ConfWriter};
use elements::{filter, remap, remap_drop_on_abort};

const APP_ROUTE_CONDITION: &str = r#"!((starts_with!(.kubernetes.namespace_name,"kube-")) || (starts_with!(.kubernetes.namespace_name,"openshift-")) || (.kubernetes.namespace_name == "default") || (.kubernetes.namespace_name == "openshift") || (.kubernetes.namespace_name == "kube"))"#;
const INFRA_ROUTE_CONDITION: &str = r#"(starts_with!(.kubernetes.namespace_name,"kube-")) || (starts_with!(.kubernetes.namespace_name,"openshift-")) || (.kubernetes.namespace_name == "default") || (.kubernetes.namespace_name == "openshift") || (.kubernetes.namespace_name == "kube")"#;

/// Renders the complete vector.toml for a composed topology.
pub fn conf(topology: &Topology) -> String {
    let mut w = ConfWriter::new();
    w.line("# Load sensitive data from files");
    w.line("expire_metrics_secs = 60");
    w.line("data_dir = \"/var/lib/vector\"");
    w.blank();
    sources::sources(&mut w, topology);
    sources::normalize(&mut w, &topology.source_types);
    routes(&mut w, topology);
    log_type_remaps(&mut w, topology);
    user_defined_routes(&mut w, topology);
    pipelines(&mut w, topology);
    outputs(&mut w, topology);
    w.into_string()
}

fn routes(w: &mut ConfWriter, topology: &Topology) {
    if !topology.source_types.containers() {
        return;
    }
    w.line("[transforms.route_container_logs]");
    w.line("type = \"route\"");
    w.line("inputs = [\"container_logs\"]");
    if topology.source_types.application {
        w.line(&format!("route.app = '{APP_ROUTE_CONDITION}'"));
    }
    if topology.source_types.infrastructure {
        w.line(&format!("route.infra = '{INFRA_ROUTE_CONDITION}'"));
    }
    w.blank();
}

fn log_type_remaps(w: &mut ConfWriter, topology: &Topology) {
    if topology.source_types.application {
        remap(
            w,
            Some("Set log_type to \"application\""),
            "application",
            &["route_container_logs.app".to_string()],
            ".log_type = \"application\"",
        );
    }
    if topology.source_types.infrastructure {
        remap(
            w,
            Some("Set log_type to \"infrastructure\""),
            "infrastructure",
            &["route_container_logs.infra".to_string(), "journal_logs".to_string()],
            ".log_type = \"infrastructure\"",
        );
    }
    if topology.source_types.audit {
        remap(
            w,
            Some("Set log_type to \"audit\""),
            "audit",
            &[
                "host_audit_logs".to_string(),
                "k8s_audit_logs".to_string(),
                "openshift_audit_logs".to_string(),
                "ovn_audit_logs".to_string(),
            ],
            &normalize::join_vrl(&[
                ".log_type = \"audit\"",
                normalize::FIX_HOSTNAME,
                normalize::FIX_TIMESTAMP_FIELD,
            ]),
        );
    }
}

/// One route table refining the application stream per user-defined input.
fn user_defined_routes(w: &mut ConfWriter, topology: &Topology) {
    let mut route_map: BTreeMap<String, String> = BTreeMap::new();
    for pipeline in &topology.pipelines {
        for input in &pipeline.inputs {
            if let ResolvedInput::SelectedApplication { name, input } = input {
                let condition = selection_condition(input);
                route_map.entry(component_id(name)).or_insert(condition);
            }
        }
    }
    if route_map.is_empty() {
        return;
    }
    w.line("[transforms.route_application_logs]");
    w.line("type = \"route\"");
    w.line("inputs = [\"application\"]");
    for (name, condition) in &route_map {
        w.line(&format!("route.{name} = '{condition}'"));
    }
    w.blank();
}

fn selection_condition(input: &crate::crd::InputSpec) -> String {
    let app = input.application.clone().unwrap_or_default();
    let mut clauses: Vec<String> = Vec::new();
    if !app.namespaces.is_empty() {
        let ns: Vec<String> = app
            .namespaces
            .iter()
            .map(|n| format!("(.kubernetes.namespace_name == \"{n}\")"))
            .collect();
        clauses.push(format!("({})", ns.join(" || ")));
    }
    if !app.exclude_namespaces.is_empty() {
        let ns: Vec<String> = app
            .exclude_namespaces
            .iter()
            .map(|n| format!("(.kubernetes.namespace_name != \"{n}\")"))
            .collect();
        clauses.push(format!("({})", ns.join(" && ")));
    }
    if let Some(containers) = &app.containers {
        if !containers.include.is_empty() {
            let inc: Vec<String> = containers
                .include
                .iter()
                .map(|c| format!("(.kubernetes.container_name == \"{c}\")"))
                .collect();
            clauses.push(format!("({})", inc.join(" || ")));
        }
        for excluded in &containers.exclude {
            clauses.push(format!("(.kubernetes.container_name != \"{excluded}\")"));
        }
    }
    if let Some(labels) = app.selector.as_ref().and_then(|s| s.match_labels.as_ref()) {
        for (k, v) in labels {
            clauses.push(format!("(.kubernetes.labels.\"{k}\" == \"{v}\")"));
        }
    }
    if clauses.is_empty() {
        "true".to_string()
    } else {
        clauses.join(" && ")
    }
}

fn pipeline_inputs(pipeline: &PipelineIR) -> Vec<String> {
    let mut inputs = Vec::new();
    for input in &pipeline.inputs {
        let id = match input {
            ResolvedInput::Application => "application".to_string(),
            ResolvedInput::Infrastructure => "infrastructure".to_string(),
            ResolvedInput::Audit => "audit".to_string(),
            ResolvedInput::SelectedApplication { name, .. } => {
                format!("route_application_logs.{}", component_id(name))
            }
            ResolvedInput::Receiver { name, .. } => format!("{}_normalized", component_id(name)),
        };
        if !inputs.contains(&id) {
            inputs.push(id);
        }
    }
    inputs
}

fn pipelines(w: &mut ConfWriter, topology: &Topology) {
    for pipeline in &topology.pipelines {
        let pid = component_id(&pipeline.name);
        let mut upstream = pipeline_inputs(pipeline);
        for (i, stage) in pipeline.chain.iter().enumerate() {
            let stage_id = stage_component_id(&pid, i, stage);
            render_stage(w, &stage_id, &upstream, stage);
            upstream = vec![stage_id];
        }
        remap(w, None, &pid, &upstream, ".");
    }
}

fn stage_component_id(pid: &str, index: usize, stage: &Stage) -> String {
    match stage {
        Stage::Labels(_) => format!("{pid}_{index}_labels"),
        Stage::ParseJson => format!("{pid}_{index}_parse_json"),
        Stage::DetectExceptions => format!("{pid}_{index}_detect_exceptions"),
        Stage::AuditPolicy { filter_name, .. }
        | Stage::Prune { filter_name, .. }
        | Stage::Drop { filter_name, .. } => format!("{pid}_{index}_{}", component_id(filter_name)),
    }
}

fn render_stage(w: &mut ConfWriter, id: &str, inputs: &[String], stage: &Stage) {
    match stage {
        Stage::Labels(labels) => {
            let rendered: Vec<String> = labels
                .iter()
                .map(|(k, v)| format!("\"{k}\":\"{v}\""))
                .collect();
            remap(
                w,
                None,
                id,
                inputs,
                &format!(".openshift.labels = {{{}}}", rendered.join(",")),
            );
        }
        Stage::ParseJson => remap(w, None, id, inputs, filters::PARSE_JSON_VRL),
        Stage::DetectExceptions => {
            w.line(&format!("[transforms.{id}]"));
            w.line("type = \"detect_exceptions\"");
            w.line(&format!(
                "inputs = {}",
                crate::generator::helpers::make_inputs(inputs)
            ));
            w.line(&format!("languages = [{}]", filters::DETECT_EXCEPTIONS_LANGUAGES));
            w.line("group_by = [\"kubernetes.namespace_name\",\"kubernetes.pod_id\",\"kubernetes.container_name\"]");
            w.line("expire_after_ms = 2000");
            w.line("multiline_flush_interval_ms = 1000");
            w.blank();
        }
        Stage::AuditPolicy { policy, .. } => {
            remap_drop_on_abort(w, None, id, inputs, &kube_api_audit::policy_to_vrl(policy));
        }
        Stage::Prune { prune, .. } => remap(w, None, id, inputs, &filters::prune_vrl(prune)),
        Stage::Drop { drop, .. } => {
            filter(w, None, id, inputs, &drop_filter_condition(drop));
        }
    }
}

fn outputs(w: &mut ConfWriter, topology: &Topology) {
    for out in &topology.outputs {
        let inputs: Vec<String> = topology
            .pipelines
            .iter()
            .filter(|p| p.output_refs.iter().any(|r| r == &out.spec.name))
            .map(|p| component_id(&p.name))
            .collect();
        output::render(w, out, &inputs, topology.otel_schema);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{ClusterLogForwarderSpec, PipelineSpec};
    use crate::generator::composer;
    use crate::generator::diagnostic::Diagnostics;
    use crate::generator::secrets::SecretMap;

    fn all_types_spec() -> ClusterLogForwarderSpec {
        ClusterLogForwarderSpec {
            inputs: vec![],
            outputs: vec![],
            filters: vec![],
            pipelines: vec![PipelineSpec {
                name: "pipeline".to_string(),
                input_refs: vec![
                    "application".to_string(),
                    "infrastructure".to_string(),
                    "audit".to_string(),
                ],
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
    fn emits_sources_and_route_tables() {
        let mut ds = Diagnostics::new();
        let topo = composer::compose(&all_types_spec(), &SecretMap::new(), &mut ds);
        let text = conf(&topo);
        assert!(text.contains("[sources.raw_container_logs]"));
        assert!(text.contains("[sources.raw_journal_logs]"));
        assert!(text.contains("[sources.raw_k8s_audit_logs]"));
        assert!(text.contains("[transforms.route_container_logs]"));
        assert!(text.contains("route.app = "));
        assert!(text.contains("route.infra = "));
        assert!(text.contains("[transforms.pipeline]"));
    }

    #[test]
    fn pipeline_dag_feeds_log_type_transforms() {
        let mut ds = Diagnostics::new();
        let topo = composer::compose(&all_types_spec(), &SecretMap::new(), &mut ds);
        let text = conf(&topo);
        assert!(text.contains("inputs = [\"application\",\"infrastructure\",\"audit\"]"));
    }

    #[test]
    fn filter_chain_preserves_declared_order() {
        let mut spec = all_types_spec();
        spec.pipelines[0].labels =
            Some([("env".to_string(), "prod".to_string())].into_iter().collect());
        spec.pipelines[0].parse = Some("json".to_string());
        let mut ds = Diagnostics::new();
        let topo = composer::compose(&spec, &SecretMap::new(), &mut ds);
        let text = conf(&topo);
        let labels_at = text.find("pipeline_0_labels").expect("labels transform");
        let parse_at = text.find("pipeline_1_parse_json").expect("parse transform");
        assert!(labels_at < parse_at);
        assert!(text.contains(".openshift.labels = {\"env\":\"prod\"}"));
    }
}
