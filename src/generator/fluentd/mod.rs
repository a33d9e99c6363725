//! # fluentd dialect
//!
//! Renders the composed topology as a `fluent.conf`. The layout follows the
//! collector's label graph: raw sources feed `@CONCAT` (CRI-O partial-line
//! reassembly), everything lands in `@INGRESS` (normalization to the ViaQ
//! shape), records then route to per-source-type labels, per-pipeline
//! labels (filter chains), and finally per-output labels holding the store
//! configuration.

pub mod output;
mod sources;

use std::collections::BTreeMap;

use crate::generator::composer::{ResolvedInput, Stage, Topology};
use crate::generator::filters;
use crate::generator::helpers::{comma_separated, ConfWriter};

pub use sources::{
    APPLICATION_TAGS, APPLICATION_TAGS_MULTILINE, AUDIT_TAGS, INFRA_TAGS, INFRA_TAGS_MULTILINE,
};

const HEADER: &str = r#"## CLO GENERATED CONFIGURATION ###
# This file is a copy of the fluentd configuration entrypoint
# which should normally be supplied in a configmap.
"#;

const SYSTEM: &str = r##"<system>
  log_level "#{ENV['LOG_LEVEL'] || 'warn'}"
</system>
"##;

/// Renders the complete fluent.conf for a composed topology.
pub fn conf(topology: &Topology) -> String {
    let mut w = ConfWriter::new();
    w.lines(HEADER);
    w.blank();
    w.lines(SYSTEM);
    w.blank();
    sources::prometheus_sources(&mut w);
    sources::log_sources(&mut w, &topology.source_types);

    if topology.source_types.containers() {
        concat_label(&mut w);
    }
    ingress_label(&mut w, topology);
    source_types_to_pipelines(&mut w, topology);
    pipelines_to_outputs(&mut w, topology);
    outputs(&mut w, topology);
    w.into_string()
}

fn concat_label(w: &mut ConfWriter) {
    w.line("# Concat log lines of container logs, and send to INGRESS pipeline");
    w.line("<label @CONCAT>");
    w.indent();
    w.lines(
        r#"<filter kubernetes.**>
  @type concat
  key message
  partial_key logtag
  partial_value P
  separator ''
</filter>"#,
    );
    w.blank();
    w.lines(
        r#"<match kubernetes.**>
  @type relabel
  @label @INGRESS
</match>"#,
    );
    w.outdent();
    w.line("</label>");
    w.blank();
}

fn ingress_label(w: &mut ConfWriter, topology: &Topology) {
    w.line("# Ingress pipeline");
    w.line("<label @INGRESS>");
    w.indent();
    if topology.source_types.infrastructure {
        w.line("# Filter out PRIORITY from journal logs");
        w.lines(sources::FILTER_JOURNAL_PRIORITY);
        w.blank();
    }
    if topology.source_types.audit {
        w.line("# Process OVN logs");
        w.lines(sources::PROCESS_OVN_LOGS);
        w.blank();
    }
    if topology.source_types.infrastructure {
        w.line("# Retag Journal logs to specific tags");
        w.lines(sources::RETAG_JOURNAL);
        w.blank();
    }
    if topology.source_types.containers() {
        w.line("# Invoke kubernetes apiserver to get kubernetes metadata");
        w.lines(sources::KUBERNETES_METADATA);
        w.blank();
        w.line("# Parse Json fields for container, journal and eventrouter logs");
        w.lines(sources::PARSE_EVENTROUTER_JSON);
        w.blank();
    }
    if topology.source_types.audit {
        w.line("# Fix level field in audit logs");
        w.lines(sources::FIX_AUDIT_LEVEL);
        w.blank();
    }
    w.line("# Viaq Data Model");
    w.lines(sources::VIAQ_DATA_MODEL);
    w.blank();
    w.line("# Generate elasticsearch id");
    w.lines(sources::GEN_ELASTICSEARCH_ID);
    w.blank();

    // Route or discard each source category. The container source also
    // surfaces infrastructure pods, so the infra matcher always precedes
    // the application matcher.
    let infra_used = topology.source_types.infrastructure;
    let app_used = topology.source_types.application;
    let audit_used = topology.source_types.audit;

    route_or_discard(w, "Infrastructure", INFRA_TAGS, infra_used, "_INFRASTRUCTURE");
    route_or_discard(w, "Application", APPLICATION_TAGS, app_used, "_APPLICATION");
    route_or_discard(w, "Audit", AUDIT_TAGS, audit_used, "_AUDIT");

    w.line("# Send any remaining unmatched tags to stdout");
    w.lines("<match **>\n @type stdout\n</match>");
    w.outdent();
    w.line("</label>");
    w.blank();
}

fn route_or_discard(w: &mut ConfWriter, name: &str, tags: &str, used: bool, label: &str) {
    if used {
        w.line(&format!("# Include {name} logs"));
        w.line(&format!("<match {tags}>"));
        w.indent();
        w.line("@type relabel");
        w.line(&format!("@label @{label}"));
        w.outdent();
        w.line("</match>");
    } else {
        w.line(&format!("# Discard {name} logs"));
        w.line(&format!("<match {tags}>"));
        w.indent();
        w.line("@type null");
        w.outdent();
        w.line("</match>");
    }
    w.blank();
}

/// Route selector data for one pipeline referencing a selected input.
struct AppRoute {
    pipeline_label: String,
    namespaces: Vec<String>,
    labels: Vec<String>,
}

fn source_types_to_pipelines(w: &mut ConfWriter, topology: &Topology) {
    application_to_pipelines(w, topology);
    simple_type_to_pipelines(w, topology, "infrastructure", "_INFRASTRUCTURE", |input| {
        matches!(input, ResolvedInput::Infrastructure)
    });
    simple_type_to_pipelines(w, topology, "audit", "_AUDIT", |input| {
        matches!(input, ResolvedInput::Audit)
    });
}

fn application_to_pipelines(w: &mut ConfWriter, topology: &Topology) {
    let mut routes: Vec<AppRoute> = Vec::new();
    let mut unrouted: Vec<String> = Vec::new();
    for pipeline in &topology.pipelines {
        for input in &pipeline.inputs {
            match input {
                ResolvedInput::SelectedApplication { input, .. } => {
                    let app = input.application.clone().unwrap_or_default();
                    let labels = app
                        .selector
                        .as_ref()
                        .and_then(|s| s.match_labels.as_ref())
                        .map(|m| m.iter().map(|(k, v)| format!("{k}:{v}")).collect())
                        .unwrap_or_default();
                    routes.push(AppRoute {
                        pipeline_label: pipeline.label.clone(),
                        namespaces: app.namespaces.clone(),
                        labels,
                    });
                }
                ResolvedInput::Application => unrouted.push(pipeline.label.clone()),
                _ => {}
            }
        }
    }
    if routes.is_empty() && unrouted.is_empty() {
        return;
    }

    if routes.is_empty() {
        let desc = if unrouted.len() == 1 {
            "Sending application source type to pipeline"
        } else {
            "Copying application source type to pipeline"
        };
        from_label_with_log_type(w, desc, "_APPLICATION", "application", &unrouted);
        return;
    }

    w.line("# Routing Application to pipelines");
    w.line("<label @_APPLICATION>");
    w.indent();
    log_type_filter(w, "application");
    w.blank();
    w.line("<match **>");
    w.indent();
    w.line("@type label_router");
    for route in &routes {
        w.line("<route>");
        w.indent();
        w.line(&format!("@label @{}", route.pipeline_label));
        w.line("<match>");
        w.indent();
        if !route.namespaces.is_empty() {
            w.line(&format!("namespaces {}", comma_separated(&route.namespaces)));
        }
        if !route.labels.is_empty() {
            w.line(&format!("labels {}", comma_separated(&route.labels)));
        }
        w.outdent();
        w.line("</match>");
        w.outdent();
        w.line("</route>");
        w.blank();
    }
    if !unrouted.is_empty() {
        w.line("<route>");
        w.indent();
        w.line("@label @_APPLICATION_ALL");
        w.line("<match>");
        w.line("</match>");
        w.outdent();
        w.line("</route>");
    }
    w.outdent();
    w.line("</match>");
    w.outdent();
    w.line("</label>");
    w.blank();

    match unrouted.len() {
        0 => {}
        1 => {
            w.line("# Sending unrouted application to pipelines");
            w.line("<label @_APPLICATION_ALL>");
            w.indent();
            relabel_match(w, &unrouted[0]);
            w.outdent();
            w.line("</label>");
            w.blank();
        }
        _ => {
            w.line("# Copying unrouted application to pipelines");
            w.line("<label @_APPLICATION_ALL>");
            w.indent();
            copy_match(w, &unrouted, false);
            w.outdent();
            w.line("</label>");
            w.blank();
        }
    }
}

fn simple_type_to_pipelines(
    w: &mut ConfWriter,
    topology: &Topology,
    log_type: &str,
    in_label: &str,
    is_type: impl Fn(&ResolvedInput) -> bool,
) {
    let pipelines: Vec<String> = topology
        .pipelines
        .iter()
        .filter(|p| p.inputs.iter().any(&is_type))
        .map(|p| p.label.clone())
        .collect();
    if pipelines.is_empty() {
        return;
    }
    let desc = if pipelines.len() == 1 {
        format!("Sending {log_type} source type to pipeline")
    } else {
        format!("Copying {log_type} source type to pipeline")
    };
    from_label_with_log_type(w, &desc, in_label, log_type, &pipelines);
}

fn from_label_with_log_type(
    w: &mut ConfWriter,
    desc: &str,
    in_label: &str,
    log_type: &str,
    pipelines: &[String],
) {
    w.line(&format!("# {desc}"));
    w.line(&format!("<label @{in_label}>"));
    w.indent();
    log_type_filter(w, log_type);
    w.blank();
    if pipelines.len() == 1 {
        relabel_match(w, &pipelines[0]);
    } else {
        copy_match(w, pipelines, false);
    }
    w.outdent();
    w.line("</label>");
    w.blank();
}

fn log_type_filter(w: &mut ConfWriter, log_type: &str) {
    w.line("<filter **>");
    w.indent();
    w.line("@type record_modifier");
    w.line("<record>");
    w.indent();
    w.line(&format!("log_type {log_type}"));
    w.outdent();
    w.line("</record>");
    w.outdent();
    w.line("</filter>");
}

fn relabel_match(w: &mut ConfWriter, label: &str) {
    w.line("<match **>");
    w.indent();
    w.line("@type relabel");
    w.line(&format!("@label @{label}"));
    w.outdent();
    w.line("</match>");
}

fn copy_match(w: &mut ConfWriter, labels: &[String], deep: bool) {
    w.line("<match **>");
    w.indent();
    w.line("@type copy");
    if deep {
        w.line("copy_mode deep");
    }
    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            w.blank();
        }
        w.line("<store>");
        w.indent();
        w.line("@type relabel");
        w.line(&format!("@label @{label}"));
        w.outdent();
        w.line("</store>");
    }
    w.outdent();
    w.line("</match>");
}

fn pipelines_to_outputs(w: &mut ConfWriter, topology: &Topology) {
    for pipeline in &topology.pipelines {
        w.line(&format!("# Copying pipeline {} to outputs", pipeline.name));
        w.line(&format!("<label @{}>", pipeline.label));
        w.indent();
        for stage in &pipeline.chain {
            render_stage(w, stage);
            w.blank();
        }
        let output_labels: Vec<String> = topology
            .outputs
            .iter()
            .filter(|o| pipeline.output_refs.iter().any(|r| r == &o.spec.name))
            .map(|o| o.label.clone())
            .collect();
        if output_labels.len() == 1 {
            relabel_match(w, &output_labels[0]);
        } else if !output_labels.is_empty() {
            copy_match(w, &output_labels, true);
        }
        w.outdent();
        w.line("</label>");
        w.blank();
    }
}

fn render_stage(w: &mut ConfWriter, stage: &Stage) {
    match stage {
        Stage::Labels(labels) => pipeline_labels_filter(w, labels),
        Stage::ParseJson => {
            w.line("# Parse the logs into json");
            w.lines(filters::PARSE_JSON_FLUENTD);
        }
        Stage::DetectExceptions => w.lines(filters::DETECT_EXCEPTIONS_FLUENTD),
        Stage::Prune { prune, .. } => {
            w.line("<filter **>");
            w.indent();
            w.line("@type record_modifier");
            w.line("<record>");
            w.indent();
            w.line(&format!("_dummy_ {}", filters::prune_ruby(prune)));
            w.outdent();
            w.line("</record>");
            w.line("remove_keys _dummy_");
            w.outdent();
            w.line("</filter>");
        }
        Stage::Drop { drop, .. } => {
            w.line("<filter **>");
            w.indent();
            w.line("@type record_modifier");
            w.line("<record>");
            w.indent();
            w.line(&format!(
                "_drop_record ${{({}) ? 'true' : 'false'}}",
                drop.ruby_expression
            ));
            w.outdent();
            w.line("</record>");
            w.outdent();
            w.line("</filter>");
            w.blank();
            w.lines(
                r#"<filter **>
  @type grep
  <exclude>
    key _drop_record
    pattern ^true$
  </exclude>
</filter>"#,
            );
            w.blank();
            w.lines(
                r#"<filter **>
  @type record_modifier
  remove_keys _drop_record
</filter>"#,
            );
        }
        // The audit-policy filter has no fluentd rendition; the validator
        // rejects it for this dialect before rendering.
        Stage::AuditPolicy { .. } => {}
    }
}

fn pipeline_labels_filter(w: &mut ConfWriter, labels: &BTreeMap<String, String>) {
    let rendered: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("\"{k}\":\"{v}\""))
        .collect();
    w.line("# Add User Defined labels to the output record");
    w.line("<filter **>");
    w.indent();
    w.line("@type record_transformer");
    w.line("<record>");
    w.indent();
    w.line(&format!("openshift {{ \"labels\": {{{}}} }}", rendered.join(",")));
    w.outdent();
    w.line("</record>");
    w.outdent();
    w.line("</filter>");
}

fn outputs(w: &mut ConfWriter, topology: &Topology) {
    if topology.outputs.is_empty() {
        return;
    }
    w.line("# Ship logs to specific outputs");
    for out in &topology.outputs {
        output::render(w, out);
    }
}
