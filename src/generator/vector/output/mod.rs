//! # vector sink encoders
//!
//! One encoder per output kind. Each renders its transform prefix (dedot,
//! kind-specific remaps) and the `[sinks.*]` tables, consuming the pipeline
//! transform ids as inputs.

mod azure_monitor;
mod cloudwatch;
mod elasticsearch;
mod fluentd_forward;
mod gcl;
mod http;
mod kafka;
mod loki;
mod splunk;
mod syslog;

use crate::crd::OutputType;
use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, ConfWriter};
use crate::generator::security::AuthMode;
use crate::generator::vector::elements::remap;
use crate::generator::vector::normalize;

/// Renders one output. `inputs` are the pipeline transform ids feeding it.
pub fn render(w: &mut ConfWriter, out: &OutputIR, inputs: &[String], otel_schema: bool) {
    match out.spec.output_type {
        OutputType::Cloudwatch => cloudwatch::render(w, out, inputs),
        OutputType::Elasticsearch => elasticsearch::render(w, out, inputs),
        OutputType::FluentdForward => fluentd_forward::render(w, out, inputs),
        OutputType::Kafka => kafka::render(w, out, inputs),
        OutputType::Loki => loki::render(w, out, inputs),
        OutputType::Syslog => syslog::render(w, out, inputs),
        OutputType::Splunk => splunk::render(w, out, inputs),
        OutputType::Http => http::render_with_schema(w, out, inputs, otel_schema),
        OutputType::GoogleCloudLogging => gcl::render(w, out, inputs),
        OutputType::AzureMonitor => azure_monitor::render(w, out, inputs),
    }
}

/// Emits the `<id>_dedot` transform and returns its id.
pub(super) fn dedot(w: &mut ConfWriter, out: &OutputIR, inputs: &[String]) -> String {
    let id = format!("{}_dedot", component_id(&out.spec.name));
    remap(w, None, &id, inputs, normalize::DEDOT_LABELS);
    id
}

/// `[sinks.<id>.auth]` for basic or bearer credentials, when present.
/// Credential values are inlined from the referenced secret.
pub(super) fn auth_block(w: &mut ConfWriter, id: &str, out: &OutputIR) {
    match out.security.auth {
        AuthMode::Basic => {
            w.line("# Basic Auth Config");
            w.line(&format!("[sinks.{id}.auth]"));
            w.line("strategy = \"basic\"");
            w.line(&format!(
                "user = \"{}\"",
                out.security.username.as_deref().unwrap_or_default()
            ));
            w.line(&format!(
                "password = \"{}\"",
                out.security.password.as_deref().unwrap_or_default()
            ));
            w.blank();
        }
        AuthMode::Bearer => {
            w.line("# Bearer Auth Config");
            w.line(&format!("[sinks.{id}.auth]"));
            w.line("strategy = \"bearer\"");
            w.line(&format!(
                "token = \"{}\"",
                out.security.token.as_deref().unwrap_or_default()
            ));
            w.blank();
        }
        _ => {}
    }
}
