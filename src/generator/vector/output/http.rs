//! Generic HTTP sink. The only output kind honoring the OTEL schema
//! preview: when enabled, records pass through the OTEL remap before the
//! sink; no other output kind changes shape.

use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, make_inputs, ConfWriter};
use crate::generator::vector::elements::{batch_block, buffer_block, remap, tls_block};
use crate::generator::vector::normalize;

const DEFAULT_TIMEOUT_SECS: u32 = 10;

/// `otel_mode` is the pipeline-wide schema opt-in; it only applies when
/// this output also selects the opentelemetry schema.
pub(super) fn render_with_schema(w: &mut ConfWriter, out: &OutputIR, inputs: &[String], otel_mode: bool) {
    let id = component_id(&out.spec.name);
    let http = out.spec.http.clone().unwrap_or_default();

    let otel_selected = otel_mode && http.schema.as_deref() == Some("opentelemetry");
    let mut upstream: Vec<String> = inputs.to_vec();
    if otel_selected {
        let otel_id = format!("{id}_otel");
        remap(w, None, &otel_id, &upstream, normalize::OTEL_TRANSFORM);
        upstream = vec![otel_id];
    }
    let normalize_id = format!("{id}_normalize_http");
    remap(w, None, &normalize_id, &upstream, "del(.file)");
    let dedot_id = super::dedot(w, out, &[normalize_id]);

    w.line(&format!("[sinks.{id}]"));
    w.line("type = \"http\"");
    w.line(&format!("inputs = {}", make_inputs(&[dedot_id])));
    w.line(&format!("uri = \"{}\"", out.spec.url.as_deref().unwrap_or_default()));
    w.line(&format!(
        "method = \"{}\"",
        http.method.as_deref().unwrap_or("POST").to_ascii_lowercase()
    ));
    if let Some(compression) = out.tuning.as_ref().and_then(|t| t.compression) {
        w.line(&format!("compression = \"{}\"", compression.as_str()));
    }
    w.blank();
    w.line(&format!("[sinks.{id}.encoding]"));
    w.line("codec = \"json\"");
    w.blank();
    w.line(&format!("[sinks.{id}.request]"));
    w.line(&format!(
        "timeout_secs = {}",
        http.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)
    ));
    if let Some(headers) = &http.headers {
        if !headers.is_empty() {
            let rendered: Vec<String> = headers
                .iter()
                .map(|(k, v)| format!("\"{k}\"=\"{v}\""))
                .collect();
            w.line(&format!("headers = {{{}}}", rendered.join(",")));
        }
    }
    w.blank();
    buffer_block(w, &id, out);
    batch_block(w, &id, out);
    tls_block(w, &id, out);
    super::auth_block(w, &id, out);
}
