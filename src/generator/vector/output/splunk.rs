//! Splunk HEC sink.

use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, make_inputs, ConfWriter};
use crate::generator::vector::elements::{batch_block, buffer_block, remap, request_block, tls_block};

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR, inputs: &[String]) {
    let id = component_id(&out.spec.name);
    // The `.tag` bookkeeping field must not reach the indexed event.
    let remap_id = format!("{id}_remap");
    remap(w, None, &remap_id, inputs, "del(.tag)");
    let dedot_id = super::dedot(w, out, &[remap_id]);

    let splunk = out.spec.splunk.clone().unwrap_or_default();
    let compression = out
        .tuning
        .as_ref()
        .and_then(|t| t.compression)
        .map(|c| c.as_str())
        .unwrap_or("none");

    w.line("# Splunk config");
    w.line(&format!("[sinks.{id}]"));
    w.line("type = \"splunk_hec\"");
    w.line(&format!("inputs = {}", make_inputs(&[dedot_id])));
    w.line(&format!(
        "endpoint = \"{}\"",
        out.spec.url.as_deref().unwrap_or_default()
    ));
    w.line(&format!("compression = \"{compression}\""));
    w.line(&format!(
        "default_token = \"{}\"",
        out.security.hec_token.as_deref().unwrap_or_default()
    ));
    if let Some(index) = splunk.index_name.as_deref() {
        w.line(&format!("index = \"{index}\""));
    } else if let Some(index_key) = splunk.index_key.as_deref() {
        w.line(&format!("index = \"{{{{{index_key}}}}}\""));
    }
    if let Some(source) = splunk.source.as_deref() {
        w.line(&format!("source = \"{source}\""));
    }
    w.line("timestamp_key = \"@timestamp\"");
    w.blank();
    w.line(&format!("[sinks.{id}.encoding]"));
    w.line("codec = \"json\"");
    w.blank();
    buffer_block(w, &id, out);
    request_block(w, &id, out);
    batch_block(w, &id, out);
    tls_block(w, &id, out);
}
