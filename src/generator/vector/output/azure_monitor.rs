//! Azure Monitor Log Analytics sink.

use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, make_inputs, ConfWriter};
use crate::generator::vector::elements::{batch_block, buffer_block, request_block, tls_block};

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR, inputs: &[String]) {
    let id = component_id(&out.spec.name);
    let dedot_id = super::dedot(w, out, inputs);
    let azure = out.spec.azure_monitor.clone().unwrap_or_default();

    w.line(&format!("[sinks.{id}]"));
    w.line("type = \"azure_monitor_logs\"");
    w.line(&format!("inputs = {}", make_inputs(&[dedot_id])));
    w.line(&format!(
        "customer_id = \"{}\"",
        azure.customer_id.as_deref().unwrap_or_default()
    ));
    w.line(&format!(
        "shared_key = \"{}\"",
        out.security.shared_key.as_deref().unwrap_or_default()
    ));
    w.line(&format!(
        "log_type = \"{}\"",
        azure.log_type.as_deref().unwrap_or_default()
    ));
    if let Some(resource_id) = azure.azure_resource_id.as_deref() {
        w.line(&format!("azure_resource_id = \"{resource_id}\""));
    }
    if let Some(host) = azure.host.as_deref() {
        w.line(&format!("host = \"{host}\""));
    }
    w.blank();
    buffer_block(w, &id, out);
    request_block(w, &id, out);
    batch_block(w, &id, out);
    tls_block(w, &id, out);
}
