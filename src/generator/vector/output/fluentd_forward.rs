//! fluent-forward sink via the native vector codec.

use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, make_inputs, ConfWriter};
use crate::generator::security::AuthMode;
use crate::generator::url;
use crate::generator::vector::elements::{buffer_block, request_block, tls_block};

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR, inputs: &[String]) {
    let id = component_id(&out.spec.name);
    let dedot_id = super::dedot(w, out, inputs);
    let parsed = out.spec.url.as_deref().and_then(url::parse);
    let address = parsed
        .as_ref()
        .map(|u| format!("{}:{}", u.host, u.port.unwrap_or(24224)))
        .unwrap_or_default();

    w.line(&format!("[sinks.{id}]"));
    w.line("type = \"fluent\"");
    w.line(&format!("inputs = {}", make_inputs(&[dedot_id])));
    w.line(&format!("address = \"{address}\""));
    if let Some(compression) = out.tuning.as_ref().and_then(|t| t.compression) {
        w.line(&format!("compression = \"{}\"", compression.as_str()));
    }
    if out.security.auth == AuthMode::SharedKey {
        w.line(&format!(
            "shared_key = \"{}\"",
            out.security.shared_key.as_deref().unwrap_or_default()
        ));
    }
    w.blank();
    buffer_block(w, &id, out);
    request_block(w, &id, out);
    tls_block(w, &id, out);
}
