//! Syslog sink: a socket sink with the syslog encoding codec. Header
//! fields pass through verbatim, including `$.message.<path>` record
//! accessors which the codec resolves per record.

use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, make_inputs, ConfWriter};
use crate::generator::url;
use crate::generator::vector::elements::{buffer_block, tls_block};

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR, inputs: &[String]) {
    let id = component_id(&out.spec.name);
    let dedot_id = super::dedot(w, out, inputs);
    let parsed = out.spec.url.as_deref().and_then(url::parse);
    let address = parsed
        .as_ref()
        .map(|u| format!("{}:{}", u.host, u.port.unwrap_or(514)))
        .unwrap_or_default();
    let mode = parsed
        .as_ref()
        .map(|u| {
            if url::is_tls_scheme(&u.scheme) && url::plain_scheme(&u.scheme) == "tcp" {
                "tls".to_string()
            } else {
                url::plain_scheme(&u.scheme).to_string()
            }
        })
        .unwrap_or_else(|| "udp".to_string());

    let syslog = out.spec.syslog.clone().unwrap_or_default();

    w.line(&format!("[sinks.{id}]"));
    w.line("type = \"socket\"");
    w.line(&format!("inputs = {}", make_inputs(&[dedot_id])));
    w.line(&format!("address = \"{address}\""));
    w.line(&format!("mode = \"{mode}\""));
    w.blank();
    w.line(&format!("[sinks.{id}.encoding]"));
    w.line("codec = \"syslog\"");
    w.line(&format!("rfc = \"{}\"", syslog.rfc.as_str()));
    w.line(&format!(
        "facility = \"{}\"",
        syslog.facility.as_deref().unwrap_or("user")
    ));
    w.line(&format!(
        "severity = \"{}\"",
        syslog.severity.as_deref().unwrap_or("informational")
    ));
    if let Some(app_name) = syslog.app_name.as_deref() {
        w.line(&format!("app_name = \"{app_name}\""));
    }
    if let Some(msg_id) = syslog.msg_id.as_deref() {
        w.line(&format!("msg_id = \"{msg_id}\""));
    }
    if let Some(proc_id) = syslog.proc_id.as_deref() {
        w.line(&format!("proc_id = \"{proc_id}\""));
    }
    if let Some(tag) = syslog.tag.as_deref() {
        w.line(&format!("tag = \"{tag}\""));
    }
    if syslog.add_log_source {
        w.line("add_log_source = true");
    }
    if let Some(payload_key) = syslog.payload_key.as_deref() {
        w.line(&format!("payload_key = \"{payload_key}\""));
    }
    w.blank();
    buffer_block(w, &id, out);
    tls_block(w, &id, out);
}
