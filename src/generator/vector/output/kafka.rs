//! Kafka sink. SASL credentials and mechanism come from the opinionated
//! secret keys; compression maps to the librdkafka codec name.

use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, make_inputs, ConfWriter};
use crate::generator::security::AuthMode;
use crate::generator::url;
use crate::generator::vector::elements::{batch_block, buffer_block, tls_block};

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR, inputs: &[String]) {
    let id = component_id(&out.spec.name);
    let dedot_id = super::dedot(w, out, inputs);

    let parsed = out.spec.url.as_deref().and_then(url::parse);
    let declared: Vec<String> = out
        .spec
        .kafka
        .as_ref()
        .map(|k| {
            k.brokers
                .iter()
                .filter_map(|b| url::parse(b).map(|u| u.host_port()))
                .collect()
        })
        .unwrap_or_default();
    let bootstrap = if declared.is_empty() {
        parsed.as_ref().map(|u| u.host_port()).unwrap_or_default()
    } else {
        declared.join(",")
    };
    let topic = out
        .spec
        .kafka
        .as_ref()
        .and_then(|k| k.topic.clone())
        .filter(|t| !t.is_empty())
        .or_else(|| {
            parsed
                .as_ref()
                .map(|u| u.path.trim_start_matches('/').to_string())
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_else(|| "topic".to_string());

    w.line("# Kafka config");
    w.line(&format!("[sinks.{id}]"));
    w.line("type = \"kafka\"");
    w.line(&format!("inputs = {}", make_inputs(&[dedot_id])));
    w.line(&format!("bootstrap_servers = \"{bootstrap}\""));
    w.line(&format!("topic = \"{topic}\""));
    if let Some(compression) = out.tuning.as_ref().and_then(|t| t.compression) {
        w.line(&format!("compression = \"{}\"", compression.as_str()));
    }
    w.blank();
    w.line(&format!("[sinks.{id}.encoding]"));
    w.line("codec = \"json\"");
    w.line("timestamp_format = \"rfc3339\"");
    w.blank();
    if let AuthMode::Sasl { enabled, mechanisms, .. } = &out.security.auth {
        w.line(&format!("[sinks.{id}.sasl]"));
        w.line(&format!("enabled = {enabled}"));
        if let Some(username) = &out.security.username {
            w.line(&format!("username = \"{username}\""));
        }
        if let Some(password) = &out.security.password {
            w.line(&format!("password = \"{password}\""));
        }
        if let Some(mechanism) = mechanisms {
            w.line(&format!("mechanism = \"{mechanism}\""));
        }
        w.blank();
    }
    if !out.security.tls.is_empty() {
        w.line("# TLS Config");
        tls_block(w, &id, out);
    }
    buffer_block(w, &id, out);
    batch_block(w, &id, out);
}
