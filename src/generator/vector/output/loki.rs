//! Loki sink. Stream labels derive from the configured (or default) label
//! keys, with illegal label characters folded to `_`; the tenant defaults
//! to the record's `log_type`.

use std::collections::BTreeSet;

use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, make_inputs, ConfWriter};
use crate::generator::vector::elements::{batch_block, buffer_block, remap, request_block, tls_block};

const DEFAULT_LABEL_KEYS: &[&str] = &[
    "log_type",
    "kubernetes.namespace_name",
    "kubernetes.pod_name",
    "kubernetes.container_name",
];

const REQUIRED_LABEL_KEYS: &[&str] = &["kubernetes.host"];

fn label_keys(out: &OutputIR) -> Vec<String> {
    let declared = out.spec.loki.as_ref().map(|l| &l.label_keys);
    let mut keys: BTreeSet<String> = match declared {
        Some(keys) if !keys.is_empty() => keys.iter().cloned().collect(),
        _ => DEFAULT_LABEL_KEYS.iter().map(ToString::to_string).collect(),
    };
    for required in REQUIRED_LABEL_KEYS {
        keys.insert((*required).to_string());
    }
    keys.into_iter().collect()
}

fn label_name(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '.' | '/' | '\\' | '-' => '_',
            c => c,
        })
        .collect()
}

fn label_value(key: &str) -> String {
    if key == "kubernetes.host" {
        return "${VECTOR_SELF_NODE_NAME}".to_string();
    }
    // Label sub-keys were dedotted upstream; address them with the folded
    // name under their parent map.
    for prefix in ["kubernetes.labels.", "kubernetes.namespace_labels."] {
        if let Some(rest) = key.strip_prefix(prefix) {
            let folded = rest.replace(['/', '.'], "_");
            return format!("{{{{{prefix}\\\"{folded}\\\"}}}}");
        }
    }
    format!("{{{{{key}}}}}")
}

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR, inputs: &[String]) {
    let id = component_id(&out.spec.name);
    let remap_id = format!("{id}_remap");
    remap(w, None, &remap_id, inputs, "del(.tag)");
    let dedot_id = super::dedot(w, out, &[remap_id]);

    w.line(&format!("[sinks.{id}]"));
    w.line("type = \"loki\"");
    w.line(&format!("inputs = {}", make_inputs(&[dedot_id])));
    w.line(&format!(
        "endpoint = \"{}\"",
        out.spec.url.as_deref().unwrap_or_default()
    ));
    w.line("out_of_order_action = \"accept\"");
    w.line("healthcheck.enabled = false");
    if let Some(tenant_key) = out.spec.loki.as_ref().and_then(|l| l.tenant_key.as_deref()) {
        w.line(&format!("tenant_id = \"{{{{{tenant_key}}}}}\""));
    } else {
        w.line("tenant_id = \"{{log_type}}\"");
    }
    if let Some(compression) = out.tuning.as_ref().and_then(|t| t.compression) {
        w.line(&format!("compression = \"{}\"", compression.as_str()));
    }
    w.blank();
    w.line(&format!("[sinks.{id}.encoding]"));
    w.line("codec = \"json\"");
    w.blank();
    w.line(&format!("[sinks.{id}.labels]"));
    for key in label_keys(out) {
        w.line(&format!("{} = \"{}\"", label_name(&key), label_value(&key)));
    }
    w.blank();
    buffer_block(w, &id, out);
    request_block(w, &id, out);
    batch_block(w, &id, out);
    tls_block(w, &id, out);
    super::auth_block(w, &id, out);
}
