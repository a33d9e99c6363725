//! CloudWatch Logs sink. Group and stream names are computed by a
//! preceding remap; STS credentials arrive through the collector pod's
//! environment rather than the configuration text.

use crate::crd::LogGroupBy;
use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, make_inputs, ConfWriter};
use crate::generator::security::AuthMode;
use crate::generator::vector::elements::{batch_block, buffer_block, remap, request_block, tls_block};

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR, inputs: &[String]) {
    let id = component_id(&out.spec.name);
    let cw = out.spec.cloudwatch.as_ref();
    let group_field = match cw.map(|c| c.group_by) {
        Some(LogGroupBy::NamespaceName) => ".kubernetes.namespace_name",
        Some(LogGroupBy::NamespaceUUID) => ".kubernetes.namespace_id",
        _ => ".log_type",
    };
    let prefix = cw
        .and_then(|c| c.group_prefix.as_deref())
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("{p}."))
        .unwrap_or_default();

    let normalize_id = format!("{id}_normalize_group_and_streams");
    let vrl = format!(
        r#".group_name = "default"
.stream_name = "default"

if (.file != null) {{
 .file = "kubernetes" + replace!(.file, "/", ".")
 .stream_name = del(.file)
}}

if ( .log_type == "application" ) {{
 .group_name = ( "{prefix}" + {group_field} ) ?? "application"
}}
if ( .log_type == "audit" ) {{
 .group_name = "{prefix}audit"
 .stream_name = ( "${{VECTOR_SELF_NODE_NAME}}" + .tag ) ?? .stream_name
}}
if ( .log_type == "infrastructure" ) {{
 .group_name = "{prefix}infrastructure"
 .stream_name = ( .hostname + "." + .stream_name ) ?? .stream_name
}}
if ( .tag == ".journal.system" ) {{
 .stream_name =  ( .hostname + .tag ) ?? .stream_name
}}
del(.tag)
del(.source_type)"#
    );
    remap(w, Some("Cloudwatch Group and Stream Names"), &normalize_id, inputs, &vrl);
    let dedot_id = super::dedot(w, out, &[normalize_id]);

    let compression = out
        .tuning
        .as_ref()
        .and_then(|t| t.compression)
        .map(|c| c.as_str())
        .unwrap_or("none");

    w.line("# Cloudwatch Logs");
    w.line(&format!("[sinks.{id}]"));
    w.line("type = \"aws_cloudwatch_logs\"");
    w.line(&format!("inputs = {}", make_inputs(&[dedot_id])));
    w.line(&format!(
        "region = \"{}\"",
        cw.map(|c| c.region.as_str()).unwrap_or_default()
    ));
    w.line(&format!("compression = \"{compression}\""));
    w.line("group_name = \"{{ group_name }}\"");
    w.line("stream_name = \"{{ stream_name }}\"");
    match &out.security.auth {
        AuthMode::WebIdentitySts { .. } | AuthMode::CredentialsFile { .. } => {
            w.line("# role_arn and identity token set via env vars");
        }
        _ => {
            if let Some((key_id, key_secret)) = &out.security.aws_static_keys {
                w.line(&format!("auth.access_key_id = \"{key_id}\""));
                w.line(&format!("auth.secret_access_key = \"{key_secret}\""));
            }
        }
    }
    w.line("encoding.codec = \"json\"");
    w.line("request.concurrency = 2");
    w.line("healthcheck.enabled = false");
    if let Some(endpoint) = out.spec.url.as_deref() {
        w.line(&format!("endpoint = \"{endpoint}\""));
        w.line("tls.verify_certificate = false");
    }
    w.blank();
    buffer_block(w, &id, out);
    request_block(w, &id, out);
    batch_block(w, &id, out);
    tls_block(w, &id, out);
}
