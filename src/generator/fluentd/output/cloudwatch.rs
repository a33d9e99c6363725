//! CloudWatch Logs store. Group and stream names are computed per record
//! by tag-scoped record_modifier filters; infrastructure and audit logs
//! always group by log type regardless of the configured strategy.

use crate::constants;
use crate::crd::{Compression, LogGroupBy};
use crate::generator::composer::OutputIR;
use crate::generator::fluentd::{
    APPLICATION_TAGS_MULTILINE, AUDIT_TAGS, INFRA_TAGS_MULTILINE,
};
use crate::generator::helpers::{component_id, ConfWriter};
use crate::generator::security::AuthMode;

use super::{dedot_filter, read_secret_stripped, write_buffer};

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR) {
    let cw = out.spec.cloudwatch.as_ref();
    let prefix = cw
        .and_then(|c| c.group_prefix.as_deref())
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("{p}."))
        .unwrap_or_default();
    let app_group = match cw.map(|c| c.group_by) {
        Some(LogGroupBy::NamespaceName) => "${record['kubernetes']['namespace_name']}".to_string(),
        Some(LogGroupBy::NamespaceUUID) => "${record['kubernetes']['namespace_id']}".to_string(),
        _ => "application".to_string(),
    };

    group_stream_filter(
        w,
        INFRA_TAGS_MULTILINE,
        &format!("{prefix}infrastructure"),
        "${record['hostname']}.${tag}",
    );
    w.blank();
    group_stream_filter(w, APPLICATION_TAGS_MULTILINE, &format!("{prefix}{app_group}"), "${tag}");
    w.blank();
    group_stream_filter(
        w,
        AUDIT_TAGS,
        &format!("{prefix}audit"),
        "${record['hostname']}.${tag}",
    );
    w.blank();
    dedot_filter(w);
    w.blank();

    w.line("<match **>");
    w.indent();
    w.line("@type cloudwatch_logs");
    w.line("auto_create_stream true");
    w.line(&format!(
        "region {}",
        cw.map(|c| c.region.as_str()).unwrap_or_default()
    ));
    w.line("log_group_name_key cw_group_name");
    w.line("log_stream_name_key cw_stream_name");
    w.line("remove_log_stream_name_key true");
    w.line("remove_log_group_name_key true");
    w.line("concurrency 2");
    match &out.security.auth {
        AuthMode::WebIdentitySts { .. } | AuthMode::CredentialsFile { .. } => {
            w.line("<web_identity_credentials>");
            w.indent();
            w.line(&format!("role_arn \"#{{ENV['{}']}}\"", constants::ENV_AWS_ROLE_ARN));
            w.line(&format!(
                "web_identity_token_file \"#{{ENV['{}']}}\"",
                constants::ENV_AWS_WEB_IDENTITY_TOKEN_FILE
            ));
            w.line(&format!(
                "role_session_name \"#{{ENV['{}']}}\"",
                constants::ENV_AWS_ROLE_SESSION_NAME
            ));
            w.outdent();
            w.line("</web_identity_credentials>");
        }
        _ => {
            let secret_name = out.spec.secret.as_ref().map(|s| s.name.as_str()).unwrap_or_default();
            w.line(&format!(
                "aws_key_id {}",
                read_secret_stripped(&constants::secret_path(secret_name, constants::AWS_ACCESS_KEY_ID))
            ));
            w.line(&format!(
                "aws_sec_key {}",
                read_secret_stripped(&constants::secret_path(secret_name, constants::AWS_SECRET_ACCESS_KEY))
            ));
        }
    }
    w.line("include_time_key true");
    w.line("log_rejected_request true");
    if let Some(endpoint) = out.spec.url.as_deref() {
        w.line(&format!("endpoint {endpoint}"));
        w.line("ssl_verify_peer false");
    }
    if let Some(Compression::Gzip) = out.tuning.as_ref().and_then(|t| t.compression) {
        w.line("use_compression true");
    }
    let store_id = component_id(&out.spec.name);
    write_buffer(w, &[], &store_id, out);
    w.outdent();
    w.line("</match>");
}

fn group_stream_filter(w: &mut ConfWriter, tags: &str, group: &str, stream: &str) {
    w.line(&format!("<filter {tags}>"));
    w.indent();
    w.line("@type record_modifier");
    w.line("<record>");
    w.indent();
    w.line(&format!("cw_group_name {group}"));
    w.line(&format!("cw_stream_name {stream}"));
    w.outdent();
    w.line("</record>");
    w.outdent();
    w.line("</filter>");
}
