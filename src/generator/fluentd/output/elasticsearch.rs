//! Elasticsearch store. Index selection happens record-side through the
//! viaq_data_model filter: infrastructure and audit records go to the
//! static `infra-write`/`audit-write` indices, application records resolve
//! a structured index (annotation, key, then static name) falling back to
//! `app-write`.

use crate::constants;
use crate::generator::composer::OutputIR;
use crate::generator::fluentd::{AUDIT_TAGS, INFRA_TAGS_MULTILINE};
use crate::generator::helpers::{component_id, ConfWriter};
use crate::generator::security::AuthMode;
use crate::generator::url;

use super::{read_secret_or_empty, write_buffer};

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR) {
    index_name_filter(w, out);
    prune_labels_filter(w);
    w.blank();
    w.line("#remove structured field if present");
    w.lines(
        r#"<filter **>
  @type record_modifier
  char_encoding utf-8:utf-8
  remove_keys structured
</filter>"#,
    );
    w.blank();

    let store_id = component_id(&out.spec.name);
    let retry_tag = format!("retry_{store_id}");
    store(w, out, &retry_tag, &retry_tag, None);
    w.blank();
    store(w, out, "**", &store_id, Some(&retry_tag));
}

fn index_name_filter(w: &mut ConfWriter, out: &OutputIR) {
    let es = out.spec.elasticsearch.as_ref();
    w.line("# Viaq Data Model");
    w.line("<filter **>");
    w.indent();
    w.line("@type viaq_data_model");
    w.line("enable_openshift_model false");
    w.line("enable_prune_empty_fields false");
    w.line("rename_time false");
    w.line("undefined_dot_replace_char UNUSED");
    w.line("elasticsearch_index_prefix_field 'viaq_index_name'");
    if let Some(key) = es.and_then(|e| e.structured_type_key.as_deref()) {
        w.line(&format!("structured_type_key {key}"));
    }
    if let Some(name) = es.and_then(|e| e.structured_type_name.as_deref()) {
        w.line(&format!("structured_type_name {name}"));
    }
    if es.is_some_and(|e| e.enable_structured_container_logs) {
        w.line(&format!(
            "structured_type_annotation_prefix {}",
            constants::STRUCTURED_CONTAINER_ANNOTATION_PREFIX.trim_end_matches('/')
        ));
    }
    w.line("<elasticsearch_index_name>");
    w.indent();
    w.line("enabled 'true'");
    w.line(&format!("tag \"{INFRA_TAGS_MULTILINE}\""));
    w.line("name_type static");
    w.line("static_index_name infra-write");
    w.outdent();
    w.line("</elasticsearch_index_name>");
    w.line("<elasticsearch_index_name>");
    w.indent();
    w.line("enabled 'true'");
    w.line(&format!("tag \"{AUDIT_TAGS}\""));
    w.line("name_type static");
    w.line("static_index_name audit-write");
    w.outdent();
    w.line("</elasticsearch_index_name>");
    w.line("<elasticsearch_index_name>");
    w.indent();
    w.line("enabled 'true'");
    w.line("tag \"**\"");
    w.line("name_type structured");
    w.line("static_index_name app-write");
    w.outdent();
    w.line("</elasticsearch_index_name>");
    w.outdent();
    w.line("</filter>");
}

fn prune_labels_filter(w: &mut ConfWriter) {
    w.lines(
        r#"<filter **>
  @type viaq_data_model
  enable_prune_labels true
  enable_openshift_model false
  rename_time false
  undefined_dot_replace_char UNUSED
  prune_labels_exclusions app.kubernetes.io/name,app.kubernetes.io/instance,app.kubernetes.io/version,app.kubernetes.io/component,app.kubernetes.io/part-of,app.kubernetes.io/managed-by,app.kubernetes.io/created-by
</filter>"#,
    );
}

fn store(w: &mut ConfWriter, out: &OutputIR, match_tags: &str, store_id: &str, retry_tag: Option<&str>) {
    let parsed = out.spec.url.as_deref().and_then(url::parse);
    let (host, port, scheme) = match &parsed {
        Some(u) => (u.host.clone(), u.port.unwrap_or(9200), u.scheme.clone()),
        None => (String::new(), 9200, "http".to_string()),
    };

    w.line(&format!("<match {match_tags}>"));
    w.indent();
    w.line("@type elasticsearch");
    w.line(&format!("@id {store_id}"));
    w.line(&format!("host {host}"));
    w.line(&format!("port {port}"));
    w.line("verify_es_version_at_startup false");
    if url::is_tls_scheme(&scheme) {
        w.line("scheme https");
        w.line("ssl_version TLSv1_2");
        if out.spec.tls.as_ref().is_some_and(|t| t.insecure_skip_verify) {
            w.line("ssl_verify false");
        }
        if let (Some(key), Some(cert)) = (&out.security.tls.key_path, &out.security.tls.cert_path) {
            w.line(&format!("client_key '{key}'"));
            w.line(&format!("client_cert '{cert}'"));
        }
        if let Some(ca) = &out.security.tls.ca_path {
            w.line(&format!("ca_file '{ca}'"));
        }
    }
    if out.security.auth == AuthMode::Basic {
        let secret_name = out.spec.secret.as_ref().map(|s| s.name.as_str()).unwrap_or_default();
        w.line(&format!(
            "user {}",
            read_secret_or_empty(&constants::secret_path(secret_name, constants::CLIENT_USERNAME_KEY))
        ));
        w.line(&format!(
            "password {}",
            read_secret_or_empty(&constants::secret_path(secret_name, constants::CLIENT_PASSWORD_KEY))
        ));
    }
    if let Some(headers) = out.spec.elasticsearch.as_ref().and_then(|e| e.headers.as_ref()) {
        let rendered: Vec<String> = headers.iter().map(|(k, v)| format!("\"{k}\":\"{v}\"")).collect();
        w.line(&format!("custom_headers {{{}}}", rendered.join(",")));
    }
    w.line("target_index_key viaq_index_name");
    w.line("id_key viaq_msg_id");
    w.line("remove_keys viaq_index_name");
    w.line("type_name _doc");
    if let Some(tag) = retry_tag {
        w.line(&format!("retry_tag {tag}"));
    }
    w.line("http_backend typhoeus");
    w.line("write_operation create");
    w.line("# https://github.com/uken/fluent-plugin-elasticsearch#suppress_type_name");
    w.line("suppress_type_name 'true'");
    w.line("reload_connections 'true'");
    w.line("# https://github.com/uken/fluent-plugin-elasticsearch#reload-after");
    w.line("reload_after '200'");
    w.line("# https://github.com/uken/fluent-plugin-elasticsearch#sniffer-class-name");
    w.line("sniffer_class_name 'Fluent::Plugin::ElasticsearchSimpleSniffer'");
    w.line("reload_on_failure false");
    w.line("# 2 ^ 31");
    w.line("request_timeout 2147483648");
    write_buffer(w, &[], store_id, out);
    w.outdent();
    w.line("</match>");
}
