//! Syslog store via the remote_syslog plugin. Header fields accept
//! literals, the word `tag`, or `$.field.path` record accessors which are
//! substituted per record (and double as buffer chunk keys).

use regex::Regex;

use crate::constants;
use crate::crd::{Syslog, SyslogRfc};
use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, ConfWriter};
use crate::generator::url;

use super::write_buffer;

/// Record-accessor expressions look like `$.message.appname_key`.
fn is_key_expr(value: &str) -> bool {
    // The accessor grammar is a `$` followed by dotted word segments.
    Regex::new(r"^\$(\.[a-zA-Z0-9_]+)+$").map(|re| re.is_match(value)).unwrap_or(false)
}

fn header_value(value: &str) -> String {
    if is_key_expr(value) {
        format!("${{{value}}}")
    } else if value == "tag" {
        "${tag}".to_string()
    } else {
        value.to_string()
    }
}

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR) {
    // Embedded JSON payloads are expanded before framing so that
    // `$.message.<key>` accessors resolve.
    w.lines(
        r#"<filter **>
  @type parse_json_field
  json_fields  message
  merge_json_log false
  replace_json_log true
</filter>"#,
    );
    w.blank();

    let syslog = out.spec.syslog.clone().unwrap_or_default();
    if syslog.add_log_source {
        add_log_source_filter(w);
        w.blank();
    }
    store(w, out, &syslog);
}

fn store(w: &mut ConfWriter, out: &OutputIR, syslog: &Syslog) {
    let parsed = out.spec.url.as_deref().and_then(url::parse);
    let (host, port, scheme) = match &parsed {
        Some(u) => (u.host.clone(), u.port.unwrap_or(514), u.scheme.clone()),
        None => (String::new(), 514, "udp".to_string()),
    };
    let protocol = url::plain_scheme(&scheme);
    let store_id = component_id(&out.spec.name);
    let facility = syslog.facility.as_deref().unwrap_or("user");
    let severity = syslog.severity.as_deref().unwrap_or("debug");

    let mut chunk_keys = Vec::new();
    let mut chunk_key = |value: &Option<String>| {
        if let Some(v) = value {
            if is_key_expr(v) {
                chunk_keys.push(v.clone());
            } else if v == "tag" {
                chunk_keys.push("tag".to_string());
            }
        }
    };
    chunk_key(&syslog.tag);
    chunk_key(&syslog.app_name);
    chunk_key(&syslog.msg_id);
    chunk_key(&syslog.proc_id);
    chunk_key(&syslog.facility);
    chunk_key(&syslog.severity);

    w.line("<match **>");
    w.indent();
    w.line("@type remote_syslog");
    w.line(&format!("@id {store_id}"));
    w.line(&format!("host {host}"));
    w.line(&format!("port {port}"));
    w.line(&format!("rfc {}", syslog.rfc.as_str()));
    w.line(&format!("facility {}", header_value(facility)));
    w.line(&format!("severity {}", header_value(severity)));
    if let Some(app_name) = &syslog.app_name {
        w.line(&format!("appname {}", header_value(app_name)));
    }
    if let Some(msg_id) = &syslog.msg_id {
        w.line(&format!("msgid {}", header_value(msg_id)));
    }
    if let Some(proc_id) = &syslog.proc_id {
        w.line(&format!("procid {}", header_value(proc_id)));
    }
    if syslog.rfc == SyslogRfc::Rfc3164 {
        if let Some(tag) = &syslog.tag {
            w.line(&format!("program {}", header_value(tag)));
        }
    }
    w.line(&format!("protocol {protocol}"));
    w.line("packet_size 4096");
    w.line(&format!("hostname \"#{{ENV['{}']}}\"", constants::ENV_NODE_NAME));
    if url::is_tls_scheme(&scheme) {
        w.line("tls true");
        if let (Some(key), Some(cert)) = (&out.security.tls.key_path, &out.security.tls.cert_path) {
            w.line(&format!("client_cert_key '{key}'"));
            w.line(&format!("client_cert '{cert}'"));
        }
        if let Some(ca) = &out.security.tls.ca_path {
            w.line(&format!("ca_file '{ca}'"));
        }
        if out.security.tls.insecure_skip_verify {
            w.line("verify_mode 0");
        }
    }
    if protocol == "tcp" {
        w.lines(
            r#"timeout 60
timeout_exception true
keep_alive true
keep_alive_idle 75
keep_alive_cnt 9
keep_alive_intvl 7200"#,
        );
    }
    if let Some(payload_key) = &syslog.payload_key {
        w.line("<format>");
        w.indent();
        w.line("@type single_json_value");
        w.line(&format!("message_key {payload_key}"));
        w.outdent();
        w.line("</format>");
    } else {
        w.line("<format>");
        w.indent();
        w.line("@type json");
        w.outdent();
        w.line("</format>");
    }
    write_buffer(w, &chunk_keys, &store_id, out);
    w.outdent();
    w.line("</match>");
}

fn add_log_source_filter(w: &mut ConfWriter) {
    w.lines(
        r#"<filter **>
  @type record_modifier
  <record>
    kubernetes_info ${if record.has_key?('kubernetes'); record['kubernetes']; else {}; end}
    namespace_info ${if record['kubernetes_info'] != nil && record['kubernetes_info'] != {}; "namespace_name=" + record['kubernetes_info']['namespace_name']; else nil; end}
    pod_info ${if record['kubernetes_info'] != nil && record['kubernetes_info'] != {}; "pod_name=" + record['kubernetes_info']['pod_name']; else nil; end}
    container_info ${if record['kubernetes_info'] != nil && record['kubernetes_info'] != {}; "container_name=" + record['kubernetes_info']['container_name']; else nil; end}
    msg_key ${if record.has_key?('message') && record['message'] != nil; record['message']; else nil; end}
    msg_info ${if record['msg_key'] != nil && record['msg_key'].is_a?(Hash); require 'json'; "message="+record['message'].to_json; elsif record['msg_key'] != nil; "message="+record['message']; else nil; end}
    message ${if record['msg_key'] != nil && record['kubernetes_info'] != nil && record['kubernetes_info'] != {}; record['namespace_info'] + ", " + record['container_info'] + ", " + record['pod_info'] + ", " + record['msg_info']; else record['message']; end}
    systemd_info ${if record.has_key?('systemd') && record['systemd']['t'].has_key?('PID'); record['systemd']['u']['SYSLOG_IDENTIFIER'] += "[" + record['systemd']['t']['PID'] + "]"; else {}; end}
  </record>
  remove_keys kubernetes_info, namespace_info, pod_info, container_info, msg_key, msg_info, systemd_info
</filter>"#,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_expressions_are_recognized() {
        assert!(is_key_expr("$.message.appname_key"));
        assert!(is_key_expr("$.kubernetes.namespace_name"));
        assert!(!is_key_expr("literal"));
        assert!(!is_key_expr("$message"));
        assert!(!is_key_expr("tag"));
    }

    #[test]
    fn header_values_substitute_accessors() {
        assert_eq!(header_value("$.message.appname_key"), "${$.message.appname_key}");
        assert_eq!(header_value("tag"), "${tag}");
        assert_eq!(header_value("myapp"), "myapp");
    }
}
