//! fluent-forward store: the TCP forward protocol with optional TLS and
//! shared-key authentication.

use crate::constants;
use crate::crd::Compression;
use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, ConfWriter};
use crate::generator::security::AuthMode;
use crate::generator::url;

use super::{read_secret_or_empty, write_buffer};

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR) {
    let parsed = out.spec.url.as_deref().and_then(url::parse);
    let (host, port, scheme) = match &parsed {
        Some(u) => (u.host.clone(), u.port.unwrap_or(24224), u.scheme.clone()),
        None => (String::new(), 24224, "tcp".to_string()),
    };
    let store_id = component_id(&out.spec.name);

    w.line("<match **>");
    w.indent();
    w.line("@type forward");
    w.line(&format!("@id {store_id}"));
    w.line("<server>");
    w.indent();
    w.line(&format!("host {host}"));
    w.line(&format!("port {port}"));
    w.outdent();
    w.line("</server>");
    w.line("heartbeat_type none");
    w.line("keepalive true");
    w.line("keepalive_timeout 30s");
    if let Some(Compression::Gzip) = out.tuning.as_ref().and_then(|t| t.compression) {
        w.line("compress gzip");
    }
    if url::is_tls_scheme(&scheme) {
        w.line("transport tls");
        w.line("tls_verify_hostname false");
        w.line("tls_version 'TLSv1_2'");
        if out.security.auth == AuthMode::SharedKey {
            let secret_name = out.spec.secret.as_ref().map(|s| s.name.as_str()).unwrap_or_default();
            let shared_key = out
                .spec
                .secret
                .as_ref()
                .map(|_| read_secret_or_empty(&constants::secret_path(secret_name, constants::SHARED_KEY)))
                .unwrap_or_default();
            w.line("<security>");
            w.indent();
            w.line(&format!("self_hostname \"#{{ENV['{}']}}\"", constants::ENV_NODE_NAME));
            w.line(&format!("shared_key {shared_key}"));
            w.outdent();
            w.line("</security>");
        }
        if let (Some(key), Some(cert)) = (&out.security.tls.key_path, &out.security.tls.cert_path) {
            w.line(&format!("tls_client_private_key_path '{key}'"));
            w.line(&format!("tls_client_cert_path '{cert}'"));
        }
        if let Some(ca) = &out.security.tls.ca_path {
            w.line(&format!("tls_cert_path '{ca}'"));
        }
        if out.security.tls.passphrase.is_some() {
            let secret_name = out.spec.secret.as_ref().map(|s| s.name.as_str()).unwrap_or_default();
            w.line(&format!(
                "tls_client_private_key_passphrase {}",
                read_secret_or_empty(&constants::secret_path(secret_name, constants::PASSPHRASE_KEY))
            ));
        }
        if out.security.tls.cert_path.is_none() && out.security.tls.ca_path.is_none() {
            w.line("tls_insecure_mode true");
        }
    }
    write_buffer(w, &[], &store_id, out);
    w.outdent();
    w.line("</match>");
}
