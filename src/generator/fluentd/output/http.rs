//! Generic JSON-over-HTTP store.

use crate::constants;
use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, ConfWriter};
use crate::generator::security::AuthMode;

use super::{dedot_filter, read_secret_rescue, write_buffer};

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR) {
    dedot_filter(w);
    w.blank();

    let http = out.spec.http.clone().unwrap_or_default();
    let secret_name = out.spec.secret.as_ref().map(|s| s.name.as_str()).unwrap_or_default();
    let store_id = component_id(&out.spec.name);
    let method = http.method.as_deref().unwrap_or("post").to_ascii_lowercase();

    w.line("<match **>");
    w.indent();
    w.line("@type http");
    w.line(&format!("@id {store_id}"));
    w.line(&format!("endpoint {}", out.spec.url.as_deref().unwrap_or_default()));
    w.line(&format!("http_method {method}"));
    w.line("content_type \"application/x-ndjson\"");
    if let Some(headers) = &http.headers {
        if !headers.is_empty() {
            let rendered: Vec<String> =
                headers.iter().map(|(k, v)| format!("\"{k}\":\"{v}\"")).collect();
            w.line(&format!("headers {{{}}}", rendered.join(",")));
        }
    }
    if let Some(timeout) = http.timeout {
        w.line(&format!("read_timeout {timeout}"));
    }
    match out.security.auth {
        AuthMode::Basic => {
            w.line("<auth>");
            w.indent();
            w.line("method basic");
            w.line(&format!(
                "username {}",
                read_secret_rescue(&constants::secret_path(secret_name, constants::CLIENT_USERNAME_KEY))
            ));
            w.line(&format!(
                "password {}",
                read_secret_rescue(&constants::secret_path(secret_name, constants::CLIENT_PASSWORD_KEY))
            ));
            w.outdent();
            w.line("</auth>");
        }
        AuthMode::Bearer => {
            w.line("<auth>");
            w.indent();
            w.line("method bearer");
            w.line(&format!(
                "token {}",
                read_secret_rescue(&constants::secret_path(secret_name, constants::BEARER_TOKEN_FILE_KEY))
            ));
            w.outdent();
            w.line("</auth>");
        }
        _ => {}
    }
    if let (Some(key), Some(cert)) = (&out.security.tls.key_path, &out.security.tls.cert_path) {
        w.line(&format!("tls_private_key_path '{key}'"));
        w.line(&format!("tls_client_cert_path '{cert}'"));
    }
    if let Some(ca) = &out.security.tls.ca_path {
        w.line(&format!("tls_ca_cert_path '{ca}'"));
    }
    if let Some(passphrase) = &out.security.tls.passphrase {
        w.line(&format!("tls_client_private_key_passphrase \"{passphrase}\""));
    }
    if out.security.tls.insecure_skip_verify {
        w.line("tls_verify_mode none");
    }
    write_buffer(w, &[], &store_id, out);
    w.outdent();
    w.line("</match>");
}
