//! Splunk HEC store. The collector token comes from the `hecToken` secret
//! key, read from the mounted file at startup.

use crate::constants;
use crate::crd::Compression;
use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, ConfWriter};
use crate::generator::url;

use super::{dedot_filter, read_secret_stripped, write_buffer};

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR) {
    dedot_filter(w);
    w.blank();

    let parsed = out.spec.url.as_deref().and_then(url::parse);
    let (host, port, scheme) = match &parsed {
        Some(u) => (u.host.clone(), u.port.unwrap_or(8088), u.scheme.clone()),
        None => (String::new(), 8088, "https".to_string()),
    };
    let splunk = out.spec.splunk.clone().unwrap_or_default();
    let secret_name = out.spec.secret.as_ref().map(|s| s.name.as_str()).unwrap_or_default();
    let store_id = component_id(&out.spec.name);

    w.line("<match **>");
    w.indent();
    w.line("@type splunk_hec");
    w.line(&format!("@id {store_id}"));
    w.line(&format!("hec_host {host}"));
    w.line(&format!("hec_port {port}"));
    w.line(&format!(
        "hec_token {}",
        read_secret_stripped(&constants::secret_path(secret_name, constants::SPLUNK_HEC_TOKEN_KEY))
    ));
    if let Some(index) = splunk.index_name.as_deref() {
        w.line(&format!("index {index}"));
    } else if let Some(index_key) = splunk.index_key.as_deref() {
        w.line(&format!("index_key {index_key}"));
    }
    if let Some(source) = splunk.source.as_deref() {
        w.line(&format!("source {source}"));
    }
    if let Some(Compression::Gzip) = out.tuning.as_ref().and_then(|t| t.compression) {
        w.line("gzip_compression true");
    }
    if url::is_tls_scheme(&scheme) {
        w.line("use_ssl true");
        if let (Some(key), Some(cert)) = (&out.security.tls.key_path, &out.security.tls.cert_path) {
            w.line(&format!("client_key '{key}'"));
            w.line(&format!("client_cert '{cert}'"));
        }
        if let Some(ca) = &out.security.tls.ca_path {
            w.line(&format!("ca_file '{ca}'"));
        }
        if out.security.tls.insecure_skip_verify {
            w.line("insecure_ssl true");
        }
    }
    w.line("<format>");
    w.indent();
    w.line("@type json");
    w.outdent();
    w.line("</format>");
    write_buffer(w, &[], &store_id, out);
    w.outdent();
    w.line("</match>");
}
