//! Loki store. Label fields are copied to staging keys by a preceding
//! record_modifier filter; the loki plugin turns them into stream labels
//! and drops the staging keys.

use std::collections::BTreeSet;

use crate::constants;
use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, ConfWriter};
use crate::generator::security::AuthMode;
use crate::generator::url;

use super::{read_secret_or_empty, write_buffer};

const DEFAULT_LABEL_KEYS: &[&str] = &[
    "log_type",
    "kubernetes.namespace_name",
    "kubernetes.pod_name",
    "kubernetes.container_name",
];

const REQUIRED_LABEL_KEYS: &[&str] = &["kubernetes.host", "tag"];

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

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR) {
    let keys = label_keys(out);

    // Stage each label under a leading-underscore key the plugin consumes.
    w.line("<filter **>");
    w.indent();
    w.line("@type record_modifier");
    w.line("<record>");
    w.indent();
    for key in &keys {
        let staged = format!("_{}", key.replace('.', "_"));
        match key.as_str() {
            "tag" => w.line("_tag ${tag}"),
            "kubernetes.host" => w.line(&format!(
                "{staged} \"#{{ENV['{}']}}\"",
                constants::ENV_NODE_NAME
            )),
            _ => {
                let dig = key
                    .split('.')
                    .map(|part| format!("\"{part}\""))
                    .collect::<Vec<_>>()
                    .join(",");
                w.line(&format!("{staged} ${{record.dig({dig})}}"));
            }
        }
    }
    w.outdent();
    w.line("</record>");
    w.outdent();
    w.line("</filter>");
    w.blank();

    let parsed = out.spec.url.as_deref().and_then(url::parse);
    let url_base = parsed
        .as_ref()
        .map(|u| format!("{}://{}{}", u.scheme, u.host_port(), u.path))
        .unwrap_or_default();
    let store_id = component_id(&out.spec.name);
    let tenant = out
        .spec
        .loki
        .as_ref()
        .and_then(|l| l.tenant_key.as_deref())
        .unwrap_or("log_type");

    w.line("<match **>");
    w.indent();
    w.line("@type loki");
    w.line(&format!("@id {store_id}"));
    w.line("line_format json");
    w.line(&format!("url {url_base}"));
    w.line(&format!("tenant ${{$.{tenant}}}"));
    security(w, out);
    w.line("<label>");
    w.indent();
    for key in &keys {
        let name = key.replace('.', "_");
        w.line(&format!("{name} _{name}"));
    }
    w.outdent();
    w.line("</label>");
    write_buffer(w, &[format!("$.{tenant}")], &store_id, out);
    w.outdent();
    w.line("</match>");
}

fn security(w: &mut ConfWriter, out: &OutputIR) {
    let secret_name = out.spec.secret.as_ref().map(|s| s.name.as_str()).unwrap_or_default();
    if out.security.auth == AuthMode::Basic {
        w.line(&format!(
            "username {}",
            read_secret_or_empty(&constants::secret_path(secret_name, constants::CLIENT_USERNAME_KEY))
        ));
        w.line(&format!(
            "password {}",
            read_secret_or_empty(&constants::secret_path(secret_name, constants::CLIENT_PASSWORD_KEY))
        ));
    }
    if out.security.auth == AuthMode::Bearer {
        w.line(&format!(
            "bearer_token_file '{}'",
            constants::secret_path(secret_name, constants::BEARER_TOKEN_FILE_KEY)
        ));
    }
    if let (Some(key), Some(cert)) = (&out.security.tls.key_path, &out.security.tls.cert_path) {
        w.line(&format!("key '{key}'"));
        w.line(&format!("cert '{cert}'"));
    }
    if let Some(ca) = &out.security.tls.ca_path {
        w.line(&format!("ca_cert '{ca}'"));
    }
    if out.security.tls.insecure_skip_verify {
        w.line("insecure_tls true");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{Loki, OutputSpec, OutputType};
    use crate::generator::security::SecurityFragment;

    fn ir(loki: Option<Loki>) -> OutputIR {
        OutputIR {
            spec: OutputSpec {
                name: "loki".to_string(),
                output_type: OutputType::Loki,
                url: Some("https://loki.svc:3100".to_string()),
                elasticsearch: None,
                fluentd_forward: None,
                loki,
                kafka: None,
                syslog: None,
                cloudwatch: None,
                splunk: None,
                http: None,
                google_cloud_logging: None,
                azure_monitor: None,
                tls: None,
                secret: None,
                tuning: None,
            },
            label: "LOKI".to_string(),
            security: SecurityFragment::none(),
            tuning: None,
            pipeline_labels: vec![],
        }
    }

    #[test]
    fn default_labels_include_required_keys() {
        let keys = label_keys(&ir(None));
        assert!(keys.contains(&"kubernetes.host".to_string()));
        assert!(keys.contains(&"tag".to_string()));
        assert!(keys.contains(&"log_type".to_string()));
    }

    #[test]
    fn custom_labels_still_gain_required_keys() {
        let keys = label_keys(&ir(Some(Loki {
            tenant_key: None,
            label_keys: vec!["kubernetes.labels.app".to_string()],
        })));
        assert!(keys.contains(&"kubernetes.labels.app".to_string()));
        assert!(keys.contains(&"kubernetes.host".to_string()));
        assert!(!keys.contains(&"log_type".to_string()));
    }
}
