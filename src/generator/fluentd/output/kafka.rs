//! Kafka store. Brokers come from the explicit `brokers` list or fall back
//! to the output URL; the topic falls back to the URL path and then to the
//! literal `topic`.

use crate::constants;
use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, ConfWriter};
use crate::generator::security::AuthMode;
use crate::generator::url;

use super::{dedot_filter, write_buffer};

const DEFAULT_TOPIC: &str = "topic";

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR) {
    dedot_filter(w);
    w.blank();

    let topic = topic(out);
    let store_id = component_id(&out.spec.name);
    w.line("<match **>");
    w.indent();
    w.line("@type kafka2");
    w.line(&format!("@id {store_id}"));
    w.line(&format!("brokers {}", brokers(out)));
    w.line(&format!("default_topic {topic}"));
    w.line("use_event_time true");
    if let Some(compression) = out.tuning.as_ref().and_then(|t| t.compression) {
        w.line(&format!("compression_codec {}", compression.as_str()));
    }
    security(w, out);
    w.line("<format>");
    w.indent();
    w.line("@type json");
    w.outdent();
    w.line("</format>");
    write_buffer(w, &[format!("_{topic}")], &store_id, out);
    w.outdent();
    w.line("</match>");
}

fn brokers(out: &OutputIR) -> String {
    let kafka = out.spec.kafka.as_ref();
    let declared: Vec<String> = kafka
        .map(|k| {
            k.brokers
                .iter()
                .filter_map(|b| url::parse(b).map(|u| u.host_port()))
                .collect()
        })
        .unwrap_or_default();
    if !declared.is_empty() {
        return declared.join(",");
    }
    out.spec
        .url
        .as_deref()
        .and_then(url::parse)
        .map(|u| u.host_port())
        .unwrap_or_default()
}

fn topic(out: &OutputIR) -> String {
    if let Some(topic) = out.spec.kafka.as_ref().and_then(|k| {
        k.topic.as_deref().filter(|t| !t.is_empty())
    }) {
        return topic.to_string();
    }
    if let Some(u) = out.spec.url.as_deref().and_then(url::parse) {
        let topic = u.path.trim_start_matches('/');
        if !topic.is_empty() {
            return topic.to_string();
        }
    }
    DEFAULT_TOPIC.to_string()
}

fn security(w: &mut ConfWriter, out: &OutputIR) {
    let secret_name = out.spec.secret.as_ref().map(|s| s.name.as_str()).unwrap_or_default();
    if out.security.auth == AuthMode::Basic {
        w.line(&format!(
            "sasl_plain_username \"#{{File.read('{}')}}\"",
            constants::secret_path(secret_name, constants::CLIENT_USERNAME_KEY)
        ));
        w.line(&format!(
            "sasl_plain_password \"#{{File.read('{}')}}\"",
            constants::secret_path(secret_name, constants::CLIENT_PASSWORD_KEY)
        ));
    }
    if let (Some(key), Some(cert)) = (&out.security.tls.key_path, &out.security.tls.cert_path) {
        w.line(&format!("ssl_client_cert_key '{key}'"));
        w.line(&format!("ssl_client_cert '{cert}'"));
    }
    if let Some(ca) = &out.security.tls.ca_path {
        w.line(&format!("ssl_ca_cert '{ca}'"));
    }
    if let AuthMode::Sasl { mechanisms, over_ssl, .. } = &out.security.auth {
        w.line(&format!("sasl_over_ssl {over_ssl}"));
        if let Some(mechanism) = mechanisms {
            w.line(&format!("scram_mechanism {mechanism}"));
        }
        if out.security.tls.passphrase.is_some() {
            w.line(&format!(
                "ssl_client_cert_key_password \"#{{File.read('{}')}}\"",
                constants::secret_path(secret_name, constants::PASSPHRASE_KEY)
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{Kafka, OutputSpec, OutputType};
    use crate::generator::security::SecurityFragment;

    fn ir(url: Option<&str>, kafka: Option<Kafka>) -> OutputIR {
        OutputIR {
            spec: OutputSpec {
                name: "kafka-receiver".to_string(),
                output_type: OutputType::Kafka,
                url: url.map(String::from),
                elasticsearch: None,
                fluentd_forward: None,
                loki: None,
                kafka,
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
            label: "KAFKA_RECEIVER".to_string(),
            security: SecurityFragment::none(),
            tuning: None,
            pipeline_labels: vec![],
        }
    }

    #[test]
    fn topic_falls_back_to_url_path_then_default() {
        let with_path = ir(Some("tls://broker:9092/app-topic"), None);
        assert_eq!(topic(&with_path), "app-topic");
        let no_path = ir(Some("tls://broker:9092"), None);
        assert_eq!(topic(&no_path), "topic");
        let explicit = ir(
            Some("tls://broker:9092/ignored"),
            Some(Kafka { topic: Some("declared".to_string()), brokers: vec![] }),
        );
        assert_eq!(topic(&explicit), "declared");
    }

    #[test]
    fn brokers_prefer_declared_list() {
        let declared = ir(
            Some("tls://fallback:9092"),
            Some(Kafka {
                topic: None,
                brokers: vec!["tls://b1:9092".to_string(), "tls://b2:9092".to_string()],
            }),
        );
        assert_eq!(brokers(&declared), "b1:9092,b2:9092");
        let fallback = ir(Some("tls://fallback:9092/t"), None);
        assert_eq!(brokers(&fallback), "fallback:9092");
    }
}
