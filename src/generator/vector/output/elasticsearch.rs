//! Elasticsearch sink. A preceding remap resolves the per-record write
//! index: static `infra-write`/`audit-write`, and for application records
//! the structured-index precedence (container annotation, structured key,
//! structured name) over the `app-write` default.

use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, make_inputs, ConfWriter};
use crate::generator::vector::elements::{batch_block, buffer_block, remap, request_block, tls_block};

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR, inputs: &[String]) {
    let id = component_id(&out.spec.name);
    let index_id = format!("{id}_index");
    remap(w, Some("Set Elasticsearch index"), &index_id, inputs, &index_vrl(out));
    let dedot_id = super::dedot(w, out, &[index_id]);

    w.line(&format!("[sinks.{id}]"));
    w.line("type = \"elasticsearch\"");
    w.line(&format!("inputs = {}", make_inputs(&[dedot_id])));
    w.line(&format!(
        "endpoint = \"{}\"",
        out.spec.url.as_deref().unwrap_or_default()
    ));
    w.line("bulk.index = \"{{ write_index }}\"");
    w.line("bulk.action = \"create\"");
    if let Some(compression) = out.tuning.as_ref().and_then(|t| t.compression) {
        w.line(&format!("compression = \"{}\"", compression.as_str()));
    }
    w.line("request.timeout_secs = 2147483648");
    if let Some(headers) = out.spec.elasticsearch.as_ref().and_then(|e| e.headers.as_ref()) {
        if !headers.is_empty() {
            let rendered: Vec<String> = headers
                .iter()
                .map(|(k, v)| format!("\"{k}\" = \"{v}\""))
                .collect();
            w.line(&format!("request.headers = {{{}}}", rendered.join(", ")));
        }
    }
    w.line("id_key = \"_id\"");
    w.line("api_version = \"v6\"");
    w.blank();
    buffer_block(w, &id, out);
    request_block(w, &id, out);
    batch_block(w, &id, out);
    tls_block(w, &id, out);
    super::auth_block(w, &id, out);
}

fn index_vrl(out: &OutputIR) -> String {
    let es = out.spec.elasticsearch.as_ref();
    let mut vrl = String::from(
        r#"index = "default"
if (.log_type == "application"){
  index = "app"
}
if (.log_type == "infrastructure"){
  index = "infra"
}
if (.log_type == "audit"){
  index = "audit"
}
.write_index = index + "-write"
._id = encode_base64(uuid_v4())
del(.file)
del(.tag)
del(.source_type)"#,
    );

    let structured_key = es.and_then(|e| e.structured_type_key.as_deref());
    let structured_name = es.and_then(|e| e.structured_type_name.as_deref());
    if structured_key.is_some() || structured_name.is_some() {
        vrl.push_str("\nif .log_type == \"application\" && exists(.structured) {\n");
        if let Some(key) = structured_key {
            let accessor = key
                .split('.')
                .map(|part| format!("\"{part}\""))
                .collect::<Vec<_>>()
                .join(",");
            vrl.push_str(&format!("  val = get!(., [{accessor}])\n"));
            vrl.push_str("  if val != null {\n");
            vrl.push_str("    .write_index = \"app-\" + to_string!(val) + \"-write\"\n");
            if let Some(name) = structured_name {
                vrl.push_str("  } else {\n");
                vrl.push_str(&format!("    .write_index = \"app-{name}-write\"\n"));
            }
            vrl.push_str("  }\n");
        } else if let Some(name) = structured_name {
            vrl.push_str(&format!("  .write_index = \"app-{name}-write\"\n"));
        }
        vrl.push_str("}\n");
    }
    if es.is_some_and(|e| e.enable_structured_container_logs) {
        vrl.push_str(
            r#"if .log_type == "application" && exists(.kubernetes.annotations) {
  container_type = get!(.kubernetes.annotations, ["containerType.logging.openshift.io/" + to_string!(.kubernetes.container_name)])
  if container_type != null {
    .write_index = "app-" + to_string!(container_type) + "-write"
  }
}
"#,
        );
    }
    vrl
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{Elasticsearch, OutputSpec, OutputType};
    use crate::generator::security::SecurityFragment;

    fn ir(es: Option<Elasticsearch>) -> OutputIR {
        OutputIR {
            spec: OutputSpec {
                name: "es-1".to_string(),
                output_type: OutputType::Elasticsearch,
                url: Some("https://es.svc:9200".to_string()),
                elasticsearch: es,
                fluentd_forward: None,
                loki: None,
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
            label: "ES_1".to_string(),
            security: SecurityFragment::none(),
            tuning: None,
            pipeline_labels: vec![],
        }
    }

    #[test]
    fn index_vrl_defaults_to_log_type_indices() {
        let vrl = index_vrl(&ir(None));
        assert!(vrl.contains(".write_index = index + \"-write\""));
        assert!(!vrl.contains("structured"));
    }

    #[test]
    fn structured_key_takes_precedence_over_name() {
        let vrl = index_vrl(&ir(Some(Elasticsearch {
            structured_type_key: Some("kubernetes.labels.app".to_string()),
            structured_type_name: Some("fallback".to_string()),
            enable_structured_container_logs: false,
            headers: None,
        })));
        assert!(vrl.contains("get!(., [\"kubernetes\",\"labels\",\"app\"])"));
        assert!(vrl.contains(".write_index = \"app-fallback-write\""));
    }

    #[test]
    fn container_annotation_override_is_last() {
        let vrl = index_vrl(&ir(Some(Elasticsearch {
            structured_type_key: None,
            structured_type_name: Some("name".to_string()),
            enable_structured_container_logs: true,
            headers: None,
        })));
        let name_at = vrl.find("app-name-write").expect("structured name");
        let annotation_at = vrl
            .find("containerType.logging.openshift.io/")
            .expect("annotation override");
        assert!(name_at < annotation_at);
    }
}
