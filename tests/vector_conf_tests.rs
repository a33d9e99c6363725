//! # vector dialect tests
//!
//! Exercises the generator end to end for the vector collector: sink
//! shapes per output kind, the transform DAG, filter transforms, and the
//! OTEL schema switch.

mod common;

use common::{output, pipeline, secrets, spec};
use log_forwarder_operator::crd::{
    Cloudwatch, DropCondition, DropTest, Elasticsearch, FilterSpec, FilterType, Http, LogGroupBy,
    Loki, OutputSecretSpec, OutputType, PruneFilterSpec,
};
use log_forwarder_operator::generator::{generate, CollectorKind, GenerateOptions};
use log_forwarder_operator::generator::secrets::SecretMap;

fn vector(spec: &log_forwarder_operator::crd::ClusterLogForwarderSpec, secrets: &SecretMap) -> String {
    vector_with(spec, secrets, &GenerateOptions::default())
}

fn vector_with(
    spec: &log_forwarder_operator::crd::ClusterLogForwarderSpec,
    secrets: &SecretMap,
    options: &GenerateOptions,
) -> String {
    let result = generate(spec, secrets, CollectorKind::Vector, options);
    assert!(
        !result.has_errors(),
        "unexpected errors: {:?}",
        result.diagnostics
    );
    result.text
}

#[test]
fn kafka_sink_with_mutual_tls() {
    let mut out = output(
        "kafka-receiver",
        OutputType::Kafka,
        Some("tls://broker1-kafka.svc.messaging.cluster.local:9092/topic"),
    );
    out.secret = Some(OutputSecretSpec { name: "kafka-receiver-1".to_string() });
    let clf = spec(
        vec![out],
        vec![pipeline("pipeline", &["application", "infrastructure", "audit"], &["kafka-receiver"])],
    );
    let secrets = secrets(
        "kafka-receiver-1",
        &[("tls.crt", "junk"), ("tls.key", "junk"), ("ca-bundle.crt", "junk")],
    );
    let conf = vector(&clf, &secrets);
    assert!(conf.contains("[sinks.kafka_receiver]"));
    assert!(conf.contains("type = \"kafka\""));
    assert!(conf.contains("bootstrap_servers = \"broker1-kafka.svc.messaging.cluster.local:9092\""));
    assert!(conf.contains("topic = \"topic\""));
    assert!(conf.contains("[sinks.kafka_receiver.tls]"));
    assert!(conf.contains("key_file = \"/var/run/ocp-collector/secrets/kafka-receiver-1/tls.key\""));
    assert!(conf.contains("crt_file = \"/var/run/ocp-collector/secrets/kafka-receiver-1/tls.crt\""));
    assert!(conf.contains("ca_file = \"/var/run/ocp-collector/secrets/kafka-receiver-1/ca-bundle.crt\""));
}

#[test]
fn cloudwatch_sts_comments_out_static_auth() {
    let mut out = output("cw", OutputType::Cloudwatch, None);
    out.cloudwatch = Some(Cloudwatch {
        region: "us-east-test".to_string(),
        group_by: LogGroupBy::LogType,
        group_prefix: None,
    });
    out.secret = Some(OutputSecretSpec { name: "cw-secret".to_string() });
    let clf = spec(vec![out], vec![pipeline("cw-forward", &["application"], &["cw"])]);

    let sts = secrets("cw-secret", &[("role_arn", "arn:aws:iam::123456789012:role/cluster-logs")]);
    let conf = vector(&clf, &sts);
    assert!(conf.contains("# role_arn and identity token set via env vars"));
    assert!(!conf.contains("auth.access_key_id"));
    assert!(conf.contains("group_name = \"{{ group_name }}\""));
    assert!(conf.contains("stream_name = \"{{ stream_name }}\""));

    let static_keys = secrets(
        "cw-secret",
        &[("aws_access_key_id", "xXyYzZ"), ("aws_secret_access_key", "sSxXyYzZ")],
    );
    let conf = vector(&clf, &static_keys);
    assert!(conf.contains("auth.access_key_id = \"xXyYzZ\""));
    assert!(conf.contains("auth.secret_access_key = \"sSxXyYzZ\""));
}

#[test]
fn loki_labels_and_tenant_key() {
    let mut out = output("loki", OutputType::Loki, Some("https://loki.svc:3100"));
    out.loki = Some(Loki {
        tenant_key: Some("kubernetes.namespace_name".to_string()),
        label_keys: vec![],
    });
    let clf = spec(vec![out], vec![pipeline("p", &["application"], &["loki"])]);
    let conf = vector(&clf, &SecretMap::new());
    assert!(conf.contains("type = \"loki\""));
    assert!(conf.contains("tenant_id = \"{{kubernetes.namespace_name}}\""));
    assert!(conf.contains("[sinks.loki.labels]"));
    assert!(conf.contains("kubernetes_host = \"${VECTOR_SELF_NODE_NAME}\""));
    assert!(conf.contains("log_type = \"{{log_type}}\""));
    assert!(conf.contains("out_of_order_action = \"accept\""));
}

#[test]
fn elasticsearch_structured_index_precedence() {
    let mut out = output("es", OutputType::Elasticsearch, Some("https://es.svc:9200"));
    out.elasticsearch = Some(Elasticsearch {
        structured_type_key: Some("kubernetes.labels.app".to_string()),
        structured_type_name: Some("fallback".to_string()),
        enable_structured_container_logs: false,
        headers: None,
    });
    let clf = spec(vec![out], vec![pipeline("p", &["application"], &["es"])]);
    let conf = vector(&clf, &SecretMap::new());
    assert!(conf.contains("bulk.index = \"{{ write_index }}\""));
    assert!(conf.contains(".write_index = \"app-\" + to_string!(val) + \"-write\""));
    assert!(conf.contains(".write_index = \"app-fallback-write\""));
}

#[test]
fn drop_and_prune_filters_become_transforms() {
    let mut clf = spec(
        vec![output("http-out", OutputType::Http, Some("https://logs.example.com"))],
        vec![pipeline("p", &["application"], &["http-out"])],
    );
    clf.filters = vec![
        FilterSpec {
            name: "drop-debug".to_string(),
            filter_type: FilterType::Drop,
            kube_api_audit: None,
            drop: Some(vec![DropTest {
                drop_conditions: vec![DropCondition {
                    field: ".level".to_string(),
                    matches: Some("debug".to_string()),
                    not_matches: None,
                }],
            }]),
            prune: None,
        },
        FilterSpec {
            name: "slim".to_string(),
            filter_type: FilterType::Prune,
            kube_api_audit: None,
            drop: None,
            prune: Some(PruneFilterSpec {
                in_: None,
                not_in: Some(vec![
                    ".log_type".to_string(),
                    ".message".to_string(),
                    ".kubernetes.namespace_name".to_string(),
                ]),
            }),
        },
    ];
    clf.pipelines[0].filter_refs = vec!["drop-debug".to_string(), "slim".to_string()];
    let conf = vector(&clf, &SecretMap::new());
    assert!(conf.contains("[transforms.p_0_drop_debug]"));
    assert!(conf.contains("type = \"filter\""));
    assert!(conf.contains("!((match(to_string(.level) ?? \"\", r'debug')))"));
    assert!(conf.contains("[transforms.p_1_slim]"));
    assert!(conf.contains("pruned.kubernetes.namespace_name = .kubernetes.namespace_name"));
    // the drop transform feeds the prune transform which feeds the pipeline
    let drop_at = conf.find("[transforms.p_0_drop_debug]").unwrap();
    let prune_at = conf.find("[transforms.p_1_slim]").unwrap();
    let pipeline_at = conf.find("[transforms.p]\n").unwrap();
    assert!(drop_at < prune_at && prune_at < pipeline_at);
}

#[test]
fn audit_filter_transform_drops_on_abort() {
    let mut clf = spec(
        vec![output("http-out", OutputType::Http, Some("https://logs.example.com"))],
        vec![pipeline("p", &["audit"], &["http-out"])],
    );
    clf.filters = vec![FilterSpec {
        name: "audit-policy".to_string(),
        filter_type: FilterType::KubeAPIAudit,
        kube_api_audit: None,
        drop: None,
        prune: None,
    }];
    clf.pipelines[0].filter_refs = vec!["audit-policy".to_string()];
    let conf = vector(&clf, &SecretMap::new());
    assert!(conf.contains("[transforms.p_0_audit_policy]"));
    assert!(conf.contains("drop_on_abort = true"));
    assert!(conf.contains("includes([404, 409, 422, 429], response_code)"));
}

#[test]
fn otel_schema_applies_to_http_sinks_only() {
    let mut http_out = output("otel-http", OutputType::Http, Some("https://collector.example.com"));
    http_out.http = Some(Http {
        headers: None,
        timeout: None,
        method: None,
        schema: Some("opentelemetry".to_string()),
    });
    let es_out = output("es", OutputType::Elasticsearch, Some("https://es.svc:9200"));
    let clf = spec(
        vec![http_out, es_out],
        vec![pipeline("p", &["application"], &["otel-http", "es"])],
    );

    let options = GenerateOptions { tuning: Default::default(), otel_schema: true };
    let conf = vector_with(&clf, &SecretMap::new(), &options);
    assert!(conf.contains("[transforms.otel_http_otel]"));
    assert!(conf.contains(".timeUnixNano"));
    assert!(conf.contains(".severityText = del(.level)"));
    // the elasticsearch sink is untouched by the schema switch
    let es_sink_at = conf.find("[sinks.es]").expect("es sink");
    assert!(!conf[es_sink_at..].contains("timeUnixNano"));

    // without the opt-in annotation nothing changes
    let conf = vector(&clf, &SecretMap::new());
    assert!(!conf.contains("timeUnixNano"));
}

#[test]
fn receiver_inputs_render_http_server_sources() {
    let mut clf = spec(
        vec![output("http-out", OutputType::Http, Some("https://logs.example.com"))],
        vec![pipeline("p", &["myreceiver"], &["http-out"])],
    );
    clf.inputs = vec![log_forwarder_operator::crd::InputSpec {
        name: "myreceiver".to_string(),
        application: None,
        infrastructure: None,
        audit: None,
        receiver: Some(log_forwarder_operator::crd::ReceiverSpec {
            receiver_type: log_forwarder_operator::crd::ReceiverType::Http,
            port: Some(7777),
            http: Some(log_forwarder_operator::crd::HttpReceiver {
                format: log_forwarder_operator::crd::HttpReceiverFormat::KubeAPIAudit,
            }),
            syslog: None,
        }),
    }];
    let conf = vector(&clf, &SecretMap::new());
    assert!(conf.contains("[sources.myreceiver]"));
    assert!(conf.contains("type = \"http_server\""));
    assert!(conf.contains("address = \"[::]:7777\""));
    assert!(conf.contains("[transforms.myreceiver_split]"));
    assert!(conf.contains("unnest!(.items)"));
}
