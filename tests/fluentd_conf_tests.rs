//! # fluentd dialect tests
//!
//! Exercises the generator end to end for the fluentd collector: the
//! CloudWatch credential scenarios, syslog header substitution, ordering
//! and uniqueness guarantees, and the filter-chain layout.

mod common;

use common::{labels, output, pipeline, secrets, spec};
use log_forwarder_operator::crd::{Cloudwatch, LogGroupBy, OutputSecretSpec, OutputType, Syslog, SyslogRfc};
use log_forwarder_operator::generator::{generate, CollectorKind, GenerateOptions};
use log_forwarder_operator::generator::secrets::SecretMap;

fn fluentd(spec: &log_forwarder_operator::crd::ClusterLogForwarderSpec, secrets: &SecretMap) -> String {
    let result = generate(spec, secrets, CollectorKind::Fluentd, &GenerateOptions::default());
    assert!(
        !result.has_errors(),
        "unexpected errors: {:?}",
        result.diagnostics
    );
    result.text
}

fn cloudwatch_spec(secret_name: &str) -> log_forwarder_operator::crd::ClusterLogForwarderSpec {
    let mut out = output("my-cloudwatch", OutputType::Cloudwatch, None);
    out.cloudwatch = Some(Cloudwatch {
        region: "anumber1".to_string(),
        group_by: LogGroupBy::LogType,
        group_prefix: None,
    });
    out.secret = Some(OutputSecretSpec { name: secret_name.to_string() });
    spec(
        vec![out],
        vec![pipeline("to-cloudwatch", &["application"], &["my-cloudwatch"])],
    )
}

#[test]
fn cloudwatch_static_credentials_grouped_by_log_type() {
    let secrets = secrets(
        "my-secret",
        &[("aws_access_key_id", "AKIA"), ("aws_secret_access_key", "SK")],
    );
    let conf = fluentd(&cloudwatch_spec("my-secret"), &secrets);

    assert!(conf.contains("<label @MY_CLOUDWATCH>"));
    assert!(conf.contains("@type cloudwatch_logs"));
    assert!(conf.contains("region anumber1"));
    assert!(conf.contains(
        "aws_key_id \"#{open('/var/run/ocp-collector/secrets/my-secret/aws_access_key_id','r') do |f|f.read.strip end}\""
    ));
    assert!(conf.contains(
        "aws_sec_key \"#{open('/var/run/ocp-collector/secrets/my-secret/aws_secret_access_key','r') do |f|f.read.strip end}\""
    ));
    assert!(conf.contains("cw_group_name infrastructure"));
    assert!(conf.contains("cw_group_name application"));
    assert!(conf.contains("cw_group_name audit"));
    assert!(!conf.contains("<web_identity_credentials>"));
}

#[test]
fn cloudwatch_sts_uses_web_identity_envs() {
    let secrets = secrets(
        "my-secret",
        &[("role_arn", "arn:aws:iam::123456789012:role/my-role-to-assume")],
    );
    let conf = fluentd(&cloudwatch_spec("my-secret"), &secrets);

    assert!(conf.contains("<web_identity_credentials>"));
    assert!(conf.contains("role_arn \"#{ENV['AWS_ROLE_ARN']}\""));
    assert!(conf.contains("web_identity_token_file \"#{ENV['AWS_WEB_IDENTITY_TOKEN_FILE']}\""));
    assert!(conf.contains("role_session_name \"#{ENV['AWS_ROLE_SESSION_NAME']}\""));
    assert!(!conf.contains("aws_key_id"));
}

#[test]
fn syslog_substitutes_message_path_headers() {
    let mut out = output("ext-syslog", OutputType::Syslog, Some("tls://syslog.example.com:6514"));
    out.syslog = Some(Syslog {
        severity: None,
        facility: None,
        rfc: SyslogRfc::Rfc5424,
        app_name: Some("$.message.appname_key".to_string()),
        proc_id: None,
        msg_id: None,
        tag: None,
        payload_key: None,
        add_log_source: false,
    });
    let clf = spec(
        vec![out],
        vec![pipeline("to-syslog", &["application"], &["ext-syslog"])],
    );
    let conf = fluentd(&clf, &SecretMap::new());
    assert!(conf.contains("@type remote_syslog"));
    assert!(conf.contains("rfc rfc5424"));
    assert!(conf.contains("appname ${$.message.appname_key}"));
    // the accessor doubles as a buffer chunk key
    assert!(conf.contains("<buffer $.message.appname_key>"));
    // payload JSON expansion precedes framing
    assert!(conf.contains("@type parse_json_field"));
}

#[test]
fn pipeline_filter_blocks_follow_declared_order() {
    let mut p = pipeline("ordered", &["application"], &["es"]);
    p.labels = Some(labels(&[("datacenter", "east")]));
    p.parse = Some("json".to_string());
    p.detect_multiline_errors = true;
    let clf = spec(
        vec![output("es", OutputType::Elasticsearch, Some("https://es.svc:9200"))],
        vec![p],
    );
    let conf = fluentd(&clf, &SecretMap::new());
    let label_block = conf
        .find("<label @ORDERED>")
        .expect("pipeline label present");
    let labels_at = conf[label_block..].find("openshift { \"labels\"").expect("labels stage") + label_block;
    let parse_at = conf[label_block..].find("@type parser").expect("parse stage") + label_block;
    let detect_at = conf[label_block..]
        .find("@type detect_exceptions")
        .expect("detect stage")
        + label_block;
    assert!(labels_at < parse_at && parse_at < detect_at);
    assert!(conf.contains("openshift { \"labels\": {\"datacenter\":\"east\"} }"));
}

#[test]
fn each_output_owns_exactly_one_label_block() {
    let clf = spec(
        vec![
            output("es-1", OutputType::Elasticsearch, Some("https://es1.svc:9200")),
            output("es-2", OutputType::Elasticsearch, Some("https://es2.svc:9200")),
        ],
        vec![
            pipeline("a", &["application"], &["es-1", "es-2"]),
            pipeline("b", &["infrastructure"], &["es-1"]),
        ],
    );
    let conf = fluentd(&clf, &SecretMap::new());
    assert_eq!(conf.matches("<label @ES_1>").count(), 1);
    assert_eq!(conf.matches("<label @ES_2>").count(), 1);
    // fan-out duplicates the record set to both outputs
    let a_block_at = conf.find("<label @A>").expect("pipeline a");
    assert!(conf[a_block_at..].contains("@type copy"));
}

#[test]
fn elasticsearch_index_routing_is_emitted() {
    let clf = spec(
        vec![output("es", OutputType::Elasticsearch, Some("https://es.svc:9200"))],
        vec![pipeline("p", &["application", "audit"], &["es"])],
    );
    let conf = fluentd(&clf, &SecretMap::new());
    assert!(conf.contains("static_index_name infra-write"));
    assert!(conf.contains("static_index_name audit-write"));
    assert!(conf.contains("static_index_name app-write"));
    assert!(conf.contains("target_index_key viaq_index_name"));
    assert!(conf.contains("retry_tag retry_es"));
}

#[test]
fn mutual_tls_paths_come_from_the_mounted_secret() {
    let mut out = output("forward", OutputType::FluentdForward, Some("tls://collector.remote:24224"));
    out.secret = Some(OutputSecretSpec { name: "fw-secret".to_string() });
    let clf = spec(vec![out], vec![pipeline("p", &["application"], &["forward"])]);
    let secrets = secrets(
        "fw-secret",
        &[
            ("tls.crt", "cert"),
            ("tls.key", "key"),
            ("ca-bundle.crt", "ca"),
            ("shared_key", "sk"),
        ],
    );
    let conf = fluentd(&clf, &secrets);
    assert!(conf.contains("tls_client_private_key_path '/var/run/ocp-collector/secrets/fw-secret/tls.key'"));
    assert!(conf.contains("tls_client_cert_path '/var/run/ocp-collector/secrets/fw-secret/tls.crt'"));
    assert!(conf.contains("tls_cert_path '/var/run/ocp-collector/secrets/fw-secret/ca-bundle.crt'"));
    assert!(conf.contains("shared_key"));
    assert!(conf.contains("self_hostname \"#{ENV['NODE_NAME']}\""));
}

#[test]
fn app_only_specs_discard_other_categories() {
    let clf = spec(
        vec![output("es", OutputType::Elasticsearch, Some("https://es.svc:9200"))],
        vec![pipeline("p", &["application"], &["es"])],
    );
    let conf = fluentd(&clf, &SecretMap::new());
    assert!(conf.contains("# Discard Infrastructure logs"));
    assert!(conf.contains("# Discard Audit logs"));
    assert!(conf.contains("# Include Application logs"));
    // no journal or audit sources for an app-only spec
    assert!(!conf.contains("@type systemd"));
    assert!(!conf.contains("tag linux-audit.log"));
}
