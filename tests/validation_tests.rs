//! # Validation tests
//!
//! End-to-end checks of the diagnostics contract: accumulation, ordering,
//! severity, and error suppression of the generated text.

mod common;

use common::{output, pipeline, secrets, spec};
use log_forwarder_operator::crd::{OutputSecretSpec, OutputType};
use log_forwarder_operator::generator::diagnostic::{DiagnosticKind, Severity};
use log_forwarder_operator::generator::{generate, CollectorKind, GenerateOptions};
use log_forwarder_operator::generator::secrets::SecretMap;

#[test]
fn all_findings_surface_in_one_call() {
    let clf = spec(
        vec![
            output("Bad_Name", OutputType::Http, Some("https://x.example")),
            output("bad-scheme", OutputType::Syslog, Some("https://syslog.example")),
        ],
        vec![pipeline("p", &["application", "ghost-input"], &["Bad_Name", "bad-scheme", "ghost-output"])],
    );
    let result = generate(&clf, &SecretMap::new(), CollectorKind::Vector, &GenerateOptions::default());
    assert!(result.has_errors());
    assert!(result.text.is_empty());
    let kinds: Vec<DiagnosticKind> = result.diagnostics.iter().map(|d| d.kind).collect();
    assert!(kinds.contains(&DiagnosticKind::InvalidName));
    assert!(kinds.contains(&DiagnosticKind::InvalidUrl));
    assert!(kinds.contains(&DiagnosticKind::UnknownInputRef));
    assert!(kinds.contains(&DiagnosticKind::UnknownOutputRef));
}

#[test]
fn diagnostics_follow_document_order() {
    let clf = spec(
        vec![
            output("first-bad", OutputType::Syslog, Some("https://one.example")),
            output("second-bad", OutputType::Syslog, Some("https://two.example")),
        ],
        vec![
            pipeline("a", &["application"], &["first-bad"]),
            pipeline("b", &["application"], &["second-bad"]),
        ],
    );
    let result = generate(&clf, &SecretMap::new(), CollectorKind::Vector, &GenerateOptions::default());
    let first = result
        .diagnostics
        .iter()
        .position(|d| d.ref_path == "outputs/first-bad")
        .expect("first output diagnostic");
    let second = result
        .diagnostics
        .iter()
        .position(|d| d.ref_path == "outputs/second-bad")
        .expect("second output diagnostic");
    assert!(first < second);
}

#[test]
fn deprecated_aws_credentials_key_warns_but_generates() {
    let mut out = output("cw", OutputType::Cloudwatch, None);
    out.cloudwatch = Some(log_forwarder_operator::crd::Cloudwatch {
        region: "us-east-1".to_string(),
        group_by: log_forwarder_operator::crd::LogGroupBy::LogType,
        group_prefix: None,
    });
    out.secret = Some(OutputSecretSpec { name: "cw".to_string() });
    let clf = spec(vec![out], vec![pipeline("p", &["application"], &["cw"])]);
    let secrets = secrets(
        "cw",
        &[(
            "credentials",
            "[default]\nrole_arn = arn:aws:iam::123456789012:role/sts\nweb_identity_token_file = /var/run/secrets/token",
        )],
    );
    let result = generate(&clf, &secrets, CollectorKind::Vector, &GenerateOptions::default());
    assert!(!result.has_errors());
    assert!(!result.text.is_empty());
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::Deprecation && d.severity == Severity::Warning));
}

#[test]
fn missing_secret_suppresses_output() {
    let mut out = output("splunk", OutputType::Splunk, Some("https://splunk.example:8088"));
    out.secret = Some(OutputSecretSpec { name: "absent".to_string() });
    let clf = spec(vec![out], vec![pipeline("p", &["application"], &["splunk"])]);
    let result = generate(&clf, &SecretMap::new(), CollectorKind::Vector, &GenerateOptions::default());
    assert!(result.has_errors());
    assert!(result.text.is_empty());
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::MissingSecretKey));
}

#[test]
fn fluentd_rejects_receiver_inputs_and_audit_filters() {
    let mut clf = spec(
        vec![output("http-out", OutputType::Http, Some("https://x.example"))],
        vec![pipeline("p", &["rcv"], &["http-out"])],
    );
    clf.inputs = vec![log_forwarder_operator::crd::InputSpec {
        name: "rcv".to_string(),
        application: None,
        infrastructure: None,
        audit: None,
        receiver: Some(log_forwarder_operator::crd::ReceiverSpec {
            receiver_type: log_forwarder_operator::crd::ReceiverType::Http,
            port: None,
            http: None,
            syslog: None,
        }),
    }];
    let result = generate(&clf, &SecretMap::new(), CollectorKind::Fluentd, &GenerateOptions::default());
    assert!(result.has_errors());
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::Unsupported));

    // the same spec is fine for vector
    let result = generate(&clf, &SecretMap::new(), CollectorKind::Vector, &GenerateOptions::default());
    assert!(!result.has_errors());
}

#[test]
fn duplicate_names_are_rejected_per_collection() {
    let clf = spec(
        vec![
            output("same", OutputType::Http, Some("https://a.example")),
            output("same", OutputType::Http, Some("https://b.example")),
        ],
        vec![pipeline("p", &["application"], &["same"])],
    );
    let result = generate(&clf, &SecretMap::new(), CollectorKind::Vector, &GenerateOptions::default());
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::DuplicateName));
}

#[test]
fn empty_output_refs_is_an_error() {
    let clf = spec(
        vec![output("o", OutputType::Http, Some("https://x.example"))],
        vec![pipeline("p", &["application"], &[])],
    );
    let result = generate(&clf, &SecretMap::new(), CollectorKind::Vector, &GenerateOptions::default());
    assert!(result.has_errors());
}
