//! # Property tests
//!
//! Quantified invariants of the generator: determinism across arbitrary
//! well-formed specs, audit-policy monotonicity under added omissions, and
//! reassembly identity for full-line streams.

mod common;

use common::{output, pipeline, spec};
use log_forwarder_operator::crd::{AuditPolicyLevel, KubeApiAudit, OutputType};
use log_forwarder_operator::generator::filters::kube_api_audit::{Outcome, PolicyEvaluator};
use log_forwarder_operator::generator::viaq::{reassemble, CrioLine};
use log_forwarder_operator::generator::{generate, CollectorKind, GenerateOptions};
use log_forwarder_operator::generator::secrets::SecretMap;
use proptest::prelude::*;

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,20}[a-z0-9]".prop_map(|s| s)
}

proptest! {
    #[test]
    fn generation_is_deterministic(
        out_name in name_strategy(),
        pipeline_name in name_strategy(),
        host in "[a-z]{3,10}",
        port in 1024u16..=65535,
    ) {
        let url = format!("https://{host}.svc:{port}");
        let clf = spec(
            vec![output(&out_name, OutputType::Http, Some(&url))],
            vec![pipeline(&pipeline_name, &["application"], &[&out_name])],
        );
        for kind in [CollectorKind::Fluentd, CollectorKind::Vector] {
            let a = generate(&clf, &SecretMap::new(), kind, &GenerateOptions::default());
            let b = generate(&clf, &SecretMap::new(), kind, &GenerateOptions::default());
            prop_assert_eq!(a.text, b.text);
            prop_assert_eq!(a.diagnostics, b.diagnostics);
        }
    }

    #[test]
    fn adding_omissions_never_grows_the_audit_pass_set(
        verb in prop::sample::select(vec!["get", "list", "create", "update", "delete"]),
        user in prop::sample::select(vec![
            "alice",
            "system:serviceaccount:foo",
            "system:kube-scheduler",
        ]),
        code in prop::sample::select(vec![200u16, 201, 404, 409, 500]),
        stage in prop::sample::select(vec!["RequestReceived", "ResponseComplete"]),
    ) {
        let event = serde_json::json!({
            "stage": stage,
            "verb": verb,
            "user": {"username": user},
            "responseStatus": {"code": code},
        });
        let base = PolicyEvaluator::new(KubeApiAudit {
            omit_response_codes: Some(vec![]),
            ..KubeApiAudit::default()
        });
        let stricter = PolicyEvaluator::new(KubeApiAudit {
            omit_stages: vec!["RequestReceived".to_string()],
            omit_response_codes: Some(vec![404, 409]),
            ..KubeApiAudit::default()
        });
        // Anything the strict policy keeps, the lenient policy kept too.
        if stricter.evaluate(&event) != Outcome::Drop {
            prop_assert_ne!(base.evaluate(&event), Outcome::Drop);
        }
    }

    #[test]
    fn reassembly_of_full_lines_is_identity(messages in prop::collection::vec("[ -~]{0,40}", 0..12)) {
        let lines: Vec<CrioLine> = messages
            .iter()
            .map(|m| CrioLine::parse(&format!("2024-05-01T10:00:00.000000000+00:00 stdout F {m}")).unwrap())
            .collect();
        let records = reassemble(&lines);
        prop_assert_eq!(records.len(), messages.len());
        for (record, message) in records.iter().zip(&messages) {
            prop_assert_eq!(&record.message, message);
            prop_assert!(!record.incomplete);
        }
    }

    #[test]
    fn audit_rule_levels_only_strip_fields(
        level in prop::sample::select(vec![
            AuditPolicyLevel::Metadata,
            AuditPolicyLevel::Request,
            AuditPolicyLevel::RequestResponse,
        ]),
    ) {
        let policy = KubeApiAudit {
            rules: vec![log_forwarder_operator::crd::AuditPolicyRule {
                level,
                users: vec!["*".to_string()],
                ..Default::default()
            }],
            omit_response_codes: Some(vec![]),
            ..KubeApiAudit::default()
        };
        let event = serde_json::json!({
            "stage": "ResponseComplete",
            "verb": "update",
            "user": {"username": "anyone"},
            "requestObject": {"a": 1},
            "responseObject": {"b": 2},
        });
        let kept = PolicyEvaluator::new(policy).apply(event).expect("kept");
        match level {
            AuditPolicyLevel::Metadata => {
                prop_assert!(kept.get("requestObject").is_none());
                prop_assert!(kept.get("responseObject").is_none());
            }
            AuditPolicyLevel::Request => {
                prop_assert!(kept.get("requestObject").is_some());
                prop_assert!(kept.get("responseObject").is_none());
            }
            AuditPolicyLevel::RequestResponse => {
                prop_assert!(kept.get("requestObject").is_some());
                prop_assert!(kept.get("responseObject").is_some());
            }
            AuditPolicyLevel::None => unreachable!(),
        }
    }
}
