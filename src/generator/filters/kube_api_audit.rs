//! # Kubernetes API audit policy filter
//!
//! Compiles a `KubeApiAudit` policy into two artifacts: a host-side
//! evaluator used by the tests (and by anything that needs policy semantics
//! without a collector), and a VRL program for the vector dialect. Rules
//! are evaluated in order, first match wins; with no matching rule an
//! opinionated default policy applies.

use serde_json::Value;

use crate::crd::{AuditPolicyLevel, AuditPolicyRule, KubeApiAudit};

/// Response codes dropped when the policy leaves `omitResponseCodes` unset.
pub const DEFAULT_OMIT_RESPONSE_CODES: &[u16] = &[404, 409, 422, 429];

const READ_ONLY_VERBS: &[&str] = &["get", "list", "watch"];

/// Outcome of evaluating one audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Drop,
    Keep(AuditPolicyLevel),
}

/// Matches `*` globs anywhere in the pattern; everything else is literal.
pub fn glob_match(pattern: &str, value: &str) -> bool {
    fn inner(p: &[u8], v: &[u8]) -> bool {
        match (p.first(), v.first()) {
            (None, None) => true,
            (Some(b'*'), _) => {
                inner(&p[1..], v) || (!v.is_empty() && inner(p, &v[1..]))
            }
            (Some(pc), Some(vc)) if pc == vc => inner(&p[1..], &v[1..]),
            _ => false,
        }
    }
    inner(pattern.as_bytes(), value.as_bytes())
}

fn any_glob(patterns: &[String], value: &str) -> bool {
    patterns.iter().any(|p| glob_match(p, value))
}

fn str_at<'a>(event: &'a Value, path: &[&str]) -> &'a str {
    let mut cur = event;
    for p in path {
        match cur.get(p) {
            Some(v) => cur = v,
            None => return "",
        }
    }
    cur.as_str().unwrap_or("")
}

/// Host-side audit policy evaluator.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    policy: KubeApiAudit,
}

impl PolicyEvaluator {
    pub fn new(policy: KubeApiAudit) -> Self {
        PolicyEvaluator { policy }
    }

    /// Effective omit-response-codes set for this policy.
    pub fn omit_response_codes(&self) -> Vec<u16> {
        match &self.policy.omit_response_codes {
            None => DEFAULT_OMIT_RESPONSE_CODES.to_vec(),
            Some(codes) => codes.clone(),
        }
    }

    /// Decides drop-or-level for one event.
    pub fn evaluate(&self, event: &Value) -> Outcome {
        let stage = str_at(event, &["stage"]);
        if self.policy.omit_stages.iter().any(|s| s == stage) {
            return Outcome::Drop;
        }

        if let Some(code) = event
            .get("responseStatus")
            .and_then(|s| s.get("code"))
            .and_then(Value::as_u64)
        {
            if self.omit_response_codes().iter().any(|c| u64::from(*c) == code) {
                return Outcome::Drop;
            }
        }

        for rule in &self.policy.rules {
            if rule_matches(rule, event) {
                if rule.omit_stages.iter().any(|s| s == stage) {
                    return Outcome::Drop;
                }
                return match rule.level {
                    AuditPolicyLevel::None => Outcome::Drop,
                    level => Outcome::Keep(level),
                };
            }
        }

        default_policy(event)
    }

    /// Evaluates and projects the event to its selected level.
    /// Returns None when the event is dropped.
    pub fn apply(&self, mut event: Value) -> Option<Value> {
        match self.evaluate(&event) {
            Outcome::Drop => None,
            Outcome::Keep(level) => {
                if let Some(obj) = event.as_object_mut() {
                    match level {
                        AuditPolicyLevel::Metadata => {
                            obj.remove("requestObject");
                            obj.remove("responseObject");
                        }
                        AuditPolicyLevel::Request => {
                            obj.remove("responseObject");
                        }
                        _ => {}
                    }
                }
                Some(event)
            }
        }
    }
}

fn rule_matches(rule: &AuditPolicyRule, event: &Value) -> bool {
    let user = str_at(event, &["user", "username"]);
    if !rule.users.is_empty() && !any_glob(&rule.users, user) {
        return false;
    }

    if !rule.user_groups.is_empty() {
        let groups: Vec<&str> = event
            .get("user")
            .and_then(|u| u.get("groups"))
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        if !groups.iter().any(|g| any_glob(&rule.user_groups, g)) {
            return false;
        }
    }

    let verb = str_at(event, &["verb"]);
    if !rule.verbs.is_empty() && !rule.verbs.iter().any(|v| v == verb || v == "*") {
        return false;
    }

    if !rule.namespaces.is_empty() {
        let ns = str_at(event, &["objectRef", "namespace"]);
        if !rule.namespaces.iter().any(|n| n == ns) {
            return false;
        }
    }

    if !rule.resources.is_empty() {
        let group = str_at(event, &["objectRef", "apiGroup"]);
        let resource = str_at(event, &["objectRef", "resource"]);
        let subresource = str_at(event, &["objectRef", "subresource"]);
        let name = str_at(event, &["objectRef", "name"]);
        let matched = rule.resources.iter().any(|gr| {
            if gr.group != group && !(gr.group.is_empty() && group.is_empty()) {
                return false;
            }
            let res_matched = gr.resources.is_empty()
                || gr.resources.iter().any(|r| match r.split_once('/') {
                    Some((res, sub)) => glob_match(res, resource) && glob_match(sub, subresource),
                    None => glob_match(r, resource) && subresource.is_empty(),
                });
            if !res_matched {
                return false;
            }
            gr.resource_names.is_empty() || gr.resource_names.iter().any(|n| n == name)
        });
        if !matched {
            return false;
        }
    }

    if !rule.non_resource_urls.is_empty() {
        let uri = str_at(event, &["requestURI"]);
        let path = uri.split('?').next().unwrap_or("");
        // A rule with only nonResourceURLs set never matches resource requests.
        let resource = str_at(event, &["objectRef", "resource"]);
        if !resource.is_empty() || !any_glob(&rule.non_resource_urls, path) {
            return false;
        }
    }

    true
}

/// The default policy applied when no rule matches:
/// user requests pass in full, service accounts are silenced for reads and
/// same-namespace or cluster-scoped writes, remaining system traffic passes
/// at Request level.
fn default_policy(event: &Value) -> Outcome {
    let user = str_at(event, &["user", "username"]);
    let verb = str_at(event, &["verb"]);

    if !user.starts_with("system:") {
        return Outcome::Keep(AuditPolicyLevel::RequestResponse);
    }

    if let Some(rest) = user.strip_prefix("system:serviceaccount:") {
        if READ_ONLY_VERBS.contains(&verb) {
            return Outcome::Drop;
        }
        let sa_namespace = rest.split(':').next().unwrap_or("");
        let object_namespace = str_at(event, &["objectRef", "namespace"]);
        if object_namespace == sa_namespace {
            return Outcome::Drop;
        }
        if object_namespace.is_empty() {
            // Write to a cluster-scoped resource.
            return Outcome::Drop;
        }
    }

    Outcome::Keep(AuditPolicyLevel::Request)
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            c if "\\.+?()[]{}|^$".contains(c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('$');
    out
}

fn vrl_str_array(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| format!("\"{i}\"")).collect();
    format!("[{}]", quoted.join(", "))
}

fn vrl_match_any(var: &str, patterns: &[String]) -> String {
    let exprs: Vec<String> = patterns
        .iter()
        .map(|p| {
            if p.contains('*') {
                format!("match({var}, r'{}')", glob_to_regex(p))
            } else {
                format!("{var} == \"{p}\"")
            }
        })
        .collect();
    format!("({})", exprs.join(" || "))
}

/// Compiles the policy into the VRL program of the vector remap transform.
/// The transform is rendered with `drop_on_abort = true`; a VRL `abort`
/// drops the event.
pub fn policy_to_vrl(policy: &KubeApiAudit) -> String {
    let mut vrl = String::new();
    vrl.push_str("if .log_type == \"audit\" && exists(.stage) {\n");
    vrl.push_str("  stage = to_string(.stage) ?? \"\"\n");
    vrl.push_str("  verb = to_string(.verb) ?? \"\"\n");
    vrl.push_str("  user = to_string(.user.username) ?? \"\"\n");
    vrl.push_str("  res_ns = to_string(.objectRef.namespace) ?? \"\"\n");
    vrl.push_str("  resource = to_string(.objectRef.resource) ?? \"\"\n");
    vrl.push_str("  subresource = to_string(.objectRef.subresource) ?? \"\"\n");
    vrl.push_str("  api_group = to_string(.objectRef.apiGroup) ?? \"\"\n");
    vrl.push_str("  res_name = to_string(.objectRef.name) ?? \"\"\n");
    vrl.push_str("  request_path = split(to_string(.requestURI) ?? \"\", \"?\")[0] ?? \"\"\n");
    vrl.push_str("  response_code = to_int(.responseStatus.code) ?? 0\n");

    if !policy.omit_stages.is_empty() {
        vrl.push_str(&format!(
            "  if includes({}, stage) {{ abort }}\n",
            vrl_str_array(&policy.omit_stages)
        ));
    }

    let codes = match &policy.omit_response_codes {
        None => DEFAULT_OMIT_RESPONSE_CODES.to_vec(),
        Some(codes) => codes.clone(),
    };
    if !codes.is_empty() {
        let rendered: Vec<String> = codes.iter().map(ToString::to_string).collect();
        vrl.push_str(&format!(
            "  if includes([{}], response_code) {{ abort }}\n",
            rendered.join(", ")
        ));
    }

    vrl.push_str("  level = \"\"\n");
    for rule in &policy.rules {
        let mut conds: Vec<String> = vec!["level == \"\"".to_string()];
        if !rule.users.is_empty() {
            conds.push(vrl_match_any("user", &rule.users));
        }
        if !rule.user_groups.is_empty() {
            let patterns: Vec<String> = rule.user_groups.iter().map(|g| glob_to_regex(g)).collect();
            let joined = patterns.join("|");
            conds.push(format!(
                "match(join!(array(.user.groups) ?? [], \",\"), r'(^|,)({joined})(,|$)')"
            ));
        }
        if !rule.verbs.is_empty() {
            conds.push(format!("includes({}, verb)", vrl_str_array(&rule.verbs)));
        }
        if !rule.namespaces.is_empty() {
            conds.push(format!("includes({}, res_ns)", vrl_str_array(&rule.namespaces)));
        }
        if !rule.resources.is_empty() {
            let mut per_group = Vec::new();
            for gr in &rule.resources {
                let mut gconds = vec![format!("api_group == \"{}\"", gr.group)];
                if !gr.resources.is_empty() {
                    let mut rconds = Vec::new();
                    for r in &gr.resources {
                        match r.split_once('/') {
                            Some((res, sub)) => rconds.push(format!(
                                "(match(resource, r'{}') && match(subresource, r'{}'))",
                                glob_to_regex(res),
                                glob_to_regex(sub)
                            )),
                            None => rconds.push(format!(
                                "(match(resource, r'{}') && subresource == \"\")",
                                glob_to_regex(r)
                            )),
                        }
                    }
                    gconds.push(format!("({})", rconds.join(" || ")));
                }
                if !gr.resource_names.is_empty() {
                    gconds.push(format!("includes({}, res_name)", vrl_str_array(&gr.resource_names)));
                }
                per_group.push(format!("({})", gconds.join(" && ")));
            }
            conds.push(format!("({})", per_group.join(" || ")));
        }
        if !rule.non_resource_urls.is_empty() {
            conds.push("resource == \"\"".to_string());
            conds.push(vrl_match_any("request_path", &rule.non_resource_urls));
        }

        vrl.push_str(&format!("  if {} {{\n", conds.join(" && ")));
        if !rule.omit_stages.is_empty() {
            vrl.push_str(&format!(
                "    if includes({}, stage) {{ abort }}\n",
                vrl_str_array(&rule.omit_stages)
            ));
        }
        vrl.push_str(&format!("    level = \"{:?}\"\n", rule.level));
        vrl.push_str("  }\n");
    }

    // Default policy for unmatched events.
    vrl.push_str(
        r#"  if level == "" {
    if !starts_with(user, "system:") {
      level = "RequestResponse"
    } else if starts_with(user, "system:serviceaccount:") {
      sa_ns = split(user, ":")[2] ?? ""
      if includes(["get", "list", "watch"], verb) {
        level = "None"
      } else if res_ns == sa_ns {
        level = "None"
      } else if res_ns == "" {
        level = "None"
      } else {
        level = "Request"
      }
    } else {
      level = "Request"
    }
  }
  if level == "None" { abort }
  if level == "Metadata" {
    del(.requestObject)
    del(.responseObject)
  }
  if level == "Request" {
    del(.responseObject)
  }
}
"#,
    );
    vrl
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn default_evaluator() -> PolicyEvaluator {
        PolicyEvaluator::new(KubeApiAudit::default())
    }

    #[test]
    fn read_only_serviceaccount_requests_are_dropped() {
        let ev = json!({
            "stage": "ResponseComplete",
            "verb": "get",
            "user": {"username": "system:serviceaccount:foo"}
        });
        assert_eq!(default_evaluator().evaluate(&ev), Outcome::Drop);
    }

    #[test]
    fn same_namespace_serviceaccount_writes_are_dropped() {
        let ev = json!({
            "stage": "ResponseComplete",
            "verb": "update",
            "user": {"username": "system:serviceaccount:foo"},
            "objectRef": {"namespace": "foo", "resource": "configmaps"}
        });
        assert_eq!(default_evaluator().evaluate(&ev), Outcome::Drop);
    }

    #[test]
    fn other_system_users_pass_at_request_level() {
        let ev = json!({
            "stage": "ResponseComplete",
            "verb": "update",
            "user": {"username": "system:kube-controller-manager", "groups": ["system:masters"]},
            "objectRef": {"namespace": "kube-system", "resource": "endpoints"},
            "requestObject": {"spec": {}},
            "responseObject": {"status": {}}
        });
        let ev2 = default_evaluator().apply(ev).expect("kept");
        assert!(ev2.get("requestObject").is_some());
        assert!(ev2.get("responseObject").is_none());
    }

    #[test]
    fn ordinary_users_keep_request_and_response() {
        let ev = json!({
            "stage": "ResponseComplete",
            "verb": "delete",
            "user": {"username": "alice"},
            "requestObject": {}, "responseObject": {}
        });
        let kept = default_evaluator().apply(ev).expect("kept");
        assert!(kept.get("responseObject").is_some());
    }

    #[test]
    fn default_response_codes_are_omitted_unless_overridden() {
        let ev = json!({
            "stage": "ResponseComplete",
            "verb": "get",
            "user": {"username": "alice"},
            "responseStatus": {"code": 404}
        });
        assert_eq!(default_evaluator().evaluate(&ev), Outcome::Drop);

        let open = PolicyEvaluator::new(KubeApiAudit {
            omit_response_codes: Some(vec![]),
            ..KubeApiAudit::default()
        });
        assert_eq!(open.evaluate(&ev), Outcome::Keep(AuditPolicyLevel::RequestResponse));
    }

    #[test]
    fn rules_run_in_order_first_match_wins() {
        let policy = KubeApiAudit {
            rules: vec![
                AuditPolicyRule {
                    level: AuditPolicyLevel::Metadata,
                    users: vec!["system:kube-*".to_string()],
                    ..AuditPolicyRule::default()
                },
                AuditPolicyRule {
                    level: AuditPolicyLevel::RequestResponse,
                    users: vec!["*".to_string()],
                    ..AuditPolicyRule::default()
                },
            ],
            ..KubeApiAudit::default()
        };
        let ev = json!({
            "stage": "ResponseComplete",
            "verb": "get",
            "user": {"username": "system:kube-scheduler"},
            "requestObject": {}, "responseObject": {}
        });
        let kept = PolicyEvaluator::new(policy).apply(ev).expect("kept");
        assert!(kept.get("requestObject").is_none());
        assert!(kept.get("responseObject").is_none());
    }

    #[test]
    fn omit_rules_only_shrink_the_pass_set() {
        // Adding an omitStages entry can only move events from kept to
        // dropped, never the reverse.
        let ev = json!({
            "stage": "RequestReceived",
            "verb": "get",
            "user": {"username": "alice"}
        });
        let open = default_evaluator();
        let closed = PolicyEvaluator::new(KubeApiAudit {
            omit_stages: vec!["RequestReceived".to_string()],
            ..KubeApiAudit::default()
        });
        assert_eq!(open.evaluate(&ev), Outcome::Keep(AuditPolicyLevel::RequestResponse));
        assert_eq!(closed.evaluate(&ev), Outcome::Drop);
    }

    #[test]
    fn glob_matching() {
        assert!(glob_match("system:*", "system:admin"));
        assert!(glob_match("*", "anything"));
        assert!(!glob_match("system:*", "user:system"));
        assert!(glob_match("/api/v1/*", "/api/v1/pods"));
    }

    #[test]
    fn vrl_program_carries_default_codes_and_default_policy() {
        let vrl = policy_to_vrl(&KubeApiAudit::default());
        assert!(vrl.contains("includes([404, 409, 422, 429], response_code)"));
        assert!(vrl.contains("starts_with(user, \"system:serviceaccount:\")"));
        assert!(vrl.contains("if level == \"None\" { abort }"));
    }
}
