//! # Filter Types
//!
//! A filter is a named record transformation referenced from a pipeline's
//! `filterRefs`. Filters either reshape records (parse, prune), merge them
//! (detectMultilineException), or discard them (drop, kubeAPIAudit).

use serde::{Deserialize, Serialize};

/// FilterType specifies the type of filter used in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    /// Parse the `message` field as JSON into `structured`.
    Parse,
    /// Reassemble multi-line stack traces into single records.
    DetectMultilineException,
    /// Evaluate a Kubernetes API audit policy against audit events.
    #[serde(rename = "kubeAPIAudit")]
    KubeAPIAudit,
    /// Remove (or keep only) the named field paths.
    Prune,
    /// Drop records matching a sequence of tests.
    Drop,
}

/// FilterSpec defines a filter for log messages.
#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Name used to refer to the filter from a `pipeline`.
    pub name: String,

    /// Type of filter.
    #[serde(rename = "type")]
    pub filter_type: FilterType,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "kubeAPIAudit")]
    pub kube_api_audit: Option<KubeApiAudit>,

    /// A drop filter applies a sequence of tests to a log record and drops
    /// the record if any test passes. Within a test, all conditions must be
    /// true for the test to pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop: Option<Vec<DropTest>>,

    /// The prune filter consists of two arrays, `in` and `notIn`, which
    /// dictate the fields to be pruned. Exactly one must be set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prune: Option<PruneFilterSpec>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DropTest {
    /// Conditions that are ANDed together.
    #[serde(default, rename = "test")]
    pub drop_conditions: Vec<DropCondition>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DropCondition {
    /// A dot-delimited path to a field in the log record, starting with `.`.
    /// Segments containing characters outside `[a-zA-Z0-9_]` must be quoted,
    /// e.g. `.kubernetes.labels."foo-bar/baz"`.
    #[serde(default)]
    pub field: String,

    /// A regular expression the field value must match for the record to be
    /// dropped. Only one of `matches` or `notMatches` may be set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,

    /// A regular expression the field value must NOT match for the record
    /// to be dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_matches: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PruneFilterSpec {
    /// Field paths removed from the record. May not contain `.log_type` or
    /// `.message`.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "in")]
    pub in_: Option<Vec<String>>,

    /// Field paths kept in the record; everything else is removed. Must
    /// contain `.log_type` and `.message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_in: Option<Vec<String>>,
}

/// Audit event verbosity, ordered from least to most detail.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize,
    schemars::JsonSchema,
)]
pub enum AuditPolicyLevel {
    /// Drop the event entirely.
    None,
    /// Keep only event metadata.
    #[default]
    Metadata,
    /// Keep metadata and the request object.
    Request,
    /// Keep metadata, request, and response objects.
    RequestResponse,
}

/// KubeApiAudit is a kube-apiserver audit policy evaluated against each
/// audit event. Rules are evaluated in order; the first match wins. When no
/// rule matches, an opinionated default policy applies.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubeApiAudit {
    /// Stages omitted for all rules, unioned with per-rule omitStages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omit_stages: Vec<String>,

    /// Events with these response codes are dropped. `null` applies the
    /// default set {404, 409, 422, 429}; an explicitly empty list disables
    /// response-code filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omit_response_codes: Option<Vec<u16>>,

    /// Policy rules, evaluated in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<AuditPolicyRule>,
}

/// One audit-policy rule. A rule matches when every specified predicate
/// matches; empty predicates are wildcards.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditPolicyRule {
    #[serde(default)]
    pub level: AuditPolicyLevel,

    /// Users the rule applies to; `*` globs allowed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,

    /// User groups the rule applies to; `*` globs allowed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_groups: Vec<String>,

    /// Verbs the rule applies to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verbs: Vec<String>,

    /// Resources the rule applies to, by API group.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<GroupResources>,

    /// Namespaces the rule applies to; empty matches cluster-scoped and all
    /// namespaced requests.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,

    /// Non-resource URL paths; `*` globs allowed, query strings stripped
    /// before matching.
    #[serde(default, skip_serializing_if = "Vec::is_empty", rename = "nonResourceURLs")]
    pub non_resource_urls: Vec<String>,

    /// Stages omitted for events matched by this rule.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omit_stages: Vec<String>,
}

/// Resources of one API group.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupResources {
    /// API group; empty means the core group.
    #[serde(default)]
    pub group: String,

    /// Resource names, optionally with a `/subresource` suffix;
    /// `*` globs allowed in either part.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,

    /// Instance names; empty matches all instances.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_names: Vec<String>,
}
