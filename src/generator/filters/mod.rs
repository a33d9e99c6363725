//! # Filter encoders
//!
//! Each pipeline filter compiles to a dialect-specific stage: a `<filter>`
//! or `<match>` element for fluentd, a transform table for vector. The
//! compilation here is dialect-neutral; the dialect modules consume the
//! compiled forms when laying out the pipeline chain.

pub mod field_path;
pub mod kube_api_audit;

use crate::crd::{DropCondition, DropTest, PruneFilterSpec};
use crate::generator::diagnostic::{DiagnosticKind, Diagnostics};
use field_path::FieldPath;

/// VRL program for the `parse` filter.
///
/// A message that fails to parse, or parses to a non-object, passes through
/// unchanged; parse errors never fail the pipeline.
pub const PARSE_JSON_VRL: &str = r#"if .log_type == "application" {
  parsed, err = parse_json(string!(.message))
  if err == null && is_object(parsed) {
    .structured = parsed
    .message = ""
  }
}"#;

/// fluentd rendition of the `parse` filter, applied inside a pipeline label.
pub const PARSE_JSON_FLUENTD: &str = r#"<filter **>
  @type parser
  key_name message
  reserve_data yes
  hash_value_field structured
  emit_invalid_record_to_error false
  <parse>
    @type json
    json_parser oj
  </parse>
</filter>"#;

/// fluentd rendition of `detectMultilineException`: container streams pass
/// through the detect_exceptions buffer before relabeling to the outputs.
pub const DETECT_EXCEPTIONS_FLUENTD: &str = r#"<match kubernetes.**>
  @type detect_exceptions
  remove_tag_prefix 'kubernetes'
  message message
  force_line_breaks true
  multiline_flush_interval .2
</match>"#;

/// Languages the exception detector understands.
pub const DETECT_EXCEPTIONS_LANGUAGES: &str = "\"All\"";

/// Compiled drop filter: per test, the ANDed VRL/ruby conditions.
#[derive(Debug, Clone)]
pub struct CompiledDrop {
    /// One VRL boolean expression per test; the record is dropped when any
    /// of them is true.
    pub vrl_tests: Vec<String>,
    /// Ruby boolean expression (for the fluentd record_modifier flag).
    pub ruby_expression: String,
}

/// Compiled prune filter.
#[derive(Debug, Clone)]
pub struct CompiledPrune {
    /// Paths removed (`in`) or kept (`notIn`).
    pub paths: Vec<FieldPath>,
    pub keep: bool,
}

fn escape_regex_literal(re: &str) -> String {
    // Regexes are embedded inside single-quoted VRL raw strings and ruby
    // `/.../` literals; forward slashes need escaping for the latter.
    re.replace('/', "\\/")
}

fn condition_vrl(cond: &DropCondition, path: &FieldPath) -> String {
    let accessor = format!("to_string({}) ?? \"\"", path.to_vrl());
    match (&cond.matches, &cond.not_matches) {
        (Some(m), None) => format!("match({accessor}, r'{m}')"),
        (None, Some(n)) => format!("!match({accessor}, r'{n}')"),
        _ => String::new(),
    }
}

fn condition_ruby(cond: &DropCondition, path: &FieldPath) -> String {
    let dig = format!("record.dig({})", path.to_ruby_dig());
    match (&cond.matches, &cond.not_matches) {
        (Some(m), None) => format!("({dig}.to_s =~ /{}/)", escape_regex_literal(m)),
        (None, Some(n)) => format!("!({dig}.to_s =~ /{}/)", escape_regex_literal(n)),
        _ => String::new(),
    }
}

/// Compiles the tests of a drop filter, reporting malformed field paths and
/// matches/notMatches conflicts.
pub fn compile_drop(
    filter_name: &str,
    tests: &[DropTest],
    diagnostics: &mut Diagnostics,
) -> CompiledDrop {
    let ref_path = format!("filters/{filter_name}");
    let mut vrl_tests = Vec::new();
    let mut ruby_tests = Vec::new();
    for test in tests {
        let mut vrl_conds = Vec::new();
        let mut ruby_conds = Vec::new();
        for cond in &test.drop_conditions {
            if cond.matches.is_some() == cond.not_matches.is_some() {
                diagnostics.error(
                    DiagnosticKind::ConflictingOptions,
                    &ref_path,
                    format!(
                        "drop condition on {:?} must set exactly one of matches or notMatches",
                        cond.field
                    ),
                );
                continue;
            }
            match FieldPath::parse(&cond.field) {
                Ok(path) => {
                    vrl_conds.push(condition_vrl(cond, &path));
                    ruby_conds.push(condition_ruby(cond, &path));
                }
                Err(e) => diagnostics.error(
                    DiagnosticKind::ConflictingOptions,
                    &ref_path,
                    format!("drop condition field {:?}: {e}", cond.field),
                ),
            }
        }
        if !vrl_conds.is_empty() {
            vrl_tests.push(format!("({})", vrl_conds.join(" && ")));
            ruby_tests.push(format!("({})", ruby_conds.join(" && ")));
        }
    }
    let ruby_expression = if ruby_tests.is_empty() {
        "false".to_string()
    } else {
        ruby_tests.join(" || ")
    };
    CompiledDrop { vrl_tests, ruby_expression }
}

/// VRL for a compiled drop filter, used by the vector `filter` transform
/// whose condition keeps non-matching records.
pub fn drop_filter_condition(drop: &CompiledDrop) -> String {
    if drop.vrl_tests.is_empty() {
        return "true".to_string();
    }
    format!("!({})", drop.vrl_tests.join(" || "))
}

/// Compiles a prune filter, enforcing the required-path rules.
pub fn compile_prune(
    filter_name: &str,
    spec: &PruneFilterSpec,
    diagnostics: &mut Diagnostics,
) -> Option<CompiledPrune> {
    let ref_path = format!("filters/{filter_name}");
    let (raw, keep) = match (&spec.in_, &spec.not_in) {
        (Some(_), Some(_)) | (None, None) => {
            diagnostics.error(
                DiagnosticKind::ConflictingOptions,
                &ref_path,
                "prune filter must set exactly one of in or notIn",
            );
            return None;
        }
        (Some(paths), None) => (paths, false),
        (None, Some(paths)) => (paths, true),
    };

    let required = [".log_type", ".message"];
    if keep {
        for req in required {
            if !raw.iter().any(|p| p == req) {
                diagnostics.error(
                    DiagnosticKind::ConflictingOptions,
                    &ref_path,
                    format!("prune notIn must retain required field {req}"),
                );
            }
        }
    } else {
        for req in required {
            if raw.iter().any(|p| p == req) {
                diagnostics.error(
                    DiagnosticKind::ConflictingOptions,
                    &ref_path,
                    format!("prune in may not remove required field {req}"),
                );
            }
        }
    }

    let mut paths = Vec::new();
    for p in raw {
        match FieldPath::parse(p) {
            Ok(path) => paths.push(path),
            Err(e) => diagnostics.error(
                DiagnosticKind::ConflictingOptions,
                &ref_path,
                format!("prune path {p:?}: {e}"),
            ),
        }
    }
    Some(CompiledPrune { paths, keep })
}

/// VRL program for a compiled prune filter.
pub fn prune_vrl(prune: &CompiledPrune) -> String {
    if prune.keep {
        let mut lines = vec!["pruned = {}".to_string()];
        for p in &prune.paths {
            let vrl = p.to_vrl();
            lines.push(format!("if exists({vrl}) {{ pruned{vrl} = {vrl} }}"));
        }
        lines.push(". = pruned".to_string());
        lines.join("\n")
    } else {
        prune
            .paths
            .iter()
            .map(|p| format!("del({})", p.to_vrl()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Ruby one-liner for the fluentd prune rendition. Blacklists delete in
/// place; whitelists rebuild the record from the kept paths.
pub fn prune_ruby(prune: &CompiledPrune) -> String {
    let path_array = prune
        .paths
        .iter()
        .map(|p| format!("[{}]", p.to_ruby_dig()))
        .collect::<Vec<_>>()
        .join(",");
    if prune.keep {
        format!(
            "${{r={{}};[{path_array}].each{{|p|v=record.dig(*p);unless v.nil?;c=r;p[0..-2].each{{|k|c=(c[k]||={{}})}};c[p[-1]]=v;end}};record.clear;record.update(r);nil}}"
        )
    } else {
        format!(
            "${{[{path_array}].each{{|p|c=record.dig(*p[0..-2]);c.delete(p[-1]) if c.is_a?(Hash)}};nil}}"
        )
    }
}
