//! # ClusterLogForwarder Spec
//!
//! Main CRD specification types.

use serde::{Deserialize, Serialize};

use super::{FilterSpec, InputSpec, OutputSpec};

/// ClusterLogForwarder Custom Resource Definition
///
/// Declares how logs are collected and forwarded: a list of `pipelines`
/// routes records from named `inputs`, through optional named `filters`,
/// to named `outputs`.
///
/// There are built-in input names for the common log categories
/// (`application`, `infrastructure`, `audit`); custom inputs narrow those
/// categories with namespace, container, or label selectors, or open a
/// receiver port.
///
/// # Example
///
/// ```yaml
/// apiVersion: logging.microscaler.io/v1
/// kind: ClusterLogForwarder
/// metadata:
///   name: instance
///   namespace: openshift-logging
/// spec:
///   outputs:
///     - name: my-cloudwatch
///       type: cloudwatch
///       cloudwatch:
///         region: us-east-1
///         groupBy: logType
///       secret:
///         name: my-secret
///   pipelines:
///     - name: to-cloudwatch
///       inputRefs: [application]
///       outputRefs: [my-cloudwatch]
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "ClusterLogForwarder",
    group = "logging.microscaler.io",
    version = "v1",
    namespaced,
    status = "crate::crd::ClusterLogForwarderStatus",
    shortname = "clf",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Message", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].message"}"#
)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClusterLogForwarderSpec {
    /// Inputs are named filters for log messages to be forwarded.
    ///
    /// The built-in inputs `application`, `infrastructure` and `audit` are
    /// always available and need not be declared here.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputSpec>,

    /// Outputs are named destinations for log messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputSpec>,

    /// Filters are named record transformations referenced by pipelines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterSpec>,

    /// Pipelines forward the messages selected by a set of inputs to a set
    /// of outputs, optionally passing them through a chain of filters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pipelines: Vec<PipelineSpec>,

    /// Name of the service account the collector daemon runs as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
}

/// PipelineSpec links a set of inputs to a set of outputs.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSpec {
    /// Name is optional, but must be unique in the `pipelines` list if provided.
    #[serde(default)]
    pub name: String,

    /// InputRefs lists the names (`input.name`) of inputs to this pipeline.
    /// The built-in names `application`, `infrastructure` and `audit` are
    /// always available.
    pub input_refs: Vec<String>,

    /// FilterRefs lists the names (`filter.name`) of filters applied to the
    /// records of this pipeline, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter_refs: Vec<String>,

    /// OutputRefs lists the names (`output.name`) of outputs from this pipeline.
    pub output_refs: Vec<String>,

    /// Labels applied to log records passing through this pipeline.
    /// These labels appear in the `openshift.labels` map in the log record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<std::collections::BTreeMap<String, String>>,

    /// Parse enables parsing of log entries into structured logs.
    /// Only `json` is supported. Shorthand for a synthetic parse filter
    /// prepended to the filter chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse: Option<String>,

    /// DetectMultilineErrors enables multiline stack-trace reassembly of
    /// container logs. Shorthand for a synthetic detectMultilineException
    /// filter prepended to the filter chain.
    #[serde(default)]
    pub detect_multiline_errors: bool,
}

impl ClusterLogForwarderSpec {
    /// Looks up a declared input by name, preserving declaration order for
    /// iteration elsewhere.
    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&OutputSpec> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn filter(&self, name: &str) -> Option<&FilterSpec> {
        self.filters.iter().find(|f| f.name == name)
    }

    /// Pipeline names, substituting `pipeline_<index>` when unnamed.
    pub fn pipeline_names(&self) -> Vec<String> {
        self.pipelines
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if p.name.is_empty() {
                    format!("pipeline_{i}")
                } else {
                    p.name.clone()
                }
            })
            .collect()
    }
}
