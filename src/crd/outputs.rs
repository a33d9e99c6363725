//! # Output Destinations
//!
//! An output names a destination for log records and carries the
//! destination-specific options. The union of optional kind structs mirrors
//! the wire format: `type` selects the kind, and the field of the same name
//! holds its options.

use serde::{Deserialize, Serialize};

use super::TuningSpec;

/// Type of output plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum OutputType {
    Elasticsearch,
    FluentdForward,
    Loki,
    Kafka,
    Syslog,
    Cloudwatch,
    Splunk,
    Http,
    GoogleCloudLogging,
    AzureMonitor,
}

impl OutputType {
    /// The wire name, as accepted in the CLF document.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputType::Elasticsearch => "elasticsearch",
            OutputType::FluentdForward => "fluentdForward",
            OutputType::Loki => "loki",
            OutputType::Kafka => "kafka",
            OutputType::Syslog => "syslog",
            OutputType::Cloudwatch => "cloudwatch",
            OutputType::Splunk => "splunk",
            OutputType::Http => "http",
            OutputType::GoogleCloudLogging => "googleCloudLogging",
            OutputType::AzureMonitor => "azureMonitor",
        }
    }
}

/// Output defines a destination for log messages.
///
/// Common secret keys recognized for authentication:
///
///   * `tls.crt` / `tls.key`: client certificate and key for mutual TLS.
///   * `passphrase`: passphrase to decode an encoded TLS private key.
///   * `ca-bundle.crt`: custom CA to validate certificates.
///   * `username` / `password`: basic authentication.
///   * `token`: bearer token, mounted as a file.
///
/// Output types support additional keys, documented with the type-specific
/// configuration struct.
#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutputSpec {
    /// Name used to refer to the output from a `pipeline`.
    pub name: String,

    /// Type of output plugin.
    #[serde(rename = "type")]
    pub output_type: OutputType,

    /// URL to send log records to.
    ///
    /// An absolute URL, with a scheme. Valid schemes depend on `type`.
    /// Special schemes `tcp`, `tls`, `udp` and `udps` are used for types
    /// that have no scheme of their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elasticsearch: Option<Elasticsearch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fluentd_forward: Option<FluentdForward>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loki: Option<Loki>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kafka: Option<Kafka>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syslog: Option<Syslog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudwatch: Option<Cloudwatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splunk: Option<Splunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<Http>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_cloud_logging: Option<GoogleCloudLogging>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_monitor: Option<AzureMonitor>,

    /// TLS contains settings for controlling options on TLS client connections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<OutputTlsSpec>,

    /// Secret for authentication, in the namespace configured for log
    /// forwarder secrets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<OutputSecretSpec>,

    /// Delivery and batching tuning for this output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<TuningSpec>,
}

/// OutputTlsSpec contains options for TLS connections that are agnostic to
/// the output type.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutputTlsSpec {
    /// If true, the TLS client is configured to ignore certificate errors.
    /// Not recommended for production configurations.
    #[serde(default)]
    pub insecure_skip_verify: bool,

    /// TLSSecurityProfile is the security profile to apply to the output connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_profile: Option<TlsSecurityProfile>,
}

/// OpenShift-style TLS security profile selection.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TlsSecurityProfile {
    #[serde(rename = "type")]
    pub profile_type: TlsProfileType,

    /// Custom profile fields, honored only when `type: Custom`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ciphers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_tls_version: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum TlsProfileType {
    Old,
    #[default]
    Intermediate,
    Modern,
    Custom,
}

/// OutputSecretSpec is a secret reference containing name only, no namespace.
#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutputSecretSpec {
    pub name: String,
}

/// Elasticsearch index routing options.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Elasticsearch {
    /// StructuredTypeKey specifies the metadata key used to pick the
    /// elasticsearch index for structured application records.
    /// It takes precedence over StructuredTypeName.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_type_key: Option<String>,

    /// StructuredTypeName specifies the static name of the elasticsearch schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_type_name: Option<String>,

    /// EnableStructuredContainerLogs allows forwarding logs from containers
    /// within a pod to separate indices. Annotating the pod with key
    /// `containerType.logging.openshift.io/<container-name>` and value
    /// `<structure-type-name>` forwards those container logs to an alternate
    /// index.
    #[serde(default)]
    pub enable_structured_container_logs: bool,

    /// Custom HTTP headers, e.g. for tenant routing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<std::collections::BTreeMap<String, String>>,
}

/// FluentdForward carries no extra options, but note the fluent-forward
/// output recognizes the additional secret key:
///
///   `shared_key`: enables fluent-forward shared-key authentication.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
pub struct FluentdForward {}

/// Loki tenant and label options.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Loki {
    /// TenantKey is a record field to use as the tenant ID.
    /// For example `tenantKey: kubernetes.namespace_name` uses the
    /// namespace as the tenant. Defaults to deriving the tenant from
    /// `log_type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_key: Option<String>,

    /// LabelKeys is a list of record keys mapped to Loki labels.
    /// Defaults to `[log_type, kubernetes.namespace_name,
    /// kubernetes.pod_name, kubernetes.container_name]`. Illegal label
    /// characters in a key are replaced with `_`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_keys: Vec<String>,
}

/// Kafka broker and topic options.
///
/// SASL is configured through the secret keys `sasl.enable`,
/// `sasl.mechanisms` and (deprecated) `sasl_over_ssl`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Kafka {
    /// Topic to send logs to. Falls back to the URL path, then to `topic`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// Initial list of broker endpoints. If none provided the target URL
    /// from the output is used as fallback.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub brokers: Vec<String>,
}

/// Syslog message framing per RFC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SyslogRfc {
    Rfc3164,
    #[default]
    Rfc5424,
}

impl SyslogRfc {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyslogRfc::Rfc3164 => "rfc3164",
            SyslogRfc::Rfc5424 => "rfc5424",
        }
    }
}

/// Syslog header and framing options.
///
/// The `appName`, `msgID`, `procID`, `tag`, `facility` and `severity`
/// fields accept a literal value, the word `tag`, or a record accessor of
/// the form `$.message.<path>` whose value is substituted per record.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Syslog {
    /// Severity to set on outgoing syslog records, a keyword per RFC5424.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    /// Facility to set on outgoing syslog records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility: Option<String>,

    /// Rfc selects the syslog message format.
    #[serde(default)]
    pub rfc: SyslogRfc,

    /// AppName is the APP-NAME part of the syslog-msg header (RFC5424).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// ProcID is the PROCID part of the syslog-msg header (RFC5424).
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "procID")]
    pub proc_id: Option<String>,

    /// MsgID is the MSGID part of the syslog-msg header (RFC5424).
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "msgID")]
    pub msg_id: Option<String>,

    /// Tag specifies a record field to use as the RFC3164 tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// PayloadKey specifies a record field to use as the message payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_key: Option<String>,

    /// AddLogSource injects namespace_name, pod_name, and container_name
    /// into the message body of container logs.
    #[serde(default)]
    pub add_log_source: bool,
}

/// Strategy for grouping CloudWatch log streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum LogGroupBy {
    LogType,
    NamespaceName,
    NamespaceUUID,
}

/// Cloudwatch grouping and region options.
///
/// The cloudwatch output recognizes the following secret keys:
///
///   `aws_access_key_id` / `aws_secret_access_key`: static credentials.
///   `role_arn` (or legacy `credentials`): STS web-identity role.
#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cloudwatch {
    pub region: String,

    /// GroupBy defines the strategy for grouping logstreams. Infrastructure
    /// and audit logs are always grouped by log type.
    pub group_by: LogGroupBy,

    /// GroupPrefix is prepended to all group names. Useful to avoid group
    /// name clashes when an AWS account is shared between clusters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_prefix: Option<String>,
}

/// Splunk HEC options. The token is read from the `hecToken` secret key.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Splunk {
    /// IndexKey is a record field whose value selects the Splunk index.
    /// Only one of IndexKey or IndexName may be set; with neither, the
    /// default index of the HEC endpoint applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_key: Option<String>,

    /// IndexName is a static Splunk index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,

    /// Source of events sent to this output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Http generic JSON-over-HTTP options.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Http {
    /// Headers to send with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<std::collections::BTreeMap<String, String>>,

    /// Request timeout in seconds. Defaults to 10.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,

    /// HTTP method. Defaults to POST.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Schema selects the record shape: `viaq` (default) or `opentelemetry`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

/// GoogleCloudLogging parent selection and log id.
/// Exactly one of billingAccountId, organizationId, folderId, or projectId
/// must be set. Credentials come from the
/// `google-application-credentials.json` secret key.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCloudLogging {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// LogID identifies the log stream within the parent resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_id: Option<String>,
}

/// AzureMonitor Log Analytics options. The workspace shared key comes from
/// the `shared_key` secret key.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AzureMonitor {
    /// CustomerId is the unique identifier of the Log Analytics workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    /// LogType is the record type of the submitted data. Letters, numbers
    /// and underscores only, at most 100 characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_type: Option<String>,

    /// AzureResourceId associates the data with an Azure resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_resource_id: Option<String>,

    /// Host is an alternative endpoint for dedicated Azure regions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}
