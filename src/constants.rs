//! # Shared constants
//!
//! Secret-key names, environment-variable names, input category
//! identifiers, and operator defaults referenced across the generator and
//! reconciler. The secret-key values are part of the ClusterLogForwarder
//! output-secret API: changing them is a breaking change.

/// Root mount directory for output secrets, as projected by the collector
/// daemon. One subdirectory per referenced secret, one file per key.
pub const COLLECTOR_SECRETS_DIR: &str = "/var/run/ocp-collector/secrets";

/// Mount path of one key of a referenced secret: `<dir>/<secret>/<key>`.
pub fn secret_path(secret: &str, key: &str) -> String {
    format!("{COLLECTOR_SECRETS_DIR}/{secret}/{key}")
}

// ---------------------------------------------------------------------------
// Input category identifiers (reserved built-in input names).
// ---------------------------------------------------------------------------

pub const INPUT_APPLICATION: &str = "application";
pub const INPUT_INFRASTRUCTURE: &str = "infrastructure";
pub const INPUT_AUDIT: &str = "audit";

// ---------------------------------------------------------------------------
// Output-secret keys. Documented with the OutputSpec.Secret API.
// ---------------------------------------------------------------------------

// TLS keys, used by any output that supports TLS.
pub const CLIENT_CERT_KEY: &str = "tls.crt";
pub const CLIENT_PRIVATE_KEY: &str = "tls.key";
pub const TRUSTED_CA_BUNDLE_KEY: &str = "ca-bundle.crt";
pub const PASSPHRASE_KEY: &str = "passphrase";
pub const BEARER_TOKEN_FILE_KEY: &str = "token";

// Username/password keys.
pub const CLIENT_USERNAME_KEY: &str = "username";
pub const CLIENT_PASSWORD_KEY: &str = "password";

// SASL keys (Kafka).
pub const SASL_ENABLE_KEY: &str = "sasl.enable";
pub const SASL_MECHANISMS_KEY: &str = "sasl.mechanisms";
pub const DEPRECATED_SASL_OVER_SSL_KEY: &str = "sasl_over_ssl";

// Output-specific keys.
pub const SHARED_KEY: &str = "shared_key";
pub const AWS_ACCESS_KEY_ID: &str = "aws_access_key_id";
pub const AWS_SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
pub const AWS_CREDENTIALS_KEY: &str = "credentials";
pub const AWS_WEB_IDENTITY_ROLE_KEY: &str = "role_arn";
pub const SPLUNK_HEC_TOKEN_KEY: &str = "hecToken";
pub const GOOGLE_APPLICATION_CREDENTIALS_KEY: &str = "google-application-credentials.json";

// ---------------------------------------------------------------------------
// Environment-variable names read by the collector at runtime.
// ---------------------------------------------------------------------------

pub const ENV_NODE_NAME: &str = "NODE_NAME";
pub const ENV_AWS_ROLE_ARN: &str = "AWS_ROLE_ARN";
pub const ENV_AWS_WEB_IDENTITY_TOKEN_FILE: &str = "AWS_WEB_IDENTITY_TOKEN_FILE";
pub const ENV_AWS_ROLE_SESSION_NAME: &str = "AWS_ROLE_SESSION_NAME";

// ---------------------------------------------------------------------------
// Elasticsearch structured-index container-annotation prefix.
// ---------------------------------------------------------------------------

pub const STRUCTURED_CONTAINER_ANNOTATION_PREFIX: &str = "containerType.logging.openshift.io/";

// ---------------------------------------------------------------------------
// Reconciler: collector-config Secret shape and OTEL opt-in annotation.
// ---------------------------------------------------------------------------

/// Name of the Secret the generated configuration is written to.
pub const COLLECTOR_CONFIG_SECRET_NAME: &str = "collector-config";

/// Data key for the fluentd dialect inside the collector-config Secret.
pub const FLUENTD_CONFIG_KEY: &str = "fluent.conf";

/// Data key for the vector dialect inside the collector-config Secret.
pub const VECTOR_CONFIG_KEY: &str = "vector.toml";

/// Annotation that opts a ClusterLogForwarder into the OTEL schema for HTTP
/// sinks. Value must be `"enabled"`.
pub const OTEL_SCHEMA_ANNOTATION: &str = "logging.openshift.io/preview-otel-schema";

// ---------------------------------------------------------------------------
// Operator process defaults.
// ---------------------------------------------------------------------------

/// Default port for the metrics/health HTTP server.
pub const DEFAULT_METRICS_PORT: u16 = 24231;

/// Requeue interval after a successful reconciliation.
pub const DEFAULT_RECONCILE_REQUEUE_SECS: u64 = 300;

/// Requeue backoff after a failed reconciliation.
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 30;
