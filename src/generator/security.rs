//! # Security materializer
//!
//! Resolves an output's secret reference and TLS block into an `AuthMode`
//! and a set of TLS parameters the encoders render. Selection is by key
//! presence: the keys found in the referenced secret decide the auth mode,
//! with AWS following the precedence role_arn > credentials > static keys.

use regex::Regex;

use crate::constants;
use crate::crd::{OutputSpec, OutputType, TlsProfileType, TlsSecurityProfile};
use crate::generator::diagnostic::{DiagnosticKind, Diagnostics};
use crate::generator::secrets::SecretRef;
use crate::generator::url;

/// How the collector authenticates to one output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    None,
    /// Static AWS credentials from `aws_access_key_id`/`aws_secret_access_key`.
    Static,
    /// STS web-identity role; the collector pod supplies
    /// `AWS_ROLE_ARN`/`AWS_WEB_IDENTITY_TOKEN_FILE`/`AWS_ROLE_SESSION_NAME`.
    WebIdentitySts { role_arn: String },
    /// Role ARN extracted from a legacy `credentials` ini file.
    CredentialsFile { role_arn: String },
    /// File-mounted bearer token from the `token` key.
    Bearer,
    /// `username`/`password` basic auth.
    Basic,
    /// fluent-forward `shared_key`.
    SharedKey,
    /// Kafka SASL, optionally layered over TLS.
    Sasl {
        enabled: bool,
        mechanisms: Option<String>,
        over_ssl: bool,
    },
    /// Splunk HEC token.
    HecToken,
    /// GCP service-account JSON from `google-application-credentials.json`.
    GoogleJson,
    /// Azure Log Analytics workspace `shared_key`.
    AzureSharedKey,
}

/// TLS parameters materialized for one output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsParameters {
    /// Client certificate/key mount paths, present together.
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
    pub ca_path: Option<String>,
    pub passphrase: Option<String>,
    pub insecure_skip_verify: bool,
    pub min_version: Option<String>,
    pub ciphers: Option<String>,
}

impl TlsParameters {
    pub fn is_empty(&self) -> bool {
        *self == TlsParameters::default()
    }
}

/// Everything the encoders need to render credentials for one output.
#[derive(Debug, Clone)]
pub struct SecurityFragment {
    pub auth: AuthMode,
    pub tls: TlsParameters,
    /// Secret files the surrounding daemon must mount, as
    /// `<secret-name>/<key>` pairs.
    pub mounts: Vec<(String, String)>,
    /// Credential literals the vector dialect inlines into its tables.
    /// The fluentd dialect reads the mounted files instead.
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub shared_key: Option<String>,
    pub hec_token: Option<String>,
    /// `(access_key_id, secret_access_key)` for static AWS credentials.
    pub aws_static_keys: Option<(String, String)>,
}

impl SecurityFragment {
    /// A fragment with no credentials and no TLS parameters.
    pub fn none() -> Self {
        SecurityFragment {
            auth: AuthMode::None,
            tls: TlsParameters::default(),
            mounts: Vec::new(),
            username: None,
            password: None,
            token: None,
            shared_key: None,
            hec_token: None,
            aws_static_keys: None,
        }
    }
}

/// The OpenShift TLS security profile table.
///
/// Returns `(min_version, ciphers)` for the selected profile.
pub fn tls_profile_parameters(profile: &TlsSecurityProfile) -> (String, Vec<String>) {
    const MODERN_CIPHERS: &[&str] = &[
        "TLS_AES_128_GCM_SHA256",
        "TLS_AES_256_GCM_SHA384",
        "TLS_CHACHA20_POLY1305_SHA256",
    ];
    const INTERMEDIATE_CIPHERS: &[&str] = &[
        "TLS_AES_128_GCM_SHA256",
        "TLS_AES_256_GCM_SHA384",
        "TLS_CHACHA20_POLY1305_SHA256",
        "ECDHE-ECDSA-AES128-GCM-SHA256",
        "ECDHE-RSA-AES128-GCM-SHA256",
        "ECDHE-ECDSA-AES256-GCM-SHA384",
        "ECDHE-RSA-AES256-GCM-SHA384",
        "ECDHE-ECDSA-CHACHA20-POLY1305",
        "ECDHE-RSA-CHACHA20-POLY1305",
        "DHE-RSA-AES128-GCM-SHA256",
        "DHE-RSA-AES256-GCM-SHA384",
    ];
    const OLD_EXTRA_CIPHERS: &[&str] = &[
        "DHE-RSA-CHACHA20-POLY1305",
        "ECDHE-ECDSA-AES128-SHA256",
        "ECDHE-RSA-AES128-SHA256",
        "ECDHE-ECDSA-AES128-SHA",
        "ECDHE-RSA-AES128-SHA",
        "ECDHE-ECDSA-AES256-SHA384",
        "ECDHE-RSA-AES256-SHA384",
        "ECDHE-ECDSA-AES256-SHA",
        "ECDHE-RSA-AES256-SHA",
        "DHE-RSA-AES128-SHA256",
        "DHE-RSA-AES256-SHA256",
        "AES128-GCM-SHA256",
        "AES256-GCM-SHA384",
        "AES128-SHA256",
        "AES256-SHA256",
        "AES128-SHA",
        "AES256-SHA",
        "DES-CBC3-SHA",
    ];

    let to_vec = |s: &[&str]| s.iter().map(ToString::to_string).collect::<Vec<_>>();
    match profile.profile_type {
        TlsProfileType::Modern => ("VersionTLS13".to_string(), to_vec(MODERN_CIPHERS)),
        TlsProfileType::Intermediate => ("VersionTLS12".to_string(), to_vec(INTERMEDIATE_CIPHERS)),
        TlsProfileType::Old => {
            let mut ciphers = to_vec(INTERMEDIATE_CIPHERS);
            ciphers.extend(to_vec(OLD_EXTRA_CIPHERS));
            ("VersionTLS10".to_string(), ciphers)
        }
        TlsProfileType::Custom => (
            profile
                .min_tls_version
                .clone()
                .unwrap_or_else(|| "VersionTLS12".to_string()),
            profile.ciphers.clone(),
        ),
    }
}

/// Extracts a role ARN from free-form text. Accepts the standard partition
/// only, matching `arn:aws:(iam|sts)::<12 digits>:role/<name>`.
pub fn parse_role_arn(text: &str) -> Option<String> {
    // Compiled per call; generation is a cold path and the regex is tiny.
    let re = Regex::new(r"(arn:aws:(iam|sts)::\d{12}:role/\S+)\s?").ok()?;
    re.captures(text).map(|c| c[1].to_string())
}

/// Materializes the security fragment for one output.
///
/// Referential problems (absent secret, missing mandatory keys) are
/// reported through `diagnostics`; the returned fragment is then best-effort
/// and the caller will suppress the config text anyway.
pub fn materialize(
    output: &OutputSpec,
    secret: &SecretRef<'_>,
    diagnostics: &mut Diagnostics,
) -> SecurityFragment {
    let ref_path = format!("outputs/{}", output.name);
    let mut mounts = Vec::new();
    let mount = |secret: &SecretRef<'_>, key: &str| (secret.name.to_string(), key.to_string());

    let auth = if output.secret.is_none() {
        AuthMode::None
    } else if !secret.exists() {
        diagnostics.error(
            DiagnosticKind::MissingSecretKey,
            &ref_path,
            format!("secret {:?} not found", secret.name),
        );
        AuthMode::None
    } else {
        match output.output_type {
            OutputType::Cloudwatch => aws_auth_mode(secret, &ref_path, diagnostics),
            OutputType::Splunk => {
                if secret.has(constants::SPLUNK_HEC_TOKEN_KEY) {
                    mounts.push(mount(secret, constants::SPLUNK_HEC_TOKEN_KEY));
                    AuthMode::HecToken
                } else {
                    diagnostics.error(
                        DiagnosticKind::MissingSecretKey,
                        &ref_path,
                        format!("secret {:?} is missing key {:?}", secret.name, constants::SPLUNK_HEC_TOKEN_KEY),
                    );
                    AuthMode::None
                }
            }
            OutputType::GoogleCloudLogging => {
                if secret.has(constants::GOOGLE_APPLICATION_CREDENTIALS_KEY) {
                    mounts.push(mount(secret, constants::GOOGLE_APPLICATION_CREDENTIALS_KEY));
                    AuthMode::GoogleJson
                } else {
                    diagnostics.error(
                        DiagnosticKind::MissingSecretKey,
                        &ref_path,
                        format!(
                            "secret {:?} is missing key {:?}",
                            secret.name,
                            constants::GOOGLE_APPLICATION_CREDENTIALS_KEY
                        ),
                    );
                    AuthMode::None
                }
            }
            OutputType::AzureMonitor => {
                if secret.has(constants::SHARED_KEY) {
                    AuthMode::AzureSharedKey
                } else {
                    diagnostics.error(
                        DiagnosticKind::MissingSecretKey,
                        &ref_path,
                        format!("secret {:?} is missing key {:?}", secret.name, constants::SHARED_KEY),
                    );
                    AuthMode::None
                }
            }
            OutputType::Kafka => {
                let has_any_sasl = secret.has(constants::SASL_ENABLE_KEY)
                    || secret.has(constants::SASL_MECHANISMS_KEY)
                    || secret.has(constants::DEPRECATED_SASL_OVER_SSL_KEY);
                if secret.has(constants::DEPRECATED_SASL_OVER_SSL_KEY) {
                    diagnostics.warning(
                        DiagnosticKind::Deprecation,
                        &ref_path,
                        format!(
                            "secret key {:?} is deprecated, use {:?}",
                            constants::DEPRECATED_SASL_OVER_SSL_KEY,
                            constants::SASL_ENABLE_KEY
                        ),
                    );
                }
                if has_any_sasl {
                    AuthMode::Sasl {
                        enabled: secret
                            .text(constants::SASL_ENABLE_KEY)
                            .map_or(true, |v| v.trim() != "false"),
                        mechanisms: secret
                            .text(constants::SASL_MECHANISMS_KEY)
                            .map(|m| m.trim().to_string()),
                        over_ssl: secret.has(constants::DEPRECATED_SASL_OVER_SSL_KEY)
                            || url_is_tls(output),
                    }
                } else if secret.has_username_password() {
                    AuthMode::Basic
                } else {
                    AuthMode::None
                }
            }
            OutputType::FluentdForward => {
                if secret.has(constants::SHARED_KEY) {
                    AuthMode::SharedKey
                } else {
                    AuthMode::None
                }
            }
            _ => {
                // Generic order for URL-addressed stores: basic auth wins
                // over a bearer token when both are present.
                if secret.has_username_password() {
                    AuthMode::Basic
                } else if secret.has(constants::BEARER_TOKEN_FILE_KEY) {
                    mounts.push(mount(secret, constants::BEARER_TOKEN_FILE_KEY));
                    AuthMode::Bearer
                } else {
                    AuthMode::None
                }
            }
        }
    };

    let tls = materialize_tls(output, secret, diagnostics, &mut mounts);
    let trimmed = |key: &str| secret.text(key).map(|v| v.trim().to_string());
    SecurityFragment {
        username: trimmed(constants::CLIENT_USERNAME_KEY),
        password: trimmed(constants::CLIENT_PASSWORD_KEY),
        token: trimmed(constants::BEARER_TOKEN_FILE_KEY),
        shared_key: trimmed(constants::SHARED_KEY),
        hec_token: trimmed(constants::SPLUNK_HEC_TOKEN_KEY),
        aws_static_keys: match (
            trimmed(constants::AWS_ACCESS_KEY_ID),
            trimmed(constants::AWS_SECRET_ACCESS_KEY),
        ) {
            (Some(id), Some(key)) => Some((id, key)),
            _ => None,
        },
        auth,
        tls,
        mounts,
    }
}

fn aws_auth_mode(secret: &SecretRef<'_>, ref_path: &str, diagnostics: &mut Diagnostics) -> AuthMode {
    if secret.has(constants::AWS_WEB_IDENTITY_ROLE_KEY) {
        let text = secret.text(constants::AWS_WEB_IDENTITY_ROLE_KEY).unwrap_or_default();
        match parse_role_arn(&text) {
            Some(role_arn) => AuthMode::WebIdentitySts { role_arn },
            None => {
                diagnostics.error(
                    DiagnosticKind::MissingSecretKey,
                    ref_path,
                    format!("key {:?} does not contain a valid role ARN", constants::AWS_WEB_IDENTITY_ROLE_KEY),
                );
                AuthMode::None
            }
        }
    } else if secret.has(constants::AWS_CREDENTIALS_KEY) {
        diagnostics.warning(
            DiagnosticKind::Deprecation,
            ref_path,
            format!(
                "secret key {:?} is deprecated, use {:?}",
                constants::AWS_CREDENTIALS_KEY,
                constants::AWS_WEB_IDENTITY_ROLE_KEY
            ),
        );
        let text = secret.text(constants::AWS_CREDENTIALS_KEY).unwrap_or_default();
        match parse_role_arn(&text) {
            Some(role_arn) => AuthMode::CredentialsFile { role_arn },
            None => {
                diagnostics.error(
                    DiagnosticKind::MissingSecretKey,
                    ref_path,
                    format!("key {:?} does not contain a valid role ARN", constants::AWS_CREDENTIALS_KEY),
                );
                AuthMode::None
            }
        }
    } else if secret.has_all(&[constants::AWS_ACCESS_KEY_ID, constants::AWS_SECRET_ACCESS_KEY]) {
        AuthMode::Static
    } else {
        diagnostics.error(
            DiagnosticKind::MissingSecretKey,
            ref_path,
            format!(
                "secret {:?} has neither {:?} nor {:?}/{:?}",
                secret.name,
                constants::AWS_WEB_IDENTITY_ROLE_KEY,
                constants::AWS_ACCESS_KEY_ID,
                constants::AWS_SECRET_ACCESS_KEY
            ),
        );
        AuthMode::None
    }
}

fn url_is_tls(output: &OutputSpec) -> bool {
    output
        .url
        .as_deref()
        .and_then(url::parse)
        .map(|u| url::is_tls_scheme(&u.scheme))
        .unwrap_or(false)
}

fn materialize_tls(
    output: &OutputSpec,
    secret: &SecretRef<'_>,
    diagnostics: &mut Diagnostics,
    mounts: &mut Vec<(String, String)>,
) -> TlsParameters {
    let mut tls = TlsParameters::default();
    let ref_path = format!("outputs/{}", output.name);

    if secret.exists() {
        if secret.has_tls_cert_and_key() {
            tls.cert_path = Some(secret.path(constants::CLIENT_CERT_KEY));
            tls.key_path = Some(secret.path(constants::CLIENT_PRIVATE_KEY));
            mounts.push((secret.name.to_string(), constants::CLIENT_CERT_KEY.to_string()));
            mounts.push((secret.name.to_string(), constants::CLIENT_PRIVATE_KEY.to_string()));
        }
        if secret.has_ca_bundle() {
            tls.ca_path = Some(secret.path(constants::TRUSTED_CA_BUNDLE_KEY));
            mounts.push((secret.name.to_string(), constants::TRUSTED_CA_BUNDLE_KEY.to_string()));
        }
        if secret.has(constants::PASSPHRASE_KEY) {
            tls.passphrase = secret.text(constants::PASSPHRASE_KEY);
        }
    }

    if let Some(spec) = &output.tls {
        tls.insecure_skip_verify = spec.insecure_skip_verify;
        if let Some(profile) = &spec.security_profile {
            // A CA requested by profile-bearing TLS spec but absent from the
            // secret is a hard error: the collector would refuse to start.
            if output.secret.is_some() && secret.exists() && !secret.has_ca_bundle() {
                diagnostics.error(
                    DiagnosticKind::MissingSecretKey,
                    &ref_path,
                    format!("TLS requires key {:?} in secret {:?}", constants::TRUSTED_CA_BUNDLE_KEY, secret.name),
                );
            }
            let (min_version, ciphers) = tls_profile_parameters(profile);
            tls.min_version = Some(min_version);
            if !ciphers.is_empty() {
                tls.ciphers = Some(ciphers.join(","));
            }
        }
    }

    tls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{Cloudwatch, LogGroupBy, OutputSecretSpec};
    use crate::generator::secrets::{SecretData, SecretMap};

    fn cloudwatch_output(secret: Option<&str>) -> OutputSpec {
        OutputSpec {
            name: "cw".to_string(),
            output_type: OutputType::Cloudwatch,
            url: None,
            elasticsearch: None,
            fluentd_forward: None,
            loki: None,
            kafka: None,
            syslog: None,
            cloudwatch: Some(Cloudwatch {
                region: "us-east-1".to_string(),
                group_by: LogGroupBy::LogType,
                group_prefix: None,
            }),
            splunk: None,
            http: None,
            google_cloud_logging: None,
            azure_monitor: None,
            tls: None,
            secret: secret.map(|name| OutputSecretSpec { name: name.to_string() }),
            tuning: None,
        }
    }

    fn secret_map(name: &str, keys: &[(&str, &str)]) -> SecretMap {
        let mut data = SecretData::new();
        for (k, v) in keys {
            data.insert((*k).to_string(), v.as_bytes().to_vec());
        }
        let mut m = SecretMap::new();
        m.insert(name.to_string(), data);
        m
    }

    #[test]
    fn role_arn_takes_precedence_over_static_keys() {
        let secrets = secret_map(
            "s",
            &[
                ("role_arn", "arn:aws:iam::123456789012:role/my-role-to-assume"),
                ("aws_access_key_id", "id"),
                ("aws_secret_access_key", "key"),
            ],
        );
        let output = cloudwatch_output(Some("s"));
        let secret = SecretRef::lookup(&secrets, "s");
        let mut ds = Diagnostics::new();
        let frag = materialize(&output, &secret, &mut ds);
        assert_eq!(
            frag.auth,
            AuthMode::WebIdentitySts {
                role_arn: "arn:aws:iam::123456789012:role/my-role-to-assume".to_string()
            }
        );
        assert!(!ds.has_errors());
    }

    #[test]
    fn credentials_file_is_deprecated_but_honored() {
        let secrets = secret_map(
            "s",
            &[(
                "credentials",
                "[default]\nrole_arn = arn:aws:iam::123456789012:role/my-role\nweb_identity_token_file = /var/run/secrets/token",
            )],
        );
        let output = cloudwatch_output(Some("s"));
        let secret = SecretRef::lookup(&secrets, "s");
        let mut ds = Diagnostics::new();
        let frag = materialize(&output, &secret, &mut ds);
        assert_eq!(
            frag.auth,
            AuthMode::CredentialsFile {
                role_arn: "arn:aws:iam::123456789012:role/my-role".to_string()
            }
        );
        let sorted = ds.into_sorted();
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].kind, DiagnosticKind::Deprecation);
    }

    #[test]
    fn sts_arn_must_match_the_arn_grammar() {
        assert_eq!(parse_role_arn("arn:aws:iam::12345:role/short-account"), None);
        assert_eq!(
            parse_role_arn("prefix arn:aws:sts::123456789012:role/x suffix"),
            Some("arn:aws:sts::123456789012:role/x".to_string())
        );
    }

    #[test]
    fn modern_profile_sets_tls13() {
        let profile = TlsSecurityProfile {
            profile_type: TlsProfileType::Modern,
            ciphers: vec![],
            min_tls_version: None,
        };
        let (version, ciphers) = tls_profile_parameters(&profile);
        assert_eq!(version, "VersionTLS13");
        assert_eq!(ciphers.len(), 3);
    }
}
