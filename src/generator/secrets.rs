//! # Secret Map
//!
//! The generator borrows a map of secret name to key/value data for the
//! duration of one call. Values are opaque bytes; the generator only ever
//! inspects presence and, for a few keys (role ARNs, SASL flags), the
//! UTF-8 text content.

use std::collections::BTreeMap;

use crate::constants;

/// Secret data for one referenced secret: key to opaque bytes.
pub type SecretData = BTreeMap<String, Vec<u8>>;

/// All secrets visible to a single generation call, by secret name.
pub type SecretMap = BTreeMap<String, SecretData>;

/// Read-only view of the secret referenced by one output.
#[derive(Debug, Clone, Copy)]
pub struct SecretRef<'a> {
    /// Secret name from the output spec, used in mount paths.
    pub name: &'a str,
    data: Option<&'a SecretData>,
}

impl<'a> SecretRef<'a> {
    pub fn lookup(secrets: &'a SecretMap, name: &'a str) -> Self {
        SecretRef {
            name,
            data: secrets.get(name),
        }
    }

    /// A reference whose secret was not found still knows its name so the
    /// validator can point at it.
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    pub fn get(&self, key: &str) -> Option<&'a [u8]> {
        self.data.and_then(|d| d.get(key)).map(Vec::as_slice)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn has_all(&self, keys: &[&str]) -> bool {
        keys.iter().all(|k| self.has(k))
    }

    /// First present key of `keys`, if any.
    pub fn try_keys(&self, keys: &[&str]) -> Option<&'a [u8]> {
        keys.iter().find_map(|k| self.get(k))
    }

    /// UTF-8 text of a key; lossy decoding never fails the generation.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| String::from_utf8_lossy(v).into_owned())
    }

    pub fn has_tls_cert_and_key(&self) -> bool {
        self.has_all(&[constants::CLIENT_CERT_KEY, constants::CLIENT_PRIVATE_KEY])
    }

    pub fn has_ca_bundle(&self) -> bool {
        self.has(constants::TRUSTED_CA_BUNDLE_KEY)
    }

    pub fn has_username_password(&self) -> bool {
        self.has_all(&[constants::CLIENT_USERNAME_KEY, constants::CLIENT_PASSWORD_KEY])
    }

    /// Mount path of one key of this secret.
    pub fn path(&self, key: &str) -> String {
        constants::secret_path(self.name, key)
    }
}

/// Keys the generator understands. Anything else in a referenced secret is
/// reported with an UnknownSecretKey warning so typos surface early.
pub const KNOWN_SECRET_KEYS: &[&str] = &[
    constants::CLIENT_CERT_KEY,
    constants::CLIENT_PRIVATE_KEY,
    constants::TRUSTED_CA_BUNDLE_KEY,
    constants::PASSPHRASE_KEY,
    constants::BEARER_TOKEN_FILE_KEY,
    constants::CLIENT_USERNAME_KEY,
    constants::CLIENT_PASSWORD_KEY,
    constants::SASL_ENABLE_KEY,
    constants::SASL_MECHANISMS_KEY,
    constants::DEPRECATED_SASL_OVER_SSL_KEY,
    constants::SHARED_KEY,
    constants::AWS_ACCESS_KEY_ID,
    constants::AWS_SECRET_ACCESS_KEY,
    constants::AWS_CREDENTIALS_KEY,
    constants::AWS_WEB_IDENTITY_ROLE_KEY,
    constants::SPLUNK_HEC_TOKEN_KEY,
    constants::GOOGLE_APPLICATION_CREDENTIALS_KEY,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets_with(name: &str, keys: &[(&str, &str)]) -> SecretMap {
        let mut data = SecretData::new();
        for (k, v) in keys {
            data.insert((*k).to_string(), v.as_bytes().to_vec());
        }
        let mut m = SecretMap::new();
        m.insert(name.to_string(), data);
        m
    }

    #[test]
    fn missing_secret_still_carries_its_name() {
        let secrets = SecretMap::new();
        let r = SecretRef::lookup(&secrets, "absent");
        assert!(!r.exists());
        assert_eq!(r.path("tls.crt"), "/var/run/ocp-collector/secrets/absent/tls.crt");
    }

    #[test]
    fn try_keys_prefers_earlier_keys() {
        let secrets = secrets_with("s", &[("a", "1"), ("b", "2")]);
        let r = SecretRef::lookup(&secrets, "s");
        assert_eq!(r.try_keys(&["missing", "b", "a"]), Some("2".as_bytes()));
    }
}
