//! Configuration loading and validation for the payload tool.
//!
//! All values are read from `PAYLOAD_TOOL_*` environment variables. Path
//! mappings are written as `source=destination` pairs separated by commas,
//! e.g. `PAYLOAD_TOOL_ENCRYPTION_PATHS='$.data=$.encryptedData'`.

use anyhow::{Context, Result};
use serde::Deserialize;

use common::FieldValueEncoding;

const ENV_PREFIX: &str = "PAYLOAD_TOOL";

/// Which wire scheme the tool speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scheme {
    Jwe,
    FieldLevel,
}

/// Validated payload tool settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Wire scheme.
    #[serde(default = "default_scheme")]
    pub scheme: Scheme,

    /// Path to the recipient certificate or public key (PEM or DER).
    pub encryption_certificate: Option<String>,

    /// Path to the private key used for decryption (PEM or DER).
    pub decryption_key: Option<String>,

    /// Entry of a PKCS#12 decryption key container.
    pub decryption_key_alias: Option<String>,

    /// Password of an encrypted PKCS#8 or PKCS#12 decryption key.
    pub decryption_key_password: Option<String>,

    /// Overrides the key fingerprint computed from the certificate.
    pub encryption_key_fingerprint: Option<String>,

    /// `source=destination` pairs for encryption.
    pub encryption_paths: Option<String>,

    /// `source=destination` pairs for decryption.
    pub decryption_paths: Option<String>,

    /// Field holding the encrypted value.
    pub encrypted_value_field_name: Option<String>,

    /// OAEP digest of the field-level scheme.
    #[serde(default = "default_oaep_digest")]
    pub oaep_digest: String,

    /// `hex` or `base64`, field-level scheme only.
    #[serde(default = "default_field_value_encoding")]
    pub field_value_encoding: String,

    /// Field-level IV field name.
    #[serde(default = "default_iv_field_name")]
    pub iv_field_name: String,

    /// Field-level wrapped key field name.
    #[serde(default = "default_encrypted_key_field_name")]
    pub encrypted_key_field_name: String,

    /// Field-level OAEP digest field name; empty to omit.
    #[serde(default)]
    pub oaep_digest_field_name: String,

    /// Field-level certificate fingerprint field name; empty to omit.
    #[serde(default)]
    pub certificate_fingerprint_field_name: String,

    /// Field-level key fingerprint field name; empty to omit.
    #[serde(default)]
    pub key_fingerprint_field_name: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_scheme() -> Scheme {
    Scheme::Jwe
}
fn default_oaep_digest() -> String {
    "SHA-256".into()
}
fn default_field_value_encoding() -> String {
    "hex".into()
}
fn default_iv_field_name() -> String {
    "iv".into()
}
fn default_encrypted_key_field_name() -> String {
    "encryptedKey".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Settings {
    /// Load and validate settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or validation fails.
    pub fn from_env() -> Result<Self> {
        Self::load(config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load(environment: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(environment)
            .build()
            .context("failed to build payload-tool configuration from environment")?;

        let s: Settings = cfg
            .try_deserialize()
            .context("failed to deserialise payload-tool configuration")?;

        s.validate()?;
        Ok(s)
    }

    fn validate(&self) -> Result<()> {
        if self.encryption_certificate.is_none() && self.decryption_key.is_none() {
            anyhow::bail!(
                "{ENV_PREFIX}_ENCRYPTION_CERTIFICATE or {ENV_PREFIX}_DECRYPTION_KEY is required"
            );
        }
        if let Some(path) = &self.encryption_certificate {
            ensure_non_empty(path, "ENCRYPTION_CERTIFICATE")?;
        }
        if let Some(path) = &self.decryption_key {
            ensure_non_empty(path, "DECRYPTION_KEY")?;
        }
        self.encryption_path_mappings()?;
        self.decryption_path_mappings()?;

        if self.scheme == Scheme::FieldLevel {
            self.field_value_encoding()?;
            ensure_non_empty(&self.oaep_digest, "OAEP_DIGEST")?;
            if self.encryption_path_mappings()?.is_empty() && self.decryption_path_mappings()?.is_empty() {
                anyhow::bail!("the field-level scheme needs {ENV_PREFIX}_ENCRYPTION_PATHS or {ENV_PREFIX}_DECRYPTION_PATHS");
            }
        }
        Ok(())
    }

    pub fn encryption_path_mappings(&self) -> Result<Vec<(String, String)>> {
        parse_path_mappings(self.encryption_paths.as_deref(), "ENCRYPTION_PATHS")
    }

    pub fn decryption_path_mappings(&self) -> Result<Vec<(String, String)>> {
        parse_path_mappings(self.decryption_paths.as_deref(), "DECRYPTION_PATHS")
    }

    pub fn field_value_encoding(&self) -> Result<FieldValueEncoding> {
        self.field_value_encoding
            .parse()
            .with_context(|| format!("{ENV_PREFIX}_FIELD_VALUE_ENCODING is invalid"))
    }
}

/// Parse `source=destination[,source=destination...]`.
fn parse_path_mappings(raw: Option<&str>, name: &str) -> Result<Vec<(String, String)>> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(|pair| {
            let (source, destination) = pair
                .split_once('=')
                .with_context(|| format!("{ENV_PREFIX}_{name}: expected source=destination, got '{pair}'"))?;
            let (source, destination) = (source.trim(), destination.trim());
            if source.is_empty() || destination.is_empty() {
                anyhow::bail!("{ENV_PREFIX}_{name}: empty path in '{pair}'");
            }
            Ok((source.to_owned(), destination.to_owned()))
        })
        .collect()
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{ENV_PREFIX}_{name} must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment(vars: &[(&str, &str)]) -> config::Environment {
        let source = vars
            .iter()
            .map(|(k, v)| (format!("{ENV_PREFIX}_{k}"), v.to_string()))
            .collect();
        config::Environment::with_prefix(ENV_PREFIX).source(Some(source))
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_scheme(), Scheme::Jwe);
        assert_eq!(default_oaep_digest(), "SHA-256");
        assert_eq!(default_field_value_encoding(), "hex");
        assert_eq!(default_iv_field_name(), "iv");
        assert_eq!(default_encrypted_key_field_name(), "encryptedKey");
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn loads_from_prefixed_variables() {
        let settings = Settings::load(environment(&[
            ("SCHEME", "field-level"),
            ("DECRYPTION_KEY", "/keys/client.p12"),
            ("DECRYPTION_KEY_ALIAS", "mykeyalias"),
            ("DECRYPTION_PATHS", "$.encryptedData=$.data, $.a=$.b"),
            ("FIELD_VALUE_ENCODING", "base64"),
        ]))
        .unwrap();

        assert_eq!(settings.scheme, Scheme::FieldLevel);
        assert_eq!(settings.decryption_key.as_deref(), Some("/keys/client.p12"));
        assert_eq!(settings.decryption_key_alias.as_deref(), Some("mykeyalias"));
        assert_eq!(
            settings.decryption_path_mappings().unwrap(),
            vec![
                ("$.encryptedData".to_owned(), "$.data".to_owned()),
                ("$.a".to_owned(), "$.b".to_owned()),
            ]
        );
        assert_eq!(settings.field_value_encoding().unwrap(), FieldValueEncoding::Base64);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn rejects_missing_key_material() {
        assert!(Settings::load(environment(&[("SCHEME", "jwe")])).is_err());
    }

    #[test]
    fn rejects_malformed_path_pairs() {
        let err = parse_path_mappings(Some("$.a"), "ENCRYPTION_PATHS").unwrap_err();
        assert!(err.to_string().contains("expected source=destination"));
        assert!(parse_path_mappings(Some("$.a= "), "ENCRYPTION_PATHS").is_err());
        assert!(parse_path_mappings(None, "ENCRYPTION_PATHS").unwrap().is_empty());
    }

    #[test]
    fn field_level_needs_paths() {
        let result = Settings::load(environment(&[
            ("SCHEME", "field-level"),
            ("ENCRYPTION_CERTIFICATE", "/keys/cert.pem"),
        ]));
        assert!(result.is_err());
    }
}
