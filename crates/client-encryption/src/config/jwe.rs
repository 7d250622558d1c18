//! Configuration for the JWE scheme.

use common::{EncryptionError, Result};

use super::{non_empty, CommonConfig, EncryptionScheme, PathMapping, PathMappings};
use crate::json::path::ROOT;
use crate::keys::{DecryptionKey, EncryptionCertificate, EncryptionKey};

const DEFAULT_DECRYPTION_SOURCE: &str = "$.encryptedData";
const DEFAULT_ENCRYPTED_VALUE_FIELD: &str = "encryptedData";

/// Immutable JWE settings.
#[derive(Debug, Clone)]
pub struct JweConfig {
    common: CommonConfig,
}

impl JweConfig {
    pub fn builder() -> JweConfigBuilder {
        JweConfigBuilder::default()
    }

    pub fn scheme(&self) -> EncryptionScheme {
        EncryptionScheme::Jwe
    }

    pub fn common(&self) -> &CommonConfig {
        &self.common
    }

    pub fn encryption_paths(&self) -> &[PathMapping] {
        self.common.encryption_paths()
    }

    pub fn decryption_paths(&self) -> &[PathMapping] {
        self.common.decryption_paths()
    }

    pub fn encryption_key(&self) -> Option<&EncryptionKey> {
        self.common.encryption_key()
    }

    /// Value of the `kid` header on encrypted tokens.
    pub fn encryption_key_fingerprint(&self) -> Option<&str> {
        self.common.encryption_key_fingerprint()
    }

    pub fn decryption_key(&self) -> Option<&DecryptionKey> {
        self.common.decryption_key()
    }

    pub fn encrypted_value_field_name(&self) -> &str {
        self.common.encrypted_value_field_name()
    }
}

/// Builder for [`JweConfig`].
///
/// Without explicit paths the whole payload is encrypted into
/// `{"encryptedData": <token>}` and that shape is decrypted back to the root.
#[derive(Debug, Clone, Default)]
pub struct JweConfigBuilder {
    encryption_certificate: Option<EncryptionCertificate>,
    encryption_key_fingerprint: Option<String>,
    decryption_key: Option<DecryptionKey>,
    encryption_paths: PathMappings,
    decryption_paths: PathMappings,
    encrypted_value_field_name: Option<String>,
}

impl JweConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encryption_certificate(mut self, certificate: EncryptionCertificate) -> Self {
        self.encryption_certificate = Some(certificate);
        self
    }

    pub fn with_encryption_key_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.encryption_key_fingerprint = Some(fingerprint.into());
        self
    }

    pub fn with_decryption_key(mut self, key: DecryptionKey) -> Self {
        self.decryption_key = Some(key);
        self
    }

    pub fn with_encryption_path(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.encryption_paths.insert(source, destination);
        self
    }

    pub fn with_decryption_path(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.decryption_paths.insert(source, destination);
        self
    }

    pub fn with_encrypted_value_field_name(mut self, name: impl Into<String>) -> Self {
        self.encrypted_value_field_name = Some(name.into());
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// - [`EncryptionError::Configuration`] when neither a certificate nor a
    ///   decryption key is set.
    /// - [`EncryptionError::EncryptionFailure`] when the key fingerprint must
    ///   be computed from an unreadable certificate.
    /// - [`EncryptionError::InvalidArgument`] for non-definite paths.
    pub fn build(self) -> Result<JweConfig> {
        if self.encryption_certificate.is_none() && self.decryption_key.is_none() {
            return Err(EncryptionError::configuration(
                "You must include at least an encryption certificate or a decryption key",
            ));
        }

        let fingerprint = non_empty(self.encryption_key_fingerprint);
        let encryption_key = match &self.encryption_certificate {
            None => None,
            Some(certificate) => match (certificate.parse(), &fingerprint) {
                (Ok(key), _) => Some(key),
                (Err(e), None) => {
                    return Err(EncryptionError::failure_with(
                        "Failed to compute encryption key fingerprint!",
                        e,
                    ))
                }
                (Err(e), Some(_)) => return Err(e),
            },
        };
        let encryption_key_fingerprint =
            fingerprint.or_else(|| encryption_key.as_ref().map(EncryptionKey::key_fingerprint));

        if !self.decryption_paths.all_definite() {
            return Err(EncryptionError::invalid_argument(
                "JSON paths for decryption must point to a single item!",
            ));
        }
        if !self.encryption_paths.all_definite() {
            return Err(EncryptionError::invalid_argument(
                "JSON paths for encryption must point to a single item!",
            ));
        }

        let encryption_paths = if self.encryption_paths.is_empty() {
            [(ROOT, ROOT)].into_iter().collect()
        } else {
            self.encryption_paths
        };
        let decryption_paths = if self.decryption_paths.is_empty() {
            [(DEFAULT_DECRYPTION_SOURCE, ROOT)].into_iter().collect()
        } else {
            self.decryption_paths
        };
        let encrypted_value_field_name = non_empty(self.encrypted_value_field_name)
            .unwrap_or_else(|| DEFAULT_ENCRYPTED_VALUE_FIELD.to_owned());

        let common = CommonConfig::new(
            encryption_key,
            encryption_key_fingerprint,
            self.decryption_key,
            &encryption_paths,
            &decryption_paths,
            encrypted_value_field_name,
        )?;
        Ok(JweConfig { common })
    }
}
