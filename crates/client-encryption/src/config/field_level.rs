//! Configuration for the legacy field-level scheme.

use common::{EncryptionError, FieldValueEncoding, Result};

use super::{non_empty, CommonConfig, EncryptionScheme, PathMapping, PathMappings};
use crate::crypto::OaepDigest;
use crate::keys::{DecryptionKey, EncryptionCertificate, EncryptionKey};

/// Immutable field-level encryption settings.
///
/// Envelope components travel either as sibling fields of the encrypted
/// value or as HTTP headers; an unset name means the component is not sent.
#[derive(Debug, Clone)]
pub struct FieldLevelEncryptionConfig {
    common: CommonConfig,
    encryption_certificate_fingerprint: Option<String>,
    oaep_digest: OaepDigest,
    field_value_encoding: FieldValueEncoding,
    iv_field_name: Option<String>,
    iv_header_name: Option<String>,
    encrypted_key_field_name: Option<String>,
    encrypted_key_header_name: Option<String>,
    oaep_digest_field_name: Option<String>,
    oaep_digest_header_name: Option<String>,
    certificate_fingerprint_field_name: Option<String>,
    certificate_fingerprint_header_name: Option<String>,
    key_fingerprint_field_name: Option<String>,
    key_fingerprint_header_name: Option<String>,
}

impl FieldLevelEncryptionConfig {
    pub fn builder() -> FieldLevelEncryptionConfigBuilder {
        FieldLevelEncryptionConfigBuilder::default()
    }

    pub fn scheme(&self) -> EncryptionScheme {
        EncryptionScheme::Legacy
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

    pub fn decryption_key(&self) -> Option<&DecryptionKey> {
        self.common.decryption_key()
    }

    pub fn encryption_certificate_fingerprint(&self) -> Option<&str> {
        self.encryption_certificate_fingerprint.as_deref()
    }

    pub fn encryption_key_fingerprint(&self) -> Option<&str> {
        self.common.encryption_key_fingerprint()
    }

    pub fn oaep_digest(&self) -> OaepDigest {
        self.oaep_digest
    }

    pub fn field_value_encoding(&self) -> FieldValueEncoding {
        self.field_value_encoding
    }

    pub fn encrypted_value_field_name(&self) -> &str {
        self.common.encrypted_value_field_name()
    }

    pub fn iv_field_name(&self) -> Option<&str> {
        self.iv_field_name.as_deref()
    }

    pub fn iv_header_name(&self) -> Option<&str> {
        self.iv_header_name.as_deref()
    }

    pub fn encrypted_key_field_name(&self) -> Option<&str> {
        self.encrypted_key_field_name.as_deref()
    }

    pub fn encrypted_key_header_name(&self) -> Option<&str> {
        self.encrypted_key_header_name.as_deref()
    }

    pub fn oaep_digest_field_name(&self) -> Option<&str> {
        self.oaep_digest_field_name.as_deref()
    }

    pub fn oaep_digest_header_name(&self) -> Option<&str> {
        self.oaep_digest_header_name.as_deref()
    }

    pub fn certificate_fingerprint_field_name(&self) -> Option<&str> {
        self.certificate_fingerprint_field_name.as_deref()
    }

    pub fn certificate_fingerprint_header_name(&self) -> Option<&str> {
        self.certificate_fingerprint_header_name.as_deref()
    }

    pub fn key_fingerprint_field_name(&self) -> Option<&str> {
        self.key_fingerprint_field_name.as_deref()
    }

    pub fn key_fingerprint_header_name(&self) -> Option<&str> {
        self.key_fingerprint_header_name.as_deref()
    }

    /// IV and wrapped key travel as HTTP headers.
    pub fn use_http_headers(&self) -> bool {
        self.iv_header_name.is_some()
    }

    /// IV and wrapped key travel inside the payload.
    pub fn use_http_payloads(&self) -> bool {
        self.iv_field_name.is_some()
    }
}

/// Builder for [`FieldLevelEncryptionConfig`].
#[derive(Debug, Clone, Default)]
pub struct FieldLevelEncryptionConfigBuilder {
    encryption_certificate: Option<EncryptionCertificate>,
    encryption_certificate_fingerprint: Option<String>,
    encryption_key_fingerprint: Option<String>,
    decryption_key: Option<DecryptionKey>,
    encryption_paths: PathMappings,
    decryption_paths: PathMappings,
    oaep_digest: Option<String>,
    field_value_encoding: Option<FieldValueEncoding>,
    encrypted_value_field_name: Option<String>,
    iv_field_name: Option<String>,
    iv_header_name: Option<String>,
    encrypted_key_field_name: Option<String>,
    encrypted_key_header_name: Option<String>,
    oaep_digest_field_name: Option<String>,
    oaep_digest_header_name: Option<String>,
    certificate_fingerprint_field_name: Option<String>,
    certificate_fingerprint_header_name: Option<String>,
    key_fingerprint_field_name: Option<String>,
    key_fingerprint_header_name: Option<String>,
}

impl FieldLevelEncryptionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encryption_certificate(mut self, certificate: EncryptionCertificate) -> Self {
        self.encryption_certificate = Some(certificate);
        self
    }

    /// Use a known certificate fingerprint instead of computing one.
    pub fn with_encryption_certificate_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.encryption_certificate_fingerprint = Some(fingerprint.into());
        self
    }

    /// Use a known key fingerprint instead of computing one.
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

    /// `SHA-256` or `SHA-512`.
    pub fn with_oaep_padding_digest_algorithm(mut self, digest: impl Into<String>) -> Self {
        self.oaep_digest = Some(digest.into());
        self
    }

    pub fn with_field_value_encoding(mut self, encoding: FieldValueEncoding) -> Self {
        self.field_value_encoding = Some(encoding);
        self
    }

    pub fn with_encrypted_value_field_name(mut self, name: impl Into<String>) -> Self {
        self.encrypted_value_field_name = Some(name.into());
        self
    }

    pub fn with_iv_field_name(mut self, name: impl Into<String>) -> Self {
        self.iv_field_name = Some(name.into());
        self
    }

    pub fn with_iv_header_name(mut self, name: impl Into<String>) -> Self {
        self.iv_header_name = Some(name.into());
        self
    }

    pub fn with_encrypted_key_field_name(mut self, name: impl Into<String>) -> Self {
        self.encrypted_key_field_name = Some(name.into());
        self
    }

    pub fn with_encrypted_key_header_name(mut self, name: impl Into<String>) -> Self {
        self.encrypted_key_header_name = Some(name.into());
        self
    }

    pub fn with_oaep_padding_digest_algorithm_field_name(mut self, name: impl Into<String>) -> Self {
        self.oaep_digest_field_name = Some(name.into());
        self
    }

    pub fn with_oaep_padding_digest_algorithm_header_name(mut self, name: impl Into<String>) -> Self {
        self.oaep_digest_header_name = Some(name.into());
        self
    }

    pub fn with_encryption_certificate_fingerprint_field_name(mut self, name: impl Into<String>) -> Self {
        self.certificate_fingerprint_field_name = Some(name.into());
        self
    }

    pub fn with_encryption_certificate_fingerprint_header_name(mut self, name: impl Into<String>) -> Self {
        self.certificate_fingerprint_header_name = Some(name.into());
        self
    }

    pub fn with_encryption_key_fingerprint_field_name(mut self, name: impl Into<String>) -> Self {
        self.key_fingerprint_field_name = Some(name.into());
        self
    }

    pub fn with_encryption_key_fingerprint_header_name(mut self, name: impl Into<String>) -> Self {
        self.key_fingerprint_header_name = Some(name.into());
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptionError::InvalidArgument`] for non-definite paths and
    /// [`EncryptionError::Configuration`] for the first inconsistent setting.
    /// An unreadable certificate is reported as it was parsed.
    pub fn build(self) -> Result<FieldLevelEncryptionConfig> {
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

        let oaep_digest = match non_empty(self.oaep_digest) {
            Some(digest) => digest.parse::<OaepDigest>()?,
            None => return Err(configuration("The digest algorithm for OAEP cannot be empty!")),
        };
        let field_value_encoding = self
            .field_value_encoding
            .ok_or_else(|| configuration("Value encoding for fields and headers cannot be empty!"))?;

        let iv_field_name = non_empty(self.iv_field_name);
        let iv_header_name = non_empty(self.iv_header_name);
        let encrypted_key_field_name = non_empty(self.encrypted_key_field_name);
        let encrypted_key_header_name = non_empty(self.encrypted_key_header_name);

        if iv_field_name.is_none() && iv_header_name.is_none() {
            return Err(configuration("At least one of IV field name or IV header name must be set!"));
        }
        if encrypted_key_field_name.is_none() && encrypted_key_header_name.is_none() {
            return Err(configuration(
                "At least one of encrypted key field name or encrypted key header name must be set!",
            ));
        }
        let encrypted_value_field_name = non_empty(self.encrypted_value_field_name)
            .ok_or_else(|| configuration("Encrypted value field name cannot be empty!"))?;

        if !self.decryption_paths.is_empty() && self.decryption_key.is_none() {
            return Err(configuration("Can't decrypt without decryption key!"));
        }
        if !self.encryption_paths.is_empty() && self.encryption_certificate.is_none() {
            return Err(configuration("Can't encrypt without encryption key!"));
        }
        if iv_header_name.is_some() != encrypted_key_header_name.is_some() {
            return Err(configuration(
                "IV header name and encrypted key header name must be both set or both unset!",
            ));
        }
        if iv_field_name.is_some() != encrypted_key_field_name.is_some() {
            return Err(configuration(
                "IV field name and encrypted key field name must be both set or both unset!",
            ));
        }

        let encryption_key = self
            .encryption_certificate
            .as_ref()
            .map(EncryptionCertificate::parse)
            .transpose()?;
        let encryption_certificate_fingerprint = non_empty(self.encryption_certificate_fingerprint)
            .or_else(|| encryption_key.as_ref().and_then(EncryptionKey::certificate_fingerprint));
        let encryption_key_fingerprint = non_empty(self.encryption_key_fingerprint)
            .or_else(|| encryption_key.as_ref().map(EncryptionKey::key_fingerprint));

        let common = CommonConfig::new(
            encryption_key,
            encryption_key_fingerprint,
            self.decryption_key,
            &self.encryption_paths,
            &self.decryption_paths,
            encrypted_value_field_name,
        )?;

        Ok(FieldLevelEncryptionConfig {
            common,
            encryption_certificate_fingerprint,
            oaep_digest,
            field_value_encoding,
            iv_field_name,
            iv_header_name,
            encrypted_key_field_name,
            encrypted_key_header_name,
            oaep_digest_field_name: non_empty(self.oaep_digest_field_name),
            oaep_digest_header_name: non_empty(self.oaep_digest_header_name),
            certificate_fingerprint_field_name: non_empty(self.certificate_fingerprint_field_name),
            certificate_fingerprint_header_name: non_empty(self.certificate_fingerprint_header_name),
            key_fingerprint_field_name: non_empty(self.key_fingerprint_field_name),
            key_fingerprint_header_name: non_empty(self.key_fingerprint_header_name),
        })
    }
}

fn configuration(message: &str) -> EncryptionError {
    EncryptionError::configuration(message)
}
