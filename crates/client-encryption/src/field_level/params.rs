//! Per-call IV and content key for the field-level scheme.

use std::fmt;

use common::encoding::{decode_value, encode_bytes};
use common::{EncryptionError, Result};

use crate::config::FieldLevelEncryptionConfig;
use crate::crypto::{cipher, rsa, OaepDigest, SecretKey};

/// AES key size used by the field-level scheme.
pub const SYMMETRIC_KEY_BITS: usize = 128;

/// IV, wrapped content key and OAEP digest for one encrypt or decrypt call.
///
/// Generated params carry the raw IV and key alongside their encoded form.
/// Params read from a payload or headers only carry the encoded values and
/// are decoded (and unwrapped) on demand.
#[derive(Clone)]
pub struct FieldLevelEncryptionParams {
    iv_value: String,
    encrypted_key_value: String,
    oaep_digest_value: Option<String>,
    iv: Option<Vec<u8>>,
    secret_key: Option<SecretKey>,
}

impl FieldLevelEncryptionParams {
    /// Fresh IV and AES key, the key wrapped for the configured certificate.
    ///
    /// # Errors
    ///
    /// Fails if the config has no encryption certificate or wrapping fails.
    pub fn generate(config: &FieldLevelEncryptionConfig) -> Result<Self> {
        let encryption_key = config.common().require_encryption_key()?;
        let encoding = config.field_value_encoding();

        let iv = cipher::generate_iv();
        let secret_key = cipher::generate_cek(SYMMETRIC_KEY_BITS);
        let wrapped = rsa::wrap_secret_key(
            encryption_key.public_key(),
            secret_key.as_bytes(),
            config.oaep_digest(),
        )?;

        Ok(Self {
            iv_value: encode_bytes(&iv, encoding),
            encrypted_key_value: encode_bytes(&wrapped, encoding),
            oaep_digest_value: Some(config.oaep_digest().wire_value().to_owned()),
            iv: Some(iv.to_vec()),
            secret_key: Some(secret_key),
        })
    }

    /// Params received from the other side.
    pub fn new(
        iv_value: impl Into<String>,
        encrypted_key_value: impl Into<String>,
        oaep_digest_value: Option<String>,
    ) -> Self {
        Self {
            iv_value: iv_value.into(),
            encrypted_key_value: encrypted_key_value.into(),
            oaep_digest_value: oaep_digest_value.filter(|v| !v.is_empty()),
            iv: None,
            secret_key: None,
        }
    }

    pub fn iv_value(&self) -> &str {
        &self.iv_value
    }

    pub fn encrypted_key_value(&self) -> &str {
        &self.encrypted_key_value
    }

    /// Digest on the wire, e.g. `SHA256`.
    pub fn oaep_digest_value(&self) -> Option<&str> {
        self.oaep_digest_value.as_deref()
    }

    /// Raw IV bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptionError::EncryptionFailure`] if the IV value does not
    /// decode with the configured encoding.
    pub fn iv_bytes(&self, config: &FieldLevelEncryptionConfig) -> Result<Vec<u8>> {
        if let Some(iv) = &self.iv {
            return Ok(iv.clone());
        }
        decode_value(&self.iv_value, config.field_value_encoding())
            .map_err(|e| EncryptionError::failure_with("Failed to decode the provided IV value!", e))
    }

    /// Raw AES key, unwrapped with the configured decryption key when the
    /// params were not generated locally.
    ///
    /// # Errors
    ///
    /// Unwrap failures surface as they are; anything else (bad encoding,
    /// unknown digest, no decryption key) is wrapped in
    /// [`EncryptionError::EncryptionFailure`].
    pub fn secret_key_bytes(&self, config: &FieldLevelEncryptionConfig) -> Result<SecretKey> {
        if let Some(secret_key) = &self.secret_key {
            return Ok(secret_key.clone());
        }
        self.unwrap_secret_key(config).map_err(|e| match e {
            EncryptionError::EncryptionFailure { .. } => e,
            other => EncryptionError::failure_with(
                "Failed to decode and unwrap the provided secret key value!",
                other,
            ),
        })
    }

    fn unwrap_secret_key(&self, config: &FieldLevelEncryptionConfig) -> Result<SecretKey> {
        let wrapped = decode_value(&self.encrypted_key_value, config.field_value_encoding())?;
        let digest = match &self.oaep_digest_value {
            Some(value) => value.parse::<OaepDigest>()?,
            None => config.oaep_digest(),
        };
        let decryption_key = config.common().require_decryption_key()?;
        rsa::unwrap_secret_key(decryption_key.private_key(), &wrapped, digest).map(SecretKey::new)
    }
}

impl fmt::Debug for FieldLevelEncryptionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldLevelEncryptionParams")
            .field("oaep_digest_value", &self.oaep_digest_value)
            .field("generated", &self.secret_key.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use common::FieldValueEncoding;

    #[test]
    fn generated_params_are_encoded_with_the_config() {
        let config = test_support::field_level_config(FieldValueEncoding::Hex);
        let params = FieldLevelEncryptionParams::generate(&config).unwrap();

        assert_eq!(params.iv_value().len(), 32);
        assert_eq!(params.encrypted_key_value().len(), 512);
        assert_eq!(params.oaep_digest_value(), Some("SHA256"));
        assert_eq!(params.iv_bytes(&config).unwrap().len(), 16);
        assert_eq!(params.secret_key_bytes(&config).unwrap().len(), 16);
    }

    #[test]
    fn received_params_unwrap_to_the_generated_key() {
        let config = test_support::field_level_config(FieldValueEncoding::Base64);
        let generated = FieldLevelEncryptionParams::generate(&config).unwrap();
        let received = FieldLevelEncryptionParams::new(
            generated.iv_value(),
            generated.encrypted_key_value(),
            Some("SHA256".into()),
        );

        assert_eq!(received.iv_bytes(&config).unwrap(), generated.iv_bytes(&config).unwrap());
        assert_eq!(
            received.secret_key_bytes(&config).unwrap(),
            generated.secret_key_bytes(&config).unwrap()
        );
    }

    #[test]
    fn missing_digest_falls_back_to_config() {
        let config = test_support::field_level_config(FieldValueEncoding::Hex);
        let generated = FieldLevelEncryptionParams::generate(&config).unwrap();
        let received = FieldLevelEncryptionParams::new(generated.iv_value(), generated.encrypted_key_value(), None);
        assert_eq!(
            received.secret_key_bytes(&config).unwrap(),
            generated.secret_key_bytes(&config).unwrap()
        );
    }

    #[test]
    fn undecodable_iv_is_an_encryption_failure() {
        let config = test_support::field_level_config(FieldValueEncoding::Hex);
        let params = FieldLevelEncryptionParams::new("not hex", "00", None);
        let err = params.iv_bytes(&config).unwrap_err();
        assert!(matches!(err, EncryptionError::EncryptionFailure { .. }));
        assert_eq!(err.to_string(), "Failed to decode the provided IV value!");
    }

    #[test]
    fn undecodable_key_is_an_encryption_failure() {
        let config = test_support::field_level_config(FieldValueEncoding::Hex);
        let params = FieldLevelEncryptionParams::new("00", "zz", None);
        let err = params.secret_key_bytes(&config).unwrap_err();
        assert_eq!(err.to_string(), "Failed to decode and unwrap the provided secret key value!");
    }

    #[test]
    fn unwrap_failure_is_reported_as_is() {
        let config = test_support::field_level_config(FieldValueEncoding::Hex);
        let params = FieldLevelEncryptionParams::new("00", "00".repeat(256), None);
        let err = params.secret_key_bytes(&config).unwrap_err();
        assert_eq!(err.to_string(), "Failed to unwrap secret key!");
    }

    #[test]
    fn debug_hides_key_material() {
        let config = test_support::field_level_config(FieldValueEncoding::Hex);
        let params = FieldLevelEncryptionParams::generate(&config).unwrap();
        let debug = format!("{params:?}");
        assert!(!debug.contains(params.iv_value()));
    }
}
