//! Builds the library config selected by [`Settings`] and runs it.

use anyhow::{Context, Result};
use tracing::info;

use client_encryption::{
    field_level, jwe, DecryptionKey, EncryptionCertificate, FieldLevelEncryptionConfig,
    FieldLevelEncryptionConfigBuilder, JweConfig, JweConfigBuilder,
};

use crate::config::{Scheme, Settings};

/// A validated config for one of the two schemes.
#[derive(Debug)]
pub enum Codec {
    Jwe(JweConfig),
    FieldLevel(FieldLevelEncryptionConfig),
}

impl Codec {
    /// Load the key material named in `settings` and build the config.
    ///
    /// # Errors
    ///
    /// Returns an error if a key file cannot be read or the builder rejects
    /// the settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let certificate = settings
            .encryption_certificate
            .as_deref()
            .map(EncryptionCertificate::load)
            .transpose()
            .context("failed to load the encryption certificate")?;
        let decryption_key = settings
            .decryption_key
            .as_deref()
            .map(|path| {
                DecryptionKey::load(
                    path,
                    settings.decryption_key_alias.as_deref(),
                    settings.decryption_key_password.as_deref(),
                )
            })
            .transpose()
            .context("failed to load the decryption key")?;

        let codec = match settings.scheme {
            Scheme::Jwe => Codec::Jwe(jwe_config(settings, certificate, decryption_key)?),
            Scheme::FieldLevel => Codec::FieldLevel(field_level_config(settings, certificate, decryption_key)?),
        };
        info!(scheme = ?settings.scheme, "encryption config ready");
        Ok(codec)
    }

    pub fn encrypt(&self, payload: &str) -> Result<String> {
        let encrypted = match self {
            Codec::Jwe(config) => jwe::encrypt_payload(payload, config),
            Codec::FieldLevel(config) => field_level::encrypt_payload(payload, config, None),
        };
        encrypted.context("payload encryption failed")
    }

    pub fn decrypt(&self, payload: &str) -> Result<String> {
        let decrypted = match self {
            Codec::Jwe(config) => jwe::decrypt_payload(payload, config),
            Codec::FieldLevel(config) => field_level::decrypt_payload(payload, config, None),
        };
        decrypted.context("payload decryption failed")
    }
}

fn jwe_config(
    settings: &Settings,
    certificate: Option<EncryptionCertificate>,
    decryption_key: Option<DecryptionKey>,
) -> Result<JweConfig> {
    let mut builder = JweConfigBuilder::new();
    if let Some(certificate) = certificate {
        builder = builder.with_encryption_certificate(certificate);
    }
    if let Some(key) = decryption_key {
        builder = builder.with_decryption_key(key);
    }
    if let Some(fingerprint) = &settings.encryption_key_fingerprint {
        builder = builder.with_encryption_key_fingerprint(fingerprint);
    }
    if let Some(name) = &settings.encrypted_value_field_name {
        builder = builder.with_encrypted_value_field_name(name);
    }
    for (source, destination) in settings.encryption_path_mappings()? {
        builder = builder.with_encryption_path(source, destination);
    }
    for (source, destination) in settings.decryption_path_mappings()? {
        builder = builder.with_decryption_path(source, destination);
    }
    builder.build().context("invalid JWE configuration")
}

fn field_level_config(
    settings: &Settings,
    certificate: Option<EncryptionCertificate>,
    decryption_key: Option<DecryptionKey>,
) -> Result<FieldLevelEncryptionConfig> {
    let mut builder = FieldLevelEncryptionConfigBuilder::new()
        .with_oaep_padding_digest_algorithm(settings.oaep_digest.as_str())
        .with_field_value_encoding(settings.field_value_encoding()?)
        .with_encrypted_value_field_name(
            settings
                .encrypted_value_field_name
                .as_deref()
                .unwrap_or("encryptedValue"),
        )
        .with_iv_field_name(settings.iv_field_name.as_str())
        .with_encrypted_key_field_name(settings.encrypted_key_field_name.as_str())
        .with_oaep_padding_digest_algorithm_field_name(settings.oaep_digest_field_name.as_str())
        .with_encryption_certificate_fingerprint_field_name(settings.certificate_fingerprint_field_name.as_str())
        .with_encryption_key_fingerprint_field_name(settings.key_fingerprint_field_name.as_str());
    if let Some(certificate) = certificate {
        builder = builder.with_encryption_certificate(certificate);
    }
    if let Some(key) = decryption_key {
        builder = builder.with_decryption_key(key);
    }
    if let Some(fingerprint) = &settings.encryption_key_fingerprint {
        builder = builder.with_encryption_key_fingerprint(fingerprint);
    }
    for (source, destination) in settings.encryption_path_mappings()? {
        builder = builder.with_encryption_path(source, destination);
    }
    for (source, destination) in settings.decryption_path_mappings()? {
        builder = builder.with_decryption_path(source, destination);
    }
    builder.build().context("invalid field-level encryption configuration")
}
