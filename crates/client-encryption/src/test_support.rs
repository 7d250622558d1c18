//! Fixture key material and reference vectors for unit tests.

use serde_json::Value;

use common::FieldValueEncoding;

use crate::config::{FieldLevelEncryptionConfig, FieldLevelEncryptionConfigBuilder, JweConfig, JweConfigBuilder};
use crate::keys::{DecryptionKey, EncryptionCertificate, EncryptionKey};

pub const CERTIFICATE_PEM: &[u8] = include_bytes!("../tests/resources/test_certificate-2048.pem");
pub const CERTIFICATE_DER: &[u8] = include_bytes!("../tests/resources/test_certificate-2048.der");
pub const KEY_PKCS8_PEM: &[u8] = include_bytes!("../tests/resources/test_key_pkcs8-2048.pem");
pub const KEY_PKCS8_DER: &[u8] = include_bytes!("../tests/resources/test_key_pkcs8-2048.der");
pub const KEY_PKCS1_PEM: &[u8] = include_bytes!("../tests/resources/test_key_pkcs1-2048.pem");
pub const KEY_PKCS8_ENCRYPTED_PEM: &[u8] = include_bytes!("../tests/resources/test_key_pkcs8_encrypted-2048.pem");
pub const KEY_PKCS12: &[u8] = include_bytes!("../tests/resources/test_key_container-2048.p12");
pub const KEY_ALIAS: &str = "mykeyalias";
pub const KEY_PASSWORD: &str = "Password1";

const VECTORS: &str = include_str!("../tests/resources/vectors.json");

/// Vector at a JSON pointer, e.g. `/jwe/a256gcm`.
pub fn vector_json(pointer: &str) -> Value {
    let vectors: Value = serde_json::from_str(VECTORS).unwrap();
    vectors
        .pointer(pointer)
        .cloned()
        .unwrap_or_else(|| panic!("no vector at {pointer}"))
}

/// String vector at a JSON pointer.
pub fn vector(pointer: &str) -> String {
    match vector_json(pointer) {
        Value::String(s) => s,
        other => panic!("vector at {pointer} is not a string: {other}"),
    }
}

pub fn certificate() -> EncryptionCertificate {
    EncryptionCertificate::from_bytes(CERTIFICATE_PEM)
}

pub fn encryption_certificate() -> EncryptionKey {
    certificate().parse().unwrap()
}

pub fn decryption_key() -> DecryptionKey {
    DecryptionKey::from_bytes(KEY_PKCS8_PEM, None, None).unwrap()
}

/// Field-level builder with both keys and every field name set, no paths.
pub fn field_level_builder(encoding: FieldValueEncoding) -> FieldLevelEncryptionConfigBuilder {
    FieldLevelEncryptionConfigBuilder::new()
        .with_encryption_certificate(certificate())
        .with_decryption_key(decryption_key())
        .with_oaep_padding_digest_algorithm("SHA-256")
        .with_field_value_encoding(encoding)
        .with_encrypted_value_field_name("encryptedValue")
        .with_iv_field_name("iv")
        .with_encrypted_key_field_name("encryptedKey")
        .with_oaep_padding_digest_algorithm_field_name("oaepHashingAlgorithm")
        .with_encryption_certificate_fingerprint_field_name("encryptionCertificateFingerprint")
        .with_encryption_key_fingerprint_field_name("encryptionKeyFingerprint")
}

/// [`field_level_builder`] mapping `$.data` to `$.encryptedData` and back.
pub fn field_level_config(encoding: FieldValueEncoding) -> FieldLevelEncryptionConfig {
    field_level_builder(encoding)
        .with_encryption_path("$.data", "$.encryptedData")
        .with_decryption_path("$.encryptedData", "$.data")
        .build()
        .unwrap()
}

/// JWE config with both keys and the default paths.
pub fn jwe_config() -> JweConfig {
    JweConfigBuilder::new()
        .with_encryption_certificate(certificate())
        .with_decryption_key(decryption_key())
        .build()
        .unwrap()
}
