//! Fixtures shared by the integration tests.

use std::path::PathBuf;

use client_encryption::{DecryptionKey, EncryptionCertificate, FieldLevelEncryptionConfigBuilder, FieldValueEncoding};
use serde_json::Value;

pub fn resource(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/resources").join(name)
}

pub fn certificate() -> EncryptionCertificate {
    EncryptionCertificate::load(resource("test_certificate-2048.pem")).unwrap()
}

pub fn decryption_key() -> DecryptionKey {
    DecryptionKey::load(resource("test_key_pkcs8-2048.pem"), None, None).unwrap()
}

pub fn vectors() -> Value {
    serde_json::from_str(&std::fs::read_to_string(resource("vectors.json")).unwrap()).unwrap()
}

pub fn field_level_builder(encoding: FieldValueEncoding) -> FieldLevelEncryptionConfigBuilder {
    FieldLevelEncryptionConfigBuilder::new()
        .with_encryption_certificate(certificate())
        .with_decryption_key(decryption_key())
        .with_oaep_padding_digest_algorithm("SHA-512")
        .with_field_value_encoding(encoding)
        .with_encrypted_value_field_name("encryptedValue")
        .with_iv_field_name("iv")
        .with_encrypted_key_field_name("encryptedKey")
        .with_oaep_padding_digest_algorithm_field_name("oaepHashingAlgorithm")
}
