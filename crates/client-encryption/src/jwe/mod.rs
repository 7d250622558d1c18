//! JWE payload encryption.
//!
//! Each configured source element is serialised and sealed into a compact
//! token written under the encrypted-value field of the destination object.
//! On the way back the token found at a decryption source is opened and the
//! clear value placed at the destination.

pub mod header;
pub mod object;

pub use header::JweHeader;
pub use object::JweObject;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use common::{EncryptionError, Result};

use crate::config::{JweConfig, PathMapping};
use crate::json::document::{
    add_decrypted_data_to_payload, check_or_create_out_object, delete, find, is_empty_object,
    parse_payload, sanitize, serialize_payload, to_json_string,
};

/// Encrypt every configured path of `payload`.
///
/// # Errors
///
/// The first failing path aborts the call.
pub fn encrypt_payload(payload: &str, config: &JweConfig) -> Result<String> {
    let mut document = parse_payload(payload)?;

    for mapping in config.encryption_paths() {
        if encrypt_path(&mut document, mapping, config)? {
            debug!(source = %mapping.source, destination = %mapping.destination, "encrypted payload path");
        } else {
            trace!(path = %mapping.source, "nothing to encrypt");
        }
    }

    serialize_payload(&document)
}

/// Decrypt every configured path of `payload`.
///
/// # Errors
///
/// Returns [`EncryptionError::InvalidArgument`] when a source holds
/// something other than a token string, and
/// [`EncryptionError::EncryptionFailure`] when a token does not open.
pub fn decrypt_payload(payload: &str, config: &JweConfig) -> Result<String> {
    let mut document = parse_payload(payload)?;

    for mapping in config.decryption_paths() {
        if decrypt_path(&mut document, mapping, config)? {
            debug!(source = %mapping.source, destination = %mapping.destination, "decrypted payload path");
        } else {
            trace!(path = %mapping.source, "nothing to decrypt");
        }
    }

    serialize_payload(&document)
}

fn encrypt_path(document: &mut Value, mapping: &PathMapping, config: &JweConfig) -> Result<bool> {
    let Some(element) = find(document, &mapping.source) else {
        return Ok(false);
    };
    let clear = sanitize(&to_json_string(element)?);

    let header = JweHeader::for_json(config.encryption_key_fingerprint().map(str::to_owned));
    let token = JweObject::encrypt(config, &clear, header)?.serialize();

    if mapping.source.is_root() {
        *document = Value::Object(Map::new());
    } else {
        delete(document, &mapping.source)?;
    }

    let out = check_or_create_out_object(document, &mapping.destination)?;
    out.insert(config.encrypted_value_field_name().to_owned(), Value::String(token));
    Ok(true)
}

/// Returns `false` when the path had nothing to decrypt.
fn decrypt_path(document: &mut Value, mapping: &PathMapping, config: &JweConfig) -> Result<bool> {
    let token = match find(document, &mapping.source) {
        None | Some(Value::Null) => return Ok(false),
        Some(Value::String(token)) => token.clone(),
        Some(_) => {
            return Err(EncryptionError::invalid_argument(format!(
                "JWE token expected at path: '{}'!",
                mapping.source.raw()
            )))
        }
    };

    let object = JweObject::parse(&token)?;
    trace!(enc = %object.header().enc, path = %mapping.source, "opening token");
    let decrypted = object.decrypt(config)?;

    if mapping.source.is_root() {
        *document = Value::Object(Map::new());
        add_decrypted_data_to_payload(document, &mapping.destination, &sanitize(&decrypted))?;
        return Ok(true);
    }

    delete(document, &mapping.source)?;
    add_decrypted_data_to_payload(document, &mapping.destination, &sanitize(&decrypted))?;

    let holder = mapping.source.parent()?;
    if !holder.is_root() && is_empty_object(document, &holder) {
        delete(document, &holder)?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JweConfigBuilder;
    use crate::test_support;
    use serde_json::json;

    fn config_with_paths(encrypt: (&str, &str), decrypt: (&str, &str)) -> JweConfig {
        JweConfigBuilder::new()
            .with_encryption_certificate(test_support::certificate())
            .with_decryption_key(test_support::decryption_key())
            .with_encryption_path(encrypt.0, encrypt.1)
            .with_decryption_path(decrypt.0, decrypt.1)
            .with_encrypted_value_field_name("encryptedValue")
            .build()
            .unwrap()
    }

    fn json(payload: &str) -> Value {
        serde_json::from_str(payload).unwrap()
    }

    #[test]
    fn whole_payload_round_trip_with_defaults() {
        let config = test_support::jwe_config();
        let payload = r#"{"foo":"bar","nested":{"list":[1,2,3]}}"#;

        let encrypted = json(&encrypt_payload(payload, &config).unwrap());
        let object = encrypted.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(encrypted["encryptedData"].as_str().unwrap().split('.').count(), 5);

        let decrypted = decrypt_payload(&encrypted.to_string(), &config).unwrap();
        assert_eq!(decrypted, payload);
    }

    #[test]
    fn root_array_round_trip() {
        let config = test_support::jwe_config();
        let encrypted = encrypt_payload("[{},{}]", &config).unwrap();
        assert_eq!(decrypt_payload(&encrypted, &config).unwrap(), "[{},{}]");
    }

    #[test]
    fn decrypts_root_array_token_from_elsewhere() {
        let config = test_support::jwe_config();
        let payload = json!({"encryptedData": test_support::vector("/jwe/a256gcm_iv16_root_array")});
        assert_eq!(decrypt_payload(&payload.to_string(), &config).unwrap(), "[{},{}]");
    }

    #[test]
    fn nested_path_round_trip() {
        let config = config_with_paths(
            ("$.path.to.foo", "$.path.to.encryptedFoo"),
            ("$.path.to.encryptedFoo.encryptedValue", "$.path.to.foo"),
        );
        let payload = r#"{"path":{"to":{"foo":{"sensitive":"this is a secret!","sensitive2":"this is a super-secret!"}}}}"#;

        let encrypted = json(&encrypt_payload(payload, &config).unwrap());
        assert!(encrypted["path"]["to"].get("foo").is_none());
        assert!(encrypted["path"]["to"]["encryptedFoo"]["encryptedValue"].is_string());

        let decrypted = decrypt_payload(&encrypted.to_string(), &config).unwrap();
        assert_eq!(decrypted, payload);
    }

    #[test]
    fn kid_carries_the_key_fingerprint() {
        let config = test_support::jwe_config();
        let encrypted = json(&encrypt_payload(r#"{"a":1}"#, &config).unwrap());
        let object = JweObject::parse(encrypted["encryptedData"].as_str().unwrap()).unwrap();
        assert_eq!(object.header().kid.as_deref(), config.encryption_key_fingerprint());
        assert_eq!(object.header().cty.as_deref(), Some("application/json"));
    }

    #[test]
    fn decrypted_primitive_overwrites_destination() {
        let config = config_with_paths(("$.x", "$.y"), ("$.encryptedData.encryptedValue", "$.data"));
        let payload = json!({"encryptedData": {"encryptedValue": test_support::vector("/jwe/a128cbc_hs256")}});
        let decrypted = decrypt_payload(&payload.to_string(), &config).unwrap();
        assert_eq!(decrypted, r#"{"data":"bar"}"#);
    }

    #[test]
    fn token_holder_is_kept_while_it_has_other_keys() {
        let config = config_with_paths(("$.x", "$.y"), ("$.encryptedData.encryptedValue", "$.data"));
        let payload = json!({"encryptedData": {
            "encryptedValue": test_support::vector("/jwe/a256gcm"),
            "other": 1
        }});
        let decrypted = json(&decrypt_payload(&payload.to_string(), &config).unwrap());
        assert_eq!(decrypted, json!({"encryptedData": {"other": 1}, "data": {"foo": "bar"}}));
    }

    #[test]
    fn missing_path_is_a_no_op() {
        let config = config_with_paths(("$.b", "$.c"), ("$.b", "$.c"));
        assert_eq!(encrypt_payload(r#"{"a":1}"#, &config).unwrap(), r#"{"a":1}"#);
        assert_eq!(decrypt_payload(r#"{"a":1}"#, &config).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn non_string_token_is_rejected() {
        let config = test_support::jwe_config();
        let err = decrypt_payload(r#"{"encryptedData":{"a":1}}"#, &config).unwrap_err();
        assert!(matches!(err, EncryptionError::InvalidArgument(_)));
    }

    #[test]
    fn unsupported_enc_fails_the_call() {
        let config = test_support::jwe_config();
        let payload = json!({"encryptedData": test_support::vector("/jwe/a192gcm")});
        let err = decrypt_payload(&payload.to_string(), &config).unwrap_err();
        assert_eq!(err.to_string(), "Encryption method A192GCM not supported");
    }

    #[test]
    fn malformed_token_is_invalid_payload() {
        let config = test_support::jwe_config();
        let err = decrypt_payload(r#"{"encryptedData":"a.b.c"}"#, &config).unwrap_err();
        assert_eq!(err.to_string(), "Invalid payload");
    }
}
