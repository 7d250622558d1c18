//! Legacy field-level encryption.
//!
//! Each configured source element is serialised, AES-128-CBC encrypted and
//! replaced by an object holding the encrypted value and, depending on the
//! config, the IV, the RSA-OAEP wrapped key, the OAEP digest and the
//! certificate/key fingerprints as sibling fields. When the IV and wrapped key
//! travel as HTTP headers instead, callers pass explicit params in both
//! directions.
//!
//! One set of params is shared by every path of a single call.

pub mod params;

pub use params::FieldLevelEncryptionParams;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use common::encoding::{decode_value, encode_bytes};
use common::{EncryptionError, Result};

use crate::config::{FieldLevelEncryptionConfig, PathMapping};
use crate::crypto::cipher;
use crate::json::document::{
    add_decrypted_data_to_payload, check_or_create_out_object, delete, find, is_empty_object,
    parse_payload, read_and_delete_key, read_json_object_mut, sanitize, serialize_payload,
    to_json_string,
};

/// Encrypt every configured path of `payload`.
///
/// Paths with nothing at their source are skipped. Without `params`, a fresh
/// set is generated the first time a path matches.
///
/// # Errors
///
/// The first failing path aborts the call.
pub fn encrypt_payload(
    payload: &str,
    config: &FieldLevelEncryptionConfig,
    params: Option<&FieldLevelEncryptionParams>,
) -> Result<String> {
    let mut document = parse_payload(payload)?;
    let mut generated: Option<FieldLevelEncryptionParams> = None;

    for mapping in config.encryption_paths() {
        if find(&document, &mapping.source).is_none() {
            trace!(path = %mapping.source, "nothing to encrypt");
            continue;
        }
        let params: &FieldLevelEncryptionParams = match params {
            Some(params) => params,
            None => match generated {
                Some(ref existing) => existing,
                None => &*generated.insert(FieldLevelEncryptionParams::generate(config)?),
            },
        };
        encrypt_path(&mut document, mapping, config, params)?;
        debug!(source = %mapping.source, destination = %mapping.destination, "encrypted payload path");
    }

    serialize_payload(&document)
}

/// Decrypt every configured path of `payload`.
///
/// Without `params`, the IV, wrapped key and digest are read from the
/// payload, which requires the config to carry them as fields.
///
/// # Errors
///
/// Returns [`EncryptionError::InvalidArgument`] when params are needed but
/// neither given nor present in the payload.
pub fn decrypt_payload(
    payload: &str,
    config: &FieldLevelEncryptionConfig,
    params: Option<&FieldLevelEncryptionParams>,
) -> Result<String> {
    let mut document = parse_payload(payload)?;

    for mapping in config.decryption_paths() {
        if decrypt_path(&mut document, mapping, config, params)? {
            debug!(source = %mapping.source, destination = %mapping.destination, "decrypted payload path");
        } else {
            trace!(path = %mapping.source, "nothing to decrypt");
        }
    }

    serialize_payload(&document)
}

fn encrypt_path(
    document: &mut Value,
    mapping: &PathMapping,
    config: &FieldLevelEncryptionConfig,
    params: &FieldLevelEncryptionParams,
) -> Result<()> {
    let Some(element) = find(document, &mapping.source) else {
        return Ok(());
    };
    let clear = sanitize(&to_json_string(element)?);

    let iv = params.iv_bytes(config)?;
    let secret_key = params.secret_key_bytes(config)?;
    let encrypted = cipher::aes_cbc_encrypt(&iv, secret_key.as_bytes(), clear.as_bytes())?;
    let encrypted_value = encode_bytes(&encrypted, config.field_value_encoding());

    if mapping.source.is_root() {
        *document = Value::Object(Map::new());
    } else {
        delete(document, &mapping.source)?;
    }

    let out = check_or_create_out_object(document, &mapping.destination)?;
    out.insert(
        config.encrypted_value_field_name().to_owned(),
        Value::String(encrypted_value),
    );
    put(out, config.iv_field_name(), Some(params.iv_value()));
    put(out, config.encrypted_key_field_name(), Some(params.encrypted_key_value()));
    put(
        out,
        config.certificate_fingerprint_field_name(),
        config.encryption_certificate_fingerprint(),
    );
    put(out, config.key_fingerprint_field_name(), config.encryption_key_fingerprint());
    put(out, config.oaep_digest_field_name(), params.oaep_digest_value());
    Ok(())
}

/// Returns `false` when the path had nothing to decrypt.
fn decrypt_path(
    document: &mut Value,
    mapping: &PathMapping,
    config: &FieldLevelEncryptionConfig,
    params: Option<&FieldLevelEncryptionParams>,
) -> Result<bool> {
    let Some(source) = read_json_object_mut(document, &mapping.source)? else {
        return Ok(false);
    };
    let encrypted_value = match read_and_delete_key(source, Some(config.encrypted_value_field_name())) {
        None | Some(Value::Null) => return Ok(false),
        Some(value) => value_to_string(value),
    };
    if encrypted_value.is_empty() {
        return Ok(false);
    }

    let received;
    let params = match params {
        Some(params) => params,
        None if !config.use_http_payloads() => {
            return Err(match (config.iv_header_name(), config.encrypted_key_header_name()) {
                (Some(iv), Some(key)) => EncryptionError::invalid_argument(format!(
                    "Missing encryption headers: '{iv}' and '{key}' are both required!"
                )),
                _ => EncryptionError::invalid_argument(
                    "Encryption params have to be set when not stored in HTTP payloads!",
                ),
            });
        }
        None => {
            let oaep_digest = read_and_delete_key(source, config.oaep_digest_field_name()).map(value_to_string);
            let encrypted_key = read_and_delete_key(source, config.encrypted_key_field_name())
                .map(value_to_string)
                .unwrap_or_default();
            let iv = read_and_delete_key(source, config.iv_field_name())
                .map(value_to_string)
                .unwrap_or_default();
            read_and_delete_key(source, config.certificate_fingerprint_field_name());
            read_and_delete_key(source, config.key_fingerprint_field_name());
            received = FieldLevelEncryptionParams::new(iv, encrypted_key, oaep_digest);
            &received
        }
    };

    let encrypted = decode_value(&encrypted_value, config.field_value_encoding())?;
    let iv = params.iv_bytes(config)?;
    let secret_key = params.secret_key_bytes(config)?;
    let decrypted = cipher::aes_cbc_decrypt(&iv, secret_key.as_bytes(), &encrypted)?;
    let decrypted = String::from_utf8(decrypted)
        .map_err(|e| EncryptionError::failure_with("Decrypted value is not valid UTF-8!", e))?;

    add_decrypted_data_to_payload(document, &mapping.destination, &sanitize(&decrypted))?;

    if !mapping.source.is_root() && is_empty_object(document, &mapping.source) {
        delete(document, &mapping.source)?;
    }
    Ok(true)
}

/// Set `name` to `value` when both are present.
fn put(out: &mut Map<String, Value>, name: Option<&str>, value: Option<&str>) {
    if let (Some(name), Some(value)) = (name, value) {
        out.insert(name.to_owned(), Value::String(value.to_owned()));
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
