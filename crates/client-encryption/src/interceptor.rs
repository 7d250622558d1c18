//! Encrypt outgoing request bodies and decrypt incoming response bodies.
//!
//! Interceptors work on buffered [`http`] messages. Empty bodies are passed
//! through untouched; rewritten bodies get a fresh `Content-Length`.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_LENGTH};
use http::{HeaderMap, Request, Response};
use tracing::debug;

use common::{EncryptionError, Result};

use crate::config::{FieldLevelEncryptionConfig, JweConfig};
use crate::field_level::{self, FieldLevelEncryptionParams};
use crate::jwe;

/// Payload rewriting around an HTTP exchange.
///
/// Implementors provide the two body transforms; the provided methods take
/// care of the message plumbing.
pub trait PayloadInterceptor {
    /// Encrypt a request body, possibly adding headers.
    fn encrypt_payload(&self, headers: &mut HeaderMap, payload: &str) -> Result<String>;

    /// Decrypt a response body, possibly consuming headers.
    fn decrypt_payload(&self, headers: &mut HeaderMap, payload: &str) -> Result<String>;

    fn intercept_request(&self, request: Request<Bytes>) -> Result<Request<Bytes>> {
        let (mut parts, body) = request.into_parts();
        let body = rewrite_body(&mut parts.headers, body, |headers, payload| {
            self.encrypt_payload(headers, payload)
        })?;
        debug!(method = %parts.method, uri = %parts.uri, "request payload intercepted");
        Ok(Request::from_parts(parts, body))
    }

    fn intercept_response(&self, response: Response<Bytes>) -> Result<Response<Bytes>> {
        let (mut parts, body) = response.into_parts();
        let body = rewrite_body(&mut parts.headers, body, |headers, payload| {
            self.decrypt_payload(headers, payload)
        })?;
        debug!(status = %parts.status, "response payload intercepted");
        Ok(Response::from_parts(parts, body))
    }
}

fn rewrite_body<F>(headers: &mut HeaderMap, body: Bytes, transform: F) -> Result<Bytes>
where
    F: FnOnce(&mut HeaderMap, &str) -> Result<String>,
{
    if body.is_empty() {
        return Ok(body);
    }
    let payload = std::str::from_utf8(&body)
        .map_err(|e| EncryptionError::invalid_argument(format!("Payload is not valid UTF-8: {e}")))?;
    let rewritten = transform(headers, payload)?;
    headers.insert(CONTENT_LENGTH, HeaderValue::from(rewritten.len()));
    Ok(Bytes::from(rewritten))
}

/// Legacy field-level scheme.
///
/// With header transport configured, requests carry freshly generated params
/// as headers and responses are decrypted with the params read back from
/// theirs. A response missing the IV or key header can only be decrypted if
/// it has nothing to decrypt. Otherwise params travel inside the payload.
#[derive(Debug, Clone)]
pub struct FieldLevelEncryptionInterceptor {
    config: FieldLevelEncryptionConfig,
}

impl FieldLevelEncryptionInterceptor {
    pub fn new(config: FieldLevelEncryptionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FieldLevelEncryptionConfig {
        &self.config
    }
}

impl PayloadInterceptor for FieldLevelEncryptionInterceptor {
    fn encrypt_payload(&self, headers: &mut HeaderMap, payload: &str) -> Result<String> {
        let config = &self.config;
        if !config.use_http_headers() {
            return field_level::encrypt_payload(payload, config, None);
        }

        let params = FieldLevelEncryptionParams::generate(config)?;
        set_header(headers, config.iv_header_name(), Some(params.iv_value()))?;
        set_header(headers, config.encrypted_key_header_name(), Some(params.encrypted_key_value()))?;
        set_header(
            headers,
            config.certificate_fingerprint_header_name(),
            config.encryption_certificate_fingerprint(),
        )?;
        set_header(headers, config.key_fingerprint_header_name(), config.encryption_key_fingerprint())?;
        set_header(headers, config.oaep_digest_header_name(), params.oaep_digest_value())?;
        field_level::encrypt_payload(payload, config, Some(&params))
    }

    fn decrypt_payload(&self, headers: &mut HeaderMap, payload: &str) -> Result<String> {
        let config = &self.config;
        if !config.use_http_headers() {
            return field_level::decrypt_payload(payload, config, None);
        }

        let iv = take_header(headers, config.iv_header_name())?;
        let encrypted_key = take_header(headers, config.encrypted_key_header_name())?;
        let oaep_digest = take_header(headers, config.oaep_digest_header_name())?;
        take_header(headers, config.certificate_fingerprint_header_name())?;
        take_header(headers, config.key_fingerprint_header_name())?;

        let params = match (iv, encrypted_key) {
            (Some(iv), Some(encrypted_key)) => Some(FieldLevelEncryptionParams::new(iv, encrypted_key, oaep_digest)),
            _ => None,
        };
        field_level::decrypt_payload(payload, config, params.as_ref())
    }
}

/// JWE scheme; headers are left alone.
#[derive(Debug, Clone)]
pub struct JweInterceptor {
    config: JweConfig,
}

impl JweInterceptor {
    pub fn new(config: JweConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JweConfig {
        &self.config
    }
}

impl PayloadInterceptor for JweInterceptor {
    fn encrypt_payload(&self, _headers: &mut HeaderMap, payload: &str) -> Result<String> {
        jwe::encrypt_payload(payload, &self.config)
    }

    fn decrypt_payload(&self, _headers: &mut HeaderMap, payload: &str) -> Result<String> {
        jwe::decrypt_payload(payload, &self.config)
    }
}

/// Set `name: value` when both are present.
fn set_header(headers: &mut HeaderMap, name: Option<&str>, value: Option<&str>) -> Result<()> {
    let (Some(name), Some(value)) = (name, value) else {
        return Ok(());
    };
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| EncryptionError::invalid_argument(format!("Invalid header name '{name}': {e}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| EncryptionError::invalid_argument(format!("Invalid value for header '{name}': {e}")))?;
    headers.insert(name, value);
    Ok(())
}

/// Remove a header, returning its first value.
fn take_header(headers: &mut HeaderMap, name: Option<&str>) -> Result<Option<String>> {
    let Some(name) = name.filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    headers
        .remove(name)
        .map(|value| {
            value
                .to_str()
                .map(str::to_owned)
                .map_err(|e| EncryptionError::invalid_argument(format!("Invalid value for header '{name}': {e}")))
        })
        .transpose()
}
