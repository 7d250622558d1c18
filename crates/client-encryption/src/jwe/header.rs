//! JOSE header of a compact JWE token.

use serde::{Deserialize, Serialize};

use common::encoding::{base64_url_decode, base64_url_encode};
use common::{EncryptionError, Result};

/// Key management algorithm produced and accepted.
pub const RSA_OAEP_256: &str = "RSA-OAEP-256";

/// Content encryption produced on encrypt.
pub const A256GCM: &str = "A256GCM";

/// Composite AES-CBC + HMAC content encryption, accepted on decrypt.
pub const A128CBC_HS256: &str = "A128CBC-HS256";

/// Content type of encrypted JSON payloads.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Header fields. Absent optional fields are left out of the JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JweHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,
    pub enc: String,
    pub alg: String,
}

impl JweHeader {
    pub fn new(alg: impl Into<String>, enc: impl Into<String>, kid: Option<String>, cty: Option<String>) -> Self {
        Self {
            kid,
            cty,
            enc: enc.into(),
            alg: alg.into(),
        }
    }

    /// Header written by this crate: `RSA-OAEP-256` / `A256GCM` for JSON.
    pub fn for_json(kid: Option<String>) -> Self {
        Self::new(RSA_OAEP_256, A256GCM, kid, Some(JSON_CONTENT_TYPE.to_owned()))
    }

    /// Compact JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| EncryptionError::failure_with("Failed to serialize the JWE header!", e))
    }

    /// Base64url of [`Self::to_json`]; this string's bytes are the AAD.
    pub fn encode(&self) -> Result<String> {
        Ok(base64_url_encode(self.to_json()?.as_bytes()))
    }

    /// Decode a base64url header segment.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptionError::EncryptionFailure`] if the segment is not
    /// base64url JSON or lacks `alg` / `enc`.
    pub fn parse(encoded: &str) -> Result<Self> {
        let json = base64_url_decode(encoded)
            .map_err(|e| EncryptionError::failure_with("Failed to decode the JWE header!", e))?;
        serde_json::from_slice(&json)
            .map_err(|e| EncryptionError::failure_with("Failed to parse the JWE header!", e))
    }
}
