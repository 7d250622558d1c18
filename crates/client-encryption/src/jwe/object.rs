//! Compact-serialised JWE objects.
//!
//! An object is either parsed from a token or built by [`JweObject::encrypt`];
//! either way it is immutable afterwards.

use serde_json::{json, Value};

use common::encoding::{base64_url_decode, base64_url_encode};
use common::{EncryptionError, Result};

use super::header::{JweHeader, A128CBC_HS256, A256GCM, RSA_OAEP_256};
use crate::config::JweConfig;
use crate::crypto::{cipher, rsa, OaepDigest, SecretKey};

const CEK_BITS: usize = 256;
const A256GCM_KEY_LEN: usize = 32;

/// Content encryption algorithms this crate can decrypt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentEncryption {
    A256Gcm,
    A128CbcHs256,
}

impl ContentEncryption {
    fn from_enc(enc: &str) -> Result<Self> {
        match enc {
            A256GCM => Ok(Self::A256Gcm),
            A128CBC_HS256 => Ok(Self::A128CbcHs256),
            other => Err(EncryptionError::failure(format!("Encryption method {other} not supported"))),
        }
    }
}

/// The five base64url segments of a token plus the decoded header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JweObject {
    header: JweHeader,
    raw_header: String,
    encrypted_key: String,
    iv: String,
    cipher_text: String,
    auth_tag: String,
}

impl JweObject {
    /// Split a compact token.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptionError::EncryptionFailure`] "Invalid payload" unless
    /// the token has exactly five segments, or if the header does not parse.
    pub fn parse(token: &str) -> Result<Self> {
        let segments: Vec<&str> = token.trim().split('.').collect();
        let [raw_header, encrypted_key, iv, cipher_text, auth_tag] = segments[..] else {
            return Err(EncryptionError::failure("Invalid payload"));
        };

        Ok(Self {
            header: JweHeader::parse(raw_header)?,
            raw_header: raw_header.to_owned(),
            encrypted_key: encrypted_key.to_owned(),
            iv: iv.to_owned(),
            cipher_text: cipher_text.to_owned(),
            auth_tag: auth_tag.to_owned(),
        })
    }

    /// Encrypt `payload` for the configured certificate.
    ///
    /// A fresh 256-bit content key is wrapped with RSA-OAEP-256 and the
    /// payload sealed with AES-256-GCM under a 96-bit nonce, the encoded header
    /// serving as AAD.
    ///
    /// # Errors
    ///
    /// Fails if `header` asks for anything but `RSA-OAEP-256` / `A256GCM`, if
    /// the config has no encryption certificate, or if a primitive fails.
    pub fn encrypt(config: &JweConfig, payload: &str, header: JweHeader) -> Result<Self> {
        if header.alg != RSA_OAEP_256 {
            return Err(unsupported_alg(&header.alg));
        }
        if header.enc != A256GCM {
            return Err(EncryptionError::failure(format!(
                "Encryption method {} not supported",
                header.enc
            )));
        }
        let encryption_key = config.common().require_encryption_key()?;

        let raw_header = header.encode()?;
        let cek = cipher::generate_cek(CEK_BITS);
        let wrapped = rsa::wrap_secret_key(encryption_key.public_key(), cek.as_bytes(), OaepDigest::Sha256)?;
        let nonce = cipher::generate_nonce();
        let (cipher_text, auth_tag) =
            cipher::aes_gcm_encrypt(&nonce, cek.as_bytes(), raw_header.as_bytes(), payload.as_bytes())?;

        Ok(Self {
            header,
            raw_header,
            encrypted_key: base64_url_encode(&wrapped),
            iv: base64_url_encode(&nonce),
            cipher_text: base64_url_encode(&cipher_text),
            auth_tag: base64_url_encode(&auth_tag),
        })
    }

    /// Unwrap the content key with the configured decryption key and decrypt.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptionError::EncryptionFailure`] for an unsupported
    /// `alg` or `enc`, undecodable segments, a wrong key or a failed tag.
    pub fn decrypt(&self, config: &JweConfig) -> Result<String> {
        if self.header.alg != RSA_OAEP_256 {
            return Err(unsupported_alg(&self.header.alg));
        }
        let method = ContentEncryption::from_enc(&self.header.enc)?;
        let decryption_key = config.common().require_decryption_key()?;

        let wrapped = decode_segment(&self.encrypted_key)?;
        let iv = decode_segment(&self.iv)?;
        let cipher_text = decode_segment(&self.cipher_text)?;
        let auth_tag = decode_segment(&self.auth_tag)?;
        let aad = self.raw_header.as_bytes();

        let cek = SecretKey::new(rsa::unwrap_secret_key(
            decryption_key.private_key(),
            &wrapped,
            OaepDigest::Sha256,
        )?);

        let plaintext = match method {
            ContentEncryption::A256Gcm => {
                if cek.len() != A256GCM_KEY_LEN {
                    return Err(EncryptionError::failure(format!(
                        "Invalid content encryption key length for {A256GCM}: {} bytes",
                        cek.len()
                    )));
                }
                cipher::aes_gcm_decrypt(&iv, cek.as_bytes(), aad, &auth_tag, &cipher_text)?
            }
            ContentEncryption::A128CbcHs256 => {
                cipher::aes_cbc_hmac_sha256_decrypt(cek.as_bytes(), &iv, aad, &cipher_text, &auth_tag)?
            }
        };

        String::from_utf8(plaintext)
            .map_err(|e| EncryptionError::failure_with("Decrypted value is not valid UTF-8!", e))
    }

    /// Compact form: the five segments joined with `.`.
    pub fn serialize(&self) -> String {
        [
            self.raw_header.as_str(),
            &self.encrypted_key,
            &self.iv,
            &self.cipher_text,
            &self.auth_tag,
        ]
        .join(".")
    }

    /// Debug view with the decoded header and the encoded segments.
    pub fn to_json(&self) -> Value {
        json!({
            "header": self.header,
            "encryptedKey": self.encrypted_key,
            "iv": self.iv,
            "cipherText": self.cipher_text,
            "authTag": self.auth_tag,
        })
    }

    pub fn header(&self) -> &JweHeader {
        &self.header
    }

    /// Encoded header segment, i.e. the AAD.
    pub fn raw_header(&self) -> &str {
        &self.raw_header
    }

    pub fn encrypted_key(&self) -> &str {
        &self.encrypted_key
    }

    pub fn iv(&self) -> &str {
        &self.iv
    }

    pub fn cipher_text(&self) -> &str {
        &self.cipher_text
    }

    pub fn auth_tag(&self) -> &str {
        &self.auth_tag
    }
}

fn decode_segment(segment: &str) -> Result<Vec<u8>> {
    base64_url_decode(segment).map_err(|e| EncryptionError::failure_with("Invalid payload", e))
}

fn unsupported_alg(alg: &str) -> EncryptionError {
    EncryptionError::failure(format!("Key management algorithm {alg} not supported"))
}
