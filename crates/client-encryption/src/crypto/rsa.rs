//! RSA-OAEP wrapping of content-encryption keys.

use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha512};

use common::{EncryptionError, Result};

/// Digest used for both the OAEP hash and MGF1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OaepDigest {
    #[default]
    Sha256,
    Sha512,
}

impl OaepDigest {
    /// Configuration spelling, e.g. `SHA-256`.
    pub fn name(&self) -> &'static str {
        match self {
            OaepDigest::Sha256 => "SHA-256",
            OaepDigest::Sha512 => "SHA-512",
        }
    }

    /// Wire spelling without the hyphen, e.g. `SHA256`.
    pub fn wire_value(&self) -> &'static str {
        match self {
            OaepDigest::Sha256 => "SHA256",
            OaepDigest::Sha512 => "SHA512",
        }
    }

    fn padding(&self) -> Oaep {
        match self {
            OaepDigest::Sha256 => Oaep::new::<Sha256>(),
            OaepDigest::Sha512 => Oaep::new::<Sha512>(),
        }
    }
}

impl fmt::Display for OaepDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OaepDigest {
    type Err = EncryptionError;

    /// Accepts either spelling, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().replace('-', "").to_ascii_lowercase().as_str() {
            "sha256" => Ok(OaepDigest::Sha256),
            "sha512" => Ok(OaepDigest::Sha512),
            _ => Err(EncryptionError::configuration(format!(
                "Unsupported OAEP digest algorithm: {s}!"
            ))),
        }
    }
}

/// Wrap `secret` with `public_key`.
///
/// # Errors
///
/// Returns [`EncryptionError::EncryptionFailure`] wrapping the RSA error,
/// e.g. when `secret` is too long for the modulus.
pub fn wrap_secret_key(public_key: &RsaPublicKey, secret: &[u8], digest: OaepDigest) -> Result<Vec<u8>> {
    public_key
        .encrypt(&mut OsRng, digest.padding(), secret)
        .map_err(|e| EncryptionError::failure_with("Failed to wrap secret key!", e))
}

/// Unwrap a key previously wrapped with the matching public key.
///
/// # Errors
///
/// Returns [`EncryptionError::EncryptionFailure`] for the wrong key, the wrong
/// digest or corrupted input.
pub fn unwrap_secret_key(private_key: &RsaPrivateKey, wrapped: &[u8], digest: OaepDigest) -> Result<Vec<u8>> {
    private_key
        .decrypt(digest.padding(), wrapped)
        .map_err(|e| EncryptionError::failure_with("Failed to unwrap secret key!", e))
}
