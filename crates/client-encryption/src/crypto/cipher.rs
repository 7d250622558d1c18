//! AES content encryption: CBC with PKCS#7 padding, GCM with detached tags,
//! and the JWE `A128CBC-HS256` composite.
//!
//! **Key sizes** are taken from the key itself (16, 24 or 32 bytes). GCM
//! accepts 96-bit and 128-bit nonces; new nonces are always 96-bit.

use aes::{Aes128, Aes192, Aes256};
use aes_gcm::{
    aead::{
        consts::{U12, U16},
        generic_array::{typenum::Unsigned, GenericArray},
        AeadCore, AeadInPlace, KeyInit,
    },
    AesGcm,
};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use thiserror::Error;

use common::EncryptionError;

/// Byte length of an AES-CBC IV.
pub const CBC_IV_LEN: usize = 16;

/// Byte length of a freshly generated AES-GCM nonce.
pub const GCM_NONCE_LEN: usize = 12;

/// Byte length of an AES-GCM authentication tag.
pub const GCM_TAG_LEN: usize = 16;

/// Content key length for `A128CBC-HS256` (MAC key ‖ AES key).
pub const CBC_HS256_KEY_LEN: usize = 32;

/// Symmetric key bytes.
///
/// When this type is dropped, the memory is overwritten with zeroes to
/// minimise the window during which plaintext key material lives in RAM.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The key is not a valid AES key length.
    #[error("invalid AES key length: {0} bytes")]
    InvalidKeyLength(usize),

    /// The IV or nonce has an unsupported length.
    #[error("invalid IV length: {0} bytes")]
    InvalidIvLength(usize),

    /// CBC decryption produced invalid padding.
    #[error("invalid padding")]
    InvalidPadding,

    /// AES-GCM sealing or tag verification failed.
    #[error("aead operation failed")]
    AeadFailure,

    /// The `A128CBC-HS256` authentication tag does not match.
    #[error("authentication tag mismatch")]
    TagMismatch,
}

impl From<CipherError> for EncryptionError {
    fn from(e: CipherError) -> Self {
        let message = match e {
            CipherError::InvalidPadding | CipherError::AeadFailure | CipherError::TagMismatch => {
                "Failed to decrypt bytes with the provided key and IV!"
            }
            CipherError::InvalidKeyLength(_) | CipherError::InvalidIvLength(_) => {
                "Failed to initialise the AES cipher!"
            }
        };
        EncryptionError::failure_with(message, e)
    }
}

/// Random IV for AES-CBC.
pub fn generate_iv() -> [u8; CBC_IV_LEN] {
    let mut iv = [0u8; CBC_IV_LEN];
    OsRng.fill_bytes(&mut iv);
    iv
}

/// Random 96-bit nonce for AES-GCM.
pub fn generate_nonce() -> [u8; GCM_NONCE_LEN] {
    let mut nonce = [0u8; GCM_NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Random content-encryption key of `bit_length` bits.
pub fn generate_cek(bit_length: usize) -> SecretKey {
    let mut key = vec![0u8; bit_length / 8];
    OsRng.fill_bytes(&mut key);
    SecretKey::new(key)
}

/// AES-CBC encrypt with PKCS#7 padding.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] / [`CipherError::InvalidIvLength`]
/// for malformed inputs.
pub fn aes_cbc_encrypt(iv: &[u8], key: &[u8], data: &[u8]) -> Result<Vec<u8>, CipherError> {
    check_cbc_iv(iv)?;
    let encrypted = match key.len() {
        16 => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(|_| CipherError::InvalidKeyLength(key.len()))?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        24 => cbc::Encryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(|_| CipherError::InvalidKeyLength(key.len()))?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        32 => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|_| CipherError::InvalidKeyLength(key.len()))?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        other => return Err(CipherError::InvalidKeyLength(other)),
    };
    Ok(encrypted)
}

/// AES-CBC decrypt and strip PKCS#7 padding.
///
/// # Errors
///
/// Returns [`CipherError::InvalidPadding`] when the key or IV is wrong or the
/// ciphertext was tampered with.
pub fn aes_cbc_decrypt(iv: &[u8], key: &[u8], encrypted: &[u8]) -> Result<Vec<u8>, CipherError> {
    check_cbc_iv(iv)?;
    let decrypted = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(|_| CipherError::InvalidKeyLength(key.len()))?
            .decrypt_padded_vec_mut::<Pkcs7>(encrypted),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(|_| CipherError::InvalidKeyLength(key.len()))?
            .decrypt_padded_vec_mut::<Pkcs7>(encrypted),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|_| CipherError::InvalidKeyLength(key.len()))?
            .decrypt_padded_vec_mut::<Pkcs7>(encrypted),
        other => return Err(CipherError::InvalidKeyLength(other)),
    };
    decrypted.map_err(|_| CipherError::InvalidPadding)
}

/// AES-GCM encrypt, returning `(ciphertext, tag)`.
pub fn aes_gcm_encrypt(
    iv: &[u8],
    key: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), CipherError> {
    match (key.len(), iv.len()) {
        (16, 12) => gcm_seal::<AesGcm<Aes128, U12>>(key, iv, aad, plaintext),
        (24, 12) => gcm_seal::<AesGcm<Aes192, U12>>(key, iv, aad, plaintext),
        (32, 12) => gcm_seal::<AesGcm<Aes256, U12>>(key, iv, aad, plaintext),
        (16, 16) => gcm_seal::<AesGcm<Aes128, U16>>(key, iv, aad, plaintext),
        (24, 16) => gcm_seal::<AesGcm<Aes192, U16>>(key, iv, aad, plaintext),
        (32, 16) => gcm_seal::<AesGcm<Aes256, U16>>(key, iv, aad, plaintext),
        (16 | 24 | 32, other) => Err(CipherError::InvalidIvLength(other)),
        (other, _) => Err(CipherError::InvalidKeyLength(other)),
    }
}

/// AES-GCM decrypt after verifying `tag` over `aad` and `ciphertext`.
pub fn aes_gcm_decrypt(
    iv: &[u8],
    key: &[u8],
    aad: &[u8],
    tag: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    match (key.len(), iv.len()) {
        (16, 12) => gcm_open::<AesGcm<Aes128, U12>>(key, iv, aad, tag, ciphertext),
        (24, 12) => gcm_open::<AesGcm<Aes192, U12>>(key, iv, aad, tag, ciphertext),
        (32, 12) => gcm_open::<AesGcm<Aes256, U12>>(key, iv, aad, tag, ciphertext),
        (16, 16) => gcm_open::<AesGcm<Aes128, U16>>(key, iv, aad, tag, ciphertext),
        (24, 16) => gcm_open::<AesGcm<Aes192, U16>>(key, iv, aad, tag, ciphertext),
        (32, 16) => gcm_open::<AesGcm<Aes256, U16>>(key, iv, aad, tag, ciphertext),
        (16 | 24 | 32, other) => Err(CipherError::InvalidIvLength(other)),
        (other, _) => Err(CipherError::InvalidKeyLength(other)),
    }
}

/// `A128CBC-HS256` decrypt (RFC 7518 §5.2.2): verify the truncated
/// HMAC-SHA-256 tag with the first half of `cek`, then AES-128-CBC decrypt
/// with the second half.
pub fn aes_cbc_hmac_sha256_decrypt(
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, CipherError> {
    if cek.len() != CBC_HS256_KEY_LEN {
        return Err(CipherError::InvalidKeyLength(cek.len()));
    }
    let (mac_key, enc_key) = cek.split_at(CBC_HS256_KEY_LEN / 2);

    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(mac_key)
        .map_err(|_| CipherError::InvalidKeyLength(mac_key.len()))?;
    mac.update(aad);
    mac.update(iv);
    mac.update(ciphertext);
    mac.update(&((aad.len() as u64) * 8).to_be_bytes());
    if tag.len() != CBC_HS256_KEY_LEN / 2 {
        return Err(CipherError::TagMismatch);
    }
    mac.verify_truncated_left(tag)
        .map_err(|_| CipherError::TagMismatch)?;

    aes_cbc_decrypt(iv, enc_key, ciphertext)
}

fn check_cbc_iv(iv: &[u8]) -> Result<(), CipherError> {
    if iv.len() != CBC_IV_LEN {
        return Err(CipherError::InvalidIvLength(iv.len()));
    }
    Ok(())
}

fn gcm_seal<A>(
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), CipherError>
where
    A: AeadInPlace + KeyInit,
{
    let cipher = A::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength(key.len()))?;
    if nonce.len() != <A as AeadCore>::NonceSize::USIZE {
        return Err(CipherError::InvalidIvLength(nonce.len()));
    }
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(nonce), aad, &mut buffer)
        .map_err(|_| CipherError::AeadFailure)?;
    Ok((buffer, tag.to_vec()))
}

fn gcm_open<A>(
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    tag: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CipherError>
where
    A: AeadInPlace + KeyInit,
{
    let cipher = A::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength(key.len()))?;
    if nonce.len() != <A as AeadCore>::NonceSize::USIZE {
        return Err(CipherError::InvalidIvLength(nonce.len()));
    }
    if tag.len() != <A as AeadCore>::TagSize::USIZE {
        return Err(CipherError::AeadFailure);
    }
    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(nonce),
            aad,
            &mut buffer,
            GenericArray::from_slice(tag),
        )
        .map_err(|_| CipherError::AeadFailure)?;
    Ok(buffer)
}
