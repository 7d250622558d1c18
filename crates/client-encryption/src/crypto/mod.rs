//! Symmetric content encryption and RSA-OAEP key wrapping.
//!
//! This module is intentionally free of JSON and HTTP dependencies. The
//! field-level and JWE codecs compose these primitives.
//!
//! # Key transport
//!
//! A fresh AES key is generated per payload and wrapped with the recipient's
//! RSA public key using OAEP. The digest for OAEP and MGF1 is always the same.

pub mod cipher;
pub mod rsa;

pub use cipher::{CipherError, SecretKey};
pub use rsa::OaepDigest;
