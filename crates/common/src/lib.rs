//! Error kinds and value encodings shared across the `client-encryption` crates.

pub mod encoding;
pub mod error;

pub use encoding::FieldValueEncoding;
pub use error::{EncryptionError, Result};
