//! Field-level and JWE encryption of JSON HTTP payloads.
//!
//! ```text
//! config builders ──► FieldLevelEncryptionConfig ──► field_level::{encrypt,decrypt}_payload
//!                 └─► JweConfig ───────────────────► jwe::{encrypt,decrypt}_payload
//!                                                      │
//!                     interceptor ◄────────────────────┘  (http::Request / Response)
//! ```
//!
//! Every call parses its own document, walks the configured path mappings in
//! declaration order and serialises the result. Configs are immutable and can
//! be shared freely between threads.

pub mod config;
pub mod crypto;
pub mod field_level;
pub mod interceptor;
pub mod json;
pub mod jwe;
pub mod keys;

#[cfg(test)]
mod test_support;

pub use common::{EncryptionError, FieldValueEncoding, Result};
pub use config::{
    EncryptionScheme, FieldLevelEncryptionConfig, FieldLevelEncryptionConfigBuilder, JweConfig, JweConfigBuilder,
};
pub use field_level::FieldLevelEncryptionParams;
pub use interceptor::{FieldLevelEncryptionInterceptor, JweInterceptor, PayloadInterceptor};
pub use keys::{DecryptionKey, EncryptionCertificate, EncryptionKey};
