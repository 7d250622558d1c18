//! Common error types shared across crates.

use thiserror::Error;

/// Boxed underlying cause carried by [`EncryptionError::EncryptionFailure`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the encryption crates.
pub type Result<T, E = EncryptionError> = std::result::Result<T, E>;

/// Top-level error type for payload encryption and decryption.
///
/// Variants map to the three failure kinds a caller must distinguish:
/// - [`EncryptionError::InvalidArgument`] → bad input (paths, payload shape, missing params)
/// - [`EncryptionError::EncryptionFailure`] → a cryptographic primitive or envelope failed
/// - [`EncryptionError::Configuration`] → a builder rejected its settings
#[derive(Debug, Error)]
pub enum EncryptionError {
    /// A JSON path, payload element or argument is malformed or missing.
    #[error("{0}")]
    InvalidArgument(String),

    /// A crypto-layer or envelope error, optionally wrapping the cause.
    #[error("{message}")]
    EncryptionFailure {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Builder-time validation failure.
    #[error("{0}")]
    Configuration(String),
}

impl EncryptionError {
    /// Shorthand for [`EncryptionError::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        EncryptionError::InvalidArgument(message.into())
    }

    /// Shorthand for [`EncryptionError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        EncryptionError::Configuration(message.into())
    }

    /// An [`EncryptionError::EncryptionFailure`] without an underlying cause.
    pub fn failure(message: impl Into<String>) -> Self {
        EncryptionError::EncryptionFailure {
            message: message.into(),
            source: None,
        }
    }

    /// An [`EncryptionError::EncryptionFailure`] wrapping `source`.
    pub fn failure_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        EncryptionError::EncryptionFailure {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Short machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            EncryptionError::InvalidArgument(_) => "invalid_argument",
            EncryptionError::EncryptionFailure { .. } => "encryption_failure",
            EncryptionError::Configuration(_) => "configuration_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn error_codes() {
        assert_eq!(EncryptionError::invalid_argument("x").code(), "invalid_argument");
        assert_eq!(EncryptionError::failure("x").code(), "encryption_failure");
        assert_eq!(EncryptionError::configuration("x").code(), "configuration_error");
    }

    #[test]
    fn display_includes_message() {
        let e = EncryptionError::invalid_argument("JSON path must be a non-empty string!");
        assert_eq!(e.to_string(), "JSON path must be a non-empty string!");
    }

    #[test]
    fn failure_keeps_its_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "bad padding");
        let e = EncryptionError::failure_with("Failed to decrypt bytes!", cause);
        assert_eq!(e.to_string(), "Failed to decrypt bytes!");
        assert!(e.source().unwrap().to_string().contains("bad padding"));
    }
}
