//! Validated, immutable encryption configurations.
//!
//! Both schemes share [`CommonConfig`]: key material, the ordered path
//! mappings and the name of the field carrying the encrypted value. The
//! builders in [`field_level`] and [`jwe`] are the only way to obtain a
//! config, so every config handed to a codec has passed validation.

pub mod field_level;
pub mod jwe;

pub use field_level::{FieldLevelEncryptionConfig, FieldLevelEncryptionConfigBuilder};
pub use jwe::{JweConfig, JweConfigBuilder};

use common::{EncryptionError, Result};

use crate::json::{is_definite, JsonPath};
use crate::keys::{DecryptionKey, EncryptionKey};

/// Wire scheme a config produces and consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionScheme {
    /// Discrete IV / wrapped key / value fields or headers.
    Legacy,
    /// Compact five-segment tokens.
    Jwe,
}

/// One `source -> destination` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    pub source: JsonPath,
    pub destination: JsonPath,
}

/// Source/destination path pairs in declaration order.
///
/// Re-declaring a source replaces its destination without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMappings {
    entries: Vec<(String, String)>,
}

impl PathMappings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, destination: impl Into<String>) {
        let source = source.into();
        let destination = destination.into();
        match self.entries.iter_mut().find(|(s, _)| *s == source) {
            Some(entry) => entry.1 = destination,
            None => self.entries.push((source, destination)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, d)| (s.as_str(), d.as_str()))
    }

    /// `true` when every source and destination is definite.
    pub fn all_definite(&self) -> bool {
        self.iter().all(|(s, d)| is_definite(s) && is_definite(d))
    }

    fn parse(&self) -> Result<Vec<PathMapping>> {
        self.iter()
            .map(|(source, destination)| {
                Ok(PathMapping {
                    source: JsonPath::parse(source)?,
                    destination: JsonPath::parse(destination)?,
                })
            })
            .collect()
    }
}

impl<S: Into<String>, D: Into<String>> FromIterator<(S, D)> for PathMappings {
    fn from_iter<I: IntoIterator<Item = (S, D)>>(iter: I) -> Self {
        let mut mappings = PathMappings::new();
        for (source, destination) in iter {
            mappings.insert(source, destination);
        }
        mappings
    }
}

/// Settings shared by both schemes.
#[derive(Debug, Clone)]
pub struct CommonConfig {
    encryption_key: Option<EncryptionKey>,
    encryption_key_fingerprint: Option<String>,
    decryption_key: Option<DecryptionKey>,
    encryption_paths: Vec<PathMapping>,
    decryption_paths: Vec<PathMapping>,
    encrypted_value_field_name: String,
}

impl CommonConfig {
    fn new(
        encryption_key: Option<EncryptionKey>,
        encryption_key_fingerprint: Option<String>,
        decryption_key: Option<DecryptionKey>,
        encryption_paths: &PathMappings,
        decryption_paths: &PathMappings,
        encrypted_value_field_name: String,
    ) -> Result<Self> {
        Ok(Self {
            encryption_key,
            encryption_key_fingerprint,
            decryption_key,
            encryption_paths: encryption_paths.parse()?,
            decryption_paths: decryption_paths.parse()?,
            encrypted_value_field_name,
        })
    }

    /// Parsed recipient public key, if configured.
    pub fn encryption_key(&self) -> Option<&EncryptionKey> {
        self.encryption_key.as_ref()
    }

    pub fn encryption_key_fingerprint(&self) -> Option<&str> {
        self.encryption_key_fingerprint.as_deref()
    }

    pub fn decryption_key(&self) -> Option<&DecryptionKey> {
        self.decryption_key.as_ref()
    }

    pub fn encryption_paths(&self) -> &[PathMapping] {
        &self.encryption_paths
    }

    pub fn decryption_paths(&self) -> &[PathMapping] {
        &self.decryption_paths
    }

    pub fn encrypted_value_field_name(&self) -> &str {
        &self.encrypted_value_field_name
    }

    pub(crate) fn require_encryption_key(&self) -> Result<&EncryptionKey> {
        self.encryption_key
            .as_ref()
            .ok_or_else(|| EncryptionError::invalid_argument("No encryption certificate configured!"))
    }

    pub(crate) fn require_decryption_key(&self) -> Result<&DecryptionKey> {
        self.decryption_key
            .as_ref()
            .ok_or_else(|| EncryptionError::invalid_argument("No decryption key configured!"))
    }
}

/// Treat an empty name as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
