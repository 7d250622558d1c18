//! A restricted JSON path dialect: `$`, `$.a.b`, `$['a']['b']` and bare `a.b`.
//!
//! Every form normalises to the bracket form `$['a']['b']`. Only definite paths
//! (a single target element) are meaningful; wildcards, recursive descent,
//! filters and unions are detected by [`is_definite`] and rejected by the
//! configuration builders.

use std::fmt;

use common::{EncryptionError, Result};

/// The root path.
pub const ROOT: &str = "$";

/// A parsed, normalised JSON path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonPath {
    raw: String,
    normalized: String,
    segments: Vec<String>,
}

impl JsonPath {
    /// Parse and normalise `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptionError::InvalidArgument`] if `path` is empty or does
    /// not reduce to a sequence of `['key']` tokens.
    pub fn parse(path: &str) -> Result<Self> {
        let normalized = normalize(path)?;
        let segments = tokenize(&normalized)
            .ok_or_else(|| EncryptionError::invalid_argument(format!("Unsupported JSON path: {path}!")))?;
        Ok(Self {
            raw: path.to_owned(),
            normalized,
            segments,
        })
    }

    /// The root path `$`.
    pub fn root() -> Self {
        Self {
            raw: ROOT.to_owned(),
            normalized: ROOT.to_owned(),
            segments: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The path exactly as the caller wrote it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Canonical bracket form, e.g. `$['a']['b']`.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Path to the parent of this element.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptionError::InvalidArgument`] for the root path.
    pub fn parent(&self) -> Result<JsonPath> {
        let (_, parent) = self.segments.split_last().ok_or_else(|| {
            EncryptionError::invalid_argument(format!("Unable to find parent for: {}", self.raw))
        })?;
        Ok(Self::from_segments(parent.to_vec()))
    }

    /// Key of this element within its parent object.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptionError::InvalidArgument`] for the root path.
    pub fn element_key(&self) -> Result<&str> {
        self.segments.last().map(String::as_str).ok_or_else(|| {
            EncryptionError::invalid_argument(format!("Unable to find object key for: {}", self.raw))
        })
    }

    fn from_segments(segments: Vec<String>) -> Self {
        let mut normalized = String::from(ROOT);
        for segment in &segments {
            normalized.push_str("['");
            normalized.push_str(segment);
            normalized.push_str("']");
        }
        Self {
            raw: normalized.clone(),
            normalized,
            segments,
        }
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Convert `path` to the bracket form `$['path']['to']['object']`.
///
/// # Errors
///
/// Returns [`EncryptionError::InvalidArgument`] if `path` is empty.
pub fn normalize(path: &str) -> Result<String> {
    if path.is_empty() {
        return Err(EncryptionError::invalid_argument(
            "JSON path must be a non-empty string!",
        ));
    }
    if path == ROOT {
        return Ok(path.to_owned());
    }
    let mut normalized = if path.starts_with('$') {
        path.to_owned()
    } else {
        format!("$.{path}")
    };
    normalized = normalized.replace("$.", "$['").replace('.', "']['");
    if !normalized.ends_with("']") {
        normalized.push_str("']");
    }
    Ok(normalized)
}

/// `true` when `path` can only ever resolve to a single element.
pub fn is_definite(path: &str) -> bool {
    !(path.contains('*') || path.contains("..") || path.contains('@') || path.contains(','))
}

/// Split a normalised path into its keys; `None` if it is not `$` followed
/// by one or more `['key']` tokens.
fn tokenize(normalized: &str) -> Option<Vec<String>> {
    let mut rest = normalized.strip_prefix(ROOT)?;
    let mut segments = Vec::new();
    while !rest.is_empty() {
        let body = rest.strip_prefix("['")?;
        let end = body.find("']")?;
        let key = &body[..end];
        if key.contains('[') || key.contains(']') {
            return None;
        }
        segments.push(key.to_owned());
        rest = &body[end + 2..];
    }
    Some(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_accepts_all_surface_forms() {
        assert_eq!(normalize("$").unwrap(), "$");
        assert_eq!(normalize("$.path.to.object").unwrap(), "$['path']['to']['object']");
        assert_eq!(normalize("path.to.object").unwrap(), "$['path']['to']['object']");
        assert_eq!(normalize("$['path']['to']['object']").unwrap(), "$['path']['to']['object']");
        assert_eq!(normalize("object").unwrap(), "$['object']");
    }

    #[test]
    fn normalize_rejects_empty_path() {
        assert!(matches!(normalize(""), Err(EncryptionError::InvalidArgument(_))));
    }

    #[test]
    fn parse_splits_segments() {
        let path = JsonPath::parse("$.path.to.object").unwrap();
        assert_eq!(path.segments(), ["path", "to", "object"]);
        assert_eq!(path.raw(), "$.path.to.object");
        assert!(!path.is_root());
        assert!(JsonPath::parse("$").unwrap().is_root());
    }

    #[test]
    fn parse_rejects_mixed_notation() {
        assert!(JsonPath::parse("$.path['to']").is_err());
        assert!(JsonPath::parse("$.items[0]").is_err());
    }

    #[test]
    fn parent_and_key() {
        let path = JsonPath::parse("$['path']['to']['object']").unwrap();
        assert_eq!(path.parent().unwrap().normalized(), "$['path']['to']");
        assert_eq!(path.element_key().unwrap(), "object");

        let top = JsonPath::parse("$.object").unwrap();
        assert!(top.parent().unwrap().is_root());
        assert_eq!(top.parent().unwrap().normalized(), "$");
    }

    #[test]
    fn root_has_no_parent_or_key() {
        let root = JsonPath::root();
        assert!(matches!(root.parent(), Err(EncryptionError::InvalidArgument(_))));
        assert!(matches!(root.element_key(), Err(EncryptionError::InvalidArgument(_))));
    }

    #[test]
    fn definite_paths() {
        assert!(is_definite("$"));
        assert!(is_definite("$.path.to.object"));
        assert!(is_definite("$['path']['to']"));
        assert!(!is_definite("$.payloads[*]"));
        assert!(!is_definite("$..object"));
        assert!(!is_definite("$.items[?(@.id)]"));
        assert!(!is_definite("$['a','b']"));
    }
}
