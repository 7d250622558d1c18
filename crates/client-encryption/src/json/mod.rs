//! JSON path parsing and document navigation.
//!
//! # Module invariants
//!
//! - **No crypto dependencies.** Nothing here imports `crate::crypto`.
//! - Documents are owned by a single codec call and mutated in place.

pub mod document;
pub mod path;

pub use path::{is_definite, JsonPath};
