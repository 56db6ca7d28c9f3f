//! # Source Identifiers
//!
//! Feature and resource documents are indexed by a contributor-chosen
//! identifier. The same character rules apply to both collections, and
//! the schemas enforce the identical pattern (`^[A-Za-z0-9_.-]+$`).
//!
//! `SourceId` orders byte-wise (derived `Ord` on the inner `String`), which
//! is what makes the aggregate artifacts independent of locale.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::IdentifierError;

/// Identifier of a feature or resource document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceId(String);

impl SourceId {
    /// Validate and wrap an identifier.
    ///
    /// # Errors
    ///
    /// Returns `IdentifierError::Empty` for the empty string and
    /// `IdentifierError::InvalidCharacter` for anything outside
    /// ASCII letters, digits, `-`, `_` and `.`.
    pub fn new(id: impl Into<String>) -> Result<Self, IdentifierError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if let Some(ch) = id.chars().find(|c| !is_id_char(*c)) {
            return Err(IdentifierError::InvalidCharacter { id, ch });
        }
        Ok(Self(id))
    }

    /// Access the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

impl TryFrom<String> for SourceId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SourceId> for String {
    fn from(id: SourceId) -> Self {
        id.0
    }
}

impl AsRef<str> for SourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Ord, Eq and Hash all delegate to the inner string, so map lookups by
// `&str` agree with lookups by `SourceId`.
impl Borrow<str> for SourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
