//! # Error Types
//!
//! Errors raised by the leaf primitives. Callers in `imx-build` attach the
//! offending file path before reporting them.

use thiserror::Error;

/// A document could not be parsed as JSON.
///
/// Duplicate object keys are reported through this type as well; the
/// message names the repeated key and serde_json supplies line/column.
#[derive(Error, Debug)]
#[error("invalid JSON: {0}")]
pub struct ParseError(
    /// The underlying serde_json error.
    #[from]
    pub serde_json::Error,
);

/// Error during geometry canonicalization or canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// A coordinate position held something other than numbers.
    #[error("non-numeric coordinate at {location}")]
    NonNumericCoordinate {
        /// Dotted path to the offending position, e.g. `coordinates.0.3`.
        location: String,
    },

    /// A geometry did not have the nesting its `type` requires.
    #[error("malformed {geometry_type} geometry: {reason}")]
    MalformedGeometry {
        /// The declared GeoJSON geometry type.
        geometry_type: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The requested precision exceeds what an f64 can carry.
    #[error("precision {0} is out of range (0..=15)")]
    PrecisionOutOfRange(u32),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// The serializer produced bytes that are not UTF-8.
    #[error("serialized output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A string is not a valid source identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The identifier is empty.
    #[error("identifier must not be empty")]
    Empty,

    /// The identifier contains a character outside `[A-Za-z0-9_.-]`.
    #[error("identifier {id:?} contains invalid character {ch:?}")]
    InvalidCharacter {
        /// The rejected identifier.
        id: String,
        /// The first offending character.
        ch: char,
    },
}
