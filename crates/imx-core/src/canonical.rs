//! # Canonical Text — The One Pretty-Printing Path
//!
//! This module defines `CanonicalText`, the sole construction path for the
//! text written to source documents and aggregate artifacts.
//!
//! ## Invariant
//!
//! The inner `String` is private. The only constructors are
//! [`CanonicalText::pretty`] and [`CanonicalText::compact`], so the bytes
//! compared by the source rewriter and the bytes written by the emitter
//! come from the same serializer configuration.
//!
//! ## Format
//!
//! - Pretty: 4-space indentation, `": "` after keys, one trailing newline.
//! - Compact: no insignificant whitespace, one trailing newline.
//! - Non-ASCII characters are written as UTF-8, not `\u` escapes.
//! - Object keys keep the order of the value (serde_json is built with
//!   `preserve_order`). Feature documents are put in conventional order
//!   first with [`order_feature_keys`].
//!
//! The same value always yields the same bytes.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};

use crate::error::CanonicalizationError;

/// Leading keys of a feature document, in canonical order.
const FEATURE_KEY_ORDER: [&str; 4] = ["type", "id", "properties", "geometry"];

/// Text produced by the canonical serializer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalText(String);

impl CanonicalText {
    /// Serialize `value` in the canonical pretty form.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value
    /// cannot be serialized (e.g. a map with non-string keys).
    pub fn pretty(value: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let mut buf = Vec::with_capacity(4096);
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut serializer)?;
        buf.push(b'\n');
        Ok(Self(String::from_utf8(buf)?))
    }

    /// Serialize `value` in the canonical compact (minified) form.
    ///
    /// # Errors
    ///
    /// See [`pretty`](Self::pretty).
    pub fn compact(value: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let mut text = serde_json::to_string(value)?;
        text.push('\n');
        Ok(Self(text))
    }

    /// The canonical text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical text as bytes, for comparison against file content.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Consume and return the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

/// Move `type`, `id`, `properties` and `geometry` to the front of a
/// feature object, keeping every other key in its existing order after
/// them. Non-objects are left unchanged.
pub fn order_feature_keys(document: &mut Value) {
    let Value::Object(map) = document else {
        return;
    };
    let mut rest: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
    let mut ordered = Map::new();
    for key in FEATURE_KEY_ORDER {
        if let Some(pos) = rest.iter().position(|(k, _)| k == key) {
            let (k, v) = rest.remove(pos);
            ordered.insert(k, v);
        }
    }
    ordered.extend(rest);
    *map = ordered;
}
