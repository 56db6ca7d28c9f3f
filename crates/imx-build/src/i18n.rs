//! # Translation Strings
//!
//! Collects the human-readable text of resources flagged `"i18n": true`
//! and renders the localization extract handed to translators:
//!
//! ```yaml
//! en:
//!   imagery:
//!     some-resource:
//!       attribution:
//!         text: © Someone
//!       description: Aerial imagery of somewhere
//!       name: Somewhere Ortho
//! ```
//!
//! Keys are sorted at every level so the extract diffs cleanly.

use std::collections::BTreeMap;

use imx_core::SourceId;
use serde::Serialize;
use serde_json::Value;

/// Attribution text of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributionText {
    /// The attribution's display text.
    pub text: String,
}

/// The translatable fields of one resource. Field order is alphabetical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct I18nEntry {
    /// `attribution.text`, nested as in the source document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<AttributionText>,
    /// `description`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `name`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl I18nEntry {
    /// Extract the translatable fields of a resource document.
    ///
    /// Returns `None` unless the document sets `"i18n": true` and carries
    /// at least one of `name`, `description` or `attribution.text`.
    pub fn from_resource(document: &Value) -> Option<Self> {
        if document.get("i18n").and_then(Value::as_bool) != Some(true) {
            return None;
        }
        let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);
        let entry = Self {
            attribution: text(document.get("attribution").and_then(|a| a.get("text")))
                .map(|text| AttributionText { text }),
            description: text(document.get("description")),
            name: text(document.get("name")),
        };
        (entry != Self::default()).then_some(entry)
    }
}

/// Translatable strings keyed by resource id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct I18nBundle {
    entries: BTreeMap<SourceId, I18nEntry>,
}

impl I18nBundle {
    /// Add (or replace) the entry of `id`.
    pub fn insert(&mut self, id: SourceId, entry: I18nEntry) {
        self.entries.insert(id, entry);
    }

    /// Collect `document`'s strings under `id` if it is flagged for
    /// translation. Returns whether an entry was added.
    pub fn collect(&mut self, id: &SourceId, document: &Value) -> bool {
        match I18nEntry::from_resource(document) {
            Some(entry) => {
                self.insert(id.clone(), entry);
                true
            }
            None => false,
        }
    }

    /// The entry of `id`, if any.
    pub fn get(&self, id: &str) -> Option<&I18nEntry> {
        self.entries.get(id)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no resource contributed strings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the extract, nested under `locale` and `namespace`.
    ///
    /// # Errors
    ///
    /// Returns the YAML serializer's error; not expected for string maps.
    pub fn to_extract_yaml(&self, locale: &str, namespace: &str) -> Result<String, serde_yaml::Error> {
        let nested = BTreeMap::from([(locale, BTreeMap::from([(namespace, self)]))]);
        serde_yaml::to_string(&nested)
    }
}
