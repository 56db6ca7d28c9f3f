//! # Schema Strictness Audit
//!
//! Validation of contributed documents must reject properties the schema
//! does not know about, not just missing required ones. A typo such as
//! `"max_zom"` would otherwise pass silently and be dropped by every
//! consumer downstream.
//!
//! This module walks a schema and reports every object schema that leaves
//! `additionalProperties` open. [`SchemaValidator`](crate::SchemaValidator)
//! refuses to load a schema with findings.
//!
//! `additionalProperties` given as a schema (rather than `true`) is
//! accepted: it constrains the extra values, as used for the free-form
//! `properties` map of a feature.

use std::fmt;

use serde_json::Value;

/// Keywords whose value is a single subschema.
const SUBSCHEMA_KEYWORDS: &[&str] = &["items", "not", "if", "then", "else", "contains"];

/// Keywords whose value is an array of subschemas.
const SUBSCHEMA_ARRAY_KEYWORDS: &[&str] = &["oneOf", "anyOf", "allOf", "prefixItems"];

/// Keywords whose value is a map of name to subschema.
const SUBSCHEMA_MAP_KEYWORDS: &[&str] = &["properties", "$defs", "definitions", "patternProperties"];

/// An object schema that admits unknown properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalPropertiesFinding {
    /// JSON Pointer to the offending object schema.
    pub json_path: String,
    /// The current `additionalProperties` value, or a note that it is absent.
    pub current_value: String,
}

impl fmt::Display for AdditionalPropertiesFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.json_path.is_empty() { "(root)" } else { &self.json_path };
        write!(f, "{path}: additionalProperties is {}", self.current_value)
    }
}

/// Audit every object schema reachable from `schema`.
///
/// Returns findings in document order; an empty list means the schema is
/// strict everywhere.
pub fn audit_additional_properties(schema: &Value) -> Vec<AdditionalPropertiesFinding> {
    let mut findings = Vec::new();
    audit_node(schema, "", &mut findings);
    findings
}

fn audit_node(schema: &Value, path: &str, findings: &mut Vec<AdditionalPropertiesFinding>) {
    let Value::Object(node) = schema else {
        return;
    };

    if is_object_schema(schema) {
        match node.get("additionalProperties") {
            Some(Value::Bool(false)) | Some(Value::Object(_)) => {}
            Some(other) => findings.push(AdditionalPropertiesFinding {
                json_path: path.to_string(),
                current_value: other.to_string(),
            }),
            None => findings.push(AdditionalPropertiesFinding {
                json_path: path.to_string(),
                current_value: "(absent, defaults to true)".to_string(),
            }),
        }
    }

    for keyword in SUBSCHEMA_KEYWORDS {
        if let Some(sub) = node.get(*keyword) {
            audit_node(sub, &format!("{path}/{keyword}"), findings);
        }
    }
    if let Some(sub @ Value::Object(_)) = node.get("additionalProperties") {
        audit_node(sub, &format!("{path}/additionalProperties"), findings);
    }
    for keyword in SUBSCHEMA_ARRAY_KEYWORDS {
        if let Some(Value::Array(subs)) = node.get(*keyword) {
            for (i, sub) in subs.iter().enumerate() {
                audit_node(sub, &format!("{path}/{keyword}/{i}"), findings);
            }
        }
    }
    for keyword in SUBSCHEMA_MAP_KEYWORDS {
        if let Some(Value::Object(subs)) = node.get(*keyword) {
            for (name, sub) in subs {
                audit_node(sub, &format!("{path}/{keyword}/{}", escape_pointer(name)), findings);
            }
        }
    }
}

/// An object schema declares `"type": "object"` or lists `properties`.
fn is_object_schema(schema: &Value) -> bool {
    let declares_object = match schema.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t == "object"),
        _ => false,
    };
    declares_object || schema.get("properties").is_some()
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
