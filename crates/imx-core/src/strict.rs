//! # Strict Document Parsing
//!
//! `serde_json::from_str::<Value>` keeps the last value when an object
//! repeats a key. For hand-edited source documents that hides mistakes,
//! so documents are parsed through a visitor that refuses repeated keys.
//!
//! Key order is preserved (`serde_json` is built with `preserve_order`),
//! which the canonical pretty form relies on.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Number, Value};

use crate::error::ParseError;

/// Parse a JSON document, rejecting objects with duplicate keys.
///
/// # Errors
///
/// Returns `ParseError` for malformed JSON and for any object that
/// repeats a key. The error carries line and column from serde_json.
pub fn parse_document(text: &str) -> Result<Value, ParseError> {
    let StrictValue(value) = serde_json::from_str(text)?;
    Ok(value)
}

struct StrictValue(Value);

impl<'de> Deserialize<'de> for StrictValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(StrictVisitor).map(StrictValue)
    }
}

struct StrictVisitor;

impl<'de> Visitor<'de> for StrictVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Number::from_f64(v)
            .map(Value::Number)
            .ok_or_else(|| E::custom(format!("non-finite number {v}")))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        StrictValue::deserialize(deserializer).map(|v| v.0)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(StrictValue(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut access: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = Map::new();
        while let Some(key) = access.next_key::<String>()? {
            if map.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate key: {key:?}")));
            }
            let StrictValue(value) = access.next_value()?;
            map.insert(key, value);
        }
        Ok(Value::Object(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_document() {
        let v = parse_document(r#"{"id": "a", "n": [1, -2, 3.5, null, true]}"#).unwrap();
        assert_eq!(v["id"], "a");
        assert_eq!(v["n"][1], -2);
        assert_eq!(v["n"][2], 3.5);
        assert!(v["n"][3].is_null());
    }

    #[test]
    fn preserves_key_order() {
        let v = parse_document(r#"{"type": "Feature", "id": "x", "properties": {}}"#).unwrap();
        let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["type", "id", "properties"]);
    }

    #[test]
    fn rejects_duplicate_top_level_key() {
        let err = parse_document(r#"{"id": "a", "id": "b"}"#).unwrap_err();
        assert!(err.to_string().contains("duplicate key: \"id\""), "{err}");
    }

    #[test]
    fn rejects_duplicate_nested_key() {
        let err = parse_document(r#"{"attribution": {"text": "a", "text": "b"}}"#).unwrap_err();
        assert!(err.to_string().contains("duplicate key"), "{err}");
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(parse_document("{\"id\": ").is_err());
        assert!(parse_document("").is_err());
    }
}
