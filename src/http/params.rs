//! Loosely typed request values.
//!
//! # Design Decisions
//! - Raw text is coerced integer first, then `true`/`false`, else string
//! - The raw text is kept next to the coerced value, so a handler that
//!   expects a literal string ("42", "true") can still read it verbatim
//! - Keys are ordered (BTreeMap) for deterministic logging and serialization

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A coerced parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Best-effort coercion of a raw string.
    pub fn coerce(raw: &str) -> Self {
        if let Ok(n) = raw.parse::<i64>() {
            return Value::Int(n);
        }
        match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Str(raw.to_string()),
        }
    }

    /// Map a JSON value by its own type. `null` has no counterpart.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => Some(match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Str(n.to_string()),
            }),
            serde_json::Value::String(s) => Some(Value::Str(s.clone())),
            nested => Some(Value::Str(nested.to_string())),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Str(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Param {
    raw: String,
    value: Value,
}

/// An ordered key → value map for body and path parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: BTreeMap<String, Param>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw string, coercing it. Later inserts of a key win.
    pub fn insert_raw(&mut self, key: impl Into<String>, raw: impl Into<String>) {
        let raw = raw.into();
        let value = Value::coerce(&raw);
        self.entries.insert(key.into(), Param { raw, value });
    }

    /// Insert an already typed value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        let raw = value.to_string();
        self.entries.insert(key.into(), Param { raw, value });
    }

    /// Build from a JSON object. Null members are skipped.
    pub fn from_json_object(map: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut params = Self::new();
        for (key, json) in map {
            if let Some(value) = Value::from_json(json) {
                let raw = match json {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                params.entries.insert(key.clone(), Param { raw, value });
            }
        }
        params
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).map(|p| &p.value)
    }

    /// The uncoerced text a value was parsed from.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|p| p.raw.as_str())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, p)| (k.as_str(), &p.value))
    }

    /// Merge `other` into `self`; keys from `other` win.
    pub fn extend(&mut self, other: Params) {
        self.entries.extend(other.entries);
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.iter()
                .map(|(k, v)| (k.to_string(), v.to_json()))
                .collect(),
        )
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, param) in &self.entries {
            map.serialize_entry(key, &param.value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coercion_order() {
        assert_eq!(Value::coerce("42"), Value::Int(42));
        assert_eq!(Value::coerce("-7"), Value::Int(-7));
        assert_eq!(Value::coerce("true"), Value::Bool(true));
        assert_eq!(Value::coerce("false"), Value::Bool(false));
        assert_eq!(Value::coerce("bob"), Value::Str("bob".into()));
        assert_eq!(Value::coerce("True"), Value::Str("True".into()));
        assert_eq!(Value::coerce("4.5"), Value::Str("4.5".into()));
    }

    #[test]
    fn test_raw_text_survives_coercion() {
        let mut params = Params::new();
        params.insert_raw("username", "007");
        assert_eq!(params.get_i64("username"), Some(7));
        assert_eq!(params.raw("username"), Some("007"));
    }

    #[test]
    fn test_json_object_mapping() {
        let json = serde_json::json!({
            "n": 3,
            "f": 1.5,
            "b": false,
            "s": "12",
            "skip": null,
            "nested": {"a": 1}
        });
        let params = Params::from_json_object(json.as_object().unwrap());
        assert_eq!(params.get_i64("n"), Some(3));
        assert_eq!(params.get_str("f"), Some("1.5"));
        assert_eq!(params.get_bool("b"), Some(false));
        // JSON strings are not sniffed
        assert_eq!(params.get_str("s"), Some("12"));
        assert!(!params.contains_key("skip"));
        assert_eq!(params.get_str("nested"), Some("{\"a\":1}"));
    }

    #[test]
    fn test_serialize_as_plain_map() {
        let params: Params = vec![("a", Value::Int(1)), ("b", Value::from("x"))]
            .into_iter()
            .collect();
        assert_eq!(serde_json::to_string(&params).unwrap(), r#"{"a":1,"b":"x"}"#);
    }
}
