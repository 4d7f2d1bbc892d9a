//! Closed dynamic value type
//!
//! Free-form attributes reach the provider either as a JSON-encoded string
//! or as a structured object. [`DynamicValue`] models both without falling
//! back to untyped JSON, and converts explicitly to and from
//! [`serde_json::Value`] at the wire boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::{Error, Result};

/// A value of a dynamically typed attribute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DynamicValue {
    /// Explicit null
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer number
    Int(i64),
    /// Integer above `i64::MAX`
    UInt(u64),
    /// Floating point number
    Float(f64),
    /// String (possibly JSON-encoded content)
    String(String),
    /// Ordered list
    List(Vec<DynamicValue>),
    /// String-keyed mapping; keys are kept sorted
    Map(BTreeMap<String, DynamicValue>),
}

impl DynamicValue {
    /// Short name of the value's kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::UInt(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Whether this is [`DynamicValue::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the string content, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the entries, if this is a map
    pub fn as_map(&self) -> Option<&BTreeMap<String, DynamicValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Convert to JSON.
    ///
    /// `key` names the attribute being converted; nested entries extend it
    /// (`params.limits[2]`) so errors point at the offending element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteNumber`] for NaN or infinite floats.
    pub fn to_json(&self, key: &str) -> Result<Value> {
        Ok(match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Number((*i).into()),
            Self::UInt(u) => Value::Number((*u).into()),
            Self::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .ok_or_else(|| Error::NonFiniteNumber {
                    key: key.to_string(),
                })?,
            Self::String(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| item.to_json(&format!("{key}[{i}]")))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Self::Map(entries) => Value::Object(entries_to_json(entries, key)?),
        })
    }

    /// Parse a JSON-encoded string that must hold an object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJson`] when `content` is not JSON and
    /// [`Error::UnsupportedValue`] when it is JSON but not an object.
    pub fn parse_object(key: &str, content: &str) -> Result<BTreeMap<String, DynamicValue>> {
        let parsed: Value = serde_json::from_str(content).map_err(|source| Error::InvalidJson {
            key: key.to_string(),
            content: content.to_string(),
            source,
        })?;

        match Self::from(parsed) {
            Self::Map(entries) => Ok(entries),
            other => Err(Error::UnsupportedValue {
                key: key.to_string(),
                expected: "a JSON object",
                found: other.kind(),
            }),
        }
    }
}

/// Convert map entries to a JSON object, naming each entry in errors
///
/// # Errors
///
/// Propagates [`DynamicValue::to_json`] failures.
pub fn entries_to_json(entries: &BTreeMap<String, DynamicValue>, key: &str) -> Result<Map<String, Value>> {
    entries
        .iter()
        .map(|(k, v)| {
            let child = if key.is_empty() {
                k.clone()
            } else {
                format!("{key}.{k}")
            };
            v.to_json(&child).map(|json| (k.clone(), json))
        })
        .collect()
}

impl From<Value> for DynamicValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Self::Int(i),
                (None, Some(u)) => Self::UInt(u),
                (None, None) => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(entries) => {
                Self::Map(entries.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<Map<String, Value>> for DynamicValue {
    fn from(entries: Map<String, Value>) -> Self {
        Self::from(Value::Object(entries))
    }
}

impl From<&str> for DynamicValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}
