//! Input values and their canonical text form.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A single input value.
///
/// The serde representation is tagged so stored records keep the exact kind
/// (`Int(1)` and `Float(1.0)` stay distinct). The URL representation is the
/// canonical JSON text produced by [`InputValue::to_canonical`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum InputValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<InputValue>),
    Map(BTreeMap<String, InputValue>),
    /// Uploaded content. Only storage mode can carry it.
    Binary(#[serde(with = "base64_bytes")] Vec<u8>),
}

impl InputValue {
    /// Short kind name used in logs and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            InputValue::Null => "null",
            InputValue::Bool(_) => "bool",
            InputValue::Int(_) => "int",
            InputValue::Float(_) => "float",
            InputValue::Text(_) => "text",
            InputValue::List(_) => "list",
            InputValue::Map(_) => "map",
            InputValue::Binary(_) => "binary",
        }
    }

    /// Check that the value survives storage mode unchanged.
    ///
    /// Everything except non-finite floats is storable.
    pub fn check_storable(&self) -> Result<(), &'static str> {
        match self {
            InputValue::Float(f) if !f.is_finite() => Err("non-finite float"),
            InputValue::List(items) => items.iter().try_for_each(InputValue::check_storable),
            InputValue::Map(entries) => entries.values().try_for_each(InputValue::check_storable),
            _ => Ok(()),
        }
    }

    /// Convert to the canonical JSON form used in URLs.
    pub fn to_json(&self) -> Result<Value, &'static str> {
        Ok(match self {
            InputValue::Null => Value::Null,
            InputValue::Bool(b) => Value::Bool(*b),
            InputValue::Int(i) => Value::Number(Number::from(*i)),
            InputValue::Float(f) => {
                Value::Number(Number::from_f64(*f).ok_or("non-finite float")?)
            }
            InputValue::Text(s) => Value::String(s.clone()),
            InputValue::List(items) => Value::Array(
                items
                    .iter()
                    .map(InputValue::to_json)
                    .collect::<Result<_, _>>()?,
            ),
            InputValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
                    .collect::<Result<_, &'static str>>()?,
            ),
            InputValue::Binary(_) => return Err("binary content is not URL-safe"),
        })
    }

    /// Build a value from canonical JSON.
    ///
    /// Integral numbers without a fraction become `Int`; numbers outside the
    /// i64 range and anything written with a fraction or exponent become `Float`.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => InputValue::Null,
            Value::Bool(b) => InputValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => InputValue::Int(i),
                None => InputValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => InputValue::Text(s),
            Value::Array(items) => {
                InputValue::List(items.into_iter().map(InputValue::from_json).collect())
            }
            Value::Object(entries) => InputValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, InputValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// JSON for the host API and the CLI.
    ///
    /// Same as the canonical form, except that binary content is written as
    /// `{"type": "binary", "value": "<base64>"}` instead of failing.
    pub fn to_api_json(&self) -> Value {
        match self {
            InputValue::Binary(bytes) => serde_json::json!({
                "type": "binary",
                "value": STANDARD.encode(bytes),
            }),
            InputValue::List(items) => {
                Value::Array(items.iter().map(InputValue::to_api_json).collect())
            }
            InputValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_api_json()))
                    .collect(),
            ),
            other => other.to_json().unwrap_or(Value::Null),
        }
    }

    /// Inverse of [`to_api_json`](Self::to_api_json).
    pub fn from_api_json(value: Value) -> Self {
        match value {
            Value::Object(entries) => match binary_payload(&entries) {
                Some(bytes) => InputValue::Binary(bytes),
                None => InputValue::Map(
                    entries
                        .into_iter()
                        .map(|(k, v)| (k, InputValue::from_api_json(v)))
                        .collect(),
                ),
            },
            Value::Array(items) => {
                InputValue::List(items.into_iter().map(InputValue::from_api_json).collect())
            }
            other => InputValue::from_json(other),
        }
    }

    /// Canonical text form (compact JSON).
    pub fn to_canonical(&self) -> Result<String, &'static str> {
        let json = self.to_json()?;
        serde_json::to_string(&json).map_err(|_| "value could not be serialized")
    }

    pub fn from_canonical(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Value>(text).map(InputValue::from_json)
    }
}

impl From<bool> for InputValue {
    fn from(b: bool) -> Self {
        InputValue::Bool(b)
    }
}

impl From<i64> for InputValue {
    fn from(i: i64) -> Self {
        InputValue::Int(i)
    }
}

impl From<i32> for InputValue {
    fn from(i: i32) -> Self {
        InputValue::Int(i64::from(i))
    }
}

impl From<f64> for InputValue {
    fn from(f: f64) -> Self {
        InputValue::Float(f)
    }
}

impl From<&str> for InputValue {
    fn from(s: &str) -> Self {
        InputValue::Text(s.to_string())
    }
}

impl From<String> for InputValue {
    fn from(s: String) -> Self {
        InputValue::Text(s)
    }
}

impl<T: Into<InputValue>> From<Vec<T>> for InputValue {
    fn from(items: Vec<T>) -> Self {
        InputValue::List(items.into_iter().map(Into::into).collect())
    }
}

fn binary_payload(entries: &Map<String, Value>) -> Option<Vec<u8>> {
    if entries.len() != 2 || entries.get("type")?.as_str()? != "binary" {
        return None;
    }
    STANDARD.decode(entries.get("value")?.as_str()?).ok()
}

mod base64_bytes {
    use super::{Engine, STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
