//! Bridges between [`Json`] and the serde ecosystem.
//!
//! The native tree keeps distinctions `serde_json::Value` does not
//! (integer vs double tags survive only when the value is exact), so
//! the conversions are for interop at the edges, not an internal
//! representation.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

use crate::json::Json;

impl Serialize for Json {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Json::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Json::Boolean(b) => serializer.serialize_bool(*b),
            Json::Integer(i) => serializer.serialize_i64(*i),
            Json::Null => serializer.serialize_unit(),
            Json::Object(members) => {
                let mut map = serializer.serialize_map(Some(members.len()))?;
                for (key, value) in members {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Json::Double(d) => serializer.serialize_f64(*d),
            Json::String(s) => serializer.serialize_str(s),
        }
    }
}

impl Json {
    /// Convert to a `serde_json::Value`.
    ///
    /// Non-finite doubles, which the parser never produces, come out as
    /// `null` because serde_json has no representation for them.
    pub fn to_value(&self) -> Value {
        match self {
            Json::Array(items) => Value::Array(items.iter().map(Json::to_value).collect()),
            Json::Boolean(b) => Value::Bool(*b),
            Json::Integer(i) => Value::Number((*i).into()),
            Json::Null => Value::Null,
            Json::Object(members) => Value::Object(
                members
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
            Json::Double(d) => serde_json::Number::from_f64(*d)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Json::String(s) => Value::String(s.clone()),
        }
    }

    /// Convert from a `serde_json::Value`.
    ///
    /// Numbers that fit an `i64` keep the integer tag; anything else
    /// widens to a double.
    pub fn from_value(value: &Value) -> Json {
        match value {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Boolean(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Json::Integer(i)
                } else {
                    Json::Double(n.as_f64().unwrap_or(f64::MAX))
                }
            }
            Value::String(s) => Json::String(s.clone()),
            Value::Array(items) => Json::Array(items.iter().map(Json::from_value).collect()),
            Value::Object(members) => {
                let converted: BTreeMap<String, Json> = members
                    .iter()
                    .map(|(k, v)| (k.clone(), Json::from_value(v)))
                    .collect();
                Json::Object(converted)
            }
        }
    }
}
