//! The JSON value tree.
//!
//! [`Json`] is a closed sum of seven variants in a fixed tag order:
//! Array, Boolean, Integer, Null, Object, Double, String. Integers and
//! doubles are distinct tags; object keys iterate in comparison order.
//! Values are built by [`Json::parse`] or assembled directly from the
//! public variants, and compared structurally.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{AccessError, ParseError};
use crate::reader::Reader;

pub(crate) mod parser;
pub(crate) mod print;

/// A JSON document node.
///
/// Strings hold the raw input bytes: a `\` in the source keeps itself and
/// the byte following it, with no unescaping pass. `"\""` is stored as
/// the two bytes `\` `"`. Printing writes the bytes back through
/// unchanged, so parse and print are inverses.
#[derive(Debug, Clone, Default)]
pub enum Json {
    Array(Vec<Json>),
    Boolean(bool),
    Integer(i64),
    #[default]
    Null,
    Object(BTreeMap<String, Json>),
    Double(f64),
    String(String),
}

// Equality defers to the total order so the two always agree: doubles
// compare by `total_cmp`, which makes equality reflexive for every
// representable value (`-0.0` and `0.0` are distinct, as are the bit
// patterns of NaN, though the parser never produces one).
impl PartialEq for Json {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Json {}

impl Ord for Json {
    fn cmp(&self, other: &Self) -> Ordering {
        use Json::*;
        match (self, other) {
            (Array(a), Array(b)) => a.cmp(b),
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Null, Null) => Ordering::Equal,
            (Object(a), Object(b)) => a.cmp(b),
            (Double(a), Double(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => self.tag_index().cmp(&other.tag_index()),
        }
    }
}

impl PartialOrd for Json {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Json {
    fn tag_index(&self) -> u8 {
        match self {
            Json::Array(_) => 0,
            Json::Boolean(_) => 1,
            Json::Integer(_) => 2,
            Json::Null => 3,
            Json::Object(_) => 4,
            Json::Double(_) => 5,
            Json::String(_) => 6,
        }
    }

    /// Read one JSON value from `reader`, leaving trailing input intact.
    pub fn parse(reader: &mut Reader<'_>) -> Result<Json, ParseError> {
        parser::parse_value(reader)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Json::Array(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Json::Boolean(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Json::Integer(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Json::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Json::Object(_))
    }

    pub fn is_double(&self) -> bool {
        matches!(self, Json::Double(_))
    }

    /// Integer or double.
    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_double()
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Json::String(_))
    }

    pub fn get_array(&self) -> Result<&Vec<Json>, AccessError> {
        match self {
            Json::Array(v) => Ok(v),
            _ => Err(AccessError::new("not an array", self)),
        }
    }

    pub fn get_array_mut(&mut self) -> Result<&mut Vec<Json>, AccessError> {
        match self {
            Json::Array(v) => Ok(v),
            _ => Err(AccessError::new("not an array", self)),
        }
    }

    pub fn get_bool(&self) -> Result<bool, AccessError> {
        match self {
            Json::Boolean(b) => Ok(*b),
            _ => Err(AccessError::new("not a bool", self)),
        }
    }

    pub fn get_integer(&self) -> Result<i64, AccessError> {
        match self {
            Json::Integer(i) => Ok(*i),
            _ => Err(AccessError::new("not an integer", self)),
        }
    }

    pub fn get_object(&self) -> Result<&BTreeMap<String, Json>, AccessError> {
        match self {
            Json::Object(m) => Ok(m),
            _ => Err(AccessError::new("not an object", self)),
        }
    }

    pub fn get_object_mut(&mut self) -> Result<&mut BTreeMap<String, Json>, AccessError> {
        match self {
            Json::Object(m) => Ok(m),
            _ => Err(AccessError::new("not an object", self)),
        }
    }

    pub fn get_double(&self) -> Result<f64, AccessError> {
        match self {
            Json::Double(d) => Ok(*d),
            _ => Err(AccessError::new("not a double", self)),
        }
    }

    /// Either tag of number, widened to `f64`.
    pub fn get_number(&self) -> Result<f64, AccessError> {
        match self {
            Json::Integer(i) => Ok(*i as f64),
            Json::Double(d) => Ok(*d),
            _ => Err(AccessError::new("not a number", self)),
        }
    }

    pub fn get_string(&self) -> Result<&str, AccessError> {
        match self {
            Json::String(s) => Ok(s),
            _ => Err(AccessError::new("not a string", self)),
        }
    }

    pub fn get_string_mut(&mut self) -> Result<&mut String, AccessError> {
        match self {
            Json::String(s) => Ok(s),
            _ => Err(AccessError::new("not a string", self)),
        }
    }

    /// Object member lookup; range error when the key is absent.
    pub fn at(&self, key: &str) -> Result<&Json, AccessError> {
        self.get_object()?
            .get(key)
            .ok_or_else(|| AccessError::new(format!("no key `{key}`"), self))
    }

    /// Array element lookup; range error when the index is out of bounds.
    pub fn idx(&self, index: usize) -> Result<&Json, AccessError> {
        let arr = self.get_array()?;
        arr.get(index)
            .ok_or_else(|| AccessError::new(format!("no index {index}"), self))
    }

    /// Element count of an array or object.
    pub fn size(&self) -> Result<usize, AccessError> {
        match self {
            Json::Array(v) => Ok(v.len()),
            Json::Object(m) => Ok(m.len()),
            _ => Err(AccessError::new("size(): not Array nor Object", self)),
        }
    }

    /// Number of entries under `key`: 1 when present, 0 otherwise.
    pub fn count(&self, key: &str) -> Result<usize, AccessError> {
        Ok(usize::from(self.get_object()?.contains_key(key)))
    }

    /// Append to an array value.
    pub fn push_back(&mut self, value: Json) -> Result<(), AccessError> {
        self.get_array_mut()?.push(value);
        Ok(())
    }

    /// Insert into an object value, replacing any existing entry.
    pub fn insert(&mut self, key: impl Into<String>, value: Json) -> Result<(), AccessError> {
        self.get_object_mut()?.insert(key.into(), value);
        Ok(())
    }

    /// Multi-line rendering with `tab_size` spaces per nesting level.
    ///
    /// Object keys are padded so the colons of one object align. Panics
    /// if the tree contains a non-finite double; the parser never builds
    /// one.
    pub fn pretty(&self, tab_size: usize) -> String {
        let mut out = String::new();
        print::pretty_impl(self, &mut out, tab_size, 0, true, None);
        out
    }
}

impl FromStr for Json {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Json::parse(&mut Reader::new(s))
    }
}

impl From<bool> for Json {
    fn from(v: bool) -> Self {
        Json::Boolean(v)
    }
}

impl From<i64> for Json {
    fn from(v: i64) -> Self {
        Json::Integer(v)
    }
}

impl From<f64> for Json {
    fn from(v: f64) -> Self {
        Json::Double(v)
    }
}

impl From<&str> for Json {
    fn from(v: &str) -> Self {
        Json::String(v.to_string())
    }
}

impl From<String> for Json {
    fn from(v: String) -> Self {
        Json::String(v)
    }
}

impl From<Vec<Json>> for Json {
    fn from(v: Vec<Json>) -> Self {
        Json::Array(v)
    }
}

impl From<BTreeMap<String, Json>> for Json {
    fn from(v: BTreeMap<String, Json>) -> Self {
        Json::Object(v)
    }
}
