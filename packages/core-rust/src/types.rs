use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors raised while reading or shaping a [`Document`].
///
/// Accessors never fall back to a default: a missing or mistyped field is
/// always reported through one of these variants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error("document text is empty")]
    Empty,
    #[error("document text is not valid JSON: {0}")]
    Parse(String),
    #[error("document text is not a JSON object")]
    NotAnObject,
    #[error("missing field `{field}`")]
    MissingField { field: String },
    #[error("field `{field}` is {found}, expected {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid entity id `{raw}`")]
    InvalidId { raw: String },
    #[error("{0}")]
    Invalid(String),
}

/// Generic runtime value stored inside a [`Document`].
///
/// Covers the JSON data model. Serializes untagged so the text form is plain
/// JSON: integers that fit in `i64` come back as [`Value::Int`], every other
/// number as [`Value::Float`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// JSON null.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON integer (signed 64-bit).
    Int(i64),
    /// JSON floating-point (64-bit IEEE 754). Non-finite values encode as null.
    Float(f64),
    /// JSON string (UTF-8).
    String(String),
    /// JSON array (ordered sequence of values).
    Array(Vec<Value>),
    /// JSON object. Uses `BTreeMap` for deterministic serialization order.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    /// Returns the string slice if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Int(i) => Self::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Self::Null, Self::Number),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::from).collect()),
            Value::Map(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Self::Map(document.fields)
    }
}

/// A string-keyed structured value: the unit of storage in the document store.
///
/// The text form is a compact JSON object. Keys are kept sorted, so encoding
/// the same document twice yields the same text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: BTreeMap<String, Value>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any previous value. Returns `self` for chaining.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Builder-style variant of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Returns the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::MissingField`] if the key is absent.
    pub fn get(&self, key: &str) -> Result<&Value, DocumentError> {
        self.fields.get(key).ok_or_else(|| DocumentError::MissingField {
            field: key.to_string(),
        })
    }

    /// # Errors
    ///
    /// Fails if the key is absent or does not hold a string.
    pub fn get_str(&self, key: &str) -> Result<&str, DocumentError> {
        match self.get(key)? {
            Value::String(s) => Ok(s),
            other => Err(wrong_type(key, "string", other)),
        }
    }

    /// # Errors
    ///
    /// Fails if the key is absent or does not hold an integer.
    pub fn get_i64(&self, key: &str) -> Result<i64, DocumentError> {
        match self.get(key)? {
            Value::Int(i) => Ok(*i),
            other => Err(wrong_type(key, "int", other)),
        }
    }

    /// Reads a number as `f64`. Integers are widened.
    ///
    /// # Errors
    ///
    /// Fails if the key is absent or does not hold a number.
    #[allow(clippy::cast_precision_loss)]
    pub fn get_f64(&self, key: &str) -> Result<f64, DocumentError> {
        match self.get(key)? {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(wrong_type(key, "float", other)),
        }
    }

    /// # Errors
    ///
    /// Fails if the key is absent or does not hold a boolean.
    pub fn get_bool(&self, key: &str) -> Result<bool, DocumentError> {
        match self.get(key)? {
            Value::Bool(b) => Ok(*b),
            other => Err(wrong_type(key, "bool", other)),
        }
    }

    /// # Errors
    ///
    /// Fails if the key is absent or does not hold an array.
    pub fn get_array(&self, key: &str) -> Result<&[Value], DocumentError> {
        match self.get(key)? {
            Value::Array(items) => Ok(items),
            other => Err(wrong_type(key, "array", other)),
        }
    }

    /// # Errors
    ///
    /// Fails if the key is absent or does not hold a nested mapping.
    pub fn get_map(&self, key: &str) -> Result<&BTreeMap<String, Value>, DocumentError> {
        match self.get(key)? {
            Value::Map(map) => Ok(map),
            other => Err(wrong_type(key, "map", other)),
        }
    }

    /// Encodes the document as a compact JSON object.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        serde_json::Value::from(&Value::Map(self.fields.clone())).to_string()
    }

    /// Parses a JSON object into a document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Empty`] for empty text, [`DocumentError::Parse`]
    /// for invalid JSON and [`DocumentError::NotAnObject`] for any JSON value
    /// other than an object.
    pub fn from_json_str(text: &str) -> Result<Self, DocumentError> {
        if text.trim().is_empty() {
            return Err(DocumentError::Empty);
        }
        let parsed: serde_json::Value =
            serde_json::from_str(text).map_err(|e| DocumentError::Parse(e.to_string()))?;
        match Value::from(parsed) {
            Value::Map(fields) => Ok(Self { fields }),
            _ => Err(DocumentError::NotAnObject),
        }
    }
}

impl From<BTreeMap<String, Value>> for Document {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

fn wrong_type(field: &str, expected: &'static str, found: &Value) -> DocumentError {
    DocumentError::WrongType {
        field: field.to_string(),
        expected,
        found: found.kind(),
    }
}

/// Unique, immutable identifier of an entity.
///
/// Wraps a UUID; the text form is the hyphenated lowercase UUID, which is also
/// the form stored in a table's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Generates a fresh random (v4) identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for EntityId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for EntityId {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| DocumentError::InvalidId { raw: s.to_string() })
    }
}
