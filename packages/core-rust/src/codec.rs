//! Scalar codecs for single typed values.
//!
//! A scalar is stored as the document `{"value": <scalar>}`. Whole documents
//! are stored as-is through [`DocumentCodec`].

use std::marker::PhantomData;

use crate::traits::ValueCodec;
use crate::types::{Document, DocumentError, Value};

/// Field under which [`ScalarCodec`] stores its value.
pub const VALUE_FIELD: &str = "value";

/// A type that maps onto a single [`Value`].
///
/// Conversions are strict: narrowing integer conversions that would truncate
/// fail instead.
pub trait Scalar: Clone + Send + Sync + 'static + Sized {
    /// Name used in decode error messages.
    const TYPE_NAME: &'static str;

    fn to_value(&self) -> Value;

    fn from_value(value: &Value) -> Option<Self>;
}

impl Scalar for bool {
    const TYPE_NAME: &'static str = "bool";

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl Scalar for i64 {
    const TYPE_NAME: &'static str = "int";

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl Scalar for i32 {
    const TYPE_NAME: &'static str = "int";

    fn to_value(&self) -> Value {
        Value::Int(i64::from(*self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        i64::from_value(value).and_then(|i| i32::try_from(i).ok())
    }
}

impl Scalar for i16 {
    const TYPE_NAME: &'static str = "int";

    fn to_value(&self) -> Value {
        Value::Int(i64::from(*self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        i64::from_value(value).and_then(|i| i16::try_from(i).ok())
    }
}

impl Scalar for f64 {
    const TYPE_NAME: &'static str = "float";

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl Scalar for f32 {
    const TYPE_NAME: &'static str = "float";

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: &Value) -> Option<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl Scalar for String {
    const TYPE_NAME: &'static str = "string";

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl Scalar for Vec<Value> {
    const TYPE_NAME: &'static str = "array";

    fn to_value(&self) -> Value {
        Value::Array(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(items.clone()),
            _ => None,
        }
    }
}

/// [`ValueCodec`] for a [`Scalar`] wrapped as `{"value": ...}`.
#[derive(Debug)]
pub struct ScalarCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> ScalarCodec<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for ScalarCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ScalarCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: Scalar> ValueCodec for ScalarCodec<T> {
    type Value = T;

    fn encode(&self, value: &T) -> Document {
        Document::new().with(VALUE_FIELD, value.to_value())
    }

    fn decode(&self, document: &Document) -> Result<T, DocumentError> {
        let raw = document.get(VALUE_FIELD)?;
        T::from_value(raw).ok_or_else(|| DocumentError::WrongType {
            field: VALUE_FIELD.to_string(),
            expected: T::TYPE_NAME,
            found: raw.kind(),
        })
    }
}

/// Identity [`ValueCodec`] for whole documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCodec;

impl ValueCodec for DocumentCodec {
    type Value = Document;

    fn encode(&self, value: &Document) -> Document {
        value.clone()
    }

    fn decode(&self, document: &Document) -> Result<Document, DocumentError> {
        Ok(document.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_is_wrapped_under_value_field() {
        let codec = ScalarCodec::<bool>::new();
        let doc = codec.encode(&true);
        assert_eq!(doc.to_json_string(), r#"{"value":true}"#);
        assert!(codec.decode(&doc).unwrap());
    }

    #[test]
    fn narrowing_integer_overflow_fails() {
        let doc = Document::new().with(VALUE_FIELD, i64::from(i16::MAX) + 1);
        assert!(ScalarCodec::<i16>::new().decode(&doc).is_err());
        assert_eq!(
            ScalarCodec::<i32>::new().decode(&doc).unwrap(),
            i32::from(i16::MAX) + 1
        );
    }

    #[test]
    fn floats_accept_integer_documents() {
        let doc = Document::new().with(VALUE_FIELD, 7_i64);
        let decoded = ScalarCodec::<f64>::new().decode(&doc).unwrap();
        assert!((decoded - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn wrong_scalar_type_names_expected_type() {
        let doc = Document::new().with(VALUE_FIELD, "seven");
        let err = ScalarCodec::<i64>::new().decode(&doc).unwrap_err();
        assert_eq!(
            err,
            DocumentError::WrongType {
                field: VALUE_FIELD.to_string(),
                expected: "int",
                found: "string",
            }
        );
    }

    #[test]
    fn missing_value_field_fails() {
        let err = ScalarCodec::<String>::new()
            .decode(&Document::new())
            .unwrap_err();
        assert!(matches!(err, DocumentError::MissingField { .. }));
    }

    #[test]
    fn array_scalar_round_trips_through_text() {
        let codec = ScalarCodec::<Vec<Value>>::new();
        let items = vec![Value::from("a"), Value::Int(2)];
        let text = codec.encode(&items).to_json_string();
        let back = codec
            .decode(&Document::from_json_str(&text).unwrap())
            .unwrap();
        assert_eq!(back, items);
    }

    #[test]
    fn document_codec_is_identity() {
        let doc = Document::new().with("k", "v");
        assert_eq!(DocumentCodec.decode(&DocumentCodec.encode(&doc)).unwrap(), doc);
    }
}
