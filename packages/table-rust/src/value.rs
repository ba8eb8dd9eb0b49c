//! Typed single-key values.
//!
//! A [`StoreValue`] binds one store key to a [`ValueCodec`] and a default.
//! Unlike table lookups, [`StoreValue::get`] never fails: a missing, corrupt
//! or unreachable value is logged and replaced by the default. Use
//! [`StoreValue::try_get`] to see the error instead.

use docstore_core::{Document, DocumentCodec, ScalarCodec, Value, ValueCodec};
use tracing::error;

use crate::connection::StoreConnection;
use crate::error::{StoreError, StoreResult};

/// A typed value stored under a single key.
pub struct StoreValue<C: ValueCodec> {
    key: String,
    default: C::Value,
    codec: C,
    connection: StoreConnection,
}

impl<C: ValueCodec> StoreValue<C> {
    #[must_use]
    pub fn with_codec(
        key: impl Into<String>,
        default: C::Value,
        codec: C,
        connection: StoreConnection,
    ) -> Self {
        Self {
            key: key.into(),
            default,
            codec,
            connection,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn default_value(&self) -> &C::Value {
        &self.default
    }

    /// Reads the value, falling back to the default on any failure.
    pub async fn get(&self) -> C::Value {
        match self.try_get().await {
            Ok(value) => value,
            Err(err) => {
                error!(key = %self.key, error = %err, "failed to read value, using default");
                self.default.clone()
            }
        }
    }

    /// Reads the value.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`], [`StoreError::Decode`], or a transport error.
    pub async fn try_get(&self) -> StoreResult<C::Value> {
        let document = self.connection.get(&self.key).await?;
        self.codec
            .decode(&document)
            .map_err(|source| StoreError::Decode {
                key: self.key.clone(),
                source,
            })
    }

    /// Overwrites the stored value.
    ///
    /// # Errors
    ///
    /// Transport errors only.
    pub async fn set(&self, value: &C::Value) -> StoreResult<()> {
        self.connection
            .set(&self.key, &self.codec.encode(value))
            .await
            .map(|_| ())
    }

    /// Deletes the stored value. Subsequent reads return the default.
    ///
    /// # Errors
    ///
    /// Transport errors only.
    pub async fn delete(&self) -> StoreResult<()> {
        self.connection.delete(&self.key).await.map(|_| ())
    }
}

impl<T: docstore_core::Scalar> StoreValue<ScalarCodec<T>> {
    #[must_use]
    pub fn new(key: impl Into<String>, default: T, connection: StoreConnection) -> Self {
        Self::with_codec(key, default, ScalarCodec::new(), connection)
    }
}

impl StoreValue<DocumentCodec> {
    #[must_use]
    pub fn document(key: impl Into<String>, default: Document, connection: StoreConnection) -> Self {
        Self::with_codec(key, default, DocumentCodec, connection)
    }
}

pub type BoolValue = StoreValue<ScalarCodec<bool>>;
pub type ShortValue = StoreValue<ScalarCodec<i16>>;
pub type IntValue = StoreValue<ScalarCodec<i32>>;
pub type LongValue = StoreValue<ScalarCodec<i64>>;
pub type FloatValue = StoreValue<ScalarCodec<f32>>;
pub type DoubleValue = StoreValue<ScalarCodec<f64>>;
pub type StringValue = StoreValue<ScalarCodec<String>>;
pub type ArrayValue = StoreValue<ScalarCodec<Vec<Value>>>;
pub type DocumentValue = StoreValue<DocumentCodec>;
