use std::sync::Arc;

use crate::types::{Document, DocumentError, EntityId};

/// A uniquely identified domain object persisted as one document.
///
/// The identifier is assigned at creation and never reassigned. Every read
/// from a table produces a fresh decoded value; there is no shared instance.
pub trait Entity: Clone + Send + Sync + 'static {
    /// The immutable identifier of this entity.
    fn id(&self) -> EntityId;
}

/// Converts between a table's entity type and its document form.
///
/// Supplied once per table at construction; the mapping never changes at
/// runtime. The identifier is handed to [`decode`](Codec::decode) separately,
/// so documents need not repeat it.
pub trait Codec: Send + Sync + 'static {
    /// The entity type this codec produces.
    type Entity: Entity;

    /// Encode an entity into its stored document.
    fn encode(&self, entity: &Self::Entity) -> Document;

    /// Decode the document stored for `id`.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentError`] when the document does not have the
    /// expected shape.
    fn decode(&self, id: EntityId, document: &Document) -> Result<Self::Entity, DocumentError>;
}

/// Converts a single typed value to and from the document stored under one key.
pub trait ValueCodec: Send + Sync + 'static {
    type Value: Clone + Send + Sync;

    fn encode(&self, value: &Self::Value) -> Document;

    /// # Errors
    ///
    /// Returns a [`DocumentError`] when the document does not hold a value of
    /// the expected type.
    fn decode(&self, document: &Document) -> Result<Self::Value, DocumentError>;
}

impl<C: Codec> Codec for Arc<C> {
    type Entity = C::Entity;

    fn encode(&self, entity: &Self::Entity) -> Document {
        (**self).encode(entity)
    }

    fn decode(&self, id: EntityId, document: &Document) -> Result<Self::Entity, DocumentError> {
        (**self).decode(id, document)
    }
}

impl<C: ValueCodec> ValueCodec for Arc<C> {
    type Value = C::Value;

    fn encode(&self, value: &Self::Value) -> Document {
        (**self).encode(value)
    }

    fn decode(&self, document: &Document) -> Result<Self::Value, DocumentError> {
        (**self).decode(document)
    }
}
