//! Docstore core — document values, entity identifiers, and codecs.
//!
//! Runtime-free building blocks shared by every store-facing layer:
//! [`Document`] is the unit of storage, [`Entity`] and [`Codec`] describe how a
//! table maps typed entities onto documents, and [`codec`] holds the scalar
//! codecs used for single typed values.

pub mod codec;
pub mod traits;
pub mod types;

pub use codec::{DocumentCodec, Scalar, ScalarCodec};
pub use traits::{Codec, Entity, ValueCodec};
pub use types::{Document, DocumentError, EntityId, Value};
