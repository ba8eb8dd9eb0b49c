//! Docstore tables — registry-backed entity tables over a key-value document store.
//!
//! Layers, innermost first:
//!
//! - [`DocumentStore`]: raw text key-value backend ([`MemoryStore`] in-process)
//! - [`StoreConnection`]: explicit handle speaking [`Document`](docstore_core::Document)s,
//!   with request timeouts and scoped teardown
//! - [`Registry`]: the per-table ID set, stored as one document
//! - [`Table`]: enumeration, lookup, query, insert-or-update and removal of
//!   entities, keeping the registry and entity documents consistent
//!
//! Every operation is async; [`blocking`] provides blocking twins.
//! [`StoreValue`] covers single typed values stored under one key.

pub mod blocking;
pub mod config;
pub mod connection;
pub mod error;
pub mod registry;
pub mod store;
pub mod table;
pub mod value;

pub use blocking::{BlockingRuntime, BlockingTable, BlockingValue};
pub use config::StoreConfig;
pub use connection::StoreConnection;
pub use error::{StoreError, StoreResult};
pub use registry::Registry;
pub use store::{DocumentStore, MemoryStore, StoreOp};
pub use table::{Enumeration, ForEachSummary, Table};
pub use value::StoreValue;
