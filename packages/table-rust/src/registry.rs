//! Per-table membership registry.
//!
//! The registry is one document stored under the table's name, listing the IDs
//! that belong to the table:
//!
//! ```json
//! {"ids": ["6f1c…", "a9e2…"]}
//! ```
//!
//! IDs keep insertion order and never repeat. Mutation is read-modify-write
//! with no lock or version check: two writers racing on the same table can
//! each read the same prior state, and the later write wins. The entity
//! documents themselves are unaffected; only their registry visibility is lost.

use std::collections::HashSet;

use docstore_core::{Document, DocumentError, EntityId, Value};
use tracing::{debug, warn};

use crate::connection::StoreConnection;
use crate::error::{StoreError, StoreResult};

const IDS_FIELD: &str = "ids";

/// Decoded registry contents: distinct IDs in insertion order.
///
/// Entries are compared as parsed [`EntityId`]s, so any textual form the UUID
/// parser accepts (simple, uppercase, braced, urn) names the same entity.
/// Writes always use the canonical hyphenated form.
#[derive(Debug, Clone, Default, PartialEq)]
struct RegistryDocument {
    ids: Vec<EntityId>,
}

impl RegistryDocument {
    fn from_document(key: &str, document: &Document) -> Result<Self, DocumentError> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for value in document.get_array(IDS_FIELD)? {
            let Value::String(raw) = value else {
                warn!(registry = %key, kind = value.kind(), "ignoring non-string registry entry");
                continue;
            };
            match raw.parse::<EntityId>() {
                Ok(id) if seen.insert(id) => ids.push(id),
                Ok(id) => debug!(registry = %key, %id, "ignoring duplicate registry id"),
                Err(err) => warn!(registry = %key, %err, "skipping malformed registry id"),
            }
        }
        Ok(Self { ids })
    }

    fn to_document(&self) -> Document {
        let ids = self
            .ids
            .iter()
            .map(|id| Value::String(id.to_string()))
            .collect::<Vec<_>>();
        Document::new().with(IDS_FIELD, ids)
    }

    fn contains(&self, id: EntityId) -> bool {
        self.ids.contains(&id)
    }

    fn insert(&mut self, id: EntityId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    fn remove(&mut self, id: EntityId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|existing| *existing != id);
        self.ids.len() != before
    }
}

/// The set of entity IDs belonging to one table.
#[derive(Debug, Clone)]
pub struct Registry {
    key: String,
    connection: StoreConnection,
}

impl Registry {
    /// Creates a registry stored under `key` (the table name).
    #[must_use]
    pub fn new(key: impl Into<String>, connection: StoreConnection) -> Self {
        Self {
            key: key.into(),
            connection,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// All well-formed IDs in the registry, in insertion order, each once.
    ///
    /// An absent or corrupt registry reads as empty: an empty table cannot be
    /// told apart from one that was never written. Entries that do not parse
    /// as an [`EntityId`] are skipped, and repeats of an ID are dropped.
    ///
    /// # Errors
    ///
    /// Transport failures are returned; they are never downgraded to empty.
    pub async fn list_ids(&self) -> StoreResult<Vec<EntityId>> {
        Ok(self.load().await?.ids)
    }

    /// Whether `id` is currently listed.
    ///
    /// # Errors
    ///
    /// Transport failures only.
    pub async fn contains(&self, id: EntityId) -> StoreResult<bool> {
        Ok(self.load().await?.contains(id))
    }

    /// Adds `id` if absent. Returns `true` if the registry was rewritten.
    ///
    /// # Errors
    ///
    /// Transport failures on either the read or the write.
    pub async fn add(&self, id: EntityId) -> StoreResult<bool> {
        let mut current = self.load().await?;
        if !current.insert(id) {
            return Ok(false);
        }
        self.connection.set(&self.key, &current.to_document()).await?;
        debug!(registry = %self.key, %id, "registry id added");
        Ok(true)
    }

    /// Removes `id` if present. Returns `true` if the registry was rewritten.
    ///
    /// # Errors
    ///
    /// Transport failures on either the read or the write.
    pub async fn remove(&self, id: EntityId) -> StoreResult<bool> {
        let mut current = self.load().await?;
        if !current.remove(id) {
            return Ok(false);
        }
        self.connection.set(&self.key, &current.to_document()).await?;
        debug!(registry = %self.key, %id, "registry id removed");
        Ok(true)
    }

    async fn load(&self) -> StoreResult<RegistryDocument> {
        match self.connection.get(&self.key).await {
            Ok(document) => match RegistryDocument::from_document(&self.key, &document) {
                Ok(registry) => Ok(registry),
                Err(err) => {
                    warn!(registry = %self.key, %err, "registry has unexpected shape, treating as empty");
                    Ok(RegistryDocument::default())
                }
            },
            Err(StoreError::NotFound { .. }) => Ok(RegistryDocument::default()),
            Err(err @ StoreError::Decode { .. }) => {
                warn!(registry = %self.key, %err, "registry is corrupt, treating as empty");
                Ok(RegistryDocument::default())
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreOp;

    fn registry() -> (Registry, std::sync::Arc<crate::store::MemoryStore>) {
        let (conn, store) = StoreConnection::memory();
        (Registry::new("users", conn), store)
    }

    #[tokio::test]
    async fn absent_registry_lists_empty() {
        let (registry, _store) = registry();
        assert!(registry.list_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_appends_in_order_and_dedups() {
        let (registry, store) = registry();
        let a = EntityId::new();
        let b = EntityId::new();

        assert!(registry.add(a).await.unwrap());
        assert!(registry.add(b).await.unwrap());
        assert!(!registry.add(a).await.unwrap());

        assert_eq!(registry.list_ids().await.unwrap(), vec![a, b]);
        assert_eq!(
            store.raw("users").unwrap(),
            format!(r#"{{"ids":["{a}","{b}"]}}"#)
        );
    }

    #[tokio::test]
    async fn add_of_present_id_skips_the_write() {
        let (registry, store) = registry();
        let id = EntityId::new();
        registry.add(id).await.unwrap();
        store.clear_operations();

        registry.add(id).await.unwrap();
        assert_eq!(store.operations(), vec![StoreOp::Get("users".into())]);
    }

    #[tokio::test]
    async fn remove_drops_only_the_given_id() {
        let (registry, _store) = registry();
        let a = EntityId::new();
        let b = EntityId::new();
        registry.add(a).await.unwrap();
        registry.add(b).await.unwrap();

        assert!(registry.remove(a).await.unwrap());
        assert!(!registry.remove(a).await.unwrap());
        assert_eq!(registry.list_ids().await.unwrap(), vec![b]);
        assert!(!registry.contains(a).await.unwrap());
        assert!(registry.contains(b).await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_registry_reads_empty_and_is_overwritten_on_add() {
        let (registry, store) = registry();
        store.insert_raw("users", "not json at all");
        assert!(registry.list_ids().await.unwrap().is_empty());

        store.insert_raw("users", r#"{"ids":"oops"}"#);
        assert!(registry.list_ids().await.unwrap().is_empty());

        let id = EntityId::new();
        registry.add(id).await.unwrap();
        assert_eq!(registry.list_ids().await.unwrap(), vec![id]);
    }

    #[tokio::test]
    async fn malformed_entries_are_skipped() {
        let (registry, store) = registry();
        let id = EntityId::new();
        store.insert_raw("users", format!(r#"{{"ids":["nope",7,"{id}"]}}"#));

        assert_eq!(registry.list_ids().await.unwrap(), vec![id]);
    }

    #[tokio::test]
    async fn non_canonical_ids_match_their_entity() {
        let (registry, store) = registry();
        let id = EntityId::new();
        let upper = id.as_uuid().simple().to_string().to_uppercase();
        store.insert_raw("users", format!(r#"{{"ids":["{upper}"]}}"#));

        assert_eq!(registry.list_ids().await.unwrap(), vec![id]);
        assert!(registry.contains(id).await.unwrap());
        assert!(!registry.add(id).await.unwrap());

        assert!(registry.remove(id).await.unwrap());
        assert!(registry.list_ids().await.unwrap().is_empty());
        assert_eq!(store.raw("users").unwrap(), r#"{"ids":[]}"#);
    }

    #[tokio::test]
    async fn duplicate_entries_are_listed_once_and_collapsed_on_write() {
        let (registry, store) = registry();
        let a = EntityId::new();
        let b = EntityId::new();
        let braced = format!("{{{a}}}");
        store.insert_raw(
            "users",
            format!(r#"{{"ids":["{a}","{b}","{a}","{braced}"]}}"#),
        );

        assert_eq!(registry.list_ids().await.unwrap(), vec![a, b]);

        let c = EntityId::new();
        registry.add(c).await.unwrap();
        assert_eq!(
            store.raw("users").unwrap(),
            format!(r#"{{"ids":["{a}","{b}","{c}"]}}"#)
        );
        assert!(registry.remove(a).await.unwrap());
        assert_eq!(registry.list_ids().await.unwrap(), vec![b, c]);
    }

    #[tokio::test]
    async fn transport_failure_is_an_error_not_empty() {
        let (registry, store) = registry();
        store.set_unreachable(true);
        assert!(registry.list_ids().await.unwrap_err().is_transport());
        assert!(registry.add(EntityId::new()).await.unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn interleaved_writers_lose_an_update() {
        // Both writers read the same prior state before either writes back.
        let (registry, _store) = registry();
        let a = EntityId::new();
        let b = EntityId::new();

        let mut first = registry.load().await.unwrap();
        let mut second = registry.load().await.unwrap();
        first.insert(a);
        second.insert(b);
        registry
            .connection
            .set(registry.key(), &first.to_document())
            .await
            .unwrap();
        registry
            .connection
            .set(registry.key(), &second.to_document())
            .await
            .unwrap();

        assert_eq!(registry.list_ids().await.unwrap(), vec![b]);
    }
}
