//! Registry-backed entity table.
//!
//! A [`Table`] keeps two independently stored pieces of state coherent: the
//! table's [`Registry`] and one document per entity, stored under
//! `"<table>:<id>"`. The store offers no multi-key atomicity, so the protocol
//! fixes an order instead:
//!
//! - insert/update writes the registry first, then the entity document. A
//!   failure in between leaves a ghost ID (listed, no document).
//! - remove rewrites the registry first, then deletes the document. A failure
//!   in between leaves an orphan document that enumeration can no longer reach.
//!
//! Enumeration tolerates ghosts: entities whose fetch fails are skipped and
//! counted in the result rather than failing the whole call.

use futures_util::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, warn};

use docstore_core::{Codec, Entity, EntityId};

use crate::connection::StoreConnection;
use crate::error::{StoreError, StoreResult};
use crate::registry::Registry;

/// Best-effort enumeration result.
#[derive(Debug, Clone, PartialEq)]
pub struct Enumeration<T> {
    /// Successfully decoded entities.
    pub entries: Vec<T>,
    /// Registry IDs whose document could not be fetched or decoded.
    pub skipped: Vec<EntityId>,
}

impl<T> Enumeration<T> {
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// True when every listed ID produced an entity.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Outcome of [`Table::for_each`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForEachSummary {
    /// Number of times the callback was invoked.
    pub delivered: usize,
    /// Number of registry IDs whose document could not be fetched or decoded.
    pub skipped: usize,
}

/// A named table of entities over a [`StoreConnection`].
///
/// Holds no cache: every read reflects the store at call time. All operations
/// are async; see [`BlockingTable`](crate::blocking::BlockingTable) for the
/// blocking twins.
pub struct Table<C: Codec> {
    name: String,
    registry: Registry,
    connection: StoreConnection,
    codec: C,
}

impl<C: Codec> Table<C> {
    /// Creates a table named `name`. The name is also the registry's key.
    #[must_use]
    pub fn new(name: impl Into<String>, connection: StoreConnection, codec: C) -> Self {
        let name = name.into();
        Self {
            registry: Registry::new(name.clone(), connection.clone()),
            name,
            connection,
            codec,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn codec(&self) -> &C {
        &self.codec
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Store key of the document for `id`.
    #[must_use]
    pub fn entry_key(&self, id: EntityId) -> String {
        format!("{}:{id}", self.name)
    }

    /// IDs currently listed in the registry.
    ///
    /// Every returned ID is well-formed, but may be a ghost with no document.
    ///
    /// # Errors
    ///
    /// Transport failures reading the registry.
    pub async fn get_all_ids(&self) -> StoreResult<Vec<EntityId>> {
        self.registry.list_ids().await
    }

    /// Whether `id` is listed in the registry.
    ///
    /// # Errors
    ///
    /// Transport failures reading the registry.
    pub async fn contains(&self, id: EntityId) -> StoreResult<bool> {
        self.registry.contains(id).await
    }

    /// Fetches every listed entity, concurrently, in registry order.
    ///
    /// # Errors
    ///
    /// Only a failure reading the registry fails the call. Per-entity failures
    /// are logged and reported in [`Enumeration::skipped`].
    pub async fn get_all(&self) -> StoreResult<Enumeration<C::Entity>> {
        let ids = self.get_all_ids().await?;
        let fetched =
            futures_util::future::join_all(ids.iter().map(|id| self.get_entry(*id))).await;

        let mut enumeration = Enumeration {
            entries: Vec::with_capacity(ids.len()),
            skipped: Vec::new(),
        };
        for (id, result) in ids.into_iter().zip(fetched) {
            match result {
                Ok(entity) => enumeration.entries.push(entity),
                Err(err) => {
                    self.log_skip(id, &err);
                    enumeration.skipped.push(id);
                }
            }
        }
        Ok(enumeration)
    }

    /// Invokes `callback` for each listed entity as its fetch completes.
    ///
    /// Fetches are issued concurrently, so callbacks fire in completion order,
    /// not registry order.
    ///
    /// # Errors
    ///
    /// Only a failure reading the registry fails the call.
    pub async fn for_each<F>(&self, mut callback: F) -> StoreResult<ForEachSummary>
    where
        F: FnMut(C::Entity),
    {
        let ids = self.get_all_ids().await?;
        let mut pending: FuturesUnordered<_> = ids
            .into_iter()
            .map(|id| async move { (id, self.get_entry(id).await) })
            .collect();

        let mut summary = ForEachSummary::default();
        while let Some((id, result)) = pending.next().await {
            match result {
                Ok(entity) => {
                    summary.delivered += 1;
                    callback(entity);
                }
                Err(err) => {
                    self.log_skip(id, &err);
                    summary.skipped += 1;
                }
            }
        }
        Ok(summary)
    }

    /// [`get_all`](Self::get_all) followed by a filter. Skipped IDs carry over.
    ///
    /// # Errors
    ///
    /// Only a failure reading the registry fails the call.
    pub async fn query<P>(&self, mut predicate: P) -> StoreResult<Enumeration<C::Entity>>
    where
        P: FnMut(&C::Entity) -> bool,
    {
        let mut enumeration = self.get_all().await?;
        enumeration.entries.retain(|entity| predicate(entity));
        Ok(enumeration)
    }

    /// Fetches and decodes the entity stored for `id`.
    ///
    /// The registry is not consulted: a listed ghost reports not-found, and an
    /// orphan document is still readable by ID.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if there is no document, [`StoreError::Decode`]
    /// if it cannot be decoded into an entity, or a transport error.
    pub async fn get_entry(&self, id: EntityId) -> StoreResult<C::Entity> {
        let key = self.entry_key(id);
        let document = self.connection.get(&key).await?;
        self.codec
            .decode(id, &document)
            .map_err(|source| StoreError::Decode { key, source })
    }

    /// Lists the entity in the registry, then writes its document.
    ///
    /// Calling this twice with the same entity leaves the same end state as
    /// calling it once.
    ///
    /// # Errors
    ///
    /// A registry failure aborts before the document is written. A document
    /// failure after a successful registry write leaves a ghost ID.
    pub async fn insert_or_update(&self, entity: &C::Entity) -> StoreResult<()> {
        let id = entity.id();
        self.registry.add(id).await?;
        let document = self.codec.encode(entity);
        self.connection.set(&self.entry_key(id), &document).await?;
        debug!(table = %self.name, %id, "entry written");
        Ok(())
    }

    /// Unlists `id` from the registry, then deletes its document.
    ///
    /// Removing an ID that was never inserted succeeds.
    ///
    /// # Errors
    ///
    /// A registry failure aborts before the document is deleted. A delete
    /// failure after a successful registry write leaves an orphan document.
    pub async fn remove(&self, id: EntityId) -> StoreResult<()> {
        self.registry.remove(id).await?;
        self.connection.delete(&self.entry_key(id)).await?;
        debug!(table = %self.name, %id, "entry removed");
        Ok(())
    }

    /// [`remove`](Self::remove) by the entity's own ID.
    ///
    /// # Errors
    ///
    /// Same as [`remove`](Self::remove).
    pub async fn remove_entity(&self, entity: &C::Entity) -> StoreResult<()> {
        self.remove(entity.id()).await
    }

    pub(crate) fn log_skip(&self, id: EntityId, err: &StoreError) {
        warn!(table = %self.name, %id, error = %err, "skipping entry during enumeration");
    }
}

impl<C: Codec> std::fmt::Debug for Table<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}
