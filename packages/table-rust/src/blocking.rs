//! Blocking façade over the async tables and values.
//!
//! Each blocking method drives the matching async operation to completion on
//! a [`BlockingRuntime`], so the two forms share one implementation and one
//! set of guarantees: one request per store call, no retries.
//!
//! # Panics
//!
//! Blocking methods must not be called from within an async runtime; tokio
//! panics if `block_on` is nested inside another runtime.

use std::sync::Arc;

use docstore_core::{Codec, EntityId, ValueCodec};
use tokio::runtime::{Builder, Runtime};

use crate::error::StoreResult;
use crate::table::{Enumeration, ForEachSummary, Table};
use crate::value::StoreValue;

/// Shared runtime that drives blocking calls. Cheap to clone.
#[derive(Clone)]
pub struct BlockingRuntime {
    runtime: Arc<Runtime>,
}

impl BlockingRuntime {
    /// Builds a single-threaded runtime with timers enabled.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the runtime cannot be created.
    pub fn new() -> std::io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_time().build()?;
        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }

    /// Wraps an existing runtime.
    #[must_use]
    pub fn from_runtime(runtime: Arc<Runtime>) -> Self {
        Self { runtime }
    }

    #[must_use]
    pub fn table<C: Codec>(&self, table: Table<C>) -> BlockingTable<C> {
        BlockingTable {
            inner: table,
            runtime: self.clone(),
        }
    }

    #[must_use]
    pub fn value<C: ValueCodec>(&self, value: StoreValue<C>) -> BlockingValue<C> {
        BlockingValue {
            inner: value,
            runtime: self.clone(),
        }
    }

    fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }
}

impl std::fmt::Debug for BlockingRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingRuntime").finish_non_exhaustive()
    }
}

/// Blocking twin of [`Table`].
#[derive(Debug)]
pub struct BlockingTable<C: Codec> {
    inner: Table<C>,
    runtime: BlockingRuntime,
}

impl<C: Codec> BlockingTable<C> {
    /// The async table this façade drives.
    #[must_use]
    pub fn inner(&self) -> &Table<C> {
        &self.inner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// # Errors
    ///
    /// See [`Table::get_all_ids`].
    pub fn get_all_ids(&self) -> StoreResult<Vec<EntityId>> {
        self.runtime.block_on(self.inner.get_all_ids())
    }

    /// # Errors
    ///
    /// See [`Table::contains`].
    pub fn contains(&self, id: EntityId) -> StoreResult<bool> {
        self.runtime.block_on(self.inner.contains(id))
    }

    /// # Errors
    ///
    /// See [`Table::get_all`].
    pub fn get_all(&self) -> StoreResult<Enumeration<C::Entity>> {
        self.runtime.block_on(self.inner.get_all())
    }

    /// Invokes `callback` for each listed entity, one fetch at a time, in
    /// registry order.
    ///
    /// # Errors
    ///
    /// Only a failure reading the registry fails the call.
    pub fn for_each<F>(&self, mut callback: F) -> StoreResult<ForEachSummary>
    where
        F: FnMut(C::Entity),
    {
        let ids = self.get_all_ids()?;
        let mut summary = ForEachSummary::default();
        for id in ids {
            match self.get_entry(id) {
                Ok(entity) => {
                    summary.delivered += 1;
                    callback(entity);
                }
                Err(err) => {
                    self.inner.log_skip(id, &err);
                    summary.skipped += 1;
                }
            }
        }
        Ok(summary)
    }

    /// # Errors
    ///
    /// See [`Table::query`].
    pub fn query<P>(&self, predicate: P) -> StoreResult<Enumeration<C::Entity>>
    where
        P: FnMut(&C::Entity) -> bool,
    {
        self.runtime.block_on(self.inner.query(predicate))
    }

    /// # Errors
    ///
    /// See [`Table::get_entry`].
    pub fn get_entry(&self, id: EntityId) -> StoreResult<C::Entity> {
        self.runtime.block_on(self.inner.get_entry(id))
    }

    /// # Errors
    ///
    /// See [`Table::insert_or_update`].
    pub fn insert_or_update(&self, entity: &C::Entity) -> StoreResult<()> {
        self.runtime.block_on(self.inner.insert_or_update(entity))
    }

    /// # Errors
    ///
    /// See [`Table::remove`].
    pub fn remove(&self, id: EntityId) -> StoreResult<()> {
        self.runtime.block_on(self.inner.remove(id))
    }

    /// # Errors
    ///
    /// See [`Table::remove_entity`].
    pub fn remove_entity(&self, entity: &C::Entity) -> StoreResult<()> {
        self.runtime.block_on(self.inner.remove_entity(entity))
    }
}

/// Blocking twin of [`StoreValue`].
pub struct BlockingValue<C: ValueCodec> {
    inner: StoreValue<C>,
    runtime: BlockingRuntime,
}

impl<C: ValueCodec> BlockingValue<C> {
    #[must_use]
    pub fn key(&self) -> &str {
        self.inner.key()
    }

    #[must_use]
    pub fn get(&self) -> C::Value {
        self.runtime.block_on(self.inner.get())
    }

    /// # Errors
    ///
    /// See [`StoreValue::try_get`].
    pub fn try_get(&self) -> StoreResult<C::Value> {
        self.runtime.block_on(self.inner.try_get())
    }

    /// # Errors
    ///
    /// See [`StoreValue::set`].
    pub fn set(&self, value: &C::Value) -> StoreResult<()> {
        self.runtime.block_on(self.inner.set(value))
    }

    /// # Errors
    ///
    /// See [`StoreValue::delete`].
    pub fn delete(&self) -> StoreResult<()> {
        self.runtime.block_on(self.inner.delete())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::connection::StoreConnection;
    use crate::table::tests::{User, UserCodec};
    use crate::value::{IntValue, StringValue};

    fn users() -> (BlockingTable<UserCodec>, Arc<crate::store::MemoryStore>) {
        let (conn, store) = StoreConnection::memory();
        let runtime = BlockingRuntime::new().unwrap();
        (runtime.table(Table::new("users", conn, UserCodec)), store)
    }

    #[test]
    fn users_scenario_blocking() {
        let (table, _store) = users();
        let ann = User::new("Ann");
        let bo = User::new("Bo");

        table.insert_or_update(&ann).unwrap();
        table.insert_or_update(&bo).unwrap();
        let ids: HashSet<_> = table.get_all_ids().unwrap().into_iter().collect();
        assert_eq!(ids, HashSet::from([ann.id, bo.id]));
        assert_eq!(table.get_entry(ann.id).unwrap().name, "Ann");

        table.remove_entity(&ann).unwrap();
        assert_eq!(table.get_all_ids().unwrap(), vec![bo.id]);
        assert!(table.get_entry(ann.id).unwrap_err().is_not_found());
        assert!(!table.contains(ann.id).unwrap());
    }

    #[test]
    fn blocking_for_each_follows_registry_order_and_skips_ghosts() {
        let (table, store) = users();
        let names = ["a", "b", "c", "d"];
        let mut inserted = Vec::new();
        for name in names {
            let user = User::new(name);
            table.insert_or_update(&user).unwrap();
            inserted.push(user);
        }
        store.remove_raw(&table.inner().entry_key(inserted[1].id));

        let mut seen = Vec::new();
        let summary = table.for_each(|u| seen.push(u.name)).unwrap();
        assert_eq!(seen, vec!["a", "c", "d"]);
        assert_eq!(summary, ForEachSummary { delivered: 3, skipped: 1 });

        let all = table.get_all().unwrap();
        assert_eq!(all.entries.len(), 3);
        assert_eq!(all.skipped, vec![inserted[1].id]);
    }

    #[test]
    fn blocking_query_matches_async_semantics() {
        let (table, _store) = users();
        for name in ["Ann", "Bo", "Al"] {
            table.insert_or_update(&User::new(name)).unwrap();
        }
        let found = table.query(|u| u.name.len() == 2).unwrap();
        let names: Vec<_> = found.entries.into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Bo", "Al"]);
    }

    #[test]
    fn blocking_errors_surface_once() {
        let (table, store) = users();
        store.set_unreachable(true);
        assert!(table.get_all_ids().unwrap_err().is_transport());
        assert!(table.insert_or_update(&User::new("Ann")).unwrap_err().is_transport());
        assert_eq!(store.request_count(), 2);
    }

    #[test]
    fn runtime_is_shared_between_tables_and_values() {
        let (conn, _store) = StoreConnection::memory();
        let runtime = BlockingRuntime::new().unwrap();
        let table = runtime.table(Table::new("users", conn.clone(), UserCodec));
        let visits = runtime.value(IntValue::new("visits", 0, conn.clone()));
        let motd = runtime.value(StringValue::new("motd", "hi".to_string(), conn));

        table.insert_or_update(&User::new("Ann")).unwrap();
        assert_eq!(visits.get(), 0);
        visits.set(&3).unwrap();
        assert_eq!(visits.try_get().unwrap(), 3);
        visits.delete().unwrap();
        assert!(visits.try_get().unwrap_err().is_not_found());
        assert_eq!(motd.get(), "hi");
        assert_eq!(motd.key(), "motd");
        assert_eq!(table.get_all().unwrap().entries.len(), 1);
    }
}
