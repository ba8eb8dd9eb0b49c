//! Walks a small "users" table through the async and blocking APIs against an
//! in-memory store.
//!
//! ```text
//! RUST_LOG=debug docstore-demo --timeout-ms 250
//! ```

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use docstore_core::{Codec, Document, DocumentError, Entity, EntityId};
use docstore_table::{BlockingRuntime, StoreConfig, StoreConnection, Table};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "docstore-demo", about = "Exercise a registry-backed table")]
struct Args {
    /// Per-request timeout applied by the connection.
    #[arg(long, env = "DOCSTORE_TIMEOUT_MS", default_value_t = 5000)]
    timeout_ms: u64,
}

impl From<Args> for StoreConfig {
    fn from(args: Args) -> Self {
        Self::with_timeout(Duration::from_millis(args.timeout_ms))
    }
}

#[derive(Debug, Clone)]
struct User {
    id: EntityId,
    name: String,
}

impl User {
    fn new(name: &str) -> Self {
        Self {
            id: EntityId::new(),
            name: name.to_string(),
        }
    }
}

impl Entity for User {
    fn id(&self) -> EntityId {
        self.id
    }
}

struct UserCodec;

impl Codec for UserCodec {
    type Entity = User;

    fn encode(&self, user: &User) -> Document {
        Document::new().with("name", user.name.as_str())
    }

    fn decode(&self, id: EntityId, document: &Document) -> Result<User, DocumentError> {
        Ok(User {
            id,
            name: document.get_str("name")?.to_string(),
        })
    }
}

async fn run_async(table: &Table<UserCodec>) -> anyhow::Result<()> {
    let ann = User::new("Ann");
    let bo = User::new("Bo");
    table.insert_or_update(&ann).await?;
    table.insert_or_update(&bo).await?;

    let ids = table.get_all_ids().await?;
    info!(count = ids.len(), "registry after inserts");

    let found = table.get_entry(ann.id).await?;
    info!(id = %found.id, name = %found.name, "looked up entry");

    table.remove_entity(&ann).await?;
    let remaining = table.get_all().await?;
    info!(
        entries = remaining.entries.len(),
        skipped = remaining.skipped_count(),
        "enumeration after removal"
    );
    if let Err(err) = table.get_entry(ann.id).await {
        info!(%err, "removed entry is gone");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = StoreConfig::from(Args::parse());
    let (connection, _store) = StoreConnection::memory_with_config(config);

    let runtime = BlockingRuntime::new().context("failed to build runtime")?;
    let table = runtime.table(Table::new("users", connection.clone(), UserCodec));

    let async_runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to build runtime")?;
    async_runtime.block_on(run_async(table.inner()))?;

    let carol = User::new("Carol");
    table.insert_or_update(&carol)?;
    let summary = table.for_each(|user| info!(id = %user.id, name = %user.name, "visited"))?;
    info!(
        delivered = summary.delivered,
        skipped = summary.skipped,
        "blocking walk done"
    );

    async_runtime.block_on(connection.close())?;
    Ok(())
}
