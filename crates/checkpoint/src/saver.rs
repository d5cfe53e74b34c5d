//! Checkpointer trait and the tagged store over its two implementations.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::error::{CheckpointError, Result};
use crate::postgres::PostgresSaver;
use crate::sqlite::SqliteSaver;
use crate::types::{Checkpoint, CheckpointMetadata};

/// Durable per-thread checkpoint storage.
///
/// The latest checkpoint of a thread is the one with the highest step. Writing an existing
/// `(thread_id, step)` fails with [`CheckpointError::Conflict`]; every call after
/// [`close`](Checkpointer::close) fails with [`CheckpointError::Closed`].
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Creates the `checkpoints` table if missing.
    async fn setup(&self) -> Result<()>;

    async fn put(&self, checkpoint: &Checkpoint) -> Result<()>;

    async fn get_latest(&self, thread_id: &str) -> Result<Option<Checkpoint>>;

    /// History of a thread, newest first. `limit` of `None` returns all.
    async fn list(&self, thread_id: &str, limit: Option<usize>)
        -> Result<Vec<CheckpointMetadata>>;

    /// All threads with at least one checkpoint, sorted.
    async fn list_thread_ids(&self) -> Result<Vec<String>>;

    /// Closes the connection pool. Idempotent.
    async fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Checkpoint store backend selected by `CHECKPOINT_STORE_KIND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointStoreKind {
    Sqlite,
    Postgres,
}

impl CheckpointStoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointStoreKind::Sqlite => "sqlite",
            CheckpointStoreKind::Postgres => "postgres",
        }
    }
}

impl fmt::Display for CheckpointStoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckpointStoreKind {
    type Err = CheckpointError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(CheckpointStoreKind::Sqlite),
            "postgres" | "postgresql" => Ok(CheckpointStoreKind::Postgres),
            other => Err(CheckpointError::UnsupportedKind(other.to_string())),
        }
    }
}

/// One connected store of either kind. Implements [`Checkpointer`] by delegation.
#[derive(Debug, Clone)]
pub enum CheckpointStore {
    Sqlite(SqliteSaver),
    Postgres(PostgresSaver),
}

impl CheckpointStore {
    /// Opens a pool of `kind` at `uri` (a file path or `sqlite:` URL for SQLite, a
    /// `postgres://` URL for PostgreSQL). Does not create the table; call `setup`.
    pub async fn connect(kind: CheckpointStoreKind, uri: &str, max_connections: u32) -> Result<Self> {
        match kind {
            CheckpointStoreKind::Sqlite => Ok(CheckpointStore::Sqlite(
                SqliteSaver::connect(uri, max_connections).await?,
            )),
            CheckpointStoreKind::Postgres => Ok(CheckpointStore::Postgres(
                PostgresSaver::connect(uri, max_connections).await?,
            )),
        }
    }

    pub fn kind(&self) -> CheckpointStoreKind {
        match self {
            CheckpointStore::Sqlite(_) => CheckpointStoreKind::Sqlite,
            CheckpointStore::Postgres(_) => CheckpointStoreKind::Postgres,
        }
    }

    fn inner(&self) -> &dyn Checkpointer {
        match self {
            CheckpointStore::Sqlite(s) => s as &dyn Checkpointer,
            CheckpointStore::Postgres(p) => p as &dyn Checkpointer,
        }
    }
}

#[async_trait]
impl Checkpointer for CheckpointStore {
    async fn setup(&self) -> Result<()> {
        self.inner().setup().await
    }

    async fn put(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.inner().put(checkpoint).await
    }

    async fn get_latest(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        self.inner().get_latest(thread_id).await
    }

    async fn list(
        &self,
        thread_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointMetadata>> {
        self.inner().list(thread_id, limit).await
    }

    async fn list_thread_ids(&self) -> Result<Vec<String>> {
        self.inner().list_thread_ids().await
    }

    async fn close(&self) {
        self.inner().close().await
    }

    fn is_closed(&self) -> bool {
        self.inner().is_closed()
    }
}
