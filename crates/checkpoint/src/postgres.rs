//! PostgreSQL checkpoint saver. Same table shape as the SQLite saver, with `TIMESTAMPTZ`
//! creation times.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Row,
};
use tracing::{debug, info};

use crate::error::{CheckpointError, Result};
use crate::saver::Checkpointer;
use crate::types::{Checkpoint, CheckpointMetadata, CheckpointSource};

/// Checkpointer on a sqlx [`PgPool`].
#[derive(Debug, Clone)]
pub struct PostgresSaver {
    pool: PgPool,
}

impl PostgresSaver {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await?;
        info!("PostgreSQL checkpoint store connected");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn ensure_open(&self) -> Result<()> {
        if self.pool.is_closed() {
            return Err(CheckpointError::Closed);
        }
        Ok(())
    }
}

fn row_to_metadata(row: &PgRow) -> Result<CheckpointMetadata> {
    let source: String = row.try_get("source")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    Ok(CheckpointMetadata {
        thread_id: row.try_get("thread_id")?,
        step: row.try_get("step")?,
        source: CheckpointSource::from_str(&source)
            .map_err(|e| CheckpointError::Database(sqlx::Error::Decode(e.into())))?,
        created_at,
    })
}

#[async_trait]
impl Checkpointer for PostgresSaver {
    async fn setup(&self) -> Result<()> {
        self.ensure_open()?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                thread_id TEXT NOT NULL,
                step BIGINT NOT NULL,
                source TEXT NOT NULL,
                state TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (thread_id, step)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn put(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.ensure_open()?;
        let state = serde_json::to_string(&checkpoint.state)?;
        sqlx::query(
            "INSERT INTO checkpoints (thread_id, step, source, state, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&checkpoint.thread_id)
        .bind(checkpoint.step)
        .bind(checkpoint.source.as_str())
        .bind(state)
        .bind(checkpoint.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CheckpointError::from_insert(e, &checkpoint.thread_id, checkpoint.step))?;
        debug!(
            thread_id = %checkpoint.thread_id,
            step = checkpoint.step,
            source = %checkpoint.source,
            "checkpoint stored"
        );
        Ok(())
    }

    async fn get_latest(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        self.ensure_open()?;
        let row = sqlx::query(
            "SELECT thread_id, step, source, state, created_at FROM checkpoints WHERE thread_id = $1 ORDER BY step DESC LIMIT 1",
        )
        .bind(thread_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let meta = row_to_metadata(&row)?;
        let state: String = row.try_get("state")?;
        Ok(Some(Checkpoint {
            thread_id: meta.thread_id,
            step: meta.step,
            source: meta.source,
            state: serde_json::from_str(&state)?,
            created_at: meta.created_at,
        }))
    }

    async fn list(
        &self,
        thread_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointMetadata>> {
        self.ensure_open()?;
        let rows = sqlx::query(
            "SELECT thread_id, step, source, created_at FROM checkpoints WHERE thread_id = $1 ORDER BY step DESC LIMIT $2",
        )
        .bind(thread_id)
        .bind(limit.map(|l| l as i64))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_metadata).collect()
    }

    async fn list_thread_ids(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        let rows = sqlx::query("SELECT DISTINCT thread_id FROM checkpoints ORDER BY thread_id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| r.try_get::<String, _>("thread_id").map_err(Into::into))
            .collect()
    }

    async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            info!("PostgreSQL checkpoint store closed");
        }
    }

    fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
