//! Persisted vector index over knowledge sections.
//!
//! The index lives in `<index_dir>/index.sqlite3`. Embeddings are stored as little-endian `f32`
//! blobs and ranked in memory by cosine similarity; the knowledge document is small enough that
//! a full scan per query is fine.
//!
//! ```sql
//! CREATE TABLE sections (
//!     id INTEGER PRIMARY KEY,
//!     collection TEXT NOT NULL,
//!     position INTEGER NOT NULL,
//!     header TEXT NOT NULL,
//!     content TEXT NOT NULL,
//!     embedding BLOB NOT NULL
//! );
//! ```

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use embedding::EmbeddingService;
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use tracing::{debug, info};

use crate::config::KnowledgeConfig;
use crate::error::{KnowledgeError, Result};
use crate::splitter::{split_and_filter, Section};

/// File whose presence marks an existing index directory.
pub const INDEX_MARKER_FILE: &str = "index.sqlite3";

const EMBED_CHUNK: usize = 64;

/// A stored section with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSection {
    pub position: i64,
    pub header: String,
    pub text: String,
    pub score: f32,
}

/// Cosine similarity; empty or zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn encode_embedding(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// True when `index_dir` already holds an index database.
pub fn index_exists(index_dir: &Path) -> bool {
    index_dir.join(INDEX_MARKER_FILE).is_file()
}

/// Sections of one collection plus the embedder used for queries.
#[derive(Clone)]
pub struct KnowledgeIndex {
    pool: SqlitePool,
    collection: String,
    embedder: Arc<dyn EmbeddingService>,
}

impl std::fmt::Debug for KnowledgeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeIndex")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl KnowledgeIndex {
    /// Opens (creating if missing) the index database in `index_dir`.
    pub async fn open(
        index_dir: &Path,
        collection: impl Into<String>,
        embedder: Arc<dyn EmbeddingService>,
    ) -> Result<Self> {
        tokio::fs::create_dir_all(index_dir).await?;
        let options = SqliteConnectOptions::new()
            .filename(index_dir.join(INDEX_MARKER_FILE))
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sections (
                id INTEGER PRIMARY KEY,
                collection TEXT NOT NULL,
                position INTEGER NOT NULL,
                header TEXT NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_sections_collection ON sections(collection, position)",
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            pool,
            collection: collection.into(),
            embedder,
        })
    }

    /// Reuses a non-empty persisted collection, otherwise builds it from `config.source_path`.
    ///
    /// A missing source is an error only when a build is needed.
    pub async fn open_or_build(
        config: &KnowledgeConfig,
        embedder: Arc<dyn EmbeddingService>,
    ) -> Result<Self> {
        let existed = index_exists(&config.index_dir);
        let index = Self::open(&config.index_dir, config.collection.clone(), embedder).await?;
        if existed {
            let count = index.count().await?;
            if count > 0 {
                info!(
                    collection = %config.collection,
                    sections = count,
                    "Reusing persisted knowledge index"
                );
                return Ok(index);
            }
            info!(collection = %config.collection, "Persisted knowledge index is empty, rebuilding");
        }
        index.rebuild_from_source(&config.source_path).await?;
        Ok(index)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Number of sections stored for this collection.
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM sections WHERE collection = ?1")
            .bind(&self.collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    /// Reads and splits `source`, then replaces the collection. Returns the section count.
    pub async fn rebuild_from_source(&self, source: &Path) -> Result<usize> {
        let markdown = read_source(source).await?;
        let sections = split_and_filter(&markdown);
        info!(
            source = %source.display(),
            sections = sections.len(),
            "Building knowledge index"
        );
        self.rebuild(&sections).await
    }

    /// Embeds `sections` and replaces the collection's rows in one transaction.
    pub async fn rebuild(&self, sections: &[Section]) -> Result<usize> {
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(sections.len());
        for chunk in sections.chunks(EMBED_CHUNK) {
            let texts: Vec<String> = chunk.iter().map(|s| s.text.clone()).collect();
            let batch = self
                .embedder
                .embed_batch(&texts)
                .await
                .map_err(KnowledgeError::embedding)?;
            if batch.len() != texts.len() {
                return Err(KnowledgeError::Embedding(format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    batch.len()
                )));
            }
            vectors.extend(batch);
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM sections WHERE collection = ?1")
            .bind(&self.collection)
            .execute(&mut *tx)
            .await?;
        for (position, (section, vector)) in sections.iter().zip(vectors.iter()).enumerate() {
            sqlx::query(
                "INSERT INTO sections (collection, position, header, content, embedding) VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&self.collection)
            .bind(position as i64)
            .bind(&section.header)
            .bind(&section.text)
            .bind(encode_embedding(vector))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!(collection = %self.collection, sections = sections.len(), "Knowledge index rebuilt");
        Ok(sections.len())
    }

    /// Returns the `k` sections most similar to `query`, best first; ties keep source order.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredSection>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(
            "SELECT position, header, content, embedding FROM sections WHERE collection = ?1 ORDER BY position",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(query)
            .await
            .map_err(KnowledgeError::embedding)?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in rows {
            let blob: Vec<u8> = row.try_get("embedding")?;
            scored.push(ScoredSection {
                position: row.try_get("position")?,
                header: row.try_get("header")?,
                text: row.try_get("content")?,
                score: cosine_similarity(&query_vector, &decode_embedding(&blob)),
            });
        }
        // Stable sort keeps source order among equal scores.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        debug!(query_len = query.len(), hits = scored.len(), "Knowledge search done");
        Ok(scored)
    }

    /// Closes the underlying pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn read_source(source: &Path) -> Result<String> {
    match tokio::fs::read_to_string(source).await {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(KnowledgeError::SourceMissing(PathBuf::from(source)))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn embedding_blob_is_little_endian_f32() {
        let v = vec![1.5f32, -2.0, 0.25];
        let blob = encode_embedding(&v);
        assert_eq!(blob.len(), 12);
        assert_eq!(&blob[0..4], &1.5f32.to_le_bytes());
        assert_eq!(decode_embedding(&blob), v);
    }
}
