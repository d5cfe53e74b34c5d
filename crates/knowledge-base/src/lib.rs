//! # Knowledge base
//!
//! Retrieval over the company markdown document:
//!
//! - [`splitter`]: splits the document into level-1 header sections and drops blank ones.
//! - [`KnowledgeIndex`]: persists section embeddings in a local SQLite index and answers top-k
//!   cosine similarity queries.
//! - [`KnowledgeConfig`]: `KNOWLEDGE_*` environment configuration.
//!
//! On startup [`KnowledgeIndex::open_or_build`] reuses a non-empty persisted collection and
//! rebuilds it from the source document otherwise.

mod config;
mod error;
mod index;
pub mod splitter;

pub use config::{
    KnowledgeConfig, DEFAULT_COLLECTION, DEFAULT_INDEX_DIR, DEFAULT_SOURCE_PATH, DEFAULT_TOP_K,
};
pub use error::{KnowledgeError, Result};
pub use index::{cosine_similarity, index_exists, KnowledgeIndex, ScoredSection, INDEX_MARKER_FILE};
pub use splitter::{split_and_filter, split_sections, Section};
