//! Knowledge base configuration loaded from `KNOWLEDGE_*` environment variables.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_SOURCE_PATH: &str = "data/allsee-database/Команда AllSee.team.md";
pub const DEFAULT_INDEX_DIR: &str = "data/rag-index";
pub const DEFAULT_COLLECTION: &str = "rag-index";
pub const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeConfig {
    /// Markdown document split into sections.
    pub source_path: PathBuf,
    /// Directory holding the index database (`index.sqlite3`).
    pub index_dir: PathBuf,
    /// Collection name; one index database may hold several.
    pub collection: String,
    /// Number of sections returned per query.
    pub top_k: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_SOURCE_PATH),
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            collection: DEFAULT_COLLECTION.to_string(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

impl KnowledgeConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let top_k = match non_empty("KNOWLEDGE_TOP_K") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .map_err(|e| anyhow::anyhow!("KNOWLEDGE_TOP_K must be a positive integer: {}", e))?,
            None => defaults.top_k,
        };
        Ok(Self {
            source_path: non_empty("KNOWLEDGE_SOURCE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.source_path),
            index_dir: non_empty("KNOWLEDGE_INDEX_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.index_dir),
            collection: non_empty("KNOWLEDGE_COLLECTION").unwrap_or(defaults.collection),
            top_k,
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.top_k == 0 {
            anyhow::bail!("KNOWLEDGE_TOP_K must be greater than zero");
        }
        if self.collection.trim().is_empty() {
            anyhow::bail!("KNOWLEDGE_COLLECTION must not be empty");
        }
        Ok(())
    }
}
