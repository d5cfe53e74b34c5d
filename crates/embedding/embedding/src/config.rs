//! Embedding configuration: trait and env-based implementation.
//!
//! Variables: `EMBEDDER_API_KEY` (falls back to `OPENAI_API_KEY`), `EMBEDDER_BASE_URL`,
//! `EMBEDDER_MODEL`.

use anyhow::Result;
use std::env;

/// Model used when `EMBEDDER_MODEL` is unset.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Embedding service configuration interface.
pub trait EmbeddingConfig: Send + Sync {
    fn api_key(&self) -> &str;
    /// Optional base URL of an OpenAI-compatible endpoint. `None` means the official API.
    fn base_url(&self) -> Option<&str>;
    fn model(&self) -> &str;
}

/// Embedding config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvEmbeddingConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
}

impl EmbeddingConfig for EnvEmbeddingConfig {
    fn api_key(&self) -> &str {
        &self.api_key
    }
    fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref().filter(|s| !s.is_empty())
    }
    fn model(&self) -> &str {
        &self.model
    }
}

impl EnvEmbeddingConfig {
    /// Load from environment variables. Missing values become empty/defaults; call
    /// [`validate`](Self::validate) to enforce the required key.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("EMBEDDER_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .unwrap_or_default();
        let base_url = env::var("EMBEDDER_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let model = env::var("EMBEDDER_MODEL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
        Ok(Self {
            api_key,
            base_url,
            model,
        })
    }

    /// Validate config: an API key is required.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("EMBEDDER_API_KEY (or OPENAI_API_KEY) must be set");
        }
        Ok(())
    }
}
