//! # OpenAI Embedding Service
//!
//! [`EmbeddingService`] backed by the OpenAI embeddings API, or any OpenAI-compatible endpoint
//! when a base URL is configured.
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedding::{EmbeddingService, EnvEmbeddingConfig};
//! use openai_embedding::OpenAIEmbedding;
//!
//! async fn example() -> Result<(), anyhow::Error> {
//!     let config = EnvEmbeddingConfig::from_env()?;
//!     config.validate()?;
//!     let service = OpenAIEmbedding::from_config(&config);
//!     let vector = service.embed("Кто мы?").await?;
//!     println!("dimension: {}", vector.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Timeouts
//!
//! A single `embed` call is bounded by 30 seconds and `embed_batch` by 60 seconds. These are the
//! only request timeouts in the bot.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::{CreateEmbeddingRequestArgs, EmbeddingInput},
    Client,
};
use async_trait::async_trait;
use embedding::{EmbeddingConfig, EmbeddingService, DEFAULT_EMBEDDING_MODEL};
use tracing::{debug, info, instrument, warn};

const EMBED_TIMEOUT: Duration = Duration::from_secs(30);
const EMBED_BATCH_TIMEOUT: Duration = Duration::from_secs(60);

/// OpenAI embedding service. Holds the async-openai client and model name.
#[derive(Debug, Clone)]
pub struct OpenAIEmbedding {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIEmbedding {
    /// Creates a service for `model`. When `base_url` is `Some` and non-empty, requests go to that
    /// OpenAI-compatible endpoint instead of the official API.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: Option<&str>) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(api_key.into());
        if let Some(url) = base_url.filter(|s| !s.is_empty()) {
            openai_config = openai_config.with_api_base(url);
        }
        Self {
            client: Client::with_config(openai_config),
            model: model.into(),
        }
    }

    /// Creates a service with the default model against the official API.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::new(api_key, DEFAULT_EMBEDDING_MODEL, None)
    }

    /// Creates a service from any [`EmbeddingConfig`] (key, base URL and model).
    pub fn from_config(config: &dyn EmbeddingConfig) -> Self {
        Self::new(config.api_key(), config.model(), config.base_url())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends one embeddings request bounded by `timeout` and returns the vectors in input order.
    async fn request(
        &self,
        input: EmbeddingInput,
        expected: usize,
        timeout: Duration,
    ) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(self.model.clone())
            .input(input)
            .build()?;

        let embeddings = self.client.embeddings();
        let response = match tokio::time::timeout(timeout, embeddings.create(request)).await {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => {
                warn!(error = %e, "embedding request failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "embedding request timed out");
                anyhow::bail!(
                    "embedding request timed out after {} seconds",
                    timeout.as_secs()
                );
            }
        };

        let mut data = response.data;
        data.sort_by_key(|item| item.index);
        let vectors: Vec<Vec<f32>> = data.into_iter().map(|item| item.embedding).collect();
        if vectors.len() != expected {
            warn!(expected, got = vectors.len(), "embedding response count mismatch");
            anyhow::bail!("Expected {} embeddings, got {}", expected, vectors.len());
        }
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingService for OpenAIEmbedding {
    #[instrument(skip(self, text), fields(model = %self.model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        debug!("embed request");
        let mut vectors = self
            .request(EmbeddingInput::String(text.to_string()), 1, EMBED_TIMEOUT)
            .await?;
        let vector = vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("No embedding in response"))?;
        debug!(dimension = vector.len(), "embed done");
        Ok(vector)
    }

    #[instrument(skip(self, texts), fields(model = %self.model, batch_size = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let vectors = self
            .request(
                EmbeddingInput::StringArray(texts.to_vec()),
                texts.len(),
                EMBED_BATCH_TIMEOUT,
            )
            .await?;
        info!(
            count = vectors.len(),
            dimension = vectors.first().map(|v| v.len()).unwrap_or(0),
            "embed_batch done"
        );
        Ok(vectors)
    }
}
