//! Chat model abstraction used by the manager agent.
//!
//! [`ChatModel`] is object-safe so tests can substitute a scripted model; [`OpenAIChatModel`]
//! forwards to [`openai_client::OpenAIClient`].

use anyhow::Result;
use async_trait::async_trait;
use openai_client::{to_openai_messages, to_openai_tool, OpenAIClient};
use prompt::{ChatMessage, ToolSpec};
use tracing::instrument;

use crate::config::LlmConfig;

/// An LLM with tool calling. Returns one assistant message, possibly carrying tool calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// `messages` already starts with the system prompt. `tools` may be empty, in which case the
    /// model must answer in text.
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ChatMessage>;
}

/// [`ChatModel`] backed by an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct OpenAIChatModel {
    client: OpenAIClient,
    model: String,
}

impl OpenAIChatModel {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        let client = OpenAIClient::with_base_url(config.api_key.clone(), config.base_url.clone());
        Self::new(client, config.model.clone())
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, messages, tools), fields(model = %self.model))]
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ChatMessage> {
        let request_messages = to_openai_messages(messages)?;
        let request_tools = tools
            .iter()
            .map(to_openai_tool)
            .collect::<Result<Vec<_>>>()?;
        self.client
            .chat_completion(&self.model, request_messages, request_tools)
            .await
    }
}
