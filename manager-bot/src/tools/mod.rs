//! Tools the manager agent may call mid-turn.
//!
//! - [`AllSeeTeamInfoRetriever`]: top-k search over the company knowledge base.
//! - [`SendDocumentToUser`]: sends a local file to the chat of the current request.
//!
//! Per-request data (chat, outbound bot) travels in [`RequestContext`]; the model never sees it
//! and cannot pass it as an argument.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use prompt::{ToolCall, ToolSpec};
use telegram_bot::{Bot, Chat};
use thiserror::Error;
use tracing::{debug, instrument};

mod retrieval;
mod send_document;

pub use retrieval::{AllSeeTeamInfoRetriever, NOTHING_FOUND, RETRIEVAL_TOOL_NAME};
pub use send_document::{ReplyResult, SendDocumentToUser, SEND_DOCUMENT_TOOL_NAME};

/// Data bound to the request being processed: which thread and chat, and how to reach it.
#[derive(Clone)]
pub struct RequestContext {
    pub thread_id: String,
    pub chat: Chat,
    pub bot: Arc<dyn Bot>,
}

impl RequestContext {
    /// Thread id is the chat id.
    pub fn new(chat: Chat, bot: Arc<dyn Bot>) -> Self {
        Self {
            thread_id: chat.thread_id(),
            chat,
            bot,
        }
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("thread_id", &self.thread_id)
            .field("chat", &self.chat)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Execution(String),
}

/// A capability offered to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;

    /// Runs the tool with parsed JSON `arguments`; the returned text becomes the tool message.
    async fn call(
        &self,
        arguments: serde_json::Value,
        ctx: &RequestContext,
    ) -> Result<String, ToolError>;
}

/// Ordered set of tools, looked up by name.
#[derive(Clone, Default)]
pub struct ToolBox {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.spec().name == name)
    }

    /// Parses the call's raw JSON arguments (empty means `{}`) and runs the named tool.
    #[instrument(skip(self, call, ctx), fields(tool = %call.name, thread_id = %ctx.thread_id))]
    pub async fn call(&self, call: &ToolCall, ctx: &RequestContext) -> Result<String, ToolError> {
        let tool = self
            .find(&call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;
        let raw = call.arguments.trim();
        let arguments: serde_json::Value = if raw.is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments(e.to_string()))?
        };
        debug!(arguments = %arguments, "Calling tool");
        tool.call(arguments, ctx).await
    }
}
