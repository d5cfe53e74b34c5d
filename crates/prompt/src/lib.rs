//! # Prompt
//!
//! Conversation vocabulary shared by the manager agent, the checkpoint store and the LLM client.
//!
//! ## Types
//!
//! - [`ChatMessage`]: one element of the thread's message list (system, user, assistant or tool turn).
//! - [`ToolCall`]: a function call requested by the assistant; answered by a `Tool` message with the same id.
//! - [`ToolSpec`]: name, description and JSON schema of a tool offered to the model.
//!
//! Messages are serde-serializable because they are persisted inside checkpoints.
//!
//! ## External interactions
//!
//! - **AI models**: converted one-to-one into OpenAI Chat Completions `messages` / `tools`.

use serde::{Deserialize, Serialize};

/// Role of a message, one-to-one with OpenAI Chat Completions API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction (API `role: "system"`).
    System,
    /// User message (API `role: "user"`).
    User,
    /// Assistant message (API `role: "assistant"`), optionally carrying tool calls.
    Assistant,
    /// Tool result (API `role: "tool"`), answering one assistant tool call.
    Tool,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }
}

/// A function call requested by the assistant. `arguments` is the raw JSON string produced by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// A single chat message, one-to-one with one element of OpenAI `messages` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Set on `Tool` messages: id of the [`ToolCall`] being answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Set on `Tool` messages: name of the tool that produced the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    fn with_role(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::Assistant, content)
    }

    /// Assistant turn that requests tool calls; `content` is often empty.
    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::with_role(MessageRole::Assistant, content)
        }
    }

    /// Tool result answering the call `tool_call_id` of tool `name`.
    pub fn tool(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
            ..Self::with_role(MessageRole::Tool, content)
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Short single-line preview used in logs and thread summaries.
    pub fn preview(&self, max_chars: usize) -> String {
        let flat: String = self
            .content
            .chars()
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();
        let mut out: String = flat.chars().take(max_chars).collect();
        if flat.chars().count() > max_chars {
            out.push_str("...");
        }
        if out.is_empty() && self.has_tool_calls() {
            let names: Vec<&str> = self.tool_calls.iter().map(|c| c.name.as_str()).collect();
            out = format!("<tool calls: {}>", names.join(", "));
        }
        out
    }
}

/// Tool description offered to the model. `parameters` is a JSON Schema object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Default system instruction for the manager agent.
///
/// Telegram only renders bold, italic and links, so the model is asked to stick to those.
pub const MANAGER_SYSTEM_PROMPT: &str = "Ты — менеджер компании AllSee.team и общаешься с клиентами в Telegram. \
Отвечай вежливо и по делу на языке пользователя. \
Для вопросов о компании, её услугах, команде и ценностях сначала найди информацию инструментом AllSeeTeamInfoRetriever и отвечай только на её основе. \
Если нужно отправить пользователю файл, используй инструмент SendDocumentToUser. \
Из форматирования используй только **жирный**, *курсив* и [ссылки](url); не используй заголовки, списки с #, блоки кода и таблицы.";

/// Builds the model input: system message first, then the thread history in order.
pub fn build_model_input(system_prompt: &str, history: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(history.len() + 1);
    out.push(ChatMessage::system(system_prompt));
    out.extend(history.iter().cloned());
    out
}
