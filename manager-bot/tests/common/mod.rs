//! Test doubles shared by the manager-bot integration tests.
//!
//! - [`MockBot`]: records every outbound call instead of talking to Telegram.
//! - [`ScriptedModel`]: replays queued assistant messages and records what it was asked.
//! - [`KeywordEmbedder`]: deterministic embeddings from keyword counts.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use embedding::EmbeddingService;
use manager_bot::{ChatModel, CompiledGraph, RequestContext, StateGraph};
use prompt::{ChatMessage, ToolCall, ToolSpec};
use telegram_bot::{Bot, BotError, Chat, Message, User};

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text { chat_id: i64, text: String },
    Html { chat_id: i64, html: String },
    Document { chat_id: i64, path: PathBuf, caption: Option<String> },
}

/// Records sends. With `fail_documents` set, `send_document` returns an error.
#[derive(Default)]
pub struct MockBot {
    pub sent: Mutex<Vec<Sent>>,
    pub fail_documents: bool,
}

impl MockBot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_documents() -> Arc<Self> {
        Arc::new(Self {
            fail_documents: true,
            ..Self::default()
        })
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn html_replies(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Html { html, .. } => Some(html),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn send_message(&self, chat: &Chat, text: &str) -> telegram_bot::Result<()> {
        self.sent.lock().unwrap().push(Sent::Text {
            chat_id: chat.id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_html(&self, chat: &Chat, html: &str) -> telegram_bot::Result<()> {
        self.sent.lock().unwrap().push(Sent::Html {
            chat_id: chat.id,
            html: html.to_string(),
        });
        Ok(())
    }

    async fn send_document(
        &self,
        chat: &Chat,
        path: &Path,
        caption_html: Option<&str>,
    ) -> telegram_bot::Result<()> {
        if self.fail_documents {
            return Err(BotError::Bot("Bad Request: file is too big".to_string()));
        }
        self.sent.lock().unwrap().push(Sent::Document {
            chat_id: chat.id,
            path: path.to_path_buf(),
            caption: caption_html.map(str::to_string),
        });
        Ok(())
    }
}

/// One recorded model call.
#[derive(Debug, Clone)]
pub struct ModelCall {
    pub messages: Vec<ChatMessage>,
    pub tool_names: Vec<String>,
}

/// Replays `replies` in order; once they run out, answers `"(no more replies)"`.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ChatMessage>>,
    pub calls: Mutex<Vec<ModelCall>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<ChatMessage>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> anyhow::Result<ChatMessage> {
        self.calls.lock().unwrap().push(ModelCall {
            messages: messages.to_vec(),
            tool_names: tools.iter().map(|t| t.name.clone()).collect(),
        });
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ChatMessage::assistant("(no more replies)")))
    }
}

/// A model that always fails.
pub struct FailingModel;

#[async_trait]
impl ChatModel for FailingModel {
    async fn complete(&self, _messages: &[ChatMessage], _tools: &[ToolSpec]) -> anyhow::Result<ChatMessage> {
        anyhow::bail!("upstream returned 500")
    }
}

pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> ChatMessage {
    ChatMessage::assistant_with_tool_calls(
        "",
        vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }],
    )
}

pub const VOCABULARY: &[&str] = &["кто", "миссия", "ценност", "услуг", "команд", "ии"];

/// Each dimension counts the words containing one vocabulary stem.
#[derive(Default)]
pub struct KeywordEmbedder;

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    VOCABULARY
        .iter()
        .map(|stem| words.iter().filter(|w| w.contains(stem)).count() as f32)
        .collect()
}

#[async_trait]
impl EmbeddingService for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        Ok(keyword_vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        Ok(texts.iter().map(|t| keyword_vector(t)).collect())
    }
}

pub const SAMPLE_DOC: &str = "\
# Почему мы?
Потому что мы делаем ИИ полезным.

# Кто мы?
Мы команда AllSee, студия разработки решений на базе ИИ.

# Наша миссия
Миссия: сделать технологии доступными.

# Ценности
Честность и ответственность.
";

pub fn chat(id: i64) -> Chat {
    Chat::private(id)
}

pub fn ctx(chat_id: i64, bot: Arc<MockBot>) -> RequestContext {
    RequestContext::new(chat(chat_id), bot)
}

pub fn text_message(chat_id: i64, first_name: Option<&str>, content: &str) -> Message {
    let user = User {
        id: 7,
        username: Some("client".to_string()),
        first_name: first_name.map(str::to_string),
        last_name: None,
    };
    Message::text("1", user, chat(chat_id), content)
}

/// Compiles `builder` against a fresh SQLite store in `dir`.
pub async fn sqlite_graph(dir: &Path, builder: &StateGraph) -> Arc<CompiledGraph> {
    let store = checkpoint::SqliteSaver::connect(dir.join("checkpoints.sqlite").to_str().unwrap(), 2)
        .await
        .unwrap();
    checkpoint::Checkpointer::setup(&store).await.unwrap();
    Arc::new(builder.compile(Arc::new(store)).unwrap())
}
