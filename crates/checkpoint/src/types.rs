use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use prompt::ChatMessage;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::Result;

/// What produced a checkpoint: the user's input or a completed agent loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointSource {
    Input,
    Loop,
}

impl CheckpointSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointSource::Input => "input",
            CheckpointSource::Loop => "loop",
        }
    }
}

impl fmt::Display for CheckpointSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckpointSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "input" => Ok(CheckpointSource::Input),
            "loop" => Ok(CheckpointSource::Loop),
            other => Err(format!("unknown checkpoint source: {}", other)),
        }
    }
}

/// Durable snapshot of one thread's state after a step. Addressed by `(thread_id, step)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: String,
    pub step: i64,
    pub source: CheckpointSource,
    pub state: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Serializes `state` into a new checkpoint stamped with the current time.
    pub fn from_state<S: Serialize>(
        thread_id: impl Into<String>,
        step: i64,
        source: CheckpointSource,
        state: &S,
    ) -> Result<Self> {
        Ok(Self {
            thread_id: thread_id.into(),
            step,
            source,
            state: serde_json::to_value(state)?,
            created_at: Utc::now(),
        })
    }

    /// Deserializes the stored state.
    pub fn state<S: DeserializeOwned>(&self) -> Result<S> {
        Ok(serde_json::from_value(self.state.clone())?)
    }

    pub fn metadata(&self) -> CheckpointMetadata {
        CheckpointMetadata {
            thread_id: self.thread_id.clone(),
            step: self.step,
            source: self.source,
            created_at: self.created_at,
        }
    }
}

/// Checkpoint without its state payload, as returned by history listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointMetadata {
    pub thread_id: String,
    pub step: i64,
    pub source: CheckpointSource,
    pub created_at: DateTime<Utc>,
}

/// Graph state: the thread's message list. Node output is appended, never replaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagesState {
    pub messages: Vec<ChatMessage>,
}

impl MessagesState {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    pub fn append(&mut self, messages: impl IntoIterator<Item = ChatMessage>) {
        self.messages.extend(messages);
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
