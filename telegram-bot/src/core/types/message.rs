//! Incoming message type for the core model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{chat::Chat, user::User};

/// A single incoming text message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub user: User,
    pub chat: Chat,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Builds a message with the current timestamp.
    pub fn text(id: impl Into<String>, user: User, chat: Chat, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user,
            chat,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_command(&self) -> bool {
        self.content.trim_start().starts_with('/')
    }

    /// Command name without the leading `/` and without an `@botname` suffix, e.g. `start` for
    /// `/start@manager_bot payload`.
    pub fn command(&self) -> Option<&str> {
        let rest = self.content.trim_start().strip_prefix('/')?;
        let word = rest.split_whitespace().next().unwrap_or("");
        let name = word.split('@').next().unwrap_or("");
        (!name.is_empty()).then_some(name)
    }
}
