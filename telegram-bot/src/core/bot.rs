//! Outbound messaging abstraction.
//!
//! [`Bot`] is transport-agnostic; [`crate::TelegramBotAdapter`] implements it via teloxide and
//! tests substitute a recording mock.

use std::path::Path;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::core::types::Chat;

#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends plain text (no parse mode).
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()>;

    /// Sends text in Telegram HTML parse mode.
    async fn send_html(&self, chat: &Chat, html: &str) -> Result<()>;

    /// Sends a local file as a document with an optional HTML caption.
    async fn send_document(&self, chat: &Chat, path: &Path, caption_html: Option<&str>)
        -> Result<()>;
}
