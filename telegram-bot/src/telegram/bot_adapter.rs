//! Wraps teloxide::Bot and implements [`crate::core::Bot`].

use std::path::Path;

use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{ChatId, InputFile, ParseMode},
};
use tracing::debug;

use crate::core::{Bot as CoreBot, BotError, Chat, Result};

/// Thin wrapper around teloxide::Bot that implements core's Bot trait.
#[derive(Clone)]
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }

    /// Returns the underlying teloxide::Bot for direct API use when needed.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }
}

fn transport_error(e: teloxide::RequestError) -> BotError {
    BotError::Bot(e.to_string())
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(transport_error)?;
        Ok(())
    }

    async fn send_html(&self, chat: &Chat, html: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat.id), html.to_string())
            .parse_mode(ParseMode::Html)
            .await
            .map_err(transport_error)?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat: &Chat,
        path: &Path,
        caption_html: Option<&str>,
    ) -> Result<()> {
        debug!(chat_id = chat.id, path = %path.display(), "sending document");
        let mut request = self
            .bot
            .send_document(ChatId(chat.id), InputFile::file(path.to_path_buf()));
        if let Some(caption) = caption_html.filter(|c| !c.is_empty()) {
            request = request.caption(caption.to_string()).parse_mode(ParseMode::Html);
        }
        request.await.map_err(transport_error)?;
        Ok(())
    }
}
