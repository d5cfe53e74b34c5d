use std::sync::Arc;

use async_trait::async_trait;
use telegram_bot::{Bot, Handler, HandlerResponse, Message, Result};
use tracing::info;

/// Substituted for `{name}` when the user's first name is unknown.
pub const UNKNOWN_NAME: &str = "there";

/// Fills `{name}` in `template` with `first_name`, or [`UNKNOWN_NAME`].
pub fn render_welcome(template: &str, first_name: Option<&str>) -> String {
    template.replace("{name}", first_name.unwrap_or(UNKNOWN_NAME))
}

/// Replies to `/start` (also `/start@botname`) with the welcome message.
pub struct StartHandler {
    bot: Arc<dyn Bot>,
    welcome_template: String,
}

impl StartHandler {
    pub fn new(bot: Arc<dyn Bot>, welcome_template: impl Into<String>) -> Self {
        Self {
            bot,
            welcome_template: welcome_template.into(),
        }
    }
}

#[async_trait]
impl Handler for StartHandler {
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        if message.command() != Some("start") {
            return Ok(HandlerResponse::Continue);
        }
        let first_name = message.user.first_name();
        info!(
            user_id = message.user.id,
            first_name = %first_name.unwrap_or(UNKNOWN_NAME),
            "User started the conversation"
        );
        let text = render_welcome(&self.welcome_template, first_name);
        self.bot.send_message(&message.chat, &text).await?;
        Ok(HandlerResponse::Reply(text))
    }
}
