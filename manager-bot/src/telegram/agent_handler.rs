//! Free-text messages → manager graph → HTML replies.
//!
//! The chat id is the thread id. Every [`GraphEvent::Values`] whose last message is an assistant
//! message with text is converted with [`markdown_to_telegram_html`] and sent right away, so
//! intermediate answers reach the user before tools finish. Failures are logged; the user gets no
//! error reply.

use std::sync::Arc;

use async_trait::async_trait;
use prompt::ChatMessage;
use telegram_bot::{markdown_to_telegram_html, Bot, Handler, HandlerResponse, Message, Result};
use tokio_stream::StreamExt;
use tracing::{error, info, instrument};

use crate::graph::{CompiledGraph, GraphEvent};
use crate::tools::RequestContext;

pub struct AgentHandler {
    graph: Arc<CompiledGraph>,
    bot: Arc<dyn Bot>,
}

impl AgentHandler {
    pub fn new(graph: Arc<CompiledGraph>, bot: Arc<dyn Bot>) -> Self {
        Self { graph, bot }
    }

    /// Assistant text to show for this state, if its last message is one.
    fn reply_text(message: Option<&ChatMessage>) -> Option<&str> {
        message
            .filter(|m| m.is_assistant())
            .map(|m| m.content.as_str())
            .filter(|c| !c.trim().is_empty())
    }

    /// Streams one graph step and sends each assistant reply. Returns the last HTML sent.
    #[instrument(skip(self, message), fields(chat_id = message.chat.id))]
    async fn process(&self, message: &Message) -> Option<String> {
        let ctx = RequestContext::new(message.chat.clone(), Arc::clone(&self.bot));
        let mut events = self.graph.stream(
            ctx.thread_id.clone(),
            vec![ChatMessage::user(message.content.clone())],
            ctx,
        );

        let mut last_sent = None;
        while let Some(event) = events.next().await {
            match event {
                Ok(GraphEvent::Values(state)) => {
                    let Some(text) = Self::reply_text(state.last()) else {
                        continue;
                    };
                    let html = markdown_to_telegram_html(text);
                    match self.bot.send_html(&message.chat, &html).await {
                        Ok(()) => last_sent = Some(html),
                        Err(e) => error!(error = %e, "Failed to send assistant reply"),
                    }
                }
                Ok(GraphEvent::Done { step }) => {
                    info!(step, "User message processed");
                }
                Err(e) => {
                    error!(error = %e, "Error while processing user message");
                    break;
                }
            }
        }
        last_sent
    }
}

#[async_trait]
impl Handler for AgentHandler {
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        if message.is_command() || message.content.trim().is_empty() {
            return Ok(HandlerResponse::Ignore);
        }
        info!(
            user_id = message.user.id,
            first_name = %message.user.first_name().unwrap_or("unknown"),
            "User sent a message"
        );
        Ok(match self.process(message).await {
            Some(html) => HandlerResponse::Reply(html),
            None => HandlerResponse::Stop,
        })
    }
}
