//! `SendDocumentToUser`: sends a local file to the chat of the current request.
//!
//! The result is always a [`ReplyResult`] serialized as JSON. A failed send reports
//! `success: false` with the error text and is never turned into a success afterwards.

use std::path::Path;

use async_trait::async_trait;
use prompt::ToolSpec;
use serde::{Deserialize, Serialize};
use serde_json::json;
use telegram_bot::markdown_to_telegram_html;
use tracing::{error, info};

use super::{RequestContext, Tool, ToolError};

pub const SEND_DOCUMENT_TOOL_NAME: &str = "SendDocumentToUser";

#[derive(Debug, Deserialize)]
struct DocumentReply {
    reply_document_path: String,
    #[serde(default)]
    reply_text: Option<String>,
}

/// Outcome reported back to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyResult {
    pub success: bool,
    pub error: Option<String>,
}

impl ReplyResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"success":{},"error":null}}"#,
                self.success
            )
        })
    }
}

#[derive(Debug, Default)]
pub struct SendDocumentToUser;

impl SendDocumentToUser {
    pub fn new() -> Self {
        Self
    }

    /// Sends `path` with an optional caption (converted to Telegram HTML).
    pub async fn send(
        &self,
        path: &str,
        caption: Option<&str>,
        ctx: &RequestContext,
    ) -> ReplyResult {
        let file = Path::new(path);
        match tokio::fs::metadata(file).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return ReplyResult::failed(format!("not a file: {}", path)),
            Err(e) => return ReplyResult::failed(format!("document not found: {} ({})", path, e)),
        }

        let caption_html = caption
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(markdown_to_telegram_html);
        match ctx
            .bot
            .send_document(&ctx.chat, file, caption_html.as_deref())
            .await
        {
            Ok(()) => {
                info!(chat_id = ctx.chat.id, path = %path, "Document sent");
                ReplyResult::ok()
            }
            Err(e) => {
                error!(chat_id = ctx.chat.id, path = %path, error = %e, "Failed to send document");
                ReplyResult::failed(e.to_string())
            }
        }
    }
}

#[async_trait]
impl Tool for SendDocumentToUser {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: SEND_DOCUMENT_TOOL_NAME.to_string(),
            description: "Отправить пользователю документ с необязательным текстовым сопровождением \
(использовать, если нужно отправить пользователю какой-то файл)"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "reply_document_path": {
                        "type": "string",
                        "description": "Путь к документу, который будет отправлен пользователю"
                    },
                    "reply_text": {
                        "type": ["string", "null"],
                        "description": "Текст сообщения, который будет отправлен вместе с документом"
                    }
                },
                "required": ["reply_document_path"]
            }),
        }
    }

    async fn call(
        &self,
        arguments: serde_json::Value,
        ctx: &RequestContext,
    ) -> Result<String, ToolError> {
        let result = match serde_json::from_value::<DocumentReply>(arguments) {
            Ok(args) => {
                self.send(&args.reply_document_path, args.reply_text.as_deref(), ctx)
                    .await
            }
            Err(e) => ReplyResult::failed(format!("invalid arguments: {}", e)),
        };
        Ok(result.to_json())
    }
}
