//! Telegram connectivity and logging config, loaded from `TELEGRAM_BOT_*` environment variables.

use std::env;

use anyhow::Result;

pub const DEFAULT_LOGGING_LEVEL: &str = "INFO";
pub const DEFAULT_LOG_FILE: &str = "logs/manager-bot.log";

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Custom Bot API server; `None` means the official API.
    pub api_url: Option<String>,
    pub log_file: String,
    /// Default tracing level when `RUST_LOG` is unset (e.g. `INFO`).
    pub logging_level: String,
}

impl TelegramConfig {
    /// Loads from env: `TELEGRAM_BOT_TOKEN` is required; `TELEGRAM_BOT_API_URL`,
    /// `TELEGRAM_BOT_LOG_FILE` and `TELEGRAM_BOT_LOGGING_LEVEL` are optional.
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("TELEGRAM_BOT_TOKEN not set"))?;
        let api_url = env::var("TELEGRAM_BOT_API_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let log_file = env::var("TELEGRAM_BOT_LOG_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
        let logging_level = env::var("TELEGRAM_BOT_LOGGING_LEVEL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOGGING_LEVEL.to_string());
        Ok(Self {
            bot_token,
            api_url,
            log_file,
            logging_level,
        })
    }

    /// Builds config with the given token; other fields default.
    pub fn with_token(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_url: None,
            log_file: DEFAULT_LOG_FILE.to_string(),
            logging_level: DEFAULT_LOGGING_LEVEL.to_string(),
        }
    }

    /// `api_url` must be a valid URL if set.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref url) = self.api_url {
            reqwest::Url::parse(url)
                .map_err(|e| anyhow::anyhow!("TELEGRAM_BOT_API_URL is not a valid URL: {}", e))?;
        }
        Ok(())
    }

    /// Creates the teloxide bot, pointing it at `api_url` when set.
    pub fn build_bot(&self) -> Result<teloxide::Bot> {
        let bot = teloxide::Bot::new(self.bot_token.clone());
        match self.api_url {
            Some(ref url) => {
                let url = reqwest::Url::parse(url)
                    .map_err(|e| anyhow::anyhow!("TELEGRAM_BOT_API_URL is not a valid URL: {}", e))?;
                Ok(bot.set_api_url(url))
            }
            None => Ok(bot),
        }
    }
}
