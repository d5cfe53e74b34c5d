//! # Telegram bot framework
//!
//! Transport layer for bots built on a [`HandlerChain`]:
//!
//! - [`core`]: transport-agnostic [`Message`], [`Handler`], [`Bot`], errors and tracing init.
//! - [`chain`]: before / handle / after handler pipeline.
//! - [`telegram`]: teloxide adapter, [`TelegramConfig`] and the long-polling dispatcher.
//! - [`format`]: markdown → Telegram HTML.

pub mod chain;
pub mod core;
pub mod format;
pub mod handlers;
pub mod telegram;

pub use chain::HandlerChain;
pub use core::{
    env_filter, init_tracing, Bot, BotError, Chat, Handler, HandlerError, HandlerResponse,
    Message, Result, ToCoreMessage, ToCoreUser, User,
};
pub use format::markdown_to_telegram_html;
pub use handlers::LoggingHandler;
pub use telegram::{
    run_dispatcher, shutdown_signal, stop_dispatcher, TelegramBotAdapter, TelegramConfig,
    TelegramMessageWrapper, TelegramUserWrapper, DEFAULT_LOGGING_LEVEL, DEFAULT_LOG_FILE,
};
