//! Telegram layer: adapters, Bot implementation, config, dispatcher.

mod adapters;
mod bot_adapter;
mod config;
mod runner;

pub use adapters::{TelegramMessageWrapper, TelegramUserWrapper};
pub use bot_adapter::TelegramBotAdapter;
pub use config::{TelegramConfig, DEFAULT_LOGGING_LEVEL, DEFAULT_LOG_FILE};
pub use runner::{run_dispatcher, shutdown_signal, stop_dispatcher};
