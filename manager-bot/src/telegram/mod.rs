//! Telegram handlers of the manager bot.
//!
//! - [`StartHandler`]: `/start` greeting.
//! - [`AgentHandler`]: free text goes through the manager graph; assistant replies are sent as
//!   Telegram HTML.

mod agent_handler;
mod start;

pub use agent_handler::AgentHandler;
pub use start::{render_welcome, StartHandler, UNKNOWN_NAME};
