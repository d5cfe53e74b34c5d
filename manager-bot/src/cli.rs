//! CLI for the manager-bot binary. See `main.rs` for dispatch.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "manager-bot")]
#[command(about = "Telegram manager bot: checkpointed LLM agent with knowledge retrieval")]
#[command(version)]
pub struct Cli {
    /// Defaults to `run` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the Telegram bot until SIGINT/SIGTERM.
    Run,

    /// Rebuild the knowledge index from KNOWLEDGE_SOURCE_PATH and print the section count.
    Index,

    /// Print persisted threads with message counts and previews.
    Memory {
        /// Only this thread (chat id). All threads when omitted.
        #[arg(short, long)]
        thread_id: Option<String>,
    },
}
