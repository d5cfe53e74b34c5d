//! Binary for manager-bot. See `cli.rs` for the command line.

use anyhow::Result;
use clap::Parser;
use embedding::EnvEmbeddingConfig;
use knowledge_base::KnowledgeConfig;
use manager_bot::{load_dotenv, rebuild_index, run_bot, thread_summaries, BotConfig, CheckpointConfig};
use telegram_bot::{init_tracing, DEFAULT_LOGGING_LEVEL, DEFAULT_LOG_FILE};
use tracing::error;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let config = BotConfig::load()?;
            init_tracing(&config.telegram.log_file, &config.telegram.logging_level)?;
            if let Err(e) = run_bot(config).await {
                error!(error = %format!("{:#}", e), "Bot exited with an error");
                return Err(e);
            }
        }
        Commands::Index => {
            init_tracing(DEFAULT_LOG_FILE, DEFAULT_LOGGING_LEVEL)?;
            let embedding = EnvEmbeddingConfig::from_env()?;
            embedding.validate()?;
            let knowledge = KnowledgeConfig::from_env()?;
            let sections = rebuild_index(&knowledge, &embedding).await?;
            println!(
                "Indexed {} sections from {} into {} (collection {})",
                sections,
                knowledge.source_path.display(),
                knowledge.index_dir.display(),
                knowledge.collection
            );
        }
        Commands::Memory { thread_id } => {
            let checkpoint = CheckpointConfig::from_env()?;
            println!("Checkpoint store: {}", checkpoint.kind);
            let summaries = thread_summaries(&checkpoint, thread_id.as_deref()).await?;
            if summaries.is_empty() {
                println!("  (no threads)");
            }
            for summary in summaries {
                println!("{}\n", summary);
            }
        }
    }

    Ok(())
}
