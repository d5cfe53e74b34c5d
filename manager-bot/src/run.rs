//! Startup and shutdown of the bot, plus the one-shot CLI commands.
//!
//! Startup order: knowledge index (blocks until built) → chat model and tools → graph session →
//! handler chain → dispatcher. On shutdown the dispatcher drains, the graph session exits and
//! the index pool closes.

use std::sync::Arc;

use anyhow::{Context, Result};
use checkpoint::{CheckpointStore, Checkpointer};
use embedding::{EmbeddingConfig, EnvEmbeddingConfig};
use knowledge_base::{KnowledgeConfig, KnowledgeIndex};
use openai_client::mask_token;
use openai_embedding::OpenAIEmbedding;
use telegram_bot::{run_dispatcher, Bot, HandlerChain, LoggingHandler, TelegramBotAdapter};
use tracing::info;

use crate::agent::{manager_graph, ManagerAgent};
use crate::config::{BotConfig, CheckpointConfig, LlmConfig};
use crate::graph::{CompiledGraph, GraphManager};
use crate::llm::OpenAIChatModel;
use crate::memory::memory_summary;
use crate::telegram::{AgentHandler, StartHandler};
use crate::tools::{AllSeeTeamInfoRetriever, SendDocumentToUser, ToolBox};

/// Opens the persisted index, building it from the source document when needed.
pub async fn open_knowledge_index(
    knowledge: &KnowledgeConfig,
    embedding: &EnvEmbeddingConfig,
) -> Result<KnowledgeIndex> {
    info!(
        model = %embedding.model(),
        api_key = %mask_token(embedding.api_key()),
        index_dir = %knowledge.index_dir.display(),
        "Opening knowledge index"
    );
    let embedder = Arc::new(OpenAIEmbedding::from_config(embedding));
    KnowledgeIndex::open_or_build(knowledge, embedder)
        .await
        .context("knowledge index")
}

/// The manager agent with both tools.
pub fn build_agent(llm: &LlmConfig, index: KnowledgeIndex, top_k: usize) -> ManagerAgent {
    info!(
        model = %llm.model,
        base_url = %llm.base_url,
        api_key = %mask_token(&llm.api_key),
        max_tool_rounds = llm.max_tool_rounds,
        "Building manager agent"
    );
    let tools = ToolBox::new()
        .with_tool(Arc::new(AllSeeTeamInfoRetriever::new(index, top_k)))
        .with_tool(Arc::new(SendDocumentToUser::new()));
    ManagerAgent::new(
        Arc::new(OpenAIChatModel::from_config(llm)),
        tools,
        llm.system_prompt.clone(),
        llm.max_tool_rounds,
    )
}

/// Logging → `/start` → agent.
pub fn build_handler_chain(
    graph: Arc<CompiledGraph>,
    bot: Arc<dyn Bot>,
    welcome_message: &str,
) -> HandlerChain {
    HandlerChain::new()
        .add_handler(Arc::new(LoggingHandler))
        .add_handler(Arc::new(StartHandler::new(Arc::clone(&bot), welcome_message)))
        .add_handler(Arc::new(AgentHandler::new(graph, bot)))
}

/// Runs the bot until SIGINT/SIGTERM.
pub async fn run_bot(config: BotConfig) -> Result<()> {
    config.validate()?;
    let index = open_knowledge_index(&config.knowledge, &config.embedding).await?;
    let agent = build_agent(&config.llm, index.clone(), config.knowledge.top_k);
    let manager = GraphManager::new(config.checkpoint.clone(), manager_graph(agent));

    let teloxide_bot = config.telegram.build_bot()?;
    let bot: Arc<dyn Bot> = Arc::new(TelegramBotAdapter::new(teloxide_bot.clone()));
    let welcome = config.welcome_message.clone();

    let result = manager
        .scope(|graph| async move {
            let chain = build_handler_chain(graph, bot, &welcome);
            run_dispatcher(teloxide_bot, chain).await
        })
        .await;
    index.close().await;
    info!("Bot stopped");
    result
}

/// Rebuilds the knowledge index from its source. Returns the section count.
pub async fn rebuild_index(
    knowledge: &KnowledgeConfig,
    embedding: &EnvEmbeddingConfig,
) -> Result<usize> {
    knowledge.validate()?;
    let embedder = Arc::new(OpenAIEmbedding::from_config(embedding));
    let index = KnowledgeIndex::open(&knowledge.index_dir, knowledge.collection.clone(), embedder)
        .await
        .context("open knowledge index")?;
    let result = index
        .rebuild_from_source(&knowledge.source_path)
        .await
        .with_context(|| format!("rebuild from {}", knowledge.source_path.display()));
    index.close().await;
    result
}

/// Summaries of persisted threads (see [`memory_summary`]).
pub async fn thread_summaries(
    checkpoint: &CheckpointConfig,
    thread_id: Option<&str>,
) -> Result<Vec<String>> {
    checkpoint.validate()?;
    let store = CheckpointStore::connect(
        checkpoint.store_kind()?,
        &checkpoint.uri,
        checkpoint.max_connections,
    )
    .await
    .context("connect checkpoint store")?;
    let result = match store.setup().await {
        Ok(()) => memory_summary(&store, thread_id).await,
        Err(e) => Err(e.into()),
    };
    store.close().await;
    result
}
