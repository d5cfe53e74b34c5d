//! # Manager bot
//!
//! A Telegram bot that forwards user messages to a single LLM-backed manager agent.
//!
//! - [`config`]: `TELEGRAM_BOT_*`, `LLM_*`, `EMBEDDER_*`, `CHECKPOINT_*`, `KNOWLEDGE_*` settings.
//! - [`llm`]: [`ChatModel`] and its OpenAI implementation.
//! - [`tools`]: knowledge retrieval and document sending, with the per-request [`RequestContext`].
//! - [`agent`]: the `manager` node, a bounded tool-calling loop.
//! - [`graph`]: checkpointed [`StateGraph`] / [`CompiledGraph`] and the scoped [`GraphManager`].
//! - [`telegram`]: `/start` and free-text handlers.
//! - [`run`]: startup, shutdown and the CLI commands.
//!
//! The compiled graph is built at startup and injected into the handlers as
//! `Arc<CompiledGraph>`; conversation state lives in the checkpoint store, keyed by chat id.

pub mod agent;
pub mod config;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod run;
pub mod telegram;
pub mod tools;

pub use agent::{manager_graph, ManagerAgent, MANAGER_NODE};
pub use config::{load_dotenv, BotConfig, CheckpointConfig, LlmConfig};
pub use graph::{
    CompiledGraph, GraphError, GraphEvent, GraphManager, GraphSession, Node, StateGraph,
    StateWriter,
};
pub use llm::{ChatModel, OpenAIChatModel};
pub use memory::{format_thread_summary, memory_summary, MEMORY_PREVIEW_LEN};
pub use run::{build_agent, build_handler_chain, open_knowledge_index, rebuild_index, run_bot, thread_summaries};
pub use telegram::{AgentHandler, StartHandler};
pub use tools::{
    AllSeeTeamInfoRetriever, ReplyResult, RequestContext, SendDocumentToUser, Tool, ToolBox,
    ToolError,
};
