//! The `manager` node: an LLM with tools, run as a bounded tool-calling loop.
//!
//! Each round the model sees the system prompt, the thread messages and the tool specs. Tool
//! calls are executed in order and answered with `Tool` messages; a reply without tool calls ends
//! the turn. After `max_tool_rounds` rounds the model is called once more without tools.

use std::sync::Arc;

use async_trait::async_trait;
use prompt::{build_model_input, ChatMessage, ToolSpec};
use tracing::{debug, info, warn};

use crate::graph::{GraphError, Node, StateGraph, StateWriter};
use crate::llm::ChatModel;
use crate::tools::{RequestContext, ToolBox};

pub const MANAGER_NODE: &str = "manager";

/// `START → manager → END`.
pub fn manager_graph(agent: ManagerAgent) -> StateGraph {
    StateGraph::new()
        .add_node(Arc::new(agent))
        .set_entry(MANAGER_NODE)
}

pub struct ManagerAgent {
    model: Arc<dyn ChatModel>,
    tools: ToolBox,
    system_prompt: String,
    max_tool_rounds: usize,
}

impl ManagerAgent {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: ToolBox,
        system_prompt: impl Into<String>,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            model,
            tools,
            system_prompt: system_prompt.into(),
            max_tool_rounds,
        }
    }

    pub fn tools(&self) -> &ToolBox {
        &self.tools
    }

    async fn ask(&self, history: &[ChatMessage], tools: &[ToolSpec]) -> Result<ChatMessage, GraphError> {
        let input = build_model_input(&self.system_prompt, history);
        self.model
            .complete(&input, tools)
            .await
            .map_err(|e| GraphError::Model(format!("{:#}", e)))
    }
}

#[async_trait]
impl Node for ManagerAgent {
    fn name(&self) -> &str {
        MANAGER_NODE
    }

    async fn run(&self, ctx: &RequestContext, writer: &mut StateWriter<'_>) -> Result<(), GraphError> {
        let specs = self.tools.specs();
        for round in 0..self.max_tool_rounds {
            let reply = self.ask(writer.messages(), &specs).await?;
            let calls = reply.tool_calls.clone();
            writer.append(reply).await;
            if calls.is_empty() {
                debug!(round, "Manager answered");
                return Ok(());
            }

            for call in &calls {
                let content = match self.tools.call(call, ctx).await {
                    Ok(output) => output,
                    Err(e) => {
                        warn!(tool = %call.name, thread_id = %ctx.thread_id, error = %e, "Tool call failed");
                        format!("Error: {}", e)
                    }
                };
                info!(tool = %call.name, thread_id = %ctx.thread_id, output_len = content.len(), "Tool answered");
                writer
                    .append(ChatMessage::tool(call.id.clone(), call.name.clone(), content))
                    .await;
            }
        }

        info!(
            thread_id = %ctx.thread_id,
            rounds = self.max_tool_rounds,
            "Tool round limit reached, asking for a final answer"
        );
        let mut reply = self.ask(writer.messages(), &[]).await?;
        reply.tool_calls.clear();
        writer.append(reply).await;
        Ok(())
    }
}
