//! Checkpointed state graph.
//!
//! A [`StateGraph`] names its nodes and the path `START → entry → ... → END`, then compiles
//! against a [`Checkpointer`] into a [`CompiledGraph`]. One step of a thread:
//!
//! 1. take the thread lock (one step in flight per thread);
//! 2. load the latest checkpoint, or start from an empty state;
//! 3. append the input messages and persist an `Input` checkpoint;
//! 4. run the nodes in order, emitting [`GraphEvent::Values`] after each appended message;
//! 5. persist a `Loop` checkpoint and emit [`GraphEvent::Done`].
//!
//! Checkpoint steps grow by one per write, starting at 0. An error ends the stream as its last
//! item.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use checkpoint::{Checkpoint, CheckpointMetadata, CheckpointSource, Checkpointer, MessagesState};
use dashmap::DashMap;
use prompt::ChatMessage;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::{debug, error, info, info_span, Instrument};

use crate::tools::RequestContext;

mod error;
pub mod manager;

pub use error::GraphError;
pub use manager::{GraphManager, GraphSession};

const EVENT_BUFFER: usize = 32;

/// Item of [`CompiledGraph::stream`].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    /// Full state after the input was appended or a node appended a message.
    Values(MessagesState),
    /// The step finished; `step` is the id of the final checkpoint.
    Done { step: i64 },
}

/// Appends node output to the state and reports every change to the stream.
pub struct StateWriter<'a> {
    state: &'a mut MessagesState,
    events: &'a mpsc::Sender<Result<GraphEvent, GraphError>>,
}

impl<'a> StateWriter<'a> {
    fn new(
        state: &'a mut MessagesState,
        events: &'a mpsc::Sender<Result<GraphEvent, GraphError>>,
    ) -> Self {
        Self { state, events }
    }

    pub fn state(&self) -> &MessagesState {
        self.state
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.state.messages
    }

    /// Appends `message` and emits the new state. A dropped consumer does not stop the node.
    pub async fn append(&mut self, message: ChatMessage) {
        self.state.push(message);
        let _ = self
            .events
            .send(Ok(GraphEvent::Values(self.state.clone())))
            .await;
    }
}

/// One unit of work in the graph.
#[async_trait]
pub trait Node: Send + Sync {
    fn name(&self) -> &str;

    /// Reads the thread state and appends its output through `writer`.
    async fn run(&self, ctx: &RequestContext, writer: &mut StateWriter<'_>) -> Result<(), GraphError>;
}

/// Graph builder.
#[derive(Default)]
pub struct StateGraph {
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, String>,
    entry: Option<String>,
}

impl StateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node under its own name. A later node with the same name replaces it.
    pub fn add_node(mut self, node: Arc<dyn Node>) -> Self {
        self.nodes.insert(node.name().to_string(), node);
        self
    }

    /// Runs `to` after `from`. A node without an outgoing edge leads to END.
    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.insert(from.into(), to.into());
        self
    }

    /// The node that follows START.
    pub fn set_entry(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }

    /// Resolves the node path and binds it to `checkpointer`.
    pub fn compile(&self, checkpointer: Arc<dyn Checkpointer>) -> Result<CompiledGraph, GraphError> {
        let entry = self
            .entry
            .clone()
            .ok_or_else(|| GraphError::InvalidGraph("no entry node".into()))?;
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(entry);
        while let Some(name) = current {
            if !seen.insert(name.clone()) {
                return Err(GraphError::InvalidGraph(format!("cycle at node {}", name)));
            }
            let node = self
                .nodes
                .get(&name)
                .ok_or_else(|| GraphError::InvalidGraph(format!("unknown node {}", name)))?;
            path.push(Arc::clone(node));
            current = self.edges.get(&name).cloned();
        }
        Ok(CompiledGraph {
            path,
            checkpointer,
            thread_locks: DashMap::new(),
            closed: AtomicBool::new(false),
        })
    }
}

/// A graph bound to a checkpointer. Shared as `Arc<CompiledGraph>`.
pub struct CompiledGraph {
    path: Vec<Arc<dyn Node>>,
    checkpointer: Arc<dyn Checkpointer>,
    thread_locks: DashMap<String, Arc<Mutex<()>>>,
    closed: AtomicBool,
}

impl CompiledGraph {
    pub fn node_names(&self) -> Vec<&str> {
        self.path.iter().map(|n| n.name()).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Rejects every later run with [`GraphError::Closed`].
    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn ensure_open(&self) -> Result<(), GraphError> {
        if self.is_closed() {
            return Err(GraphError::Closed);
        }
        Ok(())
    }

    fn thread_lock(&self, thread_id: &str) -> Arc<Mutex<()>> {
        self.thread_locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the lock entry of `thread_id` once no step holds or waits on it, so the map only
    /// grows with the threads currently in flight.
    fn release_thread_lock(&self, thread_id: &str) {
        self.thread_locks
            .remove_if(thread_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Threads with a step running or waiting.
    pub fn active_threads(&self) -> usize {
        self.thread_locks.len()
    }

    /// Runs one step of `thread_id` with `input` appended, yielding events as they happen.
    pub fn stream(
        self: &Arc<Self>,
        thread_id: impl Into<String>,
        input: Vec<ChatMessage>,
        ctx: RequestContext,
    ) -> ReceiverStream<Result<GraphEvent, GraphError>> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let graph = Arc::clone(self);
        let thread_id = thread_id.into();
        let span = info_span!("graph_step", thread_id = %thread_id);
        tokio::spawn(
            async move {
                match graph.run_step(&thread_id, input, &ctx, &tx).await {
                    Ok(step) => {
                        info!(step, "Graph step done");
                        let _ = tx.send(Ok(GraphEvent::Done { step })).await;
                    }
                    Err(e) => {
                        error!(error = %e, "Graph step failed");
                        let _ = tx.send(Err(e)).await;
                    }
                }
            }
            .instrument(span),
        );
        ReceiverStream::new(rx)
    }

    /// Drains [`stream`](Self::stream) and returns the final state.
    pub async fn invoke(
        self: &Arc<Self>,
        thread_id: impl Into<String>,
        input: Vec<ChatMessage>,
        ctx: RequestContext,
    ) -> Result<MessagesState, GraphError> {
        let mut events = self.stream(thread_id, input, ctx);
        let mut last = None;
        while let Some(event) = events.next().await {
            match event? {
                GraphEvent::Values(state) => last = Some(state),
                GraphEvent::Done { .. } => {}
            }
        }
        last.ok_or_else(|| GraphError::InvalidGraph("step produced no state".into()))
    }

    /// Latest persisted state of `thread_id`; empty for an unknown thread.
    pub async fn get_state(&self, thread_id: &str) -> Result<MessagesState, GraphError> {
        self.ensure_open()?;
        match self.checkpointer.get_latest(thread_id).await? {
            Some(cp) => Ok(cp.state::<MessagesState>()?),
            None => Ok(MessagesState::default()),
        }
    }

    /// Checkpoint history of `thread_id`, newest first.
    pub async fn history(
        &self,
        thread_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointMetadata>, GraphError> {
        self.ensure_open()?;
        Ok(self.checkpointer.list(thread_id, limit).await?)
    }

    pub async fn thread_ids(&self) -> Result<Vec<String>, GraphError> {
        self.ensure_open()?;
        Ok(self.checkpointer.list_thread_ids().await?)
    }

    async fn run_step(
        &self,
        thread_id: &str,
        input: Vec<ChatMessage>,
        ctx: &RequestContext,
        events: &mpsc::Sender<Result<GraphEvent, GraphError>>,
    ) -> Result<i64, GraphError> {
        self.ensure_open()?;
        let lock = self.thread_lock(thread_id);
        let result = {
            let _guard = lock.lock().await;
            self.run_locked(thread_id, input, ctx, events).await
        };
        drop(lock);
        self.release_thread_lock(thread_id);
        result
    }

    async fn run_locked(
        &self,
        thread_id: &str,
        input: Vec<ChatMessage>,
        ctx: &RequestContext,
        events: &mpsc::Sender<Result<GraphEvent, GraphError>>,
    ) -> Result<i64, GraphError> {
        self.ensure_open()?;

        let (mut state, mut step) = match self.checkpointer.get_latest(thread_id).await? {
            Some(cp) => {
                debug!(step = cp.step, "Resuming thread");
                (cp.state::<MessagesState>()?, cp.step + 1)
            }
            None => {
                debug!("No checkpoint, starting a new thread");
                (MessagesState::default(), 0)
            }
        };

        state.append(input);
        self.checkpointer
            .put(&Checkpoint::from_state(thread_id, step, CheckpointSource::Input, &state)?)
            .await?;
        let _ = events.send(Ok(GraphEvent::Values(state.clone()))).await;

        for node in &self.path {
            debug!(node = %node.name(), "Running node");
            let mut writer = StateWriter::new(&mut state, events);
            node.run(ctx, &mut writer).await?;
        }

        step += 1;
        self.checkpointer
            .put(&Checkpoint::from_state(thread_id, step, CheckpointSource::Loop, &state)?)
            .await?;
        Ok(step)
    }
}
