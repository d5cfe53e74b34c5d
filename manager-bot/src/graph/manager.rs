//! Scoped acquisition of the checkpoint store and the compiled graph.
//!
//! [`GraphManager::enter`] connects the configured store, creates its table and compiles the
//! graph against it. [`GraphSession::exit`] closes the pool; a session dropped without `exit`
//! spawns the close on the current runtime. [`GraphManager::scope`] pairs the two around a
//! closure.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use checkpoint::{CheckpointStore, CheckpointStoreKind, Checkpointer};
use tracing::{error, info, warn};

use super::{CompiledGraph, StateGraph};
use crate::config::CheckpointConfig;

pub struct GraphManager {
    config: CheckpointConfig,
    builder: StateGraph,
}

impl GraphManager {
    pub fn new(config: CheckpointConfig, builder: StateGraph) -> Self {
        Self { config, builder }
    }

    pub fn store_kind(&self) -> anyhow::Result<CheckpointStoreKind> {
        self.config.store_kind()
    }

    /// Connects, runs `setup` and compiles the graph.
    pub async fn enter(&self) -> anyhow::Result<GraphSession> {
        let kind = self.store_kind()?;
        let store = CheckpointStore::connect(kind, &self.config.uri, self.config.max_connections)
            .await
            .with_context(|| format!("connect {} checkpoint store", kind))?;
        if let Err(e) = store.setup().await {
            store.close().await;
            return Err(e).context("checkpoint store setup");
        }
        let store = Arc::new(store);
        let graph = match self.builder.compile(store.clone()) {
            Ok(graph) => Arc::new(graph),
            Err(e) => {
                store.close().await;
                return Err(e).context("compile graph");
            }
        };
        info!(kind = %kind, nodes = ?graph.node_names(), "Graph session opened");
        Ok(GraphSession {
            graph,
            store,
            exited: false,
        })
    }

    /// Runs `f` with the compiled graph and always exits the session afterwards. The closure's
    /// error is logged and returned.
    pub async fn scope<F, Fut, T>(&self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(Arc<CompiledGraph>) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let session = self.enter().await?;
        let result = f(session.graph()).await;
        session.exit().await;
        if let Err(ref e) = result {
            error!(error = %e, "Graph scope ended with an error");
        }
        result
    }
}

/// An open store plus the graph compiled against it.
pub struct GraphSession {
    graph: Arc<CompiledGraph>,
    store: Arc<CheckpointStore>,
    exited: bool,
}

impl GraphSession {
    pub fn graph(&self) -> Arc<CompiledGraph> {
        Arc::clone(&self.graph)
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Closes the graph and the pool. Runs started after this fail with `GraphError::Closed`.
    pub async fn exit(mut self) {
        self.exited = true;
        self.graph.mark_closed();
        self.store.close().await;
        info!("Graph session closed");
    }
}

impl Drop for GraphSession {
    fn drop(&mut self) {
        if self.exited {
            return;
        }
        self.graph.mark_closed();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = Arc::clone(&self.store);
                handle.spawn(async move {
                    store.close().await;
                });
                warn!("Graph session dropped without exit, closing store in background");
            }
            Err(_) => warn!("Graph session dropped outside a runtime, store left to drop"),
        }
    }
}
