//! Integration tests for the checkpointed state graph and the scoped graph manager.
//!
//! Every test uses a SQLite store in a temp directory and a [`ScriptedModel`].

mod common;

use std::sync::{Arc, Mutex};

use checkpoint::{CheckpointSource, MessagesState};
use common::{ctx, sqlite_graph, FailingModel, MockBot, ScriptedModel};
use manager_bot::{
    manager_graph, CheckpointConfig, ChatModel, GraphError, GraphEvent, GraphManager, ManagerAgent,
    StateGraph, ToolBox,
};
use prompt::{ChatMessage, MessageRole};
use tempfile::TempDir;
use tokio_stream::StreamExt;

fn graph_with(model: Arc<dyn ChatModel>) -> StateGraph {
    manager_graph(ManagerAgent::new(model, ToolBox::new(), "system", 3))
}

/// **Test: An unknown thread starts fresh; one step persists Input at 0 and Loop at 1.**
#[tokio::test]
async fn new_thread_starts_fresh() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![ChatMessage::assistant("Здравствуйте!")]);
    let graph = sqlite_graph(dir.path(), &graph_with(model.clone())).await;

    assert!(graph.get_state("100").await.unwrap().is_empty());

    let state = graph
        .invoke("100", vec![ChatMessage::user("Привет")], ctx(100, MockBot::new()))
        .await
        .unwrap();
    assert_eq!(state.len(), 2);
    assert_eq!(state.messages[0], ChatMessage::user("Привет"));
    assert_eq!(state.messages[1], ChatMessage::assistant("Здравствуйте!"));

    let history = graph.history("100", None).await.unwrap();
    let steps: Vec<(i64, CheckpointSource)> = history.iter().map(|m| (m.step, m.source)).collect();
    assert_eq!(
        steps,
        vec![(1, CheckpointSource::Loop), (0, CheckpointSource::Input)]
    );
    assert_eq!(graph.get_state("100").await.unwrap(), state);
}

/// **Test: Resuming a thread appends to its history and the model sees the earlier turns.**
#[tokio::test]
async fn resume_appends_to_history() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![
        ChatMessage::assistant("Первый ответ"),
        ChatMessage::assistant("Второй ответ"),
    ]);
    let graph = sqlite_graph(dir.path(), &graph_with(model.clone())).await;
    let bot = MockBot::new();

    graph
        .invoke("7", vec![ChatMessage::user("раз")], ctx(7, bot.clone()))
        .await
        .unwrap();
    let state = graph
        .invoke("7", vec![ChatMessage::user("два")], ctx(7, bot))
        .await
        .unwrap();

    let contents: Vec<&str> = state.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["раз", "Первый ответ", "два", "Второй ответ"]);

    let calls = model.calls();
    assert_eq!(calls.len(), 2);
    // system + three thread messages on the second turn
    assert_eq!(calls[1].messages.len(), 4);
    assert_eq!(calls[1].messages[0].role, MessageRole::System);
    assert_eq!(calls[1].messages[1].content, "раз");

    let latest = graph.history("7", Some(1)).await.unwrap();
    assert_eq!(latest[0].step, 3);
}

/// **Test: Threads are isolated from each other.**
#[tokio::test]
async fn threads_are_isolated() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![
        ChatMessage::assistant("для 1"),
        ChatMessage::assistant("для 2"),
    ]);
    let graph = sqlite_graph(dir.path(), &graph_with(model)).await;
    let bot = MockBot::new();

    graph
        .invoke("1", vec![ChatMessage::user("a")], ctx(1, bot.clone()))
        .await
        .unwrap();
    graph
        .invoke("2", vec![ChatMessage::user("b")], ctx(2, bot))
        .await
        .unwrap();

    assert_eq!(graph.get_state("1").await.unwrap().len(), 2);
    assert_eq!(graph.get_state("2").await.unwrap().messages[0].content, "b");
    assert_eq!(graph.thread_ids().await.unwrap(), vec!["1".to_string(), "2".to_string()]);
}

/// **Test: Stream yields the input state, each appended message, then Done with the last step.**
#[tokio::test]
async fn stream_event_order() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![ChatMessage::assistant("ok")]);
    let graph = sqlite_graph(dir.path(), &graph_with(model)).await;

    let events: Vec<GraphEvent> = graph
        .stream("5", vec![ChatMessage::user("hi")], ctx(5, MockBot::new()))
        .map(|e| e.unwrap())
        .collect()
        .await;

    assert_eq!(events.len(), 3);
    match &events[0] {
        GraphEvent::Values(state) => assert_eq!(state.last().unwrap().role, MessageRole::User),
        other => panic!("unexpected {:?}", other),
    }
    match &events[1] {
        GraphEvent::Values(state) => assert_eq!(state.last().unwrap().content, "ok"),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(events[2], GraphEvent::Done { step: 1 });
}

/// **Test: A model failure ends the stream with an error; the input checkpoint is kept.**
#[tokio::test]
async fn model_error_is_last_item() {
    let dir = TempDir::new().unwrap();
    let graph = sqlite_graph(dir.path(), &graph_with(Arc::new(FailingModel))).await;

    let events: Vec<_> = graph
        .stream("9", vec![ChatMessage::user("hi")], ctx(9, MockBot::new()))
        .collect()
        .await;

    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], Ok(GraphEvent::Values(_))));
    assert!(matches!(events[1], Err(GraphError::Model(_))));

    let state = graph.get_state("9").await.unwrap();
    assert_eq!(state, MessagesState::new(vec![ChatMessage::user("hi")]));
}

/// **Test: Concurrent steps on one thread are serialized; no step id is reused.**
#[tokio::test]
async fn concurrent_steps_on_one_thread() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![
        ChatMessage::assistant("r1"),
        ChatMessage::assistant("r2"),
    ]);
    let graph = sqlite_graph(dir.path(), &graph_with(model)).await;
    let bot = MockBot::new();

    let a = graph.invoke("3", vec![ChatMessage::user("a")], ctx(3, bot.clone()));
    let b = graph.invoke("3", vec![ChatMessage::user("b")], ctx(3, bot));
    let (ra, rb) = tokio::join!(a, b);
    ra.unwrap();
    rb.unwrap();

    let state = graph.get_state("3").await.unwrap();
    assert_eq!(state.len(), 4);
    let steps: Vec<i64> = graph
        .history("3", None)
        .await
        .unwrap()
        .iter()
        .map(|m| m.step)
        .collect();
    assert_eq!(steps, vec![3, 2, 1, 0]);
    assert_eq!(graph.active_threads(), 0);
}

/// **Test: Per-thread locks are released once a thread's steps finish.**
#[tokio::test]
async fn thread_locks_do_not_accumulate() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new((0..5).map(|i| ChatMessage::assistant(format!("r{}", i))).collect());
    let graph = sqlite_graph(dir.path(), &graph_with(model)).await;
    let bot = MockBot::new();

    for chat_id in 100..105 {
        graph
            .invoke(chat_id.to_string(), vec![ChatMessage::user("hi")], ctx(chat_id, bot.clone()))
            .await
            .unwrap();
    }

    assert_eq!(graph.active_threads(), 0);
    assert_eq!(graph.thread_ids().await.unwrap().len(), 5);
}

/// **Test: State survives reopening the SQLite file with a new graph.**
#[tokio::test]
async fn state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::sqlite(dir.path().join("cp.sqlite").to_string_lossy());
    let model = ScriptedModel::new(vec![
        ChatMessage::assistant("до"),
        ChatMessage::assistant("после"),
    ]);
    let manager = GraphManager::new(config, graph_with(model));

    let session = manager.enter().await.unwrap();
    session
        .graph()
        .invoke("11", vec![ChatMessage::user("1")], ctx(11, MockBot::new()))
        .await
        .unwrap();
    session.exit().await;

    let session = manager.enter().await.unwrap();
    let state = session
        .graph()
        .invoke("11", vec![ChatMessage::user("2")], ctx(11, MockBot::new()))
        .await
        .unwrap();
    session.exit().await;

    let contents: Vec<&str> = state.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["1", "до", "2", "после"]);
}

/// **Test: After exit the graph rejects runs with Closed.**
#[tokio::test]
async fn exited_session_rejects_runs() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::sqlite(dir.path().join("cp.sqlite").to_string_lossy());
    let manager = GraphManager::new(config, graph_with(ScriptedModel::new(vec![])));

    let session = manager.enter().await.unwrap();
    let graph = session.graph();
    session.exit().await;

    assert!(graph.is_closed());
    let err = graph
        .invoke("1", vec![ChatMessage::user("x")], ctx(1, MockBot::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::Closed));
    assert!(matches!(graph.get_state("1").await, Err(GraphError::Closed)));
}

/// **Test: scope exits the session when the closure fails and returns the closure's error.**
#[tokio::test]
async fn scope_exits_on_error() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::sqlite(dir.path().join("cp.sqlite").to_string_lossy());
    let manager = GraphManager::new(config, graph_with(ScriptedModel::new(vec![])));
    let seen = Arc::new(Mutex::new(None));

    let slot = seen.clone();
    let result: anyhow::Result<()> = manager
        .scope(|graph| async move {
            *slot.lock().unwrap() = Some(graph);
            anyhow::bail!("dispatcher failed")
        })
        .await;

    assert_eq!(result.unwrap_err().to_string(), "dispatcher failed");
    let graph = seen.lock().unwrap().take().unwrap();
    assert!(graph.is_closed());
}

/// **Test: Dropping a session without exit still closes the graph.**
#[tokio::test]
async fn dropped_session_closes_graph() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::sqlite(dir.path().join("cp.sqlite").to_string_lossy());
    let manager = GraphManager::new(config, graph_with(ScriptedModel::new(vec![])));

    let session = manager.enter().await.unwrap();
    let graph = session.graph();
    drop(session);

    assert!(graph.is_closed());
}

/// **Test: Unknown store kind fails at enter; graphs without entry or with unknown nodes fail to compile.**
#[tokio::test]
async fn invalid_setup_is_rejected() {
    let config = CheckpointConfig {
        kind: "redis".into(),
        ..CheckpointConfig::sqlite("unused.sqlite")
    };
    let manager = GraphManager::new(config, graph_with(ScriptedModel::new(vec![])));
    assert!(manager.enter().await.is_err());

    let dir = TempDir::new().unwrap();
    let store = checkpoint::SqliteSaver::connect(dir.path().join("x.sqlite").to_str().unwrap(), 1)
        .await
        .unwrap();
    let store = Arc::new(store);
    assert!(matches!(
        StateGraph::new().compile(store.clone()),
        Err(GraphError::InvalidGraph(_))
    ));
    assert!(matches!(
        StateGraph::new().set_entry("missing").compile(store),
        Err(GraphError::InvalidGraph(_))
    ));
}
