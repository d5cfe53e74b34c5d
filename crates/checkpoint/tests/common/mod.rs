//! Store-agnostic checkpointer contract, run against every backend.
#![allow(dead_code)]

use checkpoint::{
    Checkpoint, CheckpointError, CheckpointSource, Checkpointer, MessagesState,
};
use prompt::ChatMessage;

pub fn state(texts: &[&str]) -> MessagesState {
    MessagesState::new(texts.iter().map(|t| ChatMessage::user(*t)).collect())
}

/// Exercises put / get_latest / list / list_thread_ids / conflict on a set-up store.
/// `prefix` keeps thread ids unique when the backend is shared between runs.
pub async fn run_contract(store: &dyn Checkpointer, prefix: &str) {
    let t1 = format!("{}-1", prefix);
    let t2 = format!("{}-2", prefix);

    assert!(store.get_latest(&t1).await.unwrap().is_none());

    let s0 = state(&["Кто вы?"]);
    let s1 = state(&["Кто вы?", "ещё"]);
    store
        .put(&Checkpoint::from_state(&t1, 0, CheckpointSource::Input, &s0).unwrap())
        .await
        .unwrap();
    store
        .put(&Checkpoint::from_state(&t1, 1, CheckpointSource::Loop, &s1).unwrap())
        .await
        .unwrap();
    store
        .put(&Checkpoint::from_state(&t2, 0, CheckpointSource::Input, &s0).unwrap())
        .await
        .unwrap();

    let latest = store.get_latest(&t1).await.unwrap().unwrap();
    assert_eq!(latest.step, 1);
    assert_eq!(latest.source, CheckpointSource::Loop);
    assert_eq!(latest.state::<MessagesState>().unwrap(), s1);

    let history = store.list(&t1, None).await.unwrap();
    assert_eq!(history.iter().map(|m| m.step).collect::<Vec<_>>(), vec![1, 0]);
    assert_eq!(store.list(&t1, Some(1)).await.unwrap().len(), 1);

    let ids = store.list_thread_ids().await.unwrap();
    assert!(ids.contains(&t1) && ids.contains(&t2));

    let dup = Checkpoint::from_state(&t1, 1, CheckpointSource::Loop, &s0).unwrap();
    match store.put(&dup).await {
        Err(CheckpointError::Conflict { thread_id, step }) => {
            assert_eq!(thread_id, t1);
            assert_eq!(step, 1);
        }
        other => panic!("expected conflict, got {:?}", other),
    }
    // The conflicting write did not replace the stored state.
    let latest = store.get_latest(&t1).await.unwrap().unwrap();
    assert_eq!(latest.state::<MessagesState>().unwrap(), s1);
}
