//! Read-only view of persisted threads for the `memory` command.

use anyhow::Result;
use checkpoint::{Checkpointer, MessagesState};

/// Characters of message content shown per line.
pub const MEMORY_PREVIEW_LEN: usize = 50;

/// One thread as text: a header line with the message count, then one line per message.
pub fn format_thread_summary(thread_id: &str, state: &MessagesState, preview_len: usize) -> String {
    let mut out = format!("thread {}: {} messages", thread_id, state.len());
    for (i, msg) in state.messages.iter().enumerate() {
        out.push_str(&format!(
            "\n  [{}] {}: {}",
            i,
            msg.role.as_str(),
            msg.preview(preview_len)
        ));
    }
    out
}

/// Latest state of `thread_id`, empty when the thread has no checkpoint.
pub async fn load_thread_state(store: &dyn Checkpointer, thread_id: &str) -> Result<MessagesState> {
    Ok(match store.get_latest(thread_id).await? {
        Some(cp) => cp.state::<MessagesState>()?,
        None => MessagesState::default(),
    })
}

/// Summaries of one thread, or of every persisted thread when `thread_id` is `None`.
pub async fn memory_summary(store: &dyn Checkpointer, thread_id: Option<&str>) -> Result<Vec<String>> {
    let ids = match thread_id {
        Some(tid) => vec![tid.to_string()],
        None => store.list_thread_ids().await?,
    };
    let mut summaries = Vec::with_capacity(ids.len());
    for tid in &ids {
        let state = load_thread_state(store, tid).await?;
        summaries.push(format_thread_summary(tid, &state, MEMORY_PREVIEW_LEN));
    }
    Ok(summaries)
}
