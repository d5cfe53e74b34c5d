//! # Checkpoint
//!
//! Durable per-thread conversation state for the manager graph.
//!
//! - [`Checkpoint`]: `(thread_id, step)`-addressed snapshot of a serialized state.
//! - [`Checkpointer`]: object-safe storage trait with [`SqliteSaver`] and [`PostgresSaver`].
//! - [`CheckpointStore`]: tagged store selected by [`CheckpointStoreKind`]; callers do not care
//!   which backend is behind it.
//! - [`MessagesState`]: the graph state persisted inside checkpoints.
//!
//! ## Example
//!
//! ```rust,no_run
//! use checkpoint::{Checkpoint, CheckpointSource, CheckpointStore, CheckpointStoreKind, Checkpointer, MessagesState};
//!
//! # async fn example() -> checkpoint::Result<()> {
//! let store = CheckpointStore::connect(CheckpointStoreKind::Sqlite, "data/checkpoints.sqlite", 5).await?;
//! store.setup().await?;
//! let state = MessagesState::new(vec![prompt::ChatMessage::user("Кто вы?")]);
//! store.put(&Checkpoint::from_state("42", 0, CheckpointSource::Input, &state)?).await?;
//! let latest = store.get_latest("42").await?;
//! assert_eq!(latest.map(|c| c.step), Some(0));
//! store.close().await;
//! # Ok(())
//! # }
//! ```

mod error;
mod postgres;
mod saver;
mod sqlite;
mod types;

pub use error::{CheckpointError, Result};
pub use postgres::PostgresSaver;
pub use saver::{CheckpointStore, CheckpointStoreKind, Checkpointer};
pub use sqlite::SqliteSaver;
pub use types::{Checkpoint, CheckpointMetadata, CheckpointSource, MessagesState};
