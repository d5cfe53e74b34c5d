use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint database error: {0}")]
    Database(sqlx::Error),

    #[error("Checkpoint serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checkpoint already exists: thread {thread_id} step {step}")]
    Conflict { thread_id: String, step: i64 },

    #[error("Checkpoint store is closed")]
    Closed,

    #[error("Unsupported checkpoint store kind: {0} (expected sqlite or postgres)")]
    UnsupportedKind(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for CheckpointError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => CheckpointError::Closed,
            other => CheckpointError::Database(other),
        }
    }
}

impl CheckpointError {
    /// Maps a failed insert: a primary-key violation becomes [`CheckpointError::Conflict`].
    pub(crate) fn from_insert(err: sqlx::Error, thread_id: &str, step: i64) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return CheckpointError::Conflict {
                    thread_id: thread_id.to_string(),
                    step,
                };
            }
        }
        err.into()
    }
}

pub type Result<T> = std::result::Result<T, CheckpointError>;
