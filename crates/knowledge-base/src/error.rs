use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Knowledge source not found: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Embedding error: {0}")]
    Embedding(String),
}

impl KnowledgeError {
    pub(crate) fn embedding(err: anyhow::Error) -> Self {
        KnowledgeError::Embedding(format!("{:#}", err))
    }
}

pub type Result<T> = std::result::Result<T, KnowledgeError>;
