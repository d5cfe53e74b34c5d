use checkpoint::CheckpointError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Checkpoint error: {0}")]
    Checkpoint(CheckpointError),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Graph session is closed")]
    Closed,

    #[error("Node {node} failed: {message}")]
    Node { node: String, message: String },

    #[error("Invalid graph: {0}")]
    InvalidGraph(String),
}

impl From<CheckpointError> for GraphError {
    fn from(err: CheckpointError) -> Self {
        match err {
            CheckpointError::Closed => GraphError::Closed,
            other => GraphError::Checkpoint(other),
        }
    }
}
