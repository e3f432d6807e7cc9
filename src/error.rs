use thiserror::Error;

/// Errors surfaced by the fingerprinting and indexing pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to decode audio: {0}")]
    Decode(String),

    #[error("index store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
