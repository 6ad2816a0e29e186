use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("empty content hash")]
    EmptyHash,

    #[error("content hash contains whitespace: {0:?}")]
    InvalidHash(String),

    #[error("empty backend identifier")]
    EmptyBackendId,

    #[error("serialization error: {0}")]
    Serialization(String),
}
