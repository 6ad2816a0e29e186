use hashmesh_types::{ContentHash, TypeError};

/// Errors from source operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source affirmatively lacks the object.
    #[error("object not found: {0}")]
    NotFound(ContentHash),

    /// The backend could not be reached or refused the request.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// Encoding or decoding failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The hash cannot be used as a key by this source.
    #[error("invalid hash {hash}: {reason}")]
    InvalidHash { hash: ContentHash, reason: String },

    /// The source does not accept writes.
    #[error("source is read-only")]
    ReadOnly,
}

impl From<TypeError> for SourceError {
    fn from(err: TypeError) -> Self {
        SourceError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Serialization(err.to_string())
    }
}

/// Result alias for source operations.
pub type SourceResult<T> = Result<T, SourceError>;
