use thiserror::Error;

/// Errors from known-source index operations.
///
/// The in-memory index never fails; these exist for indexes reached over a
/// network or backed by persistent storage.
#[derive(Debug, Error)]
pub enum KnownError {
    #[error("index unavailable: {0}")]
    Unavailable(String),

    #[error("index backend error: {0}")]
    Backend(String),

    #[error("index lock poisoned")]
    Poisoned,
}

pub type KnownResult<T> = Result<T, KnownError>;
