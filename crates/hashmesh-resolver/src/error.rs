use hashmesh_known::KnownError;
use hashmesh_source::SourceError;
use hashmesh_types::BackendId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("source initialisation failed: {0}")]
    Init(#[from] KnownError),

    #[error("backend configured twice: {0}")]
    DuplicateBackend(BackendId),

    #[error("unknown backend: {0}")]
    UnknownBackend(BackendId),

    #[error("no backends configured")]
    NoBackends,

    #[error("creation failed on {backend}: {source}")]
    Create {
        backend: BackendId,
        #[source]
        source: SourceError,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Why a single backend attempt did not produce the object.
///
/// The race treats every variant the same way; the distinction only
/// reaches logs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AttemptError {
    #[error("{backend}: not found")]
    NotFound { backend: BackendId },

    #[error("{backend}: not configured on this resolver")]
    UnknownBackend { backend: BackendId },

    #[error("{backend}: {reason}")]
    Backend { backend: BackendId, reason: String },
}

impl AttemptError {
    pub fn backend(&self) -> &BackendId {
        match self {
            Self::NotFound { backend }
            | Self::UnknownBackend { backend }
            | Self::Backend { backend, .. } => backend,
        }
    }
}
