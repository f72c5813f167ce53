use scrobble_sources::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored identity {id} is unreadable: {message}")]
    Serialization { id: String, message: String },

    #[error("identity id '{0}' is not a valid key")]
    InvalidId(String),

    #[error("{backend} backend error: {source}")]
    Backend {
        backend: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{0} backend is not available in this build")]
    Unavailable(&'static str),
}

impl StoreError {
    pub fn backend<E>(backend: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend {
            backend,
            source: Box::new(source),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no catalog match for {0}")]
    NotFound(String),

    #[error("library section '{0}' holds neither shows nor movies")]
    Unsupported(String),
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("authorization code rejected: {0}")]
    AuthFailed(#[source] SourceError),

    #[error("refresh token for identity {id} was rejected: {source}")]
    RefreshRejected {
        id: String,
        #[source]
        source: SourceError,
    },

    #[error("identity {0} not found")]
    NotFound(String),

    #[error("media resolution failed: {0}")]
    ResolutionFailed(#[from] ResolveError),

    #[error("identity {0} is no longer authorized, link the account again")]
    Unauthorized(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("tracking service call failed: {0}")]
    Tracking(#[source] SourceError),
}
