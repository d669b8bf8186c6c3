//! Error types for the store layer.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by a document store or auth provider.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Transport or backend failure, carrying the backend's message.
    #[error("remote error: {0}")]
    Remote(String),

    /// Document not found.
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// Rejected input (empty collection name, malformed filter, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Authentication failure.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Subscription channel closed.
    #[error("channel closed")]
    ChannelClosed,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
