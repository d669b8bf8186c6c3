//! Error types for the view-synchronization layer.

use crate::controller::MutationKind;
use lms_store::StoreError;
use thiserror::Error;

/// Result type for synchronizer, gate and dashboard operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised outside the mutation path.
#[derive(Debug, Error)]
pub enum SyncError {
    /// `open` was called without a collection name.
    #[error("collection name is empty")]
    EmptyCollectionName,

    /// A required form input was blank.
    #[error("please enter {0}")]
    MissingInput(&'static str),

    /// The store or auth provider failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Sign-in was rejected by the auth provider.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Signed in, but no profile document exists for the email.
    #[error("no user found with this email: {0}")]
    UnknownUser(String),

    /// The profile's `type` is not a known role.
    #[error("invalid user type: {0:?}")]
    InvalidUserType(String),

    /// The operation needs a signed-in identity.
    #[error("not signed in")]
    NotSignedIn,
}

/// Errors returned by [`MutationController::submit`](crate::MutationController::submit).
///
/// Every variant is converted into a user-visible notice at the controller
/// boundary; none is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// A required field is missing or blank. No I/O was performed.
    #[error("{message}")]
    Validation { field: String, message: String },

    /// The actor lacks permission. No write was issued.
    #[error("you are not authorized to {action} {collection}")]
    Authorization {
        action: MutationKind,
        collection: String,
    },

    /// A document with the same uniqueness key already exists.
    #[error("a document with {field} = {value} already exists in {collection}")]
    Duplicate {
        collection: String,
        field: String,
        value: String,
    },

    /// Transport or backend failure, with the backend's message.
    #[error("{0}")]
    Remote(String),

    /// Another mutation is still in flight on this screen.
    #[error("another change is still being saved")]
    AlreadyInProgress,
}

impl MutationError {
    pub(crate) fn missing(field: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: format!("Please enter {field}"),
        }
    }

    pub(crate) fn not_text(field: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: format!("{field} must be text"),
        }
    }
}

impl From<StoreError> for MutationError {
    fn from(e: StoreError) -> Self {
        Self::Remote(e.to_string())
    }
}
