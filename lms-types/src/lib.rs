//! Core type definitions for the LMS client core.
//!
//! This crate defines the backend-agnostic types shared by the store
//! abstraction and the view-synchronization layer:
//! - Document and identity identifiers
//! - [`Document`], [`Fields`] and [`FieldValue`], the flat document model
//! - [`Filter`], the single-field equality constraint used by subscriptions and queries
//! - [`CollectionSchema`], the persisted field names and per-collection mutation rules

mod document;
mod identity;
mod ids;
pub mod schema;

pub use document::{Document, FieldValue, Fields, Filter};
pub use identity::Identity;
pub use ids::{DocumentId, IdentityId};
pub use schema::{CollectionSchema, UserType};

/// The local mirror of one remote document, as held by a list view.
pub type ListItem = Document;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid id: {0:?}")]
    InvalidId(String),
}
