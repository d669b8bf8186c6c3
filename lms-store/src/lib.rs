//! Remote collaborators of the LMS client core.
//!
//! The view layer never talks to a concrete backend. It consumes two traits:
//! - [`CollectionClient`]: point CRUD, equality queries and live snapshot
//!   subscriptions over named document collections
//! - [`AuthProvider`]: sign-in/out, identity creation and auth-state-change
//!   notifications
//!
//! The [`memory`] module provides in-memory implementations of both, used by
//! tests and the demo console.

mod auth;
mod client;
mod error;
pub mod memory;

pub use auth::AuthProvider;
pub use client::{CollectionClient, Snapshot, SnapshotStream};
pub use error::{StoreError, StoreResult};
