//! In-memory backends for tests and demos.
//!
//! Both implementations keep call accounting so callers can assert that an
//! operation performed no I/O, and support one-shot failure injection.

mod auth;
mod collection;

pub use auth::MemoryAuthProvider;
pub use collection::{CallStats, MemoryCollectionClient, WriteGate};
