//! Synchronized list views and guarded mutations for the LMS client.
//!
//! Every CRUD screen of the client (students, teachers, courses, results)
//! follows the same pattern: mirror a remote collection into a local list,
//! and funnel every write through a single gate that validates, authorizes,
//! de-duplicates and serializes it.
//!
//! # Components
//!
//! - **Synchronizer**: subscribes to a collection and replaces the local list
//!   on every snapshot ([`ListSynchronizer`])
//! - **Controller**: the guarded mutation path ([`MutationController`])
//! - **Authorization**: the explicit context every write is checked against
//!   ([`AuthorizationContext`], [`AuthzCheck`])
//! - **Screen**: one collection's synchronizer and controller together ([`Screen`])
//! - **Gate**: sign-in and role routing ([`LoginGate`])
//! - **Student dashboard**: read-once result search ([`StudentDashboard`])
//!
//! # Example
//!
//! ```no_run
//! use lms_store::memory::{MemoryAuthProvider, MemoryCollectionClient};
//! use lms_sync::{LmsConfig, Screen};
//! use lms_types::Fields;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(MemoryCollectionClient::new());
//! let auth = Arc::new(MemoryAuthProvider::new());
//! let config = LmsConfig::default();
//!
//! let mut courses = Screen::courses(client, auth, &config);
//! courses.mount().await?;
//! courses
//!     .add(Fields::new().with("name", "Algebra").with("duration", "3mo").with("timing", "9am"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod authz;
mod config;
pub mod controller;
mod error;
pub mod gate;
pub mod notice;
mod screen;
pub mod student;
pub mod synchronizer;

pub use authz::{
    AllowAll, AuthorizationContext, AuthorizationTracker, AuthzCheck, RequireAuthorized,
    RequireSignedIn,
};
pub use config::{ConfigError, LmsConfig, ADMIN_EMAIL_ENV};
pub use controller::{
    MutationController, MutationKind, MutationOutcome, MutationPhase, PendingMutation,
};
pub use error::{MutationError, SyncError, SyncResult};
pub use gate::{AdminSection, LoginGate, Route, Session};
pub use notice::{Notice, NoticeLevel};
pub use screen::Screen;
pub use student::{StudentDashboard, StudentProfile};
pub use synchronizer::{ListSynchronizer, ListView, SubscriptionHandle};
