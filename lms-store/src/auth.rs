//! Authentication provider abstraction.

use crate::error::StoreResult;
use async_trait::async_trait;
use lms_types::Identity;
use tokio::sync::watch;
use tracing::debug;

/// Current-user tracking, sign-in/out and account creation.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Signs in with credentials; the identity becomes current.
    async fn sign_in(&self, email: &str, password: &str) -> StoreResult<Identity>;

    /// Signs out the current identity.
    async fn sign_out(&self) -> StoreResult<()>;

    /// Creates a new identity.
    ///
    /// Like most hosted auth services, this also makes the new identity the
    /// current one. Callers that must keep the operator signed in should use
    /// [`AuthProvider::create_identity_preserving_session`].
    async fn create_identity(&self, email: &str, password: &str) -> StoreResult<Identity>;

    /// Makes `identity` the current identity again.
    async fn restore_current_identity(&self, identity: Option<Identity>) -> StoreResult<()>;

    /// Auth-state-change notifications. Dropping the receiver unsubscribes.
    fn on_auth_state_change(&self) -> watch::Receiver<Option<Identity>>;

    /// The current identity, if signed in.
    fn current_identity(&self) -> Option<Identity>;

    /// Captures the current identity, creates a new one, then restores the
    /// captured identity. The restore runs even when creation fails.
    ///
    /// For callers with nothing to do between creation and restore. Callers
    /// that must write under the new identity before restoring (a profile
    /// document tagged with its uid) sequence the three calls themselves.
    async fn create_identity_preserving_session(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<Identity> {
        let previous = self.current_identity();
        let created = self.create_identity(email, password).await;
        self.restore_current_identity(previous).await?;
        debug!("Restored session after creating identity for {}", email);
        created
    }
}
