//! Authorization context and the checks evaluated before every write.
//!
//! The context is an explicit snapshot derived from auth-state-change
//! notifications. The mutation controller never reads the auth provider
//! directly; screens pass it the context they hold.

use lms_store::AuthProvider;
use lms_types::Identity;
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::debug;

/// Who is acting, and whether they may mutate admin screens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationContext {
    pub current_user_email: Option<String>,
    pub is_authorized: bool,
}

impl AuthorizationContext {
    /// Nobody signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Derives the context for `identity`: authorized iff its email is the
    /// configured admin email.
    pub fn from_identity(identity: Option<&Identity>, admin_email: &str) -> Self {
        match identity {
            Some(id) => Self {
                current_user_email: Some(id.email.clone()),
                is_authorized: id.email == admin_email,
            },
            None => Self::anonymous(),
        }
    }
}

/// A predicate over the authorization context.
pub trait AuthzCheck: Send + Sync {
    fn allows(&self, ctx: &AuthorizationContext) -> bool;
}

impl<F> AuthzCheck for F
where
    F: Fn(&AuthorizationContext) -> bool + Send + Sync,
{
    fn allows(&self, ctx: &AuthorizationContext) -> bool {
        self(ctx)
    }
}

/// Only the configured admin may write.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireAuthorized;

impl AuthzCheck for RequireAuthorized {
    fn allows(&self, ctx: &AuthorizationContext) -> bool {
        ctx.is_authorized
    }
}

/// Any signed-in identity may write.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireSignedIn;

impl AuthzCheck for RequireSignedIn {
    fn allows(&self, ctx: &AuthorizationContext) -> bool {
        ctx.current_user_email.is_some()
    }
}

/// Allows everything. For tests and unguarded screens.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthzCheck for AllowAll {
    fn allows(&self, _ctx: &AuthorizationContext) -> bool {
        true
    }
}

/// Keeps a screen's [`AuthorizationContext`] current.
///
/// The snapshot changes only when the provider's auth-state channel reports a
/// change. Dropping the tracker drops the receiver, which unsubscribes.
pub struct AuthorizationTracker {
    rx: Mutex<watch::Receiver<Option<Identity>>>,
    admin_email: String,
    snapshot: Mutex<AuthorizationContext>,
}

impl AuthorizationTracker {
    pub fn new(auth: &dyn AuthProvider, admin_email: impl Into<String>) -> Self {
        let admin_email = admin_email.into();
        let mut rx = auth.on_auth_state_change();
        let snapshot =
            AuthorizationContext::from_identity(rx.borrow_and_update().as_ref(), &admin_email);
        Self {
            rx: Mutex::new(rx),
            admin_email,
            snapshot: Mutex::new(snapshot),
        }
    }

    /// Returns the current context, folding in any pending notification.
    pub fn context(&self) -> AuthorizationContext {
        let mut rx = self.rx.lock().unwrap_or_else(|e| e.into_inner());
        let mut snapshot = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        if rx.has_changed().unwrap_or(false) {
            let identity = rx.borrow_and_update().clone();
            *snapshot = AuthorizationContext::from_identity(identity.as_ref(), &self.admin_email);
            debug!(
                "Authorization context refreshed: {:?} (authorized: {})",
                snapshot.current_user_email, snapshot.is_authorized
            );
        }
        snapshot.clone()
    }

    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }
}
