use crate::auth::AuthProvider;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use lms_types::{Identity, IdentityId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::debug;

const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    password: String,
    identity: Identity,
}

/// An auth provider kept entirely in memory.
///
/// Mirrors hosted providers in one important way: creating an identity
/// switches the current session to it.
pub struct MemoryAuthProvider {
    accounts: Mutex<HashMap<String, Account>>,
    current: watch::Sender<Option<Identity>>,
    identities_created: AtomicUsize,
    fail_next_create: Mutex<Option<String>>,
}

impl Default for MemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current,
            identities_created: AtomicUsize::new(0),
            fail_next_create: Mutex::new(None),
        }
    }

    /// Registers an account without touching the current session.
    pub fn register(&self, email: &str, password: &str) -> Identity {
        let identity = Identity::new(IdentityId::generate(), email);
        self.accounts().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                identity: identity.clone(),
            },
        );
        identity
    }

    /// Number of successful `create_identity` calls.
    pub fn identities_created(&self) -> usize {
        self.identities_created.load(Ordering::SeqCst)
    }

    /// Whether an account exists for `email`.
    pub fn has_account(&self, email: &str) -> bool {
        self.accounts().contains_key(email)
    }

    /// The next `create_identity` fails with `StoreError::Auth(message)`.
    pub fn fail_next_create(&self, message: impl Into<String>) {
        *self.fail_next_create.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }

    fn accounts(&self) -> std::sync::MutexGuard<'_, HashMap<String, Account>> {
        self.accounts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> StoreResult<Identity> {
        let identity = {
            let accounts = self.accounts();
            match accounts.get(email) {
                Some(account) if account.password == password => account.identity.clone(),
                _ => return Err(StoreError::Auth("invalid email or password".into())),
            }
        };
        self.current.send_replace(Some(identity.clone()));
        debug!("Signed in {}", email);
        Ok(identity)
    }

    async fn sign_out(&self) -> StoreResult<()> {
        self.current.send_replace(None);
        Ok(())
    }

    async fn create_identity(&self, email: &str, password: &str) -> StoreResult<Identity> {
        if let Some(msg) = self.fail_next_create.lock().unwrap_or_else(|e| e.into_inner()).take() {
            return Err(StoreError::Auth(msg));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(StoreError::Auth(format!(
                "password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.has_account(email) {
            return Err(StoreError::Auth(format!("email already in use: {email}")));
        }
        let identity = self.register(email, password);
        self.identities_created.fetch_add(1, Ordering::SeqCst);
        self.current.send_replace(Some(identity.clone()));
        debug!("Created identity {} for {}", identity.uid, email);
        Ok(identity)
    }

    async fn restore_current_identity(&self, identity: Option<Identity>) -> StoreResult<()> {
        self.current.send_replace(identity);
        Ok(())
    }

    fn on_auth_state_change(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }

    fn current_identity(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }
}
