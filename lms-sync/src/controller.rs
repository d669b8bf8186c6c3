//! Guarded mutation controller. Every write on a screen goes through here.
//!
//! Lifecycle of a submit:
//!
//! ```text
//! Idle → Validating → Authorizing → (DuplicateChecking) → Writing → (IdentityChaining) → Idle
//! ```
//!
//! Any rejection returns to `Idle`. At most one submit is in flight per
//! controller; a concurrent call is rejected with
//! [`MutationError::AlreadyInProgress`] before it performs any I/O.
//!
//! The duplicate check and the write are two separate calls. Two concurrent
//! writers using the same uniqueness key can both pass the check.

use crate::authz::{AuthorizationContext, AuthzCheck};
use crate::error::MutationError;
use crate::notice::Notice;
use chrono::Utc;
use lms_store::{AuthProvider, CollectionClient, StoreResult};
use lms_types::{CollectionSchema, DocumentId, FieldValue, Fields};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// The kind of write a mutation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Add,
    Update,
    Delete,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Add => "added",
            Self::Update => "updated",
            Self::Delete => "deleted",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user action waiting to be settled. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation {
    pub kind: MutationKind,
    pub target_id: Option<DocumentId>,
    pub payload: Fields,
}

impl PendingMutation {
    pub fn add(payload: Fields) -> Self {
        Self {
            kind: MutationKind::Add,
            target_id: None,
            payload,
        }
    }

    pub fn update(id: DocumentId, payload: Fields) -> Self {
        Self {
            kind: MutationKind::Update,
            target_id: Some(id),
            payload,
        }
    }

    pub fn delete(id: DocumentId) -> Self {
        Self {
            kind: MutationKind::Delete,
            target_id: Some(id),
            payload: Fields::new(),
        }
    }
}

/// What a successful submit wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub kind: MutationKind,
    pub id: DocumentId,
    /// Fields as written (empty for deletes).
    pub fields: Fields,
}

/// Where a submit currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPhase {
    #[default]
    Idle,
    Validating,
    Authorizing,
    DuplicateChecking,
    Writing,
    IdentityChaining,
}

/// Clears the in-flight flag and returns the phase to `Idle` on drop, so
/// every exit path of a submit settles the screen.
struct InFlight<'a> {
    flag: &'a AtomicBool,
    phase: &'a watch::Sender<MutationPhase>,
}

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, phase: &'a watch::Sender<MutationPhase>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag, phase })
    }

    fn enter(&self, next: MutationPhase) {
        self.phase.send_replace(next);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.phase.send_replace(MutationPhase::Idle);
        self.flag.store(false, Ordering::Release);
    }
}

/// Per-screen mutation gate.
pub struct MutationController {
    client: Arc<dyn CollectionClient>,
    auth: Option<Arc<dyn AuthProvider>>,
    in_flight: AtomicBool,
    phase: watch::Sender<MutationPhase>,
    notice: watch::Sender<Option<Notice>>,
    editing: Mutex<Option<DocumentId>>,
}

impl MutationController {
    /// Creates a controller for collections that never create identities.
    pub fn new(client: Arc<dyn CollectionClient>) -> Self {
        let (phase, _) = watch::channel(MutationPhase::Idle);
        let (notice, _) = watch::channel(None);
        Self {
            client,
            auth: None,
            in_flight: AtomicBool::new(false),
            phase,
            notice,
            editing: Mutex::new(None),
        }
    }

    /// Creates a controller that can chain identity creation on add.
    pub fn with_auth(client: Arc<dyn CollectionClient>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            auth: Some(auth),
            ..Self::new(client)
        }
    }

    /// True while a submit is in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> MutationPhase {
        *self.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<MutationPhase> {
        self.phase.subscribe()
    }

    /// The most recent notice.
    pub fn notice(&self) -> Option<Notice> {
        self.notice.borrow().clone()
    }

    pub fn watch_notice(&self) -> watch::Receiver<Option<Notice>> {
        self.notice.subscribe()
    }

    /// Marks `id` as the document being edited.
    pub fn begin_edit(&self, id: DocumentId) {
        *self.editing.lock().unwrap_or_else(|e| e.into_inner()) = Some(id);
    }

    pub fn cancel_edit(&self) {
        *self.editing.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn editing(&self) -> Option<DocumentId> {
        self.editing.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Validates, authorizes and performs one mutation.
    ///
    /// Every outcome is also published as a [`Notice`]. On success the
    /// editing state is cleared.
    pub async fn submit(
        &self,
        pending: PendingMutation,
        schema: &CollectionSchema,
        ctx: &AuthorizationContext,
        authz: &dyn AuthzCheck,
    ) -> Result<MutationOutcome, MutationError> {
        let kind = pending.kind;
        let Some(guard) = InFlight::acquire(&self.in_flight, &self.phase) else {
            debug!("Rejected {} on {}: already in progress", kind, schema.name);
            let err = MutationError::AlreadyInProgress;
            self.notice
                .send_replace(Some(Notice::for_error(schema.name, kind, &err)));
            return Err(err);
        };

        let result = self.run(&guard, pending, schema, ctx, authz).await;
        drop(guard);

        match &result {
            Ok(outcome) => {
                info!("{} {} on {}", outcome.kind.past_tense(), outcome.id, schema.name);
                self.cancel_edit();
                self.notice
                    .send_replace(Some(Notice::for_outcome(schema.name, outcome)));
            }
            Err(e) => {
                warn!("{} on {} failed: {}", kind, schema.name, e);
                self.notice
                    .send_replace(Some(Notice::for_error(schema.name, kind, e)));
            }
        }
        result
    }

    async fn run(
        &self,
        guard: &InFlight<'_>,
        pending: PendingMutation,
        schema: &CollectionSchema,
        ctx: &AuthorizationContext,
        authz: &dyn AuthzCheck,
    ) -> Result<MutationOutcome, MutationError> {
        guard.enter(MutationPhase::Validating);
        validate(&pending, schema)?;

        guard.enter(MutationPhase::Authorizing);
        if !authz.allows(ctx) {
            return Err(MutationError::Authorization {
                action: pending.kind,
                collection: schema.name.to_string(),
            });
        }

        match pending.kind {
            MutationKind::Add => {
                if let Some(field) = schema.uniqueness_field {
                    guard.enter(MutationPhase::DuplicateChecking);
                    self.check_unique(schema, field, &pending.payload).await?;
                }
                self.add(guard, pending.payload, schema).await
            }
            MutationKind::Update => {
                let id = require_target(&pending)?;
                let mut payload = pending.payload;
                if let Some(field) = schema.credential_field {
                    payload.remove(field);
                }
                guard.enter(MutationPhase::Writing);
                self.client
                    .update_document(schema.name, &id, payload.clone())
                    .await?;
                Ok(MutationOutcome {
                    kind: MutationKind::Update,
                    id,
                    fields: payload,
                })
            }
            MutationKind::Delete => {
                let id = require_target(&pending)?;
                guard.enter(MutationPhase::Writing);
                self.client.delete_document(schema.name, &id).await?;
                Ok(MutationOutcome {
                    kind: MutationKind::Delete,
                    id,
                    fields: Fields::new(),
                })
            }
        }
    }

    async fn check_unique(
        &self,
        schema: &CollectionSchema,
        field: &str,
        payload: &Fields,
    ) -> Result<(), MutationError> {
        let value = payload.get(field).cloned().unwrap_or(FieldValue::Null);
        let existing = self.client.query_equals(schema.name, field, &value).await?;
        if !existing.is_empty() {
            return Err(MutationError::Duplicate {
                collection: schema.name.to_string(),
                field: field.to_string(),
                value: value.to_string(),
            });
        }
        Ok(())
    }

    async fn add(
        &self,
        guard: &InFlight<'_>,
        mut payload: Fields,
        schema: &CollectionSchema,
    ) -> Result<MutationOutcome, MutationError> {
        for (field, value) in schema.add_defaults {
            payload.insert(*field, *value);
        }
        if let Some(field) = schema.created_at_field {
            payload.insert(field, Utc::now());
        }

        let credential = match schema.credential_field {
            Some(field) => match payload.remove(field) {
                Some(FieldValue::String(secret)) => Some(secret),
                Some(_) => return Err(MutationError::not_text(field)),
                None => None,
            },
            None => None,
        };

        let id = match credential {
            Some(password) => self.add_with_identity(guard, &mut payload, &password, schema).await?,
            None => {
                guard.enter(MutationPhase::Writing);
                self.client.add_document(schema.name, payload.clone()).await?
            }
        };
        Ok(MutationOutcome {
            kind: MutationKind::Add,
            id,
            fields: payload,
        })
    }

    /// Creates the identity, writes the profile tagged with its uid, then
    /// restores whichever identity was current before. The restore runs even
    /// when a later step fails.
    async fn add_with_identity(
        &self,
        guard: &InFlight<'_>,
        payload: &mut Fields,
        password: &str,
        schema: &CollectionSchema,
    ) -> Result<DocumentId, MutationError> {
        let auth = self
            .auth
            .as_ref()
            .ok_or_else(|| MutationError::Remote("no auth provider configured".into()))?;
        let email = payload
            .get_str(lms_types::schema::user::EMAIL)
            .unwrap_or_default()
            .to_string();

        guard.enter(MutationPhase::IdentityChaining);
        let previous = auth.current_identity();
        let identity = match auth.create_identity(&email, password).await {
            Ok(identity) => identity,
            Err(e) => {
                if let Err(restore_err) = restore(auth.as_ref(), previous).await {
                    warn!("Failed to restore previous session: {}", restore_err);
                }
                return Err(e.into());
            }
        };
        debug!("Created identity {} for {}", identity.uid, email);
        payload.insert(lms_types::schema::user::UID, identity.uid.as_str());

        guard.enter(MutationPhase::Writing);
        let written = self.client.add_document(schema.name, payload.clone()).await;

        guard.enter(MutationPhase::IdentityChaining);
        let restored = restore(auth.as_ref(), previous).await;

        let id = written.map_err(|e| {
            warn!(
                "Identity {} for {} has no profile document: {}",
                identity.uid, email, e
            );
            MutationError::from(e)
        })?;
        restored.map_err(|e| {
            warn!(
                "Profile {} written but the previous session was not restored: {}",
                id, e
            );
            MutationError::from(e)
        })?;
        Ok(id)
    }
}

async fn restore(auth: &dyn AuthProvider, previous: Option<lms_types::Identity>) -> StoreResult<()> {
    auth.restore_current_identity(previous).await
}

fn require_target(pending: &PendingMutation) -> Result<DocumentId, MutationError> {
    pending
        .target_id
        .clone()
        .ok_or_else(|| MutationError::Validation {
            field: "id".into(),
            message: format!("No document selected to {}", pending.kind),
        })
}

/// Checks required fields for the mutation kind. Performs no I/O.
fn validate(pending: &PendingMutation, schema: &CollectionSchema) -> Result<(), MutationError> {
    let required = match pending.kind {
        MutationKind::Add => schema.required_on_add,
        MutationKind::Update => {
            require_target(pending)?;
            schema.required_on_update
        }
        MutationKind::Delete => {
            require_target(pending)?;
            return Ok(());
        }
    };
    if let Some(field) = required.iter().find(|field| pending.payload.is_blank(field)) {
        return Err(MutationError::missing(field));
    }
    if let Some(field) = schema.credential_field {
        if let Some(value) = pending.payload.get(field) {
            if !matches!(value, FieldValue::String(_)) {
                return Err(MutationError::not_text(field));
            }
        }
    }
    Ok(())
}
