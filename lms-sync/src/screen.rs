//! A CRUD screen: one collection, one synchronized list, one mutation gate.

use crate::authz::{AuthorizationContext, AuthorizationTracker, AuthzCheck, RequireAuthorized};
use crate::config::LmsConfig;
use crate::controller::{MutationController, MutationOutcome, MutationPhase, PendingMutation};
use crate::error::{MutationError, SyncResult};
use crate::notice::Notice;
use crate::synchronizer::{ListSynchronizer, ListView};
use lms_store::{AuthProvider, CollectionClient};
use lms_types::{CollectionSchema, DocumentId, Fields, Filter};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Composes a [`ListSynchronizer`] and a [`MutationController`] for one
/// collection schema.
///
/// The screen owns its authorization snapshot and passes it explicitly to
/// every submit. Nothing here outlives an unmount except the read model
/// last published.
pub struct Screen {
    schema: CollectionSchema,
    list: ListSynchronizer,
    controller: MutationController,
    authz: AuthorizationTracker,
    check: Arc<dyn AuthzCheck>,
    optimistic: bool,
}

impl Screen {
    /// Creates an unmounted screen guarded by [`RequireAuthorized`].
    pub fn new(
        schema: CollectionSchema,
        client: Arc<dyn CollectionClient>,
        auth: Arc<dyn AuthProvider>,
        config: &LmsConfig,
    ) -> Self {
        let controller = if schema.credential_field.is_some() {
            MutationController::with_auth(client.clone(), auth.clone())
        } else {
            MutationController::new(client.clone())
        };
        Self {
            authz: AuthorizationTracker::new(auth.as_ref(), config.admin_email.clone()),
            list: ListSynchronizer::new(client),
            controller,
            schema,
            check: Arc::new(RequireAuthorized),
            optimistic: false,
        }
    }

    /// Course registration.
    pub fn courses(
        client: Arc<dyn CollectionClient>,
        auth: Arc<dyn AuthProvider>,
        config: &LmsConfig,
    ) -> Self {
        Self::new(CollectionSchema::courses(), client, auth, config)
    }

    /// Teacher registration.
    pub fn teachers(
        client: Arc<dyn CollectionClient>,
        auth: Arc<dyn AuthProvider>,
        config: &LmsConfig,
    ) -> Self {
        Self::new(CollectionSchema::teachers(), client, auth, config)
    }

    /// Results management, with optimistic echo when configured.
    pub fn results(
        client: Arc<dyn CollectionClient>,
        auth: Arc<dyn AuthProvider>,
        config: &LmsConfig,
    ) -> Self {
        Self::new(CollectionSchema::results(), client, auth, config)
            .with_optimistic(config.optimistic_echo)
    }

    /// Student registration. Adding a student also creates their identity.
    pub fn students(
        client: Arc<dyn CollectionClient>,
        auth: Arc<dyn AuthProvider>,
        config: &LmsConfig,
    ) -> Self {
        Self::new(CollectionSchema::users(), client, auth, config)
    }

    /// Replaces the authorization check.
    #[must_use]
    pub fn with_check(mut self, check: Arc<dyn AuthzCheck>) -> Self {
        self.check = check;
        self
    }

    #[must_use]
    pub fn with_optimistic(mut self, optimistic: bool) -> Self {
        self.optimistic = optimistic;
        self
    }

    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    /// Subscribes to the whole collection.
    pub async fn mount(&mut self) -> SyncResult<()> {
        self.list.open(self.schema.name, None).await?;
        Ok(())
    }

    /// Subscribes to the documents matching `filter`. Calling again with a
    /// new filter releases the previous subscription first.
    pub async fn mount_filtered(&mut self, filter: Filter) -> SyncResult<()> {
        self.list.open(self.schema.name, Some(filter)).await?;
        Ok(())
    }

    /// Releases the subscription and any editing state.
    pub fn unmount(&mut self) {
        self.list.close();
        self.controller.cancel_edit();
        debug!("Unmounted {} screen", self.schema.name);
    }

    pub fn is_mounted(&self) -> bool {
        self.list.handle().is_some()
    }

    pub fn view(&self) -> ListView {
        self.list.view()
    }

    pub fn watch(&self) -> watch::Receiver<ListView> {
        self.list.watch()
    }

    pub fn is_loading(&self) -> bool {
        self.controller.is_loading()
    }

    pub fn phase(&self) -> MutationPhase {
        self.controller.phase()
    }

    pub fn notice(&self) -> Option<Notice> {
        self.controller.notice()
    }

    pub fn authorization(&self) -> AuthorizationContext {
        self.authz.context()
    }

    pub fn begin_edit(&self, id: DocumentId) {
        self.controller.begin_edit(id);
    }

    pub fn cancel_edit(&self) {
        self.controller.cancel_edit();
    }

    pub fn editing(&self) -> Option<DocumentId> {
        self.controller.editing()
    }

    pub async fn add(&self, payload: Fields) -> Result<MutationOutcome, MutationError> {
        self.submit(PendingMutation::add(payload)).await
    }

    pub async fn update(
        &self,
        id: DocumentId,
        payload: Fields,
    ) -> Result<MutationOutcome, MutationError> {
        self.submit(PendingMutation::update(id, payload)).await
    }

    pub async fn delete(&self, id: DocumentId) -> Result<MutationOutcome, MutationError> {
        self.submit(PendingMutation::delete(id)).await
    }

    /// Form save: updates the document being edited, or adds a new one.
    pub async fn save(&self, payload: Fields) -> Result<MutationOutcome, MutationError> {
        match self.editing() {
            Some(id) => self.update(id, payload).await,
            None => self.add(payload).await,
        }
    }

    pub async fn submit(&self, pending: PendingMutation) -> Result<MutationOutcome, MutationError> {
        let ctx = self.authz.context();
        let outcome = self
            .controller
            .submit(pending, &self.schema, &ctx, self.check.as_ref())
            .await?;
        if self.optimistic {
            self.list.apply_settled(&outcome);
        }
        Ok(outcome)
    }
}
