//! Student dashboard: profile lookup and read-once result search.

use crate::error::{SyncError, SyncResult};
use crate::synchronizer::{ListSynchronizer, ListView};
use lms_store::{AuthProvider, CollectionClient};
use lms_types::schema::{collections, result, user};
use lms_types::{FieldValue, Filter};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

const DEFAULT_STUDENT_NAME: &str = "Student";

/// What the dashboard header shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentProfile {
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
}

/// Read-only view for a signed-in student.
///
/// Results are fetched on demand rather than subscribed to.
pub struct StudentDashboard {
    client: Arc<dyn CollectionClient>,
    auth: Arc<dyn AuthProvider>,
    results: ListSynchronizer,
    searched: bool,
}

impl StudentDashboard {
    pub fn new(client: Arc<dyn CollectionClient>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            results: ListSynchronizer::read_once(client.clone()),
            client,
            auth,
            searched: false,
        }
    }

    /// Loads the header for the current identity, preferring the profile
    /// document's name over the identity's display name.
    pub async fn load_profile(&self) -> SyncResult<StudentProfile> {
        let identity = self.auth.current_identity().ok_or(SyncError::NotSignedIn)?;
        let mut profile = StudentProfile {
            name: identity
                .display_name
                .clone()
                .unwrap_or_else(|| DEFAULT_STUDENT_NAME.to_string()),
            email: identity.email.clone(),
            photo_url: None,
        };

        let docs = self
            .client
            .query_equals(collections::USERS, user::EMAIL, &FieldValue::from(identity.email.as_str()))
            .await?;
        if let Some(doc) = docs.first() {
            if let Some(name) = doc.get_str(user::NAME) {
                profile.name = name.to_string();
            }
            profile.photo_url = doc.get_str(user::PHOTO_URL).map(str::to_string);
        }
        debug!("Loaded student profile for {}", profile.email);
        Ok(profile)
    }

    /// Replaces the result list with the results recorded for `email`.
    pub async fn search(&mut self, email: &str) -> SyncResult<ListView> {
        let email = email.trim();
        if email.is_empty() {
            return Err(SyncError::MissingInput("an email to search"));
        }
        self.searched = true;
        self.results
            .refetch(collections::RESULTS, &Filter::equals(result::STUDENT_EMAIL, email))
            .await
    }

    /// True once a search has run and found nothing.
    pub fn shows_empty_state(&self) -> bool {
        let view = self.results.view();
        self.searched && !view.loading && view.is_empty()
    }

    pub fn view(&self) -> ListView {
        self.results.view()
    }

    pub fn watch(&self) -> watch::Receiver<ListView> {
        self.results.watch()
    }
}
