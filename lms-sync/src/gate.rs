//! Login gate: signs a user in and routes them by the role on their profile.

use crate::error::{SyncError, SyncResult};
use lms_store::{AuthProvider, CollectionClient};
use lms_types::schema::{collections, user};
use lms_types::{Document, FieldValue, Identity, UserType};
use std::sync::Arc;
use tracing::{info, warn};

/// Where a signed-in user lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    AdminDashboard,
    StudentDashboard,
}

impl Route {
    pub fn for_user_type(user_type: UserType) -> Self {
        match user_type {
            UserType::Admin => Self::AdminDashboard,
            UserType::Student => Self::StudentDashboard,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::AdminDashboard => "/dashboard",
            Self::StudentDashboard => "/student-dashboard",
        }
    }
}

/// Sections of the admin dashboard and the collection each one manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminSection {
    StudentRegistration,
    CourseRegistration,
    TeacherRegistration,
    Result,
}

impl AdminSection {
    pub const ALL: [AdminSection; 4] = [
        Self::StudentRegistration,
        Self::CourseRegistration,
        Self::TeacherRegistration,
        Self::Result,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::StudentRegistration => "student-registration",
            Self::CourseRegistration => "course-registration",
            Self::TeacherRegistration => "teacher-registration",
            Self::Result => "result",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::StudentRegistration => "Student Registration",
            Self::CourseRegistration => "Course Registration",
            Self::TeacherRegistration => "Teacher Registration",
            Self::Result => "Result",
        }
    }

    pub fn collection(&self) -> &'static str {
        match self {
            Self::StudentRegistration => collections::USERS,
            Self::CourseRegistration => collections::COURSES,
            Self::TeacherRegistration => collections::TEACHERS,
            Self::Result => collections::RESULTS,
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.path() == path)
    }
}

/// A routed, signed-in user.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub identity: Identity,
    pub user_type: UserType,
    pub profile: Document,
    pub route: Route,
}

/// Credential login followed by profile lookup.
pub struct LoginGate {
    client: Arc<dyn CollectionClient>,
    auth: Arc<dyn AuthProvider>,
}

impl LoginGate {
    pub fn new(client: Arc<dyn CollectionClient>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { client, auth }
    }

    /// Signs in and resolves the route from the profile's `type`.
    ///
    /// A user with no profile, or with an unknown role, is signed out again.
    pub async fn sign_in(&self, email: &str, password: &str) -> SyncResult<Session> {
        let email = email.trim();
        if email.is_empty() {
            return Err(SyncError::MissingInput("your email"));
        }
        if password.is_empty() {
            return Err(SyncError::MissingInput("your password"));
        }

        let identity = self.auth.sign_in(email, password).await.map_err(|e| {
            warn!("Sign-in failed for {}: {}", email, e);
            SyncError::InvalidCredentials
        })?;

        match self.resolve(email).await {
            Ok((user_type, profile)) => {
                let route = Route::for_user_type(user_type);
                info!("{} signed in as {}, routing to {}", email, user_type, route.path());
                Ok(Session {
                    identity,
                    user_type,
                    profile,
                    route,
                })
            }
            Err(e) => {
                warn!("Rejecting sign-in for {}: {}", email, e);
                if let Err(sign_out) = self.auth.sign_out().await {
                    warn!("Sign-out after rejected login failed: {}", sign_out);
                }
                Err(e)
            }
        }
    }

    pub async fn sign_out(&self) -> SyncResult<()> {
        self.auth.sign_out().await?;
        info!("Signed out");
        Ok(())
    }

    async fn resolve(&self, email: &str) -> SyncResult<(UserType, Document)> {
        let profile = self
            .client
            .query_equals(collections::USERS, user::EMAIL, &FieldValue::from(email))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::UnknownUser(email.to_string()))?;
        let raw = profile.get_str(user::TYPE).unwrap_or_default();
        let user_type =
            UserType::parse(raw).ok_or_else(|| SyncError::InvalidUserType(raw.to_string()))?;
        Ok((user_type, profile))
    }
}
