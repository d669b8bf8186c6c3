//! Shared test helpers for lms-sync tests.

#![allow(dead_code)]

use lms_store::memory::{MemoryAuthProvider, MemoryCollectionClient};
use lms_store::{AuthProvider, CollectionClient};
use lms_sync::{LmsConfig, ListView};
use lms_types::Fields;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub const ADMIN_EMAIL: &str = "admin08@gmail.com";
pub const ADMIN_PASSWORD: &str = "admin-pass";

/// In-memory backend with an admin account and admin profile document.
pub struct Backend {
    pub client: Arc<MemoryCollectionClient>,
    pub auth: Arc<MemoryAuthProvider>,
    pub config: LmsConfig,
}

impl Backend {
    pub fn new() -> Self {
        init_tracing();
        let client = Arc::new(MemoryCollectionClient::new());
        let auth = Arc::new(MemoryAuthProvider::new());
        auth.register(ADMIN_EMAIL, ADMIN_PASSWORD);
        client.seed(
            "users",
            Fields::new()
                .with("name", "Admin")
                .with("email", ADMIN_EMAIL)
                .with("type", "admin"),
        );
        Self {
            client,
            auth,
            config: LmsConfig::default(),
        }
    }

    /// A backend where the admin is already signed in.
    pub async fn with_admin() -> Self {
        let backend = Self::new();
        backend
            .auth
            .sign_in(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .unwrap();
        backend
    }

    pub fn client(&self) -> Arc<dyn CollectionClient> {
        self.client.clone()
    }

    pub fn auth(&self) -> Arc<dyn AuthProvider> {
        self.auth.clone()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn course(name: &str, duration: &str, timing: &str) -> Fields {
    Fields::new()
        .with("name", name)
        .with("duration", duration)
        .with("timing", timing)
}

pub fn teacher(name: &str) -> Fields {
    Fields::new()
        .with("name", name)
        .with("designation", "Lecturer")
        .with("profileUrl", "https://example.com/t.png")
}

pub fn result_for(email: &str, marks: &str) -> Fields {
    Fields::new()
        .with("studentName", "Ann")
        .with("subject", "Math")
        .with("marks", marks)
        .with("grade", "A")
        .with("studentEmail", email)
}

pub fn student(name: &str, email: &str, password: &str) -> Fields {
    Fields::new()
        .with("name", name)
        .with("email", email)
        .with("password", password)
}

/// Waits (bounded) until the view satisfies `pred`.
pub async fn wait_for_view(
    rx: &mut watch::Receiver<ListView>,
    pred: impl FnMut(&ListView) -> bool,
) -> ListView {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("timed out waiting for list view")
        .expect("view channel closed")
        .clone()
}

/// Waits for the first snapshot to land.
pub async fn wait_loaded(rx: &mut watch::Receiver<ListView>) -> ListView {
    wait_for_view(rx, |v| !v.loading).await
}

/// Gives spawned listeners a chance to run.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}
