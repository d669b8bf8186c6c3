mod common;

use common::{result_for, Backend};
use lms_store::AuthProvider;
use lms_sync::{StudentDashboard, SyncError};
use lms_types::Fields;
use pretty_assertions::assert_eq;

async fn signed_in_student(backend: &Backend) {
    backend.auth.register("ann@x.com", "secret1");
    backend.auth.sign_in("ann@x.com", "secret1").await.unwrap();
}

#[tokio::test]
async fn profile_prefers_document_name() {
    let backend = Backend::new();
    signed_in_student(&backend).await;
    backend.client.seed(
        "users",
        Fields::new()
            .with("name", "Ann Lee")
            .with("email", "ann@x.com")
            .with("type", "student")
            .with("photoURL", "https://example.com/ann.png"),
    );
    let dashboard = StudentDashboard::new(backend.client(), backend.auth());

    let profile = dashboard.load_profile().await.unwrap();
    assert_eq!(profile.email, "ann@x.com");
    assert_eq!(profile.name, "Ann Lee");
    assert_eq!(profile.photo_url.as_deref(), Some("https://example.com/ann.png"));
}

#[tokio::test]
async fn profile_defaults_without_document() {
    let backend = Backend::new();
    signed_in_student(&backend).await;
    let dashboard = StudentDashboard::new(backend.client(), backend.auth());

    let profile = dashboard.load_profile().await.unwrap();
    assert_eq!(profile.name, "Student");
    assert_eq!(profile.photo_url, None);
}

#[tokio::test]
async fn profile_requires_sign_in() {
    let backend = Backend::new();
    let dashboard = StudentDashboard::new(backend.client(), backend.auth());
    let err = dashboard.load_profile().await.unwrap_err();
    assert!(matches!(err, SyncError::NotSignedIn));
}

#[tokio::test]
async fn search_lists_only_matching_results() {
    let backend = Backend::new();
    backend.client.seed("results", result_for("ann@x.com", "80"));
    backend.client.seed("results", result_for("bob@x.com", "70"));
    let mut dashboard = StudentDashboard::new(backend.client(), backend.auth());
    assert!(!dashboard.view().loading);
    assert!(!dashboard.shows_empty_state());

    let view = dashboard.search(" ann@x.com ").await.unwrap();
    assert_eq!(view.len(), 1);
    assert_eq!(view.items[0].get_str("marks"), Some("80"));
    assert!(!dashboard.shows_empty_state());
}

#[tokio::test]
async fn search_with_no_results_shows_empty_state() {
    let backend = Backend::new();
    backend.client.seed("results", result_for("ann@x.com", "80"));
    let mut dashboard = StudentDashboard::new(backend.client(), backend.auth());

    dashboard.search("ann@x.com").await.unwrap();
    let view = dashboard.search("nobody@x.com").await.unwrap();
    assert!(view.is_empty());
    assert!(dashboard.shows_empty_state());
}

#[tokio::test]
async fn blank_search_rejected_without_query() {
    let backend = Backend::new();
    let mut dashboard = StudentDashboard::new(backend.client(), backend.auth());

    let err = dashboard.search("   ").await.unwrap_err();
    assert!(matches!(err, SyncError::MissingInput(_)));
    assert_eq!(backend.client.stats().queries, 0);
    assert!(!dashboard.shows_empty_state());
}

#[tokio::test]
async fn search_is_read_once() {
    let backend = Backend::new();
    let mut dashboard = StudentDashboard::new(backend.client(), backend.auth());
    dashboard.search("ann@x.com").await.unwrap();

    backend.client.seed("results", result_for("ann@x.com", "80"));
    common::settle().await;
    assert!(dashboard.view().is_empty());

    let view = dashboard.search("ann@x.com").await.unwrap();
    assert_eq!(view.len(), 1);
}
