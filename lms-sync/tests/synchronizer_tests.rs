mod common;

use common::{course, settle, wait_for_view, wait_loaded, Backend};
use lms_store::CollectionClient;
use lms_sync::controller::{MutationKind, MutationOutcome};
use lms_sync::{ListSynchronizer, SyncError};
use lms_types::{DocumentId, Fields, Filter};
use pretty_assertions::assert_eq;

fn names(view: &lms_sync::ListView) -> Vec<String> {
    view.items
        .iter()
        .filter_map(|i| i.get_str("name").map(str::to_string))
        .collect()
}

// ── Open ────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_collection_name_rejected_without_io() {
    let backend = Backend::new();
    let mut sync = ListSynchronizer::new(backend.client());

    let err = sync.open("", None).await.unwrap_err();
    assert!(matches!(err, SyncError::EmptyCollectionName));
    let err = sync.open("   ", None).await.unwrap_err();
    assert!(matches!(err, SyncError::EmptyCollectionName));
    assert_eq!(backend.client.stats().subscribes, 0);
}

#[tokio::test]
async fn starts_loading_then_loads_once() {
    let backend = Backend::new();
    let mut sync = ListSynchronizer::new(backend.client());
    assert!(sync.view().loading);

    let mut rx = sync.watch();
    sync.open("courses", None).await.unwrap();
    let view = wait_loaded(&mut rx).await;
    assert!(!view.loading);
    assert!(view.is_empty());
    assert_eq!(view.error, None);
}

#[tokio::test]
async fn initial_snapshot_preserves_server_order() {
    let backend = Backend::new();
    backend.client.seed("courses", course("Algebra", "3mo", "9am"));
    backend.client.seed("courses", course("Biology", "2mo", "10am"));
    backend.client.seed("courses", course("Chemistry", "1mo", "1pm"));

    let mut sync = ListSynchronizer::new(backend.client());
    let mut rx = sync.watch();
    sync.open("courses", None).await.unwrap();
    let view = wait_loaded(&mut rx).await;
    assert_eq!(names(&view), vec!["Algebra", "Biology", "Chemistry"]);
}

// ── Snapshot replacement ────────────────────────────────────────

#[tokio::test]
async fn each_snapshot_replaces_the_list() {
    let backend = Backend::new();
    let algebra = backend.client.seed("courses", course("Algebra", "3mo", "9am"));

    let mut sync = ListSynchronizer::new(backend.client());
    let mut rx = sync.watch();
    sync.open("courses", None).await.unwrap();
    wait_loaded(&mut rx).await;

    backend
        .client
        .add_document("courses", course("Biology", "2mo", "10am"))
        .await
        .unwrap();
    backend.client.delete_document("courses", &algebra).await.unwrap();

    let view = wait_for_view(&mut rx, |v| !v.contains(&algebra) && v.len() == 1).await;
    assert_eq!(names(&view), vec!["Biology"]);
    assert_eq!(view.items, backend.client.documents("courses"));
}

#[tokio::test]
async fn identical_reemission_is_idempotent() {
    let backend = Backend::new();
    backend.client.seed("courses", course("Algebra", "3mo", "9am"));

    let mut sync = ListSynchronizer::new(backend.client());
    let mut rx = sync.watch();
    sync.open("courses", None).await.unwrap();
    let first = wait_loaded(&mut rx).await;

    backend.client.emit("courses");
    let second = wait_for_view(&mut rx, |v| v.revision > first.revision).await;
    assert_eq!(second.items, first.items);
    assert!(!second.loading);
}

#[tokio::test]
async fn filtered_open_only_mirrors_matches() {
    let backend = Backend::new();
    backend
        .client
        .seed("results", Fields::new().with("studentEmail", "a@x.com"));
    backend
        .client
        .seed("results", Fields::new().with("studentEmail", "b@x.com"));

    let mut sync = ListSynchronizer::new(backend.client());
    let mut rx = sync.watch();
    sync.open("results", Some(Filter::equals("studentEmail", "a@x.com")))
        .await
        .unwrap();
    let view = wait_loaded(&mut rx).await;
    assert_eq!(view.len(), 1);
    assert_eq!(view.items[0].get_str("studentEmail"), Some("a@x.com"));
}

#[tokio::test]
async fn stream_error_is_surfaced_and_items_kept() {
    let backend = Backend::new();
    backend.client.seed("courses", course("Algebra", "3mo", "9am"));

    let mut sync = ListSynchronizer::new(backend.client());
    let mut rx = sync.watch();
    sync.open("courses", None).await.unwrap();
    wait_loaded(&mut rx).await;

    backend.client.emit_error("courses", "permission denied");
    let view = wait_for_view(&mut rx, |v| v.error.is_some()).await;
    assert_eq!(view.error.as_deref(), Some("remote error: permission denied"));
    assert_eq!(view.len(), 1);
    assert!(!view.loading);
}

// ── Close ───────────────────────────────────────────────────────

#[tokio::test]
async fn no_updates_after_close() {
    let backend = Backend::new();
    let mut sync = ListSynchronizer::new(backend.client());
    let mut rx = sync.watch();
    let handle = sync.open("courses", None).await.unwrap();
    wait_loaded(&mut rx).await;

    handle.close();
    assert!(!handle.is_live());
    let before = rx.borrow_and_update().clone();

    backend
        .client
        .add_document("courses", course("Algebra", "3mo", "9am"))
        .await
        .unwrap();
    backend.client.emit("courses");
    settle().await;

    assert!(!rx.has_changed().unwrap());
    assert_eq!(sync.view(), before);
    assert!(sync.handle().is_none());
}

#[tokio::test]
async fn close_is_idempotent() {
    let backend = Backend::new();
    let mut sync = ListSynchronizer::new(backend.client());
    let handle = sync.open("courses", None).await.unwrap();

    handle.close();
    handle.close();
    sync.close();
    sync.close();
    assert!(!handle.is_live());
}

#[tokio::test]
async fn reopen_releases_previous_subscription() {
    let backend = Backend::new();
    backend
        .client
        .seed("results", Fields::new().with("studentEmail", "a@x.com"));
    backend
        .client
        .seed("results", Fields::new().with("studentEmail", "b@x.com"));

    let mut sync = ListSynchronizer::new(backend.client());
    let mut rx = sync.watch();
    let first = sync
        .open("results", Some(Filter::equals("studentEmail", "a@x.com")))
        .await
        .unwrap();
    wait_loaded(&mut rx).await;

    let second = sync
        .open("results", Some(Filter::equals("studentEmail", "b@x.com")))
        .await
        .unwrap();
    assert!(!first.is_live());
    assert!(second.is_live());
    assert_ne!(first.id(), second.id());

    let view = wait_loaded(&mut rx).await;
    assert_eq!(view.len(), 1);
    assert_eq!(view.items[0].get_str("studentEmail"), Some("b@x.com"));

    // A write matching only the old filter must not leak into the view.
    backend
        .client
        .add_document("results", Fields::new().with("studentEmail", "a@x.com"))
        .await
        .unwrap();
    settle().await;
    assert_eq!(sync.view().len(), 1);

    settle().await;
    assert_eq!(backend.client.live_subscribers("results"), 1);
}

#[tokio::test]
async fn drop_closes_subscription() {
    let backend = Backend::new();
    let handle = {
        let mut sync = ListSynchronizer::new(backend.client());
        sync.open("courses", None).await.unwrap()
    };
    assert!(!handle.is_live());
}

// ── Settled echo ────────────────────────────────────────────────

#[tokio::test]
async fn apply_settled_echoes_add_update_delete() {
    let backend = Backend::new();
    let sync = ListSynchronizer::read_once(backend.client());
    let id = DocumentId::new("r1");

    sync.apply_settled(&MutationOutcome {
        kind: MutationKind::Add,
        id: id.clone(),
        fields: Fields::new().with("marks", "80"),
    });
    assert_eq!(sync.view().len(), 1);

    // A repeated add echo does not duplicate the row.
    sync.apply_settled(&MutationOutcome {
        kind: MutationKind::Add,
        id: id.clone(),
        fields: Fields::new().with("marks", "80"),
    });
    assert_eq!(sync.view().len(), 1);

    sync.apply_settled(&MutationOutcome {
        kind: MutationKind::Update,
        id: id.clone(),
        fields: Fields::new().with("marks", "95"),
    });
    assert_eq!(sync.view().get(&id).unwrap().get_str("marks"), Some("95"));

    sync.apply_settled(&MutationOutcome {
        kind: MutationKind::Delete,
        id: id.clone(),
        fields: Fields::new(),
    });
    assert!(sync.view().is_empty());
}

// ── Read-once ───────────────────────────────────────────────────

#[tokio::test]
async fn refetch_replaces_with_query_result() {
    let backend = Backend::new();
    backend
        .client
        .seed("results", Fields::new().with("studentEmail", "a@x.com"));
    backend
        .client
        .seed("results", Fields::new().with("studentEmail", "b@x.com"));

    let mut sync = ListSynchronizer::read_once(backend.client());
    assert!(!sync.view().loading);

    let view = sync
        .refetch("results", &Filter::equals("studentEmail", "b@x.com"))
        .await
        .unwrap();
    assert_eq!(view.len(), 1);
    assert!(!view.loading);

    let view = sync
        .refetch("results", &Filter::equals("studentEmail", "nobody@x.com"))
        .await
        .unwrap();
    assert!(view.is_empty());
    assert_eq!(backend.client.stats().queries, 2);
    assert_eq!(backend.client.stats().subscribes, 0);
}

#[tokio::test]
async fn refetch_failure_sets_error() {
    let backend = Backend::new();
    backend.client.fail_next_query("offline");

    let mut sync = ListSynchronizer::read_once(backend.client());
    let err = sync
        .refetch("results", &Filter::equals("studentEmail", "a@x.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Store(_)));
    let view = sync.view();
    assert!(!view.loading);
    assert_eq!(view.error.as_deref(), Some("remote error: offline"));
}
