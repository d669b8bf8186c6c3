//! Property-based tests for list synchronization and the mutation gate.
//!
//! - Convergence: after any sequence of writes the view equals the
//!   collection's contents, in the same order
//! - Filtering: a filtered view holds exactly the matching documents
//! - Validation: a payload with any blank required field never reaches
//!   the store

mod common;

use common::{wait_for_view, Backend};
use lms_store::CollectionClient;
use lms_sync::{
    AllowAll, AuthorizationContext, ListSynchronizer, MutationController, MutationError,
    PendingMutation,
};
use lms_types::{CollectionSchema, DocumentId, Fields, Filter};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add { key: u8, name: String },
    Update { pick: usize, name: String },
    Delete { pick: usize },
}

fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 ]{1,20}").unwrap()
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..3, name_strategy()).prop_map(|(key, name)| Op::Add { key, name }),
        (any::<usize>(), name_strategy()).prop_map(|(pick, name)| Op::Update { pick, name }),
        any::<usize>().prop_map(|pick| Op::Delete { pick }),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Applies `ops` straight to the store. Returns how many writes were issued.
async fn apply_ops(backend: &Backend, ops: &[Op]) -> usize {
    let mut writes = 0;
    for op in ops {
        let ids: Vec<DocumentId> = backend
            .client
            .documents("courses")
            .into_iter()
            .map(|d| d.id)
            .collect();
        match op {
            Op::Add { key, name } => {
                let fields = Fields::new()
                    .with("name", name.as_str())
                    .with("key", format!("k{key}"));
                backend.client.add_document("courses", fields).await.unwrap();
                writes += 1;
            }
            Op::Update { pick, name } if !ids.is_empty() => {
                let id = &ids[pick % ids.len()];
                backend
                    .client
                    .update_document("courses", id, Fields::new().with("name", name.as_str()))
                    .await
                    .unwrap();
                writes += 1;
            }
            Op::Delete { pick } if !ids.is_empty() => {
                let id = &ids[pick % ids.len()];
                backend.client.delete_document("courses", id).await.unwrap();
                writes += 1;
            }
            _ => {}
        }
    }
    writes
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn view_converges_to_collection(ops in prop::collection::vec(op_strategy(), 0..25)) {
        let rt = runtime();
        let (view, expected) = rt.block_on(async {
            let backend = Backend::new();
            let mut sync = ListSynchronizer::new(backend.client());
            let mut rx = sync.watch();
            sync.open("courses", None).await.unwrap();
            let loaded = wait_for_view(&mut rx, |v| !v.loading).await;

            let writes = apply_ops(&backend, &ops).await as u64;
            let view = wait_for_view(&mut rx, |v| v.revision >= loaded.revision + writes).await;
            (view, backend.client.documents("courses"))
        });
        prop_assert_eq!(view.items, expected);
        prop_assert!(!view.loading);
        prop_assert!(view.error.is_none());
    }

    #[test]
    fn filtered_view_holds_only_matches(
        ops in prop::collection::vec(op_strategy(), 0..25),
        key in 0u8..3,
    ) {
        let rt = runtime();
        let (view, expected) = rt.block_on(async {
            let backend = Backend::new();
            apply_ops(&backend, &ops).await;

            let filter = Filter::equals("key", format!("k{key}"));
            let mut sync = ListSynchronizer::new(backend.client());
            let mut rx = sync.watch();
            sync.open("courses", Some(filter.clone())).await.unwrap();
            let view = wait_for_view(&mut rx, |v| !v.loading).await;

            let expected: Vec<_> = backend
                .client
                .documents("courses")
                .into_iter()
                .filter(|d| d.fields.matches(&filter))
                .collect();
            (view, expected)
        });
        prop_assert_eq!(view.items, expected);
    }

    #[test]
    fn blank_required_field_never_reaches_store(
        blank in 0usize..3,
        padding in "[ \t]{0,4}",
        name in name_strategy(),
    ) {
        let rt = runtime();
        let (err, io) = rt.block_on(async {
            let backend = Backend::new();
            let controller = MutationController::new(backend.client());
            let mut values = [name.clone(), name.clone(), name.clone()];
            values[blank] = padding.clone();
            let payload = Fields::new()
                .with("name", values[0].as_str())
                .with("duration", values[1].as_str())
                .with("timing", values[2].as_str());

            let err = controller
                .submit(
                    PendingMutation::add(payload),
                    &CollectionSchema::courses(),
                    &AuthorizationContext::anonymous(),
                    &AllowAll,
                )
                .await;
            (err, backend.client.stats().io())
        });
        let is_validation = matches!(err, Err(MutationError::Validation { .. }));
        prop_assert!(is_validation);
        prop_assert_eq!(io, 0);
    }
}
