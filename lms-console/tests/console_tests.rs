use lms_console::{format_row, page, page_count, sample_payload, DemoBackend, DEMO_ADMIN_PASSWORD};
use lms_sync::{AdminSection, LmsConfig, LoginGate, Route};
use lms_types::{Document, DocumentId, Fields};
use pretty_assertions::assert_eq;

fn rows(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| Document::new(DocumentId::new(format!("d{i}")), Fields::new().with("n", i as f64)))
        .collect()
}

#[test]
fn page_count_rounds_up() {
    assert_eq!(page_count(0, 6), 1);
    assert_eq!(page_count(6, 6), 1);
    assert_eq!(page_count(7, 6), 2);
    assert_eq!(page_count(13, 6), 3);
    assert_eq!(page_count(5, 0), 1);
}

#[test]
fn pages_slice_rows() {
    let items = rows(8);
    assert_eq!(page(&items, 0, 6).len(), 6);
    assert_eq!(page(&items, 1, 6).len(), 2);
    assert_eq!(page(&items, 1, 6)[0].id.as_str(), "d6");
    assert!(page(&items, 2, 6).is_empty());
    assert!(page(&items, usize::MAX, 6).is_empty());
    assert_eq!(page(&items, 0, 0).len(), 8);
}

#[test]
fn rows_render_fields_in_order() {
    let item = Document::new(
        DocumentId::new("c1"),
        Fields::new().with("timing", "9am").with("name", "Algebra"),
    );
    assert_eq!(format_row(&item), "c1  name=Algebra, timing=9am");
}

#[test]
fn sample_payloads_fill_required_fields() {
    for section in AdminSection::ALL {
        let schema = lms_types::CollectionSchema::for_collection(section.collection()).unwrap();
        let payload = sample_payload(section);
        for field in schema.required_on_add {
            assert!(!payload.is_blank(field), "{} missing {field}", section.path());
        }
    }
}

#[tokio::test]
async fn seeded_admin_can_sign_in_and_add() {
    let config = LmsConfig::default();
    let backend = DemoBackend::seeded(&config);
    let gate = LoginGate::new(backend.client.clone(), backend.auth.clone());

    let session = gate
        .sign_in(&config.admin_email, DEMO_ADMIN_PASSWORD)
        .await
        .unwrap();
    assert_eq!(session.route, Route::AdminDashboard);

    for section in AdminSection::ALL {
        let screen = backend.screen(section, &config);
        screen.add(sample_payload(section)).await.unwrap();
    }
    assert_eq!(backend.client.documents("courses").len(), 2);
    assert_eq!(backend.client.documents("results").len(), 2);
    assert_eq!(backend.client.documents("teachers").len(), 2);
    assert_eq!(backend.client.documents("users").len(), 2);
}
