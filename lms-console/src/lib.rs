//! Demo wiring for the LMS console: an in-memory backend seeded with an
//! admin account and a few documents, plus the helpers the binary uses to
//! pick a screen and print its list a page at a time.

use lms_store::memory::{MemoryAuthProvider, MemoryCollectionClient};
use lms_sync::{AdminSection, LmsConfig, Screen};
use lms_types::schema::{collections, course, result, teacher, user};
use lms_types::{Fields, ListItem};
use std::sync::Arc;

/// Password of the seeded admin account.
pub const DEMO_ADMIN_PASSWORD: &str = "admin123";

/// In-memory backend used by the console.
pub struct DemoBackend {
    pub client: Arc<MemoryCollectionClient>,
    pub auth: Arc<MemoryAuthProvider>,
}

impl DemoBackend {
    /// Seeds an admin account for `config.admin_email` and one document per
    /// collection.
    pub fn seeded(config: &LmsConfig) -> Self {
        let client = Arc::new(MemoryCollectionClient::new());
        let auth = Arc::new(MemoryAuthProvider::new());

        auth.register(&config.admin_email, DEMO_ADMIN_PASSWORD);
        client.seed(
            collections::USERS,
            Fields::new()
                .with(user::NAME, "Admin")
                .with(user::EMAIL, config.admin_email.as_str())
                .with(user::TYPE, "admin"),
        );
        client.seed(
            collections::COURSES,
            Fields::new()
                .with(course::NAME, "Web Development")
                .with(course::DURATION, "6 months")
                .with(course::TIMING, "10am - 12pm"),
        );
        client.seed(
            collections::TEACHERS,
            Fields::new()
                .with(teacher::NAME, "Sara Khan")
                .with(teacher::DESIGNATION, "Senior Instructor")
                .with(teacher::PROFILE_URL, "https://example.com/sara.png"),
        );
        client.seed(
            collections::RESULTS,
            Fields::new()
                .with(result::STUDENT_NAME, "Ali")
                .with(result::SUBJECT, "Mathematics")
                .with(result::MARKS, "88")
                .with(result::GRADE, "A")
                .with(result::STUDENT_EMAIL, "ali@example.com"),
        );

        Self { client, auth }
    }

    /// The screen that manages `section`.
    pub fn screen(&self, section: AdminSection, config: &LmsConfig) -> Screen {
        let client = self.client.clone();
        let auth = self.auth.clone();
        match section {
            AdminSection::StudentRegistration => Screen::students(client, auth, config),
            AdminSection::CourseRegistration => Screen::courses(client, auth, config),
            AdminSection::TeacherRegistration => Screen::teachers(client, auth, config),
            AdminSection::Result => Screen::results(client, auth, config),
        }
    }
}

/// A form payload the console submits on `section`'s screen.
pub fn sample_payload(section: AdminSection) -> Fields {
    match section {
        AdminSection::StudentRegistration => Fields::new()
            .with(user::NAME, "Hina")
            .with(user::EMAIL, "hina@example.com")
            .with(user::PASSWORD, "hina-secret"),
        AdminSection::CourseRegistration => Fields::new()
            .with(course::NAME, "Algebra")
            .with(course::DURATION, "3 months")
            .with(course::TIMING, "9am - 11am"),
        AdminSection::TeacherRegistration => Fields::new()
            .with(teacher::NAME, "Omar Farooq")
            .with(teacher::DESIGNATION, "Lecturer")
            .with(teacher::PROFILE_URL, "https://example.com/omar.png"),
        AdminSection::Result => Fields::new()
            .with(result::STUDENT_NAME, "Hina")
            .with(result::SUBJECT, "Physics")
            .with(result::MARKS, "91")
            .with(result::GRADE, "A+")
            .with(result::STUDENT_EMAIL, "hina@example.com"),
    }
}

/// Number of pages needed to show `len` rows. Zero rows still make one page.
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    len.div_ceil(page_size).max(1)
}

/// Rows on page `page` (zero-based). Out-of-range pages are empty.
pub fn page(items: &[ListItem], page: usize, page_size: usize) -> &[ListItem] {
    if page_size == 0 {
        return if page == 0 { items } else { &[] };
    }
    let start = page.saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// One-line rendering of a row: `id  field=value, ...`.
pub fn format_row(item: &ListItem) -> String {
    let fields = item
        .fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}  {}", item.id, fields)
}
