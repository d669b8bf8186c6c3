//! Collection schemas: the persisted field names of each collection and the
//! per-operation rules the mutation controller enforces.
//!
//! Field names here are the de facto persisted schema shared with every other
//! client of the same backend. Do not rename them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Collection names.
pub mod collections {
    pub const COURSES: &str = "courses";
    pub const RESULTS: &str = "results";
    pub const USERS: &str = "users";
    pub const TEACHERS: &str = "teachers";
}

/// `courses` fields.
pub mod course {
    pub const NAME: &str = "name";
    pub const DURATION: &str = "duration";
    pub const TIMING: &str = "timing";
}

/// `results` fields.
pub mod result {
    pub const STUDENT_NAME: &str = "studentName";
    pub const SUBJECT: &str = "subject";
    pub const MARKS: &str = "marks";
    pub const GRADE: &str = "grade";
    pub const STUDENT_EMAIL: &str = "studentEmail";
    pub const TIMESTAMP: &str = "timestamp";
}

/// `users` fields. `PASSWORD` is form input only and never persisted.
pub mod user {
    pub const NAME: &str = "name";
    pub const EMAIL: &str = "email";
    pub const TYPE: &str = "type";
    pub const UID: &str = "uid";
    pub const PHOTO_URL: &str = "photoURL";
    pub const PASSWORD: &str = "password";
}

/// `teachers` fields.
pub mod teacher {
    pub const NAME: &str = "name";
    pub const DESIGNATION: &str = "designation";
    pub const PROFILE_URL: &str = "profileUrl";
}

/// Role stored in the `type` field of a user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Admin,
    Student,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Student => "student",
        }
    }

    /// Parses the persisted `type` value. Unknown roles yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "student" => Some(Self::Student),
            _ => None,
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes a collection's field rules for the mutation controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    pub name: &'static str,
    /// Fields that must be non-blank on add.
    pub required_on_add: &'static [&'static str],
    /// Fields that must be non-blank on update.
    pub required_on_update: &'static [&'static str],
    /// Field whose value must not repeat across documents (checked before add).
    pub uniqueness_field: Option<&'static str>,
    /// Form-only credential field. When present on add, an identity is
    /// created first and the field is stripped from the profile document.
    pub credential_field: Option<&'static str>,
    /// Field stamped with the current time on add.
    pub created_at_field: Option<&'static str>,
    /// Fields set to fixed values on add.
    pub add_defaults: &'static [(&'static str, &'static str)],
}

impl CollectionSchema {
    /// Plain schema: same required fields for add and update, no extras.
    pub const fn simple(name: &'static str, required: &'static [&'static str]) -> Self {
        Self {
            name,
            required_on_add: required,
            required_on_update: required,
            uniqueness_field: None,
            credential_field: None,
            created_at_field: None,
            add_defaults: &[],
        }
    }

    pub fn courses() -> Self {
        Self::simple(collections::COURSES, &[course::NAME, course::DURATION, course::TIMING])
    }

    pub fn teachers() -> Self {
        Self::simple(
            collections::TEACHERS,
            &[teacher::NAME, teacher::DESIGNATION, teacher::PROFILE_URL],
        )
    }

    /// Results are keyed by student email: one result document per student.
    pub fn results() -> Self {
        const REQUIRED: &[&str] = &[
            result::STUDENT_NAME,
            result::SUBJECT,
            result::MARKS,
            result::GRADE,
            result::STUDENT_EMAIL,
        ];
        Self {
            uniqueness_field: Some(result::STUDENT_EMAIL),
            created_at_field: Some(result::TIMESTAMP),
            ..Self::simple(collections::RESULTS, REQUIRED)
        }
    }

    /// Student profiles. Adding one also creates an authentication identity.
    pub fn users() -> Self {
        Self {
            name: collections::USERS,
            required_on_add: &[user::NAME, user::EMAIL, user::PASSWORD],
            required_on_update: &[user::NAME, user::EMAIL],
            uniqueness_field: None,
            credential_field: Some(user::PASSWORD),
            created_at_field: None,
            add_defaults: &[(user::TYPE, "student")],
        }
    }

    /// Looks up one of the built-in schemas by collection name.
    pub fn for_collection(name: &str) -> Option<Self> {
        match name {
            collections::COURSES => Some(Self::courses()),
            collections::TEACHERS => Some(Self::teachers()),
            collections::RESULTS => Some(Self::results()),
            collections::USERS => Some(Self::users()),
            _ => None,
        }
    }
}
