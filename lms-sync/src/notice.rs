//! User-visible notifications produced at the controller boundary.

use crate::controller::{MutationKind, MutationOutcome};
use crate::error::MutationError;
use lms_types::schema::collections;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A toast-style message for the screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Notice for a settled mutation, e.g. "Course added successfully".
    pub fn for_outcome(collection: &str, outcome: &MutationOutcome) -> Self {
        Self::success(format!(
            "{} {} successfully",
            item_label(collection),
            outcome.kind.past_tense()
        ))
    }

    /// Notice for a rejected or failed mutation.
    pub fn for_error(collection: &str, kind: MutationKind, err: &MutationError) -> Self {
        match err {
            MutationError::Validation { message, .. } => Self::warning(message.clone()),
            MutationError::Authorization { .. } => Self::warning(capitalize(&err.to_string())),
            MutationError::AlreadyInProgress => Self::warning(capitalize(&err.to_string())),
            MutationError::Duplicate { field, value, .. } => Self::error(format!(
                "{}s already added for this {field}: {value}",
                item_label(collection)
            )),
            MutationError::Remote(msg) => Self::error(format!(
                "Failed to {kind} {}: {msg}",
                item_label(collection).to_lowercase()
            )),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Singular display label for a collection.
pub fn item_label(collection: &str) -> &'static str {
    match collection {
        collections::COURSES => "Course",
        collections::RESULTS => "Result",
        collections::USERS => "User",
        collections::TEACHERS => "Teacher",
        _ => "Document",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
