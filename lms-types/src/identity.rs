use crate::IdentityId;
use serde::{Deserialize, Serialize};

/// An authentication principal, distinct from its profile document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: IdentityId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(uid: IdentityId, email: impl Into<String>) -> Self {
        Self {
            uid,
            email: email.into(),
            display_name: None,
        }
    }
}
