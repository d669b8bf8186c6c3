//! Client configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Environment variable that overrides [`LmsConfig::admin_email`].
pub const ADMIN_EMAIL_ENV: &str = "LMS_ADMIN_EMAIL";

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration for the LMS client core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmsConfig {
    /// The identity allowed to mutate admin screens.
    pub admin_email: String,
    /// Echo settled mutations into the local list before the next snapshot
    /// (results screen only).
    pub optimistic_echo: bool,
    /// Rows per table page.
    pub page_size: usize,
}

impl Default for LmsConfig {
    fn default() -> Self {
        Self {
            admin_email: "admin08@gmail.com".to_string(),
            optimistic_echo: true,
            page_size: 6,
        }
    }
}

impl LmsConfig {
    /// Parses a JSON config. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Applies overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(email) = lookup(ADMIN_EMAIL_ENV).filter(|v| !v.trim().is_empty()) {
            self.admin_email = email.trim().to_string();
        }
        self
    }
}
