//! Rendered prompt sent to a completion service

use serde::{Deserialize, Serialize};

/// A single-turn prompt: optional system instructions plus the user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            user: user.into(),
        }
    }

    /// Prompt without system instructions
    pub fn user_only(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
        }
    }

    /// True if either message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.user.contains(needle)
            || self.system.as_deref().map_or(false, |s| s.contains(needle))
    }
}
