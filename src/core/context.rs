//! Detection Context
//!
//! A per-comparison value bag supplied by the orchestrator. Everything in it
//! is optional: detectors may use what is present but must never require a
//! field to exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller-supplied context for one old/new comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionContext {
    /// Upstream identifier of the character, when known.
    pub character_id: Option<String>,
    /// Display name of the character, when known.
    pub character_name: Option<String>,
    /// Campaign the character belongs to, when known.
    pub campaign_id: Option<String>,
    /// When the old snapshot was taken.
    pub old_timestamp: Option<DateTime<Utc>>,
    /// When the new snapshot was taken.
    pub new_timestamp: Option<DateTime<Utc>>,
}

impl DetectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_character_id(mut self, id: impl Into<String>) -> Self {
        self.character_id = Some(id.into());
        self
    }

    pub fn with_character_name(mut self, name: impl Into<String>) -> Self {
        self.character_name = Some(name.into());
        self
    }

    pub fn with_campaign_id(mut self, id: impl Into<String>) -> Self {
        self.campaign_id = Some(id.into());
        self
    }

    pub fn with_timestamps(mut self, old: DateTime<Utc>, new: DateTime<Utc>) -> Self {
        self.old_timestamp = Some(old);
        self.new_timestamp = Some(new);
        self
    }

    /// Name to use in generated descriptions; falls back to a neutral label.
    pub fn display_name(&self) -> &str {
        self.character_name.as_deref().unwrap_or("The character")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let ctx = DetectionContext::new()
            .with_character_id("c-42")
            .with_character_name("Mira");
        assert_eq!(ctx.character_id.as_deref(), Some("c-42"));
        assert_eq!(ctx.display_name(), "Mira");
        assert!(ctx.campaign_id.is_none());
    }

    #[test]
    fn test_empty_context_is_usable() {
        let ctx = DetectionContext::default();
        assert_eq!(ctx.display_name(), "The character");
    }
}
