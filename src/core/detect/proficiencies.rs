//! Proficiency Detector
//!
//! Add/remove comparison over the canonical proficiency map, with paths
//! partitioned by proficiency kind so skill, tool, and language churn can
//! be filtered independently downstream.

use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::proficiencies;
use crate::core::change::{slug, Category, ChangeKind, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;

use super::{ChangeBuilder, ChangeDetector, DetectorKind};

pub struct ProficiencyDetector {
    config: DetectionConfig,
}

impl ProficiencyDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for ProficiencyDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Proficiencies
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        let old_profs = proficiencies::proficiencies(old);
        let new_profs = proficiencies::proficiencies(new);
        let mut changes = Vec::new();

        for (name, info) in &new_profs {
            if old_profs.contains_key(name) {
                continue;
            }
            let mut change = builder.change(
                format!("proficiencies.{}.{}", info.kind.key(), slug(name)),
                None,
                Some(json!(name)),
                ChangeKind::Added,
                Category::Skills,
                format!("Gained {} proficiency: {name}", info.kind),
            );
            if let Some(source) = &info.source {
                change = change.with_meta("granted_by", json!(source));
            }
            changes.push(change);
        }

        for (name, info) in &old_profs {
            if new_profs.contains_key(name) {
                continue;
            }
            changes.push(builder.change(
                format!("proficiencies.{}.{}", info.kind.key(), slug(name)),
                Some(json!(name)),
                None,
                ChangeKind::Removed,
                Category::Skills,
                format!("Lost {} proficiency: {name}", info.kind),
            ));
        }

        changes
    }
}

// ============================================================================
// Tests
// ============================================================================
