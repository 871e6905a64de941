//! Personality Detector
//!
//! Traits, ideals, bonds, and flaws compared as string sets per field.
//! All low-priority: roleplay text churns constantly and should never page
//! anyone.

use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::traits;
use crate::core::change::{Category, ChangeKind, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;

use super::{ChangeBuilder, ChangeDetector, DetectorKind};

pub struct PersonalityDetector {
    config: DetectionConfig,
}

impl PersonalityDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for PersonalityDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Personality
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        let old_profile = traits::personality(old);
        let new_profile = traits::personality(new);
        let mut changes = Vec::new();

        let fields: [(&str, &Vec<String>, &Vec<String>); 4] = [
            ("traits", &old_profile.traits, &new_profile.traits),
            ("ideals", &old_profile.ideals, &new_profile.ideals),
            ("bonds", &old_profile.bonds, &new_profile.bonds),
            ("flaws", &old_profile.flaws, &new_profile.flaws),
        ];

        for (field, old_entries, new_entries) in fields {
            let label = singular(field);
            for gained in new_entries.iter().filter(|e| !old_entries.contains(e)) {
                changes.push(builder.change(
                    format!("personality.{field}"),
                    None,
                    Some(json!(gained)),
                    ChangeKind::Added,
                    Category::Social,
                    format!("New {label}: \"{gained}\""),
                ));
            }
            for lost in old_entries.iter().filter(|e| !new_entries.contains(e)) {
                changes.push(builder.change(
                    format!("personality.{field}"),
                    Some(json!(lost)),
                    None,
                    ChangeKind::Removed,
                    Category::Social,
                    format!("Removed {label}: \"{lost}\""),
                ));
            }
        }

        changes
    }
}

fn singular(field: &str) -> &str {
    match field {
        "traits" => "personality trait",
        "ideals" => "ideal",
        "bonds" => "bond",
        "flaws" => "flaw",
        other => other,
    }
}

// ============================================================================
// Tests
// ============================================================================
