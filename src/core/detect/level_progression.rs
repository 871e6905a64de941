//! Level Progression Detector
//!
//! The character-level summary change: total level across all classes, the
//! proficiency-bonus tier it implies, and ASI milestones flagged in
//! metadata when a class lands on an improvement level.

use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::classes;
use crate::core::change::{Category, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;
use crate::core::tables;

use super::{scalar_kind, signed, ChangeBuilder, ChangeDetector, DetectorKind};

pub struct LevelProgressionDetector {
    config: DetectionConfig,
}

impl LevelProgressionDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for LevelProgressionDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::LevelProgression
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        let old_level = classes::total_level(old);
        let new_level = classes::total_level(new);
        // Zero means "no level information extracted", not level zero.
        if old_level == 0 || new_level == 0 || old_level == new_level {
            return Vec::new();
        }

        let mut changes = Vec::new();
        let verb = if new_level > old_level {
            "increased"
        } else {
            "decreased"
        };
        let mut change = builder.change(
            "progression.total_level",
            Some(json!(old_level)),
            Some(json!(new_level)),
            scalar_kind(old_level, new_level),
            Category::Progression,
            format!("Character level {verb} from {old_level} to {new_level}"),
        );

        // Flag classes that just reached an ability score improvement.
        let old_classes = classes::classes(old);
        let asi_classes: Vec<String> = classes::classes(new)
            .into_iter()
            .filter(|class| {
                let old_class_level = old_classes
                    .iter()
                    .find(|c| c.name == class.name)
                    .map(|c| c.level)
                    .unwrap_or(0);
                class.level > old_class_level
                    && tables::asi_levels(&class.name).contains(&class.level)
            })
            .map(|class| format!("{} {}", class.name, class.level))
            .collect();
        if !asi_classes.is_empty() {
            change = change.with_meta("asi_unlocked", json!(asi_classes));
        }
        changes.push(change);

        // Proficiency-bonus tier transition rides along as a secondary.
        let old_pb = tables::proficiency_bonus(old_level);
        let new_pb = tables::proficiency_bonus(new_level);
        if old_pb != new_pb {
            changes.push(
                builder
                    .change(
                        "progression.proficiency_bonus",
                        Some(json!(old_pb)),
                        Some(json!(new_pb)),
                        scalar_kind(old_pb, new_pb),
                        Category::Progression,
                        format!(
                            "Proficiency bonus changed from {} to {}",
                            signed(old_pb),
                            signed(new_pb)
                        ),
                    )
                    .as_cascade_of("progression.total_level"),
            );
        }

        changes
    }
}

// ============================================================================
// Tests
// ============================================================================
