//! Race / Species Detector
//!
//! Race and subrace identity changes with fan-out of gained and lost racial
//! traits as secondary changes, plus the tabled ability bonuses of the new
//! race in metadata for downstream display.

use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::traits;
use crate::core::change::{slug, Category, ChangeKind, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;
use crate::core::tables;

use super::{ChangeBuilder, ChangeDetector, DetectorKind};

pub struct RaceDetector {
    config: DetectionConfig,
}

impl RaceDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for RaceDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Race
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        let old_race = traits::race(old);
        let new_race = traits::race(new);
        let mut changes = Vec::new();

        match (&old_race, &new_race) {
            (Some(old_info), Some(new_info)) if old_info.name != new_info.name => {
                let bonuses: Vec<String> = tables::racial_bonuses(&new_info.name)
                    .iter()
                    .map(|(ability, bonus)| format!("{:+} {}", bonus, ability.abbrev()))
                    .collect();
                let mut change = builder.change(
                    "race",
                    Some(json!(old_info.name)),
                    Some(json!(new_info.name)),
                    ChangeKind::Modified,
                    Category::BasicInfo,
                    format!("Species changed from {} to {}", old_info.name, new_info.name),
                );
                if !bonuses.is_empty() {
                    change = change.with_meta("ability_bonuses", json!(bonuses.join(", ")));
                }
                changes.push(change);
                self.fan_out_traits(&builder, old_info, new_info, "race", &mut changes);
            }
            (None, Some(new_info)) => {
                changes.push(builder.change(
                    "race",
                    None,
                    Some(json!(new_info.name)),
                    ChangeKind::Added,
                    Category::BasicInfo,
                    format!("Species set: {}", new_info.name),
                ));
            }
            (Some(old_info), None) => {
                changes.push(builder.change(
                    "race",
                    Some(json!(old_info.name)),
                    None,
                    ChangeKind::Removed,
                    Category::BasicInfo,
                    format!("Species removed (was {})", old_info.name),
                ));
            }
            _ => {}
        }

        // Subrace shift within the same base race.
        if let (Some(old_info), Some(new_info)) = (&old_race, &new_race) {
            if old_info.name == new_info.name && old_info.subrace != new_info.subrace {
                let old_label = old_info.subrace.clone().unwrap_or_else(|| "none".to_string());
                let new_label = new_info.subrace.clone().unwrap_or_else(|| "none".to_string());
                changes.push(builder.change(
                    "race.subrace",
                    old_info.subrace.as_ref().map(|s| json!(s)),
                    new_info.subrace.as_ref().map(|s| json!(s)),
                    ChangeKind::Modified,
                    Category::BasicInfo,
                    format!("Subrace changed from {old_label} to {new_label}"),
                ));
                self.fan_out_traits(&builder, old_info, new_info, "race.subrace", &mut changes);
            }
        }

        changes
    }
}

impl RaceDetector {
    /// Gained/lost racial traits as secondary changes.
    fn fan_out_traits(
        &self,
        builder: &ChangeBuilder<'_>,
        old_info: &traits::RaceInfo,
        new_info: &traits::RaceInfo,
        primary_path: &str,
        changes: &mut Vec<FieldChange>,
    ) {
        for gained in new_info
            .racial_traits
            .iter()
            .filter(|t| !old_info.racial_traits.contains(t))
        {
            changes.push(
                builder
                    .change(
                        format!("race.traits.{}", slug(gained)),
                        None,
                        Some(json!(gained)),
                        ChangeKind::Added,
                        Category::Features,
                        format!("Gained racial trait: {gained}"),
                    )
                    .as_cascade_of(primary_path),
            );
        }
        for lost in old_info
            .racial_traits
            .iter()
            .filter(|t| !new_info.racial_traits.contains(t))
        {
            changes.push(
                builder
                    .change(
                        format!("race.traits.{}", slug(lost)),
                        Some(json!(lost)),
                        None,
                        ChangeKind::Removed,
                        Category::Features,
                        format!("Lost racial trait: {lost}"),
                    )
                    .as_cascade_of(primary_path),
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
