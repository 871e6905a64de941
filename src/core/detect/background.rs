//! Background Detector
//!
//! Background identity changes plus fan-out of the proficiencies the new
//! background grants, reported as secondary changes so downstream consumers
//! can tie them back to the background swap.

use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::traits;
use crate::core::change::{slug, Category, ChangeKind, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;

use super::{ChangeBuilder, ChangeDetector, DetectorKind};

pub struct BackgroundDetector {
    config: DetectionConfig,
}

impl BackgroundDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for BackgroundDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Background
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        let old_bg = traits::background(old);
        let new_bg = traits::background(new);
        let mut changes = Vec::new();

        match (&old_bg, &new_bg) {
            (Some(old_info), Some(new_info)) if old_info.name != new_info.name => {
                changes.push(builder.change(
                    "background",
                    Some(json!(old_info.name)),
                    Some(json!(new_info.name)),
                    ChangeKind::Modified,
                    Category::BasicInfo,
                    format!(
                        "Background changed from {} to {}",
                        old_info.name, new_info.name
                    ),
                ));
                self.fan_out_grants(&builder, new_info, &mut changes);
            }
            (None, Some(new_info)) => {
                changes.push(builder.change(
                    "background",
                    None,
                    Some(json!(new_info.name)),
                    ChangeKind::Added,
                    Category::BasicInfo,
                    format!("Background set: {}", new_info.name),
                ));
                self.fan_out_grants(&builder, new_info, &mut changes);
            }
            (Some(old_info), None) => {
                changes.push(builder.change(
                    "background",
                    Some(json!(old_info.name)),
                    None,
                    ChangeKind::Removed,
                    Category::BasicInfo,
                    format!("Background removed (was {})", old_info.name),
                ));
            }
            _ => {}
        }

        // Feature changes are reported even when the background name is
        // unchanged (errata and homebrew edits).
        if let (Some(old_info), Some(new_info)) = (&old_bg, &new_bg) {
            if old_info.name == new_info.name && old_info.feature_name != new_info.feature_name {
                match (&old_info.feature_name, &new_info.feature_name) {
                    (Some(old_feature), Some(new_feature)) => changes.push(builder.change(
                        "background.feature",
                        Some(json!(old_feature)),
                        Some(json!(new_feature)),
                        ChangeKind::Modified,
                        Category::Features,
                        format!(
                            "Background feature changed from {old_feature} to {new_feature}"
                        ),
                    )),
                    (None, Some(new_feature)) => changes.push(builder.change(
                        "background.feature",
                        None,
                        Some(json!(new_feature)),
                        ChangeKind::Added,
                        Category::Features,
                        format!("Background feature gained: {new_feature}"),
                    )),
                    (Some(old_feature), None) => changes.push(builder.change(
                        "background.feature",
                        Some(json!(old_feature)),
                        None,
                        ChangeKind::Removed,
                        Category::Features,
                        format!("Background feature lost: {old_feature}"),
                    )),
                    (None, None) => {}
                }
            }
        }

        changes
    }
}

impl BackgroundDetector {
    fn fan_out_grants(
        &self,
        builder: &ChangeBuilder<'_>,
        new_info: &traits::BackgroundInfo,
        changes: &mut Vec<FieldChange>,
    ) {
        for proficiency in &new_info.granted_proficiencies {
            changes.push(
                builder
                    .change(
                        format!("proficiencies.skill.{}", slug(proficiency)),
                        None,
                        Some(json!(proficiency)),
                        ChangeKind::Added,
                        Category::Skills,
                        format!("{} grants proficiency: {proficiency}", new_info.name),
                    )
                    .as_cascade_of("background"),
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
