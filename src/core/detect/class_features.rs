//! Class Feature Detector
//!
//! Per-class feature add/remove keyed by (class, feature name), with the
//! same level-prefix normalization the feat detector applies so a "2: "
//! prefix appearing or vanishing is not reported as churn.

use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::classes::{self, FeatureInfo};
use crate::core::change::{slug, Category, ChangeKind, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;

use super::feats::strip_level_prefix;
use super::{ChangeBuilder, ChangeDetector, DetectorKind};

pub struct ClassFeatureDetector {
    config: DetectionConfig,
}

impl ClassFeatureDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for ClassFeatureDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::ClassFeatures
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        let old_features = classes::class_features(old);
        let new_features = classes::class_features(new);
        let mut changes = Vec::new();

        for feature in &new_features {
            if contains(&old_features, feature) {
                continue;
            }
            let display = strip_level_prefix(&feature.name);
            let level_note = feature
                .required_level
                .map(|level| format!(" (level {level})"))
                .unwrap_or_default();
            let mut change = builder.change(
                feature_path(feature),
                None,
                Some(json!(display)),
                ChangeKind::Added,
                Category::Features,
                format!("{} gained feature: {display}{level_note}", feature.class_name),
            );
            if !feature.description.is_empty() {
                change = change.with_detail(feature.description.clone());
            }
            changes.push(change);
        }

        for feature in &old_features {
            if contains(&new_features, feature) {
                continue;
            }
            let display = strip_level_prefix(&feature.name);
            changes.push(builder.change(
                feature_path(feature),
                Some(json!(display)),
                None,
                ChangeKind::Removed,
                Category::Features,
                format!("{} lost feature: {display}", feature.class_name),
            ));
        }

        changes
    }
}

/// Identity for comparison: class plus prefix-stripped feature name.
fn contains(features: &[FeatureInfo], target: &FeatureInfo) -> bool {
    features.iter().any(|feature| {
        feature.class_name == target.class_name
            && strip_level_prefix(&feature.name) == strip_level_prefix(&target.name)
    })
}

fn feature_path(feature: &FeatureInfo) -> String {
    format!(
        "class_features.{}.{}",
        slug(&feature.class_name),
        slug(strip_level_prefix(&feature.name))
    )
}

// ============================================================================
// Tests
// ============================================================================
