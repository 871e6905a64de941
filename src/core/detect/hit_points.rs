//! Hit Point Detector
//!
//! Max HP changes run the causation pipeline (Constitution shifts, level
//! gains, the Tough feat, new classes) and carry a calculation breakdown in
//! metadata. Current and temporary HP are routine combat churn and report
//! at low priority with no attribution.

use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::combat::{self, HitPoints};
use crate::core::causation::{CausationAnalyzer, StatTarget};
use crate::core::change::{Category, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;

use super::{scalar_kind, ChangeBuilder, ChangeDetector, DetectorKind};

pub struct HitPointDetector {
    config: DetectionConfig,
}

impl HitPointDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for HitPointDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::HitPoints
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        let analyzer = CausationAnalyzer::new(&self.config.causation);
        let old_hp = combat::hit_points(old);
        let new_hp = combat::hit_points(new);
        let mut changes = Vec::new();

        if let (Some(old_max), Some(new_max)) = (old_hp.max(), new_hp.max()) {
            if old_max != new_max {
                let delta = new_max - old_max;
                let verb = if delta > 0 { "increased" } else { "decreased" };
                let mut change = builder
                    .change(
                        "combat.hit_points.max",
                        Some(json!(old_max)),
                        Some(json!(new_max)),
                        scalar_kind(old_max, new_max),
                        Category::Combat,
                        format!("Maximum hit points {verb} from {old_max} to {new_max}"),
                    )
                    .with_meta(
                        "calculation",
                        json!({
                            "old": breakdown(&old_hp),
                            "new": breakdown(&new_hp),
                        }),
                    );
                if let Some(report) =
                    analyzer.analyze(old, new, &StatTarget::MaxHitPoints, delta)
                {
                    let mut description = change.description.clone();
                    if let Some(primary) = &report.primary_cause {
                        description =
                            format!("{description} (likely cause: {})", primary.source_name);
                    }
                    change.description = description;
                    change = change.with_meta("causation", report.to_value());
                }
                changes.push(change);
            }
        }

        if let (Some(old_current), Some(new_current)) = (old_hp.current, new_hp.current) {
            if old_current != new_current {
                changes.push(builder.change(
                    "combat.hit_points.current",
                    Some(json!(old_current)),
                    Some(json!(new_current)),
                    scalar_kind(old_current, new_current),
                    Category::Combat,
                    format!("Current hit points changed from {old_current} to {new_current}"),
                ));
            }
        }

        if old_hp.temp != new_hp.temp && (old_hp.is_known() || new_hp.is_known()) {
            changes.push(builder.change(
                "combat.hit_points.temp",
                Some(json!(old_hp.temp)),
                Some(json!(new_hp.temp)),
                scalar_kind(old_hp.temp, new_hp.temp),
                Category::Combat,
                format!(
                    "Temporary hit points changed from {} to {}",
                    old_hp.temp, new_hp.temp
                ),
            ));
        }

        changes
    }
}

/// Human-readable composition of a hit-point block.
fn breakdown(hp: &HitPoints) -> String {
    if let Some(override_value) = hp.override_value {
        return format!("override {override_value}");
    }
    match hp.base {
        Some(base) => {
            let mut parts = format!("base {base}");
            if hp.bonus != 0 {
                parts.push_str(&format!(" + bonus {}", hp.bonus));
            }
            if hp.removed != 0 {
                parts.push_str(&format!(" - removed {}", hp.removed));
            }
            if let Some(max) = hp.max() {
                parts.push_str(&format!(" = {max}"));
            }
            parts
        }
        None => "unknown".to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::change::{ChangeKind, Priority};

    fn detector() -> HitPointDetector {
        HitPointDetector::new(DetectionConfig::default())
    }

    fn ctx() -> DetectionContext {
        DetectionContext::default()
    }

    #[test]
    fn test_max_hp_change_with_level_cause() {
        let old = CharacterDocument::new(json!({
            "baseHitPoints": 40,
            "classes": [{"name": "Fighter", "level": 4}],
            "stats": [{"id": 3, "value": 14}]
        }));
        let new = CharacterDocument::new(json!({
            "baseHitPoints": 49,
            "classes": [{"name": "Fighter", "level": 5}],
            "stats": [{"id": 3, "value": 14}]
        }));
        let changes = detector().detect(&old, &new, &ctx());
        let max_change = changes
            .iter()
            .find(|c| c.field_path == "combat.hit_points.max")
            .unwrap();
        assert_eq!(max_change.change_kind, ChangeKind::Incremented);
        assert_eq!(max_change.priority, Priority::High);
        assert!(max_change.metadata.contains_key("causation"));
        assert!(max_change.description.contains("likely cause"));
        assert_eq!(
            max_change.metadata["calculation"]["new"],
            json!("base 49 = 49")
        );
    }

    #[test]
    fn test_current_hp_is_low_priority() {
        let old = CharacterDocument::new(json!({"hitPoints": {"max": 40, "current": 40}}));
        let new = CharacterDocument::new(json!({"hitPoints": {"max": 40, "current": 22}}));
        let changes = detector().detect(&old, &new, &ctx());
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field_path, "combat.hit_points.current");
        assert_eq!(changes[0].priority, Priority::Low);
        assert!(!changes[0].metadata.contains_key("causation"));
    }

    #[test]
    fn test_temp_hp_change() {
        let old = CharacterDocument::new(json!({"baseHitPoints": 30, "temporaryHitPoints": 0}));
        let new = CharacterDocument::new(json!({"baseHitPoints": 30, "temporaryHitPoints": 8}));
        let changes = detector().detect(&old, &new, &ctx());
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field_path, "combat.hit_points.temp");
    }

    #[test]
    fn test_override_breakdown() {
        let old = CharacterDocument::new(json!({"baseHitPoints": 40}));
        let new = CharacterDocument::new(json!({"baseHitPoints": 40, "overrideHitPoints": 55}));
        let changes = detector().detect(&old, &new, &ctx());
        assert_eq!(
            changes[0].metadata["calculation"]["new"],
            json!("override 55")
        );
    }

    #[test]
    fn test_unknown_on_either_side_is_silent() {
        let old = CharacterDocument::new(json!({}));
        let new = CharacterDocument::new(json!({"baseHitPoints": 40}));
        assert!(detector().detect(&old, &new, &ctx()).is_empty());
    }

    #[test]
    fn test_no_op() {
        let doc = CharacterDocument::new(json!({
            "baseHitPoints": 40,
            "bonusHitPoints": 10,
            "currentHitPoints": 30
        }));
        assert!(detector().detect(&doc, &doc, &ctx()).is_empty());
    }
}
