//! Passive Skill Detector
//!
//! Passive Perception, Investigation, and Insight, each with cause
//! attribution (governing ability shifts, the Observant feat, proficiency
//! bonus tier transitions).

use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::combat;
use crate::core::causation::{CausationAnalyzer, StatTarget};
use crate::core::change::{Category, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;

use super::{scalar_kind, ChangeBuilder, ChangeDetector, DetectorKind};

pub struct PassiveSkillDetector {
    config: DetectionConfig,
}

impl PassiveSkillDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for PassiveSkillDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::PassiveSkills
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        let analyzer = CausationAnalyzer::new(&self.config.causation);
        let old_passives = combat::passive_skills(old);
        let new_passives = combat::passive_skills(new);
        let mut changes = Vec::new();

        for (skill, &new_value) in &new_passives {
            let Some(&old_value) = old_passives.get(skill) else {
                continue;
            };
            if old_value == new_value {
                continue;
            }
            let delta = new_value - old_value;
            let mut change = builder.change(
                format!("passives.{skill}"),
                Some(json!(old_value)),
                Some(json!(new_value)),
                scalar_kind(old_value, new_value),
                Category::Skills,
                format!("Passive {skill} changed from {old_value} to {new_value}"),
            );
            if let Some(report) =
                analyzer.analyze(old, new, &StatTarget::PassiveSkill(skill.clone()), delta)
            {
                if let Some(primary) = &report.primary_cause {
                    change.description = format!(
                        "{} (likely cause: {})",
                        change.description, primary.source_name
                    );
                }
                change = change.with_meta("causation", report.to_value());
            }
            changes.push(change);
        }
        changes
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> PassiveSkillDetector {
        PassiveSkillDetector::new(DetectionConfig::default())
    }

    #[test]
    fn test_observant_feat_attribution() {
        let old = CharacterDocument::new(json!({
            "passivePerception": 14,
            "passives": {"investigation": 10},
            "feats": []
        }));
        let new = CharacterDocument::new(json!({
            "passivePerception": 19,
            "passives": {"investigation": 15},
            "feats": [{"name": "Observant"}]
        }));
        let changes = detector().detect(&old, &new, &DetectionContext::default());
        assert_eq!(changes.len(), 2);
        for change in &changes {
            assert!(change.description.contains("Observant"), "{change:?}");
        }
    }

    #[test]
    fn test_wisdom_attribution_for_perception() {
        let old = CharacterDocument::new(json!({
            "passivePerception": 14,
            "stats": [{"id": 5, "value": 14}]
        }));
        let new = CharacterDocument::new(json!({
            "passivePerception": 15,
            "stats": [{"id": 5, "value": 16}]
        }));
        let changes = detector().detect(&old, &new, &DetectionContext::default());
        assert_eq!(changes.len(), 1);
        assert!(changes[0].description.contains("Wisdom"));
    }

    #[test]
    fn test_insight_does_not_get_observant_attribution() {
        // Observant only boosts Perception and Investigation.
        let old = CharacterDocument::new(json!({
            "passives": {"insight": 12},
            "feats": []
        }));
        let new = CharacterDocument::new(json!({
            "passives": {"insight": 17},
            "feats": [{"name": "Observant"}]
        }));
        let changes = detector().detect(&old, &new, &DetectionContext::default());
        assert_eq!(changes.len(), 1);
        assert!(!changes[0].metadata.contains_key("causation"));
    }

    #[test]
    fn test_no_op() {
        let doc = CharacterDocument::new(json!({"passivePerception": 13}));
        assert!(detector()
            .detect(&doc, &doc, &DetectionContext::default())
            .is_empty());
    }
}
