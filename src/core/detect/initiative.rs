//! Initiative Detector
//!
//! Scalar compare on the initiative bonus with cause attribution (Dexterity
//! shifts, the Alert feat).

use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::combat;
use crate::core::causation::{CausationAnalyzer, StatTarget};
use crate::core::change::{Category, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;

use super::{scalar_kind, signed, ChangeBuilder, ChangeDetector, DetectorKind};

pub struct InitiativeDetector {
    config: DetectionConfig,
}

impl InitiativeDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for InitiativeDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Initiative
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        let analyzer = CausationAnalyzer::new(&self.config.causation);

        let (Some(old_bonus), Some(new_bonus)) =
            (combat::initiative_bonus(old), combat::initiative_bonus(new))
        else {
            return Vec::new();
        };
        if old_bonus == new_bonus {
            return Vec::new();
        }

        let delta = new_bonus - old_bonus;
        let mut change = builder.change(
            "combat.initiative",
            Some(json!(old_bonus)),
            Some(json!(new_bonus)),
            scalar_kind(old_bonus, new_bonus),
            Category::Combat,
            format!(
                "Initiative bonus changed from {} to {}",
                signed(old_bonus),
                signed(new_bonus)
            ),
        );
        if let Some(report) = analyzer.analyze(old, new, &StatTarget::Initiative, delta) {
            if let Some(primary) = &report.primary_cause {
                change.description = format!(
                    "{} (likely cause: {})",
                    change.description, primary.source_name
                );
            }
            change = change.with_meta("causation", report.to_value());
        }
        vec![change]
    }
}

// ============================================================================
// Tests
// ============================================================================
