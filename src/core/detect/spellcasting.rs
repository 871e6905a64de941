//! Spellcasting Statistics Detector
//!
//! Spell save DC, spell attack bonus, and the casting ability itself, with
//! cause attribution for the numeric stats (casting-ability shifts,
//! proficiency bonus tier transitions).

use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::combat;
use crate::core::causation::{CausationAnalyzer, StatTarget};
use crate::core::change::{Category, ChangeKind, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;

use super::{scalar_kind, signed, ChangeBuilder, ChangeDetector, DetectorKind};

pub struct SpellcastingDetector {
    config: DetectionConfig,
}

impl SpellcastingDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for SpellcastingDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Spellcasting
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        let analyzer = CausationAnalyzer::new(&self.config.causation);
        let old_stats = combat::spellcasting_stats(old);
        let new_stats = combat::spellcasting_stats(new);
        let mut changes = Vec::new();

        if let (Some(old_dc), Some(new_dc)) = (old_stats.save_dc, new_stats.save_dc) {
            if old_dc != new_dc {
                let mut change = builder.change(
                    "spellcasting.save_dc",
                    Some(json!(old_dc)),
                    Some(json!(new_dc)),
                    scalar_kind(old_dc, new_dc),
                    Category::Spells,
                    format!("Spell save DC changed from {old_dc} to {new_dc}"),
                );
                if let Some(report) =
                    analyzer.analyze(old, new, &StatTarget::SpellSaveDc, new_dc - old_dc)
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
        }

        if let (Some(old_attack), Some(new_attack)) =
            (old_stats.attack_bonus, new_stats.attack_bonus)
        {
            if old_attack != new_attack {
                let mut change = builder.change(
                    "spellcasting.attack_bonus",
                    Some(json!(old_attack)),
                    Some(json!(new_attack)),
                    scalar_kind(old_attack, new_attack),
                    Category::Spells,
                    format!(
                        "Spell attack bonus changed from {} to {}",
                        signed(old_attack),
                        signed(new_attack)
                    ),
                );
                if let Some(report) = analyzer.analyze(
                    old,
                    new,
                    &StatTarget::SpellAttackBonus,
                    new_attack - old_attack,
                ) {
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
        }

        match (old_stats.ability, new_stats.ability) {
            (Some(old_ability), Some(new_ability)) if old_ability != new_ability => {
                changes.push(builder.change(
                    "spellcasting.ability",
                    Some(json!(old_ability.name())),
                    Some(json!(new_ability.name())),
                    ChangeKind::Modified,
                    Category::Spells,
                    format!(
                        "Spellcasting ability changed from {} to {}",
                        old_ability.name(),
                        new_ability.name()
                    ),
                ));
            }
            (None, Some(new_ability)) => {
                changes.push(builder.change(
                    "spellcasting.ability",
                    None,
                    Some(json!(new_ability.name())),
                    ChangeKind::Added,
                    Category::Spells,
                    format!("Spellcasting ability set: {}", new_ability.name()),
                ));
            }
            _ => {}
        }

        changes
    }
}

// ============================================================================
// Tests
// ============================================================================
