//! Ability Score Detector
//!
//! Per-ability scalar compare with cascade fan-out: when the derived
//! modifier actually changed (not just the raw score), every dependent stat
//! whose observed delta equals the modifier delta exactly is reported as a
//! secondary change attributed to the ability. The exact-match filter keeps
//! coincidental unrelated changes (a proficiency lost in the same snapshot)
//! from being mis-attributed to the ability.

use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::abilities::{self, Ability};
use crate::core::accessors::combat;
use crate::core::causation::{CausationAnalyzer, StatTarget};
use crate::core::change::{Category, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;
use crate::core::registry;
use crate::core::tables;

use super::{scalar_kind, signed, ChangeBuilder, ChangeDetector, DetectorKind};

pub struct AbilityScoreDetector {
    config: DetectionConfig,
}

impl AbilityScoreDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for AbilityScoreDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::AbilityScores
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        let analyzer = CausationAnalyzer::new(&self.config.causation);
        let old_scores = abilities::ability_scores(old);
        let new_scores = abilities::ability_scores(new);
        let mut changes = Vec::new();

        for ability in Ability::ALL {
            // Only abilities present on both sides are comparable; a side
            // missing entirely is extraction drift, not a score change.
            let (Some(&old_score), Some(&new_score)) =
                (old_scores.get(&ability), new_scores.get(&ability))
            else {
                continue;
            };
            if old_score == new_score {
                continue;
            }

            let delta = new_score - old_score;
            let old_mod = abilities::modifier(old_score);
            let new_mod = abilities::modifier(new_score);
            let mod_delta = new_mod - old_mod;
            let path = format!("abilities.{}", ability.key());

            let verb = if delta > 0 { "increased" } else { "decreased" };
            let mut change = builder
                .change(
                    path.clone(),
                    Some(json!(old_score)),
                    Some(json!(new_score)),
                    scalar_kind(old_score, new_score),
                    Category::Abilities,
                    format!("{} {verb} from {old_score} to {new_score}", ability.name()),
                )
                .with_meta("modifier_delta", json!(mod_delta))
                .with_detail(format!(
                    "{}: {old_score} ({}) → {new_score} ({})",
                    ability.name(),
                    signed(old_mod),
                    signed(new_mod)
                ));

            if let Some(report) =
                analyzer.analyze(old, new, &StatTarget::AbilityScore(ability), delta)
            {
                change = change.with_meta("causation", report.to_value());
            }
            changes.push(change);

            if mod_delta != 0 && self.config.causation.max_cascade_depth > 0 {
                self.cascade(&builder, old, new, ability, mod_delta, &path, &mut changes);
            }
        }
        changes
    }
}

impl AbilityScoreDetector {
    /// Emit secondary changes for dependents whose observed delta equals
    /// the modifier delta exactly.
    #[allow(clippy::too_many_arguments)]
    fn cascade(
        &self,
        builder: &ChangeBuilder<'_>,
        old: &CharacterDocument,
        new: &CharacterDocument,
        ability: Ability,
        mod_delta: i64,
        primary_path: &str,
        changes: &mut Vec<FieldChange>,
    ) {
        let cascade_note = format!("(from {} change)", ability.name());
        // The ripple topology comes from the mapping registry, not from
        // this detector: only registered dependent paths may cascade.
        let linked = |dependent: &str| registry::causation_linked(primary_path, dependent);

        // Skills governed by this ability.
        let old_skills = combat::skill_bonuses(old);
        let new_skills = combat::skill_bonuses(new);
        for skill in tables::skills_for_ability(ability) {
            let key = skill.to_lowercase().replace(' ', "_");
            if !linked(&format!("skills.{key}")) {
                continue;
            }
            let (Some(&old_bonus), Some(&new_bonus)) =
                (old_skills.get(&key), new_skills.get(&key))
            else {
                continue;
            };
            if new_bonus - old_bonus != mod_delta {
                continue;
            }
            changes.push(
                builder
                    .change(
                        format!("skills.{key}"),
                        Some(json!(old_bonus)),
                        Some(json!(new_bonus)),
                        scalar_kind(old_bonus, new_bonus),
                        Category::Skills,
                        format!(
                            "{skill} bonus changed from {} to {} {cascade_note}",
                            signed(old_bonus),
                            signed(new_bonus)
                        ),
                    )
                    .as_cascade_of(primary_path),
            );
        }

        // The matching saving throw.
        let old_saves = combat::saving_throws(old);
        let new_saves = combat::saving_throws(new);
        if let (Some(&old_save), Some(&new_save)) = (
            old_saves.get(ability.key()),
            new_saves.get(ability.key()),
        ) {
            if new_save - old_save == mod_delta
                && linked(&format!("saving_throws.{}", ability.key()))
            {
                changes.push(
                    builder
                        .change(
                            format!("saving_throws.{}", ability.key()),
                            Some(json!(old_save)),
                            Some(json!(new_save)),
                            scalar_kind(old_save, new_save),
                            Category::Abilities,
                            format!(
                                "{} saving throw changed from {} to {} {cascade_note}",
                                ability.name(),
                                signed(old_save),
                                signed(new_save)
                            ),
                        )
                        .as_cascade_of(primary_path),
                );
            }
        }

        // Initiative follows Dexterity.
        if ability == Ability::Dexterity && linked("combat.initiative") {
            if let (Some(old_init), Some(new_init)) =
                (combat::initiative_bonus(old), combat::initiative_bonus(new))
            {
                if new_init - old_init == mod_delta {
                    changes.push(
                        builder
                            .change(
                                "combat.initiative",
                                Some(json!(old_init)),
                                Some(json!(new_init)),
                                scalar_kind(old_init, new_init),
                                Category::Combat,
                                format!(
                                    "Initiative bonus changed from {} to {} {cascade_note}",
                                    signed(old_init),
                                    signed(new_init)
                                ),
                            )
                            .as_cascade_of(primary_path),
                    );
                }
            }
        }

        // Passive skills whose governing ability this is.
        let old_passives = combat::passive_skills(old);
        let new_passives = combat::passive_skills(new);
        for (skill, value) in &new_passives {
            if tables::skill_ability(skill) != Some(ability) {
                continue;
            }
            if !linked(&format!("passives.{skill}")) {
                continue;
            }
            let Some(old_value) = old_passives.get(skill) else {
                continue;
            };
            if value - old_value != mod_delta {
                continue;
            }
            changes.push(
                builder
                    .change(
                        format!("passives.{skill}"),
                        Some(json!(old_value)),
                        Some(json!(value)),
                        scalar_kind(*old_value, *value),
                        Category::Skills,
                        format!(
                            "Passive {skill} changed from {old_value} to {value} {cascade_note}"
                        ),
                    )
                    .as_cascade_of(primary_path),
            );
        }

        // Spell save DC and attack bonus when this is the casting ability.
        let old_casting = combat::spellcasting_stats(old);
        let new_casting = combat::spellcasting_stats(new);
        if new_casting.ability == Some(ability) {
            if let (Some(old_dc), Some(new_dc)) = (old_casting.save_dc, new_casting.save_dc) {
                if new_dc - old_dc == mod_delta && linked("spellcasting.save_dc") {
                    changes.push(
                        builder
                            .change(
                                "spellcasting.save_dc",
                                Some(json!(old_dc)),
                                Some(json!(new_dc)),
                                scalar_kind(old_dc, new_dc),
                                Category::Spells,
                                format!(
                                    "Spell save DC changed from {old_dc} to {new_dc} {cascade_note}"
                                ),
                            )
                            .as_cascade_of(primary_path),
                    );
                }
            }
            if let (Some(old_attack), Some(new_attack)) =
                (old_casting.attack_bonus, new_casting.attack_bonus)
            {
                if new_attack - old_attack == mod_delta && linked("spellcasting.attack_bonus") {
                    changes.push(
                        builder
                            .change(
                                "spellcasting.attack_bonus",
                                Some(json!(old_attack)),
                                Some(json!(new_attack)),
                                scalar_kind(old_attack, new_attack),
                                Category::Spells,
                                format!(
                                    "Spell attack bonus changed from {} to {} {cascade_note}",
                                    signed(old_attack),
                                    signed(new_attack)
                                ),
                            )
                            .as_cascade_of(primary_path),
                    );
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
