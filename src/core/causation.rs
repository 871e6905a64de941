//! Causation Analysis
//!
//! Best-effort attribution of numeric stat changes to their probable root
//! cause. Candidate cause categories are checked in a fixed priority order;
//! each category only contributes when it is both present in the snapshots
//! and numerically consistent with the observed delta. Confidence weights
//! accumulate additively across independent causes and are capped at 1.0.
//! The first consistent cause becomes the primary; every consistent cause
//! is retained as a contributing factor for human review.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::CausationConfig;
use crate::core::accessors::abilities::{self, Ability};
use crate::core::accessors::classes::{self, ClassInfo};
use crate::core::accessors::feats;
use crate::core::accessors::inventory;
use crate::core::accessors::traits;
use crate::core::change::{slug, ChangeAttribution, SourceKind};
use crate::core::document::CharacterDocument;
use crate::core::tables;

// Confidence weights per cause category. Ability shifts are the most
// reliable signal (direct arithmetic); class features the least.
const WEIGHT_ABILITY: f64 = 0.4;
const WEIGHT_LEVEL: f64 = 0.35;
const WEIGHT_EQUIPMENT: f64 = 0.35;
const WEIGHT_FEAT: f64 = 0.35;
const WEIGHT_RACE: f64 = 0.25;
const WEIGHT_CLASS_FEATURE: f64 = 0.2;

/// Which derived statistic changed.
#[derive(Debug, Clone, PartialEq)]
pub enum StatTarget {
    MaxHitPoints,
    Initiative,
    /// Canonical lowercase skill key ("perception").
    PassiveSkill(String),
    SpellSaveDc,
    SpellAttackBonus,
    AbilityScore(Ability),
}

impl StatTarget {
    /// The ability that normally drives this statistic, read from the new
    /// snapshot where the source is dynamic (spellcasting ability).
    fn governing_ability(&self, new_doc: &CharacterDocument) -> Option<Ability> {
        match self {
            StatTarget::MaxHitPoints => Some(Ability::Constitution),
            StatTarget::Initiative => Some(Ability::Dexterity),
            StatTarget::PassiveSkill(skill) => tables::skill_ability(skill),
            StatTarget::SpellSaveDc | StatTarget::SpellAttackBonus => {
                crate::core::accessors::combat::spellcasting_stats(new_doc).ability
            }
            StatTarget::AbilityScore(_) => None,
        }
    }

    fn label(&self) -> String {
        match self {
            StatTarget::MaxHitPoints => "maximum hit points".to_string(),
            StatTarget::Initiative => "initiative".to_string(),
            StatTarget::PassiveSkill(skill) => format!("passive {skill}"),
            StatTarget::SpellSaveDc => "spell save DC".to_string(),
            StatTarget::SpellAttackBonus => "spell attack bonus".to_string(),
            StatTarget::AbilityScore(ability) => ability.name().to_lowercase(),
        }
    }
}

/// One consistent cause with its confidence contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributingFactor {
    pub attribution: ChangeAttribution,
    pub confidence: f64,
}

/// The full attribution result attached to a change's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausationReport {
    pub primary_cause: Option<ChangeAttribution>,
    pub contributing_factors: Vec<ContributingFactor>,
    /// Accumulated confidence, capped at 1.0.
    pub confidence: f64,
}

impl CausationReport {
    pub fn to_value(&self) -> Value {
        json!({
            "primary_cause": self.primary_cause,
            "contributing_factors": self.contributing_factors,
            "confidence": self.confidence,
        })
    }
}

/// Stateless analyzer bound to the comparison's causation settings.
pub struct CausationAnalyzer<'a> {
    config: &'a CausationConfig,
}

impl<'a> CausationAnalyzer<'a> {
    pub fn new(config: &'a CausationConfig) -> Self {
        Self { config }
    }

    /// Attribute a numeric change in `target` of size `delta`.
    ///
    /// Returns `None` when analysis is disabled, no candidate cause is
    /// consistent, or the accumulated confidence stays below the configured
    /// threshold. A failed sub-check never fails the caller; it just does
    /// not contribute.
    pub fn analyze(
        &self,
        old_doc: &CharacterDocument,
        new_doc: &CharacterDocument,
        target: &StatTarget,
        delta: i64,
    ) -> Option<CausationReport> {
        if !self.config.enabled || delta == 0 {
            return None;
        }

        let mut factors: Vec<ContributingFactor> = Vec::new();
        let checks: [Option<ContributingFactor>; 6] = [
            self.ability_cause(old_doc, new_doc, target, delta),
            self.level_cause(old_doc, new_doc, target, delta),
            self.equipment_cause(old_doc, new_doc, target, delta),
            self.feat_cause(old_doc, new_doc, target, delta),
            self.racial_cause(old_doc, new_doc, target, delta),
            self.class_feature_cause(old_doc, new_doc, target, delta),
        ];
        for factor in checks.into_iter().flatten() {
            factors.push(factor);
        }

        if factors.is_empty() {
            return None;
        }
        let confidence: f64 = factors
            .iter()
            .map(|factor| factor.confidence)
            .sum::<f64>()
            .min(1.0);
        if confidence < self.config.confidence_threshold {
            log::debug!(
                "Dropping causation report for {} (confidence {confidence:.2} below threshold)",
                target.label()
            );
            return None;
        }

        Some(CausationReport {
            primary_cause: Some(factors[0].attribution.clone()),
            contributing_factors: factors,
            confidence,
        })
    }

    // ------------------------------------------------------------------
    // Candidate checks, in priority order
    // ------------------------------------------------------------------

    /// An ability-score change whose modifier delta exactly matches the
    /// observed delta.
    fn ability_cause(
        &self,
        old_doc: &CharacterDocument,
        new_doc: &CharacterDocument,
        target: &StatTarget,
        delta: i64,
    ) -> Option<ContributingFactor> {
        let ability = target.governing_ability(new_doc)?;
        let old_scores = abilities::ability_scores(old_doc);
        let new_scores = abilities::ability_scores(new_doc);
        let old_score = *old_scores.get(&ability)?;
        let new_score = *new_scores.get(&ability)?;
        let mod_delta = abilities::modifier(new_score) - abilities::modifier(old_score);
        if mod_delta == 0 {
            return None;
        }

        let consistent = match target {
            // Max HP moves by the modifier delta once per character level.
            StatTarget::MaxHitPoints => {
                let level = classes::total_level(new_doc).max(1);
                mod_delta * level == delta
            }
            _ => mod_delta == delta,
        };
        if !consistent {
            return None;
        }

        Some(ContributingFactor {
            attribution: ChangeAttribution::new(
                format!("ability:{}", ability.key()),
                ability.name(),
                SourceKind::Ability,
                format!(
                    "{} {old_score} → {new_score} (modifier {:+} → {:+})",
                    ability.name(),
                    abilities::modifier(old_score),
                    abilities::modifier(new_score)
                ),
            ),
            confidence: WEIGHT_ABILITY,
        })
    }

    /// Level-up effects: hit-die gains for HP, proficiency-bonus tier
    /// transitions for proficiency-driven stats, ASI milestones for
    /// ability scores.
    fn level_cause(
        &self,
        old_doc: &CharacterDocument,
        new_doc: &CharacterDocument,
        target: &StatTarget,
        delta: i64,
    ) -> Option<ContributingFactor> {
        let old_level = classes::total_level(old_doc);
        let new_level = classes::total_level(new_doc);
        let gained = new_level - old_level;
        if gained <= 0 {
            return None;
        }

        match target {
            StatTarget::MaxHitPoints => {
                let con_mod = abilities::ability_scores(new_doc)
                    .get(&Ability::Constitution)
                    .map(|score| abilities::modifier(*score))
                    .unwrap_or(0);
                let (min_gain, max_gain) = hp_gain_range(old_doc, new_doc, con_mod);
                if delta < min_gain || delta > max_gain {
                    return None;
                }
                Some(ContributingFactor {
                    attribution: ChangeAttribution::new(
                        format!("level:{new_level}"),
                        format!("Level {new_level}"),
                        SourceKind::Level,
                        format!(
                            "{gained} level(s) gained: expected +{min_gain} to +{max_gain} HP"
                        ),
                    ),
                    confidence: WEIGHT_LEVEL,
                })
            }
            StatTarget::SpellSaveDc | StatTarget::SpellAttackBonus | StatTarget::PassiveSkill(_) => {
                let pb_delta =
                    tables::proficiency_bonus(new_level) - tables::proficiency_bonus(old_level);
                if pb_delta == 0 || pb_delta != delta {
                    return None;
                }
                Some(ContributingFactor {
                    attribution: ChangeAttribution::new(
                        format!("level:{new_level}"),
                        format!("Level {new_level}"),
                        SourceKind::Level,
                        format!("proficiency bonus rose to +{}", tables::proficiency_bonus(new_level)),
                    ),
                    confidence: WEIGHT_LEVEL,
                })
            }
            StatTarget::AbilityScore(_) => {
                // A class reaching an ASI level explains a +1/+2 bump.
                if !(1..=2).contains(&delta) {
                    return None;
                }
                let asi_class = classes::classes(new_doc).into_iter().find(|class| {
                    tables::asi_levels(&class.name).contains(&class.level)
                        && class_gained_level(old_doc, class)
                })?;
                Some(ContributingFactor {
                    attribution: ChangeAttribution::new(
                        format!("asi:{}:{}", slug(&asi_class.name), asi_class.level),
                        format!("{} {} ASI", asi_class.name, asi_class.level),
                        SourceKind::Level,
                        format!(
                            "ability score improvement at {} level {}",
                            asi_class.name, asi_class.level
                        ),
                    ),
                    confidence: WEIGHT_LEVEL,
                })
            }
            StatTarget::Initiative => None,
        }
    }

    /// Equipment that pins an ability score (Amulet of Health and kin).
    fn equipment_cause(
        &self,
        old_doc: &CharacterDocument,
        new_doc: &CharacterDocument,
        target: &StatTarget,
        delta: i64,
    ) -> Option<ContributingFactor> {
        let StatTarget::AbilityScore(ability) = target else {
            return None;
        };
        let old_names: Vec<String> = inventory::inventory(old_doc)
            .into_iter()
            .map(|item| item.name)
            .collect();
        let new_names: Vec<String> = inventory::inventory(new_doc)
            .into_iter()
            .map(|item| item.name)
            .collect();
        let new_scores = abilities::ability_scores(new_doc);
        let old_scores = abilities::ability_scores(old_doc);

        // Gained an item that sets the score.
        for name in new_names.iter().filter(|n| !old_names.contains(n)) {
            if let Some(effect) = tables::item_ability_effect(name) {
                if effect.ability == *ability
                    && new_scores.get(ability) == Some(&effect.set_score)
                    && delta > 0
                {
                    return Some(equipment_factor(name, effect.set_score, "equipped"));
                }
            }
        }
        // Lost an item that was setting the score.
        for name in old_names.iter().filter(|n| !new_names.contains(n)) {
            if let Some(effect) = tables::item_ability_effect(name) {
                if effect.ability == *ability
                    && old_scores.get(ability) == Some(&effect.set_score)
                    && delta < 0
                {
                    return Some(equipment_factor(name, effect.set_score, "unequipped"));
                }
            }
        }
        None
    }

    /// A feat gained (or lost) whose tabled effect matches the delta.
    fn feat_cause(
        &self,
        old_doc: &CharacterDocument,
        new_doc: &CharacterDocument,
        target: &StatTarget,
        delta: i64,
    ) -> Option<ContributingFactor> {
        let old_feats = feats::feats(old_doc);
        let new_feats = feats::feats(new_doc);

        let gained: Vec<&String> = new_feats
            .keys()
            .filter(|name| !old_feats.contains_key(*name))
            .collect();
        let lost: Vec<&String> = old_feats
            .keys()
            .filter(|name| !new_feats.contains_key(*name))
            .collect();

        for (names, sign) in [(&gained, 1), (&lost, -1)] {
            for name in names.iter() {
                let Some(effect) = tables::feat_effect(name) else {
                    continue;
                };
                let consistent = match target {
                    StatTarget::Initiative => {
                        effect.initiative_bonus != 0 && sign * effect.initiative_bonus == delta
                    }
                    StatTarget::MaxHitPoints => {
                        let level = classes::total_level(new_doc).max(1);
                        effect.hp_per_level != 0 && sign * effect.hp_per_level * level == delta
                    }
                    StatTarget::PassiveSkill(skill) => {
                        effect.passive_bonus != 0
                            && (skill == "perception" || skill == "investigation")
                            && sign * effect.passive_bonus == delta
                    }
                    StatTarget::AbilityScore(ability) => {
                        !effect.ability_choices.is_empty()
                            && effect.ability_choices.contains(ability)
                            && sign * effect.ability_bonus == delta
                    }
                    StatTarget::SpellSaveDc | StatTarget::SpellAttackBonus => false,
                };
                if consistent {
                    let verb = if sign > 0 { "gained" } else { "lost" };
                    return Some(ContributingFactor {
                        attribution: ChangeAttribution::new(
                            format!("feat:{}", slug(name)),
                            name.as_str(),
                            SourceKind::Feat,
                            format!("{verb} {name}: {}", effect.summary),
                        ),
                        confidence: WEIGHT_FEAT,
                    });
                }
            }
        }
        None
    }

    /// A race change whose tabled ability bonuses match the delta.
    fn racial_cause(
        &self,
        old_doc: &CharacterDocument,
        new_doc: &CharacterDocument,
        target: &StatTarget,
        delta: i64,
    ) -> Option<ContributingFactor> {
        let StatTarget::AbilityScore(ability) = target else {
            return None;
        };
        let old_race = traits::race(old_doc).map(|race| race.name);
        let new_race = traits::race(new_doc)?;
        if old_race.as_deref() == Some(new_race.name.as_str()) {
            return None;
        }

        let bonus = tables::racial_bonuses(&new_race.name)
            .iter()
            .find(|(bonus_ability, _)| bonus_ability == ability)
            .map(|(_, bonus)| *bonus)?;
        if bonus != delta {
            return None;
        }
        Some(ContributingFactor {
            attribution: ChangeAttribution::new(
                format!("race:{}", slug(&new_race.name)),
                new_race.name.as_str(),
                SourceKind::Race,
                format!("{} grants {:+} {}", new_race.name, bonus, ability.name()),
            ),
            confidence: WEIGHT_RACE,
        })
    }

    /// A brand-new class (multiclass dip) plausibly explains an HP jump.
    fn class_feature_cause(
        &self,
        old_doc: &CharacterDocument,
        new_doc: &CharacterDocument,
        target: &StatTarget,
        delta: i64,
    ) -> Option<ContributingFactor> {
        if *target != StatTarget::MaxHitPoints || delta <= 0 {
            return None;
        }
        let old_names: Vec<String> = classes::classes(old_doc)
            .into_iter()
            .map(|class| class.name)
            .collect();
        let new_class = classes::classes(new_doc)
            .into_iter()
            .find(|class| !old_names.contains(&class.name))?;
        Some(ContributingFactor {
            attribution: ChangeAttribution::new(
                format!("class:{}", slug(&new_class.name)),
                new_class.name.as_str(),
                SourceKind::ClassFeature,
                format!(
                    "{} level(s) of {} add hit points",
                    new_class.level, new_class.name
                ),
            ),
            confidence: WEIGHT_CLASS_FEATURE,
        })
    }
}

/// Expected HP gain range for the levels gained between two snapshots:
/// minimum 1 + CON per level, maximum hit-die + CON per level.
fn hp_gain_range(
    old_doc: &CharacterDocument,
    new_doc: &CharacterDocument,
    con_mod: i64,
) -> (i64, i64) {
    let old_classes = classes::classes(old_doc);
    let mut min_gain = 0;
    let mut max_gain = 0;
    for class in classes::classes(new_doc) {
        let old_level = old_classes
            .iter()
            .find(|old| old.name == class.name)
            .map(|old| old.level)
            .unwrap_or(0);
        let gained = (class.level - old_level).max(0);
        if gained == 0 {
            continue;
        }
        let die = class.hit_die.unwrap_or(8);
        min_gain += gained * (1 + con_mod);
        max_gain += gained * (die + con_mod);
    }
    (min_gain.max(1), max_gain.max(1))
}

fn class_gained_level(old_doc: &CharacterDocument, class: &ClassInfo) -> bool {
    classes::classes(old_doc)
        .iter()
        .find(|old| old.name == class.name)
        .map(|old| old.level < class.level)
        .unwrap_or(true)
}

fn equipment_factor(name: &str, set_score: i64, verb: &str) -> ContributingFactor {
    ContributingFactor {
        attribution: ChangeAttribution::new(
            format!("item:{}", slug(name)),
            name,
            SourceKind::Equipment,
            format!("{verb} {name} (sets score to {set_score})"),
        ),
        confidence: WEIGHT_EQUIPMENT,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn analyzer_config() -> CausationConfig {
        CausationConfig::default()
    }

    fn doc(value: Value) -> CharacterDocument {
        CharacterDocument::new(value)
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Gauntlets of Ogre Power"), "gauntlets_of_ogre_power");
        assert_eq!(slug("Rope (50ft)"), "rope_50ft");
    }

    #[test]
    fn test_alert_feat_explains_initiative_jump() {
        let config = analyzer_config();
        let analyzer = CausationAnalyzer::new(&config);
        let old = doc(json!({"feats": [], "initiativeBonus": 2}));
        let new = doc(json!({"feats": [{"name": "Alert"}], "initiativeBonus": 7}));

        let report = analyzer
            .analyze(&old, &new, &StatTarget::Initiative, 5)
            .unwrap();
        let primary = report.primary_cause.unwrap();
        assert_eq!(primary.source, "feat:alert");
        assert_eq!(primary.source_type, SourceKind::Feat);
        assert!(report.confidence >= 0.3);
    }

    #[test]
    fn test_dexterity_beats_feat_in_priority_order() {
        let config = analyzer_config();
        let analyzer = CausationAnalyzer::new(&config);
        // DEX 14 -> 16 raises the modifier by 1; initiative moved by 1.
        let old = doc(json!({"stats": [{"id": 2, "value": 14}]}));
        let new = doc(json!({"stats": [{"id": 2, "value": 16}]}));

        let report = analyzer
            .analyze(&old, &new, &StatTarget::Initiative, 1)
            .unwrap();
        assert_eq!(report.primary_cause.unwrap().source, "ability:dexterity");
    }

    #[test]
    fn test_inconsistent_delta_contributes_nothing() {
        let config = analyzer_config();
        let analyzer = CausationAnalyzer::new(&config);
        // Modifier delta is +1 but initiative moved +3: not the cause.
        let old = doc(json!({"stats": [{"id": 2, "value": 14}]}));
        let new = doc(json!({"stats": [{"id": 2, "value": 16}]}));

        assert!(analyzer
            .analyze(&old, &new, &StatTarget::Initiative, 3)
            .is_none());
    }

    #[test]
    fn test_tough_feat_explains_hp_gain() {
        let config = analyzer_config();
        let analyzer = CausationAnalyzer::new(&config);
        let old = doc(json!({"feats": [], "classes": [{"name": "Fighter", "level": 5}]}));
        let new = doc(json!({
            "feats": [{"name": "Tough"}],
            "classes": [{"name": "Fighter", "level": 5}]
        }));

        let report = analyzer
            .analyze(&old, &new, &StatTarget::MaxHitPoints, 10)
            .unwrap();
        assert_eq!(report.primary_cause.unwrap().source, "feat:tough");
    }

    #[test]
    fn test_level_up_hp_range() {
        let config = analyzer_config();
        let analyzer = CausationAnalyzer::new(&config);
        let old = doc(json!({
            "classes": [{"name": "Fighter", "level": 4}],
            "stats": [{"id": 3, "value": 14}]
        }));
        let new = doc(json!({
            "classes": [{"name": "Fighter", "level": 5}],
            "stats": [{"id": 3, "value": 14}]
        }));

        // One fighter level with CON +2: expected gain between 3 and 12.
        let report = analyzer
            .analyze(&old, &new, &StatTarget::MaxHitPoints, 8)
            .unwrap();
        assert_eq!(
            report.primary_cause.unwrap().source_type,
            SourceKind::Level
        );
        assert!(analyzer
            .analyze(&old, &new, &StatTarget::MaxHitPoints, 40)
            .is_none());
    }

    #[test]
    fn test_amulet_of_health_sets_constitution() {
        let config = analyzer_config();
        let analyzer = CausationAnalyzer::new(&config);
        let old = doc(json!({
            "stats": [{"id": 3, "value": 14}],
            "inventory": []
        }));
        let new = doc(json!({
            "stats": [{"id": 3, "value": 19}],
            "inventory": [{"id": 1, "name": "Amulet of Health"}]
        }));

        let report = analyzer
            .analyze(
                &old,
                &new,
                &StatTarget::AbilityScore(Ability::Constitution),
                5,
            )
            .unwrap();
        assert_eq!(
            report.primary_cause.unwrap().source,
            "item:amulet_of_health"
        );
    }

    #[test]
    fn test_asi_explains_ability_bump() {
        let config = analyzer_config();
        let analyzer = CausationAnalyzer::new(&config);
        let old = doc(json!({"classes": [{"name": "Fighter", "level": 3}]}));
        let new = doc(json!({"classes": [{"name": "Fighter", "level": 4}]}));

        let report = analyzer
            .analyze(&old, &new, &StatTarget::AbilityScore(Ability::Strength), 2)
            .unwrap();
        let primary = report.primary_cause.unwrap();
        assert_eq!(primary.source, "asi:fighter:4");
        assert_eq!(primary.source_type, SourceKind::Level);
    }

    #[test]
    fn test_disabled_analyzer_returns_none() {
        let config = CausationConfig {
            enabled: false,
            ..CausationConfig::default()
        };
        let analyzer = CausationAnalyzer::new(&config);
        let old = doc(json!({"feats": []}));
        let new = doc(json!({"feats": [{"name": "Alert"}]}));
        assert!(analyzer
            .analyze(&old, &new, &StatTarget::Initiative, 5)
            .is_none());
    }

    #[test]
    fn test_confidence_caps_at_one() {
        let config = analyzer_config();
        let analyzer = CausationAnalyzer::new(&config);
        // DEX modifier +5 matches, and Alert also matches +5: both
        // contribute, capped below 1.0.
        let old = doc(json!({
            "stats": [{"id": 2, "value": 10}],
            "feats": []
        }));
        let new = doc(json!({
            "stats": [{"id": 2, "value": 20}],
            "feats": [{"name": "Alert"}]
        }));

        let report = analyzer
            .analyze(&old, &new, &StatTarget::Initiative, 5)
            .unwrap();
        assert_eq!(report.contributing_factors.len(), 2);
        assert!(report.confidence <= 1.0);
        assert_eq!(report.primary_cause.unwrap().source, "ability:dexterity");
    }
}
