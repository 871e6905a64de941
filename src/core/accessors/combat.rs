//! Combat Statistics Extraction
//!
//! Hit points, initiative, passive skills, spellcasting statistics, and the
//! observed skill/save bonuses the ability cascade compares against.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::accessors::abilities::Ability;
use crate::core::document::{coerce_int, CharacterDocument};

// ============================================================================
// Hit points
// ============================================================================

/// Canonical hit-point block.
///
/// Current exporters store max HP as base + bonus - removed with an
/// optional override; legacy exports store a flat max. `max()` collapses
/// both into one number.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HitPoints {
    pub base: Option<i64>,
    pub bonus: i64,
    pub removed: i64,
    pub override_value: Option<i64>,
    pub current: Option<i64>,
    pub temp: i64,
}

impl HitPoints {
    pub fn max(&self) -> Option<i64> {
        if let Some(value) = self.override_value {
            return Some(value);
        }
        self.base.map(|base| base + self.bonus - self.removed)
    }

    pub fn is_known(&self) -> bool {
        self.base.is_some() || self.override_value.is_some() || self.current.is_some()
    }
}

pub fn hit_points(doc: &CharacterDocument) -> HitPoints {
    // Component shape at the root or under `character`.
    for prefix in ["", "character."] {
        let base = doc.int_at(&format!("{prefix}baseHitPoints"));
        if base.is_some() {
            return HitPoints {
                base,
                bonus: doc.int_at(&format!("{prefix}bonusHitPoints")).unwrap_or(0),
                removed: doc
                    .int_at(&format!("{prefix}removedHitPoints"))
                    .unwrap_or(0),
                override_value: doc.int_at(&format!("{prefix}overrideHitPoints")),
                current: doc.int_at(&format!("{prefix}currentHitPoints")),
                temp: doc
                    .int_at(&format!("{prefix}temporaryHitPoints"))
                    .unwrap_or(0),
            };
        }
    }

    // Aggregate object shape: hitPoints / hp as {max, current, temp}.
    if let Some(block) = doc.first(&["hitPoints", "hp", "character.hitPoints", "character.hp"]) {
        if let Some(max) = block.as_i64() {
            return HitPoints {
                base: Some(max),
                ..HitPoints::default()
            };
        }
        if let Some(map) = block.as_object() {
            let max = map
                .get("max")
                .or_else(|| map.get("maximum"))
                .or_else(|| map.get("maxHp"))
                .and_then(coerce_int);
            return HitPoints {
                base: max,
                bonus: 0,
                removed: 0,
                override_value: map.get("override").and_then(coerce_int),
                current: map
                    .get("current")
                    .or_else(|| map.get("value"))
                    .and_then(coerce_int),
                temp: map
                    .get("temp")
                    .or_else(|| map.get("temporary"))
                    .and_then(coerce_int)
                    .unwrap_or(0),
            };
        }
    }

    log::debug!("No hit points found in snapshot");
    HitPoints::default()
}

// ============================================================================
// Initiative
// ============================================================================

pub fn initiative_bonus(doc: &CharacterDocument) -> Option<i64> {
    if let Some(value) = doc.first_int(&["initiativeBonus", "character.initiativeBonus"]) {
        return Some(value);
    }
    match doc.first(&["initiative", "character.initiative"])? {
        Value::Object(map) => map
            .get("bonus")
            .or_else(|| map.get("total"))
            .or_else(|| map.get("value"))
            .and_then(coerce_int),
        other => coerce_int(other),
    }
}

// ============================================================================
// Passive skills
// ============================================================================

const PASSIVE_SKILLS: [&str; 3] = ["perception", "investigation", "insight"];

/// Passive Perception/Investigation/Insight, keyed by lowercase skill name.
pub fn passive_skills(doc: &CharacterDocument) -> IndexMap<String, i64> {
    let mut passives = IndexMap::new();

    for skill in PASSIVE_SKILLS {
        let capitalized = capitalize(skill);
        let candidates = [
            format!("passive{capitalized}"),
            format!("passive_{skill}"),
            format!("passives.{skill}"),
            format!("character.passive{capitalized}"),
        ];
        let refs: Vec<&str> = candidates.iter().map(String::as_str).collect();
        if let Some(value) = doc.first_int(&refs) {
            passives.insert(skill.to_string(), value);
        }
    }
    passives
}

// ============================================================================
// Spellcasting statistics
// ============================================================================

/// Canonical spellcasting statistics block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellcastingStats {
    pub ability: Option<Ability>,
    pub save_dc: Option<i64>,
    pub attack_bonus: Option<i64>,
}

impl SpellcastingStats {
    pub fn is_known(&self) -> bool {
        self.ability.is_some() || self.save_dc.is_some() || self.attack_bonus.is_some()
    }
}

pub fn spellcasting_stats(doc: &CharacterDocument) -> SpellcastingStats {
    // Nested block shape.
    if let Some(block) = doc.first_object(&["spellcasting", "character.spellcasting"]) {
        let ability = block
            .get("ability")
            .or_else(|| block.get("spellcastingAbility"))
            .and_then(Value::as_str)
            .and_then(Ability::from_name)
            .or_else(|| {
                block
                    .get("abilityId")
                    .or_else(|| block.get("spellcastingAbilityId"))
                    .and_then(coerce_int)
                    .and_then(Ability::from_stat_id)
            });
        return SpellcastingStats {
            ability,
            save_dc: block
                .get("saveDc")
                .or_else(|| block.get("spellSaveDc"))
                .or_else(|| block.get("dc"))
                .and_then(coerce_int),
            attack_bonus: block
                .get("attackBonus")
                .or_else(|| block.get("spellAttackBonus"))
                .and_then(coerce_int),
        };
    }

    // Flat root keys.
    SpellcastingStats {
        ability: doc
            .first_str(&["spellcastingAbility", "character.spellcastingAbility"])
            .and_then(Ability::from_name)
            .or_else(|| {
                doc.first_int(&[
                    "spellcastingAbilityId",
                    "character.spellcastingAbilityId",
                ])
                .and_then(Ability::from_stat_id)
            }),
        save_dc: doc.first_int(&["spellSaveDc", "character.spellSaveDc"]),
        attack_bonus: doc.first_int(&["spellAttackBonus", "character.spellAttackBonus"]),
    }
}

// ============================================================================
// Skill and save bonuses
// ============================================================================

/// Observed skill bonuses keyed by canonical skill name (lowercase with
/// underscores). The ability cascade compares deltas here against the
/// modifier delta, so only shapes carrying explicit bonuses are read; the
/// engine never computes a skill bonus itself.
pub fn skill_bonuses(doc: &CharacterDocument) -> IndexMap<String, i64> {
    let mut bonuses = IndexMap::new();

    if let Some(map) = doc.first_object(&["skills", "character.skills"]) {
        for (name, value) in map {
            let bonus = match value {
                Value::Object(entry) => entry
                    .get("bonus")
                    .or_else(|| entry.get("modifier"))
                    .or_else(|| entry.get("value"))
                    .or_else(|| entry.get("total"))
                    .and_then(coerce_int),
                other => coerce_int(other),
            };
            if let Some(bonus) = bonus {
                bonuses.insert(canonical_skill_key(name), bonus);
            }
        }
        return bonuses;
    }

    if let Some(entries) = doc.first_array(&["skills", "character.skills"]) {
        for entry in entries {
            let Some(name) = entry.get("name").and_then(Value::as_str) else {
                continue;
            };
            let bonus = entry
                .get("bonus")
                .or_else(|| entry.get("modifier"))
                .or_else(|| entry.get("value"))
                .and_then(coerce_int);
            if let Some(bonus) = bonus {
                bonuses.insert(canonical_skill_key(name), bonus);
            }
        }
    }
    bonuses
}

/// Observed saving-throw bonuses keyed by lowercase ability name.
pub fn saving_throws(doc: &CharacterDocument) -> IndexMap<String, i64> {
    let mut saves = IndexMap::new();

    if let Some(map) = doc.first_object(&["savingThrows", "saves", "character.savingThrows"]) {
        for ability in Ability::ALL {
            for (name, value) in map {
                if Ability::from_name(name) != Some(ability) {
                    continue;
                }
                let bonus = match value {
                    Value::Object(entry) => entry
                        .get("bonus")
                        .or_else(|| entry.get("modifier"))
                        .or_else(|| entry.get("value"))
                        .and_then(coerce_int),
                    other => coerce_int(other),
                };
                if let Some(bonus) = bonus {
                    saves.insert(ability.key().to_string(), bonus);
                }
            }
        }
    }
    saves
}

fn canonical_skill_key(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ============================================================================
// Tests
// ============================================================================
