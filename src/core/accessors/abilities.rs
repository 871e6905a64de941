//! Ability Score Extraction
//!
//! Canonical shape: an insertion-ordered map of the six abilities to raw
//! scores. Handles the id/value stat arrays of current exporters, name-keyed
//! maps, nested score objects, and flat legacy keys.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::document::{coerce_int, CharacterDocument};

/// The six abilities, in standard order. Stat ids 1-6 map onto this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Strength,
        Ability::Dexterity,
        Ability::Constitution,
        Ability::Intelligence,
        Ability::Wisdom,
        Ability::Charisma,
    ];

    /// Upstream stat ids are 1-based in standard order.
    pub fn from_stat_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Ability::Strength),
            2 => Some(Ability::Dexterity),
            3 => Some(Ability::Constitution),
            4 => Some(Ability::Intelligence),
            5 => Some(Ability::Wisdom),
            6 => Some(Ability::Charisma),
            _ => None,
        }
    }

    /// Accepts full names and three-letter abbreviations, any case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "strength" | "str" => Some(Ability::Strength),
            "dexterity" | "dex" => Some(Ability::Dexterity),
            "constitution" | "con" => Some(Ability::Constitution),
            "intelligence" | "int" => Some(Ability::Intelligence),
            "wisdom" | "wis" => Some(Ability::Wisdom),
            "charisma" | "cha" => Some(Ability::Charisma),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Ability::Strength => "strength",
            Ability::Dexterity => "dexterity",
            Ability::Constitution => "constitution",
            Ability::Intelligence => "intelligence",
            Ability::Wisdom => "wisdom",
            Ability::Charisma => "charisma",
        }
    }

    pub fn abbrev(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Standard modifier derivation; floors toward negative infinity so that
/// a score of 9 yields -1, not 0.
pub fn modifier(score: i64) -> i64 {
    (score - 10).div_euclid(2)
}

/// Extract the canonical ability-score map from a snapshot.
///
/// Returns an empty map when no recognizable shape is present; the caller
/// treats "no abilities found on either side" as "nothing to compare".
pub fn ability_scores(doc: &CharacterDocument) -> IndexMap<Ability, i64> {
    // Current exporters: parallel id/value arrays with optional overrides
    // and bonuses applied on top of the base array.
    if let Some(stats) = doc.first_array(&["stats", "character.stats"]) {
        let mut scores = scores_from_stat_array(stats);
        if !scores.is_empty() {
            if let Some(bonuses) = doc.first_array(&["bonusStats", "character.bonusStats"]) {
                for (ability, bonus) in scores_from_stat_array(bonuses) {
                    if let Some(score) = scores.get_mut(&ability) {
                        *score += bonus;
                    }
                }
            }
            if let Some(overrides) = doc.first_array(&["overrideStats", "character.overrideStats"])
            {
                for (ability, value) in scores_from_stat_array(overrides) {
                    scores.insert(ability, value);
                }
            }
            return in_standard_order(scores);
        }
    }

    // Name-keyed map, either bare scores or nested {score: N} objects.
    if let Some(map) = doc.first_object(&["abilities", "character.abilities", "abilityScores"]) {
        let mut scores = IndexMap::new();
        for ability in Ability::ALL {
            for (key, value) in map {
                if Ability::from_name(key) == Some(ability) {
                    if let Some(score) = score_from_entry(value) {
                        scores.insert(ability, score);
                    }
                }
            }
        }
        if !scores.is_empty() {
            return scores;
        }
    }

    // Oldest shape: flat keys at the document root.
    let mut scores = IndexMap::new();
    for ability in Ability::ALL {
        if let Some(score) = doc.int_at(ability.key()) {
            scores.insert(ability, score);
        }
    }
    if scores.is_empty() {
        log::debug!("No ability scores found in snapshot");
    }
    scores
}

fn scores_from_stat_array(stats: &[Value]) -> IndexMap<Ability, i64> {
    let mut scores = IndexMap::new();
    for entry in stats {
        let id = entry.get("id").and_then(coerce_int);
        let value = entry.get("value").and_then(coerce_int);
        if let (Some(id), Some(value)) = (id, value) {
            if let Some(ability) = Ability::from_stat_id(id) {
                scores.insert(ability, value);
            }
        }
    }
    scores
}

fn score_from_entry(value: &Value) -> Option<i64> {
    coerce_int(value)
        .or_else(|| value.get("score").and_then(coerce_int))
        .or_else(|| value.get("value").and_then(coerce_int))
}

fn in_standard_order(scores: IndexMap<Ability, i64>) -> IndexMap<Ability, i64> {
    Ability::ALL
        .iter()
        .filter_map(|a| scores.get(a).map(|v| (*a, *v)))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
