//! Static Effect-Lookup Tables
//!
//! Read-only rule data built once at process start: feat effects, racial
//! ability bonuses, class hit dice, caster progression, the skill-to-ability
//! map, and a handful of magic items that pin an ability score. Detectors
//! and the causation analyzer consult these tables; nothing mutates them.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::core::accessors::abilities::Ability;

// ============================================================================
// Feats
// ============================================================================

/// Mechanical effects of a feat that matter for cause attribution.
#[derive(Debug, Clone)]
pub struct FeatEffect {
    /// Abilities the feat may raise (half-feats). Empty when none.
    pub ability_choices: &'static [Ability],
    /// Size of the ability increase, when `ability_choices` is non-empty.
    pub ability_bonus: i64,
    pub initiative_bonus: i64,
    /// Bonus to passive Perception and Investigation.
    pub passive_bonus: i64,
    /// Extra hit points per character level.
    pub hp_per_level: i64,
    pub walking_speed_bonus: i64,
    pub summary: &'static str,
}

const NO_ABILITIES: &[Ability] = &[];
const MENTAL: &[Ability] = &[Ability::Intelligence, Ability::Wisdom, Ability::Charisma];
const ANY_ABILITY: &[Ability] = &[
    Ability::Strength,
    Ability::Dexterity,
    Ability::Constitution,
    Ability::Intelligence,
    Ability::Wisdom,
    Ability::Charisma,
];

impl FeatEffect {
    const fn passive(choices: &'static [Ability], passive_bonus: i64, summary: &'static str) -> Self {
        Self {
            ability_choices: choices,
            ability_bonus: 1,
            initiative_bonus: 0,
            passive_bonus,
            hp_per_level: 0,
            walking_speed_bonus: 0,
            summary,
        }
    }

    const fn half_feat(choices: &'static [Ability], summary: &'static str) -> Self {
        Self::passive(choices, 0, summary)
    }
}

/// Feat name (lowercase) → mechanical effect.
pub static FEAT_EFFECTS: Lazy<HashMap<&'static str, FeatEffect>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(
        "alert",
        FeatEffect {
            ability_choices: NO_ABILITIES,
            ability_bonus: 0,
            initiative_bonus: 5,
            passive_bonus: 0,
            hp_per_level: 0,
            walking_speed_bonus: 0,
            summary: "+5 initiative, cannot be surprised while conscious",
        },
    );
    table.insert(
        "tough",
        FeatEffect {
            ability_choices: NO_ABILITIES,
            ability_bonus: 0,
            initiative_bonus: 0,
            passive_bonus: 0,
            hp_per_level: 2,
            walking_speed_bonus: 0,
            summary: "+2 hit points per character level",
        },
    );
    table.insert(
        "mobile",
        FeatEffect {
            ability_choices: NO_ABILITIES,
            ability_bonus: 0,
            initiative_bonus: 0,
            passive_bonus: 0,
            hp_per_level: 0,
            walking_speed_bonus: 10,
            summary: "+10 ft. walking speed",
        },
    );
    table.insert(
        "observant",
        FeatEffect::passive(
            &[Ability::Intelligence, Ability::Wisdom],
            5,
            "+1 INT or WIS, +5 passive Perception and Investigation",
        ),
    );
    table.insert(
        "resilient",
        FeatEffect::half_feat(ANY_ABILITY, "+1 to one ability, proficiency in its saves"),
    );
    table.insert(
        "skill expert",
        FeatEffect::half_feat(ANY_ABILITY, "+1 to one ability, one skill proficiency and one expertise"),
    );
    table.insert(
        "athlete",
        FeatEffect::half_feat(
            &[Ability::Strength, Ability::Dexterity],
            "+1 STR or DEX, improved climbing and jumping",
        ),
    );
    table.insert(
        "actor",
        FeatEffect::half_feat(&[Ability::Charisma], "+1 CHA, advantage on impersonation checks"),
    );
    table.insert(
        "keen mind",
        FeatEffect::half_feat(&[Ability::Intelligence], "+1 INT, perfect recall of the last month"),
    );
    table.insert(
        "lightly armored",
        FeatEffect::half_feat(
            &[Ability::Strength, Ability::Dexterity],
            "+1 STR or DEX, light armor proficiency",
        ),
    );
    table.insert(
        "moderately armored",
        FeatEffect::half_feat(
            &[Ability::Strength, Ability::Dexterity],
            "+1 STR or DEX, medium armor and shield proficiency",
        ),
    );
    table.insert(
        "heavily armored",
        FeatEffect::half_feat(&[Ability::Strength], "+1 STR, heavy armor proficiency"),
    );
    table.insert(
        "heavy armor master",
        FeatEffect::half_feat(&[Ability::Strength], "+1 STR, reduce nonmagical damage in heavy armor"),
    );
    table.insert(
        "weapon master",
        FeatEffect::half_feat(
            &[Ability::Strength, Ability::Dexterity],
            "+1 STR or DEX, proficiency with four weapons",
        ),
    );
    table.insert(
        "durable",
        FeatEffect::half_feat(&[Ability::Constitution], "+1 CON, improved hit die recovery"),
    );
    table.insert(
        "chef",
        FeatEffect::half_feat(
            &[Ability::Constitution, Ability::Wisdom],
            "+1 CON or WIS, cooking grants temporary hit points",
        ),
    );
    table.insert(
        "telekinetic",
        FeatEffect::half_feat(MENTAL, "+1 mental ability, invisible mage hand and bonus shove"),
    );
    table.insert(
        "telepathic",
        FeatEffect::half_feat(MENTAL, "+1 mental ability, speak telepathically"),
    );
    table.insert(
        "fey touched",
        FeatEffect::half_feat(MENTAL, "+1 mental ability, misty step and one 1st-level spell"),
    );
    table.insert(
        "shadow touched",
        FeatEffect::half_feat(MENTAL, "+1 mental ability, invisibility and one 1st-level spell"),
    );
    table.insert(
        "crusher",
        FeatEffect::half_feat(
            &[Ability::Strength, Ability::Constitution],
            "+1 STR or CON, bludgeoning crits expose the target",
        ),
    );
    table.insert(
        "piercer",
        FeatEffect::half_feat(
            &[Ability::Strength, Ability::Dexterity],
            "+1 STR or DEX, reroll one piercing damage die",
        ),
    );
    table.insert(
        "slasher",
        FeatEffect::half_feat(
            &[Ability::Strength, Ability::Dexterity],
            "+1 STR or DEX, slashing damage slows the target",
        ),
    );
    table.insert(
        "elven accuracy",
        FeatEffect::half_feat(
            &[
                Ability::Dexterity,
                Ability::Intelligence,
                Ability::Wisdom,
                Ability::Charisma,
            ],
            "+1 DEX/INT/WIS/CHA, reroll one advantage die",
        ),
    );
    table.insert(
        "orcish fury",
        FeatEffect::half_feat(
            &[Ability::Strength, Ability::Constitution],
            "+1 STR or CON, extra damage die once per rest",
        ),
    );
    table.insert(
        "squat nimbleness",
        FeatEffect::half_feat(
            &[Ability::Strength, Ability::Dexterity],
            "+1 STR or DEX, +5 ft. speed, escape proficiency",
        ),
    );
    table.insert(
        "dwarven fortitude",
        FeatEffect::half_feat(&[Ability::Constitution], "+1 CON, dodge to spend a hit die"),
    );
    table.insert(
        "infernal constitution",
        FeatEffect::half_feat(&[Ability::Constitution], "+1 CON, resist cold and poison"),
    );
    table.insert(
        "second chance",
        FeatEffect::half_feat(&[Ability::Dexterity], "+1 DEX, force a reroll once per rest"),
    );
    table.insert(
        "dragon hide",
        FeatEffect::half_feat(
            &[Ability::Strength, Ability::Constitution, Ability::Charisma],
            "+1 STR/CON/CHA, natural armor and claws",
        ),
    );
    table
});

/// Look up a feat's mechanical effect by display name.
pub fn feat_effect(name: &str) -> Option<&'static FeatEffect> {
    FEAT_EFFECTS.get(name.trim().to_lowercase().as_str())
}

// ============================================================================
// Races
// ============================================================================

/// Racial ability bonuses keyed by race name (lowercase). Subrace bonuses
/// are folded into the combined names exporters actually emit.
pub static RACIAL_ABILITY_BONUSES: Lazy<HashMap<&'static str, &'static [(Ability, i64)]>> =
    Lazy::new(|| {
        let mut table: HashMap<&'static str, &'static [(Ability, i64)]> = HashMap::new();
        table.insert("hill dwarf", &[(Ability::Constitution, 2), (Ability::Wisdom, 1)]);
        table.insert(
            "mountain dwarf",
            &[(Ability::Constitution, 2), (Ability::Strength, 2)],
        );
        table.insert("dwarf", &[(Ability::Constitution, 2)]);
        table.insert(
            "high elf",
            &[(Ability::Dexterity, 2), (Ability::Intelligence, 1)],
        );
        table.insert("wood elf", &[(Ability::Dexterity, 2), (Ability::Wisdom, 1)]);
        table.insert("drow", &[(Ability::Dexterity, 2), (Ability::Charisma, 1)]);
        table.insert("elf", &[(Ability::Dexterity, 2)]);
        table.insert(
            "lightfoot halfling",
            &[(Ability::Dexterity, 2), (Ability::Charisma, 1)],
        );
        table.insert(
            "stout halfling",
            &[(Ability::Dexterity, 2), (Ability::Constitution, 1)],
        );
        table.insert("halfling", &[(Ability::Dexterity, 2)]);
        table.insert(
            "human",
            &[
                (Ability::Strength, 1),
                (Ability::Dexterity, 1),
                (Ability::Constitution, 1),
                (Ability::Intelligence, 1),
                (Ability::Wisdom, 1),
                (Ability::Charisma, 1),
            ],
        );
        table.insert(
            "dragonborn",
            &[(Ability::Strength, 2), (Ability::Charisma, 1)],
        );
        table.insert(
            "forest gnome",
            &[(Ability::Intelligence, 2), (Ability::Dexterity, 1)],
        );
        table.insert(
            "rock gnome",
            &[(Ability::Intelligence, 2), (Ability::Constitution, 1)],
        );
        table.insert("gnome", &[(Ability::Intelligence, 2)]);
        table.insert("half-elf", &[(Ability::Charisma, 2)]);
        table.insert(
            "half-orc",
            &[(Ability::Strength, 2), (Ability::Constitution, 1)],
        );
        table.insert(
            "tiefling",
            &[(Ability::Charisma, 2), (Ability::Intelligence, 1)],
        );
        table.insert("goliath", &[(Ability::Strength, 2), (Ability::Constitution, 1)]);
        table.insert("aasimar", &[(Ability::Charisma, 2)]);
        table
    });

/// Racial ability bonuses for a race name, tolerant of subrace qualifiers.
pub fn racial_bonuses(race_name: &str) -> &'static [(Ability, i64)] {
    let normalized = race_name.trim().to_lowercase();
    if let Some(bonuses) = RACIAL_ABILITY_BONUSES.get(normalized.as_str()) {
        return bonuses;
    }
    // "Elf (High)" and similar qualified forms fall back to a substring
    // match. Longest key first, so "hill dwarf" wins over "dwarf" and the
    // scan order never depends on map internals.
    let mut keys: Vec<&&'static str> = RACIAL_ABILITY_BONUSES.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    for key in keys {
        if normalized.contains(*key) {
            return RACIAL_ABILITY_BONUSES[*key];
        }
    }
    &[]
}

// ============================================================================
// Classes
// ============================================================================

/// Hit die size per class (lowercase name).
pub fn class_hit_die(class_name: &str) -> Option<i64> {
    match class_name.trim().to_lowercase().as_str() {
        "barbarian" => Some(12),
        "fighter" | "paladin" | "ranger" | "blood hunter" => Some(10),
        "artificer" | "bard" | "cleric" | "druid" | "monk" | "rogue" | "warlock" => Some(8),
        "sorcerer" | "wizard" => Some(6),
        _ => None,
    }
}

/// How a class contributes to the shared multiclass spell-slot pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasterKind {
    Full,
    Half,
    /// Subclass casters (Eldritch Knight, Arcane Trickster).
    Third,
    /// Warlock pact magic: a separate pool, excluded from the shared table.
    Pact,
    NonCaster,
}

impl CasterKind {
    /// Levels this class contributes to the combined caster level.
    /// Half and third casters contribute rounded down, pact contributes
    /// nothing (separate resource pool).
    pub fn caster_levels(&self, class_level: i64) -> i64 {
        match self {
            CasterKind::Full => class_level,
            CasterKind::Half => class_level / 2,
            CasterKind::Third => class_level / 3,
            CasterKind::Pact | CasterKind::NonCaster => 0,
        }
    }
}

/// Caster progression for a class, refined by subclass where relevant.
pub fn caster_kind(class_name: &str, subclass: Option<&str>) -> CasterKind {
    match class_name.trim().to_lowercase().as_str() {
        "bard" | "cleric" | "druid" | "sorcerer" | "wizard" => CasterKind::Full,
        "paladin" | "ranger" | "artificer" => CasterKind::Half,
        "warlock" => CasterKind::Pact,
        "fighter" | "rogue" => match subclass.map(|s| s.trim().to_lowercase()) {
            Some(s) if s == "eldritch knight" || s == "arcane trickster" => CasterKind::Third,
            _ => CasterKind::NonCaster,
        },
        _ => CasterKind::NonCaster,
    }
}

/// Highest spell-slot level available at a combined caster level (shared
/// multiclass table).
pub fn highest_slot_level(caster_level: i64) -> i64 {
    match caster_level {
        l if l >= 17 => 9,
        l if l >= 15 => 8,
        l if l >= 13 => 7,
        l if l >= 11 => 6,
        l if l >= 9 => 5,
        l if l >= 7 => 4,
        l if l >= 5 => 3,
        l if l >= 3 => 2,
        l if l >= 1 => 1,
        _ => 0,
    }
}

/// Class levels at which an Ability Score Improvement is granted.
pub fn asi_levels(class_name: &str) -> &'static [i64] {
    match class_name.trim().to_lowercase().as_str() {
        "fighter" => &[4, 6, 8, 12, 14, 16, 19],
        "rogue" => &[4, 8, 10, 12, 16, 19],
        _ => &[4, 8, 12, 16, 19],
    }
}

/// Proficiency bonus for a total character level.
pub fn proficiency_bonus(level: i64) -> i64 {
    ((level - 1).max(0)) / 4 + 2
}

// ============================================================================
// Skills, alignment, size
// ============================================================================

/// The eighteen skills and their governing abilities.
pub static SKILL_ABILITIES: Lazy<Vec<(&'static str, Ability)>> = Lazy::new(|| {
    vec![
        ("Acrobatics", Ability::Dexterity),
        ("Animal Handling", Ability::Wisdom),
        ("Arcana", Ability::Intelligence),
        ("Athletics", Ability::Strength),
        ("Deception", Ability::Charisma),
        ("History", Ability::Intelligence),
        ("Insight", Ability::Wisdom),
        ("Intimidation", Ability::Charisma),
        ("Investigation", Ability::Intelligence),
        ("Medicine", Ability::Wisdom),
        ("Nature", Ability::Intelligence),
        ("Perception", Ability::Wisdom),
        ("Performance", Ability::Charisma),
        ("Persuasion", Ability::Charisma),
        ("Religion", Ability::Intelligence),
        ("Sleight of Hand", Ability::Dexterity),
        ("Stealth", Ability::Dexterity),
        ("Survival", Ability::Wisdom),
    ]
});

/// Governing ability for a skill name, case-insensitive.
pub fn skill_ability(skill: &str) -> Option<Ability> {
    let normalized = skill.trim().to_lowercase().replace(['_', '-'], " ");
    SKILL_ABILITIES
        .iter()
        .find(|(name, _)| name.to_lowercase() == normalized)
        .map(|(_, ability)| *ability)
}

/// Skills governed by one ability.
pub fn skills_for_ability(ability: Ability) -> Vec<&'static str> {
    SKILL_ABILITIES
        .iter()
        .filter(|(_, a)| *a == ability)
        .map(|(name, _)| *name)
        .collect()
}

/// Upstream numeric alignment ids, lawful-good first.
pub fn alignment_name(id: i64) -> Option<&'static str> {
    match id {
        1 => Some("Lawful Good"),
        2 => Some("Neutral Good"),
        3 => Some("Chaotic Good"),
        4 => Some("Lawful Neutral"),
        5 => Some("True Neutral"),
        6 => Some("Chaotic Neutral"),
        7 => Some("Lawful Evil"),
        8 => Some("Neutral Evil"),
        9 => Some("Chaotic Evil"),
        _ => None,
    }
}

/// Upstream numeric size ids.
pub fn size_name(id: i64) -> Option<&'static str> {
    match id {
        2 => Some("Tiny"),
        3 => Some("Small"),
        4 => Some("Medium"),
        5 => Some("Large"),
        6 => Some("Huge"),
        7 => Some("Gargantuan"),
        _ => None,
    }
}

// ============================================================================
// Magic items that pin an ability score
// ============================================================================

/// Effect of an item that sets an ability score to a fixed value.
#[derive(Debug, Clone, Copy)]
pub struct ItemAbilityEffect {
    pub ability: Ability,
    pub set_score: i64,
}

/// Item name (lowercase) → pinned ability score.
pub static ITEM_ABILITY_EFFECTS: Lazy<HashMap<&'static str, ItemAbilityEffect>> =
    Lazy::new(|| {
        let mut table = HashMap::new();
        table.insert(
            "amulet of health",
            ItemAbilityEffect {
                ability: Ability::Constitution,
                set_score: 19,
            },
        );
        table.insert(
            "gauntlets of ogre power",
            ItemAbilityEffect {
                ability: Ability::Strength,
                set_score: 19,
            },
        );
        table.insert(
            "headband of intellect",
            ItemAbilityEffect {
                ability: Ability::Intelligence,
                set_score: 19,
            },
        );
        table.insert(
            "belt of hill giant strength",
            ItemAbilityEffect {
                ability: Ability::Strength,
                set_score: 21,
            },
        );
        table.insert(
            "belt of frost giant strength",
            ItemAbilityEffect {
                ability: Ability::Strength,
                set_score: 23,
            },
        );
        table.insert(
            "belt of fire giant strength",
            ItemAbilityEffect {
                ability: Ability::Strength,
                set_score: 25,
            },
        );
        table
    });

pub fn item_ability_effect(item_name: &str) -> Option<&'static ItemAbilityEffect> {
    ITEM_ABILITY_EFFECTS.get(item_name.trim().to_lowercase().as_str())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feat_effect_lookup_is_case_insensitive() {
        assert_eq!(feat_effect("Alert").unwrap().initiative_bonus, 5);
        assert_eq!(feat_effect("TOUGH").unwrap().hp_per_level, 2);
        assert!(feat_effect("Completely Made Up").is_none());
    }

    #[test]
    fn test_observant_grants_passive_bonus() {
        let effect = feat_effect("Observant").unwrap();
        assert_eq!(effect.passive_bonus, 5);
        assert!(effect.ability_choices.contains(&Ability::Wisdom));
    }

    #[test]
    fn test_racial_bonuses_with_qualifier() {
        let bonuses = racial_bonuses("Elf (High)");
        assert!(bonuses.contains(&(Ability::Dexterity, 2)));
        assert!(racial_bonuses("Modron").is_empty());
    }

    #[test]
    fn test_caster_progression() {
        assert_eq!(caster_kind("Wizard", None).caster_levels(5), 5);
        assert_eq!(caster_kind("Paladin", None).caster_levels(5), 2);
        assert_eq!(
            caster_kind("Fighter", Some("Eldritch Knight")).caster_levels(7),
            2
        );
        assert_eq!(caster_kind("Warlock", None).caster_levels(10), 0);
        assert_eq!(caster_kind("Fighter", Some("Champion")).caster_levels(9), 0);
    }

    #[rstest::rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(4, 2)]
    #[case(5, 3)]
    #[case(9, 5)]
    #[case(12, 6)]
    #[case(17, 9)]
    #[case(20, 9)]
    fn test_slot_table_boundaries(#[case] caster_level: i64, #[case] expected: i64) {
        assert_eq!(highest_slot_level(caster_level), expected);
    }

    #[test]
    fn test_proficiency_bonus_tiers() {
        assert_eq!(proficiency_bonus(1), 2);
        assert_eq!(proficiency_bonus(4), 2);
        assert_eq!(proficiency_bonus(5), 3);
        assert_eq!(proficiency_bonus(8), 3);
        assert_eq!(proficiency_bonus(9), 4);
        assert_eq!(proficiency_bonus(17), 6);
    }

    #[test]
    fn test_skill_ability_map() {
        assert_eq!(skill_ability("Perception"), Some(Ability::Wisdom));
        assert_eq!(skill_ability("sleight_of_hand"), Some(Ability::Dexterity));
        assert_eq!(skill_ability("Basket Weaving"), None);
        assert_eq!(skills_for_ability(Ability::Charisma).len(), 4);
    }

    #[test]
    fn test_asi_levels_per_class() {
        assert!(asi_levels("Fighter").contains(&6));
        assert!(!asi_levels("Wizard").contains(&6));
        assert!(asi_levels("Rogue").contains(&10));
    }

    #[test]
    fn test_item_effects() {
        let effect = item_ability_effect("Amulet of Health").unwrap();
        assert_eq!(effect.ability, Ability::Constitution);
        assert_eq!(effect.set_score, 19);
    }
}
