//! Field Mapping Registry
//!
//! A static table associating semantic field-path patterns with display
//! names, default priorities, categories, and causation patterns (the other
//! fields a change here is likely to ripple into). Loaded once at process
//! start; read-only thereafter.
//!
//! Patterns are glob-style: `*` matches exactly one dotted segment, so
//! `classes.*.level` matches `classes.fighter.level` but not
//! `classes.fighter.subclass.level`.

use once_cell::sync::Lazy;

use crate::config::DetectionConfig;
use crate::core::change::{Category, ChangeKind, Priority};

/// Declarative mapping for one semantic field-path pattern.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    pub pattern: &'static str,
    pub display_name: &'static str,
    pub priority: Priority,
    pub category: Category,
    /// Change kinds this field is expected to produce.
    pub change_kinds: &'static [ChangeKind],
    /// Glob patterns of fields a change here plausibly affects.
    pub causation_patterns: &'static [&'static str],
}

const SCALAR_KINDS: &[ChangeKind] = &[
    ChangeKind::Incremented,
    ChangeKind::Decremented,
    ChangeKind::Modified,
];
const SET_KINDS: &[ChangeKind] = &[ChangeKind::Added, ChangeKind::Removed, ChangeKind::Modified];
const ALL_KINDS: &[ChangeKind] = &[
    ChangeKind::Added,
    ChangeKind::Removed,
    ChangeKind::Modified,
    ChangeKind::Incremented,
    ChangeKind::Decremented,
    ChangeKind::Moved,
    ChangeKind::Reordered,
];

/// The static mapping table, ordered most-specific first: the first
/// matching pattern wins.
static MAPPINGS: Lazy<Vec<FieldMapping>> = Lazy::new(|| {
    vec![
        FieldMapping {
            pattern: "abilities.*",
            display_name: "Ability Score",
            priority: Priority::High,
            category: Category::Abilities,
            change_kinds: SCALAR_KINDS,
            causation_patterns: &[
                "skills.*",
                "saving_throws.*",
                "passives.*",
                "combat.initiative",
                "combat.hit_points.max",
                "spellcasting.save_dc",
                "spellcasting.attack_bonus",
            ],
        },
        FieldMapping {
            pattern: "saving_throws.*",
            display_name: "Saving Throw",
            priority: Priority::Medium,
            category: Category::Abilities,
            change_kinds: SCALAR_KINDS,
            causation_patterns: &["abilities.*", "progression.proficiency_bonus"],
        },
        FieldMapping {
            pattern: "skills.*",
            display_name: "Skill Bonus",
            priority: Priority::Medium,
            category: Category::Skills,
            change_kinds: SCALAR_KINDS,
            causation_patterns: &["abilities.*", "proficiencies.*.*", "progression.proficiency_bonus"],
        },
        FieldMapping {
            pattern: "passives.*",
            display_name: "Passive Skill",
            priority: Priority::Medium,
            category: Category::Skills,
            change_kinds: SCALAR_KINDS,
            causation_patterns: &["abilities.*", "feats.*", "progression.proficiency_bonus"],
        },
        FieldMapping {
            pattern: "combat.initiative",
            display_name: "Initiative Bonus",
            priority: Priority::Medium,
            category: Category::Combat,
            change_kinds: SCALAR_KINDS,
            causation_patterns: &["abilities.dexterity", "feats.*", "inventory.*"],
        },
        FieldMapping {
            pattern: "combat.hit_points.max",
            display_name: "Maximum Hit Points",
            priority: Priority::High,
            category: Category::Combat,
            change_kinds: SCALAR_KINDS,
            causation_patterns: &[
                "abilities.constitution",
                "progression.total_level",
                "feats.*",
                "inventory.*",
            ],
        },
        FieldMapping {
            pattern: "combat.hit_points.current",
            display_name: "Current Hit Points",
            priority: Priority::Low,
            category: Category::Combat,
            change_kinds: SCALAR_KINDS,
            causation_patterns: &[],
        },
        FieldMapping {
            pattern: "combat.hit_points.temp",
            display_name: "Temporary Hit Points",
            priority: Priority::Low,
            category: Category::Combat,
            change_kinds: SCALAR_KINDS,
            causation_patterns: &[],
        },
        FieldMapping {
            pattern: "spellcasting.save_dc",
            display_name: "Spell Save DC",
            priority: Priority::High,
            category: Category::Spells,
            change_kinds: SCALAR_KINDS,
            causation_patterns: &["abilities.*", "progression.proficiency_bonus", "inventory.*"],
        },
        FieldMapping {
            pattern: "spellcasting.attack_bonus",
            display_name: "Spell Attack Bonus",
            priority: Priority::High,
            category: Category::Spells,
            change_kinds: SCALAR_KINDS,
            causation_patterns: &["abilities.*", "progression.proficiency_bonus", "inventory.*"],
        },
        FieldMapping {
            pattern: "spellcasting.ability",
            display_name: "Spellcasting Ability",
            priority: Priority::Medium,
            category: Category::Spells,
            change_kinds: SET_KINDS,
            causation_patterns: &["classes.*"],
        },
        FieldMapping {
            pattern: "spellcasting.caster_level",
            display_name: "Combined Caster Level",
            priority: Priority::Medium,
            category: Category::Spells,
            change_kinds: SCALAR_KINDS,
            causation_patterns: &["classes.*.level", "classes.*"],
        },
        FieldMapping {
            pattern: "classes.*.level",
            display_name: "Class Level",
            priority: Priority::High,
            category: Category::Progression,
            change_kinds: SCALAR_KINDS,
            causation_patterns: &[
                "progression.total_level",
                "combat.hit_points.max",
                "class_features.*.*",
                "spellcasting.caster_level",
            ],
        },
        FieldMapping {
            pattern: "classes.*.subclass",
            display_name: "Subclass",
            priority: Priority::High,
            category: Category::Features,
            change_kinds: SET_KINDS,
            causation_patterns: &["class_features.*.*", "spells.*.*"],
        },
        FieldMapping {
            pattern: "classes.*",
            display_name: "Class",
            priority: Priority::High,
            category: Category::Progression,
            change_kinds: SET_KINDS,
            causation_patterns: &[
                "progression.total_level",
                "combat.hit_points.max",
                "proficiencies.*.*",
                "spellcasting.caster_level",
            ],
        },
        FieldMapping {
            pattern: "progression.total_level",
            display_name: "Character Level",
            priority: Priority::High,
            category: Category::Progression,
            change_kinds: SCALAR_KINDS,
            causation_patterns: &["progression.proficiency_bonus", "combat.hit_points.max"],
        },
        FieldMapping {
            pattern: "progression.proficiency_bonus",
            display_name: "Proficiency Bonus",
            priority: Priority::Medium,
            category: Category::Progression,
            change_kinds: SCALAR_KINDS,
            causation_patterns: &[
                "skills.*",
                "saving_throws.*",
                "passives.*",
                "spellcasting.save_dc",
                "spellcasting.attack_bonus",
            ],
        },
        FieldMapping {
            pattern: "feats.*",
            display_name: "Feat",
            priority: Priority::High,
            category: Category::Features,
            change_kinds: SET_KINDS,
            causation_patterns: &[
                "abilities.*",
                "combat.initiative",
                "passives.*",
                "combat.hit_points.max",
                "speeds.walk",
            ],
        },
        FieldMapping {
            pattern: "class_features.*.*",
            display_name: "Class Feature",
            priority: Priority::Medium,
            category: Category::Features,
            change_kinds: SET_KINDS,
            causation_patterns: &[],
        },
        FieldMapping {
            pattern: "spells.*.*",
            display_name: "Spell",
            priority: Priority::Medium,
            category: Category::Spells,
            change_kinds: ALL_KINDS,
            causation_patterns: &[],
        },
        FieldMapping {
            pattern: "inventory.*.quantity",
            display_name: "Item Quantity",
            priority: Priority::Low,
            category: Category::Inventory,
            change_kinds: SCALAR_KINDS,
            causation_patterns: &[],
        },
        FieldMapping {
            pattern: "inventory.*.location",
            display_name: "Item Location",
            priority: Priority::Low,
            category: Category::Inventory,
            change_kinds: &[ChangeKind::Moved],
            causation_patterns: &[],
        },
        FieldMapping {
            pattern: "inventory.*",
            display_name: "Inventory Item",
            priority: Priority::Medium,
            category: Category::Inventory,
            change_kinds: SET_KINDS,
            causation_patterns: &["abilities.*", "combat.hit_points.max"],
        },
        FieldMapping {
            pattern: "proficiencies.*.*",
            display_name: "Proficiency",
            priority: Priority::Medium,
            category: Category::Skills,
            change_kinds: SET_KINDS,
            causation_patterns: &["skills.*"],
        },
        FieldMapping {
            pattern: "background.feature",
            display_name: "Background Feature",
            priority: Priority::Medium,
            category: Category::Features,
            change_kinds: SET_KINDS,
            causation_patterns: &[],
        },
        FieldMapping {
            pattern: "background",
            display_name: "Background",
            priority: Priority::Medium,
            category: Category::BasicInfo,
            change_kinds: SET_KINDS,
            causation_patterns: &["proficiencies.*.*", "background.feature"],
        },
        FieldMapping {
            pattern: "race.subrace",
            display_name: "Subrace",
            priority: Priority::High,
            category: Category::BasicInfo,
            change_kinds: SET_KINDS,
            causation_patterns: &["abilities.*", "race.traits.*"],
        },
        FieldMapping {
            pattern: "race.traits.*",
            display_name: "Racial Trait",
            priority: Priority::Medium,
            category: Category::Features,
            change_kinds: SET_KINDS,
            causation_patterns: &[],
        },
        FieldMapping {
            pattern: "race",
            display_name: "Species",
            priority: Priority::High,
            category: Category::BasicInfo,
            change_kinds: SET_KINDS,
            causation_patterns: &["abilities.*", "race.traits.*", "speeds.*", "size"],
        },
        FieldMapping {
            pattern: "personality.*",
            display_name: "Personality",
            priority: Priority::Low,
            category: Category::Social,
            change_kinds: SET_KINDS,
            causation_patterns: &[],
        },
        FieldMapping {
            pattern: "alignment",
            display_name: "Alignment",
            priority: Priority::Low,
            category: Category::BasicInfo,
            change_kinds: SET_KINDS,
            causation_patterns: &[],
        },
        FieldMapping {
            pattern: "size",
            display_name: "Size",
            priority: Priority::Low,
            category: Category::BasicInfo,
            change_kinds: SET_KINDS,
            causation_patterns: &["race"],
        },
        FieldMapping {
            pattern: "speeds.*",
            display_name: "Movement Speed",
            priority: Priority::Medium,
            category: Category::Combat,
            change_kinds: SCALAR_KINDS,
            causation_patterns: &["race", "feats.*"],
        },
    ]
});

/// Match a concrete field path against a glob pattern.
/// `*` matches exactly one dotted segment; segment counts must agree.
pub fn pattern_matches(pattern: &str, field_path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('.').collect();
    let path_segments: Vec<&str> = field_path.split('.').collect();
    if pattern_segments.len() != path_segments.len() {
        return false;
    }
    pattern_segments
        .iter()
        .zip(&path_segments)
        .all(|(p, s)| *p == "*" || p == s)
}

/// Find the mapping for a concrete field path, first match wins.
pub fn lookup(field_path: &str) -> Option<&'static FieldMapping> {
    MAPPINGS
        .iter()
        .find(|mapping| pattern_matches(mapping.pattern, field_path))
}

/// Causation patterns registered for a field path; empty when unmapped.
pub fn causation_patterns_for(field_path: &str) -> &'static [&'static str] {
    lookup(field_path)
        .map(|mapping| mapping.causation_patterns)
        .unwrap_or(&[])
}

/// Whether a change at `primary_path` is registered as plausibly affecting
/// `dependent_path`. Detectors consult this before emitting a cascade, so
/// the ripple topology lives in the table rather than in detector code.
pub fn causation_linked(primary_path: &str, dependent_path: &str) -> bool {
    causation_patterns_for(primary_path)
        .iter()
        .any(|pattern| pattern_matches(pattern, dependent_path))
}

/// Resolve the priority of a change via the three-tier fallback:
/// explicit per-field override, then the matched mapping's default, then
/// a change-kind heuristic. The heuristic lets operators leave the table
/// sparse without every unmapped field collapsing to one priority.
pub fn resolve_priority(
    field_path: &str,
    kind: ChangeKind,
    config: &DetectionConfig,
) -> Priority {
    if let Some(priority) = config.priority_override(field_path) {
        return priority;
    }
    if let Some(mapping) = lookup(field_path) {
        return mapping.priority;
    }
    match kind {
        ChangeKind::Added | ChangeKind::Removed => Priority::High,
        ChangeKind::Incremented | ChangeKind::Decremented => Priority::Medium,
        _ => Priority::Low,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_matches_one_segment() {
        assert!(pattern_matches("abilities.*", "abilities.wisdom"));
        assert!(!pattern_matches("abilities.*", "abilities.wisdom.modifier"));
        assert!(!pattern_matches("abilities.*", "abilities"));
        assert!(pattern_matches("classes.*.level", "classes.fighter.level"));
        assert!(!pattern_matches("classes.*.level", "classes.fighter.subclass"));
    }

    #[test]
    fn test_most_specific_mapping_wins() {
        assert_eq!(
            lookup("classes.fighter.level").unwrap().display_name,
            "Class Level"
        );
        assert_eq!(lookup("classes.fighter").unwrap().display_name, "Class");
        assert_eq!(
            lookup("inventory.rope.quantity").unwrap().display_name,
            "Item Quantity"
        );
        assert_eq!(lookup("inventory.rope").unwrap().display_name, "Inventory Item");
    }

    #[rstest::rstest]
    #[case(ChangeKind::Added, Priority::High)]
    #[case(ChangeKind::Removed, Priority::High)]
    #[case(ChangeKind::Incremented, Priority::Medium)]
    #[case(ChangeKind::Decremented, Priority::Medium)]
    #[case(ChangeKind::Modified, Priority::Low)]
    #[case(ChangeKind::Moved, Priority::Low)]
    #[case(ChangeKind::Reordered, Priority::Low)]
    fn test_unmapped_path_falls_back_to_kind_heuristic(
        #[case] kind: ChangeKind,
        #[case] expected: Priority,
    ) {
        let config = DetectionConfig::default();
        assert_eq!(resolve_priority("totally.unmapped", kind, &config), expected);
    }

    #[test]
    fn test_override_beats_mapping() {
        let mut config = DetectionConfig::default();
        config
            .priority_overrides
            .insert("abilities.wisdom".to_string(), Priority::Low);
        assert_eq!(
            resolve_priority("abilities.wisdom", ChangeKind::Incremented, &config),
            Priority::Low
        );
        // Other abilities still use the mapping default.
        assert_eq!(
            resolve_priority("abilities.strength", ChangeKind::Incremented, &config),
            Priority::High
        );
    }

    #[test]
    fn test_causation_patterns_exposed() {
        let patterns = causation_patterns_for("combat.initiative");
        assert!(patterns.contains(&"abilities.dexterity"));
        assert!(causation_patterns_for("no.such.path").is_empty());
    }

    #[test]
    fn test_causation_links() {
        assert!(causation_linked("abilities.wisdom", "skills.perception"));
        assert!(causation_linked("abilities.dexterity", "combat.initiative"));
        assert!(causation_linked(
            "classes.wizard.level",
            "spellcasting.caster_level"
        ));
        assert!(!causation_linked("abilities.wisdom", "inventory.rope"));
        assert!(!causation_linked("alignment", "skills.perception"));
    }
}
