//! Proficiency Extraction
//!
//! Canonical shape: a name-keyed map of proficiencies classified by kind.
//! Current exporters bury proficiencies in per-source modifier lists;
//! legacy exports carry a flat list of names.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::document::CharacterDocument;
use crate::core::tables::skill_ability;

/// Broad classification of a proficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyKind {
    Skill,
    SavingThrow,
    Tool,
    Language,
    Armor,
    Weapon,
    Other,
}

impl ProficiencyKind {
    pub fn key(&self) -> &'static str {
        match self {
            ProficiencyKind::Skill => "skill",
            ProficiencyKind::SavingThrow => "saving_throw",
            ProficiencyKind::Tool => "tool",
            ProficiencyKind::Language => "language",
            ProficiencyKind::Armor => "armor",
            ProficiencyKind::Weapon => "weapon",
            ProficiencyKind::Other => "other",
        }
    }
}

impl fmt::Display for ProficiencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProficiencyKind::Skill => "skill",
            ProficiencyKind::SavingThrow => "saving throw",
            ProficiencyKind::Tool => "tool",
            ProficiencyKind::Language => "language",
            ProficiencyKind::Armor => "armor",
            ProficiencyKind::Weapon => "weapon",
            ProficiencyKind::Other => "proficiency",
        };
        write!(f, "{s}")
    }
}

/// One proficiency in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProficiencyInfo {
    pub name: String,
    pub kind: ProficiencyKind,
    /// Which source list granted it (race/class/background/feat/item),
    /// when the shape records that.
    pub source: Option<String>,
}

const MODIFIER_SOURCES: [&str; 5] = ["race", "class", "background", "feat", "item"];

/// Extract the canonical proficiency map from a snapshot.
pub fn proficiencies(doc: &CharacterDocument) -> IndexMap<String, ProficiencyInfo> {
    let mut result = IndexMap::new();

    // Current shape: modifiers.{race,class,...}[] entries of type "proficiency".
    if let Some(modifiers) = doc.first_object(&["modifiers", "character.modifiers"]) {
        for source in MODIFIER_SOURCES {
            let Some(entries) = modifiers.get(source).and_then(Value::as_array) else {
                continue;
            };
            for entry in entries {
                let is_proficiency = entry
                    .get("type")
                    .and_then(Value::as_str)
                    .map(|t| t.eq_ignore_ascii_case("proficiency"))
                    .unwrap_or(false);
                if !is_proficiency {
                    continue;
                }
                let Some(name) = entry
                    .get("friendlySubtypeName")
                    .or_else(|| entry.get("subType"))
                    .or_else(|| entry.get("name"))
                    .and_then(Value::as_str)
                else {
                    log::debug!("Skipping proficiency modifier without a name");
                    continue;
                };
                let name = name.trim().to_string();
                result.entry(name.clone()).or_insert(ProficiencyInfo {
                    kind: classify(&name),
                    name,
                    source: Some(source.to_string()),
                });
            }
        }
        if !result.is_empty() {
            return result;
        }
    }

    // Legacy shape: a flat list of names or {name, type} objects.
    if let Some(entries) = doc.first_array(&["proficiencies", "character.proficiencies"]) {
        for entry in entries {
            let (name, explicit_kind) = match entry {
                Value::String(s) => (s.trim().to_string(), None),
                Value::Object(map) => {
                    let Some(name) = map.get("name").and_then(Value::as_str) else {
                        continue;
                    };
                    let kind = map
                        .get("type")
                        .and_then(Value::as_str)
                        .and_then(kind_from_label);
                    (name.trim().to_string(), kind)
                }
                _ => continue,
            };
            if name.is_empty() {
                continue;
            }
            result.entry(name.clone()).or_insert(ProficiencyInfo {
                kind: explicit_kind.unwrap_or_else(|| classify(&name)),
                name,
                source: None,
            });
        }
    }

    result
}

/// Best-effort classification from the proficiency name alone.
pub fn classify(name: &str) -> ProficiencyKind {
    let lower = name.trim().to_lowercase();

    if skill_ability(&lower).is_some() {
        return ProficiencyKind::Skill;
    }
    if lower.contains("saving throw") || lower.ends_with(" saves") {
        return ProficiencyKind::SavingThrow;
    }
    if lower.contains("armor") || lower == "shields" || lower == "shield" {
        return ProficiencyKind::Armor;
    }
    const LANGUAGES: [&str; 12] = [
        "common", "dwarvish", "elvish", "giant", "gnomish", "goblin", "halfling", "orc",
        "abyssal", "celestial", "draconic", "infernal",
    ];
    if LANGUAGES.contains(&lower.as_str()) {
        return ProficiencyKind::Language;
    }
    if lower.ends_with("tools")
        || lower.ends_with("kit")
        || lower.ends_with("supplies")
        || lower.ends_with("set")
        || lower.ends_with("utensils")
        || lower.contains("instrument")
    {
        return ProficiencyKind::Tool;
    }
    const WEAPON_WORDS: [&str; 10] = [
        "sword", "bow", "axe", "hammer", "dagger", "spear", "mace", "crossbow", "weapons",
        "flail",
    ];
    if WEAPON_WORDS.iter().any(|w| lower.contains(w)) {
        return ProficiencyKind::Weapon;
    }
    ProficiencyKind::Other
}

fn kind_from_label(label: &str) -> Option<ProficiencyKind> {
    match label.trim().to_lowercase().as_str() {
        "skill" => Some(ProficiencyKind::Skill),
        "saving_throw" | "saving throw" | "save" => Some(ProficiencyKind::SavingThrow),
        "tool" => Some(ProficiencyKind::Tool),
        "language" => Some(ProficiencyKind::Language),
        "armor" => Some(ProficiencyKind::Armor),
        "weapon" => Some(ProficiencyKind::Weapon),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_modifier_list_shape() {
        let doc = CharacterDocument::new(json!({
            "modifiers": {
                "class": [
                    {"type": "proficiency", "friendlySubtypeName": "Athletics"},
                    {"type": "bonus", "friendlySubtypeName": "Speed"}
                ],
                "background": [
                    {"type": "proficiency", "subType": "thieves-tools"}
                ]
            }
        }));
        let profs = proficiencies(&doc);
        assert_eq!(profs.len(), 2);
        assert_eq!(profs["Athletics"].kind, ProficiencyKind::Skill);
        assert_eq!(profs["Athletics"].source.as_deref(), Some("class"));
        assert_eq!(profs["thieves-tools"].source.as_deref(), Some("background"));
    }

    #[test]
    fn test_flat_list_shape() {
        let doc = CharacterDocument::new(json!({
            "proficiencies": [
                "Perception",
                "Smith's Tools",
                {"name": "Wisdom Saving Throws", "type": "saving_throw"},
                "Elvish",
                "Longsword"
            ]
        }));
        let profs = proficiencies(&doc);
        assert_eq!(profs["Perception"].kind, ProficiencyKind::Skill);
        assert_eq!(profs["Smith's Tools"].kind, ProficiencyKind::Tool);
        assert_eq!(
            profs["Wisdom Saving Throws"].kind,
            ProficiencyKind::SavingThrow
        );
        assert_eq!(profs["Elvish"].kind, ProficiencyKind::Language);
        assert_eq!(profs["Longsword"].kind, ProficiencyKind::Weapon);
    }

    #[test]
    fn test_classify_armor_and_other() {
        assert_eq!(classify("Light Armor"), ProficiencyKind::Armor);
        assert_eq!(classify("Shields"), ProficiencyKind::Armor);
        assert_eq!(classify("Vehicles (land)"), ProficiencyKind::Other);
    }

    #[test]
    fn test_empty_snapshot() {
        let doc = CharacterDocument::new(json!({}));
        assert!(proficiencies(&doc).is_empty());
    }
}
