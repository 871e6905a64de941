//! Spell Extraction
//!
//! Canonical shape: a flat list of spells with normalized structured
//! properties. Sources group spells per class, per origin kind, or in one
//! flat list; ranges and durations arrive as strings or structured objects.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::accessors::resolve_name;
use crate::core::document::{coerce_int, CharacterDocument};

/// Normalized spell range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellRange {
    /// "Self", "Touch", "Ranged", "Sight"...
    pub origin: Option<String>,
    /// Distance in feet, when the range has one.
    pub distance: Option<i64>,
}

impl fmt::Display for SpellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.origin, self.distance) {
            (_, Some(distance)) if distance > 0 => write!(f, "{distance} ft."),
            (Some(origin), _) => write!(f, "{origin}"),
            (None, _) => write!(f, "Unknown range"),
        }
    }
}

/// Normalized spell duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellDuration {
    pub interval: Option<i64>,
    /// "Instantaneous", "Minute", "Hour", "Round", "Day"...
    pub unit: Option<String>,
}

impl fmt::Display for SpellDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.interval, &self.unit) {
            (Some(interval), Some(unit)) if interval > 1 => {
                write!(f, "{interval} {}s", unit.to_lowercase())
            }
            (Some(interval), Some(unit)) => write!(f, "{interval} {}", unit.to_lowercase()),
            (None, Some(unit)) => write!(f, "{unit}"),
            _ => write!(f, "Unknown duration"),
        }
    }
}

/// One spell in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellInfo {
    pub name: String,
    pub level: i64,
    pub school: Option<String>,
    pub range: Option<SpellRange>,
    pub duration: Option<SpellDuration>,
    /// "V", "S", "M" markers.
    pub components: Vec<String>,
    pub ritual: bool,
    pub concentration: bool,
    pub prepared: bool,
}

/// Extract the canonical spell list from a snapshot.
///
/// Spells from every origin (class lists, racial spells, item spells, feat
/// spells) are concatenated in source order; duplicates by name are kept
/// once, first occurrence winning.
pub fn spells(doc: &CharacterDocument) -> Vec<SpellInfo> {
    let mut spells: Vec<SpellInfo> = Vec::new();

    // Current shape: per-class spell lists.
    if let Some(class_lists) = doc.first_array(&["classSpells", "character.classSpells"]) {
        for class_list in class_lists {
            if let Some(entries) = class_list.get("spells").and_then(Value::as_array) {
                collect_spells(entries, &mut spells);
            }
        }
    }

    // Origin-keyed map: spells.class[], spells.race[], spells.item[], spells.feat[].
    if let Some(map) = doc.first_object(&["spells", "character.spells"]) {
        for origin in ["class", "race", "item", "feat", "background"] {
            if let Some(entries) = map.get(origin).and_then(Value::as_array) {
                collect_spells(entries, &mut spells);
            }
        }
    }

    // Flat legacy list.
    if spells.is_empty() {
        if let Some(entries) = doc.first_array(&["spells", "character.spells", "spellList"]) {
            collect_spells(entries, &mut spells);
        }
    }

    if spells.is_empty() {
        log::debug!("No spells found in snapshot");
    }
    spells
}

fn collect_spells(entries: &[Value], into: &mut Vec<SpellInfo>) {
    for entry in entries {
        let spell = spell_from_entry(entry);
        if !into.iter().any(|existing| existing.name == spell.name) {
            into.push(spell);
        }
    }
}

fn spell_from_entry(entry: &Value) -> SpellInfo {
    let name = resolve_name(entry, "spell");
    let definition = entry.get("definition").unwrap_or(entry);

    let level = definition
        .get("level")
        .or_else(|| entry.get("level"))
        .and_then(coerce_int)
        .unwrap_or(0);
    let school = definition
        .get("school")
        .and_then(Value::as_str)
        .map(str::to_string);
    let ritual = definition
        .get("ritual")
        .or_else(|| entry.get("ritual"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let concentration = definition
        .get("concentration")
        .or_else(|| definition.pointer("/duration/durationType"))
        .and_then(|v| match v {
            Value::Bool(b) => Some(*b),
            Value::String(s) => Some(s.eq_ignore_ascii_case("concentration")),
            _ => None,
        })
        .unwrap_or(false);
    let prepared = entry
        .get("prepared")
        .or_else(|| entry.get("isPrepared"))
        .or_else(|| entry.get("alwaysPrepared"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    SpellInfo {
        name,
        level,
        school,
        range: definition.get("range").map(range_from_value),
        duration: definition.get("duration").map(duration_from_value),
        components: components_from_value(definition.get("components")),
        ritual,
        concentration,
        prepared,
    }
}

fn range_from_value(value: &Value) -> SpellRange {
    match value {
        // Structured: {"origin": "Ranged", "rangeValue": 60}.
        Value::Object(map) => SpellRange {
            origin: map
                .get("origin")
                .or_else(|| map.get("rangeType"))
                .and_then(Value::as_str)
                .map(str::to_string),
            distance: map
                .get("rangeValue")
                .or_else(|| map.get("value"))
                .and_then(coerce_int),
        },
        // "60 ft." or "Touch".
        Value::String(s) => {
            let distance = s
                .split_whitespace()
                .next()
                .and_then(|token| token.parse::<i64>().ok());
            SpellRange {
                origin: if distance.is_none() {
                    Some(s.trim().to_string())
                } else {
                    None
                },
                distance,
            }
        }
        Value::Number(_) => SpellRange {
            origin: None,
            distance: coerce_int(value),
        },
        _ => SpellRange {
            origin: None,
            distance: None,
        },
    }
}

fn duration_from_value(value: &Value) -> SpellDuration {
    match value {
        // Structured: {"durationInterval": 10, "durationUnit": "Minute"}.
        Value::Object(map) => SpellDuration {
            interval: map
                .get("durationInterval")
                .or_else(|| map.get("interval"))
                .and_then(coerce_int),
            unit: map
                .get("durationUnit")
                .or_else(|| map.get("unit"))
                .or_else(|| map.get("durationType"))
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        Value::String(s) => SpellDuration {
            interval: None,
            unit: Some(s.trim().to_string()),
        },
        _ => SpellDuration {
            interval: None,
            unit: None,
        },
    }
}

/// Component markers arrive as id lists (1=V, 2=S, 3=M), marker strings
/// ("V, S, M"), or string lists.
fn components_from_value(value: Option<&Value>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Number(_) => coerce_int(item).and_then(component_from_id),
                Value::String(s) => Some(s.trim().to_uppercase()),
                _ => None,
            })
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(|part| part.trim().to_uppercase())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn component_from_id(id: i64) -> Option<String> {
    match id {
        1 => Some("V".to_string()),
        2 => Some("S".to_string()),
        3 => Some("M".to_string()),
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
    fn test_class_spell_lists() {
        let doc = CharacterDocument::new(json!({
            "classSpells": [{
                "spells": [{
                    "definition": {
                        "name": "Fireball",
                        "level": 3,
                        "school": "Evocation",
                        "range": {"origin": "Ranged", "rangeValue": 150},
                        "duration": {"durationInterval": 0, "durationUnit": "Instantaneous"},
                        "components": [1, 2, 3],
                        "concentration": false
                    },
                    "prepared": true
                }]
            }]
        }));
        let spells = spells(&doc);
        assert_eq!(spells.len(), 1);
        let fireball = &spells[0];
        assert_eq!(fireball.name, "Fireball");
        assert_eq!(fireball.level, 3);
        assert_eq!(fireball.components, vec!["V", "S", "M"]);
        assert!(fireball.prepared);
        assert_eq!(fireball.range.as_ref().unwrap().to_string(), "150 ft.");
    }

    #[test]
    fn test_origin_keyed_map() {
        let doc = CharacterDocument::new(json!({
            "spells": {
                "class": [{"name": "Shield", "level": 1}],
                "race": [{"name": "Dancing Lights", "level": 0}],
                "item": []
            }
        }));
        let spells = spells(&doc);
        let names: Vec<&str> = spells.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Shield", "Dancing Lights"]);
    }

    #[test]
    fn test_flat_list_with_string_range() {
        let doc = CharacterDocument::new(json!({
            "spells": [
                {"name": "Cure Wounds", "level": 1, "range": "Touch", "duration": "Instantaneous"}
            ]
        }));
        let spells = spells(&doc);
        assert_eq!(spells[0].range.as_ref().unwrap().to_string(), "Touch");
        assert_eq!(
            spells[0].duration.as_ref().unwrap().to_string(),
            "Instantaneous"
        );
    }

    #[test]
    fn test_duplicate_names_kept_once() {
        let doc = CharacterDocument::new(json!({
            "spells": {
                "class": [{"name": "Shield", "level": 1}],
                "item": [{"name": "Shield", "level": 1}]
            }
        }));
        assert_eq!(spells(&doc).len(), 1);
    }

    #[test]
    fn test_duration_formatting() {
        let duration = SpellDuration {
            interval: Some(10),
            unit: Some("Minute".to_string()),
        };
        assert_eq!(duration.to_string(), "10 minutes");
        let one = SpellDuration {
            interval: Some(1),
            unit: Some("Hour".to_string()),
        };
        assert_eq!(one.to_string(), "1 hour");
    }

    #[test]
    fn test_empty_snapshot() {
        let doc = CharacterDocument::new(json!({}));
        assert!(spells(&doc).is_empty());
    }
}
