//! Identity Traits Extraction
//!
//! Background, race/species, personality text, alignment, size, and
//! movement speeds. These facets are mostly small scalars or short string
//! collections, but their raw shapes drift as much as the rest.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::accessors::resolve_name;
use crate::core::document::{coerce_int, CharacterDocument};
use crate::core::tables;

// ============================================================================
// Background
// ============================================================================

/// Canonical background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundInfo {
    pub name: String,
    /// The background's signature feature ("Criminal Contact").
    pub feature_name: Option<String>,
    /// Proficiencies the background grants, when the source spells them out.
    pub granted_proficiencies: Vec<String>,
}

pub fn background(doc: &CharacterDocument) -> Option<BackgroundInfo> {
    let value = doc.first(&["background", "character.background"])?;

    // Bare string shape.
    if let Some(s) = value.as_str() {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        return Some(BackgroundInfo {
            name: trimmed.to_string(),
            feature_name: None,
            granted_proficiencies: Vec::new(),
        });
    }

    // Definition object, with a custom-background override shape.
    let definition = value
        .get("definition")
        .or_else(|| value.get("customBackground"))
        .unwrap_or(value);
    let name = resolve_name(definition, "background");
    if name == "Unknown Background" && definition.get("name").is_none() {
        return None;
    }

    let feature_name = definition
        .get("featureName")
        .or_else(|| definition.get("feature_name"))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let granted_proficiencies = definition
        .get("skillProficienciesDescription")
        .or_else(|| definition.get("skillProficiencies"))
        .and_then(Value::as_str)
        .map(split_list)
        .unwrap_or_default();

    Some(BackgroundInfo {
        name,
        feature_name,
        granted_proficiencies,
    })
}

// ============================================================================
// Race / species
// ============================================================================

/// Canonical race/species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceInfo {
    pub name: String,
    pub subrace: Option<String>,
    pub size: Option<String>,
    pub walking_speed: Option<i64>,
    pub racial_traits: Vec<String>,
}

pub fn race(doc: &CharacterDocument) -> Option<RaceInfo> {
    let value = doc.first(&["race", "character.race", "species"])?;

    if let Some(s) = value.as_str() {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        return Some(RaceInfo {
            name: trimmed.to_string(),
            subrace: None,
            size: None,
            walking_speed: None,
            racial_traits: Vec::new(),
        });
    }

    let name = match value
        .get("fullName")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    {
        Some(full_name) => full_name,
        None => resolve_name(value, "race"),
    };

    let subrace = value
        .get("subRaceShortName")
        .or_else(|| value.get("subrace"))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let size = value
        .get("size")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            value
                .get("sizeId")
                .and_then(coerce_int)
                .and_then(tables::size_name)
                .map(str::to_string)
        });

    let walking_speed = value
        .pointer("/weightSpeeds/normal/walk")
        .or_else(|| value.get("speed"))
        .and_then(coerce_int);

    let racial_traits = value
        .get("racialTraits")
        .or_else(|| value.get("traits"))
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|entry| resolve_name(entry, "trait"))
                .collect()
        })
        .unwrap_or_default();

    Some(RaceInfo {
        name,
        subrace,
        size,
        walking_speed,
        racial_traits,
    })
}

// ============================================================================
// Personality
// ============================================================================

/// Canonical personality text, one entry per line of the source fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersonalityProfile {
    pub traits: Vec<String>,
    pub ideals: Vec<String>,
    pub bonds: Vec<String>,
    pub flaws: Vec<String>,
}

impl PersonalityProfile {
    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
            && self.ideals.is_empty()
            && self.bonds.is_empty()
            && self.flaws.is_empty()
    }
}

pub fn personality(doc: &CharacterDocument) -> PersonalityProfile {
    // Current shape nests the four fields under `traits`; legacy shapes put
    // them at the root.
    let read = |keys: &[&str]| -> Vec<String> {
        for key in keys {
            if let Some(value) = doc.get(key) {
                let entries = string_entries(value);
                if !entries.is_empty() {
                    return entries;
                }
            }
        }
        Vec::new()
    };

    PersonalityProfile {
        traits: read(&[
            "traits.personalityTraits",
            "personalityTraits",
            "personality_traits",
        ]),
        ideals: read(&["traits.ideals", "ideals"]),
        bonds: read(&["traits.bonds", "bonds"]),
        flaws: read(&["traits.flaws", "flaws"]),
    }
}

// ============================================================================
// Alignment, size, speeds
// ============================================================================

pub fn alignment(doc: &CharacterDocument) -> Option<String> {
    if let Some(s) = doc.first_str(&["alignment", "character.alignment"]) {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    doc.first_int(&["alignmentId", "character.alignmentId"])
        .and_then(tables::alignment_name)
        .map(str::to_string)
}

pub fn size(doc: &CharacterDocument) -> Option<String> {
    if let Some(s) = doc.first_str(&["size", "character.size"]) {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    doc.first_int(&["sizeId", "character.sizeId"])
        .and_then(tables::size_name)
        .map(str::to_string)
}

const SPEED_MODES: [&str; 5] = ["walk", "fly", "swim", "climb", "burrow"];

/// Movement speeds by mode; zero-valued modes are omitted.
pub fn speeds(doc: &CharacterDocument) -> IndexMap<String, i64> {
    let mut speeds = IndexMap::new();

    if let Some(map) = doc.first_object(&[
        "race.weightSpeeds.normal",
        "speeds",
        "speed",
        "character.speed",
    ]) {
        for mode in SPEED_MODES {
            if let Some(value) = map.get(mode).and_then(coerce_int) {
                if value > 0 {
                    speeds.insert(mode.to_string(), value);
                }
            }
        }
        if !speeds.is_empty() {
            return speeds;
        }
    }

    // Bare walking speed as a number.
    if let Some(value) = doc.first_int(&["speed", "character.speed", "walkingSpeed"]) {
        if value > 0 {
            speeds.insert("walk".to_string(), value);
        }
    }
    speeds
}

// ============================================================================
// Shared helpers
// ============================================================================

/// A personality field arrives as a newline-separated blob or as a list.
fn string_entries(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => split_lines(s),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn split_lines(s: &str) -> Vec<String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
