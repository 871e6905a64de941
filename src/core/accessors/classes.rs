//! Class and Level Extraction
//!
//! Canonical shape: an ordered list of classes with levels, subclasses, and
//! caster progression. Handles the definition-object arrays of current
//! exporters, a single legacy `class` field, and "Name N" string lists.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::accessors::resolve_name;
use crate::core::document::{coerce_int, CharacterDocument};
use crate::core::tables::{self, CasterKind};

/// One class entry in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    pub level: i64,
    pub subclass: Option<String>,
    pub hit_die: Option<i64>,
    pub is_starting: bool,
    pub caster: CasterKind,
}

impl ClassInfo {
    fn from_parts(name: String, level: i64, subclass: Option<String>, is_starting: bool) -> Self {
        let hit_die = tables::class_hit_die(&name);
        let caster = tables::caster_kind(&name, subclass.as_deref());
        Self {
            name,
            level,
            subclass,
            hit_die,
            is_starting,
            caster,
        }
    }

    /// Levels this class contributes to the shared multiclass slot pool.
    pub fn caster_levels(&self) -> i64 {
        self.caster.caster_levels(self.level)
    }
}

/// Extract the canonical class list from a snapshot.
pub fn classes(doc: &CharacterDocument) -> Vec<ClassInfo> {
    if let Some(entries) = doc.first_array(&["classes", "character.classes"]) {
        let parsed: Vec<ClassInfo> = entries.iter().filter_map(class_from_entry).collect();
        if !parsed.is_empty() {
            return parsed;
        }
    }

    // Single-class legacy shape: a bare `class` string plus a root level.
    if let Some(name) = doc.first_str(&["class", "character.class"]) {
        let level = doc.first_int(&["level", "character.level"]).unwrap_or(1);
        let subclass = doc
            .first_str(&["subclass", "character.subclass"])
            .map(str::to_string);
        return vec![ClassInfo::from_parts(
            name.to_string(),
            level,
            subclass,
            true,
        )];
    }

    log::debug!("No classes found in snapshot");
    Vec::new()
}

/// Total character level: the sum of class levels, or the root-level field
/// when no class list is present.
pub fn total_level(doc: &CharacterDocument) -> i64 {
    let from_classes: i64 = classes(doc).iter().map(|c| c.level).sum();
    if from_classes > 0 {
        return from_classes;
    }
    doc.first_int(&["level", "character.level", "totalLevel"])
        .unwrap_or(0)
}

/// Combined caster level across all classes (Warlock excluded).
pub fn combined_caster_level(doc: &CharacterDocument) -> i64 {
    classes(doc).iter().map(ClassInfo::caster_levels).sum()
}

/// One class feature in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInfo {
    /// Owning class, or "Unknown Class" for flat legacy lists.
    pub class_name: String,
    pub name: String,
    pub required_level: Option<i64>,
    pub description: String,
}

/// Extract every class feature across all classes.
///
/// Handles per-class feature lists (inside or beside the definition) and a
/// flat root list with embedded class names.
pub fn class_features(doc: &CharacterDocument) -> Vec<FeatureInfo> {
    let mut features = Vec::new();

    if let Some(entries) = doc.first_array(&["classes", "character.classes"]) {
        for entry in entries {
            let class_name = resolve_name(entry, "class");
            // Current exports duplicate the feature list at the class level
            // and inside the definition; read only the first present shape.
            let list = entry
                .get("classFeatures")
                .and_then(Value::as_array)
                .or_else(|| {
                    entry
                        .pointer("/definition/classFeatures")
                        .and_then(Value::as_array)
                })
                .or_else(|| entry.get("features").and_then(Value::as_array));
            for feature in list.into_iter().flatten() {
                features.push(feature_from_entry(feature, class_name.clone()));
            }
        }
    }

    if features.is_empty() {
        if let Some(entries) = doc.first_array(&["classFeatures", "character.classFeatures"]) {
            for feature in entries {
                let class_name = feature
                    .get("className")
                    .or_else(|| feature.get("class"))
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown Class")
                    .to_string();
                features.push(feature_from_entry(feature, class_name));
            }
        }
    }

    features
}

/// Flat set of feature names for cross-facet checks (the feat detector's
/// relabeling suppression).
pub fn class_feature_names(doc: &CharacterDocument) -> Vec<String> {
    class_features(doc)
        .into_iter()
        .map(|feature| feature.name)
        .collect()
}

fn feature_from_entry(entry: &Value, class_name: String) -> FeatureInfo {
    FeatureInfo {
        class_name,
        name: resolve_name(entry, "feature"),
        required_level: entry
            .get("requiredLevel")
            .or_else(|| entry.pointer("/definition/requiredLevel"))
            .or_else(|| entry.get("level"))
            .and_then(coerce_int),
        description: crate::core::accessors::resolve_description(entry),
    }
}

static NAME_LEVEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>.+?)\s+(?P<level>\d+)$").expect("class string pattern is valid")
});

fn class_from_entry(entry: &Value) -> Option<ClassInfo> {
    // "Fighter 5" string form.
    if let Some(s) = entry.as_str() {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some(captures) = NAME_LEVEL_RE.captures(trimmed) {
            let level = captures["level"].parse().unwrap_or(1);
            return Some(ClassInfo::from_parts(
                captures["name"].to_string(),
                level,
                None,
                false,
            ));
        }
        return Some(ClassInfo::from_parts(trimmed.to_string(), 1, None, false));
    }

    if !entry.is_object() {
        return None;
    }

    let name = resolve_name(entry, "class");
    let level = entry
        .get("level")
        .or_else(|| entry.get("classLevel"))
        .and_then(coerce_int)
        .unwrap_or(1);
    let subclass = entry
        .pointer("/subclassDefinition/name")
        .or_else(|| entry.get("subclass"))
        .or_else(|| entry.get("subclassName"))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let is_starting = entry
        .get("isStartingClass")
        .or_else(|| entry.get("starting_class"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let mut info = ClassInfo::from_parts(name, level, subclass, is_starting);
    // Prefer an explicit hit die from the definition over the rule table.
    if let Some(die) = entry.pointer("/definition/hitDice").and_then(coerce_int) {
        info.hit_die = Some(die);
    }
    Some(info)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definition_array_shape() {
        let doc = CharacterDocument::new(json!({
            "classes": [
                {
                    "definition": {"name": "Fighter", "hitDice": 10},
                    "subclassDefinition": {"name": "Battle Master"},
                    "level": 5,
                    "isStartingClass": true
                },
                {
                    "definition": {"name": "Wizard"},
                    "level": 2
                }
            ]
        }));
        let classes = classes(&doc);
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].name, "Fighter");
        assert_eq!(classes[0].subclass.as_deref(), Some("Battle Master"));
        assert_eq!(classes[0].hit_die, Some(10));
        assert!(classes[0].is_starting);
        assert_eq!(classes[1].caster, CasterKind::Full);
        assert_eq!(total_level(&doc), 7);
    }

    #[test]
    fn test_single_class_legacy_shape() {
        let doc = CharacterDocument::new(json!({"class": "Rogue", "level": 3}));
        let classes = classes(&doc);
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name, "Rogue");
        assert_eq!(classes[0].level, 3);
        assert!(classes[0].is_starting);
    }

    #[test]
    fn test_name_level_string_shape() {
        let doc = CharacterDocument::new(json!({"classes": ["Paladin 6", "Warlock 2"]}));
        let classes = classes(&doc);
        assert_eq!(classes[0].name, "Paladin");
        assert_eq!(classes[0].level, 6);
        assert_eq!(classes[1].caster, CasterKind::Pact);
    }

    #[test]
    fn test_combined_caster_level_excludes_warlock() {
        let doc = CharacterDocument::new(json!({
            "classes": [
                {"name": "Paladin", "level": 6},
                {"name": "Warlock", "level": 2},
                {"name": "Wizard", "level": 3}
            ]
        }));
        // Paladin 6 -> 3, Warlock -> 0, Wizard 3 -> 3.
        assert_eq!(combined_caster_level(&doc), 6);
    }

    #[test]
    fn test_class_features_nested_and_flat() {
        let nested = CharacterDocument::new(json!({
            "classes": [{
                "definition": {"name": "Fighter"},
                "classFeatures": [
                    {"definition": {"name": "Second Wind", "requiredLevel": 1}},
                    {"definition": {"name": "Action Surge", "requiredLevel": 2}}
                ]
            }]
        }));
        let features = class_features(&nested);
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].class_name, "Fighter");
        assert_eq!(features[1].name, "Action Surge");
        assert_eq!(features[1].required_level, Some(2));

        let flat = CharacterDocument::new(json!({
            "classFeatures": [{"className": "Monk", "name": "Ki"}]
        }));
        let features = class_features(&flat);
        assert_eq!(features[0].class_name, "Monk");
        assert_eq!(features[0].name, "Ki");
    }

    #[test]
    fn test_total_level_falls_back_to_root() {
        let doc = CharacterDocument::new(json!({"level": 4}));
        assert_eq!(total_level(&doc), 4);
        assert!(classes(&doc).is_empty());
    }
}
