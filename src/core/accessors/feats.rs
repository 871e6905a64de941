//! Feat Extraction
//!
//! Canonical shape: a name-keyed, insertion-ordered map of feats. Sources
//! store feats as definition-object lists, bare-string lists, or name-keyed
//! maps; all collapse to the same canonical map.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::accessors::{resolve_description, resolve_name};
use crate::core::document::CharacterDocument;

/// One feat in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatInfo {
    pub name: String,
    pub description: String,
    /// Where the feat came from, when the source records it (a class grant,
    /// a racial bonus feat, a level choice).
    pub source: Option<String>,
}

/// Extract the canonical feat map from a snapshot.
///
/// Keyed by resolved feat name; a later duplicate of the same name is
/// ignored (first occurrence wins, matching upstream display behavior).
pub fn feats(doc: &CharacterDocument) -> IndexMap<String, FeatInfo> {
    if let Some(entries) = doc.first_array(&["feats", "character.feats"]) {
        return feats_from_list(entries);
    }

    if let Some(map) = doc.first_object(&["feats", "character.feats"]) {
        let mut feats = IndexMap::new();
        for (name, value) in map {
            let info = match value {
                Value::String(description) => FeatInfo {
                    name: name.clone(),
                    description: description.clone(),
                    source: None,
                },
                _ => FeatInfo {
                    name: name.clone(),
                    description: resolve_description(value),
                    source: feat_source(value),
                },
            };
            feats.entry(name.clone()).or_insert(info);
        }
        return feats;
    }

    log::debug!("No feats found in snapshot");
    IndexMap::new()
}

fn feats_from_list(entries: &[Value]) -> IndexMap<String, FeatInfo> {
    let mut feats = IndexMap::new();
    for entry in entries {
        let name = resolve_name(entry, "feat");
        let info = FeatInfo {
            name: name.clone(),
            description: resolve_description(entry),
            source: feat_source(entry),
        };
        feats.entry(name).or_insert(info);
    }
    feats
}

fn feat_source(entry: &Value) -> Option<String> {
    entry
        .get("source")
        .or_else(|| entry.get("componentSource"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definition_list_shape() {
        let doc = CharacterDocument::new(json!({
            "feats": [
                {"definition": {"name": "Alert", "snippet": "+5 initiative."}},
                {"definition": {"name": "Tough"}, "source": "level"}
            ]
        }));
        let feats = feats(&doc);
        assert_eq!(feats.len(), 2);
        assert_eq!(feats["Alert"].description, "+5 initiative.");
        assert_eq!(feats["Tough"].source.as_deref(), Some("level"));
    }

    #[test]
    fn test_bare_string_list_shape() {
        let doc = CharacterDocument::new(json!({"feats": ["Alert", "Lucky"]}));
        let feats = feats(&doc);
        assert_eq!(feats["Lucky"].name, "Lucky");
        assert_eq!(feats["Lucky"].description, "");
    }

    #[test]
    fn test_name_keyed_map_shape() {
        let doc = CharacterDocument::new(json!({
            "feats": {
                "Alert": "+5 to initiative.",
                "Observant": {"description": "+5 passive Perception."}
            }
        }));
        let feats = feats(&doc);
        assert_eq!(feats["Alert"].description, "+5 to initiative.");
        assert_eq!(feats["Observant"].description, "+5 passive Perception.");
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let doc = CharacterDocument::new(json!({
            "feats": [
                {"name": "Alert", "description": "first"},
                {"name": "Alert", "description": "second"}
            ]
        }));
        let feats = feats(&doc);
        assert_eq!(feats.len(), 1);
        assert_eq!(feats["Alert"].description, "first");
    }

    #[test]
    fn test_unnamed_entries_get_sentinel() {
        let doc = CharacterDocument::new(json!({"feats": [{"id": 9}]}));
        let feats = feats(&doc);
        assert!(feats.contains_key("Unknown Feat"));
    }

    #[test]
    fn test_empty_snapshot() {
        let doc = CharacterDocument::new(json!({}));
        assert!(feats(&doc).is_empty());
    }
}
