//! Shared Snapshot Fixtures
//!
//! Builders for realistic character snapshots used across unit and property
//! tests. Kept close to the shapes current exporters actually emit.

use serde_json::{json, Value};

use crate::core::document::CharacterDocument;

/// A single-class fighter snapshot in the current export shape.
pub fn fighter(level: i64, feats: &[&str]) -> CharacterDocument {
    let feat_entries: Vec<Value> = feats
        .iter()
        .map(|name| json!({"definition": {"name": name}}))
        .collect();
    CharacterDocument::new(json!({
        "name": "Roland",
        "stats": [
            {"id": 1, "value": 16},
            {"id": 2, "value": 12},
            {"id": 3, "value": 14},
            {"id": 4, "value": 10},
            {"id": 5, "value": 13},
            {"id": 6, "value": 8}
        ],
        "classes": [{
            "definition": {"name": "Fighter", "hitDice": 10},
            "level": level,
            "isStartingClass": true
        }],
        "feats": feat_entries,
        "baseHitPoints": 10 + (level - 1) * 6,
        "alignmentId": 1,
        "race": {"fullName": "Human"},
        "background": {"definition": {"name": "Soldier"}}
    }))
}

/// A wisdom-caster snapshot with explicit derived stats, for cascade tests.
pub fn cleric(wisdom: i64, perception: i64, save_dc: i64) -> CharacterDocument {
    CharacterDocument::new(json!({
        "name": "Mira",
        "stats": [
            {"id": 2, "value": 14},
            {"id": 5, "value": wisdom}
        ],
        "classes": [{"definition": {"name": "Cleric"}, "level": 5}],
        "skills": {"Perception": perception, "Athletics": 1},
        "savingThrows": {"wisdom": perception - 1},
        "passivePerception": 10 + perception,
        "spellcasting": {"ability": "wisdom", "saveDc": save_dc, "attackBonus": save_dc - 8}
    }))
}

/// An inventory-only snapshot; `ids_from` shifts every raw id to simulate
/// an upstream id-reassignment migration.
pub fn inventory_snapshot(items: &[(&str, i64)], ids_from: i64) -> CharacterDocument {
    let entries: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(index, (name, quantity))| {
            json!({
                "id": ids_from + index as i64,
                "definition": {"name": name},
                "quantity": quantity
            })
        })
        .collect();
    CharacterDocument::new(json!({"inventory": entries}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::accessors::{abilities, classes, inventory};

    #[test]
    fn test_fixtures_extract_cleanly() {
        let doc = fighter(4, &["Alert"]);
        assert_eq!(classes::total_level(&doc), 4);
        assert_eq!(abilities::ability_scores(&doc).len(), 6);

        let items = inventory::inventory(&inventory_snapshot(&[("Rope (50ft)", 1)], 100));
        assert_eq!(items[0].id.as_deref(), Some("100"));
    }
}
