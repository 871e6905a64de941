//! Inventory Extraction
//!
//! Canonical shape: a flat item list with resolved names, quantities, and
//! container locations. Raw item ids are carried through but must never be
//! treated as stable: some backend migrations reassign every id, which is
//! exactly why the inventory detector reconciles by name and quantity.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::accessors::resolve_name;
use crate::core::document::{coerce_int, coerce_string, CharacterDocument};

/// One inventory entry in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    /// Raw upstream id, when present. Unstable across migrations.
    pub id: Option<String>,
    pub name: String,
    pub quantity: i64,
    /// Resolved container name ("Backpack", "Equipment") when the item is
    /// stored inside another entity.
    pub container: Option<String>,
    pub equipped: bool,
    pub item_type: Option<String>,
}

/// Extract the canonical inventory from a snapshot.
pub fn inventory(doc: &CharacterDocument) -> Vec<ItemInfo> {
    let Some(entries) = doc.first_array(&["inventory", "character.inventory", "items"]) else {
        log::debug!("No inventory found in snapshot");
        return Vec::new();
    };

    // First pass: index container entities by id so member items can show a
    // human-readable location instead of a raw entity id.
    let container_names: HashMap<String, String> = entries
        .iter()
        .filter(|entry| {
            entry
                .pointer("/definition/isContainer")
                .and_then(Value::as_bool)
                .unwrap_or(false)
        })
        .filter_map(|entry| {
            let id = entry.get("id").and_then(coerce_string)?;
            Some((id, resolve_name(entry, "item")))
        })
        .collect();

    entries
        .iter()
        .map(|entry| item_from_entry(entry, &container_names))
        .collect()
}

fn item_from_entry(entry: &Value, container_names: &HashMap<String, String>) -> ItemInfo {
    let name = resolve_name(entry, "item");
    let quantity = entry
        .get("quantity")
        .or_else(|| entry.get("qty"))
        .or_else(|| entry.get("count"))
        .and_then(coerce_int)
        .unwrap_or(1);
    let equipped = entry
        .get("equipped")
        .or_else(|| entry.get("isEquipped"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let item_type = entry
        .pointer("/definition/type")
        .or_else(|| entry.get("type"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let container = entry
        .get("containerEntityId")
        .or_else(|| entry.get("containerId"))
        .and_then(coerce_string)
        .map(|id| {
            container_names
                .get(&id)
                .cloned()
                .unwrap_or_else(|| "Equipment".to_string())
        })
        .or_else(|| {
            entry
                .get("container")
                .or_else(|| entry.get("location"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });

    ItemInfo {
        id: entry.get("id").and_then(coerce_string),
        name,
        quantity,
        container,
        equipped,
        item_type,
    }
}

// ============================================================================
// Tests
// ============================================================================
