//! Field Accessor Layer
//!
//! Pure extraction functions that turn a raw, arbitrarily-shaped snapshot
//! into one canonical value per semantic concept. Accessors never fail: on
//! any extraction problem they log at debug level and return a safe default
//! (empty collection, zero, or an "Unknown <Kind>" sentinel). Each accessor
//! tries an ordered list of candidate raw paths, most current shape first.

pub mod abilities;
pub mod classes;
pub mod combat;
pub mod feats;
pub mod inventory;
pub mod proficiencies;
pub mod spells;
pub mod traits;

use serde_json::Value;

/// Resolve a display name from a nested entity of unknown shape.
///
/// Fallback chain: `definition.name` → `name` → `<kind>Name` / `<kind>_name`
/// → `displayName` → `"Unknown <Kind>"`. Bare strings resolve to themselves.
pub fn resolve_name(value: &Value, kind: &str) -> String {
    if let Some(s) = value.as_str() {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
        return unknown_label(kind);
    }

    let candidates = [
        value.pointer("/definition/name"),
        value.get("name"),
        value.get(format!("{kind}Name").as_str()),
        value.get(format!("{kind}_name").as_str()),
        value.get("displayName"),
    ];
    for candidate in candidates.into_iter().flatten() {
        if let Some(s) = candidate.as_str() {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }

    log::debug!("Could not resolve a {kind} name from {value}");
    unknown_label(kind)
}

/// Sentinel name for an entity whose name could not be resolved.
pub fn unknown_label(kind: &str) -> String {
    let mut chars = kind.chars();
    let title = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    format!("Unknown {title}")
}

/// Read a description-like field from a nested entity.
///
/// Tries `definition.description`, `definition.snippet`, `description`,
/// `snippet`; returns an empty string when none is present.
pub fn resolve_description(value: &Value) -> String {
    let candidates = [
        value.pointer("/definition/description"),
        value.pointer("/definition/snippet"),
        value.get("description"),
        value.get("snippet"),
    ];
    for candidate in candidates.into_iter().flatten() {
        if let Some(s) = candidate.as_str() {
            return s.trim().to_string();
        }
    }
    String::new()
}
