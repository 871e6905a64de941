//! Raw Snapshot Documents
//!
//! `CharacterDocument` wraps one snapshot of a character as an untyped JSON
//! tree. No schema is guaranteed: the same logical fact may live at any of
//! several paths depending on which upstream version produced the snapshot.
//! This module is the only place raw paths are walked; everything above it
//! goes through the accessor layer for canonical values.

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("snapshot is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("snapshot root must be an object, got {0}")]
    NonObjectRoot(&'static str),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

/// One immutable snapshot of a character at a point in time.
///
/// Detectors never mutate the wrapped value; all readers return borrowed
/// views or owned copies.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterDocument {
    root: Value,
}

impl CharacterDocument {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Parse a snapshot from raw JSON text.
    pub fn from_str(raw: &str) -> Result<Self> {
        let root: Value =
            serde_json::from_str(raw).map_err(|e| DocumentError::InvalidJson(e.to_string()))?;
        if !root.is_object() {
            return Err(DocumentError::NonObjectRoot(json_type_name(&root)));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Walk a dotted path into the tree. Numeric segments index arrays.
    ///
    /// `get("character.stats.0.value")` resolves object keys and array
    /// indices in order; any miss yields `None`, never a panic.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut cursor = &self.root;
        for segment in path.split('.') {
            cursor = match cursor {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => {
                    let index: usize = segment.parse().ok()?;
                    items.get(index)?
                }
                _ => return None,
            };
        }
        Some(cursor)
    }

    /// Try an ordered list of candidate paths; the first hit wins.
    ///
    /// This is the fallback chain that tolerates historical schema drift:
    /// callers list the most current path first and legacy paths after it.
    pub fn first(&self, candidates: &[&str]) -> Option<&Value> {
        candidates.iter().find_map(|path| self.get(path))
    }

    // ------------------------------------------------------------------
    // Typed leaf readers
    // ------------------------------------------------------------------

    pub fn int_at(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(coerce_int)
    }

    pub fn str_at(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn bool_at(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    pub fn array_at(&self, path: &str) -> Option<&Vec<Value>> {
        self.get(path).and_then(Value::as_array)
    }

    pub fn object_at(&self, path: &str) -> Option<&serde_json::Map<String, Value>> {
        self.get(path).and_then(Value::as_object)
    }

    pub fn first_int(&self, candidates: &[&str]) -> Option<i64> {
        candidates.iter().find_map(|path| self.int_at(path))
    }

    pub fn first_str(&self, candidates: &[&str]) -> Option<&str> {
        candidates.iter().find_map(|path| self.str_at(path))
    }

    pub fn first_array(&self, candidates: &[&str]) -> Option<&Vec<Value>> {
        candidates.iter().find_map(|path| self.array_at(path))
    }

    pub fn first_object(&self, candidates: &[&str]) -> Option<&serde_json::Map<String, Value>> {
        candidates.iter().find_map(|path| self.object_at(path))
    }
}

/// Lenient integer coercion for leaf values.
///
/// Upstream exporters are inconsistent about numeric typing: the same stat
/// arrives as an integer, a float, a decimal string, or (for flags folded
/// into counters) a bool. Floats truncate toward zero.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Lenient string coercion: strings pass through, numbers are formatted.
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Tests
// ============================================================================
