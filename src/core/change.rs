//! Change Record Types
//!
//! The output entities of the detection engine: categorized, prioritized,
//! human-readable records of what differed between two snapshots, plus the
//! attribution attached when a detector can name a probable cause.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Enumerations
// ============================================================================

/// What kind of difference was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
    Incremented,
    Decremented,
    Moved,
    Reordered,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::Modified => "modified",
            ChangeKind::Incremented => "incremented",
            ChangeKind::Decremented => "decremented",
            ChangeKind::Moved => "moved",
            ChangeKind::Reordered => "reordered",
        };
        write!(f, "{s}")
    }
}

/// Notification priority of a change.
///
/// Ordering is High < Medium < Low so that sorting a batch ascending puts
/// the most important records first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        };
        write!(f, "{s}")
    }
}

/// Which facet of the character a change belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Features,
    Skills,
    Abilities,
    Combat,
    Spells,
    Inventory,
    Equipment,
    Progression,
    BasicInfo,
    Social,
    Metadata,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Features => "features",
            Category::Skills => "skills",
            Category::Abilities => "abilities",
            Category::Combat => "combat",
            Category::Spells => "spells",
            Category::Inventory => "inventory",
            Category::Equipment => "equipment",
            Category::Progression => "progression",
            Category::BasicInfo => "basic_info",
            Category::Social => "social",
            Category::Metadata => "metadata",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// FieldChange
// ============================================================================

/// One detected difference between two snapshots.
///
/// `field_path` is a stable semantic locator: the same logical fact always
/// produces the same path regardless of where the raw document stored it.
/// Downstream storage keys deduplication on `field_path` + `change_kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field_path: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub change_kind: ChangeKind,
    pub priority: Priority,
    pub category: Category,
    /// Generated human-readable sentence.
    pub description: String,
    /// Open, detector-specific payload: causation reports, attribution,
    /// calculation breakdowns. Never interpreted by the framework itself.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, Value>,
}

impl FieldChange {
    pub fn new(
        field_path: impl Into<String>,
        old_value: Option<Value>,
        new_value: Option<Value>,
        change_kind: ChangeKind,
        priority: Priority,
        category: Category,
        description: impl Into<String>,
    ) -> Self {
        Self {
            field_path: field_path.into(),
            old_value,
            new_value,
            change_kind,
            priority,
            category,
            description: description.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Attach a metadata entry, consuming and returning self for chaining.
    pub fn with_meta(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Attach the long-form description used by renderers.
    pub fn with_detail(self, detail: impl Into<String>) -> Self {
        self.with_meta("detailed_description", Value::String(detail.into()))
    }

    /// Mark this record as a secondary effect of another change.
    pub fn as_cascade_of(self, primary_path: &str) -> Self {
        self.with_meta("cascade_of", Value::String(primary_path.to_string()))
    }

    /// Whether this record was emitted as a consequence of another change.
    pub fn is_secondary(&self) -> bool {
        self.metadata.contains_key("cascade_of")
    }
}

/// Lowercase, underscore-joined segment for field paths and machine tags.
///
/// `"Rope (50ft)"` → `"rope_50ft"`. Keeps paths stable across cosmetic
/// punctuation differences in source names.
pub fn slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

// ============================================================================
// Attribution
// ============================================================================

/// Broad classification of what produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Feat,
    ClassFeature,
    Race,
    Equipment,
    Level,
    Ability,
    Unknown,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::Feat => "feat",
            SourceKind::ClassFeature => "class_feature",
            SourceKind::Race => "race",
            SourceKind::Equipment => "equipment",
            SourceKind::Level => "level",
            SourceKind::Ability => "ability",
            SourceKind::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Best-effort identification of the probable cause of a change.
///
/// Attached under `metadata.attribution`; never asserted as certain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeAttribution {
    /// Machine tag, e.g. `feat:alert` or `level:5`.
    pub source: String,
    /// Human label, e.g. "Alert".
    pub source_name: String,
    pub source_type: SourceKind,
    /// One-line summary of the mechanical impact.
    pub impact_summary: String,
}

impl ChangeAttribution {
    pub fn new(
        source: impl Into<String>,
        source_name: impl Into<String>,
        source_type: SourceKind,
        impact_summary: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_name: source_name.into(),
            source_type,
            impact_summary: impact_summary.into(),
        }
    }

    pub fn unknown(impact_summary: impl Into<String>) -> Self {
        Self {
            source: "unknown".to_string(),
            source_name: "Unknown".to_string(),
            source_type: SourceKind::Unknown,
            impact_summary: impact_summary.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
