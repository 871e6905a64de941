//! Detector Framework
//!
//! The shared contract every per-facet detector implements, the closed
//! registry of detector types, and the engine that runs them over a pair of
//! snapshots. Detectors are stateless with respect to the documents: each
//! `detect` call extracts canonical values fresh, compares, and emits change
//! records. A detector that finds nothing simply returns an empty list; no
//! detector can fail the comparison for its peers.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};
use thiserror::Error;

use crate::config::DetectionConfig;
use crate::core::change::{Category, ChangeKind, FieldChange, Priority};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;
use crate::core::registry;

pub mod ability_scores;
pub mod alignment;
pub mod background;
pub mod class_features;
pub mod classes;
pub mod feats;
pub mod hit_points;
pub mod initiative;
pub mod inventory;
pub mod level_progression;
pub mod passive_skills;
pub mod personality;
pub mod proficiencies;
pub mod race;
pub mod size;
pub mod speed;
pub mod spellcasting;
pub mod spells;

/// Contract implemented by every domain detector.
pub trait ChangeDetector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    /// Compare two snapshots and return zero or more change records.
    /// Pure with respect to the inputs; logging is the only side effect.
    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        ctx: &DetectionContext,
    ) -> Vec<FieldChange>;
}

/// The closed set of detector types, one per character facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    AbilityScores,
    Feats,
    Classes,
    Spells,
    Inventory,
    Background,
    HitPoints,
    Proficiencies,
    Race,
    Personality,
    Spellcasting,
    Initiative,
    PassiveSkills,
    Alignment,
    Size,
    Speed,
    LevelProgression,
    ClassFeatures,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 18] = [
        DetectorKind::AbilityScores,
        DetectorKind::Feats,
        DetectorKind::Classes,
        DetectorKind::Spells,
        DetectorKind::Inventory,
        DetectorKind::Background,
        DetectorKind::HitPoints,
        DetectorKind::Proficiencies,
        DetectorKind::Race,
        DetectorKind::Personality,
        DetectorKind::Spellcasting,
        DetectorKind::Initiative,
        DetectorKind::PassiveSkills,
        DetectorKind::Alignment,
        DetectorKind::Size,
        DetectorKind::Speed,
        DetectorKind::LevelProgression,
        DetectorKind::ClassFeatures,
    ];

    /// Stable type tag, used in configuration and stamped into metadata.
    pub fn tag(&self) -> &'static str {
        match self {
            DetectorKind::AbilityScores => "ability-scores",
            DetectorKind::Feats => "feats",
            DetectorKind::Classes => "classes",
            DetectorKind::Spells => "spells",
            DetectorKind::Inventory => "inventory",
            DetectorKind::Background => "background",
            DetectorKind::HitPoints => "hit-points",
            DetectorKind::Proficiencies => "proficiencies",
            DetectorKind::Race => "race",
            DetectorKind::Personality => "personality",
            DetectorKind::Spellcasting => "spellcasting",
            DetectorKind::Initiative => "initiative",
            DetectorKind::PassiveSkills => "passive-skills",
            DetectorKind::Alignment => "alignment",
            DetectorKind::Size => "size",
            DetectorKind::Speed => "speed",
            DetectorKind::LevelProgression => "level-progression",
            DetectorKind::ClassFeatures => "class-features",
        }
    }

    /// Construct the detector for this type.
    pub fn build(&self, config: &DetectionConfig) -> Box<dyn ChangeDetector> {
        let config = config.clone();
        match self {
            DetectorKind::AbilityScores => {
                Box::new(ability_scores::AbilityScoreDetector::new(config))
            }
            DetectorKind::Feats => Box::new(feats::FeatDetector::new(config)),
            DetectorKind::Classes => Box::new(classes::ClassDetector::new(config)),
            DetectorKind::Spells => Box::new(spells::SpellDetector::new(config)),
            DetectorKind::Inventory => Box::new(inventory::InventoryDetector::new(config)),
            DetectorKind::Background => Box::new(background::BackgroundDetector::new(config)),
            DetectorKind::HitPoints => Box::new(hit_points::HitPointDetector::new(config)),
            DetectorKind::Proficiencies => {
                Box::new(proficiencies::ProficiencyDetector::new(config))
            }
            DetectorKind::Race => Box::new(race::RaceDetector::new(config)),
            DetectorKind::Personality => Box::new(personality::PersonalityDetector::new(config)),
            DetectorKind::Spellcasting => {
                Box::new(spellcasting::SpellcastingDetector::new(config))
            }
            DetectorKind::Initiative => Box::new(initiative::InitiativeDetector::new(config)),
            DetectorKind::PassiveSkills => {
                Box::new(passive_skills::PassiveSkillDetector::new(config))
            }
            DetectorKind::Alignment => Box::new(alignment::AlignmentDetector::new(config)),
            DetectorKind::Size => Box::new(size::SizeDetector::new(config)),
            DetectorKind::Speed => Box::new(speed::SpeedDetector::new(config)),
            DetectorKind::LevelProgression => {
                Box::new(level_progression::LevelProgressionDetector::new(config))
            }
            DetectorKind::ClassFeatures => {
                Box::new(class_features::ClassFeatureDetector::new(config))
            }
        }
    }

    /// Every registered type tag, in execution order.
    pub fn available_types() -> Vec<&'static str> {
        Self::ALL.iter().map(DetectorKind::tag).collect()
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Error, Debug)]
#[error("unknown detector type: {0}")]
pub struct UnknownDetectorError(pub String);

impl FromStr for DetectorKind {
    type Err = UnknownDetectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|kind| kind.tag() == s.trim())
            .copied()
            .ok_or_else(|| UnknownDetectorError(s.to_string()))
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Per-call helper that stamps detector identity and resolves priority.
pub struct ChangeBuilder<'a> {
    kind: DetectorKind,
    config: &'a DetectionConfig,
}

impl<'a> ChangeBuilder<'a> {
    pub fn new(kind: DetectorKind, config: &'a DetectionConfig) -> Self {
        Self { kind, config }
    }

    /// Build a change record with priority resolved through the registry's
    /// three-tier fallback and the detector tag stamped into metadata.
    pub fn change(
        &self,
        field_path: impl Into<String>,
        old_value: Option<Value>,
        new_value: Option<Value>,
        change_kind: ChangeKind,
        category: Category,
        description: impl Into<String>,
    ) -> FieldChange {
        let field_path = field_path.into();
        let priority = registry::resolve_priority(&field_path, change_kind, self.config);
        FieldChange::new(
            field_path,
            old_value,
            new_value,
            change_kind,
            priority,
            category,
            description,
        )
        .with_meta("detector", json!(self.kind.tag()))
    }

    pub fn config(&self) -> &DetectionConfig {
        self.config
    }
}

/// Kind for a scalar that moved: Incremented/Decremented, or Modified when
/// equality is only structural.
pub fn scalar_kind(old: i64, new: i64) -> ChangeKind {
    if new > old {
        ChangeKind::Incremented
    } else if new < old {
        ChangeKind::Decremented
    } else {
        ChangeKind::Modified
    }
}

/// Signed-number formatting for descriptions ("+2", "-1").
pub fn signed(value: i64) -> String {
    format!("{value:+}")
}

// ============================================================================
// Engine
// ============================================================================

/// Runs every enabled detector over a snapshot pair and concatenates the
/// results in registry order.
pub struct DiffEngine {
    config: DetectionConfig,
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

impl DiffEngine {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Compare two snapshots. Detector order is fixed, so output ordering
    /// is deterministic for identical inputs.
    pub fn run(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let mut changes = Vec::new();
        for kind in DetectorKind::ALL {
            if !self.config.detector_enabled(kind.tag()) {
                log::trace!("Detector {kind} disabled, skipping");
                continue;
            }
            let detector = kind.build(&self.config);
            let detected = detector.detect(old, new, ctx);
            if !detected.is_empty() {
                log::debug!("Detector {kind} produced {} change(s)", detected.len());
            }
            changes.extend(detected);
        }
        changes
    }

    /// Changes at or above a priority cutoff (for high-priority-only
    /// notification modes).
    pub fn run_filtered(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        ctx: &DetectionContext,
        max_priority: Priority,
    ) -> Vec<FieldChange> {
        self.run(old, new, ctx)
            .into_iter()
            .filter(|change| change.priority <= max_priority)
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
