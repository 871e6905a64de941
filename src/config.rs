use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::change::Priority;

/// Top-level detection configuration.
///
/// Owned by the orchestration layer and passed read-only into the engine.
/// Every field has a sensible default so an empty file (or no file at all)
/// yields a fully working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Detector type tags to run. `None` means all registered detectors.
    pub enabled_detectors: Option<BTreeSet<String>>,
    /// Per-field priority overrides, keyed by semantic field path.
    /// Overrides beat the mapping registry and the change-kind heuristic.
    pub priority_overrides: BTreeMap<String, Priority>,
    pub causation: CausationConfig,
}

/// Causation-analysis tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CausationConfig {
    /// Master switch for cause attribution.
    pub enabled: bool,
    /// Reports with accumulated confidence below this are dropped.
    pub confidence_threshold: f64,
    /// Maximum depth of secondary (cascading) changes emitted per primary.
    pub max_cascade_depth: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            enabled_detectors: None,
            priority_overrides: BTreeMap::new(),
            causation: CausationConfig::default(),
        }
    }
}

impl Default for CausationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence_threshold: 0.3,
            max_cascade_depth: 1,
        }
    }
}

impl DetectionConfig {
    /// Load configuration from a TOML file.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded detection config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e} — using defaults",
                        path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!("No config file at {} — using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Whether a detector type tag is enabled under this configuration.
    pub fn detector_enabled(&self, tag: &str) -> bool {
        match &self.enabled_detectors {
            Some(set) => set.contains(tag),
            None => true,
        }
    }

    /// Explicit per-field priority override, if configured.
    pub fn priority_override(&self, field_path: &str) -> Option<Priority> {
        self.priority_overrides.get(field_path).copied()
    }
}
