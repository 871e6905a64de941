//! Movement Speed Detector
//!
//! Per-mode comparison (walk/fly/swim/climb/burrow). A mode appearing or
//! vanishing is a feature change (a fly speed gained from a spell or race),
//! not just a number moving.

use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::traits;
use crate::core::change::{Category, ChangeKind, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;

use super::{scalar_kind, ChangeBuilder, ChangeDetector, DetectorKind};

pub struct SpeedDetector {
    config: DetectionConfig,
}

impl SpeedDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for SpeedDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Speed
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        let old_speeds = traits::speeds(old);
        let new_speeds = traits::speeds(new);
        let mut changes = Vec::new();

        // Union of modes, old order first.
        let mut modes: Vec<&String> = old_speeds.keys().collect();
        for mode in new_speeds.keys() {
            if !old_speeds.contains_key(mode) {
                modes.push(mode);
            }
        }

        for mode in modes {
            let path = format!("speeds.{mode}");
            match (old_speeds.get(mode), new_speeds.get(mode)) {
                (Some(&old_value), Some(&new_value)) if old_value != new_value => {
                    let verb = if new_value > old_value {
                        "increased"
                    } else {
                        "decreased"
                    };
                    changes.push(builder.change(
                        path,
                        Some(json!(old_value)),
                        Some(json!(new_value)),
                        scalar_kind(old_value, new_value),
                        Category::Combat,
                        format!(
                            "{} speed {verb} from {old_value} to {new_value} ft.",
                            mode_label(mode)
                        ),
                    ));
                }
                (None, Some(&new_value)) => changes.push(builder.change(
                    path,
                    None,
                    Some(json!(new_value)),
                    ChangeKind::Added,
                    Category::Combat,
                    format!("Gained {} speed: {new_value} ft.", mode.as_str()),
                )),
                (Some(&old_value), None) => changes.push(builder.change(
                    path,
                    Some(json!(old_value)),
                    None,
                    ChangeKind::Removed,
                    Category::Combat,
                    format!("Lost {} speed (was {old_value} ft.)", mode.as_str()),
                )),
                _ => {}
            }
        }
        changes
    }
}

fn mode_label(mode: &str) -> &str {
    match mode {
        "walk" => "Walking",
        "fly" => "Flying",
        "swim" => "Swimming",
        "climb" => "Climbing",
        "burrow" => "Burrowing",
        other => other,
    }
}
