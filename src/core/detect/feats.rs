//! Feat Detector
//!
//! Set difference on resolved feat names, with two upstream quirks handled:
//!
//! 1. A deduplication event occasionally moves a feat-shaped entry under
//!    class features. A feat "removal" whose name still appears there is a
//!    relabeling, not a loss, and is suppressed.
//! 2. Some exports strip a leading "N: " level prefix from feat names
//!    ("4: Martial Adept" → "Martial Adept"). A remove/add pair whose names
//!    match after stripping the prefix, with an unchanged description, is
//!    cosmetic and suppressed; if the description also changed, it is
//!    reported as a modification instead. The stripped-name comparison can
//!    in principle hide a real identity change that reuses the same base
//!    name; this matches upstream behavior and is kept as-is.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::classes;
use crate::core::accessors::feats::{self, FeatInfo};
use crate::core::change::{slug, Category, ChangeKind, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;
use crate::core::tables;

use super::{ChangeBuilder, ChangeDetector, DetectorKind};

static LEVEL_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+:\s*").expect("level prefix pattern is valid"));

/// Strip a leading "N: " level prefix from a feat name.
pub fn strip_level_prefix(name: &str) -> &str {
    match LEVEL_PREFIX_RE.find(name) {
        Some(m) => &name[m.end()..],
        None => name,
    }
}

pub struct FeatDetector {
    config: DetectionConfig,
}

impl FeatDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for FeatDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Feats
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        let old_feats = feats::feats(old);
        let new_feats = feats::feats(new);
        let mut changes = Vec::new();

        let mut added: Vec<&FeatInfo> = new_feats
            .values()
            .filter(|feat| !old_feats.contains_key(&feat.name))
            .collect();
        let removed: Vec<&FeatInfo> = old_feats
            .values()
            .filter(|feat| !new_feats.contains_key(&feat.name))
            .collect();

        let new_feature_names = classes::class_feature_names(new);

        for old_feat in removed {
            // Cosmetic rename: the same feat re-appears with the level
            // prefix stripped (or gained).
            if let Some(index) = added.iter().position(|new_feat| {
                new_feat.name != old_feat.name
                    && strip_level_prefix(&new_feat.name) == strip_level_prefix(&old_feat.name)
            }) {
                let new_feat = added.remove(index);
                if new_feat.description == old_feat.description {
                    log::debug!(
                        "Suppressing cosmetic feat rename: '{}' -> '{}'",
                        old_feat.name,
                        new_feat.name
                    );
                    continue;
                }
                changes.push(
                    builder
                        .change(
                            format!("feats.{}", slug(strip_level_prefix(&new_feat.name))),
                            Some(json!(old_feat.name)),
                            Some(json!(new_feat.name)),
                            ChangeKind::Modified,
                            Category::Features,
                            format!("Feat updated: {}", strip_level_prefix(&new_feat.name)),
                        )
                        .with_detail(format!(
                            "{} was renamed to {} and its description changed",
                            old_feat.name, new_feat.name
                        )),
                );
                continue;
            }

            // Relabeling: the name now lives under class features.
            if new_feature_names
                .iter()
                .any(|feature| feature == &old_feat.name)
            {
                log::debug!(
                    "Suppressing feat removal for '{}': present as a class feature",
                    old_feat.name
                );
                continue;
            }

            changes.push(builder.change(
                format!("feats.{}", slug(&old_feat.name)),
                Some(json!(old_feat.name)),
                None,
                ChangeKind::Removed,
                Category::Features,
                format!("Lost feat: {}", old_feat.name),
            ));
        }

        for new_feat in added {
            let mut change = builder.change(
                format!("feats.{}", slug(&new_feat.name)),
                None,
                Some(json!(new_feat.name)),
                ChangeKind::Added,
                Category::Features,
                format!("Gained feat: {}", new_feat.name),
            );
            if let Some(effect) = tables::feat_effect(&new_feat.name) {
                change = change.with_meta("effect_summary", json!(effect.summary));
            }
            if !new_feat.description.is_empty() {
                change = change.with_detail(new_feat.description.clone());
            }
            changes.push(change);
        }

        // Description edits on feats present in both snapshots.
        for (name, new_feat) in &new_feats {
            let Some(old_feat) = old_feats.get(name) else {
                continue;
            };
            if old_feat.description != new_feat.description && !new_feat.description.is_empty() {
                changes.push(
                    builder
                        .change(
                            format!("feats.{}", slug(name)),
                            Some(json!(old_feat.description)),
                            Some(json!(new_feat.description)),
                            ChangeKind::Modified,
                            Category::Features,
                            format!("Feat description updated: {name}"),
                        )
                        .with_detail(new_feat.description.clone()),
                );
            }
        }

        changes
    }
}

// ============================================================================
// Tests
// ============================================================================
