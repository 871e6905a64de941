//! Spell Detector
//!
//! Groups spells by level and computes per-level add/remove sets, then
//! separately diffs the shared properties (school, range, duration, ritual,
//! concentration, components, preparation) of spells present in both
//! snapshots, with type-aware formatting for the structured fields.

use std::collections::BTreeMap;

use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::spells::{self, SpellInfo};
use crate::core::change::{slug, Category, ChangeKind, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;

use super::{ChangeBuilder, ChangeDetector, DetectorKind};

pub struct SpellDetector {
    config: DetectionConfig,
}

impl SpellDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for SpellDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Spells
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        let old_spells = spells::spells(old);
        let new_spells = spells::spells(new);
        let mut changes = Vec::new();

        // Per-level add/remove sets, lowest level first for stable output.
        let old_by_level = group_by_level(&old_spells);
        let new_by_level = group_by_level(&new_spells);
        let mut levels: Vec<i64> = old_by_level.keys().chain(new_by_level.keys()).copied().collect();
        levels.sort_unstable();
        levels.dedup();

        for level in levels {
            let empty = Vec::new();
            let old_names = old_by_level.get(&level).unwrap_or(&empty);
            let new_names = new_by_level.get(&level).unwrap_or(&empty);

            for spell in new_names.iter().filter(|s| !contains(old_names, s)) {
                changes.push(
                    builder
                        .change(
                            format!("spells.level_{level}.{}", slug(&spell.name)),
                            None,
                            Some(json!(spell.name)),
                            ChangeKind::Added,
                            Category::Spells,
                            format!("Learned {}: {}", level_label(level), spell.name),
                        )
                        .with_meta("spell_level", json!(level)),
                );
            }
            for spell in old_names.iter().filter(|s| !contains(new_names, s)) {
                changes.push(
                    builder
                        .change(
                            format!("spells.level_{level}.{}", slug(&spell.name)),
                            Some(json!(spell.name)),
                            None,
                            ChangeKind::Removed,
                            Category::Spells,
                            format!("Unlearned {}: {}", level_label(level), spell.name),
                        )
                        .with_meta("spell_level", json!(level)),
                );
            }
        }

        // Property diffs for spells known in both snapshots.
        for new_spell in &new_spells {
            let Some(old_spell) = old_spells.iter().find(|s| s.name == new_spell.name) else {
                continue;
            };
            self.compare_properties(&builder, old_spell, new_spell, &mut changes);
        }

        changes
    }
}

impl SpellDetector {
    fn compare_properties(
        &self,
        builder: &ChangeBuilder<'_>,
        old_spell: &SpellInfo,
        new_spell: &SpellInfo,
        changes: &mut Vec<FieldChange>,
    ) {
        let base = format!("spells.{}", slug(&new_spell.name));
        let name = &new_spell.name;

        let mut push_property = |property: &str, old_text: String, new_text: String| {
            changes.push(builder.change(
                format!("{base}.{property}"),
                Some(json!(old_text)),
                Some(json!(new_text)),
                ChangeKind::Modified,
                Category::Spells,
                format!("{name} {property} changed from {old_text} to {new_text}"),
            ));
        };

        if old_spell.school != new_spell.school {
            push_property(
                "school",
                unwrap_or_unknown(&old_spell.school),
                unwrap_or_unknown(&new_spell.school),
            );
        }
        if old_spell.range != new_spell.range {
            push_property(
                "range",
                format_option(&old_spell.range),
                format_option(&new_spell.range),
            );
        }
        if old_spell.duration != new_spell.duration {
            push_property(
                "duration",
                format_option(&old_spell.duration),
                format_option(&new_spell.duration),
            );
        }
        if old_spell.components != new_spell.components {
            push_property(
                "components",
                format_components(&old_spell.components),
                format_components(&new_spell.components),
            );
        }
        if old_spell.ritual != new_spell.ritual {
            push_property(
                "ritual",
                format_flag(old_spell.ritual),
                format_flag(new_spell.ritual),
            );
        }
        if old_spell.concentration != new_spell.concentration {
            push_property(
                "concentration",
                format_flag(old_spell.concentration),
                format_flag(new_spell.concentration),
            );
        }

        // Preparation flips get their own phrasing: they are routine, not
        // a property edit.
        if old_spell.prepared != new_spell.prepared {
            let description = if new_spell.prepared {
                format!("Prepared {name}")
            } else {
                format!("Unprepared {name}")
            };
            changes.push(builder.change(
                format!("{base}.prepared"),
                Some(json!(old_spell.prepared)),
                Some(json!(new_spell.prepared)),
                ChangeKind::Modified,
                Category::Spells,
                description,
            ));
        }
    }
}

fn group_by_level(spells: &[SpellInfo]) -> BTreeMap<i64, Vec<&SpellInfo>> {
    let mut by_level: BTreeMap<i64, Vec<&SpellInfo>> = BTreeMap::new();
    for spell in spells {
        by_level.entry(spell.level).or_default().push(spell);
    }
    by_level
}

fn contains(spells: &[&SpellInfo], target: &SpellInfo) -> bool {
    spells.iter().any(|s| s.name == target.name)
}

fn level_label(level: i64) -> String {
    match level {
        0 => "cantrip".to_string(),
        1 => "1st-level spell".to_string(),
        2 => "2nd-level spell".to_string(),
        3 => "3rd-level spell".to_string(),
        n => format!("{n}th-level spell"),
    }
}

fn unwrap_or_unknown(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "unknown".to_string())
}

fn format_option<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "unknown".to_string(),
    }
}

fn format_components(components: &[String]) -> String {
    if components.is_empty() {
        "none".to_string()
    } else {
        components.join(", ")
    }
}

fn format_flag(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

// ============================================================================
// Tests
// ============================================================================
