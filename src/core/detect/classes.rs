//! Class Detector
//!
//! Per-class comparison keyed by class name across the union of old and new
//! class lists. A brand-new class is multiclassing, distinct from a level
//! increase on an existing class. Subclass choices are tracked per class.
//! When class levels move, the combined multiclass caster level (full/half/
//! third-caster fractional contributions, Warlock excluded) is recomputed
//! and a secondary change is emitted when it crosses a spell-slot boundary.

use indexmap::IndexMap;
use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::classes::{self, ClassInfo};
use crate::core::change::{slug, Category, ChangeKind, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;
use crate::core::tables;

use super::{scalar_kind, ChangeBuilder, ChangeDetector, DetectorKind};

pub struct ClassDetector {
    config: DetectionConfig,
}

impl ClassDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for ClassDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Classes
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        let old_classes = by_name(classes::classes(old));
        let new_classes = by_name(classes::classes(new));
        let mut changes = Vec::new();
        let mut first_changed_path: Option<String> = None;

        // Union of class names, old order first, then new-only names.
        let mut names: Vec<&String> = old_classes.keys().collect();
        for name in new_classes.keys() {
            if !old_classes.contains_key(name) {
                names.push(name);
            }
        }

        for name in names {
            let path = format!("classes.{}", slug(name));
            match (old_classes.get(name), new_classes.get(name)) {
                (Some(old_class), Some(new_class)) => {
                    if old_class.level != new_class.level {
                        let level_path = format!("{path}.level");
                        changes.push(
                            builder
                                .change(
                                    level_path.clone(),
                                    Some(json!(old_class.level)),
                                    Some(json!(new_class.level)),
                                    scalar_kind(old_class.level, new_class.level),
                                    Category::Progression,
                                    format!(
                                        "{name} level changed from {} to {}",
                                        old_class.level, new_class.level
                                    ),
                                )
                                .with_meta("hit_die", json!(new_class.hit_die)),
                        );
                        first_changed_path.get_or_insert(level_path);
                    }
                    self.compare_subclass(&builder, &path, name, old_class, new_class, &mut changes);
                }
                (None, Some(new_class)) => {
                    let is_multiclass = !old_classes.is_empty();
                    let description = if is_multiclass {
                        format!("Multiclassed into {name} (level {})", new_class.level)
                    } else {
                        format!("Class set: {name} (level {})", new_class.level)
                    };
                    changes.push(
                        builder
                            .change(
                                path.clone(),
                                None,
                                Some(json!({"name": name, "level": new_class.level})),
                                ChangeKind::Added,
                                Category::Progression,
                                description,
                            )
                            .with_meta("multiclass", json!(is_multiclass)),
                    );
                    first_changed_path.get_or_insert(path);
                }
                (Some(old_class), None) => {
                    changes.push(builder.change(
                        path.clone(),
                        Some(json!({"name": name, "level": old_class.level})),
                        None,
                        ChangeKind::Removed,
                        Category::Progression,
                        format!("Removed class: {name} (was level {})", old_class.level),
                    ));
                    first_changed_path.get_or_insert(path);
                }
                (None, None) => unreachable!("name came from one of the maps"),
            }
        }

        self.compare_caster_level(&builder, old, new, first_changed_path, &mut changes);
        changes
    }
}

impl ClassDetector {
    fn compare_subclass(
        &self,
        builder: &ChangeBuilder<'_>,
        class_path: &str,
        name: &str,
        old_class: &ClassInfo,
        new_class: &ClassInfo,
        changes: &mut Vec<FieldChange>,
    ) {
        let path = format!("{class_path}.subclass");
        match (&old_class.subclass, &new_class.subclass) {
            (None, Some(subclass)) => changes.push(builder.change(
                path,
                None,
                Some(json!(subclass)),
                ChangeKind::Added,
                Category::Features,
                format!("{name} subclass chosen: {subclass}"),
            )),
            (Some(old_subclass), Some(new_subclass)) if old_subclass != new_subclass => {
                changes.push(builder.change(
                    path,
                    Some(json!(old_subclass)),
                    Some(json!(new_subclass)),
                    ChangeKind::Modified,
                    Category::Features,
                    format!("{name} subclass changed from {old_subclass} to {new_subclass}"),
                ))
            }
            (Some(old_subclass), None) => changes.push(builder.change(
                path,
                Some(json!(old_subclass)),
                None,
                ChangeKind::Removed,
                Category::Features,
                format!("{name} subclass removed (was {old_subclass})"),
            )),
            _ => {}
        }
    }

    /// Secondary change when the shared spell-slot pool crosses a boundary.
    fn compare_caster_level(
        &self,
        builder: &ChangeBuilder<'_>,
        old: &CharacterDocument,
        new: &CharacterDocument,
        first_changed_path: Option<String>,
        changes: &mut Vec<FieldChange>,
    ) {
        let old_caster = classes::combined_caster_level(old);
        let new_caster = classes::combined_caster_level(new);
        if old_caster == new_caster {
            return;
        }
        // Only ripple when the registry links the slot pool to the class
        // change that triggered it.
        if let Some(primary) = &first_changed_path {
            if !crate::core::registry::causation_linked(primary, "spellcasting.caster_level") {
                return;
            }
        }
        let old_slot = tables::highest_slot_level(old_caster);
        let new_slot = tables::highest_slot_level(new_caster);
        if old_slot == new_slot {
            return;
        }

        let contributions: Vec<serde_json::Value> = classes::classes(new)
            .iter()
            .filter(|class| class.caster_levels() > 0)
            .map(|class| {
                json!({
                    "class": class.name,
                    "level": class.level,
                    "caster_levels": class.caster_levels(),
                })
            })
            .collect();

        let direction = if new_slot > old_slot {
            format!("level {new_slot} spell slots unlocked")
        } else {
            format!("highest spell slots dropped to level {new_slot}")
        };
        let mut change = builder
            .change(
                "spellcasting.caster_level",
                Some(json!(old_caster)),
                Some(json!(new_caster)),
                scalar_kind(old_caster, new_caster),
                Category::Spells,
                format!(
                    "Combined caster level changed from {old_caster} to {new_caster} ({direction})"
                ),
            )
            .with_meta("highest_slot_level", json!({"old": old_slot, "new": new_slot}))
            .with_meta("contributions", json!(contributions));
        if let Some(primary) = first_changed_path {
            change = change.as_cascade_of(&primary);
        }
        changes.push(change);
    }
}

fn by_name(list: Vec<ClassInfo>) -> IndexMap<String, ClassInfo> {
    list.into_iter()
        .map(|class| (class.name.clone(), class))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
