//! End-to-end detection scenarios over realistic snapshot pairs.

use serde_json::json;

use sheetdiff::config::DetectionConfig;
use sheetdiff::core::change::{ChangeKind, Priority};
use sheetdiff::core::context::DetectionContext;
use sheetdiff::core::detect::{DiffEngine, DetectorKind};
use sheetdiff::core::document::CharacterDocument;

fn engine() -> DiffEngine {
    DiffEngine::default()
}

fn ctx() -> DetectionContext {
    DetectionContext::new()
        .with_character_id("c-1001")
        .with_character_name("Roland")
}

#[test]
fn level_up_with_new_feat() {
    let old = CharacterDocument::new(json!({
        "stats": [
            {"id": 1, "value": 16},
            {"id": 2, "value": 12}
        ],
        "classes": [{"definition": {"name": "Fighter"}, "level": 4}],
        "feats": []
    }));
    let new = CharacterDocument::new(json!({
        "stats": [
            {"id": 1, "value": 16},
            {"id": 2, "value": 12}
        ],
        "classes": [{"definition": {"name": "Fighter"}, "level": 5}],
        "feats": [{"definition": {"name": "Alert"}}]
    }));

    let changes = engine().run(&old, &new, &ctx());

    let class_level = changes
        .iter()
        .find(|c| c.field_path == "classes.fighter.level")
        .expect("class level change");
    assert_eq!(class_level.change_kind, ChangeKind::Incremented);
    assert_eq!(class_level.old_value, Some(json!(4)));
    assert_eq!(class_level.new_value, Some(json!(5)));

    let feat = changes
        .iter()
        .find(|c| c.field_path == "feats.alert")
        .expect("feat addition");
    assert_eq!(feat.change_kind, ChangeKind::Added);

    let total = changes
        .iter()
        .find(|c| c.field_path == "progression.total_level")
        .expect("character level summary");
    assert_eq!(total.change_kind, ChangeKind::Incremented);

    // No ability scores differ, so no ability changes may appear.
    assert!(changes
        .iter()
        .all(|c| !c.field_path.starts_with("abilities.")));
}

#[test]
fn inventory_id_reassignment_reconciles_to_nothing() {
    let old = CharacterDocument::new(json!({
        "inventory": [{"id": 1, "definition": {"name": "Rope (50ft)"}, "quantity": 1}]
    }));
    let new = CharacterDocument::new(json!({
        "inventory": [{"id": 99, "definition": {"name": "Rope (50ft)"}, "quantity": 1}]
    }));

    assert!(engine().run(&old, &new, &ctx()).is_empty());
}

#[test]
fn wisdom_increase_cascades_only_exact_deltas() {
    let old = CharacterDocument::new(json!({
        "stats": [{"id": 5, "value": 14}],
        "skills": {"Perception": 4, "Survival": 4},
        "passivePerception": 14
    }));
    let new = CharacterDocument::new(json!({
        "stats": [{"id": 5, "value": 16}],
        // Perception +1 matches the modifier delta; Survival -1 does not
        // (an unrelated proficiency loss in the same snapshot).
        "skills": {"Perception": 5, "Survival": 3},
        "passivePerception": 15
    }));

    let changes = engine().run(&old, &new, &ctx());
    let ability_changes: Vec<_> = changes
        .iter()
        .filter(|c| c.field_path.starts_with("abilities."))
        .collect();
    assert_eq!(ability_changes.len(), 1);

    assert!(changes
        .iter()
        .any(|c| c.field_path == "skills.perception" && c.is_secondary()));
    assert!(changes
        .iter()
        .all(|c| c.field_path != "skills.survival"));
}

#[test]
fn feat_relabeled_as_class_feature_is_not_a_loss() {
    let old = CharacterDocument::new(json!({
        "feats": [{"definition": {"name": "Weapon Mastery"}}],
        "classes": [{"definition": {"name": "Fighter"}, "level": 1}]
    }));
    let new = CharacterDocument::new(json!({
        "feats": [],
        "classes": [{
            "definition": {"name": "Fighter"},
            "level": 1,
            "classFeatures": [{"definition": {"name": "Weapon Mastery"}}]
        }]
    }));

    let changes = engine().run(&old, &new, &ctx());
    assert!(
        changes.iter().all(|c| !c.field_path.starts_with("feats.")),
        "relabeling must not produce feat changes: {changes:?}"
    );
}

#[test]
fn detection_is_deterministic_byte_for_byte() {
    let old = CharacterDocument::new(json!({
        "stats": [{"id": 2, "value": 14}, {"id": 5, "value": 12}],
        "classes": [{"name": "Rogue", "level": 3}],
        "feats": [{"name": "Lucky"}],
        "inventory": [
            {"id": 1, "name": "Dagger", "quantity": 2},
            {"id": 2, "name": "Thieves' Tools", "quantity": 1}
        ]
    }));
    let new = CharacterDocument::new(json!({
        "stats": [{"id": 2, "value": 16}, {"id": 5, "value": 12}],
        "classes": [{"name": "Rogue", "level": 4}],
        "feats": [{"name": "Lucky"}, {"name": "Alert"}],
        "inventory": [
            {"id": 40, "name": "Dagger", "quantity": 2},
            {"id": 41, "name": "Shortbow", "quantity": 1}
        ]
    }));

    let first = serde_json::to_string(&engine().run(&old, &new, &ctx())).unwrap();
    let second = serde_json::to_string(&engine().run(&old, &new, &ctx())).unwrap();
    assert_eq!(first, second);
}

#[test]
fn priority_override_silences_a_field() {
    let mut config = DetectionConfig::default();
    config
        .priority_overrides
        .insert("feats.alert".to_string(), Priority::Low);
    let engine = DiffEngine::new(config);

    let old = CharacterDocument::new(json!({"feats": []}));
    let new = CharacterDocument::new(json!({"feats": [{"name": "Alert"}]}));

    let changes = engine.run(&old, &new, &ctx());
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].priority, Priority::Low);

    // The same change under default configuration is high priority.
    let default_changes = DiffEngine::default().run(&old, &new, &ctx());
    assert_eq!(default_changes[0].priority, Priority::High);
}

#[test]
fn high_only_filter_drops_routine_churn() {
    let old = CharacterDocument::new(json!({
        "hitPoints": {"max": 40, "current": 40},
        "feats": []
    }));
    let new = CharacterDocument::new(json!({
        "hitPoints": {"max": 40, "current": 18},
        "feats": [{"name": "Tough"}]
    }));

    let all = engine().run(&old, &new, &ctx());
    assert_eq!(all.len(), 2);

    let high_only = engine().run_filtered(&old, &new, &ctx(), Priority::High);
    assert_eq!(high_only.len(), 1);
    assert_eq!(high_only[0].field_path, "feats.tough");
}

#[test]
fn schema_drift_between_snapshots_is_tolerated() {
    // Old snapshot in a legacy flat shape, new one in the current shape;
    // same logical character, so nothing should be reported.
    let old = CharacterDocument::new(json!({
        "strength": 16,
        "dexterity": 12,
        "class": "Fighter",
        "level": 4,
        "alignment": "Lawful Good",
        "hp": 40
    }));
    let new = CharacterDocument::new(json!({
        "stats": [
            {"id": 1, "value": 16},
            {"id": 2, "value": 12}
        ],
        "classes": [{"definition": {"name": "Fighter"}, "level": 4}],
        "alignmentId": 1,
        "hitPoints": {"max": 40}
    }));

    let changes = engine().run(&old, &new, &ctx());
    assert!(changes.is_empty(), "schema drift misread as changes: {changes:?}");
}

#[test]
fn disabled_detectors_do_not_run() {
    let mut config = DetectionConfig::default();
    config.enabled_detectors = Some(
        [DetectorKind::Feats.tag().to_string()]
            .into_iter()
            .collect(),
    );
    let engine = DiffEngine::new(config);

    let old = CharacterDocument::new(json!({
        "feats": [],
        "classes": [{"name": "Fighter", "level": 4}]
    }));
    let new = CharacterDocument::new(json!({
        "feats": [{"name": "Alert"}],
        "classes": [{"name": "Fighter", "level": 5}]
    }));

    let changes = engine.run(&old, &new, &ctx());
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].field_path, "feats.alert");
}
