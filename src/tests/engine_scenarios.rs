//! Engine-level scenario tests built on the shared fixtures.

use serde_json::json;

use crate::core::change::ChangeKind;
use crate::core::context::DetectionContext;
use crate::core::detect::DiffEngine;
use crate::tests::common::fixtures;

#[test]
fn test_fighter_level_up_produces_progression_summary() {
    let engine = DiffEngine::default();
    let old = fixtures::fighter(4, &[]);
    let new = fixtures::fighter(5, &["Alert"]);

    let changes = engine.run(&old, &new, &DetectionContext::default());
    let paths: Vec<&str> = changes.iter().map(|c| c.field_path.as_str()).collect();

    assert!(paths.contains(&"classes.fighter.level"));
    assert!(paths.contains(&"feats.alert"));
    assert!(paths.contains(&"progression.total_level"));
    // The fixture adds hit points per level, so the max HP change must be
    // present and attributed.
    let hp = changes
        .iter()
        .find(|c| c.field_path == "combat.hit_points.max")
        .unwrap();
    assert_eq!(hp.change_kind, ChangeKind::Incremented);
    assert!(hp.metadata.contains_key("causation"));
}

#[test]
fn test_cleric_wisdom_bump_cascades() {
    let engine = DiffEngine::default();
    // WIS 14 -> 16; every dependent stat moves by the modifier delta.
    let old = fixtures::cleric(14, 4, 13);
    let new = fixtures::cleric(16, 5, 14);

    let changes = engine.run(&old, &new, &DetectionContext::default());
    let secondary_paths: Vec<&str> = changes
        .iter()
        .filter(|c| c.is_secondary())
        .map(|c| c.field_path.as_str())
        .collect();

    assert!(secondary_paths.contains(&"skills.perception"));
    assert!(secondary_paths.contains(&"saving_throws.wisdom"));
    assert!(secondary_paths.contains(&"passives.perception"));
    assert!(secondary_paths.contains(&"spellcasting.save_dc"));
    // Athletics did not move and must not appear anywhere.
    assert!(changes.iter().all(|c| c.field_path != "skills.athletics"));
}

#[test]
fn test_id_migration_plus_real_change() {
    let engine = DiffEngine::default();
    // Every id reassigned; one genuinely new item.
    let old = fixtures::inventory_snapshot(&[("Rope (50ft)", 1), ("Torch", 5)], 100);
    let new = fixtures::inventory_snapshot(
        &[("Rope (50ft)", 1), ("Torch", 5), ("Grappling Hook", 1)],
        900,
    );

    let changes = engine.run(&old, &new, &DetectionContext::default());
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].field_path, "inventory.grappling_hook");
    assert_eq!(changes[0].change_kind, ChangeKind::Added);
}

#[test]
fn test_context_is_optional_everywhere() {
    let engine = DiffEngine::default();
    let old = fixtures::fighter(4, &[]);
    let new = fixtures::fighter(5, &[]);

    let bare = engine.run(&old, &new, &DetectionContext::default());
    let rich = engine.run(
        &old,
        &new,
        &DetectionContext::new()
            .with_character_id("c-9")
            .with_character_name("Roland")
            .with_campaign_id("midwinter"),
    );
    // Context feeds descriptions and logs, never detection itself.
    assert_eq!(
        serde_json::to_value(&bare).unwrap(),
        serde_json::to_value(&rich).unwrap()
    );
}

#[test]
fn test_malformed_facet_does_not_block_others() {
    let engine = DiffEngine::default();
    let old = crate::core::document::CharacterDocument::new(json!({
        "feats": [{"name": "Lucky"}],
        "classes": "not even a list",
        "inventory": {"wrong": "shape"},
        "stats": 42
    }));
    let new = crate::core::document::CharacterDocument::new(json!({
        "feats": [{"name": "Lucky"}, {"name": "Alert"}],
        "classes": 17,
        "inventory": null,
        "stats": "also wrong"
    }));

    let changes = engine.run(&old, &new, &DetectionContext::default());
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].field_path, "feats.alert");
}
