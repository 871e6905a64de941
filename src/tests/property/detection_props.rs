//! Property-based tests for the Detection Engine
//!
//! Tests invariants:
//! - Determinism: running the same comparison twice yields identical output
//! - No-op: comparing any document against itself yields no changes
//! - Every change carries a non-empty field path and description
//! - Secondary changes always name an existing primary path

use proptest::prelude::*;
use serde_json::{json, Value};

use crate::core::context::DetectionContext;
use crate::core::detect::DiffEngine;
use crate::core::document::CharacterDocument;

// ============================================================================
// Snapshot strategy
// ============================================================================

const CLASS_NAMES: [&str; 5] = ["Fighter", "Wizard", "Cleric", "Rogue", "Warlock"];
const FEAT_NAMES: [&str; 5] = ["Alert", "Tough", "Lucky", "Observant", "Sentinel"];
const ITEM_NAMES: [&str; 4] = ["Rope (50ft)", "Torch", "Longsword", "Healing Potion"];

prop_compose! {
    fn arb_stats()(values in proptest::collection::vec(1i64..=20, 6)) -> Value {
        let stats: Vec<Value> = values
            .iter()
            .enumerate()
            .map(|(index, value)| json!({"id": index as i64 + 1, "value": value}))
            .collect();
        json!(stats)
    }
}

prop_compose! {
    fn arb_classes()(
        picks in proptest::collection::btree_set(0usize..CLASS_NAMES.len(), 0..3),
        levels in proptest::collection::vec(1i64..=12, 3)
    ) -> Value {
        let classes: Vec<Value> = picks
            .iter()
            .zip(levels)
            .map(|(index, level)| json!({"name": CLASS_NAMES[*index], "level": level}))
            .collect();
        json!(classes)
    }
}

prop_compose! {
    fn arb_feats()(picks in proptest::collection::btree_set(0usize..FEAT_NAMES.len(), 0..4)) -> Value {
        let feats: Vec<Value> = picks
            .iter()
            .map(|index| json!({"name": FEAT_NAMES[*index]}))
            .collect();
        json!(feats)
    }
}

prop_compose! {
    fn arb_inventory()(
        picks in proptest::collection::vec((0usize..ITEM_NAMES.len(), 1i64..=5), 0..4),
        id_base in 1i64..1000
    ) -> Value {
        let items: Vec<Value> = picks
            .iter()
            .enumerate()
            .map(|(index, (name_index, quantity))| json!({
                "id": id_base + index as i64,
                "definition": {"name": ITEM_NAMES[*name_index]},
                "quantity": quantity
            }))
            .collect();
        json!(items)
    }
}

prop_compose! {
    fn arb_snapshot()(
        stats in arb_stats(),
        classes in arb_classes(),
        feats in arb_feats(),
        inventory in arb_inventory(),
        base_hp in 1i64..=120,
        alignment_id in 1i64..=9,
        initiative in -2i64..=8
    ) -> CharacterDocument {
        CharacterDocument::new(json!({
            "stats": stats,
            "classes": classes,
            "feats": feats,
            "inventory": inventory,
            "baseHitPoints": base_hp,
            "alignmentId": alignment_id,
            "initiativeBonus": initiative
        }))
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn detect_is_deterministic(old in arb_snapshot(), new in arb_snapshot()) {
        let engine = DiffEngine::default();
        let ctx = DetectionContext::default();
        let first = engine.run(&old, &new, &ctx);
        let second = engine.run(&old, &new, &ctx);
        let first_encoded = serde_json::to_string(&first).unwrap();
        let second_encoded = serde_json::to_string(&second).unwrap();
        prop_assert_eq!(first_encoded, second_encoded);
    }

    #[test]
    fn self_comparison_is_empty(doc in arb_snapshot()) {
        let engine = DiffEngine::default();
        let changes = engine.run(&doc, &doc, &DetectionContext::default());
        prop_assert!(changes.is_empty(), "self-diff produced {:?}", changes);
    }

    #[test]
    fn every_change_is_well_formed(old in arb_snapshot(), new in arb_snapshot()) {
        let engine = DiffEngine::default();
        let changes = engine.run(&old, &new, &DetectionContext::default());
        for change in &changes {
            prop_assert!(!change.field_path.is_empty());
            prop_assert!(!change.description.is_empty());
            prop_assert!(change.metadata.contains_key("detector"));
            prop_assert!(change.old_value.is_some() || change.new_value.is_some());
        }
    }

    #[test]
    fn cascades_reference_a_reported_primary(old in arb_snapshot(), new in arb_snapshot()) {
        let engine = DiffEngine::default();
        let changes = engine.run(&old, &new, &DetectionContext::default());
        for change in changes.iter().filter(|c| c.is_secondary()) {
            let primary = change.metadata["cascade_of"].as_str().unwrap();
            prop_assert!(
                changes.iter().any(|c| c.field_path == primary),
                "secondary {} points at unreported primary {}",
                change.field_path,
                primary
            );
        }
    }
}
