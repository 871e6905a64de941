//! Property-based tests for Add/Remove Reconciliation
//!
//! Tests invariants:
//! - Per key, net counts equal the absolute surplus on the correct side
//! - No key ever appears in both net lists
//! - Reconciling a multiset against itself cancels everything
//! - Net output never exceeds the input

use proptest::prelude::*;

use crate::core::reconcile::reconcile;

fn count(items: &[String], key: &str) -> i64 {
    items.iter().filter(|item| item.as_str() == key).count() as i64
}

fn arb_items() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(
        proptest::sample::select(vec!["rope", "torch", "dagger", "shield"]),
        0..12,
    )
    .prop_map(|items| items.into_iter().map(str::to_string).collect())
}

proptest! {
    #[test]
    fn per_key_surplus_is_exact(added in arb_items(), removed in arb_items()) {
        let (net_added, net_removed) =
            reconcile(added.clone(), removed.clone(), |item: &String| item.clone());
        for key in ["rope", "torch", "dagger", "shield"] {
            let surplus = count(&added, key) - count(&removed, key);
            prop_assert_eq!(count(&net_added, key), surplus.max(0));
            prop_assert_eq!(count(&net_removed, key), (-surplus).max(0));
        }
    }

    #[test]
    fn no_key_in_both_nets(added in arb_items(), removed in arb_items()) {
        let (net_added, net_removed) =
            reconcile(added, removed, |item: &String| item.clone());
        for item in &net_added {
            prop_assert!(!net_removed.contains(item));
        }
    }

    #[test]
    fn self_reconciliation_cancels(items in arb_items()) {
        let (net_added, net_removed) =
            reconcile(items.clone(), items, |item: &String| item.clone());
        prop_assert!(net_added.is_empty());
        prop_assert!(net_removed.is_empty());
    }

    #[test]
    fn output_bounded_by_input(added in arb_items(), removed in arb_items()) {
        let added_len = added.len();
        let removed_len = removed.len();
        let (net_added, net_removed) =
            reconcile(added, removed, |item: &String| item.clone());
        prop_assert!(net_added.len() <= added_len);
        prop_assert!(net_removed.len() <= removed_len);
    }
}
