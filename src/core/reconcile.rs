//! Add/Remove Reconciliation
//!
//! Some upstream data migrations reassign every identifier in a collection.
//! An id-based diff then reports the whole collection as removed-and-re-added.
//! Reconciliation cancels those spurious pairs: candidates are grouped by a
//! stability-invariant key and matching counts on both sides net out, so only
//! the true surplus survives as additions or removals.

use std::collections::BTreeMap;

/// Cancel matched add/remove candidates by a stable key.
///
/// This is a multiset difference per key, not a per-item pairing: 3 added
/// and 2 removed under the same key net out to 1 addition. Ordering within
/// the surviving lists follows the input ordering, keeping output stable.
pub fn reconcile<T, K, F>(
    candidate_added: Vec<T>,
    candidate_removed: Vec<T>,
    key_fn: F,
) -> (Vec<T>, Vec<T>)
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut removed_counts: BTreeMap<K, usize> = BTreeMap::new();
    for item in &candidate_removed {
        *removed_counts.entry(key_fn(item)).or_insert(0) += 1;
    }

    // Consume one matching removal per addition under the same key.
    let mut matched_counts: BTreeMap<K, usize> = BTreeMap::new();
    let mut net_added = Vec::new();
    for item in candidate_added {
        let key = key_fn(&item);
        let available = removed_counts.get(&key).copied().unwrap_or(0);
        let matched = matched_counts.entry(key).or_insert(0);
        if *matched < available {
            *matched += 1;
        } else {
            net_added.push(item);
        }
    }

    let mut consumed_counts: BTreeMap<K, usize> = BTreeMap::new();
    let mut net_removed = Vec::new();
    for item in candidate_removed {
        let key = key_fn(&item);
        let matched = matched_counts.get(&key).copied().unwrap_or(0);
        let consumed = consumed_counts.entry(key).or_insert(0);
        if *consumed < matched {
            *consumed += 1;
        } else {
            net_removed.push(item);
        }
    }

    (net_added, net_removed)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u32,
        name: &'static str,
        qty: i64,
    }

    fn item(id: u32, name: &'static str, qty: i64) -> Item {
        Item { id, name, qty }
    }

    fn by_name_and_qty(i: &Item) -> (String, i64) {
        (i.name.to_string(), i.qty)
    }

    #[test]
    fn test_identical_pairs_cancel() {
        let added = vec![item(99, "Rope (50ft)", 1)];
        let removed = vec![item(1, "Rope (50ft)", 1)];
        let (net_added, net_removed) = reconcile(added, removed, by_name_and_qty);
        assert!(net_added.is_empty());
        assert!(net_removed.is_empty());
    }

    #[test]
    fn test_partial_overlap_nets_out() {
        let added = vec![
            item(10, "Dagger", 1),
            item(11, "Dagger", 1),
            item(12, "Dagger", 1),
        ];
        let removed = vec![item(1, "Dagger", 1), item(2, "Dagger", 1)];
        let (net_added, net_removed) = reconcile(added, removed, by_name_and_qty);
        assert_eq!(net_added.len(), 1);
        assert!(net_removed.is_empty());
    }

    #[test]
    fn test_quantity_is_part_of_the_key() {
        // Same name, different quantity: not the same key, nothing cancels.
        let added = vec![item(10, "Arrow", 40)];
        let removed = vec![item(1, "Arrow", 20)];
        let (net_added, net_removed) = reconcile(added, removed, by_name_and_qty);
        assert_eq!(net_added.len(), 1);
        assert_eq!(net_removed.len(), 1);
    }

    #[test]
    fn test_unrelated_items_pass_through() {
        let added = vec![item(10, "Longsword", 1)];
        let removed = vec![item(1, "Shield", 1)];
        let (net_added, net_removed) = reconcile(added, removed, by_name_and_qty);
        assert_eq!(net_added, vec![item(10, "Longsword", 1)]);
        assert_eq!(net_removed, vec![item(1, "Shield", 1)]);
    }

    #[test]
    fn test_input_order_preserved() {
        let added = vec![item(10, "A", 1), item(11, "B", 1), item(12, "C", 1)];
        let removed = vec![item(1, "B", 1)];
        let (net_added, _) = reconcile(added, removed, by_name_and_qty);
        let names: Vec<&str> = net_added.iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_empty_inputs() {
        let (net_added, net_removed) =
            reconcile(Vec::<Item>::new(), Vec::new(), by_name_and_qty);
        assert!(net_added.is_empty());
        assert!(net_removed.is_empty());
    }
}
