//! Inventory Detector
//!
//! Raw item ids are not stable: some backend migrations reassign every id,
//! and a naive id diff then reports the whole inventory as removed and
//! re-added. The detector pairs items by id where ids survive, reconciles
//! the rest by (name, quantity) so reassigned ids cancel out, and reports
//! only the net surplus. Container moves and quantity shifts are detected
//! separately from additions and removals.

use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::inventory::{self, ItemInfo};
use crate::core::change::{slug, Category, ChangeKind, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;
use crate::core::reconcile::reconcile;

use super::{scalar_kind, ChangeBuilder, ChangeDetector, DetectorKind};

pub struct InventoryDetector {
    config: DetectionConfig,
}

impl InventoryDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for InventoryDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Inventory
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        let old_items = inventory::inventory(old);
        let new_items = inventory::inventory(new);
        let mut changes = Vec::new();

        // Phase 1: pair by surviving id; compare in place.
        let mut unpaired_old: Vec<&ItemInfo> = Vec::new();
        let mut paired_new_ids: Vec<&str> = Vec::new();
        for old_item in &old_items {
            let paired = old_item.id.as_deref().and_then(|id| {
                new_items
                    .iter()
                    .find(|new_item| new_item.id.as_deref() == Some(id))
            });
            match paired {
                Some(new_item) => {
                    paired_new_ids.push(new_item.id.as_deref().unwrap_or_default());
                    self.compare_paired(&builder, old_item, new_item, &mut changes);
                }
                None => unpaired_old.push(old_item),
            }
        }
        let unpaired_new: Vec<&ItemInfo> = new_items
            .iter()
            .filter(|item| {
                item.id
                    .as_deref()
                    .map(|id| !paired_new_ids.contains(&id))
                    .unwrap_or(true)
            })
            .collect();

        // Phase 2: cancel id-reassigned pairs by (name, quantity).
        let (net_added, net_removed) = reconcile(unpaired_new, unpaired_old, |item| {
            (item.name.clone(), item.quantity)
        });

        // Phase 3: an add/remove pair sharing a name but not a quantity is a
        // quantity shift on a reassigned id, not a swap.
        let mut remaining_removed: Vec<&ItemInfo> = Vec::new();
        let mut consumed_added: Vec<usize> = Vec::new();
        for removed_item in net_removed {
            let matched = net_added.iter().enumerate().find(|(index, added_item)| {
                added_item.name == removed_item.name && !consumed_added.contains(index)
            });
            match matched {
                Some((index, added_item)) => {
                    consumed_added.push(index);
                    self.quantity_change(&builder, removed_item, added_item, &mut changes);
                }
                None => remaining_removed.push(removed_item),
            }
        }

        for (index, added_item) in net_added.iter().enumerate() {
            if consumed_added.contains(&index) {
                continue;
            }
            let mut change = builder.change(
                format!("inventory.{}", slug(&added_item.name)),
                None,
                Some(json!(added_item.name)),
                ChangeKind::Added,
                Category::Inventory,
                if added_item.quantity > 1 {
                    format!("Acquired {} x{}", added_item.name, added_item.quantity)
                } else {
                    format!("Acquired {}", added_item.name)
                },
            );
            if let Some(container) = &added_item.container {
                change = change.with_meta("container", json!(container));
            }
            changes.push(change);
        }

        for removed_item in remaining_removed {
            changes.push(builder.change(
                format!("inventory.{}", slug(&removed_item.name)),
                Some(json!(removed_item.name)),
                None,
                ChangeKind::Removed,
                Category::Inventory,
                if removed_item.quantity > 1 {
                    format!("Lost {} x{}", removed_item.name, removed_item.quantity)
                } else {
                    format!("Lost {}", removed_item.name)
                },
            ));
        }

        changes
    }
}

impl InventoryDetector {
    /// Quantity, container, and equipped comparison for one surviving item.
    fn compare_paired(
        &self,
        builder: &ChangeBuilder<'_>,
        old_item: &ItemInfo,
        new_item: &ItemInfo,
        changes: &mut Vec<FieldChange>,
    ) {
        if old_item.quantity != new_item.quantity {
            self.quantity_change(builder, old_item, new_item, changes);
        }
        if old_item.container != new_item.container {
            let from = old_item.container.as_deref().unwrap_or("Equipment");
            let to = new_item.container.as_deref().unwrap_or("Equipment");
            changes.push(builder.change(
                format!("inventory.{}.location", slug(&new_item.name)),
                Some(json!(from)),
                Some(json!(to)),
                ChangeKind::Moved,
                Category::Inventory,
                format!("Moved {} from {from} to {to}", new_item.name),
            ));
        }
        if old_item.equipped != new_item.equipped {
            let description = if new_item.equipped {
                format!("Equipped {}", new_item.name)
            } else {
                format!("Unequipped {}", new_item.name)
            };
            changes.push(builder.change(
                format!("inventory.{}.equipped", slug(&new_item.name)),
                Some(json!(old_item.equipped)),
                Some(json!(new_item.equipped)),
                ChangeKind::Modified,
                Category::Equipment,
                description,
            ));
        }
    }

    fn quantity_change(
        &self,
        builder: &ChangeBuilder<'_>,
        old_item: &ItemInfo,
        new_item: &ItemInfo,
        changes: &mut Vec<FieldChange>,
    ) {
        changes.push(builder.change(
            format!("inventory.{}.quantity", slug(&new_item.name)),
            Some(json!(old_item.quantity)),
            Some(json!(new_item.quantity)),
            scalar_kind(old_item.quantity, new_item.quantity),
            Category::Inventory,
            format!(
                "{} quantity changed from {} to {}",
                new_item.name, old_item.quantity, new_item.quantity
            ),
        ));
    }
}

// ============================================================================
// Tests
// ============================================================================
