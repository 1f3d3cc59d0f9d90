//! Waste identification and weight-bounded return selection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stowage_core::ItemId;

use crate::container::Container;
use crate::item::Item;

/// Mass per unit volume used for the return weight proxy.
pub const DEFAULT_WEIGHT_FACTOR: f64 = 0.1;

/// Items expired before `reference` or with exhausted usage, in input order.
pub fn identify_waste<'a>(items: impl IntoIterator<Item = &'a Item>, reference: NaiveDate) -> Vec<Item> {
    items
        .into_iter()
        .filter(|item| item.is_waste_at(reference))
        .cloned()
        .collect()
}

/// Estimated return mass of an item (no real mass is tracked).
pub fn proxy_weight(item: &Item, weight_factor: f64) -> f64 {
    item.volume() * weight_factor
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSelection {
    pub return_items: Vec<ItemId>,
    pub total_weight: f64,
}

/// Greedy single pass in input order, no backtracking.
///
/// An item is taken when the running total stays within `max_weight` and it
/// still fits into the undocking container's free volume (items already on
/// its manifest need no extra room). Otherwise it is skipped and later,
/// lighter or smaller items may still be taken.
pub fn select_return(
    items: &[Item],
    undocking: &Container,
    max_weight: f64,
    weight_factor: f64,
) -> ReturnSelection {
    let mut selection = ReturnSelection {
        return_items: Vec::new(),
        total_weight: 0.0,
    };
    let mut free = undocking.free_volume();

    for item in items {
        let weight = proxy_weight(item, weight_factor);
        if selection.total_weight + weight > max_weight {
            continue;
        }
        let needed = if undocking.items().contains(item.id_typed()) {
            0.0
        } else {
            item.volume()
        };
        if needed > free {
            continue;
        }
        free -= needed;
        selection.total_weight += weight;
        selection.return_items.push(item.id_typed().clone());
    }

    selection
}
