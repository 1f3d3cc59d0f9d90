//! Placement engine: greedy, priority-ordered assignment of items to containers.
//!
//! Feasibility is a volume-sum oracle. A container accepts an item when its
//! used volume plus the item's volume does not exceed its own volume; shapes
//! and positions of other items are not considered. The recorded position is
//! the item's own box anchored at the container origin.

use serde::{Deserialize, Serialize};

use stowage_core::{ContainerId, DomainError, DomainResult, ItemId};

use crate::container::Container;
use crate::item::{Dimensions, Item};

/// A point in a container's local frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Coordinates {
    pub const ORIGIN: Coordinates = Coordinates {
        width: 0.0,
        depth: 0.0,
        height: 0.0,
    };
}

/// Axis-aligned box occupied by a placed item.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementBox {
    pub start_coordinates: Coordinates,
    pub end_coordinates: Coordinates,
}

impl PlacementBox {
    /// Origin-anchored box sized to the item. Boxes of items sharing a
    /// container overlap.
    pub fn at_origin(dimensions: Dimensions) -> Self {
        Self {
            start_coordinates: Coordinates::ORIGIN,
            end_coordinates: Coordinates {
                width: dimensions.width,
                depth: dimensions.depth,
                height: dimensions.height,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub item_id: ItemId,
    pub container_id: ContainerId,
    pub position: PlacementBox,
}

/// Result of a fully feasible placement pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementPlan {
    /// In processing order (priority descending).
    pub placements: Vec<Placement>,
    /// Every input container, in input order, with the new tallies applied.
    pub updated_containers: Vec<Container>,
}

/// Assign every item to a container, or fail with all infeasible items.
///
/// Items are processed by descending priority; equal priorities keep their
/// input order. Containers are scanned in input order and the first eligible
/// one with room wins. The pass runs on copies of `containers`: on failure the
/// error lists every item that found no room (items that fail consume no
/// volume) and nothing is returned for commit.
pub fn place(items: &[Item], containers: &[Container]) -> DomainResult<PlacementPlan> {
    let mut working: Vec<Container> = containers.to_vec();

    let mut ordered: Vec<&Item> = items.iter().collect();
    // `sort_by` is stable: ties keep input order.
    ordered.sort_by(|a, b| b.priority().cmp(&a.priority()));

    let mut placements = Vec::with_capacity(ordered.len());
    let mut infeasible = Vec::new();

    for item in ordered {
        let volume = item.volume();
        let target = working
            .iter_mut()
            .find(|c| c.accepts_zone(item.preferred_zone()) && c.fits(volume));

        match target {
            Some(container) => {
                container.store(item.id_typed(), volume)?;
                placements.push(Placement {
                    item_id: item.id_typed().clone(),
                    container_id: container.id_typed().clone(),
                    position: PlacementBox::at_origin(item.dimensions()),
                });
            }
            None => infeasible.push(item.id_typed().clone()),
        }
    }

    if !infeasible.is_empty() {
        return Err(DomainError::infeasible(infeasible));
    }

    Ok(PlacementPlan {
        placements,
        updated_containers: working,
    })
}
