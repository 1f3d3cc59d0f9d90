//! Cargo domain module.
//!
//! Items, containers, the placement engine, waste selection and audit log
//! records, implemented as deterministic domain logic (no IO, no storage).

pub mod container;
pub mod item;
pub mod log;
pub mod placement;
pub mod waste;

pub use container::Container;
pub use item::{Dimensions, Expiry, Item, ItemStatus};
pub use log::{ActionKind, LogEntry, NewLogEntry};
pub use placement::{Coordinates, Placement, PlacementBox, PlacementPlan, place};
pub use waste::{
    DEFAULT_WEIGHT_FACTOR, ReturnSelection, identify_waste, proxy_weight, select_return,
};
