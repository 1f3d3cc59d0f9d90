use serde::{Deserialize, Serialize};

use stowage_core::{AggregateRoot, ContainerId, DomainError, DomainResult, ItemId};

use crate::item::Dimensions;

/// Storage container with a running volume tally.
///
/// Invariant: `0 <= used_volume <= dimensions.volume()`. Only `store` grows
/// the tally and it refuses anything that would overflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    id: ContainerId,
    zone: String,
    dimensions: Dimensions,
    used_volume: f64,
    items: Vec<ItemId>,
    version: u64,
}

impl Container {
    pub fn new(id: ContainerId, zone: impl Into<String>, dimensions: Dimensions) -> DomainResult<Self> {
        let zone = zone.into();
        if zone.trim().is_empty() {
            return Err(DomainError::validation("zone cannot be empty"));
        }
        Ok(Self {
            id,
            zone,
            dimensions,
            used_volume: 0.0,
            items: Vec::new(),
            version: 0,
        })
    }

    /// Used by stores when committing.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn id_typed(&self) -> &ContainerId {
        &self.id
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn volume(&self) -> f64 {
        self.dimensions.volume()
    }

    pub fn used_volume(&self) -> f64 {
        self.used_volume
    }

    pub fn free_volume(&self) -> f64 {
        self.volume() - self.used_volume
    }

    /// Manifest of the items currently stored here, in placement order.
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// No preference matches every zone.
    pub fn accepts_zone(&self, preferred_zone: Option<&str>) -> bool {
        match preferred_zone {
            None => true,
            Some(zone) => zone == self.zone,
        }
    }

    pub fn fits(&self, volume: f64) -> bool {
        self.used_volume + volume <= self.volume()
    }

    /// Charge `volume` to this container and add the item to the manifest.
    pub fn store(&mut self, item_id: &ItemId, volume: f64) -> DomainResult<()> {
        if !self.fits(volume) {
            return Err(DomainError::infeasible(vec![item_id.clone()]));
        }
        self.used_volume += volume;
        self.items.push(item_id.clone());
        Ok(())
    }

    /// Remove the item from the manifest and give its volume back.
    ///
    /// Items not on the manifest are ignored.
    pub fn release(&mut self, item_id: &ItemId, volume: f64) {
        let Some(pos) = self.items.iter().position(|id| id == item_id) else {
            return;
        };
        self.items.remove(pos);
        self.used_volume = (self.used_volume - volume).max(0.0);
        if self.items.is_empty() {
            self.used_volume = 0.0;
        }
    }

    /// Overwrite zone and dimensions while keeping the current occupancy.
    ///
    /// The zone may only change while the container is empty, so stored items
    /// never end up in a zone they were not placed into.
    pub fn reshape(&self, zone: &str, dimensions: Dimensions) -> DomainResult<Container> {
        if zone != self.zone && !self.items.is_empty() {
            return Err(DomainError::validation(format!(
                "container {} holds {} item(s) and cannot move from {} to {}",
                self.id,
                self.items.len(),
                self.zone,
                zone
            )));
        }
        if dimensions.volume() < self.used_volume {
            return Err(DomainError::validation(format!(
                "container {} volume {} is below its used volume {}",
                self.id,
                dimensions.volume(),
                self.used_volume
            )));
        }
        let mut next = Container::new(self.id.clone(), zone, dimensions)?;
        next.used_volume = self.used_volume;
        next.items = self.items.clone();
        next.version = self.version;
        Ok(next)
    }
}

impl AggregateRoot for Container {
    type Id = ContainerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(zone: &str, side: f64) -> Container {
        Container::new(
            ContainerId::new("contA").unwrap(),
            zone,
            Dimensions::new(side, side, side).unwrap(),
        )
        .unwrap()
    }

    fn item_id(id: &str) -> ItemId {
        ItemId::new(id).unwrap()
    }

    #[test]
    fn zone_affinity() {
        let c = container("Crew Quarters", 10.0);
        assert!(c.accepts_zone(None));
        assert!(c.accepts_zone(Some("Crew Quarters")));
        assert!(!c.accepts_zone(Some("Airlock")));
    }

    #[test]
    fn store_fills_exactly_to_capacity() {
        let mut c = container("Lab", 10.0);
        c.store(&item_id("a"), 600.0).unwrap();
        c.store(&item_id("b"), 400.0).unwrap();
        assert_eq!(c.used_volume(), 1000.0);
        assert_eq!(c.items(), &[item_id("a"), item_id("b")]);
    }

    #[test]
    fn store_refuses_overflow() {
        let mut c = container("Lab", 10.0);
        c.store(&item_id("a"), 900.0).unwrap();
        let err = c.store(&item_id("b"), 200.0).unwrap_err();
        assert_eq!(err, DomainError::InfeasiblePlacement(vec![item_id("b")]));
        assert_eq!(c.used_volume(), 900.0);
        assert_eq!(c.items().len(), 1);
    }

    #[test]
    fn release_returns_volume_once() {
        let mut c = container("Lab", 10.0);
        c.store(&item_id("a"), 300.0).unwrap();
        c.store(&item_id("b"), 200.0).unwrap();
        c.release(&item_id("a"), 300.0);
        c.release(&item_id("a"), 300.0);
        assert_eq!(c.used_volume(), 200.0);
        assert_eq!(c.items(), &[item_id("b")]);
    }

    #[test]
    fn reshape_keeps_occupancy_and_rejects_shrinking_below_it() {
        let mut c = container("Lab", 10.0);
        c.store(&item_id("a"), 500.0).unwrap();

        let grown = c.reshape("Lab", Dimensions::new(10.0, 10.0, 12.0).unwrap()).unwrap();
        assert_eq!(grown.zone(), "Lab");
        assert_eq!(grown.used_volume(), 500.0);
        assert_eq!(grown.items(), &[item_id("a")]);

        let err = c.reshape("Lab", Dimensions::new(5.0, 5.0, 5.0).unwrap()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn zone_changes_only_while_empty() {
        let mut c = container("Lab", 10.0);
        let moved = c.reshape("Storage Bay", Dimensions::new(10.0, 10.0, 10.0).unwrap()).unwrap();
        assert_eq!(moved.zone(), "Storage Bay");

        c.store(&item_id("a"), 500.0).unwrap();
        let err = c
            .reshape("Storage Bay", Dimensions::new(10.0, 10.0, 10.0).unwrap())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        c.release(&item_id("a"), 500.0);
        assert_eq!(c.reshape("Storage Bay", c.dimensions()).unwrap().zone(), "Storage Bay");
    }
}
