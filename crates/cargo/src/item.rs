use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stowage_core::{AggregateRoot, ContainerId, DomainError, DomainResult, ItemId};

/// Axis-aligned extent of an item or container.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Dimensions {
    /// All three sides must be finite and strictly positive.
    pub fn new(width: f64, depth: f64, height: f64) -> DomainResult<Self> {
        for (name, value) in [("width", width), ("depth", depth), ("height", height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DomainError::validation(format!(
                    "{name} must be a positive number (got {value})"
                )));
            }
        }
        Ok(Self {
            width,
            depth,
            height,
        })
    }

    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.height
    }
}

/// Item lifecycle status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// On board. Unplaced items are `Stored` with no container.
    Stored,
    /// Taken out of its container by a crew member.
    Retrieved,
    /// Assigned to the undocking container for return.
    WastePlanned,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Stored => "stored",
            ItemStatus::Retrieved => "retrieved",
            ItemStatus::WastePlanned => "waste_planned",
        }
    }
}

/// Expiry date, or the "no expiry" sentinel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiry {
    Never,
    On(NaiveDate),
}

impl Expiry {
    /// Strictly before the reference date; `Never` never expires.
    pub fn is_expired_at(&self, reference: NaiveDate) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::On(date) => *date < reference,
        }
    }
}

/// A cargo item and its lifecycle state.
///
/// Transition methods are pure: they validate against the current state and
/// return the next state without mutating `self`. The store bumps `version`
/// when the result is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    name: String,
    dimensions: Dimensions,
    priority: i64,
    expiry: Expiry,
    usage_limit: i64,
    preferred_zone: Option<String>,
    container_id: Option<ContainerId>,
    status: ItemStatus,
    version: u64,
}

impl Item {
    /// A new, unplaced item: priority 0, no expiry, usage limit 1.
    pub fn new(id: ItemId, name: impl Into<String>, dimensions: Dimensions) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            dimensions,
            priority: 0,
            expiry: Expiry::Never,
            usage_limit: 1,
            preferred_zone: None,
            container_id: None,
            status: ItemStatus::Stored,
            version: 0,
        })
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn with_usage_limit(mut self, usage_limit: i64) -> Self {
        self.usage_limit = usage_limit;
        self
    }

    /// Blank zones are treated as "no preference".
    pub fn with_preferred_zone(mut self, zone: Option<String>) -> Self {
        self.preferred_zone = zone.filter(|z| !z.trim().is_empty());
        self
    }

    /// Used by stores when committing.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn id_typed(&self) -> &ItemId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn volume(&self) -> f64 {
        self.dimensions.volume()
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn expiry(&self) -> Expiry {
        self.expiry
    }

    pub fn usage_limit(&self) -> i64 {
        self.usage_limit
    }

    pub fn preferred_zone(&self) -> Option<&str> {
        self.preferred_zone.as_deref()
    }

    pub fn container_id(&self) -> Option<&ContainerId> {
        self.container_id.as_ref()
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Stored with no container reference.
    pub fn is_unplaced(&self) -> bool {
        self.status == ItemStatus::Stored && self.container_id.is_none()
    }

    /// Container whose volume this item is charged to: the storing container
    /// while stored, the undocking container once planned for return.
    pub fn occupied_container(&self) -> Option<&ContainerId> {
        match self.status {
            ItemStatus::Stored | ItemStatus::WastePlanned => self.container_id.as_ref(),
            ItemStatus::Retrieved => None,
        }
    }

    /// Expired before `reference`, or usage exhausted.
    pub fn is_waste_at(&self, reference: NaiveDate) -> bool {
        self.expiry.is_expired_at(reference) || self.usage_limit <= 0
    }

    /// unplaced → stored in `container_id`.
    pub fn place(&self, container_id: &ContainerId) -> DomainResult<Item> {
        if !self.is_unplaced() {
            return Err(DomainError::invalid_state(format!(
                "item {} is already placed or not stored (status: {})",
                self.id,
                self.status.as_str()
            )));
        }
        let mut next = self.clone();
        next.container_id = Some(container_id.clone());
        Ok(next)
    }

    /// stored → retrieved. The container reference is kept as history.
    pub fn retrieve(&self) -> DomainResult<Item> {
        if self.container_id.is_none() {
            return Err(DomainError::invalid_state(format!("item {} is not stored", self.id)));
        }
        if self.status != ItemStatus::Stored {
            return Err(DomainError::invalid_state(format!(
                "item {} cannot be retrieved (status: {})",
                self.id,
                self.status.as_str()
            )));
        }
        let mut next = self.clone();
        next.status = ItemStatus::Retrieved;
        Ok(next)
    }

    /// stored and waste-eligible → waste_planned, moved to the undocking container.
    pub fn plan_waste(&self, undocking: &ContainerId, reference: NaiveDate) -> DomainResult<Item> {
        if self.status != ItemStatus::Stored {
            return Err(DomainError::invalid_state(format!(
                "item {} cannot be planned for return (status: {})",
                self.id,
                self.status.as_str()
            )));
        }
        if !self.is_waste_at(reference) {
            return Err(DomainError::invalid_state(format!(
                "item {} is not waste as of {reference}",
                self.id
            )));
        }
        let mut next = self.clone();
        next.status = ItemStatus::WastePlanned;
        next.container_id = Some(undocking.clone());
        Ok(next)
    }

    /// One unit of usage. `None` when the usage limit is already exhausted.
    pub fn consume(&self) -> Option<Item> {
        if self.usage_limit <= 0 {
            return None;
        }
        let mut next = self.clone();
        next.usage_limit -= 1;
        Some(next)
    }
}

impl AggregateRoot for Item {
    type Id = ItemId;

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

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn item(id: &str) -> Item {
        Item::new(
            ItemId::new(id).unwrap(),
            "Food Packet",
            Dimensions::new(10.0, 10.0, 20.0).unwrap(),
        )
        .unwrap()
    }

    fn container_id(id: &str) -> ContainerId {
        ContainerId::new(id).unwrap()
    }

    #[test]
    fn dimensions_reject_non_positive_sides() {
        assert!(Dimensions::new(0.0, 1.0, 1.0).is_err());
        assert!(Dimensions::new(1.0, -2.0, 1.0).is_err());
        assert!(Dimensions::new(1.0, 1.0, f64::NAN).is_err());
        assert_eq!(Dimensions::new(2.0, 3.0, 4.0).unwrap().volume(), 24.0);
    }

    #[test]
    fn new_item_rejects_blank_name() {
        let err = Item::new(
            ItemId::new("X").unwrap(),
            "  ",
            Dimensions::new(1.0, 1.0, 1.0).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn blank_preferred_zone_means_no_preference() {
        let it = item("A").with_preferred_zone(Some(" ".to_string()));
        assert_eq!(it.preferred_zone(), None);
    }

    #[test]
    fn place_sets_container_and_keeps_status() {
        let placed = item("A").place(&container_id("C1")).unwrap();
        assert_eq!(placed.container_id(), Some(&container_id("C1")));
        assert_eq!(placed.status(), ItemStatus::Stored);
        assert_eq!(placed.occupied_container(), Some(&container_id("C1")));
    }

    #[test]
    fn place_rejects_already_placed_item() {
        let placed = item("A").place(&container_id("C1")).unwrap();
        let err = placed.place(&container_id("C2")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn retrieve_requires_container() {
        let err = item("A").retrieve().unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn retrieve_keeps_container_as_history() {
        let retrieved = item("A").place(&container_id("C1")).unwrap().retrieve().unwrap();
        assert_eq!(retrieved.status(), ItemStatus::Retrieved);
        assert_eq!(retrieved.container_id(), Some(&container_id("C1")));
        assert_eq!(retrieved.occupied_container(), None);
        assert!(matches!(retrieved.retrieve(), Err(DomainError::InvalidState(_))));
    }

    #[test]
    fn expiry_is_strictly_before_reference() {
        let reference = date("2025-04-01");
        assert!(Expiry::On(date("2025-03-01")).is_expired_at(reference));
        assert!(!Expiry::On(date("2025-04-01")).is_expired_at(reference));
        assert!(!Expiry::On(date("2025-12-01")).is_expired_at(reference));
        assert!(!Expiry::Never.is_expired_at(reference));
    }

    #[test]
    fn plan_waste_requires_eligibility() {
        let reference = date("2025-04-01");
        let fresh = item("A")
            .with_expiry(Expiry::On(date("2025-12-01")))
            .place(&container_id("C1"))
            .unwrap();
        assert!(matches!(
            fresh.plan_waste(&container_id("UNDOCK"), reference),
            Err(DomainError::InvalidState(_))
        ));

        let used_up = fresh.with_usage_limit(0);
        let planned = used_up.plan_waste(&container_id("UNDOCK"), reference).unwrap();
        assert_eq!(planned.status(), ItemStatus::WastePlanned);
        assert_eq!(planned.container_id(), Some(&container_id("UNDOCK")));
        assert_eq!(planned.occupied_container(), Some(&container_id("UNDOCK")));
    }

    #[test]
    fn consume_stops_at_zero() {
        let it = item("A").with_usage_limit(1);
        let once = it.consume().unwrap();
        assert_eq!(once.usage_limit(), 0);
        assert!(once.consume().is_none());
        assert!(it.with_usage_limit(-3).consume().is_none());
    }
}
