use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use stowage_cargo::{Container, Item, LogEntry, NewLogEntry, identify_waste};
use stowage_core::{ContainerId, ExpectedVersion, ItemId};

/// An item write, checked against the stored version before it is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemWrite {
    pub item: Item,
    pub expected: ExpectedVersion,
}

/// A container write, checked against the stored version before it is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerWrite {
    pub container: Container,
    pub expected: ExpectedVersion,
}

/// One atomic unit of change: record writes plus the log entries describing
/// them.
///
/// A changeset may touch each item and container at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    pub items: Vec<ItemWrite>,
    pub containers: Vec<ContainerWrite>,
    pub logs: Vec<NewLogEntry>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_item(&mut self, item: Item, expected: ExpectedVersion) -> &mut Self {
        self.items.push(ItemWrite { item, expected });
        self
    }

    pub fn put_container(&mut self, container: Container, expected: ExpectedVersion) -> &mut Self {
        self.containers.push(ContainerWrite { container, expected });
        self
    }

    pub fn append_log(&mut self, entry: NewLogEntry) -> &mut Self {
        self.logs.push(entry);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.containers.is_empty() && self.logs.is_empty()
    }
}

/// What a successful commit wrote, with store-assigned versions and sequence
/// numbers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Committed {
    pub items: Vec<Item>,
    pub containers: Vec<Container>,
    pub logs: Vec<LogEntry>,
}

/// Store operation error.
///
/// Infrastructure failures, as opposed to domain errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("invalid changeset: {0}")]
    InvalidChangeset(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value-with-predicates store for cargo state.
///
/// Listing methods return records in first-insertion order; re-importing an
/// existing identifier keeps its position.
///
/// Implementations must apply a changeset atomically: check every expected
/// version first, then write all records and append all log entries, assigning
/// strictly increasing log sequence numbers. No check may observe a partially
/// applied changeset.
pub trait CargoStore: Send + Sync {
    fn item(&self, id: &ItemId) -> Result<Option<Item>, StoreError>;

    fn container(&self, id: &ContainerId) -> Result<Option<Container>, StoreError>;

    fn items(&self) -> Result<Vec<Item>, StoreError>;

    fn containers(&self) -> Result<Vec<Container>, StoreError>;

    /// Items expired before `reference` or with exhausted usage, in store order.
    fn waste_items(&self, reference: NaiveDate) -> Result<Vec<Item>, StoreError> {
        Ok(identify_waste(&self.items()?, reference))
    }

    /// Log entries with `start <= timestamp <= end`, ordered by timestamp then
    /// sequence.
    fn logs_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<LogEntry>, StoreError>;

    fn commit(&self, changeset: Changeset) -> Result<Committed, StoreError>;

    /// Drop every item, container and log entry.
    fn reset(&self) -> Result<(), StoreError>;
}

impl<S> CargoStore for Arc<S>
where
    S: CargoStore + ?Sized,
{
    fn item(&self, id: &ItemId) -> Result<Option<Item>, StoreError> {
        (**self).item(id)
    }

    fn container(&self, id: &ContainerId) -> Result<Option<Container>, StoreError> {
        (**self).container(id)
    }

    fn items(&self) -> Result<Vec<Item>, StoreError> {
        (**self).items()
    }

    fn containers(&self) -> Result<Vec<Container>, StoreError> {
        (**self).containers()
    }

    fn waste_items(&self, reference: NaiveDate) -> Result<Vec<Item>, StoreError> {
        (**self).waste_items(reference)
    }

    fn logs_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<LogEntry>, StoreError> {
        (**self).logs_between(start, end)
    }

    fn commit(&self, changeset: Changeset) -> Result<Committed, StoreError> {
        (**self).commit(changeset)
    }

    fn reset(&self) -> Result<(), StoreError> {
        (**self).reset()
    }
}
