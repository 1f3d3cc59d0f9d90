//! Lifecycle manager: item state transitions with their audit trail.
//!
//! Every state-changing transition produces exactly one log entry, and the
//! record writes and log entries of a call are committed as one [`Changeset`].
//! Either all of them persist or none do.
//!
//! ```text
//! requests
//!   ↓
//! 1. Load items/containers into a working set (remember their versions)
//!   ↓
//! 2. Apply pure transitions (Item::place/retrieve/plan_waste/consume,
//!    Container::store/release)
//!   ↓
//! 3. Commit writes + log entries, checked against the remembered versions
//! ```
//!
//! A concurrent writer that touched any of the same records in between makes
//! the commit fail with a conflict; nothing is retried here.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use stowage_cargo::{ActionKind, Container, Item, LogEntry, NewLogEntry};
use stowage_core::{AggregateRoot, ContainerId, DomainError, ExpectedVersion, ItemId, UserId};

use crate::error::ServiceResult;
use crate::store::{CargoStore, Changeset, Committed};

/// Requested state change for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// unplaced → stored in `container_id`.
    Place { container_id: ContainerId },
    /// stored → retrieved.
    Retrieve,
    /// stored and waste as of `reference` → waste_planned, charged to the
    /// undocking container.
    WastePlan {
        undocking_container_id: ContainerId,
        reference: NaiveDate,
    },
    /// Decrement the usage limit when some usage remains.
    Use,
}

impl Transition {
    pub fn action(&self) -> ActionKind {
        match self {
            Transition::Place { .. } => ActionKind::Place,
            Transition::Retrieve => ActionKind::Retrieve,
            Transition::WastePlan { .. } => ActionKind::WastePlan,
            Transition::Use => ActionKind::Use,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub item_id: ItemId,
    pub transition: Transition,
    pub actor: UserId,
    pub timestamp: DateTime<Utc>,
}

/// Records loaded for one call, with the version each was read at.
struct WorkingSet<'s, S> {
    store: &'s S,
    items: Vec<(Item, ExpectedVersion, bool)>,
    item_index: HashMap<ItemId, usize>,
    containers: Vec<(Container, ExpectedVersion, bool)>,
    container_index: HashMap<ContainerId, usize>,
}

impl<'s, S: CargoStore> WorkingSet<'s, S> {
    fn new(store: &'s S) -> Self {
        Self {
            store,
            items: Vec::new(),
            item_index: HashMap::new(),
            containers: Vec::new(),
            container_index: HashMap::new(),
        }
    }

    fn item(&mut self, id: &ItemId) -> ServiceResult<Item> {
        if let Some(&idx) = self.item_index.get(id) {
            return Ok(self.items[idx].0.clone());
        }
        let item = self
            .store
            .item(id)?
            .ok_or_else(|| DomainError::item_not_found(id))?;
        self.item_index.insert(id.clone(), self.items.len());
        self.items.push((item.clone(), ExpectedVersion::of(&item), false));
        Ok(item)
    }

    fn find_container(&mut self, id: &ContainerId) -> ServiceResult<Option<Container>> {
        if let Some(&idx) = self.container_index.get(id) {
            return Ok(Some(self.containers[idx].0.clone()));
        }
        let Some(container) = self.store.container(id)? else {
            return Ok(None);
        };
        self.container_index.insert(id.clone(), self.containers.len());
        self.containers
            .push((container.clone(), ExpectedVersion::of(&container), false));
        Ok(Some(container))
    }

    fn container(&mut self, id: &ContainerId) -> ServiceResult<Container> {
        Ok(self
            .find_container(id)?
            .ok_or_else(|| DomainError::container_not_found(id))?)
    }

    /// Only ids already loaded through `item` may be written back.
    fn put_item(&mut self, item: Item) {
        if let Some(&idx) = self.item_index.get(item.id()) {
            let expected = self.items[idx].1;
            self.items[idx] = (item, expected, true);
        }
    }

    fn put_container(&mut self, container: Container) {
        if let Some(&idx) = self.container_index.get(container.id()) {
            let expected = self.containers[idx].1;
            self.containers[idx] = (container, expected, true);
        }
    }

    fn release_from(&mut self, container_id: &ContainerId, item: &Item) -> ServiceResult<()> {
        if let Some(mut container) = self.find_container(container_id)? {
            container.release(item.id_typed(), item.volume());
            self.put_container(container);
        }
        Ok(())
    }

    fn into_changeset(self, logs: Vec<NewLogEntry>) -> Changeset {
        let mut changeset = Changeset::new();
        for (item, expected, dirty) in self.items {
            if dirty {
                changeset.put_item(item, expected);
            }
        }
        for (container, expected, dirty) in self.containers {
            if dirty {
                changeset.put_container(container, expected);
            }
        }
        for entry in logs {
            changeset.append_log(entry);
        }
        changeset
    }
}

/// Applies transitions against an injected store.
#[derive(Debug)]
pub struct LifecycleManager<S> {
    store: S,
}

impl<S> LifecycleManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: CargoStore> LifecycleManager<S> {
    /// Apply one transition.
    ///
    /// Returns the written log entry, or `None` for a `Use` on an item whose
    /// usage is already exhausted (no state change, nothing logged).
    pub fn transition(
        &self,
        item_id: &ItemId,
        transition: Transition,
        actor: UserId,
        timestamp: DateTime<Utc>,
    ) -> ServiceResult<Option<LogEntry>> {
        let committed = self.apply(vec![TransitionRequest {
            item_id: item_id.clone(),
            transition,
            actor,
            timestamp,
        }])?;
        Ok(committed.logs.into_iter().next())
    }

    /// Apply a batch of transitions as one atomic commit.
    ///
    /// Requests are applied in order against the evolving working set, so a
    /// batch may place several items into the same container. The first
    /// failing request aborts the whole batch.
    pub fn apply(&self, requests: Vec<TransitionRequest>) -> ServiceResult<Committed> {
        let mut ws = WorkingSet::new(&self.store);
        let mut logs = Vec::with_capacity(requests.len());

        for req in requests {
            let item = ws.item(&req.item_id)?;

            let next = match &req.transition {
                Transition::Place { container_id } => {
                    let next = item.place(container_id)?;
                    let mut container = ws.container(container_id)?;
                    container.store(item.id_typed(), item.volume())?;
                    ws.put_container(container);
                    next
                }
                Transition::Retrieve => {
                    let next = item.retrieve()?;
                    if let Some(container_id) = item.occupied_container() {
                        ws.release_from(container_id, &item)?;
                    }
                    next
                }
                Transition::WastePlan {
                    undocking_container_id,
                    reference,
                } => {
                    let next = item.plan_waste(undocking_container_id, *reference)?;
                    if let Some(previous) = item.occupied_container() {
                        ws.release_from(previous, &item)?;
                    }
                    let mut undocking = ws.container(undocking_container_id)?;
                    undocking.store(item.id_typed(), item.volume())?;
                    ws.put_container(undocking);
                    next
                }
                Transition::Use => match item.consume() {
                    Some(next) => next,
                    None => {
                        debug!(item_id = %req.item_id, "usage exhausted; use skipped");
                        continue;
                    }
                },
            };

            debug!(
                item_id = %req.item_id,
                action = %req.transition.action(),
                actor = %req.actor,
                "transition applied"
            );
            ws.put_item(next);
            logs.push(NewLogEntry::new(
                req.transition.action(),
                req.item_id,
                req.actor,
                req.timestamp,
            ));
        }

        if logs.is_empty() {
            return Ok(Committed::default());
        }

        let committed = self.store.commit(ws.into_changeset(logs))?;
        info!(
            items = committed.items.len(),
            containers = committed.containers.len(),
            log_entries = committed.logs.len(),
            "lifecycle changes committed"
        );
        Ok(committed)
    }
}
