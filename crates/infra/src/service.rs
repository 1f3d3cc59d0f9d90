//! Operation surface over an injected cargo store.
//!
//! ```text
//! records / requests
//!   ↓
//! StowageService (validation, record resolution)
//!   ↓
//! placement engine / waste selection (pure, on snapshots)
//!   ↓
//! LifecycleManager::apply (one atomic changeset per call)
//! ```

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use stowage_cargo::{Container, Item, ItemStatus, LogEntry, PlacementPlan, select_return};
use stowage_core::{AggregateRoot, ContainerId, DomainError, ExpectedVersion, ItemId, UserId};

use crate::config::StowageConfig;
use crate::error::ServiceResult;
use crate::import::{ContainerRecord, ItemRecord, parse_containers, parse_items};
use crate::lifecycle::{LifecycleManager, Transition, TransitionRequest};
use crate::simulation::{DaySimulator, SimulationRequest, SimulationSummary};
use crate::store::{CargoStore, Changeset};

/// Which records a placement run considers.
///
/// `None` means every unplaced item, or every container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub item_ids: Option<Vec<ItemId>>,
    pub container_ids: Option<Vec<ContainerId>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteReturnManifest {
    pub undocking_container_id: ContainerId,
    pub undocking_date: NaiveDate,
    pub return_items: Vec<ItemId>,
    pub total_weight: f64,
}

fn reject_duplicates<T>(ids: &[T], what: &str) -> ServiceResult<()>
where
    T: Eq + std::hash::Hash + std::fmt::Display,
{
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id) {
            return Err(DomainError::validation(format!("{what} {id} listed more than once")).into());
        }
    }
    Ok(())
}

/// Keep the last record per id, at the position of its first occurrence.
fn dedupe_last_wins<T: AggregateRoot>(records: Vec<T>) -> Vec<T>
where
    T::Id: Clone + Eq + std::hash::Hash,
{
    let mut index: HashMap<T::Id, usize> = HashMap::new();
    let mut unique: Vec<T> = Vec::with_capacity(records.len());
    for record in records {
        match index.get(record.id()) {
            Some(&idx) => unique[idx] = record,
            None => {
                index.insert(record.id().clone(), unique.len());
                unique.push(record);
            }
        }
    }
    unique
}

#[derive(Debug)]
pub struct StowageService<S> {
    lifecycle: LifecycleManager<S>,
    config: StowageConfig,
}

impl<S> StowageService<S> {
    pub fn new(store: S, config: StowageConfig) -> Self {
        Self {
            lifecycle: LifecycleManager::new(store),
            config,
        }
    }

    pub fn store(&self) -> &S {
        self.lifecycle.store()
    }

    pub fn config(&self) -> &StowageConfig {
        &self.config
    }
}

impl<S: CargoStore> StowageService<S> {
    /// Upsert items. Re-imported items start over unplaced and give back any
    /// volume they held.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn import_items(&self, records: &[ItemRecord]) -> ServiceResult<usize> {
        let items = dedupe_last_wins(parse_items(records)?);
        let store = self.store();

        let mut changeset = Changeset::new();
        let mut released: Vec<(Container, ExpectedVersion)> = Vec::new();
        let mut released_index: HashMap<ContainerId, usize> = HashMap::new();

        for item in &items {
            let existing = store.item(item.id_typed())?;
            let expected = match &existing {
                Some(prev) => ExpectedVersion::of(prev),
                None => ExpectedVersion::Absent,
            };

            if let Some(prev) = existing {
                if let Some(container_id) = prev.occupied_container() {
                    let idx = match released_index.get(container_id).copied() {
                        Some(idx) => Some(idx),
                        None => store.container(container_id)?.map(|c| {
                            released_index.insert(container_id.clone(), released.len());
                            let expected = ExpectedVersion::of(&c);
                            released.push((c, expected));
                            released.len() - 1
                        }),
                    };
                    if let Some(idx) = idx {
                        released[idx].0.release(prev.id_typed(), prev.volume());
                    }
                }
            }

            changeset.put_item(item.clone(), expected);
        }

        for (container, expected) in released {
            changeset.put_container(container, expected);
        }

        store.commit(changeset)?;
        info!(count = items.len(), "items imported");
        Ok(items.len())
    }

    /// Upsert containers. Existing containers keep their occupancy.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn import_containers(&self, records: &[ContainerRecord]) -> ServiceResult<usize> {
        let containers = dedupe_last_wins(parse_containers(records)?);
        let store = self.store();

        let mut changeset = Changeset::new();
        for container in &containers {
            match store.container(container.id_typed())? {
                Some(prev) => {
                    let next = prev.reshape(container.zone(), container.dimensions())?;
                    changeset.put_container(next, ExpectedVersion::of(&prev));
                }
                None => {
                    changeset.put_container(container.clone(), ExpectedVersion::Absent);
                }
            }
        }

        store.commit(changeset)?;
        info!(count = containers.len(), "containers imported");
        Ok(containers.len())
    }

    /// Place items as one batch.
    ///
    /// Either every requested item is placed or nothing changes; an infeasible
    /// batch fails with all item ids that found no room.
    #[instrument(skip_all)]
    pub fn place(&self, request: PlacementRequest) -> ServiceResult<PlacementPlan> {
        if let Some(ids) = &request.item_ids {
            reject_duplicates(ids, "item")?;
        }
        if let Some(ids) = &request.container_ids {
            reject_duplicates(ids, "container")?;
        }
        let store = self.store();

        let items = match &request.item_ids {
            Some(ids) => {
                let mut items = Vec::with_capacity(ids.len());
                for id in ids {
                    let item = store.item(id)?.ok_or_else(|| DomainError::item_not_found(id))?;
                    if !item.is_unplaced() {
                        return Err(DomainError::invalid_state(format!(
                            "item {id} is not awaiting placement (status: {})",
                            item.status().as_str()
                        ))
                        .into());
                    }
                    items.push(item);
                }
                items
            }
            None => store.items()?.into_iter().filter(Item::is_unplaced).collect(),
        };

        let containers = match &request.container_ids {
            Some(ids) => {
                let mut containers = Vec::with_capacity(ids.len());
                for id in ids {
                    containers.push(
                        store
                            .container(id)?
                            .ok_or_else(|| DomainError::container_not_found(id))?,
                    );
                }
                containers
            }
            None => store.containers()?,
        };

        let mut plan = match stowage_cargo::place(&items, &containers) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(items = items.len(), containers = containers.len(), error = %err, "placement rejected");
                return Err(err.into());
            }
        };

        let now = Utc::now();
        let requests = plan
            .placements
            .iter()
            .map(|p| TransitionRequest {
                item_id: p.item_id.clone(),
                transition: Transition::Place {
                    container_id: p.container_id.clone(),
                },
                actor: self.config.system_actor.clone(),
                timestamp: now,
            })
            .collect();
        let committed = self.lifecycle.apply(requests)?;

        let fresh: HashMap<ContainerId, Container> = committed
            .containers
            .into_iter()
            .map(|c| (c.id_typed().clone(), c))
            .collect();
        for container in &mut plan.updated_containers {
            if let Some(c) = fresh.get(container.id_typed()) {
                *container = c.clone();
            }
        }

        info!(placed = plan.placements.len(), "placement committed");
        Ok(plan)
    }

    pub fn search(&self, item_id: &ItemId) -> ServiceResult<Item> {
        Ok(self
            .store()
            .item(item_id)?
            .ok_or_else(|| DomainError::item_not_found(item_id))?)
    }

    #[instrument(skip(self))]
    pub fn retrieve(&self, item_id: &ItemId, user_id: UserId, timestamp: DateTime<Utc>) -> ServiceResult<Item> {
        let committed = self.lifecycle.apply(vec![TransitionRequest {
            item_id: item_id.clone(),
            transition: Transition::Retrieve,
            actor: user_id,
            timestamp,
        }])?;
        Ok(committed
            .items
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::item_not_found(item_id))?)
    }

    /// Items that are waste as of `reference`, whatever their status.
    pub fn identify_waste(&self, reference: NaiveDate) -> ServiceResult<Vec<Item>> {
        Ok(self.store().waste_items(reference)?)
    }

    /// Select stored waste within `max_weight` and the undocking container's
    /// free volume, and move it there.
    #[instrument(skip(self))]
    pub fn plan_waste_return(
        &self,
        undocking_container_id: &ContainerId,
        undocking_date: NaiveDate,
        max_weight: f64,
    ) -> ServiceResult<WasteReturnManifest> {
        if !max_weight.is_finite() || max_weight < 0.0 {
            return Err(DomainError::validation(format!(
                "max weight must be a finite, non-negative number (got {max_weight})"
            ))
            .into());
        }
        let undocking = self
            .store()
            .container(undocking_container_id)?
            .ok_or_else(|| DomainError::container_not_found(undocking_container_id))?;

        let candidates: Vec<Item> = self
            .store()
            .waste_items(undocking_date)?
            .into_iter()
            .filter(|i| i.status() == ItemStatus::Stored)
            .collect();
        let selection = select_return(&candidates, &undocking, max_weight, self.config.weight_factor);

        let now = Utc::now();
        let requests = selection
            .return_items
            .iter()
            .map(|id| TransitionRequest {
                item_id: id.clone(),
                transition: Transition::WastePlan {
                    undocking_container_id: undocking_container_id.clone(),
                    reference: undocking_date,
                },
                actor: self.config.system_actor.clone(),
                timestamp: now,
            })
            .collect();
        self.lifecycle.apply(requests)?;

        info!(
            candidates = candidates.len(),
            selected = selection.return_items.len(),
            total_weight = selection.total_weight,
            "waste return planned"
        );
        Ok(WasteReturnManifest {
            undocking_container_id: undocking_container_id.clone(),
            undocking_date,
            return_items: selection.return_items,
            total_weight: selection.total_weight,
        })
    }

    pub fn simulate(&self, request: &SimulationRequest) -> ServiceResult<SimulationSummary> {
        DaySimulator::new(&self.lifecycle, self.config.system_actor.clone()).run(request)
    }

    /// Log entries with `start <= timestamp <= end`. An inverted range is empty.
    pub fn logs(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> ServiceResult<Vec<LogEntry>> {
        Ok(self.store().logs_between(start, end)?)
    }

    pub fn reset(&self) -> ServiceResult<()> {
        self.store().reset()?;
        info!("store reset");
        Ok(())
    }
}
