//! Day simulator: sequential daily consumption.
//!
//! Days run strictly one after another and each listed item is used at most
//! once per listing, so usage limits reflect every earlier day.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use stowage_core::{DomainError, ItemId, UserId};

use crate::error::ServiceResult;
use crate::lifecycle::{LifecycleManager, Transition};
use crate::store::CargoStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub num_days: u32,
    /// Items consumed once per day, in this order.
    pub items_to_be_used_per_day: Vec<ItemId>,
    /// Time of day one.
    pub start: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUsage {
    pub item_id: ItemId,
    pub uses: u32,
    pub remaining_uses: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub days_simulated: u32,
    /// Date after the last simulated day.
    pub new_date: NaiveDate,
    /// In order of first use.
    pub items_used: Vec<ItemUsage>,
    /// Items whose usage limit reached zero during the run.
    pub items_depleted: Vec<ItemId>,
    /// Items that were not expired on day one but are by `new_date`.
    pub items_expired: Vec<ItemId>,
    /// Listed ids with no matching item.
    pub unknown_items: Vec<ItemId>,
}

/// Runs day simulations through a lifecycle manager.
#[derive(Debug)]
pub struct DaySimulator<'a, S> {
    lifecycle: &'a LifecycleManager<S>,
    actor: UserId,
}

impl<'a, S: CargoStore> DaySimulator<'a, S> {
    pub fn new(lifecycle: &'a LifecycleManager<S>, actor: UserId) -> Self {
        Self { lifecycle, actor }
    }

    pub fn run(&self, request: &SimulationRequest) -> ServiceResult<SimulationSummary> {
        let store = self.lifecycle.store();
        let mut usage: Vec<ItemUsage> = Vec::new();
        let mut usage_index: HashMap<ItemId, usize> = HashMap::new();
        let mut depleted = Vec::new();
        let mut unknown: Vec<ItemId> = Vec::new();

        let start_date = request.start.date_naive();
        let new_date = start_date
            .checked_add_signed(Duration::days(i64::from(request.num_days)))
            .ok_or_else(out_of_range)?;
        request
            .start
            .checked_add_signed(Duration::days(i64::from(request.num_days.saturating_sub(1))))
            .ok_or_else(out_of_range)?;

        for day in 0..request.num_days {
            let timestamp = request
                .start
                .checked_add_signed(Duration::days(i64::from(day)))
                .ok_or_else(out_of_range)?;

            for item_id in &request.items_to_be_used_per_day {
                let Some(item) = store.item(item_id)? else {
                    if !unknown.contains(item_id) {
                        debug!(item_id = %item_id, "simulated use of unknown item skipped");
                        unknown.push(item_id.clone());
                    }
                    continue;
                };
                if item.usage_limit() <= 0 {
                    continue;
                }

                let logged = self.lifecycle.transition(
                    item_id,
                    Transition::Use,
                    self.actor.clone(),
                    timestamp,
                )?;
                if logged.is_none() {
                    continue;
                }

                let remaining = item.usage_limit() - 1;
                let idx = *usage_index.entry(item_id.clone()).or_insert_with(|| {
                    usage.push(ItemUsage {
                        item_id: item_id.clone(),
                        uses: 0,
                        remaining_uses: remaining,
                    });
                    usage.len() - 1
                });
                usage[idx].uses += 1;
                usage[idx].remaining_uses = remaining;
                if remaining == 0 {
                    depleted.push(item_id.clone());
                }
            }
        }

        let expired = store
            .items()?
            .into_iter()
            .filter(|i| !i.expiry().is_expired_at(start_date) && i.expiry().is_expired_at(new_date))
            .map(|i| i.id_typed().clone())
            .collect();

        info!(
            days = request.num_days,
            items_used = usage.len(),
            depleted = depleted.len(),
            "simulation finished"
        );

        Ok(SimulationSummary {
            days_simulated: request.num_days,
            new_date,
            items_used: usage,
            items_depleted: depleted,
            items_expired: expired,
            unknown_items: unknown,
        })
    }
}

fn out_of_range() -> DomainError {
    DomainError::validation("simulation runs past the supported date range")
}
