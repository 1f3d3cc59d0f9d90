//! Audit log records.
//!
//! Entries are facts: written once by the lifecycle manager, never updated or
//! deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stowage_core::{ItemId, LogEntryId, UserId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Place,
    Retrieve,
    WastePlan,
    Use,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Place => "place",
            ActionKind::Retrieve => "retrieve",
            ActionKind::WastePlan => "waste_plan",
            ActionKind::Use => "use",
        }
    }
}

impl core::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A log entry ready to be appended (no sequence number yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLogEntry {
    pub id: LogEntryId,
    pub action: ActionKind,
    pub item_id: ItemId,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
}

impl NewLogEntry {
    pub fn new(action: ActionKind, item_id: ItemId, user_id: UserId, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: LogEntryId::new(),
            action,
            item_id,
            user_id,
            timestamp,
        }
    }
}

/// A persisted log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogEntryId,
    /// Store-assigned, strictly increasing append position.
    pub sequence: u64,
    pub action: ActionKind,
    pub item_id: ItemId,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn committed(entry: NewLogEntry, sequence: u64) -> Self {
        Self {
            id: entry.id,
            sequence,
            action: entry.action,
            item_id: entry.item_id,
            user_id: entry.user_id,
            timestamp: entry.timestamp,
        }
    }
}
