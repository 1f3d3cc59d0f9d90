//! Domain error model.

use thiserror::Error;

use crate::id::ItemId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Deterministic business failures only (validation, lifecycle rules,
/// placement feasibility, stale writes). Storage failures live in the infra
/// crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input (e.g. a missing or non-positive field on import).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was empty or otherwise unusable.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Unknown item or container.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// No eligible container has room for these items.
    #[error("no space for item(s): {}", join_ids(.0))]
    InfeasiblePlacement(Vec<ItemId>),

    /// The requested transition is not allowed from the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Stale version (optimistic concurrency).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn item_not_found(id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            kind: "item",
            id: id.to_string(),
        }
    }

    pub fn container_not_found(id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            kind: "container",
            id: id.to_string(),
        }
    }

    pub fn infeasible(item_ids: Vec<ItemId>) -> Self {
        Self::InfeasiblePlacement(item_ids)
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

fn join_ids(ids: &[ItemId]) -> String {
    ids.iter()
        .map(ItemId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
