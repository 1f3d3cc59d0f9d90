//! Error surfaced by the lifecycle manager and the service facade.

use thiserror::Error;

use stowage_core::DomainError;

use crate::store::StoreError;

/// Structured failure: a stable [`kind`](ServiceError::kind) plus a message.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => ServiceError::Domain(DomainError::Conflict(msg)),
            other => ServiceError::Store(other),
        }
    }
}

impl ServiceError {
    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Domain(DomainError::Validation(_)) => "validation_error",
            ServiceError::Domain(DomainError::InvalidId(_)) => "validation_error",
            ServiceError::Domain(DomainError::NotFound { .. }) => "not_found",
            ServiceError::Domain(DomainError::InfeasiblePlacement(_)) => "infeasible_placement",
            ServiceError::Domain(DomainError::InvalidState(_)) => "invalid_state",
            ServiceError::Domain(DomainError::Conflict(_)) => "conflict",
            ServiceError::Store(_) => "store_error",
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
