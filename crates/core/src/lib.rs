//! `stowage-core`: shared building blocks for the stowage crates.
//!
//! Identifiers, the domain error model and optimistic versioning. No IO lives
//! here.

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{ContainerId, ItemId, LogEntryId, UserId};
