//! Cargo store boundary.
//!
//! Items, containers and the append-only audit log behind one trait. Every
//! mutation goes through [`CargoStore::commit`], which applies a whole
//! [`Changeset`] or nothing.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryCargoStore;
pub use r#trait::{CargoStore, Changeset, Committed, ContainerWrite, ItemWrite, StoreError};
