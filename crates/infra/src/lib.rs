//! Infrastructure layer: store, lifecycle manager, simulator, service facade,
//! import records and configuration.

pub mod config;
pub mod error;
pub mod import;
pub mod lifecycle;
pub mod service;
pub mod simulation;
pub mod store;


pub use config::{ConfigError, StowageConfig};
pub use error::{ServiceError, ServiceResult};
pub use import::{ContainerRecord, ItemRecord, parse_containers, parse_items};
pub use lifecycle::{LifecycleManager, Transition, TransitionRequest};
pub use service::{PlacementRequest, StowageService, WasteReturnManifest};
pub use simulation::{DaySimulator, ItemUsage, SimulationRequest, SimulationSummary};
pub use store::{CargoStore, Changeset, Committed, InMemoryCargoStore, StoreError};
