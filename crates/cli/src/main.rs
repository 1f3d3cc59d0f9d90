//! Import item and container record files, place everything, print the plan.
//!
//! Usage: `stowage <items.json> <containers.json>`
//!
//! Both files hold JSON arrays of records whose cells are strings, keyed by
//! the tabular column names (`itemId`, `containerId`, `expiryDate`, ...).

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use serde::de::DeserializeOwned;

use stowage_infra::{
    ContainerRecord, InMemoryCargoStore, ItemRecord, PlacementRequest, StowageConfig, StowageService,
};

fn read_records<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let config = StowageConfig::from_env()?;
    stowage_observability::init(&config.log_filter);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [items_path, containers_path] = args.as_slice() else {
        bail!("usage: stowage <items.json> <containers.json>");
    };

    let items: Vec<ItemRecord> = read_records(Path::new(items_path))?;
    let containers: Vec<ContainerRecord> = read_records(Path::new(containers_path))?;

    let service = StowageService::new(Arc::new(InMemoryCargoStore::new()), config);
    let container_count = service.import_containers(&containers)?;
    let item_count = service.import_items(&items)?;
    tracing::info!(items = item_count, containers = container_count, "records imported");

    let plan = service.place(PlacementRequest::default())?;
    println!("{}", serde_json::to_string_pretty(&plan.placements)?);
    Ok(())
}
