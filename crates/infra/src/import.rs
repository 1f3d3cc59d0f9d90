//! Validated bulk-import records.
//!
//! Rows arrive as flat string cells (column names as in the tabular import:
//! `itemId`, `expiryDate`, ...). Each row is converted into a domain value on
//! its own; the first bad field rejects the row with a validation error that
//! names the row and the field.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stowage_cargo::{Container, Dimensions, Expiry, Item};
use stowage_core::{ContainerId, DomainError, DomainResult, ItemId};

/// Cells that mean "no expiry".
const NO_EXPIRY: &[&str] = &["", "N/A", "n/a", "none"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemRecord {
    pub item_id: Option<String>,
    pub name: Option<String>,
    pub width: Option<String>,
    pub depth: Option<String>,
    pub height: Option<String>,
    pub priority: Option<String>,
    pub expiry_date: Option<String>,
    pub usage_limit: Option<String>,
    pub preferred_zone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerRecord {
    pub container_id: Option<String>,
    pub zone: Option<String>,
    pub width: Option<String>,
    pub depth: Option<String>,
    pub height: Option<String>,
}

fn required<'a>(field: &str, value: &'a Option<String>) -> DomainResult<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DomainError::validation(format!("missing required field {field}"))),
    }
}

fn number(field: &str, value: &Option<String>) -> DomainResult<f64> {
    let raw = required(field, value)?;
    raw.parse::<f64>()
        .map_err(|_| DomainError::validation(format!("{field}: '{raw}' is not a number")))
}

fn integer(field: &str, value: &Option<String>) -> DomainResult<i64> {
    let raw = required(field, value)?;
    raw.parse::<i64>()
        .map_err(|_| DomainError::validation(format!("{field}: '{raw}' is not an integer")))
}

fn dimensions(width: &Option<String>, depth: &Option<String>, height: &Option<String>) -> DomainResult<Dimensions> {
    Dimensions::new(
        number("width", width)?,
        number("depth", depth)?,
        number("height", height)?,
    )
}

fn expiry(value: &Option<String>) -> DomainResult<Expiry> {
    let raw = value.as_deref().map(str::trim).unwrap_or("");
    if NO_EXPIRY.contains(&raw) {
        return Ok(Expiry::Never);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Expiry::On)
        .map_err(|_| DomainError::validation(format!("expiryDate: '{raw}' is not a YYYY-MM-DD date")))
}

impl TryFrom<&ItemRecord> for Item {
    type Error = DomainError;

    fn try_from(record: &ItemRecord) -> Result<Self, Self::Error> {
        let id = ItemId::new(required("itemId", &record.item_id)?)?;
        let name = required("name", &record.name)?;
        let dims = dimensions(&record.width, &record.depth, &record.height)?;
        let priority = integer("priority", &record.priority)?;
        let expiry = expiry(&record.expiry_date)?;
        let usage_limit = integer("usageLimit", &record.usage_limit)?;

        Ok(Item::new(id, name, dims)?
            .with_priority(priority)
            .with_expiry(expiry)
            .with_usage_limit(usage_limit)
            .with_preferred_zone(record.preferred_zone.as_ref().map(|z| z.trim().to_string())))
    }
}

impl TryFrom<&ContainerRecord> for Container {
    type Error = DomainError;

    fn try_from(record: &ContainerRecord) -> Result<Self, Self::Error> {
        let id = ContainerId::new(required("containerId", &record.container_id)?)?;
        let zone = required("zone", &record.zone)?;
        let dims = dimensions(&record.width, &record.depth, &record.height)?;
        Container::new(id, zone, dims)
    }
}

/// Prefix a row's validation error with its 1-based row number.
fn at_row(row: usize, err: DomainError) -> DomainError {
    match err {
        DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
            DomainError::validation(format!("row {row}: {msg}"))
        }
        other => other,
    }
}

/// Convert every row, stopping at the first invalid one.
pub fn parse_items(records: &[ItemRecord]) -> DomainResult<Vec<Item>> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| Item::try_from(r).map_err(|e| at_row(i + 1, e)))
        .collect()
}

pub fn parse_containers(records: &[ContainerRecord]) -> DomainResult<Vec<Container>> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| Container::try_from(r).map_err(|e| at_row(i + 1, e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_cargo::ItemStatus;
    use stowage_core::AggregateRoot;

    fn cell(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    fn food_packet() -> ItemRecord {
        ItemRecord {
            item_id: cell("000001"),
            name: cell("Food Packet"),
            width: cell("10"),
            depth: cell("10"),
            height: cell("20"),
            priority: cell("80"),
            expiry_date: cell("2025-05-20"),
            usage_limit: cell("30"),
            preferred_zone: cell("Crew Quarters"),
        }
    }

    #[test]
    fn parses_a_complete_item_row() {
        let item = Item::try_from(&food_packet()).unwrap();
        assert_eq!(item.id().as_str(), "000001");
        assert_eq!(item.volume(), 2000.0);
        assert_eq!(item.priority(), 80);
        assert_eq!(item.expiry(), Expiry::On(NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()));
        assert_eq!(item.usage_limit(), 30);
        assert_eq!(item.preferred_zone(), Some("Crew Quarters"));
        assert_eq!(item.status(), ItemStatus::Stored);
        assert!(item.container_id().is_none());
    }

    #[test]
    fn na_and_blank_mean_no_expiry_and_no_zone() {
        let record = ItemRecord {
            expiry_date: cell("N/A"),
            preferred_zone: cell(""),
            ..food_packet()
        };
        let item = Item::try_from(&record).unwrap();
        assert_eq!(item.expiry(), Expiry::Never);
        assert_eq!(item.preferred_zone(), None);
    }

    #[test]
    fn reports_first_bad_field_with_row() {
        let records = vec![
            food_packet(),
            ItemRecord {
                width: cell("wide"),
                height: None,
                ..food_packet()
            },
        ];
        let err = parse_items(&records).unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("row 2: width: 'wide' is not a number")
        );
    }

    #[test]
    fn missing_required_field_is_validation_error() {
        let record = ItemRecord {
            usage_limit: None,
            ..food_packet()
        };
        let err = parse_items(&[record]).unwrap_err();
        assert_eq!(err, DomainError::validation("row 1: missing required field usageLimit"));
    }

    #[test]
    fn rejects_bad_dates_and_non_positive_sizes() {
        let bad_date = ItemRecord {
            expiry_date: cell("20/05/2025"),
            ..food_packet()
        };
        assert!(matches!(Item::try_from(&bad_date), Err(DomainError::Validation(_))));

        let flat = ItemRecord {
            height: cell("0"),
            ..food_packet()
        };
        assert!(matches!(Item::try_from(&flat), Err(DomainError::Validation(_))));
    }

    #[test]
    fn parses_container_rows_from_camel_case_json() {
        let records: Vec<ContainerRecord> = serde_json::from_str(
            r#"[{"containerId": "contA", "zone": "Crew Quarters", "width": "100", "depth": "85", "height": "200"},
                {"containerId": "contB", "zone": "", "width": "50", "depth": "85", "height": "200"}]"#,
        )
        .unwrap();

        let err = parse_containers(&records).unwrap_err();
        assert_eq!(err, DomainError::validation("row 2: missing required field zone"));

        let first = parse_containers(&records[..1]).unwrap();
        assert_eq!(first[0].id().as_str(), "contA");
        assert_eq!(first[0].volume(), 1_700_000.0);
    }
}
