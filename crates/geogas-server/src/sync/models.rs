//! Records flowing through a sync run
//!
//! `External*` records live only for the duration of one run: they are parsed
//! from the upstream document, reconciled, and dropped. `Persisted*` rows are
//! the snapshot read back from the database at the start of the run.

use serde::{Deserialize, Serialize};

/// Fuel type used when a `gas_price` element has no `type` attribute
pub const UNKNOWN_FUEL_TYPE: &str = "desconocido";

/// Raw upstream response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub body: String,
    pub content_type: Option<String>,
}

impl RawDocument {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: None,
        }
    }
}

/// Station as published in the upstream `places` document
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalStationRecord {
    pub place_id: i32,
    pub name: String,
    pub cre_id: String,
    pub x: f64,
    pub y: f64,
}

/// Price as published in the upstream `prices` document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalPriceRecord {
    pub station_id: i32,
    pub fuel_type: String,
    /// Price in minor currency units (cents)
    pub price: i64,
}

impl ExternalPriceRecord {
    pub fn key(&self) -> PriceKey {
        PriceKey::new(self.station_id, &self.fuel_type)
    }
}

/// Identity of a price row: station plus case-folded fuel type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceKey {
    pub station_id: i32,
    pub fuel_type: String,
}

impl PriceKey {
    pub fn new(station_id: i32, fuel_type: &str) -> Self {
        Self {
            station_id,
            fuel_type: fuel_type.to_lowercase(),
        }
    }
}

/// Stored price row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PersistedPriceRow {
    pub id: i64,
    pub station_id: i32,
    pub fuel_type: String,
    pub price: i64,
}

impl PersistedPriceRow {
    pub fn key(&self) -> PriceKey {
        PriceKey::new(self.station_id, &self.fuel_type)
    }
}

/// Stored station row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PersistedStationRow {
    pub place_id: i32,
    pub name: String,
    pub cre_id: String,
    pub x: f64,
    pub y: f64,
}

impl PersistedStationRow {
    /// True when any published field differs from the stored one
    pub fn differs_from(&self, external: &ExternalStationRecord) -> bool {
        self.name != external.name
            || self.cre_id != external.cre_id
            || self.x != external.x
            || self.y != external.y
    }
}

/// What the price reconciliation sees of the database at the start of a run
#[derive(Debug, Clone, Default)]
pub struct PriceSnapshot {
    pub station_ids: std::collections::HashSet<i32>,
    pub prices: Vec<PersistedPriceRow>,
}

/// Non-fatal problem found while parsing a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseWarningKind {
    MissingStationId,
    InvalidPrice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub kind: ParseWarningKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_id: Option<i32>,
    pub detail: String,
}

impl ParseWarning {
    pub fn missing_station_id(raw: Option<&str>) -> Self {
        let detail = match raw {
            Some(value) => format!("place_id '{}' is not a positive integer", value),
            None => "place element has no place_id attribute".to_string(),
        };
        Self {
            kind: ParseWarningKind::MissingStationId,
            station_id: None,
            detail,
        }
    }

    pub fn invalid_price(station_id: i32, fuel_type: &str, raw: &str) -> Self {
        Self {
            kind: ParseWarningKind::InvalidPrice,
            station_id: Some(station_id),
            detail: format!("{} price '{}' is not a decimal number", fuel_type, raw.trim()),
        }
    }
}

/// Records extracted from one document plus the warnings collected on the way
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub warnings: Vec<ParseWarning>,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Outcome of a successful sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub inserted: usize,
    pub updated: usize,
    /// External records left out of the plan (orphans, in-document duplicates)
    pub skipped: usize,
    pub warnings: Vec<ParseWarning>,
}

impl SyncResult {
    pub fn changed(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Result of `POST /sync/all`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullSyncResult {
    pub stations: SyncResult,
    pub prices: SyncResult,
}

/// Table counts reported by the status endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub stations: i64,
    pub prices: i64,
    pub last_price_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_key_folds_case() {
        assert_eq!(PriceKey::new(5, "Regular"), PriceKey::new(5, "REGULAR"));
        assert_ne!(PriceKey::new(5, "regular"), PriceKey::new(6, "regular"));
    }

    #[test]
    fn test_station_differs_from() {
        let row = PersistedStationRow {
            place_id: 1,
            name: "Centro".to_string(),
            cre_id: "PL/1/EXP/2015".to_string(),
            x: -99.1,
            y: 19.4,
        };
        let mut external = ExternalStationRecord {
            place_id: 1,
            name: "Centro".to_string(),
            cre_id: "PL/1/EXP/2015".to_string(),
            x: -99.1,
            y: 19.4,
        };
        assert!(!row.differs_from(&external));

        external.y = 19.5;
        assert!(row.differs_from(&external));
    }

    #[test]
    fn test_warning_serializes_kind_in_snake_case() {
        let warning = ParseWarning::invalid_price(5, "regular", " N/A ");
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "invalid_price");
        assert_eq!(json["station_id"], 5);
        assert_eq!(json["detail"], "regular price 'N/A' is not a decimal number");
    }
}
