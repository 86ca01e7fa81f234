use serde::{Deserialize, Serialize};

use crate::sync::PersistedPriceRow;

/// Price row as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceItem {
    pub id: i64,
    pub station_id: i32,
    pub fuel_type: String,
    /// Minor units (cents)
    pub price_cents: i64,
    /// Decimal rendering of `price_cents`, e.g. `"22.50"`
    pub price: String,
}

impl From<PersistedPriceRow> for PriceItem {
    fn from(row: PersistedPriceRow) -> Self {
        Self {
            id: row.id,
            station_id: row.station_id,
            fuel_type: row.fuel_type,
            price_cents: row.price,
            price: format_minor_units(row.price),
        }
    }
}

/// Render cents as a decimal string with two fractional digits
pub fn format_minor_units(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
