//! Reconciliation of parsed upstream records against the stored snapshot
//!
//! Pure functions: no I/O, no clock. Given the same inputs they always produce
//! the same plan, which is what makes a repeated sync a no-op.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use super::models::{
    ExternalPriceRecord, ExternalStationRecord, PersistedStationRow, PriceKey, PriceSnapshot,
};

/// Price changes needed to bring the database in line with the upstream document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PricePlan {
    pub inserts: Vec<ExternalPriceRecord>,
    /// (existing row id, new price)
    pub updates: Vec<(i64, i64)>,
    /// Prices whose station is not stored locally yet; deferred to a later run
    pub orphans: Vec<ExternalPriceRecord>,
    /// Repeated (station, fuel type) keys within the document; first occurrence wins
    pub duplicates: usize,
}

impl PricePlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.orphans.len() + self.duplicates
    }
}

/// Station changes needed to bring the database in line with the upstream document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationPlan {
    pub inserts: Vec<ExternalStationRecord>,
    pub updates: Vec<ExternalStationRecord>,
    pub duplicates: usize,
}

impl StationPlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty()
    }
}

/// Compute the price upsert plan
///
/// Records are matched on (station id, fuel type) with the fuel type compared
/// case-insensitively. A match with a different price becomes an update, a
/// match with the same price is ignored, no match becomes an insert. Records
/// for stations missing from the snapshot are set aside as orphans.
pub fn reconcile_prices(external: &[ExternalPriceRecord], current: &PriceSnapshot) -> PricePlan {
    let mut index: HashMap<PriceKey, (i64, i64)> = HashMap::with_capacity(current.prices.len());
    for row in &current.prices {
        let key = row.key();
        if index.contains_key(&key) {
            warn!(
                row_id = row.id,
                station_id = row.station_id,
                fuel_type = %row.fuel_type,
                "Stored prices contain a duplicate key; leaving the extra row untouched"
            );
            continue;
        }
        index.insert(key, (row.id, row.price));
    }

    let mut plan = PricePlan::default();
    let mut seen: HashSet<PriceKey> = HashSet::with_capacity(external.len());

    for record in external {
        let key = record.key();
        if !seen.insert(key.clone()) {
            warn!(
                station_id = record.station_id,
                fuel_type = %record.fuel_type,
                "Price key repeated in upstream document; keeping the first occurrence"
            );
            plan.duplicates += 1;
            continue;
        }

        match index.get(&key) {
            Some(&(id, price)) if price != record.price => plan.updates.push((id, record.price)),
            Some(_) => {},
            None if current.station_ids.contains(&record.station_id) => {
                plan.inserts.push(record.clone())
            },
            None => plan.orphans.push(record.clone()),
        }
    }

    plan
}

/// Compute the station upsert plan, matching on `place_id`
pub fn reconcile_stations(
    external: &[ExternalStationRecord],
    current: &[PersistedStationRow],
) -> StationPlan {
    let index: HashMap<i32, &PersistedStationRow> =
        current.iter().map(|row| (row.place_id, row)).collect();

    let mut plan = StationPlan::default();
    let mut seen: HashSet<i32> = HashSet::with_capacity(external.len());

    for record in external {
        if !seen.insert(record.place_id) {
            warn!(place_id = record.place_id, "Station repeated in upstream document");
            plan.duplicates += 1;
            continue;
        }

        match index.get(&record.place_id) {
            Some(row) if row.differs_from(record) => plan.updates.push(record.clone()),
            Some(_) => {},
            None => plan.inserts.push(record.clone()),
        }
    }

    plan
}
