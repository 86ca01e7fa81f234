//! In-memory doubles for the sync seams, shared by unit tests

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::models::{
    PersistedPriceRow, PersistedStationRow, PriceKey, PriceSnapshot, RawDocument, StoreCounts,
};
use super::reconcile::{PricePlan, StationPlan};
use super::{DocumentSource, FetchError, StoreError, SyncConfig, SyncStore};

/// What the scripted source answers for one URL
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Body(String),
    Status(u16),
    Timeout,
    /// Never resolves
    Hang,
}

#[derive(Default)]
pub(crate) struct ScriptedSource {
    replies: Mutex<HashMap<String, Reply>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn prices(self, reply: Reply) -> Self {
        self.set(&SyncConfig::default().prices_url, reply);
        self
    }

    pub(crate) fn stations(self, reply: Reply) -> Self {
        self.set(&SyncConfig::default().stations_url, reply);
        self
    }

    pub(crate) fn set(&self, url: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for ScriptedSource {
    async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().unwrap().get(url).cloned();

        match reply {
            Some(Reply::Body(body)) => Ok(RawDocument::new(body)),
            Some(Reply::Status(code)) => Err(FetchError::HttpStatus { code }),
            Some(Reply::Timeout) => Err(FetchError::Timeout { secs: 60 }),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(FetchError::HttpStatus { code: 404 }),
        }
    }
}

#[derive(Default)]
struct MemoryState {
    stations: BTreeMap<i32, PersistedStationRow>,
    prices: Vec<PersistedPriceRow>,
    next_price_id: i64,
}

/// [`SyncStore`] over plain collections, enforcing the same unique price key as the database
#[derive(Default)]
pub(crate) struct MemorySyncStore {
    state: Mutex<MemoryState>,
    fail_apply: Mutex<bool>,
    reads: AtomicUsize,
    applies: AtomicUsize,
}

impl MemorySyncStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_stations(ids: &[i32]) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock().unwrap();
            for &place_id in ids {
                state.stations.insert(
                    place_id,
                    PersistedStationRow {
                        place_id,
                        name: format!("Station {}", place_id),
                        cre_id: format!("PL/{}/EXP/ES/2015", place_id),
                        x: 0.0,
                        y: 0.0,
                    },
                );
            }
        }
        store
    }

    pub(crate) fn fail_next_apply(&self) {
        *self.fail_apply.lock().unwrap() = true;
    }

    pub(crate) fn prices(&self) -> Vec<PersistedPriceRow> {
        self.state.lock().unwrap().prices.clone()
    }

    pub(crate) fn stations(&self) -> Vec<PersistedStationRow> {
        self.state.lock().unwrap().stations.values().cloned().collect()
    }

    /// Snapshot reads plus plan applications observed so far
    pub(crate) fn touches(&self) -> usize {
        self.reads.load(Ordering::SeqCst) + self.applies.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> Result<(), StoreError> {
        let mut fail = self.fail_apply.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(StoreError::Interrupted("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SyncStore for MemorySyncStore {
    async fn load_price_snapshot(&self) -> Result<PriceSnapshot, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(PriceSnapshot {
            station_ids: state.stations.keys().copied().collect(),
            prices: state.prices.clone(),
        })
    }

    async fn apply_price_plan(&self, plan: &PricePlan) -> Result<(), StoreError> {
        self.applies.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        let mut state = self.state.lock().unwrap();

        // Validate the whole plan before touching anything
        let mut keys: HashSet<PriceKey> = state.prices.iter().map(PersistedPriceRow::key).collect();
        for record in &plan.inserts {
            if !keys.insert(record.key()) {
                return Err(StoreError::Conflict(format!(
                    "duplicate key ({}, {})",
                    record.station_id, record.fuel_type
                )));
            }
        }

        for record in &plan.inserts {
            state.next_price_id += 1;
            let id = state.next_price_id;
            state.prices.push(PersistedPriceRow {
                id,
                station_id: record.station_id,
                fuel_type: record.fuel_type.clone(),
                price: record.price,
            });
        }
        for &(id, price) in &plan.updates {
            if let Some(row) = state.prices.iter_mut().find(|row| row.id == id) {
                row.price = price;
            }
        }

        Ok(())
    }

    async fn load_stations(&self) -> Result<Vec<PersistedStationRow>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.stations())
    }

    async fn apply_station_plan(&self, plan: &StationPlan) -> Result<(), StoreError> {
        self.applies.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        let mut state = self.state.lock().unwrap();
        if let Some(existing) = plan.inserts.iter().find(|s| state.stations.contains_key(&s.place_id)) {
            return Err(StoreError::Conflict(format!("station {} exists", existing.place_id)));
        }

        for station in plan.inserts.iter().chain(&plan.updates) {
            state.stations.insert(
                station.place_id,
                PersistedStationRow {
                    place_id: station.place_id,
                    name: station.name.clone(),
                    cre_id: station.cre_id.clone(),
                    x: station.x,
                    y: station.y,
                },
            );
        }

        Ok(())
    }

    async fn counts(&self) -> Result<StoreCounts, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(StoreCounts {
            stations: state.stations.len() as i64,
            prices: state.prices.len() as i64,
            last_price_id: state.prices.iter().map(|row| row.id).max(),
        })
    }
}

pub(crate) fn prices_xml(station_id: i32, prices: &[(&str, &str)]) -> String {
    let mut xml = format!(r#"<places><place place_id="{}">"#, station_id);
    for (fuel_type, value) in prices {
        xml.push_str(&format!(r#"<gas_price type="{}">{}</gas_price>"#, fuel_type, value));
    }
    xml.push_str("</place></places>");
    xml
}
