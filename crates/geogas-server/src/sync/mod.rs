//! External data synchronization
//!
//! Pulls the station and price documents published by the fuel regulator and
//! upserts them into the local `stations` and `gas_prices` tables.
//!
//! # Architecture
//!
//! - **fetcher**: HTTP download of the raw XML document with a bounded timeout
//! - **parser**: XML to typed records, skipping and warning on bad elements
//! - **reconcile**: pure diff of parsed records against the stored snapshot
//! - **storage**: snapshot reads and transactional plan application
//! - **orchestrator**: fetch -> parse -> snapshot -> reconcile -> commit
//!
//! A run is idempotent: repeating it against unchanged upstream data inserts
//! and updates nothing.

pub mod config;
pub mod fetcher;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod reconcile;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use config::SyncConfig;
pub use fetcher::{DocumentFetcher, DocumentSource};
pub use models::{
    ExternalPriceRecord, ExternalStationRecord, FullSyncResult, ParseWarning, ParseWarningKind,
    Parsed, PersistedPriceRow, PersistedStationRow, PriceSnapshot, RawDocument, StoreCounts,
    SyncResult,
};
pub use orchestrator::SyncOrchestrator;
pub use parser::{parse_prices, parse_stations};
pub use reconcile::{reconcile_prices, reconcile_stations, PricePlan, StationPlan};
pub use storage::{PgSyncStore, SyncStore};

use thiserror::Error;

/// Failure to retrieve an upstream document
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream responded with HTTP {code}")]
    HttpStatus { code: u16 },

    #[error("Upstream did not answer within {secs} seconds")]
    Timeout { secs: u64 },
}

/// Failure to read an upstream document as XML at all
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Malformed document: {0}")]
    Malformed(String),
}

/// Failure of the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A concurrent writer committed a conflicting row first
    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Commit task did not complete: {0}")]
    Interrupted(String),
}

impl StoreError {
    /// Classify a sqlx error, separating unique violations from other failures
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            },
            _ => StoreError::Database(err),
        }
    }
}

/// Failure of a whole sync run, tagged with the stage that failed
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),

    #[error("Sync cancelled before persistence started")]
    Cancelled,
}

pub type SyncOutcome<T> = std::result::Result<T, SyncError>;
