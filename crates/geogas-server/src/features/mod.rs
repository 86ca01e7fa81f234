//! Feature modules implementing the GeoGas API
//!
//! Each feature is a vertical slice with its own routes and, for read
//! endpoints, a `queries/` directory holding one query per file.
//!
//! # Features
//!
//! - **sync**: trigger upstream synchronization and report its status
//! - **prices**: read-only access to current fuel prices
//! - **stations**: read-only access to the station catalogue

pub mod prices;
pub mod stations;
pub mod sync;

use axum::Router;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::sync::SyncOrchestrator;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool for the query endpoints
    pub db: sqlx::PgPool,
    pub orchestrator: Arc<SyncOrchestrator>,
    /// Cancelled on shutdown so that in-flight sync runs stop before committing
    pub shutdown: CancellationToken,
}

/// Creates the API router with all feature routes mounted
///
/// - `/sync` - Synchronization triggers and status
/// - `/prices` - Price queries
/// - `/stations` - Station queries
pub fn router(state: FeatureState) -> Router<()> {
    let sync_state = sync::SyncState {
        orchestrator: state.orchestrator.clone(),
        shutdown: state.shutdown.clone(),
    };

    Router::new()
        .nest("/sync", sync::sync_routes().with_state(sync_state))
        .nest("/prices", prices::prices_routes().with_state(state.db.clone()))
        .nest("/stations", stations::stations_routes().with_state(state.db.clone()))
}
