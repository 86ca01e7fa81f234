//! Sync routes
//!
//! - `POST /api/v1/sync` - Synchronize prices
//! - `POST /api/v1/sync/stations` - Synchronize the station catalogue
//! - `POST /api/v1/sync/all` - Stations, then prices
//! - `GET /api/v1/sync/status` - Database connectivity and table counts

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::api::response::{ApiResponse, ApiResult, AppError, ErrorResponse};
use crate::sync::{SyncError, SyncOrchestrator};

/// State for the sync routes
#[derive(Clone)]
pub struct SyncState {
    pub orchestrator: Arc<SyncOrchestrator>,
    pub shutdown: CancellationToken,
}

/// Create sync routes
pub fn sync_routes() -> Router<SyncState> {
    Router::new()
        .route("/", post(sync_prices))
        .route("/stations", post(sync_stations))
        .route("/all", post(sync_all))
        .route("/status", get(sync_status))
}

/// Synchronize prices
///
/// # Response
///
/// - `200 OK` - bare `SyncResult`: `{ inserted, updated, skipped, warnings }`
/// - `503 Service Unavailable` - Upstream unreachable, non-2xx or timed out
/// - `500 Internal Server Error` - Malformed document or persistence failure
#[tracing::instrument(skip(state))]
async fn sync_prices(State(state): State<SyncState>) -> Result<Response, SyncApiError> {
    let result = state
        .orchestrator
        .run_with_cancel(&state.shutdown.child_token())
        .await?;

    Ok((StatusCode::OK, Json(result)).into_response())
}

/// Synchronize the station catalogue
#[tracing::instrument(skip(state))]
async fn sync_stations(State(state): State<SyncState>) -> Result<Response, SyncApiError> {
    let result = state
        .orchestrator
        .run_stations(&state.shutdown.child_token())
        .await?;

    Ok((StatusCode::OK, Json(result)).into_response())
}

/// Synchronize stations, then prices
#[tracing::instrument(skip(state))]
async fn sync_all(State(state): State<SyncState>) -> Result<Response, SyncApiError> {
    let result = state
        .orchestrator
        .run_all(&state.shutdown.child_token())
        .await?;

    Ok((StatusCode::OK, Json(result)).into_response())
}

/// Report database connectivity and what the last runs left in the tables
async fn sync_status(State(state): State<SyncState>) -> ApiResult<Response> {
    let counts = state.orchestrator.status().await.map_err(|e| {
        tracing::error!("Sync status check failed: {}", e);
        AppError::ServiceUnavailable("Database is not reachable".to_string())
    })?;

    let config = state.orchestrator.config();
    let data = json!({
        "database": "connected",
        "stations": counts.stations,
        "prices": counts.prices,
        "last_price_id": counts.last_price_id,
        "prices_url": config.prices_url,
        "stations_url": config.stations_url,
    });

    Ok((StatusCode::OK, Json(ApiResponse::success(data))).into_response())
}

/// HTTP rendering of a failed sync run
///
/// Upstream problems answer `503` so operators can tell a transient outage
/// from a local failure, which answers `500`.
#[derive(Debug)]
pub struct SyncApiError(SyncError);

impl From<SyncError> for SyncApiError {
    fn from(err: SyncError) -> Self {
        Self(err)
    }
}

impl SyncApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            SyncError::Fetch(_) | SyncError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            SyncError::Parse(_) | SyncError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self.0 {
            SyncError::Fetch(_) => "UPSTREAM_UNAVAILABLE",
            SyncError::Cancelled => "SYNC_CANCELLED",
            SyncError::Parse(_) => "UPSTREAM_MALFORMED",
            SyncError::Persistence(_) => "PERSISTENCE_FAILED",
        }
    }
}

impl IntoResponse for SyncApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match &self.0 {
            SyncError::Persistence(e) => {
                tracing::error!(code, "Sync failed: {}", e);
                "Synchronized data could not be saved; no changes were kept".to_string()
            },
            other => {
                tracing::error!(code, "Sync failed: {}", other);
                other.to_string()
            },
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
