//! Station API routes
//!
//! - `GET /api/v1/stations?name_contains=&limit=` - List stations (max 500)
//! - `GET /api/v1/stations/:place_id` - One station with its current prices

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;
use sqlx::PgPool;

use super::queries::{self, GetStationError, GetStationQuery, ListStationsError, ListStationsQuery};
use crate::api::response::{ApiResponse, ApiResult, AppError};

/// Create station routes
pub fn stations_routes() -> Router<PgPool> {
    Router::new()
        .route("/", get(list_stations))
        .route("/:place_id", get(get_station))
}

#[tracing::instrument(skip(pool))]
async fn list_stations(
    State(pool): State<PgPool>,
    Query(query): Query<ListStationsQuery>,
) -> ApiResult<Response> {
    let stations = queries::list::handle(pool, query).await?;
    let meta = json!({ "count": stations.len() });

    Ok(ApiResponse::success_with_meta(stations, meta).into_response())
}

#[tracing::instrument(skip(pool))]
async fn get_station(State(pool): State<PgPool>, Path(place_id): Path<i32>) -> ApiResult<Response> {
    let station = queries::get::handle(pool, GetStationQuery { place_id }).await?;
    Ok(ApiResponse::success(station).into_response())
}

impl From<ListStationsError> for AppError {
    fn from(err: ListStationsError) -> Self {
        match err {
            ListStationsError::InvalidLimit => AppError::BadRequest(err.to_string()),
            ListStationsError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<GetStationError> for AppError {
    fn from(err: GetStationError) -> Self {
        match err {
            GetStationError::NotFound(_) => AppError::NotFound(err.to_string()),
            GetStationError::Database(e) => AppError::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_station_not_found_maps_to_404() {
        let err: AppError = GetStationError::NotFound(12).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
