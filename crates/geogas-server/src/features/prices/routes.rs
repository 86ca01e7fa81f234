//! Price API routes
//!
//! - `GET /api/v1/prices?station_id=&fuel_type=&limit=` - List prices (max 500)
//! - `GET /api/v1/prices/:id` - Get a price by row id
//! - `GET /api/v1/prices/station/:station_id` - Prices of one station
//! - `GET /api/v1/prices/station/:station_id/:fuel_type` - One station's price for a fuel type
//! - `GET /api/v1/prices/fuel-type/:fuel_type` - Prices for one fuel type across stations

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;
use sqlx::PgPool;

use super::queries::{self, GetPriceError, GetPriceQuery, ListPricesError, ListPricesQuery};
use crate::api::response::{ApiResponse, ApiResult, AppError};

/// Create price routes
pub fn prices_routes() -> Router<PgPool> {
    Router::new()
        .route("/", get(list_prices))
        .route("/:id", get(get_price))
        .route("/station/:station_id", get(list_station_prices))
        .route("/station/:station_id/:fuel_type", get(get_station_price))
        .route("/fuel-type/:fuel_type", get(list_fuel_type_prices))
}

#[tracing::instrument(skip(pool))]
async fn list_prices(
    State(pool): State<PgPool>,
    Query(query): Query<ListPricesQuery>,
) -> ApiResult<Response> {
    let items = queries::list::handle(pool, query).await?;
    let meta = json!({ "count": items.len() });

    Ok(ApiResponse::success_with_meta(items, meta).into_response())
}

#[tracing::instrument(skip(pool))]
async fn get_price(State(pool): State<PgPool>, Path(id): Path<i64>) -> ApiResult<Response> {
    let item = queries::get::handle(pool, GetPriceQuery::by_id(id)).await?;
    Ok(ApiResponse::success(item).into_response())
}

#[tracing::instrument(skip(pool))]
async fn list_station_prices(
    State(pool): State<PgPool>,
    Path(station_id): Path<i32>,
) -> ApiResult<Response> {
    let query = ListPricesQuery {
        station_id: Some(station_id),
        ..Default::default()
    };

    let items = queries::list::handle(pool, query).await?;
    if items.is_empty() {
        return Err(AppError::NotFound(format!("No prices found for station {}", station_id)));
    }

    Ok(ApiResponse::success(items).into_response())
}

#[tracing::instrument(skip(pool))]
async fn get_station_price(
    State(pool): State<PgPool>,
    Path((station_id, fuel_type)): Path<(i32, String)>,
) -> ApiResult<Response> {
    let query = GetPriceQuery::by_station_and_fuel(station_id, fuel_type);
    let item = queries::get::handle(pool, query).await?;

    Ok(ApiResponse::success(item).into_response())
}

#[tracing::instrument(skip(pool))]
async fn list_fuel_type_prices(
    State(pool): State<PgPool>,
    Path(fuel_type): Path<String>,
) -> ApiResult<Response> {
    let query = ListPricesQuery {
        fuel_type: Some(fuel_type.clone()),
        ..Default::default()
    };

    let items = queries::list::handle(pool, query).await?;
    if items.is_empty() {
        return Err(AppError::NotFound(format!("No prices found for fuel type '{}'", fuel_type)));
    }

    Ok(ApiResponse::success(items).into_response())
}

impl From<ListPricesError> for AppError {
    fn from(err: ListPricesError) -> Self {
        match err {
            ListPricesError::Database(e) => AppError::Database(e),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl From<GetPriceError> for AppError {
    fn from(err: GetPriceError) -> Self {
        match err {
            GetPriceError::NotFound(msg) => AppError::NotFound(msg),
            GetPriceError::Database(e) => AppError::Database(e),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_prices_routes_build() {
        let _router = prices_routes();
    }

    #[test]
    fn test_query_errors_map_to_http() {
        let not_found: AppError = GetPriceError::NotFound("Price 9 not found".into()).into();
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let bad: AppError = ListPricesError::InvalidLimit.into();
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
