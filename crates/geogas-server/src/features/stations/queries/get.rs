use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::prices::PriceItem;
use crate::sync::{PersistedPriceRow, PersistedStationRow};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetStationQuery {
    pub place_id: i32,
}

/// Station together with its current prices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetStationResponse {
    #[serde(flatten)]
    pub station: PersistedStationRow,
    pub prices: Vec<PriceItem>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetStationError {
    #[error("Station {0} not found")]
    NotFound(i32),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: GetStationQuery) -> Result<GetStationResponse, GetStationError> {
    let station = sqlx::query_as::<_, PersistedStationRow>(
        "SELECT place_id, name, cre_id, x, y FROM stations WHERE place_id = $1",
    )
    .bind(query.place_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(GetStationError::NotFound(query.place_id))?;

    let prices = sqlx::query_as::<_, PersistedPriceRow>(
        "SELECT id, station_id, fuel_type, price FROM gas_prices WHERE station_id = $1 ORDER BY fuel_type",
    )
    .bind(query.place_id)
    .fetch_all(&pool)
    .await?;

    Ok(GetStationResponse {
        station,
        prices: prices.into_iter().map(PriceItem::from).collect(),
    })
}
