use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::prices::types::PriceItem;
use crate::sync::PersistedPriceRow;

pub const DEFAULT_LIST_LIMIT: i64 = 500;
pub const MAX_LIST_LIMIT: i64 = 500;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPricesQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_id: Option<i32>,
    /// Matched case-insensitively
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListPricesError {
    #[error("Limit must be between 1 and 500")]
    InvalidLimit,
    #[error("Station id must be a positive integer")]
    InvalidStationId,
    #[error("Fuel type cannot be empty")]
    EmptyFuelType,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ListPricesQuery {
    pub fn validate(&self) -> Result<(), ListPricesError> {
        if let Some(limit) = self.limit {
            if !(1..=MAX_LIST_LIMIT).contains(&limit) {
                return Err(ListPricesError::InvalidLimit);
            }
        }
        if self.station_id.is_some_and(|id| id <= 0) {
            return Err(ListPricesError::InvalidStationId);
        }
        if self.fuel_type.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ListPricesError::EmptyFuelType);
        }
        Ok(())
    }

    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT)
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: ListPricesQuery) -> Result<Vec<PriceItem>, ListPricesError> {
    query.validate()?;

    let fuel_type = query.fuel_type.as_deref().map(str::trim);

    let rows = sqlx::query_as::<_, PersistedPriceRow>(
        r#"
        SELECT id, station_id, fuel_type, price
        FROM gas_prices
        WHERE ($1::INTEGER IS NULL OR station_id = $1)
          AND ($2::TEXT IS NULL OR LOWER(fuel_type) = LOWER($2))
        ORDER BY id
        LIMIT $3
        "#,
    )
    .bind(query.station_id)
    .bind(fuel_type)
    .bind(query.limit())
    .fetch_all(&pool)
    .await?;

    Ok(rows.into_iter().map(PriceItem::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_is_valid() {
        let query = ListPricesQuery::default();
        assert!(query.validate().is_ok());
        assert_eq!(query.limit(), DEFAULT_LIST_LIMIT);
    }

    #[test]
    fn test_limit_bounds() {
        for limit in [0, -1, MAX_LIST_LIMIT + 1] {
            let query = ListPricesQuery {
                limit: Some(limit),
                ..Default::default()
            };
            assert!(matches!(query.validate(), Err(ListPricesError::InvalidLimit)));
        }
    }

    #[test]
    fn test_rejects_non_positive_station_and_blank_fuel_type() {
        let query = ListPricesQuery {
            station_id: Some(0),
            ..Default::default()
        };
        assert!(matches!(query.validate(), Err(ListPricesError::InvalidStationId)));

        let query = ListPricesQuery {
            fuel_type: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.validate(), Err(ListPricesError::EmptyFuelType)));
    }
}
