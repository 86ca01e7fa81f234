use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::prices::types::PriceItem;
use crate::sync::PersistedPriceRow;

/// Look up one price, either by row id or by (station, fuel type)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetPriceQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetPriceError {
    #[error("Either id or station_id with fuel_type must be provided")]
    MissingIdentifier,
    #[error("{0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl GetPriceQuery {
    pub fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn by_station_and_fuel(station_id: i32, fuel_type: impl Into<String>) -> Self {
        Self {
            station_id: Some(station_id),
            fuel_type: Some(fuel_type.into()),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), GetPriceError> {
        let by_key = self.station_id.is_some()
            && self.fuel_type.as_deref().is_some_and(|t| !t.trim().is_empty());
        if self.id.is_none() && !by_key {
            return Err(GetPriceError::MissingIdentifier);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: GetPriceQuery) -> Result<PriceItem, GetPriceError> {
    query.validate()?;

    let row = match (query.id, query.station_id, query.fuel_type.as_deref()) {
        (Some(id), _, _) => sqlx::query_as::<_, PersistedPriceRow>(
            "SELECT id, station_id, fuel_type, price FROM gas_prices WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| GetPriceError::NotFound(format!("Price {} not found", id)))?,
        (None, Some(station_id), Some(fuel_type)) => sqlx::query_as::<_, PersistedPriceRow>(
            r#"
            SELECT id, station_id, fuel_type, price
            FROM gas_prices
            WHERE station_id = $1 AND LOWER(fuel_type) = LOWER($2)
            "#,
        )
        .bind(station_id)
        .bind(fuel_type.trim())
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| {
            GetPriceError::NotFound(format!(
                "No {} price found for station {}",
                fuel_type.trim(),
                station_id
            ))
        })?,
        _ => return Err(GetPriceError::MissingIdentifier),
    };

    Ok(row.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_requires_an_identifier() {
        assert!(GetPriceQuery::by_id(1).validate().is_ok());
        assert!(GetPriceQuery::by_station_and_fuel(5, "regular").validate().is_ok());
        assert!(matches!(
            GetPriceQuery::default().validate(),
            Err(GetPriceError::MissingIdentifier)
        ));
        assert!(matches!(
            GetPriceQuery::by_station_and_fuel(5, " ").validate(),
            Err(GetPriceError::MissingIdentifier)
        ));
    }
}
