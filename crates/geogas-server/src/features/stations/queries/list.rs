use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::prices::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use crate::sync::PersistedStationRow;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListStationsQuery {
    /// Case-insensitive substring of the station name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_contains: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListStationsError {
    #[error("Limit must be between 1 and 500")]
    InvalidLimit,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ListStationsQuery {
    pub fn validate(&self) -> Result<(), ListStationsError> {
        if let Some(limit) = self.limit {
            if !(1..=MAX_LIST_LIMIT).contains(&limit) {
                return Err(ListStationsError::InvalidLimit);
            }
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: ListStationsQuery,
) -> Result<Vec<PersistedStationRow>, ListStationsError> {
    query.validate()?;

    let name_pattern = query
        .name_contains
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.to_lowercase()));

    let stations = sqlx::query_as::<_, PersistedStationRow>(
        r#"
        SELECT place_id, name, cre_id, x, y
        FROM stations
        WHERE ($1::TEXT IS NULL OR LOWER(name) LIKE $1)
        ORDER BY place_id
        LIMIT $2
        "#,
    )
    .bind(name_pattern)
    .bind(query.limit.unwrap_or(DEFAULT_LIST_LIMIT))
    .fetch_all(&pool)
    .await?;

    Ok(stations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_limit() {
        assert!(ListStationsQuery::default().validate().is_ok());
        let query = ListStationsQuery {
            limit: Some(501),
            ..Default::default()
        };
        assert!(matches!(query.validate(), Err(ListStationsError::InvalidLimit)));
    }
}
