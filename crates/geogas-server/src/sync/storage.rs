// Sync persistence layer

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use super::models::{PersistedPriceRow, PersistedStationRow, PriceSnapshot, StoreCounts};
use super::reconcile::{PricePlan, StationPlan};
use super::StoreError;

/// Rows per multi-row INSERT; keeps bind parameters well below the Postgres limit
pub const DEFAULT_INSERT_CHUNK_SIZE: usize = 1000;

/// Persistence seen by the sync orchestrator
///
/// `apply_*` methods must be atomic: either the whole plan is committed or
/// nothing is.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Known station ids plus every stored price row
    async fn load_price_snapshot(&self) -> Result<PriceSnapshot, StoreError>;

    async fn apply_price_plan(&self, plan: &PricePlan) -> Result<(), StoreError>;

    async fn load_stations(&self) -> Result<Vec<PersistedStationRow>, StoreError>;

    async fn apply_station_plan(&self, plan: &StationPlan) -> Result<(), StoreError>;

    async fn counts(&self) -> Result<StoreCounts, StoreError>;
}

/// PostgreSQL implementation of [`SyncStore`]
///
/// Relies on the `gas_prices_station_fuel_key` unique index over
/// `(station_id, LOWER(fuel_type))`: when two runs race to insert the same key
/// the loser's transaction fails with [`StoreError::Conflict`] and is rolled back.
#[derive(Debug, Clone)]
pub struct PgSyncStore {
    db: PgPool,
    chunk_size: usize,
}

impl PgSyncStore {
    pub fn new(db: PgPool) -> Self {
        Self::with_chunk_size(db, DEFAULT_INSERT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(db: PgPool, chunk_size: usize) -> Self {
        Self {
            db,
            chunk_size: chunk_size.max(1),
        }
    }
}

#[async_trait]
impl SyncStore for PgSyncStore {
    async fn load_price_snapshot(&self) -> Result<PriceSnapshot, StoreError> {
        let mut tx = self.db.begin().await.map_err(StoreError::from_sqlx)?;

        // Both reads must see the same state
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;

        let station_ids: Vec<i32> = sqlx::query_scalar("SELECT place_id FROM stations")
            .fetch_all(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;

        let prices = sqlx::query_as::<_, PersistedPriceRow>(
            "SELECT id, station_id, fuel_type, price FROM gas_prices ORDER BY id",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        tx.commit().await.map_err(StoreError::from_sqlx)?;

        debug!(
            stations = station_ids.len(),
            prices = prices.len(),
            "Loaded price snapshot"
        );

        Ok(PriceSnapshot {
            station_ids: station_ids.into_iter().collect(),
            prices,
        })
    }

    async fn apply_price_plan(&self, plan: &PricePlan) -> Result<(), StoreError> {
        if plan.is_empty() {
            return Ok(());
        }

        let mut tx = self.db.begin().await.map_err(StoreError::from_sqlx)?;

        for chunk in plan.inserts.chunks(self.chunk_size) {
            let mut query_builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO gas_prices (station_id, fuel_type, price) ");

            query_builder.push_values(chunk, |mut b, record| {
                b.push_bind(record.station_id)
                    .push_bind(&record.fuel_type)
                    .push_bind(record.price);
            });

            query_builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from_sqlx)?;
        }

        if !plan.updates.is_empty() {
            let (ids, prices): (Vec<i64>, Vec<i64>) = plan.updates.iter().copied().unzip();

            sqlx::query(
                r#"
                UPDATE gas_prices AS p
                SET price = u.price, updated_at = NOW()
                FROM UNNEST($1::BIGINT[], $2::BIGINT[]) AS u(id, price)
                WHERE p.id = u.id
                "#,
            )
            .bind(ids)
            .bind(prices)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;
        }

        tx.commit().await.map_err(StoreError::from_sqlx)?;

        info!(
            inserted = plan.inserts.len(),
            updated = plan.updates.len(),
            "Committed price plan"
        );

        Ok(())
    }

    async fn load_stations(&self) -> Result<Vec<PersistedStationRow>, StoreError> {
        sqlx::query_as::<_, PersistedStationRow>(
            "SELECT place_id, name, cre_id, x, y FROM stations ORDER BY place_id",
        )
        .fetch_all(&self.db)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn apply_station_plan(&self, plan: &StationPlan) -> Result<(), StoreError> {
        if plan.is_empty() {
            return Ok(());
        }

        let mut tx = self.db.begin().await.map_err(StoreError::from_sqlx)?;

        for chunk in plan.inserts.chunks(self.chunk_size) {
            let mut query_builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO stations (place_id, name, cre_id, x, y) ");

            query_builder.push_values(chunk, |mut b, station| {
                b.push_bind(station.place_id)
                    .push_bind(&station.name)
                    .push_bind(&station.cre_id)
                    .push_bind(station.x)
                    .push_bind(station.y);
            });

            query_builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from_sqlx)?;
        }

        if !plan.updates.is_empty() {
            let mut ids = Vec::with_capacity(plan.updates.len());
            let mut names = Vec::with_capacity(plan.updates.len());
            let mut cre_ids = Vec::with_capacity(plan.updates.len());
            let mut xs = Vec::with_capacity(plan.updates.len());
            let mut ys = Vec::with_capacity(plan.updates.len());
            for station in &plan.updates {
                ids.push(station.place_id);
                names.push(station.name.clone());
                cre_ids.push(station.cre_id.clone());
                xs.push(station.x);
                ys.push(station.y);
            }

            sqlx::query(
                r#"
                UPDATE stations AS s
                SET name = u.name, cre_id = u.cre_id, x = u.x, y = u.y, updated_at = NOW()
                FROM UNNEST($1::INT[], $2::TEXT[], $3::TEXT[], $4::FLOAT8[], $5::FLOAT8[])
                    AS u(place_id, name, cre_id, x, y)
                WHERE s.place_id = u.place_id
                "#,
            )
            .bind(ids)
            .bind(names)
            .bind(cre_ids)
            .bind(xs)
            .bind(ys)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;
        }

        tx.commit().await.map_err(StoreError::from_sqlx)?;

        info!(
            inserted = plan.inserts.len(),
            updated = plan.updates.len(),
            "Committed station plan"
        );

        Ok(())
    }

    async fn counts(&self) -> Result<StoreCounts, StoreError> {
        let (stations, prices, last_price_id): (i64, i64, Option<i64>) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM stations),
                (SELECT COUNT(*) FROM gas_prices),
                (SELECT MAX(id) FROM gas_prices)
            "#,
        )
        .fetch_one(&self.db)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(StoreCounts {
            stations,
            prices,
            last_price_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_chunk_size_never_zero() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/geogas")
            .unwrap();
        let store = PgSyncStore::with_chunk_size(pool, 0);
        assert_eq!(store.chunk_size, 1);
    }
}
