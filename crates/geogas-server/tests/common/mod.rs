//! Common test utilities for GeoGas server integration tests using testcontainers
//!
//! Each test gets its own PostgreSQL container with migrations applied.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::TestPostgres;
//!
//! #[tokio::test]
//! #[ignore = "requires Docker"]
//! async fn test_with_postgres() {
//!     let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
//!     sqlx::query("SELECT 1").execute(pg.pool()).await.expect("Query failed");
//! }
//! ```

#![allow(dead_code)]

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tracing::{debug, info};

/// PostgreSQL test container wrapper
///
/// Dropping it stops the container.
pub struct TestPostgres {
    _container: ContainerAsync<Postgres>,
    pool: PgPool,
    connection_string: String,
}

impl TestPostgres {
    /// Start a new PostgreSQL container with migrations applied
    pub async fn start() -> Result<Self> {
        Self::start_with_options(PostgresOptions::default()).await
    }

    pub async fn start_with_options(options: PostgresOptions) -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .with_tag(options.version.as_str())
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let connection_string =
            format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

        debug!("PostgreSQL connection: {}", connection_string);

        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(Duration::from_secs(options.acquire_timeout_secs))
            .connect(&connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        if options.run_migrations {
            geogas_server::db::migrate(&pool)
                .await
                .context("Failed to run migrations")?;
        }

        Ok(Self {
            _container: container,
            pool,
            connection_string,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn pool_clone(&self) -> PgPool {
        self.pool.clone()
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

/// Configuration options for PostgreSQL test container
pub struct PostgresOptions {
    /// PostgreSQL version/tag (default: "16-alpine")
    pub version: String,
    /// Maximum number of connections in the pool (default: 5)
    pub max_connections: u32,
    /// Connection acquire timeout in seconds (default: 30)
    pub acquire_timeout_secs: u64,
    /// Whether to run migrations on startup (default: true)
    pub run_migrations: bool,
}

impl Default for PostgresOptions {
    fn default() -> Self {
        Self {
            version: "16-alpine".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 30,
            run_migrations: true,
        }
    }
}

/// Insert a station row directly, bypassing the station sync
pub async fn seed_station(pool: &PgPool, place_id: i32) -> Result<()> {
    sqlx::query("INSERT INTO stations (place_id, name, cre_id, x, y) VALUES ($1, $2, $3, 0, 0)")
        .bind(place_id)
        .bind(format!("Station {}", place_id))
        .bind(format!("PL/{}/EXP/ES/2015", place_id))
        .execute(pool)
        .await
        .context("Failed to seed station")?;
    Ok(())
}

/// Prices document with one `place` element
pub fn prices_xml(station_id: i32, prices: &[(&str, &str)]) -> String {
    let mut xml = format!(r#"<?xml version="1.0" encoding="utf-8"?><places><place place_id="{}">"#, station_id);
    for (fuel_type, value) in prices {
        xml.push_str(&format!(r#"<gas_price type="{}">{}</gas_price>"#, fuel_type, value));
    }
    xml.push_str("</place></places>");
    xml
}
