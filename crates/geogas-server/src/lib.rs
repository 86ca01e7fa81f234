//! GeoGas Server Library
//!
//! HTTP server keeping a local copy of the fuel regulator's published gas
//! stations and fuel prices.
//!
//! # Overview
//!
//! - **sync**: pulls the upstream XML documents and upserts them into
//!   PostgreSQL, one transaction per run
//! - **features**: HTTP slices for triggering syncs and reading prices and stations
//! - **config**: environment-based configuration
//! - **middleware**: CORS and request tracing
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use geogas_server::sync::{DocumentFetcher, PgSyncStore, SyncConfig, SyncOrchestrator};
//!
//! # async fn run(pool: sqlx::PgPool) -> anyhow::Result<()> {
//! let config = SyncConfig::from_env();
//! let fetcher = DocumentFetcher::from_config(&config)?;
//! let orchestrator = SyncOrchestrator::new(
//!     Arc::new(fetcher),
//!     Arc::new(PgSyncStore::new(pool)),
//!     config,
//! );
//!
//! let result = orchestrator.run().await?;
//! println!("inserted {} updated {}", result.inserted, result.updated);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod api;
pub mod config;
pub mod db;
pub mod features;
pub mod middleware;
pub mod sync;

// Re-export commonly used types
pub use api::response::{ApiResult, AppError};
pub use sync::{SyncError, SyncOrchestrator, SyncResult};
