// Sync run orchestration

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::models::{FullSyncResult, RawDocument, StoreCounts, SyncResult};
use super::parser::{parse_prices, parse_stations};
use super::reconcile::{reconcile_prices, reconcile_stations};
use super::{DocumentSource, StoreError, SyncConfig, SyncError, SyncOutcome, SyncStore};

/// Drives one sync run: fetch, parse, snapshot, reconcile, commit
///
/// Cancellation is honored up to the point the commit starts. The commit runs
/// on its own task, so dropping the caller's future mid-commit does not abort it.
#[derive(Clone)]
pub struct SyncOrchestrator {
    source: Arc<dyn DocumentSource>,
    store: Arc<dyn SyncStore>,
    config: SyncConfig,
}

impl SyncOrchestrator {
    pub fn new(source: Arc<dyn DocumentSource>, store: Arc<dyn SyncStore>, config: SyncConfig) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Synchronize prices
    pub async fn run(&self) -> SyncOutcome<SyncResult> {
        self.run_with_cancel(&CancellationToken::new()).await
    }

    #[tracing::instrument(skip(self, cancel), fields(url = %self.config.prices_url))]
    pub async fn run_with_cancel(&self, cancel: &CancellationToken) -> SyncOutcome<SyncResult> {
        let started = Instant::now();

        let document = self.fetch(&self.config.prices_url, cancel).await?;
        let parsed = parse_prices(&document)?;

        if parsed.records.is_empty() {
            info!(warnings = parsed.warnings.len(), "Prices document published nothing");
            return Ok(SyncResult {
                warnings: parsed.warnings,
                ..SyncResult::default()
            });
        }

        let snapshot = guard(cancel, self.store.load_price_snapshot()).await??;
        let plan = reconcile_prices(&parsed.records, &snapshot);

        if !plan.orphans.is_empty() {
            warn!(
                orphans = plan.orphans.len(),
                "Prices reference stations not stored yet; deferring them"
            );
        }

        let result = SyncResult {
            inserted: plan.inserts.len(),
            updated: plan.updates.len(),
            skipped: plan.skipped(),
            warnings: parsed.warnings,
        };

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        if !plan.is_empty() {
            let store = Arc::clone(&self.store);
            detach(async move { store.apply_price_plan(&plan).await }).await?;
        }

        info!(
            inserted = result.inserted,
            updated = result.updated,
            skipped = result.skipped,
            warnings = result.warnings.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Price sync completed"
        );

        Ok(result)
    }

    /// Synchronize the station catalogue
    #[tracing::instrument(skip(self, cancel), fields(url = %self.config.stations_url))]
    pub async fn run_stations(&self, cancel: &CancellationToken) -> SyncOutcome<SyncResult> {
        let started = Instant::now();

        let document = self.fetch(&self.config.stations_url, cancel).await?;
        let parsed = parse_stations(&document)?;

        if parsed.records.is_empty() {
            info!(warnings = parsed.warnings.len(), "Stations document published nothing");
            return Ok(SyncResult {
                warnings: parsed.warnings,
                ..SyncResult::default()
            });
        }

        let current = guard(cancel, self.store.load_stations()).await??;
        let plan = reconcile_stations(&parsed.records, &current);

        let result = SyncResult {
            inserted: plan.inserts.len(),
            updated: plan.updates.len(),
            skipped: plan.duplicates,
            warnings: parsed.warnings,
        };

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        if !plan.is_empty() {
            let store = Arc::clone(&self.store);
            detach(async move { store.apply_station_plan(&plan).await }).await?;
        }

        info!(
            inserted = result.inserted,
            updated = result.updated,
            skipped = result.skipped,
            duration_ms = started.elapsed().as_millis() as u64,
            "Station sync completed"
        );

        Ok(result)
    }

    /// Stations first so that prices for newly published stations are not deferred
    pub async fn run_all(&self, cancel: &CancellationToken) -> SyncOutcome<FullSyncResult> {
        let stations = self.run_stations(cancel).await?;
        let prices = self.run_with_cancel(cancel).await?;

        Ok(FullSyncResult { stations, prices })
    }

    pub async fn status(&self) -> Result<StoreCounts, StoreError> {
        self.store.counts().await
    }

    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> SyncOutcome<RawDocument> {
        Ok(guard(cancel, self.source.fetch(url)).await??)
    }
}

/// Race `fut` against cancellation
async fn guard<F: Future>(cancel: &CancellationToken, fut: F) -> SyncOutcome<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SyncError::Cancelled),
        output = fut => Ok(output),
    }
}

/// Run a commit on its own task so it completes even if the caller goes away
async fn detach<F>(commit: F) -> Result<(), StoreError>
where
    F: Future<Output = Result<(), StoreError>> + Send + 'static,
{
    tokio::spawn(commit)
        .await
        .map_err(|e| StoreError::Interrupted(e.to_string()))?
}
