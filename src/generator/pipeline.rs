//! Bounded worker pool that turns a [`TilePlan`] into files on disk.
//!
//! A producer task feeds keys into a bounded queue, `workers` tasks pull
//! from it, and results flow back over a channel to a single collector that
//! owns the counters. Keys are generated lazily, so memory stays flat no
//! matter how large the plan is.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::coords::TileKey;
use super::plan::TilePlan;
use super::store::TileStore;
use crate::{GeneratorConfig, TileSource};

/// What happened to one planned tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FetchOutcome {
    /// A finished file was already on disk; no request was made
    Cached,
    /// The tile was fetched and written
    Downloaded,
    /// Fetching or writing failed; the tile stays absent
    Failed(String),
}

/// Result of processing one tile key
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub key: TileKey,
    pub outcome: FetchOutcome,
    pub path: Option<PathBuf>,
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, FetchOutcome::Failed(_))
    }
}

/// Aggregate counts for a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    /// Keys in the plan
    pub total: u64,
    pub cached: u64,
    pub downloaded: u64,
    pub failed: u64,
    /// The run was cancelled before every key was attempted
    pub cancelled: bool,
}

impl FetchSummary {
    fn new(total: u64) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    fn record(&mut self, result: &FetchResult) {
        match result.outcome {
            FetchOutcome::Cached => self.cached += 1,
            FetchOutcome::Downloaded => self.downloaded += 1,
            FetchOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Tiles present on disk after the run
    pub fn succeeded(&self) -> u64 {
        self.cached + self.downloaded
    }

    /// Tiles that produced a result
    pub fn completed(&self) -> u64 {
        self.succeeded() + self.failed
    }

    /// Tiles never handed to a worker because the run was cancelled
    pub fn not_attempted(&self) -> u64 {
        self.total.saturating_sub(self.completed())
    }
}

/// Tuning knobs for the worker pool
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Number of concurrent workers
    pub workers: usize,
    /// Pause after each successful download
    pub delay: Duration,
    /// Log progress every this many completed tiles
    pub progress_interval: u64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers: 3,
            delay: Duration::from_millis(200),
            progress_interval: 100,
        }
    }
}

impl From<&GeneratorConfig> for PipelineOptions {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            workers: config.workers,
            delay: config.delay,
            progress_interval: config.progress_interval,
        }
    }
}

impl PipelineOptions {
    fn queue_capacity(&self) -> usize {
        self.workers.max(1) * 2
    }
}

/// Fetches every key of a plan into a [`TileStore`]
pub struct FetchPipeline {
    source: Arc<dyn TileSource>,
    store: TileStore,
    options: PipelineOptions,
    cancel: CancellationToken,
}

impl FetchPipeline {
    pub fn new(source: Arc<dyn TileSource>, store: TileStore, options: PipelineOptions) -> Self {
        Self {
            source,
            store,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token to stop the run early
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn store(&self) -> &TileStore {
        &self.store
    }

    /// Process every key of the plan and return the aggregate counts
    pub async fn run(&self, plan: &TilePlan) -> FetchSummary {
        self.run_with(plan, |_| {}).await
    }

    /// Like [`run`](Self::run), also handing each result to `on_result` in
    /// completion order
    pub async fn run_with<F>(&self, plan: &TilePlan, mut on_result: F) -> FetchSummary
    where
        F: FnMut(&FetchResult),
    {
        let mut summary = FetchSummary::new(plan.len());
        if summary.total == 0 {
            return summary;
        }

        let capacity = self.options.queue_capacity();
        let (key_tx, key_rx) = mpsc::channel::<TileKey>(capacity);
        let (result_tx, mut result_rx) = mpsc::channel::<FetchResult>(capacity);
        let key_rx = Arc::new(Mutex::new(key_rx));

        let producer = {
            let cancel = self.cancel.clone();
            let keys = plan.keys();
            tokio::spawn(async move {
                for key in keys {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        sent = key_tx.send(key) => {
                            if sent.is_err() {
                                break;
                            }
                        }
                    }
                }
            })
        };

        let mut workers = JoinSet::new();
        for worker_id in 0..self.options.workers.max(1) {
            let worker = Worker {
                id: worker_id,
                source: Arc::clone(&self.source),
                store: self.store.clone(),
                delay: self.options.delay,
                cancel: self.cancel.clone(),
            };
            workers.spawn(worker.run(Arc::clone(&key_rx), result_tx.clone()));
        }
        drop(key_rx);
        drop(result_tx);

        while let Some(result) = result_rx.recv().await {
            summary.record(&result);
            on_result(&result);

            let completed = summary.completed();
            if completed % self.options.progress_interval.max(1) == 0 {
                tracing::info!(
                    "Processed {}/{} tiles ({} fetched, {} cached, {} failed)",
                    completed,
                    summary.total,
                    summary.downloaded,
                    summary.cached,
                    summary.failed
                );
            }
        }

        if let Err(e) = producer.await {
            tracing::warn!("Tile producer task ended abnormally: {}", e);
        }
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("Fetch worker ended abnormally: {}", e);
            }
        }

        summary.cancelled = self.cancel.is_cancelled() && summary.not_attempted() > 0;
        if summary.cancelled {
            tracing::warn!(
                "Run cancelled: {} tiles were not attempted",
                summary.not_attempted()
            );
        }
        tracing::info!(
            "Completed! Fetched {}/{} tiles",
            summary.succeeded(),
            summary.total
        );
        if summary.failed > 0 {
            tracing::warn!(
                "{} tiles failed; re-run to fetch the missing tiles",
                summary.failed
            );
        }

        summary
    }
}

struct Worker {
    id: usize,
    source: Arc<dyn TileSource>,
    store: TileStore,
    delay: Duration,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(
        self,
        keys: Arc<Mutex<mpsc::Receiver<TileKey>>>,
        results: mpsc::Sender<FetchResult>,
    ) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let next = {
                let mut keys = keys.lock().await;
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => None,
                    key = keys.recv() => key,
                }
            };
            let Some(key) = next else {
                break;
            };

            let result = self.process(key).await;
            if results.send(result).await.is_err() {
                break;
            }
        }
        tracing::debug!("Fetch worker {} finished", self.id);
    }

    async fn process(&self, key: TileKey) -> FetchResult {
        let path = self.store.tile_path(key);
        if self.store.contains(key).await {
            return FetchResult {
                key,
                outcome: FetchOutcome::Cached,
                path: Some(path),
            };
        }

        let written = match self.source.fetch_tile(key).await {
            Ok(bytes) => self.store.write(key, &bytes).await,
            Err(e) => Err(e),
        };

        match written {
            Ok(path) => {
                self.pause().await;
                FetchResult {
                    key,
                    outcome: FetchOutcome::Downloaded,
                    path: Some(path),
                }
            }
            Err(e) => {
                tracing::warn!("Error downloading tile {}: {}", key, e);
                FetchResult {
                    key,
                    outcome: FetchOutcome::Failed(e.to_string()),
                    path: None,
                }
            }
        }
    }

    /// Cooperative rate limit after a successful download
    async fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(self.delay) => {}
        }
    }
}
