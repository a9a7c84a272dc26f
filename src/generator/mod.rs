mod coords;
mod metadata;
mod pipeline;
mod plan;
mod store;

mod integration_tests;

pub use coords::*;
pub use metadata::*;
pub use pipeline::*;
pub use plan::*;
pub use store::*;

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{GeneratorConfig, GeoBoundingBox, ResolvedArea, Result, TileSource};

/// Outcome of one generation run
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub summary: FetchSummary,
    /// Where the descriptor was written, if writing it succeeded
    pub metadata_path: Option<PathBuf>,
}

/// Plans, fetches and describes a tile set for one area
pub struct TileGenerator {
    config: GeneratorConfig,
    source: Arc<dyn TileSource>,
    cancel: CancellationToken,
}

impl TileGenerator {
    /// Create a generator; the configuration is validated up front
    pub fn new(config: GeneratorConfig, source: Arc<dyn TileSource>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            cancel: CancellationToken::new(),
        })
    }

    /// Stop the run early when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Tile plan for `bounds` over the configured zoom range
    pub fn plan(&self, bounds: &GeoBoundingBox) -> Result<TilePlan> {
        TilePlan::build(bounds, self.config.min_zoom, self.config.max_zoom)
    }

    /// Resolve-to-disk in one call: plan the area, fetch it, write metadata
    pub async fn generate(&self, area: &ResolvedArea) -> Result<GenerationReport> {
        let plan = self.plan(&area.bounds)?;
        self.run(&plan, &area.label).await
    }

    /// Fetch a previously built plan and write the descriptor
    pub async fn run(&self, plan: &TilePlan, area_label: &str) -> Result<GenerationReport> {
        let bounds = plan.bounds();
        tracing::info!(
            "Generating tiles for bounds: N:{}, S:{}, E:{}, W:{}",
            bounds.north(),
            bounds.south(),
            bounds.east(),
            bounds.west()
        );
        tracing::info!("Zoom levels: {} to {}", plan.min_zoom(), plan.max_zoom());
        tracing::info!("Source: {}", self.source.source_id());
        plan.log_summary();

        if plan.is_empty() {
            tracing::warn!("No tiles to download. Check your coordinates.");
            return Ok(GenerationReport {
                summary: FetchSummary::default(),
                metadata_path: None,
            });
        }

        let output_dir = &self.config.output_dir;
        tokio::fs::create_dir_all(output_dir).await?;

        let store = TileStore::new(output_dir, self.source.format());
        let pipeline = FetchPipeline::new(
            Arc::clone(&self.source),
            store,
            PipelineOptions::from(&self.config),
        )
        .with_cancellation(self.cancel.clone());

        let summary = pipeline.run(plan).await;

        let metadata = TileSetMetadata::for_plan(
            plan,
            self.source.source_id(),
            self.source.format(),
            area_label,
        );
        let metadata_path = match metadata.write_to(output_dir).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Failed to write metadata: {}", e);
                None
            }
        };

        Ok(GenerationReport {
            summary,
            metadata_path,
        })
    }
}
