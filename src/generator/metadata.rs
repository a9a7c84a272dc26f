use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::plan::TilePlan;
use super::store::write_atomic;
use crate::{Result, TilesError};

/// File name of the descriptor at the output root
pub const METADATA_FILE: &str = "metadata.json";

/// Descriptor of a generated tile set.
///
/// Describes the requested bounds and zoom range, not the subset of tiles
/// that actually made it to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSetMetadata {
    pub name: String,
    pub description: String,
    /// `[west, south, east, north]`
    pub bounds: [f64; 4],
    #[serde(rename = "minzoom")]
    pub min_zoom: u8,
    #[serde(rename = "maxzoom")]
    pub max_zoom: u8,
    pub format: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    /// Local time, `%Y-%m-%d %H:%M:%S`
    #[serde(rename = "generated")]
    pub generated_at: String,
}

impl TileSetMetadata {
    /// Describe a plan fetched from `source`
    pub fn for_plan(plan: &TilePlan, source: &str, format: &str, area_label: &str) -> Self {
        Self {
            name: format!("Generated tiles ({})", source),
            description: format!("Map tiles for {}", area_label),
            bounds: plan.bounds().to_array(),
            min_zoom: plan.min_zoom(),
            max_zoom: plan.max_zoom(),
            format: format.to_string(),
            kind: "baselayer".to_string(),
            source: source.to_string(),
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Location of the descriptor under `output_dir`
    pub fn path_in(output_dir: &Path) -> PathBuf {
        output_dir.join(METADATA_FILE)
    }

    /// Write the descriptor, replacing any previous one
    pub async fn write_to(&self, output_dir: &Path) -> Result<PathBuf> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| TilesError::Parse(format!("Failed to serialize metadata: {}", e)))?;

        let path = Self::path_in(output_dir);
        write_atomic(&path, &json).await?;
        tracing::info!("Metadata saved to: {}", path.display());
        Ok(path)
    }

    /// Read a previously written descriptor
    pub async fn read_from(output_dir: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(Self::path_in(output_dir)).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| TilesError::Parse(format!("Invalid metadata file: {}", e)))
    }
}
