mod builder;
mod region;

pub use builder::*;
pub use region::*;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::MapSource;

/// Highest zoom level accepted for tile generation
pub const MAX_ZOOM: u8 = 22;

/// Configuration for one tile generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Lowest zoom level to fetch (inclusive)
    pub min_zoom: u8,
    /// Highest zoom level to fetch (inclusive)
    pub max_zoom: u8,
    /// Tile provider to fetch from
    pub source: MapSource,
    /// Root directory of the `{z}/{x}/{y}.png` tree
    pub output_dir: PathBuf,
    /// Number of concurrent fetch workers
    pub workers: usize,
    /// Pause after each successful download
    pub delay: Duration,
    /// Buffer around resolved places, in kilometers
    pub buffer_km: f64,
    /// How the buffer is converted into degrees
    pub buffer_mode: BufferMode,
    /// Request timeout (in seconds)
    pub timeout_seconds: u64,
    /// Log progress every this many completed tiles
    pub progress_interval: u64,
    /// API key for providers that require one
    pub api_key: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_zoom: 8,
            max_zoom: 12,
            source: MapSource::Osm,
            output_dir: PathBuf::from("tiles"),
            workers: 3,
            delay: Duration::from_millis(200),
            buffer_km: 20.0,
            buffer_mode: BufferMode::Degrees,
            timeout_seconds: 10,
            progress_interval: 100,
            api_key: None,
        }
    }
}

impl GeneratorConfig {
    /// Create a builder for validated configuration
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::new()
    }

    /// Check the invariants every run relies on
    pub fn validate(&self) -> crate::Result<()> {
        use crate::TilesError;

        if self.min_zoom > self.max_zoom {
            return Err(TilesError::Config(format!(
                "Minimum zoom ({}) must not exceed maximum zoom ({})",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.max_zoom > MAX_ZOOM {
            return Err(TilesError::Config(format!(
                "Maximum zoom ({}) exceeds the supported limit of {}",
                self.max_zoom, MAX_ZOOM
            )));
        }
        if self.workers == 0 {
            return Err(TilesError::Config(
                "At least one worker is required".to_string(),
            ));
        }
        if self.progress_interval == 0 {
            return Err(TilesError::Config(
                "Progress interval must be at least 1".to_string(),
            ));
        }
        if !self.buffer_km.is_finite() || self.buffer_km < 0.0 {
            return Err(TilesError::Config(format!(
                "Buffer must be a non-negative distance, got {} km",
                self.buffer_km
            )));
        }
        Ok(())
    }
}
