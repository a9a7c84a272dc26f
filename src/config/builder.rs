use std::path::PathBuf;
use std::time::Duration;

use super::{BufferMode, GeneratorConfig};
use crate::{MapSource, Result};

/// Builder for creating generator configurations with a fluent API
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfigBuilder {
    min_zoom: Option<u8>,
    max_zoom: Option<u8>,
    source: Option<MapSource>,
    output_dir: Option<PathBuf>,
    workers: Option<usize>,
    delay: Option<Duration>,
    buffer_km: Option<f64>,
    buffer_mode: Option<BufferMode>,
    timeout_seconds: Option<u64>,
    progress_interval: Option<u64>,
    api_key: Option<String>,
}

impl GeneratorConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inclusive zoom range
    pub fn zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = Some(min_zoom);
        self.max_zoom = Some(max_zoom);
        self
    }

    pub fn min_zoom(mut self, zoom: u8) -> Self {
        self.min_zoom = Some(zoom);
        self
    }

    pub fn max_zoom(mut self, zoom: u8) -> Self {
        self.max_zoom = Some(zoom);
        self
    }

    /// Set the tile provider
    pub fn source(mut self, source: MapSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the output root directory
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set the number of concurrent fetch workers
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Set the pause after each successful download
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the buffer around resolved places, in kilometers
    pub fn buffer_km(mut self, buffer_km: f64) -> Self {
        self.buffer_km = Some(buffer_km);
        self
    }

    pub fn buffer_mode(mut self, mode: BufferMode) -> Self {
        self.buffer_mode = Some(mode);
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    pub fn progress_interval(mut self, every: u64) -> Self {
        self.progress_interval = Some(every);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Build and validate the final configuration
    pub fn build(self) -> Result<GeneratorConfig> {
        let defaults = GeneratorConfig::default();
        let config = GeneratorConfig {
            min_zoom: self.min_zoom.unwrap_or(defaults.min_zoom),
            max_zoom: self.max_zoom.unwrap_or(defaults.max_zoom),
            source: self.source.unwrap_or(defaults.source),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            workers: self.workers.unwrap_or(defaults.workers),
            delay: self.delay.unwrap_or(defaults.delay),
            buffer_km: self.buffer_km.unwrap_or(defaults.buffer_km),
            buffer_mode: self.buffer_mode.unwrap_or(defaults.buffer_mode),
            timeout_seconds: self.timeout_seconds.unwrap_or(defaults.timeout_seconds),
            progress_interval: self.progress_interval.unwrap_or(defaults.progress_interval),
            api_key: self.api_key.or(defaults.api_key),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Convenience methods for common configurations
impl GeneratorConfigBuilder {
    /// Low zoom overview suitable for a quick first pass
    pub fn overview(self) -> Self {
        self.zoom_range(6, 10)
    }

    /// Street-level detail for a single town
    pub fn street_level(self) -> Self {
        self.zoom_range(12, 16)
    }
}
