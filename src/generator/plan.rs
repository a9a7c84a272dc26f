use serde::Serialize;

use super::coords::{TileKey, to_lat_lon, to_tile_index};
use crate::{GeoBoundingBox, Result, TilesError};

/// Average size of one tile on disk, used for storage estimates
pub const ESTIMATED_TILE_KB: u64 = 15;

/// Inclusive tile index ranges covered at one zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZoomRange {
    pub zoom: u8,
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl ZoomRange {
    /// Number of tiles in this range
    pub fn tile_count(&self) -> u64 {
        u64::from(self.x_max - self.x_min + 1) * u64::from(self.y_max - self.y_min + 1)
    }

    /// Every key in the range, column by column
    pub fn keys(self) -> impl Iterator<Item = TileKey> + Send + use<> {
        (self.x_min..=self.x_max).flat_map(move |x| {
            (self.y_min..=self.y_max).map(move |y| TileKey::new(self.zoom, x, y))
        })
    }
}

/// Rough size of a plan, shown to operators before fetching
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanEstimate {
    pub tiles: u64,
    pub megabytes: f64,
}

/// The set of tiles covering a bounding box over a zoom range.
///
/// Keys are never materialised up front; iterate them with [`TilePlan::keys`].
#[derive(Debug, Clone, Serialize)]
pub struct TilePlan {
    bounds: GeoBoundingBox,
    min_zoom: u8,
    max_zoom: u8,
    ranges: Vec<ZoomRange>,
}

impl TilePlan {
    /// Compute the tile ranges for every zoom in `[min_zoom, max_zoom]`
    pub fn build(bounds: &GeoBoundingBox, min_zoom: u8, max_zoom: u8) -> Result<Self> {
        if min_zoom > max_zoom {
            return Err(TilesError::Config(format!(
                "Minimum zoom ({}) must not exceed maximum zoom ({})",
                min_zoom, max_zoom
            )));
        }

        let ranges = (min_zoom..=max_zoom)
            .map(|zoom| Self::zoom_range(bounds, zoom))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            bounds: *bounds,
            min_zoom,
            max_zoom,
            ranges,
        })
    }

    fn zoom_range(bounds: &GeoBoundingBox, zoom: u8) -> Result<ZoomRange> {
        let (x_a, y_a) = to_tile_index(bounds.south(), bounds.west(), zoom)?;
        let (x_b, y_b) = to_tile_index(bounds.north(), bounds.east(), zoom)?;

        // y grows southward, so the corners come back in opposite orders
        let mut range = ZoomRange {
            zoom,
            x_min: x_a.min(x_b),
            x_max: x_a.max(x_b),
            y_min: y_a.min(y_b),
            y_max: y_a.max(y_b),
        };

        // East and south edges are exclusive: a box ending exactly on a
        // tile boundary does not pull in the next column or row
        let (edge_lat, edge_lon) = to_lat_lon(range.x_max, range.y_max, zoom);
        if range.x_max > range.x_min && edge_lon >= bounds.east() {
            range.x_max -= 1;
        }
        if range.y_max > range.y_min && edge_lat <= bounds.south() {
            range.y_max -= 1;
        }
        Ok(range)
    }

    pub fn bounds(&self) -> &GeoBoundingBox {
        &self.bounds
    }

    pub fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    /// Per-zoom ranges, lowest zoom first
    pub fn ranges(&self) -> &[ZoomRange] {
        &self.ranges
    }

    /// Total number of tiles across all zoom levels
    pub fn len(&self) -> u64 {
        self.ranges.iter().map(ZoomRange::tile_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate every planned key; the iterator owns its data
    pub fn keys(&self) -> impl Iterator<Item = TileKey> + Send + use<> {
        self.ranges.clone().into_iter().flat_map(ZoomRange::keys)
    }

    /// Tile count and storage estimate at ~15 KB per tile
    pub fn estimate(&self) -> PlanEstimate {
        let tiles = self.len();
        PlanEstimate {
            tiles,
            megabytes: (tiles * ESTIMATED_TILE_KB) as f64 / 1024.0,
        }
    }

    /// Log per-zoom statistics before any download begins
    pub fn log_summary(&self) {
        for range in &self.ranges {
            tracing::info!(
                "Zoom {}: {} tiles (x:{}-{}, y:{}-{})",
                range.zoom,
                range.tile_count(),
                range.x_min,
                range.x_max,
                range.y_min,
                range.y_max
            );
        }
        tracing::info!("Total tiles to process: {}", self.len());
    }
}
