//! Conversion between geographic coordinates and Web Mercator tile indices.
//!
//! Uses the standard slippy-map scheme: `2^zoom × 2^zoom` tiles per zoom
//! level, x growing eastward from the antimeridian and y growing southward
//! from the northern edge of the projection.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::{CoordError, MAX_ZOOM};

/// Identifies one raster tile: `(zoom, x, y)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKey {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// North-west corner of this tile as (lat, lon)
    pub fn north_west(&self) -> (f64, f64) {
        to_lat_lon(self.x, self.y, self.zoom)
    }

    /// South-east corner of this tile as (lat, lon)
    pub fn south_east(&self) -> (f64, f64) {
        to_lat_lon(self.x + 1, self.y + 1, self.zoom)
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Number of tiles along one axis at `zoom`
#[inline]
pub fn tiles_per_axis(zoom: u8) -> u32 {
    1u32 << zoom
}

/// Map a geographic coordinate onto the tile containing it.
///
/// Latitude must lie strictly within (-90, 90); the poles have no finite
/// Mercator y. Results are clamped into `[0, 2^zoom - 1]`, which folds the
/// eastern edge (`lon = 180`) and the polar caps beyond ±85.0511° onto the
/// outermost tiles.
pub fn to_tile_index(lat: f64, lon: f64, zoom: u8) -> Result<(u32, u32), CoordError> {
    if !lat.is_finite() || lat <= -90.0 || lat >= 90.0 {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = f64::from(tiles_per_axis(zoom));
    let max_index = n - 1.0;

    let x = ((lon + 180.0) / 360.0 * n).floor();
    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor();

    Ok((x.clamp(0.0, max_index) as u32, y.clamp(0.0, max_index) as u32))
}

/// North-west corner of tile `(x, y)` as (lat, lon).
///
/// Also accepts `x` or `y` equal to `2^zoom`, which yields the far edge of
/// the grid.
pub fn to_lat_lon(x: u32, y: u32, zoom: u8) -> (f64, f64) {
    let n = f64::from(tiles_per_axis(zoom));
    let lon = f64::from(x) / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * f64::from(y) / n)).sinh().atan().to_degrees();
    (lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_york_city_at_zoom_16() {
        let (x, y) = to_tile_index(40.7128, -74.0060, 16).unwrap();
        assert_eq!(x, 19295);
        assert_eq!(y, 24640);
    }

    #[test]
    fn test_origin_at_zoom_0_and_1() {
        assert_eq!(to_tile_index(0.0, 0.0, 0).unwrap(), (0, 0));
        // Just north-east of the origin lands in the north-east quadrant
        assert_eq!(to_tile_index(0.1, 0.1, 1).unwrap(), (1, 0));
        assert_eq!(to_tile_index(-0.1, -0.1, 1).unwrap(), (0, 1));
    }

    #[test]
    fn test_poles_are_domain_errors() {
        assert!(matches!(
            to_tile_index(90.0, 0.0, 10),
            Err(CoordError::InvalidLatitude(_))
        ));
        assert!(matches!(
            to_tile_index(-90.0, 0.0, 10),
            Err(CoordError::InvalidLatitude(_))
        ));
        assert!(to_tile_index(f64::NAN, 0.0, 10).is_err());
    }

    #[test]
    fn test_invalid_longitude_and_zoom() {
        assert!(matches!(
            to_tile_index(0.0, 180.5, 3),
            Err(CoordError::InvalidLongitude(_))
        ));
        assert!(matches!(
            to_tile_index(0.0, 0.0, MAX_ZOOM + 1),
            Err(CoordError::InvalidZoom(_))
        ));
    }

    #[test]
    fn test_indices_stay_in_grid() {
        for zoom in [0u8, 1, 5, 12, 18] {
            let max = tiles_per_axis(zoom) - 1;
            for (lat, lon) in [
                (89.999, 180.0),
                (-89.999, -180.0),
                (85.0511, 179.9999),
                (-85.0511, -179.9999),
                (0.0, 0.0),
            ] {
                let (x, y) = to_tile_index(lat, lon, zoom).unwrap();
                assert!(x <= max, "zoom {} lon {} gave x {}", zoom, lon, x);
                assert!(y <= max, "zoom {} lat {} gave y {}", zoom, lat, y);
            }
        }
    }

    #[test]
    fn test_grid_has_four_to_the_zoom_cells() {
        for zoom in 0u8..=3 {
            let n = tiles_per_axis(zoom);
            let mut cells = HashSet::new();
            for x in 0..n {
                for y in 0..n {
                    let key = TileKey::new(zoom, x, y);
                    let (nw_lat, nw_lon) = key.north_west();
                    let (se_lat, se_lon) = key.south_east();
                    // Sample the middle of the cell and map it back
                    let lat = (nw_lat + se_lat) / 2.0;
                    let lon = (nw_lon + se_lon) / 2.0;
                    cells.insert(to_tile_index(lat, lon, zoom).unwrap());
                }
            }
            assert_eq!(cells.len() as u64, 4u64.pow(u32::from(zoom)));
        }
    }

    #[test]
    fn test_round_trip_lands_inside_tile_cell() {
        let points = [
            (40.7128, -74.0060),
            (51.5074, -0.1278),
            (-33.8688, 151.2093),
            (64.1466, -21.9426),
            (-54.8019, -68.3030),
            (0.0001, 0.0001),
        ];

        for zoom in [0u8, 3, 8, 12, 16, 20] {
            for (lat, lon) in points {
                let (x, y) = to_tile_index(lat, lon, zoom).unwrap();
                let key = TileKey::new(zoom, x, y);
                let (north, west) = key.north_west();
                let (south, east) = key.south_east();

                assert!(
                    lat <= north + 1e-9 && lat >= south - 1e-9,
                    "zoom {}: lat {} not in [{}, {}]",
                    zoom,
                    lat,
                    south,
                    north
                );
                assert!(
                    lon >= west - 1e-9 && lon <= east + 1e-9,
                    "zoom {}: lon {} not in [{}, {}]",
                    zoom,
                    lon,
                    west,
                    east
                );
            }
        }
    }

    #[test]
    fn test_tile_to_lat_lon_corners() {
        let (lat, lon) = to_lat_lon(0, 0, 0);
        assert!((lat - 85.0511287798).abs() < 1e-6);
        assert_eq!(lon, -180.0);

        let (lat, lon) = to_lat_lon(1, 1, 0);
        assert!((lat + 85.0511287798).abs() < 1e-6);
        assert_eq!(lon, 180.0);

        let (lat, lon) = to_lat_lon(512, 512, 10);
        assert!(lat.abs() < 1e-9);
        assert!(lon.abs() < 1e-9);
    }

    #[test]
    fn test_tile_key_display() {
        assert_eq!(TileKey::new(7, 20, 49).to_string(), "7/20/49");
    }
}
