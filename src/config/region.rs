use geo::{Destination, Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

use crate::{Result, TilesError};

/// Kilometres per degree used by the flat buffer approximation
pub const KM_PER_DEGREE: f64 = 111.0;

/// Validated geographic bounding box in degrees.
///
/// Construction rejects boxes where `north <= south` or `east <= west`;
/// inverted input is never silently swapped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoBoundingBox {
    north: f64,
    south: f64,
    east: f64,
    west: f64,
}

impl GeoBoundingBox {
    /// Create a bounding box, validating the ordering of its edges
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self> {
        if [north, south, east, west].iter().any(|v| !v.is_finite()) {
            return Err(TilesError::Config(format!(
                "Bounding box coordinates must be finite (N:{}, S:{}, E:{}, W:{})",
                north, south, east, west
            )));
        }
        if north <= south {
            return Err(TilesError::Config(format!(
                "North latitude ({}) must be greater than south latitude ({})",
                north, south
            )));
        }
        if east <= west {
            return Err(TilesError::Config(format!(
                "East longitude ({}) must be greater than west longitude ({})",
                east, west
            )));
        }
        Ok(Self {
            north,
            south,
            east,
            west,
        })
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    /// Bounds in `[west, south, east, north]` order
    pub fn to_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    /// Get the center point of the bounding box as (lat, lon)
    pub fn center(&self) -> (f64, f64) {
        (
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// Width in degrees longitude
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Height in degrees latitude
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Approximate area in square kilometers
    pub fn area_km2(&self) -> f64 {
        let (center_lat, center_lon) = self.center();

        let width_km = Haversine.distance(
            Point::new(self.west, center_lat),
            Point::new(self.east, center_lat),
        ) / 1000.0;
        let height_km = Haversine.distance(
            Point::new(center_lon, self.south),
            Point::new(center_lon, self.north),
        ) / 1000.0;

        width_km * height_km
    }

    /// Check if this bounding box contains a point
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }

    /// Grow the box outward on all four sides by `buffer_km`
    pub fn expand(&self, buffer_km: f64, mode: BufferMode) -> Result<Self> {
        expand_edges(self.north, self.south, self.east, self.west, buffer_km, mode)
    }
}

/// Buffer raw edges and validate the result.
///
/// Works on unvalidated edges so a point-like extent (north == south) still
/// becomes a valid box once a positive buffer is applied.
pub fn expand_edges(
    north: f64,
    south: f64,
    east: f64,
    west: f64,
    buffer_km: f64,
    mode: BufferMode,
) -> Result<GeoBoundingBox> {
    match mode {
        BufferMode::Degrees => {
            // 111 km per degree is applied to longitude as well
            let buffer_deg = buffer_km / KM_PER_DEGREE;
            GeoBoundingBox::new(
                north + buffer_deg,
                south - buffer_deg,
                east + buffer_deg,
                west - buffer_deg,
            )
        }
        BufferMode::Geodesic => {
            let center_lat = (north + south) / 2.0;
            let center_lon = (east + west) / 2.0;
            let meters = buffer_km * 1000.0;

            let new_north = Haversine.destination(Point::new(center_lon, north), 0.0, meters);
            let new_south = Haversine.destination(Point::new(center_lon, south), 180.0, meters);
            let new_east = Haversine.destination(Point::new(east, center_lat), 90.0, meters);
            let new_west = Haversine.destination(Point::new(west, center_lat), 270.0, meters);

            GeoBoundingBox::new(new_north.y(), new_south.y(), new_east.x(), new_west.x())
        }
    }
}

#[derive(Deserialize)]
struct RawBoundingBox {
    north: f64,
    south: f64,
    east: f64,
    west: f64,
}

impl<'de> Deserialize<'de> for GeoBoundingBox {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawBoundingBox::deserialize(deserializer)?;
        GeoBoundingBox::new(raw.north, raw.south, raw.east, raw.west)
            .map_err(serde::de::Error::custom)
    }
}

/// How a kilometre buffer is converted into degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferMode {
    /// `km / 111.0` degrees on every side, for latitude and longitude alike
    #[default]
    Degrees,
    /// Haversine destination points, so east-west width follows latitude
    Geodesic,
}

/// A named region with a fixed extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredefinedRegion {
    pub id: &'static str,
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    /// Large regions require operator confirmation before fetching
    pub large: bool,
}

const REGIONS: &[PredefinedRegion] = &[
    PredefinedRegion {
        id: "north_america",
        north: 83.0,
        south: 7.0,
        east: -52.0,
        west: -168.0,
        large: true,
    },
    PredefinedRegion {
        id: "usa",
        north: 49.0,
        south: 24.0,
        east: -66.0,
        west: -125.0,
        large: true,
    },
    PredefinedRegion {
        id: "canada",
        north: 83.0,
        south: 41.0,
        east: -52.0,
        west: -141.0,
        large: true,
    },
    PredefinedRegion {
        id: "mexico",
        north: 32.7,
        south: 14.5,
        east: -86.7,
        west: -117.1,
        large: false,
    },
    PredefinedRegion {
        id: "california",
        north: 42.0,
        south: 32.5,
        east: -114.131,
        west: -124.409,
        large: false,
    },
    PredefinedRegion {
        id: "texas",
        north: 36.5,
        south: 25.8,
        east: -93.5,
        west: -106.6,
        large: false,
    },
    PredefinedRegion {
        id: "alaska",
        north: 71.4,
        south: 54.4,
        east: -129.9,
        west: -172.4,
        large: false,
    },
];

impl PredefinedRegion {
    /// Look up a region by identifier (case-insensitive)
    pub fn lookup(id: &str) -> Result<&'static PredefinedRegion> {
        let wanted = id.trim().to_lowercase();
        REGIONS.iter().find(|r| r.id == wanted).ok_or_else(|| {
            TilesError::Config(format!(
                "Unknown region: '{}'. Available regions: {:?}",
                id,
                Self::available()
            ))
        })
    }

    /// Identifiers of every predefined region
    pub fn available() -> Vec<&'static str> {
        REGIONS.iter().map(|r| r.id).collect()
    }

    pub fn bounding_box(&self) -> Result<GeoBoundingBox> {
        GeoBoundingBox::new(self.north, self.south, self.east, self.west)
    }
}

/// A place name with optional qualifiers for the geocoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceQuery {
    pub name: String,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl PlaceQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: None,
            country: None,
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Free-form query string, e.g. `"Portland, Oregon, USA"`
    pub fn query_string(&self) -> String {
        let mut query = self.name.clone();
        for qualifier in [&self.state, &self.country].into_iter().flatten() {
            query.push_str(", ");
            query.push_str(qualifier);
        }
        query
    }
}

/// The four mutually exclusive ways to describe an area of interest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AreaSpec {
    /// A predefined region identifier such as `usa` or `texas`
    Region { id: String },
    /// One place resolved through the geocoder
    Place(PlaceQuery),
    /// Several places whose extents are unioned
    Places(Vec<PlaceQuery>),
    /// Explicit bounds; every edge must be present
    Bounds {
        north: Option<f64>,
        south: Option<f64>,
        east: Option<f64>,
        west: Option<f64>,
    },
}

impl AreaSpec {
    /// Create a spec from a predefined region identifier
    pub fn region(id: impl Into<String>) -> Self {
        Self::Region { id: id.into() }
    }

    /// Create a spec from a single place name
    pub fn place(name: impl Into<String>) -> Self {
        Self::Place(PlaceQuery::new(name))
    }

    /// Create a spec from a semicolon-delimited list of place names
    pub fn places(list: &str) -> Self {
        Self::Places(
            list.split(';')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(PlaceQuery::new)
                .collect(),
        )
    }

    /// Create a spec from four explicit bounds
    pub fn bounds(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self::Bounds {
            north: Some(north),
            south: Some(south),
            east: Some(east),
            west: Some(west),
        }
    }

    /// Whether the spec names a predefined region flagged as large
    pub fn is_large_region(&self) -> bool {
        match self {
            Self::Region { id } => PredefinedRegion::lookup(id)
                .map(|r| r.large)
                .unwrap_or(false),
            _ => false,
        }
    }
}
