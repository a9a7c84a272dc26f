use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::{PlaceResolution, PlaceResolver};
use crate::http::HttpClient;
use crate::{PlaceQuery, Result, TilesError};

/// Geocoder backed by the OpenStreetMap Nominatim search API
pub struct NominatimResolver {
    /// Base URL of the search endpoint
    pub base_url: String,
    client: Arc<dyn HttpClient>,
}

/// One entry of a Nominatim `format=json` search response
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: Option<String>,
    lat: String,
    lon: String,
    /// `[south, north, west, east]` as strings
    boundingbox: Vec<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl NominatimResolver {
    /// Create a resolver using the public Nominatim instance
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self::with_base_url("https://nominatim.openstreetmap.org/search", client)
    }

    /// Create a resolver with a custom search endpoint
    pub fn with_base_url(base_url: impl Into<String>, client: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn search_url(&self, query: &PlaceQuery) -> String {
        format!(
            "{}?q={}&format=json&limit=1&addressdetails=1",
            self.base_url,
            urlencoding::encode(&query.query_string())
        )
    }

    /// Parse the first search hit out of a response body
    fn parse_response(body: &[u8]) -> Result<Option<PlaceResolution>> {
        let places: Vec<NominatimPlace> = serde_json::from_slice(body).map_err(|e| {
            TilesError::Parse(format!("Failed to parse geocoding response: {}", e))
        })?;

        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };

        if place.boundingbox.len() != 4 {
            return Err(TilesError::Parse(
                "Invalid bounding box format from geocoding service".to_string(),
            ));
        }

        let parse_coord = |value: &str, coord_type: &str| -> Result<f64> {
            value
                .parse()
                .map_err(|_| TilesError::Parse(format!("Invalid {} format: {}", coord_type, value)))
        };

        Ok(Some(PlaceResolution {
            display_name: place.display_name.unwrap_or_else(|| "Unknown".to_string()),
            lat: parse_coord(&place.lat, "latitude")?,
            lon: parse_coord(&place.lon, "longitude")?,
            south: parse_coord(&place.boundingbox[0], "south latitude")?,
            north: parse_coord(&place.boundingbox[1], "north latitude")?,
            west: parse_coord(&place.boundingbox[2], "west longitude")?,
            east: parse_coord(&place.boundingbox[3], "east longitude")?,
            kind: place.kind.unwrap_or_else(|| "unknown".to_string()),
        }))
    }
}

#[async_trait]
impl PlaceResolver for NominatimResolver {
    fn resolver_type(&self) -> &'static str {
        "nominatim"
    }

    async fn resolve_place(&self, query: &PlaceQuery) -> Result<Option<PlaceResolution>> {
        tracing::debug!("Geocoding place: {}", query.query_string());

        let response = self
            .client
            .get(&self.search_url(query))
            .await?
            .error_for_status()?;

        let resolution = Self::parse_response(&response.body)?;
        if let Some(place) = &resolution {
            tracing::debug!(
                "Geocoded '{}' to bbox: {},{},{},{}",
                query.name,
                place.south,
                place.west,
                place.north,
                place.east
            );
        }
        Ok(resolution)
    }
}
