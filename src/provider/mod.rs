mod mock;
mod nominatim;
mod tile_source;

pub use mock::*;
pub use nominatim::*;
pub use tile_source::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::http::HttpClient;
use crate::{PlaceQuery, Result, TileKey};

/// A place name resolved by a geocoding service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceResolution {
    /// Full name as reported by the geocoder
    pub display_name: String,
    /// Latitude of the place's reference point
    pub lat: f64,
    /// Longitude of the place's reference point
    pub lon: f64,
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
    /// Kind of place, e.g. "city" or "administrative"
    pub kind: String,
}

/// Capability for resolving place names to coordinates
///
/// Implementations are treated as unreliable: a lookup may fail with a
/// network error or find nothing.
#[async_trait]
pub trait PlaceResolver: Send + Sync {
    /// Get the resolver type identifier (e.g., "nominatim", "mock")
    fn resolver_type(&self) -> &'static str;

    /// Resolve one place, returning `Ok(None)` when nothing matched
    async fn resolve_place(&self, query: &PlaceQuery) -> Result<Option<PlaceResolution>>;
}

/// Capability for fetching raw tile payloads
///
/// The returned bytes are opaque; nothing inspects the image content.
#[async_trait]
pub trait TileSource: Send + Sync {
    /// Identifier recorded in the tile set metadata
    fn source_id(&self) -> &str;

    /// File extension and metadata format of persisted tiles
    fn format(&self) -> &str {
        "png"
    }

    /// Fetch the payload for one tile
    async fn fetch_tile(&self, key: TileKey) -> Result<Vec<u8>>;
}

/// Provider factory for creating collaborators
pub struct ProviderFactory;

impl ProviderFactory {
    /// Nominatim geocoder sharing the given client
    pub fn nominatim(client: Arc<dyn HttpClient>) -> NominatimResolver {
        NominatimResolver::new(client)
    }

    /// HTTP tile source for one of the built-in providers
    pub fn tile_source(
        source: MapSource,
        client: Arc<dyn HttpClient>,
        api_key: Option<String>,
    ) -> HttpTileSource {
        HttpTileSource::new(source, client).with_api_key(api_key)
    }

    /// Create a mock geocoder for testing
    pub fn mock_resolver() -> MockPlaceResolver {
        MockPlaceResolver::new()
    }

    /// Create a mock tile source for testing
    pub fn mock_tile_source() -> MockTileSource {
        MockTileSource::new()
    }
}
