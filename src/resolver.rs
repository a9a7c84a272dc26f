//! Turns an [`AreaSpec`] into the bounding box that gets tiled.

use serde::Serialize;
use std::sync::Arc;

use crate::{
    AreaSpec, BufferMode, GeneratorConfig, GeoBoundingBox, PlaceQuery, PlaceResolution,
    PlaceResolver, PredefinedRegion, Result, TilesError, expand_edges,
};

/// A bounding box together with a human-readable label for metadata
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedArea {
    pub bounds: GeoBoundingBox,
    /// Region id, place name, "<n> places" or "custom area"
    pub label: String,
    /// Places that contributed to `bounds`, empty for regions and explicit bounds
    pub places: Vec<PlaceResolution>,
}

/// Resolves regions, places and explicit bounds to a bounding box
pub struct AreaResolver {
    places: Arc<dyn PlaceResolver>,
    buffer_km: f64,
    buffer_mode: BufferMode,
}

impl AreaResolver {
    /// Resolver with the default 20 km flat buffer
    pub fn new(places: Arc<dyn PlaceResolver>) -> Self {
        let defaults = GeneratorConfig::default();
        Self {
            places,
            buffer_km: defaults.buffer_km,
            buffer_mode: defaults.buffer_mode,
        }
    }

    /// Resolver using the buffer settings of `config`
    pub fn from_config(places: Arc<dyn PlaceResolver>, config: &GeneratorConfig) -> Self {
        Self::new(places).with_buffer(config.buffer_km, config.buffer_mode)
    }

    pub fn with_buffer(mut self, buffer_km: f64, buffer_mode: BufferMode) -> Self {
        self.buffer_km = buffer_km;
        self.buffer_mode = buffer_mode;
        self
    }

    pub fn buffer_km(&self) -> f64 {
        self.buffer_km
    }

    /// Resolve `spec` to a bounding box.
    ///
    /// Buffers apply only to geocoded places; predefined regions and
    /// explicit bounds are used as given.
    pub async fn resolve(&self, spec: &AreaSpec) -> Result<ResolvedArea> {
        let area = match spec {
            AreaSpec::Region { id } => Self::resolve_region(id)?,
            AreaSpec::Place(query) => self.resolve_single(query).await?,
            AreaSpec::Places(queries) => self.resolve_many(queries).await?,
            AreaSpec::Bounds {
                north,
                south,
                east,
                west,
            } => Self::resolve_bounds(*north, *south, *east, *west)?,
        };

        let bounds = &area.bounds;
        tracing::info!(
            "Area '{}': N:{:.4}, S:{:.4}, E:{:.4}, W:{:.4}",
            area.label,
            bounds.north(),
            bounds.south(),
            bounds.east(),
            bounds.west()
        );
        Ok(area)
    }

    fn resolve_region(id: &str) -> Result<ResolvedArea> {
        let region = PredefinedRegion::lookup(id)?;
        Ok(ResolvedArea {
            bounds: region.bounding_box()?,
            label: region.id.to_string(),
            places: Vec::new(),
        })
    }

    async fn resolve_single(&self, query: &PlaceQuery) -> Result<ResolvedArea> {
        tracing::info!("Looking up coordinates for: {}", query.query_string());

        let place = self.places.resolve_place(query).await?.ok_or_else(|| {
            TilesError::Resolution(format!(
                "Could not find coordinates for: {}",
                query.query_string()
            ))
        })?;
        tracing::info!(
            "Found {}: {:.4}, {:.4}",
            place.display_name,
            place.lat,
            place.lon
        );

        let bounds = expand_edges(
            place.north,
            place.south,
            place.east,
            place.west,
            self.buffer_km,
            self.buffer_mode,
        )?;

        Ok(ResolvedArea {
            bounds,
            label: query.name.clone(),
            places: vec![place],
        })
    }

    /// Individual lookup failures are skipped; only a total miss is fatal
    async fn resolve_many(&self, queries: &[PlaceQuery]) -> Result<ResolvedArea> {
        if queries.is_empty() {
            return Err(TilesError::Config("No place names given".to_string()));
        }
        tracing::info!("Looking up coordinates for {} places", queries.len());

        let mut found = Vec::with_capacity(queries.len());
        for query in queries {
            match self.places.resolve_place(query).await {
                Ok(Some(place)) => {
                    tracing::info!("✓ {}: {:.4}, {:.4}", query.name, place.lat, place.lon);
                    found.push(place);
                }
                Ok(None) => tracing::warn!("✗ {}: Not found", query.name),
                Err(e) => tracing::warn!("✗ {}: {}", query.name, e),
            }
        }

        let Some(first) = found.first() else {
            return Err(TilesError::Resolution(format!(
                "No valid coordinates found for any of {} places",
                queries.len()
            )));
        };

        let (mut north, mut south, mut east, mut west) =
            (first.north, first.south, first.east, first.west);
        for place in &found[1..] {
            north = north.max(place.north);
            south = south.min(place.south);
            east = east.max(place.east);
            west = west.min(place.west);
        }

        let bounds = expand_edges(
            north,
            south,
            east,
            west,
            self.buffer_km,
            self.buffer_mode,
        )?;

        Ok(ResolvedArea {
            bounds,
            label: format!("{} places", found.len()),
            places: found,
        })
    }

    fn resolve_bounds(
        north: Option<f64>,
        south: Option<f64>,
        east: Option<f64>,
        west: Option<f64>,
    ) -> Result<ResolvedArea> {
        let (Some(north), Some(south), Some(east), Some(west)) = (north, south, east, west) else {
            return Err(TilesError::Config(
                "Explicit bounds require north, south, east and west".to_string(),
            ));
        };

        Ok(ResolvedArea {
            bounds: GeoBoundingBox::new(north, south, east, west)?,
            label: "custom area".to_string(),
            places: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockPlaceResolver;

    fn resolver(mock: MockPlaceResolver) -> (AreaResolver, Arc<MockPlaceResolver>) {
        let mock = Arc::new(mock);
        (AreaResolver::new(mock.clone()), mock)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[tokio::test]
    async fn test_region_is_used_without_buffer() {
        let (resolver, mock) = resolver(MockPlaceResolver::new());

        let area = resolver.resolve(&AreaSpec::region("California")).await.unwrap();

        assert_eq!(area.label, "california");
        assert_eq!(area.bounds.north(), 42.0);
        assert_eq!(area.bounds.west(), -124.409);
        assert!(area.places.is_empty());
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_region_is_a_config_error() {
        let (resolver, _) = resolver(MockPlaceResolver::new());
        let result = resolver.resolve(&AreaSpec::region("atlantis")).await;
        assert!(matches!(result, Err(TilesError::Config(_))));
    }

    #[tokio::test]
    async fn test_single_place_is_buffered() {
        let (resolver, _) = resolver(MockPlaceResolver::new());

        let area = resolver.resolve(&AreaSpec::place("Berlin")).await.unwrap();

        let buffer = 20.0 / 111.0;
        assert_eq!(area.label, "Berlin");
        assert_close(area.bounds.north(), 52.7 + buffer);
        assert_close(area.bounds.south(), 52.3 - buffer);
        assert_close(area.bounds.east(), 13.8 + buffer);
        assert_close(area.bounds.west(), 13.0 - buffer);
        assert_eq!(area.places.len(), 1);
    }

    #[tokio::test]
    async fn test_single_place_not_found() {
        let (resolver, _) = resolver(MockPlaceResolver::empty());

        match resolver.resolve(&AreaSpec::place("Nowhere")).await {
            Err(TilesError::Resolution(msg)) => {
                assert_eq!(msg, "Could not find coordinates for: Nowhere");
            }
            other => panic!("Expected Resolution error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_single_place_lookup_failure_is_fatal() {
        let (resolver, _) = resolver(MockPlaceResolver::new().with_failure());
        let result = resolver.resolve(&AreaSpec::place("Berlin")).await;
        assert!(matches!(result, Err(TilesError::Network(_))));
    }

    #[tokio::test]
    async fn test_point_place_becomes_box_with_buffer() {
        let (resolver, _) = resolver(MockPlaceResolver::empty().with_place(
            "pin", 45.0, 7.0, 45.0, 7.0,
        ));

        let area = resolver.resolve(&AreaSpec::place("pin")).await.unwrap();
        assert!(area.bounds.contains(45.0, 7.0));
        assert!(area.bounds.height() > 0.0);
    }

    #[tokio::test]
    async fn test_places_union_then_buffer() {
        // Two places far apart: the result spans both, plus one buffer
        let (resolver, _) = resolver(
            MockPlaceResolver::empty()
                .with_place("alpha", 10.0, 10.0, 11.0, 11.0)
                .with_place("omega", 40.0, 50.0, 41.0, 51.0),
        );
        let resolver = resolver.with_buffer(111.0, BufferMode::Degrees);

        let area = resolver
            .resolve(&AreaSpec::places("alpha; omega"))
            .await
            .unwrap();

        assert_eq!(area.label, "2 places");
        assert_close(area.bounds.north(), 42.0);
        assert_close(area.bounds.south(), 9.0);
        assert_close(area.bounds.east(), 52.0);
        assert_close(area.bounds.west(), 9.0);
    }

    #[tokio::test]
    async fn test_places_skip_failures_and_misses() {
        let (resolver, mock) = resolver(MockPlaceResolver::new().with_failing_place("munich"));

        let area = resolver
            .resolve(&AreaSpec::places("berlin;munich;atlantis;hamburg"))
            .await
            .unwrap();

        assert_eq!(mock.calls(), 4);
        assert_eq!(area.label, "2 places");
        assert_eq!(area.places.len(), 2);
        // Munich lies far south of Berlin and must not be included
        assert!(area.bounds.south() > 52.0);
        assert!(area.bounds.north() > 53.8);
    }

    #[tokio::test]
    async fn test_places_none_resolved() {
        let (resolver, _) = resolver(MockPlaceResolver::empty());

        let result = resolver.resolve(&AreaSpec::places("a;b")).await;
        assert!(matches!(result, Err(TilesError::Resolution(_))));
    }

    #[tokio::test]
    async fn test_places_empty_list() {
        let (resolver, mock) = resolver(MockPlaceResolver::new());

        let result = resolver.resolve(&AreaSpec::places(" ; ;")).await;
        assert!(matches!(result, Err(TilesError::Config(_))));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_explicit_bounds() {
        let (resolver, _) = resolver(MockPlaceResolver::new());

        let area = resolver
            .resolve(&AreaSpec::bounds(10.0, 0.0, 10.0, 0.0))
            .await
            .unwrap();
        assert_eq!(area.label, "custom area");
        assert_eq!(area.bounds.to_array(), [0.0, 0.0, 10.0, 10.0]);
    }

    #[tokio::test]
    async fn test_explicit_bounds_missing_value() {
        let (resolver, _) = resolver(MockPlaceResolver::new());
        let spec = AreaSpec::Bounds {
            north: Some(10.0),
            south: Some(0.0),
            east: None,
            west: Some(0.0),
        };

        let result = resolver.resolve(&spec).await;
        assert!(matches!(result, Err(TilesError::Config(msg)) if msg.contains("require")));
    }

    #[tokio::test]
    async fn test_inverted_explicit_bounds_rejected() {
        let (resolver, _) = resolver(MockPlaceResolver::new());
        let result = resolver
            .resolve(&AreaSpec::bounds(0.0, 10.0, 10.0, 0.0))
            .await;
        assert!(matches!(result, Err(TilesError::Config(_))));
    }

    #[tokio::test]
    async fn test_from_config_uses_configured_buffer() {
        let config = GeneratorConfig {
            buffer_km: 0.0,
            ..GeneratorConfig::default()
        };
        let resolver = AreaResolver::from_config(Arc::new(MockPlaceResolver::new()), &config);
        assert_eq!(resolver.buffer_km(), 0.0);

        let area = resolver.resolve(&AreaSpec::place("test")).await.unwrap();
        assert_eq!(area.bounds.to_array(), [13.3, 52.4, 13.5, 52.6]);
    }
}
