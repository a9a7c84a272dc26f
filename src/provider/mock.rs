use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{PlaceResolution, PlaceResolver, TileSource};
use crate::http::{HttpClient, HttpError, HttpResponse, HttpResult};
use crate::{PlaceQuery, Result, TileKey, TilesError};

/// In-memory HTTP client returning canned responses
///
/// Records every requested URL so tests can assert on what was sent.
pub struct MockHttpClient {
    responses: HashMap<String, (u16, Vec<u8>)>,
    default_response: Option<(u16, Vec<u8>)>,
    requests: Mutex<Vec<String>>,
}

impl MockHttpClient {
    /// Client with no canned responses; every request fails
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            default_response: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer requests for `url` with the given status and body
    pub fn with_response(mut self, url: impl Into<String>, status: u16, body: &[u8]) -> Self {
        self.responses.insert(url.into(), (status, body.to_vec()));
        self
    }

    /// Answer unmatched requests with the given status and body
    pub fn with_default_response(mut self, status: u16, body: &[u8]) -> Self {
        self.default_response = Some((status, body.to_vec()));
        self
    }

    /// Answer unmatched requests with the given status and an empty body
    pub fn with_default_status(self, status: u16) -> Self {
        self.with_default_response(status, &[])
    }

    /// URLs requested so far, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str) -> HttpResult<HttpResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }

        let (status, body) = self
            .responses
            .get(url)
            .or(self.default_response.as_ref())
            .cloned()
            .ok_or_else(|| HttpError::Network {
                message: format!("No mock response for {}", url),
            })?;

        Ok(HttpResponse {
            status,
            body,
            headers: HashMap::new(),
        })
    }
}

/// Geocoder with a fixed table of known places
pub struct MockPlaceResolver {
    places: HashMap<String, PlaceResolution>,
    failing: HashSet<String>,
    simulate_failure: bool,
    calls: AtomicUsize,
}

impl MockPlaceResolver {
    /// Create a resolver that knows berlin, munich, hamburg and test
    pub fn new() -> Self {
        let mut resolver = Self {
            places: HashMap::new(),
            failing: HashSet::new(),
            simulate_failure: false,
            calls: AtomicUsize::new(0),
        };
        for (name, south, west, north, east) in [
            ("berlin", 52.3, 13.0, 52.7, 13.8),
            ("munich", 48.0, 11.3, 48.3, 11.8),
            ("hamburg", 53.4, 9.7, 53.8, 10.3),
            ("test", 52.4, 13.3, 52.6, 13.5),
        ] {
            resolver = resolver.with_place(name, south, west, north, east);
        }
        resolver
    }

    /// Create a resolver that knows no places at all
    pub fn empty() -> Self {
        Self {
            places: HashMap::new(),
            failing: HashSet::new(),
            simulate_failure: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Register a place with the given extent
    pub fn with_place(
        mut self,
        name: &str,
        south: f64,
        west: f64,
        north: f64,
        east: f64,
    ) -> Self {
        let resolution = PlaceResolution {
            display_name: name.to_string(),
            lat: (south + north) / 2.0,
            lon: (west + east) / 2.0,
            south,
            north,
            west,
            east,
            kind: "city".to_string(),
        };
        self.places.insert(name.to_lowercase(), resolution);
        self
    }

    /// Make lookups of one place fail with a network error
    pub fn with_failing_place(mut self, name: &str) -> Self {
        self.failing.insert(name.to_lowercase());
        self
    }

    /// Configure every lookup to fail
    pub fn with_failure(mut self) -> Self {
        self.simulate_failure = true;
        self
    }

    /// Number of lookups performed
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockPlaceResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaceResolver for MockPlaceResolver {
    fn resolver_type(&self) -> &'static str {
        "mock"
    }

    async fn resolve_place(&self, query: &PlaceQuery) -> Result<Option<PlaceResolution>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = query.name.to_lowercase();

        if self.simulate_failure || self.failing.contains(&name) {
            return Err(TilesError::Network(HttpError::Network {
                message: "Simulated network failure".to_string(),
            }));
        }

        Ok(self.places.get(&name).cloned())
    }
}

/// Tile source producing deterministic payloads without network access
pub struct MockTileSource {
    failing: HashSet<TileKey>,
    simulate_failure: bool,
    simulated_delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTileSource {
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            simulate_failure: false,
            simulated_delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Payload returned for a key
    pub fn payload(key: TileKey) -> Vec<u8> {
        format!("tile {}", key).into_bytes()
    }

    /// Make fetches of one key fail
    pub fn with_failing_key(mut self, key: TileKey) -> Self {
        self.failing.insert(key);
        self
    }

    /// Configure every fetch to fail
    pub fn with_failure(mut self) -> Self {
        self.simulate_failure = true;
        self
    }

    /// Add a simulated network delay to every fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.simulated_delay = Some(delay);
        self
    }

    /// Number of fetches performed
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of fetches observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockTileSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TileSource for MockTileSource {
    fn source_id(&self) -> &str {
        "mock"
    }

    async fn fetch_tile(&self, key: TileKey) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.simulated_delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.simulate_failure || self.failing.contains(&key) {
            return Err(TilesError::Network(HttpError::HttpStatus { status: 500 }));
        }
        Ok(Self::payload(key))
    }
}
