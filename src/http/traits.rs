use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Result type for HTTP operations
pub type HttpResult<T> = Result<T, HttpError>;

/// HTTP client errors
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum HttpError {
    #[error("Request failed: {message}")]
    RequestFailed { message: String },

    #[error("HTTP error: {status}")]
    HttpStatus { status: u16 },

    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Network error: {message}")]
    Network { message: String },
}

/// HTTP response with an opaque byte body
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub headers: HashMap<String, String>,
}

impl HttpResponse {
    /// Whether the status code is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into an error, passing successful ones through
    pub fn error_for_status(self) -> HttpResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(HttpError::HttpStatus {
                status: self.status,
            })
        }
    }
}

/// Capability for issuing HTTP requests.
///
/// One instance is constructed per run and handed to every collaborator that
/// needs network access, so tests can substitute a fake.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Make a GET request
    async fn get(&self, url: &str) -> HttpResult<HttpResponse>;
}

/// Configuration for HTTP clients
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub default_headers: HashMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: format!("offline-tiles/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
        }
    }
}

impl HttpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }
}
