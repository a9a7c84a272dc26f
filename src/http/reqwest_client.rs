use super::{HttpClient, HttpConfig, HttpError, HttpResponse, HttpResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;

/// Native HTTP client backed by reqwest.
///
/// One instance holds a connection pool; share it behind an `Arc` across
/// the geocoder and every fetch worker.
pub struct ReqwestClient {
    client: reqwest::Client,
    timeout_seconds: u64,
}

impl ReqwestClient {
    pub fn with_config(config: HttpConfig) -> HttpResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(header_map(&config.default_headers)?)
            .build()
            .map_err(|e| HttpError::RequestFailed {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            timeout_seconds: config.timeout.as_secs(),
        })
    }

    fn map_error(&self, err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            return HttpError::Timeout {
                seconds: self.timeout_seconds,
            };
        }
        if err.is_connect() {
            return HttpError::Network {
                message: format!("Connection failed: {}", err),
            };
        }
        match err.status() {
            Some(status) => HttpError::HttpStatus {
                status: status.as_u16(),
            },
            None => HttpError::RequestFailed {
                message: err.to_string(),
            },
        }
    }
}

/// Convert configured headers, rejecting invalid names or values
fn header_map(headers: &HashMap<String, String>) -> HttpResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            HttpError::RequestFailed {
                message: format!("Invalid header name '{}': {}", name, e),
            }
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| HttpError::RequestFailed {
            message: format!("Invalid header value '{}': {}", value, e),
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> HttpResult<HttpResponse> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(|e| self.map_error(e))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
            headers,
        })
    }
}
