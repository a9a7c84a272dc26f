mod traits;

#[cfg(feature = "reqwest-client")]
mod reqwest_client;

pub use traits::*;

#[cfg(feature = "reqwest-client")]
pub use reqwest_client::*;

use std::sync::Arc;

/// Create an HTTP client with custom configuration
pub fn create_client_with_config(config: HttpConfig) -> Result<Arc<dyn HttpClient>, HttpError> {
    #[cfg(feature = "reqwest-client")]
    {
        ReqwestClient::with_config(config).map(|client| Arc::new(client) as Arc<dyn HttpClient>)
    }

    #[cfg(not(feature = "reqwest-client"))]
    {
        let _ = config;
        Err(HttpError::RequestFailed {
            message: "No HTTP client feature enabled. Enable 'reqwest-client'".to_string(),
        })
    }
}
