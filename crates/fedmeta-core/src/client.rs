//! HTTP retrieval of the signed metadata document.
//!
//! One GET per call. No retries; any transport failure or non-success status
//! becomes a single [`FedmetaError::Network`] naming the URL.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use tracing::debug;

use crate::config::FetchConfig;
use crate::error::{FedmetaError, FedmetaResult};

const USER_AGENT_VALUE: &str = concat!("fedmeta/", env!("CARGO_PKG_VERSION"));

/// Client for downloading signed metadata.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    client: reqwest::Client,
}

impl MetadataClient {
    pub fn new(config: &FetchConfig) -> FedmetaResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        default_headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/jose+json, application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| FedmetaError::Config {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }

    /// Download the document at `url`.
    pub async fn fetch(&self, url: &str) -> FedmetaResult<Vec<u8>> {
        debug!(url, "fetching signed metadata");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FedmetaError::Network {
                url: url.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let body = response.bytes().await.map_err(|e| network_error(url, e))?;
        debug!(url, bytes = body.len(), "downloaded signed metadata");
        Ok(body.to_vec())
    }
}

fn network_error(url: &str, err: reqwest::Error) -> FedmetaError {
    let message = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else {
        err.to_string()
    };
    FedmetaError::Network {
        url: url.to_string(),
        message,
    }
}
