// src/core/scanner/ct_source.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{error, info};
use url::Url;

use crate::core::models::CtEntry;

/// Public crt.sh endpoint.
pub const DEFAULT_CT_BASE_URL: &str = "https://crt.sh/";

/// Why the certificate transparency source could not be read.
#[derive(Debug, thiserror::Error)]
pub enum CtFetchError {
    #[error("invalid CT source URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("request failed: {0}")]
    Request(reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),

    #[error("invalid JSON payload: {0}")]
    Decode(reqwest::Error),
}

/// Anything that can list the CT rows recorded for a domain.
#[async_trait]
pub trait CtLogSource: Send + Sync {
    async fn fetch(&self, domain: &str) -> Result<Vec<CtEntry>, CtFetchError>;
}

/// [`CtLogSource`] backed by the crt.sh JSON API (`?q=%.<domain>&output=json`).
#[derive(Debug, Clone)]
pub struct CrtShSource {
    client: reqwest::Client,
    base_url: Url,
}

impl CrtShSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CtFetchError> {
        let base_url = Url::parse(base_url)?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("reconkit/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(CtFetchError::Client)?;
        Ok(Self { client, base_url })
    }

    /// Builds the query URL for every name under `domain`.
    pub fn query_url(&self, domain: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("q", &format!("%.{}", domain))
            .append_pair("output", "json");
        url
    }
}

#[async_trait]
impl CtLogSource for CrtShSource {
    async fn fetch(&self, domain: &str) -> Result<Vec<CtEntry>, CtFetchError> {
        let url = self.query_url(domain);
        info!(domain, url = %url, "Fetching subdomains from crt.sh.");

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            error!(url = %url, error = %e, "CT request failed.");
            CtFetchError::Request(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(url = %url, %status, "CT source returned an error status.");
            return Err(CtFetchError::Status(status));
        }

        let entries: Vec<CtEntry> = response.json().await.map_err(|e| {
            error!(url = %url, error = %e, "CT payload could not be decoded.");
            CtFetchError::Decode(e)
        })?;

        info!(domain, rows = entries.len(), "Received CT rows.");
        Ok(entries)
    }
}
