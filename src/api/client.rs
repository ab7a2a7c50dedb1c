//! HTTP client for the mock stock REST service.

use super::converter::{RemovedResponse, TrackRequest, WireListing};
use super::{CatalogClient, DataConverter, QuoteClient};
use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::state::{CatalogListing, Quote};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Builder for creating an API client.
pub struct ApiClientBuilder {
    config: RemoteConfig,
}

impl ApiClientBuilder {
    /// Create a new builder with default config.
    pub fn new() -> Self {
        Self {
            config: RemoteConfig::default(),
        }
    }

    /// Set the remote configuration.
    pub fn config(mut self, config: RemoteConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Build the API client.
    pub fn build(self) -> Result<ApiClient> {
        ApiClient::new(self.config)
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP implementation of [`CatalogClient`] and [`QuoteClient`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Parsed base URL, e.g. `http://localhost:3001/api`.
    base_url: Url,
    http: Client,
}

impl ApiClient {
    /// Create a new API client.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::config(format!("invalid base_url {:?}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(format!(
                "base_url {:?} cannot be a base",
                config.base_url
            )));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(e.to_string()))?;

        Ok(Self { base_url, http })
    }

    /// Base URL requests are issued against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments. Segments are percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send a request and decode a 2xx JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DataConverter::convert_rejection(status, &body));
        }

        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments);
        debug!("GET {}", url);
        self.send(self.http.get(url)).await
    }
}

#[async_trait]
impl CatalogClient for ApiClient {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogListing>> {
        let rows: Vec<WireListing> = self.get(&["stocks"]).await?;
        Ok(rows.into_iter().map(DataConverter::convert_listing).collect())
    }
}

#[async_trait]
impl QuoteClient for ApiClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        self.get(&["stocks", symbol]).await
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let joined = symbols.join(",");
        self.get(&["stocks", "batch", joined.as_str()]).await
    }

    async fn fetch_tracked(&self) -> Result<Vec<Quote>> {
        self.get(&["tracked-stocks"]).await
    }

    async fn track(&self, symbol: &str) -> Result<Quote> {
        let url = self.endpoint(&["tracked-stocks"]);
        debug!("POST {} {}", url, symbol);
        self.send(self.http.post(url).json(&TrackRequest { symbol }))
            .await
    }

    async fn untrack(&self, symbol: &str) -> Result<String> {
        let url = self.endpoint(&["tracked-stocks", symbol]);
        debug!("DELETE {}", url);
        let removed: RemovedResponse = self.send(self.http.delete(url)).await?;
        Ok(removed.removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ApiClient {
        ApiClientBuilder::new().base_url(base_url).build().unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let api = client("http://localhost:3001/api");
        assert_eq!(
            api.endpoint(&["stocks", "batch", "SWANSON,PAWN"]).as_str(),
            "http://localhost:3001/api/stocks/batch/SWANSON,PAWN"
        );
    }

    #[test]
    fn test_endpoint_with_trailing_slash() {
        let api = client("http://localhost:3001/api/");
        assert_eq!(
            api.endpoint(&["tracked-stocks"]).as_str(),
            "http://localhost:3001/api/tracked-stocks"
        );
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let api = client("http://localhost:3001/api");
        assert_eq!(
            api.endpoint(&["tracked-stocks", "A/B"]).as_str(),
            "http://localhost:3001/api/tracked-stocks/A%2FB"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ApiClientBuilder::new().base_url("not a url").build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = ApiClientBuilder::new().base_url("mailto:ops@example.com").build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_network_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let api = client("http://127.0.0.1:9/api");
        let err = api.fetch_tracked().await.unwrap_err();
        assert!(err.is_recoverable(), "{err:?}");
    }
}
