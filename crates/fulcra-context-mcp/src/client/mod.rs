//! Fulcra data API client.
//!
//! Provides async HTTP client with:
//! - Connection pooling via reqwest
//! - Retry middleware with exponential backoff
//! - Per-user response caching with a short TTL
//!
//! Every call is made on behalf of one user and carries that user's
//! upstream credential as a bearer token.

use std::time::Duration;

use moka::future::Cache;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::config::{Config, api, api::paths};
use crate::error::{ClientError, ClientResult};
use crate::models::{
    LocationAtTimeInput, LocationTimeSeriesInput, MetricTimeSeriesInput, SleepCyclesInput,
    WorkoutsInput,
};
use crate::server::oauth::UpstreamCredential;

/// Fulcra data API client.
#[derive(Clone)]
pub struct FulcraClient {
    /// HTTP client with middleware.
    client: ClientWithMiddleware,

    /// Response cache, keyed per user.
    cache: Cache<String, serde_json::Value>,

    /// Data API base URL.
    api_url: String,
}

impl FulcraClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("fulcra-context-mcp/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(api::MAX_KEEPALIVE)
            .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
            .gzip(true)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(500), Duration::from_secs(10))
            .build_with_max_retries(2);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let cache = Cache::builder()
            .max_capacity(config.cache_max_size)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self { client, cache, api_url: config.api_url.trim_end_matches('/').to_string() })
    }

    /// Data API base URL.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Profile of the signed-in user.
    pub async fn user_info(&self, credential: &UpstreamCredential) -> ClientResult<serde_json::Value> {
        self.get_json(paths::USER_INFO, &[], credential).await
    }

    /// Catalog of the metrics available for this user.
    pub async fn metrics_catalog(
        &self,
        credential: &UpstreamCredential,
    ) -> ClientResult<serde_json::Value> {
        self.get_json(paths::METRICS_CATALOG, &[], credential).await
    }

    /// Samples of one metric over a time range.
    pub async fn metric_time_series(
        &self,
        input: &MetricTimeSeriesInput,
        credential: &UpstreamCredential,
    ) -> ClientResult<serde_json::Value> {
        self.get_json(paths::METRIC_TIME_SERIES, &input.to_query(), credential).await
    }

    /// Workouts recorded in a time range.
    pub async fn workouts(
        &self,
        input: &WorkoutsInput,
        credential: &UpstreamCredential,
    ) -> ClientResult<serde_json::Value> {
        self.get_json(paths::WORKOUTS, &input.to_query(), credential).await
    }

    /// Sleep cycles in a time range.
    pub async fn sleep_cycles(
        &self,
        input: &SleepCyclesInput,
        credential: &UpstreamCredential,
    ) -> ClientResult<serde_json::Value> {
        self.get_json(paths::SLEEP_CYCLES, &input.to_query(), credential).await
    }

    /// Closest known location to a point in time.
    pub async fn location_at_time(
        &self,
        input: &LocationAtTimeInput,
        credential: &UpstreamCredential,
    ) -> ClientResult<serde_json::Value> {
        self.get_json(paths::LOCATION_AT_TIME, &input.to_query(), credential).await
    }

    /// Location samples in a time range.
    pub async fn location_time_series(
        &self,
        input: &LocationTimeSeriesInput,
        credential: &UpstreamCredential,
    ) -> ClientResult<serde_json::Value> {
        self.get_json(paths::LOCATION_TIME_SERIES, &input.to_query(), credential).await
    }

    /// Make an authenticated GET request against the data API.
    pub async fn get_json(
        &self,
        path: &str,
        params: &[(String, String)],
        credential: &UpstreamCredential,
    ) -> ClientResult<serde_json::Value> {
        let url = format!("{}{}", self.api_url, path);

        // Check cache
        let cache_key = Self::cache_key("GET", &url, params, credential);
        if let Some(cached) = self.cache.get(&cache_key).await {
            tracing::debug!(path = %path, "Cache hit");
            return Ok(cached);
        }

        let response = self
            .client
            .get(&url)
            .query(params)
            .bearer_auth(credential.expose())
            .send()
            .await?;

        let response = Self::handle_response(response).await?;
        let value: serde_json::Value = response.json().await?;

        // Cache response
        self.cache.insert(cache_key, value.clone()).await;

        Ok(value)
    }

    /// Handle API response status codes.
    async fn handle_response(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        match status.as_u16() {
            401 | 403 => Err(ClientError::Unauthorized),
            429 => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);

                Err(ClientError::rate_limited(retry_after))
            }
            404 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::not_found(text))
            }
            400 | 422 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::bad_request(text))
            }
            500..=599 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::server(status.as_u16(), text))
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::UnexpectedStatus { status: status.as_u16(), message: text })
            }
        }
    }

    /// Generate cache key. The credential is hashed in so users never share entries.
    fn cache_key(
        method: &str,
        url: &str,
        params: &[(String, String)],
        credential: &UpstreamCredential,
    ) -> String {
        use md5::{Digest, Md5};

        let mut hasher = Md5::new();
        hasher.update(credential.expose().as_bytes());
        hasher.update(b"|");
        hasher.update(method.as_bytes());
        hasher.update(b"|");
        hasher.update(url.as_bytes());
        hasher.update(b"|");

        for (k, v) in params {
            hasher.update(k.as_bytes());
            hasher.update(b"=");
            hasher.update(v.as_bytes());
            hasher.update(b"&");
        }

        format!("{:x}", hasher.finalize())
    }
}

impl std::fmt::Debug for FulcraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FulcraClient").field("api_url", &self.api_url).finish()
    }
}
