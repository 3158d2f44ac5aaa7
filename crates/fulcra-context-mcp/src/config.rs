//! Configuration for the Fulcra Context MCP server.

use std::time::Duration;

/// Fulcra data API constants.
pub mod api {
    use std::time::Duration;

    /// Base URL for the Fulcra data API.
    pub const BASE_URL: &str = "https://api.fulcradynamics.com";

    /// Request timeout for data API calls.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Cache TTL (1 minute; personal data changes often).
    pub const CACHE_TTL: Duration = Duration::from_secs(60);

    /// Maximum cache size.
    pub const CACHE_MAX_SIZE: u64 = 500;

    /// Maximum keepalive connections.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Keepalive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);

    /// Data API paths.
    pub mod paths {
        pub const USER_INFO: &str = "/user/v1alpha1/info";
        pub const METRICS_CATALOG: &str = "/data/v0/llm/metrics_catalog";
        pub const METRIC_TIME_SERIES: &str = "/data/v0/llm/metric_time_series";
        pub const WORKOUTS: &str = "/data/v0/llm/apple_workouts";
        pub const SLEEP_CYCLES: &str = "/data/v0/llm/sleep_cycles";
        pub const LOCATION_AT_TIME: &str = "/data/v0/llm/location_at_time";
        pub const LOCATION_TIME_SERIES: &str = "/data/v0/llm/location_time_series";
    }
}

/// Upstream identity provider (Fulcra's Auth0 tenant) constants.
pub mod oidc {
    use std::time::Duration;

    /// Default OIDC domain.
    pub const DOMAIN: &str = "https://auth.fulcradynamics.com";

    /// Audience requested for the data API.
    pub const AUDIENCE: &str = "https://api.fulcradynamics.com/";

    /// Scopes requested upstream and granted to local credentials.
    pub const REQUIRED_SCOPES: &[&str] = &["openid", "profile", "name", "email"];

    /// Upper bound on the upstream code exchange.
    pub const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

    /// Path of this server's callback endpoint.
    pub const CALLBACK_PATH: &str = "/callback";
}

/// Default public base URL (matches the default listen port).
pub const DEFAULT_BASE_URL: &str = "http://localhost:4449";

/// Default interval of the expired-credential sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Settings for the upstream OIDC provider.
#[derive(Clone)]
pub struct OidcConfig {
    /// Provider base URL (authorize and token endpoints hang off it).
    pub domain: String,

    /// Client id this server is registered under upstream.
    pub client_id: String,

    /// Client secret, for confidential upstream registrations.
    pub client_secret: Option<String>,

    /// API audience to request.
    pub audience: String,

    /// Scopes to request.
    pub scopes: Vec<String>,

    /// Timeout for the code exchange.
    pub exchange_timeout: Duration,
}

impl OidcConfig {
    /// Create provider settings with the default domain, audience and scopes.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            domain: oidc::DOMAIN.to_string(),
            client_id: client_id.into(),
            client_secret: None,
            audience: oidc::AUDIENCE.to_string(),
            scopes: oidc::REQUIRED_SCOPES.iter().map(|s| (*s).to_string()).collect(),
            exchange_timeout: oidc::EXCHANGE_TIMEOUT,
        }
    }

    /// Authorization endpoint URL.
    #[must_use]
    pub fn authorize_endpoint(&self) -> String {
        format!("{}/authorize", self.domain.trim_end_matches('/'))
    }

    /// Token endpoint URL.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth/token", self.domain.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for OidcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcConfig")
            .field("domain", &self.domain)
            .field("client_id", &self.client_id)
            .field("has_client_secret", &self.client_secret.is_some())
            .field("audience", &self.audience)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Externally reachable base URL of this server.
    pub base_url: String,

    /// Upstream identity provider settings.
    pub oidc: OidcConfig,

    /// Base URL of the Fulcra data API (for testing with mock servers).
    pub api_url: String,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Cache TTL.
    pub cache_ttl: Duration,

    /// Maximum cache size.
    pub cache_max_size: u64,

    /// Interval of the expired-credential sweep (`None` disables it).
    pub sweep_interval: Option<Duration>,
}

impl Config {
    /// Create a new configuration for the given upstream client id.
    #[must_use]
    pub fn new(oidc_client_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            oidc: OidcConfig::new(oidc_client_id),
            api_url: api::BASE_URL.to_string(),
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            cache_ttl: api::CACHE_TTL,
            cache_max_size: api::CACHE_MAX_SIZE,
            sweep_interval: Some(DEFAULT_SWEEP_INTERVAL),
        }
    }

    /// Create a test configuration with every upstream pointed at a mock server.
    #[must_use]
    pub fn for_testing(mock_url: &str) -> Self {
        let mut oidc = OidcConfig::new("test-upstream-client");
        oidc.domain = mock_url.to_string();
        oidc.exchange_timeout = Duration::from_secs(5);

        Self {
            base_url: "https://mcp.example.com".to_string(),
            oidc,
            api_url: mock_url.to_string(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            cache_ttl: Duration::from_secs(0), // No caching in tests
            cache_max_size: 0,
            sweep_interval: None,
        }
    }

    /// Create configuration from environment variables (and `.env`, if present).
    ///
    /// # Errors
    ///
    /// Returns error if `FULCRA_OIDC_CLIENT_ID` is missing.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let client_id = std::env::var("FULCRA_OIDC_CLIENT_ID")
            .map_err(|_| anyhow::anyhow!("FULCRA_OIDC_CLIENT_ID must be set"))?;

        let mut config = Self::new(client_id);
        config.oidc.client_secret = std::env::var("FULCRA_OIDC_CLIENT_SECRET").ok();
        if let Ok(domain) = std::env::var("FULCRA_OIDC_DOMAIN") {
            config.oidc.domain = domain;
        }
        if let Ok(audience) = std::env::var("FULCRA_OIDC_AUDIENCE") {
            config.oidc.audience = audience;
        }
        if let Ok(base_url) = std::env::var("BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(api_url) = std::env::var("FULCRA_API_URL") {
            config.api_url = api_url;
        }
        Ok(config)
    }

    /// The fixed redirect target registered with the upstream provider.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), oidc::CALLBACK_PATH)
    }
}
