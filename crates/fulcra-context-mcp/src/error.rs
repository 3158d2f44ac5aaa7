//! Error types for the Fulcra Context MCP server.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

use std::time::Duration;

/// Errors from the Fulcra data API client.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// Upstream credential rejected (401/403 response)
    #[error("Unauthorized by data API")]
    Unauthorized,

    /// Rate limited by the data API (429 response)
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Suggested wait time before retry
        retry_after: Duration,
    },

    /// Resource not found (404 response)
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Invalid request parameters (400 response)
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message from API
        message: String,
    },

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl ClientError {
    /// Create a rate limited error with retry-after duration.
    #[must_use]
    pub fn rate_limited(seconds: u64) -> Self {
        Self::RateLimited { retry_after: Duration::from_secs(seconds) }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Server { .. })
    }
}

/// Errors from MCP tool execution.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    /// Error from the API client
    #[error("API error: {0}")]
    Client(#[from] ClientError),

    /// Input validation failed
    #[error("Validation error: {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    /// Convert to a user-friendly error message for MCP response.
    #[must_use]
    pub fn to_user_message(&self) -> String {
        match self {
            Self::Client(ClientError::Unauthorized) => {
                "Fulcra rejected the stored credential. Please re-authorize this connector."
                    .to_string()
            }
            Self::Client(ClientError::RateLimited { retry_after }) => {
                format!("Rate limited by the Fulcra API. Please wait {retry_after:?} before retrying.")
            }
            Self::Client(ClientError::NotFound { .. }) => {
                "No data found for the requested resource.".to_string()
            }
            Self::Validation { field, message } => {
                format!("Invalid input for '{field}': {message}")
            }
            Self::Serialization(e) => format!("Invalid arguments: {e}"),
            _ => self.to_string(),
        }
    }
}

/// OAuth protocol errors surfaced to downstream clients.
///
/// Display strings are generic on purpose: they end up in HTTP responses.
/// Upstream detail is logged where the error is created, never carried here.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OAuthError {
    /// The client id is not registered.
    #[error("Unknown client")]
    ClientNotFound,

    /// The authorization request references an invalid client or redirect URI.
    #[error("Authorization request rejected: {0}")]
    Authorization(String),

    /// The `state` parameter is unknown or was already used.
    #[error("Invalid or expired state parameter")]
    InvalidState,

    /// The upstream identity provider did not issue a credential.
    #[error("Failed to complete authorization with the identity provider")]
    UpstreamExchange,

    /// The authorization code is unknown, expired, or already used.
    #[error("Invalid or expired authorization code")]
    InvalidGrant,

    /// Refresh tokens are not issued by this server.
    #[error("Grant type not supported")]
    UnsupportedGrant,

    /// The bearer token is missing, expired, or not linked to a credential.
    #[error("Authentication required")]
    NotAuthenticated,

    /// A required request parameter is missing or malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl OAuthError {
    /// OAuth 2.0 `error` code for this error (RFC 6749 §4.1.2.1, §5.2).
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ClientNotFound => "invalid_client",
            Self::Authorization(_) => "unauthorized_client",
            Self::InvalidState | Self::InvalidRequest(_) => "invalid_request",
            Self::UpstreamExchange => "access_denied",
            Self::InvalidGrant => "invalid_grant",
            Self::UnsupportedGrant => "unsupported_grant_type",
            Self::NotAuthenticated => "invalid_token",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::ClientNotFound | Self::NotAuthenticated => 401,
            _ => 400,
        }
    }
}

/// Errors from the upstream identity provider. Logged only, never returned to clients.
#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    /// HTTP transport error, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token endpoint answered with a non-success status.
    #[error("Token endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Token endpoint answered 2xx without an access token.
    #[error("Token response did not contain an access token")]
    MissingToken,
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Result type alias for OAuth operations.
pub type OAuthResult<T> = Result<T, OAuthError>;
