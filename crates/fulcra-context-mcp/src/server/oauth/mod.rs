//! OAuth 2.0 token relay for MCP authentication.
//!
//! Downstream MCP clients (e.g. a Claude.ai Custom Connector) speak plain
//! OAuth with PKCE to this server. The user actually signs in at Fulcra's
//! Auth0 tenant; the credential issued there never leaves the server and is
//! only attached to outgoing data API calls.
//!
//! ```text
//! client ── /authorize ──▶ relay ── 302 ──▶ upstream login
//! client ◀── 302 code ──── relay ◀── /callback ── upstream
//! client ── /token ──────▶ relay    (local token ⇢ upstream credential)
//! ```
//!
//! ## Supported Standards
//! - RFC 9728: OAuth Protected Resource Metadata
//! - RFC 8414: OAuth Authorization Server Metadata
//! - RFC 7591: Dynamic Client Registration
//! - RFC 7636: PKCE (S256)
//! - RFC 6749: Authorization Code Grant
//! - RFC 7009: Token Revocation

pub mod handlers;
pub mod pkce;
pub mod proxy;
pub mod store;
pub mod types;
pub mod upstream;

pub use proxy::OAuthProxy;
pub use store::{CredentialStore, MemoryStore};
pub use types::UpstreamCredential;
pub use upstream::{Auth0Provider, IdentityProvider};
