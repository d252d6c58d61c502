//! Login Gateway Service
//!
//! Server-side "Login with Google" for a single front-end web client.
//!
//! # Features
//! - OpenID Connect discovery of the provider's endpoints
//! - OAuth 2.0 authorization code flow with HTTP Basic client authentication
//! - User info stored in a signed-cookie server-side session
//! - Optional time-bounded cache for provider metadata

pub mod auth;
pub mod config;
pub mod error;
pub mod server;

pub use auth::{DiscoveryClient, OidcClient, ProviderMetadata, SessionUser};
pub use config::{ConfigError, GatewayConfig, OAuthCredentials, RedirectUriPolicy};
pub use error::GatewayError;
pub use server::{build_router, start_server, AppState};
