//! OpenID Connect relying-party pieces: provider discovery and the
//! authorization code exchange.

pub mod discovery;
pub mod oidc;

pub use discovery::{DiscoveryClient, MetadataCache, ProviderMetadata};
pub use oidc::{OidcClient, SessionUser, TokenResponse, SCOPES};
