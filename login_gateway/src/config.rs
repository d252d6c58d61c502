//! Gateway Configuration
//!
//! Everything the gateway needs from its environment is read once at startup
//! into a [`GatewayConfig`] and handed to the server by value. Handlers never
//! consult the process environment themselves.
//!
//! Required variables:
//! - `GOOGLE_CLIENT_ID`
//! - `GOOGLE_CLIENT_SECRET`
//! - `SESSION_SECRET_KEY` (at least 32 bytes)
//!
//! Optional variables:
//! - `GOOGLE_DISCOVERY_URL`: OpenID Connect discovery document
//! - `OAUTH_REDIRECT_URI`: fixed callback URL registered with the provider
//! - `HTTP_TIMEOUT_SECS`: timeout applied to every outbound call (default 10)
//! - `DISCOVERY_CACHE_TTL_SECS`: provider metadata cache lifetime (default 0, disabled)
//! - `SESSION_COOKIE_SECURE`: mark the session cookie `Secure` (default false)
//! - `SESSION_TTL_SECS`: session inactivity expiry (default 7 days)
//! - `FRONTEND_ORIGIN`: origin allowed to call the gateway with credentials

use sha2::{Digest, Sha512};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Google's OpenID Connect discovery document
pub const GOOGLE_DISCOVERY_URL: &str = "https://accounts.google.com/.well-known/openid-configuration";

/// Shortest session secret accepted at startup
pub const MIN_SESSION_SECRET_LEN: usize = 32;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 7;

/// Startup configuration errors. Any of these is fatal.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("SESSION_SECRET_KEY must be at least 32 bytes (got {0})")]
    WeakSessionSecret(usize),

    #[error("Invalid URL in {name}: {reason}")]
    InvalidUrl { name: &'static str, reason: String },

    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Client credentials registered with the identity provider, plus the
/// secret used to sign session cookies.
#[derive(Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    session_secret: Vec<u8>,
}

impl OAuthCredentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        session_secret: impl Into<Vec<u8>>,
    ) -> Result<Self, ConfigError> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        let session_secret = session_secret.into();

        if client_id.trim().is_empty() {
            return Err(ConfigError::Missing("GOOGLE_CLIENT_ID"));
        }
        if client_secret.trim().is_empty() {
            return Err(ConfigError::Missing("GOOGLE_CLIENT_SECRET"));
        }
        if session_secret.is_empty() {
            return Err(ConfigError::Missing("SESSION_SECRET_KEY"));
        }
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::WeakSessionSecret(session_secret.len()));
        }

        Ok(Self {
            client_id,
            client_secret,
            session_secret,
        })
    }

    /// 64-byte cookie signing key derived from the session secret (SHA-512).
    pub fn session_signing_key(&self) -> [u8; 64] {
        let digest = Sha512::digest(&self.session_secret);
        let mut key = [0u8; 64];
        key.copy_from_slice(&digest);
        key
    }
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("session_secret", &"<redacted>")
            .finish()
    }
}

/// How the `redirect_uri` sent to the provider is chosen
#[derive(Debug, Clone, PartialEq)]
pub enum RedirectUriPolicy {
    /// A pre-registered callback URL, used verbatim
    Fixed(Url),
    /// `{scheme}://{Host}/callback`, taken from the incoming request.
    /// Trusts the `Host` header; prefer `Fixed` behind anything public.
    FromRequestHost,
}

/// Process-wide gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub credentials: OAuthCredentials,
    pub discovery_url: Url,
    pub redirect_uri: RedirectUriPolicy,
    pub http_timeout: Duration,
    /// Zero disables caching: metadata is fetched on every request
    pub discovery_cache_ttl: Duration,
    pub secure_cookies: bool,
    pub session_ttl: Duration,
    pub frontend_origin: Option<String>,
}

impl GatewayConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let client_id = get("GOOGLE_CLIENT_ID").ok_or(ConfigError::Missing("GOOGLE_CLIENT_ID"))?;
        let client_secret =
            get("GOOGLE_CLIENT_SECRET").ok_or(ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?;
        let session_secret =
            get("SESSION_SECRET_KEY").ok_or(ConfigError::Missing("SESSION_SECRET_KEY"))?;
        let credentials = OAuthCredentials::new(client_id, client_secret, session_secret.into_bytes())?;

        let discovery_url = parse_url(
            "GOOGLE_DISCOVERY_URL",
            get("GOOGLE_DISCOVERY_URL").as_deref().unwrap_or(GOOGLE_DISCOVERY_URL),
        )?;

        let redirect_uri = match get("OAUTH_REDIRECT_URI") {
            Some(raw) => RedirectUriPolicy::Fixed(parse_url("OAUTH_REDIRECT_URI", &raw)?),
            None => RedirectUriPolicy::FromRequestHost,
        };

        let http_timeout = Duration::from_secs(parse_secs(
            "HTTP_TIMEOUT_SECS",
            get("HTTP_TIMEOUT_SECS"),
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);
        if http_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "HTTP_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        let discovery_cache_ttl = Duration::from_secs(parse_secs(
            "DISCOVERY_CACHE_TTL_SECS",
            get("DISCOVERY_CACHE_TTL_SECS"),
            0,
        )?);

        let session_ttl = Duration::from_secs(parse_secs(
            "SESSION_TTL_SECS",
            get("SESSION_TTL_SECS"),
            DEFAULT_SESSION_TTL_SECS,
        )?);

        let secure_cookies = match get("SESSION_COOKIE_SECURE") {
            Some(raw) => parse_bool("SESSION_COOKIE_SECURE", &raw)?,
            None => false,
        };

        Ok(Self {
            credentials,
            discovery_url,
            redirect_uri,
            http_timeout,
            discovery_cache_ttl,
            secure_cookies,
            session_ttl,
            frontend_origin: get("FRONTEND_ORIGIN"),
        })
    }
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        name,
        reason: e.to_string(),
    })
}

fn parse_secs(name: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
        }),
    }
}
