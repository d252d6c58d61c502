//! Login Gateway HTTP Server
//!
//! Wires the login handlers to an axum router behind a signed-cookie session
//! layer and request tracing.

pub mod auth_handlers;

use crate::auth::{DiscoveryClient, OidcClient};
use crate::config::{GatewayConfig, RedirectUriPolicy};
use crate::error::{GatewayError, Result};
use axum::{
    http::{header, HeaderMap, HeaderValue, Method},
    routing::get,
    Router as AxumRouter,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{
    cookie::{Key, SameSite},
    Expiry, MemoryStore, SessionManagerLayer,
};
use tracing::info;
use url::Url;

/// Cookie carrying the signed session id
pub const SESSION_COOKIE_NAME: &str = "login_gateway_session";

/// Path the provider redirects back to
pub const CALLBACK_PATH: &str = "/callback";

/// Application state shared across handlers
pub struct AppState {
    pub config: GatewayConfig,
    pub oidc: OidcClient,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        let discovery = DiscoveryClient::new(
            http_client.clone(),
            config.discovery_url.clone(),
            config.discovery_cache_ttl,
        );
        let oidc = OidcClient::new(&config.credentials, http_client, discovery);

        Ok(Self { config, oidc })
    }

    /// Callback URL sent as `redirect_uri`; identical for `/login` and `/callback`
    pub fn callback_url(&self, headers: &HeaderMap) -> Result<Url> {
        match &self.config.redirect_uri {
            RedirectUriPolicy::Fixed(url) => Ok(url.clone()),
            RedirectUriPolicy::FromRequestHost => {
                let host = headers
                    .get(header::HOST)
                    .and_then(|v| v.to_str().ok())
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| GatewayError::InvalidRequest("missing Host header".to_string()))?;
                if host.contains(['/', '?', '#', '@', '\\', ' ']) {
                    return Err(GatewayError::InvalidRequest(format!("invalid Host header: {:?}", host)));
                }

                let scheme = match headers
                    .get("x-forwarded-proto")
                    .and_then(|v| v.to_str().ok())
                {
                    Some(proto) if proto.eq_ignore_ascii_case("https") => "https",
                    _ => "http",
                };

                Url::parse(&format!("{}://{}{}", scheme, host, CALLBACK_PATH))
                    .map_err(|e| GatewayError::InvalidRequest(format!("invalid Host header: {}", e)))
            }
        }
    }
}

/// Build the gateway router:
/// - GET /login - Redirect to the provider's authorization endpoint
/// - GET /callback - Complete login and store the user in the session
/// - GET /logout - Clear the session and redirect to /login
/// - GET /me - Current session user
/// - GET /healthz - Liveness probe
pub fn build_router(state: Arc<AppState>) -> anyhow::Result<AxumRouter> {
    let config = &state.config;

    let ttl_secs = i64::try_from(config.session_ttl.as_secs())
        .map_err(|_| anyhow::anyhow!("Session TTL out of range"))?;
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_secure(config.secure_cookies)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(ttl_secs)))
        .with_signed(Key::from(&config.credentials.session_signing_key()));

    let cors = cors_layer(config)?;

    let router = AxumRouter::new()
        .route("/login", get(auth_handlers::login))
        .route(CALLBACK_PATH, get(auth_handlers::callback))
        .route("/logout", get(auth_handlers::logout))
        .route("/me", get(auth_handlers::current_user))
        .route("/healthz", get(auth_handlers::healthz))
        .with_state(state)
        .layer(session_layer);

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    Ok(router.layer(TraceLayer::new_for_http()))
}

fn cors_layer(config: &GatewayConfig) -> anyhow::Result<Option<CorsLayer>> {
    let Some(origin) = &config.frontend_origin else {
        return Ok(None);
    };

    let origin = HeaderValue::from_str(origin)
        .map_err(|e| anyhow::anyhow!("Invalid FRONTEND_ORIGIN {:?}: {}", origin, e))?;

    Ok(Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET])
            .allow_credentials(true),
    ))
}

/// Start the Login Gateway HTTP server
///
/// # Errors
/// Returns error if the HTTP client cannot be built or server binding fails
pub async fn start_server(host: &str, port: u16, config: GatewayConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config)?);

    match &state.config.redirect_uri {
        RedirectUriPolicy::Fixed(url) => info!("[OK] Redirect URI fixed at {}", url),
        RedirectUriPolicy::FromRequestHost => {
            tracing::warn!("[WARN] Redirect URI derived from request Host header; set OAUTH_REDIRECT_URI in production")
        }
    }
    if state.config.discovery_cache_ttl.is_zero() {
        info!("[OK] Provider metadata fetched per request");
    } else {
        info!(
            "[OK] Provider metadata cached for {}s",
            state.config.discovery_cache_ttl.as_secs()
        );
    }

    let app = build_router(state)?;

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;

    info!("[INFO] Login Gateway listening on {}", addr);
    info!("[INFO] Available endpoints:");
    info!("  GET    /login       - Start Google login");
    info!("  GET    /callback    - OAuth callback handler");
    info!("  GET    /logout      - Clear session");
    info!("  GET    /me          - Current session user");
    info!("  GET    /healthz     - Liveness probe");

    axum::serve(listener, app).await?;

    Ok(())
}
