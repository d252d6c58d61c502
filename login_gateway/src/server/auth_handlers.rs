//! Login Handlers
//!
//! HTTP handlers for the Google login flow:
//! - `/login` redirects the browser to the provider
//! - `/callback` exchanges the returned code and stores the user in the session
//! - `/logout` clears the session
//! - `/me` returns the session user to the front-end

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use crate::auth::SessionUser;
use crate::error::{GatewayError, Result};

use super::AppState;

/// Session key holding the logged-in user
pub const SESSION_USER_KEY: &str = "user";

pub const LOGIN_PATH: &str = "/login";

/// Query parameters the provider sends back to the callback
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// 302 Found
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Redirect to the provider's authorization endpoint.
///
/// The request carries no `state` parameter and nothing is written to the
/// session; the provider's redirect back with a `code` is the only signal
/// that continues the flow.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response> {
    let redirect_uri = state.callback_url(&headers)?;
    let metadata = state.oidc.discovery().provider_metadata().await?;
    let url = state.oidc.authorization_url(&metadata, redirect_uri.as_str());

    tracing::info!(
        "[INFO] Redirecting to {} (redirect_uri={})",
        metadata.authorization_endpoint,
        redirect_uri
    );

    Ok(found(url.as_str()))
}

/// Complete login: code exchange, user info, then the session write
pub async fn callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    query: std::result::Result<Query<CallbackQuery>, QueryRejection>,
) -> Result<Json<SessionUser>> {
    let Query(params) = query.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;

    if let Some(error) = params.error {
        let detail = match params.error_description {
            Some(description) => format!("{}: {}", error, description),
            None => error,
        };
        return Err(GatewayError::AuthorizationDenied(detail));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or(GatewayError::MissingAuthorizationCode)?;

    let redirect_uri = state.callback_url(&headers)?;
    let user = state.oidc.complete_login(&code, redirect_uri.as_str()).await?;

    // New id on every login so a cookie planted before it never becomes authenticated
    session
        .cycle_id()
        .await
        .map_err(|e| GatewayError::SessionStore(e.to_string()))?;
    session
        .insert(SESSION_USER_KEY, &user)
        .await
        .map_err(|e| GatewayError::SessionStore(e.to_string()))?;

    tracing::info!(
        subject = user.subject().unwrap_or("unknown"),
        "[OK] Login completed"
    );

    Ok(Json(user))
}

/// Clear the session and send the browser back to `/login`
pub async fn logout(session: Session) -> Result<Response> {
    session
        .flush()
        .await
        .map_err(|e| GatewayError::SessionStore(e.to_string()))?;

    Ok(found(LOGIN_PATH))
}

/// The logged-in user, or 401
pub async fn current_user(session: Session) -> Result<Response> {
    let user: Option<SessionUser> = session
        .get(SESSION_USER_KEY)
        .await
        .map_err(|e| GatewayError::SessionStore(e.to_string()))?;

    Ok(match user {
        Some(user) => Json(user).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "not authenticated" })),
        )
            .into_response(),
    })
}

pub async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
