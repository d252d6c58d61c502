use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Request-scoped failures of the login flow.
///
/// Every variant is terminal for the request that raised it. None of them
/// are retried, and none leave a partially written session behind.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Failed to fetch provider configuration: {0}")]
    ProviderUnavailable(String),

    #[error("Failed to exchange token: {0}")]
    TokenExchangeFailed(String),

    #[error("Failed to fetch user info: {0}")]
    UserInfoFetchFailed(String),

    #[error("Session store error: {0}")]
    SessionStore(String),

    #[error("Authorization denied by provider: {0}")]
    AuthorizationDenied(String),

    #[error("Missing authorization code")]
    MissingAuthorizationCode,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Name of the flow stage that failed, reported in the error body
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ProviderUnavailable(_) => "discovery",
            Self::TokenExchangeFailed(_) => "token_exchange",
            Self::UserInfoFetchFailed(_) => "userinfo",
            Self::SessionStore(_) => "session",
            Self::AuthorizationDenied(_) => "authorization",
            Self::MissingAuthorizationCode => "callback",
            Self::InvalidRequest(_) => "request",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthorizationDenied(_)
            | Self::MissingAuthorizationCode
            | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let stage = self.stage();

        if status.is_server_error() {
            tracing::error!(stage, "[ERROR] {}", self);
        } else {
            tracing::warn!(stage, "[WARN] {}", self);
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "stage": stage,
        });

        (status, Json(body)).into_response()
    }
}
