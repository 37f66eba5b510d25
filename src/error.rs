use crate::cache::CacheError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The user or HubSpot declined the authorization request
    #[error("Authorization denied: {0}")]
    ProviderDenied(String),
    /// CSRF check failed or the state record expired
    #[error("State does not match.")]
    StateMismatch,
    #[error("Credentials not found.")]
    CredentialsNotFound,
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
    #[error("Error fetching HubSpot items: {0}")]
    ItemFetch(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ProviderDenied(_)
            | AppError::StateMismatch
            | AppError::CredentialsNotFound
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::TokenExchange(_) => StatusCode::BAD_GATEWAY,
            AppError::ItemFetch(_)
            | AppError::Cache(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable kind for the response body
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ProviderDenied(_) => "provider_denied",
            AppError::StateMismatch => "state_mismatch",
            AppError::CredentialsNotFound => "credentials_not_found",
            AppError::TokenExchange(_) => "token_exchange_failed",
            AppError::ItemFetch(_) => "item_fetch_failed",
            AppError::BadRequest(_) => "bad_request",
            AppError::Cache(_) => "cache_error",
            AppError::Config(_) => "configuration_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string()
        }));

        (status, body).into_response()
    }
}
