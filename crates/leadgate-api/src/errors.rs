//! Error types for the HTTP service

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use leadgate_core::accounts::AccountError;
use leadgate_core::oauth::OAuthError;
use leadgate_core::{
    ConfigurationError, DispatchError, PersistenceError, SettingsError, SignatureError,
    StoreError, WebFormError,
};
use tracing::{error, warn};

/// Message returned in place of internal error details.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error occurred. Please try again later.";

/// JSON endpoint errors with HTTP status code mapping
///
/// - `400 Bad Request`: configuration problems, malformed payloads and
///   invalid form submissions
/// - `401 Unauthorized`: administrative requests without a valid bearer token
/// - `403 Forbidden`: webhook deliveries that fail authentication, and
///   administrative requests while no admin token is configured
/// - `404 Not Found`: unknown leads and web forms
/// - `409 Conflict`: a lead with the same id already exists
/// - `502 Bad Gateway`: a Graph API listing the caller asked for failed
/// - `500 Internal Server Error`: store failures and other unexpected errors
///
/// Details of 500 responses are logged server-side; clients receive a generic
/// message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    OAuth(#[from] OAuthError),

    /// Maps to: `403 Forbidden`; the payload is never processed
    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    WebForm(#[from] WebFormError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Account(#[from] AccountError),

    /// Maps to: `401 Unauthorized` with a `WWW-Authenticate: Bearer` challenge
    #[error("Administrative access requires a valid bearer token")]
    Unauthorized,

    #[error("Administrative access is not configured")]
    AdminDisabled,

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Configuration(_) => StatusCode::BAD_REQUEST,
            Self::Settings(SettingsError::Configuration(_)) => StatusCode::BAD_REQUEST,
            Self::Settings(SettingsError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::OAuth(OAuthError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::OAuth(_) => StatusCode::BAD_REQUEST,
            Self::Signature(_) => StatusCode::FORBIDDEN,
            Self::Dispatch(DispatchError::InvalidPayload { .. }) => StatusCode::BAD_REQUEST,
            Self::Dispatch(DispatchError::Internal { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::WebForm(WebFormError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::WebForm(WebFormError::InvalidSubmission { .. }) => StatusCode::BAD_REQUEST,
            Self::WebForm(WebFormError::Persistence(PersistenceError::AlreadyExists {
                ..
            })) => StatusCode::CONFLICT,
            Self::WebForm(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Account(AccountError::MissingAccessToken) => StatusCode::BAD_REQUEST,
            Self::Account(AccountError::Graph(_)) => StatusCode::BAD_GATEWAY,
            Self::Account(AccountError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::AdminDisabled => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status.is_server_error() {
            // Log detailed error server-side but return generic message to client
            error!(error = %self, "Internal server error occurred");
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
                warn!(error = %self, "Request rejected");
            }
            self.to_string()
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], Json(body)).into_response();
        }
        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Failed to initialise {component}: {message}")]
    Initialization { component: String, message: String },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration parsing failed: {0}")]
    Parsing(#[from] serde_yaml::Error),
}
