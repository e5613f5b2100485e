//! Error taxonomy for authorization, webhook handling and persistence.
//!
//! Handshake and callback failures are surfaced to the browser, webhook
//! delivery failures map onto HTTP status codes, and enrichment problems never
//! become errors at all (see [`crate::enrichment::EnrichmentDegraded`]).

use thiserror::Error;

/// Integration is disabled or missing credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Facebook Lead Ads is not enabled")]
    NotEnabled,

    #[error("App ID is required when Facebook Lead Ads is enabled")]
    MissingAppId,

    #[error("App Secret is required when Facebook Lead Ads is enabled")]
    MissingAppSecret,

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Failure of a backing store (settings, cache, leads, forms).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Store operation failed: {message}")]
    OperationFailed { message: String },
}

impl StoreError {
    /// Store failures are assumed to be temporary.
    pub fn is_transient(&self) -> bool {
        true
    }
}

/// Failure to persist integration settings.
#[derive(Debug, Clone, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// CSRF state rejected during the OAuth callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateValidationError {
    #[error("The authorization state is invalid or has expired")]
    UnknownOrExpired,
}

/// Subscription handshake (`GET /webhook`) failures.
///
/// None of the variants carry the expected verify token.
#[derive(Debug, Clone, Error)]
pub enum VerificationError {
    #[error("Facebook Lead Ads is not enabled")]
    NotEnabled,

    #[error("Webhook verification failed: verify token does not match")]
    TokenMismatch,

    #[error("Invalid hub.mode '{mode}'")]
    InvalidMode { mode: String },

    #[error("Failed to persist webhook state: {0}")]
    Settings(#[from] SettingsError),
}

/// Inbound delivery authentication failures (`POST /webhook`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Missing {header} header")]
    MissingHeader { header: String },

    #[error("Malformed signature: {message}")]
    Malformed { message: String },

    #[error("App secret is not configured; cannot verify signature")]
    MissingSecret,

    #[error("Signature does not match payload")]
    Mismatch,

    #[error("Missing webhook verify token")]
    MissingVerifyToken,

    #[error("Webhook verify token does not match")]
    VerifyTokenMismatch,
}

/// Lead record persistence failures.
#[derive(Debug, Clone, Error)]
pub enum PersistenceError {
    /// A record with the same external lead id already exists.
    ///
    /// Ingestion treats this as a successful no-op.
    #[error("Lead {external_lead_id} already exists")]
    AlreadyExists { external_lead_id: String },

    #[error("Lead {external_lead_id} not found")]
    NotFound { external_lead_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PersistenceError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Delivery-level dispatch failures (`POST /webhook`).
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Web form generation and submission failures.
#[derive(Debug, Clone, Error)]
pub enum WebFormError {
    #[error("Web form '{route}' not found")]
    NotFound { route: String },

    #[error("Invalid form submission: {message}")]
    InvalidSubmission { message: String },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
