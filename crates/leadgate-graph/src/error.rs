//! Error types for Graph API operations.

use thiserror::Error;

/// Errors returned by Graph object reads.
#[derive(Debug, Clone, Error)]
pub enum GraphError {
    /// The object id cannot be placed in a request path.
    #[error("Invalid Graph object id: '{id}'")]
    InvalidId { id: String },

    /// Client could not be constructed.
    #[error("Invalid client configuration: {message}")]
    Configuration { message: String },

    /// Network connectivity or transport failure.
    #[error("HTTP request failed: {message}")]
    Transport { message: String },

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Graph returned an error envelope or a non-success status.
    #[error("Graph API error (status {status}): {message}")]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    /// Response body could not be decoded.
    #[error("Failed to parse Graph API response: {message}")]
    InvalidResponse { message: String },
}

impl GraphError {
    /// Check if this error represents a transient condition.
    ///
    /// Nothing in this crate retries; the classification is informational and
    /// is recorded alongside degraded enrichment results.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidId { .. } | Self::Configuration { .. } | Self::InvalidResponse { .. } => {
                false
            }
        }
    }
}

/// Errors returned by the authorization code exchange.
#[derive(Debug, Clone, Error)]
pub enum TokenExchangeError {
    /// Token endpoint rejected the request. `detail` is the provider's body.
    #[error("Failed to exchange code for token: {detail}")]
    Rejected { status: u16, detail: String },

    /// Token endpoint could not be reached.
    #[error("Failed to reach token endpoint: {message}")]
    Transport { message: String },

    /// Token endpoint answered with something that is neither JSON nor a form.
    #[error("Failed to parse token response: {message}")]
    InvalidResponse { message: String },

    /// Exchange succeeded at the HTTP level but carried no token.
    #[error("No access token received from Facebook")]
    MissingAccessToken,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
