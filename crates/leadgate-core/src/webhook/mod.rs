//! # Webhook Module
//!
//! Facebook page webhooks for the `leadgen` field:
//!
//! - [`WebhookVerifier`] answers the subscription handshake (`GET`)
//! - [`auth`] authenticates deliveries (`POST`)
//! - [`dispatcher`] turns authenticated deliveries into lead records

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::error::VerificationError;
use crate::settings::SettingsStore;

pub mod auth;
pub mod dispatcher;

pub use auth::{AuthStrategyKind, InboundRequest, WebhookAuthStrategy};
pub use dispatcher::{DispatchSummary, EventDispatcher};

/// The only `hub.mode` that completes a handshake.
pub const SUBSCRIBE_MODE: &str = "subscribe";

// ============================================================================
// Handshake
// ============================================================================

/// Query parameters of the subscription handshake.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationRequest {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,

    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,

    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Answers Facebook's subscription handshake.
#[derive(Clone)]
pub struct WebhookVerifier {
    settings: Arc<dyn SettingsStore>,
}

impl WebhookVerifier {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    /// Validate the handshake and return the challenge to echo.
    ///
    /// On success the subscription is marked active. A mismatched token
    /// leaves the settings untouched.
    #[instrument(skip(self, request), fields(mode = ?request.mode))]
    pub async fn verify(&self, request: &VerificationRequest) -> Result<String, VerificationError> {
        let mut settings = self
            .settings
            .load()
            .await
            .map_err(|e| VerificationError::Settings(e.into()))?;

        if !settings.enabled {
            warn!("Webhook handshake while integration is disabled");
            return Err(VerificationError::NotEnabled);
        }

        let provided = request.verify_token.as_deref().unwrap_or_default();
        if provided != settings.webhook_verify_token {
            warn!("Webhook handshake with mismatched verify token");
            return Err(VerificationError::TokenMismatch);
        }

        let mode = request.mode.as_deref().unwrap_or_default();
        if mode != SUBSCRIBE_MODE {
            return Err(VerificationError::InvalidMode {
                mode: mode.to_string(),
            });
        }

        settings.webhook_is_active = true;
        self.settings
            .save_unchecked(settings)
            .await
            .map_err(|e| VerificationError::Settings(e.into()))?;

        info!("Webhook subscription verified");
        Ok(request.challenge.clone().unwrap_or_default())
    }
}

// ============================================================================
// Payload helpers
// ============================================================================

/// Read an id that may be encoded as a JSON string or number.
pub fn json_id(value: &serde_json::Value, key: &str) -> Option<String> {
    match value.get(key)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
