//! Authentication of inbound webhook deliveries.
//!
//! One [`WebhookAuthStrategy`] is active per deployment, selected by
//! [`AuthStrategyKind`] in configuration:
//!
//! | Kind | Checks |
//! |------|--------|
//! | `hmac_signature` | `X-Hub-Signature-256: sha256=<hex>` over the raw body, keyed by the app secret |
//! | `verify_token` | the shared verify token, from header or query string |
//!
//! A failed check means the payload is not processed.

use std::sync::Arc;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{instrument, warn};

use crate::error::SignatureError;
use crate::settings::IntegrationSettings;

/// Header carrying the HMAC-SHA256 signature of the body.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Header carrying the verify token under [`AuthStrategyKind::VerifyToken`].
pub const VERIFY_TOKEN_HEADER: &str = "X-Hub-Verify-Token";

/// Prefix of the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Parts of an inbound delivery relevant to authentication.
#[derive(Debug, Clone, Copy)]
pub struct InboundRequest<'a> {
    /// Exact bytes received, before any parsing.
    pub body: &'a [u8],
    pub signature_header: Option<&'a str>,
    /// Verify token from the header or the `hub.verify_token` query parameter.
    pub verify_token: Option<&'a str>,
}

/// Authenticates a delivery before it is dispatched.
#[async_trait]
pub trait WebhookAuthStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn authenticate(
        &self,
        request: &InboundRequest<'_>,
        settings: &IntegrationSettings,
    ) -> Result<(), SignatureError>;
}

// ============================================================================
// HMAC signature
// ============================================================================

/// Validates `X-Hub-Signature-256` in constant time.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSignatureStrategy;

impl HmacSignatureStrategy {
    /// Compute `sha256=<hex>` for `body` keyed by `secret`.
    pub fn sign(secret: &str, body: &[u8]) -> Result<String, SignatureError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| {
            SignatureError::Malformed {
                message: "secret cannot be used as HMAC key".to_string(),
            }
        })?;
        mac.update(body);
        Ok(format!(
            "{}{}",
            SIGNATURE_PREFIX,
            hex::encode(mac.finalize().into_bytes())
        ))
    }
}

#[async_trait]
impl WebhookAuthStrategy for HmacSignatureStrategy {
    fn name(&self) -> &'static str {
        "hmac_signature"
    }

    #[instrument(skip(self, request, settings), fields(body_len = request.body.len()))]
    async fn authenticate(
        &self,
        request: &InboundRequest<'_>,
        settings: &IntegrationSettings,
    ) -> Result<(), SignatureError> {
        let header = request
            .signature_header
            .ok_or_else(|| SignatureError::MissingHeader {
                header: SIGNATURE_HEADER.to_string(),
            })?;

        let hex_part = header
            .trim()
            .strip_prefix(SIGNATURE_PREFIX)
            .ok_or_else(|| SignatureError::Malformed {
                message: format!("expected '{}' prefix", SIGNATURE_PREFIX),
            })?;
        let provided = hex::decode(hex_part).map_err(|_| SignatureError::Malformed {
            message: "signature is not valid hex".to_string(),
        })?;

        if settings.app_secret.is_empty() {
            return Err(SignatureError::MissingSecret);
        }

        let mut mac = Hmac::<Sha256>::new_from_slice(settings.app_secret.expose_secret().as_bytes())
            .map_err(|_| SignatureError::MissingSecret)?;
        mac.update(request.body);
        let expected = mac.finalize().into_bytes();

        if bool::from(expected.as_slice().ct_eq(&provided)) {
            Ok(())
        } else {
            warn!("Webhook signature mismatch");
            Err(SignatureError::Mismatch)
        }
    }
}

// ============================================================================
// Shared verify token
// ============================================================================

/// Requires the stored webhook verify token on every delivery.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyTokenStrategy;

#[async_trait]
impl WebhookAuthStrategy for VerifyTokenStrategy {
    fn name(&self) -> &'static str {
        "verify_token"
    }

    async fn authenticate(
        &self,
        request: &InboundRequest<'_>,
        settings: &IntegrationSettings,
    ) -> Result<(), SignatureError> {
        let provided = request
            .verify_token
            .filter(|t| !t.is_empty())
            .ok_or(SignatureError::MissingVerifyToken)?;

        let expected = settings.webhook_verify_token.as_bytes();
        if !expected.is_empty() && bool::from(expected.ct_eq(provided.as_bytes())) {
            Ok(())
        } else {
            warn!("Webhook verify token mismatch");
            Err(SignatureError::VerifyTokenMismatch)
        }
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Configured authentication strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStrategyKind {
    #[default]
    HmacSignature,
    VerifyToken,
}

impl AuthStrategyKind {
    pub fn build(self) -> Arc<dyn WebhookAuthStrategy> {
        match self {
            Self::HmacSignature => Arc::new(HmacSignatureStrategy),
            Self::VerifyToken => Arc::new(VerifyTokenStrategy),
        }
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
