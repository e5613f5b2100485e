//! OAuth2 authorization code exchange.
//!
//! The token endpoint answers either with JSON or with a URL-encoded form body
//! (older Graph versions). Both are normalised into [`TokenResponse`].

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::client::GraphClient;
use crate::error::TokenExchangeError;

/// Exchanges an authorization code for an access token.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange_code(
        &self,
        request: &TokenRequest,
    ) -> Result<TokenResponse, TokenExchangeError>;
}

/// Parameters POSTed to the token endpoint.
#[derive(Clone)]
pub struct TokenRequest {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub code: String,
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<REDACTED>")
            .field("redirect_uri", &self.redirect_uri)
            .field("code", &"<REDACTED>")
            .finish()
    }
}

/// Lifetime hint returned by the token endpoint.
///
/// JSON responses carry a number; form responses and some proxies carry text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ExpiresIn {
    Seconds(i64),
    Text(String),
}

impl ExpiresIn {
    /// Interpret a raw form value, preferring whole seconds.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(seconds) => Self::Seconds(seconds),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }
}

/// Normalised token endpoint response.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default, alias = "expires")]
    pub expires_in: Option<ExpiresIn>,

    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Parse a token endpoint body.
///
/// JSON is used when the content type says so or the body looks like an
/// object; otherwise the body is read as `application/x-www-form-urlencoded`
/// with keys `access_token`, `expires` (or `expires_in`) and `token_type`.
///
/// # Errors
///
/// Returns [`TokenExchangeError::InvalidResponse`] when a JSON body cannot be
/// decoded.
pub fn parse_token_response(
    content_type: Option<&str>,
    body: &str,
) -> Result<TokenResponse, TokenExchangeError> {
    let is_json = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false)
        || body.trim_start().starts_with('{');

    if is_json {
        return serde_json::from_str(body).map_err(|e| TokenExchangeError::InvalidResponse {
            message: e.to_string(),
        });
    }

    let pairs: HashMap<String, String> = url::form_urlencoded::parse(body.trim().as_bytes())
        .into_owned()
        .collect();

    let expires_in = pairs
        .get("expires")
        .or_else(|| pairs.get("expires_in"))
        .filter(|v| !v.is_empty())
        .map(|v| ExpiresIn::from_text(v));

    Ok(TokenResponse {
        access_token: pairs.get("access_token").filter(|v| !v.is_empty()).cloned(),
        expires_in,
        token_type: pairs
            .get("token_type")
            .cloned()
            .unwrap_or_else(default_token_type),
    })
}

#[async_trait]
impl TokenExchanger for GraphClient {
    #[instrument(skip(self, request), fields(token_url = %request.token_url))]
    async fn exchange_code(
        &self,
        request: &TokenRequest,
    ) -> Result<TokenResponse, TokenExchangeError> {
        let form = [
            ("client_id", request.client_id.as_str()),
            ("client_secret", request.client_secret.as_str()),
            ("redirect_uri", request.redirect_uri.as_str()),
            ("code", request.code.as_str()),
        ];

        let response = self
            .http_client()
            .post(&request.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| TokenExchangeError::Transport {
                message: self.map_send_error(e).to_string(),
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| TokenExchangeError::Transport {
                message: format!("Failed to read token response: {}", e),
            })?;

        if !status.is_success() {
            warn!(status = %status, "Token endpoint rejected authorization code");
            return Err(TokenExchangeError::Rejected {
                status: status.as_u16(),
                detail: body,
            });
        }

        let token = parse_token_response(content_type.as_deref(), &body)?;
        info!(
            has_token = token.access_token.is_some(),
            expires_in = ?token.expires_in,
            "Received token endpoint response"
        );
        Ok(token)
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
