//! OAuth2 authorization-code flow against Facebook.
//!
//! [`OAuthFlow::begin_authorization`] issues a single-use CSRF state and the
//! dialog URL; [`OAuthFlow::handle_callback`] consumes that state, exchanges
//! the code for an access token and stores it. Tokens are never refreshed in
//! place: an expired token always means authorizing again.

use std::sync::Arc;

use leadgate_graph::{ExpiresIn, TokenExchangeError, TokenExchanger, TokenRequest};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::error::{ConfigurationError, StateValidationError, StoreError};
use crate::settings::{SettingsStore, TokenInfo};
use crate::state_cache::{generate_state_token, StateCache, AUTHORIZATION_STATE_TTL};
use crate::Timestamp;

/// Path of the OAuth callback relative to the site URL.
pub const CALLBACK_PATH: &str = "/oauth/callback";

/// Lifetime assumed for tokens whose expiry text cannot be interpreted.
pub const FALLBACK_TOKEN_LIFETIME_SECS: i64 = 3600;

// ============================================================================
// Errors
// ============================================================================

/// Failure to start authorization or report token state.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OAuthError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid authorization URL: {message}")]
    InvalidAuthorizationUrl { message: String },
}

/// Failure while handling the provider redirect.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CallbackError {
    /// The user or Facebook declined the authorization.
    #[error("Authorization failed: {error}")]
    ProviderDenied {
        error: String,
        description: Option<String>,
    },

    /// The callback was opened without `code` and `state`.
    #[error("This endpoint is only accessible through the Facebook OAuth2 flow")]
    InvalidAccess,

    #[error(transparent)]
    InvalidState(#[from] StateValidationError),

    #[error(transparent)]
    TokenExchange(#[from] TokenExchangeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CallbackError {
    /// Whether trying the authorization again might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::TokenExchange(e) => matches!(e, TokenExchangeError::Transport { .. }),
            Self::Store(e) => e.is_transient(),
            _ => false,
        }
    }
}

// ============================================================================
// Requests and outcomes
// ============================================================================

/// Everything the browser needs to start authorization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorizationRequest {
    pub authorization_url: String,
    pub redirect_uri: String,
    pub state: String,
}

/// Query parameters of the provider redirect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Successful callback.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizedToken {
    /// `None` for long-lived tokens without expiry.
    pub token_expiry: Option<Timestamp>,
}

/// Answer to a token refresh request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReauthorizationRequired {
    pub message: String,
    pub authorization_url: String,
}

/// Turn the token endpoint's lifetime hint into an absolute expiry.
///
/// - positive seconds (number or numeric text): `now + seconds`
/// - RFC3339 text: that instant
/// - other text: `now + 1h`
/// - absent or non-positive: no expiry
/// - a lifetime too large to represent: no expiry
pub fn normalize_token_expiry(expires_in: Option<&ExpiresIn>, now: Timestamp) -> Option<Timestamp> {
    match expires_in? {
        ExpiresIn::Seconds(seconds) if *seconds > 0 => expiry_after(now, *seconds),
        ExpiresIn::Seconds(_) => None,
        ExpiresIn::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            if let Ok(seconds) = text.parse::<i64>() {
                return if seconds > 0 { expiry_after(now, seconds) } else { None };
            }
            match Timestamp::from_rfc3339(text) {
                Ok(instant) => Some(instant),
                Err(_) => {
                    warn!(expires_in = %text, "Unrecognized token expiry; assuming one hour");
                    expiry_after(now, FALLBACK_TOKEN_LIFETIME_SECS)
                }
            }
        }
    }
}

fn expiry_after(now: Timestamp, seconds: i64) -> Option<Timestamp> {
    let expiry = now.add_seconds(seconds);
    if expiry.is_none() {
        warn!(expires_in = seconds, "Token lifetime out of range; treating as long-lived");
    }
    expiry
}

// ============================================================================
// Flow
// ============================================================================

/// Authorization initiator and callback handler.
#[derive(Clone)]
pub struct OAuthFlow {
    settings: Arc<dyn SettingsStore>,
    states: Arc<dyn StateCache>,
    exchanger: Arc<dyn TokenExchanger>,
    site_url: String,
}

impl OAuthFlow {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        states: Arc<dyn StateCache>,
        exchanger: Arc<dyn TokenExchanger>,
        site_url: impl Into<String>,
    ) -> Self {
        Self {
            settings,
            states,
            exchanger,
            site_url: site_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Redirect URI registered with Facebook.
    pub fn redirect_uri(&self) -> String {
        format!("{}{}", self.site_url, CALLBACK_PATH)
    }

    /// Callback URL shown on the test page.
    pub fn callback_url(&self) -> String {
        self.redirect_uri()
    }

    /// Start authorization for `identity`.
    ///
    /// Stores one state entry for ten minutes and returns the dialog URL.
    #[instrument(skip(self))]
    pub async fn begin_authorization(
        &self,
        identity: &str,
    ) -> Result<AuthorizationRequest, OAuthError> {
        let settings = self.settings.load().await?;
        if !settings.enabled {
            return Err(ConfigurationError::NotEnabled.into());
        }
        if settings.app_id.trim().is_empty() {
            return Err(ConfigurationError::MissingAppId.into());
        }

        let redirect_uri = self.redirect_uri();
        let state = generate_state_token();
        let authorization_url = url::Url::parse_with_params(
            &settings.authorization_url,
            &[
                ("client_id", settings.app_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("scope", settings.scope.as_str()),
                ("response_type", "code"),
                ("state", state.as_str()),
            ],
        )
        .map_err(|e| OAuthError::InvalidAuthorizationUrl {
            message: e.to_string(),
        })?;

        self.states
            .put(&state, identity, AUTHORIZATION_STATE_TTL)
            .await?;

        info!("Authorization started");
        Ok(AuthorizationRequest {
            authorization_url: authorization_url.into(),
            redirect_uri,
            state,
        })
    }

    /// Handle the provider redirect.
    #[instrument(skip(self, params), fields(has_code = params.code.is_some()))]
    pub async fn handle_callback(
        &self,
        params: CallbackParams,
    ) -> Result<AuthorizedToken, CallbackError> {
        if let Some(error) = params.error.filter(|e| !e.is_empty()) {
            warn!(error = %error, "Authorization denied by provider");
            return Err(CallbackError::ProviderDenied {
                error,
                description: params.error_description,
            });
        }

        let (code, state) = match (params.code, params.state) {
            (Some(code), Some(state)) if !code.is_empty() && !state.is_empty() => (code, state),
            _ => return Err(CallbackError::InvalidAccess),
        };

        let identity = self
            .states
            .take(&state)
            .await?
            .ok_or(StateValidationError::UnknownOrExpired)?;

        let mut settings = self.settings.load().await?;
        let request = TokenRequest {
            token_url: settings.access_token_url.clone(),
            client_id: settings.app_id.clone(),
            client_secret: settings.app_secret.expose_secret().to_string(),
            redirect_uri: self.redirect_uri(),
            code,
        };

        let response = self.exchanger.exchange_code(&request).await?;
        let access_token = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(TokenExchangeError::MissingAccessToken)?;

        let token_expiry = normalize_token_expiry(response.expires_in.as_ref(), Timestamp::now());
        settings.set_access_token(access_token, token_expiry);
        self.settings.save_unchecked(settings.clone()).await?;

        let stored = self.settings.load().await?;
        if stored.access_token() != settings.access_token() {
            error!("Access token was not saved properly");
        }

        info!(identity = %identity, token_expiry = ?token_expiry, "Access token stored");
        Ok(AuthorizedToken { token_expiry })
    }

    /// Tokens cannot be refreshed in place; always start a new authorization.
    pub async fn refresh_token(
        &self,
        identity: &str,
    ) -> Result<ReauthorizationRequired, OAuthError> {
        let request = self.begin_authorization(identity).await?;
        Ok(ReauthorizationRequired {
            message: "Please re-authorize to get a new token".to_string(),
            authorization_url: request.authorization_url,
        })
    }

    /// Describe the stored token.
    pub async fn token_info(&self, now: Timestamp) -> Result<TokenInfo, OAuthError> {
        let settings = self.settings.load().await?;
        if !settings.enabled {
            return Err(ConfigurationError::NotEnabled.into());
        }
        Ok(settings.token_info(now))
    }
}

#[cfg(test)]
#[path = "oauth_tests.rs"]
mod tests;
