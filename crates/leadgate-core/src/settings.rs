//! Integration settings singleton and token store.
//!
//! [`IntegrationSettings`] holds the Facebook App credentials, the current
//! access token and the webhook verification secret. It is read and written
//! through a [`SettingsStore`], which owns the "before save" behaviour:
//!
//! - [`SettingsStore::save`] validates and fills webhook defaults
//! - [`SettingsStore::save_unchecked`] persists as-is; the OAuth callback uses
//!   it so that storing a token never trips credential validation

use std::fmt;

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::error::{ConfigurationError, SettingsError, StoreError};
use crate::secret::SecretValue;
use crate::Timestamp;

/// Default OAuth2 authorization dialog.
pub const DEFAULT_AUTHORIZATION_URL: &str = "https://www.facebook.com/v24.0/dialog/oauth";

/// Default OAuth2 token endpoint.
pub const DEFAULT_ACCESS_TOKEN_URL: &str = "https://graph.facebook.com/v24.0/oauth/access_token";

/// Permissions requested during authorization.
pub const DEFAULT_SCOPE: &str =
    "leads_retrieval,pages_show_list,pages_read_engagement,pages_manage_metadata,ads_read";

/// Length of generated webhook verify tokens.
pub const VERIFY_TOKEN_LENGTH: usize = 32;

/// Path of the webhook endpoint relative to the site URL.
pub const WEBHOOK_PATH: &str = "/webhook";

/// Facebook Lead Ads integration settings (one per site).
#[derive(Clone, PartialEq)]
pub struct IntegrationSettings {
    pub enabled: bool,
    pub app_id: String,
    pub app_secret: SecretValue,
    pub authorization_url: String,
    pub access_token_url: String,
    pub scope: String,
    pub access_token: Option<SecretValue>,

    /// `None` means the token does not expire.
    pub token_expiry: Option<Timestamp>,

    pub webhook_verify_token: String,
    pub webhook_callback_url: String,
    pub webhook_is_active: bool,

    /// Generate a web form for every lead that carries field data.
    pub auto_create_forms: bool,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            app_id: String::new(),
            app_secret: SecretValue::default(),
            authorization_url: DEFAULT_AUTHORIZATION_URL.to_string(),
            access_token_url: DEFAULT_ACCESS_TOKEN_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            access_token: None,
            token_expiry: None,
            webhook_verify_token: String::new(),
            webhook_callback_url: String::new(),
            webhook_is_active: false,
            auto_create_forms: false,
        }
    }
}

impl fmt::Debug for IntegrationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationSettings")
            .field("enabled", &self.enabled)
            .field("app_id", &self.app_id)
            .field("app_secret", &"<REDACTED>")
            .field("authorization_url", &self.authorization_url)
            .field("access_token_url", &self.access_token_url)
            .field("scope", &self.scope)
            .field("access_token", &self.access_token.as_ref().map(|_| "<REDACTED>"))
            .field("token_expiry", &self.token_expiry)
            .field("webhook_verify_token", &"<REDACTED>")
            .field("webhook_callback_url", &self.webhook_callback_url)
            .field("webhook_is_active", &self.webhook_is_active)
            .field("auto_create_forms", &self.auto_create_forms)
            .finish()
    }
}

impl IntegrationSettings {
    /// Check the credential invariant: an enabled integration needs an app id
    /// and an app secret.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.enabled {
            if self.app_id.trim().is_empty() {
                return Err(ConfigurationError::MissingAppId);
            }
            if self.app_secret.is_empty() {
                return Err(ConfigurationError::MissingAppSecret);
            }
        }
        Ok(())
    }

    /// Fill webhook defaults before a validated save.
    ///
    /// When enabled, the callback URL is derived from `site_url` and a verify
    /// token is generated if none exists yet.
    pub fn prepare_for_save(&mut self, site_url: &str) {
        if !self.enabled {
            return;
        }

        self.webhook_callback_url = format!("{}{}", site_url.trim_end_matches('/'), WEBHOOK_PATH);
        if self.webhook_verify_token.is_empty() {
            self.webhook_verify_token = generate_verify_token();
        }
    }

    /// Replace the access token and its expiry.
    pub fn set_access_token(&mut self, token: String, expiry: Option<Timestamp>) {
        self.access_token = Some(SecretValue::from_string(token));
        self.token_expiry = expiry;
    }

    /// Current access token, ignoring empty values.
    pub fn access_token(&self) -> Option<&SecretValue> {
        self.access_token.as_ref().filter(|t| !t.is_empty())
    }

    /// Rotate the webhook verify token. The subscription must be verified again.
    pub fn rotate_verify_token(&mut self) -> String {
        self.webhook_verify_token = generate_verify_token();
        self.webhook_is_active = false;
        self.webhook_verify_token.clone()
    }

    /// Describe the stored token relative to `now`.
    pub fn token_info(&self, now: Timestamp) -> TokenInfo {
        if self.access_token().is_none() {
            return TokenInfo {
                has_token: false,
                message: Some("No access token configured".to_string()),
                ..TokenInfo::default()
            };
        }

        match self.token_expiry {
            Some(expiry) if expiry <= now => TokenInfo {
                has_token: true,
                token_expiry: Some(expiry),
                is_expired: Some(true),
                message: Some("Token has expired. Please re-authorize.".to_string()),
                ..TokenInfo::default()
            },
            Some(expiry) => {
                let remaining = now.seconds_until(&expiry);
                TokenInfo {
                    has_token: true,
                    token_expiry: Some(expiry),
                    is_expired: Some(false),
                    expires_in_seconds: Some(remaining),
                    expires_in_days: Some(remaining / 86_400),
                    ..TokenInfo::default()
                }
            }
            None => TokenInfo {
                has_token: true,
                is_expired: Some(false),
                is_long_lived: Some(true),
                message: Some("Token is active (long-lived, no expiry)".to_string()),
                ..TokenInfo::default()
            },
        }
    }
}

/// Token status as reported to administrators.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TokenInfo {
    pub has_token: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expiry: Option<Timestamp>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_expired: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_seconds: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_days: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_long_lived: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result of rotating the verify token.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyTokenRotation {
    pub message: String,
    pub verify_token: String,
}

/// Generate a random alphanumeric webhook verify token.
pub fn generate_verify_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(VERIFY_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Persistence for the settings singleton.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the current settings.
    async fn load(&self) -> Result<IntegrationSettings, StoreError>;

    /// Validate, fill defaults and persist. Returns the stored settings.
    async fn save(&self, settings: IntegrationSettings)
        -> Result<IntegrationSettings, SettingsError>;

    /// Persist without validation or defaults.
    async fn save_unchecked(&self, settings: IntegrationSettings) -> Result<(), StoreError>;
}

/// Rotate the webhook verify token and persist it.
///
/// The subscription is marked inactive until Facebook repeats the handshake
/// with the new token.
pub async fn regenerate_verify_token(
    store: &dyn SettingsStore,
) -> Result<VerifyTokenRotation, SettingsError> {
    let mut settings = store.load().await?;
    settings.rotate_verify_token();
    let saved = store.save(settings).await?;

    info!("Webhook verify token regenerated; subscription marked inactive");
    Ok(VerifyTokenRotation {
        message: "Verify token regenerated. Please update it in Facebook.".to_string(),
        verify_token: saved.webhook_verify_token,
    })
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
