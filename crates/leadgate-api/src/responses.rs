//! Response types, query parameters, and supporting types for the API.

use leadgate_core::{IntegrationSettings, SecretValue, Timestamp};
use serde::{Deserialize, Serialize};

// ============================================================================
// Response Types
// ============================================================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: Timestamp,
    pub version: String,
    pub integration_enabled: bool,
    pub webhook_active: bool,
}

/// Acknowledgement of a webhook delivery
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookAck {
    pub success: bool,
}

/// Webhook registration details for the Facebook App dashboard
#[derive(Debug, Serialize)]
pub struct WebhookConfigResponse {
    pub webhook_url: String,
    pub verify_token: String,
    pub is_active: bool,
    pub enabled: bool,
}

/// Integration settings with secrets replaced by presence flags
#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub enabled: bool,
    pub app_id: String,
    pub has_app_secret: bool,
    pub authorization_url: String,
    pub access_token_url: String,
    pub scope: String,
    pub has_access_token: bool,
    pub token_expiry: Option<Timestamp>,
    pub webhook_callback_url: String,
    pub webhook_is_active: bool,
    pub auto_create_forms: bool,
}

impl From<&IntegrationSettings> for SettingsView {
    fn from(settings: &IntegrationSettings) -> Self {
        Self {
            enabled: settings.enabled,
            app_id: settings.app_id.clone(),
            has_app_secret: !settings.app_secret.is_empty(),
            authorization_url: settings.authorization_url.clone(),
            access_token_url: settings.access_token_url.clone(),
            scope: settings.scope.clone(),
            has_access_token: settings.access_token().is_some(),
            token_expiry: settings.token_expiry,
            webhook_callback_url: settings.webhook_callback_url.clone(),
            webhook_is_active: settings.webhook_is_active,
            auto_create_forms: settings.auto_create_forms,
        }
    }
}

/// Result of a public form submission
#[derive(Debug, Serialize)]
pub struct FormSubmissionResponse {
    pub success: bool,
    /// Display name of the new lead
    pub lead: String,
    /// Key for `GET /leads/{id}`
    pub lead_id: String,
}

// ============================================================================
// Request Types
// ============================================================================

/// Partial update of the integration settings; absent fields are kept.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsUpdate {
    pub enabled: Option<bool>,
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
    pub authorization_url: Option<String>,
    pub access_token_url: Option<String>,
    pub scope: Option<String>,
    pub auto_create_forms: Option<bool>,
}

impl SettingsUpdate {
    /// Apply the provided fields to `settings`.
    pub fn apply_to(self, settings: &mut IntegrationSettings) {
        if let Some(enabled) = self.enabled {
            settings.enabled = enabled;
        }
        if let Some(app_id) = self.app_id {
            settings.app_id = app_id;
        }
        if let Some(app_secret) = self.app_secret {
            settings.app_secret = SecretValue::from_string(app_secret);
        }
        if let Some(url) = self.authorization_url {
            settings.authorization_url = url;
        }
        if let Some(url) = self.access_token_url {
            settings.access_token_url = url;
        }
        if let Some(scope) = self.scope {
            settings.scope = scope;
        }
        if let Some(auto_create_forms) = self.auto_create_forms {
            settings.auto_create_forms = auto_create_forms;
        }
    }
}

/// `GET /leads/{id}` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct LeadQuery {
    /// `simple` returns the flattened view
    pub view: Option<String>,
}

impl LeadQuery {
    pub fn is_simple(&self) -> bool {
        self.view.as_deref() == Some("simple")
    }
}
