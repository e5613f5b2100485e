//! Configuration types for the HTTP service

use std::fmt;
use std::time::Duration;

use leadgate_core::settings::{DEFAULT_ACCESS_TOKEN_URL, DEFAULT_AUTHORIZATION_URL, DEFAULT_SCOPE};
use leadgate_core::tenant_log::TenantId;
use leadgate_core::webhook::AuthStrategyKind;
use leadgate_core::{IntegrationSettings, SecretValue};
use leadgate_graph::ClientConfig;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Lower bound for Graph API request timeouts.
pub const MIN_GRAPH_TIMEOUT_SECONDS: u64 = 10;

/// Upper bound for Graph API request timeouts.
pub const MAX_GRAPH_TIMEOUT_SECONDS: u64 = 30;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Administrative route access
    pub admin: AdminConfig,

    /// Webhook endpoint settings
    pub webhooks: WebhookConfig,

    /// Graph API client settings
    pub graph: GraphConfig,

    /// Initial integration settings for this site
    pub integration: IntegrationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Parse a YAML document. Missing sections fall back to defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must be non-zero".to_string(),
            });
        }

        let path = &self.webhooks.endpoint_path;
        if !path.starts_with('/') || path.len() < 2 {
            return Err(ConfigError::Invalid {
                message: format!("webhooks.endpoint_path '{}' must start with '/'", path),
            });
        }

        self.graph.validate()?;
        self.integration.validate()?;
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,

    /// Allow cross-origin requests from any origin. Off unless the
    /// administrative UI is served from another origin.
    pub enable_cors: bool,

    /// Enable compression
    pub enable_compression: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            timeout_seconds: 30,
            shutdown_timeout_seconds: 30,
            max_body_size: 10 * 1024 * 1024, // 10MB
            enable_cors: false,
            enable_compression: true,
        }
    }
}

/// Administrative route access
///
/// Settings, lead reads, webhook configuration and authorization start are
/// only served to requests carrying `Authorization: Bearer <token>`. An empty
/// token closes those routes entirely.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Shared bearer token for administrative callers
    pub token: String,
}

impl AdminConfig {
    /// The configured token, or `None` when administration is closed.
    pub fn bearer_token(&self) -> Option<SecretValue> {
        let token = self.token.trim();
        if token.is_empty() {
            None
        } else {
            Some(SecretValue::from(token))
        }
    }
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("token", &if self.token.is_empty() { "<UNSET>" } else { "<REDACTED>" })
            .finish()
    }
}

/// Webhook endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Path serving both the handshake (`GET`) and deliveries (`POST`)
    pub endpoint_path: String,

    /// How deliveries are authenticated
    pub auth_strategy: AuthStrategyKind,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            endpoint_path: "/webhook".to_string(),
            auth_strategy: AuthStrategyKind::default(),
        }
    }
}

/// Graph API client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Graph API host, without version
    pub base_url: String,

    /// Graph API version segment
    pub api_version: String,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: "https://graph.facebook.com".to_string(),
            api_version: "v24.0".to_string(),
            timeout_seconds: MIN_GRAPH_TIMEOUT_SECONDS,
        }
    }
}

impl GraphConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_GRAPH_TIMEOUT_SECONDS..=MAX_GRAPH_TIMEOUT_SECONDS).contains(&self.timeout_seconds)
        {
            return Err(ConfigError::Invalid {
                message: format!(
                    "graph.timeout_seconds must be between {} and {}, got {}",
                    MIN_GRAPH_TIMEOUT_SECONDS, MAX_GRAPH_TIMEOUT_SECONDS, self.timeout_seconds
                ),
            });
        }
        validate_http_url("graph.base_url", &self.base_url)
    }

    /// Build the Graph client configuration.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::builder()
            .graph_api_url(self.base_url.clone())
            .api_version(self.api_version.clone())
            .timeout(Duration::from_secs(self.timeout_seconds))
            .build()
    }
}

/// Integration settings the service starts with
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    /// Public base URL of this site; used for the OAuth redirect and webhook URL
    pub site_url: String,

    /// Tenant name for integration log routing
    pub tenant: String,

    pub enabled: bool,
    pub app_id: String,
    pub app_secret: String,
    pub authorization_url: String,
    pub access_token_url: String,
    pub scope: String,
    pub auto_create_forms: bool,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            site_url: "http://localhost:8080".to_string(),
            tenant: "default".to_string(),
            enabled: false,
            app_id: String::new(),
            app_secret: String::new(),
            authorization_url: DEFAULT_AUTHORIZATION_URL.to_string(),
            access_token_url: DEFAULT_ACCESS_TOKEN_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            auto_create_forms: false,
        }
    }
}

impl fmt::Debug for IntegrationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationConfig")
            .field("site_url", &self.site_url)
            .field("tenant", &self.tenant)
            .field("enabled", &self.enabled)
            .field("app_id", &self.app_id)
            .field("app_secret", &"<REDACTED>")
            .field("authorization_url", &self.authorization_url)
            .field("access_token_url", &self.access_token_url)
            .field("scope", &self.scope)
            .field("auto_create_forms", &self.auto_create_forms)
            .finish()
    }
}

impl IntegrationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("integration.site_url", &self.site_url)?;
        validate_http_url("integration.authorization_url", &self.authorization_url)?;
        validate_http_url("integration.access_token_url", &self.access_token_url)?;

        self.tenant_id()?;

        if self.enabled {
            if self.app_id.trim().is_empty() {
                return Err(ConfigError::Missing {
                    key: "integration.app_id".to_string(),
                });
            }
            if self.app_secret.is_empty() {
                return Err(ConfigError::Missing {
                    key: "integration.app_secret".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Parsed tenant id.
    pub fn tenant_id(&self) -> Result<TenantId, ConfigError> {
        TenantId::new(self.tenant.clone()).map_err(|e| ConfigError::Invalid {
            message: format!("integration.tenant: {}", e),
        })
    }

    /// Seed settings for the settings store.
    pub fn to_settings(&self) -> IntegrationSettings {
        IntegrationSettings {
            enabled: self.enabled,
            app_id: self.app_id.clone(),
            app_secret: self.app_secret.as_str().into(),
            authorization_url: self.authorization_url.clone(),
            access_token_url: self.access_token_url.clone(),
            scope: self.scope.clone(),
            auto_create_forms: self.auto_create_forms,
            ..IntegrationSettings::default()
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| ConfigError::Invalid {
        message: format!("{} '{}' is not a valid URL: {}", key, value, e),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid {
            message: format!("{} must use http or https, got '{}'", key, other),
        }),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
