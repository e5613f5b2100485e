//! Configuration loading and service wiring.

use std::sync::Arc;

use leadgate_api::{AppState, Backends, ConfigError, ServiceConfig, ServiceError, ServiceMetrics};
use leadgate_core::notify::{BroadcastNotifier, LeadReceived};
use leadgate_graph::GraphClient;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Prefix of environment variable overrides, e.g. `LG__SERVER__PORT=9090`.
pub const ENV_PREFIX: &str = "LG";

/// Environment variable naming an operator-supplied configuration file.
pub const CONFIG_FILE_ENV: &str = "LG_CONFIG_FILE";

/// Where configuration is read from, lowest precedence first.
#[derive(Debug, Clone)]
pub struct ConfigSources {
    /// System-wide defaults
    pub system_file: String,

    /// Deployment-local override
    pub local_file: String,

    /// Operator-specified file; must exist when set
    pub explicit_file: Option<String>,

    /// Prefix for environment variable overrides
    pub env_prefix: String,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            system_file: "/etc/leadgate/service".to_string(),
            local_file: "config/service".to_string(),
            explicit_file: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }
}

impl ConfigSources {
    /// Default sources plus the file named by [`CONFIG_FILE_ENV`].
    pub fn from_env() -> Self {
        let explicit_file = std::env::var(CONFIG_FILE_ENV)
            .ok()
            .filter(|path| !path.is_empty());
        Self {
            explicit_file,
            ..Self::default()
        }
    }
}

/// Load, merge and validate the service configuration.
///
/// Missing optional files are skipped and every field has a default, so an
/// unconfigured environment yields the built-in configuration. A malformed
/// file or an override that cannot be coerced is an error.
pub fn load_config(sources: &ConfigSources) -> Result<ServiceConfig, ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(
            config::File::with_name(&sources.system_file)
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name(&sources.local_file)
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    if let Some(path) = &sources.explicit_file {
        builder = builder.add_source(
            config::File::with_name(path)
                .required(true)
                .format(config::FileFormat::Yaml),
        );
    }

    let merged = builder
        .add_source(config::Environment::with_prefix(&sources.env_prefix).separator("__"))
        .build()
        .map_err(|e| ConfigError::Invalid {
            message: format!("Failed to build configuration: {}", e),
        })?;

    let service_config: ServiceConfig =
        merged.try_deserialize().map_err(|e| ConfigError::Invalid {
            message: format!("Could not deserialize service configuration: {}", e),
        })?;

    service_config.validate()?;
    Ok(service_config)
}

/// Build the application state over in-memory stores and the Graph client.
pub fn build_state(
    config: ServiceConfig,
    notifier: BroadcastNotifier,
) -> Result<AppState, ServiceError> {
    let client = GraphClient::new(config.graph.client_config()).map_err(|e| {
        ServiceError::Initialization {
            component: "graph client".to_string(),
            message: e.to_string(),
        }
    })?;
    let client = Arc::new(client);

    let metrics = ServiceMetrics::new().map_err(|e| ServiceError::Initialization {
        component: "metrics".to_string(),
        message: e.to_string(),
    })?;

    let backends = Backends::in_memory(&config.integration, Arc::new(notifier));
    let state = AppState::new(config, backends, client.clone(), client, metrics)?;
    Ok(state)
}

/// Log every published lead notification until the channel closes.
pub fn spawn_notification_logger(mut receiver: broadcast::Receiver<LeadReceived>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => info!(
                    event = event.event,
                    leadgen_id = %event.leadgen_id,
                    page_id = ?event.page_id,
                    form_id = ?event.form_id,
                    "Lead notification published"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Notification listener fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
