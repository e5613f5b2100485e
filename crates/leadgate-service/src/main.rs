//! # Leadgate Service
//!
//! Binary entry point for the Leadgate HTTP service.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes structured logging
//! - Wires the in-memory stores, Graph client and domain services
//! - Starts the HTTP server from leadgate-api

mod bootstrap;

use bootstrap::{build_state, load_config, spawn_notification_logger, ConfigSources};
use leadgate_api::{start_server, LoggingConfig, ServiceError};
use leadgate_core::notify::BroadcastNotifier;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (applied in order; later sources override earlier ones):
    //  1. /etc/leadgate/service.yaml
    //  2. ./config/service.yaml
    //  3. Path given by LG_CONFIG_FILE
    //  4. Environment variables prefixed LG__ (double-underscore separator)
    //     e.g. LG__SERVER__PORT=9090 sets server.port = 9090
    //     LG__ADMIN__TOKEN opens the administrative routes
    // -------------------------------------------------------------------------
    let loaded = load_config(&ConfigSources::from_env());

    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging);

    let service_config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Service configuration is invalid; aborting");
            std::process::exit(3);
        }
    };

    info!("Starting Leadgate Service");

    let notifier = BroadcastNotifier::default();
    let _notification_logger = spawn_notification_logger(notifier.subscribe());

    let state = match build_state(service_config, notifier) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to initialise service");
            std::process::exit(exit_code(&e));
        }
    };

    info!(
        host = %state.config.server.host,
        port = state.config.server.port,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(state).await {
        error!("Server stopped with error: {}", e);
        std::process::exit(exit_code(&e));
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let level = &logging.level;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "leadgate_service={level},leadgate_api={level},leadgate_core={level},\
             leadgate_graph={level},leadgate::meta={level},tower_http=debug"
        )
        .into()
    });

    let json = logging.json_format;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

fn exit_code(error: &ServiceError) -> i32 {
    match error {
        ServiceError::BindFailed { .. } => 1,
        ServiceError::ServerFailed { .. } => 2,
        ServiceError::Configuration(_) => 3,
        ServiceError::Initialization { .. } => 4,
    }
}
