//! # Leadgate HTTP Service
//!
//! HTTP surface for the Facebook Lead Ads integration.
//!
//! This service provides:
//! - The OAuth2 authorization endpoints and the provider callback
//! - The webhook subscription handshake and lead delivery endpoint
//! - Settings, lead and web form administration endpoints
//! - Facebook page account sync and access token validation
//!
//! Administrative routes and authorization start require the configured
//! admin bearer token. The provider callback, the webhook endpoint, public
//! web forms, health and metrics stay open.
//! - Health and Prometheus metrics endpoints

pub mod config;
pub mod errors;
pub mod metrics;
pub mod pages;
pub mod responses;

pub use config::{
    AdminConfig, GraphConfig, IntegrationConfig, LoggingConfig, ServerConfig, ServiceConfig,
    WebhookConfig,
};
pub use errors::{ApiError, ConfigError, ServiceError};
pub use metrics::ServiceMetrics;

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use leadgate_core::accounts::{
    AccountDirectory, PageAccountRecord, PageAccountStore, SyncSummary, TokenValidation,
};
use leadgate_core::adapters::{
    InMemoryLeadStore, InMemoryPageAccountStore, InMemorySettingsStore, InMemoryStateCache,
    InMemoryWebFormStore,
};
use leadgate_core::enrichment::LeadEnricher;
use leadgate_core::leads::LeadStore;
use leadgate_core::notify::LeadNotifier;
use leadgate_core::oauth::{AuthorizationRequest, CallbackParams, OAuthFlow, ReauthorizationRequired};
use leadgate_core::settings::{regenerate_verify_token, VerifyTokenRotation};
use leadgate_core::state_cache::StateCache;
use leadgate_core::tenant_log::{TenantLogRegistry, TenantLogger};
use leadgate_core::webform::{WebForm, WebFormGenerator, WebFormStore};
use leadgate_core::webhook::auth::{SIGNATURE_HEADER, VERIFY_TOKEN_HEADER};
use leadgate_core::webhook::{
    EventDispatcher, InboundRequest, VerificationRequest, WebhookAuthStrategy, WebhookVerifier,
};
use leadgate_core::{SecretValue, SettingsStore, Timestamp, TokenInfo};
use leadgate_graph::{FormDetails, GraphApi, TokenExchanger};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::{error, info, instrument, warn};

use crate::responses::{
    FormSubmissionResponse, HealthResponse, LeadQuery, SettingsUpdate, SettingsView, WebhookAck,
    WebhookConfigResponse,
};

/// Header carrying the authenticated user, set by the fronting proxy.
pub const REMOTE_USER_HEADER: &str = "x-remote-user";

/// Identity recorded for authorizations started without [`REMOTE_USER_HEADER`].
pub const DEFAULT_IDENTITY: &str = "Administrator";

/// Query parameter carrying the verify token on deliveries.
const VERIFY_TOKEN_QUERY: &str = "hub.verify_token";

// ============================================================================
// Application State
// ============================================================================

/// Storage and notification collaborators provided by the host platform.
#[derive(Clone)]
pub struct Backends {
    pub settings: Arc<dyn SettingsStore>,
    pub states: Arc<dyn StateCache>,
    pub leads: Arc<dyn LeadStore>,
    pub forms: Arc<dyn WebFormStore>,
    pub accounts: Arc<dyn PageAccountStore>,
    pub notifier: Arc<dyn LeadNotifier>,
}

impl Backends {
    /// In-memory stores seeded from the integration configuration.
    pub fn in_memory(integration: &IntegrationConfig, notifier: Arc<dyn LeadNotifier>) -> Self {
        let mut seed = integration.to_settings();
        seed.prepare_for_save(&integration.site_url);

        Self {
            settings: Arc::new(InMemorySettingsStore::new(seed, integration.site_url.clone())),
            states: Arc::new(InMemoryStateCache::new()),
            leads: Arc::new(InMemoryLeadStore::new()),
            forms: Arc::new(InMemoryWebFormStore::new()),
            accounts: Arc::new(InMemoryPageAccountStore::new()),
            notifier,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub settings: Arc<dyn SettingsStore>,
    pub leads: Arc<dyn LeadStore>,
    pub oauth: OAuthFlow,
    pub verifier: WebhookVerifier,
    pub webhook_auth: Arc<dyn WebhookAuthStrategy>,
    pub dispatcher: EventDispatcher,
    pub web_forms: WebFormGenerator,
    pub accounts: AccountDirectory,
    pub tenant_logger: Arc<TenantLogger>,
    pub metrics: Arc<ServiceMetrics>,
    admin_token: Option<SecretValue>,
}

impl AppState {
    /// Wire the domain services over `backends`.
    pub fn new(
        config: ServiceConfig,
        backends: Backends,
        graph: Arc<dyn GraphApi>,
        exchanger: Arc<dyn TokenExchanger>,
        metrics: Arc<ServiceMetrics>,
    ) -> Result<Self, ConfigError> {
        // One site per process; its logger is resolved once here.
        let mut tenant_logs = TenantLogRegistry::new();
        let tenant_logger = tenant_logs.register(config.integration.tenant_id()?);

        let oauth = OAuthFlow::new(
            backends.settings.clone(),
            backends.states,
            exchanger,
            config.integration.site_url.clone(),
        );
        let verifier = WebhookVerifier::new(backends.settings.clone());
        let web_forms = WebFormGenerator::new(backends.forms, backends.leads.clone());
        let accounts = AccountDirectory::new(
            backends.settings.clone(),
            graph.clone(),
            backends.accounts,
        );
        let dispatcher = EventDispatcher::new(
            backends.settings.clone(),
            backends.leads.clone(),
            LeadEnricher::new(graph),
            backends.notifier,
            tenant_logger.clone(),
        )
        .with_web_forms(web_forms.clone());
        let webhook_auth = config.webhooks.auth_strategy.build();
        let admin_token = config.admin.bearer_token();
        if admin_token.is_none() {
            warn!("No admin token configured; administrative routes are closed");
        }

        info!(
            tenant = %tenant_logger.tenant(),
            auth_strategy = webhook_auth.name(),
            "Application state initialised"
        );

        Ok(Self {
            config: Arc::new(config),
            settings: backends.settings,
            leads: backends.leads,
            oauth,
            verifier,
            webhook_auth,
            dispatcher,
            web_forms,
            accounts,
            tenant_logger,
            metrics,
            admin_token,
        })
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let server = state.config.server.clone();

    let oauth_routes = Router::new()
        .route("/oauth/callback", get(handle_oauth_callback))
        .route("/oauth/callback/test", get(handle_callback_test));

    let webhook_routes = Router::new().route(
        &state.config.webhooks.endpoint_path,
        get(handle_webhook_verification).post(handle_webhook_delivery),
    );

    let admin_routes = Router::new()
        .route("/oauth/authorize", get(handle_authorize))
        .route("/oauth/token", get(handle_token_info))
        .route("/oauth/refresh", post(handle_refresh_token))
        .route("/oauth/validate", get(handle_validate_token))
        .route("/webhook/config", get(handle_webhook_config))
        .route("/webhook/verify-token", post(handle_regenerate_verify_token))
        .route("/settings", get(handle_get_settings).put(handle_update_settings))
        .route("/leads/{external_lead_id}", get(handle_get_lead))
        .route("/accounts", get(handle_list_accounts))
        .route("/accounts/sync", post(handle_sync_accounts))
        .route("/accounts/{page_id}/forms", get(handle_list_page_forms))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let form_routes = Router::new().route(
        "/forms/{route}",
        get(handle_get_form).post(handle_submit_form),
    );

    let observability_routes = Router::new()
        .route("/health", get(handle_health_check))
        .route("/metrics", get(metrics_endpoint));

    let mut router = Router::new()
        .merge(oauth_routes)
        .merge(webhook_routes)
        .merge(admin_routes)
        .merge(form_routes)
        .merge(observability_routes)
        .layer(DefaultBodyLimit::max(server.max_body_size));

    if server.enable_compression {
        router = router.layer(CompressionLayer::new());
    }
    if server.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(
                    |request: &axum::extract::Request| {
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            path = %request.uri().path()
                        )
                    },
                ))
                .layer(TimeoutLayer::new(Duration::from_secs(server.timeout_seconds)))
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
pub async fn start_server(state: AppState) -> Result<(), ServiceError> {
    let server = state.config.server.clone();
    let app = create_router(state);

    let addr = format!("{}:{}", server.host, server.port);
    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.clone(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", addr);

    let shutdown_timeout = Duration::from_secs(server.shutdown_timeout_seconds);

    // In-flight requests complete before the server stops.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM. A handler that cannot be installed never fires.
async fn shutdown_signal(shutdown_timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
        },
    }
}

// ============================================================================
// OAuth Handlers
// ============================================================================

/// Start authorization and return the Facebook dialog URL
#[instrument(skip(state, headers))]
pub async fn handle_authorize(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AuthorizationRequest>, ApiError> {
    let identity = request_identity(&headers);
    let request = state.oauth.begin_authorization(&identity).await?;
    state
        .tenant_logger
        .info(&format!("Authorization started by {}", identity));
    Ok(Json(request))
}

/// Handle the provider redirect and render the outcome
#[instrument(skip(state, params))]
pub async fn handle_oauth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> pages::HtmlPage {
    match state.oauth.handle_callback(params).await {
        Ok(token) => {
            state.metrics.oauth_callbacks_total.inc();
            state.tenant_logger.info("Access token stored successfully");
            pages::authorization_success(&token)
        }
        Err(e) => {
            state.metrics.oauth_callback_failures_total.inc();
            state
                .tenant_logger
                .error(&format!("OAuth callback failed: {}", e));
            pages::callback_failure(&e)
        }
    }
}

/// Show the callback URL to register with Facebook
pub async fn handle_callback_test(State(state): State<AppState>) -> pages::HtmlPage {
    pages::callback_test(&state.oauth.callback_url())
}

/// Report the stored token's status
pub async fn handle_token_info(State(state): State<AppState>) -> Result<Json<TokenInfo>, ApiError> {
    let info = state.oauth.token_info(Timestamp::now()).await?;
    Ok(Json(info))
}

/// Tokens are never refreshed in place; answer with a new authorization URL
#[instrument(skip(state, headers))]
pub async fn handle_refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ReauthorizationRequired>, ApiError> {
    let identity = request_identity(&headers);
    let answer = state.oauth.refresh_token(&identity).await?;
    Ok(Json(answer))
}

/// Check the stored token against the Graph API
pub async fn handle_validate_token(
    State(state): State<AppState>,
) -> Result<Json<TokenValidation>, ApiError> {
    let validation = state.accounts.validate_token().await?;
    Ok(Json(validation))
}

fn request_identity(headers: &HeaderMap) -> String {
    header_str(headers, REMOTE_USER_HEADER)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_IDENTITY)
        .to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

// ============================================================================
// Webhook Handlers
// ============================================================================

/// Answer the subscription handshake with the raw challenge
#[instrument(skip(state, request))]
pub async fn handle_webhook_verification(
    State(state): State<AppState>,
    Query(request): Query<VerificationRequest>,
) -> Response {
    match state.verifier.verify(&request).await {
        Ok(challenge) => {
            state.metrics.webhook_handshakes_total.inc();
            state.tenant_logger.info("Webhook verified successfully");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain")],
                challenge,
            )
                .into_response()
        }
        Err(e) => {
            state
                .tenant_logger
                .warn(&format!("Webhook verification failed: {}", e));
            pages::verification_failure(&e).into_response()
        }
    }
}

/// Authenticate a delivery and dispatch its lead notifications
///
/// The raw body is authenticated before it is parsed; a rejected delivery is
/// never processed.
#[instrument(skip(state, query, headers, body), fields(body_len = body.len()))]
pub async fn handle_webhook_delivery(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    state.metrics.webhook_deliveries_total.inc();

    let settings = state.settings.load().await?;
    let request = InboundRequest {
        body: &body,
        signature_header: header_str(&headers, SIGNATURE_HEADER),
        verify_token: header_str(&headers, VERIFY_TOKEN_HEADER)
            .or_else(|| query.get(VERIFY_TOKEN_QUERY).map(String::as_str)),
    };

    if let Err(e) = state.webhook_auth.authenticate(&request, &settings).await {
        state.metrics.webhook_signature_failures_total.inc();
        state
            .tenant_logger
            .warn(&format!("Rejected webhook delivery: {}", e));
        return Err(e.into());
    }

    let summary = state.dispatcher.dispatch(&body).await?;
    state.metrics.record_dispatch(&summary);

    Ok(Json(WebhookAck { success: true }))
}

/// Values to enter in the Facebook App's webhook settings
pub async fn handle_webhook_config(
    State(state): State<AppState>,
) -> Result<Json<WebhookConfigResponse>, ApiError> {
    let settings = state.settings.load().await?;

    let webhook_url = if settings.webhook_callback_url.is_empty() {
        format!(
            "{}{}",
            state.config.integration.site_url.trim_end_matches('/'),
            state.config.webhooks.endpoint_path
        )
    } else {
        settings.webhook_callback_url.clone()
    };

    Ok(Json(WebhookConfigResponse {
        webhook_url,
        verify_token: settings.webhook_verify_token,
        is_active: settings.webhook_is_active,
        enabled: settings.enabled,
    }))
}

/// Rotate the verify token; the subscription must be verified again
pub async fn handle_regenerate_verify_token(
    State(state): State<AppState>,
) -> Result<Json<VerifyTokenRotation>, ApiError> {
    let rotation = regenerate_verify_token(state.settings.as_ref()).await?;
    state
        .tenant_logger
        .info("Webhook verify token regenerated");
    Ok(Json(rotation))
}

// ============================================================================
// Administration Handlers
// ============================================================================

/// Current settings with secrets redacted
pub async fn handle_get_settings(
    State(state): State<AppState>,
) -> Result<Json<SettingsView>, ApiError> {
    let settings = state.settings.load().await?;
    Ok(Json(SettingsView::from(&settings)))
}

/// Apply a partial update through the validated save path
#[instrument(skip(state, update))]
pub async fn handle_update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsView>, ApiError> {
    let mut settings = state.settings.load().await?;
    update.apply_to(&mut settings);

    let saved = state.settings.save(settings).await?;
    info!(enabled = saved.enabled, "Integration settings updated");
    Ok(Json(SettingsView::from(&saved)))
}

/// Stored lead by Facebook lead id; `?view=simple` flattens it
pub async fn handle_get_lead(
    State(state): State<AppState>,
    Path(external_lead_id): Path<String>,
    Query(query): Query<LeadQuery>,
) -> Result<Response, ApiError> {
    let record = state
        .leads
        .get(&external_lead_id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            resource: format!("Lead {}", external_lead_id),
        })?;

    if query.is_simple() {
        Ok(Json(record.simplified()).into_response())
    } else {
        Ok(Json(record).into_response())
    }
}

// ============================================================================
// Account Handlers
// ============================================================================

/// Fetch the pages the access token manages and store them
#[instrument(skip(state))]
pub async fn handle_sync_accounts(
    State(state): State<AppState>,
) -> Result<Json<SyncSummary>, ApiError> {
    let summary = state.accounts.sync(Timestamp::now()).await?;
    state.metrics.account_syncs_total.inc();
    state
        .metrics
        .account_sync_failures_total
        .inc_by(summary.failures as u64);

    match &summary.last_error {
        Some(e) => state.tenant_logger.warn(&format!(
            "Account sync processed {} pages with {} failures: {}",
            summary.total_processed, summary.failures, e
        )),
        None => state.tenant_logger.info(&format!(
            "Account sync processed {} pages",
            summary.total_processed
        )),
    }
    Ok(Json(summary))
}

/// Synced pages; page tokens are reported only as present
pub async fn handle_list_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<PageAccountRecord>>, ApiError> {
    let accounts = state.accounts.list().await?;
    Ok(Json(accounts))
}

/// Lead forms of one page, straight from the Graph API
pub async fn handle_list_page_forms(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
) -> Result<Json<Vec<FormDetails>>, ApiError> {
    let forms = state.accounts.leadgen_forms(&page_id).await?;
    Ok(Json(forms))
}

// ============================================================================
// Web Form Handlers
// ============================================================================

/// Published web form definition
pub async fn handle_get_form(
    State(state): State<AppState>,
    Path(route): Path<String>,
) -> Result<Json<WebForm>, ApiError> {
    let form = state.web_forms.get(&route).await?;
    Ok(Json(form))
}

/// Record a form submission as a new lead
#[instrument(skip(state, form_data))]
pub async fn handle_submit_form(
    State(state): State<AppState>,
    Path(route): Path<String>,
    Json(form_data): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<FormSubmissionResponse>), ApiError> {
    let record = state.web_forms.submit(&route, &form_data).await?;
    state.metrics.leads_created_total.inc();
    state
        .tenant_logger
        .info(&format!("Created lead {} from web form {}", record.name, route));

    Ok((
        StatusCode::CREATED,
        Json(FormSubmissionResponse {
            success: true,
            lead: record.name,
            lead_id: record.external_lead_id,
        }),
    ))
}

// ============================================================================
// Observability Handlers
// ============================================================================

/// Liveness plus a settings store read check
pub async fn handle_health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, code, enabled, active) = match state.settings.load().await {
        Ok(settings) => (
            "healthy",
            StatusCode::OK,
            settings.enabled,
            settings.webhook_is_active,
        ),
        Err(e) => {
            warn!(error = %e, "Settings store unavailable during health check");
            ("unhealthy", StatusCode::SERVICE_UNAVAILABLE, false, false)
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            timestamp: Timestamp::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            integration_enabled: enabled,
            webhook_active: active,
        }),
    )
}

/// Prometheus text exposition
pub async fn metrics_endpoint(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => ApiError::Internal {
            message: format!("Failed to encode metrics: {}", e),
        }
        .into_response(),
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware with correlation ID tracking
///
/// This middleware:
/// - Extracts or generates correlation IDs for request tracking
/// - Logs request start and completion with structured fields
/// - Propagates correlation ID through response headers
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri().path(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    // Query strings carry OAuth codes and verify tokens; only the path is logged.
    let path = request.uri().path().to_string();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());

    request.extensions_mut().insert(correlation_id.clone());

    info!(
        correlation_id = %correlation_id,
        method = %method,
        path = %path,
        "Request started"
    );

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert("x-correlation-id", header_value);
    }

    let status = response.status();

    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            method = %method,
            path = %path,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            path = %path,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            path = %path,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

/// Admit only requests carrying the configured admin bearer token
///
/// Runs as a route layer, so unknown paths still answer 404.
async fn require_admin(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let Some(expected) = state.admin_token.as_ref() else {
        return ApiError::AdminDisabled.into_response();
    };

    let presented = header_str(request.headers(), header::AUTHORIZATION.as_str())
        .and_then(bearer_credentials)
        .map(SecretValue::from);

    match presented {
        Some(token) if &token == expected => next.run(request).await,
        _ => {
            state.metrics.admin_auth_failures_total.inc();
            ApiError::Unauthorized.into_response()
        }
    }
}

/// Credentials of an `Authorization: Bearer <token>` value.
fn bearer_credentials(value: &str) -> Option<&str> {
    let (scheme, credentials) = value.trim().split_once(' ')?;
    let credentials = credentials.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !credentials.is_empty()).then_some(credentials)
}

async fn metrics_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    state.metrics.http_requests_total.inc();
    next.run(request).await
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
