//! Common test utilities for leadgate integration tests
//!
//! This module provides:
//! - A router wired to a real Graph client pointed at a wiremock server
//! - Request builders for signed webhook deliveries
//! - Graph API and token endpoint mocks

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use leadgate_api::{create_router, AppState, Backends, IntegrationConfig, ServiceConfig, ServiceMetrics};
use leadgate_core::notify::BroadcastNotifier;
use leadgate_core::webhook::auth::{HmacSignatureStrategy, SIGNATURE_HEADER};
use leadgate_core::webhook::AuthStrategyKind;
use leadgate_core::SettingsStore;
use leadgate_graph::GraphClient;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SITE_URL: &str = "https://crm.example.com";
pub const APP_ID: &str = "1234567890";
pub const APP_SECRET: &str = "test-app-secret";
pub const ACCESS_TOKEN: &str = "EAAB-page-token";
pub const GRAPH_VERSION: &str = "v24.0";
pub const ADMIN_TOKEN: &str = "ops-token";

/// Router plus the mock Graph server behind it.
pub struct TestService {
    pub state: AppState,
    pub graph: MockServer,
    pub notifier: BroadcastNotifier,
}

/// Options for [`TestService::start`].
#[derive(Debug, Clone, Copy)]
pub struct TestOptions {
    pub enabled: bool,
    pub auth_strategy: AuthStrategyKind,
    pub auto_create_forms: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            auth_strategy: AuthStrategyKind::HmacSignature,
            auto_create_forms: false,
        }
    }
}

impl TestService {
    pub async fn start(options: TestOptions) -> Self {
        let graph = MockServer::start().await;

        let mut config = ServiceConfig::default();
        config.admin.token = ADMIN_TOKEN.to_string();
        config.webhooks.auth_strategy = options.auth_strategy;
        config.graph.base_url = graph.uri();
        config.graph.api_version = GRAPH_VERSION.to_string();
        config.integration = IntegrationConfig {
            site_url: SITE_URL.to_string(),
            tenant: "crm.example.com".to_string(),
            enabled: options.enabled,
            app_id: APP_ID.to_string(),
            app_secret: APP_SECRET.to_string(),
            access_token_url: format!("{}/{}/oauth/access_token", graph.uri(), GRAPH_VERSION),
            auto_create_forms: options.auto_create_forms,
            ..IntegrationConfig::default()
        };
        config.validate().expect("test configuration is valid");

        let client = Arc::new(GraphClient::new(config.graph.client_config()).unwrap());
        let notifier = BroadcastNotifier::default();
        let backends = Backends::in_memory(&config.integration, Arc::new(notifier.clone()));
        let state = AppState::new(
            config,
            backends,
            client.clone(),
            client,
            ServiceMetrics::new().unwrap(),
        )
        .unwrap();

        Self {
            state,
            graph,
            notifier,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        create_router(self.state.clone())
            .oneshot(request)
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Send `request` with the admin bearer token attached.
    pub async fn admin_send(&self, mut request: Request<Body>) -> Response {
        let value = format!("Bearer {}", ADMIN_TOKEN).parse().unwrap();
        request.headers_mut().insert(header::AUTHORIZATION, value);
        self.send(request).await
    }

    pub async fn admin_get(&self, uri: &str) -> Response {
        self.admin_send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Store an access token as if authorization had completed.
    pub async fn authorize(&self) {
        let mut settings = self.state.settings.load().await.unwrap();
        settings.set_access_token(ACCESS_TOKEN.to_string(), None);
        self.state.settings.save_unchecked(settings).await.unwrap();
    }

    pub async fn verify_token(&self) -> String {
        self.state.settings.load().await.unwrap().webhook_verify_token
    }

    /// Serve a Graph object at `/{version}/{id}` for the stored access token.
    pub async fn mount_graph_object(&self, id: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/{}/{}", GRAPH_VERSION, id)))
            .and(query_param("access_token", ACCESS_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.graph)
            .await;
    }

    /// Fail reads of `/{version}/{id}` with a Graph error envelope.
    pub async fn mount_graph_error(&self, id: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/{}/{}", GRAPH_VERSION, id)))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": {"message": "Unsupported get request.", "code": 100}
            })))
            .mount(&self.graph)
            .await;
    }

    /// Mount the lead, form and page objects of a typical lead.
    pub async fn mount_lead_fixture(&self, leadgen_id: &str) {
        self.mount_graph_object(
            leadgen_id,
            json!({
                "id": leadgen_id,
                "field_data": [
                    {"name": "full_name", "values": ["Jane Doe"]},
                    {"name": "email", "values": ["jane@example.com"]},
                    {"name": "budget", "values": ["$1000-$5000"]}
                ],
                "ad_id": "238",
                "is_organic": false,
                "created_time": "2025-10-27T20:03:20+0000"
            }),
        )
        .await;
        self.mount_graph_object("F1", json!({"id": "F1", "name": "Spring signup", "status": "ACTIVE"}))
            .await;
        self.mount_graph_object("P1", json!({"id": "P1", "name": "Acme Boats"}))
            .await;
        self.mount_graph_object(
            "238",
            json!({
                "id": "238",
                "name": "Spring promo",
                "adset": {"id": "9", "name": "Lookalikes", "campaign": {"id": "1", "name": "Spring"}}
            }),
        )
        .await;
    }
}

/// A page delivery with one `leadgen` change per id.
pub fn leadgen_delivery(leadgen_ids: &[&str]) -> Vec<u8> {
    let changes: Vec<Value> = leadgen_ids
        .iter()
        .map(|id| {
            json!({
                "field": "leadgen",
                "value": {"leadgen_id": id, "page_id": "P1", "form_id": "F1", "created_time": 1761595400}
            })
        })
        .collect();

    serde_json::to_vec(&json!({
        "object": "page",
        "entry": [{"id": "P1", "time": 1761595400, "changes": changes}]
    }))
    .unwrap()
}

/// `POST /webhook` signed with `secret`.
pub fn signed_delivery(body: Vec<u8>, secret: &str) -> Request<Body> {
    let signature = HmacSignatureStrategy::sign(secret, &body).unwrap();
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

pub fn query_value(url: &str, key: &str) -> Option<String> {
    url::Url::parse(url)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
