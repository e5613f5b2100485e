//! Graph API client for lead ingestion objects and account discovery.
//!
//! [`GraphClient`] implements [`GraphApi`] over `reqwest`. Every request carries
//! the access token as a query parameter, the way the Graph API expects it for
//! server-to-server reads, and is bounded by the configured timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::GraphError;
use crate::models::{
    AdDetails, DebugTokenEnvelope, FormDetails, GraphErrorEnvelope, LeadData, PageAccount,
    PageDetails, Paged, TokenDebugInfo, UserInfo, AD_FIELDS, FORM_FIELDS, LEADGEN_FORM_FIELDS,
    LEAD_FIELDS, PAGE_ACCOUNT_FIELDS, PAGE_FIELDS, USER_FIELDS,
};

/// Read access to the Graph objects needed for lead enrichment and account
/// discovery.
///
/// Listing methods return a single cursor page; pass the previous page's
/// [`Paged::next_cursor`] as `after` to continue.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Fetch a lead's submitted field data and ad attribution.
    async fn get_lead(&self, leadgen_id: &str, access_token: &str)
        -> Result<LeadData, GraphError>;

    /// Fetch a lead form's name and status.
    async fn get_form(&self, form_id: &str, access_token: &str)
        -> Result<FormDetails, GraphError>;

    /// Fetch a page's name.
    async fn get_page(&self, page_id: &str, access_token: &str)
        -> Result<PageDetails, GraphError>;

    /// Fetch an ad together with its ad set and campaign names.
    async fn get_ad(&self, ad_id: &str, access_token: &str) -> Result<AdDetails, GraphError>;

    /// List the pages the token owner manages (`/me/accounts`).
    async fn list_pages(
        &self,
        access_token: &str,
        after: Option<&str>,
    ) -> Result<Paged<PageAccount>, GraphError>;

    /// List a page's lead forms (`/{page_id}/leadgen_forms`).
    async fn list_leadgen_forms(
        &self,
        page_id: &str,
        access_token: &str,
        after: Option<&str>,
    ) -> Result<Paged<FormDetails>, GraphError>;

    /// Identify the token owner (`/me`).
    async fn get_me(&self, access_token: &str) -> Result<UserInfo, GraphError>;

    /// Introspect `access_token` with itself (`/debug_token`).
    async fn debug_token(&self, access_token: &str) -> Result<TokenDebugInfo, GraphError>;
}

/// Configuration for Graph API client behavior.
///
/// # Examples
///
/// ```
/// use leadgate_graph::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default().with_timeout(Duration::from_secs(20));
/// assert_eq!(config.base_url(), "https://graph.facebook.com/v24.0");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string for API requests
    pub user_agent: String,
    /// Request timeout duration
    pub timeout: Duration,
    /// Graph API host, without version
    pub graph_api_url: String,
    /// Graph API version path segment
    pub api_version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "leadgate/0.1.0".to_string(),
            timeout: Duration::from_secs(10),
            graph_api_url: "https://graph.facebook.com".to_string(),
            api_version: "v24.0".to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for client configuration.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the Graph API host.
    pub fn with_graph_api_url(mut self, url: impl Into<String>) -> Self {
        self.graph_api_url = url.into();
        self
    }

    /// Versioned base URL, e.g. `https://graph.facebook.com/v24.0`.
    pub fn base_url(&self) -> String {
        format!(
            "{}/{}",
            self.graph_api_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }
}

/// Builder for constructing `ClientConfig` instances.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn graph_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.graph_api_url = url.into();
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// Graph API client.
#[derive(Debug, Clone)]
pub struct GraphClient {
    http_client: reqwest::Client,
    config: ClientConfig,
}

impl GraphClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Configuration`] if the underlying HTTP client
    /// cannot be built (for example when the TLS backend fails to initialise).
    pub fn new(config: ClientConfig) -> Result<Self, GraphError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GraphError::Configuration {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    pub(crate) fn map_send_error(&self, error: reqwest::Error) -> GraphError {
        if error.is_timeout() {
            GraphError::Timeout {
                seconds: self.config.timeout.as_secs(),
            }
        } else {
            // The URL carries the access token as a query parameter.
            GraphError::Transport {
                message: error.without_url().to_string(),
            }
        }
    }

    async fn get_object<T: DeserializeOwned>(
        &self,
        id: &str,
        fields: &str,
        access_token: &str,
    ) -> Result<T, GraphError> {
        validate_object_id(id)?;
        self.get_json(id, &[("fields", fields)], access_token).await
    }

    /// `GET {base_url}/{path}` with `query` plus the access token.
    #[instrument(skip(self, query, access_token), fields(base_url = %self.config.base_url()))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        access_token: &str,
    ) -> Result<T, GraphError> {
        let url = format!("{}/{}", self.config.base_url(), path);
        debug!(path = %path, "Fetching Graph object");

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .query(&[("access_token", access_token)])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GraphError::Transport {
                message: format!("Failed to read response body: {}", e),
            })?;

        decode_graph_response(status, &body)
    }

    async fn get_listing<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: &str,
        access_token: &str,
        after: Option<&str>,
    ) -> Result<Paged<T>, GraphError> {
        let mut query = vec![("fields", fields)];
        if let Some(cursor) = after {
            query.push(("after", cursor));
        }
        self.get_json(path, &query, access_token).await
    }
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn get_lead(
        &self,
        leadgen_id: &str,
        access_token: &str,
    ) -> Result<LeadData, GraphError> {
        self.get_object(leadgen_id, LEAD_FIELDS, access_token).await
    }

    async fn get_form(
        &self,
        form_id: &str,
        access_token: &str,
    ) -> Result<FormDetails, GraphError> {
        self.get_object(form_id, FORM_FIELDS, access_token).await
    }

    async fn get_page(
        &self,
        page_id: &str,
        access_token: &str,
    ) -> Result<PageDetails, GraphError> {
        self.get_object(page_id, PAGE_FIELDS, access_token).await
    }

    async fn get_ad(&self, ad_id: &str, access_token: &str) -> Result<AdDetails, GraphError> {
        self.get_object(ad_id, AD_FIELDS, access_token).await
    }

    async fn list_pages(
        &self,
        access_token: &str,
        after: Option<&str>,
    ) -> Result<Paged<PageAccount>, GraphError> {
        self.get_listing("me/accounts", PAGE_ACCOUNT_FIELDS, access_token, after)
            .await
    }

    async fn list_leadgen_forms(
        &self,
        page_id: &str,
        access_token: &str,
        after: Option<&str>,
    ) -> Result<Paged<FormDetails>, GraphError> {
        validate_object_id(page_id)?;
        let path = format!("{}/leadgen_forms", page_id);
        self.get_listing(&path, LEADGEN_FORM_FIELDS, access_token, after)
            .await
    }

    async fn get_me(&self, access_token: &str) -> Result<UserInfo, GraphError> {
        self.get_json("me", &[("fields", USER_FIELDS)], access_token)
            .await
    }

    async fn debug_token(&self, access_token: &str) -> Result<TokenDebugInfo, GraphError> {
        let envelope: DebugTokenEnvelope = self
            .get_json("debug_token", &[("input_token", access_token)], access_token)
            .await?;
        Ok(envelope.data)
    }
}

/// Graph ids are numeric in production; test fixtures use short alphanumeric
/// ids. Anything else would alter the request path.
fn validate_object_id(id: &str) -> Result<(), GraphError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(GraphError::InvalidId { id: id.to_string() })
    }
}

/// Decode a Graph response body, honouring the `{"error": {...}}` envelope
/// that Graph may return with either a success or an error status.
fn decode_graph_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<T, GraphError> {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) if status.is_success() => {
            return Err(GraphError::InvalidResponse {
                message: e.to_string(),
            })
        }
        Err(_) => {
            return Err(GraphError::Api {
                status: status.as_u16(),
                code: None,
                message: body.to_string(),
            })
        }
    };

    if value.get("error").is_some() {
        let envelope: GraphErrorEnvelope =
            serde_json::from_value(value).map_err(|e| GraphError::InvalidResponse {
                message: format!("Malformed error envelope: {}", e),
            })?;
        let status = if status.is_success() {
            StatusCode::BAD_REQUEST
        } else {
            status
        };
        return Err(GraphError::Api {
            status: status.as_u16(),
            code: envelope.error.code,
            message: envelope
                .error
                .message
                .unwrap_or_else(|| "Unknown Graph API error".to_string()),
        });
    }

    if !status.is_success() {
        return Err(GraphError::Api {
            status: status.as_u16(),
            code: None,
            message: body.to_string(),
        });
    }

    serde_json::from_value(value).map_err(|e| GraphError::InvalidResponse {
        message: e.to_string(),
    })
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
