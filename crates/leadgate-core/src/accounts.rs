//! Facebook pages reachable through the integration's access token.
//!
//! [`AccountDirectory::sync`] walks `/me/accounts` one cursor page at a time
//! and upserts every page by id. A listing that runs to the end marks pages
//! no longer returned as inactive. An interrupted listing keeps what it
//! fetched and reports the failure in its [`SyncSummary`].

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use leadgate_graph::{FormDetails, GraphApi, GraphError, PageAccount, TokenDebugInfo, UserInfo};
use serde::{Serialize, Serializer};
use tracing::{info, instrument, warn};

use crate::error::StoreError;
use crate::secret::SecretValue;
use crate::settings::SettingsStore;
use crate::Timestamp;

/// Upper bound on listing requests made by one sync or form listing.
pub const MAX_LISTING_PAGES: usize = 100;

/// Failure to sync or inspect accounts.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AccountError {
    #[error("Access token not found. Authorize the integration first.")]
    MissingAccessToken,

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// Records
// ============================================================================

/// A synced page. The page access token is reported only as present or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageAccountRecord {
    pub page_id: String,
    pub page_name: Option<String>,
    pub global_brand_page_name: Option<String>,
    pub category: Option<String>,
    pub business_id: Option<String>,
    pub business_name: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub tasks: Vec<String>,

    #[serde(rename = "has_page_access_token", serialize_with = "serialize_present")]
    pub page_access_token: Option<SecretValue>,

    /// Cleared when a complete sync no longer lists the page.
    pub is_active: bool,
    pub synced_at: Timestamp,
}

impl PageAccountRecord {
    /// Flatten a listed page. Pages without an id cannot be keyed.
    pub fn from_account(account: PageAccount, synced_at: Timestamp) -> Option<Self> {
        let page_id = account.id?;
        let business = account.business.unwrap_or_default();
        let location = account.location.unwrap_or_default();

        Some(Self {
            page_id,
            page_name: account.name,
            global_brand_page_name: account.global_brand_page_name,
            category: account.category,
            business_id: business.id,
            business_name: business.name,
            street: location.street,
            city: location.city,
            zip: location.zip,
            country: location.country,
            latitude: location.latitude,
            longitude: location.longitude,
            tasks: account.tasks,
            page_access_token: account
                .access_token
                .filter(|t| !t.is_empty())
                .map(SecretValue::from_string),
            is_active: true,
            synced_at,
        })
    }
}

fn serialize_present<S: Serializer>(
    token: &Option<SecretValue>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_bool(token.is_some())
}

/// Storage for synced pages, keyed by page id.
#[async_trait]
pub trait PageAccountStore: Send + Sync {
    /// Insert each record, replacing any stored page with the same id.
    async fn upsert(&self, records: Vec<PageAccountRecord>) -> Result<(), StoreError>;

    /// Mark active pages whose id is not in `listed` as inactive.
    ///
    /// Returns how many pages were deactivated.
    async fn deactivate_missing(&self, listed: &HashSet<String>) -> Result<usize, StoreError>;

    async fn get(&self, page_id: &str) -> Result<Option<PageAccountRecord>, StoreError>;

    /// Every stored page, ordered by page id.
    async fn list(&self) -> Result<Vec<PageAccountRecord>, StoreError>;
}

// ============================================================================
// Results
// ============================================================================

/// Outcome of one account sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncSummary {
    /// Pages returned by Graph, including ones that could not be stored.
    pub total_processed: usize,
    pub failures: usize,
    pub last_error: Option<String>,

    /// Whether the listing ran to its last page.
    pub complete: bool,
    pub deactivated: usize,
    pub synced_at: Timestamp,
}

impl SyncSummary {
    fn started(synced_at: Timestamp) -> Self {
        Self {
            total_processed: 0,
            failures: 0,
            last_error: None,
            complete: false,
            deactivated: 0,
            synced_at,
        }
    }

    fn record_failure(&mut self, message: String) {
        self.failures += 1;
        self.last_error = Some(message);
    }
}

/// Whether the stored access token still works, and what Graph says about it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenValidation {
    pub valid: bool,
    pub user: Option<UserInfo>,
    pub debug: Option<TokenDebugInfo>,
    pub error: Option<String>,
}

// ============================================================================
// Directory
// ============================================================================

/// Syncs and queries the pages managed by the stored access token.
#[derive(Clone)]
pub struct AccountDirectory {
    settings: Arc<dyn SettingsStore>,
    graph: Arc<dyn GraphApi>,
    store: Arc<dyn PageAccountStore>,
}

impl AccountDirectory {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        graph: Arc<dyn GraphApi>,
        store: Arc<dyn PageAccountStore>,
    ) -> Self {
        Self {
            settings,
            graph,
            store,
        }
    }

    /// Fetch every page the token manages and upsert it by page id.
    ///
    /// Graph failures end the walk and are reported in the summary rather
    /// than returned; pages fetched before the failure stay stored.
    #[instrument(skip(self))]
    pub async fn sync(&self, now: Timestamp) -> Result<SyncSummary, AccountError> {
        let token = self.user_token().await?;
        let mut summary = SyncSummary::started(now);
        let mut listed = HashSet::new();
        let mut after: Option<String> = None;

        for _ in 0..MAX_LISTING_PAGES {
            let page = match self
                .graph
                .list_pages(token.expose_secret(), after.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    warn!(error = %e, "Page listing failed; sync interrupted");
                    summary.record_failure(e.to_string());
                    break;
                }
            };
            let next = page.next_cursor().map(str::to_string);

            let mut records = Vec::with_capacity(page.data.len());
            for account in page.data {
                summary.total_processed += 1;
                match PageAccountRecord::from_account(account, now) {
                    Some(record) => {
                        listed.insert(record.page_id.clone());
                        records.push(record);
                    }
                    None => summary.record_failure("Listed page has no id".to_string()),
                }
            }
            self.store.upsert(records).await?;

            match next {
                None => {
                    summary.complete = true;
                    break;
                }
                Some(cursor) if after.as_deref() == Some(cursor.as_str()) => {
                    summary.record_failure(format!("Listing cursor '{}' repeated", cursor));
                    break;
                }
                Some(cursor) => after = Some(cursor),
            }
        }

        if summary.complete {
            summary.deactivated = self.store.deactivate_missing(&listed).await?;
        } else if summary.last_error.is_none() {
            summary.record_failure(format!(
                "Stopped after {} listing pages",
                MAX_LISTING_PAGES
            ));
        }

        info!(
            total = summary.total_processed,
            failures = summary.failures,
            deactivated = summary.deactivated,
            complete = summary.complete,
            "Account sync finished"
        );
        Ok(summary)
    }

    pub async fn list(&self) -> Result<Vec<PageAccountRecord>, AccountError> {
        Ok(self.store.list().await?)
    }

    /// Lead forms of a page, read with the page's own token once it is synced.
    #[instrument(skip(self))]
    pub async fn leadgen_forms(&self, page_id: &str) -> Result<Vec<FormDetails>, AccountError> {
        let token = match self
            .store
            .get(page_id)
            .await?
            .and_then(|page| page.page_access_token)
        {
            Some(page_token) => page_token,
            None => self.user_token().await?,
        };

        let mut forms = Vec::new();
        let mut after: Option<String> = None;
        for _ in 0..MAX_LISTING_PAGES {
            let page = self
                .graph
                .list_leadgen_forms(page_id, token.expose_secret(), after.as_deref())
                .await?;
            let next = page.next_cursor().map(str::to_string);
            forms.extend(page.data);

            match next {
                Some(cursor) if after.as_deref() != Some(cursor.as_str()) => after = Some(cursor),
                _ => break,
            }
        }
        Ok(forms)
    }

    /// Check the stored token against `/me`, then introspect it.
    ///
    /// A failing `/me` makes the token invalid. A failing introspection only
    /// leaves `debug` empty.
    #[instrument(skip(self))]
    pub async fn validate_token(&self) -> Result<TokenValidation, AccountError> {
        let token = self.user_token().await?;

        let user = match self.graph.get_me(token.expose_secret()).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Access token rejected by Graph");
                return Ok(TokenValidation {
                    valid: false,
                    user: None,
                    debug: None,
                    error: Some(e.to_string()),
                });
            }
        };

        let debug = match self.graph.debug_token(token.expose_secret()).await {
            Ok(debug) => Some(debug),
            Err(e) => {
                warn!(error = %e, "Token introspection failed");
                None
            }
        };

        Ok(TokenValidation {
            valid: debug.as_ref().map_or(true, |d| d.is_valid),
            user: Some(user),
            debug,
            error: None,
        })
    }

    async fn user_token(&self) -> Result<SecretValue, AccountError> {
        let settings = self.settings.load().await?;
        settings
            .access_token()
            .cloned()
            .ok_or(AccountError::MissingAccessToken)
    }
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
