//! # In-Memory Stores
//!
//! Thread-safe in-memory implementations of the storage traits. State lives
//! behind `Arc<RwLock<..>>`, so clones share the same data.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use crate::accounts::{PageAccountRecord, PageAccountStore};
use crate::error::{PersistenceError, SettingsError, StoreError};
use crate::leads::{LeadRecord, LeadStore};
use crate::settings::{IntegrationSettings, SettingsStore};
use crate::state_cache::StateCache;
use crate::webform::{WebForm, WebFormStore};

fn poisoned(what: &str) -> StoreError {
    StoreError::OperationFailed {
        message: format!("{} lock poisoned", what),
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Settings singleton held in memory.
#[derive(Clone)]
pub struct InMemorySettingsStore {
    settings: Arc<RwLock<IntegrationSettings>>,
    site_url: String,
}

impl InMemorySettingsStore {
    /// Create a store seeded with `initial`. `site_url` is used to derive the
    /// webhook callback URL on validated saves.
    pub fn new(initial: IntegrationSettings, site_url: impl Into<String>) -> Self {
        Self {
            settings: Arc::new(RwLock::new(initial)),
            site_url: site_url.into(),
        }
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn load(&self) -> Result<IntegrationSettings, StoreError> {
        let settings = self.settings.read().map_err(|_| poisoned("settings"))?;
        Ok(settings.clone())
    }

    async fn save(
        &self,
        mut settings: IntegrationSettings,
    ) -> Result<IntegrationSettings, SettingsError> {
        settings.validate()?;
        settings.prepare_for_save(&self.site_url);

        let mut current = self.settings.write().map_err(|_| poisoned("settings"))?;
        *current = settings.clone();
        debug!(enabled = settings.enabled, "Settings saved");
        Ok(settings)
    }

    async fn save_unchecked(&self, settings: IntegrationSettings) -> Result<(), StoreError> {
        let mut current = self.settings.write().map_err(|_| poisoned("settings"))?;
        *current = settings;
        Ok(())
    }
}

// ============================================================================
// Authorization state
// ============================================================================

#[derive(Debug, Clone)]
struct CachedState {
    identity: String,
    expires_at: Instant,
}

/// State cache with per-entry expiry on the tokio clock.
///
/// Every `put` first drops expired entries, so abandoned authorizations are
/// held for at most one TTL after the next authorization starts.
#[derive(Clone, Default)]
pub struct InMemoryStateCache {
    entries: Arc<RwLock<HashMap<String, CachedState>>>,
}

impl InMemoryStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StateCache for InMemoryStateCache {
    async fn put(&self, state: &str, identity: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned("state cache"))?;
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            state.to_string(),
            CachedState {
                identity: identity.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn take(&self, state: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned("state cache"))?;
        Ok(entries
            .remove(state)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.identity))
    }

    async fn cleanup_expired(&self) -> Result<usize, StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned("state cache"))?;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        Ok(before - entries.len())
    }
}

// ============================================================================
// Leads
// ============================================================================

/// Lead records keyed by external lead id.
#[derive(Clone, Default)]
pub struct InMemoryLeadStore {
    records: Arc<RwLock<HashMap<String, LeadRecord>>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn exists(&self, external_lead_id: &str) -> Result<bool, StoreError> {
        let records = self.records.read().map_err(|_| poisoned("lead store"))?;
        Ok(records.contains_key(external_lead_id))
    }

    async fn insert(&self, record: LeadRecord) -> Result<(), PersistenceError> {
        let mut records = self.records.write().map_err(|_| poisoned("lead store"))?;
        if records.contains_key(&record.external_lead_id) {
            return Err(PersistenceError::AlreadyExists {
                external_lead_id: record.external_lead_id,
            });
        }
        records.insert(record.external_lead_id.clone(), record);
        Ok(())
    }

    async fn update(&self, record: LeadRecord) -> Result<(), PersistenceError> {
        let mut records = self.records.write().map_err(|_| poisoned("lead store"))?;
        match records.get_mut(&record.external_lead_id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(PersistenceError::NotFound {
                external_lead_id: record.external_lead_id,
            }),
        }
    }

    async fn get(&self, external_lead_id: &str) -> Result<Option<LeadRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned("lead store"))?;
        Ok(records.get(external_lead_id).cloned())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let records = self.records.read().map_err(|_| poisoned("lead store"))?;
        Ok(records.len())
    }
}

// ============================================================================
// Web forms
// ============================================================================

/// Web forms keyed by route.
#[derive(Clone, Default)]
pub struct InMemoryWebFormStore {
    forms: Arc<RwLock<HashMap<String, WebForm>>>,
}

impl InMemoryWebFormStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.forms.read().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl WebFormStore for InMemoryWebFormStore {
    async fn exists_by_title(&self, title: &str) -> Result<bool, StoreError> {
        let forms = self.forms.read().map_err(|_| poisoned("web form store"))?;
        Ok(forms.values().any(|f| f.title == title))
    }

    async fn get_by_route(&self, route: &str) -> Result<Option<WebForm>, StoreError> {
        let forms = self.forms.read().map_err(|_| poisoned("web form store"))?;
        Ok(forms.get(route).cloned())
    }

    async fn insert(&self, form: WebForm) -> Result<(), StoreError> {
        let mut forms = self.forms.write().map_err(|_| poisoned("web form store"))?;
        if forms.contains_key(&form.route) {
            return Err(StoreError::OperationFailed {
                message: format!("web form route '{}' already in use", form.route),
            });
        }
        forms.insert(form.route.clone(), form);
        Ok(())
    }
}

// ============================================================================
// Page accounts
// ============================================================================

/// Synced pages keyed by page id.
#[derive(Clone, Default)]
pub struct InMemoryPageAccountStore {
    pages: Arc<RwLock<HashMap<String, PageAccountRecord>>>,
}

impl InMemoryPageAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PageAccountStore for InMemoryPageAccountStore {
    async fn upsert(&self, records: Vec<PageAccountRecord>) -> Result<(), StoreError> {
        let mut pages = self.pages.write().map_err(|_| poisoned("page account store"))?;
        for record in records {
            pages.insert(record.page_id.clone(), record);
        }
        Ok(())
    }

    async fn deactivate_missing(&self, listed: &HashSet<String>) -> Result<usize, StoreError> {
        let mut pages = self.pages.write().map_err(|_| poisoned("page account store"))?;
        let mut deactivated = 0;
        for page in pages.values_mut() {
            if page.is_active && !listed.contains(&page.page_id) {
                page.is_active = false;
                deactivated += 1;
            }
        }
        Ok(deactivated)
    }

    async fn get(&self, page_id: &str) -> Result<Option<PageAccountRecord>, StoreError> {
        let pages = self.pages.read().map_err(|_| poisoned("page account store"))?;
        Ok(pages.get(page_id).cloned())
    }

    async fn list(&self) -> Result<Vec<PageAccountRecord>, StoreError> {
        let pages = self.pages.read().map_err(|_| poisoned("page account store"))?;
        let mut records: Vec<_> = pages.values().cloned().collect();
        records.sort_by(|a, b| a.page_id.cmp(&b.page_id));
        Ok(records)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
