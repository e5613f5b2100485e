//! Lead records produced by webhook ingestion and form submissions.
//!
//! The `external_lead_id` is unique across the store. Inserting a duplicate
//! yields [`PersistenceError::AlreadyExists`], which ingestion treats as a
//! successful no-op so that redelivered webhooks are harmless.

use std::collections::BTreeMap;

use async_trait::async_trait;
use leadgate_graph::FieldData;
use serde::{Deserialize, Serialize};

use crate::enrichment::EnrichedLead;
use crate::error::{PersistenceError, StoreError};
use crate::Timestamp;

/// Processing status of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

/// A lead as stored in the CRM.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadRecord {
    /// Display name, `FB-{leadgen_id}` or `FORM-{timestamp}`.
    pub name: String,
    pub external_lead_id: String,
    pub status: LeadStatus,

    pub form_id: Option<String>,
    pub form_name: Option<String>,
    pub form_status: Option<String>,
    pub page_id: Option<String>,
    pub page_name: Option<String>,
    pub ad_id: Option<String>,
    pub ad_name: Option<String>,
    pub adset_id: Option<String>,
    pub adset_name: Option<String>,
    pub campaign_id: Option<String>,
    pub campaign_name: Option<String>,

    /// The `value` object of the webhook change, as received.
    pub raw_event: serde_json::Value,

    /// Submitted answers, enriched from the Graph API.
    pub field_data: Vec<FieldData>,

    /// Enrichment steps that fell back to placeholder data.
    pub enrichment_errors: Vec<String>,

    /// Route of the web form generated from this lead, if any.
    pub auto_created_form: Option<String>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LeadRecord {
    /// Build a record for a `leadgen` webhook change.
    pub fn from_webhook(
        leadgen_id: &str,
        page_id: Option<&str>,
        form_id: Option<&str>,
        raw_event: serde_json::Value,
        enriched: EnrichedLead,
        now: Timestamp,
    ) -> Self {
        let created_at = event_created_time(&raw_event).unwrap_or(now);

        Self {
            name: format!("FB-{}", leadgen_id),
            external_lead_id: leadgen_id.to_string(),
            status: LeadStatus::New,
            form_id: form_id.map(str::to_string),
            form_name: enriched.form_name,
            form_status: enriched.form_status,
            page_id: page_id.map(str::to_string),
            page_name: enriched.page_name,
            ad_id: enriched.ad_id,
            ad_name: enriched.ad_name,
            adset_id: enriched.adset_id,
            adset_name: enriched.adset_name,
            campaign_id: enriched.campaign_id,
            campaign_name: enriched.campaign_name,
            raw_event,
            field_data: enriched.field_data,
            enrichment_errors: enriched
                .degraded
                .iter()
                .map(ToString::to_string)
                .collect(),
            auto_created_form: None,
            created_at,
            updated_at: now,
        }
    }

    /// Build a record for a public web form submission.
    ///
    /// Each top-level key of `form_data` becomes one field; non-string values
    /// are stored as their JSON text. The display name is `FORM-{timestamp}`;
    /// the external id adds a random suffix so submissions within the same
    /// second stay distinct.
    pub fn from_form_submission(
        form_title: &str,
        form_data: &serde_json::Map<String, serde_json::Value>,
        now: Timestamp,
    ) -> Self {
        let name = format!("FORM-{}", now.format("%Y%m%d%H%M%S"));
        let field_data = form_data
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
                FieldData::new(key.clone(), vec![text])
            })
            .collect();

        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self {
            external_lead_id: format!("{}-{}", name, &suffix[..12]),
            name,
            status: LeadStatus::New,
            form_id: None,
            form_name: Some(form_title.to_string()),
            form_status: None,
            page_id: None,
            page_name: None,
            ad_id: None,
            ad_name: None,
            adset_id: None,
            adset_name: None,
            campaign_id: None,
            campaign_name: None,
            raw_event: serde_json::Value::Object(form_data.clone()),
            field_data,
            enrichment_errors: Vec::new(),
            auto_created_form: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Compact view: answers keyed by question plus the attribution chain.
    pub fn simplified(&self) -> SimplifiedLead {
        let data = self
            .field_data
            .iter()
            .map(|f| (f.name.clone(), f.first_value().unwrap_or_default().to_string()))
            .collect();

        SimplifiedLead {
            id: self.external_lead_id.clone(),
            data,
            form: SimpleRef::new(self.form_id.clone(), self.form_name.clone())
                .with_status(self.form_status.clone()),
            page: SimpleRef::new(self.page_id.clone(), self.page_name.clone()),
            ad: SimpleRef::new(self.ad_id.clone(), self.ad_name.clone()),
            adset: SimpleRef::new(self.adset_id.clone(), self.adset_name.clone()),
            campaign: SimpleRef::new(self.campaign_id.clone(), self.campaign_name.clone()),
            created_time: self.created_at,
        }
    }
}

/// Epoch `created_time` carried by the webhook change, as number or numeric text.
fn event_created_time(raw_event: &serde_json::Value) -> Option<Timestamp> {
    let seconds = match raw_event.get("created_time")? {
        serde_json::Value::Number(n) => n.as_i64()?,
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Timestamp::from_unix_seconds(seconds)
}

/// Output of [`LeadRecord::simplified`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimplifiedLead {
    pub id: String,
    pub data: BTreeMap<String, String>,
    pub form: SimpleRef,
    pub page: SimpleRef,
    pub ad: SimpleRef,
    pub adset: SimpleRef,
    pub campaign: SimpleRef,
    pub created_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleRef {
    pub id: Option<String>,
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl SimpleRef {
    fn new(id: Option<String>, name: Option<String>) -> Self {
        Self {
            id,
            name,
            status: None,
        }
    }

    fn with_status(mut self, status: Option<String>) -> Self {
        self.status = status;
        self
    }
}

/// Storage for lead records.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn exists(&self, external_lead_id: &str) -> Result<bool, StoreError>;

    /// Insert a new record; duplicates fail with [`PersistenceError::AlreadyExists`].
    async fn insert(&self, record: LeadRecord) -> Result<(), PersistenceError>;

    /// Replace an existing record.
    async fn update(&self, record: LeadRecord) -> Result<(), PersistenceError>;

    async fn get(&self, external_lead_id: &str) -> Result<Option<LeadRecord>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}

#[cfg(test)]
#[path = "leads_tests.rs"]
mod tests;
