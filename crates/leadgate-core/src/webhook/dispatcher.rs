//! Dispatching of authenticated webhook deliveries.
//!
//! A delivery is `{"object": "page", "entry": [{"changes": [...]}]}`. Every
//! change with `field == "leadgen"` is processed independently:
//!
//! 1. skip when `leadgen_id` is missing
//! 2. no-op when the lead already exists
//! 3. skip when the integration is disabled or has no access token
//! 4. enrich through the Graph API and insert the lead record
//! 5. publish a `facebook_lead_received` notification
//! 6. generate a web form when `auto_create_forms` is set
//!
//! A failing change never aborts its siblings.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::enrichment::LeadEnricher;
use crate::error::DispatchError;
use crate::leads::{LeadRecord, LeadStore};
use crate::notify::{LeadNotifier, LeadReceived};
use crate::settings::{IntegrationSettings, SettingsStore};
use crate::tenant_log::TenantLogger;
use crate::webform::WebFormGenerator;
use crate::Timestamp;

use super::json_id;

/// Webhook `object` value for page subscriptions.
pub const PAGE_OBJECT: &str = "page";

/// Change field carrying lead notifications.
pub const LEADGEN_FIELD: &str = "leadgen";

/// Counts of what a delivery produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    /// The delivery was not a page event and was ignored.
    pub ignored: bool,
    /// `leadgen` changes seen.
    pub received: usize,
    pub created: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Created leads whose enrichment fell back to placeholder data.
    pub degraded: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeOutcome {
    Created { degraded: bool },
    Duplicate,
    Skipped,
    Failed,
}

/// Ids extracted from one `leadgen` change.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LeadgenChange {
    leadgen_id: Option<String>,
    page_id: Option<String>,
    form_id: Option<String>,
}

impl LeadgenChange {
    fn from_value(value: &Value) -> Self {
        Self {
            leadgen_id: json_id(value, "leadgen_id"),
            page_id: json_id(value, "page_id"),
            form_id: json_id(value, "form_id"),
        }
    }
}

/// Turns webhook deliveries into lead records.
#[derive(Clone)]
pub struct EventDispatcher {
    settings: Arc<dyn SettingsStore>,
    leads: Arc<dyn LeadStore>,
    enricher: LeadEnricher,
    notifier: Arc<dyn LeadNotifier>,
    forms: Option<WebFormGenerator>,
    logger: Arc<TenantLogger>,
}

impl EventDispatcher {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        leads: Arc<dyn LeadStore>,
        enricher: LeadEnricher,
        notifier: Arc<dyn LeadNotifier>,
        logger: Arc<TenantLogger>,
    ) -> Self {
        Self {
            settings,
            leads,
            enricher,
            notifier,
            forms: None,
            logger,
        }
    }

    /// Enable web form generation for settings with `auto_create_forms`.
    pub fn with_web_forms(mut self, forms: WebFormGenerator) -> Self {
        self.forms = Some(forms);
        self
    }

    /// Process one delivery body.
    #[instrument(skip(self, body), fields(body_len = body.len()))]
    pub async fn dispatch(&self, body: &[u8]) -> Result<DispatchSummary, DispatchError> {
        let payload: Value =
            serde_json::from_slice(body).map_err(|e| DispatchError::InvalidPayload {
                message: e.to_string(),
            })?;
        if !payload.is_object() {
            return Err(DispatchError::InvalidPayload {
                message: "payload must be a JSON object".to_string(),
            });
        }

        let object = payload.get("object").and_then(Value::as_str).unwrap_or_default();
        if object != PAGE_OBJECT {
            self.logger
                .info(&format!("Non-page event received: {}", object));
            return Ok(DispatchSummary {
                ignored: true,
                ..DispatchSummary::default()
            });
        }

        let settings = self.settings.load().await.map_err(|e| {
            error!(error = %e, "Failed to load settings for webhook delivery");
            DispatchError::Internal {
                message: e.to_string(),
            }
        })?;

        let mut summary = DispatchSummary::default();
        let entries = payload
            .get("entry")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for entry in entries {
            let changes = entry
                .get("changes")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            debug!(entry_id = ?json_id(entry, "id"), changes = changes.len(), "Processing entry");

            for change in changes {
                let field = change.get("field").and_then(Value::as_str);
                if field != Some(LEADGEN_FIELD) {
                    debug!(field = ?field, "Skipping non-leadgen change");
                    continue;
                }

                summary.received += 1;
                let value = change.get("value").cloned().unwrap_or(Value::Null);
                match self.process_change(&settings, value).await {
                    ChangeOutcome::Created { degraded } => {
                        summary.created += 1;
                        if degraded {
                            summary.degraded += 1;
                        }
                    }
                    ChangeOutcome::Duplicate => summary.duplicates += 1,
                    ChangeOutcome::Skipped => summary.skipped += 1,
                    ChangeOutcome::Failed => summary.failed += 1,
                }
            }
        }

        info!(
            received = summary.received,
            created = summary.created,
            duplicates = summary.duplicates,
            skipped = summary.skipped,
            failed = summary.failed,
            "Webhook delivery processed"
        );
        Ok(summary)
    }

    async fn process_change(&self, settings: &IntegrationSettings, value: Value) -> ChangeOutcome {
        let ids = LeadgenChange::from_value(&value);
        let Some(leadgen_id) = ids.leadgen_id.as_deref() else {
            warn!("leadgen change without leadgen_id");
            self.logger.warn("Skipping leadgen change without leadgen_id");
            return ChangeOutcome::Skipped;
        };
        let page_id = ids.page_id.as_deref();
        let form_id = ids.form_id.as_deref();

        self.logger.info(&format!(
            "Received lead {} from page {}, form {}",
            leadgen_id,
            page_id.unwrap_or("-"),
            form_id.unwrap_or("-")
        ));

        match self.leads.exists(leadgen_id).await {
            Ok(true) => {
                info!(leadgen_id = %leadgen_id, "Lead already exists; skipping");
                return ChangeOutcome::Duplicate;
            }
            Ok(false) => {}
            Err(e) => {
                error!(leadgen_id = %leadgen_id, error = %e, "Lead lookup failed");
                self.logger.error(&format!("Failed to look up lead {}: {}", leadgen_id, e));
                return ChangeOutcome::Failed;
            }
        }

        let access_token = match settings.access_token() {
            Some(token) if settings.enabled => token.expose_secret().to_string(),
            _ => {
                self.logger
                    .error("Facebook Lead Ads is not enabled or access token not configured");
                return ChangeOutcome::Skipped;
            }
        };

        let enriched = self
            .enricher
            .enrich(leadgen_id, page_id, form_id, &access_token)
            .await;
        let degraded = enriched.is_degraded();

        let mut record =
            LeadRecord::from_webhook(leadgen_id, page_id, form_id, value, enriched, Timestamp::now());
        match self.leads.insert(record.clone()).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate() => {
                info!(leadgen_id = %leadgen_id, "Lead inserted concurrently; skipping");
                return ChangeOutcome::Duplicate;
            }
            Err(e) => {
                error!(leadgen_id = %leadgen_id, error = %e, "Failed to store lead");
                self.logger
                    .error(&format!("Failed to create lead {}: {}", leadgen_id, e));
                return ChangeOutcome::Failed;
            }
        }

        self.logger
            .info(&format!("Created lead {} for {}", record.name, leadgen_id));
        self.notifier
            .publish(LeadReceived::new(leadgen_id, page_id, form_id));

        if settings.auto_create_forms {
            self.create_web_form(&mut record).await;
        }

        ChangeOutcome::Created { degraded }
    }

    /// Form generation failures are logged; the lead stays created.
    async fn create_web_form(&self, record: &mut LeadRecord) {
        let Some(forms) = &self.forms else {
            debug!("Web form generation not configured");
            return;
        };

        let created = forms
            .create_for_lead(
                &record.external_lead_id,
                record.form_name.as_deref(),
                &record.field_data,
            )
            .await;

        match created {
            Ok(Some(route)) => {
                record.auto_created_form = Some(route.clone());
                record.updated_at = Timestamp::now();
                if let Err(e) = self.leads.update(record.clone()).await {
                    error!(error = %e, "Failed to link web form to lead");
                }
                self.logger.info(&format!(
                    "Created automatic form {} for lead {}",
                    route, record.external_lead_id
                ));
            }
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "Failed to create web form");
                self.logger
                    .error(&format!("Failed to create automatic form: {}", e));
            }
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
