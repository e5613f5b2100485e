//! Lead enrichment through sequential Graph API reads.
//!
//! A `leadgen` webhook only carries ids. [`LeadEnricher`] resolves them into
//! answers and human readable names:
//!
//! 1. lead: submitted field data and ad attribution
//! 2. form: name and status
//! 3. page: name
//! 4. ad, ad set and campaign names, only for paid (non-organic) leads
//!
//! Every step degrades independently. A failed step is recorded as an
//! [`EnrichmentDegraded`] entry and replaced by placeholder data; enrichment
//! itself never fails.

use std::fmt;
use std::sync::Arc;

use leadgate_graph::{FieldData, GraphApi};
use tracing::{info, instrument, warn};

/// Enrichment step that produced a degraded result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentStage {
    Lead,
    Form,
    Page,
    Ad,
}

impl fmt::Display for EnrichmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lead => "lead",
            Self::Form => "form",
            Self::Page => "page",
            Self::Ad => "ad",
        };
        f.write_str(name)
    }
}

/// A step that fell back to placeholder data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage} enrichment degraded: {message}")]
pub struct EnrichmentDegraded {
    pub stage: EnrichmentStage,
    pub message: String,
}

/// Placeholder status used when the form read fails.
pub const FORM_STATUS_ERROR: &str = "ERROR";

/// Placeholder status used when the form has no status.
pub const FORM_STATUS_UNKNOWN: &str = "UNKNOWN";

/// Everything learned about a lead from the Graph API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedLead {
    pub field_data: Vec<FieldData>,
    pub ad_id: Option<String>,
    pub adset_id: Option<String>,
    pub campaign_id: Option<String>,
    pub is_organic: bool,
    /// `None` when the change carried no form id.
    pub form_name: Option<String>,
    pub form_status: Option<String>,
    /// `None` when the change carried no page id.
    pub page_name: Option<String>,
    pub ad_name: Option<String>,
    pub adset_name: Option<String>,
    pub campaign_name: Option<String>,
    pub degraded: Vec<EnrichmentDegraded>,
}

impl EnrichedLead {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    fn degrade(&mut self, stage: EnrichmentStage, message: String) {
        warn!(stage = %stage, error = %message, "Enrichment degraded");
        self.degraded.push(EnrichmentDegraded { stage, message });
    }
}

/// Placeholder form label.
pub fn form_placeholder(form_id: &str) -> String {
    format!("Form {}", form_id)
}

/// Placeholder page label.
pub fn page_placeholder(page_id: &str) -> String {
    format!("Page {}", page_id)
}

/// Resolves lead ids into enriched data.
#[derive(Clone)]
pub struct LeadEnricher {
    graph: Arc<dyn GraphApi>,
}

impl LeadEnricher {
    pub fn new(graph: Arc<dyn GraphApi>) -> Self {
        Self { graph }
    }

    /// Run all enrichment steps for one lead.
    #[instrument(skip(self, access_token))]
    pub async fn enrich(
        &self,
        leadgen_id: &str,
        page_id: Option<&str>,
        form_id: Option<&str>,
        access_token: &str,
    ) -> EnrichedLead {
        let mut enriched = EnrichedLead {
            form_name: form_id.map(form_placeholder),
            form_status: form_id.map(|_| FORM_STATUS_UNKNOWN.to_string()),
            page_name: page_id.map(page_placeholder),
            ..EnrichedLead::default()
        };

        match self.graph.get_lead(leadgen_id, access_token).await {
            Ok(lead) => {
                enriched.field_data = lead.field_data;
                enriched.ad_id = lead.ad_id;
                enriched.adset_id = lead.adset_id;
                enriched.campaign_id = lead.campaign_id;
                enriched.is_organic = lead.is_organic;
            }
            Err(e) => enriched.degrade(EnrichmentStage::Lead, format!("Lead data error: {}", e)),
        }

        if let Some(form_id) = form_id {
            match self.graph.get_form(form_id, access_token).await {
                Ok(form) => {
                    if let Some(name) = form.name.filter(|n| !n.is_empty()) {
                        enriched.form_name = Some(name);
                    }
                    if let Some(status) = form.status.filter(|s| !s.is_empty()) {
                        enriched.form_status = Some(status);
                    }
                }
                Err(e) => {
                    enriched.form_status = Some(FORM_STATUS_ERROR.to_string());
                    enriched.degrade(EnrichmentStage::Form, e.to_string());
                }
            }
        }

        if let Some(page_id) = page_id {
            match self.graph.get_page(page_id, access_token).await {
                Ok(page) => {
                    if let Some(name) = page.name.filter(|n| !n.is_empty()) {
                        enriched.page_name = Some(name);
                    }
                }
                Err(e) => enriched.degrade(EnrichmentStage::Page, e.to_string()),
            }
        }

        if let Some(ad_id) = enriched.ad_id.clone().filter(|_| !enriched.is_organic) {
            match self.graph.get_ad(&ad_id, access_token).await {
                Ok(ad) => {
                    enriched.ad_name = ad.name;
                    if let Some(adset) = ad.adset {
                        enriched.adset_id = adset.id.or(enriched.adset_id.take());
                        enriched.adset_name = adset.name;
                        if let Some(campaign) = adset.campaign {
                            enriched.campaign_id = campaign.id.or(enriched.campaign_id.take());
                            enriched.campaign_name = campaign.name;
                        }
                    }
                }
                Err(e) => enriched.degrade(EnrichmentStage::Ad, e.to_string()),
            }
        }

        info!(
            fields = enriched.field_data.len(),
            degraded = enriched.degraded.len(),
            "Lead enrichment finished"
        );
        enriched
    }
}

#[cfg(test)]
#[path = "enrichment_tests.rs"]
mod tests;
