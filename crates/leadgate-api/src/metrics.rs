//! Prometheus metrics for the API service.
//!
//! Every [`ServiceMetrics`] owns its registry so that several routers (one per
//! test, for instance) never collide on metric names.

use std::sync::Arc;

use leadgate_core::webhook::DispatchSummary;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Service metrics for observability
#[derive(Debug)]
pub struct ServiceMetrics {
    registry: Registry,

    pub http_requests_total: IntCounter,

    // Webhook processing
    pub webhook_deliveries_total: IntCounter,
    pub webhook_signature_failures_total: IntCounter,
    pub webhook_handshakes_total: IntCounter,

    // Lead ingestion
    pub leads_created_total: IntCounter,
    pub lead_duplicates_total: IntCounter,
    pub lead_failures_total: IntCounter,
    pub enrichment_degradations_total: IntCounter,

    // OAuth
    pub oauth_callbacks_total: IntCounter,
    pub oauth_callback_failures_total: IntCounter,

    // Administration
    pub admin_auth_failures_total: IntCounter,
    pub account_syncs_total: IntCounter,
    pub account_sync_failures_total: IntCounter,
}

impl ServiceMetrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new_custom(Some("leadgate".to_string()), None)?;

        let counter = |name: &str, help: &str| -> Result<IntCounter, prometheus::Error> {
            let counter = IntCounter::new(name, help)?;
            registry.register(Box::new(counter.clone()))?;
            Ok(counter)
        };

        let metrics = Self {
            http_requests_total: counter("http_requests_total", "Total number of HTTP requests")?,
            webhook_deliveries_total: counter(
                "webhook_deliveries_total",
                "Webhook deliveries received",
            )?,
            webhook_signature_failures_total: counter(
                "webhook_signature_failures_total",
                "Webhook deliveries rejected by authentication",
            )?,
            webhook_handshakes_total: counter(
                "webhook_handshakes_total",
                "Successful webhook subscription handshakes",
            )?,
            leads_created_total: counter("leads_created_total", "Lead records created")?,
            lead_duplicates_total: counter(
                "lead_duplicates_total",
                "Lead notifications ignored because the lead already exists",
            )?,
            lead_failures_total: counter(
                "lead_failures_total",
                "Lead notifications that could not be stored",
            )?,
            enrichment_degradations_total: counter(
                "enrichment_degradations_total",
                "Leads created with placeholder enrichment data",
            )?,
            oauth_callbacks_total: counter(
                "oauth_callbacks_total",
                "Successful OAuth callbacks",
            )?,
            oauth_callback_failures_total: counter(
                "oauth_callback_failures_total",
                "Failed OAuth callbacks",
            )?,
            admin_auth_failures_total: counter(
                "admin_auth_failures_total",
                "Administrative requests rejected for a missing or wrong token",
            )?,
            account_syncs_total: counter("account_syncs_total", "Page account syncs run")?,
            account_sync_failures_total: counter(
                "account_sync_failures_total",
                "Pages or listing requests that failed during account sync",
            )?,
            registry,
        };

        #[cfg(target_os = "linux")]
        metrics
            .registry
            .register(Box::new(prometheus::process_collector::ProcessCollector::for_self()))?;

        Ok(Arc::new(metrics))
    }

    /// Record the outcome of one webhook delivery.
    pub fn record_dispatch(&self, summary: &DispatchSummary) {
        self.leads_created_total.inc_by(summary.created as u64);
        self.lead_duplicates_total.inc_by(summary.duplicates as u64);
        self.lead_failures_total.inc_by(summary.failed as u64);
        self.enrichment_degradations_total
            .inc_by(summary.degraded as u64);
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
