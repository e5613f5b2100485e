//! Realtime notifications about newly ingested leads.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::Timestamp;

/// Event name published for every created lead.
pub const LEAD_RECEIVED_EVENT: &str = "facebook_lead_received";

/// Payload of a [`LEAD_RECEIVED_EVENT`] notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadReceived {
    pub event: &'static str,
    pub leadgen_id: String,
    pub page_id: Option<String>,
    pub form_id: Option<String>,
    pub timestamp: Timestamp,
}

impl LeadReceived {
    pub fn new(leadgen_id: &str, page_id: Option<&str>, form_id: Option<&str>) -> Self {
        Self {
            event: LEAD_RECEIVED_EVENT,
            leadgen_id: leadgen_id.to_string(),
            page_id: page_id.map(str::to_string),
            form_id: form_id.map(str::to_string),
            timestamp: Timestamp::now(),
        }
    }
}

/// Fire-and-forget publisher. Publishing never fails the caller.
pub trait LeadNotifier: Send + Sync {
    fn publish(&self, event: LeadReceived);
}

/// Publishes over a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<LeadReceived>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LeadReceived> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl LeadNotifier for BroadcastNotifier {
    fn publish(&self, event: LeadReceived) {
        let leadgen_id = event.leadgen_id.clone();
        match self.sender.send(event) {
            Ok(receivers) => debug!(leadgen_id = %leadgen_id, receivers, "Lead notification published"),
            Err(_) => debug!(leadgen_id = %leadgen_id, "No notification subscribers"),
        }
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
