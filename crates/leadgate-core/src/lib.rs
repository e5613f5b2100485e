//! # Leadgate Core
//!
//! Domain logic for connecting a CRM lead pipeline to Facebook Lead Ads.
//!
//! This crate covers:
//! - The integration settings singleton and its access token
//! - The OAuth2 authorization-code flow with single-use CSRF state
//! - The webhook subscription handshake and inbound delivery authentication
//! - Dispatching `leadgen` changes into enriched lead records
//! - Optional generation of web forms that mirror Facebook lead forms
//! - Syncing the Facebook pages the access token manages
//!
//! ## Architecture
//!
//! Every collaborator the host platform provides (settings storage, the
//! shared cache, the lead store, realtime notifications) sits behind a trait.
//! In-memory implementations live in [`adapters`].
//!
//! ## Usage
//!
//! ```rust
//! use leadgate_core::Timestamp;
//!
//! let now = Timestamp::now();
//! let later = now.add_seconds(3600).unwrap();
//! assert!(later > now);
//! assert!(now.add_seconds(i64::MAX).is_none());
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod accounts;
pub mod adapters;
pub mod enrichment;
pub mod error;
pub mod leads;
pub mod notify;
pub mod oauth;
pub mod secret;
pub mod settings;
pub mod state_cache;
pub mod tenant_log;
pub mod webform;
pub mod webhook;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{
    ConfigurationError, DispatchError, PersistenceError, SettingsError, SignatureError,
    StateValidationError, StoreError, VerificationError, WebFormError,
};
pub use leadgate_graph::TokenExchangeError;
pub use secret::SecretValue;
pub use settings::{IntegrationSettings, SettingsStore, TokenInfo};

// ============================================================================
// Time
// ============================================================================

/// UTC timestamp used for token expiry and record bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current moment
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wrap an existing `DateTime<Utc>`
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Build a timestamp from whole seconds since the Unix epoch
    pub fn from_unix_seconds(seconds: i64) -> Option<Self> {
        Utc.timestamp_opt(seconds, 0).single().map(Self)
    }

    /// Parse timestamp from RFC3339 string
    pub fn from_rfc3339(s: &str) -> Result<Self, ParseError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|_| ParseError::InvalidFormat {
                expected: "RFC3339 datetime".to_string(),
                actual: s.to_string(),
            })?
            .with_timezone(&Utc);
        Ok(Self(dt))
    }

    /// Convert to RFC3339 string
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Get underlying DateTime
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Add seconds to timestamp; `None` when the result is out of range
    pub fn add_seconds(&self, seconds: i64) -> Option<Self> {
        let delta = chrono::Duration::try_seconds(seconds)?;
        self.0.checked_add_signed(delta).map(Self)
    }

    /// Whole seconds from `self` until `later` (negative when `later` is in the past)
    pub fn seconds_until(&self, later: &Timestamp) -> i64 {
        (later.0 - self.0).num_seconds()
    }

    /// Format with a `strftime` pattern
    pub fn format(&self, pattern: &str) -> String {
        self.0.format(pattern).to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Error type for string parsing failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid format: expected {expected}, got '{actual}'")]
    InvalidFormat { expected: String, actual: String },
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
