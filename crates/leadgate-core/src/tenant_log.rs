//! Per-tenant integration logging.
//!
//! Events about a site's Facebook integration are emitted on the
//! `leadgate::meta` target with a `tenant` field, so a subscriber can filter
//! or route them per site. Loggers are created once at startup and held in a
//! [`TenantLogRegistry`]; nothing creates loggers on demand.
//!
//! ```rust
//! use leadgate_core::tenant_log::{TenantId, TenantLogRegistry};
//!
//! let mut registry = TenantLogRegistry::new();
//! registry.register(TenantId::new("crm.example.com").unwrap());
//!
//! assert!(registry.logger_for("crm.example.com").is_some());
//! assert!(registry.logger_for("other.example.com").is_none());
//! assert!(TenantId::new("Upper Case").is_err());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Tracing target for integration events.
pub const META_LOG_TARGET: &str = "leadgate::meta";

// ============================================================================
// TenantId
// ============================================================================

/// Identifier of a site (tenant).
///
/// Lowercase ASCII letters, digits, `.`, `-` and `_` only. Must not be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidTenantIdError> {
        let s = value.into();
        if s.is_empty() {
            return Err(InvalidTenantIdError::Empty);
        }
        if !s.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-' || c == '_'
        }) {
            return Err(InvalidTenantIdError::InvalidChars { value: s });
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned when a [`TenantId`] cannot be created.
#[derive(Debug, thiserror::Error)]
pub enum InvalidTenantIdError {
    #[error("Tenant ID must not be empty")]
    Empty,

    #[error(
        "Tenant ID '{value}' contains invalid characters; \
         use lowercase alphanumeric, dots, hyphens, or underscores"
    )]
    InvalidChars { value: String },
}

// ============================================================================
// TenantLogger
// ============================================================================

/// Logger bound to one tenant.
#[derive(Debug, Clone)]
pub struct TenantLogger {
    tenant: TenantId,
}

impl TenantLogger {
    pub fn new(tenant: TenantId) -> Self {
        Self { tenant }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn info(&self, message: &str) {
        tracing::info!(target: META_LOG_TARGET, tenant = %self.tenant, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(target: META_LOG_TARGET, tenant = %self.tenant, "{}", message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!(target: META_LOG_TARGET, tenant = %self.tenant, "{}", message);
    }
}

// ============================================================================
// TenantLogRegistry
// ============================================================================

/// Tenant loggers built at startup and used read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct TenantLogRegistry {
    loggers: HashMap<TenantId, Arc<TenantLogger>>,
}

impl TenantLogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tenant, returning its logger. Registering twice returns the
    /// existing logger.
    pub fn register(&mut self, tenant: TenantId) -> Arc<TenantLogger> {
        self.loggers
            .entry(tenant.clone())
            .or_insert_with(|| Arc::new(TenantLogger::new(tenant)))
            .clone()
    }

    /// Logger for a registered tenant.
    pub fn logger_for(&self, tenant: &str) -> Option<Arc<TenantLogger>> {
        let id = TenantId::new(tenant).ok()?;
        self.loggers.get(&id).cloned()
    }

    pub fn contains(&self, tenant: &str) -> bool {
        self.logger_for(tenant).is_some()
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}

#[cfg(test)]
#[path = "tenant_log_tests.rs"]
mod tests;
