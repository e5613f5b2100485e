//! Short-lived CSRF state for the OAuth authorization-code flow.
//!
//! A state token is written once when authorization starts and consumed at
//! most once by the callback. [`StateCache::take`] must be an atomic
//! read-then-delete so that a replayed callback cannot reuse a state.

use std::time::Duration;

use async_trait::async_trait;
use rand::RngCore;

use crate::error::StoreError;

/// Lifetime of an authorization state entry.
pub const AUTHORIZATION_STATE_TTL: Duration = Duration::from_secs(600);

/// Number of random bytes in a state token (hex encoded to twice as many chars).
pub const STATE_TOKEN_BYTES: usize = 32;

/// Generate a cryptographically random, hex encoded state token.
pub fn generate_state_token() -> String {
    let mut bytes = [0u8; STATE_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Shared cache mapping state tokens to the identity that started the flow.
#[async_trait]
pub trait StateCache: Send + Sync {
    /// Store `state -> identity` for `ttl`.
    async fn put(&self, state: &str, identity: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Remove and return the identity for `state`.
    ///
    /// Returns `None` for unknown or expired entries. A second `take` of the
    /// same state always returns `None`.
    async fn take(&self, state: &str) -> Result<Option<String>, StoreError>;

    /// Drop expired entries, returning how many were removed.
    async fn cleanup_expired(&self) -> Result<usize, StoreError>;
}
