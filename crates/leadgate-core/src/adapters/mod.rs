//! # Infrastructure Adapters
//!
//! In-memory implementations of the storage, cache, form and page account
//! interfaces, used by the service binary and by tests.

pub mod memory;

pub use memory::{
    InMemoryLeadStore, InMemoryPageAccountStore, InMemorySettingsStore, InMemoryStateCache,
    InMemoryWebFormStore,
};
