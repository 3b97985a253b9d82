//! Customer records: per-customer handling mode behind a pluggable store.

pub mod in_memory;
pub mod traits;

pub use in_memory::InMemoryCustomerStore;
pub use traits::{CustomerMode, CustomerRecord, CustomerStore, StoreError};

use crate::config::StoreConfig;
use std::sync::Arc;

/// Factory: create the customer store selected by config.
pub fn create_customer_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn CustomerStore>> {
    match config.kind.as_str() {
        "memory" => Ok(Arc::new(InMemoryCustomerStore::new())),
        other if other.trim().is_empty() => {
            anyhow::bail!("store.kind cannot be empty. Supported values: memory")
        }
        other => anyhow::bail!("Unknown store kind '{other}'. Supported values: memory"),
    }
}
