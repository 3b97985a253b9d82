//! In-memory customer store.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::traits::{CustomerRecord, CustomerStore, StoreError};

/// A volatile customer store that keeps each record as serialized JSON,
/// mimicking the encode/decode hop of a real datastore.
pub struct InMemoryCustomerStore {
    customers: Mutex<HashMap<String, String>>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self {
            customers: Mutex::new(HashMap::new()),
        }
    }

    fn encode(record: &CustomerRecord) -> Result<String, StoreError> {
        Ok(serde_json::to_string(record)?)
    }

    fn decode(raw: &str) -> Result<CustomerRecord, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Number of customers seen so far.
    pub fn len(&self) -> usize {
        self.customers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.lock().is_empty()
    }
}

impl Default for InMemoryCustomerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn get_or_create(&self, customer_id: &str) -> Result<CustomerRecord, StoreError> {
        if customer_id.trim().is_empty() {
            return Err(StoreError::InvalidArgument("a customer id is required"));
        }

        let mut customers = self.customers.lock();
        if let Some(raw) = customers.get(customer_id) {
            return Self::decode(raw);
        }

        tracing::debug!(customer_id, "Storing new customer");
        let record = CustomerRecord::new(customer_id);
        customers.insert(customer_id.to_string(), Self::encode(&record)?);
        drop(customers);

        Ok(CustomerRecord {
            is_new: true,
            ..record
        })
    }

    async fn set(
        &self,
        customer_id: &str,
        record: CustomerRecord,
    ) -> Result<CustomerRecord, StoreError> {
        if customer_id.trim().is_empty() {
            return Err(StoreError::InvalidArgument(
                "a customer id is required to store customer data",
            ));
        }

        let raw = Self::encode(&record)?;
        self.customers.lock().insert(customer_id.to_string(), raw);
        tracing::debug!(customer_id, mode = %record.mode, "Updated customer");

        Ok(CustomerRecord {
            is_new: false,
            ..record
        })
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customers::CustomerMode;

    #[tokio::test]
    async fn get_or_create_marks_only_first_call_as_new() {
        let store = InMemoryCustomerStore::new();

        let first = store.get_or_create("c1").await.unwrap();
        assert!(first.is_new);
        assert_eq!(first.mode, CustomerMode::Agent);
        assert_eq!(first.id, "c1");

        let second = store.get_or_create("c1").await.unwrap();
        assert!(!second.is_new);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn get_or_create_rejects_empty_id() {
        let store = InMemoryCustomerStore::new();
        let err = store.get_or_create("").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn set_rejects_empty_id() {
        let store = InMemoryCustomerStore::new();
        let err = store
            .set("  ", CustomerRecord::new("c1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn set_then_get_is_lossless() {
        let store = InMemoryCustomerStore::new();
        let mut record = store.get_or_create("c1").await.unwrap();
        record.mode = CustomerMode::Operator;

        let stored = store.set("c1", record.clone()).await.unwrap();
        assert!(!stored.is_new);

        let fetched = store.get_or_create("c1").await.unwrap();
        assert_eq!(fetched.id, record.id);
        assert_eq!(fetched.mode, CustomerMode::Operator);
        assert_eq!(fetched.created_at, record.created_at);
        assert!(!fetched.is_new);
    }

    #[tokio::test]
    async fn set_creates_record_for_unseen_id() {
        let store = InMemoryCustomerStore::new();
        store.set("c9", CustomerRecord::new("c9")).await.unwrap();

        let fetched = store.get_or_create("c9").await.unwrap();
        assert!(!fetched.is_new);
    }
}
