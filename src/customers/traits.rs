//! Customer record types and the storage trait the router depends on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who is currently answering a customer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerMode {
    /// The automated agent replies.
    Agent,
    /// A human operator replies. Never reverted to `Agent`.
    Operator,
}

impl std::fmt::Display for CustomerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Agent => f.write_str("AGENT"),
            Self::Operator => f.write_str("OPERATOR"),
        }
    }
}

/// Per-customer conversation state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerRecord {
    pub id: String,
    pub mode: CustomerMode,
    pub created_at: DateTime<Utc>,
    /// Set only on the value returned by the call that created the record.
    #[serde(skip)]
    pub is_new: bool,
}

impl CustomerRecord {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            mode: CustomerMode::Agent,
            created_at: Utc::now(),
            is_new: false,
        }
    }

    pub fn is_escalated(&self) -> bool {
        self.mode == CustomerMode::Operator
    }
}

/// Failures raised by a [`CustomerStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("failed to encode or decode customer record: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Keyed lookup and creation of customer records.
///
/// Implementations serialize records on the way in and out, so a durable
/// backend can replace the in-memory one without touching callers.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Return the record for `customer_id`, creating an `Agent`-mode record
    /// on first reference. Only the creating call sees `is_new == true`.
    async fn get_or_create(&self, customer_id: &str) -> Result<CustomerRecord, StoreError>;

    /// Overwrite the stored record for `customer_id`.
    async fn set(
        &self,
        customer_id: &str,
        record: CustomerRecord,
    ) -> Result<CustomerRecord, StoreError>;

    /// The name of this store implementation.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_serializes_as_upper_case() {
        assert_eq!(
            serde_json::to_string(&CustomerMode::Operator).unwrap(),
            "\"OPERATOR\""
        );
        let back: CustomerMode = serde_json::from_str("\"AGENT\"").unwrap();
        assert_eq!(back, CustomerMode::Agent);
    }

    #[test]
    fn is_new_is_not_serialized() {
        let mut record = CustomerRecord::new("c1");
        record.is_new = true;
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("is_new"));

        let back: CustomerRecord = serde_json::from_str(&json).unwrap();
        assert!(!back.is_new);
        assert_eq!(back.mode, CustomerMode::Agent);
    }

    #[test]
    fn only_operator_mode_is_escalated() {
        let mut record = CustomerRecord::new("c1");
        assert!(!record.is_escalated());
        record.mode = CustomerMode::Operator;
        assert!(record.is_escalated());
    }
}
