//! Connection registries and per-customer serialization.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

use crate::connection::Connection;

/// Live connections of one role, keyed by connection id.
///
/// Only used to find the outbound channel for a given id; broadcasting
/// goes through the transport.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<String, Arc<Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, connection: Arc<Connection>) {
        self.connections
            .lock()
            .insert(connection.id().to_string(), connection);
    }

    pub fn remove(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.lock().remove(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.lock().is_empty()
    }
}

/// One async mutex per customer id, so the read-check-mutate of a
/// customer's mode never interleaves with another flow for that customer.
///
/// Entries only live while some flow holds or waits on them.
#[derive(Default)]
pub struct CustomerLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl CustomerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, customer_id: &str) -> CustomerGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock();
            locks
                .entry(customer_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        CustomerGuard {
            guard: Some(lock.lock_owned().await),
            locks: self,
            customer_id: customer_id.to_string(),
        }
    }

    /// Drop the lock entry for a customer nobody is currently holding.
    pub fn prune(&self, customer_id: &str) {
        let mut locks = self.locks.lock();
        if locks
            .get(customer_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(customer_id);
        }
    }

    /// Number of customer ids with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

/// Held for the duration of one customer flow. Releasing it prunes the
/// entry when no other flow is queued on the same customer.
pub struct CustomerGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a CustomerLocks,
    customer_id: String,
}

impl Drop for CustomerGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.prune(&self.customer_id);
    }
}
