//! # Storage Seams
//!
//! The engine needs exactly two stores: payment records updated with an
//! optimistic version check, and a deduplication set with atomic
//! insert-if-absent claims. Both are traits so the persistence engine stays
//! an external collaborator; the in-memory implementations back tests and
//! single-process deployments.

use crate::error::{GatewayError, GatewayResult};
use crate::payment::Payment;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Durable store for `Payment` records, keyed by payment id.
///
/// `update` is a compare-and-set on the record's `version`: the write only
/// lands when the stored version equals `expected_version`, giving the
/// single-writer-per-payment discipline the state machine relies on.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn get(&self, payment_id: &str) -> GatewayResult<Option<Payment>>;

    /// Resolve a payment by the processor intent it references
    async fn find_by_intent(&self, intent_id: &str) -> GatewayResult<Option<Payment>>;

    /// Insert a fresh record; fails on id collision
    async fn insert(&self, payment: Payment) -> GatewayResult<()>;

    /// Compare-and-set update. On success the stored record carries
    /// `expected_version + 1`.
    async fn update(&self, payment: Payment, expected_version: u64) -> GatewayResult<()>;
}

/// Durable set of already-claimed webhook event identifiers.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Atomically claim an event identifier. Returns `true` the first time,
    /// `false` on every later call for the same id. No transition may be
    /// applied unless the claim succeeded.
    async fn claim(&self, event_id: &str) -> GatewayResult<bool>;
}

/// Shared handles (dynamic dispatch)
pub type SharedPaymentStore = Arc<dyn PaymentStore>;
pub type SharedDedupStore = Arc<dyn DedupStore>;

/// In-memory payment store
#[derive(Default)]
pub struct MemoryPaymentStore {
    payments: RwLock<HashMap<String, Payment>>,
}

impl MemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for MemoryPaymentStore {
    async fn get(&self, payment_id: &str) -> GatewayResult<Option<Payment>> {
        Ok(self.payments.read().await.get(payment_id).cloned())
    }

    async fn find_by_intent(&self, intent_id: &str) -> GatewayResult<Option<Payment>> {
        Ok(self
            .payments
            .read()
            .await
            .values()
            .find(|p| p.intent_id.as_deref() == Some(intent_id))
            .cloned())
    }

    async fn insert(&self, payment: Payment) -> GatewayResult<()> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&payment.id) {
            return Err(GatewayError::Internal(format!(
                "Duplicate payment id: {}",
                payment.id
            )));
        }
        payments.insert(payment.id.clone(), payment);
        Ok(())
    }

    async fn update(&self, mut payment: Payment, expected_version: u64) -> GatewayResult<()> {
        let mut payments = self.payments.write().await;
        let current = payments
            .get(&payment.id)
            .ok_or_else(|| GatewayError::PaymentNotFound {
                payment_id: payment.id.clone(),
            })?;

        if current.version != expected_version {
            return Err(GatewayError::StoreConflict {
                payment_id: payment.id.clone(),
            });
        }

        payment.version = expected_version + 1;
        payment.updated_at = Utc::now();
        payments.insert(payment.id.clone(), payment);
        Ok(())
    }
}

/// Retention window that must exceed the processor's documented maximum
/// redelivery window (roughly 24 hours).
fn default_dedup_retention() -> Duration {
    Duration::hours(72)
}

/// In-memory deduplication store.
///
/// Claimed ids are kept with their claim time; entries older than the
/// retention window are evicted opportunistically on later claims. Eviction
/// is the only removal path.
pub struct MemoryDedupStore {
    claimed: Mutex<HashMap<String, DateTime<Utc>>>,
    retention: Duration,
}

impl MemoryDedupStore {
    pub fn new() -> Self {
        Self::with_retention(default_dedup_retention())
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            claimed: Mutex::new(HashMap::new()),
            retention,
        }
    }

    fn evict_expired(&self, claimed: &mut HashMap<String, DateTime<Utc>>, now: DateTime<Utc>) {
        let cutoff = now - self.retention;
        let before = claimed.len();
        claimed.retain(|_, claimed_at| *claimed_at > cutoff);
        let evicted = before - claimed.len();
        if evicted > 0 {
            debug!(evicted, "Evicted expired dedup entries");
        }
    }
}

impl Default for MemoryDedupStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DedupStore for MemoryDedupStore {
    async fn claim(&self, event_id: &str) -> GatewayResult<bool> {
        let mut claimed = self.claimed.lock().await;
        let now = Utc::now();
        self.evict_expired(&mut claimed, now);

        match claimed.entry(event_id.to_string()) {
            std::collections::hash_map::Entry::Occupied(_) => Ok(false),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(now);
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Currency;

    #[tokio::test]
    async fn test_payment_store_cas() {
        let store = MemoryPaymentStore::new();
        let payment = Payment::new("ord_1", 1000, Currency::RUB);
        let id = payment.id.clone();
        store.insert(payment.clone()).await.unwrap();

        // Write with the matching version succeeds and bumps it
        store.update(payment.clone(), 0).await.unwrap();
        let stored = store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);

        // Stale writer loses
        let err = store.update(payment, 0).await.unwrap_err();
        assert!(matches!(err, GatewayError::StoreConflict { .. }));
    }

    #[tokio::test]
    async fn test_find_by_intent() {
        let store = MemoryPaymentStore::new();
        let mut payment = Payment::new("ord_2", 500, Currency::RUB);
        payment.intent_id = Some("pi_77".to_string());
        store.insert(payment.clone()).await.unwrap();

        let found = store.find_by_intent("pi_77").await.unwrap().unwrap();
        assert_eq!(found.id, payment.id);
        assert!(store.find_by_intent("pi_other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claim_once() {
        let store = MemoryDedupStore::new();
        assert!(store.claim("evt_1").await.unwrap());
        assert!(!store.claim("evt_1").await.unwrap());
        assert!(store.claim("evt_2").await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_claims_yield_one_winner() {
        let store = Arc::new(MemoryDedupStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(
                async move { store.claim("evt_race").await.unwrap() },
            ));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_retention_eviction() {
        let store = MemoryDedupStore::with_retention(Duration::zero());
        assert!(store.claim("evt_old").await.unwrap());
        // Zero retention: the next claim evicts the expired entry first,
        // so the id can be claimed again.
        assert!(store.claim("evt_old").await.unwrap());
    }
}
