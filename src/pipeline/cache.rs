//! Session-scoped memoisation of fetched enrichment data.
//!
//! Entries are never evicted. A key can additionally be *claimed* while a
//! fetch for it is in flight so that no two workers request it at once;
//! other parties needing that key wait for it with [`CacheStore::wait_for`].

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::pin::pin;
use std::sync::{Mutex, PoisonError, RwLock};

use tokio::sync::Notify;

use crate::azure::models::{AvatarDescriptor, AvatarImage, CommentThreadSummary};

/// Concurrent key-value cache with in-flight claims.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    entries: RwLock<HashMap<K, V>>,
    in_flight: Mutex<HashSet<K>>,
    landed: Notify,
}

impl<K, V> Default for CacheStore<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
            landed: Notify::new(),
        }
    }
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when a value is stored for `key`.
    #[must_use]
    pub fn has(&self, key: &K) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Returns a copy of the value stored for `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Stores `value`, replacing any earlier value, and releases the claim on
    /// `key`.
    pub fn put(&self, key: K, value: V) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), value);
        self.release(&key);
    }

    /// Marks `key` as being fetched.
    ///
    /// Returns false when the key is already cached or claimed elsewhere.
    pub fn claim(&self, key: &K) -> bool {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.has(key) {
            return false;
        }
        in_flight.insert(key.clone())
    }

    /// Drops the claim on `key` without storing a value.
    pub fn release(&self, key: &K) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        self.landed.notify_waiters();
    }

    /// Waits until the in-flight fetch of `key` finishes.
    ///
    /// Returns the stored value, or `None` once nothing holds a claim on
    /// `key` and no value was stored.
    pub async fn wait_for(&self, key: &K) -> Option<V> {
        loop {
            let mut landed = pin!(self.landed.notified());
            landed.as_mut().enable();
            if let Some(value) = self.get(key) {
                return Some(value);
            }
            if !self.is_claimed(key) {
                // `put` stores before it drops the claim.
                return self.get(key);
            }
            landed.await;
        }
    }

    /// Returns true while a fetch for `key` is in flight.
    #[must_use]
    pub fn is_claimed(&self, key: &K) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The caches shared by every enrichment coordinator of a session.
#[derive(Debug, Default)]
pub struct EnrichmentCaches {
    /// Retained comment threads by pull request id.
    pub threads: CacheStore<u64, Vec<CommentThreadSummary>>,
    /// Avatar images by subject descriptor; `None` records a missing avatar.
    pub avatars: CacheStore<AvatarDescriptor, Option<AvatarImage>>,
}

impl EnrichmentCaches {
    /// Creates empty caches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::CacheStore;

    #[rstest]
    fn put_is_idempotent_for_equal_values() {
        let cache: CacheStore<u64, Vec<u8>> = CacheStore::new();
        cache.put(1, vec![1, 2]);
        cache.put(1, vec![1, 2]);

        assert_eq!(cache.get(&1), Some(vec![1, 2]));
        assert_eq!(cache.len(), 1);
    }

    #[rstest]
    fn last_write_wins() {
        let cache: CacheStore<&str, u8> = CacheStore::new();
        cache.put("k", 1);
        cache.put("k", 2);
        assert_eq!(cache.get(&"k"), Some(2));
    }

    #[rstest]
    fn claims_are_exclusive_until_stored() {
        let cache: CacheStore<u64, u8> = CacheStore::new();

        assert!(cache.claim(&7));
        assert!(!cache.claim(&7), "second claim must fail while in flight");
        assert!(cache.is_claimed(&7));

        cache.put(7, 1);

        assert!(!cache.is_claimed(&7));
        assert!(!cache.claim(&7), "cached keys cannot be claimed");
    }

    #[rstest]
    #[tokio::test]
    async fn waiting_resolves_when_the_claimed_value_lands() {
        let cache: Arc<CacheStore<u64, u8>> = Arc::new(CacheStore::new());
        assert!(cache.claim(&5));

        let waiter = {
            let shared = Arc::clone(&cache);
            tokio::spawn(async move { shared.wait_for(&5).await })
        };
        tokio::task::yield_now().await;
        cache.put(5, 42);

        assert_eq!(waiter.await.expect("waiter should finish"), Some(42));
    }

    #[rstest]
    #[tokio::test]
    async fn waiting_ends_without_a_value_when_the_claim_is_dropped() {
        let cache: CacheStore<u64, u8> = CacheStore::new();
        assert_eq!(cache.wait_for(&1).await, None, "unclaimed keys do not block");

        assert!(cache.claim(&2));
        let (value, ()) = futures::join!(cache.wait_for(&2), async { cache.release(&2) });

        assert_eq!(value, None);
    }

    #[rstest]
    fn released_claims_can_be_retaken() {
        let cache: CacheStore<u64, u8> = CacheStore::new();
        assert!(cache.claim(&3));
        cache.release(&3);
        assert!(cache.claim(&3));
        assert!(!cache.has(&3));
    }
}
