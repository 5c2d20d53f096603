//! Bounded-concurrency fetch driver over a worklist of keys.
//!
//! Workers are futures joined on the calling task; they claim worklist
//! indices from a shared atomic cursor, so each key is fetched once and at
//! most `concurrency` requests are in flight. Results are written to the
//! cache as they arrive and handed to the caller in batches.

use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;

use super::cache::CacheStore;
use crate::azure::error::IntakeError;

/// Default number of concurrent requests.
pub const DEFAULT_CONCURRENCY: usize = 6;
/// Default number of results per delivered batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Worker pool limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPool {
    /// Maximum concurrent requests.
    pub concurrency: usize,
    /// Results buffered per worker before a batch is delivered.
    pub batch_size: usize,
}

impl Default for FetchPool {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Outcome counts of a pool run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// Keys fetched successfully.
    pub fetched: usize,
    /// Keys found in the cache at fetch time and not requested.
    pub cached: usize,
    /// Keys whose fetch failed and were stored as the default value.
    pub failed: usize,
}

impl PoolReport {
    /// Total keys processed.
    #[must_use]
    pub const fn processed(&self) -> usize {
        self.fetched + self.cached + self.failed
    }

    /// Sums two reports.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            fetched: self.fetched + other.fetched,
            cached: self.cached + other.cached,
            failed: self.failed + other.failed,
        }
    }
}

impl FetchPool {
    /// Creates a pool, treating zero limits as one.
    #[must_use]
    pub fn new(concurrency: usize, batch_size: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            batch_size: batch_size.max(1),
        }
    }

    /// Fetches every key in `keys`, storing each result in `cache` and
    /// delivering `(key, value)` batches to `on_batch`.
    ///
    /// The cache is checked again immediately before each request; a key
    /// that is already stored is delivered from the cache instead. A failed
    /// fetch is logged and recorded as `V::default()` so the key counts as
    /// completed without affecting its siblings. Storing a value releases
    /// any claim the caller holds on the key.
    pub async fn run<K, V, F, Fut, B>(
        &self,
        keys: &[K],
        cache: &CacheStore<K, V>,
        fetch_one: F,
        on_batch: B,
    ) -> PoolReport
    where
        K: Eq + Hash + Clone + Debug,
        V: Clone + Default,
        F: Fn(K) -> Fut,
        Fut: Future<Output = Result<V, IntakeError>>,
        B: Fn(Vec<(K, V)>),
    {
        let cursor = &AtomicUsize::new(0);
        let fetch = &fetch_one;
        let deliver = &on_batch;
        let worker_count = self.concurrency.max(1).min(keys.len());
        let batch_size = self.batch_size.max(1);

        let workers = (0..worker_count).map(|_| async move {
            let mut report = PoolReport::default();
            let mut batch: Vec<(K, V)> = Vec::with_capacity(batch_size);
            while let Some(key) = keys.get(cursor.fetch_add(1, Ordering::Relaxed)) {
                let value = match cache.get(key) {
                    Some(cached) => {
                        report.cached += 1;
                        cached
                    }
                    None => {
                        let fetched = match fetch(key.clone()).await {
                            Ok(fetched) => {
                                report.fetched += 1;
                                fetched
                            }
                            Err(error) => {
                                tracing::warn!("fetch for {key:?} failed: {error}");
                                report.failed += 1;
                                V::default()
                            }
                        };
                        cache.put(key.clone(), fetched.clone());
                        fetched
                    }
                };
                batch.push((key.clone(), value));
                if batch.len() >= batch_size {
                    deliver(std::mem::take(&mut batch));
                }
            }
            if !batch.is_empty() {
                deliver(batch);
            }
            report
        });

        join_all(workers)
            .await
            .into_iter()
            .fold(PoolReport::default(), PoolReport::merge)
    }
}
