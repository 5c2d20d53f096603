//! Enrichment of visible pull requests with comment counts and avatars.
//!
//! Each call to [`EnrichmentCoordinator::ensure_loaded`] splits the keys
//! needed by the visible rows into four groups: keys already in the
//! observable state, keys in the shared cache but not yet in the state, keys
//! another dispatch is fetching, and keys missing from both. Cached keys are
//! copied into the state in one update; missing keys are claimed and fetched
//! by a background task that lands results batch by batch. The same task
//! waits for keys fetched elsewhere and applies each one as it lands.
//!
//! Once [`EnrichmentCoordinator::teardown`] has run (or the coordinator is
//! dropped) batches still populate the shared cache but are no longer
//! applied to the state or announced.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::azure::gateway::{AvatarGateway, CommentThreadGateway};
use crate::azure::models::{
    AvatarDescriptor, CommentThreadSummary, IdentityRef, PullRequestSummary,
};
use crate::telemetry::{NoopTelemetrySink, TelemetryEvent, TelemetrySink};

use super::cache::{CacheStore, EnrichmentCaches};
use super::notify::Notifier;
use super::pool::FetchPool;

mod state;

pub use state::{
    DispatchSummary, EnrichmentReport, EnrichmentState, EnrichmentUpdate, KeyPartition,
};

/// Drives comment-thread and avatar loading for the visible rows.
pub struct EnrichmentCoordinator {
    caches: Arc<EnrichmentCaches>,
    threads_gateway: Arc<dyn CommentThreadGateway>,
    avatars_gateway: Arc<dyn AvatarGateway>,
    pool: FetchPool,
    state: Arc<Mutex<EnrichmentState>>,
    updates: Arc<Notifier<EnrichmentUpdate>>,
    alive: Arc<AtomicBool>,
    tasks: Mutex<Vec<JoinHandle<EnrichmentReport>>>,
    telemetry: Arc<dyn TelemetrySink>,
}

/// Keys of one kind split by where their data currently lives.
struct Partitioned<K, V> {
    hydrate: Vec<(K, V)>,
    missing: Vec<K>,
    awaiting: Vec<K>,
    counts: KeyPartition,
}

impl EnrichmentCoordinator {
    /// Creates a live coordinator over the shared caches.
    #[must_use]
    pub fn new(
        caches: Arc<EnrichmentCaches>,
        threads_gateway: Arc<dyn CommentThreadGateway>,
        avatars_gateway: Arc<dyn AvatarGateway>,
        pool: FetchPool,
    ) -> Self {
        Self {
            caches,
            threads_gateway,
            avatars_gateway,
            pool,
            state: Arc::new(Mutex::new(EnrichmentState::default())),
            updates: Arc::new(Notifier::new()),
            alive: Arc::new(AtomicBool::new(true)),
            tasks: Mutex::new(Vec::new()),
            telemetry: Arc::new(NoopTelemetrySink),
        }
    }

    /// Records an [`TelemetryEvent::EnrichmentCompleted`] event per fetch.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Notifier announcing every batch applied to the state.
    #[must_use]
    pub fn updates(&self) -> &Notifier<EnrichmentUpdate> {
        &self.updates
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn state(&self) -> EnrichmentState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns true until [`Self::teardown`] runs.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Makes sure comment counts and avatars for `visible` are loaded or
    /// being loaded, returning without waiting for any request.
    ///
    /// Must be called from within a Tokio runtime for missing keys to be
    /// fetched; without one they are left unclaimed for a later call.
    pub fn ensure_loaded(&self, visible: &[PullRequestSummary]) -> DispatchSummary {
        if !self.is_alive() {
            return DispatchSummary::default();
        }

        let thread_keys = distinct(visible.iter().map(|pr| pr.id));
        let avatar_keys = distinct(visible.iter().flat_map(|pr| {
            std::iter::once(&pr.created_by)
                .chain(pr.reviewers.iter().map(|reviewer| &reviewer.identity))
                .filter_map(IdentityRef::avatar_descriptor)
        }));

        let (threads, avatars) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let threads = partition(&thread_keys, &self.caches.threads, |id| {
                state.has_threads(*id)
            });
            let avatars = partition(&avatar_keys, &self.caches.avatars, |descriptor| {
                state.has_avatar(descriptor)
            });
            state.apply_threads(&threads.hydrate);
            state.apply_avatars(&avatars.hydrate);
            (threads, avatars)
        };

        let hydrated = EnrichmentUpdate {
            threads: threads.hydrate.iter().map(|(id, _)| *id).collect(),
            avatars: avatars
                .hydrate
                .iter()
                .map(|(descriptor, _)| descriptor.clone())
                .collect(),
        };
        if !hydrated.threads.is_empty() || !hydrated.avatars.is_empty() {
            tracing::debug!(
                "hydrated {} thread and {} avatar entries from cache",
                hydrated.threads.len(),
                hydrated.avatars.len()
            );
            self.updates.emit(&hydrated);
        }

        let summary = DispatchSummary {
            threads: threads.counts,
            avatars: avatars.counts,
        };
        if summary.started_fetch() || summary.awaits_other_fetch() {
            let repositories: HashMap<u64, String> = visible
                .iter()
                .map(|pr| (pr.id, pr.repository.id.clone()))
                .collect();
            self.dispatch(
                Worklist {
                    threads: threads.missing,
                    avatars: avatars.missing,
                    awaited_threads: threads.awaiting,
                    awaited_avatars: avatars.awaiting,
                },
                repositories,
            );
        }
        summary
    }

    fn dispatch(&self, worklist: Worklist, repositories: HashMap<u64, String>) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("no Tokio runtime available; enrichment fetch skipped");
            release_all(&self.caches.threads, &worklist.threads);
            release_all(&self.caches.avatars, &worklist.avatars);
            return;
        };

        tracing::debug!(
            "dispatching {} thread and {} avatar fetches, awaiting {} fetched elsewhere",
            worklist.threads.len(),
            worklist.avatars.len(),
            worklist.awaited_threads.len() + worklist.awaited_avatars.len()
        );
        let task = EnrichmentTask {
            caches: Arc::clone(&self.caches),
            threads_gateway: Arc::clone(&self.threads_gateway),
            avatars_gateway: Arc::clone(&self.avatars_gateway),
            pool: self.pool,
            state: Arc::clone(&self.state),
            updates: Arc::clone(&self.updates),
            alive: Arc::clone(&self.alive),
            telemetry: Arc::clone(&self.telemetry),
        };
        let handle = runtime.spawn(task.run(worklist, repositories));
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// Waits for every dispatched fetch to finish and returns their combined
    /// outcome.
    pub async fn settle(&self) -> EnrichmentReport {
        let handles: Vec<JoinHandle<EnrichmentReport>> = std::mem::take(
            &mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner),
        );
        let mut total = EnrichmentReport::default();
        for handle in handles {
            match handle.await {
                Ok(report) => total = total.merge(report),
                Err(error) => tracing::warn!("enrichment task did not complete: {error}"),
            }
        }
        total
    }

    /// Stops applying results. In-flight fetches still fill the cache.
    pub fn teardown(&self) {
        if self.alive.swap(false, Ordering::AcqRel) {
            tracing::debug!("enrichment coordinator torn down");
        }
    }
}

impl Drop for EnrichmentCoordinator {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }
}

/// Keys handed to one background fetch.
struct Worklist {
    threads: Vec<u64>,
    avatars: Vec<AvatarDescriptor>,
    awaited_threads: Vec<u64>,
    awaited_avatars: Vec<AvatarDescriptor>,
}

/// Owned handles moved into the background fetch.
struct EnrichmentTask {
    caches: Arc<EnrichmentCaches>,
    threads_gateway: Arc<dyn CommentThreadGateway>,
    avatars_gateway: Arc<dyn AvatarGateway>,
    pool: FetchPool,
    state: Arc<Mutex<EnrichmentState>>,
    updates: Arc<Notifier<EnrichmentUpdate>>,
    alive: Arc<AtomicBool>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl EnrichmentTask {
    async fn run(
        self,
        worklist: Worklist,
        repositories: HashMap<u64, String>,
    ) -> EnrichmentReport {
        let threads = self.pool.run(
            &worklist.threads,
            &self.caches.threads,
            |id| {
                let gateway = Arc::clone(&self.threads_gateway);
                let repository_id = repositories.get(&id).cloned().unwrap_or_default();
                async move {
                    gateway
                        .list_comment_threads(&repository_id, id)
                        .await
                        .map(retain_counted)
                }
            },
            |batch| {
                self.land(|state, update| {
                    state.apply_threads(&batch);
                    update.threads = batch.iter().map(|(id, _)| *id).collect();
                });
            },
        );
        let avatars = self.pool.run(
            &worklist.avatars,
            &self.caches.avatars,
            |descriptor| {
                let gateway = Arc::clone(&self.avatars_gateway);
                async move { gateway.fetch_avatar(&descriptor).await }
            },
            |batch| {
                self.land(|state, update| {
                    state.apply_avatars(&batch);
                    update.avatars = batch.iter().map(|(key, _)| key.clone()).collect();
                });
            },
        );
        let awaited_threads = adopt(
            &worklist.awaited_threads,
            &self.caches.threads,
            |id, threads| {
                self.land(|state, update| {
                    if !state.has_threads(id) {
                        state.apply_threads(&[(id, threads)]);
                        update.threads.push(id);
                    }
                });
            },
        );
        let awaited_avatars = adopt(
            &worklist.awaited_avatars,
            &self.caches.avatars,
            |descriptor, avatar| {
                self.land(|state, update| {
                    if !state.has_avatar(&descriptor) {
                        state.apply_avatars(&[(descriptor.clone(), avatar)]);
                        update.avatars.push(descriptor);
                    }
                });
            },
        );
        let (threads_report, avatars_report, (), ()) =
            futures::join!(threads, avatars, awaited_threads, awaited_avatars);

        let report = EnrichmentReport {
            threads: threads_report,
            avatars: avatars_report,
        };
        self.telemetry.record(TelemetryEvent::EnrichmentCompleted {
            threads_fetched: report.threads.fetched,
            avatars_fetched: report.avatars.fetched,
            failed: report.threads.failed + report.avatars.failed,
        });
        report
    }

    /// Applies a batch atomically and announces it, unless torn down.
    fn land(&self, apply: impl FnOnce(&mut EnrichmentState, &mut EnrichmentUpdate)) {
        if !self.alive.load(Ordering::Acquire) {
            tracing::trace!("coordinator torn down; batch kept in cache only");
            return;
        }
        let mut update = EnrichmentUpdate::default();
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            apply(&mut state, &mut update);
        }
        if !update.threads.is_empty() || !update.avatars.is_empty() {
            self.updates.emit(&update);
        }
    }
}

/// Waits for keys another dispatch claimed and hands each one to
/// `on_landed` as soon as its value is cached.
///
/// A key whose claim is dropped without a value is left for the next
/// [`EnrichmentCoordinator::ensure_loaded`] to claim.
async fn adopt<K, V>(keys: &[K], cache: &CacheStore<K, V>, on_landed: impl Fn(K, V))
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    let land = &on_landed;
    join_all(keys.iter().map(|key| async move {
        match cache.wait_for(key).await {
            Some(value) => land(key.clone(), value),
            None => tracing::debug!("fetch claimed elsewhere ended without a value"),
        }
    }))
    .await;
}

fn retain_counted(threads: Vec<CommentThreadSummary>) -> Vec<CommentThreadSummary> {
    threads
        .into_iter()
        .filter(CommentThreadSummary::is_counted)
        .collect()
}

fn distinct<K: Eq + Hash + Clone>(keys: impl Iterator<Item = K>) -> Vec<K> {
    let mut seen = HashSet::new();
    keys.filter(|key| seen.insert(key.clone())).collect()
}

fn partition<K, V>(
    keys: &[K],
    cache: &CacheStore<K, V>,
    in_state: impl Fn(&K) -> bool,
) -> Partitioned<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    let mut partitioned = Partitioned {
        hydrate: Vec::new(),
        missing: Vec::new(),
        awaiting: Vec::new(),
        counts: KeyPartition::default(),
    };
    for key in keys {
        if in_state(key) {
            partitioned.counts.in_state += 1;
        } else if let Some(value) = cache.get(key) {
            partitioned.counts.hydrated += 1;
            partitioned.hydrate.push((key.clone(), value));
        } else if cache.claim(key) {
            partitioned.counts.dispatched += 1;
            partitioned.missing.push(key.clone());
        } else {
            partitioned.counts.in_flight += 1;
            partitioned.awaiting.push(key.clone());
        }
    }
    partitioned
}

fn release_all<K: Eq + Hash + Clone, V: Clone>(cache: &CacheStore<K, V>, keys: &[K]) {
    for key in keys {
        cache.release(key);
    }
}
