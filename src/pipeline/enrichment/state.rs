//! Observable enrichment state and dispatch bookkeeping.

use std::collections::HashMap;

use crate::azure::models::{AvatarDescriptor, AvatarImage, CommentThreadSummary, ThreadCounts};
use crate::pipeline::pool::PoolReport;

/// Enrichment data applied to the visible rows so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentState {
    threads: HashMap<u64, ThreadCounts>,
    avatars: HashMap<AvatarDescriptor, Option<AvatarImage>>,
}

impl EnrichmentState {
    /// Comment counts for a pull request, or `None` while still loading.
    #[must_use]
    pub fn thread_counts(&self, pull_request_id: u64) -> Option<ThreadCounts> {
        self.threads.get(&pull_request_id).copied()
    }

    /// Avatar lookup: `None` while loading, `Some(None)` when the identity
    /// has no avatar.
    #[must_use]
    pub fn avatar(&self, descriptor: &AvatarDescriptor) -> Option<Option<&AvatarImage>> {
        self.avatars.get(descriptor).map(Option::as_ref)
    }

    /// Returns true when counts for `pull_request_id` have been applied.
    #[must_use]
    pub fn has_threads(&self, pull_request_id: u64) -> bool {
        self.threads.contains_key(&pull_request_id)
    }

    /// Returns true when an avatar result for `descriptor` has been applied.
    #[must_use]
    pub fn has_avatar(&self, descriptor: &AvatarDescriptor) -> bool {
        self.avatars.contains_key(descriptor)
    }

    /// Returns the state with `counts` applied for `pull_request_id`.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub fn with_thread_counts(mut self, pull_request_id: u64, counts: ThreadCounts) -> Self {
        self.threads.insert(pull_request_id, counts);
        self
    }

    pub(super) fn apply_threads(&mut self, batch: &[(u64, Vec<CommentThreadSummary>)]) {
        for (id, threads) in batch {
            self.threads.insert(*id, ThreadCounts::from_threads(threads));
        }
    }

    pub(super) fn apply_avatars(&mut self, batch: &[(AvatarDescriptor, Option<AvatarImage>)]) {
        for (descriptor, avatar) in batch {
            self.avatars.insert(descriptor.clone(), avatar.clone());
        }
    }
}

/// Keys whose enrichment landed in the state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentUpdate {
    /// Pull requests whose comment counts were applied.
    pub threads: Vec<u64>,
    /// Descriptors whose avatar results were applied.
    pub avatars: Vec<AvatarDescriptor>,
}

/// How the keys of one kind were split by a dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyPartition {
    /// Keys already present in the observable state.
    pub in_state: usize,
    /// Keys copied from the cache into the state.
    pub hydrated: usize,
    /// Keys handed to the worker pool.
    pub dispatched: usize,
    /// Keys being fetched by another dispatch; applied once that fetch lands.
    pub in_flight: usize,
}

/// Result of [`super::EnrichmentCoordinator::ensure_loaded`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Comment-thread keys.
    pub threads: KeyPartition,
    /// Avatar keys.
    pub avatars: KeyPartition,
}

impl DispatchSummary {
    /// Returns true when a background fetch was started.
    #[must_use]
    pub const fn started_fetch(&self) -> bool {
        self.threads.dispatched > 0 || self.avatars.dispatched > 0
    }

    /// Returns true when some keys will be applied from another dispatch's
    /// fetch.
    #[must_use]
    pub const fn awaits_other_fetch(&self) -> bool {
        self.threads.in_flight > 0 || self.avatars.in_flight > 0
    }
}

/// Pool outcomes of one background fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    /// Comment-thread pool outcome.
    pub threads: PoolReport,
    /// Avatar pool outcome.
    pub avatars: PoolReport,
}

impl EnrichmentReport {
    /// Sums two reports.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            threads: self.threads.merge(other.threads),
            avatars: self.avatars.merge(other.avatars),
        }
    }
}
