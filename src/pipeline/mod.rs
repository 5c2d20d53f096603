//! Filtering, sorting and enrichment of listed pull requests.
//!
//! The filter and sort engines are pure functions over
//! [`PullRequestSummary`](crate::azure::PullRequestSummary) slices. The
//! [`FilterController`] owns the selection and its persistence, and the
//! [`EnrichmentCoordinator`] loads comment counts and avatars for whatever
//! rows are visible.

pub mod cache;
pub mod controller;
pub mod display;
pub mod enrichment;
pub mod filter;
pub mod normalize;
pub mod notify;
pub mod options;
pub mod pool;
pub mod sort;

pub use cache::{CacheStore, EnrichmentCaches};
pub use controller::{FilterChange, FilterController};
pub use enrichment::{
    DispatchSummary, EnrichmentCoordinator, EnrichmentReport, EnrichmentState, EnrichmentUpdate,
};
pub use filter::{FilterSelection, OtherFlag, filter};
pub use normalize::{PersistedSelection, SelectedEntities, normalize_selection};
pub use notify::{Notifier, SubscriptionId};
pub use options::FilterOptions;
pub use pool::{FetchPool, PoolReport};
pub use sort::{SortColumn, SortDirection, SortState, sort};
