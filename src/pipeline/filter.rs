//! Pure filtering of pull requests by the current selection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::azure::models::PullRequestSummary;

/// Flags selectable in the "other" filter dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OtherFlag {
    /// Keep only draft pull requests.
    #[serde(rename = "isDraft")]
    IsDraft,
}

impl OtherFlag {
    /// Every defined flag, in display order.
    pub const ALL: [Self; 1] = [Self::IsDraft];

    /// Persisted key of the flag.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::IsDraft => "isDraft",
        }
    }

    /// Label shown in the filter options.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::IsDraft => "Is Draft",
        }
    }

    /// Parses a persisted key, returning `None` for unknown keys.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.key() == key)
    }
}

/// Selected identifiers per filter dimension.
///
/// An empty dimension places no restriction on the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    /// Selected repository identifiers.
    pub repositories: BTreeSet<String>,
    /// Selected creator identifiers.
    pub creators: BTreeSet<String>,
    /// Selected reviewer identifiers.
    pub reviewers: BTreeSet<String>,
    /// Selected flags.
    pub other: BTreeSet<OtherFlag>,
}

impl FilterSelection {
    /// Returns true when at least one dimension restricts the result.
    #[must_use]
    pub fn is_filtering(&self) -> bool {
        !(self.repositories.is_empty()
            && self.creators.is_empty()
            && self.reviewers.is_empty()
            && self.other.is_empty())
    }

    /// Returns true when `item` passes every non-empty dimension.
    #[must_use]
    pub fn matches(&self, item: &PullRequestSummary) -> bool {
        let repository_ok =
            self.repositories.is_empty() || self.repositories.contains(&item.repository.id);
        let creator_ok = self.creators.is_empty() || self.creators.contains(&item.created_by.id);
        let reviewer_ok = self.reviewers.is_empty()
            || item
                .reviewers
                .iter()
                .any(|reviewer| self.reviewers.contains(reviewer.id()));
        let draft_ok = !self.other.contains(&OtherFlag::IsDraft) || item.is_draft;

        repository_ok && creator_ok && reviewer_ok && draft_ok
    }
}

/// Returns the items that pass `selection`, preserving input order.
///
/// Dimensions are combined with AND; identifiers within a dimension with OR.
#[must_use]
pub fn filter(all: &[PullRequestSummary], selection: &FilterSelection) -> Vec<PullRequestSummary> {
    if !selection.is_filtering() {
        return all.to_vec();
    }
    all.iter()
        .filter(|item| selection.matches(item))
        .cloned()
        .collect()
}
