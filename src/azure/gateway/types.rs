//! Public types for pull request listing queries.

use chrono::{DateTime, Months, Utc};

/// Page size used when listing pull requests.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Creation-date window looked back over, in months (10 years).
const LOOKBACK_MONTHS: u32 = 120;
/// Creation-date window looked ahead over, in months (1 year).
const LOOKAHEAD_MONTHS: u32 = 12;

/// Pull request status filter for listing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PullRequestStatus {
    /// Only active pull requests.
    #[default]
    Active,
    /// Only completed pull requests.
    Completed,
    /// Only abandoned pull requests.
    Abandoned,
    /// All pull requests regardless of status.
    All,
}

impl PullRequestStatus {
    /// Returns the API parameter value for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
            Self::All => "all",
        }
    }
}

/// Search criteria for listing pull requests in a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestQuery {
    /// Status filter.
    pub status: PullRequestStatus,
    /// Restricts results to pull requests created by this identity.
    pub creator_id: Option<String>,
    /// Earliest creation time.
    pub min_time: DateTime<Utc>,
    /// Latest creation time.
    pub max_time: DateTime<Utc>,
    /// Items requested per page.
    pub page_size: u32,
}

impl PullRequestQuery {
    /// Active pull requests created between ten years before and one year
    /// after `now`.
    ///
    /// The wide window bounds the result volume without imposing a hard cap.
    #[must_use]
    pub fn active_around(now: DateTime<Utc>) -> Self {
        Self {
            status: PullRequestStatus::Active,
            creator_id: None,
            min_time: now
                .checked_sub_months(Months::new(LOOKBACK_MONTHS))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            max_time: now
                .checked_add_months(Months::new(LOOKAHEAD_MONTHS))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Restricts the query to one creator.
    #[must_use]
    pub fn created_by(mut self, creator_id: impl Into<String>) -> Self {
        self.creator_id = Some(creator_id.into());
        self
    }

    /// Overrides the page size; zero falls back to the default.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
        self
    }
}
