//! Column sorting for the pull request table.
//!
//! Sorting is stable and never mutates its input. The [`SortState`] machine
//! tracks which column is active: activating the same column again flips the
//! direction, activating another column starts over in ascending order.

use std::cmp::Ordering;

use crate::azure::models::PullRequestSummary;

/// Sortable table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    /// Pull request identifier (numeric).
    Id,
    /// Creator display name.
    CreatedBy,
    /// Repository name.
    Repository,
    /// Title.
    Title,
    /// Creation timestamp.
    CreatedAt,
}

impl SortColumn {
    /// Every column in table order.
    pub const ALL: [Self; 5] = [
        Self::Id,
        Self::CreatedBy,
        Self::Repository,
        Self::Title,
        Self::CreatedAt,
    ];

    /// Column key used in configuration.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::CreatedBy => "createdBy",
            Self::Repository => "repository",
            Self::Title => "title",
            Self::CreatedAt => "creationDate",
        }
    }

    /// Parses a column key, ignoring ASCII case.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let trimmed = key.trim();
        Self::ALL
            .into_iter()
            .find(|column| column.key().eq_ignore_ascii_case(trimmed))
    }

    fn compare(self, left: &PullRequestSummary, right: &PullRequestSummary) -> Ordering {
        match self {
            Self::Id => left.id.cmp(&right.id),
            Self::CreatedBy => {
                compare_locale(&left.created_by.display_name, &right.created_by.display_name)
            }
            Self::Repository => compare_locale(&left.repository.name, &right.repository.name),
            Self::Title => compare_locale(&left.title, &right.title),
            Self::CreatedAt => left.created_at.cmp(&right.created_at),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortDirection {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Active sort of the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortState {
    /// Rows keep their load order.
    #[default]
    Unsorted,
    /// Rows are ordered by a column.
    Sorted {
        /// Active column.
        column: SortColumn,
        /// Active direction.
        direction: SortDirection,
    },
}

impl SortState {
    /// Returns the state after the user activates `column`.
    #[must_use]
    pub fn activate(self, column: SortColumn) -> Self {
        let direction = match self {
            Self::Sorted {
                column: active,
                direction,
            } if active == column => direction.toggled(),
            Self::Sorted { .. } | Self::Unsorted => SortDirection::Ascending,
        };
        Self::Sorted { column, direction }
    }

    /// Applies the state to `items`.
    #[must_use]
    pub fn apply(self, items: &[PullRequestSummary]) -> Vec<PullRequestSummary> {
        match self {
            Self::Unsorted => items.to_vec(),
            Self::Sorted { column, direction } => sort(items, column, direction),
        }
    }
}

/// Returns a stably sorted copy of `items`.
///
/// Descending order reverses the comparator, so equal rows keep their prior
/// relative order in both directions.
#[must_use]
pub fn sort(
    items: &[PullRequestSummary],
    column: SortColumn,
    direction: SortDirection,
) -> Vec<PullRequestSummary> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|left, right| {
        let ordering = column.compare(left, right);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    sorted
}

/// Case-insensitive text comparison for display strings.
///
/// Compares the Unicode lowercase forms first; on a tie lowercase text sorts
/// before uppercase (`"a" < "A"`).
#[must_use]
pub fn compare_locale(left: &str, right: &str) -> Ordering {
    let folded = left
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(right.chars().flat_map(char::to_lowercase));
    folded.then_with(|| right.cmp(left))
}
