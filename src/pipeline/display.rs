//! Presentation helpers for pull request rows.

use crate::azure::models::{MergeStatus, PullRequestSummary, ThreadCounts};

/// Title shown above the table.
pub const BASE_TITLE: &str = "Active Pull Requests";

/// Title with the row count: the visible count while filtering, otherwise
/// the total.
#[must_use]
pub fn count_title(total: usize, visible: usize, filtering: bool) -> String {
    let count = if filtering { visible } else { total };
    format!("{BASE_TITLE} ({count})")
}

/// Comment cell text: `…` while loading, empty without threads, otherwise
/// `resolved/total`.
#[must_use]
pub fn comment_cell(counts: Option<ThreadCounts>) -> String {
    match counts {
        None => "…".to_owned(),
        Some(loaded) if loaded.total == 0 => String::new(),
        Some(loaded) => format!("{}/{}", loaded.resolved, loaded.total),
    }
}

/// Tooltip describing the unresolved comment count.
#[must_use]
pub fn comment_tooltip(counts: Option<ThreadCounts>) -> String {
    let Some(loaded) = counts else {
        return "Loading comments".to_owned();
    };
    match loaded.unresolved() {
        0 => "No unresolved comments".to_owned(),
        1 => "1 unresolved comment".to_owned(),
        unresolved => format!("{unresolved} unresolved comments"),
    }
}

/// Human label for a reviewer vote.
#[must_use]
pub const fn vote_label(vote: i32) -> &'static str {
    match vote {
        10 => "Approved",
        5 => "Approved with suggestions",
        -5 => "Waiting for author",
        -10 => "Rejected",
        _ => "Unknown",
    }
}

/// Human label for a merge status.
#[must_use]
pub const fn merge_status_label(status: MergeStatus) -> &'static str {
    match status {
        MergeStatus::Conflicts | MergeStatus::Failure | MergeStatus::RejectedByPolicy => "Failed",
        MergeStatus::Succeeded => "Success",
        MergeStatus::NotSet | MergeStatus::Queued => "Unknown",
    }
}

/// Last path segment of a branch ref (`refs/heads/feature/x` becomes `x`).
#[must_use]
pub fn short_branch_name(ref_name: &str) -> &str {
    ref_name.rsplit('/').next().unwrap_or(ref_name)
}

/// Badges shown next to the title.
#[must_use]
pub fn badges(pull_request: &PullRequestSummary, current_user_id: &str) -> Vec<&'static str> {
    let mut badges = Vec::new();
    if pull_request.is_draft {
        badges.push("Draft");
    }
    let required = pull_request
        .reviewers
        .iter()
        .any(|reviewer| reviewer.is_required && reviewer.id() == current_user_id);
    if required {
        badges.push("Required");
    }
    badges
}
