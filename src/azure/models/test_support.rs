//! Builders for constructing pull request fixtures in tests.
//!
//! # Examples
//!
//! ```
//! use pullboard::azure::models::test_support::{identity, pull_request, repository};
//!
//! let pr = pull_request(7, &repository("r1", "core"), &identity("u1", "Ada"));
//! assert_eq!(pr.repository.name, "core");
//! assert!(pr.reviewers.is_empty());
//! ```

use chrono::{DateTime, TimeZone, Utc};

use super::{
    IdentityRef, MergeStatus, ProjectRef, PullRequestSummary, RepositoryRef, Reviewer,
};

/// Project used by every fixture repository.
#[must_use]
pub fn project() -> ProjectRef {
    ProjectRef {
        id: "p1".to_owned(),
        name: "Platform".to_owned(),
    }
}

/// Builds a repository in the fixture project.
#[must_use]
pub fn repository(id: &str, name: &str) -> RepositoryRef {
    RepositoryRef {
        id: id.to_owned(),
        name: name.to_owned(),
        project: project(),
    }
}

/// Builds an identity with a descriptor derived from its identifier.
#[must_use]
pub fn identity(id: &str, display_name: &str) -> IdentityRef {
    IdentityRef {
        id: id.to_owned(),
        display_name: display_name.to_owned(),
        unique_name: Some(format!("{id}@example.com")),
        descriptor: Some(format!("aad.{id}")),
        image_url: None,
    }
}

/// Builds a reviewer with the given vote.
#[must_use]
pub fn reviewer(identity: IdentityRef, vote: i32, is_required: bool) -> Reviewer {
    Reviewer {
        identity,
        vote,
        is_required,
    }
}

/// Fixed timestamp offset by `days` from 2025-01-01.
#[must_use]
pub fn created_on_day(days: u32) -> DateTime<Utc> {
    let base = Utc
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    base + chrono::Duration::days(i64::from(days))
}

/// Builds a non-draft pull request without reviewers.
#[must_use]
pub fn pull_request(
    id: u64,
    repository: &RepositoryRef,
    created_by: &IdentityRef,
) -> PullRequestSummary {
    PullRequestSummary {
        id,
        title: format!("Pull request {id}"),
        is_draft: false,
        created_at: created_on_day(0),
        source_ref_name: format!("refs/heads/feature/{id}"),
        target_ref_name: "refs/heads/main".to_owned(),
        repository: repository.clone(),
        created_by: created_by.clone(),
        reviewers: Vec::new(),
        merge_status: MergeStatus::NotSet,
    }
}
