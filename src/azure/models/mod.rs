//! Data models representing pull requests, identities, and comment threads.
//!
//! This module contains the domain models used by the filter and enrichment
//! pipeline. Wire-format types live in [`api`] and convert into these types;
//! the domain types serialise to camel-cased JSON so they can be stored as
//! filter-selection snapshots.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub(crate) mod api;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Project that owns a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    /// Project identifier (GUID).
    pub id: String,
    /// Project name.
    pub name: String,
}

/// Git repository reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRef {
    /// Repository identifier (GUID).
    pub id: String,
    /// Repository name.
    pub name: String,
    /// Owning project.
    pub project: ProjectRef,
}

/// Stable subject descriptor used as the avatar cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvatarDescriptor(String);

impl AvatarDescriptor {
    const HREF_MARKERS: [&'static str; 2] = ["/MemberAvatars/", "/Subjects/"];

    /// Wraps a descriptor string, rejecting blank values.
    #[must_use]
    pub fn new(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    /// Extracts the descriptor from an avatar href such as
    /// `https://dev.azure.com/org/_apis/GraphProfile/MemberAvatars/aad.abc`
    /// or `.../_apis/graph/Subjects/aad.abc/avatars`.
    #[must_use]
    pub fn from_href(href: &str) -> Option<Self> {
        let without_query = href.split(['?', '#']).next().unwrap_or(href);
        Self::HREF_MARKERS.iter().find_map(|marker| {
            let (_, tail) = without_query.split_once(marker)?;
            tail.split('/').next().and_then(Self::new)
        })
    }

    /// Borrow the descriptor value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AvatarDescriptor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Identity of a pull request participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    /// Identity identifier (GUID).
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Unique name, usually the sign-in address.
    #[serde(default)]
    pub unique_name: Option<String>,
    /// Graph subject descriptor when the API supplied one.
    #[serde(default)]
    pub descriptor: Option<String>,
    /// Avatar image URL.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl IdentityRef {
    /// Returns the label shown in filter option lists.
    ///
    /// Falls back from display name to unique name to identifier.
    #[must_use]
    pub fn label(&self) -> &str {
        if !self.display_name.is_empty() {
            return &self.display_name;
        }
        match self.unique_name.as_deref() {
            Some(unique) if !unique.is_empty() => unique,
            _ => &self.id,
        }
    }

    /// Derives the avatar cache key for this identity.
    ///
    /// The explicit descriptor wins; otherwise the descriptor is parsed from
    /// the avatar image URL. Identities with neither have no avatar key.
    #[must_use]
    pub fn avatar_descriptor(&self) -> Option<AvatarDescriptor> {
        self.descriptor
            .as_deref()
            .and_then(AvatarDescriptor::new)
            .or_else(|| {
                self.image_url
                    .as_deref()
                    .and_then(AvatarDescriptor::from_href)
            })
    }
}

/// Reviewer attached to a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    /// Reviewer identity.
    #[serde(flatten)]
    pub identity: IdentityRef,
    /// Vote score (10, 5, 0, -5, -10).
    pub vote: i32,
    /// Whether the reviewer is required by policy.
    pub is_required: bool,
}

impl Reviewer {
    /// Reviewer identifier.
    #[must_use]
    pub const fn id(&self) -> &str {
        self.identity.id.as_str()
    }
}

/// Asynchronous merge status of a pull request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MergeStatus {
    /// Status not set.
    #[default]
    NotSet,
    /// Merge is queued.
    Queued,
    /// Merge has conflicts.
    Conflicts,
    /// Merge succeeded.
    Succeeded,
    /// Merge was rejected by policy.
    RejectedByPolicy,
    /// Merge failed.
    Failure,
}

impl MergeStatus {
    /// Parses the wire value, mapping unrecognised values to `NotSet`.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        match value {
            "queued" => Self::Queued,
            "conflicts" => Self::Conflicts,
            "succeeded" => Self::Succeeded,
            "rejectedByPolicy" => Self::RejectedByPolicy,
            "failure" => Self::Failure,
            _ => Self::NotSet,
        }
    }
}

/// Pull request summary returned by the project listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSummary {
    /// Pull request identifier, unique within the project.
    pub id: u64,
    /// Title.
    pub title: String,
    /// Whether the pull request is a draft.
    pub is_draft: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Source branch ref (e.g. `refs/heads/feature`).
    pub source_ref_name: String,
    /// Target branch ref.
    pub target_ref_name: String,
    /// Repository the pull request belongs to.
    pub repository: RepositoryRef,
    /// Creator identity.
    pub created_by: IdentityRef,
    /// Reviewers in API order.
    pub reviewers: Vec<Reviewer>,
    /// Merge status.
    pub merge_status: MergeStatus,
}

/// Resolution status of a comment thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ThreadStatus {
    /// Status unknown or absent (system threads).
    #[default]
    Unknown,
    /// Open thread.
    Active,
    /// Resolved as fixed.
    Fixed,
    /// Resolved as won't fix.
    WontFix,
    /// Closed.
    Closed,
    /// Resolved as by design.
    ByDesign,
    /// Pending.
    Pending,
}

impl ThreadStatus {
    /// Parses the wire value, mapping unrecognised values to `Unknown`.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        match value {
            "active" => Self::Active,
            "fixed" => Self::Fixed,
            "wontFix" => Self::WontFix,
            "closed" => Self::Closed,
            "byDesign" => Self::ByDesign,
            "pending" => Self::Pending,
            _ => Self::Unknown,
        }
    }
}

/// Comment thread attached to a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentThreadSummary {
    /// Thread identifier.
    pub id: u64,
    /// Resolution status.
    pub status: ThreadStatus,
    /// Whether the thread was deleted.
    pub is_deleted: bool,
}

impl CommentThreadSummary {
    /// Returns true for threads that take part in the comment counts:
    /// non-deleted threads that are active or fixed.
    #[must_use]
    pub fn is_counted(&self) -> bool {
        !self.is_deleted && matches!(self.status, ThreadStatus::Active | ThreadStatus::Fixed)
    }
}

/// Resolved/total aggregate over a pull request's counted threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreadCounts {
    /// Threads that are no longer active.
    pub resolved: usize,
    /// All counted threads.
    pub total: usize,
}

impl ThreadCounts {
    /// Aggregates the counted threads in `threads`.
    #[must_use]
    pub fn from_threads(threads: &[CommentThreadSummary]) -> Self {
        threads
            .iter()
            .filter(|thread| thread.is_counted())
            .fold(Self::default(), |counts, thread| Self {
                resolved: counts.resolved + usize::from(thread.status == ThreadStatus::Fixed),
                total: counts.total + 1,
            })
    }

    /// Threads still awaiting resolution.
    #[must_use]
    pub const fn unresolved(&self) -> usize {
        self.total.saturating_sub(self.resolved)
    }
}

/// Avatar image payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarImage {
    /// Inline `data:` URI carrying the encoded image.
    pub data_uri: String,
}

/// The authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentUser {
    /// Identity identifier (GUID).
    pub id: String,
    /// Display name.
    pub display_name: String,
}
