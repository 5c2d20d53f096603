//! Wire-format deserialisation targets for the Azure DevOps REST API.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{
    CommentThreadSummary, CurrentUser, IdentityRef, MergeStatus, ProjectRef, PullRequestSummary,
    RepositoryRef, Reviewer, ThreadStatus,
};

/// Envelope used by list endpoints: `{ "count": n, "value": [...] }`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiList<T> {
    #[serde(default = "Vec::new")]
    pub(crate) value: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiProject {
    pub(crate) id: String,
    pub(crate) name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiRepository {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) project: ApiProject,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiLink {
    href: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ApiIdentityLinks {
    avatar: Option<ApiLink>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiIdentity {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    unique_name: Option<String>,
    #[serde(default)]
    descriptor: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default, rename = "_links")]
    links: Option<ApiIdentityLinks>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiReviewer {
    #[serde(flatten)]
    identity: ApiIdentity,
    #[serde(default)]
    vote: i32,
    #[serde(default)]
    is_required: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiPullRequest {
    pull_request_id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    is_draft: bool,
    creation_date: DateTime<Utc>,
    #[serde(default)]
    source_ref_name: Option<String>,
    #[serde(default)]
    target_ref_name: Option<String>,
    repository: ApiRepository,
    created_by: ApiIdentity,
    #[serde(default)]
    reviewers: Vec<ApiReviewer>,
    #[serde(default)]
    merge_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiCommentThread {
    id: u64,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    is_deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiAuthenticatedUser {
    id: String,
    #[serde(default)]
    provider_display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiConnectionData {
    pub(crate) authenticated_user: Option<ApiAuthenticatedUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiAvatar {
    pub(crate) value: Option<String>,
}

impl From<ApiProject> for ProjectRef {
    fn from(value: ApiProject) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

impl From<ApiRepository> for RepositoryRef {
    fn from(value: ApiRepository) -> Self {
        Self {
            id: value.id,
            name: value.name,
            project: value.project.into(),
        }
    }
}

impl From<ApiIdentity> for IdentityRef {
    fn from(value: ApiIdentity) -> Self {
        let avatar_href = value
            .links
            .and_then(|links| links.avatar)
            .and_then(|link| link.href);
        Self {
            id: value.id,
            display_name: value.display_name.unwrap_or_default(),
            unique_name: value.unique_name,
            descriptor: value.descriptor,
            image_url: value.image_url.or(avatar_href),
        }
    }
}

impl From<ApiReviewer> for Reviewer {
    fn from(value: ApiReviewer) -> Self {
        Self {
            identity: value.identity.into(),
            vote: value.vote,
            is_required: value.is_required,
        }
    }
}

impl From<ApiPullRequest> for PullRequestSummary {
    fn from(value: ApiPullRequest) -> Self {
        Self {
            id: value.pull_request_id,
            title: value.title.unwrap_or_default(),
            is_draft: value.is_draft,
            created_at: value.creation_date,
            source_ref_name: value.source_ref_name.unwrap_or_default(),
            target_ref_name: value.target_ref_name.unwrap_or_default(),
            repository: value.repository.into(),
            created_by: value.created_by.into(),
            reviewers: value.reviewers.into_iter().map(Reviewer::from).collect(),
            merge_status: value
                .merge_status
                .as_deref()
                .map_or(MergeStatus::NotSet, MergeStatus::from_wire),
        }
    }
}

impl From<ApiCommentThread> for CommentThreadSummary {
    fn from(value: ApiCommentThread) -> Self {
        Self {
            id: value.id,
            status: value
                .status
                .as_deref()
                .map_or(ThreadStatus::Unknown, ThreadStatus::from_wire),
            is_deleted: value.is_deleted,
        }
    }
}

impl From<ApiAuthenticatedUser> for CurrentUser {
    fn from(value: ApiAuthenticatedUser) -> Self {
        Self {
            id: value.id,
            display_name: value.provider_display_name.unwrap_or_default(),
        }
    }
}
