//! Gateways for loading projects, pull requests, threads, and avatars.
//!
//! The traits here are the seams between the pipeline and Azure DevOps; the
//! [`AzureDevOpsGateway`] implementation handles the real HTTP requests while
//! tests substitute mocks.

use async_trait::async_trait;

use super::error::IntakeError;
use super::locator::ProjectName;
use super::models::{
    AvatarDescriptor, AvatarImage, CommentThreadSummary, CurrentUser, ProjectRef,
    PullRequestSummary, RepositoryRef,
};

mod client;
mod error_mapping;
mod http_utils;
mod rest;
mod types;

pub use rest::AzureDevOpsGateway;
pub use types::{DEFAULT_PAGE_SIZE, PullRequestQuery, PullRequestStatus};

/// Gateway that can load project-level listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectGateway: Send + Sync {
    /// Resolves a project by name.
    async fn project(&self, name: &ProjectName) -> Result<ProjectRef, IntakeError>;

    /// Resolves the authenticated user.
    async fn current_user(&self) -> Result<CurrentUser, IntakeError>;

    /// Lists the repositories of the organisation visible to the token.
    async fn list_repositories(
        &self,
        project: &ProjectRef,
    ) -> Result<Vec<RepositoryRef>, IntakeError>;

    /// Lists pull requests in the project matching `query`.
    async fn list_pull_requests(
        &self,
        project: &ProjectRef,
        query: &PullRequestQuery,
    ) -> Result<Vec<PullRequestSummary>, IntakeError>;
}

/// Gateway that can load the comment threads of a pull request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentThreadGateway: Send + Sync {
    /// Fetches every comment thread attached to the pull request.
    async fn list_comment_threads(
        &self,
        repository_id: &str,
        pull_request_id: u64,
    ) -> Result<Vec<CommentThreadSummary>, IntakeError>;
}

/// Gateway that can load identity avatars.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvatarGateway: Send + Sync {
    /// Fetches the avatar for `descriptor`; `Ok(None)` when none exists.
    async fn fetch_avatar(
        &self,
        descriptor: &AvatarDescriptor,
    ) -> Result<Option<AvatarImage>, IntakeError>;
}

#[cfg(test)]
mod tests;
