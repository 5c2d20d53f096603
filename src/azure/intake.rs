//! High-level project intake facade used by the CLI.
//!
//! `ProjectIntake` resolves the project and the signed-in user, loads the
//! repository filter options and fetches the active pull requests for one
//! load cycle.

use chrono::{DateTime, Utc};

use super::error::IntakeError;
use super::gateway::{DEFAULT_PAGE_SIZE, ProjectGateway, PullRequestQuery};
use super::locator::ProjectName;
use super::models::{CurrentUser, ProjectRef, PullRequestSummary, RepositoryRef};
use crate::pipeline::sort::compare_locale;

/// Everything loaded for one refresh of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSnapshot {
    /// Resolved project.
    pub project: ProjectRef,
    /// Authenticated user.
    pub current_user: CurrentUser,
    /// Repositories of the project sorted by name.
    pub repositories: Vec<RepositoryRef>,
    /// Active pull requests in API order.
    pub pull_requests: Vec<PullRequestSummary>,
}

/// Options applied to a project load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeOptions {
    /// Restrict the listing to pull requests created by the current user.
    pub only_mine: bool,
    /// Items requested per listing page.
    pub page_size: u32,
}

impl Default for IntakeOptions {
    fn default() -> Self {
        Self {
            only_mine: false,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Aggregates project-level listings using a gateway.
pub struct ProjectIntake<'client, Gateway>
where
    Gateway: ProjectGateway + ?Sized,
{
    client: &'client Gateway,
}

impl<'client, Gateway> ProjectIntake<'client, Gateway>
where
    Gateway: ProjectGateway + ?Sized,
{
    /// Create a new intake facade using the provided gateway.
    #[must_use]
    pub const fn new(client: &'client Gateway) -> Self {
        Self { client }
    }

    /// Load the project, user, repositories and active pull requests.
    ///
    /// The pull request query covers the default creation window around
    /// `now`.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::ProjectNotFound`] or
    /// [`IntakeError::CurrentUserUnavailable`] when the context cannot be
    /// resolved, and propagates any other gateway failure.
    pub async fn load(
        &self,
        project_name: &ProjectName,
        options: IntakeOptions,
        now: DateTime<Utc>,
    ) -> Result<ProjectSnapshot, IntakeError> {
        let project = self.client.project(project_name).await?;
        let current_user = self.client.current_user().await?;

        let mut repositories = self.client.list_repositories(&project).await?;
        repositories.sort_by(|left, right| compare_locale(&left.name, &right.name));

        let mut query = PullRequestQuery::active_around(now).with_page_size(options.page_size);
        if options.only_mine {
            query = query.created_by(current_user.id.clone());
        }
        let pull_requests = self.client.list_pull_requests(&project, &query).await?;

        Ok(ProjectSnapshot {
            project,
            current_user,
            repositories,
            pull_requests,
        })
    }
}
