//! Azure DevOps project intake.
//!
//! This module parses organisation URLs, validates access tokens, and loads
//! projects, pull requests, comment threads and avatars through gateway
//! traits. HTTP failures are mapped into [`IntakeError`] variants so callers
//! can report precise failures without exposing `reqwest` internals.

pub mod error;
pub mod gateway;
pub mod intake;
pub mod locator;
pub mod models;
pub mod navigation;

pub use error::IntakeError;
pub use gateway::{
    AvatarGateway, AzureDevOpsGateway, CommentThreadGateway, ProjectGateway, PullRequestQuery,
};
pub use intake::{IntakeOptions, ProjectIntake, ProjectSnapshot};
pub use locator::{AccessToken, OrganizationUrl, ProjectName};
pub use models::{
    AvatarDescriptor, AvatarImage, CommentThreadSummary, CurrentUser, IdentityRef, MergeStatus,
    ProjectRef, PullRequestSummary, RepositoryRef, Reviewer, ThreadCounts, ThreadStatus,
};
pub use navigation::{Navigator, pull_request_url};

#[cfg(test)]
pub use gateway::{MockAvatarGateway, MockCommentThreadGateway, MockProjectGateway};
