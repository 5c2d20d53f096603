//! Filter option sets offered to the user for the current load.

use std::collections::HashSet;

use crate::azure::models::{IdentityRef, PullRequestSummary, RepositoryRef};

use super::filter::OtherFlag;
use super::sort::compare_locale;

/// Selectable values for each filter dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Repositories of the current project, sorted by name.
    pub repositories: Vec<RepositoryRef>,
    /// Distinct pull request creators, sorted by label.
    pub creators: Vec<IdentityRef>,
    /// Distinct reviewers, sorted by label.
    pub reviewers: Vec<IdentityRef>,
    /// Defined flags.
    pub other: Vec<OtherFlag>,
}

impl FilterOptions {
    /// Builds the option sets from the loaded repositories and pull requests.
    ///
    /// Repositories outside `project_id` are left out.
    #[must_use]
    pub fn collect(
        project_id: &str,
        repositories: &[RepositoryRef],
        pull_requests: &[PullRequestSummary],
    ) -> Self {
        let mut project_repositories: Vec<RepositoryRef> = repositories
            .iter()
            .filter(|repository| repository.project.id == project_id)
            .cloned()
            .collect();
        project_repositories.sort_by(|left, right| compare_locale(&left.name, &right.name));

        let creators = distinct_identities(pull_requests.iter().map(|pr| &pr.created_by));
        let reviewers = distinct_identities(
            pull_requests
                .iter()
                .flat_map(|pr| pr.reviewers.iter().map(|reviewer| &reviewer.identity)),
        );

        Self {
            repositories: project_repositories,
            creators,
            reviewers,
            other: OtherFlag::ALL.to_vec(),
        }
    }

    /// Looks up a repository by name, ignoring case.
    #[must_use]
    pub fn repository_named(&self, name: &str) -> Option<&RepositoryRef> {
        self.repositories
            .iter()
            .find(|repository| repository.name.eq_ignore_ascii_case(name))
    }

    /// Looks up a creator by label, unique name or id, ignoring case.
    #[must_use]
    pub fn creator_named(&self, name: &str) -> Option<&IdentityRef> {
        find_identity(&self.creators, name)
    }

    /// Looks up a reviewer by label, unique name or id, ignoring case.
    #[must_use]
    pub fn reviewer_named(&self, name: &str) -> Option<&IdentityRef> {
        find_identity(&self.reviewers, name)
    }
}

fn distinct_identities<'a>(identities: impl Iterator<Item = &'a IdentityRef>) -> Vec<IdentityRef> {
    let mut seen = HashSet::new();
    let mut distinct: Vec<IdentityRef> = identities
        .filter(|identity| seen.insert(identity.id.clone()))
        .cloned()
        .collect();
    distinct.sort_by(|left, right| compare_locale(left.label(), right.label()));
    distinct
}

fn find_identity<'a>(identities: &'a [IdentityRef], name: &str) -> Option<&'a IdentityRef> {
    let wanted = name.trim();
    identities.iter().find(|identity| {
        identity.label().eq_ignore_ascii_case(wanted)
            || identity.id.eq_ignore_ascii_case(wanted)
            || identity
                .unique_name
                .as_deref()
                .is_some_and(|unique| unique.eq_ignore_ascii_case(wanted))
    })
}
