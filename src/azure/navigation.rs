//! Pull request permalinks and host navigation.

use super::locator::encode_uri_component;
use super::models::PullRequestSummary;

/// Builds the web permalink for a pull request:
/// `{base}{project}/_git/{repository}/pullRequest/{id}` with the project and
/// repository names encoded as URI components.
///
/// `base` is used verbatim and is expected to end with a slash.
///
/// # Examples
///
/// ```
/// use pullboard::azure::navigation::pull_request_url;
///
/// let url = pull_request_url("https://dev.azure.com/contoso/", "My Project", "core", 42);
/// assert_eq!(
///     url,
///     "https://dev.azure.com/contoso/My%20Project/_git/core/pullRequest/42"
/// );
/// ```
#[must_use]
pub fn pull_request_url(base: &str, project_name: &str, repository_name: &str, id: u64) -> String {
    format!(
        "{base}{project}/_git/{repository}/pullRequest/{id}",
        project = encode_uri_component(project_name),
        repository = encode_uri_component(repository_name),
    )
}

/// Navigation target that receives pull request permalinks.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Navigates to the given URL.
    fn navigate(&self, url: &str);
}

/// Navigates to the permalink of `pull_request`.
pub fn navigate_to_pull_request(
    navigator: &dyn Navigator,
    base: &str,
    pull_request: &PullRequestSummary,
) {
    let url = pull_request_url(
        base,
        &pull_request.repository.project.name,
        &pull_request.repository.name,
        pull_request.id,
    );
    tracing::debug!("navigating to pull request {}: {url}", pull_request.id);
    navigator.navigate(&url);
}
