//! Application configuration loaded from CLI, environment, and files.
//!
//! This module provides a unified configuration struct that merges values
//! from command-line arguments, environment variables, and configuration
//! files using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.pullboard.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `PULLBOARD_ORGANIZATION_URL`,
//!    `PULLBOARD_TOKEN`, or the shared `AZURE_DEVOPS_TOKEN`
//! 4. **Command-line arguments** – `--organization-url`/`-u`, `--project`/`-p`
//!    and friends
//!
//! # Configuration File
//!
//! ```toml
//! organization_url = "https://dev.azure.com/contoso"
//! project = "Platform"
//! token = "pat-example"
//! database_url = "pullboard.sqlite"
//! repositories = "core,web"
//! sort = "creationDate"
//! descending = true
//! ```

use std::env;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::azure::IntakeError;
use crate::azure::gateway::DEFAULT_PAGE_SIZE;
use crate::pipeline::pool::{DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY, FetchPool};
use crate::pipeline::sort::{SortColumn, SortDirection, SortState};

/// Graph service hosting avatars for cloud organisations.
pub const DEFAULT_GRAPH_URL: &str = "https://vssps.dev.azure.com";

/// Environment variable consulted when no Pullboard token is configured.
pub const SHARED_TOKEN_VARIABLE: &str = "AZURE_DEVOPS_TOKEN";

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use pullboard::PullboardConfig;
/// use ortho_config::OrthoConfig;
///
/// let config = PullboardConfig::load().expect("failed to load configuration");
/// let project = config.require_project().expect("project required");
/// let token = config.resolve_token().expect("token required");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "PULLBOARD",
    discovery(
        dotfile_name = ".pullboard.toml",
        config_file_name = "pullboard.toml",
        app_name = "pullboard"
    )
)]
pub struct PullboardConfig {
    /// Azure DevOps organisation URL (e.g. `https://dev.azure.com/contoso`).
    ///
    /// Can be provided via:
    /// - CLI: `--organization-url <URL>` or `-u <URL>`
    /// - Environment: `PULLBOARD_ORGANIZATION_URL`
    /// - Config file: `organization_url = "..."`
    #[ortho_config(cli_short = 'u')]
    pub organization_url: Option<String>,

    /// Project whose pull requests are listed.
    #[ortho_config(cli_short = 'p')]
    pub project: Option<String>,

    /// Personal access token for the REST API.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `PULLBOARD_TOKEN` or `AZURE_DEVOPS_TOKEN`
    /// - Config file: `token = "..."`
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Base URL of the graph service serving avatars.
    #[ortho_config(cli_short = 'g')]
    pub graph_url: String,

    /// Local `SQLite` database URL/path used to persist filter preferences.
    ///
    /// Preferences live only for the process when unset.
    #[ortho_config(cli_short = 'd')]
    pub database_url: Option<String>,

    /// Runs database migrations and exits.
    #[ortho_config(cli_short = 'M')]
    pub migrate_db: bool,

    /// Scope under which preferences are stored. Defaults to the signed-in
    /// user's identifier.
    #[ortho_config(cli_short = 'S')]
    pub user_scope: Option<String>,

    /// Lists only pull requests created by the signed-in user.
    #[ortho_config(cli_short = 'm')]
    pub only_mine: bool,

    /// Comma-separated repository names to select.
    #[ortho_config(cli_short = 'r')]
    pub repositories: Option<String>,

    /// Comma-separated creator names to select.
    #[ortho_config(cli_short = 'c')]
    pub creators: Option<String>,

    /// Comma-separated reviewer names to select.
    #[ortho_config(cli_short = 'R')]
    pub reviewers: Option<String>,

    /// Keeps only draft pull requests.
    #[ortho_config(cli_short = 'D')]
    pub drafts_only: bool,

    /// Column key to sort by (`id`, `createdBy`, `repository`, `title`,
    /// `creationDate`).
    #[ortho_config(cli_short = 's')]
    pub sort: Option<String>,

    /// Sorts in descending order.
    #[ortho_config(cli_short = 'e')]
    pub descending: bool,

    /// Maximum concurrent enrichment requests per kind.
    #[ortho_config(cli_short = 'j')]
    pub fetch_concurrency: usize,

    /// Enrichment results applied per batch.
    #[ortho_config(cli_short = 'B')]
    pub fetch_batch_size: usize,

    /// Pull requests requested per listing page.
    #[ortho_config(cli_short = 'P')]
    pub page_size: u32,
}

impl Default for PullboardConfig {
    fn default() -> Self {
        Self {
            organization_url: None,
            project: None,
            token: None,
            graph_url: DEFAULT_GRAPH_URL.to_owned(),
            database_url: None,
            migrate_db: false,
            user_scope: None,
            only_mine: false,
            repositories: None,
            creators: None,
            reviewers: None,
            drafts_only: false,
            sort: None,
            descending: false,
            fetch_concurrency: DEFAULT_CONCURRENCY,
            fetch_batch_size: DEFAULT_BATCH_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PullboardConfig {
    /// Resolves the token from configuration or the shared
    /// `AZURE_DEVOPS_TOKEN` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::MissingToken`] when no token source provides a
    /// value.
    pub fn resolve_token(&self) -> Result<String, IntakeError> {
        self.token
            .clone()
            .or_else(|| env::var(SHARED_TOKEN_VARIABLE).ok())
            .filter(|token| !token.trim().is_empty())
            .ok_or(IntakeError::MissingToken)
    }

    /// Returns the organisation URL or an error if missing.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::MissingOrganizationUrl`] when no URL is
    /// configured.
    pub fn require_organization_url(&self) -> Result<&str, IntakeError> {
        self.organization_url
            .as_deref()
            .ok_or(IntakeError::MissingOrganizationUrl)
    }

    /// Returns the project name or an error if missing.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::MissingProject`] when no project is configured.
    pub fn require_project(&self) -> Result<&str, IntakeError> {
        self.project.as_deref().ok_or(IntakeError::MissingProject)
    }

    /// Requested sort order.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::Configuration`] when `sort` names no column.
    pub fn sort_state(&self) -> Result<SortState, IntakeError> {
        let Some(key) = self.sort.as_deref() else {
            return Ok(SortState::Unsorted);
        };
        let column = SortColumn::from_key(key).ok_or_else(|| IntakeError::Configuration {
            message: format!(
                "unknown sort column '{key}' (expected id, createdBy, repository, title or creationDate)"
            ),
        })?;
        let direction = if self.descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        Ok(SortState::Sorted { column, direction })
    }

    /// Fetch pool sized from `fetch_concurrency` and `fetch_batch_size`.
    #[must_use]
    pub fn pool_config(&self) -> FetchPool {
        FetchPool::new(self.fetch_concurrency, self.fetch_batch_size)
    }

    /// Repository names to select, split on commas.
    #[must_use]
    pub fn repository_names(&self) -> Vec<&str> {
        split_names(self.repositories.as_deref())
    }

    /// Creator names to select, split on commas.
    #[must_use]
    pub fn creator_names(&self) -> Vec<&str> {
        split_names(self.creators.as_deref())
    }

    /// Reviewer names to select, split on commas.
    #[must_use]
    pub fn reviewer_names(&self) -> Vec<&str> {
        split_names(self.reviewers.as_deref())
    }

    /// Returns true when any selection option is set on this invocation.
    #[must_use]
    pub const fn selects_filters(&self) -> bool {
        self.repositories.is_some()
            || self.creators.is_some()
            || self.reviewers.is_some()
            || self.drafts_only
    }
}

fn split_names(value: Option<&str>) -> Vec<&str> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests;
