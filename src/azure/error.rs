//! Error types exposed by the Azure DevOps intake layer.

use thiserror::Error;

/// Errors surfaced while resolving configuration or talking to Azure DevOps.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntakeError {
    /// No organisation URL was configured.
    #[error("organization URL is required (use --organization-url or PULLBOARD_ORGANIZATION_URL)")]
    MissingOrganizationUrl,

    /// No project name was configured.
    #[error("project is required (use --project or PULLBOARD_PROJECT)")]
    MissingProject,

    /// The supplied URL could not be parsed.
    #[error("URL is invalid: {0}")]
    InvalidUrl(String),

    /// The authentication token was missing.
    #[error("access token is required")]
    MissingToken,

    /// The configured project does not exist or is not visible to the token.
    #[error("project '{project}' could not be resolved")]
    ProjectNotFound {
        /// Project name or identifier that was looked up.
        project: String,
    },

    /// The authenticated user could not be resolved.
    #[error("current user could not be resolved: {message}")]
    CurrentUserUnavailable {
        /// Detail describing why the user was not available.
        message: String,
    },

    /// The token was rejected by Azure DevOps.
    #[error("Azure DevOps rejected the token: {message}")]
    Authentication {
        /// Message returned with the 401/403 response.
        message: String,
    },

    /// Azure DevOps returned a non-authentication API error.
    #[error("Azure DevOps API error: {message}")]
    Api {
        /// Response detail describing the failure.
        message: String,
    },

    /// Networking failed while calling Azure DevOps.
    #[error("network error talking to Azure DevOps: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },
}
