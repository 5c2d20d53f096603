//! URL parsing and identity wrappers for Azure DevOps access.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use super::error::IntakeError;

/// Characters left intact by `encodeURIComponent`; everything else is
/// percent-encoded. Pull request permalinks depend on this exact set.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes a single URI component.
#[must_use]
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Organisation URL such as `https://dev.azure.com/contoso/`.
///
/// The stored URL always ends with a slash so it can be used directly as the
/// permalink base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationUrl(Url);

impl OrganizationUrl {
    /// Parses and normalises an organisation URL.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidUrl`] when the input is not an absolute
    /// `http(s)` URL with a host.
    pub fn parse(input: &str) -> Result<Self, IntakeError> {
        let mut parsed =
            Url::parse(input.trim()).map_err(|error| IntakeError::InvalidUrl(error.to_string()))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(IntakeError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }
        if parsed.host_str().is_none() {
            return Err(IntakeError::InvalidUrl("URL must include a host".to_owned()));
        }

        parsed.set_query(None);
        parsed.set_fragment(None);
        if !parsed.path().ends_with('/') {
            let with_slash = format!("{}/", parsed.path());
            parsed.set_path(&with_slash);
        }
        Ok(Self(parsed))
    }

    /// Borrow the normalised URL.
    #[must_use]
    pub const fn as_url(&self) -> &Url {
        &self.0
    }

    /// Organisation name, taken from the first path segment
    /// (`dev.azure.com/{org}`) or from the host for
    /// `{org}.visualstudio.com` accounts.
    #[must_use]
    pub fn organization_name(&self) -> Option<String> {
        let from_path = self
            .0
            .path_segments()
            .and_then(|mut segments| segments.find(|segment| !segment.is_empty()))
            .map(ToOwned::to_owned);

        from_path.or_else(|| {
            self.0
                .host_str()
                .and_then(|host| host.split('.').next())
                .filter(|label| !label.is_empty())
                .map(ToOwned::to_owned)
        })
    }

    /// Builds an API URL by appending path segments to the organisation URL.
    ///
    /// Segments are percent-encoded individually.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidUrl`] when the organisation URL cannot
    /// carry a path.
    pub fn join_segments(&self, segments: &[&str]) -> Result<Url, IntakeError> {
        let mut url = self.0.clone();
        url.path_segments_mut()
            .map_err(|()| IntakeError::InvalidUrl("organization URL cannot be a base".to_owned()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Project name wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectName(String);

impl ProjectName {
    /// Validates that the project name is not blank.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::MissingProject`] when the value is blank.
    pub fn new(value: &str) -> Result<Self, IntakeError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(IntakeError::MissingProject);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the project name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Access token wrapper enforcing presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::MissingToken`] when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, IntakeError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IntakeError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for AccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}
