//! HTTP client construction helpers for gateway implementations.

use std::time::Duration;

use reqwest::Client;

use crate::azure::error::IntakeError;

const USER_AGENT: &str = concat!("pullboard/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Builds the shared `reqwest` client used by the REST gateway.
///
/// # Errors
///
/// Returns [`IntakeError::Configuration`] when the TLS backend or client
/// settings cannot be initialised.
pub(super) fn build_http_client() -> Result<Client, IntakeError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .map_err(|error| IntakeError::Configuration {
            message: format!("failed to configure HTTP client: {error}"),
        })
}
