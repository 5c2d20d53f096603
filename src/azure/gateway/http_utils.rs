//! Shared HTTP utilities for gateway implementations.

use url::Url;

/// REST API version sent with every request.
pub(super) const API_VERSION: &str = "7.1";

pub(super) fn with_api_version(mut url: Url) -> Url {
    url.query_pairs_mut().append_pair("api-version", API_VERSION);
    url
}

/// Extracts the `message` field from an Azure DevOps error body.
pub(super) fn extract_api_message(body: &str) -> Option<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return None;
    };
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}
