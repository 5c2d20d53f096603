//! Mock Azure DevOps organisation for behavioural tests.
//!
//! The runtime and the `wiremock` server live together because every mount
//! and request inspection has to be driven on the runtime that started the
//! server.

use std::io;
use std::rc::Rc;
use std::sync::Arc;

use pullboard::azure::{AccessToken, AzureDevOpsGateway, OrganizationUrl};
use rstest_bdd::Slot;
use serde_json::{Value, json};
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Organisation segment every mounted route is served under.
pub const ORGANIZATION: &str = "contoso";

/// Token the gateway authenticates with.
pub const TOKEN: &str = "pat";

/// Path of the comment-thread listing for one pull request.
pub fn threads_path(repository_id: &str, pull_request_id: u64) -> String {
    format!(
        "/{ORGANIZATION}/_apis/git/repositories/{repository_id}/pullRequests/{pull_request_id}/threads"
    )
}

/// A running mock organisation plus the runtime driving it.
#[derive(Clone)]
pub struct MockOrganization {
    runtime: Rc<Runtime>,
    server: Rc<MockServer>,
}

impl MockOrganization {
    /// Starts a new runtime and mock server.
    ///
    /// # Errors
    ///
    /// Returns an error if the Tokio runtime cannot be created.
    pub fn start() -> io::Result<Self> {
        let runtime = Runtime::new()?;
        let server = runtime.block_on(MockServer::start());
        Ok(Self {
            runtime: Rc::new(runtime),
            server: Rc::new(server),
        })
    }

    /// Runs `future` to completion on the server's runtime.
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Serves the thread listing of a pull request with `response`.
    pub fn mount_threads(
        &self,
        repository_id: &str,
        pull_request_id: u64,
        response: ResponseTemplate,
    ) {
        self.mount(
            Mock::given(method("GET"))
                .and(path(threads_path(repository_id, pull_request_id)))
                .respond_with(response),
        );
    }

    /// Serves `payload` as the base64 avatar of every subject.
    pub fn mount_avatars(&self, payload: &str) {
        let pattern = format!(r"^/{ORGANIZATION}/_apis/graph/Subjects/[^/]+/avatars$");
        self.mount(
            Mock::given(method("GET"))
                .and(path_regex(pattern))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({ "value": payload })),
                ),
        );
    }

    fn mount(&self, mock: Mock) {
        self.block_on(mock.mount(&self.server));
    }

    /// Builds a gateway whose organisation and graph service both point at
    /// this server.
    ///
    /// # Panics
    ///
    /// Panics if the server URL does not form a valid organisation URL.
    pub fn gateway(&self) -> Arc<AzureDevOpsGateway> {
        let base = self.server.uri();
        let organization = OrganizationUrl::parse(&format!("{base}/{ORGANIZATION}"))
            .unwrap_or_else(|error| panic!("invalid organisation URL: {error}"));
        let token =
            AccessToken::new(TOKEN).unwrap_or_else(|error| panic!("invalid token: {error}"));
        let gateway = AzureDevOpsGateway::for_token(&token, &organization, &base)
            .unwrap_or_else(|error| panic!("failed to build gateway: {error}"));
        Arc::new(gateway)
    }

    /// Number of requests received for `request_path`.
    pub fn requests_to(&self, request_path: &str) -> usize {
        self.block_on(self.server.received_requests())
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == request_path)
            .count()
    }
}

/// Returns the organisation stored in `slot`, starting one on first use.
///
/// # Panics
///
/// Panics if the runtime cannot be created.
pub fn ensure_organization(slot: &Slot<MockOrganization>) -> MockOrganization {
    if let Some(organization) = slot.get() {
        return organization;
    }
    let organization = MockOrganization::start()
        .unwrap_or_else(|error| panic!("failed to start mock organisation: {error}"));
    slot.set(organization.clone());
    organization
}

/// Thread JSON for a status word; `deleted` and `unknown` produce a deleted
/// thread and one without a status.
pub fn thread_json(id: usize, status: &str) -> Value {
    match status {
        "deleted" => json!({ "id": id, "status": "active", "isDeleted": true }),
        "unknown" => json!({ "id": id }),
        other => json!({ "id": id, "status": other }),
    }
}
