//! Tests for the Azure DevOps REST gateway.

type FixtureResult<T> = Result<T, Box<dyn std::error::Error>>;

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{
    AvatarGateway, AzureDevOpsGateway, CommentThreadGateway, ProjectGateway, PullRequestQuery,
};
use crate::azure::error::IntakeError;
use crate::azure::locator::{AccessToken, OrganizationUrl, ProjectName};
use crate::azure::models::{AvatarDescriptor, MergeStatus, ProjectRef, ThreadStatus};

struct GatewayFixture {
    runtime: Runtime,
    server: MockServer,
    gateway: AzureDevOpsGateway,
}

impl GatewayFixture {
    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn mount(&self, mock: Mock) {
        self.block_on(mock.mount(&self.server));
    }
}

#[fixture]
fn gateway_fixture() -> FixtureResult<GatewayFixture> {
    let runtime = Runtime::new()?;
    let server = runtime.block_on(MockServer::start());
    let organization = OrganizationUrl::parse(&format!("{}/contoso", server.uri()))?;
    let token = AccessToken::new("secret")?;
    let _guard = runtime.enter();
    let gateway = AzureDevOpsGateway::for_token(&token, &organization, &server.uri())?;
    Ok(GatewayFixture {
        runtime,
        server,
        gateway,
    })
}

fn project_ref() -> ProjectRef {
    ProjectRef {
        id: "p1".to_owned(),
        name: "Platform".to_owned(),
    }
}

fn pull_request_json(id: u64) -> serde_json::Value {
    serde_json::json!({
        "pullRequestId": id,
        "title": format!("Change {id}"),
        "isDraft": false,
        "creationDate": "2026-01-02T03:04:05Z",
        "sourceRefName": "refs/heads/feature/x",
        "targetRefName": "refs/heads/main",
        "mergeStatus": "succeeded",
        "repository": {
            "id": "r1",
            "name": "core",
            "project": { "id": "p1", "name": "Platform" }
        },
        "createdBy": {
            "id": "u1",
            "displayName": "Ada",
            "uniqueName": "ada@example.com",
            "descriptor": "aad.u1"
        },
        "reviewers": [
            { "id": "u2", "displayName": "Grace", "vote": 10, "isRequired": true }
        ]
    })
}

#[rstest]
fn project_is_resolved_by_name(gateway_fixture: FixtureResult<GatewayFixture>) {
    let fixture = gateway_fixture.expect("fixture should succeed");
    fixture.mount(
        Mock::given(method("GET"))
            .and(path("/contoso/_apis/projects/Platform"))
            .and(query_param("api-version", "7.1"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id": "p1", "name": "Platform" })),
            ),
    );

    let name = ProjectName::new("Platform").expect("valid project name");
    let project = fixture
        .block_on(fixture.gateway.project(&name))
        .expect("project should load");

    assert_eq!(project, project_ref());
}

#[rstest]
fn missing_project_is_reported(gateway_fixture: FixtureResult<GatewayFixture>) {
    let fixture = gateway_fixture.expect("fixture should succeed");
    fixture.mount(
        Mock::given(method("GET"))
            .and(path("/contoso/_apis/projects/Ghost"))
            .respond_with(ResponseTemplate::new(404)),
    );

    let name = ProjectName::new("Ghost").expect("valid project name");
    let result = fixture.block_on(fixture.gateway.project(&name));

    assert_eq!(
        result,
        Err(IntakeError::ProjectNotFound {
            project: "Ghost".to_owned()
        })
    );
}

#[rstest]
fn current_user_comes_from_connection_data(gateway_fixture: FixtureResult<GatewayFixture>) {
    let fixture = gateway_fixture.expect("fixture should succeed");
    fixture.mount(
        Mock::given(method("GET"))
            .and(path("/contoso/_apis/connectionData"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "authenticatedUser": { "id": "u1", "providerDisplayName": "Ada" }
            }))),
    );

    let user = fixture
        .block_on(fixture.gateway.current_user())
        .expect("user should load");

    assert_eq!(user.id, "u1");
    assert_eq!(user.display_name, "Ada");
}

#[rstest]
fn anonymous_connection_is_unavailable(gateway_fixture: FixtureResult<GatewayFixture>) {
    let fixture = gateway_fixture.expect("fixture should succeed");
    fixture.mount(
        Mock::given(method("GET"))
            .and(path("/contoso/_apis/connectionData"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({}))),
    );

    let result = fixture.block_on(fixture.gateway.current_user());

    assert!(
        matches!(result, Err(IntakeError::CurrentUserUnavailable { .. })),
        "expected CurrentUserUnavailable, got {result:?}"
    );
}

#[rstest]
fn pull_requests_are_paged_until_a_short_page(gateway_fixture: FixtureResult<GatewayFixture>) {
    let fixture = gateway_fixture.expect("fixture should succeed");
    let list_path = "/contoso/p1/_apis/git/pullrequests";
    fixture.mount(
        Mock::given(method("GET"))
            .and(path(list_path))
            .and(query_param("$skip", "0"))
            .and(query_param("searchCriteria.status", "active"))
            .and(query_param("searchCriteria.creatorId", "u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 2,
                "value": [pull_request_json(1), pull_request_json(2)]
            }))),
    );
    fixture.mount(
        Mock::given(method("GET"))
            .and(path(list_path))
            .and(query_param("$skip", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1,
                "value": [pull_request_json(3)]
            }))),
    );

    let now = Utc
        .with_ymd_and_hms(2026, 6, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp");
    let query = PullRequestQuery::active_around(now)
        .created_by("u1")
        .with_page_size(2);
    let pull_requests = fixture
        .block_on(fixture.gateway.list_pull_requests(&project_ref(), &query))
        .expect("pull requests should load");

    let ids: Vec<u64> = pull_requests.iter().map(|pr| pr.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    let first = pull_requests.first().expect("first pull request");
    assert_eq!(first.merge_status, MergeStatus::Succeeded);
    assert_eq!(first.created_by.display_name, "Ada");
    assert_eq!(first.reviewers.first().map(|r| r.vote), Some(10));
}

#[rstest]
fn comment_threads_are_listed(gateway_fixture: FixtureResult<GatewayFixture>) {
    let fixture = gateway_fixture.expect("fixture should succeed");
    fixture.mount(
        Mock::given(method("GET"))
            .and(path(
                "/contoso/_apis/git/repositories/r1/pullRequests/42/threads",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [
                    { "id": 1, "status": "active" },
                    { "id": 2, "status": "fixed" },
                    { "id": 3, "isDeleted": true, "status": "active" },
                    { "id": 4 }
                ]
            }))),
    );

    let threads = fixture
        .block_on(fixture.gateway.list_comment_threads("r1", 42))
        .expect("threads should load");

    let statuses: Vec<ThreadStatus> = threads.iter().map(|thread| thread.status).collect();
    assert_eq!(
        statuses,
        vec![
            ThreadStatus::Active,
            ThreadStatus::Fixed,
            ThreadStatus::Active,
            ThreadStatus::Unknown
        ]
    );
}

#[rstest]
fn unauthorised_requests_map_to_authentication_errors(
    gateway_fixture: FixtureResult<GatewayFixture>,
) {
    let fixture = gateway_fixture.expect("fixture should succeed");
    fixture.mount(
        Mock::given(method("GET"))
            .and(path("/contoso/p1/_apis/git/repositories"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "message": "token expired" })),
            ),
    );

    let result = fixture.block_on(fixture.gateway.list_repositories(&project_ref()));

    match result {
        Err(IntakeError::Authentication { message }) => {
            assert!(message.contains("token expired"), "got {message}");
        }
        other => panic!("expected authentication error, got {other:?}"),
    }
}

#[rstest]
fn avatar_payload_becomes_data_uri(gateway_fixture: FixtureResult<GatewayFixture>) {
    let fixture = gateway_fixture.expect("fixture should succeed");
    fixture.mount(
        Mock::given(method("GET"))
            .and(path("/contoso/_apis/graph/Subjects/aad.u1/avatars"))
            .and(query_param("api-version", "7.1"))
            .and(query_param_is_missing("size"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": "iVBORw==" })),
            ),
    );

    let descriptor = AvatarDescriptor::new("aad.u1").expect("valid descriptor");
    let avatar = fixture
        .block_on(fixture.gateway.fetch_avatar(&descriptor))
        .expect("avatar should load")
        .expect("avatar should be present");

    assert_eq!(avatar.data_uri, "data:image/png;base64,iVBORw==");
}

#[rstest]
fn missing_avatar_is_absent(gateway_fixture: FixtureResult<GatewayFixture>) {
    let fixture = gateway_fixture.expect("fixture should succeed");
    fixture.mount(
        Mock::given(method("GET"))
            .and(path("/contoso/_apis/graph/Subjects/aad.none/avatars"))
            .respond_with(ResponseTemplate::new(404)),
    );

    let descriptor = AvatarDescriptor::new("aad.none").expect("valid descriptor");
    let avatar = fixture
        .block_on(fixture.gateway.fetch_avatar(&descriptor))
        .expect("missing avatar is not an error");

    assert!(avatar.is_none());
}

#[rstest]
fn corrupt_avatar_payload_is_an_error(gateway_fixture: FixtureResult<GatewayFixture>) {
    let fixture = gateway_fixture.expect("fixture should succeed");
    fixture.mount(
        Mock::given(method("GET"))
            .and(path("/contoso/_apis/graph/Subjects/aad.bad/avatars"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "value": "not base64!" })),
            ),
    );

    let descriptor = AvatarDescriptor::new("aad.bad").expect("valid descriptor");
    let result = fixture.block_on(fixture.gateway.fetch_avatar(&descriptor));

    assert!(
        matches!(result, Err(IntakeError::Api { .. })),
        "expected Api error, got {result:?}"
    );
}
