//! Azure DevOps REST implementation of the gateway traits.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use http::StatusCode;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::azure::error::IntakeError;
use crate::azure::locator::{AccessToken, OrganizationUrl, ProjectName};
use crate::azure::models::api::{
    ApiAvatar, ApiCommentThread, ApiConnectionData, ApiList, ApiProject, ApiPullRequest,
    ApiRepository,
};
use crate::azure::models::{
    AvatarDescriptor, AvatarImage, CommentThreadSummary, CurrentUser, ProjectRef,
    PullRequestSummary, RepositoryRef,
};

use super::client::build_http_client;
use super::error_mapping::{map_http_error, map_reqwest_error};
use super::http_utils::{extract_api_message, with_api_version};
use super::types::PullRequestQuery;
use super::{AvatarGateway, CommentThreadGateway, ProjectGateway};

/// Gateway for the Azure DevOps REST API authenticated by a bearer token.
pub struct AzureDevOpsGateway {
    client: Client,
    organization: OrganizationUrl,
    graph_base: Url,
    token: AccessToken,
}

impl AzureDevOpsGateway {
    /// Creates a gateway for the organisation and graph service URLs.
    ///
    /// `graph_base` hosts the avatar endpoint (`https://vssps.dev.azure.com`
    /// for cloud organisations).
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidUrl`] when `graph_base` does not parse and
    /// [`IntakeError::Configuration`] when the HTTP client cannot be built.
    pub fn for_token(
        token: &AccessToken,
        organization: &OrganizationUrl,
        graph_base: &str,
    ) -> Result<Self, IntakeError> {
        let graph = OrganizationUrl::parse(graph_base)?;
        Ok(Self {
            client: build_http_client()?,
            organization: organization.clone(),
            graph_base: graph.as_url().clone(),
            token: token.clone(),
        })
    }

    async fn send(&self, operation: &str, url: Url) -> Result<Response, IntakeError> {
        tracing::debug!("{operation}: GET {url}");
        self.client
            .get(url)
            .bearer_auth(self.token.value())
            .send()
            .await
            .map_err(|error| map_reqwest_error(operation, &error))
    }

    async fn decode<T: DeserializeOwned>(
        operation: &str,
        response: Response,
    ) -> Result<T, IntakeError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(operation, status, extract_api_message(&body)));
        }
        response
            .json::<T>()
            .await
            .map_err(|error| map_reqwest_error(operation, &error))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: Url,
    ) -> Result<T, IntakeError> {
        let response = self.send(operation, with_api_version(url)).await?;
        Self::decode(operation, response).await
    }

    fn pull_request_page_url(
        &self,
        project: &ProjectRef,
        query: &PullRequestQuery,
        skip: usize,
    ) -> Result<Url, IntakeError> {
        let mut url = self.organization.join_segments(&[
            project.id.as_str(),
            "_apis",
            "git",
            "pullrequests",
        ])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("searchCriteria.status", query.status.as_str());
            if let Some(creator_id) = query.creator_id.as_deref() {
                pairs.append_pair("searchCriteria.creatorId", creator_id);
            }
            pairs
                .append_pair("searchCriteria.queryTimeRangeType", "created")
                .append_pair("searchCriteria.minTime", &query.min_time.to_rfc3339())
                .append_pair("searchCriteria.maxTime", &query.max_time.to_rfc3339())
                .append_pair("$top", &query.page_size.to_string())
                .append_pair("$skip", &skip.to_string());
        }
        Ok(url)
    }

    fn avatar_url(&self, descriptor: &AvatarDescriptor) -> Result<Url, IntakeError> {
        let organization = self
            .organization
            .organization_name()
            .ok_or_else(|| IntakeError::InvalidUrl("organization name is missing".to_owned()))?;
        let mut url = self.graph_base.clone();
        url.path_segments_mut()
            .map_err(|()| IntakeError::InvalidUrl("graph URL cannot be a base".to_owned()))?
            .pop_if_empty()
            .extend([
                organization.as_str(),
                "_apis",
                "graph",
                "Subjects",
                descriptor.as_str(),
                "avatars",
            ]);
        Ok(url)
    }
}

/// Wraps a base64 avatar payload in a `data:` URI after checking it decodes.
fn avatar_from_payload(payload: &str) -> Result<AvatarImage, IntakeError> {
    STANDARD
        .decode(payload)
        .map_err(|error| IntakeError::Api {
            message: format!("avatar payload is not valid base64: {error}"),
        })?;
    Ok(AvatarImage {
        data_uri: format!("data:image/png;base64,{payload}"),
    })
}

#[async_trait]
impl ProjectGateway for AzureDevOpsGateway {
    async fn project(&self, name: &ProjectName) -> Result<ProjectRef, IntakeError> {
        let url = self
            .organization
            .join_segments(&["_apis", "projects", name.as_str()])?;
        let response = self.send("load project", with_api_version(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(IntakeError::ProjectNotFound {
                project: name.as_str().to_owned(),
            });
        }
        let project: ApiProject = Self::decode("load project", response).await?;
        Ok(project.into())
    }

    async fn current_user(&self) -> Result<CurrentUser, IntakeError> {
        let url = self.organization.join_segments(&["_apis", "connectionData"])?;
        let data: ApiConnectionData = self
            .get_json("load connection data", url)
            .await
            .map_err(|error| match error {
                IntakeError::Authentication { .. } | IntakeError::Network { .. } => error,
                other => IntakeError::CurrentUserUnavailable {
                    message: other.to_string(),
                },
            })?;
        data.authenticated_user
            .map(CurrentUser::from)
            .filter(|user| !user.id.is_empty())
            .ok_or_else(|| IntakeError::CurrentUserUnavailable {
                message: "connection data has no authenticated user".to_owned(),
            })
    }

    async fn list_repositories(
        &self,
        project: &ProjectRef,
    ) -> Result<Vec<RepositoryRef>, IntakeError> {
        let url = self.organization.join_segments(&[
            project.id.as_str(),
            "_apis",
            "git",
            "repositories",
        ])?;
        let list: ApiList<ApiRepository> = self.get_json("list repositories", url).await?;
        Ok(list.value.into_iter().map(RepositoryRef::from).collect())
    }

    async fn list_pull_requests(
        &self,
        project: &ProjectRef,
        query: &PullRequestQuery,
    ) -> Result<Vec<PullRequestSummary>, IntakeError> {
        let page_size = usize::try_from(query.page_size).unwrap_or(usize::MAX);
        let mut pull_requests = Vec::new();
        loop {
            let url = self.pull_request_page_url(project, query, pull_requests.len())?;
            let response = self
                .send("list pull requests", with_api_version(url))
                .await?;
            let page: ApiList<ApiPullRequest> =
                Self::decode("list pull requests", response).await?;
            let received = page.value.len();
            pull_requests.extend(page.value.into_iter().map(PullRequestSummary::from));
            if received < page_size || received == 0 {
                break;
            }
        }
        tracing::debug!(
            "loaded {} pull requests for project {}",
            pull_requests.len(),
            project.name
        );
        Ok(pull_requests)
    }
}

#[async_trait]
impl CommentThreadGateway for AzureDevOpsGateway {
    async fn list_comment_threads(
        &self,
        repository_id: &str,
        pull_request_id: u64,
    ) -> Result<Vec<CommentThreadSummary>, IntakeError> {
        let id = pull_request_id.to_string();
        let url = self.organization.join_segments(&[
            "_apis",
            "git",
            "repositories",
            repository_id,
            "pullRequests",
            id.as_str(),
            "threads",
        ])?;
        let list: ApiList<ApiCommentThread> = self.get_json("list comment threads", url).await?;
        Ok(list
            .value
            .into_iter()
            .map(CommentThreadSummary::from)
            .collect())
    }
}

#[async_trait]
impl AvatarGateway for AzureDevOpsGateway {
    async fn fetch_avatar(
        &self,
        descriptor: &AvatarDescriptor,
    ) -> Result<Option<AvatarImage>, IntakeError> {
        let url = self.avatar_url(descriptor)?;
        let response = self.send("fetch avatar", with_api_version(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let avatar: ApiAvatar = Self::decode("fetch avatar", response).await?;
        avatar
            .value
            .filter(|payload| !payload.is_empty())
            .map(|payload| avatar_from_payload(&payload))
            .transpose()
    }
}
