// ABOUTME: Jira REST client implementing the tracker gateway over reqwest
// ABOUTME: Wraps search, transition and create endpoints with status-based error mapping

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::error::{Result, TrackerError};
use super::query::SearchQuery;
use super::types::{
    CreatedIssue, IssueSnapshot, RenderedIssue, SearchResponse, Transition, TransitionsResponse,
};
use super::TrackerGateway;

pub struct JiraClient {
    http: Client,
    base_url: Url,
    user: String,
    password: String,
}

/// HTTP client with the request timeout applied. Cheap to clone; clones share
/// one connection pool.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| TrackerError::Transport {
            operation: "Client.Build",
            source,
        })
}

impl JiraClient {
    pub fn new(api_url: &str, user: &str, password: &str, timeout: Duration) -> Result<Self> {
        Self::with_http(http_client(timeout)?, api_url, user, password)
    }

    /// Client for one account on top of an existing connection pool
    pub fn with_http(http: Client, api_url: &str, user: &str, password: &str) -> Result<Self> {
        // A trailing slash keeps `join` from dropping the last path segment
        let normalized = if api_url.ends_with('/') {
            api_url.to_string()
        } else {
            format!("{}/", api_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| TrackerError::InvalidUrl {
            url: api_url.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            http,
            base_url,
            user: user.to_string(),
            password: password.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| TrackerError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
                message: e.to_string(),
            })
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await
            .map_err(|source| {
                debug!("Tracker request failed: api={}, err={}", operation, source);
                TrackerError::Transport { operation, source }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        debug!(
            "Tracker request returned error: api={}, url={}, status={}",
            operation, url, status
        );

        Err(TrackerError::Status {
            operation,
            url,
            status,
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(operation: &'static str, response: Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| TrackerError::Decode {
                operation,
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl TrackerGateway for JiraClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<IssueSnapshot>> {
        let url = self.endpoint("rest/api/2/search")?;
        let request = self.http.get(url).query(&[
            ("jql", query.jql.clone()),
            ("maxResults", query.max_results.to_string()),
            ("fields", query.fields.join(",")),
        ]);

        let response = self.send("Issue.Search", request).await?;
        let found: SearchResponse = Self::decode("Issue.Search", response).await?;

        Ok(found.issues.into_iter().map(IssueSnapshot::from).collect())
    }

    async fn transitions(&self, issue_key: &str) -> Result<Vec<Transition>> {
        let url = self.endpoint(&format!("rest/api/2/issue/{}/transitions", issue_key))?;

        let response = self
            .send("Issue.GetTransitions", self.http.get(url))
            .await?;
        let found: TransitionsResponse = Self::decode("Issue.GetTransitions", response).await?;

        Ok(found.transitions)
    }

    async fn transition(&self, issue_key: &str, transition_id: &str) -> Result<()> {
        let url = self.endpoint(&format!("rest/api/2/issue/{}/transitions", issue_key))?;
        let request = self
            .http
            .post(url)
            .json(&json!({ "transition": { "id": transition_id } }));

        self.send("Issue.DoTransition", request).await?;
        Ok(())
    }

    async fn create(&self, issue: &RenderedIssue) -> Result<CreatedIssue> {
        let url = self.endpoint("rest/api/2/issue")?;
        let request = self.http.post(url).json(&issue.to_payload());

        let response = self.send("Issue.Create", request).await?;
        Self::decode("Issue.Create", response).await
    }
}
