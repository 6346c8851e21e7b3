// ABOUTME: Issue tracker gateway used by the reconciliation engine
// ABOUTME: Defines the gateway trait, its Jira implementation and the query builder

pub mod client;
pub mod error;
pub mod query;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ReceiverConfig;

pub use client::{http_client, JiraClient};
pub use error::{is_retryable_status, Result, TrackerError};
pub use query::{Dedup, SearchQuery};
pub use types::{CreatedIssue, IssueSnapshot, RenderedIssue, StatusCategory, Transition};

/// The four tracker operations reconciliation needs
#[async_trait]
pub trait TrackerGateway: Send + Sync {
    /// Matching issues, newest key first
    async fn search(&self, query: &SearchQuery) -> Result<Vec<IssueSnapshot>>;

    async fn transitions(&self, issue_key: &str) -> Result<Vec<Transition>>;

    async fn transition(&self, issue_key: &str, transition_id: &str) -> Result<()>;

    async fn create(&self, issue: &RenderedIssue) -> Result<CreatedIssue>;
}

/// Opens a gateway for a receiver's tracker account
pub trait TrackerConnector: Send + Sync {
    fn connect(&self, receiver: &ReceiverConfig) -> Result<Arc<dyn TrackerGateway>>;
}

/// Hands every receiver a client over one shared connection pool
pub struct JiraConnector {
    http: reqwest::Client,
}

impl JiraConnector {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: client::http_client(timeout)?,
        })
    }
}

impl TrackerConnector for JiraConnector {
    fn connect(&self, receiver: &ReceiverConfig) -> Result<Arc<dyn TrackerGateway>> {
        let client = JiraClient::with_http(
            self.http.clone(),
            &receiver.api_url,
            &receiver.user,
            receiver.password.expose(),
        )?;
        Ok(Arc::new(client))
    }
}
