// ABOUTME: Boundary layer mapping webhook payloads to notification runs
// ABOUTME: Looks up the receiver, filters resolved alerts and turns results into HTTP statuses

use reqwest::StatusCode;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::alert::{AlertGroup, Labels};
use crate::config::{ConfigStore, Result as ConfigResult};
use crate::notify::{Notifier, Outcome};
use crate::tracker::TrackerConnector;

const UNKNOWN_RECEIVER: &str = "<unknown>";

/// JSON body returned for failed deliveries
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorBody {
    pub error: bool,
    pub status: u16,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResponse {
    pub status: StatusCode,
    pub receiver: String,
    pub outcome: Option<Outcome>,
    pub error: Option<ErrorBody>,
}

impl DispatchResponse {
    fn ok(receiver: &str, outcome: Option<Outcome>) -> Self {
        Self {
            status: StatusCode::OK,
            receiver: receiver.to_string(),
            outcome,
            error: None,
        }
    }

    fn failed(
        status: StatusCode,
        message: String,
        receiver: &str,
        group_labels: Option<&Labels>,
    ) -> Self {
        error!(
            "{}: err={} receiver={:?} groupLabels={:?}",
            status,
            message,
            receiver,
            group_labels.cloned().unwrap_or_default()
        );
        Self {
            status,
            receiver: receiver.to_string(),
            outcome: None,
            error: Some(ErrorBody {
                error: true,
                status: status.as_u16(),
                message,
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

pub struct Dispatcher {
    store: Arc<ConfigStore>,
    connector: Arc<dyn TrackerConnector>,
}

impl Dispatcher {
    pub fn new(store: Arc<ConfigStore>, connector: Arc<dyn TrackerConnector>) -> Self {
        Self { store, connector }
    }

    /// Swap in freshly loaded configuration; runs already underway finish
    /// with the snapshot they started with
    pub fn reload(&self) -> ConfigResult<()> {
        self.store.reload()
    }

    /// Handle one webhook body
    pub async fn handle(&self, body: &[u8]) -> DispatchResponse {
        debug!("Handling alert webhook request");

        let group = match AlertGroup::from_json(body) {
            Ok(group) => group,
            Err(e) => {
                return DispatchResponse::failed(
                    StatusCode::BAD_REQUEST,
                    e.to_string(),
                    UNKNOWN_RECEIVER,
                    None,
                )
            }
        };

        self.dispatch(&group).await
    }

    pub async fn dispatch(&self, group: &AlertGroup) -> DispatchResponse {
        let snapshot = self.store.snapshot();

        let Some(receiver) = snapshot.config.receiver_by_name(&group.receiver) else {
            return DispatchResponse::failed(
                StatusCode::NOT_FOUND,
                format!("Receiver missing: {}", group.receiver),
                UNKNOWN_RECEIVER,
                Some(&group.group_labels),
            );
        };
        debug!("Matched receiver: {:?}", receiver.name);

        let firing = group.without_resolved();
        if firing.alerts.len() < group.alerts.len() {
            warn!(
                "Please set \"send_resolved: false\" on receiver {} in the Alertmanager config",
                receiver.name
            );
        }
        if firing.alerts.is_empty() {
            return DispatchResponse::ok(&receiver.name, None);
        }

        let tracker = match self.connector.connect(receiver) {
            Ok(tracker) => tracker,
            Err(e) => {
                return DispatchResponse::failed(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    e.to_string(),
                    &receiver.name,
                    Some(&group.group_labels),
                )
            }
        };

        let notifier = Notifier::new(receiver, &snapshot.templates, tracker.as_ref());
        match notifier.notify(&firing).await {
            Ok(outcome) => DispatchResponse::ok(&receiver.name, Some(outcome)),
            Err(e) => {
                let status = if e.is_retryable() {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                DispatchResponse::failed(
                    status,
                    e.to_string(),
                    &receiver.name,
                    Some(&group.group_labels),
                )
            }
        }
    }
}
