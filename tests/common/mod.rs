// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides alert group builders, receiver configs and an in-memory tracker

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ticketwarden::alert::{Alert, AlertGroup, AlertStatus, Labels};
use ticketwarden::config::{ReceiverConfig, ReceiverSpec};
use ticketwarden::tracker::{
    CreatedIssue, IssueSnapshot, RenderedIssue, SearchQuery, StatusCategory, TrackerConnector,
    TrackerError, TrackerGateway, Transition,
};

pub struct AlertGroupBuilder {
    receiver: String,
    group_labels: Labels,
    alerts: Vec<Alert>,
}

impl AlertGroupBuilder {
    pub fn new(receiver: &str) -> Self {
        Self {
            receiver: receiver.to_string(),
            group_labels: Labels::new(),
            alerts: Vec::new(),
        }
    }

    pub fn with_group_label(mut self, key: &str, value: &str) -> Self {
        self.group_labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn add_firing_alert(mut self) -> Self {
        self.alerts.push(Alert::firing(self.group_labels.clone()));
        self
    }

    pub fn add_resolved_alert(mut self) -> Self {
        let mut alert = Alert::firing(self.group_labels.clone());
        alert.status = AlertStatus::Resolved;
        self.alerts.push(alert);
        self
    }

    pub fn build(self) -> AlertGroup {
        AlertGroup::new(self.receiver, self.group_labels, self.alerts)
    }
}

/// The "r1 / Disk / page" group used across tests
pub fn disk_group() -> AlertGroup {
    AlertGroupBuilder::new("r1")
        .with_group_label("alertname", "Disk")
        .with_group_label("severity", "page")
        .add_firing_alert()
        .build()
}

pub const DEFAULTS_YAML: &str = r#"
api_url: https://jira.example.com
user: bot
password: secret
project: OPS
issue_type: Bug
summary: "[{{Status}}] {{GroupLabels.alertname}}"
description: "{{CommonAnnotations.summary}}"
reopen_state: To Do
reopen_duration: 2h
wont_fix_resolution: "Won't Fix"
"#;

/// Resolve a receiver from YAML overrides on top of `DEFAULTS_YAML`
pub fn receiver(name: &str, overrides: &str) -> ReceiverConfig {
    let defaults: ReceiverSpec = serde_yaml::from_str(DEFAULTS_YAML).unwrap();
    let mut spec: ReceiverSpec = serde_yaml::from_str(overrides).unwrap();
    spec.name = Some(name.to_string());
    spec.resolve(&defaults).unwrap()
}

pub fn hash_receiver() -> ReceiverConfig {
    receiver(
        "r1",
        r#"alert_hash: "{{GroupLabels.alertname}}-{{GroupLabels.severity}}""#,
    )
}

#[derive(Debug, Clone)]
pub struct StoredIssue {
    pub project: String,
    pub snapshot: IssueSnapshot,
    pub description: String,
    pub labels: Vec<String>,
    pub rendered: Option<RenderedIssue>,
}

#[derive(Default)]
struct TrackerState {
    issues: Vec<StoredIssue>,
    transitions: Vec<Transition>,
    next_id: u32,
    calls: Vec<String>,
    queries: Vec<String>,
    failures: Vec<(&'static str, u16)>,
}

/// In-memory tracker that understands the queries the engine builds
#[derive(Default)]
pub struct FakeTracker {
    state: Mutex<TrackerState>,
}

impl FakeTracker {
    pub fn new() -> Self {
        let tracker = Self::default();
        tracker.set_transitions(&[("11", "Start Progress"), ("21", "To Do")]);
        tracker
    }

    pub fn set_transitions(&self, transitions: &[(&str, &str)]) {
        self.state.lock().unwrap().transitions = transitions
            .iter()
            .map(|(id, name)| Transition {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
    }

    /// Make the next call to `operation` fail with `status`
    pub fn fail_next(&self, operation: &'static str, status: u16) {
        self.state.lock().unwrap().failures.push((operation, status));
    }

    pub fn seed_issue(&self, project: &str, description: &str, labels: &[&str]) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let next_id = state.next_id;
        let key = format!("{}-{}", project, next_id);
        state.issues.push(StoredIssue {
            project: project.to_string(),
            snapshot: IssueSnapshot {
                key: key.clone(),
                id: (10000 + next_id).to_string(),
                summary: String::new(),
                status: "Open".to_string(),
                category: StatusCategory::ToDo,
                resolution: None,
                resolved_at: None,
            },
            description: description.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            rendered: None,
        });
        key
    }

    pub fn resolve_issue(&self, key: &str, resolution: &str, resolved_at: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        let issue = state
            .issues
            .iter_mut()
            .find(|i| i.snapshot.key == key)
            .unwrap();
        issue.snapshot.category = StatusCategory::Done;
        issue.snapshot.status = "Closed".to_string();
        issue.snapshot.resolution = Some(resolution.to_string());
        issue.snapshot.resolved_at = Some(resolved_at);
    }

    pub fn issue(&self, key: &str) -> Option<StoredIssue> {
        let state = self.state.lock().unwrap();
        state.issues.iter().find(|i| i.snapshot.key == key).cloned()
    }

    pub fn issue_count(&self) -> usize {
        self.state.lock().unwrap().issues.len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.state.lock().unwrap().queries.clone()
    }

    fn record(&self, call: String, operation: &'static str) -> Result<(), TrackerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if let Some(pos) = state.failures.iter().position(|(op, _)| *op == operation) {
            let (_, status) = state.failures.remove(pos);
            return Err(TrackerError::Status {
                operation,
                url: format!("https://jira.example.com/{}", operation),
                status: StatusCode::from_u16(status).unwrap(),
                body: "{\"errorMessages\":[\"injected\"]}".to_string(),
            });
        }
        Ok(())
    }
}

fn between<'a>(text: &'a str, start: &str, end: char) -> Option<&'a str> {
    let from = text.find(start)? + start.len();
    let len = text[from..].find(end)?;
    Some(&text[from..from + len])
}

fn quoted_labels(jql: &str) -> Vec<String> {
    jql.split("labels=\"")
        .skip(1)
        .filter_map(|rest| rest.find('"').map(|end| rest[..end].to_string()))
        .collect()
}

#[async_trait]
impl TrackerGateway for FakeTracker {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<IssueSnapshot>, TrackerError> {
        self.record(format!("search {}", query.jql), "search")?;

        let mut state = self.state.lock().unwrap();
        state.queries.push(query.jql.clone());

        let project = between(&query.jql, "project=", ' ').unwrap_or_default();
        let marker = between(&query.jql, "description~\"", '"');
        let labels = quoted_labels(&query.jql);

        let mut found: Vec<&StoredIssue> = state
            .issues
            .iter()
            .filter(|i| i.project == project)
            .filter(|i| marker.map_or(true, |m| i.description.contains(m)))
            .filter(|i| labels.iter().all(|l| i.labels.contains(l)))
            .collect();
        found.sort_by_key(|i| std::cmp::Reverse(i.snapshot.id.parse::<u32>().unwrap_or(0)));

        Ok(found
            .into_iter()
            .take(query.max_results as usize)
            .map(|i| i.snapshot.clone())
            .collect())
    }

    async fn transitions(&self, issue_key: &str) -> Result<Vec<Transition>, TrackerError> {
        self.record(format!("transitions {}", issue_key), "transitions")?;
        Ok(self.state.lock().unwrap().transitions.clone())
    }

    async fn transition(&self, issue_key: &str, transition_id: &str) -> Result<(), TrackerError> {
        self.record(
            format!("transition {} {}", issue_key, transition_id),
            "transition",
        )?;

        let mut state = self.state.lock().unwrap();
        if let Some(issue) = state.issues.iter_mut().find(|i| i.snapshot.key == issue_key) {
            issue.snapshot.category = StatusCategory::ToDo;
            issue.snapshot.status = "To Do".to_string();
            issue.snapshot.resolution = None;
            issue.snapshot.resolved_at = None;
        }
        Ok(())
    }

    async fn create(&self, issue: &RenderedIssue) -> Result<CreatedIssue, TrackerError> {
        self.record(format!("create {}", issue.project), "create")?;

        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let created = CreatedIssue {
            key: format!("{}-{}", issue.project, state.next_id),
            id: (10000 + state.next_id).to_string(),
        };
        state.issues.push(StoredIssue {
            project: issue.project.clone(),
            snapshot: IssueSnapshot {
                key: created.key.clone(),
                id: created.id.clone(),
                summary: issue.summary.clone(),
                status: "Open".to_string(),
                category: StatusCategory::ToDo,
                resolution: None,
                resolved_at: None,
            },
            description: issue.description.clone(),
            labels: issue.labels.clone(),
            rendered: Some(issue.clone()),
        });
        Ok(created)
    }
}

/// Hands out the same fake tracker for every receiver
pub struct FakeConnector {
    pub tracker: Arc<FakeTracker>,
}

impl TrackerConnector for FakeConnector {
    fn connect(
        &self,
        _receiver: &ReceiverConfig,
    ) -> Result<Arc<dyn TrackerGateway>, TrackerError> {
        Ok(self.tracker.clone())
    }
}

pub fn hours(n: u64) -> Duration {
    Duration::from_secs(n * 3600)
}
