// ABOUTME: Alertmanager webhook payload types for grouped alerts
// ABOUTME: Provides firing filters and sorted label access for ticket deduplication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label or annotation map. Ordered by key so iteration is deterministic.
pub type Labels = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    #[default]
    Firing,
    Resolved,
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertStatus::Firing => write!(f, "firing"),
            AlertStatus::Resolved => write!(f, "resolved"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(default)]
    pub status: AlertStatus,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub annotations: Labels,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "generatorURL")]
    pub generator_url: String,
    #[serde(default)]
    pub fingerprint: String,
}

/// One webhook delivery: a set of alerts grouped under shared labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertGroup {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub group_key: String,
    pub receiver: String,
    #[serde(default)]
    pub status: AlertStatus,
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub group_labels: Labels,
    #[serde(default)]
    pub common_labels: Labels,
    #[serde(default)]
    pub common_annotations: Labels,
    #[serde(default, rename = "externalURL")]
    pub external_url: String,
}

impl Alert {
    pub fn firing(labels: Labels) -> Self {
        Self {
            status: AlertStatus::Firing,
            labels,
            annotations: Labels::new(),
            starts_at: None,
            ends_at: None,
            generator_url: String::new(),
            fingerprint: String::new(),
        }
    }

    pub fn is_firing(&self) -> bool {
        self.status == AlertStatus::Firing
    }
}

impl AlertGroup {
    pub fn new(receiver: impl Into<String>, group_labels: Labels, alerts: Vec<Alert>) -> Self {
        Self {
            version: "4".to_string(),
            group_key: String::new(),
            receiver: receiver.into(),
            status: AlertStatus::Firing,
            alerts,
            group_labels,
            common_labels: Labels::new(),
            common_annotations: Labels::new(),
            external_url: String::new(),
        }
    }

    /// Decode a webhook body
    pub fn from_json(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// Alerts that are still firing
    pub fn firing(&self) -> Vec<&Alert> {
        self.alerts.iter().filter(|a| a.is_firing()).collect()
    }

    /// Copy of this group with resolved alerts removed
    pub fn without_resolved(&self) -> Self {
        let mut group = self.clone();
        group.alerts.retain(Alert::is_firing);
        group
    }

    /// Group label values, ordered by label name
    pub fn sorted_label_values(&self) -> Vec<String> {
        self.group_labels.values().cloned().collect()
    }
}
