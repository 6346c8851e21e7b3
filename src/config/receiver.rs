// ABOUTME: Receiver configuration as written in YAML and as resolved against defaults
// ABOUTME: Validates required fields and keeps tracker credentials out of output

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use super::error::{ConfigError, Result};
use crate::template::FieldValue;

/// A credential that never appears in logs or dumped configuration
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<secret>")
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str("<secret>")
    }
}

/// Receiver block as written in the file. Also used for `defaults`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiverSpec {
    pub name: Option<String>,

    // Tracker account
    pub api_url: Option<String>,
    pub user: Option<String>,
    pub password: Option<Secret>,

    // Issue templates
    pub project: Option<String>,
    pub issue_type: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub components: Option<Vec<String>>,
    pub fields: Option<BTreeMap<String, FieldValue>>,

    // Deduplication
    pub alert_hash: Option<String>,
    pub add_labels: Option<bool>,
    pub add_group_labels: Option<bool>,

    // Lifecycle
    pub reopen_state: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub reopen_duration: Option<Duration>,
    pub wont_fix_resolution: Option<String>,
}

/// Fully resolved receiver. Immutable once loaded.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiverConfig {
    pub name: String,
    pub api_url: String,
    pub user: String,
    pub password: Secret,
    pub project: String,
    pub issue_type: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    pub components: Vec<String>,
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_hash: Option<String>,
    pub add_labels: bool,
    pub add_group_labels: bool,
    pub reopen_state: String,
    #[serde(with = "humantime_serde")]
    pub reopen_duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wont_fix_resolution: Option<String>,
}

impl ReceiverSpec {
    /// Fill unset fields from `defaults` and check that everything required is present
    pub fn resolve(&self, defaults: &ReceiverSpec) -> Result<ReceiverConfig> {
        let name = self
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                receiver: String::new(),
                field: "name",
            })?;

        let required = |value: &Option<String>, fallback: &Option<String>, field| {
            value
                .clone()
                .or_else(|| fallback.clone())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingField {
                    receiver: name.clone(),
                    field,
                })
        };

        let api_url = required(&self.api_url, &defaults.api_url, "api_url")?;
        reqwest::Url::parse(&api_url).map_err(|e| ConfigError::InvalidValue {
            receiver: name.clone(),
            field: "api_url",
            message: e.to_string(),
        })?;

        let password = self
            .password
            .clone()
            .or_else(|| defaults.password.clone())
            .filter(|p| !p.expose().is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                receiver: name.clone(),
                field: "password",
            })?;

        let reopen_duration = self
            .reopen_duration
            .or(defaults.reopen_duration)
            .ok_or_else(|| ConfigError::MissingField {
                receiver: name.clone(),
                field: "reopen_duration",
            })?;

        Ok(ReceiverConfig {
            user: required(&self.user, &defaults.user, "user")?,
            project: required(&self.project, &defaults.project, "project")?,
            issue_type: required(&self.issue_type, &defaults.issue_type, "issue_type")?,
            summary: required(&self.summary, &defaults.summary, "summary")?,
            reopen_state: required(&self.reopen_state, &defaults.reopen_state, "reopen_state")?,
            description: inherit(&self.description, &defaults.description),
            priority: inherit(&self.priority, &defaults.priority),
            alert_hash: inherit(&self.alert_hash, &defaults.alert_hash),
            wont_fix_resolution: inherit(&self.wont_fix_resolution, &defaults.wont_fix_resolution),
            components: self
                .components
                .clone()
                .or_else(|| defaults.components.clone())
                .unwrap_or_default(),
            fields: self
                .fields
                .clone()
                .or_else(|| defaults.fields.clone())
                .unwrap_or_default(),
            add_labels: self.add_labels.or(defaults.add_labels).unwrap_or(false),
            add_group_labels: self
                .add_group_labels
                .or(defaults.add_group_labels)
                .unwrap_or(false),
            api_url,
            password,
            reopen_duration,
            name,
        })
    }
}

fn inherit(value: &Option<String>, fallback: &Option<String>) -> Option<String> {
    value
        .clone()
        .or_else(|| fallback.clone())
        .filter(|v| !v.is_empty())
}

impl ReceiverConfig {
    /// Every template string this receiver renders, tagged with its field name
    pub fn templates(&self) -> Vec<(&'static str, &str)> {
        let mut out = vec![
            ("project", self.project.as_str()),
            ("issue_type", self.issue_type.as_str()),
            ("summary", self.summary.as_str()),
        ];
        if let Some(description) = &self.description {
            out.push(("description", description));
        }
        if let Some(priority) = &self.priority {
            out.push(("priority", priority));
        }
        if let Some(alert_hash) = &self.alert_hash {
            out.push(("alert_hash", alert_hash));
        }
        out.extend(self.components.iter().map(|c| ("components", c.as_str())));
        for value in self.fields.values() {
            out.extend(value.strings().into_iter().map(|s| ("fields", s)));
        }
        out
    }
}
