// ABOUTME: Issue tracker wire types and the issue snapshot used for reconciliation
// ABOUTME: Decodes Jira search/transition responses and encodes issue creation payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map as JsonMap, Value as JsonValue};

/// Coarse workflow bucket. The tracker's set of categories is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusCategory {
    ToDo,
    InProgress,
    Done,
}

impl StatusCategory {
    pub fn from_key(key: &str) -> Self {
        match key {
            "done" => StatusCategory::Done,
            "indeterminate" => StatusCategory::InProgress,
            _ => StatusCategory::ToDo,
        }
    }
}

/// The fields of an existing issue that reconciliation looks at
#[derive(Debug, Clone, PartialEq)]
pub struct IssueSnapshot {
    pub key: String,
    pub id: String,
    pub summary: String,
    pub status: String,
    pub category: StatusCategory,
    pub resolution: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
}

/// Server-assigned identity of a newly created issue
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
}

/// Fully rendered issue, ready for submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedIssue {
    pub project: String,
    pub issue_type: String,
    pub summary: String,
    pub description: String,
    pub priority: Option<String>,
    pub labels: Vec<String>,
    pub components: Vec<String>,
    pub fields: JsonMap<String, JsonValue>,
    pub key: Option<String>,
    pub id: Option<String>,
}

impl RenderedIssue {
    /// Body for the create-issue endpoint. Custom fields sit next to the
    /// standard ones and win on collision.
    pub fn to_payload(&self) -> JsonValue {
        let mut fields = JsonMap::new();
        fields.insert("project".to_string(), json!({ "key": self.project }));
        fields.insert("issuetype".to_string(), json!({ "name": self.issue_type }));
        fields.insert("summary".to_string(), json!(self.summary));
        fields.insert("description".to_string(), json!(self.description));
        if !self.labels.is_empty() {
            fields.insert("labels".to_string(), json!(self.labels));
        }
        if let Some(priority) = &self.priority {
            fields.insert("priority".to_string(), json!({ "name": priority }));
        }
        if !self.components.is_empty() {
            let components: Vec<JsonValue> = self
                .components
                .iter()
                .map(|name| json!({ "name": name }))
                .collect();
            fields.insert("components".to_string(), JsonValue::Array(components));
        }
        for (key, value) in &self.fields {
            fields.insert(key.clone(), value.clone());
        }

        json!({ "fields": fields })
    }

    pub fn assign(&mut self, created: &CreatedIssue) {
        self.key = Some(created.key.clone());
        self.id = Some(created.id.clone());
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub issues: Vec<WireIssue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionsResponse {
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireIssue {
    #[serde(default)]
    pub id: String,
    pub key: String,
    pub fields: WireFields,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireFields {
    #[serde(default)]
    pub summary: String,
    pub status: Option<WireStatus>,
    pub resolution: Option<WireNamed>,
    #[serde(default, deserialize_with = "deserialize_tracker_time")]
    pub resolutiondate: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireStatus {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "statusCategory")]
    pub status_category: Option<WireCategory>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireCategory {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireNamed {
    pub name: String,
}

impl From<WireIssue> for IssueSnapshot {
    fn from(issue: WireIssue) -> Self {
        let (status, category) = match issue.fields.status {
            Some(status) => {
                let category = status
                    .status_category
                    .map(|c| StatusCategory::from_key(&c.key))
                    .unwrap_or(StatusCategory::ToDo);
                (status.name, category)
            }
            None => (String::new(), StatusCategory::ToDo),
        };

        Self {
            key: issue.key,
            id: issue.id,
            summary: issue.fields.summary,
            status,
            category,
            resolution: issue.fields.resolution.map(|r| r.name),
            resolved_at: issue.fields.resolutiondate,
        }
    }
}

/// Parse the tracker's timestamp format (`2024-03-01T10:00:00.000+0000`),
/// falling back to RFC 3339
pub fn parse_tracker_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn deserialize_tracker_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => parse_tracker_time(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {:?}", s))),
    }
}
