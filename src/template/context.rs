// ABOUTME: Template context built from an alert group
// ABOUTME: Exposes receiver, labels, annotations and alerts under Alertmanager-style names

use serde_json::{json, Value as JsonValue};

use crate::alert::{Alert, AlertGroup};

/// Render context for one alert group. Built once per notification and
/// shared by every render in that run.
#[derive(Debug, Clone)]
pub struct TemplateContext {
    data: JsonValue,
}

impl TemplateContext {
    pub fn from_group(group: &AlertGroup) -> Self {
        let alerts: Vec<JsonValue> = group.alerts.iter().map(alert_to_json).collect();
        let firing: Vec<JsonValue> = group.firing().into_iter().map(alert_to_json).collect();

        let data = json!({
            "Receiver": group.receiver,
            "Status": group.status.to_string(),
            "GroupKey": group.group_key,
            "ExternalURL": group.external_url,
            "GroupLabels": group.group_labels,
            "CommonLabels": group.common_labels,
            "CommonAnnotations": group.common_annotations,
            "Alerts": alerts,
            "Firing": firing,
        });

        Self { data }
    }

    pub fn as_json(&self) -> &JsonValue {
        &self.data
    }
}

fn alert_to_json(alert: &Alert) -> JsonValue {
    json!({
        "Status": alert.status.to_string(),
        "Labels": alert.labels,
        "Annotations": alert.annotations,
        "StartsAt": alert.starts_at.map(|t| t.to_rfc3339()),
        "EndsAt": alert.ends_at.map(|t| t.to_rfc3339()),
        "GeneratorURL": alert.generator_url,
        "Fingerprint": alert.fingerprint,
    })
}
