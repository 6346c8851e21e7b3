// ABOUTME: Integration tests for the reconciliation engine
// ABOUTME: Drives Notifier against an in-memory tracker through create, no-op and reopen paths

mod common;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use common::*;
use serde_json::json;

use ticketwarden::notify::{Notifier, NotifyError, Outcome};
use ticketwarden::template::TemplateEngine;
use ticketwarden::tracker::query::alert_hash;

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn test_first_notification_creates_then_second_is_noop() {
    let tracker = FakeTracker::new();
    let receiver = hash_receiver();
    let templates = TemplateEngine::new();
    let notifier = Notifier::new(&receiver, &templates, &tracker);
    let group = disk_group();

    let first = notifier.notify_at(&group, now()).await.unwrap();
    assert_eq!(
        first,
        Outcome::Created {
            key: "OPS-1".to_string(),
            id: "10001".to_string()
        }
    );

    let issue = tracker.issue("OPS-1").unwrap();
    let hash = alert_hash("Disk-page");
    assert_eq!(hash.len(), 40);
    assert!(issue.description.ends_with(&format!("\n\nalert_hash={}", hash)));
    assert_eq!(issue.snapshot.summary, "[firing] Disk");

    let second = notifier.notify_at(&group, now()).await.unwrap();
    assert_eq!(
        second,
        Outcome::Unchanged {
            key: "OPS-1".to_string()
        }
    );
    assert_eq!(tracker.issue_count(), 1);

    let queries = tracker.queries();
    assert_eq!(
        queries[0],
        format!(
            "project=OPS and description~\"alert_hash={}\" order by key DESC",
            hash
        )
    );
}

#[tokio::test]
async fn test_recently_resolved_issue_is_reopened() {
    let tracker = FakeTracker::new();
    let receiver = hash_receiver();
    let templates = TemplateEngine::new();
    let notifier = Notifier::new(&receiver, &templates, &tracker);

    let description = format!("old\n\nalert_hash={}", alert_hash("Disk-page"));
    let key = tracker.seed_issue("OPS", &description, &[]);
    tracker.resolve_issue(&key, "Fixed", now() - ChronoDuration::hours(1));

    let outcome = notifier.notify_at(&disk_group(), now()).await.unwrap();

    assert_eq!(outcome, Outcome::Reopened { key: key.clone() });
    assert!(tracker.calls().contains(&format!("transition {} 21", key)));
    assert_eq!(tracker.issue_count(), 1);
}

#[tokio::test]
async fn test_issue_resolved_outside_window_gets_new_issue() {
    let tracker = FakeTracker::new();
    let receiver = hash_receiver();
    let templates = TemplateEngine::new();
    let notifier = Notifier::new(&receiver, &templates, &tracker);

    let description = format!("old\n\nalert_hash={}", alert_hash("Disk-page"));
    let key = tracker.seed_issue("OPS", &description, &[]);
    tracker.resolve_issue(&key, "Fixed", now() - ChronoDuration::hours(3));

    let outcome = notifier.notify_at(&disk_group(), now()).await.unwrap();

    assert!(matches!(outcome, Outcome::Created { ref key, .. } if key == "OPS-2"));
    assert!(!tracker.calls().iter().any(|c| c.starts_with("transition")));
}

#[tokio::test]
async fn test_wont_fix_issue_is_left_alone() {
    let tracker = FakeTracker::new();
    let receiver = hash_receiver();
    let templates = TemplateEngine::new();
    let notifier = Notifier::new(&receiver, &templates, &tracker);

    let description = format!("alert_hash={}", alert_hash("Disk-page"));
    let key = tracker.seed_issue("OPS", &description, &[]);
    tracker.resolve_issue(&key, "Won't Fix", now() - ChronoDuration::minutes(5));

    let outcome = notifier.notify_at(&disk_group(), now()).await.unwrap();

    assert_eq!(outcome, Outcome::Unchanged { key });
    assert_eq!(tracker.calls().len(), 1);
}

#[tokio::test]
async fn test_missing_reopen_transition_is_permanent_failure() {
    let tracker = FakeTracker::new();
    tracker.set_transitions(&[("11", "Start Progress")]);
    let receiver = hash_receiver();
    let templates = TemplateEngine::new();
    let notifier = Notifier::new(&receiver, &templates, &tracker);

    let description = format!("alert_hash={}", alert_hash("Disk-page"));
    let key = tracker.seed_issue("OPS", &description, &[]);
    tracker.resolve_issue(&key, "Fixed", now() - ChronoDuration::minutes(5));

    let err = notifier.notify_at(&disk_group(), now()).await.unwrap_err();

    assert!(matches!(err, NotifyError::MissingTransition { ref state, .. } if state == "To Do"));
    assert!(!err.is_retryable());
    assert_eq!(err.issue_key(), Some(key.as_str()));
}

#[tokio::test]
async fn test_render_error_stops_before_any_tracker_call() {
    let tracker = FakeTracker::new();
    let receiver = receiver("r1", r#"summary: "{{#if Status}}unterminated""#);
    let templates = TemplateEngine::new();
    let notifier = Notifier::new(&receiver, &templates, &tracker);

    let err = notifier.notify_at(&disk_group(), now()).await.unwrap_err();

    assert!(matches!(err, NotifyError::Render { field: "summary", .. }));
    assert!(!err.is_retryable());
    assert!(tracker.calls().is_empty());
}

#[tokio::test]
async fn test_label_dedup_and_group_labels() {
    let tracker = FakeTracker::new();
    let receiver = receiver("r1", "add_labels: true\nadd_group_labels: true\n");
    let templates = TemplateEngine::new();
    let notifier = Notifier::new(&receiver, &templates, &tracker);

    let outcome = notifier.notify_at(&disk_group(), now()).await.unwrap();
    let Outcome::Created { key, .. } = outcome else {
        panic!("expected a new issue, got {:?}", outcome);
    };

    assert_eq!(
        tracker.queries()[0],
        "project=OPS and labels=\"ALERT\" and labels=\"Disk\" and labels=\"page\" order by key DESC"
    );

    let issue = tracker.issue(&key).unwrap();
    assert_eq!(
        issue.labels,
        vec![
            "ALERT",
            "Disk",
            "page",
            "alertname=\"Disk\"",
            "severity=\"page\""
        ]
    );
    assert!(issue.description.ends_with("\n\nalert_hash="));

    let again = notifier.notify_at(&disk_group(), now()).await.unwrap();
    assert_eq!(again, Outcome::Unchanged { key });
}

#[tokio::test]
async fn test_hash_wins_over_labels() {
    let tracker = FakeTracker::new();
    let receiver = receiver(
        "r1",
        "alert_hash: \"{{GroupLabels.alertname}}\"\nadd_labels: true\n",
    );
    let templates = TemplateEngine::new();
    let notifier = Notifier::new(&receiver, &templates, &tracker);

    notifier.notify_at(&disk_group(), now()).await.unwrap();

    let query = &tracker.queries()[0];
    assert!(query.contains(&alert_hash("Disk")));
    assert!(!query.contains("labels="));
}

#[tokio::test]
async fn test_custom_fields_render_deeply() {
    let tracker = FakeTracker::new();
    let receiver = receiver(
        "r1",
        r#"
priority: '{{#if (eq GroupLabels.severity "page")}}High{{else}}Low{{/if}}'
components: ["{{GroupLabels.alertname}}", "storage"]
fields:
  customfield_10001: "{{GroupLabels.alertname}}"
  customfield_10002:
    value: "{{GroupLabels.severity}}"
    1: "{{#if Status}}"
  customfield_10003: ["{{Receiver}}", 42, true]
"#,
    );
    let templates = TemplateEngine::new();
    let notifier = Notifier::new(&receiver, &templates, &tracker);

    let outcome = notifier.notify_at(&disk_group(), now()).await.unwrap();
    let Outcome::Created { key, .. } = outcome else {
        panic!("expected a new issue, got {:?}", outcome);
    };

    let rendered = tracker.issue(&key).unwrap().rendered.unwrap();
    assert_eq!(rendered.priority.as_deref(), Some("High"));
    assert_eq!(rendered.components, vec!["Disk", "storage"]);
    assert_eq!(rendered.fields["customfield_10001"], json!("Disk"));
    assert_eq!(rendered.fields["customfield_10002"], json!({"value": "page"}));
    assert_eq!(rendered.fields["customfield_10003"], json!(["r1", 42, true]));
}

#[tokio::test]
async fn test_only_newest_match_is_considered() {
    let tracker = FakeTracker::new();
    let receiver = hash_receiver();
    let templates = TemplateEngine::new();
    let notifier = Notifier::new(&receiver, &templates, &tracker);

    let description = format!("alert_hash={}", alert_hash("Disk-page"));
    tracker.seed_issue("OPS", &description, &[]);
    let newest = tracker.seed_issue("OPS", &description, &[]);
    tracker.resolve_issue(&newest, "Fixed", now() - ChronoDuration::minutes(10));

    let outcome = notifier.notify_at(&disk_group(), now()).await.unwrap();

    assert_eq!(outcome, Outcome::Reopened { key: newest });
}

#[tokio::test]
async fn test_tracker_failures_carry_retryability() {
    let tracker = FakeTracker::new();
    let receiver = hash_receiver();
    let templates = TemplateEngine::new();
    let notifier = Notifier::new(&receiver, &templates, &tracker);

    tracker.fail_next("search", 503);
    let err = notifier.notify_at(&disk_group(), now()).await.unwrap_err();
    assert!(matches!(err, NotifyError::Search { .. }));
    assert!(err.is_retryable());
    assert_eq!(err.status(), Some(503));
    assert!(err.query().unwrap().contains("alert_hash="));

    tracker.fail_next("create", 404);
    let err = notifier.notify_at(&disk_group(), now()).await.unwrap_err();
    assert!(matches!(err, NotifyError::Create { ref project, .. } if project == "OPS"));
    assert!(!err.is_retryable());
    assert_eq!(err.status(), Some(404));
    assert_eq!(tracker.issue_count(), 0);
}

#[tokio::test]
async fn test_notifier_is_shared_across_concurrent_runs() {
    let tracker = FakeTracker::new();
    let receiver = receiver("r1", "alert_hash: \"{{GroupLabels.alertname}}\"\n");
    let templates = TemplateEngine::new();
    let notifier = Notifier::new(&receiver, &templates, &tracker);

    let disk = disk_group();
    let cpu = AlertGroupBuilder::new("r1")
        .with_group_label("alertname", "CPU")
        .add_firing_alert()
        .build();

    let (a, b) = tokio::join!(notifier.notify_at(&disk, now()), notifier.notify_at(&cpu, now()));

    assert!(matches!(a.unwrap(), Outcome::Created { .. }));
    assert!(matches!(b.unwrap(), Outcome::Created { .. }));
    assert_eq!(tracker.issue_count(), 2);
}
