// ABOUTME: Pure lifecycle decision for an alert group's existing issue
// ABOUTME: Chooses between leaving the issue alone, reopening it, or filing a new one

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;

use crate::tracker::{IssueSnapshot, StatusCategory};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    NoOp(String),
    Reopen(String),
    Create,
}

/// When a resolved issue may be brought back
#[derive(Debug, Clone, PartialEq)]
pub struct ReopenPolicy {
    pub window: Duration,
    pub wont_fix_resolution: Option<String>,
}

impl ReopenPolicy {
    pub fn decide(&self, existing: Option<&IssueSnapshot>, now: DateTime<Utc>) -> Decision {
        let Some(issue) = existing else {
            return Decision::Create;
        };

        if issue.category != StatusCategory::Done {
            return Decision::NoOp(issue.key.clone());
        }

        if let (Some(wont_fix), Some(resolution)) = (&self.wont_fix_resolution, &issue.resolution) {
            if wont_fix == resolution {
                return Decision::NoOp(issue.key.clone());
            }
        }

        let Some(resolved_at) = issue.resolved_at else {
            return Decision::Create;
        };

        // A window too large to represent never closes
        let reopen_until = ChronoDuration::from_std(self.window)
            .ok()
            .and_then(|window| resolved_at.checked_add_signed(window));
        match reopen_until {
            Some(until) if until <= now => Decision::Create,
            _ => Decision::Reopen(issue.key.clone()),
        }
    }
}
