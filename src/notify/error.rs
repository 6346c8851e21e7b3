// ABOUTME: Error types for a single notification run
// ABOUTME: Carries the retryable flag and the context the boundary layer logs

use thiserror::Error;

use crate::template::TemplateError;
use crate::tracker::TrackerError;

#[derive(Error, Debug)]
pub enum NotifyError {
    /// A template failed before any tracker call was made
    #[error("Failed to render {field}: {source}")]
    Render {
        field: &'static str,
        #[source]
        source: TemplateError,
    },

    #[error("Tracker state {state:?} does not exist or no transition possible for {issue_key}")]
    MissingTransition { state: String, issue_key: String },

    #[error("Search {query:?} failed: {source}")]
    Search {
        query: String,
        #[source]
        source: TrackerError,
    },

    #[error("Reopening {issue_key} failed: {source}")]
    Transition {
        issue_key: String,
        #[source]
        source: TrackerError,
    },

    #[error("Creating issue in project {project} failed: {source}")]
    Create {
        project: String,
        #[source]
        source: TrackerError,
    },
}

impl NotifyError {
    pub fn render(field: &'static str) -> impl FnOnce(TemplateError) -> Self {
        move |source| NotifyError::Render { field, source }
    }

    /// Whether redelivering the same notification could succeed
    pub fn is_retryable(&self) -> bool {
        self.tracker_error()
            .map(TrackerError::is_retryable)
            .unwrap_or(false)
    }

    pub fn tracker_error(&self) -> Option<&TrackerError> {
        match self {
            NotifyError::Search { source, .. }
            | NotifyError::Transition { source, .. }
            | NotifyError::Create { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.tracker_error()
            .and_then(TrackerError::status)
            .map(|s| s.as_u16())
    }

    pub fn issue_key(&self) -> Option<&str> {
        match self {
            NotifyError::MissingTransition { issue_key, .. }
            | NotifyError::Transition { issue_key, .. } => Some(issue_key),
            _ => None,
        }
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            NotifyError::Search { query, .. } => Some(query),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, NotifyError>;
