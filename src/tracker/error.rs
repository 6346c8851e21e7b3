// ABOUTME: Error types for issue tracker requests
// ABOUTME: Classifies HTTP failures into retryable and permanent errors

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    /// The tracker answered with a non-2xx status
    #[error("Tracker request {url} returned status {status}, body {body:?}")]
    Status {
        operation: &'static str,
        url: String,
        status: StatusCode,
        body: String,
    },

    /// No response was received
    #[error("Tracker request {operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Tracker response for {operation} could not be decoded: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    #[error("Invalid tracker URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

impl TrackerError {
    /// Only 500 and 503 responses are worth redelivering
    pub fn is_retryable(&self) -> bool {
        match self {
            TrackerError::Status { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TrackerError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn operation(&self) -> Option<&'static str> {
        match self {
            TrackerError::Status { operation, .. }
            | TrackerError::Transport { operation, .. }
            | TrackerError::Decode { operation, .. } => Some(*operation),
            TrackerError::InvalidUrl { .. } => None,
        }
    }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::INTERNAL_SERVER_ERROR || status == StatusCode::SERVICE_UNAVAILABLE
}

pub type Result<T> = std::result::Result<T, TrackerError>;
