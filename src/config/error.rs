// ABOUTME: Error types for configuration loading and validation
// ABOUTME: Reports missing receiver fields, bad values and template compilation failures

use std::path::PathBuf;
use thiserror::Error;

use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Missing {field} for receiver {receiver:?} (set it on the receiver or in defaults)")]
    MissingField {
        receiver: String,
        field: &'static str,
    },

    #[error("Invalid {field} for receiver {receiver:?}: {message}")]
    InvalidValue {
        receiver: String,
        field: &'static str,
        message: String,
    },

    #[error("Duplicate receiver name: {0}")]
    DuplicateReceiver(String),

    #[error("Configuration defines no receivers")]
    NoReceivers,

    #[error("Invalid template in {field} for receiver {receiver:?}: {source}")]
    InvalidTemplate {
        receiver: String,
        field: &'static str,
        #[source]
        source: TemplateError,
    },

    #[error("Template error: {0}")]
    TemplateError(#[from] TemplateError),

    #[error("Invalid environment variable {var}: {message}")]
    EnvError { var: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
