// ABOUTME: Error types for template engine operations
// ABOUTME: Separates bad template text and unreadable files from render-time failures

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template syntax error: {0}")]
    SyntaxError(String),

    #[error("Failed to load template file {path}: {message}")]
    LoadError { path: PathBuf, message: String },

    /// Raised while rendering, e.g. a helper given the wrong kind of value
    #[error("Render failed: {0}")]
    RenderError(#[from] handlebars::RenderError),
}

pub type Result<T> = std::result::Result<T, TemplateError>;
