// ABOUTME: Template module for rendering receiver configuration against alert data
// ABOUTME: Provides the handlebars engine, alert context and the deep value walker

pub mod context;
pub mod engine;
pub mod error;
pub mod helpers;
pub mod value;

pub use context::TemplateContext;
pub use engine::TemplateEngine;
pub use error::{Result, TemplateError};
pub use value::FieldValue;
