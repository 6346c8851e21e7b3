// ABOUTME: Main template engine implementation using Handlebars
// ABOUTME: Renders named or inline templates against an alert context, compiling each once

use handlebars::Handlebars;
use std::path::Path;

use super::context::TemplateContext;
use super::error::{Result, TemplateError};
use super::helpers;

/// Compiled template set. Immutable after construction and shared across
/// concurrent notifications.
#[derive(Clone)]
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with all built-in helpers
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        handlebars.set_strict_mode(false);
        handlebars.set_dev_mode(false);

        // Ticket text is plain text, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        helpers::register_helpers(&mut handlebars);

        Self { handlebars }
    }

    /// Load template files, each registered under its file stem
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut engine = Self::new();
        for path in paths {
            let path = path.as_ref();
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| TemplateError::LoadError {
                    path: path.to_path_buf(),
                    message: "file name is not valid UTF-8".to_string(),
                })?
                .to_string();
            engine.register_template_file(&name, path)?;
        }
        Ok(engine)
    }

    pub fn register_template_file(&mut self, name: &str, path: &Path) -> Result<()> {
        self.handlebars
            .register_template_file(name, path)
            .map_err(|e| TemplateError::LoadError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    pub fn register_template_string(&mut self, name: &str, source: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, source)
            .map_err(|e| TemplateError::SyntaxError(e.to_string()))
    }

    /// Compile an inline template ahead of time so later renders reuse it.
    /// The text doubles as its own registry key.
    pub fn precompile(&mut self, text: &str) -> Result<()> {
        if self.has_template(text) {
            return Ok(());
        }
        self.register_template_string(text, text)
    }

    /// Render a registered template by name, or `text` itself as an inline template
    pub fn execute(&self, text: &str, context: &TemplateContext) -> Result<String> {
        if self.has_template(text) {
            self.handlebars
                .render(text, context.as_json())
                .map_err(TemplateError::RenderError)
        } else {
            self.handlebars
                .render_template(text, context.as_json())
                .map_err(TemplateError::RenderError)
        }
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}
