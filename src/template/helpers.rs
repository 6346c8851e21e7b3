// ABOUTME: Handlebars helper functions for ticket templates
// ABOUTME: Case conversion, label joining, fallbacks and alert timestamp formatting

use chrono::{DateTime, Utc};
use handlebars::{
    handlebars_helper, Context, Handlebars, Helper, HelperResult, Output, RenderContext,
    RenderError,
};
use serde_json::Value as JsonValue;

const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

handlebars_helper!(upper: |s: str| s.to_uppercase());
handlebars_helper!(lower: |s: str| s.to_lowercase());

fn param<'a>(h: &'a Helper, index: usize) -> Option<&'a JsonValue> {
    h.param(index).map(|p| p.value())
}

fn text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `{{join ", " GroupLabels}}`: array items or map values, map values in key order
fn join(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let separator = param(h, 0).and_then(JsonValue::as_str).unwrap_or(",");

    let parts: Vec<String> = match param(h, 1) {
        Some(JsonValue::Array(items)) => items.iter().map(text).collect(),
        Some(JsonValue::Object(map)) => map.values().map(text).collect(),
        Some(JsonValue::Null) | None => Vec::new(),
        Some(other) => {
            return Err(RenderError::new(format!(
                "join: expected a list or map, got {}",
                other
            )))
        }
    };

    out.write(&parts.join(separator))?;
    Ok(())
}

/// `{{default CommonAnnotations.runbook "none"}}`: the fallback when the value is missing or empty
fn default(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let fallback = param(h, 1)
        .map(text)
        .ok_or_else(|| RenderError::new("default: missing fallback value"))?;

    let value = param(h, 0).map(text).unwrap_or_default();
    out.write(if value.is_empty() { &fallback } else { &value })?;
    Ok(())
}

/// `{{format_time StartsAt "%H:%M"}}` for RFC 3339 alert timestamps. Missing
/// times render as nothing.
fn format_time(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let raw = match param(h, 0) {
        Some(JsonValue::String(s)) => s.as_str(),
        Some(JsonValue::Null) | None => return Ok(()),
        Some(other) => {
            return Err(RenderError::new(format!(
                "format_time: expected a timestamp, got {}",
                other
            )))
        }
    };
    let format = param(h, 1)
        .and_then(JsonValue::as_str)
        .unwrap_or(DEFAULT_TIME_FORMAT);

    let time: DateTime<Utc> = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| RenderError::new(format!("format_time: {:?}: {}", raw, e)))?
        .with_timezone(&Utc);

    out.write(&time.format(format).to_string())?;
    Ok(())
}

pub fn register_helpers(handlebars: &mut Handlebars) {
    handlebars.register_helper("upper", Box::new(upper));
    handlebars.register_helper("lower", Box::new(lower));
    handlebars.register_helper("join", Box::new(join));
    handlebars.register_helper("default", Box::new(default));
    handlebars.register_helper("format_time", Box::new(format_time));
}
