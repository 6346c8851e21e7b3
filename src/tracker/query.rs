// ABOUTME: Builds tracker search queries for alert deduplication
// ABOUTME: Supports hash-marker and label-set strategies, restricted to one project

use sha1::{Digest, Sha1};
use std::fmt::Write;

/// Description marker that identifies the alert group behind an issue
pub const HASH_MARKER: &str = "alert_hash=";

/// First label of every label-deduplicated issue
pub const ALERT_LABEL: &str = "ALERT";

/// Searches never need more than two hits: one to act on, one to notice duplicates.
pub const MAX_RESULTS: u32 = 2;

pub const SEARCH_FIELDS: [&str; 4] = ["summary", "status", "resolution", "resolutiondate"];

/// How existing issues are matched to an alert group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dedup {
    /// Lowercase hex SHA-1 embedded in the description
    Hash(String),
    /// Exact label set
    Labels(Vec<String>),
    /// Project only
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub jql: String,
    pub max_results: u32,
    pub fields: Vec<String>,
}

impl SearchQuery {
    /// Build the query for `project`. A hash always wins over labels.
    pub fn build(project: &str, dedup: &Dedup) -> Self {
        let filter = match dedup {
            Dedup::Hash(hash) => format!(" and description~\"{}{}\"", HASH_MARKER, hash),
            Dedup::Labels(labels) => labels
                .iter()
                .map(|label| format!(" and labels={}", quote(label)))
                .collect::<String>(),
            Dedup::None => String::new(),
        };

        Self {
            jql: format!("project={}{} order by key DESC", project, filter),
            max_results: MAX_RESULTS,
            fields: SEARCH_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Lowercase hex SHA-1 of `text`
pub fn alert_hash(text: &str) -> String {
    hex::encode(Sha1::digest(text.as_bytes()))
}

/// `"ALERT"` followed by the group label values
pub fn dedup_labels(sorted_values: Vec<String>) -> Vec<String> {
    let mut labels = Vec::with_capacity(sorted_values.len() + 1);
    labels.push(ALERT_LABEL.to_string());
    labels.extend(sorted_values);
    labels
}

/// `key="value"`, escaped like a query string literal
pub fn group_label(key: &str, value: &str) -> String {
    format!("{}={}", key, quote(value))
}

/// Double-quoted literal with Go-style escapes: `\n`-style short forms, `\xNN`
/// for other ASCII controls, `\uNNNN`/`\UNNNNNNNN` for non-printing code points
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\u{07}' => quoted.push_str("\\a"),
            '\u{08}' => quoted.push_str("\\b"),
            '\u{0c}' => quoted.push_str("\\f"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{0b}' => quoted.push_str("\\v"),
            c if c < ' ' || c == '\u{7f}' => {
                let _ = write!(quoted, "\\x{:02x}", c as u32);
            }
            c if c.is_control() || (c.is_whitespace() && c != ' ') => {
                let _ = if (c as u32) <= 0xffff {
                    write!(quoted, "\\u{:04x}", c as u32)
                } else {
                    write!(quoted, "\\U{:08x}", c as u32)
                };
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
