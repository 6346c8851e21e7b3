// ABOUTME: Tagged value tree for custom issue fields and its recursive template walk
// ABOUTME: Renders every string leaf and map key, normalizing mappings to string keys

use serde::{Deserialize, Deserializer};
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use super::context::TemplateContext;
use super::engine::TemplateEngine;
use super::error::Result;

/// Arbitrary configuration fragment, as written in the receiver config.
/// Mapping keys may be any value; only string keys survive rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<FieldValue>),
    Mapping(Vec<(FieldValue, FieldValue)>),
}

impl FieldValue {
    /// Render every string in the tree.
    ///
    /// Mapping entries whose key is not a string are dropped. Sequences keep
    /// their order and length, and non-string scalars are copied unchanged.
    /// The first render failure aborts the walk.
    pub fn render(&self, engine: &TemplateEngine, context: &TemplateContext) -> Result<JsonValue> {
        match self {
            FieldValue::Null => Ok(JsonValue::Null),
            FieldValue::Bool(b) => Ok(JsonValue::Bool(*b)),
            FieldValue::Int(i) => Ok(JsonValue::Number((*i).into())),
            FieldValue::Float(f) => Ok(Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null)),
            FieldValue::String(s) => Ok(JsonValue::String(engine.execute(s, context)?)),
            FieldValue::Sequence(items) => {
                let rendered: Result<Vec<JsonValue>> = items
                    .iter()
                    .map(|v| v.render(engine, context))
                    .collect();
                Ok(JsonValue::Array(rendered?))
            }
            FieldValue::Mapping(entries) => {
                let mut rendered = JsonMap::new();
                for (key, value) in entries {
                    let FieldValue::String(key) = key else {
                        continue;
                    };
                    let key = engine.execute(key, context)?;
                    rendered.insert(key, value.render(engine, context)?);
                }
                Ok(JsonValue::Object(rendered))
            }
        }
    }

    /// Every string `render` would touch: keys and values, skipping entries
    /// under non-string keys
    pub fn strings(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_strings(&mut out);
        out
    }

    fn collect_strings<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FieldValue::String(s) => out.push(s),
            FieldValue::Sequence(items) => items.iter().for_each(|v| v.collect_strings(out)),
            FieldValue::Mapping(entries) => {
                for (key, value) in entries {
                    let FieldValue::String(key) = key else {
                        continue;
                    };
                    out.push(key);
                    value.collect_strings(out);
                }
            }
            _ => {}
        }
    }
}

impl From<serde_yaml::Value> for FieldValue {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value as Yaml;

        match value {
            Yaml::Null => FieldValue::Null,
            Yaml::Bool(b) => FieldValue::Bool(b),
            Yaml::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Yaml::String(s) => FieldValue::String(s),
            Yaml::Sequence(items) => {
                FieldValue::Sequence(items.into_iter().map(FieldValue::from).collect())
            }
            Yaml::Mapping(map) => FieldValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (FieldValue::from(k), FieldValue::from(v)))
                    .collect(),
            ),
            Yaml::Tagged(tagged) => FieldValue::from(tagged.value),
        }
    }
}

impl From<&FieldValue> for serde_yaml::Value {
    fn from(value: &FieldValue) -> Self {
        use serde_yaml::Value as Yaml;

        match value {
            FieldValue::Null => Yaml::Null,
            FieldValue::Bool(b) => Yaml::Bool(*b),
            FieldValue::Int(i) => Yaml::Number((*i).into()),
            FieldValue::Float(f) => Yaml::Number((*f).into()),
            FieldValue::String(s) => Yaml::String(s.clone()),
            FieldValue::Sequence(items) => {
                Yaml::Sequence(items.iter().map(serde_yaml::Value::from).collect())
            }
            FieldValue::Mapping(entries) => Yaml::Mapping(
                entries
                    .iter()
                    .map(|(k, v)| (serde_yaml::Value::from(k), serde_yaml::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_yaml::Value::deserialize(deserializer).map(FieldValue::from)
    }
}

impl serde::Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serde_yaml::Value::from(self).serialize(serializer)
    }
}
