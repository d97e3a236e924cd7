//! Attribute value types.
//!
//! [`AttrValue`] is the runtime representation of everything a document can
//! hold. Conversion to and from file content is driven by the declared
//! [`AttributeKind`], never by guessing from the text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::spec::AttributeKind;

/// Runtime representation of an attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl AttrValue {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttrValue::Bool(_) => AttributeKind::Bool,
            AttrValue::Integer(_) => AttributeKind::Integer,
            AttrValue::Float(_) => AttributeKind::Float,
            AttrValue::Text(_) => AttributeKind::Text,
            AttrValue::List(_) => AttributeKind::List,
        }
    }

    /// Check if this value counts as "present" for validation and conditions.
    ///
    /// - Bool: the boolean value itself
    /// - Text: true if it has non-whitespace content
    /// - List: true if non-empty
    /// - Integer / Float: always true
    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Bool(v) => *v,
            AttrValue::Text(v) => !v.trim().is_empty(),
            AttrValue::List(v) => !v.is_empty(),
            AttrValue::Integer(_) | AttrValue::Float(_) => true,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttrValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AttrValue::List(v) => Some(v),
            _ => None,
        }
    }

    /// Plain-text rendering used by the text format.
    ///
    /// Lists are comma separated, floats use the shortest representation
    /// that parses back to the same value.
    pub fn render_text(&self) -> String {
        match self {
            AttrValue::Bool(v) => v.to_string(),
            AttrValue::Integer(v) => v.to_string(),
            AttrValue::Float(v) => v.to_string(),
            AttrValue::Text(v) => v.clone(),
            AttrValue::List(v) => v.join(", "),
        }
    }

    /// Parses plain text as a value of `kind`.
    pub fn parse_text(raw: &str, kind: AttributeKind) -> Result<Self, String> {
        match kind {
            AttributeKind::Text => Ok(AttrValue::Text(raw.to_string())),
            AttributeKind::Bool => match raw.trim() {
                "true" => Ok(AttrValue::Bool(true)),
                "false" => Ok(AttrValue::Bool(false)),
                other => Err(format!("expected true or false, found {:?}", other)),
            },
            AttributeKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(AttrValue::Integer)
                .map_err(|e| format!("invalid integer {:?}: {}", raw.trim(), e)),
            AttributeKind::Float => raw
                .trim()
                .parse::<f64>()
                .map(AttrValue::Float)
                .map_err(|e| format!("invalid number {:?}: {}", raw.trim(), e)),
            AttributeKind::List => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(AttrValue::List(Vec::new()));
                }
                Ok(AttrValue::List(
                    trimmed.split(',').map(|s| s.trim().to_string()).collect(),
                ))
            }
        }
    }

    /// JSON rendering. Non-finite floats have no JSON form and become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            AttrValue::Bool(v) => Value::Bool(*v),
            AttrValue::Integer(v) => Value::from(*v),
            AttrValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            AttrValue::Text(v) => Value::String(v.clone()),
            AttrValue::List(v) => Value::Array(v.iter().cloned().map(Value::String).collect()),
        }
    }

    /// Reads a JSON value as `kind`. Integers are accepted for float attributes.
    pub fn from_json(value: &Value, kind: AttributeKind) -> Result<Self, String> {
        let mismatch = || format!("expected {}, found {}", kind, value);
        match kind {
            AttributeKind::Bool => value.as_bool().map(AttrValue::Bool).ok_or_else(mismatch),
            AttributeKind::Integer => value.as_i64().map(AttrValue::Integer).ok_or_else(mismatch),
            AttributeKind::Float => value.as_f64().map(AttrValue::Float).ok_or_else(mismatch),
            AttributeKind::Text => value
                .as_str()
                .map(|s| AttrValue::Text(s.to_string()))
                .ok_or_else(mismatch),
            AttributeKind::List => {
                let items = value.as_array().ok_or_else(mismatch)?;
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string).ok_or_else(mismatch))
                    .collect::<Result<Vec<_>, _>>()
                    .map(AttrValue::List)
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Integer(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        AttrValue::List(value)
    }
}
