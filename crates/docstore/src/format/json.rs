//! JSON object format.

use serde_json::Value;

use crate::attributes::{find_spec, AttrValue, AttributeSpec, AttributeStore};

use super::{Format, FormatError};

/// Pretty-printed JSON object, keys in assignment order, trailing newline.
///
/// `null` members are treated as absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn render(&self, attributes: &AttributeStore) -> String {
        let object = Value::Object(attributes.to_json());
        // Value always serializes.
        let mut out = serde_json::to_string_pretty(&object).unwrap_or_else(|_| "{}".to_string());
        out.push('\n');
        out
    }

    fn parse(&self, content: &str, schema: &[AttributeSpec]) -> Result<AttributeStore, FormatError> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| FormatError::at_line(e.line(), e.to_string()))?;
        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(FormatError::new(format!(
                    "expected a JSON object, found {}",
                    json_type(&other)
                )))
            }
        };

        let mut store = AttributeStore::new();
        for (name, value) in object {
            if value.is_null() {
                continue;
            }
            let spec = find_spec(schema, &name)
                .ok_or_else(|| FormatError::new(format!("unknown attribute `{}`", name)))?;
            let value = AttrValue::from_json(&value, spec.kind)
                .map_err(|e| FormatError::new(format!("attribute `{}`: {}", name, e)))?;
            store.insert(name, value);
        }
        Ok(store)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
