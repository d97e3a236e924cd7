//! Attribute declarations.
//!
//! Each document type declares the attributes it can hold. The declaration
//! is what lets a format turn `"42"` into an integer for one attribute and
//! keep it as text for another.

use std::fmt;

/// The kind of value an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Free text (e.g., `description`, `unit`, `query`)
    Text,

    /// Signed 64-bit integer
    Integer,

    /// 64-bit float
    Float,

    /// Simple true/false
    Bool,

    /// List of strings
    List,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeKind::Text => "text",
            AttributeKind::Integer => "integer",
            AttributeKind::Float => "float",
            AttributeKind::Bool => "bool",
            AttributeKind::List => "list",
        };
        f.write_str(name)
    }
}

/// Declaration of a single attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpec {
    /// The attribute name as it appears in files and in the API
    pub name: String,

    /// The kind of value this attribute holds
    pub kind: AttributeKind,
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Text)
    }
}

/// Look up a declaration by name.
pub fn find_spec<'a>(specs: &'a [AttributeSpec], name: &str) -> Option<&'a AttributeSpec> {
    specs.iter().find(|spec| spec.name == name)
}
