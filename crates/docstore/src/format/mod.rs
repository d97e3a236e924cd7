//! # File Formats
//!
//! A [`Format`] turns an [`AttributeStore`] into file content and back. The
//! store never looks inside the content: it renders, compares bytes, writes,
//! reads and parses, and each document type picks the format it is stored in.
//!
//! ## Contract
//!
//! - `render` only sees set attributes, in assignment order.
//! - `render` is deterministic: the same attributes always produce the same
//!   bytes. Saving relies on this to skip writes when nothing changed.
//! - `parse` coerces values by the declared [`AttributeSpec`]s and rejects
//!   undeclared attributes.
//!
//! ## Implementations
//!
//! - [`TextFormat`]: comment header, `- name = value` pairs, free-form body.
//!   The default, meant to be edited by hand.
//! - [`JsonFormat`]: a pretty-printed JSON object.

use std::fmt::Debug;

use thiserror::Error;

use crate::attributes::{AttributeSpec, AttributeStore};

mod json;
mod text;

pub use json::JsonFormat;
pub use text::TextFormat;

/// Why file content could not be turned into attributes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}{message}", .line.map(|l| format!("line {}: ", l)).unwrap_or_default())]
pub struct FormatError {
    /// 1-based line number, when the format can tell.
    pub line: Option<usize>,
    pub message: String,
}

impl FormatError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
        }
    }

    pub fn at_line(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            message: message.into(),
        }
    }
}

/// Render/parse strategy for one document type.
pub trait Format: Debug + Send + Sync {
    /// Short name used in diagnostics (e.g. `"text"`).
    fn name(&self) -> &'static str;

    /// Renders the set attributes of `attributes`.
    fn render(&self, attributes: &AttributeStore) -> String;

    /// Parses file content into attributes declared in `schema`.
    fn parse(&self, content: &str, schema: &[AttributeSpec]) -> Result<AttributeStore, FormatError>;
}
