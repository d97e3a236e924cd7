//! Hand-editable text format.
//!
//! ```text
//! # Primary demand of coal, in
//! # physical units.
//!
//! - unit = kg
//! - tags = energy, coal
//!
//! SUM(V(coal, demand))
//! ```
//!
//! - **Comment block**: leading `#` lines hold the comment attribute
//!   (`description` by default).
//! - **Pairs**: `- name = value`. A value spanning several lines continues on
//!   lines indented by two spaces.
//! - **Body**: whatever follows the pairs holds the body attribute (`query`
//!   by default). A body whose first line is blank or starts with `#`, `- `
//!   or `\` is written with one leading `\`, which parsing removes. An empty
//!   body is a lone `\`, an empty comment a lone `#`.
//!
//! Sections are separated by one blank line, and a non-empty file ends with
//! a newline. Comment and body text lose trailing whitespace on parse.

use crate::attributes::{find_spec, AttrValue, AttributeKind, AttributeSpec, AttributeStore};

use super::{Format, FormatError};

const CONTINUATION: &str = "  ";
const ESCAPE: char = '\\';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFormat {
    comment_attribute: Option<String>,
    body_attribute: Option<String>,
}

impl Default for TextFormat {
    fn default() -> Self {
        Self {
            comment_attribute: Some("description".to_string()),
            body_attribute: Some("query".to_string()),
        }
    }
}

impl TextFormat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute stored in the `#` comment block, or `None` to ignore comments.
    pub fn with_comment_attribute(mut self, name: Option<&str>) -> Self {
        self.comment_attribute = name.map(str::to_string);
        self
    }

    /// Attribute stored in the trailing body, or `None` to forbid a body.
    pub fn with_body_attribute(mut self, name: Option<&str>) -> Self {
        self.body_attribute = name.map(str::to_string);
        self
    }

    fn is_comment(&self, name: &str) -> bool {
        self.comment_attribute.as_deref() == Some(name)
    }

    fn is_body(&self, name: &str) -> bool {
        self.body_attribute.as_deref() == Some(name)
    }
}

impl Format for TextFormat {
    fn name(&self) -> &'static str {
        "text"
    }

    fn render(&self, attributes: &AttributeStore) -> String {
        let mut sections: Vec<String> = Vec::new();

        if let Some(comment) = self
            .comment_attribute
            .as_deref()
            .and_then(|name| attributes.get(name))
        {
            let block: Vec<String> = comment
                .render_text()
                .lines()
                .map(|line| {
                    if line.is_empty() {
                        "#".to_string()
                    } else {
                        format!("# {}", line)
                    }
                })
                .collect();
            if block.is_empty() {
                sections.push("#".to_string());
            } else {
                sections.push(block.join("\n"));
            }
        }

        let pairs: Vec<String> = attributes
            .iter()
            .filter(|(name, _)| !self.is_comment(name) && !self.is_body(name))
            .map(|(name, value)| render_pair(name, value))
            .collect();
        if !pairs.is_empty() {
            sections.push(pairs.join("\n"));
        }

        if let Some(body) = self
            .body_attribute
            .as_deref()
            .and_then(|name| attributes.get(name))
        {
            sections.push(escape_body(body.render_text().trim_end()));
        }

        if sections.is_empty() {
            return String::new();
        }
        let mut out = sections.join("\n\n");
        out.push('\n');
        out
    }

    fn parse(&self, content: &str, schema: &[AttributeSpec]) -> Result<AttributeStore, FormatError> {
        let mut comment_lines: Vec<&str> = Vec::new();
        let mut pairs: Vec<(usize, String, String)> = Vec::new();
        let mut body_lines: Vec<&str> = Vec::new();
        let mut body_start: Option<usize> = None;
        let mut last_was_pair = false;

        for (index, line) in content.lines().enumerate() {
            let line_no = index + 1;

            if body_start.is_some() {
                body_lines.push(line);
                continue;
            }

            if line.starts_with('#') && pairs.is_empty() {
                let text = line[1..].strip_prefix(' ').unwrap_or(&line[1..]);
                comment_lines.push(text);
                last_was_pair = false;
            } else if let Some(pair) = line.strip_prefix("- ") {
                let (name, value) = pair.split_once('=').ok_or_else(|| {
                    FormatError::at_line(line_no, "expected `- name = value`")
                })?;
                let name = name.trim();
                if name.is_empty() {
                    return Err(FormatError::at_line(line_no, "attribute name is empty"));
                }
                pairs.push((line_no, name.to_string(), value.trim().to_string()));
                last_was_pair = true;
            } else if last_was_pair && line.starts_with(CONTINUATION) {
                if let Some((_, _, value)) = pairs.last_mut() {
                    value.push('\n');
                    value.push_str(&line[CONTINUATION.len()..]);
                }
            } else if line.trim().is_empty() {
                last_was_pair = false;
            } else {
                body_start = Some(line_no);
                body_lines.push(line);
            }
        }

        let mut store = AttributeStore::new();

        if !comment_lines.is_empty() {
            if let Some(name) = &self.comment_attribute {
                let text = comment_lines.join("\n");
                insert(&mut store, schema, name, text.trim_end(), None)?;
            }
        }

        for (line_no, name, raw) in pairs {
            if store.contains(&name) {
                return Err(FormatError::at_line(
                    line_no,
                    format!("attribute `{}` is set twice", name),
                ));
            }
            insert(&mut store, schema, &name, &raw, Some(line_no))?;
        }

        if let Some(line_no) = body_start {
            let name = self.body_attribute.as_ref().ok_or_else(|| {
                FormatError::at_line(line_no, "unexpected content after attributes")
            })?;
            let text = body_lines.join("\n");
            let text = text.strip_prefix(ESCAPE).unwrap_or(&text);
            insert(&mut store, schema, name, text.trim_end(), Some(line_no))?;
        }

        Ok(store)
    }
}

/// Prefixes the body with `\` when its first line would otherwise parse as
/// a comment, a pair or a section break. An empty body becomes a lone `\`.
fn escape_body(text: &str) -> String {
    let first = text.lines().next().unwrap_or_default();
    let ambiguous = first.trim().is_empty()
        || first.starts_with('#')
        || first.starts_with("- ")
        || first.starts_with(ESCAPE);
    if ambiguous {
        format!("{}{}", ESCAPE, text)
    } else {
        text.to_string()
    }
}

fn render_pair(name: &str, value: &AttrValue) -> String {
    let text = value.render_text();
    let mut lines = text.split('\n');
    let mut out = format!("- {} = {}", name, lines.next().unwrap_or_default());
    for line in lines {
        out.push('\n');
        out.push_str(CONTINUATION);
        out.push_str(line);
    }
    out
}

fn insert(
    store: &mut AttributeStore,
    schema: &[AttributeSpec],
    name: &str,
    raw: &str,
    line: Option<usize>,
) -> Result<(), FormatError> {
    let located = |message: String| match line {
        Some(line) => FormatError::at_line(line, message),
        None => FormatError::new(message),
    };
    let spec = find_spec(schema, name)
        .ok_or_else(|| located(format!("unknown attribute `{}`", name)))?;
    let value = match spec.kind {
        AttributeKind::Text => AttrValue::Text(raw.to_string()),
        kind => AttrValue::parse_text(raw, kind)
            .map_err(|e| located(format!("attribute `{}`: {}", name, e)))?,
    };
    store.insert(name, value);
    Ok(())
}
