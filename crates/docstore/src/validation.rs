//! Validation hooks.
//!
//! Saving asks the document type's validators for failure reasons and refuses
//! to touch the disk when there are any. The rule engine itself is up to the
//! application: any `Fn(&Document) -> Vec<String>` is a [`Validator`], and
//! [`Presence`] covers the common "these attributes are required" case.

use crate::document::Document;

/// A validation rule. Returns human-readable failure reasons, empty when the
/// document is valid.
pub trait Validator: Send + Sync {
    fn validate(&self, document: &Document) -> Vec<String>;
}

impl<F> Validator for F
where
    F: Fn(&Document) -> Vec<String> + Send + Sync,
{
    fn validate(&self, document: &Document) -> Vec<String> {
        self(document)
    }
}

/// Requires attributes to be set and non-blank.
///
/// With [`Presence::when`], the rule only applies while the named flag
/// attribute is set to something truthy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    attributes: Vec<String>,
    condition: Option<String>,
}

impl Presence {
    pub fn of<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attributes: attributes.into_iter().map(Into::into).collect(),
            condition: None,
        }
    }

    pub fn when(mut self, flag: impl Into<String>) -> Self {
        self.condition = Some(flag.into());
        self
    }
}

impl Validator for Presence {
    fn validate(&self, document: &Document) -> Vec<String> {
        if let Some(flag) = &self.condition {
            let enabled = document.get(flag).is_some_and(|v| v.is_truthy());
            if !enabled {
                return Vec::new();
            }
        }
        self.attributes
            .iter()
            .filter(|name| !document.get(name).is_some_and(|v| v.is_truthy()))
            .map(|name| format!("{} can't be blank", name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttrValue, AttributeKind};
    use crate::registry::{DocumentTypeDef, Registry};
    use std::sync::Arc;

    fn document(pairs: &[(&str, AttrValue)]) -> Document {
        let registry = Registry::builder()
            .register(
                DocumentTypeDef::new("Doc")
                    .directory("docs")
                    .file_suffix("d")
                    .attribute("unit", AttributeKind::Text)
                    .attribute("query", AttributeKind::Text)
                    .attribute("tags", AttributeKind::List)
                    .attribute("strict", AttributeKind::Bool),
            )
            .build()
            .unwrap();
        let doc_type = Arc::clone(registry.get("Doc").unwrap());
        Document::with_attributes(doc_type, "a", pairs.iter().cloned()).unwrap()
    }

    #[test]
    fn presence_reports_every_missing_attribute_in_order() {
        let rule = Presence::of(["unit", "query"]);
        assert_eq!(
            rule.validate(&document(&[])),
            vec!["unit can't be blank", "query can't be blank"]
        );
    }

    #[test]
    fn presence_without_condition_always_applies() {
        let rule = Presence::of(["unit"]);
        assert!(rule
            .validate(&document(&[("unit", AttrValue::from("kg"))]))
            .is_empty());
        assert_eq!(rule.validate(&document(&[])).len(), 1);
    }

    #[test]
    fn blank_values_count_as_missing() {
        let rule = Presence::of(["unit", "tags"]);
        let errors = rule.validate(&document(&[
            ("unit", AttrValue::from("   ")),
            ("tags", AttrValue::List(Vec::new())),
        ]));
        assert_eq!(errors, vec!["unit can't be blank", "tags can't be blank"]);
    }

    #[test]
    fn condition_must_be_truthy() {
        let rule = Presence::of(["query"]).when("strict");
        assert!(rule.validate(&document(&[])).is_empty());
        assert!(rule
            .validate(&document(&[("strict", AttrValue::Bool(false))]))
            .is_empty());
        assert_eq!(
            rule.validate(&document(&[("strict", AttrValue::Bool(true))])),
            vec!["query can't be blank"]
        );
    }

    #[test]
    fn closures_are_validators() {
        let rule = |doc: &Document| -> Vec<String> {
            match doc.get_text("unit") {
                Some("furlong") => vec!["unit is not metric".to_string()],
                _ => Vec::new(),
            }
        };
        assert!(rule.validate(&document(&[])).is_empty());
        assert_eq!(
            rule.validate(&document(&[("unit", AttrValue::from("furlong"))])),
            vec!["unit is not metric"]
        );
    }
}
