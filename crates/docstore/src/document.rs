//! # Documents
//!
//! A [`Document`] is one record of a registered type: a key, the
//! sub-directories it lives in, and its attributes. Documents are plain
//! in-memory values. Nothing in this module touches the disk; loading,
//! saving and destroying go through [`crate::store::DocumentStore`].
//!
//! ## Identity
//!
//! A document is identified by its concrete type, sub-directories and key.
//! Its file path is never stored, it is recomputed from those three on
//! demand, so changing the key changes the path immediately (in memory) and
//! the file follows on the next save.
//!
//! The path the document was last read from or written to is remembered
//! separately as the *persisted path*. When it differs from the current
//! path at save time, the store moves the document by writing the new file
//! and removing the old one.

use std::fmt;
use std::sync::Arc;

use crate::attributes::{AttrValue, AttributeStore};
use crate::error::{DocstoreError, Result};
use crate::paths::{self, NormalizedPath};
use crate::registry::DocumentType;

#[derive(Clone)]
pub struct Document {
    doc_type: Arc<DocumentType>,
    location: NormalizedPath,
    attributes: AttributeStore,
    persisted_path: Option<String>,
}

impl Document {
    /// Creates an in-memory document. `key_or_path` may be a bare key, a key
    /// with sub-directories, or a relative file name.
    pub fn new(doc_type: Arc<DocumentType>, key_or_path: &str) -> Result<Self> {
        let location = paths::normalize(key_or_path, doc_type.layout())?;
        Ok(Self {
            doc_type,
            location,
            attributes: AttributeStore::new(),
            persisted_path: None,
        })
    }

    /// Creates an in-memory document and assigns `attributes` in order.
    pub fn with_attributes<I, K>(
        doc_type: Arc<DocumentType>,
        key_or_path: &str,
        attributes: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, AttrValue)>,
        K: AsRef<str>,
    {
        let mut document = Self::new(doc_type, key_or_path)?;
        for (name, value) in attributes {
            document.set(name.as_ref(), value)?;
        }
        Ok(document)
    }

    /// A document read from `persisted_path`.
    pub(crate) fn loaded(
        doc_type: Arc<DocumentType>,
        location: NormalizedPath,
        attributes: AttributeStore,
        persisted_path: String,
    ) -> Self {
        Self {
            doc_type,
            location,
            attributes,
            persisted_path: Some(persisted_path),
        }
    }

    pub fn document_type(&self) -> &Arc<DocumentType> {
        &self.doc_type
    }

    pub fn type_name(&self) -> &str {
        self.doc_type.name()
    }

    pub fn key(&self) -> &str {
        &self.location.key
    }

    pub fn sub_dirs(&self) -> &[String] {
        &self.location.sub_dirs
    }

    /// Replaces the key. Sub-directories and the subclass suffix are kept.
    /// Only the in-memory path changes; the file moves on the next save.
    pub fn set_key(&mut self, key: &str) -> Result<()> {
        paths::validate_key(key, self.doc_type.layout())?;
        self.location.key = key.to_string();
        Ok(())
    }

    /// Canonical path relative to the store root.
    pub fn relative_path(&self) -> String {
        self.location.relative_path(self.doc_type.layout())
    }

    /// Relative path of the file backing this document, if it has one.
    pub fn persisted_path(&self) -> Option<&str> {
        self.persisted_path.as_deref()
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted_path.is_some()
    }

    /// True when the current path differs from the file on disk.
    pub fn is_moved(&self) -> bool {
        self.persisted_path
            .as_deref()
            .is_some_and(|p| p != self.relative_path())
    }

    pub(crate) fn mark_persisted(&mut self, path: String) {
        self.persisted_path = Some(path);
    }

    pub(crate) fn clear_persisted(&mut self) {
        self.persisted_path = None;
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_text)
    }

    pub fn get_integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(AttrValue::as_integer)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttrValue::as_float)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(AttrValue::as_bool)
    }

    pub fn get_list(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(AttrValue::as_list)
    }

    /// Assigns a declared attribute. Fails if `name` is not declared for this
    /// type or `value` is of the wrong kind; the document is left unchanged.
    pub fn set(&mut self, name: &str, value: impl Into<AttrValue>) -> Result<Option<AttrValue>> {
        let value = value.into();
        let spec = self.doc_type.attribute(name).ok_or_else(|| {
            DocstoreError::attribute(
                name,
                format!("not declared for {}", self.doc_type.name()),
            )
        })?;
        if spec.kind != value.kind() {
            return Err(DocstoreError::attribute(
                name,
                format!("expected {}, got {}", spec.kind, value.kind()),
            ));
        }
        Ok(self.attributes.insert(name, value))
    }

    /// Builder form of [`Document::set`].
    pub fn with(mut self, name: &str, value: impl Into<AttrValue>) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Makes an attribute absent again.
    pub fn unset(&mut self, name: &str) -> Option<AttrValue> {
        self.attributes.remove(name)
    }

    /// Exactly the attributes that were assigned, in assignment order.
    pub fn to_hash(&self) -> Vec<(String, AttrValue)> {
        self.attributes.to_export_mapping()
    }

    /// The content a save would write right now.
    pub fn file_contents(&self) -> String {
        self.doc_type.format().render(&self.attributes)
    }

    /// Failure reasons from every validator of the type.
    pub fn validation_errors(&self) -> Vec<String> {
        self.doc_type
            .validators()
            .iter()
            .flat_map(|validator| validator.validate(self))
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.doc_type.name(), self.location.key)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("type", &self.doc_type.name())
            .field("key", &self.location.key)
            .field("path", &self.relative_path())
            .field("persisted_path", &self.persisted_path)
            .field("attributes", &self.attributes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeKind;
    use crate::registry::{DocumentTypeDef, Registry};
    use crate::validation::Presence;

    fn registry() -> Registry {
        Registry::builder()
            .register(
                DocumentTypeDef::new("SomeDocument")
                    .directory("some_documents")
                    .file_suffix("suffix")
                    .attribute("description", AttributeKind::Text)
                    .attribute("unit", AttributeKind::Text)
                    .attribute("query", AttributeKind::Text)
                    .attribute("do_validation", AttributeKind::Bool)
                    .validator(Presence::of(["query"]).when("do_validation")),
            )
            .register(DocumentTypeDef::new("OtherDocument").parent("SomeDocument"))
            .build()
            .unwrap()
    }

    fn some_document(key: &str) -> Document {
        let registry = registry();
        Document::new(Arc::clone(registry.get("SomeDocument").unwrap()), key).unwrap()
    }

    #[test]
    fn new_with_dumb_key() {
        let doc = some_document("key");
        assert_eq!(doc.key(), "key");
        assert_eq!(doc.relative_path(), "some_documents/key.suffix");
        assert!(!doc.is_persisted());
    }

    #[test]
    fn new_with_file_path_keeps_folder() {
        let doc = some_document("my_map1/new");
        assert_eq!(doc.key(), "new");
        assert!(doc.relative_path().contains("my_map1/new"));
    }

    #[test]
    fn new_rejects_absolute_path() {
        let registry = registry();
        let doc_type = Arc::clone(registry.get("SomeDocument").unwrap());
        let err = Document::new(doc_type, "/some_documents/foo.suffix").unwrap_err();
        assert!(matches!(err, DocstoreError::InvalidKey { .. }));
    }

    #[test]
    fn to_hash_is_empty_when_nothing_set() {
        assert!(some_document("a").to_hash().is_empty());
    }

    #[test]
    fn to_hash_contains_set_attributes_only() {
        let registry = registry();
        let doc = Document::with_attributes(
            Arc::clone(registry.get("SomeDocument").unwrap()),
            "a",
            [("unit", AttrValue::from("%")), ("description", AttrValue::from("Mine"))],
        )
        .unwrap();

        // Reading an unset attribute does not make it present.
        assert_eq!(doc.get("query"), None);

        let hash = doc.to_hash();
        assert_eq!(
            hash,
            vec![
                ("unit".to_string(), AttrValue::from("%")),
                ("description".to_string(), AttrValue::from("Mine")),
            ]
        );
    }

    #[test]
    fn set_rejects_undeclared_and_mistyped() {
        let mut doc = some_document("a");
        assert!(matches!(
            doc.set("colour", "blue"),
            Err(DocstoreError::Attribute { .. })
        ));
        assert!(doc.set("unit", 3_i64).is_err());
        assert!(doc.to_hash().is_empty());
    }

    #[test]
    fn unset_removes_from_hash() {
        let mut doc = some_document("a").with("unit", "kg").unwrap();
        assert_eq!(doc.unset("unit"), Some(AttrValue::from("kg")));
        assert!(doc.to_hash().is_empty());
    }

    #[test]
    fn set_key_changes_path_only_in_memory() {
        let mut doc = some_document("foo");
        doc.mark_persisted(doc.relative_path());
        doc.set_key("total_co2_emitted").unwrap();
        assert_eq!(doc.key(), "total_co2_emitted");
        assert!(doc.relative_path().contains("total_co2_emitted"));
        assert!(doc.is_moved());
        assert_eq!(doc.persisted_path(), Some("some_documents/foo.suffix"));
    }

    #[test]
    fn set_key_rejects_empty_without_mutating() {
        let mut doc = some_document("foo");
        assert!(doc.set_key("").is_err());
        assert!(doc.set_key("a/b").is_err());
        assert_eq!(doc.key(), "foo");
    }

    #[test]
    fn set_key_keeps_subclass_suffix_and_folder() {
        let registry = registry();
        let doc_type = Arc::clone(registry.get("OtherDocument").unwrap());
        let mut doc = Document::new(doc_type, "nested/fd.other_document.suffix").unwrap();
        assert_eq!(doc.key(), "fd");
        doc.set_key("pd").unwrap();
        assert_eq!(doc.key(), "pd");
        assert_eq!(
            doc.relative_path(),
            "some_documents/nested/pd.other_document.suffix"
        );
    }

    #[test]
    fn validation_is_conditional() {
        let mut doc = some_document("key");
        assert!(doc.is_valid());

        doc.set("do_validation", true).unwrap();
        assert!(!doc.is_valid());
        assert_eq!(doc.validation_errors(), vec!["query can't be blank"]);

        doc.set("query", "MAX(0, 0)").unwrap();
        assert!(doc.is_valid());
    }

    #[test]
    fn subtype_inherits_validators() {
        let registry = registry();
        let doc_type = Arc::clone(registry.get("OtherDocument").unwrap());
        let doc = Document::new(doc_type, "x")
            .unwrap()
            .with("do_validation", true)
            .unwrap();
        assert!(!doc.is_valid());
    }

    #[test]
    fn closure_validators() {
        let registry = Registry::builder()
            .register(
                DocumentTypeDef::new("Doc")
                    .directory("docs")
                    .file_suffix("d")
                    .attribute("unit", AttributeKind::Text)
                    .validator(|doc: &Document| {
                        if doc.get_text("unit") == Some("furlong") {
                            vec!["unit is not metric".to_string()]
                        } else {
                            Vec::new()
                        }
                    }),
            )
            .build()
            .unwrap();
        let doc_type = Arc::clone(registry.get("Doc").unwrap());
        let doc = Document::new(doc_type, "a").unwrap();
        assert!(doc.is_valid());
        assert!(!doc.with("unit", "furlong").unwrap().is_valid());
    }

    #[test]
    fn display_contains_type_and_key() {
        let doc = some_document("foo");
        let shown = doc.to_string();
        assert!(shown.contains("SomeDocument"));
        assert!(shown.contains("foo"));
    }

    #[test]
    fn file_contents_changes_with_attributes() {
        let mut doc = some_document("foo").with("unit", "kg").unwrap();
        let before = doc.file_contents();
        assert_eq!(before, doc.file_contents());
        doc.set("unit", "Mtonne").unwrap();
        assert_ne!(before, doc.file_contents());
    }
}
