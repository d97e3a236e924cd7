use super::backend::StorageBackend;
use super::fs_backend::FsBackend;
use crate::attributes::AttrValue;
use crate::config::StoreConfig;
use crate::document::Document;
use crate::error::{DocstoreError, Result};
use crate::paths::{self, NormalizedPath};
use crate::registry::{DocumentType, Registry};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::sync::Arc;
use tracing::{debug, warn};

/// What a successful [`DocumentStore::save`] did on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveOutcome {
    /// New content was written. False when the file already held the
    /// rendered bytes.
    pub written: bool,
    /// The file at the previous path was deleted after a key change.
    pub removed_stale: bool,
}

pub struct DocumentStore<B: StorageBackend> {
    registry: Arc<Registry>,
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
    check_duplicate_keys: bool,
}

impl DocumentStore<FsBackend> {
    /// A filesystem store rooted at `config.root`.
    pub fn open(registry: Arc<Registry>, config: &StoreConfig) -> Self {
        let backend = FsBackend::new(config.root.clone()).with_atomic_writes(config.atomic_writes);
        Self::with_backend(registry, backend).check_duplicate_keys(config.check_duplicate_keys)
    }
}

impl<B: StorageBackend> DocumentStore<B> {
    pub fn with_backend(registry: Arc<Registry>, backend: B) -> Self {
        Self {
            registry,
            backend,
            check_duplicate_keys: false,
        }
    }

    /// Run [`DocumentStore::check_duplicate_key`] as part of every save.
    pub fn check_duplicate_keys(mut self, enabled: bool) -> Self {
        self.check_duplicate_keys = enabled;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn doc_type(&self, type_name: &str) -> Result<Arc<DocumentType>> {
        self.registry.get(type_name).map(Arc::clone)
    }

    /// An unsaved document of `type_name`. Nothing is read or written.
    pub fn new_document(&self, type_name: &str, key_or_path: &str) -> Result<Document> {
        let document = Document::new(self.doc_type(type_name)?, key_or_path)?;
        self.check_document_owner(&document)?;
        Ok(document)
    }

    pub fn new_document_with<I, K>(
        &self,
        type_name: &str,
        key_or_path: &str,
        attributes: I,
    ) -> Result<Document>
    where
        I: IntoIterator<Item = (K, AttrValue)>,
        K: AsRef<str>,
    {
        let document =
            Document::with_attributes(self.doc_type(type_name)?, key_or_path, attributes)?;
        self.check_document_owner(&document)?;
        Ok(document)
    }

    /// Loads a document by key, key with sub-directories, or file name.
    ///
    /// A bare key that has no file at the top of the type's directory is
    /// looked up in its sub-directories as well.
    pub fn find(&self, type_name: &str, key_or_path: &str) -> Result<Document> {
        let doc_type = self.doc_type(type_name)?;
        let location = paths::normalize(key_or_path, doc_type.layout())?;
        let path = location.relative_path(doc_type.layout());
        self.check_owner(&path, &doc_type, &location.key)?;

        if let Some(content) = self.read(&path)? {
            return self.parse(doc_type, location, path, &content);
        }
        if !location.sub_dirs.is_empty() {
            return Err(DocstoreError::DocumentNotFound(self.backend.location(&path)));
        }

        let mut matches = self.locate_key(&doc_type, &location.key)?;
        match matches.len() {
            0 => Err(DocstoreError::DocumentNotFound(self.backend.location(&path))),
            1 => {
                let found = matches.remove(0);
                self.load(doc_type, found)
            }
            _ => Err(DocstoreError::DuplicateKey {
                key: location.key,
                existing: self.backend.location(&matches[0]),
            }),
        }
    }

    /// Whether [`DocumentStore::find`] would locate a file. The file is not parsed.
    pub fn exists(&self, type_name: &str, key_or_path: &str) -> Result<bool> {
        let doc_type = self.doc_type(type_name)?;
        let location = paths::normalize(key_or_path, doc_type.layout())?;
        let path = location.relative_path(doc_type.layout());
        self.check_owner(&path, &doc_type, &location.key)?;
        if self.backend.exists(&path) {
            return Ok(true);
        }
        if !location.sub_dirs.is_empty() {
            return Ok(false);
        }
        Ok(!self.locate_key(&doc_type, &location.key)?.is_empty())
    }

    /// Persists `document` at its current path.
    ///
    /// Invalid documents are rejected before any I/O. Unchanged content is
    /// not rewritten. After a key change the file at the previous path is
    /// removed; failing to remove it is logged, not returned.
    pub fn save(&self, document: &mut Document) -> Result<SaveOutcome> {
        let errors = document.validation_errors();
        if !errors.is_empty() {
            return Err(DocstoreError::Validation {
                document: document.to_string(),
                errors,
            });
        }
        self.check_document_owner(document)?;
        if self.check_duplicate_keys {
            self.check_duplicate_key(document)?;
        }

        let target = document.relative_path();
        let contents = document.file_contents();
        let mut outcome = SaveOutcome::default();

        let on_disk = self.read(&target)?;
        if on_disk.as_deref() != Some(contents.as_str()) {
            self.backend.write(&target, &contents)?;
            outcome.written = true;
        }

        if let Some(stale) = document.persisted_path().filter(|p| *p != target) {
            match self.backend.delete(stale) {
                Ok(removed) => outcome.removed_stale = removed,
                Err(e) => warn!(
                    error = %e,
                    "saved {} but could not remove previous file {}",
                    target,
                    self.backend.location(stale).display()
                ),
            }
        }

        debug!(
            path = %target,
            written = outcome.written,
            removed_stale = outcome.removed_stale,
            "saved {}",
            document
        );
        document.mark_persisted(target);
        Ok(outcome)
    }

    /// Deletes the file at the document's current path. The in-memory
    /// attributes are left alone.
    pub fn destroy(&self, document: &mut Document) -> Result<()> {
        let path = document.relative_path();
        if !self.backend.delete(&path)? {
            return Err(DocstoreError::DocumentNotFound(self.backend.location(&path)));
        }
        debug!(path = %path, "destroyed {}", document);
        document.clear_persisted();
        Ok(())
    }

    /// Fails with `DuplicateKey` when another file of the same concrete
    /// type already uses the document's key.
    pub fn check_duplicate_key(&self, document: &Document) -> Result<()> {
        let current = document.relative_path();
        let persisted = document.persisted_path();
        let clash = self
            .locate_key(document.document_type(), document.key())?
            .into_iter()
            .find(|path| *path != current && Some(path.as_str()) != persisted);
        match clash {
            Some(path) => Err(DocstoreError::DuplicateKey {
                key: document.key().to_string(),
                existing: self.backend.location(&path),
            }),
            None => Ok(()),
        }
    }

    /// Every stored document of `type_name` and its subtypes, sorted by path.
    pub fn all(&self, type_name: &str) -> Result<Vec<Document>> {
        let mut owned: BTreeMap<String, Arc<DocumentType>> = BTreeMap::new();
        for doc_type in self.registry.descendants(type_name)? {
            for path in self.backend.list(doc_type.directory(), doc_type.file_suffix())? {
                if self.is_owned_by(&path, &doc_type) {
                    owned.entry(path).or_insert_with(|| Arc::clone(&doc_type));
                }
            }
        }
        owned
            .into_iter()
            .map(|(path, doc_type)| self.load(doc_type, path))
            .collect()
    }

    /// A key such as `x.other_document` on a parent type would produce a
    /// file the registry assigns to the subtype.
    fn check_owner(&self, path: &str, doc_type: &DocumentType, key: &str) -> Result<()> {
        if self.is_owned_by(path, doc_type) {
            Ok(())
        } else {
            Err(DocstoreError::invalid_key(
                key,
                "file name would belong to another document type",
            ))
        }
    }

    fn check_document_owner(&self, document: &Document) -> Result<()> {
        self.check_owner(
            &document.relative_path(),
            document.document_type(),
            document.key(),
        )
    }

    fn is_owned_by(&self, path: &str, doc_type: &DocumentType) -> bool {
        self.registry
            .owner_of(path)
            .is_some_and(|owner| owner.name() == doc_type.name())
    }

    /// Paths of files owned by `doc_type` whose key is `key`, anywhere in
    /// the type's directory tree.
    fn locate_key(&self, doc_type: &DocumentType, key: &str) -> Result<Vec<String>> {
        Ok(self
            .backend
            .list(doc_type.directory(), doc_type.file_suffix())?
            .into_iter()
            .filter(|path| self.is_owned_by(path, doc_type))
            .filter(|path| {
                paths::normalize(path, doc_type.layout()).is_ok_and(|found| found.key == key)
            })
            .collect())
    }

    fn read(&self, path: &str) -> Result<Option<String>> {
        self.backend.read(path).map_err(|e| match e {
            DocstoreError::Io(io) if io.kind() == ErrorKind::InvalidData => {
                DocstoreError::MalformedDocument {
                    path: self.backend.location(path),
                    reason: io.to_string(),
                }
            }
            other => other,
        })
    }

    fn load(&self, doc_type: Arc<DocumentType>, path: String) -> Result<Document> {
        let content = self
            .read(&path)?
            .ok_or_else(|| DocstoreError::DocumentNotFound(self.backend.location(&path)))?;
        let location = paths::normalize(&path, doc_type.layout())?;
        self.parse(doc_type, location, path, &content)
    }

    fn parse(
        &self,
        doc_type: Arc<DocumentType>,
        location: NormalizedPath,
        path: String,
        content: &str,
    ) -> Result<Document> {
        let attributes = doc_type
            .format()
            .parse(content, doc_type.attributes())
            .map_err(|e| DocstoreError::MalformedDocument {
                path: self.backend.location(&path),
                reason: e.to_string(),
            })?;
        debug!(path = %path, "loaded {}({})", doc_type.name(), location.key);
        Ok(Document::loaded(doc_type, location, attributes, path))
    }
}
