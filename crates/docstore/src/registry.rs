//! # Document Type Registry
//!
//! Document types form a hierarchy: a root type declares where its files
//! live (`directory`, `file_suffix`), and subtypes inherit that slot while
//! adding a subclass suffix to their file names so siblings stay apart:
//!
//! ```text
//! active_document/
//! ├── foo.suffix                    <- SomeDocument  (root)
//! ├── od.other_document.suffix      <- OtherDocument (SomeDocument's child)
//! └── fd.final_document.suffix      <- FinalDocument (OtherDocument's child)
//! ```
//!
//! There is no runtime reflection to discover subtypes, so the hierarchy is
//! declared up front: every type is registered once with a
//! [`DocumentTypeDef`], and [`RegistryBuilder::build`] resolves inheritance
//! into immutable [`DocumentType`]s shared through `Arc`.
//!
//! ## Inheritance
//!
//! | Property | Subtype gets |
//! |----------|--------------|
//! | directory, file suffix | parent's, unless overridden |
//! | subclass suffix | explicit value, else `snake_case(name)` |
//! | attributes | parent's followed by its own |
//! | format | own, else parent's, else [`TextFormat`] |
//! | validators | parent's followed by its own |
//!
//! ## File Ownership
//!
//! Listing a directory yields file names, not types. [`Registry::owner_of`]
//! maps a file back to a type: the deepest matching directory wins, then the
//! longest matching subclass suffix, then the type of that slot without one.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::attributes::{find_spec, AttributeKind, AttributeSpec};
use crate::error::{DocstoreError, Result};
use crate::format::{Format, TextFormat};
use crate::paths::TypeLayout;
use crate::validation::Validator;

/// Declaration of a document type, as written by the application.
#[derive(Clone)]
pub struct DocumentTypeDef {
    name: String,
    parent: Option<String>,
    directory: Option<String>,
    file_suffix: Option<String>,
    subclass_suffix: Option<String>,
    attributes: Vec<AttributeSpec>,
    format: Option<Arc<dyn Format>>,
    validators: Vec<Arc<dyn Validator>>,
}

impl DocumentTypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            directory: None,
            file_suffix: None,
            subclass_suffix: None,
            attributes: Vec::new(),
            format: None,
            validators: Vec::new(),
        }
    }

    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.file_suffix = Some(suffix.into());
        self
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn subclass_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.subclass_suffix = Some(suffix.into());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, kind: AttributeKind) -> Self {
        self.attributes.push(AttributeSpec::new(name, kind));
        self
    }

    pub fn format(mut self, format: impl Format + 'static) -> Self {
        self.format = Some(Arc::new(format));
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }
}

/// A registered, fully resolved document type.
pub struct DocumentType {
    name: String,
    parent: Option<String>,
    layout: TypeLayout,
    attributes: Vec<AttributeSpec>,
    format: Arc<dyn Format>,
    validators: Vec<Arc<dyn Validator>>,
}

impl DocumentType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn layout(&self) -> &TypeLayout {
        &self.layout
    }

    pub fn directory(&self) -> &str {
        self.layout.directory()
    }

    pub fn file_suffix(&self) -> &str {
        self.layout.file_suffix()
    }

    pub fn subclass_suffix(&self) -> Option<&str> {
        self.layout.subclass_suffix()
    }

    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        find_spec(&self.attributes, name)
    }

    pub fn format(&self) -> &dyn Format {
        self.format.as_ref()
    }

    pub fn validators(&self) -> &[Arc<dyn Validator>] {
        &self.validators
    }
}

impl fmt::Debug for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentType")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("layout", &self.layout)
            .field("attributes", &self.attributes)
            .field("format", &self.format.name())
            .field("validators", &self.validators.len())
            .finish()
    }
}

impl PartialEq for DocumentType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for DocumentType {}

/// Collects declarations; [`RegistryBuilder::build`] validates and resolves them.
#[derive(Default)]
pub struct RegistryBuilder {
    defs: Vec<DocumentTypeDef>,
}

impl RegistryBuilder {
    pub fn register(mut self, def: DocumentTypeDef) -> Self {
        self.defs.push(def);
        self
    }

    pub fn build(self) -> Result<Registry> {
        let mut seen = HashSet::new();
        for def in &self.defs {
            if def.name.trim().is_empty() {
                return Err(DocstoreError::Registry("type name cannot be empty".into()));
            }
            if !seen.insert(def.name.as_str()) {
                return Err(DocstoreError::Registry(format!(
                    "type {} is registered twice",
                    def.name
                )));
            }
        }
        for def in &self.defs {
            if let Some(parent) = &def.parent {
                if !seen.contains(parent.as_str()) {
                    return Err(DocstoreError::Registry(format!(
                        "type {} names unknown parent {}",
                        def.name, parent
                    )));
                }
            }
        }

        // Resolve parents before children; anything left over is a cycle.
        let mut resolved: HashMap<String, Arc<DocumentType>> = HashMap::new();
        let mut pending: Vec<&DocumentTypeDef> = self.defs.iter().collect();
        while !pending.is_empty() {
            let before = pending.len();
            let mut waiting = Vec::new();
            for def in pending {
                let parent = match &def.parent {
                    Some(name) => match resolved.get(name) {
                        Some(parent) => Some(Arc::clone(parent)),
                        None => {
                            waiting.push(def);
                            continue;
                        }
                    },
                    None => None,
                };
                let doc_type = resolve(def, parent.as_deref())?;
                resolved.insert(def.name.clone(), Arc::new(doc_type));
            }
            if waiting.len() == before {
                let names: Vec<&str> = waiting.iter().map(|d| d.name.as_str()).collect();
                return Err(DocstoreError::Registry(format!(
                    "inheritance cycle between {}",
                    names.join(", ")
                )));
            }
            pending = waiting;
        }

        let mut types = Vec::with_capacity(self.defs.len());
        let mut index = HashMap::new();
        for def in &self.defs {
            if let Some(doc_type) = resolved.remove(&def.name) {
                index.insert(def.name.clone(), types.len());
                types.push(doc_type);
            }
        }

        check_slots(&types)?;
        Ok(Registry { types, index })
    }
}

fn resolve(def: &DocumentTypeDef, parent: Option<&DocumentType>) -> Result<DocumentType> {
    let directory = def
        .directory
        .clone()
        .or_else(|| parent.map(|p| p.directory().to_string()))
        .filter(|d| !d.trim_matches('/').is_empty())
        .ok_or_else(|| {
            DocstoreError::Registry(format!("type {} has no directory", def.name))
        })?;
    let file_suffix = def
        .file_suffix
        .clone()
        .or_else(|| parent.map(|p| p.file_suffix().to_string()))
        .filter(|s| !s.trim_start_matches('.').is_empty())
        .ok_or_else(|| {
            DocstoreError::Registry(format!("type {} has no file suffix", def.name))
        })?;
    let subclass_suffix = match (&def.subclass_suffix, parent) {
        (Some(explicit), _) => Some(explicit.clone()),
        (None, Some(_)) => Some(snake_case(&def.name)),
        (None, None) => None,
    };
    if let Some(sub) = &subclass_suffix {
        if sub.contains('/') {
            return Err(DocstoreError::Registry(format!(
                "subclass suffix of {} cannot contain '/'",
                def.name
            )));
        }
    }

    let mut attributes: Vec<AttributeSpec> =
        parent.map(|p| p.attributes.clone()).unwrap_or_default();
    for spec in &def.attributes {
        match find_spec(&attributes, &spec.name) {
            Some(existing) if existing.kind != spec.kind => {
                return Err(DocstoreError::Registry(format!(
                    "type {} redeclares attribute {} as {} (was {})",
                    def.name, spec.name, spec.kind, existing.kind
                )));
            }
            Some(_) => {}
            None => attributes.push(spec.clone()),
        }
    }

    let format = def
        .format
        .clone()
        .or_else(|| parent.map(|p| Arc::clone(&p.format)))
        .unwrap_or_else(|| Arc::new(TextFormat::default()));

    let mut validators: Vec<Arc<dyn Validator>> =
        parent.map(|p| p.validators.clone()).unwrap_or_default();
    validators.extend(def.validators.iter().cloned());

    Ok(DocumentType {
        name: def.name.clone(),
        parent: def.parent.clone(),
        layout: TypeLayout::new(&directory, &file_suffix, subclass_suffix.as_deref()),
        attributes,
        format,
        validators,
    })
}

/// Within one (directory, file suffix) slot, at most one type may go without
/// a subclass suffix and no two types may share one.
fn check_slots(types: &[Arc<DocumentType>]) -> Result<()> {
    let mut claimed: HashMap<(&str, &str, Option<&str>), &str> = HashMap::new();
    for doc_type in types {
        let slot = (
            doc_type.directory(),
            doc_type.file_suffix(),
            doc_type.subclass_suffix(),
        );
        if let Some(other) = claimed.insert(slot, doc_type.name()) {
            return Err(DocstoreError::Registry(format!(
                "types {} and {} would store files under the same name pattern in {}",
                other,
                doc_type.name(),
                doc_type.directory()
            )));
        }
    }
    Ok(())
}

/// `FinalDocument` -> `final_document`, `HTTPSource` -> `https_source`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if i > 0 && (prev_lower || (prev_upper && next_lower)) && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else if *ch == '-' || *ch == ' ' || *ch == ':' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        } else {
            out.push(*ch);
        }
    }
    out
}

/// The resolved type hierarchy.
#[derive(Debug)]
pub struct Registry {
    types: Vec<Arc<DocumentType>>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Result<&Arc<DocumentType>> {
        self.index
            .get(name)
            .map(|&i| &self.types[i])
            .ok_or_else(|| DocstoreError::UnknownType(name.to_string()))
    }

    /// All types in registration order.
    pub fn types(&self) -> &[Arc<DocumentType>] {
        &self.types
    }

    /// Direct subtypes of `name`, in registration order.
    pub fn children(&self, name: &str) -> Result<Vec<Arc<DocumentType>>> {
        self.get(name)?;
        Ok(self
            .types
            .iter()
            .filter(|t| t.parent() == Some(name))
            .cloned()
            .collect())
    }

    pub fn is_leaf(&self, name: &str) -> Result<bool> {
        Ok(self.children(name)?.is_empty())
    }

    /// `name` and every type below it, in registration order.
    pub fn descendants(&self, name: &str) -> Result<Vec<Arc<DocumentType>>> {
        self.get(name)?;
        let mut members: HashSet<&str> = HashSet::from([name]);
        // Parents may be registered after their children, so iterate to a fixpoint.
        loop {
            let before = members.len();
            for doc_type in &self.types {
                if doc_type.parent().is_some_and(|p| members.contains(p)) {
                    members.insert(doc_type.name());
                }
            }
            if members.len() == before {
                break;
            }
        }
        Ok(self
            .types
            .iter()
            .filter(|t| members.contains(t.name()))
            .cloned()
            .collect())
    }

    /// The type owning the file at `relative_path`, if any.
    pub fn owner_of(&self, relative_path: &str) -> Option<&Arc<DocumentType>> {
        let (parent_dir, file_name) = match relative_path.rsplit_once('/') {
            Some((dir, name)) => (dir, name),
            None => ("", relative_path),
        };

        let mut best: Option<(usize, usize, &Arc<DocumentType>)> = None;
        for doc_type in &self.types {
            let directory = doc_type.directory();
            let inside = parent_dir == directory
                || parent_dir
                    .strip_prefix(directory)
                    .is_some_and(|rest| rest.starts_with('/'));
            if !inside {
                continue;
            }
            let stem = match file_name
                .strip_suffix(doc_type.file_suffix())
                .and_then(|s| s.strip_suffix('.'))
            {
                Some(stem) if !stem.is_empty() => stem,
                _ => continue,
            };
            let sub_len = match doc_type.subclass_suffix() {
                Some(sub) => match stem.strip_suffix(sub).and_then(|s| s.strip_suffix('.')) {
                    Some(key) if !key.is_empty() => sub.len(),
                    _ => continue,
                },
                None => 0,
            };
            let score = (directory.len(), sub_len);
            if best.map_or(true, |(d, s, _)| score > (d, s)) {
                best = Some((score.0, score.1, doc_type));
            }
        }
        best.map(|(_, _, doc_type)| doc_type)
    }
}
