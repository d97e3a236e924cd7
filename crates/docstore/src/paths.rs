//! # Key and Path Resolution
//!
//! Documents are addressed by a short key, never by a full path. This module
//! turns whatever the caller hands us (a bare key, a key with sub-folders, a
//! relative file name with or without suffixes) into a canonical relative
//! path, and back into its key.
//!
//! ## Canonical Form
//!
//! ```text
//! <directory>/<sub-dirs/>key[.<subclass suffix>].<file suffix>
//! ```
//!
//! ## Normalization Rules
//!
//! Applied in order:
//!
//! 1. Empty input and absolute paths (`/x`, `\x`, `C:\x`) are rejected.
//! 2. A trailing `.<file suffix>` is stripped, then a trailing
//!    `.<subclass suffix>` for types that declare one.
//! 3. A leading copy of the type's directory is stripped, so `docs/a` and `a`
//!    address the same file.
//! 4. Empty segments are dropped. `.` and `..` segments are rejected.
//! 5. The last segment is the key, the rest are sub-directories.
//!
//! Everything here is pure: no filesystem access, no configuration. The one
//! place a root directory enters the picture is [`absolute_path`].

use std::path::{Path, PathBuf};

use crate::error::{DocstoreError, Result};

/// Where files of one document type live, relative to the store root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeLayout {
    directory: String,
    file_suffix: String,
    subclass_suffix: Option<String>,
}

impl TypeLayout {
    /// Builds a layout. Surrounding slashes on `directory` and a leading dot on
    /// either suffix are dropped.
    pub fn new(directory: &str, file_suffix: &str, subclass_suffix: Option<&str>) -> Self {
        Self {
            directory: directory.trim_matches('/').to_string(),
            file_suffix: file_suffix.trim_start_matches('.').to_string(),
            subclass_suffix: subclass_suffix
                .map(|s| s.trim_start_matches('.').to_string())
                .filter(|s| !s.is_empty()),
        }
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn file_suffix(&self) -> &str {
        &self.file_suffix
    }

    pub fn subclass_suffix(&self) -> Option<&str> {
        self.subclass_suffix.as_deref()
    }

    fn directory_segments(&self) -> Vec<&str> {
        self.directory.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// The file name a key gets under this layout.
    pub fn file_name(&self, key: &str) -> String {
        match &self.subclass_suffix {
            Some(sub) => format!("{}.{}.{}", key, sub, self.file_suffix),
            None => format!("{}.{}", key, self.file_suffix),
        }
    }
}

/// A key split into its sub-directories and the key proper.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath {
    pub sub_dirs: Vec<String>,
    pub key: String,
}

impl NormalizedPath {
    /// Canonical path relative to the store root, always `/`-separated.
    pub fn relative_path(&self, layout: &TypeLayout) -> String {
        let mut parts: Vec<&str> = layout.directory_segments();
        parts.extend(self.sub_dirs.iter().map(String::as_str));
        let file_name = layout.file_name(&self.key);
        parts.push(&file_name);
        parts.join("/")
    }
}

/// Normalizes a raw key or relative path for the given layout.
///
/// # Examples
///
/// ```
/// use docstore::paths::{normalize, TypeLayout};
///
/// let layout = TypeLayout::new("docs", "d", None);
/// let normalized = normalize("a/b", &layout).unwrap();
/// assert_eq!(normalized.key, "b");
/// assert_eq!(normalized.relative_path(&layout), "docs/a/b.d");
///
/// let again = normalize("docs/a/b.d", &layout).unwrap();
/// assert_eq!(again.relative_path(&layout), "docs/a/b.d");
///
/// assert!(normalize("/docs/a/b.d", &layout).is_err());
/// ```
pub fn normalize(raw: &str, layout: &TypeLayout) -> Result<NormalizedPath> {
    if raw.is_empty() {
        return Err(DocstoreError::invalid_key(raw, "key cannot be empty"));
    }
    if is_absolute(raw) {
        return Err(DocstoreError::invalid_key(
            raw,
            "absolute paths are not accepted, use a key relative to the type directory",
        ));
    }

    if raw.ends_with('/') || raw.ends_with('\\') {
        return Err(DocstoreError::invalid_key(raw, "key cannot be empty"));
    }

    let mut rest = strip_dot_suffix(raw, &layout.file_suffix)
        .ok_or_else(|| DocstoreError::invalid_key(raw, "key cannot be empty"))?;
    if let Some(sub) = &layout.subclass_suffix {
        rest = strip_dot_suffix(rest, sub)
            .ok_or_else(|| DocstoreError::invalid_key(raw, "key cannot be empty"))?;
    }

    let mut segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    let directory = layout.directory_segments();
    if !directory.is_empty()
        && segments.len() > directory.len()
        && segments.starts_with(&directory)
    {
        segments.drain(..directory.len());
    }

    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(DocstoreError::invalid_key(
            raw,
            "relative segments ('.', '..') are not allowed",
        ));
    }

    let key = match segments.pop() {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => return Err(DocstoreError::invalid_key(raw, "key cannot be empty")),
    };

    Ok(NormalizedPath {
        sub_dirs: segments.into_iter().map(str::to_string).collect(),
        key,
    })
}

/// Checks a bare key before it replaces the key of an existing document.
pub fn validate_key(key: &str, layout: &TypeLayout) -> Result<()> {
    if key.is_empty() {
        return Err(DocstoreError::invalid_key(key, "key cannot be empty"));
    }
    if key.contains('/') || key.contains('\\') {
        return Err(DocstoreError::invalid_key(
            key,
            "key cannot contain path separators",
        ));
    }
    if key == "." || key == ".." {
        return Err(DocstoreError::invalid_key(
            key,
            "relative segments ('.', '..') are not allowed",
        ));
    }
    if has_dot_suffix(key, &layout.file_suffix) {
        return Err(DocstoreError::invalid_key(
            key,
            "key cannot carry the file suffix",
        ));
    }
    if let Some(sub) = &layout.subclass_suffix {
        if has_dot_suffix(key, sub) {
            return Err(DocstoreError::invalid_key(
                key,
                "key cannot carry the subclass suffix",
            ));
        }
    }
    Ok(())
}

/// Joins a canonical relative path onto the store root.
pub fn absolute_path(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

fn is_absolute(raw: &str) -> bool {
    if raw.starts_with('/') || raw.starts_with('\\') {
        return true;
    }
    let bytes = raw.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Strips `.suffix` from the end of `value`. Returns `None` when nothing
/// would be left of the last segment (`.suffix`, `dir/.suffix`).
fn strip_dot_suffix<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    if suffix.is_empty() {
        return Some(value);
    }
    match value
        .strip_suffix(suffix)
        .and_then(|rest| rest.strip_suffix('.'))
    {
        Some(stem) if stem.is_empty() || stem.ends_with('/') => None,
        Some(stem) => Some(stem),
        None => Some(value),
    }
}

fn has_dot_suffix(key: &str, suffix: &str) -> bool {
    !suffix.is_empty()
        && key
            .strip_suffix(suffix)
        .is_some_and(|rest| rest.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn layout() -> TypeLayout {
        TypeLayout::new("some_documents", "suffix", None)
    }

    fn subclass_layout() -> TypeLayout {
        TypeLayout::new("some_documents", "suffix", Some("other_document"))
    }

    fn canonical(raw: &str, layout: &TypeLayout) -> String {
        normalize(raw, layout).unwrap().relative_path(layout)
    }

    #[test]
    fn accepts_just_a_key() {
        assert_eq!(canonical("foo", &layout()), "some_documents/foo.suffix");
    }

    #[test]
    fn accepts_a_path() {
        assert_eq!(
            canonical("some_documents/foo", &layout()),
            "some_documents/foo.suffix"
        );
    }

    #[test]
    fn accepts_a_path_with_suffix() {
        assert_eq!(
            canonical("some_documents/foo.suffix", &layout()),
            "some_documents/foo.suffix"
        );
    }

    #[test]
    fn keeps_leading_segments_as_sub_dirs() {
        let normalized = normalize("my_map1/new", &layout()).unwrap();
        assert_eq!(normalized.key, "new");
        assert_eq!(normalized.sub_dirs, vec!["my_map1".to_string()]);
        assert_eq!(
            normalized.relative_path(&layout()),
            "some_documents/my_map1/new.suffix"
        );
    }

    #[test]
    fn rejects_absolute_paths() {
        for raw in ["/some_documents/foo.suffix", "\\foo", "C:\\docs\\foo"] {
            let err = normalize(raw, &layout()).unwrap_err();
            assert!(matches!(err, DocstoreError::InvalidKey { .. }), "{raw}");
        }
    }

    #[test]
    fn rejects_empty_keys() {
        for raw in ["", ".suffix", "some_documents/", "a/", "a/.suffix", "//"] {
            assert!(normalize(raw, &layout()).is_err(), "{raw:?} should fail");
        }
    }

    #[test]
    fn rejects_relative_segments() {
        assert!(normalize("../escape", &layout()).is_err());
        assert!(normalize("a/./b", &layout()).is_err());
    }

    #[test]
    fn strips_subclass_suffix() {
        let normalized = normalize("fd.other_document.suffix", &subclass_layout()).unwrap();
        assert_eq!(normalized.key, "fd");
        assert_eq!(
            normalized.relative_path(&subclass_layout()),
            "some_documents/fd.other_document.suffix"
        );
    }

    #[test]
    fn empty_stem_under_subclass_suffix_is_rejected() {
        let err = normalize(".other_document.suffix", &subclass_layout()).unwrap_err();
        assert!(matches!(err, DocstoreError::InvalidKey { .. }));
    }

    #[test]
    fn ancestor_layout_keeps_subclass_segment_in_key() {
        let normalized = normalize("fd.other_document.suffix", &layout()).unwrap();
        assert_eq!(normalized.key, "fd.other_document");
    }

    #[test]
    fn nested_directory_is_stripped_once() {
        let layout = TypeLayout::new("tmp/fixtures/docs", "d", None);
        assert_eq!(canonical("tmp/fixtures/docs/a", &layout), "tmp/fixtures/docs/a.d");
        assert_eq!(canonical("a", &layout), "tmp/fixtures/docs/a.d");
    }

    #[test]
    fn layout_trims_dots_and_slashes() {
        let layout = TypeLayout::new("/docs/", ".d", Some(".sub"));
        assert_eq!(layout.directory(), "docs");
        assert_eq!(layout.file_suffix(), "d");
        assert_eq!(layout.subclass_suffix(), Some("sub"));
    }

    #[test]
    fn validate_key_rules() {
        let layout = subclass_layout();
        assert!(validate_key("pd", &layout).is_ok());
        assert!(validate_key("", &layout).is_err());
        assert!(validate_key("a/b", &layout).is_err());
        assert!(validate_key("..", &layout).is_err());
        assert!(validate_key("pd.suffix", &layout).is_err());
        assert!(validate_key("pd.other_document", &layout).is_err());
        assert!(validate_key(".suffix", &layout).is_err());
        assert!(validate_key("suffix", &layout).is_ok());
    }

    #[test]
    fn absolute_path_joins_root() {
        let path = absolute_path(Path::new("/tmp"), "some_documents/foo.suffix");
        assert_eq!(path, PathBuf::from("/tmp/some_documents/foo.suffix"));
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(raw in "[a-z0-9_./]{1,24}") {
            for layout in [layout(), subclass_layout()] {
                if let Ok(first) = normalize(&raw, &layout) {
                    let path = first.relative_path(&layout);
                    let second = normalize(&path, &layout).unwrap();
                    prop_assert_eq!(&second, &first);
                    prop_assert_eq!(second.relative_path(&layout), path);
                }
            }
        }

        #[test]
        fn normalize_rejects_root_markers(raw in "[a-z0-9_./]{0,16}") {
            let absolute = format!("/{}", raw);
            prop_assert!(normalize(&absolute, &layout()).is_err());
        }
    }
}
