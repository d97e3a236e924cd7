use crate::error::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Abstract interface for raw storage I/O.
///
/// This trait handles the "how" of storage (filesystem vs memory), while
/// `DocumentStore` handles the "what" (normalization, parsing, lifecycle).
/// Every path is a canonical `/`-separated path relative to the store root.
pub trait StorageBackend {
    /// Read a file's content.
    /// Returns Ok(None) if the file does not exist.
    /// Returns Err only on actual I/O errors (permissions, disk failure, bad encoding).
    fn read(&self, path: &str) -> Result<Option<String>>;

    /// Write content, creating parent directories as needed.
    /// Replaces any existing file.
    fn write(&self, path: &str, content: &str) -> Result<()>;

    /// Delete a file. Returns Ok(false) if there was nothing to delete.
    fn delete(&self, path: &str) -> Result<bool>;

    fn exists(&self, path: &str) -> bool;

    /// All files below `directory` (recursively) whose name ends in
    /// `.{suffix}`, as relative paths, sorted.
    fn list(&self, directory: &str, suffix: &str) -> Result<Vec<String>>;

    /// Modification time, or None if the file does not exist.
    fn modified(&self, path: &str) -> Result<Option<DateTime<Utc>>>;

    /// Where the file lives. For FsBackend this is the absolute path,
    /// for MemBackend a virtual one. Used for diagnostics and errors.
    fn location(&self, path: &str) -> PathBuf;
}
