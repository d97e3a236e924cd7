use super::backend::StorageBackend;
use crate::error::{DocstoreError, Result};
use chrono::{DateTime, Utc};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

#[derive(Clone)]
struct FileEntry {
    text: String,
    mtime: DateTime<Utc>,
}

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since the store is single-threaded.
/// Keys are the canonical relative paths, kept in a `BTreeMap` so listings
/// come out sorted without extra work.
#[derive(Default)]
pub struct MemBackend {
    files: RefCell<BTreeMap<String, FileEntry>>,
    simulate_write_error: Cell<bool>,
    simulate_delete_error: Cell<bool>,
    writes: Cell<usize>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Enable delete error simulation (e.g. a stale file that can't be removed).
    pub fn set_simulate_delete_error(&self, simulate: bool) {
        self.simulate_delete_error.set(simulate);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Test helper to set mtime directly.
    /// Returns true if the entry existed and was updated.
    pub fn set_mtime(&self, path: &str, mtime: DateTime<Utc>) -> bool {
        match self.files.borrow_mut().get_mut(path) {
            Some(entry) => {
                entry.mtime = mtime;
                true
            }
            None => false,
        }
    }

    /// Every stored path, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.files.borrow().keys().cloned().collect()
    }
}

fn simulated(what: &str) -> DocstoreError {
    DocstoreError::Io(io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("Simulated {} error", what),
    ))
}

impl StorageBackend for MemBackend {
    fn read(&self, path: &str) -> Result<Option<String>> {
        Ok(self.files.borrow().get(path).map(|e| e.text.clone()))
    }

    fn write(&self, path: &str, content: &str) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(simulated("write"));
        }
        self.files.borrow_mut().insert(
            path.to_string(),
            FileEntry {
                text: content.to_string(),
                mtime: Utc::now(),
            },
        );
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<bool> {
        if self.simulate_delete_error.get() {
            return Err(simulated("delete"));
        }
        Ok(self.files.borrow_mut().remove(path).is_some())
    }

    fn exists(&self, path: &str) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn list(&self, directory: &str, suffix: &str) -> Result<Vec<String>> {
        let prefix = if directory.is_empty() {
            String::new()
        } else {
            format!("{}/", directory)
        };
        let ending = format!(".{}", suffix);
        Ok(self
            .files
            .borrow()
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .filter(|path| {
                let name = path.rsplit('/').next().unwrap_or(path.as_str());
                !name.starts_with('.') && name.ends_with(&ending)
            })
            .cloned()
            .collect())
    }

    fn modified(&self, path: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.files.borrow().get(path).map(|e| e.mtime))
    }

    fn location(&self, path: &str) -> PathBuf {
        PathBuf::from("mem://").join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_delete() {
        let backend = MemBackend::new();
        backend.write("docs/a.d", "one").unwrap();
        assert_eq!(backend.read("docs/a.d").unwrap().as_deref(), Some("one"));
        assert_eq!(backend.write_count(), 1);
        assert!(backend.delete("docs/a.d").unwrap());
        assert!(!backend.exists("docs/a.d"));
        assert!(!backend.delete("docs/a.d").unwrap());
    }

    #[test]
    fn list_respects_directory_boundary() {
        let backend = MemBackend::new();
        backend.write("docs/a.d", "").unwrap();
        backend.write("docs/sub/b.d", "").unwrap();
        backend.write("docs_other/c.d", "").unwrap();
        backend.write("docs/c.e", "").unwrap();
        assert_eq!(
            backend.list("docs", "d").unwrap(),
            vec!["docs/a.d".to_string(), "docs/sub/b.d".to_string()]
        );
    }

    #[test]
    fn simulated_errors() {
        let backend = MemBackend::new();
        backend.write("docs/a.d", "x").unwrap();

        backend.set_simulate_write_error(true);
        assert!(backend.write("docs/b.d", "y").is_err());
        assert_eq!(backend.write_count(), 1);

        backend.set_simulate_delete_error(true);
        assert!(backend.delete("docs/a.d").is_err());
        assert!(backend.exists("docs/a.d"));
    }

    #[test]
    fn mtime_can_be_overridden() {
        let backend = MemBackend::new();
        backend.write("docs/a.d", "x").unwrap();
        let past = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        assert!(backend.set_mtime("docs/a.d", past));
        assert_eq!(backend.modified("docs/a.d").unwrap(), Some(past));
        assert!(!backend.set_mtime("docs/missing.d", past));
    }
}
