use super::backend::StorageBackend;
use crate::error::{DocstoreError, Result};
use crate::paths::absolute_path;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;
use walkdir::WalkDir;

/// Filesystem backend rooted at a single base directory.
///
/// The root is only consulted through [`absolute_path`]; everything handed
/// in and out of this backend is relative to it.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
    atomic_writes: bool,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            atomic_writes: true,
        }
    }

    /// Write through a temp file + rename (default) or straight to the target.
    pub fn with_atomic_writes(mut self, atomic: bool) -> Self {
        self.atomic_writes = atomic;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(DocstoreError::Io)?;
        }
        Ok(())
    }

    /// Relative, `/`-separated form of a path under the root.
    fn relative(&self, path: &Path) -> Option<String> {
        let rest = path.strip_prefix(&self.root).ok()?;
        let segments: Option<Vec<&str>> = rest.iter().map(|s| s.to_str()).collect();
        Some(segments?.join("/"))
    }
}

impl StorageBackend for FsBackend {
    fn read(&self, path: &str) -> Result<Option<String>> {
        let full = absolute_path(&self.root, path);
        match fs::read_to_string(&full) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DocstoreError::Io(e)),
        }
    }

    fn write(&self, path: &str, content: &str) -> Result<()> {
        let target = absolute_path(&self.root, path);
        let dir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        self.ensure_dir(&dir)?;

        if !self.atomic_writes {
            return fs::write(&target, content).map_err(DocstoreError::Io);
        }

        // Atomic Write
        let tmp_path = dir.join(format!(".docstore-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_path, content).map_err(DocstoreError::Io)?;
        if let Err(e) = fs::rename(&tmp_path, &target) {
            let _ = fs::remove_file(&tmp_path);
            return Err(DocstoreError::Io(e));
        }
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<bool> {
        let full = absolute_path(&self.root, path);
        match fs::remove_file(&full) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DocstoreError::Io(e)),
        }
    }

    fn exists(&self, path: &str) -> bool {
        absolute_path(&self.root, path).is_file()
    }

    fn list(&self, directory: &str, suffix: &str) -> Result<Vec<String>> {
        let base = absolute_path(&self.root, directory);
        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let ending = format!(".{}", suffix);
        let mut found = Vec::new();
        for entry in WalkDir::new(&base).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry under {}", base.display());
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let name = match entry.file_name().to_str() {
                Some(name) => name,
                None => {
                    warn!("skipping non UTF-8 file name {}", entry.path().display());
                    continue;
                }
            };
            // Hidden files include our own in-flight temp files.
            if name.starts_with('.') || !name.ends_with(&ending) {
                continue;
            }
            if let Some(relative) = self.relative(entry.path()) {
                found.push(relative);
            }
        }
        found.sort();
        Ok(found)
    }

    fn modified(&self, path: &str) -> Result<Option<DateTime<Utc>>> {
        let full = absolute_path(&self.root, path);
        match fs::metadata(&full) {
            Ok(meta) => {
                let modified = meta.modified().map_err(DocstoreError::Io)?;
                Ok(Some(modified.into()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DocstoreError::Io(e)),
        }
    }

    fn location(&self, path: &str) -> PathBuf {
        absolute_path(&self.root, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FsBackend) {
        let dir = TempDir::new().unwrap();
        let backend = FsBackend::new(dir.path());
        (dir, backend)
    }

    #[test]
    fn basic_content_io() {
        let (_dir, backend) = setup();

        backend.write("docs/a.d", "Hello World").unwrap();
        assert_eq!(backend.read("docs/a.d").unwrap(), Some("Hello World".to_string()));
        assert!(backend.exists("docs/a.d"));

        assert!(backend.delete("docs/a.d").unwrap());
        assert_eq!(backend.read("docs/a.d").unwrap(), None);
        assert!(!backend.delete("docs/a.d").unwrap());
    }

    #[test]
    fn write_creates_intermediate_directories() {
        let (dir, backend) = setup();
        backend.write("docs/x/y/z.d", "deep").unwrap();
        assert!(dir.path().join("docs").join("x").join("y").join("z.d").is_file());
    }

    #[test]
    fn atomic_write_leaves_no_artifacts() {
        let (dir, backend) = setup();
        backend.write("docs/a.d", "Atomic").unwrap();
        backend.write("docs/a.d", "Atomic again").unwrap();

        for entry in fs::read_dir(dir.path().join("docs")).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_str().unwrap().to_string();
            assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
        }
        assert_eq!(backend.read("docs/a.d").unwrap().unwrap(), "Atomic again");
    }

    #[test]
    fn non_atomic_write() {
        let (_dir, backend) = setup();
        let backend = backend.with_atomic_writes(false);
        backend.write("docs/a.d", "direct").unwrap();
        assert_eq!(backend.read("docs/a.d").unwrap().unwrap(), "direct");
    }

    #[test]
    fn list_is_recursive_and_filtered() {
        let (dir, backend) = setup();
        backend.write("docs/b.d", "1").unwrap();
        backend.write("docs/sub/a.d", "2").unwrap();
        backend.write("docs/c.other", "3").unwrap();
        backend.write("elsewhere/e.d", "4").unwrap();
        fs::write(dir.path().join("docs").join(".hidden.d"), "5").unwrap();

        let listed = backend.list("docs", "d").unwrap();
        assert_eq!(listed, vec!["docs/b.d".to_string(), "docs/sub/a.d".to_string()]);
    }

    #[test]
    fn list_of_missing_directory_is_empty() {
        let (_dir, backend) = setup();
        assert!(backend.list("nothing", "d").unwrap().is_empty());
    }

    #[test]
    fn invalid_utf8_is_an_io_error() {
        let (dir, backend) = setup();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join("bin.d"), [0xff, 0xfe, 0x00]).unwrap();
        let err = backend.read("docs/bin.d").unwrap_err();
        assert!(matches!(err, DocstoreError::Io(e) if e.kind() == ErrorKind::InvalidData));
    }

    #[test]
    fn modified_and_location() {
        let (dir, backend) = setup();
        assert_eq!(backend.modified("docs/a.d").unwrap(), None);
        backend.write("docs/a.d", "x").unwrap();
        assert!(backend.modified("docs/a.d").unwrap().is_some());
        assert_eq!(
            backend.location("docs/a.d"),
            dir.path().join("docs").join("a.d")
        );
    }
}
