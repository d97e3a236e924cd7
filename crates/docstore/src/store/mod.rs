//! # Storage Layer
//!
//! [`DocumentStore`] owns the document lifecycle: finding, saving, moving and
//! destroying files. The actual I/O goes through a [`StorageBackend`], so the
//! same lifecycle logic runs against the filesystem and against memory.
//!
//! ## Files are Truth
//!
//! There is no index. A document exists exactly when its file exists, and
//! listing a type means walking its directory. Which type a file belongs to
//! is decided from its name alone (see [`crate::registry::Registry::owner_of`]).
//!
//! ## Save Sequence
//!
//! 1. Run the type's validators. Any failure aborts before I/O.
//! 2. Optionally reject keys already used by another file of the same type.
//! 3. Render. Skip the write if the file already holds those exact bytes.
//! 4. Write (creating parent directories; atomic on the filesystem).
//! 5. If the key changed since the last save, delete the old file. A failed
//!    delete is logged and the save still succeeds.
//! 6. Remember the new path as the persisted path.
//!
//! ## Implementations
//!
//! - [`FileDocumentStore`]: documents on disk under a configured root.
//! - [`InMemoryDocumentStore`]: for testing lifecycle logic without filesystem I/O.
//!
//! ## Storage Layout
//!
//! ```text
//! <root>/
//! └── some_documents/                      # type directory
//!     ├── foo.suffix                       # SomeDocument "foo"
//!     ├── fd.final_document.suffix         # FinalDocument "fd"
//!     └── sub/bar.suffix                   # SomeDocument "bar" in a sub-directory
//! ```

use std::sync::Arc;

use crate::registry::Registry;

pub mod backend;
pub mod document_store;
pub mod fs_backend;
pub mod mem_backend;

pub use backend::StorageBackend;
pub use document_store::{DocumentStore, SaveOutcome};
pub use fs_backend::FsBackend;
pub use mem_backend::MemBackend;

pub type FileDocumentStore = DocumentStore<FsBackend>;
pub type InMemoryDocumentStore = DocumentStore<MemBackend>;

impl InMemoryDocumentStore {
    pub fn in_memory(registry: Arc<Registry>) -> Self {
        DocumentStore::with_backend(registry, MemBackend::new())
    }
}
