//! # Docstore Architecture
//!
//! Docstore keeps **typed, human-editable documents** on disk, one file per
//! record. Files are meant to be read, diffed and edited by hand; the library
//! is just a disciplined way to get them in and out.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Registry (registry.rs)                                     │
//! │  - Document types: directory, file suffix, attributes       │
//! │  - Inheritance, subclass suffixes, file ownership           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Documents (document.rs, attributes/, validation.rs)        │
//! │  - In-memory values: key, sub-directories, attributes       │
//! │  - Validation, rendering through the type's Format          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - DocumentStore: find, save, destroy, all                  │
//! │  - StorageBackend: FsBackend (production), MemBackend (tests)│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Paths
//!
//! A document's path is derived, never stored:
//!
//! ```text
//! <root>/<type directory>/<sub dirs>/<key>[.<subclass suffix>].<file suffix>
//! ```
//!
//! Users may refer to a document by key, by key with sub-directories, or by
//! file name; [`paths::normalize`] turns all of those into the same
//! [`paths::NormalizedPath`]. Absolute paths are rejected.
//!
//! ## Key Principle: Nothing Global
//!
//! The root directory lives in [`config::StoreConfig`] and is handed to the
//! backend. The set of document types lives in an explicit
//! [`registry::Registry`]. Two stores with different roots or different
//! registries can coexist in one process.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use docstore::attributes::AttributeKind;
//! use docstore::registry::{DocumentTypeDef, Registry};
//! use docstore::store::InMemoryDocumentStore;
//!
//! let registry = Registry::builder()
//!     .register(
//!         DocumentTypeDef::new("Gquery")
//!             .directory("gqueries")
//!             .file_suffix("gql")
//!             .attribute("description", AttributeKind::Text)
//!             .attribute("unit", AttributeKind::Text)
//!             .attribute("query", AttributeKind::Text),
//!     )
//!     .build()
//!     .unwrap();
//! let store = InMemoryDocumentStore::in_memory(Arc::new(registry));
//!
//! let mut doc = store.new_document("Gquery", "co2/total_co2").unwrap();
//! doc.set("unit", "kg").unwrap();
//! store.save(&mut doc).unwrap();
//!
//! let found = store.find("Gquery", "total_co2").unwrap();
//! assert_eq!(found.relative_path(), "gqueries/co2/total_co2.gql");
//! assert_eq!(found.get_text("unit"), Some("kg"));
//! ```
//!
//! ## Testing Strategy
//!
//! - **Unit tests** live next to the code and use [`store::MemBackend`].
//! - **Integration tests** in `tests/` run against a temporary directory
//!   through [`store::FsBackend`].
//! - With the `test_utils` feature, `test_utils::TestEnv` provides a
//!   temp-dir-backed store for downstream crates.

pub mod attributes;
pub mod config;
pub mod document;
pub mod error;
pub mod format;
pub mod paths;
pub mod registry;
pub mod store;
pub mod validation;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use document::Document;
pub use error::{DocstoreError, Result};
