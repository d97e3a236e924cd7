//! # Configuration
//!
//! Store settings are managed by [`confique`], which handles layered loading
//! from a TOML file and environment variables.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `DOCSTORE_ROOT`, `DOCSTORE_CHECK_DUPLICATE_KEYS`,
//!    `DOCSTORE_ATOMIC_WRITES`.
//! 2. **Config file**: the TOML file passed to [`StoreConfig::load`], if any.
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `root` | `.` | Directory all document type directories live under |
//! | `check_duplicate_keys` | `false` | Refuse to save a document whose key is already used by another file of the same type |
//! | `atomic_writes` | `true` | Write through a temp file and rename |

use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Root directory of the store.
    #[config(env = "DOCSTORE_ROOT", default = ".")]
    pub root: PathBuf,

    /// Reject saves that would create a second file with the same key.
    #[config(env = "DOCSTORE_CHECK_DUPLICATE_KEYS", default = false)]
    pub check_duplicate_keys: bool,

    #[config(env = "DOCSTORE_ATOMIC_WRITES", default = true)]
    pub atomic_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            check_duplicate_keys: false,
            atomic_writes: true,
        }
    }
}

impl StoreConfig {
    /// Loads env vars over the optional TOML `file` over defaults.
    /// A missing file is treated as empty.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = file {
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }
}
