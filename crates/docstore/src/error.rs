use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocstoreError {
    #[error("Invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("Document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("Malformed document {}: {reason}", .path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("Validation failed for {document}: {}", .errors.join(", "))]
    Validation {
        document: String,
        errors: Vec<String>,
    },

    #[error("Duplicate key {key:?}: already stored at {}", .existing.display())]
    DuplicateKey { key: String, existing: PathBuf },

    #[error("Unknown document type: {0}")]
    UnknownType(String),

    #[error("Invalid attribute {name:?}: {reason}")]
    Attribute { name: String, reason: String },

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),
}

impl DocstoreError {
    pub(crate) fn invalid_key(key: &str, reason: &'static str) -> Self {
        DocstoreError::InvalidKey {
            key: key.to_string(),
            reason,
        }
    }

    pub(crate) fn attribute(name: &str, reason: impl Into<String>) -> Self {
        DocstoreError::Attribute {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DocstoreError>;
