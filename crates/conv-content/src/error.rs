//! Error types for conv-content

use std::path::PathBuf;

/// Result type for conv-content operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or patching settings documents
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to parse settings file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("'{name}' in {path} is not a table")]
    NotATable { path: PathBuf, name: String },

    #[error("'{name}' in {path} is not a value")]
    NotAValue { path: PathBuf, name: String },

    #[error("Component '{name}' not found in {path}")]
    ComponentNotFound { path: PathBuf, name: String },

    #[error("Component '{name}' already exists in {path}")]
    ComponentExists { path: PathBuf, name: String },

    #[error(transparent)]
    Fs(#[from] conv_fs::Error),
}
