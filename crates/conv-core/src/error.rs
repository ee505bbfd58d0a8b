//! Error types for conv-core
//!
//! Every variant means the same thing to a caller: the workspace cannot be
//! converted (or cannot be converted further). The variants only differ in
//! what is reported.

use std::path::PathBuf;

use conv_fs::NormalizedPath;

/// Result type for conv-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while detecting or running a conversion
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A converter found data it cannot handle
    #[error("Cannot convert: {message}")]
    CannotConvert { message: String },

    /// A specific settings file cannot be converted
    #[error("Cannot convert {path}: {message}")]
    CannotConvertFile { path: PathBuf, message: String },

    /// Affected files are not writable
    #[error("Cannot write to {} file(s): {}", files.len(), join_paths(files))]
    ReadOnlyFiles { files: Vec<NormalizedPath> },

    /// Converters declare a cyclic ordering
    #[error("Converter ordering cycle among: {}", participants.join(", "))]
    DependencyCycle { participants: Vec<String> },

    /// A plan was handed to a runner for a different converter
    #[error("Conversion plan of '{plan}' cannot drive converter '{runner}'")]
    PlanMismatch { plan: String, runner: String },

    /// Settings document error from conv-content
    #[error(transparent)]
    Content(#[from] conv_content::Error),

    /// Filesystem error from conv-fs
    #[error(transparent)]
    Fs(#[from] conv_fs::Error),
}

impl Error {
    pub fn cannot_convert(message: impl Into<String>) -> Self {
        Self::CannotConvert {
            message: message.into(),
        }
    }

    pub fn cannot_convert_file(path: &NormalizedPath, message: impl Into<String>) -> Self {
        Self::CannotConvertFile {
            path: path.to_native(),
            message: message.into(),
        }
    }
}

fn join_paths(files: &[NormalizedPath]) -> String {
    files
        .iter()
        .map(NormalizedPath::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
