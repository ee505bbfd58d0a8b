//! Filesystem layer for the settings conversion pipeline
//!
//! Provides normalized paths, settings layout detection, atomic writes,
//! writability checks and format-agnostic config loading.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod layout;
pub mod path;

pub use config::{ConfigFormat, ConfigStore};
pub use constants::SettingsPath;
pub use error::{Error, Result};
pub use layout::{SettingsLayout, StorageScheme};
pub use path::NormalizedPath;
