//! Format-preserving settings documents
//!
//! A [`SettingsFile`] owns the parsed document of one physical settings
//! file. Edits go through `toml_edit`, so comments, ordering and untouched
//! sections survive a save byte for byte. [`ComponentManagerSettings`] is
//! the read/patch view over the named `[component.<Name>]` sections.

pub mod component;
pub mod diff;
pub mod error;
pub mod normalize;
pub mod settings_file;

pub use component::ComponentManagerSettings;
pub use diff::{SettingsChange, SettingsDiff};
pub use error::{Error, Result};
pub use settings_file::{COMPONENT_KEY, SettingsFile, VERSION_KEY};
