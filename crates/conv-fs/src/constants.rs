//! Constants for well-known settings file and directory names.

use std::path::Path;

/// Standard settings filesystem markers and paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsPath {
    /// The project descriptor in the single-file scheme
    ProjectFile,
    /// The per-user workspace state file
    WorkspaceFile,
    /// The `.settings` directory (directory-based scheme root)
    SettingsDir,
    /// Project descriptor inside the settings directory
    MiscFile,
    /// Module list inside the settings directory
    ModulesFile,
    /// Directory of shared run configuration stores
    RunConfigurationsDir,
    /// Record of converters already applied to the workspace
    ConversionRecord,
    /// Root of conversion backups
    BackupDir,
}

impl SettingsPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectFile => "project.toml",
            Self::WorkspaceFile => "workspace.toml",
            Self::SettingsDir => ".settings",
            Self::MiscFile => "misc.toml",
            Self::ModulesFile => "modules.toml",
            Self::RunConfigurationsDir => "runConfigurations",
            Self::ConversionRecord => "conversion.toml",
            Self::BackupDir => ".settings-backup",
        }
    }
}

/// Suffix carried by every module descriptor file.
pub const MODULE_FILE_SUFFIX: &str = ".module.toml";

/// Macro expanded to the workspace root inside module paths.
pub const PROJECT_DIR_MACRO: &str = "$PROJECT_DIR$";

impl AsRef<Path> for SettingsPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for SettingsPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for SettingsPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
