//! Settings layout detection
//!
//! A workspace stores its settings either in one aggregate project file
//! (`project.toml` + `workspace.toml`) or in a `.settings/` directory with
//! one file per concern.

use std::path::Path;

use crate::constants::SettingsPath;
use crate::{Error, NormalizedPath, Result};

/// How project-level settings are stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageScheme {
    /// One aggregate project file next to a workspace file
    Default,
    /// A settings directory with one file per concern
    DirectoryBased,
}

impl std::fmt::Display for StorageScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "single-file"),
            Self::DirectoryBased => write!(f, "directory-based"),
        }
    }
}

/// Resolved locations of the fixed settings files of one workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsLayout {
    pub root: NormalizedPath,
    pub scheme: StorageScheme,
    pub project_file: NormalizedPath,
    pub workspace_file: NormalizedPath,
    pub settings_dir: Option<NormalizedPath>,
}

impl SettingsLayout {
    /// Detect the layout from a workspace directory or a project file.
    ///
    /// - a file path selects the single-file scheme with that project file,
    ///   unless it is the workspace file itself
    /// - a directory containing `.settings/` selects the directory scheme
    /// - a directory containing `project.toml` selects the single-file scheme
    pub fn detect(project_path: impl AsRef<Path>) -> Result<Self> {
        let absolute = std::path::absolute(project_path.as_ref())
            .map_err(|e| Error::io(project_path.as_ref(), e))?;
        let path = NormalizedPath::new(&absolute);

        if path.is_file() {
            let layout = Self::single_file(path);
            // The workspace file cannot double as the project file
            if layout.project_file == layout.workspace_file {
                return Err(Error::LayoutDetectionFailed { path: absolute });
            }
            tracing::debug!(project_file = %layout.project_file, "using explicit project file");
            return Ok(layout);
        }

        let settings_dir = path.join(SettingsPath::SettingsDir.as_str());
        if settings_dir.is_dir() {
            tracing::debug!(root = %path, "detected directory-based settings");
            return Ok(Self::directory_based(path));
        }

        let project_file = path.join(SettingsPath::ProjectFile.as_str());
        if project_file.is_file() {
            tracing::debug!(root = %path, "detected single-file settings");
            return Ok(Self::single_file(project_file));
        }

        Err(Error::LayoutDetectionFailed { path: absolute })
    }

    /// Single-file layout around an explicit project file.
    pub fn single_file(project_file: NormalizedPath) -> Self {
        let root = project_file
            .parent()
            .unwrap_or_else(|| NormalizedPath::new("."));
        let workspace_file = root.join(SettingsPath::WorkspaceFile.as_str());
        Self {
            root,
            scheme: StorageScheme::Default,
            project_file,
            workspace_file,
            settings_dir: None,
        }
    }

    /// Directory-based layout rooted at `root`.
    pub fn directory_based(root: NormalizedPath) -> Self {
        let settings_dir = root.join(SettingsPath::SettingsDir.as_str());
        Self {
            project_file: settings_dir.join(SettingsPath::MiscFile.as_str()),
            workspace_file: settings_dir.join(SettingsPath::WorkspaceFile.as_str()),
            settings_dir: Some(settings_dir),
            scheme: StorageScheme::DirectoryBased,
            root,
        }
    }

    /// File holding the `ProjectModuleManager` component.
    pub fn modules_file(&self) -> NormalizedPath {
        match &self.settings_dir {
            Some(dir) => dir.join(SettingsPath::ModulesFile.as_str()),
            None => self.project_file.clone(),
        }
    }

    /// Directory of shared run configuration stores (directory scheme only).
    pub fn run_configurations_dir(&self) -> Option<NormalizedPath> {
        self.settings_dir
            .as_ref()
            .map(|dir| dir.join(SettingsPath::RunConfigurationsDir.as_str()))
    }

    /// Where the list of already-applied converters is recorded.
    pub fn conversion_record(&self) -> NormalizedPath {
        match &self.settings_dir {
            Some(dir) => dir.join(SettingsPath::ConversionRecord.as_str()),
            None => self
                .root
                .join(&format!(".{}", SettingsPath::ConversionRecord.as_str())),
        }
    }

    /// Root directory for conversion backups.
    pub fn backup_dir(&self) -> NormalizedPath {
        self.root.join(SettingsPath::BackupDir.as_str())
    }
}
