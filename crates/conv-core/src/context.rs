//! Shared state of one conversion attempt

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use conv_content::SettingsFile;
use conv_fs::{NormalizedPath, SettingsLayout, StorageScheme};

use crate::error::{Error, Result};
use crate::settings::{
    ModuleSettings, ProjectSettings, RunManagerSettings, WorkspaceSettings, module_entries,
};

/// Holds the settings layout, the module file list and every loaded
/// [`SettingsFile`] of one workspace.
///
/// Files are loaded lazily and cached by path, so every runner of a
/// conversion sees the edits of the runners before it. The typed views are
/// handed out through closures: the backing file is checked out of the
/// cache for the call and returned afterwards, whether or not the call
/// succeeded.
#[derive(Debug)]
pub struct ConversionContext {
    layout: SettingsLayout,
    module_files: Vec<NormalizedPath>,
    files: HashMap<NormalizedPath, SettingsFile>,
}

impl ConversionContext {
    /// Open the workspace at `project_path` (a root directory or a project
    /// file) and discover its module files.
    pub fn new(project_path: impl AsRef<Path>) -> Result<Self> {
        let layout = SettingsLayout::detect(project_path)?;
        Self::from_layout(layout)
    }

    /// Open a workspace whose layout is already known.
    pub fn from_layout(layout: SettingsLayout) -> Result<Self> {
        let mut context = Self::with_files(layout, Vec::new());
        let modules_file = context.layout.modules_file();
        let file = context.take_file(&modules_file)?;
        let discovered = module_entries(&file, &context.layout.root);
        context.restore_file(file);
        for module in discovered? {
            context.add_module_file(module);
        }
        tracing::debug!(
            root = %context.layout.root,
            scheme = %context.layout.scheme,
            modules = context.module_files.len(),
            "opened conversion context"
        );
        Ok(context)
    }

    /// A context over caller-enumerated files; no module discovery happens.
    pub fn with_files(layout: SettingsLayout, module_files: Vec<NormalizedPath>) -> Self {
        let mut context = Self {
            layout,
            module_files: Vec::new(),
            files: HashMap::new(),
        };
        for module in module_files {
            context.add_module_file(module);
        }
        context
    }

    pub fn layout(&self) -> &SettingsLayout {
        &self.layout
    }

    pub fn storage_scheme(&self) -> StorageScheme {
        self.layout.scheme
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.layout.root
    }

    pub fn project_file(&self) -> &NormalizedPath {
        &self.layout.project_file
    }

    pub fn workspace_file(&self) -> &NormalizedPath {
        &self.layout.workspace_file
    }

    pub fn settings_dir(&self) -> Option<&NormalizedPath> {
        self.layout.settings_dir.as_ref()
    }

    /// Known module files, in discovery order.
    pub fn module_files(&self) -> &[NormalizedPath] {
        &self.module_files
    }

    /// Register a module file discovered after the context was opened.
    ///
    /// Returns `false` if it was already known.
    pub fn add_module_file(&mut self, file: impl Into<NormalizedPath>) -> bool {
        let file = file.into();
        if self.module_files.contains(&file) {
            return false;
        }
        tracing::trace!(module = %file, "registered module file");
        self.module_files.push(file);
        true
    }

    /// Shared run configuration stores of the directory scheme, by name.
    pub fn run_configuration_files(&self) -> Result<Vec<NormalizedPath>> {
        let Some(dir) = self.layout.run_configurations_dir() else {
            return Ok(Vec::new());
        };
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let native = dir.to_native();
        let mut files = Vec::new();
        for entry in fs::read_dir(&native).map_err(|e| conv_fs::Error::io(&native, e))? {
            let entry = entry.map_err(|e| conv_fs::Error::io(&native, e))?;
            let path = NormalizedPath::new(entry.path());
            if path.extension() == Some("toml") && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn with_project_settings<R>(
        &mut self,
        f: impl FnOnce(&mut ProjectSettings) -> Result<R>,
    ) -> Result<R> {
        let path = self.layout.project_file.clone();
        let mut settings = ProjectSettings::new(self.take_file(&path)?, self.layout.root.clone());
        let result = f(&mut settings);
        self.restore_file(settings.into_file());
        result
    }

    pub fn with_workspace_settings<R>(
        &mut self,
        f: impl FnOnce(&mut WorkspaceSettings) -> Result<R>,
    ) -> Result<R> {
        let path = self.layout.workspace_file.clone();
        let mut settings = WorkspaceSettings::new(self.take_file(&path)?);
        let result = f(&mut settings);
        self.restore_file(settings.into_file());
        result
    }

    /// Fails with cannot-convert when `file` is neither loaded nor on disk.
    pub fn with_module_settings<R>(
        &mut self,
        file: &NormalizedPath,
        f: impl FnOnce(&mut ModuleSettings) -> Result<R>,
    ) -> Result<R> {
        if !self.files.contains_key(file) && !file.exists() {
            return Err(Error::cannot_convert_file(file, "module file does not exist"));
        }
        let mut settings = ModuleSettings::new(self.take_file(file)?);
        let result = f(&mut settings);
        self.restore_file(settings.into_file());
        result
    }

    pub fn with_run_manager_settings<R>(
        &mut self,
        f: impl FnOnce(&mut RunManagerSettings) -> Result<R>,
    ) -> Result<R> {
        let workspace_path = self.layout.workspace_file.clone();
        let mut shared_paths = match self.layout.scheme {
            StorageScheme::Default => vec![self.layout.project_file.clone()],
            StorageScheme::DirectoryBased => self.run_configuration_files()?,
        };
        // Each file is checked out once; a second copy would overwrite the first on return
        shared_paths.retain(|path| *path != workspace_path);

        let workspace = self.take_file(&workspace_path)?;
        let mut shared = Vec::with_capacity(shared_paths.len());
        for path in &shared_paths {
            match self.take_file(path) {
                Ok(file) => shared.push(file),
                Err(e) => {
                    self.restore_file(workspace);
                    for file in shared {
                        self.restore_file(file);
                    }
                    return Err(e);
                }
            }
        }

        let mut settings = RunManagerSettings::new(self.layout.scheme, workspace, shared);
        let result = f(&mut settings);
        for file in settings.into_files() {
            self.restore_file(file);
        }
        result
    }

    /// Files the run configuration settings declare as affected.
    pub fn run_manager_affected_files(&mut self) -> Result<Vec<NormalizedPath>> {
        self.with_run_manager_settings(|settings| Ok(settings.affected_files()))
    }

    /// Paths of every file loaded so far, sorted.
    pub fn loaded_files(&self) -> Vec<NormalizedPath> {
        let mut paths: Vec<_> = self.files.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Loaded file at `path`, if it has been loaded.
    pub fn loaded_file(&self, path: &NormalizedPath) -> Option<&SettingsFile> {
        self.files.get(path)
    }

    /// Write every listed file that is loaded and modified.
    ///
    /// Returns the paths actually written, in input order.
    pub fn save_files(&mut self, files: &[NormalizedPath]) -> Result<Vec<NormalizedPath>> {
        let mut saved = Vec::new();
        for path in files {
            let Some(file) = self.files.get_mut(path) else {
                continue;
            };
            if !file.is_modified() {
                tracing::trace!(path = %path, "unchanged, not saving");
                continue;
            }
            file.save()?;
            saved.push(path.clone());
        }
        Ok(saved)
    }

    fn take_file(&mut self, path: &NormalizedPath) -> Result<SettingsFile> {
        if let Some(file) = self.files.remove(path) {
            return Ok(file);
        }
        SettingsFile::load(path.clone()).map_err(|e| match e {
            conv_content::Error::Parse { message, .. } => Error::cannot_convert_file(path, message),
            other => Error::from(other),
        })
    }

    fn restore_file(&mut self, file: SettingsFile) {
        self.files.insert(file.path().clone(), file);
    }
}
