//! Typed views over the settings files of a workspace
//!
//! A view owns the [`SettingsFile`]s it covers for the duration of one
//! processor call; [`ConversionContext`](crate::ConversionContext) checks
//! them out of its cache and puts them back afterwards.

use conv_content::{ComponentManagerSettings, SettingsFile};
use conv_fs::constants::{MODULE_FILE_SUFFIX, PROJECT_DIR_MACRO};
use conv_fs::{NormalizedPath, StorageScheme};
use toml_edit::{Item, Table, Value};

use crate::error::{Error, Result};

/// Component listing the module files of a project.
pub const MODULE_MANAGER_COMPONENT: &str = "ProjectModuleManager";

/// Key inside [`MODULE_MANAGER_COMPONENT`] holding the module entries.
pub const MODULES_KEY: &str = "modules";

/// Component holding a module's own descriptor.
pub const MODULE_COMPONENT: &str = "Module";

/// Workspace component holding private run configurations.
pub const RUN_MANAGER_COMPONENT: &str = "RunManager";

/// Component holding shared run configurations.
pub const SHARED_RUN_CONFIGURATIONS_COMPONENT: &str = "ProjectRunConfigurationManager";

/// Array-of-tables key holding run configuration entries.
pub const CONFIGURATION_KEY: &str = "configuration";

/// The project file of a workspace.
#[derive(Debug)]
pub struct ProjectSettings {
    file: SettingsFile,
    root: NormalizedPath,
}

impl ProjectSettings {
    pub(crate) fn new(file: SettingsFile, root: NormalizedPath) -> Self {
        Self { file, root }
    }

    pub(crate) fn into_file(self) -> SettingsFile {
        self.file
    }

    /// Module files listed in this project file, resolved against the root.
    ///
    /// Only meaningful for the single-file scheme; the directory scheme keeps
    /// its module list in a separate file.
    pub fn module_paths(&self) -> Result<Vec<NormalizedPath>> {
        module_entries(&self.file, &self.root)
    }
}

impl ComponentManagerSettings for ProjectSettings {
    fn settings_file(&self) -> &SettingsFile {
        &self.file
    }

    fn settings_file_mut(&mut self) -> &mut SettingsFile {
        &mut self.file
    }
}

/// The per-user workspace file.
#[derive(Debug)]
pub struct WorkspaceSettings {
    file: SettingsFile,
}

impl WorkspaceSettings {
    pub(crate) fn new(file: SettingsFile) -> Self {
        Self { file }
    }

    pub(crate) fn into_file(self) -> SettingsFile {
        self.file
    }
}

impl ComponentManagerSettings for WorkspaceSettings {
    fn settings_file(&self) -> &SettingsFile {
        &self.file
    }

    fn settings_file_mut(&mut self) -> &mut SettingsFile {
        &mut self.file
    }
}

/// One module descriptor file.
#[derive(Debug)]
pub struct ModuleSettings {
    file: SettingsFile,
}

impl ModuleSettings {
    pub(crate) fn new(file: SettingsFile) -> Self {
        Self { file }
    }

    pub(crate) fn into_file(self) -> SettingsFile {
        self.file
    }

    pub fn module_file(&self) -> &NormalizedPath {
        self.file.path()
    }

    /// The file name without the module suffix.
    pub fn module_name(&self) -> &str {
        let name = self.file.path().file_name().unwrap_or_default();
        name.strip_suffix(MODULE_FILE_SUFFIX)
            .or_else(|| name.strip_suffix(".toml"))
            .unwrap_or(name)
    }

    /// The `type` declared in the `Module` component, if any.
    pub fn module_type(&self) -> Option<&str> {
        self.file.component(MODULE_COMPONENT)?.get("type")?.as_str()
    }

    pub fn set_module_type(&mut self, module_type: &str) -> Result<()> {
        self.file
            .component_or_insert(MODULE_COMPONENT)?
            .insert("type", toml_edit::value(module_type));
        Ok(())
    }
}

impl ComponentManagerSettings for ModuleSettings {
    fn settings_file(&self) -> &SettingsFile {
        &self.file
    }

    fn settings_file_mut(&mut self) -> &mut SettingsFile {
        &mut self.file
    }
}

/// Aggregate view over every run configuration of a workspace.
///
/// Spans the workspace file's private `RunManager` component and the shared
/// stores: the project file in the single-file scheme, each file under
/// `runConfigurations/` in the directory scheme.
#[derive(Debug)]
pub struct RunManagerSettings {
    scheme: StorageScheme,
    workspace: SettingsFile,
    shared: Vec<SettingsFile>,
}

impl RunManagerSettings {
    pub(crate) fn new(scheme: StorageScheme, workspace: SettingsFile, shared: Vec<SettingsFile>) -> Self {
        Self {
            scheme,
            workspace,
            shared,
        }
    }

    pub(crate) fn into_files(self) -> Vec<SettingsFile> {
        let mut files = Vec::with_capacity(self.shared.len() + 1);
        files.push(self.workspace);
        files.extend(self.shared);
        files
    }

    pub fn storage_scheme(&self) -> StorageScheme {
        self.scheme
    }

    pub fn workspace_file(&self) -> &SettingsFile {
        &self.workspace
    }

    pub fn shared_files(&self) -> &[SettingsFile] {
        &self.shared
    }

    /// All run configuration entries, workspace first, each in document order.
    pub fn run_configurations(&self) -> Vec<&Table> {
        let mut entries = configurations(&self.workspace, RUN_MANAGER_COMPONENT);
        for file in &self.shared {
            entries.extend(configurations(file, SHARED_RUN_CONFIGURATIONS_COMPONENT));
        }
        entries
    }

    pub fn run_configurations_mut(&mut self) -> Vec<&mut Table> {
        let mut entries = configurations_mut(&mut self.workspace, RUN_MANAGER_COMPONENT);
        for file in &mut self.shared {
            entries.extend(configurations_mut(file, SHARED_RUN_CONFIGURATIONS_COMPONENT));
        }
        entries
    }

    /// Backing files that exist on disk, workspace file first.
    pub fn affected_files(&self) -> Vec<NormalizedPath> {
        std::iter::once(&self.workspace)
            .chain(&self.shared)
            .filter(|file| file.is_persisted())
            .map(|file| file.path().clone())
            .collect()
    }
}

fn configurations<'a>(file: &'a SettingsFile, component: &str) -> Vec<&'a Table> {
    file.component(component)
        .and_then(|c| c.get(CONFIGURATION_KEY))
        .and_then(Item::as_array_of_tables)
        .map(|entries| entries.iter().collect())
        .unwrap_or_default()
}

fn configurations_mut<'a>(file: &'a mut SettingsFile, component: &str) -> Vec<&'a mut Table> {
    file.component_mut(component)
        .and_then(|c| c.get_mut(CONFIGURATION_KEY))
        .and_then(Item::as_array_of_tables_mut)
        .map(|entries| entries.iter_mut().collect())
        .unwrap_or_default()
}

/// Read the module entries of a `ProjectModuleManager` component.
///
/// Entries are either plain path strings or inline tables with a `path` key.
/// Duplicates are dropped, keeping the first occurrence.
pub(crate) fn module_entries(file: &SettingsFile, root: &NormalizedPath) -> Result<Vec<NormalizedPath>> {
    let Some(item) = file
        .component(MODULE_MANAGER_COMPONENT)
        .and_then(|c| c.get(MODULES_KEY))
    else {
        return Ok(Vec::new());
    };
    let entries = item.as_array().ok_or_else(|| {
        Error::cannot_convert_file(
            file.path(),
            format!("'{MODULE_MANAGER_COMPONENT}.{MODULES_KEY}' must be an array"),
        )
    })?;

    let mut modules: Vec<NormalizedPath> = Vec::new();
    for entry in entries.iter() {
        let raw = match entry {
            Value::String(s) => s.value().as_str(),
            Value::InlineTable(t) => t.get("path").and_then(Value::as_str).ok_or_else(|| {
                Error::cannot_convert_file(file.path(), "module entry has no 'path'")
            })?,
            other => {
                return Err(Error::cannot_convert_file(
                    file.path(),
                    format!("unsupported module entry: {}", other.to_string().trim()),
                ));
            }
        };
        let module = expand_module_path(raw, root);
        if !modules.contains(&module) {
            modules.push(module);
        }
    }
    Ok(modules)
}

/// Expand `$PROJECT_DIR$` and resolve relative entries against the root.
pub fn expand_module_path(raw: &str, root: &NormalizedPath) -> NormalizedPath {
    let expanded = raw.replace(PROJECT_DIR_MACRO, root.as_str());
    root.join(&expanded)
}
