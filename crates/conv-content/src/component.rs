//! Read/patch view over the components of one settings file

use conv_fs::NormalizedPath;
use toml_edit::{DocumentMut, Table};

use crate::error::{Error, Result};
use crate::settings_file::SettingsFile;

/// A view over one [`SettingsFile`], addressed by component name.
///
/// Every typed settings view (project, workspace, module) implements this
/// by handing out its backing file; the provided methods do the rest.
pub trait ComponentManagerSettings {
    fn settings_file(&self) -> &SettingsFile;

    fn settings_file_mut(&mut self) -> &mut SettingsFile;

    fn path(&self) -> &NormalizedPath {
        self.settings_file().path()
    }

    fn document(&self) -> &DocumentMut {
        self.settings_file().document()
    }

    fn document_mut(&mut self) -> &mut DocumentMut {
        self.settings_file_mut().document_mut()
    }

    fn version(&self) -> Option<i64> {
        self.settings_file().version()
    }

    fn set_version(&mut self, version: i64) -> Result<()> {
        self.settings_file_mut().set_version(version)
    }

    fn component(&self, name: &str) -> Option<&Table> {
        self.settings_file().component(name)
    }

    fn component_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.settings_file_mut().component_mut(name)
    }

    /// Like [`component`](Self::component), but a missing section is an error.
    fn require_component(&self, name: &str) -> Result<&Table> {
        self.settings_file()
            .component(name)
            .ok_or_else(|| Error::ComponentNotFound {
                path: self.path().to_native(),
                name: name.to_string(),
            })
    }

    fn component_or_insert(&mut self, name: &str) -> Result<&mut Table> {
        self.settings_file_mut().component_or_insert(name)
    }

    fn save(&mut self) -> Result<()> {
        self.settings_file_mut().save()
    }
}

impl ComponentManagerSettings for SettingsFile {
    fn settings_file(&self) -> &SettingsFile {
        self
    }

    fn settings_file_mut(&mut self) -> &mut SettingsFile {
        self
    }
}
