//! In-memory representation of one settings file

use conv_fs::{NormalizedPath, io};
use toml_edit::{DocumentMut, Item, Table};

use crate::diff::SettingsDiff;
use crate::error::{Error, Result};
use crate::normalize::table_to_json;

/// Top-level table holding the named components of a settings file.
pub const COMPONENT_KEY: &str = "component";

/// Top-level key holding the schema version of a settings file.
pub const VERSION_KEY: &str = "version";

/// One physical settings file and its parsed, format-preserving document.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: NormalizedPath,
    /// Text last read from or written to disk; `None` if the file did not exist
    persisted: Option<String>,
    document: DocumentMut,
}

impl SettingsFile {
    /// Load a settings file from disk.
    ///
    /// A file that does not exist yet loads as an empty document; it is only
    /// created on disk if something is written into it and saved.
    pub fn load(path: NormalizedPath) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path, "settings file absent, starting empty");
            return Ok(Self {
                path,
                persisted: None,
                document: DocumentMut::new(),
            });
        }
        let source = io::read_text(&path)?;
        let mut file = Self::parse(path, &source)?;
        file.persisted = Some(source);
        Ok(file)
    }

    /// Parse settings from text without touching the filesystem.
    pub fn parse(path: NormalizedPath, source: &str) -> Result<Self> {
        let document: DocumentMut = source.parse().map_err(|e: toml_edit::TomlError| {
            Error::Parse {
                path: path.to_native(),
                message: e.to_string(),
            }
        })?;
        Ok(Self {
            path,
            persisted: Some(source.to_string()),
            document,
        })
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    /// Whether the file existed when loaded (or has been saved since).
    pub fn is_persisted(&self) -> bool {
        self.persisted.is_some()
    }

    pub fn document(&self) -> &DocumentMut {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut DocumentMut {
        &mut self.document
    }

    /// The top-level `version` of the document, if it is an integer.
    pub fn version(&self) -> Option<i64> {
        self.document.get(VERSION_KEY).and_then(Item::as_integer)
    }

    /// Set the top-level `version`, keeping any comment attached to it.
    ///
    /// A `version` key holding a table is left alone and reported.
    pub fn set_version(&mut self, version: i64) -> Result<()> {
        match self.document.get_mut(VERSION_KEY) {
            None => {
                self.document
                    .insert(VERSION_KEY, toml_edit::value(version));
            }
            Some(item) => {
                let value = item.as_value_mut().ok_or_else(|| Error::NotAValue {
                    path: self.path.to_native(),
                    name: VERSION_KEY.to_string(),
                })?;
                let decor = value.decor().clone();
                *value = toml_edit::Value::from(version);
                *value.decor_mut() = decor;
            }
        }
        Ok(())
    }

    /// Names of all components, in document order.
    pub fn component_names(&self) -> Vec<String> {
        self.components()
            .map(|t| t.iter().map(|(k, _)| k.to_string()).collect())
            .unwrap_or_default()
    }

    /// Look up a component section by name.
    pub fn component(&self, name: &str) -> Option<&Table> {
        self.components()?.get(name)?.as_table()
    }

    /// Mutable access to an existing component section.
    pub fn component_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.document
            .get_mut(COMPONENT_KEY)?
            .as_table_mut()?
            .get_mut(name)?
            .as_table_mut()
    }

    /// Get a component section, creating an empty one if needed.
    pub fn component_or_insert(&mut self, name: &str) -> Result<&mut Table> {
        let path = self.path.to_native();
        let components = self
            .document
            .entry(COMPONENT_KEY)
            .or_insert_with(|| {
                let mut table = Table::new();
                table.set_implicit(true);
                Item::Table(table)
            })
            .as_table_mut()
            .ok_or_else(|| Error::NotATable {
                path: path.clone(),
                name: COMPONENT_KEY.to_string(),
            })?;
        components
            .entry(name)
            .or_insert_with(|| Item::Table(Table::new()))
            .as_table_mut()
            .ok_or(Error::NotATable {
                path,
                name: name.to_string(),
            })
    }

    /// Remove a component section, returning it if it existed.
    pub fn remove_component(&mut self, name: &str) -> Option<Table> {
        let removed = self
            .document
            .get_mut(COMPONENT_KEY)?
            .as_table_mut()?
            .remove(name)?;
        match removed {
            Item::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Rename a component section, keeping its contents.
    ///
    /// Returns `Ok(false)` if there is no component named `from`.
    pub fn rename_component(&mut self, from: &str, to: &str) -> Result<bool> {
        if self.component(from).is_none() {
            return Ok(false);
        }
        if self.component(to).is_some() {
            return Err(Error::ComponentExists {
                path: self.path.to_native(),
                name: to.to_string(),
            });
        }
        let Some(table) = self.remove_component(from) else {
            return Ok(false);
        };
        if let Some(components) = self
            .document
            .get_mut(COMPONENT_KEY)
            .and_then(Item::as_table_mut)
        {
            components.insert(to, Item::Table(table));
        }
        Ok(true)
    }

    /// Render the document, preserving the original formatting.
    pub fn render(&self) -> String {
        self.document.to_string()
    }

    /// Whether the in-memory document differs from what is on disk.
    pub fn is_modified(&self) -> bool {
        let rendered = self.render();
        match &self.persisted {
            Some(source) => *source != rendered,
            None => !rendered.is_empty(),
        }
    }

    /// Semantic changes between the persisted text and the current document.
    pub fn diff(&self) -> Result<SettingsDiff> {
        let before = match &self.persisted {
            Some(source) => {
                let doc: DocumentMut =
                    source.parse().map_err(|e: toml_edit::TomlError| Error::Parse {
                        path: self.path.to_native(),
                        message: e.to_string(),
                    })?;
                table_to_json(doc.as_table())
            }
            None => serde_json::Value::Object(serde_json::Map::new()),
        };
        Ok(SettingsDiff::compute(
            &before,
            &table_to_json(self.document.as_table()),
        ))
    }

    /// Write the document back to its path atomically.
    pub fn save(&mut self) -> Result<()> {
        let rendered = self.render();
        io::write_text(&self.path, &rendered)?;
        tracing::debug!(path = %self.path, "saved settings file");
        self.persisted = Some(rendered);
        Ok(())
    }

    fn components(&self) -> Option<&Table> {
        self.document.get(COMPONENT_KEY)?.as_table()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = r#"# Project descriptor
version = 1 # schema

[component.ProjectModuleManager]
modules = ["$PROJECT_DIR$/core/core.module.toml"]

# keep me
[component.Unrelated]
answer = 42
"#;

    fn file() -> SettingsFile {
        SettingsFile::parse(NormalizedPath::new("/ws/project.toml"), SOURCE).unwrap()
    }

    #[test]
    fn render_without_edits_is_identical() {
        let file = file();
        assert_eq!(file.render(), SOURCE);
        assert!(!file.is_modified());
    }

    #[test]
    fn version_roundtrip_keeps_comment() {
        let mut file = file();
        assert_eq!(file.version(), Some(1));
        file.set_version(2).unwrap();
        assert_eq!(file.version(), Some(2));
        assert!(file.render().contains("version = 2 # schema"));
        assert!(file.is_modified());
    }

    #[test]
    fn set_version_refuses_version_table() {
        let source = "[version]\nmajor = 1\n";
        let mut file = SettingsFile::parse(NormalizedPath::new("/ws/a.toml"), source).unwrap();
        let err = file.set_version(2).unwrap_err();
        assert!(matches!(err, Error::NotAValue { .. }), "got: {err}");
        assert_eq!(file.render(), source);
    }

    #[test]
    fn set_version_inserts_when_missing() {
        let mut file =
            SettingsFile::parse(NormalizedPath::new("/ws/a.toml"), "[component.A]\nx = 1\n").unwrap();
        assert_eq!(file.version(), None);
        file.set_version(3).unwrap();
        assert_eq!(file.version(), Some(3));
    }

    #[test]
    fn component_lookup() {
        let file = file();
        assert_eq!(
            file.component_names(),
            vec!["ProjectModuleManager".to_string(), "Unrelated".to_string()]
        );
        assert!(file.component("ProjectModuleManager").is_some());
        assert!(file.component("Missing").is_none());
    }

    #[test]
    fn component_or_insert_creates_section() {
        let mut file = file();
        file.component_or_insert("NewComponent")
            .unwrap()
            .insert("enabled", toml_edit::value(true));
        assert!(file.render().contains("[component.NewComponent]"));
        assert!(file.render().contains("# keep me\n[component.Unrelated]\nanswer = 42"));
    }

    #[test]
    fn rename_component_keeps_unrelated_sections() {
        let mut file = file();
        assert!(file.rename_component("ProjectModuleManager", "ModuleManager").unwrap());
        assert!(file.component("ModuleManager").is_some());
        assert!(file.component("ProjectModuleManager").is_none());
        assert!(file.render().contains("# keep me\n[component.Unrelated]\nanswer = 42"));
        assert!(!file.rename_component("Missing", "Other").unwrap());
    }

    #[test]
    fn rename_onto_existing_component_fails() {
        let mut file = file();
        let result = file.rename_component("ProjectModuleManager", "Unrelated");
        assert!(matches!(result, Err(Error::ComponentExists { .. })));
    }

    #[test]
    fn parse_error_carries_path() {
        let err = SettingsFile::parse(NormalizedPath::new("/ws/bad.toml"), "[component\n").unwrap_err();
        assert!(err.to_string().contains("/ws/bad.toml"), "got: {err}");
    }

    #[test]
    fn diff_reports_version_change() {
        let mut file = file();
        file.set_version(2).unwrap();
        let diff = file.diff().unwrap();
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].path(), "version");
    }
}
