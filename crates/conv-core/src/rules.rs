//! Converters described by a rules file instead of code
//!
//! ```toml
//! id = "settings-v2"
//! description = "Move to schema 2"
//! preceding = ["settings-v1"]
//!
//! [project]
//! to_version = 2
//! rename_components = { OldCompiler = "CompilerConfiguration" }
//! remove_components = ["Obsolete"]
//!
//! [module]
//! to_version = 2
//!
//! [run_configurations.rename_types]
//! OldApplication = "Application"
//! ```

use std::collections::BTreeMap;

use conv_content::ComponentManagerSettings;
use conv_fs::{ConfigStore, NormalizedPath};
use serde::{Deserialize, Serialize};
use toml_edit::Item;

use crate::context::ConversionContext;
use crate::error::{Error, Result};
use crate::processor::{ConversionProcessor, ConverterProvider, ProjectConverter};
use crate::settings::RunManagerSettings;

/// Rules for one file category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRules {
    /// Files below this version need converting; converted files get it
    pub to_version: i64,
    #[serde(default)]
    pub rename_components: BTreeMap<String, String>,
    #[serde(default)]
    pub remove_components: Vec<String>,
}

/// Rules for the run configuration store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfigurationRules {
    /// Old configuration type to new configuration type
    #[serde(default)]
    pub rename_types: BTreeMap<String, String>,
}

/// A whole rules document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRules {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub preceding: Vec<String>,
    /// Set when the rules cannot be detected from file content alone
    #[serde(default)]
    pub record_only: bool,
    pub project: Option<FileRules>,
    pub workspace: Option<FileRules>,
    pub module: Option<FileRules>,
    pub run_configurations: Option<RunConfigurationRules>,
}

impl ConversionRules {
    /// Load rules from a TOML, JSON or YAML file.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let rules: Self = ConfigStore::new().load(path)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::cannot_convert("conversion rules need a non-empty id"));
        }
        if self.preceding.iter().any(|p| p == &self.id) {
            return Err(Error::cannot_convert(format!(
                "conversion rules '{}' cannot precede themselves",
                self.id
            )));
        }
        Ok(())
    }
}

impl FileRules {
    fn is_outdated<T: ComponentManagerSettings>(&self, settings: &T) -> bool {
        settings.version().unwrap_or(0) < self.to_version
    }

    /// Refuse renames that would overwrite an existing component.
    fn check_renames<T: ComponentManagerSettings>(&self, settings: &T) -> Result<()> {
        for (from, to) in &self.rename_components {
            if settings.component(from).is_some() && settings.component(to).is_some() {
                return Err(Error::cannot_convert_file(
                    settings.path(),
                    format!("cannot rename component '{from}': '{to}' already exists"),
                ));
            }
        }
        Ok(())
    }

    fn apply<T: ComponentManagerSettings>(&self, settings: &mut T) -> Result<()> {
        for (from, to) in &self.rename_components {
            if settings.settings_file_mut().rename_component(from, to)? {
                tracing::debug!(file = %settings.path(), %from, %to, "renamed component");
            }
        }
        for name in &self.remove_components {
            if settings.settings_file_mut().remove_component(name).is_some() {
                tracing::debug!(file = %settings.path(), component = %name, "removed component");
            }
        }
        Ok(())
    }
}

impl<T: ComponentManagerSettings> ConversionProcessor<T> for FileRules {
    fn is_conversion_needed(&self, settings: &T) -> Result<bool> {
        Ok(self.is_outdated(settings))
    }

    fn pre_process(&self, settings: &mut T) -> Result<()> {
        self.check_renames(settings)
    }

    fn process(&self, settings: &mut T) -> Result<()> {
        self.apply(settings)
    }

    fn post_process(&self, settings: &mut T) -> Result<()> {
        settings.set_version(self.to_version)?;
        Ok(())
    }
}

impl ConversionProcessor<RunManagerSettings> for RunConfigurationRules {
    fn is_conversion_needed(&self, settings: &RunManagerSettings) -> Result<bool> {
        Ok(settings.run_configurations().iter().any(|configuration| {
            configuration
                .get("type")
                .and_then(Item::as_str)
                .is_some_and(|kind| self.rename_types.contains_key(kind))
        }))
    }

    fn process(&self, settings: &mut RunManagerSettings) -> Result<()> {
        for configuration in settings.run_configurations_mut() {
            let renamed = configuration
                .get("type")
                .and_then(Item::as_str)
                .and_then(|kind| self.rename_types.get(kind))
                .cloned();
            if let Some(new_type) = renamed {
                configuration.insert("type", toml_edit::value(new_type));
            }
        }
        Ok(())
    }
}

/// [`ConverterProvider`] backed by a [`ConversionRules`] document.
#[derive(Debug, Clone)]
pub struct RulesProvider {
    rules: ConversionRules,
}

impl RulesProvider {
    pub fn new(rules: ConversionRules) -> Result<Self> {
        rules.validate()?;
        Ok(Self { rules })
    }

    pub fn from_file(path: &NormalizedPath) -> Result<Self> {
        let rules = ConversionRules::load(path)?;
        tracing::debug!(path = %path, converter = %rules.id, "loaded conversion rules");
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &ConversionRules {
        &self.rules
    }
}

impl ConverterProvider for RulesProvider {
    fn id(&self) -> &str {
        &self.rules.id
    }

    fn description(&self) -> &str {
        if self.rules.description.is_empty() {
            &self.rules.id
        } else {
            &self.rules.description
        }
    }

    fn preceding_converter_ids(&self) -> Vec<String> {
        self.rules.preceding.clone()
    }

    fn can_determine_if_conversion_already_performed_by_project_files(&self) -> bool {
        !self.rules.record_only
    }

    fn create_converter(&self, _context: &ConversionContext) -> ProjectConverter {
        let mut converter = ProjectConverter::new();
        if let Some(rules) = &self.rules.project {
            converter = converter.with_project_file(rules.clone());
        }
        if let Some(rules) = &self.rules.workspace {
            converter = converter.with_workspace_file(rules.clone());
        }
        if let Some(rules) = &self.rules.module {
            converter = converter.with_module_file(rules.clone());
        }
        if let Some(rules) = &self.rules.run_configurations {
            converter = converter.with_run_configurations(rules.clone());
        }
        converter
    }
}
