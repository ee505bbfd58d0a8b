//! Converter contracts
//!
//! A [`ConverterProvider`] is the unit of registration: it names a
//! conversion and, given a context, produces a [`ProjectConverter`]. The
//! converter is a capability set of up to four [`ConversionProcessor`]s,
//! one per settings category, plus a finalize hook run once every
//! converter has post-processed. Any processor may be absent; its category is then never touched.

use crate::context::ConversionContext;
use crate::error::Result;
use crate::settings::{ModuleSettings, ProjectSettings, RunManagerSettings, WorkspaceSettings};

/// Strategy converting one settings category.
///
/// `is_conversion_needed` must not modify anything and must give the same
/// answer when asked twice about the same state.
pub trait ConversionProcessor<T> {
    /// Whether `settings` is written in an older schema.
    fn is_conversion_needed(&self, settings: &T) -> Result<bool>;

    /// Runs for every flagged file before any file is processed.
    fn pre_process(&self, _settings: &mut T) -> Result<()> {
        Ok(())
    }

    /// Rewrite `settings` to the current schema.
    fn process(&self, settings: &mut T) -> Result<()>;

    /// Runs for every flagged file after all files are processed.
    fn post_process(&self, _settings: &mut T) -> Result<()> {
        Ok(())
    }
}

pub type ProjectProcessor = Box<dyn ConversionProcessor<ProjectSettings>>;
pub type WorkspaceProcessor = Box<dyn ConversionProcessor<WorkspaceSettings>>;
pub type ModuleProcessor = Box<dyn ConversionProcessor<ModuleSettings>>;
pub type RunConfigurationProcessor = Box<dyn ConversionProcessor<RunManagerSettings>>;

type Finalizer = Box<dyn Fn(&mut ConversionContext) -> Result<()>>;

/// The processors one provider contributes to a conversion.
#[derive(Default)]
pub struct ProjectConverter {
    pub project_file: Option<ProjectProcessor>,
    pub workspace_file: Option<WorkspaceProcessor>,
    pub module_file: Option<ModuleProcessor>,
    pub run_configurations: Option<RunConfigurationProcessor>,
    finalizer: Option<Finalizer>,
}

impl ProjectConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project_file(mut self, processor: impl ConversionProcessor<ProjectSettings> + 'static) -> Self {
        self.project_file = Some(Box::new(processor));
        self
    }

    pub fn with_workspace_file(
        mut self,
        processor: impl ConversionProcessor<WorkspaceSettings> + 'static,
    ) -> Self {
        self.workspace_file = Some(Box::new(processor));
        self
    }

    pub fn with_module_file(mut self, processor: impl ConversionProcessor<ModuleSettings> + 'static) -> Self {
        self.module_file = Some(Box::new(processor));
        self
    }

    pub fn with_run_configurations(
        mut self,
        processor: impl ConversionProcessor<RunManagerSettings> + 'static,
    ) -> Self {
        self.run_configurations = Some(Box::new(processor));
        self
    }

    /// Hook run once at the end of post-processing, with the whole context.
    pub fn with_finalizer(
        mut self,
        finalizer: impl Fn(&mut ConversionContext) -> Result<()> + 'static,
    ) -> Self {
        self.finalizer = Some(Box::new(finalizer));
        self
    }

    /// Run the finalize hook, if any.
    pub fn finalize(&self, context: &mut ConversionContext) -> Result<()> {
        match &self.finalizer {
            Some(finalizer) => finalizer(context),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for ProjectConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectConverter")
            .field("project_file", &self.project_file.is_some())
            .field("workspace_file", &self.workspace_file.is_some())
            .field("module_file", &self.module_file.is_some())
            .field("run_configurations", &self.run_configurations.is_some())
            .field("finalizer", &self.finalizer.is_some())
            .finish()
    }
}

/// A registered conversion.
pub trait ConverterProvider {
    /// Unique id, recorded once the conversion has been applied.
    fn id(&self) -> &str;

    /// Human-readable summary shown when asking to convert.
    fn description(&self) -> &str;

    /// Ids of providers that must run before this one.
    fn preceding_converter_ids(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether the processors can tell from the files alone that this
    /// conversion has already run.
    ///
    /// Providers returning `false` are skipped once their id is recorded as
    /// applied.
    fn can_determine_if_conversion_already_performed_by_project_files(&self) -> bool {
        true
    }

    fn create_converter(&self, context: &ConversionContext) -> ProjectConverter;
}
