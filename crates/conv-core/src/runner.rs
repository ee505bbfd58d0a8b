//! Detection and three-phase execution of one converter

use conv_fs::{NormalizedPath, StorageScheme, io};

use crate::context::ConversionContext;
use crate::error::{Error, Result};
use crate::processor::{ConversionProcessor, ConverterProvider, ProjectConverter};

/// What one converter found to convert.
///
/// Produced by [`ConversionRunner::detect`] and required by every phase, so
/// a phase can never run before detection. Re-run detection for a fresh plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionPlan {
    provider_id: String,
    project_file: bool,
    workspace_file: bool,
    module_files: Vec<NormalizedPath>,
    run_configurations: bool,
}

impl ConversionPlan {
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn project_file(&self) -> bool {
        self.project_file
    }

    pub fn workspace_file(&self) -> bool {
        self.workspace_file
    }

    /// Flagged module files, in discovery order.
    pub fn module_files(&self) -> &[NormalizedPath] {
        &self.module_files
    }

    pub fn run_configurations(&self) -> bool {
        self.run_configurations
    }

    pub fn is_conversion_needed(&self) -> bool {
        self.project_file
            || self.workspace_file
            || !self.module_files.is_empty()
            || self.run_configurations
    }
}

/// One of the three execution phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreProcess,
    Process,
    PostProcess,
}

impl Phase {
    fn apply<T>(self, processor: &dyn ConversionProcessor<T>, settings: &mut T) -> Result<()> {
        match self {
            Self::PreProcess => processor.pre_process(settings),
            Self::Process => processor.process(settings),
            Self::PostProcess => processor.post_process(settings),
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreProcess => write!(f, "pre-process"),
            Self::Process => write!(f, "process"),
            Self::PostProcess => write!(f, "post-process"),
        }
    }
}

/// Binds one provider's converter to a [`ConversionContext`].
///
/// Categories are always visited in the same order: project file,
/// workspace file, module files, run configurations.
#[derive(Debug)]
pub struct ConversionRunner {
    provider_id: String,
    description: String,
    converter: ProjectConverter,
}

impl ConversionRunner {
    pub fn new(provider: &dyn ConverterProvider, context: &ConversionContext) -> Self {
        Self {
            provider_id: provider.id().to_string(),
            description: provider.description().to_string(),
            converter: provider.create_converter(context),
        }
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Ask every processor whether its category needs converting.
    ///
    /// The project file is only considered in the single-file scheme, the
    /// workspace file and module files only if they exist on disk.
    pub fn detect(&self, context: &mut ConversionContext) -> Result<ConversionPlan> {
        let project_file = match &self.converter.project_file {
            Some(processor) if context.storage_scheme() == StorageScheme::Default => {
                context.with_project_settings(|s| processor.is_conversion_needed(s))?
            }
            _ => false,
        };

        let workspace_file = match &self.converter.workspace_file {
            Some(processor) if context.workspace_file().exists() => {
                context.with_workspace_settings(|s| processor.is_conversion_needed(s))?
            }
            _ => false,
        };

        let mut module_files = Vec::new();
        if let Some(processor) = &self.converter.module_file {
            for file in context.module_files().to_vec() {
                if !file.exists() {
                    tracing::debug!(converter = %self.provider_id, module = %file, "module file absent, skipping");
                    continue;
                }
                if context.with_module_settings(&file, |s| processor.is_conversion_needed(s))? {
                    module_files.push(file);
                }
            }
        }

        let run_configurations = match &self.converter.run_configurations {
            Some(processor) => context.with_run_manager_settings(|s| processor.is_conversion_needed(s))?,
            None => false,
        };

        let plan = ConversionPlan {
            provider_id: self.provider_id.clone(),
            project_file,
            workspace_file,
            module_files,
            run_configurations,
        };
        tracing::debug!(
            converter = %self.provider_id,
            project_file = plan.project_file,
            workspace_file = plan.workspace_file,
            module_files = plan.module_files.len(),
            run_configurations = plan.run_configurations,
            "detection finished"
        );
        Ok(plan)
    }

    pub fn is_conversion_needed(&self, context: &mut ConversionContext) -> Result<bool> {
        Ok(self.detect(context)?.is_conversion_needed())
    }

    /// Whether a single module file needs converting, independent of any plan.
    pub fn is_module_conversion_needed(
        &self,
        context: &mut ConversionContext,
        file: &NormalizedPath,
    ) -> Result<bool> {
        match &self.converter.module_file {
            Some(processor) => context.with_module_settings(file, |s| processor.is_conversion_needed(s)),
            None => Ok(false),
        }
    }

    /// Files the plan will modify, in category order, each listed once.
    ///
    /// A failure to list the run configuration files is logged and those
    /// files are left out.
    pub fn affected_files(
        &self,
        context: &mut ConversionContext,
        plan: &ConversionPlan,
    ) -> Vec<NormalizedPath> {
        let mut files = Vec::new();
        if plan.project_file {
            files.push(context.project_file().clone());
        }
        if plan.workspace_file {
            files.push(context.workspace_file().clone());
        }
        files.extend(plan.module_files.iter().cloned());
        if plan.run_configurations {
            match context.run_manager_affected_files() {
                Ok(run_files) => {
                    for file in run_files {
                        if !files.contains(&file) {
                            files.push(file);
                        }
                    }
                }
                Err(e) => tracing::debug!(
                    converter = %self.provider_id,
                    error = %e,
                    "cannot list run configuration files"
                ),
            }
        }
        files
    }

    /// The subset of `files` that cannot be written, in input order.
    pub fn read_only_files(files: &[NormalizedPath]) -> Vec<NormalizedPath> {
        files
            .iter()
            .filter(|file| !io::is_writable(file))
            .cloned()
            .collect()
    }

    pub fn pre_process(&self, context: &mut ConversionContext, plan: &ConversionPlan) -> Result<()> {
        self.run_phase(context, plan, Phase::PreProcess)
    }

    pub fn process(&self, context: &mut ConversionContext, plan: &ConversionPlan) -> Result<()> {
        self.run_phase(context, plan, Phase::Process)
    }

    pub fn post_process(&self, context: &mut ConversionContext, plan: &ConversionPlan) -> Result<()> {
        self.run_phase(context, plan, Phase::PostProcess)
    }

    /// Run the converter's finalize hook.
    ///
    /// Meant to be called once every runner has finished post-processing.
    /// An empty plan skips it.
    pub fn finalize(&self, context: &mut ConversionContext, plan: &ConversionPlan) -> Result<()> {
        self.check_plan(plan)?;
        if !plan.is_conversion_needed() {
            return Ok(());
        }
        tracing::debug!(converter = %self.provider_id, "finalizing");
        self.converter.finalize(context)
    }

    fn check_plan(&self, plan: &ConversionPlan) -> Result<()> {
        if plan.provider_id != self.provider_id {
            return Err(Error::PlanMismatch {
                plan: plan.provider_id.clone(),
                runner: self.provider_id.clone(),
            });
        }
        Ok(())
    }

    /// Run all three phases on one module file, without consulting a plan.
    pub fn convert_module(&self, context: &mut ConversionContext, file: &NormalizedPath) -> Result<()> {
        let Some(processor) = &self.converter.module_file else {
            tracing::debug!(converter = %self.provider_id, module = %file, "no module processor");
            return Ok(());
        };
        tracing::info!(converter = %self.provider_id, module = %file, "converting module");
        context.with_module_settings(file, |settings| {
            processor.pre_process(settings)?;
            processor.process(settings)?;
            processor.post_process(settings)
        })
    }

    fn run_phase(&self, context: &mut ConversionContext, plan: &ConversionPlan, phase: Phase) -> Result<()> {
        self.check_plan(plan)?;
        if !plan.is_conversion_needed() {
            return Ok(());
        }
        tracing::info!(converter = %self.provider_id, %phase, "running phase");

        if plan.project_file
            && let Some(processor) = &self.converter.project_file
        {
            context.with_project_settings(|s| phase.apply(processor.as_ref(), s))?;
        }
        if plan.workspace_file
            && let Some(processor) = &self.converter.workspace_file
        {
            context.with_workspace_settings(|s| phase.apply(processor.as_ref(), s))?;
        }
        if let Some(processor) = &self.converter.module_file {
            for file in &plan.module_files {
                tracing::debug!(converter = %self.provider_id, %phase, module = %file, "module");
                context.with_module_settings(file, |s| phase.apply(processor.as_ref(), s))?;
            }
        }
        if plan.run_configurations
            && let Some(processor) = &self.converter.run_configurations
        {
            context.with_run_manager_settings(|s| phase.apply(processor.as_ref(), s))?;
        }
        Ok(())
    }
}
