//! Scheduling of every registered converter over one workspace

use conv_content::SettingsDiff;
use conv_fs::NormalizedPath;

use crate::backup::BackupManager;
use crate::context::ConversionContext;
use crate::error::{Error, Result};
use crate::ordering::ConverterGraph;
use crate::processor::ConverterProvider;
use crate::record::ConversionRecord;
use crate::runner::{ConversionPlan, ConversionRunner};

/// Receives progress of a conversion. Every method defaults to a no-op.
pub trait ConversionListener {
    /// Converters that will run, as `(id, description)`, in run order.
    fn conversion_needed(&mut self, _converters: &[(String, String)]) {}

    fn successfully_converted(&mut self, _backup: Option<&NormalizedPath>) {}

    fn error(&mut self, _message: &str) {}

    fn cannot_write_to_files(&mut self, _files: &[NormalizedPath]) {}
}

/// Listener that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentListener;

impl ConversionListener for SilentListener {}

/// How [`ConversionService::convert`] behaves.
#[derive(Debug, Clone, Copy)]
pub struct ConversionOptions {
    /// Copy affected files into a backup before converting
    pub backup: bool,
    /// Run every phase in memory but write nothing
    pub dry_run: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            backup: true,
            dry_run: false,
        }
    }
}

/// Runners that found something to convert, with their plans.
#[derive(Debug)]
pub struct PendingConversion {
    runners: Vec<(ConversionRunner, ConversionPlan)>,
    affected_files: Vec<NormalizedPath>,
    read_only_files: Vec<NormalizedPath>,
}

impl PendingConversion {
    pub fn is_conversion_needed(&self) -> bool {
        !self.runners.is_empty()
    }

    /// Converter ids in run order.
    pub fn converter_ids(&self) -> Vec<&str> {
        self.runners.iter().map(|(runner, _)| runner.provider_id()).collect()
    }

    /// `(id, description)` of each converter, in run order.
    pub fn converters(&self) -> Vec<(String, String)> {
        self.runners
            .iter()
            .map(|(runner, _)| (runner.provider_id().to_string(), runner.description().to_string()))
            .collect()
    }

    pub fn plans(&self) -> impl Iterator<Item = &ConversionPlan> {
        self.runners.iter().map(|(_, plan)| plan)
    }

    /// Union of every runner's affected files, first occurrence order.
    pub fn affected_files(&self) -> &[NormalizedPath] {
        &self.affected_files
    }

    pub fn read_only_files(&self) -> &[NormalizedPath] {
        &self.read_only_files
    }
}

/// Outcome of [`ConversionService::convert`].
#[derive(Debug, Default)]
pub struct ConversionReport {
    /// Converter ids that ran, in order
    pub converters: Vec<String>,
    pub affected_files: Vec<NormalizedPath>,
    /// Files written (empty on a dry run)
    pub saved_files: Vec<NormalizedPath>,
    pub backup: Option<NormalizedPath>,
    /// Changes per affected file that differs from disk
    pub changes: Vec<(NormalizedPath, SettingsDiff)>,
    pub dry_run: bool,
}

/// Registry of converter providers.
#[derive(Default)]
pub struct ConversionService {
    providers: Vec<Box<dyn ConverterProvider>>,
}

impl ConversionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: impl ConverterProvider + 'static) {
        self.register_boxed(Box::new(provider));
    }

    pub fn register_boxed(&mut self, provider: Box<dyn ConverterProvider>) {
        tracing::debug!(converter = provider.id(), "registered converter");
        self.providers.push(provider);
    }

    pub fn with_provider(mut self, provider: impl ConverterProvider + 'static) -> Self {
        self.register(provider);
        self
    }

    pub fn providers(&self) -> &[Box<dyn ConverterProvider>] {
        &self.providers
    }

    /// Providers sorted so each runs after the converters it names.
    ///
    /// Two providers sharing an id are an error.
    pub fn ordered_providers(&self) -> Result<Vec<&dyn ConverterProvider>> {
        let mut graph = ConverterGraph::new();
        for provider in &self.providers {
            if !graph.add_node(provider.id()) {
                return Err(Error::cannot_convert(format!(
                    "converter '{}' is registered more than once",
                    provider.id()
                )));
            }
        }
        for provider in &self.providers {
            for preceding in provider.preceding_converter_ids() {
                graph.add_edge(provider.id(), &preceding);
            }
        }
        let order = graph.topological_sort()?;
        Ok(order
            .into_iter()
            .filter_map(|id| self.providers.iter().find(|p| p.id() == id))
            .map(|p| p.as_ref())
            .collect())
    }

    /// Run detection for every provider and collect what would change.
    pub fn prepare(&self, context: &mut ConversionContext) -> Result<PendingConversion> {
        let record = ConversionRecord::load(context.layout())?;
        let mut runners = Vec::new();
        let mut affected_files: Vec<NormalizedPath> = Vec::new();

        for provider in self.ordered_providers()? {
            if !provider.can_determine_if_conversion_already_performed_by_project_files()
                && record.contains(provider.id())
            {
                tracing::debug!(converter = provider.id(), "already applied, skipping");
                continue;
            }
            let runner = ConversionRunner::new(provider, context);
            let plan = runner.detect(context)?;
            if !plan.is_conversion_needed() {
                tracing::debug!(converter = provider.id(), "nothing to convert");
                continue;
            }
            for file in runner.affected_files(context, &plan) {
                if !affected_files.contains(&file) {
                    affected_files.push(file);
                }
            }
            runners.push((runner, plan));
        }

        let read_only_files = ConversionRunner::read_only_files(&affected_files);
        tracing::info!(
            converters = runners.len(),
            affected = affected_files.len(),
            read_only = read_only_files.len(),
            "conversion check finished"
        );
        Ok(PendingConversion {
            runners,
            affected_files,
            read_only_files,
        })
    }

    /// Apply a prepared conversion.
    ///
    /// Refuses to start when an affected file is read-only. Files already
    /// converted when a later step fails stay converted in memory, but
    /// nothing is saved.
    pub fn convert(
        &self,
        context: &mut ConversionContext,
        pending: PendingConversion,
        options: ConversionOptions,
        listener: &mut dyn ConversionListener,
    ) -> Result<ConversionReport> {
        let mut report = ConversionReport {
            converters: pending.converter_ids().into_iter().map(str::to_string).collect(),
            affected_files: pending.affected_files.clone(),
            dry_run: options.dry_run,
            ..ConversionReport::default()
        };
        if !pending.is_conversion_needed() {
            return Ok(report);
        }
        listener.conversion_needed(&pending.converters());

        if !options.dry_run && !pending.read_only_files.is_empty() {
            tracing::warn!(files = pending.read_only_files.len(), "affected files are read-only");
            listener.cannot_write_to_files(&pending.read_only_files);
            return Err(Error::ReadOnlyFiles {
                files: pending.read_only_files,
            });
        }

        if options.backup && !options.dry_run {
            let backup = BackupManager::new(context.layout())
                .create_backup(&pending.affected_files, &report.converters)
                .inspect_err(|e| listener.error(&e.to_string()))?;
            report.backup = Some(backup.path);
        }

        if let Err(e) = Self::run_phases(context, &pending.runners) {
            listener.error(&e.to_string());
            return Err(e);
        }

        for file in &pending.affected_files {
            if let Some(loaded) = context.loaded_file(file)
                && loaded.is_modified()
            {
                let diff = loaded.diff()?;
                if !diff.is_empty() {
                    report.changes.push((file.clone(), diff));
                }
            }
        }

        if options.dry_run {
            tracing::info!(changed = report.changes.len(), "dry run, nothing written");
            return Ok(report);
        }

        report.saved_files = context
            .save_files(&pending.affected_files)
            .inspect_err(|e| listener.error(&e.to_string()))?;

        let mut record = ConversionRecord::load(context.layout())?;
        record.record(report.converters.iter().map(String::as_str));
        record.save(context.layout())?;

        tracing::info!(
            converters = report.converters.len(),
            saved = report.saved_files.len(),
            "conversion finished"
        );
        listener.successfully_converted(report.backup.as_ref());
        Ok(report)
    }

    /// Detect and convert in one step.
    pub fn run(
        &self,
        context: &mut ConversionContext,
        options: ConversionOptions,
        listener: &mut dyn ConversionListener,
    ) -> Result<ConversionReport> {
        let pending = self.prepare(context)?;
        self.convert(context, pending, options, listener)
    }

    /// Convert a module file added after the workspace was converted.
    ///
    /// Registers the file with the context, runs every converter that finds
    /// it outdated, and saves it. Returns whether anything ran. A file
    /// missing on disk is cannot-convert and is not registered.
    pub fn convert_module(&self, context: &mut ConversionContext, file: &NormalizedPath) -> Result<bool> {
        if !file.exists() {
            return Err(Error::cannot_convert_file(file, "module file does not exist"));
        }
        context.add_module_file(file.clone());
        let mut converted = false;
        for provider in self.ordered_providers()? {
            let runner = ConversionRunner::new(provider, context);
            if runner.is_module_conversion_needed(context, file)? {
                runner.convert_module(context, file)?;
                converted = true;
            }
        }
        if converted {
            context.save_files(std::slice::from_ref(file))?;
        }
        Ok(converted)
    }

    fn run_phases(context: &mut ConversionContext, runners: &[(ConversionRunner, ConversionPlan)]) -> Result<()> {
        for (runner, plan) in runners {
            tracing::info!(converter = runner.provider_id(), "converting");
            runner.pre_process(context, plan)?;
            runner.process(context, plan)?;
            runner.post_process(context, plan)?;
        }
        for (runner, plan) in runners {
            runner.finalize(context, plan)?;
        }
        Ok(())
    }
}
