//! Processors and providers that record every call, for phase-order tests.

use std::cell::RefCell;
use std::rc::Rc;

use conv_content::ComponentManagerSettings;
use conv_core::{
    ConversionContext, ConversionProcessor, ConverterProvider, Error, ProjectConverter, Result,
    RunManagerSettings,
};

/// Shared, ordered log of `"<phase> <label>"` entries.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Entries starting with `phase`, in order.
    pub fn phase(&self, phase: &str) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter(|e| e.split(' ').next() == Some(phase))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Processor that bumps a file's version and logs every call.
///
/// Files below `target` need conversion. `process` writes a
/// `[component.Converted]` marker naming the processor; `post_process`
/// stamps the target version. Run-configuration processors instead report
/// the fixed `needed` answer and mark every configuration.
#[derive(Debug, Clone)]
pub struct RecordingProcessor {
    label: String,
    target: i64,
    needed: bool,
    fail_in: Option<String>,
    log: CallLog,
}

impl RecordingProcessor {
    pub fn new(label: &str, target: i64, log: &CallLog) -> Self {
        Self {
            label: label.to_string(),
            target,
            needed: true,
            fail_in: None,
            log: log.clone(),
        }
    }

    /// Fixed answer for the run-configuration category.
    pub fn needed(mut self, needed: bool) -> Self {
        self.needed = needed;
        self
    }

    /// Fail with cannot-convert when asked to run `phase`.
    pub fn failing_in(mut self, phase: &str) -> Self {
        self.fail_in = Some(phase.to_string());
        self
    }

    fn record(&self, phase: &str, subject: &str) -> Result<()> {
        self.log.push(format!("{phase} {}:{subject}", self.label));
        if self.fail_in.as_deref() == Some(phase) {
            return Err(Error::cannot_convert(format!("{} failed in {phase}", self.label)));
        }
        Ok(())
    }
}

fn subject<T: ComponentManagerSettings>(settings: &T) -> String {
    settings.path().file_name().unwrap_or_default().to_string()
}

impl<T: ComponentManagerSettings> ConversionProcessor<T> for RecordingProcessor {
    fn is_conversion_needed(&self, settings: &T) -> Result<bool> {
        self.record("detect", &subject(settings))?;
        Ok(settings.version().unwrap_or(0) < self.target)
    }

    fn pre_process(&self, settings: &mut T) -> Result<()> {
        self.record("pre", &subject(settings))
    }

    fn process(&self, settings: &mut T) -> Result<()> {
        self.record("process", &subject(settings))?;
        settings
            .component_or_insert("Converted")?
            .insert("by", toml_edit::value(self.label.as_str()));
        Ok(())
    }

    fn post_process(&self, settings: &mut T) -> Result<()> {
        self.record("post", &subject(settings))?;
        settings.set_version(self.target)?;
        Ok(())
    }
}

/// Marks run configurations; see [`RecordingProcessor`].
#[derive(Debug, Clone)]
pub struct RecordingRunConfigurations(pub RecordingProcessor);

impl ConversionProcessor<RunManagerSettings> for RecordingRunConfigurations {
    fn is_conversion_needed(&self, _settings: &RunManagerSettings) -> Result<bool> {
        self.0.record("detect", "run-configurations")?;
        Ok(self.0.needed)
    }

    fn pre_process(&self, _settings: &mut RunManagerSettings) -> Result<()> {
        self.0.record("pre", "run-configurations")
    }

    fn process(&self, settings: &mut RunManagerSettings) -> Result<()> {
        self.0.record("process", "run-configurations")?;
        for configuration in settings.run_configurations_mut() {
            configuration.insert("converted_by", toml_edit::value(self.0.label.as_str()));
        }
        Ok(())
    }

    fn post_process(&self, _settings: &mut RunManagerSettings) -> Result<()> {
        self.0.record("post", "run-configurations")
    }
}

type ConverterFactory = Box<dyn Fn() -> ProjectConverter>;

/// Provider assembled from a converter factory.
pub struct TestProvider {
    id: String,
    preceding: Vec<String>,
    self_detecting: bool,
    factory: ConverterFactory,
}

impl TestProvider {
    pub fn new(id: &str, factory: impl Fn() -> ProjectConverter + 'static) -> Self {
        Self {
            id: id.to_string(),
            preceding: Vec::new(),
            self_detecting: true,
            factory: Box::new(factory),
        }
    }

    /// A provider whose project, workspace and module processors are all
    /// [`RecordingProcessor`]s labelled `id`, plus run configurations when
    /// `run_configurations` is set.
    pub fn recording(id: &str, target: i64, log: &CallLog, run_configurations: Option<bool>) -> Self {
        let processor = RecordingProcessor::new(id, target, log);
        Self::new(id, move || {
            let converter = ProjectConverter::new()
                .with_project_file(processor.clone())
                .with_workspace_file(processor.clone())
                .with_module_file(processor.clone());
            match run_configurations {
                Some(needed) => converter
                    .with_run_configurations(RecordingRunConfigurations(processor.clone().needed(needed))),
                None => converter,
            }
        })
    }

    pub fn after(mut self, preceding: &[&str]) -> Self {
        self.preceding = preceding.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Mark the provider as unable to detect its own earlier runs.
    pub fn record_only(mut self) -> Self {
        self.self_detecting = false;
        self
    }
}

impl ConverterProvider for TestProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.id
    }

    fn preceding_converter_ids(&self) -> Vec<String> {
        self.preceding.clone()
    }

    fn can_determine_if_conversion_already_performed_by_project_files(&self) -> bool {
        self.self_detecting
    }

    fn create_converter(&self, _context: &ConversionContext) -> ProjectConverter {
        (self.factory)()
    }
}
