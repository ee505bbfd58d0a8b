//! Conversion pipeline for workspace settings
//!
//! Detects settings written by an older schema and rewrites them in place,
//! category by category, in three ordered phases:
//!
//! - **Detection**: each [`ConversionRunner`] asks its provider's processors
//!   which settings files are outdated and records the answer in a
//!   [`ConversionPlan`]
//! - **Execution**: pre-process, process and post-process every flagged
//!   file, always in the order project file, workspace file, module files,
//!   run configurations
//! - **Scheduling**: [`ConversionService`] orders providers by their
//!   declared predecessors, gates on read-only files, backs up, saves and
//!   records which converters ran
//!
//! # Architecture
//!
//! ```text
//!                     conv-cli
//!                        |
//!                    conv-core
//!                        |
//!              +---------+---------+
//!              |                   |
//!         conv-content          conv-fs
//! ```
//!
//! # Example
//!
//! ```ignore
//! use conv_core::{ConversionContext, ConversionOptions, ConversionService, RulesProvider, SilentListener};
//!
//! let mut context = ConversionContext::new("path/to/workspace")?;
//! let service = ConversionService::new()
//!     .with_provider(RulesProvider::from_file(&"rules.toml".into())?);
//! let report = service.run(&mut context, ConversionOptions::default(), &mut SilentListener)?;
//! ```

pub mod backup;
pub mod context;
pub mod error;
pub mod ordering;
pub mod processor;
pub mod record;
pub mod rules;
pub mod runner;
pub mod service;
pub mod settings;

pub use backup::{Backup, BackupEntry, BackupManager, BackupMetadata};
pub use context::ConversionContext;
pub use error::{Error, Result};
pub use ordering::ConverterGraph;
pub use processor::{ConversionProcessor, ConverterProvider, ProjectConverter};
pub use record::ConversionRecord;
pub use rules::{ConversionRules, FileRules, RulesProvider, RunConfigurationRules};
pub use runner::{ConversionPlan, ConversionRunner, Phase};
pub use service::{
    ConversionListener, ConversionOptions, ConversionReport, ConversionService, PendingConversion,
    SilentListener,
};
pub use settings::{ModuleSettings, ProjectSettings, RunManagerSettings, WorkspaceSettings};
