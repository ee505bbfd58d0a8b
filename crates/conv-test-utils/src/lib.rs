//! Shared test utilities for the settings conversion workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`workspace`]: [`TestWorkspace`] builder for settings layouts on disk
//! - [`recording`]: processors and providers that log every call they get

pub mod recording;
pub mod workspace;

pub use recording::{CallLog, RecordingProcessor, RecordingRunConfigurations, TestProvider};
pub use workspace::TestWorkspace;
