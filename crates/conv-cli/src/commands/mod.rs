//! Command implementations for conv-cli

pub mod check;
pub mod convert;
pub mod list;

use std::path::{Path, PathBuf};

use conv_core::{ConversionService, RulesProvider};
use conv_fs::NormalizedPath;

use crate::error::{CliError, Result};

pub use check::run_check;
pub use convert::{ConvertFlags, run_convert, run_restore};
pub use list::run_list_converters;

/// Build a service with one provider per rules file.
pub(crate) fn build_service(rules: &[PathBuf]) -> Result<ConversionService> {
    if rules.is_empty() {
        return Err(CliError::user(
            "No conversion rules given. Pass --rules <FILE> or set CONV_RULES.",
        ));
    }
    let mut service = ConversionService::new();
    for path in rules {
        let absolute = std::path::absolute(path)?;
        tracing::debug!(rules = %absolute.display(), "loading conversion rules");
        service.register(RulesProvider::from_file(&NormalizedPath::new(absolute))?);
    }
    Ok(service)
}

/// Path relative to the workspace root for display, absolute otherwise.
pub(crate) fn display_path(file: &NormalizedPath, root: &NormalizedPath) -> String {
    file.relative_to(root)
        .map(str::to_string)
        .unwrap_or_else(|| file.to_string())
}

pub(crate) fn workspace_label(path: &Path) -> String {
    std::path::absolute(path)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| path.display().to_string())
}
