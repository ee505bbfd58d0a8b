//! Check command: report outdated settings without touching them

use std::path::{Path, PathBuf};

use colored::Colorize;

use conv_core::ConversionContext;

use super::{build_service, display_path, workspace_label};
use crate::error::Result;

/// Run the check command
///
/// Lists the converters that would run and the files they would touch.
/// Read-only files are flagged since they would block `conv convert`.
pub fn run_check(path: &Path, rules: &[PathBuf]) -> Result<()> {
    println!(
        "{} Checking settings in {}...",
        "=>".blue().bold(),
        workspace_label(path).cyan()
    );

    let service = build_service(rules)?;
    let mut context = ConversionContext::new(path)?;
    let pending = service.prepare(&mut context)?;

    if !pending.is_conversion_needed() {
        println!("{} Settings are up to date.", "OK".green().bold());
        return Ok(());
    }

    println!("{} Conversion needed:", "OUTDATED".yellow().bold());
    for (id, description) in pending.converters() {
        println!("   {} {} {}", "-".yellow(), id.cyan(), description.dimmed());
    }

    println!();
    println!("Affected files:");
    let root = context.root().clone();
    for file in pending.affected_files() {
        let label = display_path(file, &root);
        if pending.read_only_files().contains(file) {
            println!("   {} {} {}", "!".red(), label, "(read-only)".red());
        } else {
            println!("   {} {}", "-".yellow(), label);
        }
    }

    println!();
    if pending.read_only_files().is_empty() {
        println!("Run {} to update them.", "conv convert".cyan());
    } else {
        println!(
            "{} Make the read-only files writable before converting.",
            "WARN".yellow().bold()
        );
    }
    Ok(())
}
