//! Convert and restore command implementations

use std::path::{Path, PathBuf};

use colored::Colorize;
use dialoguer::Confirm;

use conv_content::SettingsChange;
use conv_core::{BackupManager, ConversionContext, ConversionListener, ConversionOptions};
use conv_fs::{NormalizedPath, SettingsLayout};

use super::{build_service, display_path, workspace_label};
use crate::error::{CliError, Result};

/// Flags for the convert command
#[derive(Debug, Clone, Copy)]
pub struct ConvertFlags {
    pub yes: bool,
    pub backup: bool,
    pub dry_run: bool,
}

/// Prints conversion events as they happen.
struct ConsoleListener {
    root: NormalizedPath,
}

impl ConversionListener for ConsoleListener {
    fn conversion_needed(&mut self, converters: &[(String, String)]) {
        for (id, description) in converters {
            println!("   {} {} {}", "-".blue(), id.cyan(), description.dimmed());
        }
    }

    fn successfully_converted(&mut self, backup: Option<&NormalizedPath>) {
        if let Some(dir) = backup {
            println!(
                "{} Backup saved to {}",
                "=>".blue().bold(),
                display_path(dir, &self.root).cyan()
            );
        }
    }

    fn error(&mut self, message: &str) {
        eprintln!("{} {}", "FAILED".red().bold(), message);
    }

    fn cannot_write_to_files(&mut self, files: &[NormalizedPath]) {
        eprintln!("{} Cannot write to:", "READ-ONLY".red().bold());
        for file in files {
            eprintln!("   {} {}", "!".red(), display_path(file, &self.root));
        }
    }
}

/// Run the convert command
pub fn run_convert(path: &Path, rules: &[PathBuf], flags: ConvertFlags) -> Result<()> {
    println!(
        "{} Converting settings in {}...",
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

    let root = context.root().clone();
    if !flags.yes && !flags.dry_run {
        println!("The following files will be rewritten:");
        for file in pending.affected_files() {
            println!("   {} {}", "-".yellow(), display_path(file, &root));
        }
        let confirmed = Confirm::new()
            .with_prompt("Convert these files?")
            .default(true)
            .interact()?;
        if !confirmed {
            println!("{} Conversion cancelled.", "=>".yellow().bold());
            return Ok(());
        }
    }

    let options = ConversionOptions {
        backup: flags.backup,
        dry_run: flags.dry_run,
    };
    let mut listener = ConsoleListener { root: root.clone() };
    let report = service.convert(&mut context, pending, options, &mut listener)?;

    if report.dry_run {
        println!();
        println!("{} Dry run, no files written.", "DRY-RUN".yellow().bold());
        for (file, diff) in &report.changes {
            println!("{}", display_path(file, &root).bold());
            for change in &diff.changes {
                let line = change.to_string();
                let styled = match change {
                    SettingsChange::Added { .. } => line.green(),
                    SettingsChange::Removed { .. } => line.red(),
                    SettingsChange::Modified { .. } => line.yellow(),
                };
                println!("   {}", styled);
            }
        }
        return Ok(());
    }

    for file in &report.saved_files {
        println!("   {} {}", "+".green(), display_path(file, &root));
    }
    println!(
        "{} Converted {} file(s) with {} converter(s).",
        "OK".green().bold(),
        report.saved_files.len(),
        report.converters.len()
    );
    Ok(())
}

/// Run the restore command
///
/// Copies the files of the most recent backup back over the workspace.
pub fn run_restore(path: &Path, yes: bool) -> Result<()> {
    let layout = SettingsLayout::detect(path)?;
    let manager = BackupManager::new(&layout);
    let Some(backup) = manager.latest_backup()? else {
        return Err(CliError::user(format!(
            "No backups found in {}",
            manager.backups_dir()
        )));
    };

    let root = layout.root.clone();
    println!(
        "{} Restoring backup {} ({} file(s), created {})",
        "=>".blue().bold(),
        display_path(&backup.path, &root).cyan(),
        backup.metadata.files.len(),
        backup.metadata.created.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Overwrite the current files?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{} Restore cancelled.", "=>".yellow().bold());
            return Ok(());
        }
    }

    let restored = manager.restore_backup(&backup)?;
    for file in &restored {
        println!("   {} {}", "+".green(), display_path(file, &root));
    }
    println!("{} Restored {} file(s).", "OK".green().bold(), restored.len());
    Ok(())
}
