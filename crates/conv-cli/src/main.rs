//! Settings conversion CLI
//!
//! Detects workspace settings written by an older schema and converts them
//! with the converters described by rules files.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: cannot set up logging: {e}", "warning".yellow().bold());
    }
    tracing::debug!("verbose mode enabled");

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            println!("{} Settings conversion CLI", "conv".green().bold());
            println!();
            println!("Run {} for available commands.", "conv --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Check { path, rules } => commands::run_check(&path, &rules),
        Commands::Convert {
            path,
            rules,
            yes,
            no_backup,
            dry_run,
        } => commands::run_convert(
            &path,
            &rules,
            commands::ConvertFlags {
                yes,
                backup: !no_backup,
                dry_run,
            },
        ),
        Commands::Restore { path, yes } => commands::run_restore(&path, yes),
        Commands::ListConverters { rules } => commands::run_list_converters(&rules),
    }
}
