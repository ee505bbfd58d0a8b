//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Settings conversion - bring workspace settings up to the current schema
#[derive(Parser, Debug)]
#[command(name = "conv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Report which settings files need converting
    Check {
        /// Workspace root or project file
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Conversion rules files (TOML, JSON or YAML)
        #[arg(short, long = "rules", env = "CONV_RULES", value_delimiter = ',')]
        rules: Vec<PathBuf>,
    },

    /// Convert outdated settings files in place
    ///
    /// Examples:
    ///   conv convert -r rules/v2.toml            # Ask, back up, convert
    ///   conv convert -r rules/v2.toml --dry-run  # Show what would change
    ///   conv convert -r rules/v2.toml --yes      # No confirmation prompt
    Convert {
        /// Workspace root or project file
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Conversion rules files (TOML, JSON or YAML)
        #[arg(short, long = "rules", env = "CONV_RULES", value_delimiter = ',')]
        rules: Vec<PathBuf>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Skip the backup of affected files
        #[arg(long)]
        no_backup: bool,

        /// Show the changes without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Restore the most recent conversion backup
    Restore {
        /// Workspace root or project file
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// List converters in the order they would run
    ListConverters {
        /// Conversion rules files (TOML, JSON or YAML)
        #[arg(short, long = "rules", env = "CONV_RULES", value_delimiter = ',')]
        rules: Vec<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_convert_flags() {
        let cli = Cli::try_parse_from([
            "conv", "convert", "ws", "-r", "a.toml", "--rules", "b.toml", "--yes", "--dry-run",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Convert {
                path: PathBuf::from("ws"),
                rules: vec![PathBuf::from("a.toml"), PathBuf::from("b.toml")],
                yes: true,
                no_backup: false,
                dry_run: true,
            })
        );
    }

    #[test]
    fn check_defaults_to_current_directory() {
        let cli = Cli::try_parse_from(["conv", "-v", "check"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Check { path, .. }) => assert_eq!(path, PathBuf::from(".")),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
