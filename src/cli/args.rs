//! Command-line argument parsing for Freight Manifest
//!
//! This module defines the CLI structure using clap derive macros: parsing
//! a manifest, inspecting how the heuristics read a document, and managing
//! the configuration file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Freight Manifest - Read cargo records out of partner spreadsheets
#[derive(Parser, Debug)]
#[command(
    name = "freight_manifest",
    version,
    about = "Extract cargo manifest records from loosely formatted partner spreadsheets",
    long_about = "Reads .xlsx/.xls manifests sent by Chinese freight partners, finds the batch number,
the client rows and the columns by heuristics, and prints normalized records with batch totals."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a manifest and print its records
    Parse(ParseArgs),

    /// Show how the document is read without extracting rows
    Inspect(InspectArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Output format for parse results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable report
    #[default]
    Table,
    /// Records and summary as JSON
    Json,
}

/// Arguments for the parse command
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Manifest file (.xlsx, .xlsm, .xls); "-" reads from stdin
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Reporting period used in composite ids
    #[arg(short, long, value_name = "ID")]
    pub period: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Keep product names untranslated
    #[arg(long)]
    pub no_translate: bool,

    /// Print only the batch summary
    #[arg(long)]
    pub summary_only: bool,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Manifest file (.xlsx, .xlsm, .xls)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Target path (defaults to the user config directory)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level requested on the command line, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl ParseArgs {
    /// Whether the document comes from stdin
    pub fn reads_stdin(&self) -> bool {
        self.file.as_os_str() == "-"
    }

    /// Display name of the input
    pub fn source_name(&self) -> String {
        if self.reads_stdin() {
            "<stdin>".to_string()
        } else {
            self.file.display().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        let cli = Cli::try_parse_from([
            "freight_manifest",
            "parse",
            "manifest.xlsx",
            "--period",
            "2024-05",
            "--format",
            "json",
            "--no-translate",
        ])
        .unwrap();

        match cli.command {
            Commands::Parse(args) => {
                assert_eq!(args.file, PathBuf::from("manifest.xlsx"));
                assert_eq!(args.period.as_deref(), Some("2024-05"));
                assert_eq!(args.format, OutputFormat::Json);
                assert!(args.no_translate);
                assert!(!args.summary_only);
                assert!(!args.reads_stdin());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_stdin_input() {
        let cli = Cli::try_parse_from(["freight_manifest", "parse", "-"]).unwrap();
        match cli.command {
            Commands::Parse(args) => {
                assert!(args.reads_stdin());
                assert_eq!(args.source_name(), "<stdin>");
                assert_eq!(args.format, OutputFormat::Table);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_log_level_selection() {
        let cli = Cli::try_parse_from(["freight_manifest", "config", "show"]).unwrap();
        assert_eq!(cli.log_level(), None);

        let cli = Cli::try_parse_from(["freight_manifest", "-v", "config", "show"]).unwrap();
        assert_eq!(cli.log_level(), Some(tracing::Level::INFO));

        // Quiet wins over verbose
        let cli =
            Cli::try_parse_from(["freight_manifest", "inspect", "a.xlsx", "-q", "--very-verbose"])
                .unwrap();
        assert_eq!(cli.log_level(), Some(tracing::Level::ERROR));
    }

    #[test]
    fn test_config_init_args() {
        let cli =
            Cli::try_parse_from(["freight_manifest", "config", "init", "./fm.toml", "--force"])
                .unwrap();
        match cli.command {
            Commands::Config(ConfigArgs {
                action: ConfigAction::Init { path, force },
            }) => {
                assert_eq!(path, Some(PathBuf::from("./fm.toml")));
                assert!(force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
