//! CLI argument definitions for the roster importer.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use roster_model::DuplicateAction;

#[derive(Parser)]
#[command(
    name = "roster",
    version,
    about = "Reconcile registrar student exports with tracked visa records",
    long_about = "Reconcile registrar student exports with tracked visa records.\n\n\
                  Maps spreadsheet columns to the student schema, validates every row,\n\
                  detects students that already exist and imports the rest."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: ./roster.toml when present).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow names and identity numbers in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the target fields a source column can map to.
    Schema,

    /// Suggest a column mapping for a CSV export.
    Map(MapArgs),

    /// Validate a CSV export and report duplicates without writing.
    Validate(ValidateArgs),

    /// Validate a CSV export and import it into the record store.
    Import(ImportArgs),
}

/// Options shared by every command that reads a source file.
#[derive(Args)]
pub struct SourceArgs {
    /// Registrar export (CSV).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Override a column mapping, e.g. --column "Student Name=nameEn".
    /// An empty field leaves the column unmapped.
    #[arg(long = "column", value_name = "HEADER=FIELD")]
    pub columns: Vec<String>,

    /// Minimum score (1-100) a suggestion needs to be kept.
    #[arg(long = "min-confidence", value_name = "SCORE")]
    pub min_confidence: Option<u8>,
}

/// Options for commands that read the record store.
#[derive(Args)]
pub struct StoreArgs {
    /// Tenant (university) the records belong to.
    #[arg(long = "tenant")]
    pub tenant: Option<String>,

    /// JSON record store file.
    #[arg(long = "store", value_name = "PATH")]
    pub store: Option<PathBuf>,
}

#[derive(Args)]
pub struct MapArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print the mapping as JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Write a row_index,status,error CSV report. row_index counts
    /// non-blank data rows from 0.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    /// What to do with rows that match an existing record.
    #[arg(long = "on-duplicate", value_enum, default_value = "skip")]
    pub on_duplicate: DuplicateActionArg,

    /// Stop submitting rows after this many seconds.
    #[arg(long = "timeout", value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Write a row_index,status,error CSV report. row_index counts
    /// non-blank data rows from 0.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DuplicateActionArg {
    Skip,
    Overwrite,
    Manual,
}

impl From<DuplicateActionArg> for DuplicateAction {
    fn from(arg: DuplicateActionArg) -> Self {
        match arg {
            DuplicateActionArg::Skip => Self::Skip,
            DuplicateActionArg::Overwrite => Self::Overwrite,
            DuplicateActionArg::Manual => Self::Manual,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
