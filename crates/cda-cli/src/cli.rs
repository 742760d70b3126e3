//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cda",
    version,
    about = "Extract clinical documents into flat tables and convert them into typed records",
    long_about = "Extract HL7 CDA clinical documents into work-order tables.\n\n\
                  Every section entry is flattened into key-path/value rows, which\n\
                  mapping templates then turn into FHIR-shaped records."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

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

    /// Allow clinical values in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract documents into work-order tables.
    Extract(ExtractArgs),

    /// Extract documents and convert their entries into records.
    Convert(ConvertArgs),

    /// List the section codes with a dedicated record kind.
    Sections,
}

#[derive(Parser)]
pub struct ExtractArgs {
    /// CDA documents to extract.
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<PathBuf>,

    /// Name of the work unit the documents are recorded under.
    #[arg(long = "work-unit", value_name = "NAME", default_value = "default")]
    pub work_unit: String,

    /// Write the table snapshot as JSON (stdout when omitted).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Also write one CSV file per table into this directory.
    #[arg(long = "csv-dir", value_name = "DIR")]
    pub csv_dir: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ConvertArgs {
    /// CDA documents to convert.
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<PathBuf>,

    /// Mapping template file (built-in templates when omitted).
    #[arg(long = "templates", value_name = "PATH")]
    pub templates: Option<PathBuf>,

    /// Write the record bundle as JSON (stdout when omitted).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
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
