use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Title line plus remaining fields as indented JSON-ish (default)
    Default,
    /// Like default, but short field values stay on one line
    Compact,
    /// The raw ECS JSON line, unchanged
    Ecs,
    /// Just "LEVEL: message", eliding remaining fields
    Simple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Colorize when stdout is a terminal (default)
    Auto,
    Always,
    Never,
}

/// Pretty-print and filter logs in ECS logging format
///
/// Reads newline-delimited JSON log records from the given files (or stdin)
/// and renders them for humans. Lines that are not valid ECS log records
/// pass through unchanged.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log files to render; reads stdin when none are given
    #[arg(value_name = "LOG_FILE")]
    pub files: Vec<PathBuf>,

    /// Filter records with a KQL query (e.g. 'log.level >= warn and
    /// http.response.status_code:5*')
    #[arg(short, long)]
    pub kql: Option<String>,

    /// Only show records at or above this log level
    #[arg(short, long)]
    pub level: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// When to colorize output
    #[arg(long, value_enum)]
    pub color: Option<ColorMode>,

    /// Maximum length of a line that is still parsed as a record; longer
    /// lines pass through (or are suppressed with --strict)
    #[arg(long)]
    pub max_line_len: Option<usize>,

    /// Suppress lines that are not valid ECS log records instead of
    /// passing them through
    #[arg(long)]
    pub strict: bool,

    /// Accept records that carry only some of the required ECS fields
    #[arg(long)]
    pub lenient: bool,

    /// Only render these top-level fields in the detail section
    #[arg(short, long, value_delimiter = ',')]
    pub include_fields: Vec<String>,

    /// Drop these fields (dotted paths allowed) from every record
    #[arg(short = 'x', long, value_delimiter = ',')]
    pub exclude_fields: Vec<String>,

    /// Skip loading ~/.ecsview.toml
    #[arg(long)]
    pub no_config: bool,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
