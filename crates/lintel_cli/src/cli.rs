//! CLI argument definitions

use std::path::PathBuf;

use clap::Parser;
use lintel_core::{JobsArgument, LintelConfig, RunOptions};
use miette::{IntoDiagnostic, Result};
use tracing::info;

use crate::output::OutputFormat;

/// Lintel - pluggable style and diagnostics checker
#[derive(Debug, Parser)]
#[command(name = "lintel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Files or directories to check ("-" reads standard input)
    pub filenames: Vec<String>,

    /// Configuration file path
    #[arg(long, conflicts_with = "isolated")]
    pub config: Option<PathBuf>,

    /// Ignore configuration files
    #[arg(long)]
    pub isolated: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Codes to report, replacing the defaults
    #[arg(long, value_delimiter = ',', value_name = "CODES")]
    pub select: Option<Vec<String>>,

    /// Codes to report on top of the defaults
    #[arg(long, value_delimiter = ',', value_name = "CODES")]
    pub extend_select: Vec<String>,

    /// Codes to ignore, replacing the configured list
    #[arg(long, value_delimiter = ',', value_name = "CODES")]
    pub ignore: Option<Vec<String>>,

    /// Codes to ignore on top of the configured list
    #[arg(long, value_delimiter = ',', value_name = "CODES")]
    pub extend_ignore: Vec<String>,

    /// Off-by-default plugins to enable
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub enable_extensions: Vec<String>,

    /// Extra ignores for matching files, e.g. "tests/*:E501,W2"
    #[arg(long, value_name = "PATTERN:CODES", value_parser = parse_per_file_ignore)]
    pub per_file_ignores: Vec<(String, Vec<String>)>,

    /// Report findings even on lines with suppression markers
    #[arg(long)]
    pub disable_noqa: bool,

    /// Number of worker threads ("auto" or a positive integer)
    #[arg(short, long, value_name = "JOBS")]
    pub jobs: Option<JobsArgument>,

    /// Patterns to exclude, replacing the defaults
    #[arg(long, value_delimiter = ',', value_name = "PATTERNS")]
    pub exclude: Option<Vec<String>>,

    /// Patterns to exclude on top of the defaults
    #[arg(long, value_delimiter = ',', value_name = "PATTERNS")]
    pub extend_exclude: Vec<String>,

    /// Patterns files found in directories must match
    #[arg(long, value_delimiter = ',', value_name = "PATTERNS")]
    pub filename: Option<Vec<String>>,

    /// Name to display for standard input
    #[arg(long, value_name = "NAME")]
    pub stdin_display_name: Option<String>,

    /// Maximum allowed line length
    #[arg(long, value_name = "N")]
    pub max_line_length: Option<usize>,

    /// Maximum allowed documentation line length
    #[arg(long, value_name = "N")]
    pub max_doc_length: Option<usize>,

    /// Number of spaces per indentation level
    #[arg(long, value_name = "N")]
    pub indent_size: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Default)]
    pub format: OutputFormat,

    /// Show the source and a caret under each reported column
    #[arg(long)]
    pub show_source: bool,

    /// Print a count per code after the findings
    #[arg(long)]
    pub statistics: bool,

    /// Print the total number of reported findings
    #[arg(long)]
    pub count: bool,

    /// Print run totals and the elapsed time
    #[arg(long)]
    pub benchmark: bool,

    /// Exit with status 0 even when findings are reported
    #[arg(long)]
    pub exit_zero: bool,
}

fn parse_per_file_ignore(value: &str) -> Result<(String, Vec<String>), String> {
    let (pattern, codes) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("expected PATTERN:CODES, got '{}'", value))?;
    if pattern.is_empty() {
        return Err(format!("missing pattern in '{}'", value));
    }
    Ok((pattern.to_string(), split_codes(codes.split(','))))
}

fn split_codes<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    values
        .into_iter()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

fn codes(values: &[String]) -> Vec<String> {
    split_codes(values.iter().map(String::as_str))
}

impl Cli {
    /// Builds the run options: defaults, then the config file, then flags.
    pub fn run_options(&self) -> Result<RunOptions> {
        let options = match self.config_file() {
            Some(path) => {
                info!("Using config: {}", path.display());
                LintelConfig::from_file(&path)
                    .and_then(|config| config.into_options())
                    .into_diagnostic()?
            }
            None => {
                info!("No config file found, using defaults");
                RunOptions::default()
            }
        };
        Ok(self.apply(options))
    }

    fn config_file(&self) -> Option<PathBuf> {
        if self.isolated {
            return None;
        }
        self.config
            .clone()
            .or_else(|| LintelConfig::discover("."))
    }

    /// Overrides `options` with every flag given on the command line.
    pub fn apply(&self, mut options: RunOptions) -> RunOptions {
        if let Some(select) = &self.select {
            options.select = Some(codes(select));
        }
        options.extend_select.extend(codes(&self.extend_select));
        if let Some(ignore) = &self.ignore {
            options.ignore = codes(ignore);
        }
        options.extend_ignore.extend(codes(&self.extend_ignore));
        options
            .enable_extensions
            .extend(codes(&self.enable_extensions));
        options
            .per_file_ignores
            .extend(self.per_file_ignores.iter().cloned());
        options.disable_noqa |= self.disable_noqa;
        if let Some(jobs) = self.jobs {
            options.jobs = jobs;
        }
        if let Some(exclude) = &self.exclude {
            options.exclude = exclude.clone();
        }
        options
            .extend_exclude
            .extend(self.extend_exclude.iter().cloned());
        if let Some(patterns) = &self.filename {
            options.filename_patterns = patterns.clone();
        }
        if let Some(name) = &self.stdin_display_name {
            options.stdin_display_name = name.clone();
        }
        if let Some(length) = self.max_line_length {
            options.max_line_length = length;
        }
        if self.max_doc_length.is_some() {
            options.max_doc_length = self.max_doc_length;
        }
        if let Some(size) = self.indent_size {
            options.indent_size = size;
        }
        options.filenames = self.filenames.clone();
        options
    }
}
