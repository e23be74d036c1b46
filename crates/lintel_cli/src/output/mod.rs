//! Output formatting module

mod json;
mod text;

use std::collections::BTreeMap;
use std::io::{self, Write};

use clap::ValueEnum;
use lintel_core::{ResultSink, RunStatistics, Statistics, Violation};

/// How reported findings are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// `path:row:col: CODE text`
    #[default]
    Default,
    /// `path:row: [CODE] text`
    Pylint,
    /// One JSON object keyed by file name
    Json,
}

/// Writes reported findings as they arrive.
///
/// Write errors are kept and returned by [`Formatter::finish`], since the
/// result sink has no way to report them.
pub struct Formatter<W: Write> {
    format: OutputFormat,
    show_source: bool,
    writer: W,
    files: BTreeMap<String, Vec<Violation>>,
    error: Option<io::Error>,
}

impl<W: Write> Formatter<W> {
    pub fn new(format: OutputFormat, show_source: bool, writer: W) -> Self {
        Self {
            format,
            show_source,
            writer,
            files: BTreeMap::new(),
            error: None,
        }
    }

    fn write_line(&mut self, line: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = writeln!(self.writer, "{}", line) {
            self.error = Some(e);
        }
    }

    /// Writes anything still buffered and reports the first write error.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            let files = std::mem::take(&mut self.files);
            json::write_json(&mut self.writer, &files)?;
        }
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for Formatter<W> {
    fn handle(&mut self, violation: &Violation) {
        if self.format == OutputFormat::Json {
            self.files
                .entry(violation.filename.clone())
                .or_default()
                .push(violation.clone());
            return;
        }

        let line = text::format_violation(self.format, violation);
        self.write_line(&line);
        if self.show_source
            && let Some(source) = text::show_source(violation)
        {
            self.write_line(&source);
        }
    }

    fn file_finished(&mut self, filename: &str) {
        if self.format == OutputFormat::Json {
            self.files.entry(filename.to_string()).or_default();
        } else if self.error.is_none()
            && let Err(e) = self.writer.flush()
        {
            self.error = Some(e);
        }
    }
}

/// Lines for `--statistics`: one per code, counts summed over files.
pub fn statistics_lines(statistics: &Statistics) -> Vec<String> {
    statistics
        .error_codes()
        .into_iter()
        .filter_map(|code| {
            let mut entries = statistics
                .statistics_for(code, None)
                .filter(|statistic| statistic.code == code)
                .peekable();
            let message = entries.peek()?.message.clone();
            let count: usize = entries.map(|statistic| statistic.count).sum();
            Some(format!("{:<5} {} {}", count, code, message))
        })
        .collect()
}

/// Lines for `--benchmark`.
pub fn benchmark_lines(statistics: &RunStatistics, elapsed_secs: f64) -> Vec<String> {
    let per_second = |count: usize| {
        if elapsed_secs > 0.0 {
            count as f64 / elapsed_secs
        } else {
            0.0
        }
    };
    let mut lines = vec![format!("{:<12.3} seconds elapsed", elapsed_secs)];
    for (name, count) in [
        ("files", statistics.files),
        ("logical lines", statistics.logical_lines),
        ("physical lines", statistics.physical_lines),
        ("tokens", statistics.tokens),
    ] {
        lines.push(format!("{:<12} total {}", count, name));
        lines.push(format!("{:<12.1} {} per second", per_second(count), name));
    }
    lines
}
