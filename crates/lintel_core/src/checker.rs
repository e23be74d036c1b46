//! Runs every plugin against a single file.

use std::fs;
use std::io::{self, Read};

use lintel_plugin::{CheckArgs, CheckOutput, Checkers, Location, Parameter, Plugin, PluginError};
use lintel_tokens::{FrontEnd, ParseError, Token, TokenKind};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::discovery::STDIN;
use crate::processor::{FileProcessor, find_offset};
use crate::suppression::BlockRange;
use crate::{LintelError, RunOptions};

/// Code for files that cannot be read or tokenized.
pub const E902: &str = "E902";
/// Code for files that cannot be parsed.
pub const E999: &str = "E999";

/// One finding, before the select/ignore decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub code: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (0-indexed), as the plugin reported it.
    pub column: usize,
    pub text: String,
    /// Every physical line of the statement the finding is on.
    pub physical_line: Option<String>,
}

/// Counters for one checked file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileStatistics {
    pub tokens: usize,
    pub logical_lines: usize,
    pub physical_lines: usize,
}

/// The outcome of checking one file.
#[derive(Debug)]
pub struct FileReport {
    /// The file name as displayed.
    pub filename: String,
    pub results: Vec<CheckResult>,
    pub statistics: FileStatistics,
    /// Block suppression ranges found in the file.
    pub block_suppressions: Vec<BlockRange>,
    /// Set when a plugin failed; `results` is then empty.
    pub failure: Option<LintelError>,
}

/// Drives the physical-line, logical-line and tree plugins over one file.
pub struct FileChecker<'a> {
    display_name: String,
    checkers: &'a Checkers,
    front_end: &'a dyn FrontEnd,
    processor: Option<FileProcessor>,
    results: Vec<CheckResult>,
    statistics: FileStatistics,
    should_process: bool,
}

fn read_source(filename: &str) -> io::Result<String> {
    if filename == STDIN {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        fs::read_to_string(filename)
    }
}

impl<'a> FileChecker<'a> {
    /// Reads `filename` (`-` for stdin) and prepares it for checking.
    ///
    /// A file that cannot be read yields a single E902 finding.
    pub fn new(
        filename: &str,
        checkers: &'a Checkers,
        front_end: &'a dyn FrontEnd,
        options: &'a RunOptions,
    ) -> Self {
        let display_name = options.display_name(filename).to_string();
        Self::with_source(display_name, read_source(filename), checkers, front_end, options)
    }

    /// Prepares already loaded source text for checking.
    pub fn from_source(
        display_name: impl Into<String>,
        source: &str,
        checkers: &'a Checkers,
        front_end: &'a dyn FrontEnd,
        options: &'a RunOptions,
    ) -> Self {
        Self::with_source(
            display_name.into(),
            Ok(source.to_string()),
            checkers,
            front_end,
            options,
        )
    }

    fn with_source(
        display_name: String,
        source: io::Result<String>,
        checkers: &'a Checkers,
        front_end: &'a dyn FrontEnd,
        options: &'a RunOptions,
    ) -> Self {
        let mut checker = Self {
            display_name,
            checkers,
            front_end,
            processor: None,
            results: Vec::new(),
            statistics: FileStatistics::default(),
            should_process: false,
        };

        match source {
            Ok(source) => {
                let mut processor =
                    FileProcessor::new(checker.display_name.clone(), &source, options);
                processor.init_checker_states(checkers.iter().map(Plugin::id));
                checker.statistics.physical_lines = processor.total_lines;
                checker.should_process = !processor.should_ignore_file(options.disable_noqa);
                checker.processor = Some(processor);
            }
            Err(e) => {
                error!("Unable to open file {}: {}", checker.display_name, e);
                checker.report(None, E902, 0, 0, format!("{:?}: {}", e.kind(), e));
            }
        }
        checker
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Runs every check and returns the file's report.
    pub fn run_checks(mut self) -> FileReport {
        let mut failure = None;
        if let Some(mut processor) = self.processor.take() {
            if self.should_process {
                if let Err(e) = self.check_file(&mut processor) {
                    warn!("Aborting checks for {}: {}", self.display_name, e);
                    self.results.clear();
                    failure = Some(e);
                }
                self.statistics.logical_lines = processor.logical_lines();
            } else {
                debug!("{} opts out of checking", self.display_name);
            }
            self.processor = Some(processor);
        }

        FileReport {
            block_suppressions: self
                .processor
                .as_ref()
                .map(FileProcessor::block_ranges)
                .unwrap_or_default(),
            filename: self.display_name,
            results: self.results,
            statistics: self.statistics,
            failure,
        }
    }

    fn check_file(&mut self, processor: &mut FileProcessor) -> Result<(), LintelError> {
        match self.front_end.tokenize(&processor.source()) {
            Ok(tokens) => processor.set_file_tokens(tokens),
            Err(e) => {
                self.report(
                    Some(&*processor),
                    E902,
                    e.line,
                    e.column,
                    format!("TokenizeError: {}", e.message),
                );
                return Ok(());
            }
        }

        self.process_tokens(processor)?;
        self.run_tree_checks(processor)
    }

    fn process_tokens(&mut self, processor: &mut FileProcessor) -> Result<(), LintelError> {
        let mut parens = 0usize;
        let mut prev_physical = String::new();
        let mut comment_row = None;
        let tokens: Vec<Token> = processor.file_tokens().to_vec();

        for token in tokens {
            if token.start.line > processor.total_lines {
                break;
            }
            processor.advance_to(token.end.line);
            processor.tokens.push(token.clone());
            self.statistics.tokens += 1;

            self.check_physical_eol(processor, &token, &prev_physical)?;

            if token.kind == TokenKind::Op {
                if token.is_open_bracket() {
                    parens += 1;
                } else if token.is_close_bracket() {
                    parens = parens.saturating_sub(1);
                }
            } else if parens == 0 {
                if token.kind.is_newline() {
                    if token.kind == TokenKind::Nl && comment_row == Some(token.start.line) {
                        // The line end of a comment-only line already checked.
                        processor.delete_first_token();
                    } else {
                        self.handle_newline(processor, token.kind)?;
                    }
                    comment_row = None;
                } else if token.kind == TokenKind::Comment && processor.tokens.len() == 1 {
                    self.run_logical_checks(processor)?;
                    comment_row = Some(token.start.line);
                }
            }
            prev_physical = token.line;
        }

        if !processor.tokens.is_empty() {
            let last = processor.lines().last().cloned().unwrap_or_default();
            self.run_physical_checks(processor, &last)?;
            self.run_logical_checks(processor)?;
        }
        Ok(())
    }

    fn handle_newline(
        &mut self,
        processor: &mut FileProcessor,
        kind: TokenKind,
    ) -> Result<(), LintelError> {
        if kind == TokenKind::Newline {
            self.run_logical_checks(processor)?;
            processor.reset_blank_before();
        } else if processor.tokens.len() == 1 {
            processor.visited_new_blank_line();
            processor.delete_first_token();
        } else {
            self.run_logical_checks(processor)?;
        }
        Ok(())
    }

    fn check_physical_eol(
        &mut self,
        processor: &mut FileProcessor,
        token: &Token,
        prev_physical: &str,
    ) -> Result<(), LintelError> {
        if token.is_eol() {
            // A file without a final newline ends in a line end with no text.
            let line = if token.line.is_empty() {
                prev_physical
            } else {
                token.line.as_str()
            };
            self.run_physical_checks(processor, line)?;
        } else if token.is_multiline_string() {
            // The last line is checked when its own line end comes up.
            processor.begin_multiline(token.start.line);
            for row in token.start.line..token.end.line {
                let line = processor.lines().get(row - 1).cloned().unwrap_or_default();
                self.run_physical_checks(processor, &line)?;
                processor.line_number += 1;
            }
            processor.end_multiline();
        }
        Ok(())
    }

    fn run_check(
        &self,
        plugin: &Plugin,
        args: impl FnOnce(&[Parameter]) -> Result<Vec<CheckOutput>, PluginError>,
    ) -> Result<Vec<CheckOutput>, LintelError> {
        plugin
            .declared()
            .and_then(args)
            .map_err(|e| LintelError::plugin_execution(plugin.display_name(), &self.display_name, e))
    }

    fn run_physical_checks(
        &mut self,
        processor: &FileProcessor,
        physical_line: &str,
    ) -> Result<(), LintelError> {
        let checkers = self.checkers;
        for plugin in &checkers.physical_line {
            let outputs = self.run_check(plugin, |declared| {
                let mut source = processor.argument_source();
                source.physical_line = Some(physical_line);
                source.checker_state = processor.checker_state(plugin.id());
                plugin.run(&CheckArgs::new(source, declared))
            })?;

            for output in outputs {
                let (line, column) = match output.location {
                    Location::Offset(column) => (processor.line_number, column),
                    Location::Position(line, column) => (line, column),
                };
                let (code, text) = output.split();
                self.report(Some(processor), code, line, column, text);
            }
        }
        Ok(())
    }

    fn run_logical_checks(&mut self, processor: &mut FileProcessor) -> Result<(), LintelError> {
        let (_, logical_line, mapping) = processor.build_logical_line();
        if mapping.is_empty() {
            return Ok(());
        }
        processor.update_state(&mapping);
        debug!("Logical line: {:?}", logical_line.trim_end());

        let checkers = self.checkers;
        for plugin in &checkers.logical_line {
            let outputs = self.run_check(plugin, |declared| {
                let mut source = processor.argument_source();
                source.logical_line = Some(&logical_line);
                source.checker_state = processor.checker_state(plugin.id());
                plugin.run(&CheckArgs::new(source, declared))
            })?;

            for output in outputs {
                let (line, column) = match output.location {
                    Location::Offset(offset) => match find_offset(offset, &mapping) {
                        Some(position) => (position.line, position.column),
                        None => {
                            warn!(
                                "Position of error out of bounds for {}",
                                plugin.display_name()
                            );
                            continue;
                        }
                    },
                    Location::Position(line, column) => (line, column),
                };
                let (code, text) = output.split();
                self.report(Some(&*processor), code, line, column, text);
            }
        }

        processor.next_logical_line();
        Ok(())
    }

    fn run_tree_checks(&mut self, processor: &FileProcessor) -> Result<(), LintelError> {
        let tree = match self.front_end.parse(processor.file_tokens()) {
            Ok(tree) => tree,
            Err(e) => {
                let (line, column) = syntax_error_position(&e);
                self.report(
                    Some(processor),
                    E999,
                    line,
                    column,
                    format!("ParseError: {}", e.message),
                );
                return Ok(());
            }
        };

        let checkers = self.checkers;
        for plugin in &checkers.tree {
            let outputs = self.run_check(plugin, |declared| {
                let mut source = processor.argument_source();
                source.tree = Some(&tree);
                source.checker_state = processor.checker_state(plugin.id());
                plugin.run(&CheckArgs::new(source, declared))
            })?;

            for output in outputs {
                let Location::Position(line, column) = output.location else {
                    return Err(LintelError::plugin_execution(
                        plugin.display_name(),
                        &self.display_name,
                        PluginError::invalid_output("tree checks must report a line and column"),
                    ));
                };
                let (code, text) = output.split();
                self.report(Some(processor), code, line, column, text);
            }
        }
        Ok(())
    }

    fn report(
        &mut self,
        processor: Option<&FileProcessor>,
        code: &str,
        line: usize,
        column: usize,
        text: impl Into<String>,
    ) {
        let physical_line = processor
            .and_then(|processor| processor.noqa_line_for(line))
            .map(str::to_string);
        self.results.push(CheckResult {
            code: code.to_string(),
            line,
            column,
            text: text.into(),
            physical_line,
        });
    }
}

/// Converts a parse error's 1-indexed position to the 0-indexed column
/// findings use. A column past the line terminator is pulled back onto
/// the line.
fn syntax_error_position(error: &ParseError) -> (usize, usize) {
    let mut column = error.column.saturating_sub(1);
    if let Some(text) = &error.text
        && text.ends_with('\n')
        && column > 0
        && column >= text.chars().count()
    {
        column -= 1;
    }
    (error.line, column)
}
