//! The check contract: arguments in, findings out.

use std::cell::RefCell;
use std::collections::HashMap;

use lintel_tokens::{SyntaxTree, Token};

use crate::{Parameter, PluginError};

/// Per-plugin, per-file scratch storage.
pub type CheckerState = RefCell<HashMap<String, String>>;

/// Everything the file checker can supply for one invocation.
///
/// The checker fills this in once per invocation; [`CheckArgs`] then only
/// exposes the fields a plugin declared.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgumentSource<'a> {
    pub tree: Option<&'a SyntaxTree>,
    pub logical_line: Option<&'a str>,
    pub physical_line: Option<&'a str>,
    pub filename: &'a str,
    pub file_tokens: &'a [Token],
    pub tokens: &'a [Token],
    pub lines: &'a [String],
    pub line_number: usize,
    pub total_lines: usize,
    pub blank_lines: usize,
    pub blank_before: usize,
    pub indent_level: usize,
    pub indent_char: Option<char>,
    pub previous_logical: &'a str,
    pub previous_indent_level: usize,
    pub previous_unindented_logical_line: &'a str,
    pub multiline: bool,
    pub max_line_length: usize,
    pub max_doc_length: Option<usize>,
    pub indent_size: usize,
    pub checker_state: Option<&'a CheckerState>,
}

/// The arguments handed to a [`Check`].
///
/// Every accessor returns `None` unless the plugin declared the matching
/// [`Parameter`].
#[derive(Debug, Clone, Copy)]
pub struct CheckArgs<'a> {
    source: ArgumentSource<'a>,
    declared: &'a [Parameter],
}

impl<'a> CheckArgs<'a> {
    /// Creates the argument set for a plugin declaring `declared`.
    pub fn new(source: ArgumentSource<'a>, declared: &'a [Parameter]) -> Self {
        Self { source, declared }
    }

    /// Returns true if the plugin declared `parameter`.
    pub fn has(&self, parameter: Parameter) -> bool {
        self.declared.contains(&parameter)
    }

    fn when<T>(&self, parameter: Parameter, value: T) -> Option<T> {
        self.has(parameter).then_some(value)
    }

    pub fn tree(&self) -> Option<&'a SyntaxTree> {
        self.when(Parameter::Tree, self.source.tree).flatten()
    }

    pub fn logical_line(&self) -> Option<&'a str> {
        self.when(Parameter::LogicalLine, self.source.logical_line)
            .flatten()
    }

    pub fn physical_line(&self) -> Option<&'a str> {
        self.when(Parameter::PhysicalLine, self.source.physical_line)
            .flatten()
    }

    pub fn filename(&self) -> Option<&'a str> {
        self.when(Parameter::Filename, self.source.filename)
    }

    pub fn file_tokens(&self) -> Option<&'a [Token]> {
        self.when(Parameter::FileTokens, self.source.file_tokens)
    }

    pub fn tokens(&self) -> Option<&'a [Token]> {
        self.when(Parameter::Tokens, self.source.tokens)
    }

    pub fn lines(&self) -> Option<&'a [String]> {
        self.when(Parameter::Lines, self.source.lines)
    }

    pub fn line_number(&self) -> Option<usize> {
        self.when(Parameter::LineNumber, self.source.line_number)
    }

    pub fn total_lines(&self) -> Option<usize> {
        self.when(Parameter::TotalLines, self.source.total_lines)
    }

    pub fn blank_lines(&self) -> Option<usize> {
        self.when(Parameter::BlankLines, self.source.blank_lines)
    }

    pub fn blank_before(&self) -> Option<usize> {
        self.when(Parameter::BlankBefore, self.source.blank_before)
    }

    pub fn indent_level(&self) -> Option<usize> {
        self.when(Parameter::IndentLevel, self.source.indent_level)
    }

    pub fn indent_char(&self) -> Option<char> {
        self.when(Parameter::IndentChar, self.source.indent_char)
            .flatten()
    }

    pub fn previous_logical(&self) -> Option<&'a str> {
        self.when(Parameter::PreviousLogical, self.source.previous_logical)
    }

    pub fn previous_indent_level(&self) -> Option<usize> {
        self.when(
            Parameter::PreviousIndentLevel,
            self.source.previous_indent_level,
        )
    }

    pub fn previous_unindented_logical_line(&self) -> Option<&'a str> {
        self.when(
            Parameter::PreviousUnindentedLogicalLine,
            self.source.previous_unindented_logical_line,
        )
    }

    pub fn multiline(&self) -> Option<bool> {
        self.when(Parameter::Multiline, self.source.multiline)
    }

    pub fn max_line_length(&self) -> Option<usize> {
        self.when(Parameter::MaxLineLength, self.source.max_line_length)
    }

    pub fn max_doc_length(&self) -> Option<usize> {
        self.when(Parameter::MaxDocLength, self.source.max_doc_length)
            .flatten()
    }

    pub fn indent_size(&self) -> Option<usize> {
        self.when(Parameter::IndentSize, self.source.indent_size)
    }

    pub fn checker_state(&self) -> Option<&'a CheckerState> {
        self.when(Parameter::CheckerState, self.source.checker_state)
            .flatten()
    }
}

/// Where a finding points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// A character offset. Logical-line checks resolve it through the
    /// logical line's mapping; physical-line checks use it as the column.
    Offset(usize),
    /// An explicit 1-based row and 0-based column.
    Position(usize, usize),
}

/// One finding reported by a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutput {
    pub location: Location,
    /// The code followed by a space and the text, e.g. `"E501 line too long"`.
    pub message: String,
}

impl CheckOutput {
    /// Creates a finding at a character offset.
    pub fn at_offset(offset: usize, message: impl Into<String>) -> Self {
        Self {
            location: Location::Offset(offset),
            message: message.into(),
        }
    }

    /// Creates a finding at an explicit position.
    pub fn at(row: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            location: Location::Position(row, column),
            message: message.into(),
        }
    }

    /// Splits the message into its code and text.
    pub fn split(&self) -> (&str, &str) {
        self.message
            .split_once(' ')
            .unwrap_or((self.message.as_str(), ""))
    }
}

/// A check implementation.
///
/// Results are consumed eagerly: the checker calls `run` once per
/// invocation and takes every returned finding.
pub trait Check: Send + Sync {
    /// Runs the check.
    ///
    /// # Arguments
    ///
    /// * `args` - The declared parameters for this invocation
    ///
    /// # Returns
    ///
    /// The findings, in the order they should be reported.
    fn run(&self, args: &CheckArgs<'_>) -> Result<Vec<CheckOutput>, PluginError>;
}

impl<F> Check for F
where
    F: Fn(&CheckArgs<'_>) -> Result<Vec<CheckOutput>, PluginError> + Send + Sync,
{
    fn run(&self, args: &CheckArgs<'_>) -> Result<Vec<CheckOutput>, PluginError> {
        self(args)
    }
}

/// Pins a closure to the [`Check`] signature.
pub fn check_fn<F>(f: F) -> F
where
    F: Fn(&CheckArgs<'_>) -> Result<Vec<CheckOutput>, PluginError> + Send + Sync,
{
    f
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_undeclared_parameters_are_hidden() {
        let source = ArgumentSource {
            logical_line: Some("x = 1"),
            physical_line: Some("x = 1\n"),
            filename: "a.py",
            line_number: 3,
            ..Default::default()
        };
        let declared = [Parameter::LogicalLine, Parameter::LineNumber];
        let args = CheckArgs::new(source, &declared);

        assert_eq!(args.logical_line(), Some("x = 1"));
        assert_eq!(args.line_number(), Some(3));
        assert_eq!(args.physical_line(), None);
        assert_eq!(args.filename(), None);
    }

    #[test]
    fn test_checker_state_is_shared_scratch() {
        let state = CheckerState::default();
        let source = ArgumentSource {
            checker_state: Some(&state),
            ..Default::default()
        };
        let declared = [Parameter::CheckerState];
        let args = CheckArgs::new(source, &declared);

        if let Some(state) = args.checker_state() {
            state
                .borrow_mut()
                .insert("seen".to_string(), "1".to_string());
        }
        assert_eq!(state.borrow().get("seen").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_split_message() {
        let output = CheckOutput::at_offset(4, "E501 line too long (90 > 79 characters)");
        assert_eq!(output.split(), ("E501", "line too long (90 > 79 characters)"));

        let bare = CheckOutput::at(1, 0, "X100");
        assert_eq!(bare.split(), ("X100", ""));
    }

    #[test]
    fn test_closure_is_a_check() {
        let check = check_fn(|args| {
            Ok(args
                .physical_line()
                .filter(|line| line.contains('\t'))
                .map(|_| vec![CheckOutput::at_offset(0, "W191 indentation contains tabs")])
                .unwrap_or_default())
        });
        let source = ArgumentSource {
            physical_line: Some("\tx\n"),
            ..Default::default()
        };
        let declared = [Parameter::PhysicalLine];
        let outputs = check.run(&CheckArgs::new(source, &declared)).unwrap();
        assert_eq!(outputs.len(), 1);
    }
}
