//! Named parameters a plugin can request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A value the file checker can supply to a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    /// The parsed syntax tree of the file.
    Tree,
    /// The reconstructed logical line, strings replaced by placeholders.
    LogicalLine,
    /// The current physical line, terminator included.
    PhysicalLine,
    Filename,
    /// Every token of the file.
    FileTokens,
    /// The tokens of the current logical line.
    Tokens,
    /// Every physical line of the file.
    Lines,
    /// The 1-based number of the current line.
    LineNumber,
    TotalLines,
    /// Blank lines directly before the current logical line.
    BlankLines,
    /// Blank lines before the current logical line, comment lines included.
    BlankBefore,
    IndentLevel,
    IndentChar,
    PreviousLogical,
    PreviousIndentLevel,
    PreviousUnindentedLogicalLine,
    /// True while the checker walks the lines of a multi-line string.
    Multiline,
    MaxLineLength,
    MaxDocLength,
    IndentSize,
    /// Per-plugin, per-file scratch storage.
    CheckerState,
}

impl Parameter {
    /// All parameters, in declaration order.
    pub const ALL: [Parameter; 21] = [
        Parameter::Tree,
        Parameter::LogicalLine,
        Parameter::PhysicalLine,
        Parameter::Filename,
        Parameter::FileTokens,
        Parameter::Tokens,
        Parameter::Lines,
        Parameter::LineNumber,
        Parameter::TotalLines,
        Parameter::BlankLines,
        Parameter::BlankBefore,
        Parameter::IndentLevel,
        Parameter::IndentChar,
        Parameter::PreviousLogical,
        Parameter::PreviousIndentLevel,
        Parameter::PreviousUnindentedLogicalLine,
        Parameter::Multiline,
        Parameter::MaxLineLength,
        Parameter::MaxDocLength,
        Parameter::IndentSize,
        Parameter::CheckerState,
    ];

    /// Returns the name plugins use to request this parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Parameter::Tree => "tree",
            Parameter::LogicalLine => "logical_line",
            Parameter::PhysicalLine => "physical_line",
            Parameter::Filename => "filename",
            Parameter::FileTokens => "file_tokens",
            Parameter::Tokens => "tokens",
            Parameter::Lines => "lines",
            Parameter::LineNumber => "line_number",
            Parameter::TotalLines => "total_lines",
            Parameter::BlankLines => "blank_lines",
            Parameter::BlankBefore => "blank_before",
            Parameter::IndentLevel => "indent_level",
            Parameter::IndentChar => "indent_char",
            Parameter::PreviousLogical => "previous_logical",
            Parameter::PreviousIndentLevel => "previous_indent_level",
            Parameter::PreviousUnindentedLogicalLine => "previous_unindented_logical_line",
            Parameter::Multiline => "multiline",
            Parameter::MaxLineLength => "max_line_length",
            Parameter::MaxDocLength => "max_doc_length",
            Parameter::IndentSize => "indent_size",
            Parameter::CheckerState => "checker_state",
        }
    }
}

impl FromStr for Parameter {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Parameter::ALL
            .into_iter()
            .find(|parameter| parameter.as_str() == name)
            .ok_or_else(|| name.to_string())
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
