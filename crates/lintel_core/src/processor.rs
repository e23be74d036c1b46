//! Per-file state shared by the checks: lines, tokens, and the logical line
//! being assembled.

use std::collections::HashMap;

use lintel_plugin::{ArgumentSource, CheckerState};
use lintel_tokens::{Position, Token, TokenKind};
use tracing::debug;

use crate::suppression::{self, BlockRange, SuppressionEvaluator};
use crate::RunOptions;

/// Offsets into a logical line paired with the source position they map
/// to. The first entry is `(0, start of first token)`, then one
/// `(length so far, token end)` entry per token.
pub type Mapping = Vec<(usize, Position)>;

/// Tracks everything the checks of one file see.
#[derive(Debug)]
pub struct FileProcessor {
    filename: String,
    lines: Vec<String>,
    file_tokens: Vec<Token>,
    /// Tokens of the logical line being assembled.
    pub tokens: Vec<Token>,
    pub blank_before: usize,
    pub blank_lines: usize,
    /// The first indentation character seen in the file.
    pub indent_char: Option<char>,
    pub indent_level: usize,
    pub indent_size: usize,
    /// The current physical line number (1-indexed).
    pub line_number: usize,
    pub logical_line: String,
    pub max_line_length: usize,
    pub max_doc_length: Option<usize>,
    /// True while the lines of a multi-line string are being checked.
    pub multiline: bool,
    pub previous_indent_level: usize,
    pub previous_logical: String,
    pub previous_unindented_logical_line: String,
    pub total_lines: usize,
    logical_lines: usize,
    lines_read: usize,
    checker_states: HashMap<String, CheckerState>,
    noqa_lines: HashMap<usize, String>,
}

impl FileProcessor {
    /// Creates a processor for `source`, displayed as `filename`.
    pub fn new(filename: impl Into<String>, source: &str, options: &RunOptions) -> Self {
        let mut lines: Vec<String> = source.split_inclusive('\n').map(str::to_string).collect();
        if let Some(first) = lines.first_mut()
            && let Some(stripped) = first.strip_prefix('\u{feff}')
        {
            *first = stripped.to_string();
        }
        let total_lines = lines.len();

        Self {
            filename: filename.into(),
            lines,
            file_tokens: Vec::new(),
            tokens: Vec::new(),
            blank_before: 0,
            blank_lines: 0,
            indent_char: None,
            indent_level: 0,
            indent_size: options.indent_size,
            line_number: 0,
            logical_line: String::new(),
            max_line_length: options.max_line_length,
            max_doc_length: options.max_doc_length,
            multiline: false,
            previous_indent_level: 0,
            previous_logical: String::new(),
            previous_unindented_logical_line: String::new(),
            total_lines,
            logical_lines: 0,
            lines_read: 0,
            checker_states: HashMap::new(),
            noqa_lines: HashMap::new(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Physical lines, each with its terminator.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The whole file's tokens.
    pub fn file_tokens(&self) -> &[Token] {
        &self.file_tokens
    }

    /// The file's source, reassembled from its lines.
    pub fn source(&self) -> String {
        self.lines.concat()
    }

    /// Number of logical lines built so far.
    pub fn logical_lines(&self) -> usize {
        self.logical_lines
    }

    /// Stores the file's tokens and indexes the statement text each line
    /// belongs to.
    pub fn set_file_tokens(&mut self, tokens: Vec<Token>) {
        self.noqa_lines = self.statement_lines(&tokens);
        self.file_tokens = tokens;
    }

    /// Returns true when the file opts out of checking as a whole.
    pub fn should_ignore_file(&self, disable_noqa: bool) -> bool {
        !disable_noqa && suppression::is_file_suppressed(&self.lines)
    }

    /// Block suppression ranges of this file.
    pub fn block_ranges(&self) -> Vec<BlockRange> {
        SuppressionEvaluator::scan_blocks(&self.lines)
    }

    /// Creates empty scratch state for each plugin id.
    pub fn init_checker_states<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            self.checker_states.entry(id.to_string()).or_default();
        }
    }

    pub fn checker_state(&self, id: &str) -> Option<&CheckerState> {
        self.checker_states.get(id)
    }

    /// Reads lines up to and including `row`, as a tokenizer would before
    /// handing out a token ending on it.
    pub fn advance_to(&mut self, row: usize) {
        let target = row.min(self.total_lines);
        while self.lines_read < target {
            let line = &self.lines[self.lines_read];
            if self.indent_char.is_none()
                && let Some(c) = line.chars().next().filter(|c| matches!(c, ' ' | '\t'))
            {
                self.indent_char = Some(c);
            }
            self.lines_read += 1;
        }
        self.line_number = self.lines_read;
    }

    /// Rewinds the line number to the first line of a multi-line string.
    pub fn begin_multiline(&mut self, line_number: usize) {
        self.line_number = line_number;
        self.multiline = true;
    }

    pub fn end_multiline(&mut self) {
        self.multiline = false;
    }

    pub fn reset_blank_before(&mut self) {
        self.blank_before = 0;
    }

    pub fn visited_new_blank_line(&mut self) {
        self.blank_lines += 1;
    }

    pub fn delete_first_token(&mut self) {
        if !self.tokens.is_empty() {
            self.tokens.remove(0);
        }
    }

    /// Updates indentation and blank-line state from a logical line's
    /// mapping.
    pub fn update_state(&mut self, mapping: &Mapping) {
        let Some((_, start)) = mapping.first() else {
            return;
        };
        if let Some(line) = start.line.checked_sub(1).and_then(|row| self.lines.get(row)) {
            let prefix: String = line.chars().take(start.column).collect();
            self.indent_level = expand_indent(&prefix);
        }
        self.blank_before = self.blank_before.max(self.blank_lines);
    }

    /// Moves on to the next logical line.
    pub fn next_logical_line(&mut self) {
        if !self.logical_line.is_empty() {
            self.previous_indent_level = self.indent_level;
            self.previous_logical = self.logical_line.clone();
            if self.indent_level == 0 {
                self.previous_unindented_logical_line = self.logical_line.clone();
            }
        }
        self.blank_lines = 0;
        self.tokens.clear();
    }

    /// Splits the buffered tokens into comments and logical-line pieces.
    ///
    /// String contents are masked with `x`, and whitespace between tokens
    /// is normalized: a line break becomes one space unless it follows an
    /// opening bracket or precedes a closing one, and spacing within a
    /// line is kept as written.
    pub fn build_logical_line_tokens(&self) -> (Vec<String>, Vec<String>, Mapping) {
        let mut comments = Vec::new();
        let mut logical = Vec::new();
        let mut mapping: Mapping = Vec::new();
        let mut length = 0;
        let mut previous: Option<Position> = None;

        for token in &self.tokens {
            if token.kind.is_skipped() {
                continue;
            }
            if mapping.is_empty() {
                mapping.push((0, token.start));
            }
            if token.kind == TokenKind::Comment {
                comments.push(token.text.clone());
                continue;
            }

            let mut text = if token.kind == TokenKind::String {
                mutate_string(&token.text)
            } else {
                token.text.clone()
            };

            if let Some(previous) = previous {
                if previous.line != token.start.line {
                    let previous_text = previous
                        .column
                        .checked_sub(1)
                        .and_then(|column| self.char_at(previous.line, column));
                    let after_open = previous_text.is_some_and(|c| "{[(".contains(c));
                    let before_close = matches!(text.as_str(), "}" | "]" | ")");
                    if previous_text == Some(',') || (!after_open && !before_close) {
                        text.insert(0, ' ');
                    }
                } else if previous.column != token.start.column {
                    let gap: String = token
                        .line
                        .chars()
                        .skip(previous.column)
                        .take(token.start.column.saturating_sub(previous.column))
                        .collect();
                    text.insert_str(0, &gap);
                }
            }

            length += text.chars().count();
            logical.push(text);
            mapping.push((length, token.end));
            previous = Some(token.end);
        }

        (comments, logical, mapping)
    }

    /// Builds the logical line from the buffered tokens and returns
    /// `(comments, logical line, mapping)`.
    pub fn build_logical_line(&mut self) -> (String, String, Mapping) {
        let (comments, logical, mapping) = self.build_logical_line_tokens();
        self.logical_line = logical.concat();
        self.logical_lines += 1;
        (comments.concat(), self.logical_line.clone(), mapping)
    }

    /// The text of every physical line of the statement `line_number` is
    /// part of.
    pub fn noqa_line_for(&self, line_number: usize) -> Option<&str> {
        self.noqa_lines.get(&line_number).map(String::as_str)
    }

    fn statement_lines(&self, tokens: &[Token]) -> HashMap<usize, String> {
        let mut statements = HashMap::new();
        let mut range: Option<(usize, usize)> = None;
        let mut depth = 0usize;

        for token in tokens {
            if matches!(token.kind, TokenKind::EndMarker | TokenKind::Dedent) {
                continue;
            }
            if token.is_open_bracket() {
                depth += 1;
            } else if token.is_close_bracket() {
                depth = depth.saturating_sub(1);
            }
            let (min, max) = range.unwrap_or((usize::MAX, 0));
            let (min, max) = (min.min(token.start.line), max.max(token.end.line));
            range = Some((min, max));

            // Line breaks inside brackets do not end the statement.
            if token.kind == TokenKind::Newline || (token.kind == TokenKind::Nl && depth == 0) {
                let last = max.min(self.lines.len());
                if min >= 1 && min <= last {
                    let joined = self.lines[min - 1..last].concat();
                    for row in min..=max {
                        statements.insert(row, joined.clone());
                    }
                }
                range = None;
            }
        }

        debug!(
            "Indexed {} statement lines in {}",
            statements.len(),
            self.filename
        );
        statements
    }

    fn char_at(&self, row: usize, column: usize) -> Option<char> {
        self.lines.get(row.checked_sub(1)?)?.chars().nth(column)
    }

    /// The arguments every check kind shares. Callers fill in the line or
    /// tree under check and the plugin's scratch state.
    pub fn argument_source(&self) -> ArgumentSource<'_> {
        ArgumentSource {
            filename: &self.filename,
            file_tokens: &self.file_tokens,
            tokens: &self.tokens,
            lines: &self.lines,
            line_number: self.line_number,
            total_lines: self.total_lines,
            blank_lines: self.blank_lines,
            blank_before: self.blank_before,
            indent_level: self.indent_level,
            indent_char: self.indent_char,
            previous_logical: &self.previous_logical,
            previous_indent_level: self.previous_indent_level,
            previous_unindented_logical_line: &self.previous_unindented_logical_line,
            multiline: self.multiline,
            max_line_length: self.max_line_length,
            max_doc_length: self.max_doc_length,
            indent_size: self.indent_size,
            ..ArgumentSource::default()
        }
    }
}

/// Returns the width of the leading whitespace of `line`, with tabs
/// advancing to the next multiple of eight.
pub fn expand_indent(line: &str) -> usize {
    if !line.contains('\t') {
        return line.chars().take_while(|c| c.is_whitespace()).count();
    }

    let mut width = 0;
    for c in line.chars() {
        match c {
            '\t' => width = width / 8 * 8 + 8,
            ' ' => width += 1,
            _ => break,
        }
    }
    width
}

/// Replaces the contents of a string literal with `x`s, keeping its
/// prefix and quotes.
pub fn mutate_string(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let Some(&quote) = chars.last() else {
        return String::new();
    };
    let Some(first_quote) = chars.iter().position(|&c| c == quote) else {
        return text.to_string();
    };

    let mut start = first_quote + 1;
    let mut end = chars.len() - 1;
    if text.ends_with("\"\"\"") || text.ends_with("'''") {
        start += 2;
        end = end.saturating_sub(2);
    }
    if end <= start {
        return text.to_string();
    }

    let mut mutated: String = chars[..start].iter().collect();
    mutated.extend(std::iter::repeat_n('x', end - start));
    mutated.extend(&chars[end..]);
    mutated
}

/// Resolves `offset` into the logical line to a source position.
///
/// The anchor is the first entry whose offset is at least `offset`, or the
/// last entry when `offset` lies past every entry. Returns `None` for an
/// empty mapping.
pub fn find_offset(offset: usize, mapping: &Mapping) -> Option<Position> {
    let (anchor_offset, anchor) = mapping
        .iter()
        .find(|(token_offset, _)| offset <= *token_offset)
        .or_else(|| mapping.last())?;

    Some(Position::new(
        anchor.line,
        (anchor.column + offset).saturating_sub(*anchor_offset),
    ))
}
