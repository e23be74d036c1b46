//! Reference front end for a small indentation-based language.
//!
//! The language has `#` comments, backslash continuations, bracket groups,
//! single and triple quoted strings with optional `r`/`b`/`u`/`f`
//! prefixes, and suites introduced by a trailing `:`.

use crate::{
    FrontEnd, ParseError, Position, SyntaxTree, Token, TokenKind, TokenizeError, build_tree,
};

const TAB_SIZE: usize = 8;

const OPERATORS: [&[&str]; 3] = [
    &["**=", "//=", ">>=", "<<=", "..."],
    &[
        "**", "//", ">>", "<<", "<=", ">=", "==", "!=", "->", "+=", "-=", "*=", "/=", "%=", "&=",
        "|=", "^=", "@=", ":=",
    ],
    &[
        "+", "-", "*", "/", "%", "@", "&", "|", "^", "~", "<", ">", "(", ")", "[", "]", "{", "}",
        ",", ":", ";", ".", "=", "!",
    ],
];

/// The reference front end.
///
/// # Example
///
/// ```rust,ignore
/// let tokens = BasicFrontEnd::new().tokenize("x = 1\n")?;
/// assert_eq!(tokens.len(), 5);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicFrontEnd;

impl BasicFrontEnd {
    /// Creates a new front end.
    pub fn new() -> Self {
        Self
    }
}

impl FrontEnd for BasicFrontEnd {
    fn name(&self) -> &str {
        "basic"
    }

    fn tokenize(&self, source: &str) -> Result<Vec<Token>, TokenizeError> {
        Tokenizer::new(source).run()
    }

    fn parse(&self, tokens: &[Token]) -> Result<SyntaxTree, ParseError> {
        build_tree(tokens)
    }
}

/// A string literal that continues past the end of its first line.
struct OpenString {
    start: Position,
    quote: char,
    triple: bool,
    text: String,
    lines: String,
}

struct Tokenizer<'a> {
    lines: Vec<&'a str>,
    tokens: Vec<Token>,
    indents: Vec<usize>,
    depth: usize,
    continued: bool,
    in_statement: bool,
    open_string: Option<OpenString>,
}

impl<'a> Tokenizer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.split_inclusive('\n').collect(),
            tokens: Vec::new(),
            indents: vec![0],
            depth: 0,
            continued: false,
            in_statement: false,
            open_string: None,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, TokenizeError> {
        let lines = std::mem::take(&mut self.lines);
        for (index, line) in lines.iter().enumerate() {
            self.line(index + 1, line)?;
        }
        self.finish(&lines)
    }

    fn push(
        &mut self,
        kind: TokenKind,
        text: impl Into<String>,
        start: impl Into<Position>,
        end: impl Into<Position>,
        line: &str,
    ) {
        if !matches!(
            kind,
            TokenKind::Comment
                | TokenKind::Nl
                | TokenKind::Newline
                | TokenKind::Indent
                | TokenKind::Dedent
                | TokenKind::EndMarker
        ) {
            self.in_statement = true;
        }
        self.tokens.push(Token::new(kind, text, start, end, line));
    }

    fn line(&mut self, lnum: usize, line: &str) -> Result<(), TokenizeError> {
        let chars: Vec<char> = line.chars().collect();
        let mut pos = 0;

        if let Some(mut open) = self.open_string.take() {
            match find_string_end(&chars, 0, open.quote, open.triple) {
                Some(end) => {
                    open.text.extend(&chars[..end]);
                    open.lines.push_str(line);
                    self.push(
                        TokenKind::String,
                        open.text,
                        open.start,
                        (lnum, end),
                        &open.lines,
                    );
                    pos = end;
                }
                None => {
                    if !open.triple && !ends_with_continuation(&chars) {
                        return Err(TokenizeError::new(
                            "unterminated string literal",
                            open.start.line,
                            open.start.column,
                        ));
                    }
                    open.text.push_str(line);
                    open.lines.push_str(line);
                    self.open_string = Some(open);
                    return Ok(());
                }
            }
        } else if self.depth == 0 && !self.continued {
            let (column, start) = measure_indent(&chars);
            pos = start;
            match chars.get(pos) {
                None => return Ok(()),
                Some('#') => {
                    let end = content_end(&chars);
                    self.push(
                        TokenKind::Comment,
                        collect(&chars[pos..end]),
                        (lnum, pos),
                        (lnum, end),
                        line,
                    );
                    self.push(
                        TokenKind::Nl,
                        collect(&chars[end..]),
                        (lnum, end),
                        (lnum, chars.len()),
                        line,
                    );
                    return Ok(());
                }
                Some('\r' | '\n') => {
                    self.push(
                        TokenKind::Nl,
                        collect(&chars[pos..]),
                        (lnum, pos),
                        (lnum, chars.len()),
                        line,
                    );
                    return Ok(());
                }
                Some(_) => self.indent(lnum, line, column, pos)?,
            }
        } else {
            self.continued = false;
        }

        self.scan(lnum, line, &chars, pos)
    }

    fn indent(
        &mut self,
        lnum: usize,
        line: &str,
        column: usize,
        pos: usize,
    ) -> Result<(), TokenizeError> {
        if column > self.current_indent() {
            self.indents.push(column);
            let prefix: String = line.chars().take(pos).collect();
            self.push(TokenKind::Indent, prefix, (lnum, 0), (lnum, pos), line);
        }
        while column < self.current_indent() {
            if !self.indents.contains(&column) {
                return Err(TokenizeError::new(
                    "unindent does not match any outer indentation level",
                    lnum,
                    pos,
                ));
            }
            self.indents.pop();
            self.push(TokenKind::Dedent, "", (lnum, pos), (lnum, pos), line);
        }
        Ok(())
    }

    fn current_indent(&self) -> usize {
        self.indents.last().copied().unwrap_or(0)
    }

    fn scan(
        &mut self,
        lnum: usize,
        line: &str,
        chars: &[char],
        mut pos: usize,
    ) -> Result<(), TokenizeError> {
        let max = chars.len();
        while pos < max {
            let c = chars[pos];
            if matches!(c, ' ' | '\t' | '\x0c') {
                pos += 1;
                continue;
            }
            let start = pos;
            match c {
                '#' => {
                    let end = content_end(chars);
                    self.push(
                        TokenKind::Comment,
                        collect(&chars[start..end]),
                        (lnum, start),
                        (lnum, end),
                        line,
                    );
                    pos = end;
                }
                '\r' | '\n' => {
                    let kind = if self.depth == 0 && self.in_statement {
                        TokenKind::Newline
                    } else {
                        TokenKind::Nl
                    };
                    self.push(kind, collect(&chars[start..]), (lnum, start), (lnum, max), line);
                    if kind == TokenKind::Newline {
                        self.in_statement = false;
                    }
                    pos = max;
                }
                '\\' => {
                    if content_end(&chars[start..]) != 1 {
                        return Err(TokenizeError::new(
                            "unexpected character after line continuation character",
                            lnum,
                            start + 1,
                        ));
                    }
                    self.continued = true;
                    pos = max;
                }
                '\'' | '"' => pos = self.string(lnum, line, chars, start, start)?,
                _ if c.is_ascii_digit()
                    || (c == '.' && chars.get(pos + 1).is_some_and(char::is_ascii_digit)) =>
                {
                    pos = scan_number(chars, start);
                    self.push(
                        TokenKind::Number,
                        collect(&chars[start..pos]),
                        (lnum, start),
                        (lnum, pos),
                        line,
                    );
                }
                _ if c == '_' || c.is_alphabetic() => {
                    let end = scan_identifier(chars, start);
                    if chars.get(end).is_some_and(|&q| q == '\'' || q == '"')
                        && is_string_prefix(&chars[start..end])
                    {
                        pos = self.string(lnum, line, chars, start, end)?;
                    } else {
                        self.push(
                            TokenKind::Name,
                            collect(&chars[start..end]),
                            (lnum, start),
                            (lnum, end),
                            line,
                        );
                        pos = end;
                    }
                }
                _ => {
                    let op = match_operator(chars, start).ok_or_else(|| {
                        TokenizeError::new(
                            format!("invalid character '{c}' (U+{:04X})", c as u32),
                            lnum,
                            start,
                        )
                    })?;
                    match op {
                        "(" | "[" | "{" => self.depth += 1,
                        ")" | "]" | "}" => self.depth = self.depth.saturating_sub(1),
                        _ => {}
                    }
                    pos = start + op.len();
                    self.push(TokenKind::Op, op, (lnum, start), (lnum, pos), line);
                }
            }
        }
        Ok(())
    }

    /// Scans a string literal whose prefix starts at `start` and whose
    /// opening quote sits at `quote_at`. Returns the position after it.
    fn string(
        &mut self,
        lnum: usize,
        line: &str,
        chars: &[char],
        start: usize,
        quote_at: usize,
    ) -> Result<usize, TokenizeError> {
        let quote = chars[quote_at];
        let triple =
            chars.get(quote_at + 1) == Some(&quote) && chars.get(quote_at + 2) == Some(&quote);
        let body = quote_at + if triple { 3 } else { 1 };

        if let Some(end) = find_string_end(chars, body, quote, triple) {
            self.push(
                TokenKind::String,
                collect(&chars[start..end]),
                (lnum, start),
                (lnum, end),
                line,
            );
            return Ok(end);
        }
        if !triple && !ends_with_continuation(chars) {
            return Err(TokenizeError::new("unterminated string literal", lnum, start));
        }

        self.in_statement = true;
        self.open_string = Some(OpenString {
            start: Position::new(lnum, start),
            quote,
            triple,
            text: collect(&chars[start..]),
            lines: line.to_string(),
        });
        Ok(chars.len())
    }

    fn finish(mut self, lines: &[&str]) -> Result<Vec<Token>, TokenizeError> {
        let nlines = lines.len();
        if let Some(open) = &self.open_string {
            return Err(TokenizeError::new(
                "EOF in multi-line string",
                open.start.line,
                open.start.column,
            ));
        }
        if self.depth > 0 || self.continued {
            return Err(TokenizeError::new("EOF in multi-line statement", nlines + 1, 0));
        }

        if self.in_statement
            && let Some(last) = lines.last()
        {
            let len = last.chars().count();
            self.push(TokenKind::Newline, "", (nlines, len), (nlines, len + 1), "");
            self.in_statement = false;
        }

        let end = Position::new(nlines + 1, 0);
        for _ in 1..self.indents.len() {
            self.push(TokenKind::Dedent, "", end, end, "");
        }
        self.push(TokenKind::EndMarker, "", end, end, "");
        Ok(self.tokens)
    }
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

/// Returns the indentation column (tabs expanded to multiples of eight)
/// and the index of the first non-blank character.
fn measure_indent(chars: &[char]) -> (usize, usize) {
    let mut column = 0;
    let mut pos = 0;
    for &c in chars {
        match c {
            ' ' => column += 1,
            '\t' => column = (column / TAB_SIZE + 1) * TAB_SIZE,
            '\x0c' => column = 0,
            _ => break,
        }
        pos += 1;
    }
    (column, pos)
}

/// Index one past the last character before the line terminator.
fn content_end(chars: &[char]) -> usize {
    let mut end = chars.len();
    while end > 0 && matches!(chars[end - 1], '\r' | '\n') {
        end -= 1;
    }
    end
}

fn ends_with_continuation(chars: &[char]) -> bool {
    let end = content_end(chars);
    if end == 0 || chars[end - 1] != '\\' {
        return false;
    }
    let escapes = chars[..end - 1]
        .iter()
        .rev()
        .take_while(|&&c| c == '\\')
        .count();
    escapes % 2 == 0
}

fn find_string_end(chars: &[char], from: usize, quote: char, triple: bool) -> Option<usize> {
    let width = if triple { 3 } else { 1 };
    let mut i = from;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '\r' | '\n' if !triple => return None,
            c if c == quote
                && chars.len() - i >= width
                && chars[i..i + width].iter().all(|&q| q == quote) =>
            {
                return Some(i + width);
            }
            _ => i += 1,
        }
    }
    None
}

fn scan_identifier(chars: &[char], mut pos: usize) -> usize {
    while chars
        .get(pos)
        .is_some_and(|&c| c == '_' || c.is_alphanumeric())
    {
        pos += 1;
    }
    pos
}

fn is_string_prefix(prefix: &[char]) -> bool {
    prefix.len() <= 2
        && prefix
            .iter()
            .all(|c| matches!(c.to_ascii_lowercase(), 'r' | 'b' | 'u' | 'f'))
}

fn scan_number(chars: &[char], start: usize) -> usize {
    let hex = chars.get(start) == Some(&'0')
        && chars.get(start + 1).is_some_and(|&c| c == 'x' || c == 'X');
    let mut pos = start;
    while let Some(&c) = chars.get(pos) {
        let exponent_sign = matches!(c, '+' | '-')
            && !hex
            && matches!(chars[pos - 1], 'e' | 'E')
            && chars.get(pos + 1).is_some_and(char::is_ascii_digit);
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
            pos += 1;
        } else {
            break;
        }
    }
    pos
}

fn match_operator(chars: &[char], pos: usize) -> Option<&'static str> {
    OPERATORS.iter().find_map(|candidates| {
        candidates.iter().copied().find(|op| {
            let len = op.len();
            chars.len() - pos >= len && op.chars().eq(chars[pos..pos + len].iter().copied())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn tokenize(source: &str) -> Vec<Token> {
        BasicFrontEnd::new().tokenize(source).unwrap()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    use crate::TokenKind::*;

    #[test]
    fn test_simple_statement() {
        let tokens = tokenize("x = 1\n");
        let summary: Vec<_> = tokens
            .iter()
            .map(|t| (t.kind, t.text.as_str(), t.start, t.end))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Name, "x", Position::new(1, 0), Position::new(1, 1)),
                (Op, "=", Position::new(1, 2), Position::new(1, 3)),
                (Number, "1", Position::new(1, 4), Position::new(1, 5)),
                (Newline, "\n", Position::new(1, 5), Position::new(1, 6)),
                (EndMarker, "", Position::new(2, 0), Position::new(2, 0)),
            ]
        );
        assert_eq!(tokens[0].line, "x = 1\n");
    }

    #[test]
    fn test_empty_source() {
        let tokens = tokenize("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, EndMarker);
        assert_eq!(tokens[0].start, Position::new(1, 0));
    }

    #[test]
    fn test_indent_and_dedent() {
        assert_eq!(
            kinds("if x:\n    y\nz\n"),
            vec![Name, Name, Op, Newline, Indent, Name, Newline, Dedent, Name, Newline, EndMarker]
        );
    }

    #[test]
    fn test_dedents_at_eof() {
        let tokens = tokenize("if x:\n    if y:\n        z\n");
        let tail: Vec<_> = tokens[tokens.len() - 3..]
            .iter()
            .map(|t| (t.kind, t.start))
            .collect();
        assert_eq!(
            tail,
            vec![
                (Dedent, Position::new(4, 0)),
                (Dedent, Position::new(4, 0)),
                (EndMarker, Position::new(4, 0)),
            ]
        );
    }

    #[test]
    fn test_tab_expands_to_eight() {
        let tokens = tokenize("if x:\n\ty\n        z\n");
        assert_eq!(tokens.iter().filter(|t| t.kind == Indent).count(), 1);
        assert_eq!(tokens.iter().filter(|t| t.kind == Dedent).count(), 1);
    }

    #[test]
    fn test_comment_and_blank_lines_are_nl() {
        assert_eq!(
            kinds("# header\n\nx = 1  # trailing\n"),
            vec![Comment, Nl, Nl, Name, Op, Number, Comment, Newline, EndMarker]
        );
    }

    #[test]
    fn test_comment_line_does_not_indent() {
        assert_eq!(
            kinds("x\n    # indented comment\ny\n"),
            vec![Name, Newline, Comment, Nl, Name, Newline, EndMarker]
        );
    }

    #[test]
    fn test_newline_inside_brackets_is_nl() {
        assert_eq!(
            kinds("f(a,\n  b)\n"),
            vec![Name, Op, Name, Op, Nl, Name, Op, Newline, EndMarker]
        );
    }

    #[test]
    fn test_backslash_continuation() {
        let tokens = tokenize("x = 1 + \\\n    2\n");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![Name, Op, Number, Op, Number, Newline, EndMarker]
        );
        assert!(tokens[3].is_eol());
    }

    #[test]
    fn test_missing_trailing_newline() {
        let tokens = tokenize("x = 1");
        let newline = &tokens[3];
        assert_eq!(newline.kind, Newline);
        assert_eq!(newline.text, "");
        assert_eq!(newline.line, "");
        assert_eq!(newline.start, Position::new(1, 5));
        assert_eq!(tokens[4].start, Position::new(2, 0));
    }

    #[test]
    fn test_multiline_string() {
        let tokens = tokenize("s = \"\"\"a\nb\"\"\" + 1\n");
        let string = &tokens[2];
        assert_eq!(string.kind, String);
        assert_eq!(string.text, "\"\"\"a\nb\"\"\"");
        assert_eq!(string.start, Position::new(1, 4));
        assert_eq!(string.end, Position::new(2, 4));
        assert_eq!(string.line, "s = \"\"\"a\nb\"\"\" + 1\n");
        assert_eq!(tokens[3].text, "+");
        assert_eq!(tokens[3].line, "b\"\"\" + 1\n");
    }

    #[rstest]
    #[case::prefixed("rb'x'", "rb'x'")]
    #[case::escaped_quote(r#""a\"b""#, r#""a\"b""#)]
    #[case::empty("''", "''")]
    #[case::triple_single_line("'''a'''", "'''a'''")]
    fn test_string_literals(#[case] source: &str, #[case] text: &str) {
        let tokens = tokenize(&format!("{source}\n"));
        assert_eq!(tokens[0].kind, String);
        assert_eq!(tokens[0].text, text);
    }

    #[rstest]
    #[case::integer("42", "42")]
    #[case::float("3.25", "3.25")]
    #[case::exponent("1e-5", "1e-5")]
    #[case::hex("0xff", "0xff")]
    #[case::leading_dot(".5", ".5")]
    fn test_numbers(#[case] source: &str, #[case] text: &str) {
        let tokens = tokenize(&format!("{source}\n"));
        assert_eq!(tokens[0].kind, Number);
        assert_eq!(tokens[0].text, text);
    }

    #[test]
    fn test_longest_operator_wins() {
        let ops: Vec<_> = tokenize("a **= b // c != d\n")
            .into_iter()
            .filter(|t| t.kind == Op)
            .map(|t| t.text)
            .collect();
        assert_eq!(ops, vec!["**=", "//", "!="]);
    }

    #[rstest]
    #[case::unterminated("x = 'abc\n", "unterminated string literal", 1, 4)]
    #[case::eof_in_string("x = \"\"\"abc\n", "EOF in multi-line string", 1, 4)]
    #[case::eof_in_statement("x = (1,\n", "EOF in multi-line statement", 2, 0)]
    #[case::bad_dedent("if x:\n    y\n  z\n", "unindent does not match any outer indentation level", 3, 2)]
    #[case::invalid_character("x = $\n", "invalid character '$' (U+0024)", 1, 4)]
    fn test_tokenize_errors(
        #[case] source: &str,
        #[case] message: &str,
        #[case] line: usize,
        #[case] column: usize,
    ) {
        let err = BasicFrontEnd::new().tokenize(source).unwrap_err();
        assert_eq!(err.message, message);
        assert_eq!((err.line, err.column), (line, column));
    }
}
