//! Checks run once per logical line.

use lintel_plugin::{CheckArgs, CheckOutput, PluginError};
use lintel_tokens::{Position, TokenKind};

/// Blank lines allowed between top-level statements.
const TOP_LEVEL_LINES: usize = 2;
/// Blank lines allowed between nested statements.
const NESTED_LINES: usize = 1;

/// E231 missing whitespace after separators, and the comment spacing
/// rules E261/E262/E265/E266.
pub fn whitespace(args: &CheckArgs<'_>) -> Result<Vec<CheckOutput>, PluginError> {
    let mut outputs = Vec::new();
    if let Some(line) = args.logical_line() {
        outputs.extend(missing_whitespace(line));
    }
    outputs.extend(comment_spacing(args));
    Ok(outputs)
}

fn missing_whitespace(line: &str) -> Vec<CheckOutput> {
    let chars: Vec<char> = line.chars().collect();
    let mut outputs = Vec::new();
    for (index, pair) in chars.windows(2).enumerate() {
        let (current, next) = (pair[0], pair[1]);
        if !matches!(current, ',' | ';' | ':') || next.is_whitespace() {
            continue;
        }

        let before = &chars[..index];
        let count = |c: char| before.iter().filter(|&&b| b == c).count();
        let last = |c: char| before.iter().rposition(|&b| b == c);
        if current == ':' && count('[') > count(']') && last('{') < last('[') {
            continue;
        }
        if current == ',' && matches!(next, ')' | ']') {
            continue;
        }
        if current == ':' && next == '=' {
            continue;
        }
        outputs.push(CheckOutput::at_offset(
            index,
            format!("E231 missing whitespace after '{}'", current),
        ));
    }
    outputs
}

fn comment_spacing(args: &CheckArgs<'_>) -> Vec<CheckOutput> {
    let Some(tokens) = args.tokens() else {
        return Vec::new();
    };

    let mut outputs = Vec::new();
    let mut prev_end = Position::new(0, 0);
    for token in tokens {
        if token.kind != TokenKind::Comment {
            if token.kind != TokenKind::Nl {
                prev_end = token.end;
            }
            continue;
        }

        let start = token.start;
        let before: String = token.line.chars().take(start.column).collect();
        let inline = !before.trim().is_empty();
        if inline && prev_end.line == start.line && start.column < prev_end.column + 2 {
            outputs.push(CheckOutput::at(
                prev_end.line,
                prev_end.column,
                "E261 at least two spaces before inline comment",
            ));
        }

        let text = token.text.as_str();
        let (symbol, comment) = text.split_once(' ').unwrap_or((text, ""));
        let bad_prefix = if symbol == "#" || symbol == "#:" {
            None
        } else {
            Some(symbol.trim_start_matches('#').chars().next().unwrap_or('#'))
        };
        if inline {
            if bad_prefix.is_some() || comment.starts_with(char::is_whitespace) {
                outputs.push(CheckOutput::at(
                    start.line,
                    start.column,
                    "E262 inline comment should start with '# '",
                ));
            }
        } else if let Some(prefix) = bad_prefix
            && (prefix != '!' || start.line > 1)
        {
            if prefix != '#' {
                outputs.push(CheckOutput::at(
                    start.line,
                    start.column,
                    "E265 block comment should start with '# '",
                ));
            } else if !comment.is_empty() {
                outputs.push(CheckOutput::at(
                    start.line,
                    start.column,
                    "E266 too many leading '#' for block comment",
                ));
            }
        }
    }
    outputs
}

/// E303 too many blank lines, E304 blank lines after a decorator.
pub fn blank_lines(args: &CheckArgs<'_>) -> Result<Vec<CheckOutput>, PluginError> {
    let (Some(previous_logical), Some(blank_lines), Some(blank_before)) = (
        args.previous_logical(),
        args.blank_lines(),
        args.blank_before(),
    ) else {
        return Ok(Vec::new());
    };
    let indent_level = args.indent_level().unwrap_or(0);

    if previous_logical.is_empty() && blank_before < TOP_LEVEL_LINES {
        return Ok(Vec::new());
    }
    if previous_logical.starts_with('@') {
        if blank_lines > 0 {
            return Ok(vec![CheckOutput::at_offset(
                0,
                format!(
                    "E304 blank lines found after function decorator ({})",
                    blank_lines
                ),
            )]);
        }
    } else if blank_lines > TOP_LEVEL_LINES || (indent_level > 0 && blank_lines == NESTED_LINES + 1)
    {
        return Ok(vec![CheckOutput::at_offset(
            0,
            format!("E303 too many blank lines ({})", blank_lines),
        )]);
    }
    Ok(Vec::new())
}

/// E702 multiple statements on one line, E703 statement ends with a
/// semicolon.
pub fn compound_statements(args: &CheckArgs<'_>) -> Result<Vec<CheckOutput>, PluginError> {
    let Some(line) = args.logical_line() else {
        return Ok(Vec::new());
    };

    let last = line.chars().count().saturating_sub(1);
    Ok(line
        .chars()
        .enumerate()
        .filter(|&(_, c)| c == ';')
        .map(|(index, _)| {
            if index < last {
                CheckOutput::at_offset(index, "E702 multiple statements on one line (semicolon)")
            } else {
                CheckOutput::at_offset(index, "E703 statement ends with a semicolon")
            }
        })
        .collect())
}
