//! Checks run once per physical line.

use lintel_plugin::{CheckArgs, CheckOutput, PluginError};

/// Characters that count as whitespace at the end of a line.
const TRAILING: &[char] = &[' ', '\t', '\x0b'];

/// Chunks that fit in this many characters are never reported as too long
/// when they are the lone content of a string or comment line.
const URL_ALLOWANCE: usize = 7;

/// W291 trailing whitespace, W293 whitespace on a blank line.
pub fn trailing_whitespace(args: &CheckArgs<'_>) -> Result<Vec<CheckOutput>, PluginError> {
    let Some(line) = args.physical_line() else {
        return Ok(Vec::new());
    };

    let line = line
        .trim_end_matches('\n')
        .trim_end_matches('\r')
        .trim_end_matches('\x0c');
    let stripped = line.trim_end_matches(TRAILING);
    if line == stripped {
        return Ok(Vec::new());
    }

    let output = if stripped.is_empty() {
        CheckOutput::at_offset(0, "W293 whitespace on blank line")
    } else {
        CheckOutput::at_offset(stripped.chars().count(), "W291 trailing whitespace")
    };
    Ok(vec![output])
}

/// E501 line too long.
///
/// A line holding a single long chunk inside a multi-line string, or a
/// comment made of one long chunk, is let through so URLs can stay whole.
pub fn line_too_long(args: &CheckArgs<'_>) -> Result<Vec<CheckOutput>, PluginError> {
    let (Some(line), Some(max_line_length)) = (args.physical_line(), args.max_line_length()) else {
        return Ok(Vec::new());
    };

    let line = line.trim_end();
    let length = line.chars().count();
    if length <= max_line_length {
        return Ok(Vec::new());
    }

    let chunks: Vec<&str> = line.split_whitespace().collect();
    let multiline = args.multiline().unwrap_or(false);
    let lone_chunk = (chunks.len() == 1 && multiline) || (chunks.len() == 2 && chunks[0] == "#");
    if lone_chunk
        && let Some(last) = chunks.last()
        && length - last.chars().count() < max_line_length.saturating_sub(URL_ALLOWANCE)
    {
        return Ok(Vec::new());
    }

    Ok(vec![CheckOutput::at_offset(
        max_line_length,
        format!(
            "E501 line too long ({} > {} characters)",
            length, max_line_length
        ),
    )])
}
