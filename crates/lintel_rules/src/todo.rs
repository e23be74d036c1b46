//! Task markers left in comments.
//!
//! Off by default: enable it with `--enable-extensions T1`.

use std::sync::OnceLock;

use lintel_plugin::{CheckArgs, CheckOutput, PluginError};
use lintel_tokens::TokenKind;
use regex::Regex;

static MARKER: OnceLock<Regex> = OnceLock::new();

fn marker() -> &'static Regex {
    MARKER.get_or_init(|| {
        Regex::new(r"\b(?:TODO|FIXME|XXX)\b").expect("task marker pattern is valid")
    })
}

/// T100 task marker found in a comment.
pub fn task_markers(args: &CheckArgs<'_>) -> Result<Vec<CheckOutput>, PluginError> {
    let Some(tokens) = args.tokens() else {
        return Ok(Vec::new());
    };

    let mut outputs = Vec::new();
    for token in tokens.iter().filter(|token| token.kind == TokenKind::Comment) {
        for found in marker().find_iter(&token.text) {
            let column = token.start.column + token.text[..found.start()].chars().count();
            outputs.push(CheckOutput::at(
                token.start.line,
                column,
                format!(
                    "T100 found '{}' marker; resolve it before committing",
                    found.as_str()
                ),
            ));
        }
    }
    Ok(outputs)
}
