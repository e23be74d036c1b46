//! Checks run once per file against the syntax tree.

use lintel_plugin::{CheckArgs, CheckOutput, PluginError};

/// Deepest block nesting a top-level statement may contain.
pub const MAX_NESTING: usize = 4;

/// C901 a top-level statement nests blocks too deeply.
pub fn nesting_depth(args: &CheckArgs<'_>) -> Result<Vec<CheckOutput>, PluginError> {
    let Some(tree) = args.tree() else {
        return Ok(Vec::new());
    };

    Ok(tree
        .body
        .iter()
        .filter_map(|statement| {
            let depth = statement.block_depth();
            (depth > MAX_NESTING).then(|| {
                CheckOutput::at(
                    statement.start.line,
                    statement.start.column,
                    format!(
                        "C901 '{}' is too deeply nested ({} > {})",
                        statement.text, depth, MAX_NESTING
                    ),
                )
            })
        })
        .collect())
}
