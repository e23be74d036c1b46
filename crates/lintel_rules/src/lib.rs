//! # lintel_rules
//!
//! Built-in checks for Lintel.
//!
//! This crate provides:
//! - Physical-line checks: trailing whitespace (`W2`), line length (`E5`)
//! - Logical-line checks: whitespace and comment spacing (`E2`), blank
//!   lines (`E3`), compound statements (`E7`)
//! - A tree check for deeply nested blocks (`C9`)
//! - An off-by-default check for task markers in comments (`T1`)
//!
//! ## Example
//!
//! ```rust,ignore
//! let plugins = lintel_rules::plugins()?;
//! assert!(plugins.get("E5").is_some());
//! ```

mod logical;
mod physical;
mod todo;
mod tree;

use lintel_plugin::{Check, Plugin, PluginError, PluginSet};

pub use tree::MAX_NESTING;

const PACKAGE: &str = "lintel-rules";
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn builtin(
    id: &str,
    check: impl Check + 'static,
    parameters: &[&str],
) -> Result<Plugin, PluginError> {
    Plugin::builder(id, check)
        .package(PACKAGE)
        .version(VERSION)
        .parameters(parameters.iter().copied())
        .build()
}

/// Returns every built-in plugin.
pub fn builtins() -> Result<Vec<Plugin>, PluginError> {
    Ok(vec![
        builtin("C9", tree::nesting_depth, &["tree"])?,
        builtin("E2", logical::whitespace, &["logical_line", "tokens"])?,
        builtin(
            "E3",
            logical::blank_lines,
            &[
                "logical_line",
                "blank_lines",
                "blank_before",
                "indent_level",
                "previous_logical",
            ],
        )?,
        builtin(
            "E5",
            physical::line_too_long,
            &["physical_line", "max_line_length", "multiline"],
        )?,
        builtin("E7", logical::compound_statements, &["logical_line"])?,
        Plugin::builder("T1", todo::task_markers)
            .package(PACKAGE)
            .version(VERSION)
            .parameters(["logical_line", "tokens"])
            .off_by_default(true)
            .build()?,
        builtin("W2", physical::trailing_whitespace, &["physical_line"])?,
    ])
}

/// Returns the built-in plugins as a plugin set.
pub fn plugins() -> Result<PluginSet, PluginError> {
    PluginSet::new(builtins()?)
}
