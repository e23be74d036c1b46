//! Text output formatter

use lintel_core::Violation;

use super::OutputFormat;

/// Formats one finding on a single line.
pub fn format_violation(format: OutputFormat, violation: &Violation) -> String {
    match format {
        OutputFormat::Pylint => format!(
            "{}:{}: [{}] {}",
            violation.filename, violation.line, violation.code, violation.text
        ),
        _ => format!(
            "{}:{}:{}: {} {}",
            violation.filename, violation.line, violation.column, violation.code, violation.text
        ),
    }
}

/// The source line followed by a caret under the reported column.
///
/// Tabs before the column are kept so the caret lines up.
pub fn show_source(violation: &Violation) -> Option<String> {
    let source = violation.physical_line.as_deref()?;
    let source = source.trim_end_matches(['\n', '\r']);
    if source.is_empty() {
        return None;
    }

    let indent: String = source
        .chars()
        .take(violation.column.saturating_sub(1))
        .map(|c| if c.is_whitespace() { c } else { ' ' })
        .collect();
    Some(format!("{}\n{}^", source, indent))
}
