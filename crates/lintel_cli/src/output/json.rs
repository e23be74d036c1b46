//! JSON output formatter

use std::collections::BTreeMap;
use std::io::{self, Write};

use lintel_core::Violation;
use serde::Serialize;

#[derive(Serialize)]
struct JsonViolation<'a> {
    code: &'a str,
    filename: &'a str,
    line_number: usize,
    column_number: usize,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    physical_line: Option<&'a str>,
}

impl<'a> From<&'a Violation> for JsonViolation<'a> {
    fn from(violation: &'a Violation) -> Self {
        Self {
            code: &violation.code,
            filename: &violation.filename,
            line_number: violation.line,
            column_number: violation.column,
            text: &violation.text,
            physical_line: violation.physical_line.as_deref(),
        }
    }
}

pub fn write_json<W: Write>(
    writer: &mut W,
    files: &BTreeMap<String, Vec<Violation>>,
) -> io::Result<()> {
    let output: BTreeMap<&str, Vec<JsonViolation<'_>>> = files
        .iter()
        .map(|(filename, violations)| {
            (
                filename.as_str(),
                violations.iter().map(JsonViolation::from).collect(),
            )
        })
        .collect();
    serde_json::to_writer_pretty(&mut *writer, &output)?;
    writeln!(writer)
}
