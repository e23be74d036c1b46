//! The diagnostic record.

use serde::{Deserialize, Serialize};

/// A reported finding. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Violation {
    /// The diagnostic code, e.g. `E501`.
    pub code: String,

    /// The file the finding belongs to, as displayed.
    pub filename: String,

    /// Line number (1-indexed).
    pub line: usize,

    /// Column number (1-indexed).
    pub column: usize,

    /// The message, without the code.
    pub text: String,

    /// The source text used for inline suppression: every physical line
    /// of the statement the finding is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_line: Option<String>,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(
        code: impl Into<String>,
        filename: impl Into<String>,
        line: usize,
        column: usize,
        text: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            filename: filename.into(),
            line,
            column,
            text: text.into(),
            physical_line: None,
        }
    }

    /// Sets the physical line text.
    pub fn with_physical_line(mut self, physical_line: Option<String>) -> Self {
        self.physical_line = physical_line;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_new() {
        let violation = Violation::new("E501", "a.py", 3, 80, "line too long")
            .with_physical_line(Some("x = 1\n".to_string()));

        assert_eq!(violation.code, "E501");
        assert_eq!(violation.line, 3);
        assert_eq!(violation.column, 80);
        assert_eq!(violation.physical_line.as_deref(), Some("x = 1\n"));
    }
}
