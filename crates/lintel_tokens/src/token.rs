//! Token model.

use serde::{Deserialize, Serialize};

use crate::Position;

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Name,
    Number,
    String,
    Op,
    Comment,
    /// End of a logical line (statement end).
    Newline,
    /// End of a physical line that does not end a statement.
    Nl,
    Indent,
    Dedent,
    EndMarker,
}

impl TokenKind {
    /// Returns true for tokens that never contribute text to a logical line.
    pub fn is_skipped(self) -> bool {
        matches!(
            self,
            TokenKind::Nl | TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent
        )
    }

    /// Returns true for both kinds of line-end tokens.
    pub fn is_newline(self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Nl)
    }
}

/// A lexical token as produced by a front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// The token text.
    pub text: String,
    pub start: Position,
    pub end: Position,
    /// The physical line(s) the token was read from, terminators included.
    pub line: String,
}

impl Token {
    /// Creates a new token.
    pub fn new(
        kind: TokenKind,
        text: impl Into<String>,
        start: impl Into<Position>,
        end: impl Into<Position>,
        line: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            start: start.into(),
            end: end.into(),
            line: line.into(),
        }
    }

    /// Returns true if this is a string literal spanning more than one line.
    pub fn is_multiline_string(&self) -> bool {
        self.kind == TokenKind::String && self.text.contains('\n')
    }

    /// Returns true if this token ends a physical line.
    ///
    /// Besides `Newline`/`Nl`, the last token before a backslash
    /// continuation also ends its physical line.
    pub fn is_eol(&self) -> bool {
        if self.kind.is_newline() {
            return true;
        }
        let rest: String = self.line.chars().skip(self.end.column).collect();
        let rest = rest.trim_start();
        rest == "\\\n" || rest == "\\\r\n"
    }

    /// Returns true if this is an opening bracket.
    pub fn is_open_bracket(&self) -> bool {
        self.kind == TokenKind::Op && matches!(self.text.as_str(), "(" | "[" | "{")
    }

    /// Returns true if this is a closing bracket.
    pub fn is_close_bracket(&self) -> bool {
        self.kind == TokenKind::Op && matches!(self.text.as_str(), ")" | "]" | "}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiline_string_detection() {
        let single = Token::new(TokenKind::String, "'x'", (1, 0), (1, 3), "'x'\n");
        let multi = Token::new(
            TokenKind::String,
            "\"\"\"a\nb\"\"\"",
            (1, 0),
            (2, 4),
            "\"\"\"a\nb\"\"\"\n",
        );
        assert!(!single.is_multiline_string());
        assert!(multi.is_multiline_string());
    }

    #[test]
    fn test_backslash_continuation_is_eol() {
        let token = Token::new(TokenKind::Name, "x", (1, 4), (1, 5), "y = x \\\n");
        assert!(token.is_eol());

        let token = Token::new(TokenKind::Name, "y", (1, 0), (1, 1), "y = x \\\n");
        assert!(!token.is_eol());
    }

    #[test]
    fn test_brackets() {
        let open = Token::new(TokenKind::Op, "[", (1, 0), (1, 1), "[]\n");
        let close = Token::new(TokenKind::Op, "]", (1, 1), (1, 2), "[]\n");
        assert!(open.is_open_bracket());
        assert!(close.is_close_bracket());
        assert!(!close.is_open_bracket());
    }
}
