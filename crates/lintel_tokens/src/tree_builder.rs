//! Builds a `SyntaxTree` from a token stream.
//!
//! The builder only understands the layout of the token stream: logical
//! lines, bracket groups, and indented suites introduced by a trailing `:`.

use crate::{Node, NodeKind, ParseError, SyntaxTree, Token, TokenKind};

/// Builds a syntax tree from a complete token stream.
///
/// # Errors
///
/// Returns a [`ParseError`] (1-indexed line and column) for unmatched or
/// mismatched brackets, brackets that are never closed, unexpected
/// indentation, and suites that are missing their indented block.
pub fn build_tree(tokens: &[Token]) -> Result<SyntaxTree, ParseError> {
    let mut builder = TreeBuilder { tokens, pos: 0 };
    let body = builder.block(false)?;
    Ok(SyntaxTree { body })
}

struct TreeBuilder<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TreeBuilder<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn block(&mut self, nested: bool) -> Result<Vec<Node>, ParseError> {
        let mut statements = Vec::new();
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::EndMarker => break,
                TokenKind::Dedent if nested => {
                    self.pos += 1;
                    break;
                }
                TokenKind::Dedent => {
                    return Err(error_at(
                        token,
                        "unindent does not match any outer indentation level",
                    ));
                }
                TokenKind::Nl | TokenKind::Newline | TokenKind::Comment => self.pos += 1,
                TokenKind::Indent => return Err(unexpected_indent(token)),
                _ => statements.push(self.statement(token)?),
            }
        }
        Ok(statements)
    }

    fn statement(&mut self, first: &'a Token) -> Result<Node, ParseError> {
        let mut groups: Vec<(&'a Token, Vec<Node>)> = Vec::new();
        let mut children = Vec::new();
        let mut end = first.end;
        let mut last = first;

        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Newline | TokenKind::EndMarker | TokenKind::Dedent => {
                    if let Some((open, _)) = groups.last() {
                        return Err(error_at(open, format!("'{}' was never closed", open.text)));
                    }
                    if token.kind == TokenKind::Newline {
                        self.pos += 1;
                    }
                    break;
                }
                TokenKind::Nl | TokenKind::Comment => self.pos += 1,
                TokenKind::Indent => return Err(unexpected_indent(token)),
                _ if token.is_open_bracket() => {
                    self.pos += 1;
                    groups.push((token, Vec::new()));
                }
                _ if token.is_close_bracket() => {
                    self.pos += 1;
                    let Some((open, members)) = groups.pop() else {
                        return Err(error_at(token, format!("unmatched '{}'", token.text)));
                    };
                    if closing_bracket(&open.text) != token.text {
                        return Err(error_at(
                            token,
                            format!(
                                "closing parenthesis '{}' does not match opening parenthesis '{}'",
                                token.text, open.text
                            ),
                        ));
                    }
                    end = token.end;
                    last = token;
                    let group = Node {
                        kind: NodeKind::Group(open.text.chars().next().unwrap_or('(')),
                        text: format!("{}{}", open.text, token.text),
                        start: open.start,
                        end: token.end,
                        children: members,
                    };
                    push_child(&mut groups, &mut children, group);
                }
                _ => {
                    self.pos += 1;
                    end = token.end;
                    last = token;
                    push_child(&mut groups, &mut children, Node::leaf(token));
                }
            }
        }

        let opens_block = children
            .last()
            .is_some_and(|node| node.kind == NodeKind::Leaf(TokenKind::Op) && node.text == ":");
        if opens_block {
            self.skip_trivia();
            match self.peek() {
                Some(token) if token.kind == TokenKind::Indent => {
                    self.pos += 1;
                    let body = self.block(true)?;
                    let start = body.first().map_or(token.end, |node| node.start);
                    end = body.last().map_or(token.end, |node| node.end);
                    children.push(Node {
                        kind: NodeKind::Block,
                        text: String::new(),
                        start,
                        end,
                        children: body,
                    });
                }
                Some(token) if !at_end_of_file(token) => {
                    return Err(error_at(token, "expected an indented block"));
                }
                _ => return Err(error_past_end(last, "expected an indented block")),
            }
        }

        Ok(Node {
            kind: NodeKind::Statement,
            text: first.line.lines().next().unwrap_or("").trim().to_string(),
            start: first.start,
            end,
            children,
        })
    }

    fn skip_trivia(&mut self) {
        while self
            .peek()
            .is_some_and(|token| matches!(token.kind, TokenKind::Nl | TokenKind::Comment))
        {
            self.pos += 1;
        }
    }
}

fn push_child(groups: &mut [(&Token, Vec<Node>)], children: &mut Vec<Node>, node: Node) {
    match groups.last_mut() {
        Some((_, members)) => members.push(node),
        None => children.push(node),
    }
}

fn closing_bracket(open: &str) -> &'static str {
    match open {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}

fn error_at(token: &Token, message: impl Into<String>) -> ParseError {
    ParseError::new(message, token.start.line, token.start.column + 1).with_text(token.line.clone())
}

/// Points just past the end of `token`'s physical line.
fn error_past_end(token: &Token, message: impl Into<String>) -> ParseError {
    ParseError::new(message, token.end.line, token.line.chars().count() + 1)
        .with_text(token.line.clone())
}

fn at_end_of_file(token: &Token) -> bool {
    token.kind == TokenKind::EndMarker || (token.kind == TokenKind::Dedent && token.line.is_empty())
}

fn unexpected_indent(token: &Token) -> ParseError {
    ParseError::new("unexpected indent", token.start.line, token.end.column + 1)
        .with_text(token.line.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BasicFrontEnd, FrontEnd};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(source: &str) -> Result<SyntaxTree, ParseError> {
        let tokens = BasicFrontEnd::new().tokenize(source).expect("tokenize");
        build_tree(&tokens)
    }

    #[test]
    fn test_statements_and_blocks() {
        let tree = parse("if x:\n    y = 1\n    # note\n    z = 2\nw = 3\n").unwrap();

        assert_eq!(tree.body.len(), 2);
        let suite = tree.body[0].block().expect("suite");
        assert_eq!(suite.children.len(), 2);
        assert_eq!(tree.body[0].text, "if x:");
        assert_eq!(tree.body[1].text, "w = 3");
        assert_eq!(tree.max_block_depth(), 1);
    }

    #[test]
    fn test_groups_span_lines() {
        let tree = parse("x = (1,\n     [2, 3])\n").unwrap();

        assert_eq!(tree.body.len(), 1);
        let group = &tree.body[0].children[2];
        assert_eq!(group.kind, NodeKind::Group('('));
        assert_eq!(group.text, "()");
        assert_eq!(group.end.line, 2);
        assert!(
            group
                .children
                .iter()
                .any(|child| child.kind == NodeKind::Group('['))
        );
    }

    #[test]
    fn test_nested_depth() {
        let tree = parse("def f():\n    for a in b:\n        if a:\n            pass\n").unwrap();
        assert_eq!(tree.max_block_depth(), 3);
    }

    #[rstest]
    #[case::unmatched("x = 1)\n", "unmatched ')'", 1, 6)]
    #[case::mismatched("x = (1]\n", "closing parenthesis ']' does not match opening parenthesis '('", 1, 7)]
    #[case::unexpected_indent("x = 1\n    y = 2\n", "unexpected indent", 2, 5)]
    #[case::missing_block("if x:\ny = 1\n", "expected an indented block", 2, 1)]
    #[case::missing_block_at_eof("if x:\n", "expected an indented block", 1, 7)]
    #[case::nested_missing_block_at_eof("if a:\n    if b:\n", "expected an indented block", 2, 11)]
    fn test_parse_errors(
        #[case] source: &str,
        #[case] message: &str,
        #[case] line: usize,
        #[case] column: usize,
    ) {
        let err = parse(source).unwrap_err();
        assert_eq!(err.message, message);
        assert_eq!((err.line, err.column), (line, column));
    }

    #[test]
    fn test_missing_block_at_eof_keeps_last_line() {
        let err = parse("x = 1\nif x:  # trailing\n").unwrap_err();
        assert_eq!((err.line, err.column), (2, 19));
        assert_eq!(err.text.as_deref(), Some("if x:  # trailing\n"));
    }

    #[test]
    fn test_never_closed_reported_at_opening_bracket() {
        let tokens = vec![
            Token::new(TokenKind::Name, "f", (1, 0), (1, 1), "f(\n"),
            Token::new(TokenKind::Op, "(", (1, 1), (1, 2), "f(\n"),
            Token::new(TokenKind::Newline, "\n", (1, 2), (1, 3), "f(\n"),
            Token::new(TokenKind::EndMarker, "", (2, 0), (2, 0), ""),
        ];
        let err = build_tree(&tokens).unwrap_err();
        assert_eq!(err.message, "'(' was never closed");
        assert_eq!((err.line, err.column), (1, 2));
        assert_eq!(err.text.as_deref(), Some("f(\n"));
    }
}
