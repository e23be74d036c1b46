//! Syntax tree handed to tree plugins.

use serde::{Deserialize, Serialize};

use crate::{Position, Token, TokenKind};

/// Kind of a syntax tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// One logical line. Its last child is a `Block` when the statement
    /// opens an indented suite.
    Statement,
    /// An indented suite of statements.
    Block,
    /// A bracketed group, keyed by its opening bracket.
    Group(char),
    /// A single token.
    Leaf(TokenKind),
}

/// A node in the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    /// Leaf: the token text. Group: the bracket pair. Statement: its first
    /// physical line, trimmed. Block: empty.
    pub text: String,
    pub start: Position,
    pub end: Position,
    pub children: Vec<Node>,
}

impl Node {
    /// Creates a leaf node for a token.
    pub fn leaf(token: &Token) -> Self {
        Self {
            kind: NodeKind::Leaf(token.kind),
            text: token.text.clone(),
            start: token.start,
            end: token.end,
            children: Vec::new(),
        }
    }

    /// Iterates over this node and all of its descendants in pre-order.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Returns the deepest nesting of blocks inside this node.
    ///
    /// A statement with no suite has depth 0, a statement owning one
    /// suite has depth 1, and so on.
    pub fn block_depth(&self) -> usize {
        let inner = self
            .children
            .iter()
            .map(Node::block_depth)
            .max()
            .unwrap_or(0);
        if self.kind == NodeKind::Block {
            inner + 1
        } else {
            inner
        }
    }

    /// Returns the block owned by this statement, if any.
    pub fn block(&self) -> Option<&Node> {
        self.children
            .last()
            .filter(|child| child.kind == NodeKind::Block)
    }
}

/// A parsed module: the top-level statements of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxTree {
    pub body: Vec<Node>,
}

impl SyntaxTree {
    /// Iterates over every node of the tree in pre-order.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.body.iter().rev().collect(),
        }
    }

    /// Iterates over every statement, nested ones included.
    pub fn statements(&self) -> impl Iterator<Item = &Node> {
        self.walk()
            .filter(|node| node.kind == NodeKind::Statement)
    }

    /// Returns the deepest block nesting found in the tree.
    pub fn max_block_depth(&self) -> usize {
        self.body.iter().map(Node::block_depth).max().unwrap_or(0)
    }
}

/// Pre-order iterator over syntax tree nodes.
pub struct Walk<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leaf(text: &str, line: usize, column: usize) -> Node {
        Node::leaf(&Token::new(
            TokenKind::Name,
            text,
            (line, column),
            (line, column + text.len()),
            "",
        ))
    }

    fn statement(children: Vec<Node>) -> Node {
        Node {
            kind: NodeKind::Statement,
            text: String::new(),
            start: children[0].start,
            end: children[children.len() - 1].end,
            children,
        }
    }

    fn block(children: Vec<Node>) -> Node {
        Node {
            kind: NodeKind::Block,
            text: String::new(),
            start: children[0].start,
            end: children[children.len() - 1].end,
            children,
        }
    }

    #[test]
    fn test_walk_is_pre_order() {
        let tree = SyntaxTree {
            body: vec![
                statement(vec![leaf("a", 1, 0), block(vec![statement(vec![leaf("b", 2, 4)])])]),
                statement(vec![leaf("c", 3, 0)]),
            ],
        };

        let texts: Vec<_> = tree
            .walk()
            .filter(|node| matches!(node.kind, NodeKind::Leaf(_)))
            .map(|node| node.text.as_str())
            .collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert_eq!(tree.statements().count(), 3);
    }

    #[test]
    fn test_block_depth() {
        let inner = statement(vec![leaf("c", 3, 8)]);
        let middle = statement(vec![leaf("b", 2, 4), block(vec![inner])]);
        let outer = statement(vec![leaf("a", 1, 0), block(vec![middle])]);
        assert_eq!(outer.block_depth(), 2);
        assert!(outer.block().is_some());

        let tree = SyntaxTree {
            body: vec![outer, statement(vec![leaf("d", 4, 0)])],
        };
        assert_eq!(tree.max_block_depth(), 2);
        assert_eq!(SyntaxTree::default().max_block_depth(), 0);
    }
}
