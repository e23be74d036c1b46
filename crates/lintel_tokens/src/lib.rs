//! # lintel_tokens
//!
//! Token and syntax tree model shared by the Lintel checker and its plugins.
//!
//! This crate provides:
//! - The `Token`/`TokenKind` model consumed by the file checker
//! - A `FrontEnd` trait for plugging in a language's own tokenizer and parser
//! - The `SyntaxTree` handed to tree plugins
//! - `BasicFrontEnd`, a reference front end for a small indentation-based
//!   language (`#` comments, brackets, triple-quoted strings)
//!
//! ## Example
//!
//! ```rust,ignore
//! use lintel_tokens::{BasicFrontEnd, FrontEnd};
//!
//! let front_end = BasicFrontEnd::new();
//! let tokens = front_end.tokenize("x = (1,\n     2)\n")?;
//! let tree = front_end.parse(&tokens)?;
//! assert_eq!(tree.body.len(), 1);
//! ```

mod basic;
mod error;
mod span;
mod token;
mod traits;
mod tree;
mod tree_builder;

pub use basic::BasicFrontEnd;
pub use error::{ParseError, TokenizeError};
pub use span::Position;
pub use token::{Token, TokenKind};
pub use traits::FrontEnd;
pub use tree::{Node, NodeKind, SyntaxTree};
pub use tree_builder::build_tree;
