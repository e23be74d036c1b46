//! Front end trait definition.

use crate::{ParseError, SyntaxTree, Token, TokenizeError};

/// A language front end: turns source text into tokens and a syntax tree.
///
/// The checker never interprets the target language itself; it relies on
/// an implementation of this trait supplied by the host.
///
/// # Example
///
/// ```rust,ignore
/// use lintel_tokens::{FrontEnd, ParseError, SyntaxTree, Token, TokenizeError};
///
/// struct MyFrontEnd;
///
/// impl FrontEnd for MyFrontEnd {
///     fn name(&self) -> &str {
///         "my-language"
///     }
///
///     fn tokenize(&self, source: &str) -> Result<Vec<Token>, TokenizeError> {
///         todo!()
///     }
///
///     fn parse(&self, tokens: &[Token]) -> Result<SyntaxTree, ParseError> {
///         todo!()
///     }
/// }
/// ```
pub trait FrontEnd: Send + Sync {
    /// Returns the name of this front end.
    fn name(&self) -> &str;

    /// Splits the source into tokens.
    fn tokenize(&self, source: &str) -> Result<Vec<Token>, TokenizeError>;

    /// Builds a syntax tree from a complete token stream.
    fn parse(&self, tokens: &[Token]) -> Result<SyntaxTree, ParseError>;
}
