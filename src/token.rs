//! The token definition for the search query language.

/// A token is a single unit of the language, with a specific kind and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

/// The kind of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    // Literals
    Word(&'a str),
    String(&'a str), // The content between the quotes

    // Punctuation
    Colon, // :
    Comma, // ,

    // Operators
    NotEq, // !=
    Gt,    // >
    Lt,    // <
    Gte,   // >=
    Lte,   // <=

    // Special
    Unterminated, // A string literal missing its closing quote
    Illegal,      // An illegal/unknown character
}

impl TokenKind<'_> {
    /// Whether this token can start or continue a value list.
    pub fn is_value(&self) -> bool {
        matches!(self, TokenKind::Word(_) | TokenKind::String(_))
    }
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}
