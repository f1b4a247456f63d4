//! Token types for the filter lexer

use std::fmt;

/// Token kinds in the filter language.
///
/// Operator words (`EQ`, `GE`, ...), connectives (`AND`, `OR`) and aggregator
/// keywords (`ANY`, `ALL`, `HAS`) are lexed as plain identifiers. The parser
/// decides their role from position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Identifiers and literals
    Identifier,
    QuotedString,

    // Symbolic operator aliases (==, !=, <, <=, >, >=)
    Symbol,

    // Punctuation
    LParen,
    RParen,
    Comma,

    // Special
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::QuotedString => write!(f, "quoted string"),
            TokenKind::Symbol => write!(f, "operator"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with position information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Token text. For quoted strings this is the content without quotes.
    pub text: &'a str,
    /// Byte offset of the token start, used for error reporting only.
    pub offset: usize,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, offset: usize) -> Self {
        Self { kind, text, offset }
    }

    pub fn eof(offset: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            text: "",
            offset,
        }
    }

    /// True for an identifier token with exactly this text.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == word
    }

    /// Human-readable description used in parse errors.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => self.kind.to_string(),
            TokenKind::QuotedString => format!("\"{}\"", self.text),
            _ => format!("'{}'", self.text),
        }
    }
}
