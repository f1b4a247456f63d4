//! Zero-copy lexer for the filter language

use super::token::{Token, TokenKind};
use super::LexError;

/// Zero-copy lexer for filter and clause strings.
///
/// Yields `Err` for characters that cannot start a token and for unterminated
/// string literals, then resumes after the offending input so a caller can
/// resynchronise at the next clause boundary. An unterminated literal consumes
/// the rest of the input.
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            done: false,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.remaining().chars().nth(1)
    }

    fn advance(&mut self, n: usize) {
        self.position += n;
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
    }

    fn read_quoted_string(&mut self) -> Result<Token<'a>, LexError> {
        let start = self.position;
        self.advance(1);

        let content_start = self.position;
        match self.remaining().find('"') {
            Some(len) => {
                let text = &self.input[content_start..content_start + len];
                self.advance(len + 1);
                Ok(Token::new(TokenKind::QuotedString, text, start))
            }
            None => {
                self.position = self.input.len();
                Err(LexError::UnterminatedString { position: start })
            }
        }
    }

    fn read_identifier(&mut self) -> Token<'a> {
        let start = self.position;

        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance(1);
            } else {
                break;
            }
        }

        Token::new(TokenKind::Identifier, &self.input[start..self.position], start)
    }

    fn read_symbol(&mut self, first: char) -> Result<Token<'a>, LexError> {
        let start = self.position;
        let len = match (first, self.peek_second()) {
            ('=', Some('=')) | ('!', Some('=')) | ('<', Some('=')) | ('>', Some('=')) => 2,
            ('<', _) | ('>', _) => 1,
            _ => {
                self.advance(first.len_utf8());
                return Err(LexError::UnexpectedChar {
                    ch: first,
                    position: start,
                });
            }
        };
        self.advance(len);
        Ok(Token::new(
            TokenKind::Symbol,
            &self.input[start..self.position],
            start,
        ))
    }

    fn single(&mut self, kind: TokenKind) -> Token<'a> {
        let start = self.position;
        self.advance(1);
        Token::new(kind, &self.input[start..self.position], start)
    }

    fn next_token(&mut self) -> Result<Token<'a>, LexError> {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::eof(self.position)),
        };

        match c {
            '"' => self.read_quoted_string(),
            '(' => Ok(self.single(TokenKind::LParen)),
            ')' => Ok(self.single(TokenKind::RParen)),
            ',' => Ok(self.single(TokenKind::Comma)),
            '=' | '!' | '<' | '>' => self.read_symbol(c),
            _ if c.is_ascii_alphabetic() || c == '_' => Ok(self.read_identifier()),
            _ => {
                let position = self.position;
                self.advance(c.len_utf8());
                Err(LexError::UnexpectedChar { ch: c, position })
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let token = self.next_token();
        if matches!(token, Ok(ref t) if t.kind == TokenKind::Eof) {
            self.done = true;
        }
        Some(token)
    }
}

/// Tokenize a whole string, failing on the first lexical error.
///
/// The returned sequence always ends with an `Eof` token.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, LexError> {
    Lexer::new(input).collect()
}
