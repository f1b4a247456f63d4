//! Filter Query Parser
//!
//! Zero-copy recursive-descent parser for the filter language used in
//! `filter=` query parameters.
//!
//! # Grammar
//!
//! ```text
//! clause_list        ::= clause (',' clause)*
//! clause             ::= or_expr
//! or_expr            ::= and_expr ('OR' and_expr)*
//! and_expr           ::= term ('AND' term)*
//! term               ::= simple_filter | aggregation_filter | '(' or_expr ')'
//! simple_filter      ::= IDENT OP STRING
//! aggregation_filter ::= ('ANY' | 'ALL' | 'HAS') '(' IDENT ',' or_expr ')' OP STRING
//! OP                 ::= EQ | NE | LT | LE | GT | GE | == | != | < | <= | > | >=
//! ```
//!
//! Top-level clauses are split at commas outside parentheses and combined with
//! an implicit AND. Each clause is lexed and parsed on its own: a clause that
//! fails to lex or parse is skipped and the remaining clauses still apply.
//! Commas inside `ANY(...)`/`ALL(...)`/`HAS(...)` separate the relation from its
//! sub-expression and never split a clause.
//!
//! # Example
//!
//! ```rust
//! use lectarium_core::parser::{CompareOp, FilterNode, Parser};
//!
//! let parsed = Parser::parse(r#"a EQ "1", b NE "2""#);
//! assert_eq!(
//!     parsed.tree,
//!     Some(FilterNode::and(
//!         FilterNode::simple("a", CompareOp::Eq, "1"),
//!         FilterNode::simple("b", CompareOp::Ne, "2"),
//!     ))
//! );
//! ```

mod ast;
mod lexer;
mod token;

pub use ast::{AggregationFilter, Aggregator, CompareOp, FilterNode, SimpleFilter};
pub use lexer::{tokenize, Lexer};
pub use token::{Token, TokenKind};

use thiserror::Error;
use tracing::debug;

/// Lexical errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: usize },

    #[error("unterminated string literal starting at position {position}")]
    UnterminatedString { position: usize },
}

/// Parser errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected} at position {position}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: usize,
    },

    #[error("unknown operator {found} at position {position}")]
    UnknownOperator { found: String, position: usize },

    #[error("unbalanced parentheses at position {position}")]
    UnbalancedParens { position: usize },
}

/// A clause dropped by the lenient parser, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedClause {
    /// Zero-based index of the clause in the comma-separated list
    pub index: usize,
    pub error: ParseError,
}

/// Result of a lenient parse.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedFilter<'a> {
    /// Conjunction of every valid clause. `None` means "match everything".
    pub tree: Option<FilterNode<'a>>,
    pub skipped: Vec<SkippedClause>,
}

impl ParsedFilter<'_> {
    pub fn is_unfiltered(&self) -> bool {
        self.tree.is_none()
    }
}

/// Filter string parser
pub struct Parser;

impl Parser {
    /// Parse a comma-separated clause list, skipping malformed clauses.
    pub fn parse(input: &str) -> ParsedFilter<'_> {
        let mut parsed = ParsedFilter::default();

        for (index, clause) in split_clauses(input).into_iter().enumerate() {
            match clause.and_then(|tokens| parse_clause(&tokens)) {
                Ok(Some(node)) => {
                    parsed.tree = Some(match parsed.tree.take() {
                        Some(acc) => FilterNode::and(acc, node),
                        None => node,
                    });
                }
                Ok(None) => {}
                Err(error) => {
                    debug!(index, %error, "skipping malformed filter clause");
                    parsed.skipped.push(SkippedClause { index, error });
                }
            }
        }

        parsed
    }

    /// Parse a clause list, failing on the first malformed clause.
    pub fn parse_strict(input: &str) -> Result<Option<FilterNode<'_>>, ParseError> {
        let mut tree: Option<FilterNode<'_>> = None;
        for clause in split_clauses(input) {
            if let Some(node) = parse_clause(&clause?)? {
                tree = Some(match tree {
                    Some(acc) => FilterNode::and(acc, node),
                    None => node,
                });
            }
        }
        Ok(tree)
    }
}

/// Split the token stream into clauses at commas outside parentheses.
///
/// Each successful clause ends with an `Eof` token. A clause containing a
/// lexical error is reported as that error.
fn split_clauses(input: &str) -> Vec<Result<Vec<Token<'_>>, ParseError>> {
    let mut clauses = Vec::new();
    let mut current: Vec<Token<'_>> = Vec::new();
    let mut error: Option<LexError> = None;
    let mut depth: i32 = 0;

    for item in Lexer::new(input) {
        let token = match item {
            Ok(token) => token,
            Err(e) => {
                error.get_or_insert(e);
                continue;
            }
        };

        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth -= 1,
            TokenKind::Comma | TokenKind::Eof if depth <= 0 || token.kind == TokenKind::Eof => {
                let is_eof = token.kind == TokenKind::Eof;
                current.push(Token::eof(token.offset));
                clauses.push(match error.take() {
                    Some(e) => Err(e.into()),
                    None => Ok(std::mem::take(&mut current)),
                });
                current.clear();
                depth = 0;
                if is_eof {
                    break;
                }
                continue;
            }
            _ => {}
        }
        current.push(token);
    }

    clauses
}

/// Parse a single clause. Returns `Ok(None)` for an empty clause.
fn parse_clause<'a>(tokens: &[Token<'a>]) -> Result<Option<FilterNode<'a>>, ParseError> {
    let mut parser = ClauseParser { tokens, pos: 0 };
    if parser.peek().kind == TokenKind::Eof {
        return Ok(None);
    }

    let node = parser.parse_or()?;
    let trailing = parser.peek();
    match trailing.kind {
        TokenKind::Eof => Ok(Some(node)),
        TokenKind::RParen => Err(ParseError::UnbalancedParens {
            position: trailing.offset,
        }),
        _ => Err(ParseError::UnexpectedToken {
            expected: "',' or end of input".to_string(),
            found: trailing.describe(),
            position: trailing.offset,
        }),
    }
}

/// Recursive-descent parser over the tokens of one clause.
struct ClauseParser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl<'t, 'a> ClauseParser<'t, 'a> {
    fn peek(&self) -> &'t Token<'a> {
        // Clauses always end with Eof; never step past it.
        let tokens = self.tokens;
        &tokens[self.pos.min(tokens.len() - 1)]
    }

    fn peek_kind_at(&self, ahead: usize) -> TokenKind {
        self.tokens
            .get(self.pos + ahead)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn bump(&mut self) -> &'t Token<'a> {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&'t Token<'a>, ParseError> {
        let token = self.peek();
        if token.kind == kind {
            return Ok(self.bump());
        }
        if kind == TokenKind::RParen && token.kind == TokenKind::Eof {
            return Err(ParseError::UnbalancedParens {
                position: token.offset,
            });
        }
        Err(ParseError::UnexpectedToken {
            expected: kind.to_string(),
            found: token.describe(),
            position: token.offset,
        })
    }

    fn parse_or(&mut self) -> Result<FilterNode<'a>, ParseError> {
        let mut node = self.parse_and()?;
        while self.peek().is_word("OR") {
            self.bump();
            let rhs = self.parse_and()?;
            node = FilterNode::or(node, rhs);
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<FilterNode<'a>, ParseError> {
        let mut node = self.parse_term()?;
        while self.peek().is_word("AND") {
            self.bump();
            let rhs = self.parse_term()?;
            node = FilterNode::and(node, rhs);
        }
        Ok(node)
    }

    fn parse_term(&mut self) -> Result<FilterNode<'a>, ParseError> {
        let token = self.peek();
        match token.kind {
            TokenKind::LParen => {
                self.bump();
                let node = self.parse_or()?;
                self.expect(TokenKind::RParen)?;
                Ok(node)
            }
            TokenKind::Identifier => match Aggregator::parse(token.text) {
                Some(aggregator) if self.peek_kind_at(1) == TokenKind::LParen => {
                    self.bump();
                    self.parse_aggregation(aggregator)
                }
                _ => self.parse_simple(),
            },
            _ => Err(ParseError::UnexpectedToken {
                expected: "field name, aggregator or '('".to_string(),
                found: token.describe(),
                position: token.offset,
            }),
        }
    }

    fn parse_simple(&mut self) -> Result<FilterNode<'a>, ParseError> {
        let field = self.expect(TokenKind::Identifier)?.text;
        let op = self.parse_operator()?;
        let constant = self.expect(TokenKind::QuotedString)?.text;
        Ok(FilterNode::simple(field, op, constant))
    }

    fn parse_aggregation(&mut self, aggregator: Aggregator) -> Result<FilterNode<'a>, ParseError> {
        self.expect(TokenKind::LParen)?;
        let relation = self.expect(TokenKind::Identifier)?.text;
        self.expect(TokenKind::Comma)?;
        let sub_expr = self.parse_or()?;
        self.expect(TokenKind::RParen)?;
        let op = self.parse_operator()?;
        let constant = self.expect(TokenKind::QuotedString)?.text;
        Ok(FilterNode::aggregation(
            aggregator, relation, sub_expr, op, constant,
        ))
    }

    fn parse_operator(&mut self) -> Result<CompareOp, ParseError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Identifier | TokenKind::Symbol => match CompareOp::parse(token.text) {
                Some(op) => {
                    self.bump();
                    Ok(op)
                }
                None => Err(ParseError::UnknownOperator {
                    found: token.describe(),
                    position: token.offset,
                }),
            },
            _ => Err(ParseError::UnexpectedToken {
                expected: "comparison operator".to_string(),
                found: token.describe(),
                position: token.offset,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn simple<'a>(field: &'a str, op: CompareOp, constant: &'a str) -> FilterNode<'a> {
        FilterNode::simple(field, op, constant)
    }

    #[test]
    fn test_empty_filter() {
        let parsed = Parser::parse("");
        assert!(parsed.is_unfiltered());
        assert!(parsed.skipped.is_empty());

        assert!(Parser::parse("   ").is_unfiltered());
        assert_eq!(Parser::parse_strict("").unwrap(), None);
    }

    #[test]
    fn test_single_clause() {
        let parsed = Parser::parse(r#"name EQ "Math 101""#);
        assert_eq!(parsed.tree, Some(simple("name", CompareOp::Eq, "Math 101")));
    }

    #[test]
    fn test_commas_combine_with_and() {
        let parsed = Parser::parse(r#"a EQ "1", b NE "2""#);
        assert_eq!(
            parsed.tree,
            Some(FilterNode::and(
                simple("a", CompareOp::Eq, "1"),
                simple("b", CompareOp::Ne, "2"),
            ))
        );
    }

    #[test]
    fn test_clauses_fold_left() {
        let parsed = Parser::parse(r#"a EQ "1", b EQ "2", c EQ "3""#);
        assert_eq!(
            parsed.tree,
            Some(FilterNode::and(
                FilterNode::and(
                    simple("a", CompareOp::Eq, "1"),
                    simple("b", CompareOp::Eq, "2")
                ),
                simple("c", CompareOp::Eq, "3"),
            ))
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let parsed = Parser::parse(r#"a EQ "1" OR b EQ "2" AND c EQ "3""#);
        assert_eq!(
            parsed.tree,
            Some(FilterNode::or(
                simple("a", CompareOp::Eq, "1"),
                FilterNode::and(
                    simple("b", CompareOp::Eq, "2"),
                    simple("c", CompareOp::Eq, "3")
                ),
            ))
        );
    }

    #[test]
    fn test_parentheses_group() {
        let parsed = Parser::parse(r#"(a EQ "1" OR b EQ "2") AND c EQ "3""#);
        assert_eq!(
            parsed.tree,
            Some(FilterNode::and(
                FilterNode::or(
                    simple("a", CompareOp::Eq, "1"),
                    simple("b", CompareOp::Eq, "2")
                ),
                simple("c", CompareOp::Eq, "3"),
            ))
        );
    }

    #[test]
    fn test_aggregation_filter() {
        let parsed = Parser::parse(r#"ANY(wtokens, lect_id EQ "5" OR lect_id EQ "6") EQ "true""#);
        assert_eq!(
            parsed.tree,
            Some(FilterNode::aggregation(
                Aggregator::Any,
                "wtokens",
                FilterNode::or(
                    simple("lect_id", CompareOp::Eq, "5"),
                    simple("lect_id", CompareOp::Eq, "6")
                ),
                CompareOp::Eq,
                "true",
            ))
        );
    }

    #[test]
    fn test_nested_aggregation_with_following_clause() {
        let parsed =
            Parser::parse(r#"ALL(children, HAS(owner, name EQ "x") EQ "true") EQ "true", id GT "3""#);
        assert!(parsed.skipped.is_empty());
        match parsed.tree {
            Some(FilterNode::And { left, right }) => {
                assert!(matches!(*left, FilterNode::Aggregation(ref a) if a.aggregator == Aggregator::All));
                assert_eq!(*right, simple("id", CompareOp::Gt, "3"));
            }
            other => panic!("unexpected tree: {:?}", other),
        }
    }

    #[test]
    fn test_symbolic_operators() {
        let parsed = Parser::parse(r#"a == "1", b != "NULL", c >= "2""#);
        assert_eq!(
            parsed.tree,
            Some(FilterNode::and(
                FilterNode::and(
                    simple("a", CompareOp::Eq, "1"),
                    simple("b", CompareOp::Ne, "NULL")
                ),
                simple("c", CompareOp::Ge, "2"),
            ))
        );
    }

    #[test]
    fn test_field_named_like_aggregator() {
        let parsed = Parser::parse(r#"HAS EQ "x""#);
        assert_eq!(parsed.tree, Some(simple("HAS", CompareOp::Eq, "x")));
    }

    #[test]
    fn test_unknown_operator_skips_clause() {
        let parsed = Parser::parse(r#"a LIKE "1", b EQ "2""#);
        assert_eq!(parsed.tree, Some(simple("b", CompareOp::Eq, "2")));
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].index, 0);
        assert!(matches!(
            parsed.skipped[0].error,
            ParseError::UnknownOperator { .. }
        ));
    }

    #[test]
    fn test_wrong_shape_skips_clause() {
        let parsed = Parser::parse(r#"garbage, b EQ "2", c EQ 5"#);
        assert_eq!(parsed.tree, Some(simple("b", CompareOp::Eq, "2")));
        assert_eq!(parsed.skipped.len(), 2);
    }

    #[test]
    fn test_lex_error_skips_only_its_clause() {
        let parsed = Parser::parse(r#"a EQ "1" ; x, b EQ "2""#);
        assert_eq!(parsed.tree, Some(simple("b", CompareOp::Eq, "2")));
        assert_eq!(
            parsed.skipped[0].error,
            ParseError::Lex(LexError::UnexpectedChar { ch: ';', position: 9 })
        );
    }

    #[test]
    fn test_all_invalid_yields_unfiltered() {
        let parsed = Parser::parse(r#"nope, still nope"#);
        assert!(parsed.is_unfiltered());
        assert_eq!(parsed.skipped.len(), 2);
    }

    #[test]
    fn test_unbalanced_parens() {
        let err = Parser::parse_strict(r#"(a EQ "1""#).unwrap_err();
        assert!(matches!(err, ParseError::UnbalancedParens { .. }));

        let err = Parser::parse_strict(r#"a EQ "1")"#).unwrap_err();
        assert!(matches!(err, ParseError::UnbalancedParens { .. }));

        let parsed = Parser::parse(r#"(a EQ "1", b EQ "2""#);
        assert!(parsed.is_unfiltered());
    }

    #[test]
    fn test_strict_reports_first_error() {
        let err = Parser::parse_strict(r#"a EQ "1", b EQ"#).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_empty_clauses_are_ignored() {
        let parsed = Parser::parse(r#", a EQ "1",,"#);
        assert_eq!(parsed.tree, Some(simple("a", CompareOp::Eq, "1")));
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn test_same_input_parses_identically() {
        let input = r#"ANY(items, x GT "0") EQ "true", name NE "NULL""#;
        assert_eq!(Parser::parse(input), Parser::parse(input));
    }

    #[test]
    fn test_display_round_trips_through_parser() {
        let input = r#"ALL(children, x GT "0" OR y EQ "a") EQ "true", name NE "b""#;
        let tree = Parser::parse_strict(input).unwrap().unwrap();
        let rendered = tree.to_string();
        assert_eq!(Parser::parse_strict(&rendered).unwrap(), Some(tree));
    }
}
