//! Recursive descent parser for the textual term syntax.
//!
//! Grammar:
//! ```text
//! term     := literal | variable | compound
//! literal  := INT | STRING | "true" | "false"
//! variable := IDENT                     (no dot, not followed by `(`)
//! compound := NAME "(" [term {"," term}] ")"
//! ```
//! A bare identifier is a free variable; an identifier followed by `(` heads
//! a compound term. Dotted names (`Net.Send`) are namespaced symbols and may
//! only head compound terms.

use crate::lexer::{Lexer, Span, Token, TokenKind};
use crate::symbol::Symbol;
use crate::term::Term;
use thiserror::Error;

/// Parser error, carrying the offending lexeme and where it was found.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected {found} at {span}: expected {expected}")]
    UnexpectedToken {
        expected: String,
        /// Description of the offending token, including its text.
        found: String,
        span: Span,
    },
    #[error("unexpected end of input at {span}: expected {expected}")]
    UnexpectedEof { expected: String, span: Span },
    #[error("trailing input `{text}` at {span} after complete term")]
    TrailingInput { text: String, span: Span },
    #[error("qualified name `{name}` at {span} must head a compound term")]
    BareQualifiedName { name: String, span: Span },
}

impl ParseError {
    /// Get the source span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::UnexpectedEof { span, .. } => *span,
            ParseError::TrailingInput { span, .. } => *span,
            ParseError::BareQualifiedName { span, .. } => *span,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a single term from source text. The whole input must be consumed.
pub fn parse_term(source: &str) -> ParseResult<Term> {
    let mut parser = Parser::new(source);
    let term = parser.parse_term()?;
    parser.expect_eof()?;
    Ok(term)
}

/// Parser over a token buffer.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a new parser from source text.
    pub fn new(source: &str) -> Self {
        Self {
            tokens: Lexer::new(source).tokenize(),
            pos: 0,
        }
    }

    /// Parse one term.
    pub fn parse_term(&mut self) -> ParseResult<Term> {
        let token = self.advance();
        match token.kind {
            TokenKind::Int(n) => Ok(Term::int(n)),
            TokenKind::True => Ok(Term::bool(true)),
            TokenKind::False => Ok(Term::bool(false)),
            TokenKind::Str(s) => Ok(Term::str(s)),
            TokenKind::Ident(name) => {
                if self.peek_kind() == &TokenKind::LParen {
                    self.parse_compound(name)
                } else if name.contains('.') {
                    Err(ParseError::BareQualifiedName {
                        name,
                        span: token.span,
                    })
                } else {
                    Ok(Term::var(name))
                }
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEof {
                expected: "a term".to_string(),
                span: token.span,
            }),
            other => Err(ParseError::UnexpectedToken {
                expected: "a term".to_string(),
                found: other.describe(),
                span: token.span,
            }),
        }
    }

    /// Parse the parenthesized argument list of a compound term.
    fn parse_compound(&mut self, name: String) -> ParseResult<Term> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        if self.peek_kind() != &TokenKind::RParen {
            loop {
                args.push(self.parse_term()?);
                if self.peek_kind() == &TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)` or `,`")?;
        Ok(Term::compound(symbol_from_name(&name), args))
    }

    /// Require that all input has been consumed.
    pub fn expect_eof(&mut self) -> ParseResult<()> {
        let token = self.advance();
        if token.is_eof() {
            Ok(())
        } else {
            Err(ParseError::TrailingInput {
                text: token.kind.describe(),
                span: token.span,
            })
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        let token = self.advance();
        if token.kind == kind {
            Ok(token)
        } else if token.is_eof() {
            Err(ParseError::UnexpectedEof {
                expected: expected.to_string(),
                span: token.span,
            })
        } else {
            Err(ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.kind.describe(),
                span: token.span,
            })
        }
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    /// Consume and return the current token. Stays on EOF once reached.
    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }
}

/// Split a possibly dotted name into a namespaced symbol.
/// The last segment is the name, everything before it the namespace.
fn symbol_from_name(name: &str) -> Symbol {
    match name.rfind('.') {
        Some(idx) => Symbol::namespaced(&name[..idx], &name[idx + 1..]),
        None => Symbol::new(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literals() {
        assert_eq!(parse_term("42").unwrap(), Term::int(42));
        assert_eq!(parse_term("-7").unwrap(), Term::int(-7));
        assert_eq!(parse_term("true").unwrap(), Term::bool(true));
        assert_eq!(parse_term(r#""hi""#).unwrap(), Term::str("hi"));
    }

    #[test]
    fn bare_identifier_is_variable() {
        assert_eq!(parse_term("x").unwrap(), Term::var("x"));
    }

    #[test]
    fn parses_compound_terms() {
        let t = parse_term("f(1, g(x), \"s\")").unwrap();
        assert_eq!(
            t,
            Term::compound(
                Symbol::new("f"),
                vec![
                    Term::int(1),
                    Term::compound(Symbol::new("g"), vec![Term::var("x")]),
                    Term::str("s"),
                ]
            )
        );
    }

    #[test]
    fn parses_nullary_compound() {
        assert_eq!(
            parse_term("Init()").unwrap(),
            Term::compound(Symbol::new("Init"), vec![])
        );
    }

    #[test]
    fn parses_namespaced_symbol() {
        let t = parse_term("Net.Send(1)").unwrap();
        assert_eq!(t.symbol(), Some(&Symbol::namespaced("Net", "Send")));
    }

    #[test]
    fn rejects_bare_qualified_name() {
        let err = parse_term("Net.Send").unwrap_err();
        assert!(matches!(err, ParseError::BareQualifiedName { .. }));
    }

    #[test]
    fn rejects_trailing_input() {
        let err = parse_term("f(1) g").unwrap_err();
        match err {
            ParseError::TrailingInput { text, span } => {
                assert_eq!(text, "`g`");
                assert_eq!(span.start, 5);
            }
            other => panic!("expected TrailingInput, got {:?}", other),
        }
    }

    #[test]
    fn error_carries_offending_lexeme_and_span() {
        let err = parse_term("f(1,)").unwrap_err();
        match err {
            ParseError::UnexpectedToken { found, span, .. } => {
                assert_eq!(found, "`)`");
                assert_eq!(span.start, 4);
            }
            other => panic!("expected UnexpectedToken, got {:?}", other),
        }
    }

    #[test]
    fn unexpected_eof() {
        assert!(matches!(
            parse_term("f(1,").unwrap_err(),
            ParseError::UnexpectedEof { .. }
        ));
        assert!(matches!(
            parse_term("").unwrap_err(),
            ParseError::UnexpectedEof { .. }
        ));
    }

    #[test]
    fn display_roundtrip() {
        for src in ["f(1, -2, true, \"a b\")", "Net.Send(x, g())", "42", "x"] {
            let t = parse_term(src).unwrap();
            assert_eq!(parse_term(&t.to_string()).unwrap(), t);
        }
    }
}
