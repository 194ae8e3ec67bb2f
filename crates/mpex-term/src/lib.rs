//! Algebraic term model for mpex.
//!
//! Terms are immutable, structurally ordered values used both as automaton
//! node identifiers and as action labels. Equality, ordering and hashing are
//! all structural, so terms can key maps and sets directly.

pub mod lexer;
pub mod parser;
pub mod symbol;
pub mod term;

pub use lexer::{Lexer, Span, Token, TokenKind};
pub use parser::{parse_term, ParseError, ParseResult, Parser};
pub use symbol::Symbol;
pub use term::{Literal, Term};
