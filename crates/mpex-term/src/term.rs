//! Immutable terms with structural equality, ordering and hashing.
//!
//! A `Term` never changes after construction, so sharing is safe and cheap:
//! string payloads and nothing else sit behind `Arc`, and `Clone` is shallow.
//! Two terms compare equal iff their structure is equal, which is what the
//! explorer's state/action deduplication relies on.

use crate::symbol::Symbol;
use std::fmt;
use std::sync::Arc;

/// An atomic literal value.
///
/// Variant order matters: the derived `Ord` puts ints before bools before
/// strings, and that order is part of the term total order.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Str(Arc<str>),
}

/// An algebraic term: a literal, a free variable, or a compound term.
///
/// Variables only appear in action-label patterns; concrete states and
/// actions are always ground (see [`Term::is_ground`]).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Literal(Literal),
    Variable(Arc<str>),
    Compound(Symbol, Vec<Term>),
}

impl Term {
    /// Integer literal term.
    pub fn int(value: i64) -> Self {
        Term::Literal(Literal::Int(value))
    }

    /// Boolean literal term.
    pub fn bool(value: bool) -> Self {
        Term::Literal(Literal::Bool(value))
    }

    /// String literal term.
    pub fn str(value: impl Into<Arc<str>>) -> Self {
        Term::Literal(Literal::Str(value.into()))
    }

    /// Free variable term.
    pub fn var(name: impl Into<Arc<str>>) -> Self {
        Term::Variable(name.into())
    }

    /// Compound term with the given symbol and arguments.
    pub fn compound(symbol: Symbol, args: Vec<Term>) -> Self {
        Term::Compound(symbol, args)
    }

    /// The head symbol, for compound terms.
    pub fn symbol(&self) -> Option<&Symbol> {
        match self {
            Term::Compound(symbol, _) => Some(symbol),
            _ => None,
        }
    }

    /// The arguments, for compound terms.
    pub fn args(&self) -> &[Term] {
        match self {
            Term::Compound(_, args) => args,
            _ => &[],
        }
    }

    /// The wrapped integer, for integer literals.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Term::Literal(Literal::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// True if no `Variable` occurs anywhere in the term.
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Literal(_) => true,
            Term::Variable(_) => false,
            Term::Compound(_, args) => args.iter().all(Term::is_ground),
        }
    }

    /// Parse a term from its textual form. Inverse of `Display`.
    pub fn parse(source: &str) -> crate::parser::ParseResult<Term> {
        crate::parser::parse_term(source)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Str(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    match c {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                write!(f, "\"")
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Literal(lit) => write!(f, "{}", lit),
            Term::Variable(name) => write!(f, "{}", name),
            Term::Compound(symbol, args) => {
                write!(f, "{}(", symbol)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::int(value)
    }
}

impl From<bool> for Term {
    fn from(value: bool) -> Self {
        Term::bool(value)
    }
}
