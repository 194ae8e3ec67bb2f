//! Namespaced symbols used to tag compound terms and action kinds.

use std::fmt;
use std::sync::Arc;

/// A namespaced name. Symbols tag compound terms and identify action kinds.
///
/// Symbols are totally ordered, lexicographically on `(namespace, name)`,
/// and hash consistently with equality so they can key maps and sets.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    /// Optional namespace, e.g. `Net` in `Net.Send`.
    namespace: Option<Arc<str>>,
    /// The symbol's own name.
    name: Arc<str>,
}

impl Symbol {
    /// Create a symbol with no namespace.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    /// Create a namespaced symbol.
    pub fn namespaced(namespace: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    /// The symbol's own name, without the namespace.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Split the name on a trailing `_<suffix>` marker, e.g.
    /// `Req_Start` -> `("Req", "Start")`. Used to pair start/finish actions.
    pub fn split_suffix(&self) -> Option<(&str, &str)> {
        let idx = self.name.rfind('_')?;
        let (base, rest) = self.name.split_at(idx);
        if base.is_empty() {
            return None;
        }
        Some((base, &rest[1..]))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.namespace {
            write!(f, "{}.{}", ns, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_lexicographic_on_namespace_then_name() {
        let a = Symbol::new("a");
        let b = Symbol::new("b");
        let nsa = Symbol::namespaced("ns", "a");
        assert!(a < b);
        assert!(a < nsa); // None < Some
        assert!(nsa < Symbol::namespaced("ns", "b"));
    }

    #[test]
    fn display_includes_namespace() {
        assert_eq!(Symbol::new("Send").to_string(), "Send");
        assert_eq!(Symbol::namespaced("Net", "Send").to_string(), "Net.Send");
    }

    #[test]
    fn split_suffix() {
        assert_eq!(Symbol::new("Req_Start").split_suffix(), Some(("Req", "Start")));
        assert_eq!(Symbol::new("Req").split_suffix(), None);
        assert_eq!(Symbol::new("_Start").split_suffix(), None);
        // rightmost underscore wins
        assert_eq!(Symbol::new("a_b_Finish").split_suffix(), Some(("a_b", "Finish")));
    }
}
