use mpex_term::{parse_term, Symbol, Term};
use proptest::prelude::*;

/// Strategy for identifiers that the lexer accepts and that are not keywords.
fn ident() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,8}".prop_filter("not a keyword", |s| s != "true" && s != "false")
}

fn literal() -> impl Strategy<Value = Term> {
    prop_oneof![
        any::<i64>().prop_map(Term::int),
        any::<bool>().prop_map(Term::bool),
        "[ -~]{0,12}".prop_map(Term::str),
    ]
}

fn term() -> impl Strategy<Value = Term> {
    let leaf = prop_oneof![literal(), ident().prop_map(Term::var)];
    leaf.prop_recursive(4, 32, 4, |inner| {
        (
            ident(),
            proptest::option::of(ident()),
            proptest::collection::vec(inner, 0..4),
        )
            .prop_map(|(name, namespace, args)| {
                let symbol = match namespace {
                    Some(ns) => Symbol::namespaced(ns, name),
                    None => Symbol::new(name),
                };
                Term::compound(symbol, args)
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    #[test]
    fn parse_display_roundtrip(t in term()) {
        let rendered = t.to_string();
        let reparsed = parse_term(&rendered).expect("rendered term should reparse");
        prop_assert_eq!(reparsed, t);
    }

    #[test]
    fn ordering_consistent_with_equality(a in term(), b in term()) {
        use std::cmp::Ordering;
        prop_assert_eq!(a.cmp(&b) == Ordering::Equal, a == b);
    }
}
