//! Property-based tests for the JSON parse/print round trip.
//!
//! Generates arbitrary value trees (strings drawn from a quote-free
//! alphabet, doubles kept finite) and checks that both printers emit
//! text the parser reads back to an equal value, deterministically.

use concise_schema_core::Json;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// String content the raw-bytes representation round-trips: anything
/// without `"` or `\`, which the parser could only have produced in
/// escaped pairs.
fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.,:/+-]{0,12}"
}

fn arb_finite_f64() -> impl Strategy<Value = f64> {
    prop::num::f64::POSITIVE
        | prop::num::f64::NEGATIVE
        | prop::num::f64::NORMAL
        | prop::num::f64::SUBNORMAL
        | prop::num::f64::ZERO
}

fn arb_json() -> impl Strategy<Value = Json> {
    let leaf = prop_oneof![
        Just(Json::Null),
        any::<bool>().prop_map(Json::Boolean),
        any::<i64>().prop_map(Json::Integer),
        arb_finite_f64().prop_map(Json::Double),
        arb_text().prop_map(Json::String),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Json::Array),
            prop::collection::btree_map(arb_text(), inner, 0..6).prop_map(Json::Object),
        ]
    })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, ..Default::default() })]

    /// parse(compact(v)) == v for every value tree.
    #[test]
    fn compact_print_round_trips(value in arb_json()) {
        let text = value.to_string();
        let reparsed: Json = text.parse()
            .expect("compact output must parse");
        prop_assert_eq!(reparsed, value);
    }

    /// parse(pretty(v)) == v at several indent widths.
    #[test]
    fn pretty_print_round_trips(value in arb_json(), tab in 1usize..5) {
        let text = value.pretty(tab);
        let reparsed: Json = text.parse()
            .expect("pretty output must parse");
        prop_assert_eq!(reparsed, value);
    }

    /// Printing is a pure function of the value.
    #[test]
    fn printing_is_deterministic(value in arb_json()) {
        prop_assert_eq!(value.to_string(), value.to_string());
        prop_assert_eq!(value.pretty(2), value.pretty(2));
    }

    /// Comments around and inside a compact document never change it.
    #[test]
    fn comments_are_invisible(value in arb_json()) {
        let text = format!("/*lead*/ {} ", value);
        let reparsed: Json = text.parse().expect("commented output must parse");
        prop_assert_eq!(reparsed, value);
    }
}
