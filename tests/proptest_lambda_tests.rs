//! Property-based tests for the lambda text helpers, the parser and the
//! compiled callables
//!
//! These tests use proptest to generate random inputs and verify that:
//! 1. The scanner and parser never panic on arbitrary or deeply nested input
//! 2. Canonical printing is idempotent
//! 3. Compiled arithmetic agrees with Rust arithmetic

use lucid::{parameter_count, parse_expression, reformat, CompileOptions, Engine, Value};
use proptest::prelude::*;

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9_]{0,8}".prop_filter("keywords are not identifiers", |s| {
        !matches!(s.as_str(), "if" | "else" | "return" | "new" | "true" | "false" | "null")
    })
}

fn operand(params: Vec<String>) -> impl Strategy<Value = String> {
    prop_oneof![
        (-1000i64..1000).prop_map(|n| n.to_string()),
        prop::sample::select(params),
        "[a-zA-Z ]{0,10}".prop_map(|s| format!("\"{}\"", s)),
    ]
}

/// Random function literals with expression bodies
fn lambda_source() -> impl Strategy<Value = String> {
    prop::collection::vec(identifier(), 1..4)
        .prop_flat_map(|params| {
            let operands = prop::collection::vec(operand(params.clone()), 1..5);
            let ops = prop::collection::vec(prop::sample::select(vec!["+", "-", "*", "==", "&&"]), 4);
            (Just(params), operands, ops)
        })
        .prop_map(|(params, operands, ops)| {
            let mut body = operands[0].clone();
            for (operand, op) in operands.iter().skip(1).zip(ops) {
                body = format!("{} {} {}", body, op, operand);
            }
            format!("({})=>{}", params.join(","), body)
        })
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn parser_never_panics(source in "[\\x20-\\x7E]{0,80}") {
        let _ = parse_expression(&source);
        let _ = reformat(&source);
    }

    #[test]
    fn deep_nesting_is_an_error_not_a_crash(depth in 0usize..3000, open in prop::sample::select(vec!["(", "-", "!", "f("])) {
        let close = if open.ends_with('(') { ")" } else { "" };
        let source = format!("x => {}x{}", open.repeat(depth), close.repeat(depth));
        let parsed = parse_expression(&source);
        if depth > 200 {
            prop_assert!(parsed.is_err());
        }
    }

    #[test]
    fn parameter_count_matches_list(params in prop::collection::vec(identifier(), 1..6)) {
        let source = format!("({}) => 0", params.join(", "));
        prop_assert_eq!(parameter_count(&source), params.len());
    }

    #[test]
    fn reformat_is_idempotent(source in lambda_source()) {
        let once = reformat(&source).unwrap();
        let twice = reformat(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn compiled_arithmetic_matches(a in -10_000i64..10_000, b in -10_000i64..10_000) {
        let engine = Engine::default();
        let callable = engine
            .compile_lambda::<2>("(a, b) => a * 3 - b", &CompileOptions::default())
            .unwrap();
        prop_assert_eq!(
            callable.call([Value::Int(a), Value::Int(b)]).unwrap(),
            Value::Int(a * 3 - b)
        );
    }
}
