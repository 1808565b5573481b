// Property-based tests for the membership filter.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use mailmatch_engine::*;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Small email pool so that the two sides overlap often.
fn arb_cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => "[a-e]@(x|y)\\.com".prop_map(|s: String| Value::text(s)),
        1 => (0u8..5).prop_map(|n| Value::number(n as f64)),
        1 => Just(Value::Null),
    ]
}

fn arb_dataset(name: &'static str, cols: usize) -> impl Strategy<Value = Dataset> {
    prop::collection::vec(prop::collection::vec(arb_cell(), cols), 0..20).prop_map(move |rows| {
        let columns = (0..cols).map(|i| format!("c{i}")).collect();
        Dataset::from_rows(name, columns, rows).unwrap()
    })
}

/// (first, first column, second, second column)
fn arb_inputs() -> impl Strategy<Value = (Dataset, String, Dataset, String)> {
    (1usize..4, 1usize..5)
        .prop_flat_map(|(ca, cb)| {
            (arb_dataset("first", ca), 0..ca, arb_dataset("second", cb), 0..cb)
        })
        .prop_map(|(a, ia, b, ib)| (a, format!("c{ia}"), b, format!("c{ib}")))
}

fn first_keys(a: &Dataset, col: &str) -> HashSet<MatchKey> {
    let idx = a.column_index(col).unwrap();
    a.column_values(idx).filter_map(|v| v.key()).collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn every_output_row_is_in_the_match_set((a, ca, b, cb) in arb_inputs()) {
        let keys = first_keys(&a, &ca);
        let out = match_merge(&a, &ca, &b, &cb).unwrap();
        for row in out.result.rows() {
            let key = row[0].key();
            prop_assert!(key.is_some(), "null key in output");
            prop_assert!(keys.contains(&key.unwrap()));
        }
    }

    #[test]
    fn every_matching_row_appears_exactly_once((a, ca, b, cb) in arb_inputs()) {
        let keys = first_keys(&a, &ca);
        let kb = b.column_index(&cb).unwrap();
        let expected: Vec<Vec<Value>> = b
            .rows()
            .iter()
            .filter(|r| r[kb].key().map_or(false, |k| keys.contains(&k)))
            .map(|r| {
                let mut out = vec![r[kb].clone()];
                out.extend(r.iter().enumerate().filter(|(i, _)| *i != kb).map(|(_, v)| v.clone()));
                out
            })
            .collect();

        let out = match_merge(&a, &ca, &b, &cb).unwrap();
        prop_assert_eq!(out.result.rows(), expected.as_slice());
        prop_assert_eq!(out.summary.matched_rows, expected.len());
    }

    #[test]
    fn rerun_is_identical((a, ca, b, cb) in arb_inputs()) {
        let first = match_merge(&a, &ca, &b, &cb).unwrap();
        let second = match_merge(&a, &ca, &b, &cb).unwrap();
        prop_assert_eq!(first.result, second.result);
        prop_assert_eq!(first.summary, second.summary);
    }

    #[test]
    fn output_columns_are_key_then_rest((a, ca, b, cb) in arb_inputs()) {
        let out = match_merge(&a, &ca, &b, &cb).unwrap();
        let cols = out.result.columns();
        prop_assert_eq!(&cols[0], &cb);
        let rest: Vec<&String> = b.columns().iter().filter(|c| **c != cb).collect();
        let got: Vec<&String> = cols[1..].iter().collect();
        prop_assert_eq!(got, rest);
    }

    #[test]
    fn duplicating_first_rows_changes_nothing((a, ca, b, cb) in arb_inputs()) {
        let (name, columns, rows) = a.clone().into_parts();
        let doubled: Vec<Vec<Value>> = rows.iter().chain(rows.iter()).cloned().collect();
        let a2 = Dataset::from_rows(name, columns, doubled).unwrap();

        let once = match_merge(&a, &ca, &b, &cb).unwrap();
        let twice = match_merge(&a2, &ca, &b, &cb).unwrap();
        prop_assert_eq!(once.result, twice.result);
    }
}

// ---------------------------------------------------------------------------
// Boundaries
// ---------------------------------------------------------------------------

#[test]
fn empty_first_column_yields_empty_result() {
    let a = Dataset::empty("first", vec!["email".into()]).unwrap();
    let b = Dataset::from_rows(
        "second",
        vec!["mail".into(), "name".into()],
        vec![vec![Value::text("x@y.com"), Value::text("Alice")]],
    )
    .unwrap();
    let out = match_merge(&a, "email", &b, "mail").unwrap();
    assert!(out.result.is_empty());
    assert_eq!(out.result.columns(), &["mail".to_string(), "name".to_string()]);
}
