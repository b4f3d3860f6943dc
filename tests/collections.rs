use std::collections::{BTreeMap, HashMap, HashSet};

use mold_json::{MoldErrorKind, from_value, from_value_with};
use serde_json::json;

#[test]
fn sequences_fill_from_arrays() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Scores {
            values: Vec<i64>,
        }
    }

    let scores: Scores = from_value(&json!({ "values": [1, 2, 3] })).unwrap();

    assert_eq!(scores.values, vec![1, 2, 3]);
}

#[test]
fn sets_fill_from_arrays() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Seen {
            ids: HashSet<i64>,
        }
    }

    let seen: Seen = from_value(&json!({ "ids": [1, 2, 2] })).unwrap();

    assert_eq!(seen.ids.len(), 2);
    assert!(seen.ids.contains(&1));
    assert!(seen.ids.contains(&2));
}

#[test]
fn keyed_collections_fill_from_objects() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Tally {
            counts: HashMap<String, i64>,
        }
    }

    let tally: Tally = from_value(&json!({ "counts": { "a": 1 } })).unwrap();

    assert_eq!(tally.counts.len(), 1);
    assert_eq!(tally.counts.get("a"), Some(&1));
}

#[test]
fn statically_typed_elements_recurse() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Entry {
            label: String,
        }
    }

    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Journal {
            entries: Vec<Entry>,
            by_day: BTreeMap<String, Entry>,
        }
    }

    let journal: Journal = from_value(&json!({
        "entries": [{ "label": "first" }, { "label": "second" }],
        "by_day": { "mon": { "label": "start" } },
    }))
    .unwrap();

    assert_eq!(journal.entries.len(), 2);
    assert_eq!(journal.entries[1].label, "second");
    assert_eq!(journal.by_day.get("mon").unwrap().label, "start");
}

#[test]
fn element_mismatches_raise_even_in_lenient_mode() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Scores {
            values: Vec<i64>,
        }
    }

    // A malformed element cannot be repaired by keeping a prior value that
    // does not exist, so element coercion ignores the ambient mode.
    let err = from_value_with::<Scores>(&json!({ "values": [1, "x"] }), false).unwrap_err();
    assert!(matches!(
        err.kind,
        MoldErrorKind::TypeMismatch { expected: "i64", got: "string" }
    ));
}

#[test]
fn collection_shape_mismatch_is_lenient_at_the_field_level() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Scores {
            values: Vec<i64>,
        }
    }

    let scores: Scores = from_value_with(&json!({ "values": 5 }), false).unwrap();
    assert!(scores.values.is_empty());

    let err = from_value::<Scores>(&json!({ "values": 5 })).unwrap_err();
    assert!(matches!(
        err.kind,
        MoldErrorKind::TypeMismatch { expected: "sequence", got: "number" }
    ));
}

#[test]
fn sets_reject_non_array_sources() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Seen {
            ids: HashSet<i64>,
        }
    }

    // Sets fill from sequences, never from objects.
    let err = from_value::<Seen>(&json!({ "ids": { "a": 1 } })).unwrap_err();
    assert!(matches!(
        err.kind,
        MoldErrorKind::TypeMismatch { expected: "sequence", got: "object" }
    ));
}

#[test]
fn keyed_collections_reject_arrays() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Tally {
            counts: HashMap<String, i64>,
        }
    }

    let err = from_value::<Tally>(&json!({ "counts": [1, 2] })).unwrap_err();
    assert!(matches!(
        err.kind,
        MoldErrorKind::TypeMismatch { expected: "keyed object", got: "array" }
    ));
}

#[test]
fn nested_sequences() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Grid {
            rows: Vec<Vec<i64>>,
        }
    }

    let grid: Grid = from_value(&json!({ "rows": [[1, 2], [], [3]] })).unwrap();

    assert_eq!(grid.rows, vec![vec![1, 2], vec![], vec![3]]);
}

#[test]
fn decoded_elements_append_to_the_declared_default() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Tags {
            names: Vec<String> = vec!["base".to_string()],
        }
    }

    let tags: Tags = from_value(&json!({ "names": ["extra"] })).unwrap();

    assert_eq!(tags.names, vec!["base".to_string(), "extra".to_string()]);
}
