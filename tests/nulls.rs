use mold_json::{Dynamic, MoldErrorKind, from_value, from_value_with};
use serde_json::json;

#[test]
fn null_source_keeps_the_default_in_both_modes() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Labeled {
            tag: String = "initial".to_string(),
        }
    }

    // Null is "no update", independent of strictness. This is deliberately
    // asymmetric with missing fields, which obey strictness.
    let labeled: Labeled = from_value(&json!({ "tag": null })).unwrap();
    assert_eq!(labeled.tag, "initial");

    let labeled: Labeled = from_value_with(&json!({ "tag": null }), false).unwrap();
    assert_eq!(labeled.tag, "initial");
}

#[test]
fn null_source_keeps_collection_and_date_defaults_too() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Holder {
            nums: Vec<i64>,
            seen: std::collections::HashSet<String>,
            when: time::OffsetDateTime,
        }
    }

    let holder: Holder = from_value(&json!({
        "nums": null, "seen": null, "when": null,
    }))
    .unwrap();

    assert!(holder.nums.is_empty());
    assert!(holder.seen.is_empty());
    assert_eq!(holder.when, time::OffsetDateTime::UNIX_EPOCH);
}

#[test]
fn optional_fields_fill_and_stay_empty_on_null() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Note {
            body: Option<String>,
        }
    }

    let note: Note = from_value(&json!({ "body": "hi" })).unwrap();
    assert_eq!(note.body, Some("hi".to_string()));

    let note: Note = from_value(&json!({ "body": null })).unwrap();
    assert_eq!(note.body, None);
}

#[test]
fn untyped_null_default_raises_when_strict() {
    mold_json::mold! {
        #[derive(Debug)]
        struct Payload {
            data: Dynamic,
        }
    }

    // No `[type = ...]` clause: the null default is unresolvable. This is
    // checked before the source is even consulted.
    let err = from_value::<Payload>(&json!({ "data": { "x": 1 } })).unwrap_err();
    assert!(matches!(
        err.kind,
        MoldErrorKind::UntypedNull { record: "Payload", field: "data" }
    ));
    assert_eq!(err.kind.code(), "mold::invalid_target");

    let err = from_value::<Payload>(&json!({})).unwrap_err();
    assert!(matches!(err.kind, MoldErrorKind::UntypedNull { .. }));

    let payload: Payload = from_value_with(&json!({ "data": { "x": 1 } }), false).unwrap();
    assert!(payload.data.is_empty());
}

#[test]
fn opaque_values_assign_verbatim_without_recursion() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Envelope {
            blob: serde_json::Value = json!({}),
        }
    }

    let envelope: Envelope = from_value(&json!({ "blob": { "a": [1, 2] } })).unwrap();
    assert_eq!(envelope.blob, json!({ "a": [1, 2] }));

    let envelope: Envelope = from_value(&json!({ "blob": [true, null] })).unwrap();
    assert_eq!(envelope.blob, json!([true, null]));

    // Primitives follow the ordinary mismatch policy.
    let err = from_value::<Envelope>(&json!({ "blob": 5 })).unwrap_err();
    assert!(matches!(err.kind, MoldErrorKind::TypeMismatch { .. }));

    let envelope: Envelope = from_value_with(&json!({ "blob": 5 }), false).unwrap();
    assert_eq!(envelope.blob, json!({}));
}

#[test]
fn a_value_field_defaulting_to_null_needs_a_declared_type() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Bare {
            blob: serde_json::Value,
        }
    }

    let err = from_value::<Bare>(&json!({ "blob": { "a": 1 } })).unwrap_err();
    assert!(matches!(err.kind, MoldErrorKind::UntypedNull { .. }));
}
