use mold_json::{MoldErrorKind, from_value, from_value_with, to_value};
use serde_json::json;
use time::OffsetDateTime;
use time::macros::datetime;

mold_json::mold! {
    #[derive(Debug, PartialEq)]
    struct Event {
        when: OffsetDateTime,
    }
}

#[test]
fn rfc3339_timestamps_parse() {
    let event: Event = from_value(&json!({ "when": "2025-01-01T10:30:00Z" })).unwrap();

    assert_eq!(event.when, datetime!(2025-01-01 10:30 UTC));
}

#[test]
fn offset_timestamps_parse() {
    let event: Event = from_value(&json!({ "when": "2025-06-15T08:00:00+02:00" })).unwrap();

    assert_eq!(event.when, datetime!(2025-06-15 6:00 UTC));
}

#[test]
fn bare_calendar_dates_parse_as_midnight_utc() {
    let event: Event = from_value(&json!({ "when": "2025-01-01" })).unwrap();

    assert_eq!(event.when, datetime!(2025-01-01 0:00 UTC));
}

#[test]
fn non_string_sources_raise_when_strict() {
    let err = from_value::<Event>(&json!({ "when": true })).unwrap_err();
    assert!(matches!(
        err.kind,
        MoldErrorKind::TypeMismatch { expected: "date string", got: "boolean" }
    ));

    // Numeric timestamps are deliberately not accepted.
    let err = from_value::<Event>(&json!({ "when": 1735689600 })).unwrap_err();
    assert!(matches!(err.kind, MoldErrorKind::TypeMismatch { .. }));
}

#[test]
fn unparseable_strings_raise_when_strict() {
    let err = from_value::<Event>(&json!({ "when": "soonish" })).unwrap_err();

    assert!(matches!(err.kind, MoldErrorKind::InvalidDate { .. }));
    assert_eq!(err.kind.code(), "mold::invalid_type");
}

#[test]
fn lenient_mode_keeps_the_current_value() {
    let event: Event = from_value_with(&json!({ "when": "soonish" }), false).unwrap();
    assert_eq!(event.when, OffsetDateTime::UNIX_EPOCH);

    let event: Event = from_value_with(&json!({ "when": 42 }), false).unwrap();
    assert_eq!(event.when, OffsetDateTime::UNIX_EPOCH);
}

#[test]
fn date_elements_always_enforce() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Timeline {
            stamps: Vec<OffsetDateTime>,
        }
    }

    let timeline: Timeline = from_value(&json!({
        "stamps": ["2025-01-01", "2025-01-02T12:00:00Z"],
    }))
    .unwrap();
    assert_eq!(timeline.stamps.len(), 2);

    // Element-level date coercion ignores the ambient mode.
    let err = from_value_with::<Timeline>(&json!({ "stamps": [true] }), false).unwrap_err();
    assert!(matches!(err.kind, MoldErrorKind::TypeMismatch { .. }));

    let err = from_value_with::<Timeline>(&json!({ "stamps": ["nope"] }), false).unwrap_err();
    assert!(matches!(err.kind, MoldErrorKind::InvalidDate { .. }));
}

#[test]
fn dates_encode_as_rfc3339_strings() {
    let event = Event { when: datetime!(2025-06-15 8:00 UTC) };

    assert_eq!(to_value(&event), json!({ "when": "2025-06-15T08:00:00Z" }));
}
