use mold_json::{MoldErrorKind, from_str, from_value, from_value_with};
use serde_json::json;

mold_json::mold! {
    #[derive(Debug, PartialEq)]
    struct Player {
        name: String,
        score: i64,
        online: bool,
    }
}

#[test]
fn decode_flat_record() {
    let value = json!({ "name": "ada", "score": 7, "online": true });

    let player: Player = from_value(&value).unwrap();

    assert_eq!(player.name, "ada");
    assert_eq!(player.score, 7);
    assert!(player.online);
}

#[test]
fn decode_from_str() {
    let player: Player = from_str(r#"{"name":"kay","score":-2,"online":false}"#).unwrap();

    assert_eq!(player.name, "kay");
    assert_eq!(player.score, -2);
    assert!(!player.online);
}

#[test]
fn decode_nested_record() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Profile {
            bio: String,
            age: i64,
        }
    }

    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Account {
            user: String,
            profile: Profile,
        }
    }

    let value = json!({
        "user": "kay",
        "profile": { "bio": "hello", "age": 31 },
    });

    let account: Account = from_value(&value).unwrap();

    assert_eq!(account.user, "kay");
    assert_eq!(account.profile, Profile { bio: "hello".into(), age: 31 });
}

#[test]
fn unknown_source_keys_are_ignored() {
    let value = json!({
        "name": "ada",
        "score": 7,
        "online": true,
        "spectators": 120,
    });

    let player: Player = from_value(&value).unwrap();

    assert_eq!(player.score, 7);
}

#[test]
fn field_defaults_survive_a_lenient_decode() {
    let player: Player = from_value_with(&json!({}), false).unwrap();

    assert_eq!(player.name, "");
    assert_eq!(player.score, 0);
    assert!(!player.online);
}

#[test]
fn declared_default_expressions() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Session {
            user: String,
            retries: i64 = 3,
        }
    }

    let session: Session = from_value_with(&json!({ "user": "kay" }), false).unwrap();
    assert_eq!(session.retries, 3);

    let session: Session = from_value(&json!({ "user": "kay", "retries": 9 })).unwrap();
    assert_eq!(session.retries, 9);
}

#[test]
fn top_level_source_must_be_an_object() {
    let err = from_value::<Player>(&json!([1, 2, 3])).unwrap_err();
    assert!(matches!(err.kind, MoldErrorKind::InvalidSource { found: "array" }));
    assert_eq!(err.kind.code(), "mold::invalid_source");

    let err = from_value::<Player>(&json!(null)).unwrap_err();
    assert!(matches!(err.kind, MoldErrorKind::InvalidSource { found: "null" }));
}

#[test]
fn malformed_text_is_a_parse_error() {
    let err = from_str::<Player>("{\"name\": ").unwrap_err();
    assert!(matches!(err.kind, MoldErrorKind::Parse { .. }));
    assert_eq!(err.kind.code(), "mold::parse");
}

#[test]
fn integer_width_is_range_checked() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Narrow {
            level: u8,
        }
    }

    let narrow: Narrow = from_value(&json!({ "level": 200 })).unwrap();
    assert_eq!(narrow.level, 200);

    let err = from_value::<Narrow>(&json!({ "level": 300 })).unwrap_err();
    assert!(matches!(err.kind, MoldErrorKind::NumberOutOfRange { target: "u8", .. }));

    let err = from_value::<Narrow>(&json!({ "level": -1 })).unwrap_err();
    assert!(matches!(err.kind, MoldErrorKind::NumberOutOfRange { .. }));

    // Lenient decodes keep the default instead.
    let narrow: Narrow = from_value_with(&json!({ "level": 300 }), false).unwrap();
    assert_eq!(narrow.level, 0);
}

#[test]
fn fractional_numbers_never_truncate_into_integers() {
    let err = from_value::<Player>(&json!({
        "name": "ada", "score": 1.5, "online": true,
    }))
    .unwrap_err();

    assert!(matches!(
        err.kind,
        MoldErrorKind::TypeMismatch { expected: "i64", got: "number with a fractional part" }
    ));
}

#[test]
fn integers_widen_into_float_fields() {
    mold_json::mold! {
        #[derive(Debug, PartialEq)]
        struct Reading {
            celsius: f64,
        }
    }

    let reading: Reading = from_value(&json!({ "celsius": 21 })).unwrap();
    assert_eq!(reading.celsius, 21.0);

    let reading: Reading = from_value(&json!({ "celsius": 21.5 })).unwrap();
    assert_eq!(reading.celsius, 21.5);
}
