//! Error Showcase: demonstrating mold-json decode diagnostics
//!
//! Every scenario below feeds a malformed document to a strict decode and
//! prints the resulting report through miette's graphical handler.
//!
//! Run with: cargo run --example error_showcase

use miette::{GraphicalReportHandler, GraphicalTheme};
use mold_json::{Dynamic, from_str};
use serde_json::json;

mold_json::mold! {
    #[derive(Debug)]
    pub struct Profile {
        pub age: i64,
    }
}

mold_json::mold! {
    #[derive(Debug)]
    pub struct Account {
        pub email: String,
        pub profile: Profile,
        pub scores: Vec<i64>,
        pub joined: time::OffsetDateTime,
    }
}

mold_json::mold! {
    #[derive(Debug)]
    pub struct Payload {
        pub data: Dynamic,
    }
}

fn render_error(err: &dyn miette::Diagnostic) -> String {
    let mut output = String::new();
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode());
    handler.render_report(&mut output, err).unwrap();
    output
}

fn scenario(name: &str, result: mold_json::MoldError) {
    println!();
    println!("=== {name}");
    println!("{}", render_error(&result));
}

fn main() {
    scenario(
        "type mismatch, deep in a nested record",
        from_str::<Account>(
            &json!({
                "email": "k@example.org",
                "profile": { "age": "old" },
                "scores": [],
                "joined": "2025-01-01",
            })
            .to_string(),
        )
        .unwrap_err(),
    );

    scenario(
        "missing field with a near-miss key",
        from_str::<Account>(
            &json!({
                "emial": "k@example.org",
                "profile": { "age": 3 },
                "scores": [],
                "joined": "2025-01-01",
            })
            .to_string(),
        )
        .unwrap_err(),
    );

    scenario(
        "malformed element inside a sequence",
        from_str::<Account>(
            &json!({
                "email": "k@example.org",
                "profile": { "age": 3 },
                "scores": [1, 2, "x"],
                "joined": "2025-01-01",
            })
            .to_string(),
        )
        .unwrap_err(),
    );

    scenario(
        "unparseable date",
        from_str::<Account>(
            &json!({
                "email": "k@example.org",
                "profile": { "age": 3 },
                "scores": [],
                "joined": "soonish",
            })
            .to_string(),
        )
        .unwrap_err(),
    );

    scenario(
        "null default without a declared type",
        from_str::<Payload>(&json!({ "data": { "x": 1 } }).to_string()).unwrap_err(),
    );

    scenario(
        "source is not an object",
        from_str::<Account>("[1, 2, 3]").unwrap_err(),
    );

    scenario(
        "input is not JSON at all",
        from_str::<Account>("{ nope").unwrap_err(),
    );
}
