//! Showcase: decoding typed models from JSON and flattening them back.
//!
//! Run with: cargo run --example showcase

use std::collections::HashMap;

use mold_json::{Dynamic, from_str, from_str_with, to_string_pretty};

mold_json::mold! {
    #[derive(Debug)]
    pub struct Attachment {
        pub name: String,
        pub bytes: i64,
    }
}

mold_json::mold! {
    #[derive(Debug)]
    pub struct Message {
        pub author: String,
        pub body: String,
        pub sent: time::OffsetDateTime,
        pub tags: Vec<String>,
        pub reactions: HashMap<String, i64>,
        pub attachment: Dynamic [type = Attachment],
        pub footnote: String [strict = false],
    }
}

fn main() {
    let input = r#"{
        "author": "kay",
        "body": "minutes attached",
        "sent": "2025-06-15T08:30:00Z",
        "tags": ["meeting", "notes"],
        "reactions": { "thumbsup": 2 },
        "attachment": { "name": "minutes.txt", "bytes": 2048 },
        "footnote": null
    }"#;

    let message: Message = from_str(input).expect("showcase input decodes");
    println!("decoded: {message:#?}");
    if let Some(attachment) = message.attachment.downcast_ref::<Attachment>() {
        println!("attachment: {} ({} bytes)", attachment.name, attachment.bytes);
    }
    println!();
    println!("re-encoded:\n{}", to_string_pretty(&message));

    // The same document with a wrong shape in a lenient decode: the bad
    // field keeps its default and everything else still lands.
    let sloppy = r#"{
        "author": "kay",
        "body": "minutes attached",
        "sent": "not a date",
        "tags": ["meeting"],
        "reactions": {},
        "attachment": null
    }"#;

    let message: Message = from_str_with(sloppy, false).expect("lenient decode tolerates shape drift");
    println!();
    println!("lenient decode kept the default timestamp: {}", message.sent);
}
