//! A schema-guided decoder and encoder between JSON values and typed Rust
//! models.
//!
//! [`from_value`] materializes a typed instance from an untyped
//! [`serde_json::Value`] tree: it constructs the target's default shape,
//! resolves a plan for each registered field (declared type plus optional
//! per-field descriptor), then validates and coerces the corresponding
//! source values into place — recursing through nested records, filling sets
//! from sequences and keyed collections from objects, and parsing RFC 3339
//! date strings. [`to_value`] is the inverse: it flattens a typed instance
//! back into a plain value tree safe for serialization.
//!
//! Strict mode (the default) raises a structured [`MoldError`] on the first
//! shape mismatch or missing field; lenient mode keeps the field's default
//! instead. A `null` source value always keeps the default, in either mode.
//! Per-field `[strict = ...]` declarations override the ambient mode.
//!
//! ```
//! use mold_json::{from_value, to_value};
//! use serde_json::json;
//!
//! mold_json::mold! {
//!     #[derive(Debug, PartialEq)]
//!     pub struct Greeting {
//!         pub who: String,
//!         pub count: i64 = 1,
//!     }
//! }
//!
//! let value = json!({ "who": "world", "count": 3 });
//! let greeting: Greeting = from_value(&value).unwrap();
//! assert_eq!(greeting.who, "world");
//! assert_eq!(greeting.count, 3);
//! assert_eq!(to_value(&greeting), value);
//! ```
//!
//! Model structs are defined with [`mold!`], which registers each field with
//! the engines and attaches the optional descriptor clauses `[type = T]`
//! (constructor for a null-defaulted [`Dynamic`] field), `[of = T]` (element
//! type for a collection with vacant element slots) and `[strict = <bool>]`.

mod deserialize;
mod macros;
mod model;
mod path;
mod plan;
mod serialize;

pub use deserialize::{
    MoldError, MoldErrorKind, Result, from_slice, from_slice_with, from_str, from_str_with,
    from_value, from_value_with,
};
pub use model::{
    Construct, Descriptor, Dynamic, Keyed, Mold, Record, Scalar, ScalarMut, Sequence, SetLike,
    Shape, ShapeMut, TypeRef,
};
pub use path::{Path, PathSegment};
pub use plan::{FieldPlan, Kind, effective_strict, plan};
pub use serialize::{to_string, to_string_pretty, to_value};
