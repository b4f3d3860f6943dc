//! Recursive encoder from typed model instances to plain JSON values.

use log::trace;
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;

use crate::model::{Mold, Scalar, Shape};

/// Flatten a typed instance into a plain JSON value.
///
/// Total over anything [`from_value`](crate::from_value) can produce:
/// scalars copy, sequences and sets flatten to arrays, keyed collections to
/// objects, dates to their RFC 3339 string, records recurse over their
/// registered fields, empty slots encode as `null`. Reading never mutates
/// the instance, so encoding twice yields structurally equal values.
pub fn to_value(value: &dyn Mold) -> Value {
    trace!("to_value: {}", value.type_name());
    match value.shape() {
        Shape::Scalar(scalar) => scalar_to_value(scalar),
        Shape::Sequence(sequence) => Value::Array(sequence.iter().map(to_value).collect()),
        Shape::Set(set) => Value::Array(set.iter().map(to_value).collect()),
        Shape::Keyed(keyed) => {
            let mut entries = Map::new();
            for (key, item) in keyed.iter() {
                entries.insert(key.to_owned(), to_value(item));
            }
            Value::Object(entries)
        }
        Shape::Date(stamp) => {
            Value::String(stamp.format(&Rfc3339).unwrap_or_else(|_| stamp.to_string()))
        }
        Shape::Record(record) => {
            let mut entries = Map::new();
            for &name in record.field_names() {
                if let Some(field) = record.field(name) {
                    entries.insert(name.to_owned(), to_value(field));
                }
            }
            Value::Object(entries)
        }
        Shape::Opaque(raw) => raw.clone(),
    }
}

/// Encode a typed instance to a compact JSON string.
pub fn to_string(value: &dyn Mold) -> String {
    serde_json::to_string(&to_value(value)).unwrap()
}

/// Encode a typed instance to a pretty-printed JSON string.
pub fn to_string_pretty(value: &dyn Mold) -> String {
    serde_json::to_string_pretty(&to_value(value)).unwrap()
}

fn scalar_to_value(scalar: Scalar<'_>) -> Value {
    match scalar {
        Scalar::Bool(value) => Value::Bool(value),
        Scalar::I64(value) => Value::Number(value.into()),
        Scalar::U64(value) => Value::Number(value.into()),
        Scalar::F64(value) => serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Scalar::Str(value) => Value::String(value.to_owned()),
    }
}
