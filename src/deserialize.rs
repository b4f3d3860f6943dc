//! Recursive decoder from plain JSON values into typed model instances.

use core::fmt::{self, Display};

use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::model::{Construct, Descriptor, Mold, Record, ScalarMut, Shape, ShapeMut, TypeRef};
use crate::path::{Path, PathSegment};
use crate::plan::{Kind, effective_strict, plan};

/// Maximum decode nesting depth before [`MoldErrorKind::RecursionLimit`].
const MAX_DEPTH: usize = 128;

/// Find the source key closest to a wanted field name.
/// Returns Some(key) if a match with similarity >= 0.6 is found.
fn find_similar_key<'a>(
    wanted: &str,
    available: impl Iterator<Item = &'a String>,
) -> Option<String> {
    let mut best_match: Option<(&'a str, f64)> = None;

    for candidate in available {
        let similarity = strsim::jaro_winkler(wanted, candidate);
        if similarity >= 0.6 {
            if best_match.is_none_or(|(_, best_sim)| similarity > best_sim) {
                best_match = Some((candidate, similarity));
            }
        }
    }

    best_match.map(|(key, _)| key.to_owned())
}

/// JSON kind label for error messages.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error type for decoding.
#[derive(Debug)]
pub struct MoldError {
    /// The specific kind of error
    pub kind: MoldErrorKind,
    /// Where in the source value the error occurred
    pub path: Path,
}

impl Display for MoldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.path.is_root() {
            write!(f, " at {}", self.path)?;
        }
        Ok(())
    }
}

impl std::error::Error for MoldError {}

impl miette::Diagnostic for MoldError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        match &self.kind {
            MoldErrorKind::MissingField {
                suggestion: Some(suggestion),
                ..
            } => Some(Box::new(format!(
                "the source has a similarly named key `{suggestion}`"
            ))),
            MoldErrorKind::UntypedNull { field, .. } => Some(Box::new(format!(
                "declare `[type = ...]` on `{field}` so its null default can be constructed"
            ))),
            _ => None,
        }
    }
}

/// Specific error kinds for decoding
#[derive(Debug)]
pub enum MoldErrorKind {
    /// Top-level source value was not object-shaped
    InvalidSource {
        /// JSON kind of the value that was supplied instead
        found: &'static str,
    },
    /// A null-defaulted field with no declared type to construct
    UntypedNull {
        /// The record declaring the field
        record: &'static str,
        /// The field whose default is null
        field: &'static str,
    },
    /// A declared type does not fit the slot it was built for
    TypeRefMismatch {
        /// Type the descriptor constructed
        declared: &'static str,
        /// Type of the slot that rejected it
        slot: &'static str,
    },
    /// A required field is absent from the source mapping
    MissingField {
        /// The record declaring the field
        record: &'static str,
        /// The name of the missing field
        field: &'static str,
        /// A similarly named source key, if one exists
        suggestion: Option<String>,
    },
    /// Shape disagreement between a source value and its target
    TypeMismatch {
        /// The expected shape
        expected: &'static str,
        /// The actual shape found
        got: &'static str,
    },
    /// Number does not fit the target integer width
    NumberOutOfRange {
        /// The numeric value that was out of range
        value: String,
        /// The target type that couldn't hold the value
        target: &'static str,
    },
    /// A date string that does not parse
    InvalidDate {
        /// The string that failed to parse
        input: String,
        /// Why the parse failed
        message: String,
    },
    /// Source nesting exceeded the decode depth cap
    RecursionLimit {
        /// The depth cap that was hit
        limit: usize,
    },
    /// The text layer could not parse the input as JSON
    Parse {
        /// The parser's own message
        message: String,
    },
}

impl Display for MoldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoldErrorKind::InvalidSource { found } => {
                write!(f, "invalid source: expected an object, got {found}")
            }
            MoldErrorKind::UntypedNull { record, field } => {
                write!(
                    f,
                    "field `{field}` of `{record}` defaults to null and declares no type"
                )
            }
            MoldErrorKind::TypeRefMismatch { declared, slot } => {
                write!(f, "declared type `{declared}` does not fit a `{slot}` slot")
            }
            MoldErrorKind::MissingField { record, field, .. } => {
                write!(f, "missing required field `{field}` of `{record}`")
            }
            MoldErrorKind::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {expected}, got {got}")
            }
            MoldErrorKind::NumberOutOfRange { value, target } => {
                write!(f, "number `{value}` out of range for {target}")
            }
            MoldErrorKind::InvalidDate { input, message } => {
                write!(f, "invalid date `{input}`: {message}")
            }
            MoldErrorKind::RecursionLimit { limit } => {
                write!(f, "decode exceeded {limit} levels of nesting")
            }
            MoldErrorKind::Parse { message } => {
                write!(f, "invalid JSON: {message}")
            }
        }
    }
}

impl MoldErrorKind {
    /// Get a diagnostic code for this kind of error.
    ///
    /// Codes group the fine-grained kinds into coarse failure families:
    /// `mold::invalid_source`, `mold::invalid_target`, `mold::invalid_type`,
    /// plus `mold::recursion_limit` and `mold::parse` for the two conditions
    /// outside the decode taxonomy proper.
    pub fn code(&self) -> &'static str {
        match self {
            MoldErrorKind::InvalidSource { .. } => "mold::invalid_source",
            MoldErrorKind::UntypedNull { .. } | MoldErrorKind::TypeRefMismatch { .. } => {
                "mold::invalid_target"
            }
            MoldErrorKind::MissingField { .. }
            | MoldErrorKind::TypeMismatch { .. }
            | MoldErrorKind::NumberOutOfRange { .. }
            | MoldErrorKind::InvalidDate { .. } => "mold::invalid_type",
            MoldErrorKind::RecursionLimit { .. } => "mold::recursion_limit",
            MoldErrorKind::Parse { .. } => "mold::parse",
        }
    }
}

/// Result type for decoding
pub type Result<T> = core::result::Result<T, MoldError>;

// ============================================================================
// Entry Points
// ============================================================================

/// Decode a typed instance from a JSON value, strictly.
///
/// Shape mismatches and missing fields raise; a `null` source value always
/// keeps the field's default. Use [`from_value_with`] to decode leniently.
pub fn from_value<T: Record + Construct>(source: &Value) -> Result<T> {
    from_value_with(source, true)
}

/// Decode a typed instance from a JSON value with an explicit strictness
/// mode. Per-field `[strict = ...]` declarations override the ambient mode.
pub fn from_value_with<T: Record + Construct>(source: &Value, strict: bool) -> Result<T> {
    let Value::Object(entries) = source else {
        return Err(MoldError {
            kind: MoldErrorKind::InvalidSource {
                found: json_kind(source),
            },
            path: Path::root(),
        });
    };
    let mut instance = T::construct();
    let mut decoder = Decoder::new();
    decoder.decode_record(&mut instance, entries, strict)?;
    Ok(instance)
}

/// Parse a JSON string and decode it strictly.
pub fn from_str<T: Record + Construct>(input: &str) -> Result<T> {
    from_str_with(input, true)
}

/// Parse a JSON string and decode it with an explicit strictness mode.
pub fn from_str_with<T: Record + Construct>(input: &str, strict: bool) -> Result<T> {
    let value: Value = serde_json::from_str(input).map_err(parse_error)?;
    from_value_with(&value, strict)
}

/// Parse JSON bytes and decode them strictly.
pub fn from_slice<T: Record + Construct>(input: &[u8]) -> Result<T> {
    from_slice_with(input, true)
}

/// Parse JSON bytes and decode them with an explicit strictness mode.
pub fn from_slice_with<T: Record + Construct>(input: &[u8], strict: bool) -> Result<T> {
    let value: Value = serde_json::from_slice(input).map_err(parse_error)?;
    from_value_with(&value, strict)
}

fn parse_error(error: serde_json::Error) -> MoldError {
    MoldError {
        kind: MoldErrorKind::Parse {
            message: error.to_string(),
        },
        path: Path::root(),
    }
}

// ============================================================================
// Decoder
// ============================================================================

/// Recursive decoder. One per top-level call: tracks the value path for
/// diagnostics and the nesting depth for the recursion guard.
struct Decoder {
    path: Path,
    depth: usize,
}

impl Decoder {
    fn new() -> Self {
        Decoder {
            path: Path::root(),
            depth: 0,
        }
    }

    fn err(&self, kind: MoldErrorKind) -> MoldError {
        MoldError {
            kind,
            path: self.path.clone(),
        }
    }

    /// Shape-mismatch outcome: raise when enforcing, keep the target
    /// untouched otherwise.
    fn mismatch(&self, expected: &'static str, got: &Value, enforce: bool) -> Result<bool> {
        if enforce {
            Err(self.err(MoldErrorKind::TypeMismatch {
                expected,
                got: json_kind(got),
            }))
        } else {
            Ok(false)
        }
    }

    /// Decode every registered field of `record` from the source mapping.
    fn decode_record(
        &mut self,
        record: &mut dyn Record,
        source: &Map<String, Value>,
        ambient: bool,
    ) -> Result<()> {
        let record_name = record.record_name();
        log::trace!("decode_record: {record_name}");

        if log::log_enabled!(log::Level::Trace) {
            for key in source.keys() {
                if !record.field_names().contains(&key.as_str()) {
                    log::trace!("ignoring unknown key `{key}` for {record_name}");
                }
            }
        }

        for &name in record.field_names() {
            let descriptor = record.descriptor(name);
            let Some(field) = record.field_mut(name) else {
                continue;
            };
            self.path.push(PathSegment::Field(name));
            let outcome = self.decode_field(record_name, name, field, &descriptor, source, ambient);
            self.path.pop();
            outcome?;
        }
        Ok(())
    }

    /// Decode one field: resolve its plan, then validate/coerce the
    /// corresponding source value into it.
    fn decode_field(
        &mut self,
        record_name: &'static str,
        name: &'static str,
        field: &mut dyn Mold,
        descriptor: &Descriptor,
        source: &Map<String, Value>,
        ambient: bool,
    ) -> Result<()> {
        let throwable = effective_strict(ambient, descriptor);

        if field.is_null() {
            // A null default carries no shape of its own. Only the
            // descriptor (or, for Option<T>, the statically known inner
            // type) can say what to build.
            let placeholder = match descriptor.ty {
                Some(ty) => Some(ty.construct()),
                None => field.null_placeholder(),
            };
            let Some(mut placeholder) = placeholder else {
                if throwable {
                    return Err(self.err(MoldErrorKind::UntypedNull {
                        record: record_name,
                        field: name,
                    }));
                }
                return Ok(());
            };
            let Some(source_value) = source.get(name) else {
                return self.missing_field(record_name, name, source, throwable);
            };
            if source_value.is_null() {
                return Ok(());
            }
            let field_plan = plan(&*placeholder, descriptor, ambient);
            log::trace!(
                "decode_field: {record_name}.{name} (null default) as {:?}",
                field_plan.kind
            );
            let wrote = self.decode_value(
                &mut *placeholder,
                source_value,
                field_plan.element,
                field_plan.throwable,
                field_plan.throwable,
            )?;
            if wrote {
                let declared = placeholder.type_name();
                if !field.set_boxed(placeholder) && throwable {
                    return Err(self.err(MoldErrorKind::TypeRefMismatch {
                        declared,
                        slot: field.type_name(),
                    }));
                }
            }
            return Ok(());
        }

        let field_plan = plan(&*field, descriptor, ambient);
        log::trace!(
            "decode_field: {record_name}.{name} as {:?}, strict={}",
            field_plan.kind,
            field_plan.throwable
        );

        let Some(source_value) = source.get(name) else {
            return self.missing_field(record_name, name, source, throwable);
        };
        if source_value.is_null() {
            // Null means "no update", independent of strictness. Missing
            // fields are handled above and do obey strictness.
            return Ok(());
        }
        self.decode_value(
            field,
            source_value,
            field_plan.element,
            field_plan.throwable,
            field_plan.throwable,
        )
        .map(|_| ())
    }

    fn missing_field(
        &self,
        record: &'static str,
        field: &'static str,
        source: &Map<String, Value>,
        throwable: bool,
    ) -> Result<()> {
        if !throwable {
            log::trace!("missing field {record}.{field}, keeping default");
            return Ok(());
        }
        let suggestion = find_similar_key(field, source.keys());
        Err(self.err(MoldErrorKind::MissingField {
            record,
            field,
            suggestion,
        }))
    }

    /// Validate/coerce one source value into one target slot.
    ///
    /// `throwable` is the ambient mode handed to nested records; `enforce`
    /// decides whether a shape mismatch on this very slot raises or leaves
    /// the slot untouched (element slots always enforce). Returns whether
    /// the slot was written.
    fn decode_value(
        &mut self,
        target: &mut dyn Mold,
        source: &Value,
        element: Option<TypeRef>,
        throwable: bool,
        enforce: bool,
    ) -> Result<bool> {
        if self.depth >= MAX_DEPTH {
            return Err(self.err(MoldErrorKind::RecursionLimit { limit: MAX_DEPTH }));
        }
        self.depth += 1;
        let outcome = self.decode_value_inner(target, source, element, throwable, enforce);
        self.depth -= 1;
        outcome
    }

    fn decode_value_inner(
        &mut self,
        target: &mut dyn Mold,
        source: &Value,
        element: Option<TypeRef>,
        throwable: bool,
        enforce: bool,
    ) -> Result<bool> {
        let target_name = target.type_name();
        match target.shape_mut() {
            ShapeMut::Scalar(slot) => self.decode_scalar(slot, source, enforce),
            ShapeMut::Date(slot) => self.decode_date(slot, source, enforce),
            ShapeMut::Sequence(sequence) => {
                let Value::Array(items) = source else {
                    return self.mismatch(Kind::Sequence.label(), source, enforce);
                };
                log::trace!("decode sequence: {} items into {target_name}", items.len());
                for (index, item) in items.iter().enumerate() {
                    self.path.push(PathSegment::Index(index));
                    let decoded =
                        self.coerce_element(sequence.element_default(), element, item, throwable)?;
                    let declared = decoded.type_name();
                    if !sequence.push(decoded) {
                        return Err(self.err(MoldErrorKind::TypeRefMismatch {
                            declared,
                            slot: target_name,
                        }));
                    }
                    self.path.pop();
                }
                Ok(true)
            }
            ShapeMut::Set(set) => {
                // Sets fill from sequences; the source must still be an array.
                let Value::Array(items) = source else {
                    return self.mismatch(Kind::Set.label(), source, enforce);
                };
                log::trace!("decode set: {} items into {target_name}", items.len());
                for (index, item) in items.iter().enumerate() {
                    self.path.push(PathSegment::Index(index));
                    let decoded =
                        self.coerce_element(set.element_default(), element, item, throwable)?;
                    let declared = decoded.type_name();
                    if !set.insert(decoded) {
                        return Err(self.err(MoldErrorKind::TypeRefMismatch {
                            declared,
                            slot: target_name,
                        }));
                    }
                    self.path.pop();
                }
                Ok(true)
            }
            ShapeMut::Keyed(keyed) => {
                let entries = match source {
                    Value::Object(entries) => entries,
                    other => return self.mismatch(Kind::Keyed.label(), other, enforce),
                };
                log::trace!("decode keyed: {} entries into {target_name}", entries.len());
                for (key, item) in entries {
                    self.path.push(PathSegment::Key(key.clone()));
                    let decoded =
                        self.coerce_element(keyed.element_default(), element, item, throwable)?;
                    let declared = decoded.type_name();
                    if !keyed.insert(key.clone(), decoded) {
                        return Err(self.err(MoldErrorKind::TypeRefMismatch {
                            declared,
                            slot: target_name,
                        }));
                    }
                    self.path.pop();
                }
                Ok(true)
            }
            ShapeMut::Record(record) => {
                let Value::Object(entries) = source else {
                    return self.mismatch(Kind::Record.label(), source, enforce);
                };
                // The field's own mode becomes the nested ambient mode.
                self.decode_record(record, entries, throwable)?;
                Ok(true)
            }
            ShapeMut::Opaque(slot) => {
                if matches!(source, Value::Object(_) | Value::Array(_)) {
                    *slot = source.clone();
                    Ok(true)
                } else {
                    self.mismatch(Kind::Opaque.label(), source, enforce)
                }
            }
        }
    }

    /// Coerce one collection element.
    ///
    /// Untyped slots (`Value`, `Dynamic` without `of`) pass the raw source
    /// value through unconverted. Typed slots enforce their shape
    /// unconditionally: a malformed element cannot be repaired by keeping a
    /// prior value that does not exist. Declared element types never coerce
    /// primitives; nested records recurse with the field's mode as their
    /// ambient mode.
    fn coerce_element(
        &mut self,
        mut slot: Box<dyn Mold>,
        element: Option<TypeRef>,
        source: &Value,
        throwable: bool,
    ) -> Result<Box<dyn Mold>> {
        if slot.is_null() {
            let typed = match element {
                Some(ty) => Some(ty.construct()),
                None => slot.null_placeholder(),
            };
            let payload: Box<dyn Mold> = match typed {
                Some(mut inner) => {
                    if matches!(inner.shape(), Shape::Date(_)) {
                        self.decode_value(&mut *inner, source, None, true, true)?;
                        inner
                    } else if !source.is_object() && !source.is_array() {
                        // Declared element types never coerce primitives.
                        Box::new(source.clone())
                    } else {
                        self.decode_value(&mut *inner, source, None, throwable, true)?;
                        inner
                    }
                }
                None => Box::new(source.clone()),
            };
            let declared = payload.type_name();
            if !slot.set_boxed(payload) {
                return Err(self.err(MoldErrorKind::TypeRefMismatch {
                    declared,
                    slot: slot.type_name(),
                }));
            }
            return Ok(slot);
        }
        self.decode_value(&mut *slot, source, None, throwable, true)?;
        Ok(slot)
    }

    fn decode_scalar(
        &mut self,
        slot: ScalarMut<'_>,
        source: &Value,
        enforce: bool,
    ) -> Result<bool> {
        match slot {
            ScalarMut::Bool(slot) => match source {
                Value::Bool(value) => {
                    *slot = *value;
                    Ok(true)
                }
                other => self.mismatch("boolean", other, enforce),
            },
            ScalarMut::Str(slot) => match source {
                Value::String(value) => {
                    *slot = value.clone();
                    Ok(true)
                }
                other => self.mismatch("string", other, enforce),
            },
            ScalarMut::F32(slot) => match source {
                Value::Number(number) => {
                    *slot = number.as_f64().unwrap_or(f64::NAN) as f32;
                    Ok(true)
                }
                other => self.mismatch("number", other, enforce),
            },
            ScalarMut::F64(slot) => match source {
                Value::Number(number) => {
                    *slot = number.as_f64().unwrap_or(f64::NAN);
                    Ok(true)
                }
                other => self.mismatch("number", other, enforce),
            },
            ScalarMut::I8(slot) => self.decode_int(slot, source, "i8", enforce),
            ScalarMut::I16(slot) => self.decode_int(slot, source, "i16", enforce),
            ScalarMut::I32(slot) => self.decode_int(slot, source, "i32", enforce),
            ScalarMut::I64(slot) => self.decode_int(slot, source, "i64", enforce),
            ScalarMut::ISize(slot) => self.decode_int(slot, source, "isize", enforce),
            ScalarMut::U8(slot) => self.decode_int(slot, source, "u8", enforce),
            ScalarMut::U16(slot) => self.decode_int(slot, source, "u16", enforce),
            ScalarMut::U32(slot) => self.decode_int(slot, source, "u32", enforce),
            ScalarMut::U64(slot) => self.decode_int(slot, source, "u64", enforce),
            ScalarMut::USize(slot) => self.decode_int(slot, source, "usize", enforce),
        }
    }

    fn decode_int<T>(
        &mut self,
        slot: &mut T,
        source: &Value,
        target: &'static str,
        enforce: bool,
    ) -> Result<bool>
    where
        T: TryFrom<i64> + TryFrom<u64>,
    {
        let number = match source {
            Value::Number(number) => number,
            other => return self.mismatch("number", other, enforce),
        };
        if let Some(value) = number.as_i64() {
            match T::try_from(value) {
                Ok(value) => {
                    *slot = value;
                    Ok(true)
                }
                Err(_) => self.out_of_range(number, target, enforce),
            }
        } else if let Some(value) = number.as_u64() {
            match T::try_from(value) {
                Ok(value) => {
                    *slot = value;
                    Ok(true)
                }
                Err(_) => self.out_of_range(number, target, enforce),
            }
        } else {
            let float = number.as_f64().unwrap_or(f64::NAN);
            if float.is_finite() && float.fract() == 0.0 {
                // Integral floats (2.0, 1e3) still land in integer slots.
                if float >= i64::MIN as f64 && float <= i64::MAX as f64 {
                    match T::try_from(float as i64) {
                        Ok(value) => {
                            *slot = value;
                            return Ok(true);
                        }
                        Err(_) => return self.out_of_range(number, target, enforce),
                    }
                }
                return self.out_of_range(number, target, enforce);
            }
            if enforce {
                Err(self.err(MoldErrorKind::TypeMismatch {
                    expected: target,
                    got: "number with a fractional part",
                }))
            } else {
                Ok(false)
            }
        }
    }

    fn out_of_range(
        &self,
        number: &serde_json::Number,
        target: &'static str,
        enforce: bool,
    ) -> Result<bool> {
        if enforce {
            Err(self.err(MoldErrorKind::NumberOutOfRange {
                value: number.to_string(),
                target,
            }))
        } else {
            Ok(false)
        }
    }

    fn decode_date(
        &mut self,
        slot: &mut OffsetDateTime,
        source: &Value,
        enforce: bool,
    ) -> Result<bool> {
        let text = match source {
            Value::String(text) => text,
            other => return self.mismatch(Kind::Date.label(), other, enforce),
        };
        match parse_timestamp(text) {
            Ok(stamp) => {
                *slot = stamp;
                Ok(true)
            }
            Err(message) => {
                if enforce {
                    Err(self.err(MoldErrorKind::InvalidDate {
                        input: text.clone(),
                        message,
                    }))
                } else {
                    Ok(false)
                }
            }
        }
    }
}

/// Parse an RFC 3339 timestamp, falling back to a bare calendar date taken
/// as midnight UTC.
fn parse_timestamp(text: &str) -> core::result::Result<OffsetDateTime, String> {
    if let Ok(stamp) = OffsetDateTime::parse(text, &Rfc3339) {
        return Ok(stamp);
    }
    time::Date::parse(
        text,
        time::macros::format_description!("[year]-[month]-[day]"),
    )
    .map(|date| date.midnight().assume_utc())
    .map_err(|error| error.to_string())
}
