//! Field-plan resolution.
//!
//! A field's plan is computed once, from its current value's shape tag plus
//! its [`Descriptor`], before any source value is inspected. Resolution never
//! fails: an undeclared field simply resolves everything from its value.

use crate::model::{Descriptor, Mold, Shape, TypeRef};

/// The tagged kind of a field plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Scalar,
    Sequence,
    Set,
    Keyed,
    Date,
    Record,
    Opaque,
}

impl Kind {
    pub fn of(shape: &Shape<'_>) -> Kind {
        match shape {
            Shape::Scalar(_) => Kind::Scalar,
            Shape::Sequence(_) => Kind::Sequence,
            Shape::Set(_) => Kind::Set,
            Shape::Keyed(_) => Kind::Keyed,
            Shape::Date(_) => Kind::Date,
            Shape::Record(_) => Kind::Record,
            Shape::Opaque(_) => Kind::Opaque,
        }
    }

    /// Label used in shape-mismatch messages.
    pub fn label(self) -> &'static str {
        match self {
            Kind::Scalar => "scalar",
            Kind::Sequence => "sequence",
            Kind::Set => "sequence",
            Kind::Keyed => "keyed object",
            Kind::Date => "date string",
            Kind::Record => "object",
            Kind::Opaque => "structured value",
        }
    }
}

/// A field's resolved decode plan.
#[derive(Debug, Clone, Copy)]
pub struct FieldPlan {
    pub kind: Kind,
    /// Element type for collection fields, from the descriptor's `of`.
    pub element: Option<TypeRef>,
    /// Whether violations on this field raise, after applying the per-field
    /// override to the ambient mode.
    pub throwable: bool,
}

/// Resolve the plan for one field from its current value and descriptor.
pub fn plan(field: &dyn Mold, descriptor: &Descriptor, ambient: bool) -> FieldPlan {
    FieldPlan {
        kind: Kind::of(&field.shape()),
        element: descriptor.of,
        throwable: effective_strict(ambient, descriptor),
    }
}

/// Per-field strictness always wins over the ambient flag.
pub fn effective_strict(ambient: bool, descriptor: &Descriptor) -> bool {
    descriptor.strict.unwrap_or(ambient)
}
