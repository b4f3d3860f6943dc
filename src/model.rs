//! The model layer: tagged shape access, field enumeration, construction.
//!
//! Everything the decode and encode engines know about a value flows through
//! [`Mold`]: a live value exposes a tagged view of itself ([`Shape`] /
//! [`ShapeMut`]), and the engines dispatch on the tag instead of probing
//! concrete types. Model structs additionally implement [`Record`] (field
//! enumeration plus per-field [`Descriptor`] lookup), usually through the
//! [`mold!`](crate::mold) macro.

use core::any::Any;
use core::fmt;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use serde_json::Value;
use time::OffsetDateTime;

static NULL: Value = Value::Null;

/// A value the engines can traverse.
///
/// Implemented for the supported field types (primitives, `String`,
/// collections, `OffsetDateTime`, `Value`, `Option<T>`, [`Dynamic`]) and for
/// every model struct defined with [`mold!`](crate::mold).
pub trait Mold: Any {
    /// Short type name used in error messages and tracing.
    fn type_name(&self) -> &'static str;

    /// Read-only tagged view of the value.
    fn shape(&self) -> Shape<'_>;

    /// Mutable tagged view of the value.
    fn shape_mut(&mut self) -> ShapeMut<'_>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// True when the value currently holds nothing a shape can be read from.
    fn is_null(&self) -> bool {
        false
    }

    /// A freshly constructed inner value for null slots whose type is
    /// statically known. `None` when only a descriptor can supply the type.
    fn null_placeholder(&self) -> Option<Box<dyn Mold>> {
        None
    }

    /// Install a decoded value into a null slot. Returns `false` when the
    /// value's type does not fit.
    fn set_boxed(&mut self, value: Box<dyn Mold>) -> bool {
        let _ = value;
        false
    }
}

/// Read-only tagged view over a [`Mold`] value.
pub enum Shape<'a> {
    Scalar(Scalar<'a>),
    Sequence(&'a dyn Sequence),
    Set(&'a dyn SetLike),
    Keyed(&'a dyn Keyed),
    Date(&'a OffsetDateTime),
    Record(&'a dyn Record),
    Opaque(&'a Value),
}

/// Mutable tagged view over a [`Mold`] value.
pub enum ShapeMut<'a> {
    Scalar(ScalarMut<'a>),
    Sequence(&'a mut dyn Sequence),
    Set(&'a mut dyn SetLike),
    Keyed(&'a mut dyn Keyed),
    Date(&'a mut OffsetDateTime),
    Record(&'a mut dyn Record),
    Opaque(&'a mut Value),
}

/// A primitive value read out of a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(&'a str),
}

/// A mutable primitive slot. Width-preserving so numbers can be
/// range-checked against the exact target type.
pub enum ScalarMut<'a> {
    Bool(&'a mut bool),
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    ISize(&'a mut isize),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    USize(&'a mut usize),
    F32(&'a mut f32),
    F64(&'a mut f64),
    Str(&'a mut String),
}

/// Sequence access (`Vec<T>`).
pub trait Sequence {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Mold> + '_>;

    /// A freshly constructed element, used to resolve the element plan.
    fn element_default(&self) -> Box<dyn Mold>;

    /// Append an element; `false` when the element's type does not fit.
    fn push(&mut self, element: Box<dyn Mold>) -> bool;
}

/// Set access (`HashSet<T>`, `BTreeSet<T>`). Sets fill from sequences.
pub trait SetLike {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Mold> + '_>;

    fn element_default(&self) -> Box<dyn Mold>;

    /// Insert an element; `false` when the element's type does not fit.
    /// Duplicates are accepted and collapse silently.
    fn insert(&mut self, element: Box<dyn Mold>) -> bool;
}

/// Keyed-collection access (`HashMap<String, T>`, `BTreeMap<String, T>`).
pub trait Keyed {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&str, &dyn Mold)> + '_>;

    fn element_default(&self) -> Box<dyn Mold>;

    /// Insert an entry; `false` when the value's type does not fit.
    fn insert(&mut self, key: String, value: Box<dyn Mold>) -> bool;
}

/// Field enumeration and schema lookup for model structs.
pub trait Record {
    fn record_name(&self) -> &'static str;

    /// The fields visible to both engines, in declaration order. Anything
    /// not listed here is permanently invisible to decode and encode.
    fn field_names(&self) -> &'static [&'static str];

    fn field(&self, name: &str) -> Option<&dyn Mold>;

    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Mold>;

    /// Per-field descriptor; empty when the field declares none.
    fn descriptor(&self, name: &str) -> Descriptor {
        let _ = name;
        Descriptor::EMPTY
    }
}

/// Zero-argument construction for model values.
pub trait Construct: Mold + Sized {
    fn construct() -> Self;
}

/// A named zero-argument constructor for a model type.
#[derive(Clone, Copy)]
pub struct TypeRef {
    name: &'static str,
    make: fn() -> Box<dyn Mold>,
}

impl TypeRef {
    pub fn of<T: Construct>() -> TypeRef {
        TypeRef {
            name: core::any::type_name::<T>(),
            make: || Box::new(T::construct()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn construct(&self) -> Box<dyn Mold> {
        (self.make)()
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.name)
    }
}

/// Per-field schema override: expected type, element type, strictness.
///
/// `ty` is mandatory for fields whose default is null ([`Dynamic`]); `of`
/// declares the element type for collections whose element slots are vacant;
/// `strict` overrides the ambient strictness for this field only.
#[derive(Clone, Copy, Debug, Default)]
pub struct Descriptor {
    pub ty: Option<TypeRef>,
    pub of: Option<TypeRef>,
    pub strict: Option<bool>,
}

impl Descriptor {
    pub const EMPTY: Descriptor = Descriptor {
        ty: None,
        of: None,
        strict: None,
    };

    pub fn typed(mut self, ty: TypeRef) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn of(mut self, element: TypeRef) -> Self {
        self.of = Some(element);
        self
    }

    pub fn strict(mut self, on: bool) -> Self {
        self.strict = Some(on);
        self
    }
}

/// A slot whose default is null and whose type is supplied by a descriptor.
///
/// The one field shape that cannot resolve a plan from its declared type:
/// decoding an empty `Dynamic` requires a `[type = ...]` descriptor clause
/// (or, for collection elements, an `[of = ...]` clause); without one the
/// raw source value passes through untyped.
pub struct Dynamic(Option<Box<dyn Mold>>);

impl Dynamic {
    pub fn empty() -> Self {
        Dynamic(None)
    }

    pub fn holding<T: Mold>(value: T) -> Self {
        Dynamic(Some(Box::new(value)))
    }

    pub fn get(&self) -> Option<&dyn Mold> {
        self.0.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn downcast_ref<T: Mold>(&self) -> Option<&T> {
        self.0
            .as_deref()
            .and_then(|inner| inner.as_any().downcast_ref::<T>())
    }
}

impl Default for Dynamic {
    fn default() -> Self {
        Dynamic(None)
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(inner) => write!(f, "Dynamic({})", inner.type_name()),
            None => write!(f, "Dynamic(null)"),
        }
    }
}

impl Mold for Dynamic {
    fn type_name(&self) -> &'static str {
        "Dynamic"
    }

    fn shape(&self) -> Shape<'_> {
        match &self.0 {
            Some(inner) => inner.shape(),
            None => Shape::Opaque(&NULL),
        }
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        let inner = self.0.get_or_insert_with(|| Box::new(Value::Null));
        inner.shape_mut()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn is_null(&self) -> bool {
        self.0.as_ref().is_none_or(|inner| inner.is_null())
    }

    fn set_boxed(&mut self, value: Box<dyn Mold>) -> bool {
        self.0 = Some(value);
        true
    }
}

impl Construct for Dynamic {
    fn construct() -> Self {
        Dynamic(None)
    }
}

// ============================================================================
// Implementations for the supported field types
// ============================================================================

impl Mold for Value {
    fn type_name(&self) -> &'static str {
        "Value"
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Opaque(self)
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Opaque(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn set_boxed(&mut self, value: Box<dyn Mold>) -> bool {
        match value.into_any().downcast::<Value>() {
            Ok(inner) => {
                *self = *inner;
                true
            }
            Err(_) => false,
        }
    }
}

impl Construct for Value {
    fn construct() -> Self {
        Value::Null
    }
}

impl Mold for OffsetDateTime {
    fn type_name(&self) -> &'static str {
        "OffsetDateTime"
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Date(self)
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Date(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Construct for OffsetDateTime {
    fn construct() -> Self {
        OffsetDateTime::UNIX_EPOCH
    }
}

impl Mold for bool {
    fn type_name(&self) -> &'static str {
        "bool"
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Scalar(Scalar::Bool(*self))
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Scalar(ScalarMut::Bool(self))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Construct for bool {
    fn construct() -> Self {
        false
    }
}

impl Mold for String {
    fn type_name(&self) -> &'static str {
        "String"
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Scalar(Scalar::Str(self.as_str()))
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Scalar(ScalarMut::Str(self))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Construct for String {
    fn construct() -> Self {
        String::new()
    }
}

macro_rules! int_mold {
    ($($ty:ty => $slot:ident, $read:ident;)*) => {$(
        impl Mold for $ty {
            fn type_name(&self) -> &'static str {
                stringify!($ty)
            }

            fn shape(&self) -> Shape<'_> {
                Shape::Scalar(Scalar::$read(*self as _))
            }

            fn shape_mut(&mut self) -> ShapeMut<'_> {
                ShapeMut::Scalar(ScalarMut::$slot(self))
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn Any> {
                self
            }
        }

        impl Construct for $ty {
            fn construct() -> Self {
                0
            }
        }
    )*};
}

int_mold! {
    i8 => I8, I64;
    i16 => I16, I64;
    i32 => I32, I64;
    i64 => I64, I64;
    isize => ISize, I64;
    u8 => U8, U64;
    u16 => U16, U64;
    u32 => U32, U64;
    u64 => U64, U64;
    usize => USize, U64;
}

macro_rules! float_mold {
    ($($ty:ty => $slot:ident;)*) => {$(
        impl Mold for $ty {
            fn type_name(&self) -> &'static str {
                stringify!($ty)
            }

            fn shape(&self) -> Shape<'_> {
                Shape::Scalar(Scalar::F64(*self as f64))
            }

            fn shape_mut(&mut self) -> ShapeMut<'_> {
                ShapeMut::Scalar(ScalarMut::$slot(self))
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn Any> {
                self
            }
        }

        impl Construct for $ty {
            fn construct() -> Self {
                0.0
            }
        }
    )*};
}

float_mold! {
    f32 => F32;
    f64 => F64;
}

impl<T: Construct> Mold for Option<T> {
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    fn shape(&self) -> Shape<'_> {
        match self {
            Some(inner) => inner.shape(),
            None => Shape::Opaque(&NULL),
        }
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        let inner = self.get_or_insert_with(T::construct);
        inner.shape_mut()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn is_null(&self) -> bool {
        self.is_none()
    }

    fn null_placeholder(&self) -> Option<Box<dyn Mold>> {
        Some(Box::new(T::construct()))
    }

    fn set_boxed(&mut self, value: Box<dyn Mold>) -> bool {
        match value.into_any().downcast::<T>() {
            Ok(inner) => {
                *self = Some(*inner);
                true
            }
            Err(_) => false,
        }
    }
}

impl<T: Construct> Construct for Option<T> {
    fn construct() -> Self {
        None
    }
}

impl<T: Construct> Mold for Vec<T> {
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Sequence(self)
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Sequence(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl<T: Construct> Sequence for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Mold> + '_> {
        Box::new(self.as_slice().iter().map(|item| item as &dyn Mold))
    }

    fn element_default(&self) -> Box<dyn Mold> {
        Box::new(T::construct())
    }

    fn push(&mut self, element: Box<dyn Mold>) -> bool {
        match element.into_any().downcast::<T>() {
            Ok(item) => {
                Vec::push(self, *item);
                true
            }
            Err(_) => false,
        }
    }
}

impl<T: Construct> Construct for Vec<T> {
    fn construct() -> Self {
        Vec::new()
    }
}

impl<T: Construct + Eq + Hash> Mold for HashSet<T> {
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Set(self)
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Set(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl<T: Construct + Eq + Hash> SetLike for HashSet<T> {
    fn len(&self) -> usize {
        HashSet::len(self)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Mold> + '_> {
        Box::new(HashSet::iter(self).map(|item| item as &dyn Mold))
    }

    fn element_default(&self) -> Box<dyn Mold> {
        Box::new(T::construct())
    }

    fn insert(&mut self, element: Box<dyn Mold>) -> bool {
        match element.into_any().downcast::<T>() {
            Ok(item) => {
                HashSet::insert(self, *item);
                true
            }
            Err(_) => false,
        }
    }
}

impl<T: Construct + Eq + Hash> Construct for HashSet<T> {
    fn construct() -> Self {
        HashSet::new()
    }
}

impl<T: Construct + Ord> Mold for BTreeSet<T> {
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Set(self)
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Set(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl<T: Construct + Ord> SetLike for BTreeSet<T> {
    fn len(&self) -> usize {
        BTreeSet::len(self)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Mold> + '_> {
        Box::new(BTreeSet::iter(self).map(|item| item as &dyn Mold))
    }

    fn element_default(&self) -> Box<dyn Mold> {
        Box::new(T::construct())
    }

    fn insert(&mut self, element: Box<dyn Mold>) -> bool {
        match element.into_any().downcast::<T>() {
            Ok(item) => {
                BTreeSet::insert(self, *item);
                true
            }
            Err(_) => false,
        }
    }
}

impl<T: Construct + Ord> Construct for BTreeSet<T> {
    fn construct() -> Self {
        BTreeSet::new()
    }
}

impl<T: Construct> Mold for HashMap<String, T> {
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Keyed(self)
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Keyed(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl<T: Construct> Keyed for HashMap<String, T> {
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&str, &dyn Mold)> + '_> {
        Box::new(HashMap::iter(self).map(|(key, item)| (key.as_str(), item as &dyn Mold)))
    }

    fn element_default(&self) -> Box<dyn Mold> {
        Box::new(T::construct())
    }

    fn insert(&mut self, key: String, value: Box<dyn Mold>) -> bool {
        match value.into_any().downcast::<T>() {
            Ok(item) => {
                HashMap::insert(self, key, *item);
                true
            }
            Err(_) => false,
        }
    }
}

impl<T: Construct> Construct for HashMap<String, T> {
    fn construct() -> Self {
        HashMap::new()
    }
}

impl<T: Construct> Mold for BTreeMap<String, T> {
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Keyed(self)
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Keyed(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl<T: Construct> Keyed for BTreeMap<String, T> {
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&str, &dyn Mold)> + '_> {
        Box::new(BTreeMap::iter(self).map(|(key, item)| (key.as_str(), item as &dyn Mold)))
    }

    fn element_default(&self) -> Box<dyn Mold> {
        Box::new(T::construct())
    }

    fn insert(&mut self, key: String, value: Box<dyn Mold>) -> bool {
        match value.into_any().downcast::<T>() {
            Ok(item) => {
                BTreeMap::insert(self, key, *item);
                true
            }
            Err(_) => false,
        }
    }
}

impl<T: Construct> Construct for BTreeMap<String, T> {
    fn construct() -> Self {
        BTreeMap::new()
    }
}
