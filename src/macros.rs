//! The `mold!` macro: define a model struct and wire it into the engines.

/// Define a model struct together with its [`Construct`](crate::Construct),
/// [`Record`](crate::Record) and [`Mold`](crate::Mold) implementations.
///
/// Each field may carry a descriptor clause after its type and a default
/// value after that:
///
/// ```
/// mold_json::mold! {
///     #[derive(Debug)]
///     pub struct Session {
///         pub user: String,
///         pub retries: i64 = 3,
///         pub note: String [strict = false],
///         pub payload: mold_json::Dynamic [type = Attachment],
///         pub extra: Vec<mold_json::Dynamic> [of = Attachment],
///     }
/// }
///
/// mold_json::mold! {
///     #[derive(Debug, PartialEq)]
///     pub struct Attachment {
///         pub name: String,
///     }
/// }
/// ```
///
/// Descriptor clauses mirror the schema surface: `[type = T]` supplies the
/// constructor for a null-defaulted field, `[of = T]` the element type for a
/// collection with vacant element slots, `[strict = <bool>]` a per-field
/// strictness override. `strict` may be combined with either of the other
/// two: `[type = T, strict = false]`.
#[macro_export]
macro_rules! mold {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty $([ $($clause:tt)+ ])? $(= $default:expr)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $field_ty,
            )*
        }

        impl $crate::Construct for $name {
            fn construct() -> Self {
                Self {
                    $(
                        $field: $crate::__mold_field_init!($field_ty $(, $default)?),
                    )*
                }
            }
        }

        impl $crate::Record for $name {
            fn record_name(&self) -> &'static str {
                stringify!($name)
            }

            fn field_names(&self) -> &'static [&'static str] {
                &[$(stringify!($field)),*]
            }

            fn field(&self, name: &str) -> ::core::option::Option<&dyn $crate::Mold> {
                let _ = name;
                $(
                    if name == stringify!($field) {
                        return ::core::option::Option::Some(&self.$field);
                    }
                )*
                ::core::option::Option::None
            }

            fn field_mut(&mut self, name: &str) -> ::core::option::Option<&mut dyn $crate::Mold> {
                let _ = name;
                $(
                    if name == stringify!($field) {
                        return ::core::option::Option::Some(&mut self.$field);
                    }
                )*
                ::core::option::Option::None
            }

            fn descriptor(&self, name: &str) -> $crate::Descriptor {
                let _ = name;
                $(
                    if name == stringify!($field) {
                        return $crate::__mold_descriptor!($($($clause)+)?);
                    }
                )*
                $crate::Descriptor::EMPTY
            }
        }

        impl $crate::Mold for $name {
            fn type_name(&self) -> &'static str {
                stringify!($name)
            }

            fn shape(&self) -> $crate::Shape<'_> {
                $crate::Shape::Record(self)
            }

            fn shape_mut(&mut self) -> $crate::ShapeMut<'_> {
                $crate::ShapeMut::Record(self)
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::core::any::Any> {
                self
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __mold_field_init {
    ($field_ty:ty) => {
        <$field_ty as $crate::Construct>::construct()
    };
    ($field_ty:ty, $default:expr) => {
        $default
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __mold_descriptor {
    () => {
        $crate::Descriptor::EMPTY
    };
    (type = $ty:ty, strict = $strict:expr) => {
        $crate::Descriptor::EMPTY
            .typed($crate::TypeRef::of::<$ty>())
            .strict($strict)
    };
    (type = $ty:ty) => {
        $crate::Descriptor::EMPTY.typed($crate::TypeRef::of::<$ty>())
    };
    (of = $ty:ty, strict = $strict:expr) => {
        $crate::Descriptor::EMPTY
            .of($crate::TypeRef::of::<$ty>())
            .strict($strict)
    };
    (of = $ty:ty) => {
        $crate::Descriptor::EMPTY.of($crate::TypeRef::of::<$ty>())
    };
    (strict = $strict:expr) => {
        $crate::Descriptor::EMPTY.strict($strict)
    };
}
