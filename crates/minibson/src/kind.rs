//! Mapping between Rust types and element types.
//!
//! Each supported host type names the element type it is stored under and
//! how to get it back out:
//!
//! | Rust type                     | Element type  | view returns      | tree returns |
//! |-------------------------------|---------------|-------------------|--------------|
//! | `f64`                         | double        | `f64`             | `&f64`       |
//! | `&str` / `String`             | string        | `&str` / `String` | `&String`    |
//! | `DocumentView` / `Document`   | document      | borrowed / owned  | `&Document`  |
//! | `ArrayView` / `Array`         | array         | borrowed / owned  | `&Array`     |
//! | `BinaryRef` / `Binary`        | binary        | borrowed / owned  | `&Binary`    |
//! | `bool`                        | boolean       | `bool`            | `&bool`      |
//! | `Null`                        | null          | `Null`            | -            |
//! | `i32`                         | int32         | `i32`             | `&i32`       |
//! | `i64`                         | int64         | `i64`             | `&i64`       |
//! | `Scalar`                      | double, int32, int64 | widened `f64` | via [`FromValue`] |
//!
//! Reads through [`Stored`] borrow the tree's own storage. Looser reads,
//! such as [`Scalar`], go through [`FromValue`], which callers may implement
//! for their own types; nothing converts implicitly.

use crate::array::Array;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::tag::ElementType;
use crate::value::{Binary, BinaryRef, Value};
use crate::view::{ArrayView, DocumentView, Element, TypedValue};

/// Marker value for the null element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Null;

/// Any numeric element (double, int32 or int64) widened to `f64`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Scalar(pub f64);

impl Scalar {
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<Scalar> for f64 {
    fn from(value: Scalar) -> Self {
        value.0
    }
}

/// A Rust type that corresponds to one or more element types.
pub trait ElementKind {
    /// Name used in `BadCast` errors.
    const NAME: &'static str;

    /// Whether an element stored as `ty` can be read as `Self`.
    fn accepts(ty: ElementType) -> bool;
}

/// Read a value out of a zero-copy [`Element`].
///
/// Callers normally go through [`Element::get`], which checks
/// [`ElementKind::accepts`] first.
pub trait FromElement<'a>: ElementKind + Sized {
    /// # Errors
    ///
    /// Returns `Error::BadCast` for a mismatched type and
    /// `Error::InvalidDocument` for malformed value bytes.
    fn from_element(element: &Element<'a>) -> Result<Self>;
}

/// A representation stored directly inside [`Value`], readable by reference.
pub trait Stored: ElementKind {
    fn stored(value: &Value) -> Option<&Self>;
    fn stored_mut(value: &mut Value) -> Option<&mut Self>;
}

/// Owned conversion out of a tree [`Value`].
///
/// This is the extension point for reading a value as a type other than its
/// stored representation. Implement it for your own types to opt in.
pub trait FromValue: Sized {
    /// # Errors
    ///
    /// Returns `Error::BadCast` if `value` cannot be read as `Self`.
    fn from_value(value: &Value) -> Result<Self>;
}

/// Build the `BadCast` error for reading a `found` element as `T`.
pub(crate) fn bad_cast<T: ElementKind>(found: ElementType) -> Error {
    Error::BadCast {
        expected: T::NAME,
        found: found.name(),
    }
}

macro_rules! exact_kind {
    ($ty:ty, $variant:ident) => {
        impl ElementKind for $ty {
            const NAME: &'static str = ElementType::$variant.name();

            #[inline]
            fn accepts(ty: ElementType) -> bool {
                ty == ElementType::$variant
            }
        }
    };
}

exact_kind!(f64, Double);
exact_kind!(String, String);
exact_kind!(&str, String);
exact_kind!(Document, Document);
exact_kind!(DocumentView<'_>, Document);
exact_kind!(Array, Array);
exact_kind!(ArrayView<'_>, Array);
exact_kind!(Binary, Binary);
exact_kind!(BinaryRef<'_>, Binary);
exact_kind!(bool, Boolean);
exact_kind!(Null, Null);
exact_kind!(i32, Int32);
exact_kind!(i64, Int64);

impl ElementKind for Scalar {
    const NAME: &'static str = "scalar";

    fn accepts(ty: ElementType) -> bool {
        matches!(
            ty,
            ElementType::Double | ElementType::Int32 | ElementType::Int64
        )
    }
}

// --- view side ---

macro_rules! from_element {
    ($ty:ty, $variant:ident, |$v:ident| $convert:expr) => {
        impl<'a> FromElement<'a> for $ty {
            fn from_element(element: &Element<'a>) -> Result<Self> {
                match element.typed()? {
                    TypedValue::$variant($v) => Ok($convert),
                    other => Err(bad_cast::<Self>(other.element_type())),
                }
            }
        }
    };
}

from_element!(f64, Double, |v| v);
from_element!(&'a str, String, |v| v);
from_element!(String, String, |v| v.to_owned());
from_element!(DocumentView<'a>, Document, |v| v);
from_element!(ArrayView<'a>, Array, |v| v);
from_element!(BinaryRef<'a>, Binary, |v| v);
from_element!(Binary, Binary, |v| v.to_binary());
from_element!(bool, Boolean, |v| v);
from_element!(i32, Int32, |v| v);
from_element!(i64, Int64, |v| v);

impl<'a> FromElement<'a> for Null {
    fn from_element(element: &Element<'a>) -> Result<Self> {
        match element.typed()? {
            TypedValue::Null => Ok(Null),
            other => Err(bad_cast::<Self>(other.element_type())),
        }
    }
}

impl<'a> FromElement<'a> for Document {
    /// Materializes an owned copy of the nested document.
    fn from_element(element: &Element<'a>) -> Result<Self> {
        match element.typed()? {
            TypedValue::Document(view) => Document::try_from(view),
            other => Err(bad_cast::<Self>(other.element_type())),
        }
    }
}

impl<'a> FromElement<'a> for Array {
    /// Materializes an owned copy of the nested array.
    fn from_element(element: &Element<'a>) -> Result<Self> {
        match element.typed()? {
            TypedValue::Array(view) => Array::try_from(view),
            other => Err(bad_cast::<Self>(other.element_type())),
        }
    }
}

impl<'a> FromElement<'a> for Scalar {
    #[allow(clippy::cast_precision_loss)] // widening is the point
    fn from_element(element: &Element<'a>) -> Result<Self> {
        match element.typed()? {
            TypedValue::Double(f) => Ok(Scalar(f)),
            TypedValue::Int32(n) => Ok(Scalar(f64::from(n))),
            TypedValue::Int64(n) => Ok(Scalar(n as f64)),
            other => Err(bad_cast::<Self>(other.element_type())),
        }
    }
}

// --- tree side ---

macro_rules! stored {
    ($ty:ty, $variant:ident) => {
        impl Stored for $ty {
            #[inline]
            fn stored(value: &Value) -> Option<&Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }

            #[inline]
            fn stored_mut(value: &mut Value) -> Option<&mut Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }

        impl FromValue for $ty {
            fn from_value(value: &Value) -> Result<Self> {
                <$ty as Stored>::stored(value)
                    .cloned()
                    .ok_or_else(|| bad_cast::<Self>(value.element_type()))
            }
        }
    };
}

stored!(f64, Double);
stored!(String, String);
stored!(Document, Document);
stored!(Array, Array);
stored!(Binary, Binary);
stored!(bool, Boolean);
stored!(i32, Int32);
stored!(i64, Int64);

impl FromValue for Null {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Null),
            other => Err(bad_cast::<Self>(other.element_type())),
        }
    }
}

impl FromValue for Scalar {
    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Double(f) => Ok(Scalar(*f)),
            Value::Int32(n) => Ok(Scalar(f64::from(*n))),
            Value::Int64(n) => Ok(Scalar(*n as f64)),
            other => Err(bad_cast::<Self>(other.element_type())),
        }
    }
}
