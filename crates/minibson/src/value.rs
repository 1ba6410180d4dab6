//! Owned element values for the mutable tree.
//!
//! A [`Value`] is exclusively owned by the [`Document`] or [`Array`] holding
//! it. Nested containers keep their children in heap-allocated collections,
//! so dropping a value drops the whole subtree.
//!
//! | Rust type          | Element type |
//! |--------------------|--------------|
//! | `f64`              | double       |
//! | `String` / `&str`  | string       |
//! | `Document`         | document     |
//! | `Array`            | array        |
//! | `Binary`           | binary       |
//! | `bool`             | boolean      |
//! | `Null`             | null         |
//! | `i32`              | int32        |
//! | `i64`              | int64        |

use crate::array::Array;
use crate::document::Document;
use crate::encode::{self, Writer};
use crate::error::Result;
use crate::kind::Null;
use crate::tag::ElementType;
use crate::view::{Element, TypedValue};

/// Binary subtype for generic bytes.
pub const GENERIC_SUBTYPE: u8 = 0x00;

/// Owned binary payload with its subtype byte.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Binary {
    pub subtype: u8,
    pub bytes: Vec<u8>,
}

impl Binary {
    /// Generic (subtype 0) binary data.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            subtype: GENERIC_SUBTYPE,
            bytes: bytes.into(),
        }
    }

    #[must_use]
    pub fn with_subtype(subtype: u8, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            subtype,
            bytes: bytes.into(),
        }
    }

    /// Borrow as a [`BinaryRef`].
    #[must_use]
    pub fn as_binary_ref(&self) -> BinaryRef<'_> {
        BinaryRef {
            subtype: self.subtype,
            bytes: &self.bytes,
        }
    }
}

/// Binary payload borrowed from a wire buffer (zero-copy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryRef<'a> {
    pub subtype: u8,
    pub bytes: &'a [u8],
}

impl BinaryRef<'_> {
    /// Copy into an owned [`Binary`].
    #[must_use]
    pub fn to_binary(&self) -> Binary {
        Binary::with_subtype(self.subtype, self.bytes)
    }
}

/// A dynamically-typed owned value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Double(f64),
    String(String),
    Document(Document),
    Array(Array),
    Binary(Binary),
    Boolean(bool),
    Null,
    Int32(i32),
    Int64(i64),
}

impl Value {
    /// The element type this value is written under.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            Value::Double(_) => ElementType::Double,
            Value::String(_) => ElementType::String,
            Value::Document(_) => ElementType::Document,
            Value::Array(_) => ElementType::Array,
            Value::Binary(_) => ElementType::Binary,
            Value::Boolean(_) => ElementType::Boolean,
            Value::Null => ElementType::Null,
            Value::Int32(_) => ElementType::Int32,
            Value::Int64(_) => ElementType::Int64,
        }
    }

    /// Number of value bytes this value occupies on the wire
    /// (excluding tag and key).
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        match self {
            Value::Double(_) | Value::Int64(_) => 8,
            Value::String(s) => encode::string_len(s),
            Value::Document(d) => d.serialized_size(),
            Value::Array(a) => a.serialized_size(),
            Value::Binary(b) => encode::binary_len(&b.bytes),
            Value::Boolean(_) => 1,
            Value::Null => 0,
            Value::Int32(_) => 4,
        }
    }

    /// Write the value bytes (no tag or key).
    pub(crate) fn write_to(&self, w: &mut Writer<'_>) {
        match self {
            Value::Double(f) => w.put_f64(*f),
            Value::String(s) => w.put_string(s),
            Value::Document(d) => d.write_to(w),
            Value::Array(a) => a.write_to(w),
            Value::Binary(b) => w.put_binary(b.subtype, &b.bytes),
            Value::Boolean(b) => w.put_u8(u8::from(*b)),
            Value::Null => {}
            Value::Int32(n) => w.put_i32(*n),
            Value::Int64(n) => w.put_i64(*n),
        }
    }

    /// Reject trees that cannot be written: keys that are not C strings,
    /// or nesting past [`MAX_DEPTH`](crate::MAX_DEPTH). `depth` is the depth
    /// of the container holding this value.
    pub(crate) fn check_tree(&self, depth: usize) -> Result<()> {
        match self {
            Value::Document(d) => d.check_tree(depth + 1),
            Value::Array(a) => a.check_tree(depth + 1),
            _ => Ok(()),
        }
    }

    /// Materialize one element of a view whose buffer has already been
    /// validated.
    pub(crate) fn from_element(element: &Element<'_>) -> Result<Self> {
        tracing::trace!(key = element.key(), offset = element.offset(), "decoding element");
        Ok(match element.typed()? {
            TypedValue::Double(f) => Value::Double(f),
            TypedValue::String(s) => Value::String(s.to_owned()),
            TypedValue::Document(view) => Value::Document(Document::from_valid_view(view)?),
            TypedValue::Array(view) => Value::Array(Array::from_valid_view(view)?),
            TypedValue::Binary(b) => Value::Binary(b.to_binary()),
            TypedValue::Boolean(b) => Value::Boolean(b),
            TypedValue::Null => Value::Null,
            TypedValue::Int32(n) => Value::Int32(n),
            TypedValue::Int64(n) => Value::Int64(n),
        })
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Self {
        Value::Array(value)
    }
}

impl From<Binary> for Value {
    fn from(value: Binary) -> Self {
        Value::Binary(value)
    }
}

impl From<BinaryRef<'_>> for Value {
    fn from(value: BinaryRef<'_>) -> Self {
        Value::Binary(value.to_binary())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Binary(Binary::new(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Null> for Value {
    fn from(_: Null) -> Self {
        Value::Null
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}
