//! Element type tags and size rules.
//!
//! Every element starts with a 1-byte tag naming its value type, followed by
//! the NUL-terminated key and the value bytes. The minimum size of each
//! element type is known up front, so a validator can reject an element
//! before it dereferences any length field inside it.

/// Size of the `i32` length prefix of a document.
pub const LEN_PREFIX: usize = 4;

/// Smallest possible document: length prefix + terminator.
pub const MIN_DOCUMENT_LEN: usize = LEN_PREFIX + 1;

/// Smallest non-empty document: length prefix + a null element with an
/// empty key + terminator.
pub const MIN_NON_EMPTY_DOCUMENT_LEN: usize = LEN_PREFIX + 2 + 1;

/// Element value type, encoded as the element's first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    Boolean = 0x08,
    Null = 0x0A,
    Int32 = 0x10,
    Int64 = 0x12,
}

impl ElementType {
    /// Parse an element type from a tag byte.
    ///
    /// Returns `None` for any byte outside the supported set.
    #[inline]
    #[must_use]
    pub const fn from_byte(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(ElementType::Double),
            0x02 => Some(ElementType::String),
            0x03 => Some(ElementType::Document),
            0x04 => Some(ElementType::Array),
            0x05 => Some(ElementType::Binary),
            0x08 => Some(ElementType::Boolean),
            0x0A => Some(ElementType::Null),
            0x10 => Some(ElementType::Int32),
            0x12 => Some(ElementType::Int64),
            _ => None,
        }
    }

    /// Get the raw tag byte.
    #[inline]
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Get the type name as a string (for error messages).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ElementType::Double => "double",
            ElementType::String => "string",
            ElementType::Document => "document",
            ElementType::Array => "array",
            ElementType::Binary => "binary",
            ElementType::Boolean => "boolean",
            ElementType::Null => "null",
            ElementType::Int32 => "int32",
            ElementType::Int64 => "int64",
        }
    }

    /// Minimum number of value bytes an element of this type occupies.
    #[must_use]
    pub const fn min_value_len(self) -> usize {
        match self {
            ElementType::Double | ElementType::Int64 => 8,
            // i32 length + at least the NUL
            ElementType::String => 5,
            ElementType::Document | ElementType::Array => MIN_DOCUMENT_LEN,
            // i32 length + subtype
            ElementType::Binary => 5,
            ElementType::Boolean => 1,
            ElementType::Null => 0,
            ElementType::Int32 => 4,
        }
    }

    /// Minimum size of a whole element: tag + empty key + minimum value.
    #[must_use]
    pub const fn min_element_len(self) -> usize {
        1 + 1 + self.min_value_len()
    }

    /// Whether this type holds a nested document layout.
    #[inline]
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, ElementType::Document | ElementType::Array)
    }
}

/// Name used in errors for tag bytes outside the supported set.
pub const UNKNOWN_TYPE_NAME: &str = "unknown";

/// Name of a raw tag byte, known or not.
#[must_use]
pub fn tag_name(tag: u8) -> &'static str {
    ElementType::from_byte(tag).map_or(UNKNOWN_TYPE_NAME, ElementType::name)
}

/// Read a little-endian `i32` at `at`, if four bytes are available.
#[inline]
#[must_use]
pub fn read_i32_le(bytes: &[u8], at: usize) -> Option<i32> {
    let raw = bytes.get(at..at.checked_add(4)?)?;
    Some(i32::from_le_bytes(raw.try_into().ok()?))
}

/// Read a little-endian `i64` at `at`, if eight bytes are available.
#[inline]
#[must_use]
pub fn read_i64_le(bytes: &[u8], at: usize) -> Option<i64> {
    let raw = bytes.get(at..at.checked_add(8)?)?;
    Some(i64::from_le_bytes(raw.try_into().ok()?))
}

/// Read a little-endian `f64` at `at`, if eight bytes are available.
#[inline]
#[must_use]
pub fn read_f64_le(bytes: &[u8], at: usize) -> Option<f64> {
    let raw = bytes.get(at..at.checked_add(8)?)?;
    Some(f64::from_le_bytes(raw.try_into().ok()?))
}

/// Read a non-negative `i32` length field at `at` as `usize`.
///
/// Negative lengths are never valid on the wire and read as `None`.
#[inline]
#[must_use]
pub fn read_len(bytes: &[u8], at: usize) -> Option<usize> {
    usize::try_from(read_i32_le(bytes, at)?).ok()
}
