//! Zero-copy views over wire bytes.
//!
//! These types are lightweight wrappers around byte slices that read values
//! directly from the underlying bytes on demand, without allocation. A view
//! borrows the caller's buffer and cannot outlive it.
//!
//! Views can be built over untrusted bytes with [`DocumentView::new`]; every
//! accessor stays inside the slice, but answers are only meaningful once
//! [`DocumentView::is_valid`] holds. [`DocumentView::parse`] does both steps.
//!
//! ```
//! use minibson::{Document, DocumentView};
//!
//! let bytes = Document::new().with("answer", 42i32).to_bytes().unwrap();
//! let view = DocumentView::parse(&bytes).unwrap();
//! assert_eq!(view.get::<i32>("answer").unwrap(), 42);
//! ```

use std::fmt;

use crate::error::{Error, Result};
use crate::kind::{ElementKind, FromElement};
use crate::tag::{
    ElementType, LEN_PREFIX, UNKNOWN_TYPE_NAME, read_f64_le, read_i32_le, read_i64_le, read_len,
};
use crate::validate::{self, Layout};
use crate::value::BinaryRef;

/// A typed view of an element value for pattern matching.
///
/// ```
/// use minibson::{Document, DocumentView, TypedValue};
///
/// let bytes = Document::new().with("name", "amy").to_bytes().unwrap();
/// let view = DocumentView::parse(&bytes).unwrap();
/// for element in view.iter() {
///     match element.typed().unwrap() {
///         TypedValue::String(s) => assert_eq!(s, "amy"),
///         other => panic!("unexpected {other:?}"),
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub enum TypedValue<'a> {
    Double(f64),
    /// UTF-8 string (zero-copy reference, terminator stripped).
    String(&'a str),
    Document(DocumentView<'a>),
    Array(ArrayView<'a>),
    /// Binary data (zero-copy reference).
    Binary(BinaryRef<'a>),
    Boolean(bool),
    Null,
    Int32(i32),
    Int64(i64),
}

impl TypedValue<'_> {
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            TypedValue::Double(_) => ElementType::Double,
            TypedValue::String(_) => ElementType::String,
            TypedValue::Document(_) => ElementType::Document,
            TypedValue::Array(_) => ElementType::Array,
            TypedValue::Binary(_) => ElementType::Binary,
            TypedValue::Boolean(_) => ElementType::Boolean,
            TypedValue::Null => ElementType::Null,
            TypedValue::Int32(_) => ElementType::Int32,
            TypedValue::Int64(_) => ElementType::Int64,
        }
    }
}

/// A zero-copy view of one element: tag, key and value bytes.
///
/// The window starts at the tag byte and never extends past the enclosing
/// document's terminator.
#[derive(Clone, Copy)]
pub struct Element<'a> {
    /// Bytes from the tag to the end of the element (or of the enclosing
    /// document, before the element's length is known).
    bytes: &'a [u8],
    /// Offset of the tag byte within the enclosing document.
    offset: usize,
}

impl<'a> Element<'a> {
    #[inline]
    pub(crate) fn new(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    /// Offset of this element's tag byte within its enclosing document.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Get the raw tag byte.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> u8 {
        self.bytes.first().copied().unwrap_or(0)
    }

    /// Get the element type, or `None` for an unknown tag.
    #[inline]
    #[must_use]
    pub fn element_type(&self) -> Option<ElementType> {
        ElementType::from_byte(self.tag())
    }

    /// Length of the key in bytes, if its terminator lies inside the window.
    #[must_use]
    pub fn key_len(&self) -> Option<usize> {
        self.bytes.get(1..)?.iter().position(|&b| b == 0)
    }

    /// Raw key bytes (without the terminator).
    #[must_use]
    pub fn key_bytes(&self) -> &'a [u8] {
        match self.key_len() {
            Some(n) => &self.bytes[1..1 + n],
            None => &[],
        }
    }

    /// The element's key.
    ///
    /// Empty if the key is not valid UTF-8; such elements fail validation.
    #[must_use]
    pub fn key(&self) -> &'a str {
        std::str::from_utf8(self.key_bytes()).unwrap_or_default()
    }

    /// Offset of the value bytes from the tag byte.
    #[inline]
    fn value_offset(&self) -> Option<usize> {
        Some(1 + self.key_len()? + 1)
    }

    /// Total element size: `1 + keyLen + 1 + valueLen`.
    ///
    /// Returns 0 for an unknown tag or a length field that cannot be read,
    /// which tells iteration to stop here. The result may exceed the window
    /// for malformed input; callers compare it with the remaining space.
    #[allow(clippy::len_without_is_empty)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.computed_len().unwrap_or(0)
    }

    fn computed_len(&self) -> Option<usize> {
        let ty = self.element_type()?;
        let v = self.value_offset()?;
        let value_len = match ty {
            ElementType::Double | ElementType::Int64 => 8,
            ElementType::String => 4usize.checked_add(read_len(self.bytes, v)?)?,
            ElementType::Document | ElementType::Array => read_len(self.bytes, v)?,
            ElementType::Binary => 5usize.checked_add(read_len(self.bytes, v)?)?,
            ElementType::Boolean => 1,
            ElementType::Null => 0,
            ElementType::Int32 => 4,
        };
        v.checked_add(value_len)
    }

    /// The value bytes (everything after the key terminator).
    #[must_use]
    pub fn value_bytes(&self) -> &'a [u8] {
        let end = self.len().min(self.bytes.len());
        self.value_offset()
            .and_then(|v| self.bytes.get(v..end))
            .unwrap_or_default()
    }

    fn truncated(&self, at: usize) -> Error {
        Error::InvalidDocument {
            offset: self.offset + at,
            reason: "truncated element value",
        }
    }

    /// Decode the value into a typed, borrowed representation.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDocument` if the tag is unknown or the value
    /// bytes are malformed (possible only on unvalidated views).
    pub fn typed(&self) -> Result<TypedValue<'a>> {
        let ty = self.element_type().ok_or(Error::InvalidDocument {
            offset: self.offset,
            reason: "unknown element type",
        })?;
        let v = self.value_offset().ok_or(Error::InvalidDocument {
            offset: self.offset,
            reason: "unterminated key",
        })?;
        let b = self.bytes;

        match ty {
            ElementType::Double => read_f64_le(b, v)
                .map(TypedValue::Double)
                .ok_or_else(|| self.truncated(v)),
            ElementType::String => {
                let n = read_len(b, v)
                    .filter(|&n| n >= 1)
                    .ok_or_else(|| self.truncated(v))?;
                let start = v + 4;
                let raw = b.get(start..start + n).ok_or_else(|| self.truncated(v))?;
                let (payload, nul) = raw.split_at(n - 1);
                if nul != [0] {
                    return Err(Error::InvalidDocument {
                        offset: self.offset + start + n - 1,
                        reason: "string is not NUL-terminated",
                    });
                }
                let s = std::str::from_utf8(payload).map_err(|_| Error::InvalidDocument {
                    offset: self.offset + start,
                    reason: "string is not UTF-8",
                })?;
                Ok(TypedValue::String(s))
            }
            ElementType::Document | ElementType::Array => {
                let n = read_len(b, v).ok_or_else(|| self.truncated(v))?;
                let nested = b.get(v..v + n).ok_or_else(|| self.truncated(v))?;
                let doc = DocumentView::new(nested);
                Ok(if ty == ElementType::Array {
                    TypedValue::Array(ArrayView::from_document(doc))
                } else {
                    TypedValue::Document(doc)
                })
            }
            ElementType::Binary => {
                let n = read_len(b, v).ok_or_else(|| self.truncated(v))?;
                let subtype = *b.get(v + 4).ok_or_else(|| self.truncated(v))?;
                let start = v + 5;
                let bytes = b.get(start..start + n).ok_or_else(|| self.truncated(v))?;
                Ok(TypedValue::Binary(BinaryRef { subtype, bytes }))
            }
            ElementType::Boolean => match b.get(v) {
                Some(0) => Ok(TypedValue::Boolean(false)),
                Some(1) => Ok(TypedValue::Boolean(true)),
                Some(_) => Err(Error::InvalidDocument {
                    offset: self.offset + v,
                    reason: "boolean is neither 0 nor 1",
                }),
                None => Err(self.truncated(v)),
            },
            ElementType::Null => Ok(TypedValue::Null),
            ElementType::Int32 => read_i32_le(b, v)
                .map(TypedValue::Int32)
                .ok_or_else(|| self.truncated(v)),
            ElementType::Int64 => read_i64_le(b, v)
                .map(TypedValue::Int64)
                .ok_or_else(|| self.truncated(v)),
        }
    }

    /// Whether this element can be read as `T`.
    #[must_use]
    pub fn is<T: ElementKind>(&self) -> bool {
        self.element_type().is_some_and(T::accepts)
    }

    /// Read the value as `T`.
    ///
    /// # Errors
    ///
    /// Returns `Error::BadCast` if the element's type does not match `T`.
    pub fn get<T: FromElement<'a>>(&self) -> Result<T> {
        if !self.is::<T>() {
            return Err(Error::BadCast {
                expected: T::NAME,
                found: self.element_type().map_or(UNKNOWN_TYPE_NAME, ElementType::name),
            });
        }
        T::from_element(self)
    }
}

impl fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typed() {
            Ok(value) => write!(f, "Element({:?}: {value:?})", self.key()),
            Err(e) => write!(f, "Element::Invalid({e})"),
        }
    }
}

/// Forward-only cursor over the elements of a document.
///
/// Stops at the terminator, at the first element with an unknown tag or an
/// unreadable length, or at the first element that would overrun the
/// document. Cursors from different documents are unrelated.
#[derive(Debug, Clone)]
pub struct Elements<'a> {
    /// Element bytes between the length prefix and the terminator.
    body: &'a [u8],
    pos: usize,
}

impl<'a> Elements<'a> {
    fn new(body: &'a [u8]) -> Self {
        Self { body, pos: 0 }
    }

    fn empty() -> Self {
        Self::new(&[])
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.body.get(self.pos..).filter(|r| !r.is_empty())?;
        let n = Element::new(rest, 0).len();
        if n == 0 || n > rest.len() {
            self.pos = self.body.len();
            return None;
        }
        let element = Element::new(&rest[..n], LEN_PREFIX + self.pos);
        self.pos += n;
        Some(element)
    }
}

/// Read-only view of a document over an externally-owned buffer.
///
/// `DocumentView::default()` is the absent view: zero length, no elements.
#[derive(Clone, Copy, Default)]
pub struct DocumentView<'a> {
    bytes: &'a [u8],
}

impl<'a> DocumentView<'a> {
    /// Wrap `bytes` without checking them.
    #[inline]
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Wrap `bytes` after deep validation.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDocument` describing the first violation.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        validate::validate(bytes, Layout::Document)?;
        Ok(Self::new(bytes))
    }

    /// The underlying buffer.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Declared byte length from the 4-byte prefix; 0 for an absent view.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        read_len(self.bytes, 0).unwrap_or(0)
    }

    /// Check structure without reporting why it fails.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check structure, reporting the first violation.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDocument` with the offending offset.
    pub fn validate(&self) -> Result<()> {
        validate::validate(self.bytes, Layout::Document)
    }

    /// Iterate over elements in wire order.
    #[must_use]
    pub fn iter(&self) -> Elements<'a> {
        let end = self.byte_len().min(self.bytes.len());
        match self.bytes.get(LEN_PREFIX..end.saturating_sub(1)) {
            Some(body) => Elements::new(body),
            None => Elements::empty(),
        }
    }

    /// Number of elements (walks the document).
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Keys in wire order.
    pub fn keys(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.iter().map(|e| e.key())
    }

    /// Find the first element with `key` (linear scan).
    #[must_use]
    pub fn find(&self, key: &str) -> Option<Element<'a>> {
        self.iter().find(|e| e.key_bytes() == key.as_bytes())
    }

    /// Read `key` as `T`.
    ///
    /// # Errors
    ///
    /// - `Error::KeyNotFound` if no element has this key
    /// - `Error::BadCast` if it holds a type `T` does not accept
    pub fn get<T: FromElement<'a>>(&self, key: &str) -> Result<T> {
        self.find(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_owned()))?
            .get()
    }

    /// Read `key` as `T`, falling back to `default` on any failure.
    #[must_use]
    pub fn get_or<T: FromElement<'a>>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Whether an element with `key` exists, whatever its type.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Whether `key` exists and can be read as `T`. Never fails.
    #[must_use]
    pub fn contains_type<T: ElementKind>(&self, key: &str) -> bool {
        self.find(key).is_some_and(|e| e.is::<T>())
    }
}

impl<'a> IntoIterator for DocumentView<'a> {
    type Item = Element<'a>;
    type IntoIter = Elements<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for DocumentView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for element in self.iter() {
            match element.typed() {
                Ok(value) => map.entry(&element.key(), &value),
                Err(e) => map.entry(&element.key(), &format_args!("<{e}>")),
            };
        }
        map.finish()
    }
}

/// Read-only view of an array: a document whose keys are `"0"`, `"1"`, ...
///
/// Index access is a linear scan; iterate once for repeated reads.
#[derive(Clone, Copy, Default)]
pub struct ArrayView<'a> {
    doc: DocumentView<'a>,
}

impl<'a> ArrayView<'a> {
    /// Wrap `bytes` without checking them.
    #[inline]
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            doc: DocumentView::new(bytes),
        }
    }

    #[inline]
    pub(crate) const fn from_document(doc: DocumentView<'a>) -> Self {
        Self { doc }
    }

    /// Wrap `bytes` after deep validation as an array.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDocument` describing the first violation.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        validate::validate(bytes, Layout::Array)?;
        Ok(Self::new(bytes))
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.doc.as_bytes()
    }

    /// The same bytes viewed as a document keyed by position.
    #[inline]
    #[must_use]
    pub fn as_document(&self) -> DocumentView<'a> {
        self.doc
    }

    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.doc.byte_len()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check structure, including that keys are sequential indices.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDocument` with the offending offset.
    pub fn validate(&self) -> Result<()> {
        validate::validate(self.doc.as_bytes(), Layout::Array)
    }

    /// Iterate over elements in index order.
    #[must_use]
    pub fn iter(&self) -> Elements<'a> {
        self.doc.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.doc.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }

    /// Element at `index` (linear scan).
    #[must_use]
    pub fn element(&self, index: usize) -> Option<Element<'a>> {
        self.iter().nth(index)
    }

    /// Read the element at `index` as `T`.
    ///
    /// # Errors
    ///
    /// - `Error::IndexOutOfBounds` if `index >= len()`
    /// - `Error::BadCast` if it holds a type `T` does not accept
    pub fn at<T: FromElement<'a>>(&self, index: usize) -> Result<T> {
        match self.element(index) {
            Some(element) => element.get(),
            None => Err(Error::IndexOutOfBounds {
                index,
                len: self.len(),
            }),
        }
    }

    /// Whether `index` exists and can be read as `T`. Never fails.
    #[must_use]
    pub fn contains_type<T: ElementKind>(&self, index: usize) -> bool {
        self.element(index).is_some_and(|e| e.is::<T>())
    }
}

impl<'a> IntoIterator for ArrayView<'a> {
    type Item = Element<'a>;
    type IntoIter = Elements<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for ArrayView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for element in self.iter() {
            match element.typed() {
                Ok(value) => list.entry(&value),
                Err(e) => list.entry(&format_args!("<{e}>")),
            };
        }
        list.finish()
    }
}
