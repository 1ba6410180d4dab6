//! Owned, mutable array tree.
//!
//! An [`Array`] is an ordered list of [`Value`]s. On the wire it is a
//! document whose keys are the decimal positions `"0"`, `"1"`, ...; those
//! keys are produced during serialization and never stored.

use std::slice;
use std::vec;

use crate::encode::{self, Writer};
use crate::error::{Error, Result};
use crate::kind::{ElementKind, FromValue, Stored, bad_cast};
use crate::tag::LEN_PREFIX;
use crate::validate;
use crate::value::Value;
use crate::view::ArrayView;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array {
    items: Vec<Value>,
}

impl Array {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value.
    pub fn push(&mut self, value: impl Into<Value>) -> &mut Self {
        self.items.push(value.into());
        self
    }

    /// By-value form of [`Array::push`] for building literals.
    #[must_use]
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.push(value);
        self
    }

    fn out_of_bounds(&self, index: usize) -> Error {
        Error::IndexOutOfBounds {
            index,
            len: self.items.len(),
        }
    }

    /// Replace the value at `index`.
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if `index >= len()`.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        let err = self.out_of_bounds(index);
        let slot = self.items.get_mut(index).ok_or(err)?;
        *slot = value.into();
        Ok(())
    }

    /// Remove and return the value at `index`, shifting later values down.
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if `index >= len()`.
    pub fn remove(&mut self, index: usize) -> Result<Value> {
        if index >= self.items.len() {
            return Err(self.out_of_bounds(index));
        }
        Ok(self.items.remove(index))
    }

    #[must_use]
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Borrow the value at `index` as `T`.
    ///
    /// # Errors
    ///
    /// - `Error::IndexOutOfBounds` if `index >= len()`
    /// - `Error::BadCast` if it holds another type
    pub fn at<T: Stored>(&self, index: usize) -> Result<&T> {
        let value = self.value(index).ok_or_else(|| self.out_of_bounds(index))?;
        T::stored(value).ok_or_else(|| bad_cast::<T>(value.element_type()))
    }

    /// Mutably borrow the value at `index` as `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Array::at`].
    pub fn at_mut<T: Stored>(&mut self, index: usize) -> Result<&mut T> {
        let err = self.out_of_bounds(index);
        let value = self.items.get_mut(index).ok_or(err)?;
        let found = value.element_type();
        T::stored_mut(value).ok_or_else(|| bad_cast::<T>(found))
    }

    /// Read the value at `index` as an owned `T`.
    ///
    /// # Errors
    ///
    /// - `Error::IndexOutOfBounds` if `index >= len()`
    /// - `Error::BadCast` if `T` cannot be read from it
    pub fn at_as<T: FromValue>(&self, index: usize) -> Result<T> {
        let value = self.value(index).ok_or_else(|| self.out_of_bounds(index))?;
        T::from_value(value)
    }

    /// Whether `index` exists and holds a type `T` accepts. Never fails.
    #[must_use]
    pub fn contains_type<T: ElementKind>(&self, index: usize) -> bool {
        self.value(index)
            .is_some_and(|v| T::accepts(v.element_type()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<'_, Value> {
        self.items.iter_mut()
    }

    /// Exact number of bytes [`Array::serialize_into`] writes.
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        let body: usize = self
            .items
            .iter()
            .enumerate()
            .map(|(i, v)| 1 + encode::index_key_len(i) + 1 + v.serialized_size())
            .sum();
        LEN_PREFIX + body + 1
    }

    pub(crate) fn write_to(&self, w: &mut Writer<'_>) {
        let start = w.open_document();
        for (index, value) in self.items.iter().enumerate() {
            w.put_index_header(value.element_type(), index);
            value.write_to(w);
        }
        w.close_document(start);
    }

    pub(crate) fn check_tree(&self, depth: usize) -> Result<()> {
        validate::check_depth(depth)?;
        self.items.iter().try_for_each(|v| v.check_tree(depth))
    }

    /// Serialize into the front of `buf`, returning the bytes written.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidKey` if a nested document key contains NUL
    /// - `Error::InvalidDocument` if nesting exceeds [`MAX_DEPTH`](crate::MAX_DEPTH)
    ///   or the array exceeds `i32::MAX` bytes
    /// - `Error::BufferTooSmall` if `buf` is shorter than
    ///   [`Array::serialized_size`]
    pub fn serialize_into(&self, buf: &mut [u8]) -> Result<usize> {
        self.check_tree(1)?;
        let size = self.serialized_size();
        let n = encode::serialize_into(buf, size, |w| self.write_to(w))?;
        tracing::debug!(bytes = n, elements = self.len(), "serialized array");
        Ok(n)
    }

    /// Serialize into a freshly allocated buffer.
    ///
    /// # Errors
    ///
    /// Same as [`Array::serialize_into`], minus `BufferTooSmall`.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.serialized_size()];
        self.serialize_into(&mut buf)?;
        Ok(buf)
    }

    /// Validate `bytes` as an array and build a tree from them.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDocument` if `bytes` fails validation,
    /// including keys that are not the sequential indices.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let view = ArrayView::parse(bytes)?;
        let array = Self::from_valid_view(view)?;
        tracing::debug!(bytes = view.byte_len(), elements = array.len(), "deserialized array");
        Ok(array)
    }

    pub(crate) fn from_valid_view(view: ArrayView<'_>) -> Result<Self> {
        let items = view
            .iter()
            .map(|element| Value::from_element(&element))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { items })
    }
}

impl TryFrom<&[u8]> for Array {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

impl TryFrom<ArrayView<'_>> for Array {
    type Error = Error;

    fn try_from(view: ArrayView<'_>) -> Result<Self> {
        view.validate()?;
        Self::from_valid_view(view)
    }
}

impl From<Vec<Value>> for Array {
    fn from(items: Vec<Value>) -> Self {
        Self { items }
    }
}

impl<V: Into<Value>> FromIterator<V> for Array {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<V: Into<Value>> Extend<V> for Array {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        self.items.extend(iter.into_iter().map(Into::into));
    }
}

impl IntoIterator for Array {
    type Item = Value;
    type IntoIter = vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Value;
    type IntoIter = slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
