//! Owned, mutable document tree.
//!
//! A [`Document`] maps unique keys to owned [`Value`]s. Keys iterate in
//! sorted order, which is also the order they are serialized in.
//!
//! ```
//! use minibson::{Array, Document};
//!
//! let mut doc = Document::new();
//! doc.set("name", "amy").set("age", 41i32);
//! doc.set("tags", Array::new().with("admin"));
//!
//! let bytes = doc.to_bytes().unwrap();
//! let back = Document::from_bytes(&bytes).unwrap();
//! assert_eq!(back, doc);
//! assert_eq!(back.get::<i32>("age").unwrap(), &41);
//! ```

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::encode::{self, Writer};
use crate::error::{Error, Result};
use crate::kind::{ElementKind, FromValue, Stored, bad_cast};
use crate::tag::LEN_PREFIX;
use crate::validate;
use crate::value::Value;
use crate::view::DocumentView;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    elements: BTreeMap<String, Value>,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.elements.insert(key.into(), value.into());
        self
    }

    /// By-value form of [`Document::set`] for building literals.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set_null(&mut self, key: impl Into<String>) -> &mut Self {
        self.set(key, Value::Null)
    }

    /// Remove `key`, returning its value if it was present.
    pub fn erase(&mut self, key: &str) -> Option<Value> {
        self.elements.remove(key)
    }

    /// The raw value under `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.elements.get(key)
    }

    pub fn value_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.elements.get_mut(key)
    }

    /// Borrow the value under `key` as `T`.
    ///
    /// # Errors
    ///
    /// - `Error::KeyNotFound` if `key` is absent
    /// - `Error::BadCast` if it holds another type
    pub fn get<T: Stored>(&self, key: &str) -> Result<&T> {
        let value = self
            .value(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_owned()))?;
        T::stored(value).ok_or_else(|| bad_cast::<T>(value.element_type()))
    }

    /// Mutably borrow the value under `key` as `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Document::get`].
    pub fn get_mut<T: Stored>(&mut self, key: &str) -> Result<&mut T> {
        let value = self
            .elements
            .get_mut(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_owned()))?;
        let found = value.element_type();
        T::stored_mut(value).ok_or_else(|| bad_cast::<T>(found))
    }

    /// Read the value under `key` as an owned `T`.
    ///
    /// # Errors
    ///
    /// - `Error::KeyNotFound` if `key` is absent
    /// - `Error::BadCast` if `T` cannot be read from it
    pub fn get_as<T: FromValue>(&self, key: &str) -> Result<T> {
        let value = self
            .value(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_owned()))?;
        T::from_value(value)
    }

    /// Read `key` as `T`, falling back to `default` on any failure.
    #[must_use]
    pub fn get_or<T: FromValue>(&self, key: &str, default: T) -> T {
        self.get_as(key).unwrap_or(default)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.elements.contains_key(key)
    }

    /// Whether `key` exists and holds a type `T` accepts. Never fails.
    #[must_use]
    pub fn contains_type<T: ElementKind>(&self, key: &str) -> bool {
        self.value(key)
            .is_some_and(|v| T::accepts(v.element_type()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, String, Value> {
        self.elements.iter_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    /// Exact number of bytes [`Document::serialize_into`] writes.
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        let body: usize = self
            .elements
            .iter()
            .map(|(k, v)| 1 + encode::cstring_len(k) + v.serialized_size())
            .sum();
        LEN_PREFIX + body + 1
    }

    pub(crate) fn write_to(&self, w: &mut Writer<'_>) {
        let start = w.open_document();
        for (key, value) in &self.elements {
            w.put_header(value.element_type(), key);
            value.write_to(w);
        }
        w.close_document(start);
    }

    pub(crate) fn check_tree(&self, depth: usize) -> Result<()> {
        validate::check_depth(depth)?;
        for (key, value) in &self.elements {
            if key.contains('\0') {
                return Err(Error::InvalidKey(key.clone()));
            }
            value.check_tree(depth)?;
        }
        Ok(())
    }

    /// Serialize into the front of `buf`, returning the bytes written.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidKey` if any key, at any depth, contains NUL
    /// - `Error::InvalidDocument` if nesting exceeds [`MAX_DEPTH`](crate::MAX_DEPTH)
    ///   or the document exceeds `i32::MAX` bytes
    /// - `Error::BufferTooSmall` if `buf` is shorter than
    ///   [`Document::serialized_size`]
    pub fn serialize_into(&self, buf: &mut [u8]) -> Result<usize> {
        self.check_tree(1)?;
        let size = self.serialized_size();
        let n = encode::serialize_into(buf, size, |w| self.write_to(w))?;
        tracing::debug!(bytes = n, elements = self.len(), "serialized document");
        Ok(n)
    }

    /// Serialize into a freshly allocated buffer.
    ///
    /// # Errors
    ///
    /// Same as [`Document::serialize_into`], minus `BufferTooSmall`.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.serialized_size()];
        self.serialize_into(&mut buf)?;
        Ok(buf)
    }

    /// Validate `bytes` and build a tree from them.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDocument` if `bytes` fails validation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let view = DocumentView::parse(bytes)?;
        let doc = Self::from_valid_view(view)?;
        tracing::debug!(bytes = view.byte_len(), elements = doc.len(), "deserialized document");
        Ok(doc)
    }

    /// Build from a view that has already passed validation.
    ///
    /// Duplicate keys resolve to the last occurrence.
    pub(crate) fn from_valid_view(view: DocumentView<'_>) -> Result<Self> {
        let mut elements = BTreeMap::new();
        for element in view {
            let value = Value::from_element(&element)?;
            if elements.insert(element.key().to_owned(), value).is_some() {
                tracing::debug!(
                    key = element.key(),
                    offset = element.offset(),
                    "duplicate key replaced earlier value"
                );
            }
        }
        Ok(Self { elements })
    }
}

impl TryFrom<&[u8]> for Document {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

impl TryFrom<DocumentView<'_>> for Document {
    type Error = Error;

    fn try_from(view: DocumentView<'_>) -> Result<Self> {
        view.validate()?;
        Self::from_valid_view(view)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Self::new();
        doc.extend(iter);
        doc
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Document {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::Array;
    use crate::kind::{Null, Scalar};
    use crate::value::Binary;

    #[test]
    fn test_empty_document_bytes() {
        let doc = Document::new();
        assert_eq!(doc.serialized_size(), 5);
        assert_eq!(doc.to_bytes().unwrap(), vec![0x05, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(Document::from_bytes(&[0x05, 0x00, 0x00, 0x00, 0x00]).unwrap(), doc);
    }

    #[test]
    fn test_set_overwrites() {
        let mut doc = Document::new();
        doc.set("a", 1i32).set("a", "one");
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get::<String>("a").unwrap(), "one");
        assert!(matches!(
            doc.get::<i32>("a"),
            Err(Error::BadCast {
                expected: "int32",
                found: "string"
            })
        ));
    }

    #[test]
    fn test_erase() {
        let mut doc = Document::new().with("a", 1i32).with("b", 2i32);
        assert_eq!(doc.erase("a"), Some(Value::Int32(1)));
        assert_eq!(doc.erase("a"), None);
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_get_errors() {
        let doc = Document::new().with("n", Null);
        assert!(matches!(doc.get::<i64>("x"), Err(Error::KeyNotFound(k)) if k == "x"));
        assert!(matches!(
            doc.get::<i64>("n"),
            Err(Error::BadCast {
                expected: "int64",
                found: "null"
            })
        ));
        assert!(doc.value("n").unwrap().is_null());
        assert!(doc.contains("n"));
        assert!(doc.contains_type::<Null>("n"));
        assert!(!doc.contains_type::<i64>("n"));
        assert!(!doc.contains_type::<Null>("x"));
    }

    #[test]
    fn test_get_mut_nested() {
        let mut doc = Document::new().with("inner", Document::new().with("count", 1i32));
        *doc.get_mut::<Document>("inner")
            .unwrap()
            .get_mut::<i32>("count")
            .unwrap() += 1;
        doc.get_mut::<Document>("inner").unwrap().set("flag", true);

        let inner = doc.get::<Document>("inner").unwrap();
        assert_eq!(inner.get::<i32>("count").unwrap(), &2);
        assert!(*inner.get::<bool>("flag").unwrap());
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_get_as_and_get_or() {
        let doc = Document::new().with("i", 7i64).with("s", "x");
        assert_eq!(doc.get_as::<i64>("i").unwrap(), 7);
        assert_eq!(doc.get_as::<Scalar>("i").unwrap().value(), 7.0);
        assert_eq!(doc.get_or("s", 0i64), 0);
        assert_eq!(doc.get_or("missing", String::from("d")), "d");
        assert_eq!(doc.get_or("s", String::new()), "x");
    }

    #[test]
    fn test_serialize_key_order() {
        let doc = Document::new().with("b", true).with("a", Null);
        let bytes = doc.to_bytes().unwrap();
        assert_eq!(
            bytes,
            vec![
                0x0C, 0x00, 0x00, 0x00, // len = 12
                0x0A, b'a', 0x00, // "a": null
                0x08, b'b', 0x00, 0x01, // "b": true
                0x00,
            ]
        );
    }

    #[test]
    fn test_serialize_into_buffer_too_small() {
        let doc = Document::new().with("a", 1i32);
        let mut buf = [0u8; 11];
        assert_eq!(
            doc.serialize_into(&mut buf),
            Err(Error::BufferTooSmall {
                needed: 12,
                capacity: 11
            })
        );
        let mut buf = [0u8; 32];
        assert_eq!(doc.serialize_into(&mut buf), Ok(12));
        assert_eq!(buf[12], 0);
    }

    #[test]
    fn test_nul_key_rejected() {
        let doc = Document::new().with("a\0b", 1i32);
        assert_eq!(doc.to_bytes(), Err(Error::InvalidKey("a\0b".into())));

        let nested = Document::new().with("outer", Document::new().with("\0", 1i32));
        assert!(matches!(nested.to_bytes(), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_roundtrip_all_types() {
        let doc = Document::new()
            .with("double", 1.25)
            .with("string", "héllo")
            .with("doc", Document::new().with("k", 1i32))
            .with("array", Array::new().with(1i32).with("two").with(Null))
            .with("binary", Binary::with_subtype(0x80, vec![1, 2, 3]))
            .with("bool", false)
            .with("null", Null)
            .with("int32", -5i32)
            .with("int64", i64::MIN);
        let bytes = doc.to_bytes().unwrap();
        assert_eq!(bytes.len(), doc.serialized_size());
        assert_eq!(Document::from_bytes(&bytes).unwrap(), doc);
        assert_eq!(Document::try_from(bytes.as_slice()).unwrap(), doc);
        assert_eq!(Document::try_from(DocumentView::new(&bytes)).unwrap(), doc);
    }

    #[test]
    fn test_from_bytes_rejects_invalid() {
        let err = Document::from_bytes(&[0x05, 0x00, 0x00, 0x00, 0x01]).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument { offset: 4, .. }));
        assert!(Document::try_from(DocumentView::default()).is_err());
    }

    #[test]
    fn test_duplicate_keys_keep_last() {
        let bytes = [
            0x10, 0x00, 0x00, 0x00, // len = 16
            0x10, b'k', 0x00, 0x01, 0x00, 0x00, 0x00, // "k": 1
            0x08, b'k', 0x00, 0x01, // "k": true
            0x00,
        ];
        // the view finds the first, the tree keeps the last
        let view = DocumentView::parse(&bytes).unwrap();
        assert_eq!(view.get::<i32>("k").unwrap(), 1);
        let doc = Document::from_bytes(&bytes).unwrap();
        assert_eq!(doc.len(), 1);
        assert!(*doc.get::<bool>("k").unwrap());
    }

    #[test]
    fn test_repeated_duplicates_keep_last() {
        let bytes = [
            0x10, 0x00, 0x00, 0x00, // len = 16
            0x08, b'k', 0x00, 0x00, // "k": false
            0x0A, b'k', 0x00, // "k": null
            0x08, b'k', 0x00, 0x01, // "k": true
            0x00,
        ];
        let doc = Document::from_bytes(&bytes).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.value("k"), Some(&Value::Boolean(true)));
    }

    /// Wrap `inner` so it sits `depth` levels down, the top level included.
    fn nested_around(inner: Document, depth: usize) -> Document {
        let mut doc = inner;
        for _ in 1..depth {
            doc = Document::new().with("d", doc);
        }
        doc
    }

    fn nested(depth: usize) -> Document {
        nested_around(Document::new().with("leaf", 1i32), depth)
    }

    #[test]
    fn test_serialize_at_max_depth() {
        let doc = nested(validate::MAX_DEPTH);
        let bytes = doc.to_bytes().unwrap();
        assert!(DocumentView::new(&bytes).is_valid());
        assert_eq!(Document::from_bytes(&bytes).unwrap(), doc);
    }

    #[test]
    fn test_serialize_past_max_depth() {
        let doc = nested(validate::MAX_DEPTH + 1);
        let err = doc.to_bytes().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
        assert!(matches!(
            err,
            Error::InvalidDocument {
                offset: 0,
                reason: "nesting too deep"
            }
        ));

        // checked before the buffer size, and nothing is written
        let mut buf = [0xFFu8; 8];
        assert!(matches!(
            doc.serialize_into(&mut buf),
            Err(Error::InvalidDocument { .. })
        ));
        assert_eq!(buf, [0xFF; 8]);
    }

    #[test]
    fn test_depth_counts_arrays() {
        // innermost document at 99, its array at 100, the array's document at 101
        let inner = Document::new().with("a", Array::new().with(Document::new()));
        let doc = nested_around(inner, validate::MAX_DEPTH - 1);
        assert!(matches!(
            doc.to_bytes(),
            Err(Error::InvalidDocument {
                reason: "nesting too deep",
                ..
            })
        ));

        let inner = Document::new().with("a", Array::new().with(1i32));
        let doc = nested_around(inner, validate::MAX_DEPTH - 1);
        let bytes = doc.to_bytes().unwrap();
        assert!(DocumentView::new(&bytes).is_valid());
    }

    #[test]
    fn test_from_iterator() {
        let doc: Document = [("x", 1i32), ("y", 2i32)].into_iter().collect();
        assert_eq!(doc.len(), 2);
        let keys: Vec<String> = doc.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["x", "y"]);
    }
}
