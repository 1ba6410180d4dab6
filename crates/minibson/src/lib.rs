//! A compact binary document format: a subset of BSON.
//!
//! Two codecs share one wire format:
//!
//! - [`DocumentView`] / [`ArrayView`] read elements in place from a borrowed
//!   buffer, without allocating.
//! - [`Document`] / [`Array`] are owned trees that can be edited and
//!   serialized back to bytes.
//!
//! ```
//! use minibson::{Document, DocumentView, Scalar};
//!
//! let mut doc = Document::new();
//! doc.set("id", 7i64).set("ratio", 0.25);
//! let bytes = doc.to_bytes().unwrap();
//!
//! let view = DocumentView::parse(&bytes).unwrap();
//! assert_eq!(view.get::<i64>("id").unwrap(), 7);
//! assert_eq!(view.get::<Scalar>("id").unwrap(), Scalar(7.0));
//! assert!(view.get::<i32>("id").is_err());
//! ```

pub mod array;
pub mod document;
pub(crate) mod encode;
pub mod error;
#[cfg(feature = "json")]
pub mod json;
pub mod kind;
pub mod tag;
mod validate;
pub mod value;
pub mod view;

pub use array::Array;
pub use document::Document;
pub use error::{Error, ErrorKind, Result};
#[cfg(feature = "json")]
pub use json::{from_json, from_json_value, to_json, to_json_value};
pub use kind::{ElementKind, FromElement, FromValue, Null, Scalar, Stored};
pub use tag::ElementType;
pub use validate::MAX_DEPTH;
pub use value::{Binary, BinaryRef, GENERIC_SUBTYPE, Value};
pub use view::{ArrayView, DocumentView, Element, Elements, TypedValue};
