//! Structural validation of untrusted wire bytes.
//!
//! A buffer that passes [`validate`] can be read through the zero-copy views
//! without any accessor failing on malformed bytes: every element, string,
//! binary payload and nested document lies inside its parent, and the
//! element walk lands exactly on each terminator.
//!
//! The checks run in two passes per document. The shallow pass covers the
//! length prefix, the terminator and each element header. The deep pass
//! checks value bytes and recurses into containers, up to [`MAX_DEPTH`].

use crate::encode::{self, MAX_INDEX_DIGITS};
use crate::error::{Error, Result};
use crate::tag::{ElementType, LEN_PREFIX, MIN_DOCUMENT_LEN, read_len};

/// Deepest nesting accepted, counting the top-level document as depth 1.
pub const MAX_DEPTH: usize = 100;

/// Which key rule applies to a document's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layout {
    /// Any UTF-8 key.
    Document,
    /// Keys must be `"0"`, `"1"`, ... in order.
    Array,
}

/// Validate `bytes` as a complete top-level document or array.
///
/// # Errors
///
/// Returns `Error::InvalidDocument` with the offset of the first violation,
/// counted from the start of `bytes`.
pub(crate) fn validate(bytes: &[u8], layout: Layout) -> Result<()> {
    let result = validate_at(bytes, layout, 0, 1);
    if let Err(Error::InvalidDocument { offset, reason }) = &result {
        tracing::debug!(offset, reason, len = bytes.len(), "rejected document");
    }
    result
}

fn invalid(offset: usize, reason: &'static str) -> Error {
    Error::InvalidDocument { offset, reason }
}

/// Reject an in-memory tree nested past [`MAX_DEPTH`] before it is written,
/// so everything the encoder emits also validates.
pub(crate) fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(invalid(0, "nesting too deep"));
    }
    Ok(())
}

/// Validate the document starting at `bytes[0]`.
///
/// `base` is the absolute offset of `bytes[0]` for error reporting. The
/// slice may extend past the document; only the declared length is checked.
fn validate_at(bytes: &[u8], layout: Layout, base: usize, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(invalid(base, "nesting too deep"));
    }
    if bytes.len() < MIN_DOCUMENT_LEN {
        return Err(invalid(base, "document shorter than 5 bytes"));
    }
    let len = read_len(bytes, 0).ok_or_else(|| invalid(base, "negative document length"))?;
    if len < MIN_DOCUMENT_LEN {
        return Err(invalid(base, "declared length below minimum"));
    }
    if len > bytes.len() {
        return Err(invalid(base, "declared length exceeds buffer"));
    }
    if bytes[len - 1] != 0 {
        return Err(invalid(base + len - 1, "missing document terminator"));
    }

    let end = len - 1;
    let mut pos = LEN_PREFIX;
    let mut index = 0usize;
    while pos < end {
        let at = base + pos;
        let tag = bytes[pos];
        let ty = ElementType::from_byte(tag).ok_or_else(|| invalid(at, "unknown element type"))?;
        if end - pos < ty.min_element_len() {
            return Err(invalid(at, "element shorter than its type allows"));
        }

        let key_start = pos + 1;
        let key_len = bytes[key_start..end]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| invalid(at, "unterminated key"))?;
        let key = &bytes[key_start..key_start + key_len];
        if std::str::from_utf8(key).is_err() {
            return Err(invalid(base + key_start, "key is not UTF-8"));
        }
        if layout == Layout::Array && !is_index_key(key, index) {
            return Err(invalid(base + key_start, "array key out of sequence"));
        }

        let v = key_start + key_len + 1;
        let value_len = validate_value(&bytes[v..end], ty, base + v, depth)?;
        tracing::trace!(offset = at, ty = ty.name(), value_len, "validated element");
        pos = v + value_len;
        index += 1;
    }
    // every element length was checked against `end`, so the walk cannot pass it
    debug_assert_eq!(pos, end);
    Ok(())
}

/// Check one value against `room`, the bytes left before the terminator.
///
/// Returns the value's length on the wire.
fn validate_value(room: &[u8], ty: ElementType, at: usize, depth: usize) -> Result<usize> {
    let fits = |n: usize| {
        if n <= room.len() {
            Ok(n)
        } else {
            Err(invalid(at, "value overruns document"))
        }
    };
    match ty {
        ElementType::Double | ElementType::Int64 => fits(8),
        ElementType::Int32 => fits(4),
        ElementType::Null => Ok(0),
        ElementType::Boolean => match room.first() {
            Some(0 | 1) => Ok(1),
            Some(_) => Err(invalid(at, "boolean is neither 0 nor 1")),
            None => Err(invalid(at, "value overruns document")),
        },
        ElementType::String => {
            let n = read_len(room, 0).ok_or_else(|| invalid(at, "negative string length"))?;
            if n == 0 {
                return Err(invalid(at, "string length must include terminator"));
            }
            let total = fits(LEN_PREFIX.saturating_add(n))?;
            if room[total - 1] != 0 {
                return Err(invalid(at + total - 1, "string is not NUL-terminated"));
            }
            if std::str::from_utf8(&room[LEN_PREFIX..total - 1]).is_err() {
                return Err(invalid(at + LEN_PREFIX, "string is not UTF-8"));
            }
            Ok(total)
        }
        ElementType::Binary => {
            let n = read_len(room, 0).ok_or_else(|| invalid(at, "negative binary length"))?;
            fits(5usize.saturating_add(n))
        }
        ElementType::Document | ElementType::Array => {
            let n = read_len(room, 0).ok_or_else(|| invalid(at, "negative document length"))?;
            let n = fits(n)?;
            let layout = if ty == ElementType::Array {
                Layout::Array
            } else {
                Layout::Document
            };
            validate_at(&room[..n], layout, at, depth + 1)?;
            Ok(n)
        }
    }
}

/// Whether `key` is the decimal form of `index`.
fn is_index_key(key: &[u8], index: usize) -> bool {
    let mut digits = [0u8; MAX_INDEX_DIGITS];
    key == encode::index_key(index, &mut digits)
}
