//! Encoding utilities for writing wire bytes.
//!
//! [`Writer`] is a forward-only cursor over a caller-supplied buffer. Callers
//! size the buffer up front (see [`Document::serialized_size`]); writing past
//! the end is an internal bug and panics rather than returning an error.
//!
//! | Value    | Layout                              |
//! |----------|-------------------------------------|
//! | document | `i32 len \| element* \| 0x00`       |
//! | element  | `u8 tag \| cstring key \| value`    |
//! | string   | `i32 len+1 \| bytes \| 0x00`        |
//! | binary   | `i32 len \| u8 subtype \| bytes`    |
//!
//! [`Document::serialized_size`]: crate::Document::serialized_size

use crate::error::{Error, Result};
use crate::tag::ElementType;

/// Forward-only cursor writing into a fixed buffer.
#[derive(Debug)]
pub struct Writer<'b> {
    buf: &'b mut [u8],
    pos: usize,
}

impl<'b> Writer<'b> {
    /// Create a writer at the start of `buf`.
    #[inline]
    #[must_use]
    pub fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes written so far.
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn put_u8(&mut self, b: u8) {
        self.buf[self.pos] = b;
        self.pos += 1;
    }

    #[inline]
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }

    #[inline]
    pub fn put_i32(&mut self, value: i32) {
        self.put_bytes(&value.to_le_bytes());
    }

    #[inline]
    pub fn put_i64(&mut self, value: i64) {
        self.put_bytes(&value.to_le_bytes());
    }

    #[inline]
    pub fn put_f64(&mut self, value: f64) {
        self.put_bytes(&value.to_le_bytes());
    }

    /// Write `s` followed by a NUL terminator.
    #[inline]
    pub fn put_cstring(&mut self, s: &str) {
        self.put_bytes(s.as_bytes());
        self.put_u8(0);
    }

    /// Write a length-prefixed, NUL-terminated string value.
    pub fn put_string(&mut self, s: &str) {
        self.put_i32(encode_len(s.len() + 1));
        self.put_cstring(s);
    }

    /// Write a binary value: length, subtype, payload.
    pub fn put_binary(&mut self, subtype: u8, bytes: &[u8]) {
        self.put_i32(encode_len(bytes.len()));
        self.put_u8(subtype);
        self.put_bytes(bytes);
    }

    /// Write an element header: tag byte and key.
    pub fn put_header(&mut self, ty: ElementType, key: &str) {
        self.put_u8(ty.as_byte());
        self.put_cstring(key);
    }

    /// Write an array element header: tag byte and the decimal `index` key.
    pub fn put_index_header(&mut self, ty: ElementType, index: usize) {
        let mut digits = [0u8; MAX_INDEX_DIGITS];
        self.put_u8(ty.as_byte());
        self.put_bytes(index_key(index, &mut digits));
        self.put_u8(0);
    }

    /// Reserve the 4-byte document length prefix, returning its offset.
    ///
    /// Pair with [`Writer::close_document`] once the elements are written.
    #[must_use]
    pub fn open_document(&mut self) -> usize {
        let start = self.pos;
        self.put_i32(0);
        start
    }

    /// Write the terminator and back-patch the length prefix at `start`.
    pub fn close_document(&mut self, start: usize) {
        self.put_u8(0);
        let len = encode_len(self.pos - start);
        self.buf[start..start + 4].copy_from_slice(&len.to_le_bytes());
    }
}

/// Write a document of `size` bytes into the front of `buf`.
///
/// `write` must produce exactly `size` bytes; anything else is a sizing bug
/// and panics. Returns `size`.
pub(crate) fn serialize_into(
    buf: &mut [u8],
    size: usize,
    write: impl FnOnce(&mut Writer<'_>),
) -> Result<usize> {
    if i32::try_from(size).is_err() {
        return Err(Error::InvalidDocument {
            offset: 0,
            reason: "document exceeds the i32 length limit",
        });
    }
    if buf.len() < size {
        return Err(Error::BufferTooSmall {
            needed: size,
            capacity: buf.len(),
        });
    }
    let mut w = Writer::new(&mut buf[..size]);
    write(&mut w);
    assert_eq!(w.position(), size, "serialized size disagrees with serialized_size()");
    Ok(size)
}

/// Convert an in-memory length to the wire's `i32`.
///
/// Documents are limited to `i32::MAX` bytes by the format itself.
#[inline]
fn encode_len(len: usize) -> i32 {
    i32::try_from(len).unwrap_or_else(|_| panic!("length {len} exceeds the i32 wire limit"))
}

/// Bytes a key occupies on the wire (payload + NUL).
#[inline]
#[must_use]
pub fn cstring_len(s: &str) -> usize {
    s.len() + 1
}

/// Bytes a string value occupies on the wire.
#[inline]
#[must_use]
pub fn string_len(s: &str) -> usize {
    4 + s.len() + 1
}

/// Bytes a binary value occupies on the wire.
#[inline]
#[must_use]
pub fn binary_len(bytes: &[u8]) -> usize {
    4 + 1 + bytes.len()
}

/// Digits needed for the largest `usize` index.
pub const MAX_INDEX_DIGITS: usize = 20;

/// Format `index` as its decimal array key into `buf`, without allocating.
#[must_use]
pub fn index_key(mut index: usize, buf: &mut [u8; MAX_INDEX_DIGITS]) -> &[u8] {
    let mut start = buf.len();
    loop {
        start -= 1;
        buf[start] = b'0' + (index % 10) as u8;
        index /= 10;
        if index == 0 {
            break;
        }
    }
    &buf[start..]
}

/// Number of decimal digits in `index`, i.e. the length of its array key.
#[must_use]
pub fn index_key_len(index: usize) -> usize {
    index.checked_ilog10().map_or(1, |d| d as usize + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_scalars() {
        let mut buf = [0u8; 17];
        let mut w = Writer::new(&mut buf);
        w.put_u8(0xAB);
        w.put_i32(1234);
        w.put_i64(-1);
        w.put_u8(0x01);
        w.put_u8(0x02);
        w.put_u8(0x03);
        w.put_u8(0x04);
        assert_eq!(w.position(), 17);
        assert_eq!(&buf[..5], &[0xAB, 0xD2, 0x04, 0x00, 0x00]);
        assert_eq!(&buf[5..13], &[0xFF; 8]);
    }

    #[test]
    #[allow(clippy::float_cmp)] // 1.5 is exactly representable in IEEE 754
    fn test_put_f64() {
        let mut buf = [0u8; 8];
        Writer::new(&mut buf).put_f64(1.5);
        assert_eq!(buf, [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF8, 0x3F]);
        assert_eq!(f64::from_le_bytes(buf), 1.5);
    }

    #[test]
    fn test_put_string() {
        let mut buf = [0u8; 7];
        let mut w = Writer::new(&mut buf);
        w.put_string("hi");
        assert_eq!(w.position(), string_len("hi"));
        assert_eq!(buf, [0x03, 0x00, 0x00, 0x00, b'h', b'i', 0x00]);
    }

    #[test]
    fn test_put_binary() {
        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf);
        w.put_binary(0x80, &[0xAA, 0xBB, 0xCC]);
        assert_eq!(w.position(), binary_len(&[0xAA, 0xBB, 0xCC]));
        assert_eq!(buf, [0x03, 0x00, 0x00, 0x00, 0x80, 0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_document_backpatch() {
        let mut buf = [0xEEu8; 12];
        let mut w = Writer::new(&mut buf);
        let start = w.open_document();
        w.put_header(ElementType::Int32, "a");
        w.put_i32(1);
        w.close_document(start);
        assert_eq!(w.position(), 12);
        assert_eq!(
            buf,
            [
                0x0C, 0x00, 0x00, 0x00, // len = 12
                0x10, b'a', 0x00, // int32 "a"
                0x01, 0x00, 0x00, 0x00, // 1
                0x00, // terminator
            ]
        );
    }

    #[test]
    fn test_empty_document() {
        let mut buf = [0xEEu8; 5];
        let mut w = Writer::new(&mut buf);
        let start = w.open_document();
        w.close_document(start);
        assert_eq!(buf, [0x05, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    #[should_panic]
    fn test_overrun_panics() {
        let mut buf = [0u8; 3];
        Writer::new(&mut buf).put_i32(7);
    }

    #[test]
    fn test_serialize_into_checks_capacity() {
        let mut buf = [0u8; 4];
        let err = serialize_into(&mut buf, 5, |w| {
            let start = w.open_document();
            w.close_document(start);
        })
        .unwrap_err();
        assert_eq!(
            err,
            Error::BufferTooSmall {
                needed: 5,
                capacity: 4
            }
        );

        let mut buf = [0xEEu8; 8];
        let n = serialize_into(&mut buf, 5, |w| {
            let start = w.open_document();
            w.close_document(start);
        })
        .unwrap();
        assert_eq!(n, 5);
        assert_eq!(buf, [0x05, 0x00, 0x00, 0x00, 0x00, 0xEE, 0xEE, 0xEE]);
    }

    #[test]
    #[should_panic(expected = "serialized size disagrees")]
    fn test_serialize_into_size_mismatch_panics() {
        let mut buf = [0u8; 8];
        let _ = serialize_into(&mut buf, 6, |w| {
            let start = w.open_document();
            w.close_document(start);
        });
    }

    #[test]
    fn test_index_key() {
        let mut buf = [0u8; MAX_INDEX_DIGITS];
        assert_eq!(index_key(0, &mut buf), b"0");
        assert_eq!(index_key(7, &mut buf), b"7");
        assert_eq!(index_key(10, &mut buf), b"10");
        assert_eq!(index_key(4096, &mut buf), b"4096");
        assert_eq!(
            index_key(usize::MAX, &mut buf),
            usize::MAX.to_string().as_bytes()
        );
    }

    #[test]
    fn test_put_index_header() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf);
        w.put_index_header(ElementType::Boolean, 12);
        assert_eq!(buf, [0x08, b'1', b'2', 0x00]);
    }

    #[test]
    fn test_index_key_len() {
        assert_eq!(index_key_len(0), 1);
        assert_eq!(index_key_len(9), 1);
        assert_eq!(index_key_len(10), 2);
        assert_eq!(index_key_len(99), 2);
        assert_eq!(index_key_len(100), 3);
        assert_eq!(index_key_len(12_345), 5);
    }
}
