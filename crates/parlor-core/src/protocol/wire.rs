//! Wire primitives shared by every packet variant.
//!
//! The deployed peers speak the Java stream convention: big-endian
//! fixed-width integers, booleans as one byte, and strings as a 2-byte
//! length followed by *modified* UTF-8 (NUL encoded as `C0 80`,
//! supplementary characters as CESU-8 surrogate pairs). Byte blobs carry a
//! 1-byte length; a zero-length blob still writes its length byte, or the
//! peer hangs waiting for bytes that never arrive.
//!
//! Readers never trust a length field blindly: string lengths are bounded
//! by the u16 prefix, list counts by [`MAX_LIST_COUNT`], and every read is
//! bounds-checked against the remaining buffer.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::{MAX_BLOB_LEN, MAX_LIST_COUNT, MAX_STRING_BYTES};

// ---------------------------------------------------------------------
// Modified UTF-8
// ---------------------------------------------------------------------

/// Encode a string as Java modified UTF-8.
fn encode_mutf8(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let c = ch as u32;
        if c == 0 {
            // NUL is carried as the overlong pair so the stream never
            // contains a raw zero byte.
            out.push(0xC0);
            out.push(0x80);
        } else if c < 0x80 {
            out.push(c as u8);
        } else if c < 0x800 {
            out.push(0xC0 | (c >> 6) as u8);
            out.push(0x80 | (c & 0x3F) as u8);
        } else if c < 0x1_0000 {
            out.push(0xE0 | (c >> 12) as u8);
            out.push(0x80 | ((c >> 6) & 0x3F) as u8);
            out.push(0x80 | (c & 0x3F) as u8);
        } else {
            // Supplementary characters go out as a CESU-8 surrogate pair.
            let v = c - 0x1_0000;
            for unit in [0xD800 + (v >> 10), 0xDC00 + (v & 0x3FF)] {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

/// Decode Java modified UTF-8 into a string.
fn decode_mutf8(bytes: &[u8]) -> Result<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        if b0 & 0x80 == 0 {
            units.push(u16::from(b0));
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            let b1 = *bytes
                .get(i + 1)
                .ok_or_else(|| Error::Malformed("truncated utf-8 sequence".into()))?;
            if b1 & 0xC0 != 0x80 {
                return Err(Error::Malformed("bad utf-8 continuation byte".into()));
            }
            units.push((u16::from(b0 & 0x1F) << 6) | u16::from(b1 & 0x3F));
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            if i + 2 >= bytes.len() {
                return Err(Error::Malformed("truncated utf-8 sequence".into()));
            }
            let (b1, b2) = (bytes[i + 1], bytes[i + 2]);
            if b1 & 0xC0 != 0x80 || b2 & 0xC0 != 0x80 {
                return Err(Error::Malformed("bad utf-8 continuation byte".into()));
            }
            units.push(
                (u16::from(b0 & 0x0F) << 12)
                    | (u16::from(b1 & 0x3F) << 6)
                    | u16::from(b2 & 0x3F),
            );
            i += 3;
        } else {
            return Err(Error::Malformed("bad utf-8 lead byte".into()));
        }
    }

    // Re-pair surrogates into scalar values.
    let mut out = String::with_capacity(units.len());
    let mut iter = units.into_iter().peekable();
    while let Some(unit) = iter.next() {
        let scalar = match unit {
            0xD800..=0xDBFF => {
                let low = iter
                    .next()
                    .ok_or_else(|| Error::Malformed("unpaired high surrogate".into()))?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(Error::Malformed("unpaired high surrogate".into()));
                }
                0x1_0000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
            }
            0xDC00..=0xDFFF => {
                return Err(Error::Malformed("unpaired low surrogate".into()));
            }
            _ => u32::from(unit),
        };
        out.push(
            char::from_u32(scalar)
                .ok_or_else(|| Error::Malformed("invalid character".into()))?,
        );
    }
    Ok(out)
}

// ---------------------------------------------------------------------
// WireWriter
// ---------------------------------------------------------------------

/// Append-only encoder for one packet.
///
/// Width violations surface as [`Error::Encoding`] before any byte reaches
/// the transport; a packet is handed over whole or not at all.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: BytesMut,
}

impl WireWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
        }
    }

    /// Finish and take the encoded bytes.
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    /// Write a big-endian u16.
    pub fn write_u16(&mut self, v: u16) {
        self.buf.put_u16(v);
    }

    /// Write a big-endian u32.
    pub fn write_u32(&mut self, v: u32) {
        self.buf.put_u32(v);
    }

    /// Write a big-endian i32.
    pub fn write_i32(&mut self, v: i32) {
        self.buf.put_i32(v);
    }

    /// Write a boolean as one byte.
    pub fn write_bool(&mut self, v: bool) {
        self.buf.put_u8(u8::from(v));
    }

    /// Write raw bytes with no length prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Write a length-prefixed modified-UTF-8 string.
    pub fn write_string(&mut self, text: &str) -> Result<()> {
        let encoded = encode_mutf8(text);
        if encoded.len() > MAX_STRING_BYTES {
            return Err(Error::Encoding(format!(
                "string of {} encoded bytes exceeds the u16 length prefix",
                encoded.len()
            )));
        }
        self.buf.put_u16(encoded.len() as u16);
        self.buf.put_slice(&encoded);
        Ok(())
    }

    /// Write a byte blob with a 1-byte length prefix.
    pub fn write_blob(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > MAX_BLOB_LEN {
            return Err(Error::Encoding(format!(
                "blob of {} bytes exceeds the u8 length prefix",
                bytes.len()
            )));
        }
        self.buf.put_u8(bytes.len() as u8);
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Write a string list with a u32 count prefix.
    pub fn write_string_list(&mut self, items: &[String]) -> Result<()> {
        if items.len() > MAX_LIST_COUNT {
            return Err(Error::Encoding(format!(
                "list of {} entries exceeds the count ceiling",
                items.len()
            )));
        }
        self.buf.put_u32(items.len() as u32);
        for item in items {
            self.write_string(item)?;
        }
        Ok(())
    }

    /// Write a string list with a u8 count prefix (255 entries at most).
    pub fn write_short_string_list(&mut self, items: &[String]) -> Result<()> {
        if items.len() > u8::MAX as usize {
            return Err(Error::Encoding(format!(
                "list of {} entries exceeds the u8 count prefix",
                items.len()
            )));
        }
        self.buf.put_u8(items.len() as u8);
        for item in items {
            self.write_string(item)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------
// WireReader
// ---------------------------------------------------------------------

/// Bounds-checked decoder over a byte slice.
///
/// Underflow is [`Error::Incomplete`] so the streaming reader can wait for
/// more transport bytes; whole-packet decoding converts that to
/// [`Error::Malformed`].
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Create a reader over a buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Take the next `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::Incomplete);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a big-endian u16.
    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a big-endian u32.
    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a big-endian i32.
    pub fn read_i32(&mut self) -> Result<i32> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a boolean byte (any non-zero value is true).
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a length-prefixed modified-UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        decode_mutf8(bytes)
    }

    /// Read a byte blob with a 1-byte length prefix.
    pub fn read_blob(&mut self) -> Result<Vec<u8>> {
        let len = self.read_u8()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// Read a u32 list count, enforcing the ceiling and a minimum element
    /// size against the remaining buffer.
    pub fn read_list_count(&mut self, min_elem_bytes: usize) -> Result<usize> {
        let count = self.read_u32()? as usize;
        if count > MAX_LIST_COUNT {
            return Err(Error::Malformed(format!(
                "list count {count} exceeds the ceiling"
            )));
        }
        if count.saturating_mul(min_elem_bytes) > self.remaining() {
            // More bytes may still be in flight; the streaming reader
            // decides whether to wait or give up.
            return Err(Error::Incomplete);
        }
        Ok(count)
    }

    /// Read a string list with a u32 count prefix.
    pub fn read_string_list(&mut self) -> Result<Vec<String>> {
        let count = self.read_list_count(2)?;
        let mut items = Vec::new();
        for _ in 0..count {
            items.push(self.read_string()?);
        }
        Ok(items)
    }

    /// Read a string list with a u8 count prefix.
    pub fn read_short_string_list(&mut self) -> Result<Vec<String>> {
        let count = self.read_u8()? as usize;
        let mut items = Vec::new();
        for _ in 0..count {
            items.push(self.read_string()?);
        }
        Ok(items)
    }
}
