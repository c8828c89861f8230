use bytes::{BufMut, Bytes, BytesMut};

use crate::{IoError, zigzag32, zigzag64};

// -----------------------------------------------------------------------------
// Output

/// An append-only byte stream with fixed-width and variable-length encodings.
///
/// All multi-byte fixed-width values are little-endian. Variable-length
/// integers are LEB128: 7 payload bits per byte, bit 7 set while more bytes
/// follow. Signed varints are zig-zag encoded unless written with the
/// optimize-positive variant, which reinterprets the value as unsigned and
/// is shorter for non-negative values.
///
/// # Examples
///
/// ```
/// use krait_io::{Input, Output};
///
/// let mut out = Output::new();
/// out.write_var_u32(300);
/// out.write_bool(true);
///
/// let mut input = Input::new(out.into_bytes());
/// assert_eq!(input.read_var_u32().unwrap(), 300);
/// assert_eq!(input.read_bool().unwrap(), true);
/// assert!(input.is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct Output {
    buf: BytesMut,
}

impl Output {
    /// Create an empty [`Output`].
    #[inline]
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    /// Create an [`Output`] with room for `capacity` bytes.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrow everything written so far.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Discard everything written so far, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Freeze the buffer for reading.
    #[inline]
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    // -- fixed-width ----------------------------------------------------------

    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    #[inline]
    pub fn write_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.buf.put_u16_le(value);
    }

    #[inline]
    pub fn write_i16(&mut self, value: i16) {
        self.buf.put_i16_le(value);
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.buf.put_u64_le(value);
    }

    #[inline]
    pub fn write_i64(&mut self, value: i64) {
        self.buf.put_i64_le(value);
    }

    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.buf.put_f32_le(value);
    }

    #[inline]
    pub fn write_f64(&mut self, value: f64) {
        self.buf.put_f64_le(value);
    }

    /// Write a bool as a single `0`/`1` byte.
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(value as u8);
    }

    // -- variable-length ------------------------------------------------------

    /// Write an unsigned LEB128 varint, 1-5 bytes.
    pub fn write_var_u32(&mut self, mut value: u32) {
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.put_u8(byte);
                return;
            }
            self.buf.put_u8(byte | 0x80);
        }
    }

    /// Write an unsigned LEB128 varint, 1-10 bytes.
    pub fn write_var_u64(&mut self, mut value: u64) {
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.put_u8(byte);
                return;
            }
            self.buf.put_u8(byte | 0x80);
        }
    }

    /// Write a signed varint.
    ///
    /// With `optimize_positive` the value is reinterpreted as unsigned, so
    /// non-negative values shrink while negative values always take the
    /// maximum width. Otherwise the value is zig-zag encoded.
    #[inline]
    pub fn write_var_i32(&mut self, value: i32, optimize_positive: bool) {
        if optimize_positive {
            self.write_var_u32(value as u32);
        } else {
            self.write_var_u32(zigzag32(value));
        }
    }

    /// Write a signed varint; see [`Output::write_var_i32`].
    #[inline]
    pub fn write_var_i64(&mut self, value: i64, optimize_positive: bool) {
        if optimize_positive {
            self.write_var_u64(value as u64);
        } else {
            self.write_var_u64(zigzag64(value));
        }
    }

    // -- compound -------------------------------------------------------------

    /// Write raw bytes with no length prefix.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Write a char as a var-u32 scalar value.
    #[inline]
    pub fn write_char(&mut self, value: char) {
        self.write_var_u32(value as u32);
    }

    /// Write a length as a var-u32 prefix.
    pub fn write_len(&mut self, len: usize) -> Result<(), IoError> {
        let len = u32::try_from(len).map_err(|_| IoError::LengthOverflow { len: len as u64 })?;
        self.write_var_u32(len);
        Ok(())
    }

    /// Write a string as a var-u32 byte length followed by UTF-8 bytes.
    pub fn write_str(&mut self, value: &str) -> Result<(), IoError> {
        self.write_len(value.len())?;
        self.buf.put_slice(value.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_u32_boundaries() {
        let widths = [
            (0u32, 1),
            (0x7F, 1),
            (0x80, 2),
            (0x3FFF, 2),
            (0x4000, 3),
            (u32::MAX, 5),
        ];
        for (value, width) in widths {
            let mut out = Output::new();
            out.write_var_u32(value);
            assert_eq!(out.position(), width, "width of {value:#x}");
        }
    }

    #[test]
    fn optimize_positive_is_shorter_for_small_positives() {
        let mut plain = Output::new();
        plain.write_var_i64(200, false);
        let mut positive = Output::new();
        positive.write_var_i64(200, true);
        assert!(positive.position() < plain.position());
    }

    #[test]
    fn fixed_width_is_little_endian() {
        let mut out = Output::new();
        out.write_u32(0x0102_0304);
        assert_eq!(out.as_slice(), &[0x04, 0x03, 0x02, 0x01]);
    }
}
