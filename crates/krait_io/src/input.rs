use alloc::string::String;

use bytes::{Buf, Bytes};

use crate::{IoError, MAX_VAR_U32_BYTES, MAX_VAR_U64_BYTES, unzigzag32, unzigzag64};

// -----------------------------------------------------------------------------
// Input

/// A checked, position-tracking reader over a frozen byte buffer.
///
/// Every read verifies the remaining length first; the reader never panics
/// on truncated input. The read vocabulary mirrors [`Output`] exactly: for
/// any value, reading with the same method sequence that wrote it consumes
/// the same bytes.
///
/// [`Output`]: crate::Output
#[derive(Debug, Clone)]
pub struct Input {
    buf: Bytes,
    start_len: usize,
}

impl Input {
    /// Create an [`Input`] over a frozen buffer.
    #[inline]
    pub fn new(buf: Bytes) -> Self {
        let start_len = buf.len();
        Self { buf, start_len }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.start_len - self.buf.remaining()
    }

    /// Number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    fn require(&self, needed: usize) -> Result<(), IoError> {
        if self.buf.remaining() < needed {
            return Err(IoError::EndOfStream {
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    // -- fixed-width ----------------------------------------------------------

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, IoError> {
        self.require(1)?;
        Ok(self.buf.get_u8())
    }

    #[inline]
    pub fn read_i8(&mut self) -> Result<i8, IoError> {
        self.require(1)?;
        Ok(self.buf.get_i8())
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16, IoError> {
        self.require(2)?;
        Ok(self.buf.get_u16_le())
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16, IoError> {
        self.require(2)?;
        Ok(self.buf.get_i16_le())
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, IoError> {
        self.require(4)?;
        Ok(self.buf.get_u32_le())
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32, IoError> {
        self.require(4)?;
        Ok(self.buf.get_i32_le())
    }

    #[inline]
    pub fn read_u64(&mut self) -> Result<u64, IoError> {
        self.require(8)?;
        Ok(self.buf.get_u64_le())
    }

    #[inline]
    pub fn read_i64(&mut self) -> Result<i64, IoError> {
        self.require(8)?;
        Ok(self.buf.get_i64_le())
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32, IoError> {
        self.require(4)?;
        Ok(self.buf.get_f32_le())
    }

    #[inline]
    pub fn read_f64(&mut self) -> Result<f64, IoError> {
        self.require(8)?;
        Ok(self.buf.get_f64_le())
    }

    /// Read a single `0`/`1` byte as a bool.
    pub fn read_bool(&mut self) -> Result<bool, IoError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(IoError::InvalidBool(byte)),
        }
    }

    // -- variable-length ------------------------------------------------------

    /// Read an unsigned LEB128 varint, 1-5 bytes.
    pub fn read_var_u32(&mut self) -> Result<u32, IoError> {
        let mut value = 0u32;
        for i in 0..MAX_VAR_U32_BYTES {
            let byte = self.read_u8()?;
            value |= ((byte & 0x7F) as u32) << (i * 7);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(IoError::VarIntTooLong {
            max_bytes: MAX_VAR_U32_BYTES,
        })
    }

    /// Read an unsigned LEB128 varint, 1-10 bytes.
    pub fn read_var_u64(&mut self) -> Result<u64, IoError> {
        let mut value = 0u64;
        for i in 0..MAX_VAR_U64_BYTES {
            let byte = self.read_u8()?;
            value |= ((byte & 0x7F) as u64) << (i * 7);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(IoError::VarIntTooLong {
            max_bytes: MAX_VAR_U64_BYTES,
        })
    }

    /// Read a signed varint written by [`Output::write_var_i32`].
    ///
    /// [`Output::write_var_i32`]: crate::Output::write_var_i32
    #[inline]
    pub fn read_var_i32(&mut self, optimize_positive: bool) -> Result<i32, IoError> {
        let raw = self.read_var_u32()?;
        Ok(if optimize_positive {
            raw as i32
        } else {
            unzigzag32(raw)
        })
    }

    /// Read a signed varint written by [`Output::write_var_i64`].
    ///
    /// [`Output::write_var_i64`]: crate::Output::write_var_i64
    #[inline]
    pub fn read_var_i64(&mut self, optimize_positive: bool) -> Result<i64, IoError> {
        let raw = self.read_var_u64()?;
        Ok(if optimize_positive {
            raw as i64
        } else {
            unzigzag64(raw)
        })
    }

    // -- compound -------------------------------------------------------------

    /// Read `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes, IoError> {
        self.require(len)?;
        Ok(self.buf.split_to(len))
    }

    /// Read a char written as a var-u32 scalar value.
    pub fn read_char(&mut self) -> Result<char, IoError> {
        let raw = self.read_var_u32()?;
        char::from_u32(raw).ok_or(IoError::InvalidChar(raw))
    }

    /// Read a var-u32 length prefix.
    #[inline]
    pub fn read_len(&mut self) -> Result<usize, IoError> {
        Ok(self.read_var_u32()? as usize)
    }

    /// Read a string written by [`Output::write_str`].
    ///
    /// [`Output::write_str`]: crate::Output::write_str
    pub fn read_str(&mut self) -> Result<String, IoError> {
        let len = self.read_len()?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| IoError::InvalidUtf8)
    }
}

impl From<Bytes> for Input {
    #[inline]
    fn from(buf: Bytes) -> Self {
        Self::new(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Output;

    #[test]
    fn truncated_reads_fail_without_consuming_past_the_end() {
        let mut input = Input::new(Bytes::from_static(&[0x01, 0x02]));
        assert_eq!(
            input.read_u32(),
            Err(IoError::EndOfStream {
                needed: 4,
                remaining: 2
            })
        );
        // The failed read consumed nothing.
        assert_eq!(input.remaining(), 2);
    }

    #[test]
    fn overlong_varint_is_rejected() {
        let mut input = Input::new(Bytes::from_static(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]));
        assert_eq!(
            input.read_var_u32(),
            Err(IoError::VarIntTooLong { max_bytes: 5 })
        );
    }

    #[test]
    fn bool_shape_is_checked() {
        let mut input = Input::new(Bytes::from_static(&[0x02]));
        assert_eq!(input.read_bool(), Err(IoError::InvalidBool(2)));
    }

    #[test]
    fn string_round_trip_tracks_position() {
        let mut out = Output::new();
        out.write_str("héllo").unwrap();
        let written = out.position();

        let mut input = Input::new(out.into_bytes());
        assert_eq!(input.read_str().unwrap(), "héllo");
        assert_eq!(input.position(), written);
        assert!(input.is_empty());
    }
}
