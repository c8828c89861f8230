use core::{error, fmt};

// -----------------------------------------------------------------------------
// IoError

/// An enumeration of all error outcomes of reading from an [`Input`].
///
/// Writes to an [`Output`] only grow a buffer and cannot fail, except for
/// lengths that do not fit the wire's `u32` length prefix.
///
/// [`Input`]: crate::Input
/// [`Output`]: crate::Output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoError {
    /// A read ran past the end of the buffer.
    EndOfStream { needed: usize, remaining: usize },
    /// A variable-length integer did not terminate within its byte budget.
    VarIntTooLong { max_bytes: usize },
    /// A bool byte was neither 0 nor 1.
    InvalidBool(u8),
    /// A char scalar value outside the valid `char` range.
    InvalidChar(u32),
    /// String bytes were not valid UTF-8.
    InvalidUtf8,
    /// A length does not fit the `u32` length prefix.
    LengthOverflow { len: u64 },
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfStream { needed, remaining } => {
                write!(
                    f,
                    "end of stream: needed {needed} byte(s), {remaining} remaining"
                )
            }
            Self::VarIntTooLong { max_bytes } => {
                write!(f, "varint not terminated within {max_bytes} byte(s)")
            }
            Self::InvalidBool(byte) => write!(f, "invalid bool byte {byte:#04x}"),
            Self::InvalidChar(value) => write!(f, "invalid char scalar value {value:#x}"),
            Self::InvalidUtf8 => write!(f, "string bytes are not valid UTF-8"),
            Self::LengthOverflow { len } => {
                write!(f, "length {len} exceeds the u32 length prefix")
            }
        }
    }
}

impl error::Error for IoError {}
