#![doc = include_str!("../README.md")]
#![no_std]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod input;
mod output;

pub use error::IoError;
pub use input::Input;
pub use output::Output;

// -----------------------------------------------------------------------------
// Wire constants

/// Maximum encoded size of a variable-length `u32`: 7 bits per byte.
pub const MAX_VAR_U32_BYTES: usize = 5;

/// Maximum encoded size of a variable-length `u64`: 7 bits per byte.
pub const MAX_VAR_U64_BYTES: usize = 10;

/// Map `i32` to `u32` so that small magnitudes become small values.
///
/// The sign bit moves to bit 0: `0, -1, 1, -2, ...` map to `0, 1, 2, 3, ...`.
#[inline]
pub const fn zigzag32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag32`].
#[inline]
pub const fn unzigzag32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Map `i64` to `u64` so that small magnitudes become small values.
#[inline]
pub const fn zigzag64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag64`].
#[inline]
pub const fn unzigzag64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zigzag_small_magnitudes() {
        assert_eq!(zigzag32(0), 0);
        assert_eq!(zigzag32(-1), 1);
        assert_eq!(zigzag32(1), 2);
        assert_eq!(zigzag32(-2), 3);
        assert_eq!(zigzag32(i32::MIN), u32::MAX);
        assert_eq!(zigzag64(-1), 1);
        assert_eq!(zigzag64(i64::MIN), u64::MAX);
    }

    #[test]
    fn zigzag_round_trips() {
        for v in [0, 1, -1, 63, -64, 64, i32::MAX, i32::MIN] {
            assert_eq!(unzigzag32(zigzag32(v)), v);
        }
        for v in [0, 1, -1, i64::MAX, i64::MIN] {
            assert_eq!(unzigzag64(zigzag64(v)), v);
        }
    }
}
