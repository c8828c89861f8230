#![doc = include_str!("../README.md")]
#![no_std]

pub use krait_codec as codec;
pub use krait_io as io;
