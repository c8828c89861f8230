#![doc = include_str!("../README.md")]
#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod access;
pub mod codec;
mod config;
pub mod error;
pub mod info;
pub mod registry;
pub mod session;
pub mod value;

mod macros;

pub use config::CodecConfig;
pub use error::{AccessError, AccessErrorKind, CodecError};
pub use registry::CodecRegistry;
pub use session::Session;
pub use value::{Handle, Value};

#[doc(hidden)]
pub mod __macro_exports {
    pub use alloc::boxed::Box;
}
