//! Codecs: the write/read/copy strategies values travel through.

mod field_codec;
mod handle;
mod object_codec;
mod plan;
mod primitives;

pub use field_codec::{FieldCodec, IntEncoding};
pub use handle::HandleCodec;
pub use object_codec::ObjectCodec;
pub use plan::FieldPlan;
pub use primitives::{
    BoolCodec, CharCodec, F32Codec, F64Codec, I8Codec, I16Codec, I32Codec, I64Codec, StringCodec,
    U8Codec, U16Codec, U32Codec, U64Codec, UnitCodec,
};

use alloc::boxed::Box;

use krait_io::{Input, Output};

use crate::error::CodecError;
use crate::session::Session;
use crate::value::{Handle, Value};

// -----------------------------------------------------------------------------
// Codec

/// A strategy for moving one type's values to and from the wire and through
/// in-memory copies.
///
/// The three mandatory operations work on whole values. The three
/// `*_into`/`instantiate` hooks split creation from population; a codec
/// that supports them lets the [`HandleCodec`] register a blank object with
/// the reference tracker before its fields are populated, which is what
/// makes cyclic graphs decodable.
pub trait Codec: 'static {
    /// The name of the type this codec serves, for diagnostics.
    fn type_name(&self) -> &'static str;

    /// Encode `value` onto `out`.
    fn write(
        &self,
        session: &mut Session<'_>,
        out: &mut Output,
        value: &dyn Value,
    ) -> Result<(), CodecError>;

    /// Decode one value from `input`.
    fn read(&self, session: &mut Session<'_>, input: &mut Input)
        -> Result<Box<dyn Value>, CodecError>;

    /// Deep-copy `value` in memory.
    fn copy(&self, session: &mut Session<'_>, value: &dyn Value)
        -> Result<Box<dyn Value>, CodecError>;

    /// Produce a blank value to be populated by [`Codec::read_into`] or
    /// [`Codec::copy_into`], or `None` if this codec only reads whole
    /// values.
    fn instantiate(&self) -> Option<Box<dyn Value>> {
        None
    }

    /// Populate a blank `target` from the stream.
    fn read_into(
        &self,
        _session: &mut Session<'_>,
        _input: &mut Input,
        _target: &mut dyn Value,
    ) -> Result<(), CodecError> {
        Err(CodecError::Unsupported {
            op: "read_into",
            codec: self.type_name(),
        })
    }

    /// Populate a blank `target` from `original`.
    fn copy_into(
        &self,
        _session: &mut Session<'_>,
        _original: &dyn Value,
        _target: &mut dyn Value,
    ) -> Result<(), CodecError> {
        Err(CodecError::Unsupported {
            op: "copy_into",
            codec: self.type_name(),
        })
    }
}

/// Downcast helper shared by the leaf codecs: a value of the wrong runtime
/// type is a [`CodecError::WrongType`], never a panic.
#[inline]
fn expect<'a, T: Value>(value: &'a dyn Value, expected: &'static str) -> Result<&'a T, CodecError> {
    value.downcast_ref::<T>().ok_or(CodecError::WrongType {
        expected,
        found: value.type_name(),
    })
}

#[inline]
fn expect_handle<'a>(value: &'a dyn Value) -> Result<&'a Handle, CodecError> {
    expect::<Handle>(value, "krait_codec::value::Handle")
}
