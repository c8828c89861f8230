//! Leaf codecs for the scalar types the registry pre-registers.
//!
//! Integers and floats use fixed-width little-endian encodings here; the
//! variable-length integer modes are a per-field concern handled by
//! [`FieldCodec`](super::FieldCodec), not by these registry codecs.

use alloc::boxed::Box;
use alloc::string::String;
use core::any::type_name;

use krait_io::{Input, Output};

use super::{expect, Codec};
use crate::error::CodecError;
use crate::session::Session;
use crate::value::Value;

macro_rules! scalar_codec {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $write:ident, $read:ident) => {
        $(#[$doc])*
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl Codec for $name {
            #[inline]
            fn type_name(&self) -> &'static str {
                type_name::<$ty>()
            }

            fn write(
                &self,
                _session: &mut Session<'_>,
                out: &mut Output,
                value: &dyn Value,
            ) -> Result<(), CodecError> {
                out.$write(*expect::<$ty>(value, type_name::<$ty>())?);
                Ok(())
            }

            fn read(
                &self,
                _session: &mut Session<'_>,
                input: &mut Input,
            ) -> Result<Box<dyn Value>, CodecError> {
                Ok(Box::new(input.$read()?))
            }

            fn copy(
                &self,
                _session: &mut Session<'_>,
                value: &dyn Value,
            ) -> Result<Box<dyn Value>, CodecError> {
                Ok(Box::new(*expect::<$ty>(value, type_name::<$ty>())?))
            }
        }
    };
}

scalar_codec!(I8Codec, i8, write_i8, read_i8);
scalar_codec!(I16Codec, i16, write_i16, read_i16);
scalar_codec!(I32Codec, i32, write_i32, read_i32);
scalar_codec!(I64Codec, i64, write_i64, read_i64);
scalar_codec!(U8Codec, u8, write_u8, read_u8);
scalar_codec!(U16Codec, u16, write_u16, read_u16);
scalar_codec!(U32Codec, u32, write_u32, read_u32);
scalar_codec!(U64Codec, u64, write_u64, read_u64);
scalar_codec!(F32Codec, f32, write_f32, read_f32);
scalar_codec!(F64Codec, f64, write_f64, read_f64);
scalar_codec!(
    /// One byte, 0 or 1; anything else is a stream error on read.
    BoolCodec, bool, write_bool, read_bool
);
scalar_codec!(
    /// Var-u32 scalar value, validated on read.
    CharCodec, char, write_char, read_char
);

// -----------------------------------------------------------------------------
// StringCodec

/// Var-u32 byte length followed by UTF-8 bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringCodec;

impl Codec for StringCodec {
    #[inline]
    fn type_name(&self) -> &'static str {
        type_name::<String>()
    }

    fn write(
        &self,
        _session: &mut Session<'_>,
        out: &mut Output,
        value: &dyn Value,
    ) -> Result<(), CodecError> {
        out.write_str(expect::<String>(value, type_name::<String>())?)?;
        Ok(())
    }

    fn read(
        &self,
        _session: &mut Session<'_>,
        input: &mut Input,
    ) -> Result<Box<dyn Value>, CodecError> {
        Ok(Box::new(input.read_str()?))
    }

    fn copy(
        &self,
        _session: &mut Session<'_>,
        value: &dyn Value,
    ) -> Result<Box<dyn Value>, CodecError> {
        Ok(Box::new(
            expect::<String>(value, type_name::<String>())?.clone(),
        ))
    }
}

// -----------------------------------------------------------------------------
// UnitCodec

/// Zero bytes on the wire.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnitCodec;

impl Codec for UnitCodec {
    #[inline]
    fn type_name(&self) -> &'static str {
        type_name::<()>()
    }

    fn write(
        &self,
        _session: &mut Session<'_>,
        _out: &mut Output,
        value: &dyn Value,
    ) -> Result<(), CodecError> {
        expect::<()>(value, type_name::<()>())?;
        Ok(())
    }

    fn read(
        &self,
        _session: &mut Session<'_>,
        _input: &mut Input,
    ) -> Result<Box<dyn Value>, CodecError> {
        Ok(Box::new(()))
    }

    fn copy(
        &self,
        _session: &mut Session<'_>,
        value: &dyn Value,
    ) -> Result<Box<dyn Value>, CodecError> {
        expect::<()>(value, type_name::<()>())?;
        Ok(Box::new(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CodecRegistry;

    #[test]
    fn scalar_codecs_round_trip() {
        let registry = CodecRegistry::new();
        let mut session = Session::new(&registry);
        let mut out = Output::new();

        let codec = I32Codec;
        codec.write(&mut session, &mut out, &-5i32).unwrap();
        let codec = StringCodec;
        codec
            .write(&mut session, &mut out, &String::from("krait"))
            .unwrap();

        let mut input = Input::from(out.into_bytes());
        let n = I32Codec.read(&mut session, &mut input).unwrap();
        assert_eq!(n.downcast_ref::<i32>(), Some(&-5));
        let s = StringCodec.read(&mut session, &mut input).unwrap();
        assert_eq!(s.downcast_ref::<String>().map(String::as_str), Some("krait"));
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn wrong_runtime_type_is_an_error() {
        let registry = CodecRegistry::new();
        let mut session = Session::new(&registry);
        let mut out = Output::new();
        let err = I32Codec
            .write(&mut session, &mut out, &1.5f64)
            .unwrap_err();
        assert!(matches!(err, CodecError::WrongType { .. }));
    }
}
