use alloc::boxed::Box;
use core::any::type_name;

use krait_io::{Input, Output};

use super::{expect_handle, Codec};
use crate::error::CodecError;
use crate::session::Session;
use crate::value::{Handle, Value};

// -----------------------------------------------------------------------------
// HandleCodec

/// Codec for [`Handle`] references: the one place object identity meets the
/// wire.
///
/// Every handle is written as a var-u32 marker. `0` announces a new object,
/// followed by its registry tag and payload; `k > 0` is a back-reference to
/// the `k-1`th object of the current graph. Ids are assigned in first-seen
/// order on both sides, so the tables stay aligned without ids ever
/// appearing on the wire.
///
/// New objects are registered with the session's tracker *before* their
/// payload is written or read. A cycle therefore resolves to an object
/// whose fields are still being populated, which is exactly what makes it
/// representable.
#[derive(Debug, Default, Clone, Copy)]
pub struct HandleCodec;

impl Codec for HandleCodec {
    #[inline]
    fn type_name(&self) -> &'static str {
        type_name::<Handle>()
    }

    fn write(
        &self,
        session: &mut Session<'_>,
        out: &mut Output,
        value: &dyn Value,
    ) -> Result<(), CodecError> {
        let handle = expect_handle(value)?;
        if let Some(id) = session.refs().write_id(handle) {
            out.write_var_u32(id + 1);
            return Ok(());
        }

        out.write_var_u32(0);
        session.refs_mut().track_write(handle);

        let inner = handle.try_borrow().map_err(|_| CodecError::HandleInUse {
            type_name: type_name::<Handle>(),
        })?;
        let tag = session
            .registry()
            .tag_of(inner.ty_id())
            .ok_or(CodecError::UnregisteredType {
                name: inner.type_name(),
            })?;
        out.write_var_u32(tag);

        let codec = session
            .registry()
            .resolve(inner.ty_id())
            .ok_or(CodecError::UnregisteredType {
                name: inner.type_name(),
            })?;
        codec.write(session, out, &*inner)
    }

    fn read(
        &self,
        session: &mut Session<'_>,
        input: &mut Input,
    ) -> Result<Box<dyn Value>, CodecError> {
        let marker = input.read_var_u32()?;
        if marker > 0 {
            let id = marker - 1;
            let handle = session
                .refs()
                .read_object(id)
                .ok_or(CodecError::DanglingReference { id })?;
            return Ok(Box::new(handle));
        }

        let tag = input.read_var_u32()?;
        let codec = session
            .registry()
            .codec_by_tag(tag)
            .ok_or(CodecError::UnknownTag { tag })?;

        match codec.instantiate() {
            Some(blank) => {
                let handle = Handle::from_box(blank);
                session.refs_mut().track_read(&handle);
                let mut target =
                    handle
                        .try_borrow_mut()
                        .map_err(|_| CodecError::HandleInUse {
                            type_name: codec.type_name(),
                        })?;
                codec.read_into(session, input, &mut *target)?;
                drop(target);
                Ok(Box::new(handle))
            }
            None => {
                let value = codec.read(session, input)?;
                let handle = Handle::from_box(value);
                session.refs_mut().track_read(&handle);
                Ok(Box::new(handle))
            }
        }
    }

    fn copy(
        &self,
        session: &mut Session<'_>,
        value: &dyn Value,
    ) -> Result<Box<dyn Value>, CodecError> {
        let handle = expect_handle(value)?;
        if let Some(clone) = session.refs().copy_of(handle) {
            return Ok(Box::new(clone));
        }

        let inner = handle.try_borrow().map_err(|_| CodecError::HandleInUse {
            type_name: type_name::<Handle>(),
        })?;
        let codec = session
            .registry()
            .resolve(inner.ty_id())
            .ok_or(CodecError::UnregisteredType {
                name: inner.type_name(),
            })?;

        match codec.instantiate() {
            Some(blank) => {
                let clone = Handle::from_box(blank);
                session.refs_mut().track_copy(handle, &clone);
                let mut target = clone.try_borrow_mut().map_err(|_| CodecError::HandleInUse {
                    type_name: codec.type_name(),
                })?;
                codec.copy_into(session, &*inner, &mut *target)?;
                drop(target);
                Ok(Box::new(clone))
            }
            None => {
                let copied = codec.copy(session, &*inner)?;
                let clone = Handle::from_box(copied);
                session.refs_mut().track_copy(handle, &clone);
                Ok(Box::new(clone))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CodecRegistry;

    #[test]
    fn repeated_handles_become_back_references() {
        let registry = CodecRegistry::new();
        let mut session = Session::new(&registry);
        let shared = Handle::new(41i32);

        let mut out = Output::new();
        session.write_graph(&mut out, &shared).unwrap();
        session.write_graph(&mut out, &shared).unwrap();

        session.reset();
        let mut input = Input::from(out.into_bytes());
        let first = session.read_graph(&mut input).unwrap();
        let second = session.read_graph(&mut input).unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(
            first.try_borrow().unwrap().downcast_ref::<i32>(),
            Some(&41)
        );
    }

    #[test]
    fn back_reference_to_nothing_is_rejected() {
        let registry = CodecRegistry::new();
        let mut session = Session::new(&registry);
        let mut out = Output::new();
        out.write_var_u32(3);
        let mut input = Input::from(out.into_bytes());
        let err = session.read_graph(&mut input).unwrap_err();
        assert!(matches!(err, CodecError::DanglingReference { id: 2 }));
    }

    #[test]
    fn copy_preserves_sharing() {
        let registry = CodecRegistry::new();
        let mut session = Session::new(&registry);
        let shared = Handle::new(7i32);

        let first = session.copy_graph(&shared).unwrap();
        let second = session.copy_graph(&shared).unwrap();
        assert!(first.ptr_eq(&second));
        assert!(!first.ptr_eq(&shared));
    }
}
