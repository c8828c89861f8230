//! Typed projections from an owner object to one of its fields.
//!
//! A [`FieldAccessor`] erases the owner and field types behind a uniform
//! get/set surface so field codecs can move values in and out of objects
//! they know nothing about statically. The three adapters cover the three
//! field storages: an inline value, an `Option<Handle>` reference and a
//! `Box<dyn Value>` dynamic slot.

use alloc::boxed::Box;
use core::any::type_name;
use core::marker::PhantomData;

use crate::error::{AccessError, AccessErrorKind};
use crate::value::{Handle, Value};

// -----------------------------------------------------------------------------
// FieldAccessor

/// Reads and writes one field of an erased owner object.
///
/// `get` returns `None` for a null reference field; `set` accepts `None`
/// only where the storage can represent one. Passing an owner of the wrong
/// type is an error, not a panic, because the owner arrives erased from the
/// wire path.
pub trait FieldAccessor {
    /// Borrow the field's current value, or `None` if the field is null.
    fn get<'a>(&self, owner: &'a dyn Value) -> Result<Option<&'a dyn Value>, AccessError>;

    /// Store `value` into the field, `None` meaning null.
    fn set(&self, owner: &mut dyn Value, value: Option<Box<dyn Value>>) -> Result<(), AccessError>;
}

fn wrong_owner<O: Value>(field: &'static str, found: &dyn Value) -> AccessError {
    AccessError::new(
        field,
        AccessErrorKind::WrongOwner {
            expected: type_name::<O>(),
            found: found.type_name(),
        },
    )
}

// -----------------------------------------------------------------------------
// ValueAccessor

/// Accessor for a field stored inline as a concrete `F`.
pub struct ValueAccessor<O, F> {
    field: &'static str,
    get: fn(&O) -> &F,
    get_mut: fn(&mut O) -> &mut F,
}

impl<O: Value, F: Value> ValueAccessor<O, F> {
    #[inline]
    pub fn new(field: &'static str, get: fn(&O) -> &F, get_mut: fn(&mut O) -> &mut F) -> Self {
        Self {
            field,
            get,
            get_mut,
        }
    }
}

impl<O: Value, F: Value> FieldAccessor for ValueAccessor<O, F> {
    fn get<'a>(&self, owner: &'a dyn Value) -> Result<Option<&'a dyn Value>, AccessError> {
        let owner = owner
            .downcast_ref::<O>()
            .ok_or_else(|| wrong_owner::<O>(self.field, owner))?;
        Ok(Some((self.get)(owner)))
    }

    fn set(&self, owner: &mut dyn Value, value: Option<Box<dyn Value>>) -> Result<(), AccessError> {
        let found = owner.type_name();
        let owner = owner
            .downcast_mut::<O>()
            .ok_or(AccessError::new(
                self.field,
                AccessErrorKind::WrongOwner {
                    expected: type_name::<O>(),
                    found,
                },
            ))?;
        let value = value.ok_or(AccessError::new(self.field, AccessErrorKind::NullValue))?;
        let found = value.type_name();
        let value = value.take::<F>().ok_or(AccessError::new(
            self.field,
            AccessErrorKind::WrongValue {
                expected: type_name::<F>(),
                found,
            },
        ))?;
        *(self.get_mut)(owner) = value;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// HandleAccessor

/// Accessor for an `Option<Handle>` reference field. `None` is the null
/// representation.
pub struct HandleAccessor<O> {
    field: &'static str,
    get: fn(&O) -> &Option<Handle>,
    get_mut: fn(&mut O) -> &mut Option<Handle>,
}

impl<O: Value> HandleAccessor<O> {
    #[inline]
    pub fn new(
        field: &'static str,
        get: fn(&O) -> &Option<Handle>,
        get_mut: fn(&mut O) -> &mut Option<Handle>,
    ) -> Self {
        Self {
            field,
            get,
            get_mut,
        }
    }
}

impl<O: Value> FieldAccessor for HandleAccessor<O> {
    fn get<'a>(&self, owner: &'a dyn Value) -> Result<Option<&'a dyn Value>, AccessError> {
        let owner = owner
            .downcast_ref::<O>()
            .ok_or_else(|| wrong_owner::<O>(self.field, owner))?;
        Ok((self.get)(owner).as_ref().map(|handle| handle as &dyn Value))
    }

    fn set(&self, owner: &mut dyn Value, value: Option<Box<dyn Value>>) -> Result<(), AccessError> {
        let found = owner.type_name();
        let owner = owner.downcast_mut::<O>().ok_or(AccessError::new(
            self.field,
            AccessErrorKind::WrongOwner {
                expected: type_name::<O>(),
                found,
            },
        ))?;
        let slot = (self.get_mut)(owner);
        match value {
            None => {
                *slot = None;
                Ok(())
            }
            Some(value) => {
                let found = value.type_name();
                let handle = value.take::<Handle>().ok_or(AccessError::new(
                    self.field,
                    AccessErrorKind::WrongValue {
                        expected: type_name::<Handle>(),
                        found,
                    },
                ))?;
                *slot = Some(handle);
                Ok(())
            }
        }
    }
}

// -----------------------------------------------------------------------------
// DynAccessor

/// Accessor for a `Box<dyn Value>` slot, used by dynamic and
/// generic-parameter fields whose concrete type varies at runtime.
pub struct DynAccessor<O> {
    field: &'static str,
    get: fn(&O) -> &Box<dyn Value>,
    get_mut: fn(&mut O) -> &mut Box<dyn Value>,
    _owner: PhantomData<fn() -> O>,
}

impl<O: Value> DynAccessor<O> {
    #[inline]
    pub fn new(
        field: &'static str,
        get: fn(&O) -> &Box<dyn Value>,
        get_mut: fn(&mut O) -> &mut Box<dyn Value>,
    ) -> Self {
        Self {
            field,
            get,
            get_mut,
            _owner: PhantomData,
        }
    }
}

impl<O: Value> FieldAccessor for DynAccessor<O> {
    fn get<'a>(&self, owner: &'a dyn Value) -> Result<Option<&'a dyn Value>, AccessError> {
        let owner = owner
            .downcast_ref::<O>()
            .ok_or_else(|| wrong_owner::<O>(self.field, owner))?;
        Ok(Some(&**(self.get)(owner)))
    }

    fn set(&self, owner: &mut dyn Value, value: Option<Box<dyn Value>>) -> Result<(), AccessError> {
        let found = owner.type_name();
        let owner = owner.downcast_mut::<O>().ok_or(AccessError::new(
            self.field,
            AccessErrorKind::WrongOwner {
                expected: type_name::<O>(),
                found,
            },
        ))?;
        let value = value.ok_or(AccessError::new(self.field, AccessErrorKind::NullValue))?;
        *(self.get_mut)(owner) = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_value;

    #[derive(Debug, Default)]
    struct Sample {
        score: i32,
        next: Option<Handle>,
    }

    impl_value!(Sample);

    #[test]
    fn value_accessor_round_trips() {
        let accessor =
            ValueAccessor::<Sample, i32>::new("score", |s| &s.score, |s| &mut s.score);
        let mut sample = Sample::default();
        accessor.set(&mut sample, Some(Box::new(9i32))).unwrap();
        assert_eq!(sample.score, 9);
        let got = accessor.get(&sample).unwrap().unwrap();
        assert_eq!(got.downcast_ref::<i32>(), Some(&9));
    }

    #[test]
    fn value_accessor_rejects_null_and_mismatch() {
        let accessor =
            ValueAccessor::<Sample, i32>::new("score", |s| &s.score, |s| &mut s.score);
        let mut sample = Sample::default();
        let err = accessor.set(&mut sample, None).unwrap_err();
        assert_eq!(*err.kind(), AccessErrorKind::NullValue);
        let err = accessor
            .set(&mut sample, Some(Box::new(1.5f64)))
            .unwrap_err();
        assert!(matches!(err.kind(), AccessErrorKind::WrongValue { .. }));
    }

    #[test]
    fn value_accessor_rejects_wrong_owner() {
        let accessor =
            ValueAccessor::<Sample, i32>::new("score", |s| &s.score, |s| &mut s.score);
        let err = accessor.get(&3i32).unwrap_err();
        assert!(matches!(err.kind(), AccessErrorKind::WrongOwner { .. }));
    }

    #[test]
    fn handle_accessor_represents_null_as_none() {
        let accessor = HandleAccessor::<Sample>::new("next", |s| &s.next, |s| &mut s.next);
        let mut sample = Sample::default();
        assert!(accessor.get(&sample).unwrap().is_none());

        let handle = Handle::new(5i32);
        accessor
            .set(&mut sample, Some(Box::new(handle.clone())))
            .unwrap();
        let stored = accessor.get(&sample).unwrap().unwrap();
        assert!(stored.downcast_ref::<Handle>().unwrap().ptr_eq(&handle));

        accessor.set(&mut sample, None).unwrap();
        assert!(sample.next.is_none());
    }
}
