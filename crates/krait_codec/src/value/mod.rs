//! The dynamic value model: everything the codec touches is a [`Value`].

mod handle;
mod impls;

pub use handle::Handle;

use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

// -----------------------------------------------------------------------------
// Value

/// The foundational trait of the codec's dynamic value model.
///
/// Field values, owner objects and everything stored behind a [`Handle`]
/// implement `Value`. It is intentionally small: identity, debug formatting
/// and `Any` conversions; structure comes from [`TypeDescriptor`]s rather
/// than from the trait.
///
/// Implement it with [`impl_value!`]:
///
/// ```
/// use krait_codec::impl_value;
///
/// #[derive(Debug, Default)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl_value!(Point);
/// ```
///
/// # Type identification
///
/// Note that [`Any::type_id`] on a `Box<dyn Value>` returns the container's
/// type id, not the inner value's. Use [`Value::ty_id`] instead.
///
/// [`TypeDescriptor`]: crate::info::TypeDescriptor
/// [`impl_value!`]: crate::impl_value
pub trait Value: Any + fmt::Debug {
    /// Returns the full type path of the concrete value.
    fn type_name(&self) -> &'static str;

    /// Returns the `TypeId` of the concrete value.
    fn ty_id(&self) -> TypeId;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl dyn Value {
    /// Check if the concrete value is a `T`.
    #[inline]
    pub fn is<T: Value>(&self) -> bool {
        self.ty_id() == TypeId::of::<T>()
    }

    /// Downcast to a shared `T` reference, if the types match.
    #[inline]
    pub fn downcast_ref<T: Value>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Downcast to a mutable `T` reference, if the types match.
    #[inline]
    pub fn downcast_mut<T: Value>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }

    /// Unbox into a concrete `T`, or `None` (consuming the box) on mismatch.
    #[inline]
    pub fn take<T: Value>(self: Box<Self>) -> Option<T> {
        self.into_any().downcast().ok().map(|boxed| *boxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    #[test]
    fn ty_id_sees_through_the_box() {
        let value: Box<dyn Value> = Box::new(7i32);
        assert!(value.is::<i32>());
        assert_eq!(value.downcast_ref::<i32>(), Some(&7));
        assert_eq!(value.take::<i32>(), Some(7));
    }

    #[test]
    fn take_rejects_the_wrong_type() {
        let value: Box<dyn Value> = Box::new(String::from("x"));
        assert_eq!(value.take::<i32>(), None);
    }
}
