use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{BorrowError, BorrowMutError, Ref, RefCell, RefMut};
use core::fmt;

use crate::impl_value;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Handle

/// A counted, interior-mutable reference to a [`Value`].
///
/// `Handle` is how a described object points at another object. Two fields
/// holding clones of the same handle share one underlying value, and a
/// handle may (indirectly) point back at itself; the session's reference
/// tracker preserves exactly this topology across write/read/copy. A
/// nullable field stores an `Option<Handle>`.
///
/// Identity is the `Rc` allocation: [`Handle::ptr_eq`] is the sharing test
/// that round-trip assertions use.
///
/// # Examples
///
/// ```
/// use krait_codec::value::Handle;
///
/// let a = Handle::new(10i32);
/// let b = a.clone();
/// assert!(a.ptr_eq(&b));
///
/// *b.try_borrow_mut().unwrap().downcast_mut::<i32>().unwrap() = 11;
/// assert_eq!(a.try_borrow().unwrap().downcast_ref::<i32>(), Some(&11));
/// ```
#[derive(Clone)]
pub struct Handle(Rc<RefCell<Box<dyn Value>>>);

impl Handle {
    /// Create a handle owning `value`.
    #[inline]
    pub fn new(value: impl Value) -> Self {
        Self::from_box(Box::new(value))
    }

    /// Create a handle owning an already boxed value.
    #[inline]
    pub fn from_box(value: Box<dyn Value>) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Borrow the underlying value.
    ///
    /// Fails while a mutable borrow is live, which during codec operations
    /// means the object is currently being populated.
    #[inline]
    pub fn try_borrow(&self) -> Result<Ref<'_, dyn Value>, BorrowError> {
        self.0.try_borrow().map(|r| Ref::map(r, |boxed| &**boxed))
    }

    /// Mutably borrow the underlying value.
    #[inline]
    pub fn try_borrow_mut(&self) -> Result<RefMut<'_, dyn Value>, BorrowMutError> {
        self.0
            .try_borrow_mut()
            .map(|r| RefMut::map(r, |boxed| &mut **boxed))
    }

    /// Whether two handles point at the same underlying object.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of live clones of this handle.
    #[inline]
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Stable map key for the reference tracker. Only meaningful while a
    /// clone of the handle is kept alive.
    #[inline]
    pub(crate) fn key(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

// Equality is handle identity, the same test as [`Handle::ptr_eq`].
impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// The underlying value may be part of a reference cycle; printing the
// address instead of the value keeps `Debug` from recursing forever.
impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:#x})", self.key())
    }
}

impl_value!(Handle);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_identity() {
        let a = Handle::new(1i32);
        let b = a.clone();
        let c = Handle::new(1i32);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn borrow_conflicts_are_reported_not_panicked() {
        let a = Handle::new(1i32);
        let _guard = a.try_borrow_mut().unwrap();
        assert!(a.try_borrow().is_err());
        assert!(a.try_borrow_mut().is_err());
    }
}
