//! Per-graph serialization state.

mod scope_stack;
mod tracker;

pub use scope_stack::ScopeStack;
pub use tracker::ReferenceTracker;

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::any::TypeId;

use krait_io::{Input, Output};

use crate::error::CodecError;
use crate::info::GenericScope;
use crate::registry::CodecRegistry;
use crate::value::{Handle, Value};

// -----------------------------------------------------------------------------
// Session

/// One serialization session: a registry borrow plus the mutable state a
/// single object graph needs.
///
/// A session is single-threaded and serial; recursive codec invocations
/// re-enter the same session. State accumulated for one graph (reference
/// identities, pushed scopes) is discarded by [`Session::reset`] before the
/// next graph shares the session.
///
/// # Examples
///
/// ```
/// use krait_codec::{CodecRegistry, Session};
/// use krait_io::{Input, Output};
///
/// let registry = CodecRegistry::new();
/// let mut session = Session::new(&registry);
///
/// let mut out = Output::new();
/// session.write_value(&mut out, &123i32).unwrap();
///
/// let mut input = Input::from(out.into_bytes());
/// let value = session
///     .read_value(&mut input, core::any::TypeId::of::<i32>())
///     .unwrap();
/// assert_eq!(value.downcast_ref::<i32>(), Some(&123));
/// ```
pub struct Session<'r> {
    registry: &'r CodecRegistry,
    scopes: ScopeStack,
    refs: ReferenceTracker,
}

impl<'r> Session<'r> {
    #[inline]
    pub fn new(registry: &'r CodecRegistry) -> Self {
        Self {
            registry,
            scopes: ScopeStack::new(),
            refs: ReferenceTracker::new(),
        }
    }

    /// The registry this session resolves codecs from.
    #[inline]
    pub fn registry(&self) -> &'r CodecRegistry {
        self.registry
    }

    /// The active generic scopes.
    #[inline]
    pub fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    #[inline]
    pub(crate) fn refs(&self) -> &ReferenceTracker {
        &self.refs
    }

    #[inline]
    pub(crate) fn refs_mut(&mut self) -> &mut ReferenceTracker {
        &mut self.refs
    }

    /// Forget all per-graph state. Call between independent object graphs.
    pub fn reset(&mut self) {
        self.scopes.clear();
        self.refs.clear();
    }

    /// Run `f` with `scope` pushed (when present), popping it again whether
    /// `f` succeeds or fails.
    pub(crate) fn scoped<T>(
        &mut self,
        scope: Option<Rc<GenericScope>>,
        f: impl FnOnce(&mut Self) -> Result<T, CodecError>,
    ) -> Result<T, CodecError> {
        match scope {
            None => f(self),
            Some(scope) => {
                self.scopes.push(scope);
                let result = f(self);
                self.scopes.pop();
                result
            }
        }
    }

    // -- untagged top level ---------------------------------------------------

    /// Write `value` with the codec registered for its runtime type. No
    /// type tag is written; the reader must know the type.
    pub fn write_value(&mut self, out: &mut Output, value: &dyn Value) -> Result<(), CodecError> {
        let codec = self
            .registry
            .resolve(value.ty_id())
            .ok_or(CodecError::UnregisteredType {
                name: value.type_name(),
            })?;
        codec.write(self, out, value)
    }

    /// Read a value of the statically known type `id`.
    pub fn read_value(&mut self, input: &mut Input, id: TypeId) -> Result<Box<dyn Value>, CodecError> {
        let codec = self
            .registry
            .resolve(id)
            .ok_or(CodecError::UnregisteredType {
                name: self.registry.type_name_of(id).unwrap_or("<unregistered>"),
            })?;
        codec.read(self, input)
    }

    /// Deep-copy `value` in memory, preserving shared references.
    pub fn copy_value(&mut self, value: &dyn Value) -> Result<Box<dyn Value>, CodecError> {
        let codec = self
            .registry
            .resolve(value.ty_id())
            .ok_or(CodecError::UnregisteredType {
                name: value.type_name(),
            })?;
        codec.copy(self, value)
    }

    // -- tagged top level -----------------------------------------------------

    /// Write `value` prefixed with its registry tag, so the reader needs no
    /// static type knowledge.
    pub fn write_any(&mut self, out: &mut Output, value: &dyn Value) -> Result<(), CodecError> {
        let tag = self
            .registry
            .tag_of(value.ty_id())
            .ok_or(CodecError::UnregisteredType {
                name: value.type_name(),
            })?;
        out.write_var_u32(tag);
        self.write_value(out, value)
    }

    /// Read a tag-prefixed value of any registered type.
    pub fn read_any(&mut self, input: &mut Input) -> Result<Box<dyn Value>, CodecError> {
        let tag = input.read_var_u32()?;
        let codec = self
            .registry
            .codec_by_tag(tag)
            .ok_or(CodecError::UnknownTag { tag })?;
        codec.read(self, input)
    }

    // -- graphs ---------------------------------------------------------------

    /// Write the object graph reachable from `root`.
    pub fn write_graph(&mut self, out: &mut Output, root: &Handle) -> Result<(), CodecError> {
        self.write_value(out, root)
    }

    /// Read an object graph written by [`Session::write_graph`].
    pub fn read_graph(&mut self, input: &mut Input) -> Result<Handle, CodecError> {
        let value = self.read_value(input, TypeId::of::<Handle>())?;
        let found = value.type_name();
        value.take::<Handle>().ok_or(CodecError::WrongType {
            expected: "krait_codec::value::Handle",
            found,
        })
    }

    /// Deep-copy the object graph reachable from `root`. Shared and cyclic
    /// references in the original stay shared in the copy.
    pub fn copy_graph(&mut self, root: &Handle) -> Result<Handle, CodecError> {
        let value = self.copy_value(root)?;
        let found = value.type_name();
        value.take::<Handle>().ok_or(CodecError::WrongType {
            expected: "krait_codec::value::Handle",
            found,
        })
    }
}
