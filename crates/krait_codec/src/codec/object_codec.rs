use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Ref, RefCell, RefMut};

use hashbrown::HashSet;
use krait_io::{Input, Output};

use super::{Codec, FieldCodec, FieldPlan};
use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::info::{TypeArg, TypeDescriptor};
use crate::session::Session;
use crate::value::Value;

// -----------------------------------------------------------------------------
// ObjectCodec

/// The field-driven codec for one described type.
///
/// An object codec owns a compiled [`FieldPlan`] and walks it for every
/// write, read and copy. The plan is behind a `RefCell` so per-field tuning
/// and generic rebinding go through a shared registration handle; a session
/// is single-threaded, so recursive invocations of the same codec take
/// nested shared borrows and plan mutation is only refused while an
/// operation is actually on the stack ([`CodecError::PlanInUse`]).
///
/// Field order on the wire is the plan order: declaring depth descending,
/// then name ascending. Writes and reads run active fields first, then
/// transient fields when the config serializes them; copies run transient
/// fields first.
pub struct ObjectCodec {
    descriptor: Rc<TypeDescriptor>,
    config: CodecConfig,
    plan: RefCell<FieldPlan>,
    context: Rc<RefCell<HashSet<&'static str>>>,
    removed: RefCell<HashSet<&'static str>>,
}

impl core::fmt::Debug for ObjectCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObjectCodec")
            .field("type", &self.descriptor.name())
            .finish_non_exhaustive()
    }
}

impl ObjectCodec {
    /// Compile the plan eagerly; a descriptor that cannot produce a valid
    /// plan fails registration rather than the first write.
    pub(crate) fn new(
        descriptor: Rc<TypeDescriptor>,
        config: CodecConfig,
        args: Option<&[TypeArg]>,
        context: Rc<RefCell<HashSet<&'static str>>>,
    ) -> Result<Self, CodecError> {
        let plan = FieldPlan::build(&descriptor, &config, args, &context.borrow())?;
        Ok(Self {
            descriptor,
            config,
            plan: RefCell::new(plan),
            context,
            removed: RefCell::new(HashSet::new()),
        })
    }

    /// The descriptor this codec was compiled from.
    #[inline]
    pub fn target(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Rebuild the whole plan from the descriptor, picking up context-key
    /// changes. Per-field tuning is reset and bound generic arguments
    /// survive; fields taken out with [`ObjectCodec::remove_field`] stay
    /// removed.
    pub fn update_fields(&self) -> Result<(), CodecError> {
        let mut plan = self.plan_mut()?;
        let args: Option<Vec<TypeArg>> = plan.bound_args().map(<[TypeArg]>::to_vec);
        let mut rebuilt = FieldPlan::build(
            &self.descriptor,
            &self.config,
            args.as_deref(),
            &self.context.borrow(),
        )?;
        for name in self.removed.borrow().iter() {
            if let Some(index) = rebuilt.position(name) {
                rebuilt.remove_active_at(index);
            }
        }
        *plan = rebuilt;
        Ok(())
    }

    /// Bind concrete arguments to the descriptor's generic parameters.
    ///
    /// Only the bindings are recomputed; the field sequences, their order
    /// and any per-field tuning stay as they are. A no-op when the config
    /// disables generics optimization.
    pub fn set_generics(&self, args: &[TypeArg]) -> Result<(), CodecError> {
        if !self.config.optimized_generics() {
            return Ok(());
        }
        self.plan_mut()?
            .rebind(&self.descriptor, &self.config, Some(args))
    }

    /// The currently bound generic arguments, or `None` when unset or when
    /// generics optimization is disabled.
    pub fn generics(&self) -> Option<Vec<TypeArg>> {
        let plan = self.plan.try_borrow().ok()?;
        plan.bound_args().map(<[TypeArg]>::to_vec)
    }

    /// Borrow the active-plan field named `name`.
    pub fn field(&self, name: &str) -> Result<Ref<'_, FieldCodec>, CodecError> {
        let plan = self.plan()?;
        Ref::filter_map(plan, |plan: &FieldPlan| {
            plan.active().iter().find(|field| field.name() == name)
        })
        .map_err(|_| self.not_found(name))
    }

    /// Mutably borrow the active-plan field named `name`, for per-field
    /// tuning such as [`FieldCodec::set_var_int`].
    pub fn field_mut(&self, name: &str) -> Result<RefMut<'_, FieldCodec>, CodecError> {
        let plan = self.plan_mut()?;
        RefMut::filter_map(plan, |plan: &mut FieldPlan| {
            plan.active_mut().iter_mut().find(|field| field.name() == name)
        })
        .map_err(|_| self.not_found(name))
    }

    /// Remove the active-plan field named `name`; it no longer travels on
    /// the wire, and it stays removed across [`ObjectCodec::update_fields`]
    /// rebuilds.
    pub fn remove_field(&self, name: &str) -> Result<FieldCodec, CodecError> {
        let mut plan = self.plan_mut()?;
        let index = plan.position(name).ok_or_else(|| self.not_found(name))?;
        let codec = plan
            .remove_active_at(index)
            .ok_or_else(|| self.not_found(name))?;
        self.removed.borrow_mut().insert(codec.name());
        Ok(codec)
    }

    /// Remove the active-plan field at `index` (plan order).
    pub fn remove_field_at(&self, index: usize) -> Result<FieldCodec, CodecError> {
        let codec = self.plan_mut()?.remove_active_at(index).ok_or(
            CodecError::FieldNotFound {
                field: Cow::Owned(format!("#{index}")),
                owner: self.descriptor.name(),
            },
        )?;
        self.removed.borrow_mut().insert(codec.name());
        Ok(codec)
    }

    /// Borrow the active plan in order.
    pub fn fields(&self) -> Result<Ref<'_, [FieldCodec]>, CodecError> {
        Ok(Ref::map(self.plan()?, FieldPlan::active))
    }

    /// Borrow the transient plan in order.
    pub fn transient_fields(&self) -> Result<Ref<'_, [FieldCodec]>, CodecError> {
        Ok(Ref::map(self.plan()?, FieldPlan::transient))
    }

    fn plan(&self) -> Result<Ref<'_, FieldPlan>, CodecError> {
        self.plan.try_borrow().map_err(|_| CodecError::PlanInUse {
            owner: self.descriptor.name(),
        })
    }

    fn plan_mut(&self) -> Result<RefMut<'_, FieldPlan>, CodecError> {
        self.plan
            .try_borrow_mut()
            .map_err(|_| CodecError::PlanInUse {
                owner: self.descriptor.name(),
            })
    }

    fn not_found(&self, name: &str) -> CodecError {
        CodecError::FieldNotFound {
            field: Cow::Owned(String::from(name)),
            owner: self.descriptor.name(),
        }
    }

    fn check(&self, value: &dyn Value) -> Result<(), CodecError> {
        if value.ty_id() == self.descriptor.id() {
            Ok(())
        } else {
            Err(CodecError::WrongType {
                expected: self.descriptor.name(),
                found: value.type_name(),
            })
        }
    }
}

impl Codec for ObjectCodec {
    #[inline]
    fn type_name(&self) -> &'static str {
        self.descriptor.name()
    }

    fn write(
        &self,
        session: &mut Session<'_>,
        out: &mut Output,
        value: &dyn Value,
    ) -> Result<(), CodecError> {
        log::trace!("write `{}`", self.descriptor.name());
        self.check(value)?;
        let plan = self.plan()?;
        session.scoped(plan.scope(), |session| {
            for field in plan.active() {
                field.write(session, out, value)?;
            }
            if self.config.serialize_transient() {
                for field in plan.transient() {
                    field.write(session, out, value)?;
                }
            }
            Ok(())
        })
    }

    fn read(
        &self,
        session: &mut Session<'_>,
        input: &mut Input,
    ) -> Result<Box<dyn Value>, CodecError> {
        let mut value = self.descriptor.instantiate();
        self.read_into(session, input, &mut *value)?;
        Ok(value)
    }

    fn copy(
        &self,
        session: &mut Session<'_>,
        value: &dyn Value,
    ) -> Result<Box<dyn Value>, CodecError> {
        let mut clone = self.descriptor.instantiate_copy(value);
        self.copy_into(session, value, &mut *clone)?;
        Ok(clone)
    }

    #[inline]
    fn instantiate(&self) -> Option<Box<dyn Value>> {
        Some(self.descriptor.instantiate())
    }

    fn read_into(
        &self,
        session: &mut Session<'_>,
        input: &mut Input,
        target: &mut dyn Value,
    ) -> Result<(), CodecError> {
        log::trace!("read `{}`", self.descriptor.name());
        self.check(target)?;
        let plan = self.plan()?;
        session.scoped(plan.scope(), |session| {
            for field in plan.active() {
                field.read(session, input, target)?;
            }
            if self.config.serialize_transient() {
                for field in plan.transient() {
                    field.read(session, input, target)?;
                }
            }
            Ok(())
        })
    }

    // Copies run outside any generic scope: the runtime type of every
    // value is at hand, so parameter fields resolve through it. Transient
    // fields go first.
    fn copy_into(
        &self,
        session: &mut Session<'_>,
        original: &dyn Value,
        target: &mut dyn Value,
    ) -> Result<(), CodecError> {
        log::trace!("copy `{}`", self.descriptor.name());
        self.check(original)?;
        self.check(target)?;
        let plan = self.plan()?;
        if self.config.copy_transient() {
            for field in plan.transient() {
                field.copy(session, original, target)?;
            }
        }
        for field in plan.active() {
            field.copy(session, original, target)?;
        }
        Ok(())
    }
}
