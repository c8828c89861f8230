use alloc::boxed::Box;
use alloc::rc::Rc;
use core::any::{type_name, TypeId};
use core::fmt;

use krait_io::{Input, Output};

use super::Codec;
use crate::access::FieldAccessor;
use crate::error::CodecError;
use crate::info::{DeclaredType, FieldDescriptor};
use crate::session::Session;
use crate::value::Value;

// -----------------------------------------------------------------------------
// IntEncoding

/// How an integer field travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntEncoding {
    /// Fixed-width little-endian. The default.
    #[default]
    Fixed,
    /// Variable-length; signed values zig-zag first.
    Var,
    /// Variable-length with no zig-zag, shortest when values are known to
    /// be non-negative.
    VarPositive,
}

// -----------------------------------------------------------------------------
// FieldCodec

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntKind {
    I32,
    I64,
    U32,
    U64,
}

impl IntKind {
    fn of(id: TypeId) -> Option<Self> {
        if id == TypeId::of::<i32>() {
            Some(Self::I32)
        } else if id == TypeId::of::<i64>() {
            Some(Self::I64)
        } else if id == TypeId::of::<u32>() {
            Some(Self::U32)
        } else if id == TypeId::of::<u64>() {
            Some(Self::U64)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    /// An integer with per-field encoding modes, written inline.
    Int(IntKind),
    /// A single concrete type; codec resolved by id, no wire tag.
    Concrete { id: TypeId, name: &'static str },
    /// The owner's generic parameter; resolved through the scope stack.
    Param(&'static str),
    /// Any registered type; written with a wire tag.
    Dynamic,
}

/// The compiled per-field strategy: how one field of a described type is
/// written, read and copied.
///
/// Field codecs live inside a [`FieldPlan`](super::FieldPlan) and are
/// reached through [`ObjectCodec::field_mut`] for per-field tuning after
/// registration.
///
/// [`ObjectCodec::field_mut`]: super::ObjectCodec::field_mut
pub struct FieldCodec {
    name: &'static str,
    owner: &'static str,
    kind: FieldKind,
    pinned: Option<Rc<dyn Codec>>,
    can_be_null: bool,
    int_encoding: IntEncoding,
    accessor: Rc<dyn FieldAccessor>,
    depth: u16,
}

impl FieldCodec {
    pub(crate) fn new(owner: &'static str, descriptor: &FieldDescriptor) -> Self {
        let pinned = descriptor.pinned();
        let kind = match descriptor.declared() {
            DeclaredType::Concrete { id, name } => match IntKind::of(id) {
                Some(int) => FieldKind::Int(int),
                None => FieldKind::Concrete { id, name },
            },
            DeclaredType::Param(param) => FieldKind::Param(param),
            DeclaredType::Dynamic => FieldKind::Dynamic,
        };
        Self {
            name: descriptor.name(),
            owner,
            kind,
            pinned,
            can_be_null: descriptor.is_nullable(),
            int_encoding: IntEncoding::default(),
            accessor: descriptor.accessor(),
            depth: descriptor.depth(),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The described type this field belongs to.
    #[inline]
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    #[inline]
    pub fn depth(&self) -> u16 {
        self.depth
    }

    #[inline]
    pub fn can_be_null(&self) -> bool {
        self.can_be_null
    }

    #[inline]
    pub fn encoding(&self) -> IntEncoding {
        self.int_encoding
    }

    // -- mutators -------------------------------------------------------------

    /// Pin the field's value type to `T`: the wire carries no tag and any
    /// other runtime type is an error. Clears a previously pinned codec.
    pub fn set_class<T: Value>(&mut self) {
        self.pinned = None;
        let id = TypeId::of::<T>();
        self.kind = match IntKind::of(id) {
            Some(int) => FieldKind::Int(int),
            None => FieldKind::Concrete {
                id,
                name: type_name::<T>(),
            },
        };
    }

    /// Pin the value type to `T` and the codec to `codec` in one step.
    pub fn set_class_with<T: Value>(&mut self, codec: Rc<dyn Codec>) {
        self.kind = FieldKind::Concrete {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        };
        self.pinned = Some(codec);
    }

    /// Pin an explicit codec, bypassing registry and scope resolution.
    pub fn set_codec(&mut self, codec: Rc<dyn Codec>) {
        self.pinned = Some(codec);
    }

    /// Whether a null value is representable on the wire for this field.
    pub fn set_can_be_null(&mut self, can_be_null: bool) {
        self.can_be_null = can_be_null;
    }

    /// Switch the integer encoding between fixed-width and variable-length.
    pub fn set_var_int(&mut self, var: bool) {
        self.int_encoding = if var {
            IntEncoding::Var
        } else {
            IntEncoding::Fixed
        };
    }

    /// Use the variable-length encoding without zig-zag. Implies var-int.
    /// Turning it off reverts to the zig-zag var-int; a field in fixed
    /// mode is left untouched.
    pub fn set_optimize_positive(&mut self, optimize: bool) {
        if optimize {
            self.int_encoding = IntEncoding::VarPositive;
        } else if self.int_encoding == IntEncoding::VarPositive {
            self.int_encoding = IntEncoding::Var;
        }
    }

    // -- write ----------------------------------------------------------------

    pub(crate) fn write(
        &self,
        session: &mut Session<'_>,
        out: &mut Output,
        owner: &dyn Value,
    ) -> Result<(), CodecError> {
        log::trace!("write field `{}` of `{}`", self.name, self.owner);
        let value = match self.accessor.get(owner)? {
            Some(value) => value,
            None => {
                if !self.can_be_null {
                    return Err(CodecError::NullNotAllowed {
                        field: self.name,
                        owner: self.owner,
                    });
                }
                out.write_u8(0);
                return Ok(());
            }
        };
        if self.can_be_null {
            out.write_u8(1);
        }

        if let Some(codec) = &self.pinned {
            return codec.write(session, out, value);
        }

        match self.kind {
            FieldKind::Int(int) => self.write_int(out, int, value),
            FieldKind::Concrete { id, name } => {
                self.check(value, id, name)?;
                self.resolve(session, id, name)?.write(session, out, value)
            }
            FieldKind::Param(param) => match session.scopes().resolve(param) {
                Some(arg) => {
                    self.check(value, arg.id(), arg.name())?;
                    self.resolve(session, arg.id(), arg.name())?
                        .write(session, out, value)
                }
                // Unbound parameter: fall back to the tagged path so both
                // sides agree without a binding.
                None => session.write_any(out, value),
            },
            FieldKind::Dynamic => session.write_any(out, value),
        }
    }

    fn write_int(&self, out: &mut Output, int: IntKind, value: &dyn Value) -> Result<(), CodecError> {
        match int {
            IntKind::I32 => {
                let v = *self.downcast::<i32>(value)?;
                match self.int_encoding {
                    IntEncoding::Fixed => out.write_i32(v),
                    IntEncoding::Var => out.write_var_i32(v, false),
                    IntEncoding::VarPositive => out.write_var_i32(v, true),
                }
            }
            IntKind::I64 => {
                let v = *self.downcast::<i64>(value)?;
                match self.int_encoding {
                    IntEncoding::Fixed => out.write_i64(v),
                    IntEncoding::Var => out.write_var_i64(v, false),
                    IntEncoding::VarPositive => out.write_var_i64(v, true),
                }
            }
            IntKind::U32 => {
                let v = *self.downcast::<u32>(value)?;
                match self.int_encoding {
                    IntEncoding::Fixed => out.write_u32(v),
                    _ => out.write_var_u32(v),
                }
            }
            IntKind::U64 => {
                let v = *self.downcast::<u64>(value)?;
                match self.int_encoding {
                    IntEncoding::Fixed => out.write_u64(v),
                    _ => out.write_var_u64(v),
                }
            }
        }
        Ok(())
    }

    // -- read -----------------------------------------------------------------

    pub(crate) fn read(
        &self,
        session: &mut Session<'_>,
        input: &mut Input,
        owner: &mut dyn Value,
    ) -> Result<(), CodecError> {
        log::trace!("read field `{}` of `{}`", self.name, self.owner);
        if self.can_be_null && input.read_u8()? == 0 {
            self.accessor.set(owner, None)?;
            return Ok(());
        }

        let value = if let Some(codec) = &self.pinned {
            codec.read(session, input)?
        } else {
            match self.kind {
                FieldKind::Int(int) => self.read_int(input, int)?,
                FieldKind::Concrete { id, name } => {
                    self.resolve(session, id, name)?.read(session, input)?
                }
                FieldKind::Param(param) => match session.scopes().resolve(param) {
                    Some(arg) => self
                        .resolve(session, arg.id(), arg.name())?
                        .read(session, input)?,
                    None => session.read_any(input)?,
                },
                FieldKind::Dynamic => session.read_any(input)?,
            }
        };
        self.accessor.set(owner, Some(value))?;
        Ok(())
    }

    fn read_int(&self, input: &mut Input, int: IntKind) -> Result<Box<dyn Value>, CodecError> {
        Ok(match int {
            IntKind::I32 => Box::new(match self.int_encoding {
                IntEncoding::Fixed => input.read_i32()?,
                IntEncoding::Var => input.read_var_i32(false)?,
                IntEncoding::VarPositive => input.read_var_i32(true)?,
            }),
            IntKind::I64 => Box::new(match self.int_encoding {
                IntEncoding::Fixed => input.read_i64()?,
                IntEncoding::Var => input.read_var_i64(false)?,
                IntEncoding::VarPositive => input.read_var_i64(true)?,
            }),
            IntKind::U32 => Box::new(match self.int_encoding {
                IntEncoding::Fixed => input.read_u32()?,
                _ => input.read_var_u32()?,
            }),
            IntKind::U64 => Box::new(match self.int_encoding {
                IntEncoding::Fixed => input.read_u64()?,
                _ => input.read_var_u64()?,
            }),
        })
    }

    // -- copy -----------------------------------------------------------------

    /// Copy resolution never consults the scope stack: the runtime type is
    /// at hand, so parameter and dynamic fields resolve through it.
    pub(crate) fn copy(
        &self,
        session: &mut Session<'_>,
        original: &dyn Value,
        target: &mut dyn Value,
    ) -> Result<(), CodecError> {
        let value = match self.accessor.get(original)? {
            Some(value) => value,
            None => {
                self.accessor.set(target, None)?;
                return Ok(());
            }
        };

        let copied = if let Some(codec) = &self.pinned {
            codec.copy(session, value)?
        } else {
            match self.kind {
                FieldKind::Int(int) => self.copy_int(int, value)?,
                FieldKind::Concrete { id, name } => {
                    self.check(value, id, name)?;
                    self.resolve(session, id, name)?.copy(session, value)?
                }
                FieldKind::Param(_) | FieldKind::Dynamic => self
                    .resolve(session, value.ty_id(), value.type_name())?
                    .copy(session, value)?,
            }
        };
        self.accessor.set(target, Some(copied))?;
        Ok(())
    }

    fn copy_int(&self, int: IntKind, value: &dyn Value) -> Result<Box<dyn Value>, CodecError> {
        Ok(match int {
            IntKind::I32 => Box::new(*self.downcast::<i32>(value)?),
            IntKind::I64 => Box::new(*self.downcast::<i64>(value)?),
            IntKind::U32 => Box::new(*self.downcast::<u32>(value)?),
            IntKind::U64 => Box::new(*self.downcast::<u64>(value)?),
        })
    }

    // -- helpers --------------------------------------------------------------

    #[inline]
    fn check(&self, value: &dyn Value, id: TypeId, name: &'static str) -> Result<(), CodecError> {
        if value.ty_id() == id {
            Ok(())
        } else {
            Err(CodecError::WrongType {
                expected: name,
                found: value.type_name(),
            })
        }
    }

    #[inline]
    fn resolve(
        &self,
        session: &Session<'_>,
        id: TypeId,
        name: &'static str,
    ) -> Result<Rc<dyn Codec>, CodecError> {
        session
            .registry()
            .resolve(id)
            .ok_or(CodecError::UnregisteredType { name })
    }

    #[inline]
    fn downcast<'a, T: Value>(&self, value: &'a dyn Value) -> Result<&'a T, CodecError> {
        value.downcast_ref::<T>().ok_or(CodecError::WrongType {
            expected: type_name::<T>(),
            found: value.type_name(),
        })
    }
}

impl fmt::Display for FieldCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Debug for FieldCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCodec")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("kind", &self.kind)
            .field("can_be_null", &self.can_be_null)
            .field("int_encoding", &self.int_encoding)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_value;

    #[derive(Debug, Default)]
    struct Sample {
        n: i32,
    }

    impl_value!(Sample);

    fn int_field() -> FieldCodec {
        let field = FieldDescriptor::value::<Sample, i32>("n", |s| &s.n, |s| &mut s.n);
        FieldCodec::new("Sample", &field)
    }

    #[test]
    fn integer_fields_default_to_fixed_width() {
        assert_eq!(int_field().encoding(), IntEncoding::Fixed);
    }

    #[test]
    fn optimize_positive_off_does_not_enable_var_int() {
        let mut field = int_field();
        field.set_optimize_positive(false);
        assert_eq!(field.encoding(), IntEncoding::Fixed);
    }

    #[test]
    fn optimize_positive_off_reverts_to_plain_var_int() {
        let mut field = int_field();
        field.set_optimize_positive(true);
        assert_eq!(field.encoding(), IntEncoding::VarPositive);
        field.set_optimize_positive(false);
        assert_eq!(field.encoding(), IntEncoding::Var);
    }

    #[test]
    fn var_int_toggles_between_fixed_and_var() {
        let mut field = int_field();
        field.set_var_int(true);
        assert_eq!(field.encoding(), IntEncoding::Var);
        field.set_var_int(false);
        assert_eq!(field.encoding(), IntEncoding::Fixed);
    }
}
