use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::{type_name, TypeId};
use core::fmt;

use crate::access::{DynAccessor, FieldAccessor, HandleAccessor, ValueAccessor};
use crate::codec::Codec;
use crate::value::{Handle, Value};

// -----------------------------------------------------------------------------
// DeclaredType

/// What a field declares about its value's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    /// A single concrete type, known at declaration time. No wire type tag
    /// is needed.
    Concrete { id: TypeId, name: &'static str },
    /// A generic parameter of the owner, resolved through bound arguments
    /// at use time.
    Param(&'static str),
    /// Any registered type; the value travels with a type tag.
    Dynamic,
}

// -----------------------------------------------------------------------------
// FieldDescriptor

/// The declaration of one field: its name, storage shape, and the flags
/// that drive plan construction.
///
/// Descriptors are built with one of the four shape constructors and then
/// refined with the by-value builder methods. The [`descriptor!`] macro
/// produces them from a struct-like listing.
///
/// [`descriptor!`]: crate::descriptor
pub struct FieldDescriptor {
    name: &'static str,
    declared: DeclaredType,
    accessor: Rc<dyn FieldAccessor>,
    transient: bool,
    nullable: bool,
    optional_key: Option<&'static str>,
    pinned: Option<Rc<dyn Codec>>,
    depth: u16,
}

impl FieldDescriptor {
    /// A field stored inline as a concrete `F` on owner `O`.
    pub fn value<O: Value, F: Value>(
        name: &'static str,
        get: fn(&O) -> &F,
        get_mut: fn(&mut O) -> &mut F,
    ) -> Self {
        Self {
            name,
            declared: DeclaredType::Concrete {
                id: TypeId::of::<F>(),
                name: type_name::<F>(),
            },
            accessor: Rc::new(ValueAccessor::new(name, get, get_mut)),
            transient: false,
            nullable: false,
            optional_key: None,
            pinned: None,
            depth: 0,
        }
    }

    /// An `Option<Handle>` reference field. Nullable by default, since the
    /// storage has a null representation.
    pub fn handle<O: Value>(
        name: &'static str,
        get: fn(&O) -> &Option<Handle>,
        get_mut: fn(&mut O) -> &mut Option<Handle>,
    ) -> Self {
        Self {
            name,
            declared: DeclaredType::Concrete {
                id: TypeId::of::<Handle>(),
                name: type_name::<Handle>(),
            },
            accessor: Rc::new(HandleAccessor::new(name, get, get_mut)),
            transient: false,
            nullable: true,
            optional_key: None,
            pinned: None,
            depth: 0,
        }
    }

    /// A `Box<dyn Value>` field holding any registered type; the value is
    /// written with a type tag.
    pub fn dynamic<O: Value>(
        name: &'static str,
        get: fn(&O) -> &Box<dyn Value>,
        get_mut: fn(&mut O) -> &mut Box<dyn Value>,
    ) -> Self {
        Self {
            name,
            declared: DeclaredType::Dynamic,
            accessor: Rc::new(DynAccessor::new(name, get, get_mut)),
            transient: false,
            nullable: false,
            optional_key: None,
            pinned: None,
            depth: 0,
        }
    }

    /// A `Box<dyn Value>` field declared with the owner's generic
    /// parameter `param`.
    pub fn parameter<O: Value>(
        name: &'static str,
        param: &'static str,
        get: fn(&O) -> &Box<dyn Value>,
        get_mut: fn(&mut O) -> &mut Box<dyn Value>,
    ) -> Self {
        Self {
            name,
            declared: DeclaredType::Param(param),
            accessor: Rc::new(DynAccessor::new(name, get, get_mut)),
            transient: false,
            nullable: false,
            optional_key: None,
            pinned: None,
            depth: 0,
        }
    }

    /// Mark the field transient: excluded from the wire unless the codec
    /// config opts transients in.
    #[inline]
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    /// Override whether a null must be representable on the wire for this
    /// field. Only meaningful for handle fields.
    #[inline]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Gate the field on a context key: it only enters the plan while the
    /// registry has `key` enabled.
    #[inline]
    pub fn optional(mut self, key: &'static str) -> Self {
        self.optional_key = Some(key);
        self
    }

    /// Pin an explicit codec, bypassing registry resolution for this field.
    #[inline]
    pub fn with_codec(mut self, codec: Rc<dyn Codec>) -> Self {
        self.pinned = Some(codec);
        self
    }

    /// Record the declaring depth: 0 for the described type itself, 1 for
    /// its immediate ancestor, and so on.
    #[inline]
    pub fn at_depth(mut self, depth: u16) -> Self {
        self.depth = depth;
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn declared(&self) -> DeclaredType {
        self.declared
    }

    #[inline]
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[inline]
    pub fn optional_key(&self) -> Option<&'static str> {
        self.optional_key
    }

    #[inline]
    pub fn depth(&self) -> u16 {
        self.depth
    }

    #[inline]
    pub(crate) fn accessor(&self) -> Rc<dyn FieldAccessor> {
        Rc::clone(&self.accessor)
    }

    #[inline]
    pub(crate) fn pinned(&self) -> Option<Rc<dyn Codec>> {
        self.pinned.clone()
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("transient", &self.transient)
            .field("nullable", &self.nullable)
            .field("optional_key", &self.optional_key)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// TypeDescriptor

/// The complete declaration of a described type: identity, generic
/// parameters, fields and instantiation hooks.
///
/// # Examples
///
/// ```
/// use krait_codec::{impl_value, info::{FieldDescriptor, TypeDescriptor}};
///
/// #[derive(Debug, Default)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl_value!(Point);
///
/// let descriptor = TypeDescriptor::of::<Point>("Point")
///     .field(FieldDescriptor::value::<Point, i32>("x", |p| &p.x, |p| &mut p.x))
///     .field(FieldDescriptor::value::<Point, i32>("y", |p| &p.y, |p| &mut p.y));
/// assert_eq!(descriptor.fields().len(), 2);
/// ```
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
    params: Vec<&'static str>,
    fields: Vec<FieldDescriptor>,
    create: Box<dyn Fn() -> Box<dyn Value>>,
    create_copy: Option<Box<dyn Fn(&dyn Value) -> Box<dyn Value>>>,
}

impl TypeDescriptor {
    /// Describe `T`, instantiating through its `Default` impl.
    pub fn of<T: Value + Default>(name: &'static str) -> Self {
        Self::with_create::<T>(name, || Box::new(T::default()))
    }

    /// Describe `T` with an explicit instantiation hook, for types whose
    /// blank state is not `Default`.
    pub fn with_create<T: Value>(
        name: &'static str,
        create: impl Fn() -> Box<dyn Value> + 'static,
    ) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name,
            params: Vec::new(),
            fields: Vec::new(),
            create: Box::new(create),
            create_copy: None,
        }
    }

    /// Declare generic parameter names, in order.
    #[inline]
    pub fn with_params(mut self, params: &[&'static str]) -> Self {
        self.params = params.to_vec();
        self
    }

    /// Install a hook producing the blank object a copy is populated into,
    /// given the original. Copies fall back to the create hook without it.
    #[inline]
    pub fn with_copy_create(
        mut self,
        create_copy: impl Fn(&dyn Value) -> Box<dyn Value> + 'static,
    ) -> Self {
        self.create_copy = Some(Box::new(create_copy));
        self
    }

    /// Append a field declaration.
    #[inline]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn params(&self) -> &[&'static str] {
        &self.params
    }

    #[inline]
    pub fn has_params(&self) -> bool {
        !self.params.is_empty()
    }

    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[inline]
    pub(crate) fn instantiate(&self) -> Box<dyn Value> {
        (self.create)()
    }

    #[inline]
    pub(crate) fn instantiate_copy(&self, original: &dyn Value) -> Box<dyn Value> {
        match &self.create_copy {
            Some(create_copy) => create_copy(original),
            None => (self.create)(),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}
