use alloc::vec::Vec;
use core::any::{type_name, TypeId};

use crate::error::CodecError;
use crate::value::Value;

// -----------------------------------------------------------------------------
// TypeArg

/// A concrete type bound to a generic parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeArg {
    id: TypeId,
    name: &'static str,
}

impl TypeArg {
    /// The argument standing for the concrete type `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use krait_codec::info::TypeArg;
    ///
    /// let arg = TypeArg::of::<i32>();
    /// assert_eq!(arg.name(), "i32");
    /// ```
    #[inline]
    pub fn of<T: Value>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

// -----------------------------------------------------------------------------
// GenericScope

/// A set of parameter-to-argument bindings for one described owner type.
///
/// Scopes are pushed onto the session's scope stack for the duration of an
/// object's field loop, so fields of nested objects resolve against the
/// innermost owner that binds their parameter.
#[derive(Debug, Clone)]
pub struct GenericScope {
    owner: &'static str,
    bindings: Vec<(&'static str, TypeArg)>,
}

impl GenericScope {
    /// Pair `params` with `args` positionally. The counts must match.
    pub(crate) fn bind(
        owner: &'static str,
        params: &[&'static str],
        args: &[TypeArg],
    ) -> Result<Self, CodecError> {
        if params.len() != args.len() {
            return Err(CodecError::GenericArity {
                owner,
                expected: params.len(),
                found: args.len(),
            });
        }
        Ok(Self {
            owner,
            bindings: params.iter().copied().zip(args.iter().copied()).collect(),
        })
    }

    /// The owner type this scope was bound for.
    #[inline]
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// Look up the argument bound to `param`, if any.
    #[inline]
    pub fn get(&self, param: &str) -> Option<TypeArg> {
        self.bindings
            .iter()
            .find(|(name, _)| *name == param)
            .map(|(_, arg)| *arg)
    }

    /// The bound arguments in declaration order.
    #[inline]
    pub fn args(&self) -> impl Iterator<Item = TypeArg> + '_ {
        self.bindings.iter().map(|(_, arg)| *arg)
    }
}
