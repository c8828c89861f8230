use alloc::borrow::Cow;
use core::{error, fmt};

use krait_io::IoError;

// -----------------------------------------------------------------------------
// AccessError

/// The kind of [`AccessError`], along with some kind-specific information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessErrorKind {
    /// The owner object passed to the accessor is not the declaring type.
    WrongOwner {
        expected: &'static str,
        found: &'static str,
    },
    /// The value passed to `set` does not match the field's storage type.
    WrongValue {
        expected: &'static str,
        found: &'static str,
    },
    /// A null was passed to a field whose storage cannot represent one.
    NullValue,
}

/// An error originating from a [`FieldAccessor`] get or set.
///
/// [`FieldAccessor`]: crate::access::FieldAccessor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessError {
    field: &'static str,
    kind: AccessErrorKind,
}

impl AccessError {
    #[inline]
    pub(crate) const fn new(field: &'static str, kind: AccessErrorKind) -> Self {
        Self { field, kind }
    }

    /// Returns the field name the access targeted.
    #[inline]
    pub const fn field(&self) -> &'static str {
        self.field
    }

    /// Returns the kind of [`AccessError`].
    #[inline]
    pub const fn kind(&self) -> &AccessErrorKind {
        &self.kind
    }
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error accessing field `{}`: ", self.field)?;
        match &self.kind {
            AccessErrorKind::WrongOwner { expected, found } => {
                write!(f, "owner is `{found}`, field is declared on `{expected}`")
            }
            AccessErrorKind::WrongValue { expected, found } => {
                write!(f, "value is `{found}`, field stores `{expected}`")
            }
            AccessErrorKind::NullValue => {
                write!(f, "field storage cannot represent a null value")
            }
        }
    }
}

impl error::Error for AccessError {}

// -----------------------------------------------------------------------------
// CodecError

/// An enumeration of all error outcomes of plan construction and of
/// write/read/copy execution.
///
/// There are no retries anywhere: every operation is synchronous and
/// single-attempt, and failures propagate to the caller untouched.
#[derive(Debug)]
pub enum CodecError {
    /// The underlying stream failed (truncation, malformed varint, ...).
    Io(IoError),
    /// A field accessor rejected an owner or a value.
    Access(AccessError),
    /// A field name lookup found nothing in the active plan.
    FieldNotFound {
        field: Cow<'static, str>,
        owner: &'static str,
    },
    /// Two declared fields at the same depth share a name.
    DuplicateField {
        field: &'static str,
        owner: &'static str,
    },
    /// No codec is registered for the type.
    UnregisteredType { name: &'static str },
    /// The stream carried a type tag the registry does not know.
    UnknownTag { tag: u32 },
    /// A runtime value's type contradicts what the plan or stream expects.
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    /// A null reference in a field not flagged nullable.
    NullNotAllowed {
        field: &'static str,
        owner: &'static str,
    },
    /// Bound generic arguments do not match the declared parameter count.
    GenericArity {
        owner: &'static str,
        expected: usize,
        found: usize,
    },
    /// A back-reference id with no previously registered object.
    DanglingReference { id: u32 },
    /// A handle's object is mutably borrowed while the codec needs it.
    HandleInUse { type_name: &'static str },
    /// The plan is borrowed by an in-progress operation and cannot be
    /// mutated until that operation returns.
    PlanInUse { owner: &'static str },
    /// The codec does not support the requested operation.
    Unsupported {
        op: &'static str,
        codec: &'static str,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "stream error: {err}"),
            Self::Access(err) => write!(f, "{err}"),
            Self::FieldNotFound { field, owner } => {
                write!(f, "field `{field}` not found on `{owner}`")
            }
            Self::DuplicateField { field, owner } => {
                write!(f, "duplicate field name `{field}` on `{owner}`")
            }
            Self::UnregisteredType { name } => {
                write!(f, "no codec registered for `{name}`")
            }
            Self::UnknownTag { tag } => write!(f, "unknown type tag {tag}"),
            Self::WrongType { expected, found } => {
                write!(f, "expected a `{expected}` value, found `{found}`")
            }
            Self::NullNotAllowed { field, owner } => {
                write!(f, "field `{field}` of `{owner}` is null but not nullable")
            }
            Self::GenericArity {
                owner,
                expected,
                found,
            } => {
                write!(
                    f,
                    "`{owner}` declares {expected} generic parameter(s), {found} bound"
                )
            }
            Self::DanglingReference { id } => {
                write!(f, "back-reference to unknown object id {id}")
            }
            Self::HandleInUse { type_name } => {
                write!(f, "object `{type_name}` is mutably borrowed")
            }
            Self::PlanInUse { owner } => {
                write!(f, "field plan of `{owner}` is in use by an active operation")
            }
            Self::Unsupported { op, codec } => {
                write!(f, "codec `{codec}` does not support `{op}`")
            }
        }
    }
}

impl error::Error for CodecError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Access(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IoError> for CodecError {
    #[inline]
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl From<AccessError> for CodecError {
    #[inline]
    fn from(err: AccessError) -> Self {
        Self::Access(err)
    }
}
