//! Static descriptions of types and their fields.
//!
//! A [`TypeDescriptor`] is the declaration-side view of a type: its name,
//! generic parameters, field list and instantiation hooks. The codec side
//! compiles descriptors into field plans; descriptors themselves never
//! touch the wire.

mod descriptor;
mod generics;

pub use descriptor::{DeclaredType, FieldDescriptor, TypeDescriptor};
pub use generics::{GenericScope, TypeArg};
