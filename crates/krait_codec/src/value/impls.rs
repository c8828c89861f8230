//! [`Value`] impls for the scalar types the registry serves out of the box.

use alloc::string::String;

use crate::impl_value;

impl_value!(bool, char, ());
impl_value!(u8, u16, u32, u64);
impl_value!(i8, i16, i32, i64);
impl_value!(f32, f64);
impl_value!(String);
