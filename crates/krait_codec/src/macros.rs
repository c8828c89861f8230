// -----------------------------------------------------------------------------
// impl_value!

/// Implements [`Value`] for one or more concrete types.
///
/// The types must be `'static` and implement [`Debug`](core::fmt::Debug).
///
/// # Examples
///
/// ```
/// use krait_codec::impl_value;
///
/// #[derive(Debug, Default)]
/// struct Temperature(f64);
///
/// impl_value!(Temperature);
/// ```
///
/// [`Value`]: crate::value::Value
#[macro_export]
macro_rules! impl_value {
    ($ty:ty) => {
        impl $crate::value::Value for $ty {
            #[inline]
            fn type_name(&self) -> &'static str {
                ::core::any::type_name::<$ty>()
            }

            #[inline]
            fn ty_id(&self) -> ::core::any::TypeId {
                ::core::any::TypeId::of::<$ty>()
            }

            #[inline]
            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            #[inline]
            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }

            #[inline]
            fn into_any(
                self: $crate::__macro_exports::Box<Self>,
            ) -> $crate::__macro_exports::Box<dyn ::core::any::Any> {
                self
            }
        }
    };
    ($($ty:ty),+ $(,)?) => {
        $($crate::impl_value!($ty);)+
    };
}

// -----------------------------------------------------------------------------
// descriptor!

/// Builds a [`TypeDescriptor`] from a struct-like field listing.
///
/// The described type must implement [`Value`] and [`Default`]. Each field
/// names its declared storage:
///
/// - `name: Ty` for an inline value field of concrete type `Ty`,
/// - `name: handle` for an `Option<Handle>` reference field,
/// - `name: any` for a `Box<dyn Value>` field written with a type tag,
/// - `name: param T` for a `Box<dyn Value>` field declared with generic
///   parameter `T` (declare the parameters in the angle-bracket list),
/// - any of the above prefixed with `transient` to keep the field off the
///   wire by default.
///
/// # Examples
///
/// ```
/// use krait_codec::{descriptor, impl_value};
/// use krait_codec::value::Handle;
///
/// #[derive(Debug, Default)]
/// struct Node {
///     label: String,
///     next: Option<Handle>,
///     transient_hits: u64,
/// }
///
/// impl_value!(Node);
///
/// let descriptor = descriptor!(Node {
///     label: String,
///     next: handle,
///     transient transient_hits: u64,
/// });
/// assert_eq!(descriptor.name(), "Node");
/// ```
///
/// [`TypeDescriptor`]: crate::info::TypeDescriptor
/// [`Value`]: crate::value::Value
#[macro_export]
macro_rules! descriptor {
    ($ty:ident < $($param:ident),+ $(,)? > { $($fields:tt)* }) => {
        $crate::descriptor!(@fields
            $crate::info::TypeDescriptor::of::<$ty>(::core::stringify!($ty))
                .with_params(&[$(::core::stringify!($param)),+]),
            $ty, $($fields)*)
    };
    ($ty:ident { $($fields:tt)* }) => {
        $crate::descriptor!(@fields
            $crate::info::TypeDescriptor::of::<$ty>(::core::stringify!($ty)),
            $ty, $($fields)*)
    };

    (@fields $builder:expr, $ty:ident,) => { $builder };
    (@fields $builder:expr, $ty:ident, transient $name:ident: handle $(, $($rest:tt)*)?) => {
        $crate::descriptor!(@fields
            $builder.field(
                $crate::info::FieldDescriptor::handle::<$ty>(
                    ::core::stringify!($name),
                    |owner| &owner.$name,
                    |owner| &mut owner.$name,
                )
                .transient(),
            ),
            $ty, $($($rest)*)?)
    };
    (@fields $builder:expr, $ty:ident, transient $name:ident: any $(, $($rest:tt)*)?) => {
        $crate::descriptor!(@fields
            $builder.field(
                $crate::info::FieldDescriptor::dynamic::<$ty>(
                    ::core::stringify!($name),
                    |owner| &owner.$name,
                    |owner| &mut owner.$name,
                )
                .transient(),
            ),
            $ty, $($($rest)*)?)
    };
    (@fields $builder:expr, $ty:ident, transient $name:ident: param $param:ident $(, $($rest:tt)*)?) => {
        $crate::descriptor!(@fields
            $builder.field(
                $crate::info::FieldDescriptor::parameter::<$ty>(
                    ::core::stringify!($name),
                    ::core::stringify!($param),
                    |owner| &owner.$name,
                    |owner| &mut owner.$name,
                )
                .transient(),
            ),
            $ty, $($($rest)*)?)
    };
    (@fields $builder:expr, $ty:ident, transient $name:ident: $fty:ty $(, $($rest:tt)*)?) => {
        $crate::descriptor!(@fields
            $builder.field(
                $crate::info::FieldDescriptor::value::<$ty, $fty>(
                    ::core::stringify!($name),
                    |owner| &owner.$name,
                    |owner| &mut owner.$name,
                )
                .transient(),
            ),
            $ty, $($($rest)*)?)
    };
    (@fields $builder:expr, $ty:ident, $name:ident: handle $(, $($rest:tt)*)?) => {
        $crate::descriptor!(@fields
            $builder.field($crate::info::FieldDescriptor::handle::<$ty>(
                ::core::stringify!($name),
                |owner| &owner.$name,
                |owner| &mut owner.$name,
            )),
            $ty, $($($rest)*)?)
    };
    (@fields $builder:expr, $ty:ident, $name:ident: any $(, $($rest:tt)*)?) => {
        $crate::descriptor!(@fields
            $builder.field($crate::info::FieldDescriptor::dynamic::<$ty>(
                ::core::stringify!($name),
                |owner| &owner.$name,
                |owner| &mut owner.$name,
            )),
            $ty, $($($rest)*)?)
    };
    (@fields $builder:expr, $ty:ident, $name:ident: param $param:ident $(, $($rest:tt)*)?) => {
        $crate::descriptor!(@fields
            $builder.field($crate::info::FieldDescriptor::parameter::<$ty>(
                ::core::stringify!($name),
                ::core::stringify!($param),
                |owner| &owner.$name,
                |owner| &mut owner.$name,
            )),
            $ty, $($($rest)*)?)
    };
    (@fields $builder:expr, $ty:ident, $name:ident: $fty:ty $(, $($rest:tt)*)?) => {
        $crate::descriptor!(@fields
            $builder.field($crate::info::FieldDescriptor::value::<$ty, $fty>(
                ::core::stringify!($name),
                |owner| &owner.$name,
                |owner| &mut owner.$name,
            )),
            $ty, $($($rest)*)?)
    };
}
