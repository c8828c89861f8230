// -----------------------------------------------------------------------------
// CodecConfig

/// Immutable policy record for an [`ObjectCodec`].
///
/// A config is taken by value at construction, so a codec always has one;
/// the defaults match the common case of skipping transient fields on the
/// wire while still carrying them through in-memory copies.
///
/// [`ObjectCodec`]: crate::codec::ObjectCodec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    serialize_transient: bool,
    copy_transient: bool,
    optimized_generics: bool,
}

impl Default for CodecConfig {
    /// Transient fields are not written, are copied, and generic-parameter
    /// optimization is on.
    #[inline]
    fn default() -> Self {
        Self {
            serialize_transient: false,
            copy_transient: true,
            optimized_generics: true,
        }
    }
}

impl CodecConfig {
    /// Create the default config; see [`CodecConfig::default`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// When true, transient fields are written and read like active fields,
    /// after them and in their own plan order. Default is false.
    #[inline]
    pub fn with_serialize_transient(mut self, value: bool) -> Self {
        self.serialize_transient = value;
        self
    }

    /// When true, transient fields participate in [`copy`]. Default is true.
    ///
    /// [`copy`]: crate::codec::Codec::copy
    #[inline]
    pub fn with_copy_transient(mut self, value: bool) -> Self {
        self.copy_transient = value;
        self
    }

    /// When true, fields declared with a generic parameter resolve their
    /// codec through the bound arguments and skip the wire type tag.
    /// When false, [`set_generics`] is ignored entirely. Default is true.
    ///
    /// [`set_generics`]: crate::codec::ObjectCodec::set_generics
    #[inline]
    pub fn with_optimized_generics(mut self, value: bool) -> Self {
        self.optimized_generics = value;
        self
    }

    #[inline]
    pub fn serialize_transient(&self) -> bool {
        self.serialize_transient
    }

    #[inline]
    pub fn copy_transient(&self) -> bool {
        self.copy_transient
    }

    #[inline]
    pub fn optimized_generics(&self) -> bool {
        self.optimized_generics
    }
}
