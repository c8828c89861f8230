//! The codec registry: type identity to wire tag and codec.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::{type_name, TypeId};
use core::cell::RefCell;

use hashbrown::{HashMap, HashSet};

use crate::codec::{
    BoolCodec, CharCodec, Codec, F32Codec, F64Codec, HandleCodec, I8Codec, I16Codec, I32Codec,
    I64Codec, ObjectCodec, StringCodec, U8Codec, U16Codec, U32Codec, U64Codec, UnitCodec,
};
use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::info::{TypeArg, TypeDescriptor};
use crate::value::{Handle, Value};

struct Entry {
    tag: u32,
    codec: Rc<dyn Codec>,
    name: &'static str,
}

// -----------------------------------------------------------------------------
// CodecRegistry

/// Maps type identity to a wire tag and a codec.
///
/// Tags are assigned in registration order and are what the wire carries
/// for dynamically typed values, so writer and reader must register the
/// same types in the same order. [`CodecRegistry::new`] pre-registers the
/// scalar codecs and the [`Handle`] codec under a fixed order; start from
/// [`CodecRegistry::empty`] to control every tag yourself.
///
/// The registry also owns the enabled context-key set that plan builds
/// consult for [`optional`](crate::info::FieldDescriptor::optional) fields.
pub struct CodecRegistry {
    entries: HashMap<TypeId, Entry>,
    by_tag: Vec<TypeId>,
    objects: HashMap<TypeId, Rc<ObjectCodec>>,
    context: Rc<RefCell<HashSet<&'static str>>>,
    default_config: CodecConfig,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecRegistry {
    /// A registry with no codecs at all.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            by_tag: Vec::new(),
            objects: HashMap::new(),
            context: Rc::new(RefCell::new(HashSet::new())),
            default_config: CodecConfig::new(),
        }
    }

    /// A registry with the built-in codecs pre-registered, in this tag
    /// order: `bool`, `i8`, `i16`, `i32`, `i64`, `u8`, `u16`, `u32`,
    /// `u64`, `f32`, `f64`, `char`, `()`, `String`, [`Handle`].
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<bool>(Rc::new(BoolCodec));
        registry.register::<i8>(Rc::new(I8Codec));
        registry.register::<i16>(Rc::new(I16Codec));
        registry.register::<i32>(Rc::new(I32Codec));
        registry.register::<i64>(Rc::new(I64Codec));
        registry.register::<u8>(Rc::new(U8Codec));
        registry.register::<u16>(Rc::new(U16Codec));
        registry.register::<u32>(Rc::new(U32Codec));
        registry.register::<u64>(Rc::new(U64Codec));
        registry.register::<f32>(Rc::new(F32Codec));
        registry.register::<f64>(Rc::new(F64Codec));
        registry.register::<char>(Rc::new(CharCodec));
        registry.register::<()>(Rc::new(UnitCodec));
        registry.register::<String>(Rc::new(StringCodec));
        registry.register::<Handle>(Rc::new(HandleCodec));
        registry
    }

    /// Register `codec` for `T` and return its tag. Re-registering a type
    /// replaces the codec but keeps the tag.
    pub fn register<T: Value>(&mut self, codec: Rc<dyn Codec>) -> u32 {
        let id = TypeId::of::<T>();
        let tag = match self.entries.get(&id) {
            Some(entry) => entry.tag,
            None => {
                let tag = self.by_tag.len() as u32;
                self.by_tag.push(id);
                tag
            }
        };
        self.entries.insert(
            id,
            Entry {
                tag,
                codec,
                name: type_name::<T>(),
            },
        );
        tag
    }

    /// Build an [`ObjectCodec`] for `descriptor` under the default config
    /// and register it. The plan is compiled here; a bad descriptor fails
    /// registration.
    pub fn register_object(
        &mut self,
        descriptor: TypeDescriptor,
    ) -> Result<Rc<ObjectCodec>, CodecError> {
        let config = self.default_config.clone();
        self.register_object_with(descriptor, config, None)
    }

    /// Build and register an [`ObjectCodec`] with an explicit config and
    /// optionally pre-bound generic arguments.
    pub fn register_object_with(
        &mut self,
        descriptor: TypeDescriptor,
        config: CodecConfig,
        args: Option<&[TypeArg]>,
    ) -> Result<Rc<ObjectCodec>, CodecError> {
        let id = descriptor.id();
        let name = descriptor.name();
        let descriptor = Rc::new(descriptor);
        let codec = Rc::new(ObjectCodec::new(
            descriptor,
            config,
            args,
            Rc::clone(&self.context),
        )?);

        let tag = match self.entries.get(&id) {
            Some(entry) => entry.tag,
            None => {
                let tag = self.by_tag.len() as u32;
                self.by_tag.push(id);
                tag
            }
        };
        self.entries.insert(
            id,
            Entry {
                tag,
                codec: Rc::clone(&codec) as Rc<dyn Codec>,
                name,
            },
        );
        self.objects.insert(id, Rc::clone(&codec));
        Ok(codec)
    }

    /// The [`ObjectCodec`] registered for `id`, for introspection and
    /// per-field tuning.
    #[inline]
    pub fn object_codec(&self, id: TypeId) -> Option<Rc<ObjectCodec>> {
        self.objects.get(&id).cloned()
    }

    /// The codec registered for `id`.
    #[inline]
    pub fn resolve(&self, id: TypeId) -> Option<Rc<dyn Codec>> {
        self.entries.get(&id).map(|entry| Rc::clone(&entry.codec))
    }

    /// The wire tag of `id`.
    #[inline]
    pub fn tag_of(&self, id: TypeId) -> Option<u32> {
        self.entries.get(&id).map(|entry| entry.tag)
    }

    /// The codec behind a wire tag.
    #[inline]
    pub fn codec_by_tag(&self, tag: u32) -> Option<Rc<dyn Codec>> {
        let id = self.by_tag.get(tag as usize)?;
        self.resolve(*id)
    }

    /// The registered name of `id`.
    #[inline]
    pub fn type_name_of(&self, id: TypeId) -> Option<&'static str> {
        self.entries.get(&id).map(|entry| entry.name)
    }

    /// Enable a context key. Optional fields gated on `key` enter plans
    /// built afterwards; call [`ObjectCodec::update_fields`] on already
    /// registered codecs to pick the change up.
    pub fn enable_context_key(&self, key: &'static str) {
        self.context.borrow_mut().insert(key);
    }

    /// Disable a context key.
    pub fn disable_context_key(&self, key: &'static str) {
        self.context.borrow_mut().remove(key);
    }

    /// Whether `key` is currently enabled.
    pub fn context_key_enabled(&self, key: &str) -> bool {
        self.context.borrow().contains(key)
    }

    /// The config future [`CodecRegistry::register_object`] calls use.
    pub fn set_default_config(&mut self, config: CodecConfig) {
        self.default_config = config;
    }

    #[inline]
    pub fn default_config(&self) -> &CodecConfig {
        &self.default_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tags_are_stable_across_registries() {
        let a = CodecRegistry::new();
        let b = CodecRegistry::new();
        for ty in [
            TypeId::of::<bool>(),
            TypeId::of::<i32>(),
            TypeId::of::<String>(),
            TypeId::of::<Handle>(),
        ] {
            assert_eq!(a.tag_of(ty), b.tag_of(ty));
            assert!(a.tag_of(ty).is_some());
        }
    }

    #[test]
    fn empty_registry_knows_nothing() {
        let registry = CodecRegistry::empty();
        assert!(registry.resolve(TypeId::of::<i32>()).is_none());
        assert!(registry.tag_of(TypeId::of::<i32>()).is_none());
        assert!(registry.codec_by_tag(0).is_none());
    }

    #[test]
    fn reregistering_keeps_the_tag() {
        let mut registry = CodecRegistry::new();
        let before = registry.tag_of(TypeId::of::<i32>()).unwrap();
        let after = registry.register::<i32>(Rc::new(I32Codec));
        assert_eq!(before, after);
    }

    #[test]
    fn context_keys_toggle() {
        let registry = CodecRegistry::new();
        assert!(!registry.context_key_enabled("audit"));
        registry.enable_context_key("audit");
        assert!(registry.context_key_enabled("audit"));
        registry.disable_context_key("audit");
        assert!(!registry.context_key_enabled("audit"));
    }
}
