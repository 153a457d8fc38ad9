use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use itemnbt_tree::Tag;
use tracing::debug;

use crate::builtin::{self, TagCodec};
use crate::error::{CodecError, CodecResult};

/// Identity of a value type: its `TypeId` plus a readable name for errors.
///
/// Equality and hashing use the `TypeId` only.
#[derive(Clone, Copy, Debug)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// The key for type `V`.
    pub fn of<V: 'static>() -> Self {
        Self {
            id: TypeId::of::<V>(),
            name: type_name::<V>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Type-erased encode/decode pair stored in the registry.
trait ErasedCodec: Send + Sync {
    fn encode(&self, value: &dyn Any) -> CodecResult<Tag>;
    fn decode(&self, tag: &Tag) -> CodecResult<Box<dyn Any>>;
}

struct FnCodec<V> {
    encode: fn(&V) -> Tag,
    decode: fn(&Tag) -> CodecResult<V>,
}

impl<V: 'static> ErasedCodec for FnCodec<V> {
    fn encode(&self, value: &dyn Any) -> CodecResult<Tag> {
        let value = value
            .downcast_ref::<V>()
            .ok_or(CodecError::ValueTypeMismatch {
                expected: type_name::<V>(),
            })?;
        Ok((self.encode)(value))
    }

    fn decode(&self, tag: &Tag) -> CodecResult<Box<dyn Any>> {
        (self.decode)(tag).map(|v| Box::new(v) as Box<dyn Any>)
    }
}

/// Table from a value's static type to its tag codec.
///
/// Invariants:
/// - A type is registered at most once.
/// - Lookup of an unregistered type yields `UnsupportedType`; the link
///   builder uses [`contains_type`](Self::contains_type) to route such fields
///   to composite handling instead.
///
/// Registration takes `&mut self`, so a registry shared behind an `Arc` is
/// frozen. Populate it fully before building any link descriptors.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: HashMap<TypeKey, Box<dyn ErasedCodec>>,
}

impl CodecRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the builtin codecs (integers, floats,
    /// `bool`, `String`, typed arrays, `Vec<String>`, `Uuid`).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        builtin::register_defaults(&mut registry);
        registry
    }

    /// Register an encode/decode pair for `V`.
    ///
    /// Returns `Err(DuplicateRegistration)` if `V` already has a codec.
    pub fn register<V: 'static>(
        &mut self,
        encode: fn(&V) -> Tag,
        decode: fn(&Tag) -> CodecResult<V>,
    ) -> CodecResult<()> {
        let key = TypeKey::of::<V>();
        if self.codecs.contains_key(&key) {
            return Err(CodecError::DuplicateRegistration {
                type_name: key.name(),
            });
        }
        debug!(type_name = key.name(), "codec registered");
        self.codecs.insert(key, Box::new(FnCodec { encode, decode }));
        Ok(())
    }

    /// Register a type that carries its own codec.
    pub fn register_codec<V: TagCodec>(&mut self) -> CodecResult<()> {
        self.register::<V>(V::encode, V::decode)
    }

    /// Unchecked insert for builtin codecs on a registry known to be fresh.
    pub(crate) fn insert_builtin<V: TagCodec>(&mut self) {
        self.codecs.insert(
            TypeKey::of::<V>(),
            Box::new(FnCodec {
                encode: V::encode,
                decode: V::decode,
            }),
        );
    }

    /// Whether `V` has a registered codec.
    pub fn contains<V: 'static>(&self) -> bool {
        self.contains_type(TypeKey::of::<V>())
    }

    pub fn contains_type(&self, key: TypeKey) -> bool {
        self.codecs.contains_key(&key)
    }

    /// Encode a value of a registered type.
    pub fn encode<V: 'static>(&self, value: &V) -> CodecResult<Tag> {
        self.encode_any(TypeKey::of::<V>(), value)
    }

    /// Decode a tag into a value of a registered type.
    pub fn decode<V: 'static>(&self, tag: &Tag) -> CodecResult<V> {
        let boxed = self.decode_any(TypeKey::of::<V>(), tag)?;
        boxed
            .downcast::<V>()
            .map(|v| *v)
            .map_err(|_| CodecError::ValueTypeMismatch {
                expected: type_name::<V>(),
            })
    }

    /// Encode a type-erased value whose concrete type is `key`.
    pub fn encode_any(&self, key: TypeKey, value: &dyn Any) -> CodecResult<Tag> {
        self.lookup(key)?.encode(value)
    }

    /// Decode a tag into a boxed value of the type identified by `key`.
    pub fn decode_any(&self, key: TypeKey, tag: &Tag) -> CodecResult<Box<dyn Any>> {
        self.lookup(key)?.decode(tag)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Sorted names of all registered types.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.codecs.keys().map(TypeKey::name).collect();
        names.sort_unstable();
        names
    }

    fn lookup(&self, key: TypeKey) -> CodecResult<&dyn ErasedCodec> {
        self.codecs
            .get(&key)
            .map(|codec| codec.as_ref())
            .ok_or(CodecError::UnsupportedType {
                type_name: key.name(),
            })
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itemnbt_tree::TagKind;

    #[derive(Debug, Clone, PartialEq)]
    struct Rgb(u8, u8, u8);

    fn encode_rgb(c: &Rgb) -> Tag {
        Tag::Int(i32::from(c.0) << 16 | i32::from(c.1) << 8 | i32::from(c.2))
    }

    fn decode_rgb(tag: &Tag) -> CodecResult<Rgb> {
        match tag {
            Tag::Int(v) => Ok(Rgb((v >> 16) as u8, (v >> 8) as u8, *v as u8)),
            other => Err(CodecError::TagMismatch {
                expected: TagKind::Int,
                found: other.kind(),
            }),
        }
    }

    #[test]
    fn contains_only_registered_types() {
        let mut registry = CodecRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.contains::<Rgb>());

        registry.register(encode_rgb, decode_rgb).unwrap();
        assert!(registry.contains::<Rgb>());
        assert!(registry.contains_type(TypeKey::of::<Rgb>()));
        assert!(!registry.contains::<i32>());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = CodecRegistry::new();
        registry.register(encode_rgb, decode_rgb).unwrap();
        let err = registry.register(encode_rgb, decode_rgb).unwrap_err();
        assert!(matches!(err, CodecError::DuplicateRegistration { .. }));

        let mut defaults = CodecRegistry::with_defaults();
        let err = defaults.register_codec::<i32>().unwrap_err();
        assert!(matches!(err, CodecError::DuplicateRegistration { .. }));
    }

    #[test]
    fn unregistered_type_is_unsupported() {
        let registry = CodecRegistry::new();
        assert_eq!(
            registry.encode(&Rgb(1, 2, 3)).unwrap_err(),
            CodecError::UnsupportedType {
                type_name: type_name::<Rgb>()
            }
        );
        assert!(matches!(
            registry.decode::<Rgb>(&Tag::Int(0)),
            Err(CodecError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn custom_codec_roundtrip() {
        let mut registry = CodecRegistry::new();
        registry.register(encode_rgb, decode_rgb).unwrap();

        let tag = registry.encode(&Rgb(0x12, 0x34, 0x56)).unwrap();
        assert_eq!(tag, Tag::Int(0x123456));
        assert_eq!(registry.decode::<Rgb>(&tag).unwrap(), Rgb(0x12, 0x34, 0x56));
    }

    #[test]
    fn erased_encode_checks_value_type() {
        let registry = CodecRegistry::with_defaults();
        let err = registry
            .encode_any(TypeKey::of::<i32>(), &"not an int")
            .unwrap_err();
        assert!(matches!(err, CodecError::ValueTypeMismatch { .. }));
    }

    #[test]
    fn type_key_equality_ignores_name() {
        assert_eq!(TypeKey::of::<i32>(), TypeKey::of::<i32>());
        assert_ne!(TypeKey::of::<i32>(), TypeKey::of::<i64>());
        assert!(TypeKey::of::<String>().to_string().ends_with("String"));
    }
}
