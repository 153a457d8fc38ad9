//! Descriptor cache and nested-type resolution.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::sync::{Arc, RwLock};

use itemnbt_codec::{CodecRegistry, TypeKey};
use tracing::debug;

use crate::builder::LinkBuilder;
use crate::descriptor::{ErasedLink, LinkDescriptor};
use crate::error::LinkResult;
use crate::shape::{DataShape, Linked};

/// Resolves the descriptor of a composite field's nested type while the
/// enclosing descriptor is being built. The stack holds the types currently
/// under construction.
pub(crate) type NestedResolver =
    fn(&Linker, &mut Vec<TypeKey>) -> LinkResult<Arc<dyn ErasedLink>>;

pub(crate) fn resolve_nested<V: Linked>(
    linker: &Linker,
    stack: &mut Vec<TypeKey>,
) -> LinkResult<Arc<dyn ErasedLink>> {
    let descriptor = linker.descriptor_in::<V>(stack)?;
    Ok(descriptor)
}

type DescriptorCache = RwLock<HashMap<TypeKey, Arc<dyn Any + Send + Sync>>>;

/// Builds link descriptors and caches them per type.
///
/// Descriptors are immutable, so one `Linker` can be shared across threads
/// (wrap it in an `Arc`). Nested descriptors resolved while building a
/// composite type are cached too.
pub struct Linker {
    codecs: Arc<CodecRegistry>,
    cache: Option<DescriptorCache>,
}

impl Linker {
    /// A linker that caches every descriptor it builds.
    pub fn new(codecs: Arc<CodecRegistry>) -> Self {
        Self {
            codecs,
            cache: Some(RwLock::new(HashMap::new())),
        }
    }

    /// A linker that rebuilds descriptors on every request.
    pub fn uncached(codecs: Arc<CodecRegistry>) -> Self {
        Self {
            codecs,
            cache: None,
        }
    }

    pub fn codecs(&self) -> &Arc<CodecRegistry> {
        &self.codecs
    }

    pub fn is_caching(&self) -> bool {
        self.cache.is_some()
    }

    /// The descriptor for `T`, built from [`Linked::shape`] on first use.
    pub fn descriptor<T: Linked>(&self) -> LinkResult<Arc<LinkDescriptor<T>>> {
        self.descriptor_in::<T>(&mut Vec::new())
    }

    pub(crate) fn descriptor_in<T: Linked>(
        &self,
        stack: &mut Vec<TypeKey>,
    ) -> LinkResult<Arc<LinkDescriptor<T>>> {
        let key = TypeKey::of::<T>();
        if let Some(hit) = self.cached::<T>(key) {
            debug!(type_name = key.name(), "descriptor cache hit");
            return Ok(hit);
        }

        let mut builder = LinkBuilder::with_stack(self, mem::take(stack));
        let built = builder.build(T::shape());
        *stack = builder.into_stack();
        let descriptor = Arc::new(built?);

        let Some(cache) = &self.cache else {
            return Ok(descriptor);
        };
        let mut cache = cache.write().expect("descriptor cache poisoned");
        // Another thread may have built the same type meanwhile; keep the
        // first entry so every caller shares one descriptor.
        let entry = cache
            .entry(key)
            .or_insert_with(|| descriptor as Arc<dyn Any + Send + Sync>);
        Ok(Arc::clone(entry)
            .downcast::<LinkDescriptor<T>>()
            .expect("descriptor cache keyed by type"))
    }

    fn cached<T: 'static>(&self, key: TypeKey) -> Option<Arc<LinkDescriptor<T>>> {
        let cache = self.cache.as_ref()?;
        let entry = cache
            .read()
            .expect("descriptor cache poisoned")
            .get(&key)
            .cloned()?;
        entry.downcast::<LinkDescriptor<T>>().ok()
    }

    /// Build a descriptor from an explicit shape, bypassing the cache.
    ///
    /// Useful for alternate views of a type; nested types are still resolved
    /// through (and cached by) this linker.
    pub fn build_shape<T: 'static>(&self, shape: DataShape<T>) -> LinkResult<LinkDescriptor<T>> {
        LinkBuilder::new(self).build(shape)
    }

    /// Number of cached descriptors.
    pub fn cached_len(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| {
            cache.read().expect("descriptor cache poisoned").len()
        })
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.write().expect("descriptor cache poisoned").clear();
        }
    }
}

impl fmt::Debug for Linker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Linker")
            .field("codecs", &self.codecs)
            .field("caching", &self.is_caching())
            .field("cached", &self.cached_len())
            .finish()
    }
}
