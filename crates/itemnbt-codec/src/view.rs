//! Typed views over a [`Compound`] that convert through a [`CodecRegistry`].
//!
//! Hand-written data objects use these to read and write their fields without
//! matching on [`Tag`] variants themselves.

use itemnbt_tree::{Compound, Tag, TreeNode};

use crate::error::{CodecError, CodecResult};
use crate::registry::CodecRegistry;

/// Read-only typed view.
#[derive(Clone, Copy)]
pub struct TypedRef<'a> {
    node: &'a Compound,
    codecs: &'a CodecRegistry,
}

impl<'a> TypedRef<'a> {
    pub fn new(node: &'a Compound, codecs: &'a CodecRegistry) -> Self {
        Self { node, codecs }
    }

    /// Decode the value at `key`. Returns `Ok(None)` if the key is absent.
    pub fn get<V: 'static>(&self, key: &str) -> CodecResult<Option<V>> {
        read(self.node, self.codecs, key)
    }

    /// Decode the value at `key`, falling back to `default` when absent.
    pub fn get_or<V: 'static>(&self, key: &str, default: V) -> CodecResult<V> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Nested view over the compound at `key`, if `key` holds one.
    pub fn nested(&self, key: &str) -> Option<TypedRef<'a>> {
        let codecs = self.codecs;
        self.node
            .get_compound(key)
            .map(|node| TypedRef { node, codecs })
    }

    pub fn node(&self) -> &'a Compound {
        self.node
    }
}

/// Read-write typed view.
pub struct TypedCompound<'a> {
    node: &'a mut Compound,
    codecs: &'a CodecRegistry,
}

impl<'a> TypedCompound<'a> {
    pub fn new(node: &'a mut Compound, codecs: &'a CodecRegistry) -> Self {
        Self { node, codecs }
    }

    pub fn get<V: 'static>(&self, key: &str) -> CodecResult<Option<V>> {
        read(&*self.node, self.codecs, key)
    }

    pub fn get_or<V: 'static>(&self, key: &str, default: V) -> CodecResult<V> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Encode `value` and store it at `key`, replacing any previous tag.
    pub fn put<V: 'static>(&mut self, key: &str, value: &V) -> CodecResult<()> {
        if key.trim().is_empty() {
            return Err(CodecError::InvalidKey(key.to_string()));
        }
        let tag = self.codecs.encode(value)?;
        self.node.put(key, tag);
        Ok(())
    }

    /// Store a raw tag, bypassing the registry.
    pub fn put_tag(&mut self, key: &str, tag: Tag) -> CodecResult<()> {
        if key.trim().is_empty() {
            return Err(CodecError::InvalidKey(key.to_string()));
        }
        self.node.put(key, tag);
        Ok(())
    }

    /// Remove `key`. Returns `true` if it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.node.remove(key).is_some()
    }

    /// Read-only view over the same compound.
    pub fn view(&self) -> TypedRef<'_> {
        TypedRef::new(&*self.node, self.codecs)
    }
}

fn read<V: 'static>(node: &Compound, codecs: &CodecRegistry, key: &str) -> CodecResult<Option<V>> {
    node.get(key).map(|tag| codecs.decode::<V>(tag)).transpose()
}
