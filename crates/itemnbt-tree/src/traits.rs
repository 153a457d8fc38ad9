//! The narrow interfaces the linking core works through.
//!
//! [`TreeNode`] is everything the linker needs from a sub-tree, and
//! [`HostItem`] is everything the synchronization protocol needs from the
//! item that owns the tree.

use crate::compound::Compound;
use crate::error::TreeResult;
use crate::tag::Tag;

/// A schema-less, nestable key-value node.
///
/// Nesting is expressed through [`Tag::Compound`]: a node's value may itself
/// be a sub-tree.
pub trait TreeNode {
    /// Returns `true` if the node holds no keys.
    fn is_empty(&self) -> bool;

    /// Number of keys in the node.
    fn len(&self) -> usize;

    /// Read the tag stored at `key`.
    fn get(&self, key: &str) -> Option<&Tag>;

    /// Store `value` at `key`, returning the previous tag if any.
    fn put(&mut self, key: &str, value: Tag) -> Option<Tag>;

    /// Remove the tag at `key`, returning it if it existed.
    fn remove(&mut self, key: &str) -> Option<Tag>;

    /// Remove every key from the node.
    fn clear(&mut self);

    /// All keys currently present, in sorted order.
    fn keys(&self) -> Vec<String>;

    /// Whether a tag is stored at `key`.
    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Read the nested sub-tree stored at `key`, if `key` holds a compound.
    fn get_compound(&self, key: &str) -> Option<&Compound> {
        self.get(key).and_then(Tag::as_compound)
    }
}

/// The item that owns a persisted tree.
///
/// Each data-object type lives under its own category sub-tree. The host is
/// the only owner of that tree; data objects are transient projections of it.
pub trait HostItem {
    /// Return the sub-tree named `category`, creating an empty one if it is
    /// absent. Idempotent.
    ///
    /// Returns `Err(TreeError::InvalidKey)` for a blank category.
    fn get_or_create_subtree(&mut self, category: &str) -> TreeResult<&mut Compound>;

    /// Read the sub-tree named `category` without creating it.
    fn subtree(&self, category: &str) -> Option<&Compound>;

    /// Detach and return the sub-tree named `category`.
    fn remove_subtree(&mut self, category: &str) -> Option<Compound>;

    /// Whether a sub-tree named `category` exists (empty or not).
    fn has_subtree(&self, category: &str) -> bool {
        self.subtree(category).is_some()
    }
}
