//! In-memory host item.
//!
//! [`ItemStack`] owns an optional root [`Compound`] and hands out category
//! sub-trees through [`HostItem`]. It can be persisted as JSON, which is what
//! the CLI and tests use; the tree format itself stays opaque to the linker.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compound::Compound;
use crate::error::{validate_key, TreeError, TreeResult};
use crate::tag::Tag;
use crate::traits::{HostItem, TreeNode};

/// An inventory item instance carrying an optional data tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item identifier, e.g. `"minecraft:diamond_sword"`.
    pub item: String,
    /// Stack size.
    pub count: u32,
    /// Root data tree. `None` until some category is first created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<Compound>,
}

impl ItemStack {
    /// Create a stack of `count` items with no data tree.
    pub fn new(item: impl Into<String>, count: u32) -> Self {
        Self {
            item: item.into(),
            count,
            tag: None,
        }
    }

    /// The root data tree, if one has been created.
    pub fn root(&self) -> Option<&Compound> {
        self.tag.as_ref()
    }

    /// Whether the stack carries a non-empty data tree.
    pub fn has_data(&self) -> bool {
        self.tag.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// Names of all category sub-trees present on the stack.
    pub fn categories(&self) -> Vec<String> {
        self.tag
            .as_ref()
            .map(|root| {
                root.iter()
                    .filter(|(_, tag)| tag.as_compound().is_some())
                    .map(|(key, _)| key.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Encode the stack as pretty-printed JSON.
    pub fn to_json(&self) -> TreeResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| TreeError::Serialization(e.to_string()))
    }

    /// Decode a stack from JSON.
    pub fn from_json(json: &str) -> TreeResult<Self> {
        serde_json::from_str(json).map_err(|e| TreeError::Serialization(e.to_string()))
    }

    /// Load a stack from a JSON file.
    pub fn load(path: &Path) -> TreeResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write the stack to a JSON file, replacing any existing content.
    pub fn save(&self, path: &Path) -> TreeResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl HostItem for ItemStack {
    fn get_or_create_subtree(&mut self, category: &str) -> TreeResult<&mut Compound> {
        validate_key(category)?;
        let root = self.tag.get_or_insert_with(Compound::new);

        // A non-compound value squatting on the category is replaced, matching
        // how item stacks treat malformed sub-trees.
        if root.get(category).is_some_and(|t| t.as_compound().is_none()) {
            debug!(category, "replacing non-compound tag with empty sub-tree");
            root.put(category, Tag::Compound(Compound::new()));
        }
        root.get_or_create_compound(category)
    }

    fn subtree(&self, category: &str) -> Option<&Compound> {
        self.tag.as_ref()?.get_compound(category)
    }

    fn remove_subtree(&mut self, category: &str) -> Option<Compound> {
        let root = self.tag.as_mut()?;
        root.get_compound(category)?;
        match root.remove(category) {
            Some(Tag::Compound(c)) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for ItemStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{}", self.item, self.count)?;
        if let Some(tag) = &self.tag {
            write!(f, " {tag}")?;
        }
        Ok(())
    }
}
