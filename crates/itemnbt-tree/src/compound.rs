use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{validate_key, TreeError, TreeResult};
use crate::tag::{write_quoted, Tag, TagKind};
use crate::traits::TreeNode;

/// A key → [`Tag`] mapping.
///
/// Keys are kept in a `BTreeMap` so iteration, serialization, and SNBT output
/// are deterministic. Ordering carries no meaning.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Compound {
    entries: BTreeMap<String, Tag>,
}

impl Compound {
    /// Create a new empty compound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate over `(key, tag)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Tag)> {
        self.entries.iter()
    }

    /// Mutable access to the tag stored at `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Tag> {
        self.entries.get_mut(key)
    }

    /// Return the nested compound at `key`, creating it when absent.
    ///
    /// A non-compound tag already stored at `key` is an error rather than
    /// being overwritten.
    pub fn get_or_create_compound(&mut self, key: &str) -> TreeResult<&mut Compound> {
        validate_key(key)?;
        let tag = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Tag::Compound(Compound::new()));
        let found = tag.kind();
        tag.as_compound_mut().ok_or_else(|| TreeError::TypeMismatch {
            key: key.to_string(),
            expected: TagKind::Compound,
            found,
        })
    }

    /// Builder-style insert, used mostly to assemble fixtures.
    pub fn with(mut self, key: &str, value: impl Into<Tag>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }
}

impl TreeNode for Compound {
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn get(&self, key: &str) -> Option<&Tag> {
        self.entries.get(key)
    }

    fn put(&mut self, key: &str, value: Tag) -> Option<Tag> {
        self.entries.insert(key.to_string(), value)
    }

    fn remove(&mut self, key: &str) -> Option<Tag> {
        self.entries.remove(key)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

impl FromIterator<(String, Tag)> for Compound {
    fn from_iter<I: IntoIterator<Item = (String, Tag)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, tag)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if is_bare_key(key) {
                f.write_str(key)?;
            } else {
                write_quoted(f, key)?;
            }
            write!(f, ":{tag}")?;
        }
        f.write_str("}")
    }
}

fn is_bare_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+'))
}
