//! Lifecycle functions for hand-written [`ItemData`] objects.
//!
//! These follow the same protocol as [`DataManager`](crate::DataManager):
//! the first access to an empty category writes the object's defaults, every
//! synchronization is a full overwrite of the category sub-tree.

use itemnbt_codec::{CodecRegistry, TypedCompound, TypedRef};
use itemnbt_tree::{Compound, HostItem, TreeNode};
use tracing::debug;

use crate::data::ItemData;
use crate::error::{validate_category, DataResult};

/// Get-or-create the `category` sub-tree. An absent or empty sub-tree is
/// first filled by `populate`, working on a scratch compound that only
/// replaces the sub-tree once `populate` succeeds.
pub(crate) fn prepare<'h, H>(
    host: &'h mut H,
    category: &str,
    populate: impl FnOnce(&mut Compound) -> DataResult<()>,
) -> DataResult<&'h mut Compound>
where
    H: HostItem + ?Sized,
{
    validate_category(category)?;
    if host.subtree(category).map_or(true, TreeNode::is_empty) {
        let mut defaults = Compound::new();
        populate(&mut defaults)?;
        debug!(category, keys = defaults.len(), "populated defaults");
        *host.get_or_create_subtree(category)? = defaults;
    }
    Ok(host.get_or_create_subtree(category)?)
}

/// Replace the `category` sub-tree with whatever `write` puts into a fresh
/// compound. On error the host is left untouched.
pub(crate) fn overwrite<H, R>(
    host: &mut H,
    category: &str,
    write: impl FnOnce(&mut Compound) -> DataResult<R>,
) -> DataResult<R>
where
    H: HostItem + ?Sized,
{
    validate_category(category)?;
    let mut tree = Compound::new();
    let outcome = write(&mut tree)?;
    *host.get_or_create_subtree(category)? = tree;
    Ok(outcome)
}

/// Build an object with `factory` and load it from its category on `host`.
///
/// If the category is absent or empty, the fresh object's fields are written
/// first, so the returned object and the stored tree agree.
pub fn get<D, H>(factory: impl FnOnce() -> D, host: &mut H, codecs: &CodecRegistry) -> DataResult<D>
where
    D: ItemData,
    H: HostItem + ?Sized,
{
    let mut data = factory();
    let category = data.category().to_string();
    let subtree = prepare(host, &category, |tree| {
        data.write_nbt(&mut TypedCompound::new(tree, codecs))
    })?;
    data.read_nbt(TypedRef::new(subtree, codecs))?;
    Ok(data)
}

/// Replace the object's category sub-tree with the object's current fields.
pub fn synchronize<D, H>(host: &mut H, data: &D, codecs: &CodecRegistry) -> DataResult<()>
where
    D: ItemData,
    H: HostItem + ?Sized,
{
    overwrite(host, data.category(), |tree| {
        data.write_nbt(&mut TypedCompound::new(tree, codecs))
    })
}

/// Apply `mutator` to `data`, then synchronize it.
pub fn use_data<D, H>(
    host: &mut H,
    data: &mut D,
    codecs: &CodecRegistry,
    mutator: impl FnOnce(&mut D),
) -> DataResult<()>
where
    D: ItemData,
    H: HostItem + ?Sized,
{
    mutator(data);
    synchronize(host, data, codecs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use itemnbt_tree::{ItemStack, Tag};

    /// Stores its owner as a plain string and its charges under a short key.
    #[derive(Debug, Clone, PartialEq)]
    struct Wand {
        owner: String,
        charges: i32,
    }

    impl Default for Wand {
        fn default() -> Self {
            Self {
                owner: "nobody".into(),
                charges: 3,
            }
        }
    }

    impl ItemData for Wand {
        fn category(&self) -> &str {
            "wand"
        }

        fn read_nbt(&mut self, node: TypedRef<'_>) -> DataResult<()> {
            self.owner = node.get_or("owner", String::new())?;
            self.charges = node.get_or("ch", 0)?;
            Ok(())
        }

        fn write_nbt(&self, node: &mut TypedCompound<'_>) -> DataResult<()> {
            node.put("owner", &self.owner)?;
            node.put("ch", &self.charges)?;
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Nameless;

    /// Writes its first key, then fails on a type with no codec.
    #[derive(Debug, Default)]
    struct Flaky {
        level: i32,
    }

    impl ItemData for Flaky {
        fn category(&self) -> &str {
            "flaky"
        }

        fn read_nbt(&mut self, node: TypedRef<'_>) -> DataResult<()> {
            self.level = node.get_or("level", 0)?;
            Ok(())
        }

        fn write_nbt(&self, node: &mut TypedCompound<'_>) -> DataResult<()> {
            node.put("level", &self.level)?;
            node.put("mask", &7u32)?;
            Ok(())
        }
    }

    impl ItemData for Nameless {
        fn category(&self) -> &str {
            ""
        }

        fn read_nbt(&mut self, _node: TypedRef<'_>) -> DataResult<()> {
            Ok(())
        }

        fn write_nbt(&self, _node: &mut TypedCompound<'_>) -> DataResult<()> {
            Ok(())
        }
    }

    #[test]
    fn first_get_writes_defaults() {
        let codecs = CodecRegistry::with_defaults();
        let mut stack = ItemStack::new("magic:wand", 1);

        let wand = get(Wand::default, &mut stack, &codecs).unwrap();
        assert_eq!(wand, Wand::default());

        let tree = stack.subtree("wand").unwrap();
        assert_eq!(tree.get("owner"), Some(&Tag::String("nobody".into())));
        assert_eq!(tree.get("ch"), Some(&Tag::Int(3)));
    }

    #[test]
    fn use_data_persists_mutation() {
        let codecs = CodecRegistry::with_defaults();
        let mut stack = ItemStack::new("magic:wand", 1);

        let mut wand = get(Wand::default, &mut stack, &codecs).unwrap();
        use_data(&mut stack, &mut wand, &codecs, |w| {
            w.owner = "merlin".into();
            w.charges -= 1;
        })
        .unwrap();

        let again = get(Wand::default, &mut stack, &codecs).unwrap();
        assert_eq!(again.owner, "merlin");
        assert_eq!(again.charges, 2);
    }

    #[test]
    fn synchronize_replaces_foreign_keys() {
        let codecs = CodecRegistry::with_defaults();
        let mut stack = ItemStack::new("magic:wand", 1);
        stack
            .get_or_create_subtree("wand")
            .unwrap()
            .put("stale", Tag::Byte(1));

        synchronize(&mut stack, &Wand::default(), &codecs).unwrap();
        let tree = stack.subtree("wand").unwrap();
        assert!(!tree.contains_key("stale"));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn existing_data_is_not_overwritten_on_get() {
        let codecs = CodecRegistry::with_defaults();
        let mut stack = ItemStack::new("magic:wand", 1);
        stack
            .get_or_create_subtree("wand")
            .unwrap()
            .put("ch", Tag::Int(40));

        let wand = get(Wand::default, &mut stack, &codecs).unwrap();
        assert_eq!(wand.charges, 40);
        assert_eq!(wand.owner, "");
        assert!(!stack.subtree("wand").unwrap().contains_key("owner"));
    }

    #[test]
    fn blank_category_is_invalid_argument() {
        let codecs = CodecRegistry::with_defaults();
        let mut stack = ItemStack::new("magic:wand", 1);
        let err = get(|| Nameless, &mut stack, &codecs).unwrap_err();
        assert!(matches!(err, DataError::InvalidArgument(_)));
        assert!(!stack.has_data());
    }

    #[test]
    fn failed_default_population_leaves_category_empty() {
        let codecs = CodecRegistry::with_defaults();
        let mut stack = ItemStack::new("magic:wand", 1);

        let err = get(Flaky::default, &mut stack, &codecs).unwrap_err();
        assert!(matches!(err, DataError::Codec(_)));
        assert!(stack.subtree("flaky").is_none());

        // A later get still sees an uninitialized category and retries.
        assert!(get(Flaky::default, &mut stack, &codecs).is_err());
        assert!(stack.subtree("flaky").is_none());
    }

    #[test]
    fn failed_synchronize_keeps_previous_tree() {
        let codecs = CodecRegistry::with_defaults();
        let mut stack = ItemStack::new("magic:wand", 1);
        stack
            .get_or_create_subtree("flaky")
            .unwrap()
            .put("level", Tag::Int(4));

        let flaky = Flaky { level: 9 };
        assert!(synchronize(&mut stack, &flaky, &codecs).is_err());
        let tree = stack.subtree("flaky").unwrap();
        assert_eq!(tree.get("level"), Some(&Tag::Int(4)));
        assert_eq!(tree.len(), 1);
    }
}
