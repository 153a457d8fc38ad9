//! Data-object contracts.

use itemnbt_codec::{TypedCompound, TypedRef};
use itemnbt_link::Linked;

use crate::error::DataResult;

/// A linked data object stored under a fixed category on its host item.
///
/// The shape from [`Linked`] decides which fields reach the tree; the
/// category names the sub-tree they live in.
pub trait LinkedData: Linked {
    const CATEGORY: &'static str;
}

/// A data object that reads and writes its own sub-tree by hand.
///
/// Served by the functions in [`helper`](crate::helper). Useful when a type
/// needs a storage layout the linker cannot express.
pub trait ItemData {
    /// Name of the sub-tree this object lives in.
    fn category(&self) -> &str;

    /// Load fields from the category sub-tree.
    fn read_nbt(&mut self, node: TypedRef<'_>) -> DataResult<()>;

    /// Store fields into the category sub-tree.
    fn write_nbt(&self, node: &mut TypedCompound<'_>) -> DataResult<()>;
}
