use std::fmt;
use std::ops::{Deref, DerefMut};

use itemnbt_link::LinkReport;
use itemnbt_tree::HostItem;
use tracing::warn;

use crate::data::LinkedData;
use crate::error::DataResult;
use crate::manager::{DataManager, DataState};

/// A loaded data object bound to its host item.
///
/// Mutable access marks the guard dirty. [`commit`](Self::commit) writes the
/// object back; dropping a dirty guard loses the changes (and logs a warning
/// unless `warn_on_dirty_drop` is off).
pub struct DataGuard<'m, 'h, T, H>
where
    T: LinkedData,
    H: HostItem + ?Sized,
{
    manager: &'m DataManager,
    host: &'h mut H,
    data: T,
    dirty: bool,
}

impl<'m, 'h, T, H> DataGuard<'m, 'h, T, H>
where
    T: LinkedData,
    H: HostItem + ?Sized,
{
    pub(crate) fn new(manager: &'m DataManager, host: &'h mut H, data: T) -> Self {
        Self {
            manager,
            host,
            data,
            dirty: false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// `Dirty` after any mutable access since loading, `Initialized` otherwise.
    pub fn state(&self) -> DataState {
        if self.dirty {
            DataState::Dirty
        } else {
            DataState::Initialized
        }
    }

    /// Synchronize the object into its category sub-tree.
    ///
    /// A clean guard is written too, so a commit always leaves the tree
    /// matching the object.
    pub fn commit(mut self) -> DataResult<LinkReport> {
        let report = self.manager.synchronize(&mut *self.host, &self.data)?;
        self.dirty = false;
        Ok(report)
    }

    /// Drop the object without writing it back.
    pub fn discard(mut self) {
        self.dirty = false;
    }
}

impl<T, H> Deref for DataGuard<'_, '_, T, H>
where
    T: LinkedData,
    H: HostItem + ?Sized,
{
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T, H> DerefMut for DataGuard<'_, '_, T, H>
where
    T: LinkedData,
    H: HostItem + ?Sized,
{
    fn deref_mut(&mut self) -> &mut T {
        self.dirty = true;
        &mut self.data
    }
}

impl<T, H> Drop for DataGuard<'_, '_, T, H>
where
    T: LinkedData,
    H: HostItem + ?Sized,
{
    fn drop(&mut self) {
        if self.dirty && self.manager.config().warn_on_dirty_drop {
            warn!(
                category = T::CATEGORY,
                "data guard dropped with uncommitted changes"
            );
        }
    }
}

impl<T, H> fmt::Debug for DataGuard<'_, '_, T, H>
where
    T: LinkedData + fmt::Debug,
    H: HostItem + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataGuard")
            .field("category", &T::CATEGORY)
            .field("data", &self.data)
            .field("dirty", &self.dirty)
            .finish()
    }
}
