use std::fmt;
use std::sync::Arc;

use itemnbt_codec::CodecRegistry;
use itemnbt_link::{LinkDescriptor, LinkReport, Linker};
use itemnbt_tree::{HostItem, TreeNode};
use tracing::debug;

use crate::config::SyncConfig;
use crate::data::LinkedData;
use crate::error::{validate_category, DataError, DataResult};
use crate::guard::DataGuard;
use crate::helper::{overwrite, prepare};

/// Where a category stands on a host item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataState {
    /// The sub-tree is absent or empty.
    Uninitialized,
    /// The sub-tree holds data.
    Initialized,
    /// An in-memory object holds changes not yet written back.
    ///
    /// Only a [`DataGuard`] can observe this; the host item alone never
    /// knows about unsynchronized objects.
    Dirty,
}

impl fmt::Display for DataState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("uninitialized"),
            Self::Initialized => f.write_str("initialized"),
            Self::Dirty => f.write_str("dirty"),
        }
    }
}

/// Entry point for linked data objects.
///
/// Fetches typed objects out of their category sub-tree on a host item and
/// writes them back. Data objects are transient projections: the host's tree
/// is the only persistent copy.
pub struct DataManager {
    linker: Arc<Linker>,
    config: SyncConfig,
}

impl DataManager {
    /// A manager with the default configuration.
    pub fn new(codecs: Arc<CodecRegistry>) -> Self {
        Self::with_config(codecs, SyncConfig::default())
    }

    pub fn with_config(codecs: Arc<CodecRegistry>, config: SyncConfig) -> Self {
        let linker = if config.cache_descriptors {
            Linker::new(codecs)
        } else {
            Linker::uncached(codecs)
        };
        Self {
            linker: Arc::new(linker),
            config,
        }
    }

    /// Share an existing linker (and its descriptor cache).
    pub fn with_linker(linker: Arc<Linker>, config: SyncConfig) -> Self {
        Self { linker, config }
    }

    pub fn linker(&self) -> &Arc<Linker> {
        &self.linker
    }

    pub fn codecs(&self) -> &Arc<CodecRegistry> {
        self.linker.codecs()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn descriptor<T: LinkedData>(&self) -> DataResult<Arc<LinkDescriptor<T>>> {
        validate_category(T::CATEGORY)?;
        Ok(self.linker.descriptor::<T>()?)
    }

    fn settle(&self, category: &str, report: LinkReport) -> DataResult<LinkReport> {
        if self.config.strict_fields && !report.is_complete() {
            return Err(DataError::PartialLink {
                category: category.to_string(),
                failures: report.failures().to_vec(),
            });
        }
        Ok(report)
    }

    /// Load `T` from its category on `host`.
    ///
    /// The first access to an absent or empty category writes a freshly
    /// constructed `T` into it, so later reads see the defaults.
    pub fn get<T, H>(&self, host: &mut H) -> DataResult<T>
    where
        T: LinkedData,
        H: HostItem + ?Sized,
    {
        self.get_with_report(host).map(|(data, _)| data)
    }

    /// Like [`get`](Self::get), also returning the link report (default
    /// population included).
    pub fn get_with_report<T, H>(&self, host: &mut H) -> DataResult<(T, LinkReport)>
    where
        T: LinkedData,
        H: HostItem + ?Sized,
    {
        let descriptor = self.descriptor::<T>()?;
        let mut report = LinkReport::new();
        let subtree = prepare(host, T::CATEGORY, |tree| {
            let defaults = descriptor.create();
            let populated = descriptor.backward_link(tree, &defaults);
            report.merge(self.settle(T::CATEGORY, populated)?);
            Ok(())
        })?;

        let (data, forward) = descriptor.read(&*subtree);
        report.merge(forward);
        debug!(category = T::CATEGORY, %report, "loaded data object");
        Ok((data, self.settle(T::CATEGORY, report)?))
    }

    /// Replace `T`'s category sub-tree with the fields of `data`.
    ///
    /// This is a full overwrite: keys not mapped by `T` are dropped. In
    /// strict mode a partial link is rejected before the host is touched.
    pub fn synchronize<T, H>(&self, host: &mut H, data: &T) -> DataResult<LinkReport>
    where
        T: LinkedData,
        H: HostItem + ?Sized,
    {
        let descriptor = self.descriptor::<T>()?;
        overwrite(host, T::CATEGORY, |tree| {
            self.settle(T::CATEGORY, descriptor.backward_link(tree, data))
        })
    }

    /// Apply `mutator` to `data`, then synchronize it.
    pub fn use_data<T, H>(
        &self,
        host: &mut H,
        data: &mut T,
        mutator: impl FnOnce(&mut T),
    ) -> DataResult<LinkReport>
    where
        T: LinkedData,
        H: HostItem + ?Sized,
    {
        mutator(data);
        self.synchronize(host, data)
    }

    /// Whether `T`'s category holds any data. Never creates the sub-tree.
    ///
    /// Returns `Uninitialized` or `Initialized` only; use
    /// [`DataGuard::state`] to track [`DataState::Dirty`].
    pub fn state<T, H>(&self, host: &H) -> DataResult<DataState>
    where
        T: LinkedData,
        H: HostItem + ?Sized,
    {
        validate_category(T::CATEGORY)?;
        Ok(match host.subtree(T::CATEGORY) {
            Some(tree) if !tree.is_empty() => DataState::Initialized,
            _ => DataState::Uninitialized,
        })
    }

    /// Load `T` into a guard that writes it back on
    /// [`commit`](DataGuard::commit).
    pub fn edit<'m, 'h, T, H>(&'m self, host: &'h mut H) -> DataResult<DataGuard<'m, 'h, T, H>>
    where
        T: LinkedData,
        H: HostItem + ?Sized,
    {
        let data = self.get::<T, H>(host)?;
        Ok(DataGuard::new(self, host, data))
    }

    /// Drop `T`'s category sub-tree. Returns `true` if one was present.
    pub fn remove<T, H>(&self, host: &mut H) -> DataResult<bool>
    where
        T: LinkedData,
        H: HostItem + ?Sized,
    {
        validate_category(T::CATEGORY)?;
        let removed = host.remove_subtree(T::CATEGORY).is_some();
        debug!(category = T::CATEGORY, removed, "remove category");
        Ok(removed)
    }
}

impl fmt::Debug for DataManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataManager")
            .field("linker", &self.linker)
            .field("config", &self.config)
            .finish()
    }
}
