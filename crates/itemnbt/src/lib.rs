//! Typed item data backed by per-category sub-trees.
//!
//! A data object is a plain struct that describes its fields once (see
//! [`Linked`]) and names the category it lives under ([`LinkedData`]). The
//! [`DataManager`] then moves it in and out of a host item:
//!
//! - [`DataManager::get`] -- fetch, writing the type's defaults on first access
//! - [`DataManager::synchronize`] -- replace the category with the object's fields
//! - [`DataManager::use_data`] -- mutate, then synchronize
//! - [`DataManager::edit`] -- a [`DataGuard`] that writes back on commit
//!
//! Types that manage their own layout implement [`ItemData`] and go through
//! the [`helper`] functions instead.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use itemnbt::{field, CodecRegistry, DataManager, DataShape, ItemStack, Linked, LinkedData};
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: i32,
//!     label: String,
//! }
//!
//! impl Linked for Counter {
//!     fn shape() -> DataShape<Self> {
//!         DataShape::automatic()
//!             .with_default_factory()
//!             .field(field!(Counter, count))
//!             .field(field!(Counter, label))
//!     }
//! }
//!
//! impl LinkedData for Counter {
//!     const CATEGORY: &'static str = "counter";
//! }
//!
//! let manager = DataManager::new(Arc::new(CodecRegistry::with_defaults()));
//! let mut stack = ItemStack::new("minecraft:compass", 1);
//!
//! let mut counter: Counter = manager.get(&mut stack).unwrap();
//! manager.use_data(&mut stack, &mut counter, |c| c.count += 1).unwrap();
//!
//! let counter: Counter = manager.get(&mut stack).unwrap();
//! assert_eq!(counter.count, 1);
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod guard;
pub mod helper;
pub mod manager;

pub use config::SyncConfig;
pub use data::{ItemData, LinkedData};
pub use error::{DataError, DataResult};
pub use guard::DataGuard;
pub use manager::{DataManager, DataState};

// Re-export key types
pub use itemnbt_codec::{CodecRegistry, TagCodec, TypedCompound, TypedRef};
pub use itemnbt_link::{
    field, DataShape, Field, FieldFailure, FieldFailureReason, LinkReport, Linked, Linker,
};
pub use itemnbt_tree::{Compound, HostItem, ItemStack, Tag, TagKind, TreeNode};
