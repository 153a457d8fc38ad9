//! Field linking between typed data objects and tagged trees.
//!
//! A data-object type describes its fields once, as a [`DataShape`], instead
//! of being discovered through runtime reflection. The [`LinkBuilder`] turns
//! a shape into an immutable [`LinkDescriptor`] that knows, for every tree
//! key, which field it maps to and whether that field is *scalar* (converted
//! through the codec registry) or *composite* (a nested data object linked
//! recursively).
//!
//! # Discovery Modes
//!
//! - [`LinkMode::Automatic`] -- every public field is linked under its own
//!   name; registered types become scalars, everything else must be a nested
//!   [`Linked`] type.
//! - [`LinkMode::Manual`] -- only fields carrying an explicit scalar or
//!   composite key are linked, under that key.
//!
//! # Linking
//!
//! - Forward link: tree → instance ([`LinkDescriptor::forward_link`]).
//! - Backward link: instance → tree ([`LinkDescriptor::backward_link`]).
//!
//! Per-field failures never abort a link pass. They are logged and collected
//! in the returned [`LinkReport`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use itemnbt_codec::CodecRegistry;
//! use itemnbt_link::{field, DataShape, Linked, Linker};
//! use itemnbt_tree::Compound;
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: i32,
//!     label: String,
//! }
//!
//! impl Linked for Counter {
//!     fn shape() -> DataShape<Self> {
//!         DataShape::manual()
//!             .with_default_factory()
//!             .field(field!(Counter, count).scalar("count"))
//!             .field(field!(Counter, label).scalar("label"))
//!     }
//! }
//!
//! let linker = Linker::new(Arc::new(CodecRegistry::with_defaults()));
//! let descriptor = linker.descriptor::<Counter>().unwrap();
//!
//! let mut tree = Compound::new();
//! let report = descriptor.backward_link(&mut tree, &Counter { count: 5, label: "x".into() });
//! assert!(report.is_complete());
//!
//! let (copy, _) = descriptor.read(&tree);
//! assert_eq!(copy.count, 5);
//! ```

mod access;
pub mod builder;
pub mod descriptor;
pub mod error;
pub mod linker;
pub mod report;
pub mod shape;

pub use builder::LinkBuilder;
pub use descriptor::LinkDescriptor;
pub use error::{LinkError, LinkResult};
pub use linker::Linker;
pub use report::{FieldFailure, FieldFailureReason, LinkDirection, LinkReport};
pub use shape::{DataShape, Field, FieldRef, LinkMode, Linked, Visibility};

/// Declare a field by name, generating its accessor pair.
///
/// `field!(Type, name)` links a plain field; `field!(Type, name?)` links an
/// `Option<_>` field whose `None` is stored as a missing key, and
/// `field!(Type, name!)` an `Option<_>` field that must hold a value.
#[macro_export]
macro_rules! field {
    ($ty:ty, $name:ident !) => {
        $crate::Field::<$ty, _>::required(
            stringify!($name),
            |d| &d.$name,
            |d| &mut d.$name,
        )
    };
    ($ty:ty, $name:ident ?) => {
        $crate::Field::<$ty, _>::optional(
            stringify!($name),
            |d| &d.$name,
            |d| &mut d.$name,
        )
    };
    ($ty:ty, $name:ident) => {
        $crate::Field::<$ty, _>::new(
            stringify!($name),
            |d| &d.$name,
            |d| &mut d.$name,
        )
    };
}
