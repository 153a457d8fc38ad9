//! Value codec registry for itemnbt.
//!
//! A [`CodecRegistry`] maps a value's static type to a pair of functions that
//! encode the value into a [`Tag`](itemnbt_tree::Tag) and decode it back. The
//! linker consults the registry twice: once while building a descriptor, to
//! decide whether a field is *scalar* (registered) or *composite* (not), and
//! again on every link pass to convert field values.
//!
//! The registry is an explicit value rather than process-wide state. Build it
//! (usually with [`CodecRegistry::with_defaults`]), register any custom types,
//! then share it read-only behind an `Arc`.

pub mod builtin;
pub mod error;
pub mod registry;
pub mod view;

pub use builtin::TagCodec;
pub use error::{CodecError, CodecResult};
pub use registry::{CodecRegistry, TypeKey};
pub use view::{TypedCompound, TypedRef};
