//! Tagged key-value tree storage for itemnbt.
//!
//! This crate provides the persistence substrate that linked item data lives
//! in. It is deliberately schema-less: a [`Compound`] maps string keys to
//! [`Tag`] values, and a tag may itself be a nested compound.
//!
//! # Key Types
//!
//! - [`Tag`] -- a single tagged value (numbers, strings, typed arrays, lists, compounds)
//! - [`Compound`] -- a key → tag mapping; the unit that data objects are linked against
//! - [`ItemStack`] -- an in-memory host item owning an optional root compound
//!
//! # Interfaces
//!
//! - [`TreeNode`] -- the narrow get/put/clear contract the linker works through
//! - [`HostItem`] -- "get or create a named sub-tree" on the owning item
//!
//! # Design Rules
//!
//! 1. The tree never interprets its contents. Unknown keys are carried along untouched.
//! 2. A category sub-tree is owned exclusively by its host item.
//! 3. Key ordering is irrelevant; compounds store keys sorted for deterministic output.

pub mod compound;
pub mod error;
pub mod stack;
pub mod tag;
pub mod traits;

pub use compound::Compound;
pub use error::{TreeError, TreeResult};
pub use stack::ItemStack;
pub use tag::{Tag, TagKind};
pub use traits::{HostItem, TreeNode};
