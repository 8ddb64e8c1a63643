//! Core WebAssembly types shared by every WVM crate.
//!
//! The type grammar here is the MVP one: four numeric value types,
//! `funcref` tables, page-limited memories, and mutable or immutable
//! globals. [`Value`] is the runtime representation used on the operand
//! stack, in globals, and across the embedding API; floats inside it
//! are bit patterns so NaN payloads survive.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

#[cfg(feature = "std")]
extern crate std;

#[cfg(not(feature = "std"))]
extern crate alloc;

/// Unified imports for `std` and `no_std` builds.
pub mod prelude;
/// The type grammar: value, function, table, memory, and global types.
pub mod types;
/// The runtime value representation.
pub mod values;

pub use types::{
    BlockType, ExternKind, FuncType, GlobalType, Limits, MemoryType, Mutability, RefType,
    TableType, ValueType,
};
pub use values::Value;
