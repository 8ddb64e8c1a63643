//! WebAssembly binary decoding and validation for WVM.
//!
//! [`decode_module`] turns bytes into the [`wvm_format::Module`] AST,
//! enforcing the structural rules of the binary format: magic and
//! version, canonical section order, declared lengths, and well-formed
//! LEB128 and UTF-8. [`validate_module`] then type-checks the decoded
//! module, so a module that survives both calls is safe to hand to the
//! instantiator.
//!
//! The usual entry point is [`load`], which does both.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

#[cfg(feature = "std")]
extern crate std;

#[cfg(not(feature = "std"))]
extern crate alloc;

/// Function body and expression decoding.
pub mod instructions;
/// Section-level module decoding.
pub mod module;
/// Unified imports for `std` and `no_std` builds.
pub mod prelude;
/// The positional byte reader.
pub mod reader;
/// The module validator.
pub mod validation;

pub use module::decode_module;
pub use reader::BinaryReader;
pub use validation::{validate_module, ValidationFailure};

use wvm_error::Result;
use wvm_format::Module;

/// Decode and validate a module in one step.
pub fn load(bytes: &[u8]) -> Result<Module> {
    let module = decode_module(bytes)?;
    validate_module(&module)?;
    Ok(module)
}
