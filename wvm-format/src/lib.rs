//! WebAssembly binary format handling for WVM.
//!
//! This crate owns everything both the decoder and the runtime need to
//! agree on: the binary constants (magic, section ids, opcodes), the
//! LEB128 and float read/write primitives, the decoded [`Module`] AST,
//! the flat [`Instruction`] representation function bodies decode into,
//! and the golden encoder that re-emits a module as canonical bytes.
//!
//! Reading primitives take `(bytes, pos)` and return the value together
//! with the number of bytes consumed, so callers can walk a buffer
//! without slicing it apart.

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

/// Binary constants and low-level read/write primitives.
pub mod binary;
/// The golden encoder: Module AST back to canonical bytes.
pub mod encoder;
/// The flat instruction representation.
pub mod instructions;
/// The decoded module AST.
pub mod module;
/// Unified imports for `std` and `no_std` builds.
pub mod prelude;

pub use encoder::encode_module;
pub use instructions::{Instruction, MemArg};
pub use module::{
    CodeBody, CtorContext, CustomSection, DataSegment, ElementSegment, Export, ExportSymbol,
    Global, Import, ImportDesc, Module, ModuleCtor, SegmentMode,
};
