// WVM - wvm-math
// Module: WVM Math
//
// Copyright (c) 2025 The WVM Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Numeric semantics for the WVM interpreter.
//!
//! This crate implements the value-level behavior of the WebAssembly
//! numeric instructions: wrapping integer arithmetic, the trapping
//! division and truncation operations, and IEEE 754 float operations
//! with canonical NaN propagation. Floats are carried as
//! [`FloatBits32`]/[`FloatBits64`] bit patterns so that NaN payloads
//! and signed zeroes survive every round trip through the VM.
//!
//! Operations that can trap return `Result`; pure operations return
//! plain values.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
// This crate exists to implement the Wasm numeric conversions, which
// are all lossy casts by definition.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless
)]

#[cfg(feature = "std")]
extern crate std;

#[cfg(not(feature = "std"))]
extern crate alloc;

/// Bit-pattern float wrappers.
pub mod float_bits;
/// Instruction-level numeric operations.
pub mod ops;
/// Unified imports for `std` and `no_std` builds.
pub mod prelude;

pub use float_bits::{FloatBits32, FloatBits64};
pub use ops::*;
