// WVM - wvm-error
// Module: WVM Error Handling
//
// Copyright (c) 2025 The WVM Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error handling for the WVM WebAssembly virtual machine.
//!
//! Every failure in the VM core is carried as a value of the [`Error`]
//! type: a category, a numeric code, and a static message. The
//! categories follow the phases of the VM — decoding, validation,
//! linking, instantiation, and execution traps — plus the internal
//! runtime and resource categories. Each named failure has exactly one
//! code constant in [`codes`], so callers can match on codes instead of
//! strings.
//!
//! ```
//! use wvm_error::{codes, Error, ErrorCategory};
//!
//! let trap = Error::new(
//!     ErrorCategory::Trap,
//!     codes::INTEGER_DIVIDE_BY_ZERO,
//!     "integer divide by zero",
//! );
//! assert!(trap.is_trap());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

#[cfg(not(feature = "std"))]
extern crate alloc;

/// Error codes for every named failure in the VM.
pub mod codes;
/// Error and error-category types.
pub mod errors;
/// Factory functions for common errors.
pub mod kinds;
/// Unified imports for `std` and `no_std` builds.
pub mod prelude;

pub use errors::{Error, ErrorCategory};

/// A specialized `Result` type for WVM operations.
pub type Result<T> = core::result::Result<T, Error>;
