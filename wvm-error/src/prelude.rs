// WVM - wvm-error
// Module: WVM Error Prelude
//
// Copyright (c) 2025 The WVM Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Prelude module for wvm-error.
//!
//! Re-exports the items the other WVM crates import together, for both
//! `std` and `no_std` builds.

pub use core::{
    cmp::{Eq, Ord, PartialEq, PartialOrd},
    fmt,
    fmt::{Debug, Display},
    str,
};

pub use crate::{codes, kinds, Error, ErrorCategory, Result};
