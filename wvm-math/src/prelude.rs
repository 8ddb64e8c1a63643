// WVM - wvm-math
// Module: WVM Math Prelude
//
// Copyright (c) 2025 The WVM Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Prelude module for wvm-math.

pub use core::{
    cmp::{Eq, Ord, PartialEq, PartialOrd},
    fmt,
    fmt::{Debug, Display},
};

pub use wvm_error::{codes, kinds, Error, ErrorCategory, Result};

pub use crate::float_bits::{FloatBits32, FloatBits64};
