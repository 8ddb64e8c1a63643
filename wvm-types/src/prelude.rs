//! Prelude module for wvm-types.
//!
//! Unifies the `std` and `no_std` import surface the way every WVM
//! crate does: one `use crate::prelude::*` (or targeted imports) per
//! module, never direct `std`/`alloc` paths.

pub use core::{
    cmp::{Eq, Ord, PartialEq, PartialOrd},
    convert::{TryFrom, TryInto},
    fmt,
    fmt::{Debug, Display},
    mem, slice, str,
};

#[cfg(feature = "std")]
pub use std::{
    boxed::Box,
    format,
    string::{String, ToString},
    sync::Arc,
    vec,
    vec::Vec,
};

#[cfg(not(feature = "std"))]
pub use alloc::{
    boxed::Box,
    format,
    string::{String, ToString},
    sync::Arc,
    vec,
    vec::Vec,
};

pub use wvm_error::{codes, kinds, Error, ErrorCategory, Result};
pub use wvm_math::{FloatBits32, FloatBits64};

pub use crate::types::{
    BlockType, ExternKind, FuncType, GlobalType, Limits, MemoryType, Mutability, RefType,
    TableType,
};
pub use crate::values::Value;
