//! Prelude module for wvm-runtime.

pub use core::{
    cmp::{Eq, Ord, PartialEq, PartialOrd},
    convert::{TryFrom, TryInto},
    fmt,
    fmt::{Debug, Display},
    mem,
};

#[cfg(feature = "std")]
pub use std::{
    boxed::Box,
    collections::{HashMap, HashSet},
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

// Hash maps for no_std come from hashbrown.
#[cfg(not(feature = "std"))]
pub use hashbrown::{HashMap, HashSet};

pub use wvm_error::{codes, kinds, Error, ErrorCategory, Result};
pub use wvm_format::{Instruction, MemArg, Module};
pub use wvm_math::{FloatBits32, FloatBits64};
pub use wvm_types::{
    BlockType, ExternKind, FuncType, GlobalType, Limits, MemoryType, Mutability, RefType,
    TableType, Value, ValueType,
};
