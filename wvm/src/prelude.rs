//! Prelude module for wvm.

pub use core::{
    cmp::{Eq, Ord, PartialEq, PartialOrd},
    fmt,
    fmt::{Debug, Display},
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
pub use wvm_runtime::{EngineConfig, InstantiateMode, Interpreter, Store};
pub use wvm_types::{Value, ValueType};

pub use crate::Vm;
