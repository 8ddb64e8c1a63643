//! WVM: a standalone WebAssembly virtual machine.
//!
//! This crate ties the workspace together for embedders: decode and
//! validate with [`load`], wire modules into a [`Store`] with an
//! [`Interpreter`], and call exports with typed [`Value`] arguments.
//! [`Vm`] bundles a store and an interpreter for the common
//! single-store case.
//!
//! ```
//! use wvm::{InstantiateMode, Value, Vm};
//!
//! let bytes = wat::parse_str(
//!     r#"(module
//!         (func (export "add") (param i32 i32) (result i32)
//!             local.get 0
//!             local.get 1
//!             i32.add))"#,
//! )
//! .unwrap();
//!
//! let module = wvm::load(&bytes).unwrap();
//! let mut vm = Vm::default();
//! vm.instantiate(&module, "demo", InstantiateMode::Instantiate)
//!     .unwrap();
//! let results = vm
//!     .invoke("demo", "add", &[Value::I32(2), Value::I32(3)])
//!     .unwrap();
//! assert_eq!(results, [Value::I32(5)]);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

#[cfg(not(feature = "std"))]
extern crate alloc;

/// Unified imports for `std` and `no_std` builds.
pub mod prelude;

pub use wvm_decoder::{decode_module, load, validate_module, ValidationFailure};
pub use wvm_error::{codes, kinds, Error, ErrorCategory, Result};
pub use wvm_format::{encode_module, CtorContext, Instruction, Module, ModuleCtor};
pub use wvm_math::{FloatBits32, FloatBits64};
pub use wvm_runtime::{
    EngineConfig, ExportTarget, FunctionInstance, HostFunc, InstantiateMode, InterpretMode,
    Interpreter, MemoryInstance, ModuleInstance, Store, MAX_PAGES, PAGE_SIZE,
};
pub use wvm_types::{
    ExternKind, FuncType, GlobalType, Limits, MemoryType, Mutability, RefType, TableType, Value,
    ValueType,
};

use crate::prelude::Vec;

/// A store paired with an interpreter: the common embedding shape.
#[derive(Debug, Default)]
pub struct Vm {
    /// The entity store.
    pub store: Store,
    /// The engine.
    pub interpreter: Interpreter,
}

impl Vm {
    /// Create a VM with the given engine configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            store: Store::new(),
            interpreter: Interpreter::new(config),
        }
    }

    /// Register a pre-populated host module; it survives
    /// [`Vm::reset`].
    pub fn register_host_module(&mut self, instance: ModuleInstance) -> u32 {
        self.store.register_host_module(instance)
    }

    /// Instantiate a decoded, validated module under `name`.
    pub fn instantiate(
        &mut self,
        module: &Module,
        name: &str,
        mode: InstantiateMode,
    ) -> Result<u32> {
        self.interpreter
            .instantiate(&mut self.store, module, name, mode)
    }

    /// Invoke an exported function of a registered module.
    pub fn invoke(
        &mut self,
        module_name: &str,
        func_name: &str,
        args: &[Value],
    ) -> Result<Vec<Value>> {
        self.interpreter
            .invoke(&mut self.store, module_name, func_name, args)
    }

    /// Drop all user modules, keeping registered host modules.
    pub fn reset(&mut self) {
        self.store.reset();
    }
}
