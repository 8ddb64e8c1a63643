//! WebAssembly function instances.
//!
//! A function instance is either a Wasm function, owning its decoded
//! body, or a host callable. Bodies sit behind an `Arc` so the engine
//! can hold the instruction sequence while the store is mutated.

use core::fmt;

use wvm_error::Result;
use wvm_format::Instruction;
use wvm_types::{FuncType, Value, ValueType};

use crate::prelude::{Arc, Box, Vec};

/// The host side of a host function: a plain callable over values.
///
/// Host functions run to completion before control returns to the
/// engine; a host-raised error unwinds the invocation like any trap.
pub type HostFunc = Box<dyn Fn(&[Value]) -> Result<Vec<Value>> + Send + Sync>;

/// A function instance owned by the store.
pub enum FunctionInstance {
    /// A Wasm function, bound to its defining module instance.
    Wasm {
        /// Store address of the defining module instance
        module_addr: u32,
        /// Function type
        ty: FuncType,
        /// Declared locals (params excluded)
        locals: Vec<ValueType>,
        /// The `end`-terminated flat body
        body: Arc<[Instruction]>,
    },
    /// A host function.
    Host {
        /// Function type
        ty: FuncType,
        /// The callable
        callable: HostFunc,
    },
}

impl FunctionInstance {
    /// Create a host function instance.
    #[must_use]
    pub fn host(ty: FuncType, callable: HostFunc) -> Self {
        Self::Host { ty, callable }
    }

    /// The function type.
    #[must_use]
    pub fn ty(&self) -> &FuncType {
        match self {
            Self::Wasm { ty, .. } | Self::Host { ty, .. } => ty,
        }
    }
}

impl fmt::Debug for FunctionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wasm {
                module_addr,
                ty,
                locals,
                body,
            } => f
                .debug_struct("Wasm")
                .field("module_addr", module_addr)
                .field("ty", ty)
                .field("locals", locals)
                .field("body_len", &body.len())
                .finish(),
            Self::Host { ty, .. } => f
                .debug_struct("Host")
                .field("ty", ty)
                .field("callable", &"<fn>")
                .finish(),
        }
    }
}
