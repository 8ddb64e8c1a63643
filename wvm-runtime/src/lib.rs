//! The WVM runtime: store, instances, instantiation, and the
//! interpreter engine.
//!
//! The [`Store`] owns every runtime entity and hands out small-integer
//! addresses; module instances map their index spaces onto those
//! addresses. The [`Interpreter`] owns the stack manager and the
//! instruction provider and threads the store through instantiation
//! and invocation. The whole runtime is single-threaded and
//! synchronous: one instantiation or invocation is active per store
//! at any time, and host functions run to completion.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

#[cfg(feature = "std")]
extern crate std;

#[cfg(not(feature = "std"))]
extern crate alloc;

/// Engine configuration.
pub mod config;
/// The interpreter engine.
pub mod engine;
/// Function instances.
pub mod func;
/// Global instances.
pub mod global;
/// The instantiation protocol.
pub mod instantiate;
/// Linear memory instances.
pub mod memory;
/// Module instances.
pub mod module_instance;
/// Unified imports for `std` and `no_std` builds.
pub mod prelude;
/// The instruction provider.
pub mod provider;
/// The stack manager.
pub mod stack;
/// The store.
pub mod store;
/// Table instances.
pub mod table;

pub use config::{EngineConfig, InterpretMode};
pub use engine::{Interpreter, MAX_CALL_DEPTH};
pub use func::{FunctionInstance, HostFunc};
pub use global::GlobalInstance;
pub use instantiate::InstantiateMode;
pub use memory::{MemoryInstance, MAX_PAGES, PAGE_SIZE};
pub use module_instance::{ExportTarget, ModuleInstance};
pub use provider::InstructionProvider;
pub use stack::{Frame, Label, LabelKind, StackManager};
pub use store::{Store, StoreMark};
pub use table::TableInstance;
