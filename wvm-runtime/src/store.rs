//! The store: owner of every runtime entity.
//!
//! Entities are addressed by the index at which they were allocated,
//! and addresses stay valid for as long as the entity lives; nothing
//! is ever reused between resets. [`Store::reset`] truncates back to
//! the imported watermark, so registered host modules and everything
//! allocated before the last [`Store::import_module`] survive while
//! user-instantiated modules are dropped.
//!
//! A failed instantiation rolls back with a [`StoreMark`] taken at its
//! start, which removes the partial module instance and every entity
//! it allocated.

use wvm_error::{kinds, Result};
use wvm_types::{GlobalType, TableType, Value};

use crate::func::FunctionInstance;
use crate::global::GlobalInstance;
use crate::memory::MemoryInstance;
use crate::module_instance::ModuleInstance;
use crate::prelude::Vec;
use crate::table::TableInstance;

/// A point-in-time size of every entity table, used for rollback and
/// the imported watermark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMark {
    funcs: usize,
    tables: usize,
    mems: usize,
    globals: usize,
    modules: usize,
}

/// The per-embedder container of all runtime entities.
#[derive(Debug, Default)]
pub struct Store {
    funcs: Vec<FunctionInstance>,
    tables: Vec<TableInstance>,
    mems: Vec<MemoryInstance>,
    globals: Vec<GlobalInstance>,
    modules: Vec<ModuleInstance>,
    /// Everything below this mark survives `reset`.
    imported: StoreMark,
}

impl Store {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current sizes of every entity table.
    #[must_use]
    pub fn mark(&self) -> StoreMark {
        StoreMark {
            funcs: self.funcs.len(),
            tables: self.tables.len(),
            mems: self.mems.len(),
            globals: self.globals.len(),
            modules: self.modules.len(),
        }
    }

    /// Drop everything allocated after `mark`.
    pub fn rollback(&mut self, mark: StoreMark) {
        self.funcs.truncate(mark.funcs);
        self.tables.truncate(mark.tables);
        self.mems.truncate(mark.mems);
        self.globals.truncate(mark.globals);
        self.modules.truncate(mark.modules);
    }

    /// Drop every entity that does not belong to an imported module.
    pub fn reset(&mut self) {
        let imported = self.imported;
        self.rollback(imported);
        log::debug!(
            "store reset: {} modules remain",
            self.modules.len()
        );
    }

    /// Find a registered module by name.
    #[must_use]
    pub fn find_module(&self, name: &str) -> Option<u32> {
        self.modules
            .iter()
            .position(|m| m.name() == name)
            .map(|i| i as u32)
    }

    /// Add a user module instance; dropped again on [`reset`].
    ///
    /// [`reset`]: Self::reset
    pub fn push_module(&mut self, instance: ModuleInstance) -> u32 {
        let addr = self.modules.len() as u32;
        self.modules.push(instance);
        addr
    }

    /// Add a host (imported) module instance and persist everything
    /// allocated so far across resets.
    pub fn import_module(&mut self, instance: ModuleInstance) -> u32 {
        let addr = self.push_module(instance);
        self.commit_imports();
        addr
    }

    /// Register a pre-populated host module (embedding-API name for
    /// [`import_module`]).
    ///
    /// [`import_module`]: Self::import_module
    pub fn register_host_module(&mut self, instance: ModuleInstance) -> u32 {
        self.import_module(instance)
    }

    /// Move the imported watermark up to the current state.
    pub fn commit_imports(&mut self) {
        self.imported = self.mark();
    }

    /// The module instance at `addr`.
    #[must_use]
    pub fn get_module(&self, addr: u32) -> Option<&ModuleInstance> {
        self.modules.get(addr as usize)
    }

    /// The module instance at `addr`, mutably.
    pub fn get_module_mut(&mut self, addr: u32) -> Option<&mut ModuleInstance> {
        self.modules.get_mut(addr as usize)
    }

    /// Allocate a function instance.
    pub fn alloc_function(&mut self, instance: FunctionInstance) -> u32 {
        let addr = self.funcs.len() as u32;
        self.funcs.push(instance);
        addr
    }

    /// Allocate a table instance with its declared limits.
    pub fn alloc_table(&mut self, ty: TableType) -> u32 {
        let addr = self.tables.len() as u32;
        self.tables.push(crate::table::TableInstance::new(ty));
        addr
    }

    /// Allocate a memory instance (zero-filled pages).
    pub fn alloc_memory(&mut self, memory: MemoryInstance) -> u32 {
        let addr = self.mems.len() as u32;
        self.mems.push(memory);
        addr
    }

    /// Allocate a global instance holding `value`.
    pub fn alloc_global(&mut self, ty: GlobalType, value: Value) -> u32 {
        let addr = self.globals.len() as u32;
        self.globals.push(GlobalInstance::new(ty, value));
        addr
    }

    /// The function at `addr`.
    #[must_use]
    pub fn get_function(&self, addr: u32) -> Option<&FunctionInstance> {
        self.funcs.get(addr as usize)
    }

    /// The table at `addr`.
    #[must_use]
    pub fn get_table(&self, addr: u32) -> Option<&crate::table::TableInstance> {
        self.tables.get(addr as usize)
    }

    /// The table at `addr`, mutably.
    pub fn get_table_mut(&mut self, addr: u32) -> Option<&mut crate::table::TableInstance> {
        self.tables.get_mut(addr as usize)
    }

    /// The memory at `addr`.
    #[must_use]
    pub fn get_memory(&self, addr: u32) -> Option<&MemoryInstance> {
        self.mems.get(addr as usize)
    }

    /// The memory at `addr`, mutably.
    pub fn get_memory_mut(&mut self, addr: u32) -> Option<&mut MemoryInstance> {
        self.mems.get_mut(addr as usize)
    }

    /// The global at `addr`.
    #[must_use]
    pub fn get_global(&self, addr: u32) -> Option<&GlobalInstance> {
        self.globals.get(addr as usize)
    }

    /// The global at `addr`, mutably.
    pub fn get_global_mut(&mut self, addr: u32) -> Option<&mut GlobalInstance> {
        self.globals.get_mut(addr as usize)
    }

    /// The function at `addr`, or an invalid-address error.
    pub fn function(&self, addr: u32) -> Result<&FunctionInstance> {
        self.get_function(addr)
            .ok_or_else(|| kinds::invalid_address("function"))
    }

    /// The module at `addr`, or an invalid-address error.
    pub fn module(&self, addr: u32) -> Result<&ModuleInstance> {
        self.get_module(addr)
            .ok_or_else(|| kinds::invalid_address("module"))
    }

    /// The module at `addr` mutably, or an invalid-address error.
    pub fn module_mut(&mut self, addr: u32) -> Result<&mut ModuleInstance> {
        self.get_module_mut(addr)
            .ok_or_else(|| kinds::invalid_address("module"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wvm_types::{Limits, Mutability, RefType, ValueType};

    #[test]
    fn reset_keeps_imported_modules() {
        let mut store = Store::new();
        let host_global = store.alloc_global(
            GlobalType {
                value_type: ValueType::I32,
                mutability: Mutability::Const,
            },
            Value::I32(7),
        );
        store.import_module(ModuleInstance::new("env"));

        store.alloc_table(TableType {
            elem_type: RefType::FuncRef,
            limits: Limits::at_least(1),
        });
        store.push_module(ModuleInstance::new("user"));

        assert!(store.find_module("user").is_some());
        store.reset();
        assert!(store.find_module("user").is_none());
        assert!(store.find_module("env").is_some());
        assert_eq!(store.get_global(host_global).unwrap().get(), Value::I32(7));
        assert!(store.get_table(0).is_none());
    }

    #[test]
    fn rollback_removes_partial_state() {
        let mut store = Store::new();
        let mark = store.mark();
        store.push_module(ModuleInstance::new("half"));
        store.alloc_global(
            GlobalType {
                value_type: ValueType::I32,
                mutability: Mutability::Const,
            },
            Value::I32(0),
        );
        store.rollback(mark);
        assert!(store.find_module("half").is_none());
        assert!(store.get_global(0).is_none());
    }
}
