//! The runtime image of a module after linking and initialization.
//!
//! A module instance owns no entities; it maps each of its index
//! spaces onto store addresses, with imported entities occupying the
//! low indices. The export map resolves names for the invoke path and
//! for import resolution of later modules.

use wvm_error::{codes, kinds, Error, Result};
use wvm_types::{ExternKind, FuncType};

use crate::prelude::{HashMap, String, ToString, Vec};

/// An export target: kind plus index into the per-kind table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportTarget {
    /// Kind of the exported entity
    pub kind: ExternKind,
    /// Index into that kind's index space
    pub index: u32,
}

/// A linked module instance.
#[derive(Debug, Default)]
pub struct ModuleInstance {
    /// Registered name
    name: String,
    /// Copied function types, in type-section order
    func_types: Vec<FuncType>,
    /// Function index space → store addresses
    func_addrs: Vec<u32>,
    /// Table index space → store addresses
    table_addrs: Vec<u32>,
    /// Memory index space → store addresses
    mem_addrs: Vec<u32>,
    /// Global index space → store addresses
    global_addrs: Vec<u32>,
    /// Export name → target
    exports: HashMap<String, ExportTarget>,
    /// Start function index, recorded when instantiation runs it
    start: Option<u32>,
}

impl ModuleInstance {
    /// Create an empty instance with the given name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a function type (instantiation step: Types).
    pub fn add_func_type(&mut self, ty: FuncType) {
        self.func_types.push(ty);
    }

    /// The function type at `index`.
    pub fn func_type(&self, index: u32) -> Result<&FuncType> {
        self.func_types
            .get(index as usize)
            .ok_or_else(|| kinds::invalid_address("func type"))
    }

    /// Append a function address.
    pub fn add_func(&mut self, addr: u32) {
        self.func_addrs.push(addr);
    }

    /// Append a table address.
    pub fn add_table(&mut self, addr: u32) {
        self.table_addrs.push(addr);
    }

    /// Append a memory address.
    pub fn add_memory(&mut self, addr: u32) {
        self.mem_addrs.push(addr);
    }

    /// Append a global address.
    pub fn add_global(&mut self, addr: u32) {
        self.global_addrs.push(addr);
    }

    /// Store address of function index `index`.
    pub fn func_addr(&self, index: u32) -> Result<u32> {
        self.func_addrs
            .get(index as usize)
            .copied()
            .ok_or_else(|| kinds::invalid_address("function"))
    }

    /// Store address of table index `index`.
    pub fn table_addr(&self, index: u32) -> Result<u32> {
        self.table_addrs
            .get(index as usize)
            .copied()
            .ok_or_else(|| kinds::invalid_address("table"))
    }

    /// Store address of memory index `index`.
    pub fn memory_addr(&self, index: u32) -> Result<u32> {
        self.mem_addrs
            .get(index as usize)
            .copied()
            .ok_or_else(|| kinds::invalid_address("memory"))
    }

    /// Store address of global index `index`.
    pub fn global_addr(&self, index: u32) -> Result<u32> {
        self.global_addrs
            .get(index as usize)
            .copied()
            .ok_or_else(|| kinds::invalid_address("global"))
    }

    /// Number of globals currently linked (imports during
    /// instantiation, then all).
    #[must_use]
    pub fn global_count(&self) -> u32 {
        self.global_addrs.len() as u32
    }

    /// Record an export. Fails on duplicate names.
    pub fn add_export(&mut self, name: &str, target: ExportTarget) -> Result<()> {
        if self
            .exports
            .insert(name.to_string(), target)
            .is_some()
        {
            return Err(Error::validation_error(
                codes::DUPLICATE_EXPORT,
                "duplicate export name",
            ));
        }
        Ok(())
    }

    /// Look up an export by name.
    #[must_use]
    pub fn find_export(&self, name: &str) -> Option<ExportTarget> {
        self.exports.get(name).copied()
    }

    /// Resolve an exported entity to its store address.
    pub fn export_addr(&self, name: &str) -> Result<(ExternKind, u32)> {
        let target = self.find_export(name).ok_or(Error::resource_error(
            codes::EXPORT_NOT_FOUND,
            "export not found",
        ))?;
        let addr = match target.kind {
            ExternKind::Func => self.func_addr(target.index)?,
            ExternKind::Table => self.table_addr(target.index)?,
            ExternKind::Memory => self.memory_addr(target.index)?,
            ExternKind::Global => self.global_addr(target.index)?,
        };
        Ok((target.kind, addr))
    }

    /// Record the start function index.
    pub fn set_start(&mut self, index: u32) {
        self.start = Some(index);
    }

    /// The recorded start function index, if any.
    #[must_use]
    pub const fn start(&self) -> Option<u32> {
        self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_resolve_to_addresses() {
        let mut inst = ModuleInstance::new("m");
        inst.add_func(41);
        inst.add_func(42);
        inst.add_export(
            "f",
            ExportTarget {
                kind: ExternKind::Func,
                index: 1,
            },
        )
        .unwrap();
        assert_eq!(inst.export_addr("f").unwrap(), (ExternKind::Func, 42));
        assert!(inst.export_addr("g").is_err());
    }

    #[test]
    fn duplicate_exports_fail() {
        let mut inst = ModuleInstance::new("m");
        inst.add_func(0);
        let target = ExportTarget {
            kind: ExternKind::Func,
            index: 0,
        };
        inst.add_export("f", target).unwrap();
        assert_eq!(
            inst.add_export("f", target).unwrap_err().code,
            codes::DUPLICATE_EXPORT
        );
    }
}
