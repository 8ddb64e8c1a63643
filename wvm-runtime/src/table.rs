//! WebAssembly table instances.
//!
//! A table holds function addresses into the store; slots start empty
//! and are filled by element segments during instantiation.

use wvm_error::{kinds, Result};
use wvm_types::TableType;

use crate::prelude::Vec;

/// A `funcref` table instance.
#[derive(Debug)]
pub struct TableInstance {
    ty: TableType,
    elements: Vec<Option<u32>>,
}

impl TableInstance {
    /// Allocate a table with its minimum size, all slots empty.
    #[must_use]
    pub fn new(ty: TableType) -> Self {
        Self {
            ty,
            elements: crate::prelude::vec![None; ty.limits.min as usize],
        }
    }

    /// Declared table type.
    #[must_use]
    pub const fn ty(&self) -> TableType {
        self.ty
    }

    /// Current number of slots.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.elements.len() as u32
    }

    /// The function address in slot `index`; `None` for an empty slot,
    /// a trap for an out-of-range index.
    pub fn get(&self, index: u32) -> Result<Option<u32>> {
        self.elements
            .get(index as usize)
            .copied()
            .ok_or_else(kinds::out_of_bounds_table_access)
    }

    /// Put a function address into slot `index`.
    pub fn set(&mut self, index: u32, func_addr: u32) -> Result<()> {
        let Some(slot) = self.elements.get_mut(index as usize) else {
            return Err(kinds::out_of_bounds_table_access());
        };
        *slot = Some(func_addr);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wvm_error::codes;
    use wvm_types::{Limits, RefType};

    #[test]
    fn slots_start_empty() {
        let table = TableInstance::new(TableType {
            elem_type: RefType::FuncRef,
            limits: Limits::at_least(2),
        });
        assert_eq!(table.size(), 2);
        assert_eq!(table.get(0).unwrap(), None);
        assert_eq!(
            table.get(2).unwrap_err().code,
            codes::OUT_OF_BOUNDS_TABLE_ACCESS
        );
    }

    #[test]
    fn set_then_get() {
        let mut table = TableInstance::new(TableType {
            elem_type: RefType::FuncRef,
            limits: Limits::at_least(1),
        });
        table.set(0, 7).unwrap();
        assert_eq!(table.get(0).unwrap(), Some(7));
        assert!(table.set(1, 7).is_err());
    }
}
