//! The decoded module AST.
//!
//! One vector per section, in canonical section order. The AST lives
//! from decode until instantiation completes; the runtime copies what
//! it needs into store-owned instances and drops the rest.

use wvm_error::Result;
use wvm_types::{ExternKind, FuncType, GlobalType, MemoryType, TableType, Value};

use crate::instructions::Instruction;
use crate::prelude::{String, Vec};

/// An opaque per-export code pointer recorded by an ahead-of-time
/// compilation pass. The pure interpreter carries it but never calls
/// through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSymbol(pub usize);

/// Host-side services a pre-compiled module constructor may call while
/// it wires itself up: raising a trap, calling a function by store
/// address, and growing or sizing a memory by store address.
///
/// The interpreter satisfies this trait with direct store operations;
/// an ahead-of-time backend would hand it to generated code.
pub trait CtorContext {
    /// Raise a trap with the given error.
    fn trap(&mut self, error: wvm_error::Error);
    /// Call the function at `func_addr` with `args`.
    fn call(&mut self, func_addr: u32, args: &[Value]) -> Result<Vec<Value>>;
    /// Grow the memory at `mem_addr` by `pages`; returns the old page
    /// count, or -1 on failure.
    fn memory_grow(&mut self, mem_addr: u32, pages: u32) -> i32;
    /// Current page count of the memory at `mem_addr`.
    fn memory_size(&mut self, mem_addr: u32) -> u32;
}

/// Constructor entry point of a pre-compiled module.
pub type ModuleCtor = fn(&mut dyn CtorContext) -> Result<()>;

/// A single import: module name, field name, and the imported
/// entity's descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    /// Name of the exporting module
    pub module: String,
    /// Name of the export within that module
    pub field: String,
    /// What is being imported
    pub desc: ImportDesc,
}

/// The content of an import descriptor, tagged by external kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImportDesc {
    /// A function with the given type index
    Func(u32),
    /// A table of the given type
    Table(TableType),
    /// A memory of the given type
    Memory(MemoryType),
    /// A global of the given type
    Global(GlobalType),
}

impl ImportDesc {
    /// The external kind of this descriptor.
    #[must_use]
    pub const fn kind(&self) -> ExternKind {
        match self {
            Self::Func(_) => ExternKind::Func,
            Self::Table(_) => ExternKind::Table,
            Self::Memory(_) => ExternKind::Memory,
            Self::Global(_) => ExternKind::Global,
        }
    }
}

/// A single export: field name, kind, and index into the module's
/// per-kind index space.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    /// Exported field name
    pub name: String,
    /// Kind of the exported entity
    pub kind: ExternKind,
    /// Index into the per-kind index space
    pub index: u32,
    /// Code pointer recorded by an ahead-of-time pass, if any
    pub symbol: Option<ExportSymbol>,
}

/// A global definition: its type and constant initializer expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    /// Type and mutability
    pub ty: GlobalType,
    /// Constant initializer expression, `end`-terminated
    pub init: Vec<Instruction>,
}

/// Where a segment applies its contents.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentMode {
    /// Applied during instantiation at a computed offset
    Active {
        /// Table or memory index
        index: u32,
        /// Constant offset expression, `end`-terminated
        offset: Vec<Instruction>,
    },
    /// Available to bulk instructions only; not applied at
    /// instantiation
    Passive,
    /// Declared for reference validity only (elements)
    Declared,
}

/// An element segment: function indices destined for a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSegment {
    /// Active, passive, or declared
    pub mode: SegmentMode,
    /// Function indices
    pub items: Vec<u32>,
}

/// A data segment: bytes destined for a memory.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSegment {
    /// Active or passive
    pub mode: SegmentMode,
    /// Raw bytes
    pub bytes: Vec<u8>,
}

/// One function body from the code section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodeBody {
    /// Declared locals, expanded (one entry per local)
    pub locals: Vec<wvm_types::ValueType>,
    /// Flat instruction sequence, `end`-terminated
    pub instructions: Vec<Instruction>,
}

/// A custom section, preserved verbatim but semantically ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomSection {
    /// Section name
    pub name: String,
    /// Payload after the name
    pub data: Vec<u8>,
    /// Id of the last non-custom section decoded before this one;
    /// lets the encoder reproduce the original layout
    pub placement: u8,
}

/// A decoded WebAssembly module.
///
/// Section contents appear in their canonical order; `functions[i]`
/// pairs with `code[i]`.
#[derive(Debug, Clone, Default)]
pub struct Module {
    /// Function types from the type section
    pub types: Vec<FuncType>,
    /// Imports in declaration order
    pub imports: Vec<Import>,
    /// Type index of every locally-defined function
    pub functions: Vec<u32>,
    /// Locally-defined tables
    pub tables: Vec<TableType>,
    /// Locally-defined memories
    pub memories: Vec<MemoryType>,
    /// Locally-defined globals with initializers
    pub globals: Vec<Global>,
    /// Exports in declaration order
    pub exports: Vec<Export>,
    /// Start function index, if any
    pub start: Option<u32>,
    /// Element segments
    pub elements: Vec<ElementSegment>,
    /// Function bodies, paired with `functions`
    pub code: Vec<CodeBody>,
    /// Data segments
    pub data: Vec<DataSegment>,
    /// Declared data segment count, if a DataCount section was present
    pub data_count: Option<u32>,
    /// Custom sections, preserved in place
    pub custom_sections: Vec<CustomSection>,
    /// Constructor of a pre-compiled module, if one was attached
    pub ctor: Option<ModuleCtor>,
}

impl Module {
    /// Create an empty module.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of imports of the given kind, i.e. the index-space
    /// offset at which locally-defined entities start.
    #[must_use]
    pub fn import_count(&self, kind: ExternKind) -> u32 {
        self.imports.iter().filter(|i| i.desc.kind() == kind).count() as u32
    }

    /// The function type of function index `idx`, looking through the
    /// import boundary.
    #[must_use]
    pub fn func_type_index(&self, idx: u32) -> Option<u32> {
        let mut remaining = idx;
        for import in &self.imports {
            if let ImportDesc::Func(type_idx) = import.desc {
                if remaining == 0 {
                    return Some(type_idx);
                }
                remaining -= 1;
            }
        }
        self.functions.get(remaining as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::vec;
    use wvm_types::ValueType;

    fn module_with_imported_func() -> Module {
        let mut module = Module::new();
        module.types.push(FuncType::new(vec![], vec![]));
        module
            .types
            .push(FuncType::new(vec![ValueType::I32], vec![ValueType::I32]));
        module.imports.push(Import {
            module: String::from("env"),
            field: String::from("f"),
            desc: ImportDesc::Func(1),
        });
        module.functions.push(0);
        module
    }

    #[test]
    fn func_index_space_spans_imports() {
        let module = module_with_imported_func();
        assert_eq!(module.import_count(ExternKind::Func), 1);
        assert_eq!(module.func_type_index(0), Some(1));
        assert_eq!(module.func_type_index(1), Some(0));
        assert_eq!(module.func_type_index(2), None);
    }
}
