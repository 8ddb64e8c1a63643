//! The instantiation protocol.
//!
//! Instantiation runs in a fixed order: name check, instance
//! allocation, types, imports, functions, globals, tables, memories,
//! the element/data offset pre-pass, bounds checks and writes,
//! exports, the optional pre-compiled constructor, and finally the
//! start function. Every element and data offset is evaluated (in a
//! frame bound to the new instance) before any table or memory is
//! written, and all segment bounds are checked before the first
//! write.
//!
//! Any failure rolls the store back to its state at entry, so a
//! partially-built instance is never reachable under its name.

use wvm_error::{codes, kinds, Error, Result};
use wvm_format::module::{CtorContext, ImportDesc, Module, SegmentMode};
use wvm_types::{ExternKind, Value};

use crate::engine::Interpreter;
use crate::func::FunctionInstance;
use crate::memory::MemoryInstance;
use crate::module_instance::{ExportTarget, ModuleInstance};
use crate::prelude::{Arc, Vec};
use crate::store::Store;

/// Whether an instantiated module survives [`Store::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstantiateMode {
    /// A user module, dropped on reset.
    Instantiate,
    /// A registered module that persists across resets.
    Import,
}

impl Interpreter {
    /// Instantiate a decoded, validated module under `name`.
    ///
    /// On success the module is registered in the store and its
    /// address returned; on failure the store is exactly as it was.
    pub fn instantiate(
        &mut self,
        store: &mut Store,
        module: &Module,
        name: &str,
        mode: InstantiateMode,
    ) -> Result<u32> {
        self.stack.reset();
        self.provider.reset();

        if store.find_module(name).is_some() {
            return Err(kinds::module_name_conflict());
        }

        let mark = store.mark();
        match self.instantiate_inner(store, module, name) {
            Ok(addr) => {
                if mode == InstantiateMode::Import {
                    store.commit_imports();
                }
                log::debug!("instantiated module {name:?} at address {addr}");
                Ok(addr)
            }
            Err(error) => {
                store.rollback(mark);
                self.stack.reset();
                self.provider.reset();
                log::debug!("instantiation of {name:?} failed: {error}");
                Err(error)
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn instantiate_inner(
        &mut self,
        store: &mut Store,
        module: &Module,
        name: &str,
    ) -> Result<u32> {
        let addr = store.push_module(ModuleInstance::new(name));

        // Types: copy every function type, preserving order.
        for ty in &module.types {
            store.module_mut(addr)?.add_func_type(ty.clone());
        }

        // Imports: resolve and type-check, imported entities taking
        // the low indices.
        for import in &module.imports {
            self.link_import(store, addr, module, import)?;
        }

        // Functions and code, pairwise.
        for (type_index, body) in module.functions.iter().zip(&module.code) {
            let ty = module
                .types
                .get(*type_index as usize)
                .cloned()
                .ok_or_else(|| kinds::invalid_address("function type"))?;
            let func_addr = store.alloc_function(FunctionInstance::Wasm {
                module_addr: addr,
                ty,
                locals: body.locals.clone(),
                body: Arc::from(body.instructions.as_slice()),
            });
            store.module_mut(addr)?.add_func(func_addr);
        }

        // Globals: evaluate initializers in a minimal frame.
        if !module.globals.is_empty() {
            self.stack.push_frame(addr, 0, self.stack.value_height());
            for global in &module.globals {
                let value = self.eval_const_expr(store, &global.init)?;
                if value.type_of() != global.ty.value_type {
                    return Err(Error::runtime_error(
                        codes::VALUE_TYPE_MISMATCH,
                        "initializer value has the wrong type",
                    ));
                }
                let global_addr = store.alloc_global(global.ty, value);
                store.module_mut(addr)?.add_global(global_addr);
            }
            self.stack.pop_frame()?;
        }

        // Tables: declared limits, empty slots.
        for table in &module.tables {
            let table_addr = store.alloc_table(*table);
            store.module_mut(addr)?.add_table(table_addr);
        }

        // Memories: zero-filled pages under the configured cap.
        for memory in &module.memories {
            let instance = MemoryInstance::new(*memory, self.config().memory_max_pages)?;
            let mem_addr = store.alloc_memory(instance);
            store.module_mut(addr)?.add_memory(mem_addr);
        }

        // Offset pre-pass: every element and data offset is evaluated
        // before any table or memory write.
        self.stack.push_frame(addr, 0, self.stack.value_height());
        let mut elem_offsets: Vec<Option<u32>> = Vec::new();
        for element in &module.elements {
            elem_offsets.push(match &element.mode {
                SegmentMode::Active { offset, .. } => {
                    Some(self.eval_const_offset(store, offset)?)
                }
                SegmentMode::Passive | SegmentMode::Declared => None,
            });
        }
        let mut data_offsets: Vec<Option<u32>> = Vec::new();
        for data in &module.data {
            data_offsets.push(match &data.mode {
                SegmentMode::Active { offset, .. } => {
                    Some(self.eval_const_offset(store, offset)?)
                }
                SegmentMode::Passive | SegmentMode::Declared => None,
            });
        }
        self.stack.pop_frame()?;

        // Bounds check every segment, then write in segment order.
        for (element, offset) in module.elements.iter().zip(&elem_offsets) {
            let (SegmentMode::Active { index, .. }, Some(offset)) = (&element.mode, offset)
            else {
                continue;
            };
            let table_addr = store.module(addr)?.table_addr(*index)?;
            let table = store
                .get_table(table_addr)
                .ok_or_else(|| kinds::invalid_address("table"))?;
            if u64::from(*offset) + element.items.len() as u64 > u64::from(table.size()) {
                return Err(kinds::elem_segment_out_of_bounds());
            }
        }
        for (data, offset) in module.data.iter().zip(&data_offsets) {
            let (SegmentMode::Active { index, .. }, Some(offset)) = (&data.mode, offset)
            else {
                continue;
            };
            let mem_addr = store.module(addr)?.memory_addr(*index)?;
            let memory = store
                .get_memory(mem_addr)
                .ok_or_else(|| kinds::invalid_address("memory"))?;
            if u64::from(*offset) + data.bytes.len() as u64 > memory.size_in_bytes() {
                return Err(kinds::data_segment_out_of_bounds());
            }
        }

        for (element, offset) in module.elements.iter().zip(&elem_offsets) {
            let (SegmentMode::Active { index, .. }, Some(offset)) = (&element.mode, offset)
            else {
                continue;
            };
            let table_addr = store.module(addr)?.table_addr(*index)?;
            for (slot, &func_index) in element.items.iter().enumerate() {
                let func_addr = store.module(addr)?.func_addr(func_index)?;
                store
                    .get_table_mut(table_addr)
                    .ok_or_else(|| kinds::invalid_address("table"))?
                    .set(offset + slot as u32, func_addr)?;
            }
        }
        for (data, offset) in module.data.iter().zip(&data_offsets) {
            let (SegmentMode::Active { index, .. }, Some(offset)) = (&data.mode, offset)
            else {
                continue;
            };
            let mem_addr = store.module(addr)?.memory_addr(*index)?;
            store
                .get_memory_mut(mem_addr)
                .ok_or_else(|| kinds::invalid_address("memory"))?
                .write(u64::from(*offset), &data.bytes)?;
        }

        // Exports.
        for export in &module.exports {
            store.module_mut(addr)?.add_export(
                &export.name,
                ExportTarget {
                    kind: export.kind,
                    index: export.index,
                },
            )?;
        }

        // Pre-compiled constructor, when the mode honors it.
        if self.config().interpret_mode == crate::config::InterpretMode::CompiledIfPresent {
            if let Some(ctor) = module.ctor {
                let mut ctx = InterpreterCtorContext {
                    interpreter: self,
                    store,
                    trapped: None,
                };
                ctor(&mut ctx)?;
                if let Some(trap) = ctx.trapped {
                    return Err(trap);
                }
            }
        }

        // Start function: a trap here is the instantiation result.
        if let Some(start_index) = module.start {
            store.module_mut(addr)?.set_start(start_index);
            let func_addr = store.module(addr)?.func_addr(start_index)?;
            self.run_function(store, func_addr, &[])?;
        }

        Ok(addr)
    }

    /// Resolve one import and append its address to the instance.
    fn link_import(
        &mut self,
        store: &mut Store,
        addr: u32,
        module: &Module,
        import: &wvm_format::Import,
    ) -> Result<()> {
        let exporter_addr = store
            .find_module(&import.module)
            .ok_or_else(kinds::unknown_import)?;
        let exporter = store.module(exporter_addr)?;
        let target = exporter
            .find_export(&import.field)
            .ok_or_else(kinds::unknown_import)?;
        if target.kind != import.desc.kind() {
            return Err(kinds::incompatible_import_type());
        }

        match (&import.desc, target.kind) {
            (ImportDesc::Func(type_index), ExternKind::Func) => {
                let entity_addr = exporter.func_addr(target.index)?;
                let expected = module
                    .types
                    .get(*type_index as usize)
                    .ok_or_else(kinds::incompatible_import_type)?;
                if store.function(entity_addr)?.ty() != expected {
                    return Err(kinds::incompatible_import_type());
                }
                store.module_mut(addr)?.add_func(entity_addr);
            }
            (ImportDesc::Table(want), ExternKind::Table) => {
                let entity_addr = exporter.table_addr(target.index)?;
                let have = store
                    .get_table(entity_addr)
                    .ok_or_else(|| kinds::invalid_address("table"))?
                    .ty();
                if have.elem_type != want.elem_type
                    || !have.limits.is_subtype_of(&want.limits)
                {
                    return Err(kinds::incompatible_import_type());
                }
                store.module_mut(addr)?.add_table(entity_addr);
            }
            (ImportDesc::Memory(want), ExternKind::Memory) => {
                let entity_addr = exporter.memory_addr(target.index)?;
                let have = store
                    .get_memory(entity_addr)
                    .ok_or_else(|| kinds::invalid_address("memory"))?
                    .ty();
                if !have.limits.is_subtype_of(&want.limits) {
                    return Err(kinds::incompatible_import_type());
                }
                store.module_mut(addr)?.add_memory(entity_addr);
            }
            (ImportDesc::Global(want), ExternKind::Global) => {
                let entity_addr = exporter.global_addr(target.index)?;
                let have = store
                    .get_global(entity_addr)
                    .ok_or_else(|| kinds::invalid_address("global"))?
                    .ty();
                if have != *want {
                    return Err(kinds::incompatible_import_type());
                }
                store.module_mut(addr)?.add_global(entity_addr);
            }
            _ => return Err(kinds::incompatible_import_type()),
        }
        Ok(())
    }

    /// Evaluate a constant expression against the current frame's
    /// module instance.
    fn eval_const_expr(&mut self, store: &Store, expr: &[wvm_format::Instruction]) -> Result<Value> {
        use wvm_format::Instruction as I;
        let not_constant = Error::validation_error(
            codes::INVALID_CONSTANT_EXPRESSION,
            "constant expression required",
        );
        for instruction in expr {
            match instruction {
                I::I32Const(v) => self.stack.push_value(Value::I32(*v)),
                I::I64Const(v) => self.stack.push_value(Value::I64(*v)),
                I::F32Const(v) => self.stack.push_value(Value::F32(*v)),
                I::F64Const(v) => self.stack.push_value(Value::F64(*v)),
                I::GlobalGet(index) => {
                    let frame = self.stack.current_frame()?;
                    let instance = store.module(frame.module_addr)?;
                    if *index >= instance.global_count() {
                        return Err(Error::instantiation_error(
                            codes::GLOBAL_INIT_REFS_NON_IMPORT,
                            "initializer reads a non-imported global",
                        ));
                    }
                    let global_addr = instance.global_addr(*index)?;
                    let value = store
                        .get_global(global_addr)
                        .ok_or_else(|| kinds::invalid_address("global"))?
                        .get();
                    self.stack.push_value(value);
                }
                I::End => break,
                _ => return Err(not_constant),
            }
        }
        self.stack.pop_value()
    }

    /// Evaluate a segment-offset expression down to a u32.
    fn eval_const_offset(
        &mut self,
        store: &Store,
        expr: &[wvm_format::Instruction],
    ) -> Result<u32> {
        self.eval_const_expr(store, expr)?
            .as_u32()
            .ok_or_else(|| {
                Error::runtime_error(
                    codes::VALUE_TYPE_MISMATCH,
                    "segment offset is not an i32",
                )
            })
    }
}

/// The pure interpreter's implementation of the constructor proxies:
/// direct store operations.
struct InterpreterCtorContext<'a> {
    interpreter: &'a mut Interpreter,
    store: &'a mut Store,
    trapped: Option<Error>,
}

impl CtorContext for InterpreterCtorContext<'_> {
    fn trap(&mut self, error: Error) {
        self.trapped = Some(error);
    }

    fn call(&mut self, func_addr: u32, args: &[Value]) -> Result<Vec<Value>> {
        self.interpreter.run_function(self.store, func_addr, args)
    }

    fn memory_grow(&mut self, mem_addr: u32, pages: u32) -> i32 {
        self.store
            .get_memory_mut(mem_addr)
            .map_or(-1, |memory| memory.grow(pages))
    }

    fn memory_size(&mut self, mem_addr: u32) -> u32 {
        self.store.get_memory(mem_addr).map_or(0, MemoryInstance::size)
    }
}
