//! The interpreter: instruction dispatch over the flat body form.
//!
//! The engine owns the stack manager and the instruction provider;
//! the store is threaded through every call so exactly one invocation
//! is active per store at a time. Control flow works on labels: each
//! label records the continuation the cursor jumps to on a branch,
//! with loops continuing at their own header. A trap unwinds every
//! frame of the current invocation and leaves the store consistent.

use wvm_error::{codes, kinds, Error, Result};
use wvm_format::{Instruction, MemArg};
use wvm_math as math;
use wvm_math::{FloatBits32, FloatBits64};
use wvm_types::{FuncType, Value};

use crate::config::EngineConfig;
use crate::func::FunctionInstance;
use crate::prelude::Vec;
use crate::provider::InstructionProvider;
use crate::stack::{Label, LabelKind, StackManager};
use crate::store::Store;

/// Frames an invocation may nest before `CallStackExhausted`.
pub const MAX_CALL_DEPTH: usize = 1024;

/// Stack and provider heights captured at invocation entry, restored
/// on a trap.
#[derive(Debug, Clone, Copy)]
struct EntryState {
    values: usize,
    labels: usize,
    frames: usize,
    bodies: usize,
}

/// The interpreter engine.
#[derive(Debug, Default)]
pub struct Interpreter {
    pub(crate) stack: StackManager,
    pub(crate) provider: InstructionProvider,
    config: EngineConfig,
}

impl Interpreter {
    /// Create an engine with the given configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            stack: StackManager::new(),
            provider: InstructionProvider::new(),
            config,
        }
    }

    /// The engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Invoke an exported function of a registered module.
    pub fn invoke(
        &mut self,
        store: &mut Store,
        module_name: &str,
        func_name: &str,
        args: &[Value],
    ) -> Result<Vec<Value>> {
        let module_addr = store.find_module(module_name).ok_or(Error::resource_error(
            codes::MODULE_NOT_FOUND,
            "module not registered",
        ))?;
        let instance = store.module(module_addr)?;
        let target = instance.find_export(func_name).ok_or(Error::resource_error(
            codes::EXPORT_NOT_FOUND,
            "export not found",
        ))?;
        if target.kind != wvm_types::ExternKind::Func {
            return Err(Error::resource_error(
                codes::INVALID_ARGUMENTS,
                "export is not a function",
            ));
        }
        let func_addr = instance.func_addr(target.index)?;

        let ty = store.function(func_addr)?.ty().clone();
        check_args(&ty, args)?;

        log::debug!("invoke {module_name}.{func_name}({} args)", args.len());
        self.run_function(store, func_addr, args)
    }

    /// Run the function at `func_addr` with `args` already typed.
    ///
    /// Results equal in number to the function type's results are
    /// returned; on a trap every frame of this invocation is unwound
    /// first.
    pub fn run_function(
        &mut self,
        store: &mut Store,
        func_addr: u32,
        args: &[Value],
    ) -> Result<Vec<Value>> {
        let entry = EntryState {
            values: self.stack.value_height(),
            labels: self.stack.label_height(),
            frames: self.stack.frame_height(),
            bodies: self.provider.depth(),
        };

        let arity = store.function(func_addr)?.ty().results.len();
        self.stack.push_values(args);

        let outcome = self
            .call_function(store, func_addr)
            .and_then(|()| self.execute(store, entry.frames));

        match outcome {
            Ok(()) => {
                let results = self.stack.pop_values(arity)?;
                self.stack.truncate_values(entry.values);
                self.stack.truncate_labels(entry.labels);
                Ok(results)
            }
            Err(error) => {
                self.stack.truncate_values(entry.values);
                self.stack.truncate_labels(entry.labels);
                while self.stack.frame_height() > entry.frames {
                    let _ = self.stack.pop_frame();
                }
                self.provider.truncate(entry.bodies);
                Err(error)
            }
        }
    }

    /// Transfer control into a function whose arguments sit on the
    /// operand stack.
    fn call_function(&mut self, store: &Store, func_addr: u32) -> Result<()> {
        match store.function(func_addr)? {
            FunctionInstance::Host { ty, callable } => {
                let args = self.stack.pop_values(ty.params.len())?;
                let results = callable(&args)?;
                check_results(ty, &results)?;
                self.stack.push_values(&results);
                Ok(())
            }
            FunctionInstance::Wasm {
                module_addr,
                ty,
                locals,
                body,
            } => {
                if self.stack.frame_height() >= MAX_CALL_DEPTH {
                    return Err(kinds::call_stack_exhausted());
                }
                let local_base = self
                    .stack
                    .value_height()
                    .checked_sub(ty.params.len())
                    .ok_or_else(Error::stack_underflow)?;
                self.stack
                    .push_frame(*module_addr, ty.results.len() as u32, local_base);
                for &local in locals {
                    self.stack.push_value(Value::default_for(local));
                }
                self.provider.push_body(body.clone());
                // The implicit function-body label: its continuation is
                // one past the final `end`, which triggers the return.
                self.stack.push_label(Label {
                    arity: ty.results.len() as u32,
                    continuation: body.len() as u32,
                    kind: LabelKind::Block,
                    value_base: self.stack.value_height(),
                });
                Ok(())
            }
        }
    }

    /// Dispatch instructions until the frame stack returns to
    /// `exit_frames` deep.
    fn execute(&mut self, store: &mut Store, exit_frames: usize) -> Result<()> {
        loop {
            if self.stack.frame_height() == exit_frames {
                return Ok(());
            }
            match self.provider.fetch()? {
                Some(instruction) => self.step(store, instruction)?,
                // Past the body's final `end`: an implicit return.
                None => self.do_return()?,
            }
        }
    }

    /// Pop the current frame, keeping its results.
    fn do_return(&mut self) -> Result<()> {
        let frame = *self.stack.current_frame()?;
        let results = self.stack.pop_values(frame.arity as usize)?;
        self.stack.truncate_values(frame.local_base);
        self.stack.push_values(&results);
        self.stack.truncate_labels(frame.label_base);
        self.stack.pop_frame()?;
        self.provider.pop_body()?;
        Ok(())
    }

    /// Unwind to the label `depth` levels out and continue at its
    /// continuation.
    fn branch(&mut self, depth: u32) -> Result<()> {
        let label = self.stack.label(depth)?;
        let carried = self.stack.pop_values(label.arity as usize)?;
        self.stack.truncate_values(label.value_base);
        self.stack.push_values(&carried);
        self.stack.drop_labels(depth)?;
        self.provider.set_pc(label.continuation as usize)
    }

    /// Store address of the current frame's memory 0.
    fn memory_addr(&self, store: &Store) -> Result<u32> {
        let frame = self.stack.current_frame()?;
        store.module(frame.module_addr)?.memory_addr(0)
    }

    /// Pop the address operand and widen with the static offset.
    fn effective_addr(&mut self, mem_arg: MemArg) -> Result<u64> {
        let base = self.stack.pop_u32()?;
        Ok(u64::from(base) + u64::from(mem_arg.offset))
    }

    fn load_scalar(
        &mut self,
        store: &Store,
        mem_arg: MemArg,
        width: u32,
        signed: bool,
    ) -> Result<u64> {
        let addr = self.memory_addr(store)?;
        let effective = self.effective_addr(mem_arg)?;
        let memory = store
            .get_memory(addr)
            .ok_or_else(|| kinds::invalid_address("memory"))?;
        memory.load_scalar(effective, width, signed)
    }

    fn store_scalar(
        &mut self,
        store: &mut Store,
        mem_arg: MemArg,
        width: u32,
        value: u64,
    ) -> Result<()> {
        let addr = self.memory_addr(store)?;
        let effective = self.effective_addr(mem_arg)?;
        let memory = store
            .get_memory_mut(addr)
            .ok_or_else(|| kinds::invalid_address("memory"))?;
        memory.store_scalar(effective, width, value)
    }

    fn global_value(&self, store: &Store, index: u32) -> Result<Value> {
        let frame = self.stack.current_frame()?;
        let addr = store.module(frame.module_addr)?.global_addr(index)?;
        store
            .get_global(addr)
            .map(crate::global::GlobalInstance::get)
            .ok_or_else(|| kinds::invalid_address("global"))
    }

    fn set_global_value(&mut self, store: &mut Store, index: u32, value: Value) -> Result<()> {
        let frame = self.stack.current_frame()?;
        let addr = store.module(frame.module_addr)?.global_addr(index)?;
        store
            .get_global_mut(addr)
            .ok_or_else(|| kinds::invalid_address("global"))?
            .set(value)
    }

    fn call_indirect(&mut self, store: &mut Store, type_index: u32, table_index: u32) -> Result<()> {
        let frame = *self.stack.current_frame()?;
        let instance = store.module(frame.module_addr)?;
        let expected = instance.func_type(type_index)?.clone();
        let table_addr = instance.table_addr(table_index)?;

        let slot = self.stack.pop_u32()?;
        let entry = store
            .get_table(table_addr)
            .ok_or_else(|| kinds::invalid_address("table"))?
            .get(slot)?;
        let func_addr = entry.ok_or_else(kinds::uninitialized_element)?;
        if *store.function(func_addr)?.ty() != expected {
            return Err(kinds::indirect_call_type_mismatch());
        }
        self.call_function(store, func_addr)
    }

    /// Execute one instruction.
    #[allow(clippy::too_many_lines)]
    fn step(&mut self, store: &mut Store, instruction: Instruction) -> Result<()> {
        use Instruction as I;
        match instruction {
            // --- control ---
            I::Unreachable => return Err(kinds::trap_unreachable()),
            I::Nop => {}
            I::Block { block_type, end_pc } => {
                let value_base = self.stack.value_height();
                self.stack.push_label(Label {
                    arity: block_type.arity() as u32,
                    continuation: end_pc + 1,
                    kind: LabelKind::Block,
                    value_base,
                });
            }
            I::Loop { .. } => {
                // A branch to a loop re-enters at the loop header, so
                // the continuation is this very instruction.
                let header = self.provider.pc()? - 1;
                let value_base = self.stack.value_height();
                self.stack.push_label(Label {
                    arity: 0,
                    continuation: header as u32,
                    kind: LabelKind::Loop,
                    value_base,
                });
            }
            I::If {
                block_type,
                else_pc,
                end_pc,
            } => {
                let condition = self.stack.pop_i32()?;
                let value_base = self.stack.value_height();
                if condition != 0 {
                    self.stack.push_label(Label {
                        arity: block_type.arity() as u32,
                        continuation: end_pc + 1,
                        kind: LabelKind::If,
                        value_base,
                    });
                } else if else_pc != end_pc {
                    self.stack.push_label(Label {
                        arity: block_type.arity() as u32,
                        continuation: end_pc + 1,
                        kind: LabelKind::If,
                        value_base,
                    });
                    self.provider.set_pc(else_pc as usize + 1)?;
                } else {
                    // No else branch: skip the whole construct.
                    self.provider.set_pc(end_pc as usize + 1)?;
                }
            }
            I::Else { end_pc } => {
                // The then-branch ran to completion; the `end` there
                // pops the label.
                self.provider.set_pc(end_pc as usize)?;
            }
            I::End => {
                self.stack.pop_label()?;
            }
            I::Br(depth) => self.branch(depth)?,
            I::BrIf(depth) => {
                if self.stack.pop_i32()? != 0 {
                    self.branch(depth)?;
                }
            }
            I::BrTable { targets, default } => {
                let index = self.stack.pop_u32()?;
                let depth = targets
                    .get(index as usize)
                    .copied()
                    .unwrap_or(default);
                self.branch(depth)?;
            }
            I::Return => self.do_return()?,
            I::Call(index) => {
                let frame = *self.stack.current_frame()?;
                let func_addr = store.module(frame.module_addr)?.func_addr(index)?;
                self.call_function(store, func_addr)?;
            }
            I::CallIndirect {
                type_index,
                table_index,
            } => self.call_indirect(store, type_index, table_index)?,

            // --- parametric ---
            I::Drop => {
                self.stack.pop_value()?;
            }
            I::Select => {
                let condition = self.stack.pop_i32()?;
                let on_false = self.stack.pop_value()?;
                let on_true = self.stack.pop_value()?;
                self.stack.push_value(if condition != 0 { on_true } else { on_false });
            }

            // --- variable ---
            I::LocalGet(index) => {
                let value = self.stack.get_local(index)?;
                self.stack.push_value(value);
            }
            I::LocalSet(index) => {
                let value = self.stack.pop_value()?;
                self.stack.set_local(index, value)?;
            }
            I::LocalTee(index) => {
                let value = self.stack.pop_value()?;
                self.stack.push_value(value);
                self.stack.set_local(index, value)?;
            }
            I::GlobalGet(index) => {
                let value = self.global_value(store, index)?;
                self.stack.push_value(value);
            }
            I::GlobalSet(index) => {
                let value = self.stack.pop_value()?;
                self.set_global_value(store, index, value)?;
            }

            // --- memory loads ---
            I::I32Load(m) => {
                let v = self.load_scalar(store, m, 4, false)?;
                self.stack.push_value(Value::I32(v as u32 as i32));
            }
            I::I64Load(m) => {
                let v = self.load_scalar(store, m, 8, false)?;
                self.stack.push_value(Value::I64(v as i64));
            }
            I::F32Load(m) => {
                let v = self.load_scalar(store, m, 4, false)?;
                self.stack
                    .push_value(Value::F32(FloatBits32::from_bits(v as u32)));
            }
            I::F64Load(m) => {
                let v = self.load_scalar(store, m, 8, false)?;
                self.stack.push_value(Value::F64(FloatBits64::from_bits(v)));
            }
            I::I32Load8S(m) => {
                let v = self.load_scalar(store, m, 1, true)?;
                self.stack.push_value(Value::I32(v as i64 as i32));
            }
            I::I32Load8U(m) => {
                let v = self.load_scalar(store, m, 1, false)?;
                self.stack.push_value(Value::I32(v as i32));
            }
            I::I32Load16S(m) => {
                let v = self.load_scalar(store, m, 2, true)?;
                self.stack.push_value(Value::I32(v as i64 as i32));
            }
            I::I32Load16U(m) => {
                let v = self.load_scalar(store, m, 2, false)?;
                self.stack.push_value(Value::I32(v as i32));
            }
            I::I64Load8S(m) => {
                let v = self.load_scalar(store, m, 1, true)?;
                self.stack.push_value(Value::I64(v as i64));
            }
            I::I64Load8U(m) => {
                let v = self.load_scalar(store, m, 1, false)?;
                self.stack.push_value(Value::I64(v as i64));
            }
            I::I64Load16S(m) => {
                let v = self.load_scalar(store, m, 2, true)?;
                self.stack.push_value(Value::I64(v as i64));
            }
            I::I64Load16U(m) => {
                let v = self.load_scalar(store, m, 2, false)?;
                self.stack.push_value(Value::I64(v as i64));
            }
            I::I64Load32S(m) => {
                let v = self.load_scalar(store, m, 4, true)?;
                self.stack.push_value(Value::I64(v as i64));
            }
            I::I64Load32U(m) => {
                let v = self.load_scalar(store, m, 4, false)?;
                self.stack.push_value(Value::I64(v as i64));
            }

            // --- memory stores ---
            I::I32Store(m) => {
                let value = self.stack.pop_u32()?;
                self.store_scalar(store, m, 4, u64::from(value))?;
            }
            I::I64Store(m) => {
                let value = self.stack.pop_u64()?;
                self.store_scalar(store, m, 8, value)?;
            }
            I::F32Store(m) => {
                let value = self.stack.pop_f32()?;
                self.store_scalar(store, m, 4, u64::from(value.to_bits()))?;
            }
            I::F64Store(m) => {
                let value = self.stack.pop_f64()?;
                self.store_scalar(store, m, 8, value.to_bits())?;
            }
            I::I32Store8(m) => {
                let value = self.stack.pop_u32()?;
                self.store_scalar(store, m, 1, u64::from(value))?;
            }
            I::I32Store16(m) => {
                let value = self.stack.pop_u32()?;
                self.store_scalar(store, m, 2, u64::from(value))?;
            }
            I::I64Store8(m) => {
                let value = self.stack.pop_u64()?;
                self.store_scalar(store, m, 1, value)?;
            }
            I::I64Store16(m) => {
                let value = self.stack.pop_u64()?;
                self.store_scalar(store, m, 2, value)?;
            }
            I::I64Store32(m) => {
                let value = self.stack.pop_u64()?;
                self.store_scalar(store, m, 4, value)?;
            }
            I::MemorySize => {
                let addr = self.memory_addr(store)?;
                let memory = store
                    .get_memory(addr)
                    .ok_or_else(|| kinds::invalid_address("memory"))?;
                self.stack.push_value(Value::I32(memory.size() as i32));
            }
            I::MemoryGrow => {
                let pages = self.stack.pop_u32()?;
                let addr = self.memory_addr(store)?;
                let memory = store
                    .get_memory_mut(addr)
                    .ok_or_else(|| kinds::invalid_address("memory"))?;
                let old = memory.grow(pages);
                self.stack.push_value(Value::I32(old));
            }

            // --- constants ---
            I::I32Const(v) => self.stack.push_value(Value::I32(v)),
            I::I64Const(v) => self.stack.push_value(Value::I64(v)),
            I::F32Const(v) => self.stack.push_value(Value::F32(v)),
            I::F64Const(v) => self.stack.push_value(Value::F64(v)),

            // --- i32 comparison ---
            I::I32Eqz => {
                let a = self.stack.pop_i32()?;
                self.stack.push_value(Value::I32(i32::from(a == 0)));
            }
            I::I32Eq => i32_relop(&mut self.stack, |a, b| a == b)?,
            I::I32Ne => i32_relop(&mut self.stack, |a, b| a != b)?,
            I::I32LtS => i32_relop(&mut self.stack, |a, b| a < b)?,
            I::I32LtU => u32_relop(&mut self.stack, |a, b| a < b)?,
            I::I32GtS => i32_relop(&mut self.stack, |a, b| a > b)?,
            I::I32GtU => u32_relop(&mut self.stack, |a, b| a > b)?,
            I::I32LeS => i32_relop(&mut self.stack, |a, b| a <= b)?,
            I::I32LeU => u32_relop(&mut self.stack, |a, b| a <= b)?,
            I::I32GeS => i32_relop(&mut self.stack, |a, b| a >= b)?,
            I::I32GeU => u32_relop(&mut self.stack, |a, b| a >= b)?,

            // --- i64 comparison ---
            I::I64Eqz => {
                let a = self.stack.pop_i64()?;
                self.stack.push_value(Value::I32(i32::from(a == 0)));
            }
            I::I64Eq => i64_relop(&mut self.stack, |a, b| a == b)?,
            I::I64Ne => i64_relop(&mut self.stack, |a, b| a != b)?,
            I::I64LtS => i64_relop(&mut self.stack, |a, b| a < b)?,
            I::I64LtU => u64_relop(&mut self.stack, |a, b| a < b)?,
            I::I64GtS => i64_relop(&mut self.stack, |a, b| a > b)?,
            I::I64GtU => u64_relop(&mut self.stack, |a, b| a > b)?,
            I::I64LeS => i64_relop(&mut self.stack, |a, b| a <= b)?,
            I::I64LeU => u64_relop(&mut self.stack, |a, b| a <= b)?,
            I::I64GeS => i64_relop(&mut self.stack, |a, b| a >= b)?,
            I::I64GeU => u64_relop(&mut self.stack, |a, b| a >= b)?,

            // --- float comparison ---
            I::F32Eq => f32_relop(&mut self.stack, |a, b| a == b)?,
            I::F32Ne => f32_relop(&mut self.stack, |a, b| a != b)?,
            I::F32Lt => f32_relop(&mut self.stack, |a, b| a < b)?,
            I::F32Gt => f32_relop(&mut self.stack, |a, b| a > b)?,
            I::F32Le => f32_relop(&mut self.stack, |a, b| a <= b)?,
            I::F32Ge => f32_relop(&mut self.stack, |a, b| a >= b)?,
            I::F64Eq => f64_relop(&mut self.stack, |a, b| a == b)?,
            I::F64Ne => f64_relop(&mut self.stack, |a, b| a != b)?,
            I::F64Lt => f64_relop(&mut self.stack, |a, b| a < b)?,
            I::F64Gt => f64_relop(&mut self.stack, |a, b| a > b)?,
            I::F64Le => f64_relop(&mut self.stack, |a, b| a <= b)?,
            I::F64Ge => f64_relop(&mut self.stack, |a, b| a >= b)?,

            // --- i32 arithmetic ---
            I::I32Clz => i32_unop(&mut self.stack, |a| a.leading_zeros() as i32)?,
            I::I32Ctz => i32_unop(&mut self.stack, |a| a.trailing_zeros() as i32)?,
            I::I32Popcnt => i32_unop(&mut self.stack, |a| a.count_ones() as i32)?,
            I::I32Add => i32_binop(&mut self.stack, i32::wrapping_add)?,
            I::I32Sub => i32_binop(&mut self.stack, i32::wrapping_sub)?,
            I::I32Mul => i32_binop(&mut self.stack, i32::wrapping_mul)?,
            I::I32DivS => {
                let b = self.stack.pop_i32()?;
                let a = self.stack.pop_i32()?;
                self.stack.push_value(Value::I32(math::i32_div_s(a, b)?));
            }
            I::I32DivU => {
                let b = self.stack.pop_u32()?;
                let a = self.stack.pop_u32()?;
                self.stack.push_value(Value::I32(math::i32_div_u(a, b)? as i32));
            }
            I::I32RemS => {
                let b = self.stack.pop_i32()?;
                let a = self.stack.pop_i32()?;
                self.stack.push_value(Value::I32(math::i32_rem_s(a, b)?));
            }
            I::I32RemU => {
                let b = self.stack.pop_u32()?;
                let a = self.stack.pop_u32()?;
                self.stack.push_value(Value::I32(math::i32_rem_u(a, b)? as i32));
            }
            I::I32And => i32_binop(&mut self.stack, |a, b| a & b)?,
            I::I32Or => i32_binop(&mut self.stack, |a, b| a | b)?,
            I::I32Xor => i32_binop(&mut self.stack, |a, b| a ^ b)?,
            I::I32Shl => i32_binop(&mut self.stack, |a, b| a.wrapping_shl(b as u32))?,
            I::I32ShrS => i32_binop(&mut self.stack, |a, b| a.wrapping_shr(b as u32))?,
            I::I32ShrU => i32_binop(&mut self.stack, |a, b| ((a as u32).wrapping_shr(b as u32)) as i32)?,
            I::I32Rotl => i32_binop(&mut self.stack, |a, b| a.rotate_left(b as u32))?,
            I::I32Rotr => i32_binop(&mut self.stack, |a, b| a.rotate_right(b as u32))?,

            // --- i64 arithmetic ---
            I::I64Clz => i64_unop(&mut self.stack, |a| i64::from(a.leading_zeros()))?,
            I::I64Ctz => i64_unop(&mut self.stack, |a| i64::from(a.trailing_zeros()))?,
            I::I64Popcnt => i64_unop(&mut self.stack, |a| i64::from(a.count_ones()))?,
            I::I64Add => i64_binop(&mut self.stack, i64::wrapping_add)?,
            I::I64Sub => i64_binop(&mut self.stack, i64::wrapping_sub)?,
            I::I64Mul => i64_binop(&mut self.stack, i64::wrapping_mul)?,
            I::I64DivS => {
                let b = self.stack.pop_i64()?;
                let a = self.stack.pop_i64()?;
                self.stack.push_value(Value::I64(math::i64_div_s(a, b)?));
            }
            I::I64DivU => {
                let b = self.stack.pop_u64()?;
                let a = self.stack.pop_u64()?;
                self.stack.push_value(Value::I64(math::i64_div_u(a, b)? as i64));
            }
            I::I64RemS => {
                let b = self.stack.pop_i64()?;
                let a = self.stack.pop_i64()?;
                self.stack.push_value(Value::I64(math::i64_rem_s(a, b)?));
            }
            I::I64RemU => {
                let b = self.stack.pop_u64()?;
                let a = self.stack.pop_u64()?;
                self.stack.push_value(Value::I64(math::i64_rem_u(a, b)? as i64));
            }
            I::I64And => i64_binop(&mut self.stack, |a, b| a & b)?,
            I::I64Or => i64_binop(&mut self.stack, |a, b| a | b)?,
            I::I64Xor => i64_binop(&mut self.stack, |a, b| a ^ b)?,
            I::I64Shl => i64_binop(&mut self.stack, |a, b| a.wrapping_shl(b as u32))?,
            I::I64ShrS => i64_binop(&mut self.stack, |a, b| a.wrapping_shr(b as u32))?,
            I::I64ShrU => i64_binop(&mut self.stack, |a, b| ((a as u64).wrapping_shr(b as u32)) as i64)?,
            I::I64Rotl => i64_binop(&mut self.stack, |a, b| a.rotate_left(b as u32))?,
            I::I64Rotr => i64_binop(&mut self.stack, |a, b| a.rotate_right(b as u32))?,

            // --- f32 arithmetic ---
            I::F32Abs => f32_unop(&mut self.stack, math::f32_abs)?,
            I::F32Neg => f32_unop(&mut self.stack, math::f32_neg)?,
            I::F32Ceil => f32_unop(&mut self.stack, math::f32_ceil)?,
            I::F32Floor => f32_unop(&mut self.stack, math::f32_floor)?,
            I::F32Trunc => f32_unop(&mut self.stack, math::f32_trunc)?,
            I::F32Nearest => f32_unop(&mut self.stack, math::f32_nearest)?,
            I::F32Sqrt => f32_unop(&mut self.stack, math::f32_sqrt)?,
            I::F32Add => f32_binop(&mut self.stack, math::f32_add)?,
            I::F32Sub => f32_binop(&mut self.stack, math::f32_sub)?,
            I::F32Mul => f32_binop(&mut self.stack, math::f32_mul)?,
            I::F32Div => f32_binop(&mut self.stack, math::f32_div)?,
            I::F32Min => f32_binop(&mut self.stack, math::f32_min)?,
            I::F32Max => f32_binop(&mut self.stack, math::f32_max)?,
            I::F32Copysign => f32_binop(&mut self.stack, math::f32_copysign)?,

            // --- f64 arithmetic ---
            I::F64Abs => f64_unop(&mut self.stack, math::f64_abs)?,
            I::F64Neg => f64_unop(&mut self.stack, math::f64_neg)?,
            I::F64Ceil => f64_unop(&mut self.stack, math::f64_ceil)?,
            I::F64Floor => f64_unop(&mut self.stack, math::f64_floor)?,
            I::F64Trunc => f64_unop(&mut self.stack, math::f64_trunc)?,
            I::F64Nearest => f64_unop(&mut self.stack, math::f64_nearest)?,
            I::F64Sqrt => f64_unop(&mut self.stack, math::f64_sqrt)?,
            I::F64Add => f64_binop(&mut self.stack, math::f64_add)?,
            I::F64Sub => f64_binop(&mut self.stack, math::f64_sub)?,
            I::F64Mul => f64_binop(&mut self.stack, math::f64_mul)?,
            I::F64Div => f64_binop(&mut self.stack, math::f64_div)?,
            I::F64Min => f64_binop(&mut self.stack, math::f64_min)?,
            I::F64Max => f64_binop(&mut self.stack, math::f64_max)?,
            I::F64Copysign => f64_binop(&mut self.stack, math::f64_copysign)?,

            // --- conversions ---
            I::I32WrapI64 => {
                let a = self.stack.pop_i64()?;
                self.stack.push_value(Value::I32(math::i32_wrap_i64(a)));
            }
            I::I32TruncF32S => {
                let a = self.stack.pop_f32()?;
                self.stack.push_value(Value::I32(math::i32_trunc_f32_s(a)?));
            }
            I::I32TruncF32U => {
                let a = self.stack.pop_f32()?;
                self.stack.push_value(Value::I32(math::i32_trunc_f32_u(a)? as i32));
            }
            I::I32TruncF64S => {
                let a = self.stack.pop_f64()?;
                self.stack.push_value(Value::I32(math::i32_trunc_f64_s(a)?));
            }
            I::I32TruncF64U => {
                let a = self.stack.pop_f64()?;
                self.stack.push_value(Value::I32(math::i32_trunc_f64_u(a)? as i32));
            }
            I::I64ExtendI32S => {
                let a = self.stack.pop_i32()?;
                self.stack.push_value(Value::I64(math::i64_extend_i32_s(a)));
            }
            I::I64ExtendI32U => {
                let a = self.stack.pop_i32()?;
                self.stack.push_value(Value::I64(math::i64_extend_i32_u(a)));
            }
            I::I64TruncF32S => {
                let a = self.stack.pop_f32()?;
                self.stack.push_value(Value::I64(math::i64_trunc_f32_s(a)?));
            }
            I::I64TruncF32U => {
                let a = self.stack.pop_f32()?;
                self.stack.push_value(Value::I64(math::i64_trunc_f32_u(a)? as i64));
            }
            I::I64TruncF64S => {
                let a = self.stack.pop_f64()?;
                self.stack.push_value(Value::I64(math::i64_trunc_f64_s(a)?));
            }
            I::I64TruncF64U => {
                let a = self.stack.pop_f64()?;
                self.stack.push_value(Value::I64(math::i64_trunc_f64_u(a)? as i64));
            }
            I::F32ConvertI32S => {
                let a = self.stack.pop_i32()?;
                self.stack.push_value(Value::F32(math::f32_convert_i32_s(a)));
            }
            I::F32ConvertI32U => {
                let a = self.stack.pop_u32()?;
                self.stack.push_value(Value::F32(math::f32_convert_i32_u(a)));
            }
            I::F32ConvertI64S => {
                let a = self.stack.pop_i64()?;
                self.stack.push_value(Value::F32(math::f32_convert_i64_s(a)));
            }
            I::F32ConvertI64U => {
                let a = self.stack.pop_u64()?;
                self.stack.push_value(Value::F32(math::f32_convert_i64_u(a)));
            }
            I::F32DemoteF64 => {
                let a = self.stack.pop_f64()?;
                self.stack.push_value(Value::F32(math::f32_demote_f64(a)));
            }
            I::F64ConvertI32S => {
                let a = self.stack.pop_i32()?;
                self.stack.push_value(Value::F64(math::f64_convert_i32_s(a)));
            }
            I::F64ConvertI32U => {
                let a = self.stack.pop_u32()?;
                self.stack.push_value(Value::F64(math::f64_convert_i32_u(a)));
            }
            I::F64ConvertI64S => {
                let a = self.stack.pop_i64()?;
                self.stack.push_value(Value::F64(math::f64_convert_i64_s(a)));
            }
            I::F64ConvertI64U => {
                let a = self.stack.pop_u64()?;
                self.stack.push_value(Value::F64(math::f64_convert_i64_u(a)));
            }
            I::F64PromoteF32 => {
                let a = self.stack.pop_f32()?;
                self.stack.push_value(Value::F64(math::f64_promote_f32(a)));
            }
            I::I32ReinterpretF32 => {
                let a = self.stack.pop_f32()?;
                self.stack.push_value(Value::I32(math::i32_reinterpret_f32(a)));
            }
            I::I64ReinterpretF64 => {
                let a = self.stack.pop_f64()?;
                self.stack.push_value(Value::I64(math::i64_reinterpret_f64(a)));
            }
            I::F32ReinterpretI32 => {
                let a = self.stack.pop_i32()?;
                self.stack.push_value(Value::F32(math::f32_reinterpret_i32(a)));
            }
            I::F64ReinterpretI64 => {
                let a = self.stack.pop_i64()?;
                self.stack.push_value(Value::F64(math::f64_reinterpret_i64(a)));
            }

            // --- sign extension ---
            I::I32Extend8S => i32_unop(&mut self.stack, math::i32_extend8_s)?,
            I::I32Extend16S => i32_unop(&mut self.stack, math::i32_extend16_s)?,
            I::I64Extend8S => i64_unop(&mut self.stack, math::i64_extend8_s)?,
            I::I64Extend16S => i64_unop(&mut self.stack, math::i64_extend16_s)?,
            I::I64Extend32S => i64_unop(&mut self.stack, math::i64_extend32_s)?,

            // --- saturating truncation ---
            I::I32TruncSatF32S => {
                let a = self.stack.pop_f32()?;
                self.stack.push_value(Value::I32(math::i32_trunc_sat_f32_s(a)));
            }
            I::I32TruncSatF32U => {
                let a = self.stack.pop_f32()?;
                self.stack.push_value(Value::I32(math::i32_trunc_sat_f32_u(a) as i32));
            }
            I::I32TruncSatF64S => {
                let a = self.stack.pop_f64()?;
                self.stack.push_value(Value::I32(math::i32_trunc_sat_f64_s(a)));
            }
            I::I32TruncSatF64U => {
                let a = self.stack.pop_f64()?;
                self.stack.push_value(Value::I32(math::i32_trunc_sat_f64_u(a) as i32));
            }
            I::I64TruncSatF32S => {
                let a = self.stack.pop_f32()?;
                self.stack.push_value(Value::I64(math::i64_trunc_sat_f32_s(a)));
            }
            I::I64TruncSatF32U => {
                let a = self.stack.pop_f32()?;
                self.stack.push_value(Value::I64(math::i64_trunc_sat_f32_u(a) as i64));
            }
            I::I64TruncSatF64S => {
                let a = self.stack.pop_f64()?;
                self.stack.push_value(Value::I64(math::i64_trunc_sat_f64_s(a)));
            }
            I::I64TruncSatF64U => {
                let a = self.stack.pop_f64()?;
                self.stack.push_value(Value::I64(math::i64_trunc_sat_f64_u(a) as i64));
            }
        }
        Ok(())
    }
}

/// Check invocation arguments against the function type.
fn check_args(ty: &FuncType, args: &[Value]) -> Result<()> {
    if args.len() != ty.params.len()
        || args
            .iter()
            .zip(&ty.params)
            .any(|(arg, &param)| arg.type_of() != param)
    {
        return Err(Error::resource_error(
            codes::INVALID_ARGUMENTS,
            "arguments do not match the function type",
        ));
    }
    Ok(())
}

/// Check host-function results against the function type.
fn check_results(ty: &FuncType, results: &[Value]) -> Result<()> {
    if results.len() != ty.results.len()
        || results
            .iter()
            .zip(&ty.results)
            .any(|(result, &expected)| result.type_of() != expected)
    {
        return Err(Error::runtime_error(
            codes::VALUE_TYPE_MISMATCH,
            "host function returned the wrong results",
        ));
    }
    Ok(())
}

fn i32_unop(stack: &mut StackManager, op: impl FnOnce(i32) -> i32) -> Result<()> {
    let a = stack.pop_i32()?;
    stack.push_value(Value::I32(op(a)));
    Ok(())
}

fn i32_binop(stack: &mut StackManager, op: impl FnOnce(i32, i32) -> i32) -> Result<()> {
    let b = stack.pop_i32()?;
    let a = stack.pop_i32()?;
    stack.push_value(Value::I32(op(a, b)));
    Ok(())
}

fn i64_unop(stack: &mut StackManager, op: impl FnOnce(i64) -> i64) -> Result<()> {
    let a = stack.pop_i64()?;
    stack.push_value(Value::I64(op(a)));
    Ok(())
}

fn i64_binop(stack: &mut StackManager, op: impl FnOnce(i64, i64) -> i64) -> Result<()> {
    let b = stack.pop_i64()?;
    let a = stack.pop_i64()?;
    stack.push_value(Value::I64(op(a, b)));
    Ok(())
}

fn i32_relop(stack: &mut StackManager, op: impl FnOnce(i32, i32) -> bool) -> Result<()> {
    let b = stack.pop_i32()?;
    let a = stack.pop_i32()?;
    stack.push_value(Value::I32(i32::from(op(a, b))));
    Ok(())
}

fn u32_relop(stack: &mut StackManager, op: impl FnOnce(u32, u32) -> bool) -> Result<()> {
    let b = stack.pop_u32()?;
    let a = stack.pop_u32()?;
    stack.push_value(Value::I32(i32::from(op(a, b))));
    Ok(())
}

fn i64_relop(stack: &mut StackManager, op: impl FnOnce(i64, i64) -> bool) -> Result<()> {
    let b = stack.pop_i64()?;
    let a = stack.pop_i64()?;
    stack.push_value(Value::I32(i32::from(op(a, b))));
    Ok(())
}

fn u64_relop(stack: &mut StackManager, op: impl FnOnce(u64, u64) -> bool) -> Result<()> {
    let b = stack.pop_u64()?;
    let a = stack.pop_u64()?;
    stack.push_value(Value::I32(i32::from(op(a, b))));
    Ok(())
}

fn f32_relop(stack: &mut StackManager, op: impl FnOnce(f32, f32) -> bool) -> Result<()> {
    let b = stack.pop_f32()?;
    let a = stack.pop_f32()?;
    stack.push_value(Value::I32(i32::from(op(a.value(), b.value()))));
    Ok(())
}

fn f64_relop(stack: &mut StackManager, op: impl FnOnce(f64, f64) -> bool) -> Result<()> {
    let b = stack.pop_f64()?;
    let a = stack.pop_f64()?;
    stack.push_value(Value::I32(i32::from(op(a.value(), b.value()))));
    Ok(())
}

fn f32_unop(
    stack: &mut StackManager,
    op: impl FnOnce(FloatBits32) -> FloatBits32,
) -> Result<()> {
    let a = stack.pop_f32()?;
    stack.push_value(Value::F32(op(a)));
    Ok(())
}

fn f32_binop(
    stack: &mut StackManager,
    op: impl FnOnce(FloatBits32, FloatBits32) -> FloatBits32,
) -> Result<()> {
    let b = stack.pop_f32()?;
    let a = stack.pop_f32()?;
    stack.push_value(Value::F32(op(a, b)));
    Ok(())
}

fn f64_unop(
    stack: &mut StackManager,
    op: impl FnOnce(FloatBits64) -> FloatBits64,
) -> Result<()> {
    let a = stack.pop_f64()?;
    stack.push_value(Value::F64(op(a)));
    Ok(())
}

fn f64_binop(
    stack: &mut StackManager,
    op: impl FnOnce(FloatBits64, FloatBits64) -> FloatBits64,
) -> Result<()> {
    let b = stack.pop_f64()?;
    let a = stack.pop_f64()?;
    stack.push_value(Value::F64(op(a, b)));
    Ok(())
}
