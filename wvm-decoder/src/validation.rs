//! The module validator.
//!
//! Validation is total: a module either passes every check here and
//! may be instantiated, or it is rejected with an error carrying the
//! failure (and, through [`ValidationFailure`], the offending function
//! and instruction). Function bodies are checked with the standard
//! value/control stack algorithm; the `unreachable` marker makes the
//! stack polymorphic after an unconditional branch.

use wvm_error::{codes, Error, Result};
use wvm_format::instructions::{Instruction, MemArg};
use wvm_format::module::{ImportDesc, Module, SegmentMode};
use wvm_types::{BlockType, ExternKind, GlobalType, MemoryType, Mutability, TableType, ValueType};

use crate::prelude::{HashSet, Vec};

/// A validation failure with its position inside the module.
#[derive(Debug, Clone, Copy)]
pub struct ValidationFailure {
    /// Function index the failure occurred in, if it was inside a body
    pub func_index: Option<u32>,
    /// Instruction index within that body
    pub instr_index: Option<u32>,
    /// The underlying error
    pub error: Error,
}

impl ValidationFailure {
    const fn module_level(error: Error) -> Self {
        Self {
            func_index: None,
            instr_index: None,
            error,
        }
    }
}

impl From<ValidationFailure> for Error {
    fn from(failure: ValidationFailure) -> Self {
        failure.error
    }
}

/// Validate a whole module.
pub fn validate_module(module: &Module) -> Result<()> {
    validate_module_detailed(module).map_err(|failure| {
        if let (Some(func), Some(instr)) = (failure.func_index, failure.instr_index) {
            log::debug!(
                "validation failed in function {func} at instruction {instr}: {}",
                failure.error
            );
        } else {
            log::debug!("validation failed: {}", failure.error);
        }
        failure.error
    })
}

/// Validate a whole module, reporting the failing position.
pub fn validate_module_detailed(
    module: &Module,
) -> core::result::Result<(), ValidationFailure> {
    if module.functions.len() != module.code.len() {
        return Err(ValidationFailure::module_level(Error::validation_error(
            codes::UNKNOWN_FUNC_INDEX,
            "function and code section lengths disagree",
        )));
    }
    let ctx = ModuleContext::build(module).map_err(ValidationFailure::module_level)?;

    validate_module_fields(module, &ctx).map_err(ValidationFailure::module_level)?;

    let imported_funcs = module.import_count(ExternKind::Func);
    for (i, body) in module.code.iter().enumerate() {
        let func_index = imported_funcs + i as u32;
        let type_index = module.functions[i];
        let mut validator = BodyValidator::new(&ctx, type_index, &body.locals);
        validator
            .run(&body.instructions)
            .map_err(|(instr_index, error)| ValidationFailure {
                func_index: Some(func_index),
                instr_index: Some(instr_index),
                error,
            })?;
    }
    Ok(())
}

/// Index spaces of a module, imports first.
struct ModuleContext<'a> {
    module: &'a Module,
    /// Type index of every function, across the import boundary
    func_types: Vec<u32>,
    tables: Vec<TableType>,
    memories: Vec<MemoryType>,
    globals: Vec<GlobalType>,
    imported_globals: u32,
}

impl<'a> ModuleContext<'a> {
    fn build(module: &'a Module) -> Result<Self> {
        for ty in &module.types {
            if ty.results.len() > 1 {
                return Err(Error::validation_error(
                    codes::TYPE_MISMATCH,
                    "more than one result type",
                ));
            }
        }

        let mut ctx = Self {
            module,
            func_types: Vec::new(),
            tables: Vec::new(),
            memories: Vec::new(),
            globals: Vec::new(),
            imported_globals: 0,
        };

        for import in &module.imports {
            match import.desc {
                ImportDesc::Func(type_index) => {
                    if type_index as usize >= module.types.len() {
                        return Err(Error::validation_error(
                            codes::UNKNOWN_TYPE_INDEX,
                            "import function type out of range",
                        ));
                    }
                    ctx.func_types.push(type_index);
                }
                ImportDesc::Table(table) => {
                    table.limits.validate()?;
                    ctx.tables.push(table);
                }
                ImportDesc::Memory(memory) => {
                    memory.validate()?;
                    ctx.memories.push(memory);
                }
                ImportDesc::Global(global) => {
                    ctx.globals.push(global);
                    ctx.imported_globals += 1;
                }
            }
        }

        for &type_index in &module.functions {
            if type_index as usize >= module.types.len() {
                return Err(Error::validation_error(
                    codes::UNKNOWN_TYPE_INDEX,
                    "function type index out of range",
                ));
            }
            ctx.func_types.push(type_index);
        }
        for table in &module.tables {
            table.limits.validate()?;
            ctx.tables.push(*table);
        }
        for memory in &module.memories {
            memory.validate()?;
            ctx.memories.push(*memory);
        }
        for global in &module.globals {
            ctx.globals.push(global.ty);
        }

        if ctx.tables.len() > 1 {
            return Err(Error::validation_error(
                codes::UNKNOWN_TABLE_INDEX,
                "at most one table is allowed",
            ));
        }
        if ctx.memories.len() > 1 {
            return Err(Error::validation_error(
                codes::UNKNOWN_MEMORY_INDEX,
                "at most one memory is allowed",
            ));
        }
        Ok(ctx)
    }

    fn func_type(&self, func_index: u32) -> Option<&wvm_types::FuncType> {
        let type_index = *self.func_types.get(func_index as usize)?;
        self.module.types.get(type_index as usize)
    }
}

fn unknown_index(kind: ExternKind, code: u16) -> Error {
    let message = match kind {
        ExternKind::Func => "function index out of range",
        ExternKind::Table => "table index out of range",
        ExternKind::Memory => "memory index out of range",
        ExternKind::Global => "global index out of range",
    };
    Error::validation_error(code, message)
}

fn validate_module_fields(module: &Module, ctx: &ModuleContext<'_>) -> Result<()> {
    // Globals: constant initializers of the right type, reading only
    // imported globals.
    for global in &module.globals {
        validate_const_expr(ctx, &global.init, global.ty.value_type)?;
    }

    // Exports: valid indices, unique names.
    let mut seen = HashSet::new();
    for export in &module.exports {
        if !seen.insert(export.name.as_str()) {
            return Err(Error::validation_error(
                codes::DUPLICATE_EXPORT,
                "duplicate export name",
            ));
        }
        let in_range = match export.kind {
            ExternKind::Func => (export.index as usize) < ctx.func_types.len(),
            ExternKind::Table => (export.index as usize) < ctx.tables.len(),
            ExternKind::Memory => (export.index as usize) < ctx.memories.len(),
            ExternKind::Global => (export.index as usize) < ctx.globals.len(),
        };
        if !in_range {
            let code = match export.kind {
                ExternKind::Func => codes::UNKNOWN_FUNC_INDEX,
                ExternKind::Table => codes::UNKNOWN_TABLE_INDEX,
                ExternKind::Memory => codes::UNKNOWN_MEMORY_INDEX,
                ExternKind::Global => codes::UNKNOWN_GLOBAL_INDEX,
            };
            return Err(unknown_index(export.kind, code));
        }
    }

    // Start: a [] -> [] function.
    if let Some(start) = module.start {
        let Some(ty) = ctx.func_type(start) else {
            return Err(unknown_index(ExternKind::Func, codes::UNKNOWN_FUNC_INDEX));
        };
        if !ty.params.is_empty() || !ty.results.is_empty() {
            return Err(Error::validation_error(
                codes::INVALID_START_TYPE,
                "start function must have no parameters and no results",
            ));
        }
    }

    // Element segments.
    for element in &module.elements {
        if let SegmentMode::Active { index, offset } = &element.mode {
            if *index as usize >= ctx.tables.len() {
                return Err(unknown_index(ExternKind::Table, codes::UNKNOWN_TABLE_INDEX));
            }
            validate_const_expr(ctx, offset, ValueType::I32)?;
        }
        for &func_index in &element.items {
            if func_index as usize >= ctx.func_types.len() {
                return Err(unknown_index(ExternKind::Func, codes::UNKNOWN_FUNC_INDEX));
            }
        }
    }

    // Data segments.
    for data in &module.data {
        if let SegmentMode::Active { index, offset } = &data.mode {
            if *index as usize >= ctx.memories.len() {
                return Err(unknown_index(
                    ExternKind::Memory,
                    codes::UNKNOWN_MEMORY_INDEX,
                ));
            }
            validate_const_expr(ctx, offset, ValueType::I32)?;
        }
    }

    Ok(())
}

/// Check a constant expression: constants and reads of imported
/// immutable globals only, producing exactly one value of
/// `expected` type.
fn validate_const_expr(
    ctx: &ModuleContext<'_>,
    expr: &[Instruction],
    expected: ValueType,
) -> Result<()> {
    let not_constant = Error::validation_error(
        codes::INVALID_CONSTANT_EXPRESSION,
        "constant expression required",
    );

    let mut stack: Vec<ValueType> = Vec::new();
    let Some((Instruction::End, body)) = expr.split_last() else {
        return Err(not_constant);
    };
    for instruction in body {
        let produced = match instruction {
            Instruction::I32Const(_) => ValueType::I32,
            Instruction::I64Const(_) => ValueType::I64,
            Instruction::F32Const(_) => ValueType::F32,
            Instruction::F64Const(_) => ValueType::F64,
            Instruction::GlobalGet(index) => {
                if *index >= ctx.imported_globals {
                    return Err(Error::instantiation_error(
                        codes::GLOBAL_INIT_REFS_NON_IMPORT,
                        "initializer reads a non-imported global",
                    ));
                }
                let global = ctx.globals[*index as usize];
                if global.mutability == Mutability::Var {
                    return Err(not_constant);
                }
                global.value_type
            }
            _ => return Err(not_constant),
        };
        stack.push(produced);
    }
    if stack.len() != 1 || stack[0] != expected {
        return Err(Error::validation_error(
            codes::TYPE_MISMATCH,
            "constant expression has the wrong type",
        ));
    }
    Ok(())
}

/// What pushed a control frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Func,
    Block,
    Loop,
    If,
    Else,
}

/// One frame of the synthetic control stack.
struct CtrlFrame {
    kind: FrameKind,
    /// Types a fallthrough or non-loop branch produces
    end_types: Vec<ValueType>,
    /// Value stack height at entry
    height: usize,
    /// Set once an unconditional branch makes the rest unreachable
    unreachable: bool,
}

impl CtrlFrame {
    /// Types a branch to this frame's label carries: the end types,
    /// except for loops where the branch re-enters the loop header.
    fn label_types(&self) -> &[ValueType] {
        if self.kind == FrameKind::Loop {
            &[]
        } else {
            &self.end_types
        }
    }
}

type BodyResult<T> = core::result::Result<T, Error>;

/// The value/control stack type checker for one function body.
struct BodyValidator<'a> {
    ctx: &'a ModuleContext<'a>,
    locals: Vec<ValueType>,
    results: Vec<ValueType>,
    /// `None` entries are the unknown type of polymorphic stacks
    vals: Vec<Option<ValueType>>,
    ctrls: Vec<CtrlFrame>,
}

impl<'a> BodyValidator<'a> {
    fn new(ctx: &'a ModuleContext<'a>, type_index: u32, declared_locals: &[ValueType]) -> Self {
        let ty = &ctx.module.types[type_index as usize];
        let mut locals = ty.params.clone();
        locals.extend_from_slice(declared_locals);
        let results = ty.results.clone();
        let mut validator = Self {
            ctx,
            locals,
            results: results.clone(),
            vals: Vec::new(),
            ctrls: Vec::new(),
        };
        validator.push_ctrl(FrameKind::Func, results);
        validator
    }

    /// Walk the body; on failure reports the instruction index.
    fn run(&mut self, instructions: &[Instruction]) -> core::result::Result<(), (u32, Error)> {
        for (pc, instruction) in instructions.iter().enumerate() {
            self.step(instruction).map_err(|e| (pc as u32, e))?;
        }
        if self.ctrls.is_empty() {
            Ok(())
        } else {
            Err((
                instructions.len() as u32,
                type_error("control frames left open at end of body"),
            ))
        }
    }

    fn push_val(&mut self, ty: ValueType) {
        self.vals.push(Some(ty));
    }

    fn push_vals(&mut self, types: &[ValueType]) {
        for &ty in types {
            self.push_val(ty);
        }
    }

    fn pop_any(&mut self) -> BodyResult<Option<ValueType>> {
        let frame = self.ctrls.last().ok_or_else(|| type_error("empty control stack"))?;
        if self.vals.len() == frame.height {
            if frame.unreachable {
                return Ok(None);
            }
            return Err(type_error("operand stack underflow"));
        }
        Ok(self.vals.pop().flatten())
    }

    fn pop_expect(&mut self, expected: ValueType) -> BodyResult<()> {
        match self.pop_any()? {
            Some(actual) if actual != expected => Err(type_error("operand type mismatch")),
            _ => Ok(()),
        }
    }

    fn pop_expects(&mut self, types: &[ValueType]) -> BodyResult<()> {
        for &ty in types.iter().rev() {
            self.pop_expect(ty)?;
        }
        Ok(())
    }

    fn push_ctrl(&mut self, kind: FrameKind, end_types: Vec<ValueType>) {
        self.ctrls.push(CtrlFrame {
            kind,
            end_types,
            height: self.vals.len(),
            unreachable: false,
        });
    }

    fn pop_ctrl(&mut self) -> BodyResult<CtrlFrame> {
        let Some(frame) = self.ctrls.last() else {
            return Err(type_error("empty control stack"));
        };
        let end_types = frame.end_types.clone();
        let height = frame.height;
        self.pop_expects(&end_types)?;
        if self.vals.len() != height {
            return Err(type_error("operand stack not empty at end of block"));
        }
        self.ctrls
            .pop()
            .ok_or_else(|| type_error("empty control stack"))
    }

    fn set_unreachable(&mut self) -> BodyResult<()> {
        let Some(frame) = self.ctrls.last_mut() else {
            return Err(type_error("empty control stack"));
        };
        self.vals.truncate(frame.height);
        frame.unreachable = true;
        Ok(())
    }

    fn label(&self, depth: u32) -> BodyResult<&CtrlFrame> {
        let len = self.ctrls.len();
        if (depth as usize) >= len {
            return Err(Error::validation_error(
                codes::UNKNOWN_LABEL,
                "branch label depth out of range",
            ));
        }
        Ok(&self.ctrls[len - 1 - depth as usize])
    }

    fn block_types(block_type: BlockType) -> Vec<ValueType> {
        match block_type {
            BlockType::Empty => Vec::new(),
            BlockType::Value(ty) => {
                let mut types = Vec::new();
                types.push(ty);
                types
            }
        }
    }

    fn local(&self, index: u32) -> BodyResult<ValueType> {
        self.locals.get(index as usize).copied().ok_or_else(|| {
            Error::validation_error(codes::UNKNOWN_LOCAL_INDEX, "local index out of range")
        })
    }

    fn global(&self, index: u32) -> BodyResult<GlobalType> {
        self.ctx.globals.get(index as usize).copied().ok_or_else(|| {
            Error::validation_error(codes::UNKNOWN_GLOBAL_INDEX, "global index out of range")
        })
    }

    fn require_memory(&self) -> BodyResult<()> {
        if self.ctx.memories.is_empty() {
            return Err(Error::validation_error(
                codes::UNKNOWN_MEMORY_INDEX,
                "no memory declared",
            ));
        }
        Ok(())
    }

    fn check_align(&self, mem_arg: MemArg, width: u32) -> BodyResult<()> {
        self.require_memory()?;
        let natural = width.trailing_zeros();
        if mem_arg.align > natural {
            return Err(Error::validation_error(
                codes::INVALID_ALIGNMENT,
                "alignment larger than natural",
            ));
        }
        Ok(())
    }

    fn load(&mut self, mem_arg: MemArg, width: u32, result: ValueType) -> BodyResult<()> {
        self.check_align(mem_arg, width)?;
        self.pop_expect(ValueType::I32)?;
        self.push_val(result);
        Ok(())
    }

    fn store(&mut self, mem_arg: MemArg, width: u32, operand: ValueType) -> BodyResult<()> {
        self.check_align(mem_arg, width)?;
        self.pop_expect(operand)?;
        self.pop_expect(ValueType::I32)?;
        Ok(())
    }

    fn unop(&mut self, ty: ValueType) -> BodyResult<()> {
        self.pop_expect(ty)?;
        self.push_val(ty);
        Ok(())
    }

    fn binop(&mut self, ty: ValueType) -> BodyResult<()> {
        self.pop_expect(ty)?;
        self.pop_expect(ty)?;
        self.push_val(ty);
        Ok(())
    }

    fn relop(&mut self, ty: ValueType) -> BodyResult<()> {
        self.pop_expect(ty)?;
        self.pop_expect(ty)?;
        self.push_val(ValueType::I32);
        Ok(())
    }

    fn testop(&mut self, ty: ValueType) -> BodyResult<()> {
        self.pop_expect(ty)?;
        self.push_val(ValueType::I32);
        Ok(())
    }

    fn cvtop(&mut self, from: ValueType, to: ValueType) -> BodyResult<()> {
        self.pop_expect(from)?;
        self.push_val(to);
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn step(&mut self, instruction: &Instruction) -> BodyResult<()> {
        use Instruction as I;
        use ValueType::{F32, F64, I32, I64};
        match instruction {
            I::Unreachable => self.set_unreachable()?,
            I::Nop => {}
            I::Block { block_type, .. } => {
                self.push_ctrl(FrameKind::Block, Self::block_types(*block_type));
            }
            I::Loop { block_type } => {
                self.push_ctrl(FrameKind::Loop, Self::block_types(*block_type));
            }
            I::If { block_type, .. } => {
                self.pop_expect(I32)?;
                self.push_ctrl(FrameKind::If, Self::block_types(*block_type));
            }
            I::Else { .. } => {
                let frame = self.pop_ctrl()?;
                if frame.kind != FrameKind::If {
                    return Err(type_error("else without matching if"));
                }
                self.push_ctrl(FrameKind::Else, frame.end_types);
            }
            I::End => {
                let frame = self.pop_ctrl()?;
                // A one-armed if cannot produce values: the missing
                // else branch would not.
                if frame.kind == FrameKind::If && !frame.end_types.is_empty() {
                    return Err(type_error("if without else cannot have a result"));
                }
                self.push_vals(&frame.end_types);
            }
            I::Br(depth) => {
                let types = self.label(*depth)?.label_types().to_vec();
                self.pop_expects(&types)?;
                self.set_unreachable()?;
            }
            I::BrIf(depth) => {
                self.pop_expect(I32)?;
                let types = self.label(*depth)?.label_types().to_vec();
                self.pop_expects(&types)?;
                self.push_vals(&types);
            }
            I::BrTable { targets, default } => {
                self.pop_expect(I32)?;
                let default_types = self.label(*default)?.label_types().to_vec();
                for target in targets {
                    let types = self.label(*target)?.label_types();
                    if types != default_types.as_slice() {
                        return Err(type_error("br_table arity mismatch"));
                    }
                }
                self.pop_expects(&default_types)?;
                self.set_unreachable()?;
            }
            I::Return => {
                let results = self.results.clone();
                self.pop_expects(&results)?;
                self.set_unreachable()?;
            }
            I::Call(func_index) => {
                let ty = self.ctx.func_type(*func_index).cloned().ok_or_else(|| {
                    Error::validation_error(
                        codes::UNKNOWN_FUNC_INDEX,
                        "call target out of range",
                    )
                })?;
                self.pop_expects(&ty.params)?;
                self.push_vals(&ty.results);
            }
            I::CallIndirect {
                type_index,
                table_index,
            } => {
                if (*table_index as usize) >= self.ctx.tables.len() {
                    return Err(Error::validation_error(
                        codes::UNKNOWN_TABLE_INDEX,
                        "call_indirect without a table",
                    ));
                }
                let ty = self
                    .ctx
                    .module
                    .types
                    .get(*type_index as usize)
                    .cloned()
                    .ok_or_else(|| {
                        Error::validation_error(
                            codes::UNKNOWN_TYPE_INDEX,
                            "call_indirect type out of range",
                        )
                    })?;
                self.pop_expect(I32)?;
                self.pop_expects(&ty.params)?;
                self.push_vals(&ty.results);
            }
            I::Drop => {
                self.pop_any()?;
            }
            I::Select => {
                self.pop_expect(I32)?;
                let first = self.pop_any()?;
                let second = self.pop_any()?;
                match (first, second) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(type_error("select operands differ"))
                    }
                    (Some(ty), _) | (_, Some(ty)) => self.push_val(ty),
                    (None, None) => self.vals.push(None),
                }
            }
            I::LocalGet(index) => {
                let ty = self.local(*index)?;
                self.push_val(ty);
            }
            I::LocalSet(index) => {
                let ty = self.local(*index)?;
                self.pop_expect(ty)?;
            }
            I::LocalTee(index) => {
                let ty = self.local(*index)?;
                self.pop_expect(ty)?;
                self.push_val(ty);
            }
            I::GlobalGet(index) => {
                let global = self.global(*index)?;
                self.push_val(global.value_type);
            }
            I::GlobalSet(index) => {
                let global = self.global(*index)?;
                if global.mutability == Mutability::Const {
                    return Err(Error::validation_error(
                        codes::IMMUTABLE_GLOBAL_STORE,
                        "cannot write an immutable global",
                    ));
                }
                self.pop_expect(global.value_type)?;
            }
            I::I32Load(m) => self.load(*m, 4, I32)?,
            I::I64Load(m) => self.load(*m, 8, I64)?,
            I::F32Load(m) => self.load(*m, 4, F32)?,
            I::F64Load(m) => self.load(*m, 8, F64)?,
            I::I32Load8S(m) | I::I32Load8U(m) => self.load(*m, 1, I32)?,
            I::I32Load16S(m) | I::I32Load16U(m) => self.load(*m, 2, I32)?,
            I::I64Load8S(m) | I::I64Load8U(m) => self.load(*m, 1, I64)?,
            I::I64Load16S(m) | I::I64Load16U(m) => self.load(*m, 2, I64)?,
            I::I64Load32S(m) | I::I64Load32U(m) => self.load(*m, 4, I64)?,
            I::I32Store(m) => self.store(*m, 4, I32)?,
            I::I64Store(m) => self.store(*m, 8, I64)?,
            I::F32Store(m) => self.store(*m, 4, F32)?,
            I::F64Store(m) => self.store(*m, 8, F64)?,
            I::I32Store8(m) => self.store(*m, 1, I32)?,
            I::I32Store16(m) => self.store(*m, 2, I32)?,
            I::I64Store8(m) => self.store(*m, 1, I64)?,
            I::I64Store16(m) => self.store(*m, 2, I64)?,
            I::I64Store32(m) => self.store(*m, 4, I64)?,
            I::MemorySize => {
                self.require_memory()?;
                self.push_val(I32);
            }
            I::MemoryGrow => {
                self.require_memory()?;
                self.pop_expect(I32)?;
                self.push_val(I32);
            }
            I::I32Const(_) => self.push_val(I32),
            I::I64Const(_) => self.push_val(I64),
            I::F32Const(_) => self.push_val(F32),
            I::F64Const(_) => self.push_val(F64),
            I::I32Eqz => self.testop(I32)?,
            I::I32Eq | I::I32Ne | I::I32LtS | I::I32LtU | I::I32GtS | I::I32GtU | I::I32LeS
            | I::I32LeU | I::I32GeS | I::I32GeU => self.relop(I32)?,
            I::I64Eqz => self.testop(I64)?,
            I::I64Eq | I::I64Ne | I::I64LtS | I::I64LtU | I::I64GtS | I::I64GtU | I::I64LeS
            | I::I64LeU | I::I64GeS | I::I64GeU => self.relop(I64)?,
            I::F32Eq | I::F32Ne | I::F32Lt | I::F32Gt | I::F32Le | I::F32Ge => self.relop(F32)?,
            I::F64Eq | I::F64Ne | I::F64Lt | I::F64Gt | I::F64Le | I::F64Ge => self.relop(F64)?,
            I::I32Clz | I::I32Ctz | I::I32Popcnt | I::I32Extend8S | I::I32Extend16S => {
                self.unop(I32)?;
            }
            I::I32Add | I::I32Sub | I::I32Mul | I::I32DivS | I::I32DivU | I::I32RemS
            | I::I32RemU | I::I32And | I::I32Or | I::I32Xor | I::I32Shl | I::I32ShrS
            | I::I32ShrU | I::I32Rotl | I::I32Rotr => self.binop(I32)?,
            I::I64Clz | I::I64Ctz | I::I64Popcnt | I::I64Extend8S | I::I64Extend16S
            | I::I64Extend32S => self.unop(I64)?,
            I::I64Add | I::I64Sub | I::I64Mul | I::I64DivS | I::I64DivU | I::I64RemS
            | I::I64RemU | I::I64And | I::I64Or | I::I64Xor | I::I64Shl | I::I64ShrS
            | I::I64ShrU | I::I64Rotl | I::I64Rotr => self.binop(I64)?,
            I::F32Abs | I::F32Neg | I::F32Ceil | I::F32Floor | I::F32Trunc | I::F32Nearest
            | I::F32Sqrt => self.unop(F32)?,
            I::F32Add | I::F32Sub | I::F32Mul | I::F32Div | I::F32Min | I::F32Max
            | I::F32Copysign => self.binop(F32)?,
            I::F64Abs | I::F64Neg | I::F64Ceil | I::F64Floor | I::F64Trunc | I::F64Nearest
            | I::F64Sqrt => self.unop(F64)?,
            I::F64Add | I::F64Sub | I::F64Mul | I::F64Div | I::F64Min | I::F64Max
            | I::F64Copysign => self.binop(F64)?,
            I::I32WrapI64 => self.cvtop(I64, I32)?,
            I::I32TruncF32S | I::I32TruncF32U | I::I32TruncSatF32S | I::I32TruncSatF32U => {
                self.cvtop(F32, I32)?;
            }
            I::I32TruncF64S | I::I32TruncF64U | I::I32TruncSatF64S | I::I32TruncSatF64U => {
                self.cvtop(F64, I32)?;
            }
            I::I64ExtendI32S | I::I64ExtendI32U => self.cvtop(I32, I64)?,
            I::I64TruncF32S | I::I64TruncF32U | I::I64TruncSatF32S | I::I64TruncSatF32U => {
                self.cvtop(F32, I64)?;
            }
            I::I64TruncF64S | I::I64TruncF64U | I::I64TruncSatF64S | I::I64TruncSatF64U => {
                self.cvtop(F64, I64)?;
            }
            I::F32ConvertI32S | I::F32ConvertI32U => self.cvtop(I32, F32)?,
            I::F32ConvertI64S | I::F32ConvertI64U => self.cvtop(I64, F32)?,
            I::F32DemoteF64 => self.cvtop(F64, F32)?,
            I::F64ConvertI32S | I::F64ConvertI32U => self.cvtop(I32, F64)?,
            I::F64ConvertI64S | I::F64ConvertI64U => self.cvtop(I64, F64)?,
            I::F64PromoteF32 => self.cvtop(F32, F64)?,
            I::I32ReinterpretF32 => self.cvtop(F32, I32)?,
            I::I64ReinterpretF64 => self.cvtop(F64, I64)?,
            I::F32ReinterpretI32 => self.cvtop(I32, F32)?,
            I::F64ReinterpretI64 => self.cvtop(I64, F64)?,
        }
        Ok(())
    }
}

fn type_error(message: &'static str) -> Error {
    Error::validation_error(codes::TYPE_MISMATCH, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::decode_module;

    fn check(source: &str) -> Result<()> {
        let bytes = wat::parse_str(source).unwrap();
        let module = decode_module(&bytes).unwrap();
        validate_module(&module)
    }

    #[test]
    fn accepts_simple_function() {
        check(
            r#"(module
                (func (export "add") (param i32 i32) (result i32)
                    local.get 0
                    local.get 1
                    i32.add))"#,
        )
        .unwrap();
    }

    #[test]
    fn accepts_control_flow() {
        check(
            r#"(module
                (func (param i32) (result i32)
                    (local i32)
                    (block $exit
                        (loop $top
                            local.get 0
                            i32.eqz
                            br_if $exit
                            (local.set 0 (i32.sub (local.get 0) (i32.const 1)))
                            (local.set 1 (i32.add (local.get 1) (i32.const 1)))
                            br $top))
                    local.get 1))"#,
        )
        .unwrap();
    }

    #[test]
    fn accepts_unreachable_polymorphism() {
        check(
            r#"(module
                (func (result i32)
                    unreachable
                    i32.add))"#,
        )
        .unwrap();
    }

    // wat itself refuses to emit most invalid modules, so the negative
    // cases are built from hand-rolled ASTs.

    fn minimal_module_with_body(
        results: Vec<ValueType>,
        instructions: Vec<Instruction>,
    ) -> Module {
        let mut module = Module::new();
        module
            .types
            .push(wvm_types::FuncType::new(Vec::new(), results));
        module.functions.push(0);
        module.code.push(wvm_format::CodeBody {
            locals: Vec::new(),
            instructions,
        });
        module
    }

    #[test]
    fn rejects_type_mismatch() {
        let module = minimal_module_with_body(
            crate::prelude::vec![ValueType::I32],
            crate::prelude::vec![
                Instruction::I64Const(1),
                Instruction::End,
            ],
        );
        let failure = validate_module_detailed(&module).unwrap_err();
        assert_eq!(failure.error.code, codes::TYPE_MISMATCH);
        assert_eq!(failure.func_index, Some(0));
    }

    #[test]
    fn rejects_stack_underflow() {
        let module = minimal_module_with_body(
            crate::prelude::vec![ValueType::I32],
            crate::prelude::vec![Instruction::I32Add, Instruction::End],
        );
        let failure = validate_module_detailed(&module).unwrap_err();
        assert_eq!(failure.error.code, codes::TYPE_MISMATCH);
        assert_eq!(failure.instr_index, Some(0));
    }

    #[test]
    fn rejects_bad_label_depth() {
        let module = minimal_module_with_body(
            Vec::new(),
            crate::prelude::vec![Instruction::Br(3), Instruction::End],
        );
        let failure = validate_module_detailed(&module).unwrap_err();
        assert_eq!(failure.error.code, codes::UNKNOWN_LABEL);
    }

    #[test]
    fn rejects_immutable_global_store() {
        let mut module = minimal_module_with_body(
            Vec::new(),
            crate::prelude::vec![
                Instruction::I32Const(1),
                Instruction::GlobalSet(0),
                Instruction::End,
            ],
        );
        module.globals.push(wvm_format::Global {
            ty: GlobalType {
                value_type: ValueType::I32,
                mutability: Mutability::Const,
            },
            init: crate::prelude::vec![Instruction::I32Const(0), Instruction::End],
        });
        let err = validate_module(&module).unwrap_err();
        assert_eq!(err.code, codes::IMMUTABLE_GLOBAL_STORE);
    }

    #[test]
    fn rejects_duplicate_export() {
        let mut module = minimal_module_with_body(
            Vec::new(),
            crate::prelude::vec![Instruction::End],
        );
        for _ in 0..2 {
            module.exports.push(wvm_format::Export {
                name: crate::prelude::String::from("f"),
                kind: ExternKind::Func,
                index: 0,
                symbol: None,
            });
        }
        let err = validate_module(&module).unwrap_err();
        assert_eq!(err.code, codes::DUPLICATE_EXPORT);
    }

    #[test]
    fn rejects_bad_start_type() {
        let mut module = minimal_module_with_body(
            crate::prelude::vec![ValueType::I32],
            crate::prelude::vec![Instruction::I32Const(0), Instruction::End],
        );
        module.start = Some(0);
        let err = validate_module(&module).unwrap_err();
        assert_eq!(err.code, codes::INVALID_START_TYPE);
    }

    #[test]
    fn rejects_global_init_reading_local_global() {
        let mut module = Module::new();
        module.globals.push(wvm_format::Global {
            ty: GlobalType {
                value_type: ValueType::I32,
                mutability: Mutability::Const,
            },
            init: crate::prelude::vec![Instruction::GlobalGet(0), Instruction::End],
        });
        let err = validate_module(&module).unwrap_err();
        assert_eq!(err.code, codes::GLOBAL_INIT_REFS_NON_IMPORT);
    }

    #[test]
    fn rejects_misaligned_access() {
        let mut module = minimal_module_with_body(
            crate::prelude::vec![ValueType::I32],
            crate::prelude::vec![
                Instruction::I32Const(0),
                Instruction::I32Load(MemArg {
                    align: 3,
                    offset: 0,
                }),
                Instruction::End,
            ],
        );
        module.memories.push(MemoryType {
            limits: wvm_types::Limits::at_least(1),
        });
        let err = validate_module(&module).unwrap_err();
        assert_eq!(err.code, codes::INVALID_ALIGNMENT);
    }
}
