//! Re-emission of a decoded module as canonical bytes.
//!
//! The encoder is the inverse of the decoder over canonical input:
//! minimal-length LEBs, sections in canonical order, empty sections
//! omitted, and custom sections reproduced at their recorded
//! positions. A module decoded from a canonical binary re-encodes to
//! the same bytes, which is what the round-trip tests check.

use wvm_types::{BlockType, Mutability, ValueType};

use crate::binary::{self, value_type_to_byte, write_leb128_i32, write_leb128_i64, write_leb128_u32, write_name};
use crate::instructions::{Instruction, MemArg};
use crate::module::{
    CodeBody, DataSegment, ElementSegment, Export, Global, Import, ImportDesc, Module, SegmentMode,
};
use crate::prelude::Vec;

/// Encode a module to canonical binary form.
#[must_use]
pub fn encode_module(module: &Module) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&binary::WASM_MAGIC);
    out.extend_from_slice(&binary::WASM_VERSION);

    emit_customs(&mut out, module, 0);

    if !module.types.is_empty() {
        let mut content = write_leb128_u32(module.types.len() as u32);
        for ty in &module.types {
            content.push(binary::FUNC_TYPE_TAG);
            content.extend(encode_result_types(&ty.params));
            content.extend(encode_result_types(&ty.results));
        }
        emit_section(&mut out, binary::TYPE_SECTION_ID, &content);
        emit_customs(&mut out, module, binary::TYPE_SECTION_ID);
    }

    if !module.imports.is_empty() {
        let mut content = write_leb128_u32(module.imports.len() as u32);
        for import in &module.imports {
            content.extend(encode_import(import));
        }
        emit_section(&mut out, binary::IMPORT_SECTION_ID, &content);
        emit_customs(&mut out, module, binary::IMPORT_SECTION_ID);
    }

    if !module.functions.is_empty() {
        let mut content = write_leb128_u32(module.functions.len() as u32);
        for type_idx in &module.functions {
            content.extend(write_leb128_u32(*type_idx));
        }
        emit_section(&mut out, binary::FUNCTION_SECTION_ID, &content);
        emit_customs(&mut out, module, binary::FUNCTION_SECTION_ID);
    }

    if !module.tables.is_empty() {
        let mut content = write_leb128_u32(module.tables.len() as u32);
        for table in &module.tables {
            content.push(binary::FUNCREF_TYPE);
            content.extend(encode_limits(table.limits.min, table.limits.max));
        }
        emit_section(&mut out, binary::TABLE_SECTION_ID, &content);
        emit_customs(&mut out, module, binary::TABLE_SECTION_ID);
    }

    if !module.memories.is_empty() {
        let mut content = write_leb128_u32(module.memories.len() as u32);
        for memory in &module.memories {
            content.extend(encode_limits(memory.limits.min, memory.limits.max));
        }
        emit_section(&mut out, binary::MEMORY_SECTION_ID, &content);
        emit_customs(&mut out, module, binary::MEMORY_SECTION_ID);
    }

    if !module.globals.is_empty() {
        let mut content = write_leb128_u32(module.globals.len() as u32);
        for global in &module.globals {
            content.extend(encode_global(global));
        }
        emit_section(&mut out, binary::GLOBAL_SECTION_ID, &content);
        emit_customs(&mut out, module, binary::GLOBAL_SECTION_ID);
    }

    if !module.exports.is_empty() {
        let mut content = write_leb128_u32(module.exports.len() as u32);
        for export in &module.exports {
            content.extend(encode_export(export));
        }
        emit_section(&mut out, binary::EXPORT_SECTION_ID, &content);
        emit_customs(&mut out, module, binary::EXPORT_SECTION_ID);
    }

    if let Some(start) = module.start {
        let content = write_leb128_u32(start);
        emit_section(&mut out, binary::START_SECTION_ID, &content);
        emit_customs(&mut out, module, binary::START_SECTION_ID);
    }

    if !module.elements.is_empty() {
        let mut content = write_leb128_u32(module.elements.len() as u32);
        for element in &module.elements {
            content.extend(encode_element(element));
        }
        emit_section(&mut out, binary::ELEMENT_SECTION_ID, &content);
        emit_customs(&mut out, module, binary::ELEMENT_SECTION_ID);
    }

    if let Some(count) = module.data_count {
        let content = write_leb128_u32(count);
        emit_section(&mut out, binary::DATA_COUNT_SECTION_ID, &content);
        emit_customs(&mut out, module, binary::DATA_COUNT_SECTION_ID);
    }

    if !module.code.is_empty() {
        let mut content = write_leb128_u32(module.code.len() as u32);
        for body in &module.code {
            content.extend(encode_code_body(body));
        }
        emit_section(&mut out, binary::CODE_SECTION_ID, &content);
        emit_customs(&mut out, module, binary::CODE_SECTION_ID);
    }

    if !module.data.is_empty() {
        let mut content = write_leb128_u32(module.data.len() as u32);
        for data in &module.data {
            content.extend(encode_data(data));
        }
        emit_section(&mut out, binary::DATA_SECTION_ID, &content);
        emit_customs(&mut out, module, binary::DATA_SECTION_ID);
    }

    out
}

fn emit_section(out: &mut Vec<u8>, id: u8, content: &[u8]) {
    out.push(id);
    out.extend(write_leb128_u32(content.len() as u32));
    out.extend_from_slice(content);
}

fn emit_customs(out: &mut Vec<u8>, module: &Module, placement: u8) {
    for custom in &module.custom_sections {
        if custom.placement == placement {
            let mut content = write_name(&custom.name);
            content.extend_from_slice(&custom.data);
            emit_section(out, binary::CUSTOM_SECTION_ID, &content);
        }
    }
}

fn encode_result_types(types: &[ValueType]) -> Vec<u8> {
    let mut out = write_leb128_u32(types.len() as u32);
    out.extend(types.iter().map(|&t| value_type_to_byte(t)));
    out
}

fn encode_limits(min: u32, max: Option<u32>) -> Vec<u8> {
    let mut out = Vec::new();
    match max {
        Some(max) => {
            out.push(binary::LIMITS_MIN_MAX);
            out.extend(write_leb128_u32(min));
            out.extend(write_leb128_u32(max));
        }
        None => {
            out.push(binary::LIMITS_MIN_ONLY);
            out.extend(write_leb128_u32(min));
        }
    }
    out
}

fn encode_import(import: &Import) -> Vec<u8> {
    let mut out = write_name(&import.module);
    out.extend(write_name(&import.field));
    match &import.desc {
        ImportDesc::Func(type_idx) => {
            out.push(binary::EXTERNAL_KIND_FUNC);
            out.extend(write_leb128_u32(*type_idx));
        }
        ImportDesc::Table(table) => {
            out.push(binary::EXTERNAL_KIND_TABLE);
            out.push(binary::FUNCREF_TYPE);
            out.extend(encode_limits(table.limits.min, table.limits.max));
        }
        ImportDesc::Memory(memory) => {
            out.push(binary::EXTERNAL_KIND_MEMORY);
            out.extend(encode_limits(memory.limits.min, memory.limits.max));
        }
        ImportDesc::Global(global) => {
            out.push(binary::EXTERNAL_KIND_GLOBAL);
            out.push(value_type_to_byte(global.value_type));
            out.push(mutability_byte(global.mutability));
        }
    }
    out
}

fn encode_export(export: &Export) -> Vec<u8> {
    let mut out = write_name(&export.name);
    out.push(match export.kind {
        wvm_types::ExternKind::Func => binary::EXTERNAL_KIND_FUNC,
        wvm_types::ExternKind::Table => binary::EXTERNAL_KIND_TABLE,
        wvm_types::ExternKind::Memory => binary::EXTERNAL_KIND_MEMORY,
        wvm_types::ExternKind::Global => binary::EXTERNAL_KIND_GLOBAL,
    });
    out.extend(write_leb128_u32(export.index));
    out
}

fn encode_global(global: &Global) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(value_type_to_byte(global.ty.value_type));
    out.push(mutability_byte(global.ty.mutability));
    out.extend(encode_expression(&global.init));
    out
}

fn encode_element(element: &ElementSegment) -> Vec<u8> {
    let mut out = Vec::new();
    match &element.mode {
        SegmentMode::Active { index: 0, offset } => {
            out.extend(write_leb128_u32(0));
            out.extend(encode_expression(offset));
        }
        SegmentMode::Active { index, offset } => {
            out.extend(write_leb128_u32(2));
            out.extend(write_leb128_u32(*index));
            out.extend(encode_expression(offset));
            out.push(0x00); // elemkind: funcref
        }
        SegmentMode::Passive => {
            out.extend(write_leb128_u32(1));
            out.push(0x00);
        }
        SegmentMode::Declared => {
            out.extend(write_leb128_u32(3));
            out.push(0x00);
        }
    }
    out.extend(write_leb128_u32(element.items.len() as u32));
    for item in &element.items {
        out.extend(write_leb128_u32(*item));
    }
    out
}

fn encode_data(data: &DataSegment) -> Vec<u8> {
    let mut out = Vec::new();
    match &data.mode {
        SegmentMode::Active { index: 0, offset } => {
            out.extend(write_leb128_u32(0));
            out.extend(encode_expression(offset));
        }
        SegmentMode::Active { index, offset } => {
            out.extend(write_leb128_u32(2));
            out.extend(write_leb128_u32(*index));
            out.extend(encode_expression(offset));
        }
        SegmentMode::Passive | SegmentMode::Declared => {
            out.extend(write_leb128_u32(1));
        }
    }
    out.extend(write_leb128_u32(data.bytes.len() as u32));
    out.extend_from_slice(&data.bytes);
    out
}

fn encode_code_body(body: &CodeBody) -> Vec<u8> {
    // Re-compress the expanded locals into (count, type) runs.
    let mut runs: Vec<(u32, ValueType)> = Vec::new();
    for &local in &body.locals {
        match runs.last_mut() {
            Some((count, ty)) if *ty == local => *count += 1,
            _ => runs.push((1, local)),
        }
    }

    let mut inner = write_leb128_u32(runs.len() as u32);
    for (count, ty) in runs {
        inner.extend(write_leb128_u32(count));
        inner.push(value_type_to_byte(ty));
    }
    for instruction in &body.instructions {
        encode_instruction(&mut inner, instruction);
    }

    let mut out = write_leb128_u32(inner.len() as u32);
    out.extend(inner);
    out
}

/// Encode an `end`-terminated expression.
fn encode_expression(instructions: &[Instruction]) -> Vec<u8> {
    let mut out = Vec::new();
    for instruction in instructions {
        encode_instruction(&mut out, instruction);
    }
    out
}

fn mutability_byte(mutability: Mutability) -> u8 {
    match mutability {
        Mutability::Const => binary::MUTABILITY_CONST,
        Mutability::Var => binary::MUTABILITY_VAR,
    }
}

fn block_type_byte(block_type: BlockType) -> u8 {
    match block_type {
        BlockType::Empty => binary::EMPTY_BLOCK_TYPE,
        BlockType::Value(ty) => value_type_to_byte(ty),
    }
}

fn encode_mem_arg(out: &mut Vec<u8>, mem_arg: MemArg) {
    out.extend(write_leb128_u32(mem_arg.align));
    out.extend(write_leb128_u32(mem_arg.offset));
}

#[allow(clippy::too_many_lines)]
fn encode_instruction(out: &mut Vec<u8>, instruction: &Instruction) {
    use Instruction as I;
    match instruction {
        I::Unreachable => out.push(binary::UNREACHABLE),
        I::Nop => out.push(binary::NOP),
        I::Block { block_type, .. } => {
            out.push(binary::BLOCK);
            out.push(block_type_byte(*block_type));
        }
        I::Loop { block_type } => {
            out.push(binary::LOOP);
            out.push(block_type_byte(*block_type));
        }
        I::If { block_type, .. } => {
            out.push(binary::IF);
            out.push(block_type_byte(*block_type));
        }
        I::Else { .. } => out.push(binary::ELSE),
        I::End => out.push(binary::END),
        I::Br(depth) => {
            out.push(binary::BR);
            out.extend(write_leb128_u32(*depth));
        }
        I::BrIf(depth) => {
            out.push(binary::BR_IF);
            out.extend(write_leb128_u32(*depth));
        }
        I::BrTable { targets, default } => {
            out.push(binary::BR_TABLE);
            out.extend(write_leb128_u32(targets.len() as u32));
            for target in targets {
                out.extend(write_leb128_u32(*target));
            }
            out.extend(write_leb128_u32(*default));
        }
        I::Return => out.push(binary::RETURN),
        I::Call(func_idx) => {
            out.push(binary::CALL);
            out.extend(write_leb128_u32(*func_idx));
        }
        I::CallIndirect {
            type_index,
            table_index,
        } => {
            out.push(binary::CALL_INDIRECT);
            out.extend(write_leb128_u32(*type_index));
            out.extend(write_leb128_u32(*table_index));
        }
        I::Drop => out.push(binary::DROP),
        I::Select => out.push(binary::SELECT),
        I::LocalGet(idx) => {
            out.push(binary::LOCAL_GET);
            out.extend(write_leb128_u32(*idx));
        }
        I::LocalSet(idx) => {
            out.push(binary::LOCAL_SET);
            out.extend(write_leb128_u32(*idx));
        }
        I::LocalTee(idx) => {
            out.push(binary::LOCAL_TEE);
            out.extend(write_leb128_u32(*idx));
        }
        I::GlobalGet(idx) => {
            out.push(binary::GLOBAL_GET);
            out.extend(write_leb128_u32(*idx));
        }
        I::GlobalSet(idx) => {
            out.push(binary::GLOBAL_SET);
            out.extend(write_leb128_u32(*idx));
        }
        I::I32Load(m) => {
            out.push(binary::I32_LOAD);
            encode_mem_arg(out, *m);
        }
        I::I64Load(m) => {
            out.push(binary::I64_LOAD);
            encode_mem_arg(out, *m);
        }
        I::F32Load(m) => {
            out.push(binary::F32_LOAD);
            encode_mem_arg(out, *m);
        }
        I::F64Load(m) => {
            out.push(binary::F64_LOAD);
            encode_mem_arg(out, *m);
        }
        I::I32Load8S(m) => {
            out.push(binary::I32_LOAD8_S);
            encode_mem_arg(out, *m);
        }
        I::I32Load8U(m) => {
            out.push(binary::I32_LOAD8_U);
            encode_mem_arg(out, *m);
        }
        I::I32Load16S(m) => {
            out.push(binary::I32_LOAD16_S);
            encode_mem_arg(out, *m);
        }
        I::I32Load16U(m) => {
            out.push(binary::I32_LOAD16_U);
            encode_mem_arg(out, *m);
        }
        I::I64Load8S(m) => {
            out.push(binary::I64_LOAD8_S);
            encode_mem_arg(out, *m);
        }
        I::I64Load8U(m) => {
            out.push(binary::I64_LOAD8_U);
            encode_mem_arg(out, *m);
        }
        I::I64Load16S(m) => {
            out.push(binary::I64_LOAD16_S);
            encode_mem_arg(out, *m);
        }
        I::I64Load16U(m) => {
            out.push(binary::I64_LOAD16_U);
            encode_mem_arg(out, *m);
        }
        I::I64Load32S(m) => {
            out.push(binary::I64_LOAD32_S);
            encode_mem_arg(out, *m);
        }
        I::I64Load32U(m) => {
            out.push(binary::I64_LOAD32_U);
            encode_mem_arg(out, *m);
        }
        I::I32Store(m) => {
            out.push(binary::I32_STORE);
            encode_mem_arg(out, *m);
        }
        I::I64Store(m) => {
            out.push(binary::I64_STORE);
            encode_mem_arg(out, *m);
        }
        I::F32Store(m) => {
            out.push(binary::F32_STORE);
            encode_mem_arg(out, *m);
        }
        I::F64Store(m) => {
            out.push(binary::F64_STORE);
            encode_mem_arg(out, *m);
        }
        I::I32Store8(m) => {
            out.push(binary::I32_STORE8);
            encode_mem_arg(out, *m);
        }
        I::I32Store16(m) => {
            out.push(binary::I32_STORE16);
            encode_mem_arg(out, *m);
        }
        I::I64Store8(m) => {
            out.push(binary::I64_STORE8);
            encode_mem_arg(out, *m);
        }
        I::I64Store16(m) => {
            out.push(binary::I64_STORE16);
            encode_mem_arg(out, *m);
        }
        I::I64Store32(m) => {
            out.push(binary::I64_STORE32);
            encode_mem_arg(out, *m);
        }
        I::MemorySize => {
            out.push(binary::MEMORY_SIZE);
            out.push(0x00);
        }
        I::MemoryGrow => {
            out.push(binary::MEMORY_GROW);
            out.push(0x00);
        }
        I::I32Const(v) => {
            out.push(binary::I32_CONST);
            out.extend(write_leb128_i32(*v));
        }
        I::I64Const(v) => {
            out.push(binary::I64_CONST);
            out.extend(write_leb128_i64(*v));
        }
        I::F32Const(v) => {
            out.push(binary::F32_CONST);
            out.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        I::F64Const(v) => {
            out.push(binary::F64_CONST);
            out.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        I::I32Eqz => out.push(binary::I32_EQZ),
        I::I32Eq => out.push(binary::I32_EQ),
        I::I32Ne => out.push(binary::I32_NE),
        I::I32LtS => out.push(binary::I32_LT_S),
        I::I32LtU => out.push(binary::I32_LT_U),
        I::I32GtS => out.push(binary::I32_GT_S),
        I::I32GtU => out.push(binary::I32_GT_U),
        I::I32LeS => out.push(binary::I32_LE_S),
        I::I32LeU => out.push(binary::I32_LE_U),
        I::I32GeS => out.push(binary::I32_GE_S),
        I::I32GeU => out.push(binary::I32_GE_U),
        I::I64Eqz => out.push(binary::I64_EQZ),
        I::I64Eq => out.push(binary::I64_EQ),
        I::I64Ne => out.push(binary::I64_NE),
        I::I64LtS => out.push(binary::I64_LT_S),
        I::I64LtU => out.push(binary::I64_LT_U),
        I::I64GtS => out.push(binary::I64_GT_S),
        I::I64GtU => out.push(binary::I64_GT_U),
        I::I64LeS => out.push(binary::I64_LE_S),
        I::I64LeU => out.push(binary::I64_LE_U),
        I::I64GeS => out.push(binary::I64_GE_S),
        I::I64GeU => out.push(binary::I64_GE_U),
        I::F32Eq => out.push(binary::F32_EQ),
        I::F32Ne => out.push(binary::F32_NE),
        I::F32Lt => out.push(binary::F32_LT),
        I::F32Gt => out.push(binary::F32_GT),
        I::F32Le => out.push(binary::F32_LE),
        I::F32Ge => out.push(binary::F32_GE),
        I::F64Eq => out.push(binary::F64_EQ),
        I::F64Ne => out.push(binary::F64_NE),
        I::F64Lt => out.push(binary::F64_LT),
        I::F64Gt => out.push(binary::F64_GT),
        I::F64Le => out.push(binary::F64_LE),
        I::F64Ge => out.push(binary::F64_GE),
        I::I32Clz => out.push(binary::I32_CLZ),
        I::I32Ctz => out.push(binary::I32_CTZ),
        I::I32Popcnt => out.push(binary::I32_POPCNT),
        I::I32Add => out.push(binary::I32_ADD),
        I::I32Sub => out.push(binary::I32_SUB),
        I::I32Mul => out.push(binary::I32_MUL),
        I::I32DivS => out.push(binary::I32_DIV_S),
        I::I32DivU => out.push(binary::I32_DIV_U),
        I::I32RemS => out.push(binary::I32_REM_S),
        I::I32RemU => out.push(binary::I32_REM_U),
        I::I32And => out.push(binary::I32_AND),
        I::I32Or => out.push(binary::I32_OR),
        I::I32Xor => out.push(binary::I32_XOR),
        I::I32Shl => out.push(binary::I32_SHL),
        I::I32ShrS => out.push(binary::I32_SHR_S),
        I::I32ShrU => out.push(binary::I32_SHR_U),
        I::I32Rotl => out.push(binary::I32_ROTL),
        I::I32Rotr => out.push(binary::I32_ROTR),
        I::I64Clz => out.push(binary::I64_CLZ),
        I::I64Ctz => out.push(binary::I64_CTZ),
        I::I64Popcnt => out.push(binary::I64_POPCNT),
        I::I64Add => out.push(binary::I64_ADD),
        I::I64Sub => out.push(binary::I64_SUB),
        I::I64Mul => out.push(binary::I64_MUL),
        I::I64DivS => out.push(binary::I64_DIV_S),
        I::I64DivU => out.push(binary::I64_DIV_U),
        I::I64RemS => out.push(binary::I64_REM_S),
        I::I64RemU => out.push(binary::I64_REM_U),
        I::I64And => out.push(binary::I64_AND),
        I::I64Or => out.push(binary::I64_OR),
        I::I64Xor => out.push(binary::I64_XOR),
        I::I64Shl => out.push(binary::I64_SHL),
        I::I64ShrS => out.push(binary::I64_SHR_S),
        I::I64ShrU => out.push(binary::I64_SHR_U),
        I::I64Rotl => out.push(binary::I64_ROTL),
        I::I64Rotr => out.push(binary::I64_ROTR),
        I::F32Abs => out.push(binary::F32_ABS),
        I::F32Neg => out.push(binary::F32_NEG),
        I::F32Ceil => out.push(binary::F32_CEIL),
        I::F32Floor => out.push(binary::F32_FLOOR),
        I::F32Trunc => out.push(binary::F32_TRUNC),
        I::F32Nearest => out.push(binary::F32_NEAREST),
        I::F32Sqrt => out.push(binary::F32_SQRT),
        I::F32Add => out.push(binary::F32_ADD),
        I::F32Sub => out.push(binary::F32_SUB),
        I::F32Mul => out.push(binary::F32_MUL),
        I::F32Div => out.push(binary::F32_DIV),
        I::F32Min => out.push(binary::F32_MIN),
        I::F32Max => out.push(binary::F32_MAX),
        I::F32Copysign => out.push(binary::F32_COPYSIGN),
        I::F64Abs => out.push(binary::F64_ABS),
        I::F64Neg => out.push(binary::F64_NEG),
        I::F64Ceil => out.push(binary::F64_CEIL),
        I::F64Floor => out.push(binary::F64_FLOOR),
        I::F64Trunc => out.push(binary::F64_TRUNC),
        I::F64Nearest => out.push(binary::F64_NEAREST),
        I::F64Sqrt => out.push(binary::F64_SQRT),
        I::F64Add => out.push(binary::F64_ADD),
        I::F64Sub => out.push(binary::F64_SUB),
        I::F64Mul => out.push(binary::F64_MUL),
        I::F64Div => out.push(binary::F64_DIV),
        I::F64Min => out.push(binary::F64_MIN),
        I::F64Max => out.push(binary::F64_MAX),
        I::F64Copysign => out.push(binary::F64_COPYSIGN),
        I::I32WrapI64 => out.push(binary::I32_WRAP_I64),
        I::I32TruncF32S => out.push(binary::I32_TRUNC_F32_S),
        I::I32TruncF32U => out.push(binary::I32_TRUNC_F32_U),
        I::I32TruncF64S => out.push(binary::I32_TRUNC_F64_S),
        I::I32TruncF64U => out.push(binary::I32_TRUNC_F64_U),
        I::I64ExtendI32S => out.push(binary::I64_EXTEND_I32_S),
        I::I64ExtendI32U => out.push(binary::I64_EXTEND_I32_U),
        I::I64TruncF32S => out.push(binary::I64_TRUNC_F32_S),
        I::I64TruncF32U => out.push(binary::I64_TRUNC_F32_U),
        I::I64TruncF64S => out.push(binary::I64_TRUNC_F64_S),
        I::I64TruncF64U => out.push(binary::I64_TRUNC_F64_U),
        I::F32ConvertI32S => out.push(binary::F32_CONVERT_I32_S),
        I::F32ConvertI32U => out.push(binary::F32_CONVERT_I32_U),
        I::F32ConvertI64S => out.push(binary::F32_CONVERT_I64_S),
        I::F32ConvertI64U => out.push(binary::F32_CONVERT_I64_U),
        I::F32DemoteF64 => out.push(binary::F32_DEMOTE_F64),
        I::F64ConvertI32S => out.push(binary::F64_CONVERT_I32_S),
        I::F64ConvertI32U => out.push(binary::F64_CONVERT_I32_U),
        I::F64ConvertI64S => out.push(binary::F64_CONVERT_I64_S),
        I::F64ConvertI64U => out.push(binary::F64_CONVERT_I64_U),
        I::F64PromoteF32 => out.push(binary::F64_PROMOTE_F32),
        I::I32ReinterpretF32 => out.push(binary::I32_REINTERPRET_F32),
        I::I64ReinterpretF64 => out.push(binary::I64_REINTERPRET_F64),
        I::F32ReinterpretI32 => out.push(binary::F32_REINTERPRET_I32),
        I::F64ReinterpretI64 => out.push(binary::F64_REINTERPRET_I64),
        I::I32Extend8S => out.push(binary::I32_EXTEND8_S),
        I::I32Extend16S => out.push(binary::I32_EXTEND16_S),
        I::I64Extend8S => out.push(binary::I64_EXTEND8_S),
        I::I64Extend16S => out.push(binary::I64_EXTEND16_S),
        I::I64Extend32S => out.push(binary::I64_EXTEND32_S),
        I::I32TruncSatF32S => emit_fc(out, binary::I32_TRUNC_SAT_F32_S),
        I::I32TruncSatF32U => emit_fc(out, binary::I32_TRUNC_SAT_F32_U),
        I::I32TruncSatF64S => emit_fc(out, binary::I32_TRUNC_SAT_F64_S),
        I::I32TruncSatF64U => emit_fc(out, binary::I32_TRUNC_SAT_F64_U),
        I::I64TruncSatF32S => emit_fc(out, binary::I64_TRUNC_SAT_F32_S),
        I::I64TruncSatF32U => emit_fc(out, binary::I64_TRUNC_SAT_F32_U),
        I::I64TruncSatF64S => emit_fc(out, binary::I64_TRUNC_SAT_F64_S),
        I::I64TruncSatF64U => emit_fc(out, binary::I64_TRUNC_SAT_F64_U),
    }
}

fn emit_fc(out: &mut Vec<u8>, sub_opcode: u32) {
    out.push(binary::FC_PREFIX);
    out.extend(write_leb128_u32(sub_opcode));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::vec;
    use wvm_types::{FuncType, Limits, MemoryType};

    #[test]
    fn empty_module_is_header_only() {
        let bytes = encode_module(&Module::new());
        assert_eq!(bytes, b"\0asm\x01\0\0\0");
    }

    #[test]
    fn memory_section_layout() {
        let mut module = Module::new();
        module.memories.push(MemoryType {
            limits: Limits::bounded(1, 2),
        });
        let bytes = encode_module(&module);
        // header, then section 5 of length 4: count 1, flags 1, min 1, max 2
        assert_eq!(&bytes[8..], [0x05, 0x04, 0x01, 0x01, 0x01, 0x02]);
    }

    #[test]
    fn type_section_layout() {
        let mut module = Module::new();
        module.types.push(FuncType::new(
            vec![wvm_types::ValueType::I32, wvm_types::ValueType::I32],
            vec![wvm_types::ValueType::I32],
        ));
        let bytes = encode_module(&module);
        assert_eq!(
            &bytes[8..],
            [0x01, 0x07, 0x01, 0x60, 0x02, 0x7F, 0x7F, 0x01, 0x7F]
        );
    }
}
