//! Function body and expression decoding.
//!
//! Bodies decode into the flat `Instruction` sequence of `wvm_format`.
//! After the linear pass, a fixup walk records each structured
//! instruction's matching `else`/`end` position, so the engine can
//! branch by assigning the cursor.

use wvm_error::{codes, kinds, Error, Result};
use wvm_format::binary;
use wvm_format::instructions::{Instruction, MemArg};
use wvm_format::module::CodeBody;
use wvm_math::{FloatBits32, FloatBits64};
use wvm_types::BlockType;

use crate::prelude::Vec;
use crate::reader::BinaryReader;

/// Keeps pathological local declarations from allocating gigabytes.
const MAX_LOCALS: u32 = 100_000;

/// Decode an `end`-terminated expression (global initializers and
/// segment offsets).
pub fn decode_expression(reader: &mut BinaryReader<'_>) -> Result<Vec<Instruction>> {
    let mut instructions = decode_until_end(reader)?;
    fixup_continuations(&mut instructions)?;
    Ok(instructions)
}

/// Decode one code-section entry: local declarations followed by the
/// body expression.
pub fn decode_function_body(reader: &mut BinaryReader<'_>) -> Result<CodeBody> {
    let run_count = reader.read_u32_leb()?;
    let mut locals = Vec::new();
    let mut total: u32 = 0;
    for _ in 0..run_count {
        let count = reader.read_u32_leb()?;
        let ty = binary::value_type_from_byte(reader.read_byte()?)?;
        total = total
            .checked_add(count)
            .filter(|&t| t <= MAX_LOCALS)
            .ok_or(Error::decode_error(
                codes::LENGTH_MISMATCH,
                "local count out of range",
            ))?;
        for _ in 0..count {
            locals.push(ty);
        }
    }

    let mut instructions = decode_until_end(reader)?;
    fixup_continuations(&mut instructions)?;
    Ok(CodeBody {
        locals,
        instructions,
    })
}

/// Read instructions until the `end` that closes the implicit outer
/// block, inclusive.
fn decode_until_end(reader: &mut BinaryReader<'_>) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();
    let mut depth = 1u32;
    loop {
        let instruction = decode_instruction(reader)?;
        match instruction {
            Instruction::Block { .. } | Instruction::Loop { .. } | Instruction::If { .. } => {
                depth += 1;
            }
            Instruction::End => depth -= 1,
            _ => {}
        }
        instructions.push(instruction);
        if depth == 0 {
            return Ok(instructions);
        }
    }
}

/// Patch the `else`/`end` positions of every structured instruction.
fn fixup_continuations(instructions: &mut [Instruction]) -> Result<()> {
    enum Opened {
        Block,
        Loop,
        If { else_pc: Option<usize> },
    }

    let mut stack: Vec<(usize, Opened)> = Vec::new();
    let misplaced = Error::decode_error(codes::UNKNOWN_OPCODE, "misplaced else opcode");

    for pc in 0..instructions.len() {
        match instructions[pc] {
            Instruction::Block { .. } => stack.push((pc, Opened::Block)),
            Instruction::Loop { .. } => stack.push((pc, Opened::Loop)),
            Instruction::If { .. } => stack.push((pc, Opened::If { else_pc: None })),
            Instruction::Else { .. } => match stack.last_mut() {
                Some((_, Opened::If { else_pc: else_pc @ None })) => *else_pc = Some(pc),
                _ => return Err(misplaced),
            },
            Instruction::End => {
                // The final `end` closes the implicit outer block.
                let Some((start, opened)) = stack.pop() else {
                    continue;
                };
                let end = pc as u32;
                match opened {
                    Opened::Block => {
                        if let Instruction::Block { end_pc, .. } = &mut instructions[start] {
                            *end_pc = end;
                        }
                    }
                    Opened::Loop => {}
                    Opened::If { else_pc } => {
                        if let Some(else_at) = else_pc {
                            if let Instruction::Else { end_pc } = &mut instructions[else_at] {
                                *end_pc = end;
                            }
                        }
                        if let Instruction::If {
                            else_pc: if_else, end_pc, ..
                        } = &mut instructions[start]
                        {
                            *if_else = else_pc.map_or(end, |e| e as u32);
                            *end_pc = end;
                        }
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn decode_block_type(reader: &mut BinaryReader<'_>) -> Result<BlockType> {
    let byte = reader.read_byte()?;
    if byte == binary::EMPTY_BLOCK_TYPE {
        Ok(BlockType::Empty)
    } else {
        Ok(BlockType::Value(binary::value_type_from_byte(byte)?))
    }
}

fn decode_mem_arg(reader: &mut BinaryReader<'_>) -> Result<MemArg> {
    let align = reader.read_u32_leb()?;
    let offset = reader.read_u32_leb()?;
    Ok(MemArg { align, offset })
}

/// The reserved zero byte after `memory.size`/`memory.grow`.
fn expect_zero_byte(reader: &mut BinaryReader<'_>) -> Result<()> {
    if reader.read_byte()? != 0x00 {
        return Err(kinds::unknown_tag());
    }
    Ok(())
}

/// Decode a single instruction.
#[allow(clippy::too_many_lines)]
pub fn decode_instruction(reader: &mut BinaryReader<'_>) -> Result<Instruction> {
    use Instruction as I;
    let opcode = reader.read_byte()?;
    let instruction = match opcode {
        binary::UNREACHABLE => I::Unreachable,
        binary::NOP => I::Nop,
        binary::BLOCK => I::Block {
            block_type: decode_block_type(reader)?,
            end_pc: 0,
        },
        binary::LOOP => I::Loop {
            block_type: decode_block_type(reader)?,
        },
        binary::IF => I::If {
            block_type: decode_block_type(reader)?,
            else_pc: 0,
            end_pc: 0,
        },
        binary::ELSE => I::Else { end_pc: 0 },
        binary::END => I::End,
        binary::BR => I::Br(reader.read_u32_leb()?),
        binary::BR_IF => I::BrIf(reader.read_u32_leb()?),
        binary::BR_TABLE => {
            let count = reader.read_u32_leb()?;
            let mut targets = Vec::new();
            for _ in 0..count {
                targets.push(reader.read_u32_leb()?);
            }
            let default = reader.read_u32_leb()?;
            I::BrTable { targets, default }
        }
        binary::RETURN => I::Return,
        binary::CALL => I::Call(reader.read_u32_leb()?),
        binary::CALL_INDIRECT => {
            let type_index = reader.read_u32_leb()?;
            let table_index = reader.read_u32_leb()?;
            I::CallIndirect {
                type_index,
                table_index,
            }
        }
        binary::DROP => I::Drop,
        binary::SELECT => I::Select,
        binary::LOCAL_GET => I::LocalGet(reader.read_u32_leb()?),
        binary::LOCAL_SET => I::LocalSet(reader.read_u32_leb()?),
        binary::LOCAL_TEE => I::LocalTee(reader.read_u32_leb()?),
        binary::GLOBAL_GET => I::GlobalGet(reader.read_u32_leb()?),
        binary::GLOBAL_SET => I::GlobalSet(reader.read_u32_leb()?),
        binary::I32_LOAD => I::I32Load(decode_mem_arg(reader)?),
        binary::I64_LOAD => I::I64Load(decode_mem_arg(reader)?),
        binary::F32_LOAD => I::F32Load(decode_mem_arg(reader)?),
        binary::F64_LOAD => I::F64Load(decode_mem_arg(reader)?),
        binary::I32_LOAD8_S => I::I32Load8S(decode_mem_arg(reader)?),
        binary::I32_LOAD8_U => I::I32Load8U(decode_mem_arg(reader)?),
        binary::I32_LOAD16_S => I::I32Load16S(decode_mem_arg(reader)?),
        binary::I32_LOAD16_U => I::I32Load16U(decode_mem_arg(reader)?),
        binary::I64_LOAD8_S => I::I64Load8S(decode_mem_arg(reader)?),
        binary::I64_LOAD8_U => I::I64Load8U(decode_mem_arg(reader)?),
        binary::I64_LOAD16_S => I::I64Load16S(decode_mem_arg(reader)?),
        binary::I64_LOAD16_U => I::I64Load16U(decode_mem_arg(reader)?),
        binary::I64_LOAD32_S => I::I64Load32S(decode_mem_arg(reader)?),
        binary::I64_LOAD32_U => I::I64Load32U(decode_mem_arg(reader)?),
        binary::I32_STORE => I::I32Store(decode_mem_arg(reader)?),
        binary::I64_STORE => I::I64Store(decode_mem_arg(reader)?),
        binary::F32_STORE => I::F32Store(decode_mem_arg(reader)?),
        binary::F64_STORE => I::F64Store(decode_mem_arg(reader)?),
        binary::I32_STORE8 => I::I32Store8(decode_mem_arg(reader)?),
        binary::I32_STORE16 => I::I32Store16(decode_mem_arg(reader)?),
        binary::I64_STORE8 => I::I64Store8(decode_mem_arg(reader)?),
        binary::I64_STORE16 => I::I64Store16(decode_mem_arg(reader)?),
        binary::I64_STORE32 => I::I64Store32(decode_mem_arg(reader)?),
        binary::MEMORY_SIZE => {
            expect_zero_byte(reader)?;
            I::MemorySize
        }
        binary::MEMORY_GROW => {
            expect_zero_byte(reader)?;
            I::MemoryGrow
        }
        binary::I32_CONST => I::I32Const(reader.read_s32_leb()?),
        binary::I64_CONST => I::I64Const(reader.read_s64_leb()?),
        binary::F32_CONST => I::F32Const(FloatBits32::from_bits(reader.read_f32_bits()?)),
        binary::F64_CONST => I::F64Const(FloatBits64::from_bits(reader.read_f64_bits()?)),
        binary::I32_EQZ => I::I32Eqz,
        binary::I32_EQ => I::I32Eq,
        binary::I32_NE => I::I32Ne,
        binary::I32_LT_S => I::I32LtS,
        binary::I32_LT_U => I::I32LtU,
        binary::I32_GT_S => I::I32GtS,
        binary::I32_GT_U => I::I32GtU,
        binary::I32_LE_S => I::I32LeS,
        binary::I32_LE_U => I::I32LeU,
        binary::I32_GE_S => I::I32GeS,
        binary::I32_GE_U => I::I32GeU,
        binary::I64_EQZ => I::I64Eqz,
        binary::I64_EQ => I::I64Eq,
        binary::I64_NE => I::I64Ne,
        binary::I64_LT_S => I::I64LtS,
        binary::I64_LT_U => I::I64LtU,
        binary::I64_GT_S => I::I64GtS,
        binary::I64_GT_U => I::I64GtU,
        binary::I64_LE_S => I::I64LeS,
        binary::I64_LE_U => I::I64LeU,
        binary::I64_GE_S => I::I64GeS,
        binary::I64_GE_U => I::I64GeU,
        binary::F32_EQ => I::F32Eq,
        binary::F32_NE => I::F32Ne,
        binary::F32_LT => I::F32Lt,
        binary::F32_GT => I::F32Gt,
        binary::F32_LE => I::F32Le,
        binary::F32_GE => I::F32Ge,
        binary::F64_EQ => I::F64Eq,
        binary::F64_NE => I::F64Ne,
        binary::F64_LT => I::F64Lt,
        binary::F64_GT => I::F64Gt,
        binary::F64_LE => I::F64Le,
        binary::F64_GE => I::F64Ge,
        binary::I32_CLZ => I::I32Clz,
        binary::I32_CTZ => I::I32Ctz,
        binary::I32_POPCNT => I::I32Popcnt,
        binary::I32_ADD => I::I32Add,
        binary::I32_SUB => I::I32Sub,
        binary::I32_MUL => I::I32Mul,
        binary::I32_DIV_S => I::I32DivS,
        binary::I32_DIV_U => I::I32DivU,
        binary::I32_REM_S => I::I32RemS,
        binary::I32_REM_U => I::I32RemU,
        binary::I32_AND => I::I32And,
        binary::I32_OR => I::I32Or,
        binary::I32_XOR => I::I32Xor,
        binary::I32_SHL => I::I32Shl,
        binary::I32_SHR_S => I::I32ShrS,
        binary::I32_SHR_U => I::I32ShrU,
        binary::I32_ROTL => I::I32Rotl,
        binary::I32_ROTR => I::I32Rotr,
        binary::I64_CLZ => I::I64Clz,
        binary::I64_CTZ => I::I64Ctz,
        binary::I64_POPCNT => I::I64Popcnt,
        binary::I64_ADD => I::I64Add,
        binary::I64_SUB => I::I64Sub,
        binary::I64_MUL => I::I64Mul,
        binary::I64_DIV_S => I::I64DivS,
        binary::I64_DIV_U => I::I64DivU,
        binary::I64_REM_S => I::I64RemS,
        binary::I64_REM_U => I::I64RemU,
        binary::I64_AND => I::I64And,
        binary::I64_OR => I::I64Or,
        binary::I64_XOR => I::I64Xor,
        binary::I64_SHL => I::I64Shl,
        binary::I64_SHR_S => I::I64ShrS,
        binary::I64_SHR_U => I::I64ShrU,
        binary::I64_ROTL => I::I64Rotl,
        binary::I64_ROTR => I::I64Rotr,
        binary::F32_ABS => I::F32Abs,
        binary::F32_NEG => I::F32Neg,
        binary::F32_CEIL => I::F32Ceil,
        binary::F32_FLOOR => I::F32Floor,
        binary::F32_TRUNC => I::F32Trunc,
        binary::F32_NEAREST => I::F32Nearest,
        binary::F32_SQRT => I::F32Sqrt,
        binary::F32_ADD => I::F32Add,
        binary::F32_SUB => I::F32Sub,
        binary::F32_MUL => I::F32Mul,
        binary::F32_DIV => I::F32Div,
        binary::F32_MIN => I::F32Min,
        binary::F32_MAX => I::F32Max,
        binary::F32_COPYSIGN => I::F32Copysign,
        binary::F64_ABS => I::F64Abs,
        binary::F64_NEG => I::F64Neg,
        binary::F64_CEIL => I::F64Ceil,
        binary::F64_FLOOR => I::F64Floor,
        binary::F64_TRUNC => I::F64Trunc,
        binary::F64_NEAREST => I::F64Nearest,
        binary::F64_SQRT => I::F64Sqrt,
        binary::F64_ADD => I::F64Add,
        binary::F64_SUB => I::F64Sub,
        binary::F64_MUL => I::F64Mul,
        binary::F64_DIV => I::F64Div,
        binary::F64_MIN => I::F64Min,
        binary::F64_MAX => I::F64Max,
        binary::F64_COPYSIGN => I::F64Copysign,
        binary::I32_WRAP_I64 => I::I32WrapI64,
        binary::I32_TRUNC_F32_S => I::I32TruncF32S,
        binary::I32_TRUNC_F32_U => I::I32TruncF32U,
        binary::I32_TRUNC_F64_S => I::I32TruncF64S,
        binary::I32_TRUNC_F64_U => I::I32TruncF64U,
        binary::I64_EXTEND_I32_S => I::I64ExtendI32S,
        binary::I64_EXTEND_I32_U => I::I64ExtendI32U,
        binary::I64_TRUNC_F32_S => I::I64TruncF32S,
        binary::I64_TRUNC_F32_U => I::I64TruncF32U,
        binary::I64_TRUNC_F64_S => I::I64TruncF64S,
        binary::I64_TRUNC_F64_U => I::I64TruncF64U,
        binary::F32_CONVERT_I32_S => I::F32ConvertI32S,
        binary::F32_CONVERT_I32_U => I::F32ConvertI32U,
        binary::F32_CONVERT_I64_S => I::F32ConvertI64S,
        binary::F32_CONVERT_I64_U => I::F32ConvertI64U,
        binary::F32_DEMOTE_F64 => I::F32DemoteF64,
        binary::F64_CONVERT_I32_S => I::F64ConvertI32S,
        binary::F64_CONVERT_I32_U => I::F64ConvertI32U,
        binary::F64_CONVERT_I64_S => I::F64ConvertI64S,
        binary::F64_CONVERT_I64_U => I::F64ConvertI64U,
        binary::F64_PROMOTE_F32 => I::F64PromoteF32,
        binary::I32_REINTERPRET_F32 => I::I32ReinterpretF32,
        binary::I64_REINTERPRET_F64 => I::I64ReinterpretF64,
        binary::F32_REINTERPRET_I32 => I::F32ReinterpretI32,
        binary::F64_REINTERPRET_I64 => I::F64ReinterpretI64,
        binary::I32_EXTEND8_S => I::I32Extend8S,
        binary::I32_EXTEND16_S => I::I32Extend16S,
        binary::I64_EXTEND8_S => I::I64Extend8S,
        binary::I64_EXTEND16_S => I::I64Extend16S,
        binary::I64_EXTEND32_S => I::I64Extend32S,
        binary::FC_PREFIX => match reader.read_u32_leb()? {
            binary::I32_TRUNC_SAT_F32_S => I::I32TruncSatF32S,
            binary::I32_TRUNC_SAT_F32_U => I::I32TruncSatF32U,
            binary::I32_TRUNC_SAT_F64_S => I::I32TruncSatF64S,
            binary::I32_TRUNC_SAT_F64_U => I::I32TruncSatF64U,
            binary::I64_TRUNC_SAT_F32_S => I::I64TruncSatF32S,
            binary::I64_TRUNC_SAT_F32_U => I::I64TruncSatF32U,
            binary::I64_TRUNC_SAT_F64_S => I::I64TruncSatF64S,
            binary::I64_TRUNC_SAT_F64_U => I::I64TruncSatF64U,
            _ => return Err(kinds::unknown_opcode()),
        },
        _ => return Err(kinds::unknown_opcode()),
    };
    Ok(instruction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> Vec<Instruction> {
        let mut reader = BinaryReader::new(bytes);
        decode_expression(&mut reader).unwrap()
    }

    #[test]
    fn decodes_const_expression() {
        // i32.const 41, end
        let instructions = decode_all(&[0x41, 0x29, 0x0B]);
        assert_eq!(
            instructions,
            [Instruction::I32Const(41), Instruction::End]
        );
    }

    #[test]
    fn fixes_up_block_ends() {
        // block (empty) / nop / end / end
        let instructions = decode_all(&[0x02, 0x40, 0x01, 0x0B, 0x0B]);
        assert_eq!(
            instructions[0],
            Instruction::Block {
                block_type: BlockType::Empty,
                end_pc: 2,
            }
        );
    }

    #[test]
    fn fixes_up_if_else() {
        // i32.const 1 / if (empty) / nop / else / nop / end / end
        let instructions =
            decode_all(&[0x41, 0x01, 0x04, 0x40, 0x01, 0x05, 0x01, 0x0B, 0x0B]);
        assert_eq!(
            instructions[1],
            Instruction::If {
                block_type: BlockType::Empty,
                else_pc: 3,
                end_pc: 5,
            }
        );
        assert_eq!(instructions[3], Instruction::Else { end_pc: 5 });
    }

    #[test]
    fn if_without_else_targets_end() {
        // i32.const 0 / if (empty) / nop / end / end
        let instructions = decode_all(&[0x41, 0x00, 0x04, 0x40, 0x01, 0x0B, 0x0B]);
        assert_eq!(
            instructions[1],
            Instruction::If {
                block_type: BlockType::Empty,
                else_pc: 3,
                end_pc: 3,
            }
        );
    }

    #[test]
    fn rejects_unknown_opcode() {
        let mut reader = BinaryReader::new(&[0xFE]);
        let err = decode_instruction(&mut reader).unwrap_err();
        assert_eq!(err.code, wvm_error::codes::UNKNOWN_OPCODE);
    }

    #[test]
    fn rejects_unknown_fc_opcode() {
        let mut reader = BinaryReader::new(&[0xFC, 0x20]);
        let err = decode_instruction(&mut reader).unwrap_err();
        assert_eq!(err.code, wvm_error::codes::UNKNOWN_OPCODE);
    }

    #[test]
    fn truncated_body_is_unexpected_end() {
        let mut reader = BinaryReader::new(&[0x41, 0x00]);
        let err = decode_expression(&mut reader).unwrap_err();
        assert_eq!(err.code, wvm_error::codes::UNEXPECTED_END);
    }
}
