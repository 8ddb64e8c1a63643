//! WebAssembly binary constants and the low-level read/write
//! primitives every other format routine is built from.
//!
//! Readers return `(value, consumed)` pairs and fail with the typed
//! decode errors: truncated input is `UNEXPECTED_END`, an over-long or
//! overflowing LEB128 is `MALFORMED_LEB`.

use wvm_error::{kinds, Result};
use wvm_types::{Mutability, RefType, ValueType};

use crate::prelude::{String, Vec};

/// Magic bytes for WebAssembly modules: `\0asm`.
pub const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];

/// WebAssembly binary format version 1.
pub const WASM_VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// WebAssembly section ids, in canonical order.
pub const CUSTOM_SECTION_ID: u8 = 0x00;
pub const TYPE_SECTION_ID: u8 = 0x01;
pub const IMPORT_SECTION_ID: u8 = 0x02;
pub const FUNCTION_SECTION_ID: u8 = 0x03;
pub const TABLE_SECTION_ID: u8 = 0x04;
pub const MEMORY_SECTION_ID: u8 = 0x05;
pub const GLOBAL_SECTION_ID: u8 = 0x06;
pub const EXPORT_SECTION_ID: u8 = 0x07;
pub const START_SECTION_ID: u8 = 0x08;
pub const ELEMENT_SECTION_ID: u8 = 0x09;
pub const CODE_SECTION_ID: u8 = 0x0A;
pub const DATA_SECTION_ID: u8 = 0x0B;
pub const DATA_COUNT_SECTION_ID: u8 = 0x0C;

/// Value type encodings.
pub const I32_TYPE: u8 = 0x7F;
pub const I64_TYPE: u8 = 0x7E;
pub const F32_TYPE: u8 = 0x7D;
pub const F64_TYPE: u8 = 0x7C;
pub const FUNCREF_TYPE: u8 = 0x70;
/// The function-type constructor byte.
pub const FUNC_TYPE_TAG: u8 = 0x60;
/// The empty block type byte.
pub const EMPTY_BLOCK_TYPE: u8 = 0x40;

/// External kind bytes in import/export descriptors.
pub const EXTERNAL_KIND_FUNC: u8 = 0x00;
pub const EXTERNAL_KIND_TABLE: u8 = 0x01;
pub const EXTERNAL_KIND_MEMORY: u8 = 0x02;
pub const EXTERNAL_KIND_GLOBAL: u8 = 0x03;

/// Limit flag bytes.
pub const LIMITS_MIN_ONLY: u8 = 0x00;
pub const LIMITS_MIN_MAX: u8 = 0x01;

/// Mutability bytes.
pub const MUTABILITY_CONST: u8 = 0x00;
pub const MUTABILITY_VAR: u8 = 0x01;

// Control instructions
pub const UNREACHABLE: u8 = 0x00;
pub const NOP: u8 = 0x01;
pub const BLOCK: u8 = 0x02;
pub const LOOP: u8 = 0x03;
pub const IF: u8 = 0x04;
pub const ELSE: u8 = 0x05;
pub const END: u8 = 0x0B;
pub const BR: u8 = 0x0C;
pub const BR_IF: u8 = 0x0D;
pub const BR_TABLE: u8 = 0x0E;
pub const RETURN: u8 = 0x0F;
pub const CALL: u8 = 0x10;
pub const CALL_INDIRECT: u8 = 0x11;

// Parametric instructions
pub const DROP: u8 = 0x1A;
pub const SELECT: u8 = 0x1B;

// Variable instructions
pub const LOCAL_GET: u8 = 0x20;
pub const LOCAL_SET: u8 = 0x21;
pub const LOCAL_TEE: u8 = 0x22;
pub const GLOBAL_GET: u8 = 0x23;
pub const GLOBAL_SET: u8 = 0x24;

// Memory instructions
pub const I32_LOAD: u8 = 0x28;
pub const I64_LOAD: u8 = 0x29;
pub const F32_LOAD: u8 = 0x2A;
pub const F64_LOAD: u8 = 0x2B;
pub const I32_LOAD8_S: u8 = 0x2C;
pub const I32_LOAD8_U: u8 = 0x2D;
pub const I32_LOAD16_S: u8 = 0x2E;
pub const I32_LOAD16_U: u8 = 0x2F;
pub const I64_LOAD8_S: u8 = 0x30;
pub const I64_LOAD8_U: u8 = 0x31;
pub const I64_LOAD16_S: u8 = 0x32;
pub const I64_LOAD16_U: u8 = 0x33;
pub const I64_LOAD32_S: u8 = 0x34;
pub const I64_LOAD32_U: u8 = 0x35;
pub const I32_STORE: u8 = 0x36;
pub const I64_STORE: u8 = 0x37;
pub const F32_STORE: u8 = 0x38;
pub const F64_STORE: u8 = 0x39;
pub const I32_STORE8: u8 = 0x3A;
pub const I32_STORE16: u8 = 0x3B;
pub const I64_STORE8: u8 = 0x3C;
pub const I64_STORE16: u8 = 0x3D;
pub const I64_STORE32: u8 = 0x3E;
pub const MEMORY_SIZE: u8 = 0x3F;
pub const MEMORY_GROW: u8 = 0x40;

// Constant instructions
pub const I32_CONST: u8 = 0x41;
pub const I64_CONST: u8 = 0x42;
pub const F32_CONST: u8 = 0x43;
pub const F64_CONST: u8 = 0x44;

// i32 comparison
pub const I32_EQZ: u8 = 0x45;
pub const I32_EQ: u8 = 0x46;
pub const I32_NE: u8 = 0x47;
pub const I32_LT_S: u8 = 0x48;
pub const I32_LT_U: u8 = 0x49;
pub const I32_GT_S: u8 = 0x4A;
pub const I32_GT_U: u8 = 0x4B;
pub const I32_LE_S: u8 = 0x4C;
pub const I32_LE_U: u8 = 0x4D;
pub const I32_GE_S: u8 = 0x4E;
pub const I32_GE_U: u8 = 0x4F;

// i64 comparison
pub const I64_EQZ: u8 = 0x50;
pub const I64_EQ: u8 = 0x51;
pub const I64_NE: u8 = 0x52;
pub const I64_LT_S: u8 = 0x53;
pub const I64_LT_U: u8 = 0x54;
pub const I64_GT_S: u8 = 0x55;
pub const I64_GT_U: u8 = 0x56;
pub const I64_LE_S: u8 = 0x57;
pub const I64_LE_U: u8 = 0x58;
pub const I64_GE_S: u8 = 0x59;
pub const I64_GE_U: u8 = 0x5A;

// f32 comparison
pub const F32_EQ: u8 = 0x5B;
pub const F32_NE: u8 = 0x5C;
pub const F32_LT: u8 = 0x5D;
pub const F32_GT: u8 = 0x5E;
pub const F32_LE: u8 = 0x5F;
pub const F32_GE: u8 = 0x60;

// f64 comparison
pub const F64_EQ: u8 = 0x61;
pub const F64_NE: u8 = 0x62;
pub const F64_LT: u8 = 0x63;
pub const F64_GT: u8 = 0x64;
pub const F64_LE: u8 = 0x65;
pub const F64_GE: u8 = 0x66;

// i32 arithmetic
pub const I32_CLZ: u8 = 0x67;
pub const I32_CTZ: u8 = 0x68;
pub const I32_POPCNT: u8 = 0x69;
pub const I32_ADD: u8 = 0x6A;
pub const I32_SUB: u8 = 0x6B;
pub const I32_MUL: u8 = 0x6C;
pub const I32_DIV_S: u8 = 0x6D;
pub const I32_DIV_U: u8 = 0x6E;
pub const I32_REM_S: u8 = 0x6F;
pub const I32_REM_U: u8 = 0x70;
pub const I32_AND: u8 = 0x71;
pub const I32_OR: u8 = 0x72;
pub const I32_XOR: u8 = 0x73;
pub const I32_SHL: u8 = 0x74;
pub const I32_SHR_S: u8 = 0x75;
pub const I32_SHR_U: u8 = 0x76;
pub const I32_ROTL: u8 = 0x77;
pub const I32_ROTR: u8 = 0x78;

// i64 arithmetic
pub const I64_CLZ: u8 = 0x79;
pub const I64_CTZ: u8 = 0x7A;
pub const I64_POPCNT: u8 = 0x7B;
pub const I64_ADD: u8 = 0x7C;
pub const I64_SUB: u8 = 0x7D;
pub const I64_MUL: u8 = 0x7E;
pub const I64_DIV_S: u8 = 0x7F;
pub const I64_DIV_U: u8 = 0x80;
pub const I64_REM_S: u8 = 0x81;
pub const I64_REM_U: u8 = 0x82;
pub const I64_AND: u8 = 0x83;
pub const I64_OR: u8 = 0x84;
pub const I64_XOR: u8 = 0x85;
pub const I64_SHL: u8 = 0x86;
pub const I64_SHR_S: u8 = 0x87;
pub const I64_SHR_U: u8 = 0x88;
pub const I64_ROTL: u8 = 0x89;
pub const I64_ROTR: u8 = 0x8A;

// f32 arithmetic
pub const F32_ABS: u8 = 0x8B;
pub const F32_NEG: u8 = 0x8C;
pub const F32_CEIL: u8 = 0x8D;
pub const F32_FLOOR: u8 = 0x8E;
pub const F32_TRUNC: u8 = 0x8F;
pub const F32_NEAREST: u8 = 0x90;
pub const F32_SQRT: u8 = 0x91;
pub const F32_ADD: u8 = 0x92;
pub const F32_SUB: u8 = 0x93;
pub const F32_MUL: u8 = 0x94;
pub const F32_DIV: u8 = 0x95;
pub const F32_MIN: u8 = 0x96;
pub const F32_MAX: u8 = 0x97;
pub const F32_COPYSIGN: u8 = 0x98;

// f64 arithmetic
pub const F64_ABS: u8 = 0x99;
pub const F64_NEG: u8 = 0x9A;
pub const F64_CEIL: u8 = 0x9B;
pub const F64_FLOOR: u8 = 0x9C;
pub const F64_TRUNC: u8 = 0x9D;
pub const F64_NEAREST: u8 = 0x9E;
pub const F64_SQRT: u8 = 0x9F;
pub const F64_ADD: u8 = 0xA0;
pub const F64_SUB: u8 = 0xA1;
pub const F64_MUL: u8 = 0xA2;
pub const F64_DIV: u8 = 0xA3;
pub const F64_MIN: u8 = 0xA4;
pub const F64_MAX: u8 = 0xA5;
pub const F64_COPYSIGN: u8 = 0xA6;

// Conversions
pub const I32_WRAP_I64: u8 = 0xA7;
pub const I32_TRUNC_F32_S: u8 = 0xA8;
pub const I32_TRUNC_F32_U: u8 = 0xA9;
pub const I32_TRUNC_F64_S: u8 = 0xAA;
pub const I32_TRUNC_F64_U: u8 = 0xAB;
pub const I64_EXTEND_I32_S: u8 = 0xAC;
pub const I64_EXTEND_I32_U: u8 = 0xAD;
pub const I64_TRUNC_F32_S: u8 = 0xAE;
pub const I64_TRUNC_F32_U: u8 = 0xAF;
pub const I64_TRUNC_F64_S: u8 = 0xB0;
pub const I64_TRUNC_F64_U: u8 = 0xB1;
pub const F32_CONVERT_I32_S: u8 = 0xB2;
pub const F32_CONVERT_I32_U: u8 = 0xB3;
pub const F32_CONVERT_I64_S: u8 = 0xB4;
pub const F32_CONVERT_I64_U: u8 = 0xB5;
pub const F32_DEMOTE_F64: u8 = 0xB6;
pub const F64_CONVERT_I32_S: u8 = 0xB7;
pub const F64_CONVERT_I32_U: u8 = 0xB8;
pub const F64_CONVERT_I64_S: u8 = 0xB9;
pub const F64_CONVERT_I64_U: u8 = 0xBA;
pub const F64_PROMOTE_F32: u8 = 0xBB;
pub const I32_REINTERPRET_F32: u8 = 0xBC;
pub const I64_REINTERPRET_F64: u8 = 0xBD;
pub const F32_REINTERPRET_I32: u8 = 0xBE;
pub const F64_REINTERPRET_I64: u8 = 0xBF;

// Sign extension
pub const I32_EXTEND8_S: u8 = 0xC0;
pub const I32_EXTEND16_S: u8 = 0xC1;
pub const I64_EXTEND8_S: u8 = 0xC2;
pub const I64_EXTEND16_S: u8 = 0xC3;
pub const I64_EXTEND32_S: u8 = 0xC4;

/// Prefix byte for the saturating-truncation and bulk-memory space.
pub const FC_PREFIX: u8 = 0xFC;

// 0xFC sub-opcodes
pub const I32_TRUNC_SAT_F32_S: u32 = 0;
pub const I32_TRUNC_SAT_F32_U: u32 = 1;
pub const I32_TRUNC_SAT_F64_S: u32 = 2;
pub const I32_TRUNC_SAT_F64_U: u32 = 3;
pub const I64_TRUNC_SAT_F32_S: u32 = 4;
pub const I64_TRUNC_SAT_F32_U: u32 = 5;
pub const I64_TRUNC_SAT_F64_S: u32 = 6;
pub const I64_TRUNC_SAT_F64_U: u32 = 7;

/// Read an unsigned LEB128 u32 at `pos`.
pub fn read_leb128_u32(bytes: &[u8], pos: usize) -> Result<(u32, usize)> {
    let mut result = 0u32;
    let mut shift = 0u32;
    let mut offset = 0usize;

    loop {
        let Some(&byte) = bytes.get(pos + offset) else {
            return Err(kinds::unexpected_end());
        };
        offset += 1;

        let payload = u32::from(byte & 0x7F);
        // The fifth byte may only carry the top four bits of a u32.
        if shift == 28 && payload > 0x0F {
            return Err(kinds::malformed_leb());
        }
        result |= payload << shift;

        if byte & 0x80 == 0 {
            return Ok((result, offset));
        }
        shift += 7;
        if shift >= 32 {
            return Err(kinds::malformed_leb());
        }
    }
}

/// Read an unsigned LEB128 u64 at `pos`.
pub fn read_leb128_u64(bytes: &[u8], pos: usize) -> Result<(u64, usize)> {
    let mut result = 0u64;
    let mut shift = 0u32;
    let mut offset = 0usize;

    loop {
        let Some(&byte) = bytes.get(pos + offset) else {
            return Err(kinds::unexpected_end());
        };
        offset += 1;

        let payload = u64::from(byte & 0x7F);
        // The tenth byte may only carry the top bit of a u64.
        if shift == 63 && payload > 0x01 {
            return Err(kinds::malformed_leb());
        }
        result |= payload << shift;

        if byte & 0x80 == 0 {
            return Ok((result, offset));
        }
        shift += 7;
        if shift >= 64 {
            return Err(kinds::malformed_leb());
        }
    }
}

/// Read a signed LEB128 i32 at `pos`.
pub fn read_leb128_i32(bytes: &[u8], pos: usize) -> Result<(i32, usize)> {
    let (value, consumed) = read_leb128_i64_width(bytes, pos, 32)?;
    Ok((value as i32, consumed))
}

/// Read a signed LEB128 i64 at `pos`.
pub fn read_leb128_i64(bytes: &[u8], pos: usize) -> Result<(i64, usize)> {
    read_leb128_i64_width(bytes, pos, 64)
}

/// Shared signed-LEB reader for widths 32 and 64.
///
/// In the final byte of a maximal-length encoding, the bits above the
/// value width must all equal the sign bit, otherwise the encoding
/// does not fit the width.
fn read_leb128_i64_width(bytes: &[u8], pos: usize, width: u32) -> Result<(i64, usize)> {
    let mut result = 0i64;
    let mut shift = 0u32;
    let mut offset = 0usize;
    let max_bytes = (width + 6) / 7;

    loop {
        let Some(&byte) = bytes.get(pos + offset) else {
            return Err(kinds::unexpected_end());
        };
        offset += 1;
        let payload = byte & 0x7F;

        if offset as u32 == max_bytes {
            if byte & 0x80 != 0 {
                return Err(kinds::malformed_leb());
            }
            let used = width - 7 * (max_bytes - 1);
            let sign = (payload >> (used - 1)) & 1;
            let upper = payload >> used;
            let expected = if sign == 1 { (1u8 << (7 - used)) - 1 } else { 0 };
            if upper != expected {
                return Err(kinds::malformed_leb());
            }
        }

        result |= i64::from(payload) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            if shift < 64 {
                let sign_bit = 1i64 << (shift - 1);
                result = (result ^ sign_bit) - sign_bit;
            }
            return Ok((result, offset));
        }
    }
}

/// Write a u32 as unsigned LEB128.
#[must_use]
pub fn write_leb128_u32(value: u32) -> Vec<u8> {
    let mut out = Vec::new();
    let mut v = value;
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

/// Write a u64 as unsigned LEB128.
#[must_use]
pub fn write_leb128_u64(value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    let mut v = value;
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

/// Write an i32 as signed LEB128.
#[must_use]
pub fn write_leb128_i32(value: i32) -> Vec<u8> {
    write_leb128_i64(i64::from(value))
}

/// Write an i64 as signed LEB128.
#[must_use]
pub fn write_leb128_i64(value: i64) -> Vec<u8> {
    let mut out = Vec::new();
    let mut v = value;
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        let sign_clear = byte & 0x40 == 0;
        if (v == 0 && sign_clear) || (v == -1 && !sign_clear) {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

/// Read a little-endian f32 at `pos`.
pub fn read_f32(bytes: &[u8], pos: usize) -> Result<(u32, usize)> {
    let Some(slice) = bytes.get(pos..pos + 4) else {
        return Err(kinds::unexpected_end());
    };
    let mut arr = [0u8; 4];
    arr.copy_from_slice(slice);
    Ok((u32::from_le_bytes(arr), 4))
}

/// Read a little-endian f64 at `pos`.
pub fn read_f64(bytes: &[u8], pos: usize) -> Result<(u64, usize)> {
    let Some(slice) = bytes.get(pos..pos + 8) else {
        return Err(kinds::unexpected_end());
    };
    let mut arr = [0u8; 8];
    arr.copy_from_slice(slice);
    Ok((u64::from_le_bytes(arr), 8))
}

/// Read a length-prefixed UTF-8 name at `pos`.
pub fn read_name(bytes: &[u8], pos: usize) -> Result<(String, usize)> {
    let (len, len_size) = read_leb128_u32(bytes, pos)?;
    let start = pos + len_size;
    let Some(slice) = bytes.get(start..start + len as usize) else {
        return Err(kinds::unexpected_end());
    };
    let name = core::str::from_utf8(slice).map_err(|_| kinds::malformed_utf8())?;
    Ok((String::from(name), len_size + len as usize))
}

/// Read a length-prefixed byte vector at `pos`.
pub fn read_bytes(bytes: &[u8], pos: usize) -> Result<(Vec<u8>, usize)> {
    let (len, len_size) = read_leb128_u32(bytes, pos)?;
    let start = pos + len_size;
    let Some(slice) = bytes.get(start..start + len as usize) else {
        return Err(kinds::unexpected_end());
    };
    Ok((Vec::from(slice), len_size + len as usize))
}

/// Encode a name as a length-prefixed UTF-8 byte sequence.
#[must_use]
pub fn write_name(name: &str) -> Vec<u8> {
    let mut out = write_leb128_u32(name.len() as u32);
    out.extend_from_slice(name.as_bytes());
    out
}

/// Decode a value-type byte.
pub fn value_type_from_byte(byte: u8) -> Result<ValueType> {
    match byte {
        I32_TYPE => Ok(ValueType::I32),
        I64_TYPE => Ok(ValueType::I64),
        F32_TYPE => Ok(ValueType::F32),
        F64_TYPE => Ok(ValueType::F64),
        _ => Err(kinds::unknown_tag()),
    }
}

/// Encode a value type as its byte.
#[must_use]
pub fn value_type_to_byte(ty: ValueType) -> u8 {
    match ty {
        ValueType::I32 => I32_TYPE,
        ValueType::I64 => I64_TYPE,
        ValueType::F32 => F32_TYPE,
        ValueType::F64 => F64_TYPE,
    }
}

/// Decode a reference-type byte.
pub fn ref_type_from_byte(byte: u8) -> Result<RefType> {
    match byte {
        FUNCREF_TYPE => Ok(RefType::FuncRef),
        _ => Err(kinds::unknown_tag()),
    }
}

/// Decode a mutability byte.
pub fn mutability_from_byte(byte: u8) -> Result<Mutability> {
    match byte {
        MUTABILITY_CONST => Ok(Mutability::Const),
        MUTABILITY_VAR => Ok(Mutability::Var),
        _ => Err(kinds::unknown_tag()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wvm_error::codes;

    #[test]
    fn leb128_u32_roundtrip() {
        for value in [0u32, 1, 127, 128, 624_485, u32::MAX] {
            let bytes = write_leb128_u32(value);
            let (decoded, consumed) = read_leb128_u32(&bytes, 0).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, bytes.len());
        }
    }

    #[test]
    fn leb128_i64_roundtrip() {
        for value in [0i64, -1, 63, 64, -64, -65, i64::MIN, i64::MAX] {
            let bytes = write_leb128_i64(value);
            let (decoded, consumed) = read_leb128_i64(&bytes, 0).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, bytes.len());
        }
    }

    #[test]
    fn leb128_rejects_overflow() {
        // Six continuation bytes overflow a u32.
        let err = read_leb128_u32(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01], 0).unwrap_err();
        assert_eq!(err.code, codes::MALFORMED_LEB);
        // The fifth byte carries bits a u32 cannot hold.
        let err = read_leb128_u32(&[0xFF, 0xFF, 0xFF, 0xFF, 0x7F], 0).unwrap_err();
        assert_eq!(err.code, codes::MALFORMED_LEB);
        // Maximal u32 still fits.
        let (v, _) = read_leb128_u32(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F], 0).unwrap();
        assert_eq!(v, u32::MAX);
    }

    #[test]
    fn leb128_rejects_truncation() {
        let err = read_leb128_u32(&[0x80], 0).unwrap_err();
        assert_eq!(err.code, codes::UNEXPECTED_END);
    }

    #[test]
    fn name_reading() {
        let bytes = write_name("memory");
        let (name, consumed) = read_name(&bytes, 0).unwrap();
        assert_eq!(name, "memory");
        assert_eq!(consumed, bytes.len());

        let err = read_name(&[0x02, 0xFF, 0xFE], 0).unwrap_err();
        assert_eq!(err.code, codes::MALFORMED_UTF8);
    }

    #[test]
    fn minimal_lebs_are_canonical() {
        assert_eq!(write_leb128_u32(0), [0x00]);
        assert_eq!(write_leb128_u32(624_485), [0xE5, 0x8E, 0x26]);
        assert_eq!(write_leb128_i32(-1), [0x7F]);
        assert_eq!(write_leb128_i32(-123_456), [0xC0, 0xBB, 0x78]);
    }
}
