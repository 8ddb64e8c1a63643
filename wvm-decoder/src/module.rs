//! Section-level module decoding.
//!
//! Sections are decoded in encounter order while enforcing the
//! canonical ordering rules: custom sections may appear anywhere,
//! every other section id at most once and in increasing rank, with
//! the DataCount section ranked between Element and Code. Every
//! section must consume exactly its declared byte count.

use wvm_error::{codes, kinds, Error, Result};
use wvm_format::binary;
use wvm_format::module::{
    CustomSection, DataSegment, ElementSegment, Export, Global, Import, ImportDesc, Module,
    SegmentMode,
};
use wvm_types::{
    ExternKind, FuncType, GlobalType, Limits, MemoryType, TableType, ValueType,
};

use crate::instructions::{decode_expression, decode_function_body};
use crate::prelude::Vec;
use crate::reader::BinaryReader;

/// Decode a module from bytes, without validating it.
pub fn decode_module(bytes: &[u8]) -> Result<Module> {
    let mut reader = BinaryReader::new(bytes);

    let magic = reader.read_exact(4)?;
    if magic != binary::WASM_MAGIC {
        return Err(kinds::malformed_magic());
    }
    let version = reader.read_exact(4)?;
    if version != binary::WASM_VERSION {
        return Err(kinds::malformed_version());
    }

    let mut module = Module::new();
    let mut last_rank = 0u8;
    let mut last_section_id = 0u8;

    while !reader.at_end() {
        let id = reader.read_byte()?;
        let size = reader.read_u32_leb()? as usize;
        let start = reader.position();
        let end = start
            .checked_add(size)
            .filter(|&end| end <= bytes.len())
            .ok_or_else(kinds::unexpected_end)?;

        if id == binary::CUSTOM_SECTION_ID {
            decode_custom_section(&mut reader, &mut module, end, last_section_id)?;
        } else {
            let rank = section_rank(id)?;
            if rank <= last_rank {
                return Err(kinds::section_out_of_order());
            }
            last_rank = rank;
            last_section_id = id;
            decode_section(&mut reader, &mut module, id)?;
        }

        if reader.position() != end {
            return Err(kinds::length_mismatch());
        }
    }

    if module.functions.len() != module.code.len() {
        return Err(Error::decode_error(
            codes::LENGTH_MISMATCH,
            "function and code section lengths disagree",
        ));
    }
    if let Some(count) = module.data_count {
        if count as usize != module.data.len() {
            return Err(Error::decode_error(
                codes::LENGTH_MISMATCH,
                "data count section disagrees with data section",
            ));
        }
    }

    log::debug!(
        "decoded module: {} types, {} imports, {} functions, {} exports",
        module.types.len(),
        module.imports.len(),
        module.functions.len(),
        module.exports.len()
    );
    Ok(module)
}

/// Ordering rank of a non-custom section id. DataCount sits between
/// Element and Code.
fn section_rank(id: u8) -> Result<u8> {
    match id {
        binary::TYPE_SECTION_ID
        | binary::IMPORT_SECTION_ID
        | binary::FUNCTION_SECTION_ID
        | binary::TABLE_SECTION_ID
        | binary::MEMORY_SECTION_ID
        | binary::GLOBAL_SECTION_ID
        | binary::EXPORT_SECTION_ID
        | binary::START_SECTION_ID
        | binary::ELEMENT_SECTION_ID => Ok(id),
        binary::DATA_COUNT_SECTION_ID => Ok(binary::ELEMENT_SECTION_ID + 1),
        binary::CODE_SECTION_ID => Ok(binary::CODE_SECTION_ID + 1),
        binary::DATA_SECTION_ID => Ok(binary::DATA_SECTION_ID + 1),
        _ => Err(kinds::unknown_section_id()),
    }
}

fn decode_custom_section(
    reader: &mut BinaryReader<'_>,
    module: &mut Module,
    end: usize,
    placement: u8,
) -> Result<()> {
    let name = reader.read_name()?;
    if reader.position() > end {
        return Err(kinds::length_mismatch());
    }
    let data = reader.read_exact(end - reader.position())?;
    module.custom_sections.push(CustomSection {
        name,
        data: Vec::from(data),
        placement,
    });
    Ok(())
}

fn decode_section(reader: &mut BinaryReader<'_>, module: &mut Module, id: u8) -> Result<()> {
    match id {
        binary::TYPE_SECTION_ID => decode_type_section(reader, module),
        binary::IMPORT_SECTION_ID => decode_import_section(reader, module),
        binary::FUNCTION_SECTION_ID => {
            let count = reader.read_u32_leb()?;
            for _ in 0..count {
                module.functions.push(reader.read_u32_leb()?);
            }
            Ok(())
        }
        binary::TABLE_SECTION_ID => {
            let count = reader.read_u32_leb()?;
            for _ in 0..count {
                module.tables.push(decode_table_type(reader)?);
            }
            Ok(())
        }
        binary::MEMORY_SECTION_ID => {
            let count = reader.read_u32_leb()?;
            for _ in 0..count {
                module.memories.push(MemoryType {
                    limits: decode_limits(reader)?,
                });
            }
            Ok(())
        }
        binary::GLOBAL_SECTION_ID => {
            let count = reader.read_u32_leb()?;
            for _ in 0..count {
                let ty = decode_global_type(reader)?;
                let init = decode_expression(reader)?;
                module.globals.push(Global { ty, init });
            }
            Ok(())
        }
        binary::EXPORT_SECTION_ID => {
            let count = reader.read_u32_leb()?;
            for _ in 0..count {
                module.exports.push(decode_export(reader)?);
            }
            Ok(())
        }
        binary::START_SECTION_ID => {
            module.start = Some(reader.read_u32_leb()?);
            Ok(())
        }
        binary::ELEMENT_SECTION_ID => {
            let count = reader.read_u32_leb()?;
            for _ in 0..count {
                module.elements.push(decode_element_segment(reader)?);
            }
            Ok(())
        }
        binary::CODE_SECTION_ID => {
            let count = reader.read_u32_leb()?;
            for _ in 0..count {
                module.code.push(decode_code_entry(reader)?);
            }
            Ok(())
        }
        binary::DATA_SECTION_ID => {
            let count = reader.read_u32_leb()?;
            for _ in 0..count {
                module.data.push(decode_data_segment(reader)?);
            }
            Ok(())
        }
        binary::DATA_COUNT_SECTION_ID => {
            module.data_count = Some(reader.read_u32_leb()?);
            Ok(())
        }
        _ => Err(kinds::unknown_section_id()),
    }
}

fn decode_type_section(reader: &mut BinaryReader<'_>, module: &mut Module) -> Result<()> {
    let count = reader.read_u32_leb()?;
    for _ in 0..count {
        if reader.read_byte()? != binary::FUNC_TYPE_TAG {
            return Err(kinds::unknown_tag());
        }
        let params = decode_value_types(reader)?;
        let results = decode_value_types(reader)?;
        module.types.push(FuncType::new(params, results));
    }
    Ok(())
}

fn decode_value_types(reader: &mut BinaryReader<'_>) -> Result<Vec<ValueType>> {
    let count = reader.read_u32_leb()?;
    let mut types = Vec::new();
    for _ in 0..count {
        types.push(binary::value_type_from_byte(reader.read_byte()?)?);
    }
    Ok(types)
}

fn decode_limits(reader: &mut BinaryReader<'_>) -> Result<Limits> {
    match reader.read_byte()? {
        binary::LIMITS_MIN_ONLY => Ok(Limits::at_least(reader.read_u32_leb()?)),
        binary::LIMITS_MIN_MAX => {
            let min = reader.read_u32_leb()?;
            let max = reader.read_u32_leb()?;
            Ok(Limits::bounded(min, max))
        }
        _ => Err(kinds::unknown_tag()),
    }
}

fn decode_table_type(reader: &mut BinaryReader<'_>) -> Result<TableType> {
    let elem_type = binary::ref_type_from_byte(reader.read_byte()?)?;
    let limits = decode_limits(reader)?;
    Ok(TableType { elem_type, limits })
}

fn decode_global_type(reader: &mut BinaryReader<'_>) -> Result<GlobalType> {
    let value_type = binary::value_type_from_byte(reader.read_byte()?)?;
    let mutability = binary::mutability_from_byte(reader.read_byte()?)?;
    Ok(GlobalType {
        value_type,
        mutability,
    })
}

fn decode_import_section(reader: &mut BinaryReader<'_>, module: &mut Module) -> Result<()> {
    let count = reader.read_u32_leb()?;
    for _ in 0..count {
        let module_name = reader.read_name()?;
        let field = reader.read_name()?;
        let desc = match reader.read_byte()? {
            binary::EXTERNAL_KIND_FUNC => ImportDesc::Func(reader.read_u32_leb()?),
            binary::EXTERNAL_KIND_TABLE => ImportDesc::Table(decode_table_type(reader)?),
            binary::EXTERNAL_KIND_MEMORY => ImportDesc::Memory(MemoryType {
                limits: decode_limits(reader)?,
            }),
            binary::EXTERNAL_KIND_GLOBAL => ImportDesc::Global(decode_global_type(reader)?),
            _ => return Err(kinds::unknown_tag()),
        };
        module.imports.push(Import {
            module: module_name,
            field,
            desc,
        });
    }
    Ok(())
}

fn decode_export(reader: &mut BinaryReader<'_>) -> Result<Export> {
    let name = reader.read_name()?;
    let kind = match reader.read_byte()? {
        binary::EXTERNAL_KIND_FUNC => ExternKind::Func,
        binary::EXTERNAL_KIND_TABLE => ExternKind::Table,
        binary::EXTERNAL_KIND_MEMORY => ExternKind::Memory,
        binary::EXTERNAL_KIND_GLOBAL => ExternKind::Global,
        _ => return Err(kinds::unknown_tag()),
    };
    let index = reader.read_u32_leb()?;
    Ok(Export {
        name,
        kind,
        index,
        symbol: None,
    })
}

fn decode_func_indices(reader: &mut BinaryReader<'_>) -> Result<Vec<u32>> {
    let count = reader.read_u32_leb()?;
    let mut items = Vec::new();
    for _ in 0..count {
        items.push(reader.read_u32_leb()?);
    }
    Ok(items)
}

/// The element-kind byte of the bulk-memory encodings; only `funcref`
/// (0x00) exists in this profile.
fn expect_elem_kind(reader: &mut BinaryReader<'_>) -> Result<()> {
    if reader.read_byte()? != 0x00 {
        return Err(kinds::unknown_tag());
    }
    Ok(())
}

fn decode_element_segment(reader: &mut BinaryReader<'_>) -> Result<ElementSegment> {
    let flags = reader.read_u32_leb()?;
    match flags {
        0 => {
            let offset = decode_expression(reader)?;
            let items = decode_func_indices(reader)?;
            Ok(ElementSegment {
                mode: SegmentMode::Active { index: 0, offset },
                items,
            })
        }
        1 => {
            expect_elem_kind(reader)?;
            let items = decode_func_indices(reader)?;
            Ok(ElementSegment {
                mode: SegmentMode::Passive,
                items,
            })
        }
        2 => {
            let index = reader.read_u32_leb()?;
            let offset = decode_expression(reader)?;
            expect_elem_kind(reader)?;
            let items = decode_func_indices(reader)?;
            Ok(ElementSegment {
                mode: SegmentMode::Active { index, offset },
                items,
            })
        }
        3 => {
            expect_elem_kind(reader)?;
            let items = decode_func_indices(reader)?;
            Ok(ElementSegment {
                mode: SegmentMode::Declared,
                items,
            })
        }
        _ => Err(kinds::unknown_tag()),
    }
}

fn decode_data_segment(reader: &mut BinaryReader<'_>) -> Result<DataSegment> {
    let flags = reader.read_u32_leb()?;
    match flags {
        0 => {
            let offset = decode_expression(reader)?;
            let bytes = reader.read_bytes_vec()?;
            Ok(DataSegment {
                mode: SegmentMode::Active { index: 0, offset },
                bytes,
            })
        }
        1 => {
            let bytes = reader.read_bytes_vec()?;
            Ok(DataSegment {
                mode: SegmentMode::Passive,
                bytes,
            })
        }
        2 => {
            let index = reader.read_u32_leb()?;
            let offset = decode_expression(reader)?;
            let bytes = reader.read_bytes_vec()?;
            Ok(DataSegment {
                mode: SegmentMode::Active { index, offset },
                bytes,
            })
        }
        _ => Err(kinds::unknown_tag()),
    }
}

fn decode_code_entry(reader: &mut BinaryReader<'_>) -> Result<wvm_format::CodeBody> {
    let size = reader.read_u32_leb()? as usize;
    let start = reader.position();
    let body = decode_function_body(reader)?;
    if reader.position() - start != size {
        return Err(kinds::length_mismatch());
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wvm_format::encode_module;

    fn wat(source: &str) -> Vec<u8> {
        wat::parse_str(source).unwrap()
    }

    #[test]
    fn rejects_bad_magic() {
        let err = decode_module(b"\0msa\x01\0\0\0").unwrap_err();
        assert_eq!(err.code, codes::MALFORMED_MAGIC);
    }

    #[test]
    fn rejects_bad_version() {
        let err = decode_module(b"\0asm\x02\0\0\0").unwrap_err();
        assert_eq!(err.code, codes::MALFORMED_VERSION);
    }

    #[test]
    fn decodes_minimal_module() {
        let module = decode_module(&wat("(module)")).unwrap();
        assert!(module.types.is_empty());
        assert!(module.functions.is_empty());
    }

    #[test]
    fn decodes_function_and_export() {
        let module = decode_module(&wat(
            r#"(module
                (func (export "add") (param i32 i32) (result i32)
                    local.get 0
                    local.get 1
                    i32.add))"#,
        ))
        .unwrap();
        assert_eq!(module.types.len(), 1);
        assert_eq!(module.functions, [0]);
        assert_eq!(module.code.len(), 1);
        assert_eq!(module.exports.len(), 1);
        assert_eq!(module.exports[0].name, "add");
        assert_eq!(module.exports[0].kind, ExternKind::Func);
    }

    #[test]
    fn rejects_out_of_order_sections() {
        // A function section (id 3) followed by a type section (id 1).
        let mut bytes = Vec::from(&b"\0asm\x01\0\0\0"[..]);
        bytes.extend([0x03, 0x01, 0x00]); // empty function section
        bytes.extend([0x01, 0x01, 0x00]); // empty type section
        let err = decode_module(&bytes).unwrap_err();
        assert_eq!(err.code, codes::SECTION_OUT_OF_ORDER);
    }

    #[test]
    fn rejects_duplicate_sections() {
        let mut bytes = Vec::from(&b"\0asm\x01\0\0\0"[..]);
        bytes.extend([0x01, 0x01, 0x00]);
        bytes.extend([0x01, 0x01, 0x00]);
        let err = decode_module(&bytes).unwrap_err();
        assert_eq!(err.code, codes::SECTION_OUT_OF_ORDER);
    }

    #[test]
    fn rejects_section_length_mismatch() {
        let mut bytes = Vec::from(&b"\0asm\x01\0\0\0"[..]);
        // Type section claims 2 bytes but its count (0) only uses 1.
        bytes.extend([0x01, 0x02, 0x00, 0x60]);
        let err = decode_module(&bytes).unwrap_err();
        assert_eq!(err.code, codes::LENGTH_MISMATCH);
    }

    #[test]
    fn custom_sections_are_preserved() {
        let mut bytes = Vec::from(&b"\0asm\x01\0\0\0"[..]);
        // custom section: name "note", payload [1, 2]
        bytes.extend([0x00, 0x07, 0x04]);
        bytes.extend(b"note");
        bytes.extend([0x01, 0x02]);
        let module = decode_module(&bytes).unwrap();
        assert_eq!(module.custom_sections.len(), 1);
        assert_eq!(module.custom_sections[0].name, "note");
        assert_eq!(module.custom_sections[0].data, [1, 2]);
        assert_eq!(module.custom_sections[0].placement, 0);
    }

    #[test]
    fn passive_data_segment_and_data_count() {
        // A passive segment makes the assembler emit a DataCount
        // section too.
        let module = decode_module(&wat(r#"(module (memory 1) (data "abc"))"#)).unwrap();
        assert_eq!(module.data_count, Some(1));
        assert_eq!(module.data.len(), 1);
        assert!(matches!(
            module.data[0].mode,
            wvm_format::SegmentMode::Passive
        ));
        assert_eq!(module.data[0].bytes, b"abc");
    }

    #[test]
    fn rejects_data_count_mismatch() {
        let mut bytes = Vec::from(&b"\0asm\x01\0\0\0"[..]);
        // DataCount section claims one segment, data section absent.
        bytes.extend([0x0C, 0x01, 0x01]);
        let err = decode_module(&bytes).unwrap_err();
        assert_eq!(err.code, codes::LENGTH_MISMATCH);
    }

    #[test]
    fn roundtrips_canonical_binaries() {
        for source in [
            "(module)",
            r#"(module
                (func (export "add") (param i32 i32) (result i32)
                    local.get 0
                    local.get 1
                    i32.add))"#,
            r#"(module
                (memory 1 2)
                (data (i32.const 8) "hi")
                (table 2 funcref)
                (global $g (mut i32) (i32.const 41))
                (func $f (result i32) (global.get $g))
                (elem (i32.const 0) $f)
                (export "f" (func $f)))"#,
            r#"(module
                (func (result f32) (f32.const 0x1.8p0))
                (func (param i64) (result i64)
                    (local i64 i64)
                    local.get 0
                    (if (result i64) (i64.eqz (local.get 0))
                        (then (i64.const 1))
                        (else (local.get 0)))
                    i64.add))"#,
        ] {
            let bytes = wat(source);
            let module = decode_module(&bytes).unwrap();
            assert_eq!(encode_module(&module), bytes, "roundtrip failed for {source}");
        }
    }
}
