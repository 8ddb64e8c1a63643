// WVM - wvm-error
// Module: WVM Error Kinds
//
// Copyright (c) 2025 The WVM Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Factory functions for the errors the VM raises on its hot paths.
//!
//! Each function returns a fully-formed [`Error`] with the canonical
//! message for that failure, so call sites stay one line.

use crate::codes;
use crate::errors::{Error, ErrorCategory};

/// Input ended before a complete value could be read.
#[must_use]
pub const fn unexpected_end() -> Error {
    Error::decode_error(codes::UNEXPECTED_END, "unexpected end of input")
}

/// LEB128 integer is over-long or does not fit its target width.
#[must_use]
pub const fn malformed_leb() -> Error {
    Error::decode_error(codes::MALFORMED_LEB, "malformed LEB128 integer")
}

/// Module magic is not `\0asm`.
#[must_use]
pub const fn malformed_magic() -> Error {
    Error::decode_error(codes::MALFORMED_MAGIC, "magic header not detected")
}

/// Module version is not 1.
#[must_use]
pub const fn malformed_version() -> Error {
    Error::decode_error(codes::MALFORMED_VERSION, "unknown binary version")
}

/// Name bytes are not valid UTF-8.
#[must_use]
pub const fn malformed_utf8() -> Error {
    Error::decode_error(codes::MALFORMED_UTF8, "malformed UTF-8 encoding")
}

/// Section id outside the known range.
#[must_use]
pub const fn unknown_section_id() -> Error {
    Error::decode_error(codes::UNKNOWN_SECTION_ID, "unknown section id")
}

/// Non-custom section duplicated or out of canonical order.
#[must_use]
pub const fn section_out_of_order() -> Error {
    Error::decode_error(codes::SECTION_OUT_OF_ORDER, "section out of order")
}

/// Declared size of a section or body does not match its content.
#[must_use]
pub const fn length_mismatch() -> Error {
    Error::decode_error(codes::LENGTH_MISMATCH, "section size mismatch")
}

/// Opcode byte is not a known instruction.
#[must_use]
pub const fn unknown_opcode() -> Error {
    Error::decode_error(codes::UNKNOWN_OPCODE, "unknown opcode")
}

/// Tag byte of a limit, element type, or mutability is out of range.
#[must_use]
pub const fn unknown_tag() -> Error {
    Error::decode_error(codes::UNKNOWN_TAG, "unknown enum tag")
}

/// Import could not be resolved in the store.
#[must_use]
pub const fn unknown_import() -> Error {
    Error::link_error(codes::UNKNOWN_IMPORT, "unknown import")
}

/// Resolved export does not satisfy the import descriptor.
#[must_use]
pub const fn incompatible_import_type() -> Error {
    Error::link_error(codes::INCOMPATIBLE_IMPORT_TYPE, "incompatible import type")
}

/// A module with this name is already registered.
#[must_use]
pub const fn module_name_conflict() -> Error {
    Error::link_error(codes::MODULE_NAME_CONFLICT, "module name conflict")
}

/// Active element segment does not fit its table.
#[must_use]
pub const fn elem_segment_out_of_bounds() -> Error {
    Error::instantiation_error(
        codes::ELEMENT_SEGMENT_OUT_OF_BOUNDS,
        "element segment does not fit",
    )
}

/// Active data segment does not fit its memory.
#[must_use]
pub const fn data_segment_out_of_bounds() -> Error {
    Error::instantiation_error(
        codes::DATA_SEGMENT_OUT_OF_BOUNDS,
        "data segment does not fit",
    )
}

/// `unreachable` executed.
#[must_use]
pub const fn trap_unreachable() -> Error {
    Error::trap(codes::TRAP_UNREACHABLE, "unreachable executed")
}

/// Integer division or remainder by zero.
#[must_use]
pub const fn integer_divide_by_zero() -> Error {
    Error::trap(codes::INTEGER_DIVIDE_BY_ZERO, "integer divide by zero")
}

/// Signed integer overflow in division.
#[must_use]
pub const fn integer_overflow() -> Error {
    Error::trap(codes::INTEGER_OVERFLOW, "integer overflow")
}

/// Truncation of NaN or an out-of-range float to an integer.
#[must_use]
pub const fn invalid_conversion_to_integer() -> Error {
    Error::trap(
        codes::INVALID_CONVERSION_TO_INTEGER,
        "invalid conversion to integer",
    )
}

/// Memory access outside the current memory size.
#[must_use]
pub const fn out_of_bounds_memory_access() -> Error {
    Error::trap(
        codes::OUT_OF_BOUNDS_MEMORY_ACCESS,
        "out of bounds memory access",
    )
}

/// Table access outside the current table size.
#[must_use]
pub const fn out_of_bounds_table_access() -> Error {
    Error::trap(
        codes::OUT_OF_BOUNDS_TABLE_ACCESS,
        "out of bounds table access",
    )
}

/// `call_indirect` through a table slot that holds no function.
#[must_use]
pub const fn uninitialized_element() -> Error {
    Error::trap(codes::UNINITIALIZED_ELEMENT, "uninitialized element")
}

/// `call_indirect` target type mismatch.
#[must_use]
pub const fn indirect_call_type_mismatch() -> Error {
    Error::trap(
        codes::INDIRECT_CALL_TYPE_MISMATCH,
        "indirect call type mismatch",
    )
}

/// Call depth limit reached.
#[must_use]
pub const fn call_stack_exhausted() -> Error {
    Error::trap(codes::CALL_STACK_EXHAUSTED, "call stack exhausted")
}

/// Trap raised inside a host function.
#[must_use]
pub const fn host_trap() -> Error {
    Error::trap(codes::HOST_TRAP, "host function trap")
}

/// Store address that does not resolve to a live entity.
#[must_use]
pub const fn invalid_address(_kind: &'static str) -> Error {
    Error::resource_error(codes::INVALID_ADDRESS, "invalid store address")
}

/// Validation failure with a caller-supplied message.
#[must_use]
pub const fn validation_error(message: &'static str) -> Error {
    Error::validation_error(codes::TYPE_MISMATCH, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_functions_carry_their_codes() {
        assert_eq!(trap_unreachable().code, codes::TRAP_UNREACHABLE);
        assert_eq!(malformed_leb().code, codes::MALFORMED_LEB);
        assert_eq!(
            incompatible_import_type().category,
            ErrorCategory::Link
        );
    }
}
