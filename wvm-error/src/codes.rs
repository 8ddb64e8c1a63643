// WVM - wvm-error
// Module: WVM Error Codes
//
// Copyright (c) 2025 The WVM Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error codes for WVM.
//!
//! Codes are grouped by category in bands of 1000. A code is unique
//! across the whole VM, so `(category, code)` and `code` identify the
//! same failure.

// Decode errors (1000-1999)

/// Input ended in the middle of a value or section
pub const UNEXPECTED_END: u16 = 1000;
/// Over-long or overflowing LEB128 integer
pub const MALFORMED_LEB: u16 = 1001;
/// Module does not start with `\0asm`
pub const MALFORMED_MAGIC: u16 = 1002;
/// Module version field is not 1
pub const MALFORMED_VERSION: u16 = 1003;
/// Name is not valid UTF-8
pub const MALFORMED_UTF8: u16 = 1004;
/// Section id outside 0..=12
pub const UNKNOWN_SECTION_ID: u16 = 1005;
/// Non-custom section out of canonical order or duplicated
pub const SECTION_OUT_OF_ORDER: u16 = 1006;
/// Declared byte count does not match consumed bytes
pub const LENGTH_MISMATCH: u16 = 1007;
/// Opcode byte is not a known instruction
pub const UNKNOWN_OPCODE: u16 = 1008;
/// Enum tag byte (limit flag, element type, mutability) out of range
pub const UNKNOWN_TAG: u16 = 1009;

// Validation errors (2000-2999)

/// Operand or result type does not match the expected type
pub const TYPE_MISMATCH: u16 = 2000;
/// Type index out of range
pub const UNKNOWN_TYPE_INDEX: u16 = 2001;
/// Function index out of range
pub const UNKNOWN_FUNC_INDEX: u16 = 2002;
/// Table index out of range
pub const UNKNOWN_TABLE_INDEX: u16 = 2003;
/// Memory index out of range
pub const UNKNOWN_MEMORY_INDEX: u16 = 2004;
/// Global index out of range
pub const UNKNOWN_GLOBAL_INDEX: u16 = 2005;
/// Local index out of range
pub const UNKNOWN_LOCAL_INDEX: u16 = 2006;
/// Branch label depth out of range
pub const UNKNOWN_LABEL: u16 = 2007;
/// Load/store alignment exceeds the access width
pub const INVALID_ALIGNMENT: u16 = 2008;
/// `global.set` on an immutable global
pub const IMMUTABLE_GLOBAL_STORE: u16 = 2009;
/// Two exports share a name
pub const DUPLICATE_EXPORT: u16 = 2010;
/// Start function is not `[] -> []`
pub const INVALID_START_TYPE: u16 = 2011;
/// Limit with min greater than max, or memory min above 65536 pages
pub const INVALID_LIMIT: u16 = 2012;
/// Expression is not a constant expression
pub const INVALID_CONSTANT_EXPRESSION: u16 = 2013;

// Link errors (3000-3999)

/// Import target module or field is not registered
pub const UNKNOWN_IMPORT: u16 = 3000;
/// Resolved export does not satisfy the import descriptor
pub const INCOMPATIBLE_IMPORT_TYPE: u16 = 3001;
/// A module with the same name is already registered
pub const MODULE_NAME_CONFLICT: u16 = 3002;

// Instantiation errors (4000-4999)

/// Active element segment does not fit in the table
pub const ELEMENT_SEGMENT_OUT_OF_BOUNDS: u16 = 4000;
/// Active data segment does not fit in the memory
pub const DATA_SEGMENT_OUT_OF_BOUNDS: u16 = 4001;
/// Global initializer reads a global that is not imported
pub const GLOBAL_INIT_REFS_NON_IMPORT: u16 = 4002;

// Traps (5000-5999)

/// `unreachable` executed
pub const TRAP_UNREACHABLE: u16 = 5000;
/// Integer division or remainder by zero
pub const INTEGER_DIVIDE_BY_ZERO: u16 = 5001;
/// Signed division overflow (`INT_MIN / -1`)
pub const INTEGER_OVERFLOW: u16 = 5002;
/// Float-to-integer truncation of NaN or an out-of-range value
pub const INVALID_CONVERSION_TO_INTEGER: u16 = 5003;
/// Memory access outside the current memory size
pub const OUT_OF_BOUNDS_MEMORY_ACCESS: u16 = 5004;
/// Table access outside the current table size
pub const OUT_OF_BOUNDS_TABLE_ACCESS: u16 = 5005;
/// `call_indirect` through a null table slot
pub const UNINITIALIZED_ELEMENT: u16 = 5006;
/// `call_indirect` target type does not match the expected type
pub const INDIRECT_CALL_TYPE_MISMATCH: u16 = 5007;
/// Call depth limit reached
pub const CALL_STACK_EXHAUSTED: u16 = 5008;
/// Trap raised by a host function
pub const HOST_TRAP: u16 = 5009;

// Runtime errors (6000-6999)

/// Operand stack popped while empty
pub const STACK_UNDERFLOW: u16 = 6000;
/// Frame or label stack in an impossible state
pub const INVALID_FRAME: u16 = 6001;
/// Runtime value had an unexpected type
pub const VALUE_TYPE_MISMATCH: u16 = 6002;
/// Instruction cursor moved outside the current body
pub const INSTRUCTION_INDEX_OUT_OF_BOUNDS: u16 = 6003;
/// Operation not supported in the current mode
pub const UNSUPPORTED: u16 = 6004;

// Resource errors (7000-7999)

/// Store address does not resolve to a live entity
pub const INVALID_ADDRESS: u16 = 7000;
/// Export name not found in the module instance
pub const EXPORT_NOT_FOUND: u16 = 7001;
/// Module name not found in the store
pub const MODULE_NOT_FOUND: u16 = 7002;
/// Function arguments do not match the function type
pub const INVALID_ARGUMENTS: u16 = 7003;
/// Memory allocation beyond the configured page cap
pub const MEMORY_LIMIT_EXCEEDED: u16 = 7004;
