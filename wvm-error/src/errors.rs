// WVM - wvm-error
// Module: WVM Error Types
//
// Copyright (c) 2025 The WVM Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The [`Error`] type and its category enumeration.

use core::fmt;

use crate::codes;

/// Error categories for WVM operations.
///
/// The first five categories mirror the phases a module passes through
/// on its way from bytes to a running instance. `Runtime` and
/// `Resource` cover internal engine and store failures that a valid
/// module never produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCategory {
    /// Binary decoding failures
    Decode = 1,
    /// Module validation failures
    Validation = 2,
    /// Import resolution failures
    Link = 3,
    /// Instantiation protocol failures
    Instantiation = 4,
    /// WebAssembly execution traps
    Trap = 5,
    /// Internal engine failures
    Runtime = 6,
    /// Store and embedding-API failures
    Resource = 7,
}

impl ErrorCategory {
    /// Process exit bucket for host drivers wrapping the core.
    ///
    /// Zero is reserved for success; every category maps onto a stable
    /// non-zero bucket.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Decode => 1,
            Self::Validation => 2,
            Self::Link => 3,
            Self::Instantiation => 4,
            Self::Trap => 5,
            Self::Runtime | Self::Resource => 6,
        }
    }
}

/// WVM error type.
///
/// Errors are plain values: a category, a code from [`codes`], and a
/// static message. They are `Copy`, so propagating them never
/// allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error {
    /// Error category
    pub category: ErrorCategory,
    /// Error code
    pub code: u16,
    /// Error message
    pub message: &'static str,
}

impl Error {
    /// Create a new error.
    #[must_use]
    pub const fn new(category: ErrorCategory, code: u16, message: &'static str) -> Self {
        Self {
            category,
            code,
            message,
        }
    }

    /// Check if this is a decode error.
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        self.category == ErrorCategory::Decode
    }

    /// Check if this is a validation error.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        self.category == ErrorCategory::Validation
    }

    /// Check if this is a link error.
    #[must_use]
    pub fn is_link_error(&self) -> bool {
        self.category == ErrorCategory::Link
    }

    /// Check if this is an instantiation error.
    #[must_use]
    pub fn is_instantiation_error(&self) -> bool {
        self.category == ErrorCategory::Instantiation
    }

    /// Check if this is an execution trap.
    #[must_use]
    pub fn is_trap(&self) -> bool {
        self.category == ErrorCategory::Trap
    }

    /// Create a decode error.
    #[must_use]
    pub const fn decode_error(code: u16, message: &'static str) -> Self {
        Self::new(ErrorCategory::Decode, code, message)
    }

    /// Create a validation error.
    #[must_use]
    pub const fn validation_error(code: u16, message: &'static str) -> Self {
        Self::new(ErrorCategory::Validation, code, message)
    }

    /// Create a link error.
    #[must_use]
    pub const fn link_error(code: u16, message: &'static str) -> Self {
        Self::new(ErrorCategory::Link, code, message)
    }

    /// Create an instantiation error.
    #[must_use]
    pub const fn instantiation_error(code: u16, message: &'static str) -> Self {
        Self::new(ErrorCategory::Instantiation, code, message)
    }

    /// Create a trap.
    #[must_use]
    pub const fn trap(code: u16, message: &'static str) -> Self {
        Self::new(ErrorCategory::Trap, code, message)
    }

    /// Create a runtime error.
    #[must_use]
    pub const fn runtime_error(code: u16, message: &'static str) -> Self {
        Self::new(ErrorCategory::Runtime, code, message)
    }

    /// Create a resource error.
    #[must_use]
    pub const fn resource_error(code: u16, message: &'static str) -> Self {
        Self::new(ErrorCategory::Resource, code, message)
    }

    /// Runtime stack underflow error.
    #[must_use]
    pub const fn stack_underflow() -> Self {
        Self::runtime_error(codes::STACK_UNDERFLOW, "operand stack underflow")
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}:{}] {}",
            self.category, self.code, self.message
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_predicates() {
        let trap = Error::trap(codes::TRAP_UNREACHABLE, "unreachable executed");
        assert!(trap.is_trap());
        assert!(!trap.is_decode_error());

        let decode = Error::decode_error(codes::UNEXPECTED_END, "unexpected end of input");
        assert!(decode.is_decode_error());
        assert_eq!(decode.category.exit_code(), 1);
    }

    #[test]
    fn errors_compare_by_value() {
        let a = Error::trap(codes::INTEGER_OVERFLOW, "integer overflow");
        let b = Error::trap(codes::INTEGER_OVERFLOW, "integer overflow");
        assert_eq!(a, b);
    }
}
