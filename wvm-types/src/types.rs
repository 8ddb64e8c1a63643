//! The WebAssembly MVP type grammar.

use core::fmt;

use wvm_error::{codes, Error, Result};

use crate::prelude::Vec;

/// Maximum number of 64 KiB pages a memory type may declare.
pub const MAX_MEMORY_PAGES: u32 = 65536;

/// A WebAssembly value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    /// 32-bit integer
    #[default]
    I32,
    /// 64-bit integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// A reference type. The MVP has exactly one: `funcref`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RefType {
    /// Reference to a function
    #[default]
    FuncRef,
}

/// Global mutability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mutability {
    /// Immutable
    #[default]
    Const,
    /// Mutable
    Var,
}

/// Size bounds of a table or memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Limits {
    /// Minimum size
    pub min: u32,
    /// Optional maximum size
    pub max: Option<u32>,
}

impl Limits {
    /// Limits with only a minimum.
    #[must_use]
    pub const fn at_least(min: u32) -> Self {
        Self { min, max: None }
    }

    /// Limits with a minimum and a maximum.
    #[must_use]
    pub const fn bounded(min: u32, max: u32) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    /// Check the structural invariant `min <= max`.
    pub fn validate(&self) -> Result<()> {
        match self.max {
            Some(max) if self.min > max => Err(Error::validation_error(
                codes::INVALID_LIMIT,
                "limit minimum exceeds maximum",
            )),
            _ => Ok(()),
        }
    }

    /// The import-subtyping relation.
    ///
    /// `self` is the exporter's actual limits, `required` the limits an
    /// import declares. The exporter satisfies the import when its
    /// minimum is at least the required minimum and, if the import
    /// bounds the maximum, the exporter is bounded at least as tightly.
    #[must_use]
    pub fn is_subtype_of(&self, required: &Limits) -> bool {
        if self.min < required.min {
            return false;
        }
        match (required.max, self.max) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(req), Some(have)) => have <= req,
        }
    }
}

/// A function type: parameter and result sequences.
///
/// Result arity is carried as `0..=n`; the MVP restriction to at most
/// one result is enforced by the validator, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FuncType {
    /// Parameter types, in order
    pub params: Vec<ValueType>,
    /// Result types, in order
    pub results: Vec<ValueType>,
}

impl FuncType {
    /// Create a function type.
    #[must_use]
    pub fn new(params: Vec<ValueType>, results: Vec<ValueType>) -> Self {
        Self { params, results }
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{p}")?;
        }
        f.write_str("] -> [")?;
        for (i, r) in self.results.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{r}")?;
        }
        f.write_str("]")
    }
}

/// A table type: element type plus limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableType {
    /// Element type
    pub elem_type: RefType,
    /// Size limits, in elements
    pub limits: Limits,
}

/// A memory type: limits measured in 64 KiB pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryType {
    /// Size limits, in pages
    pub limits: Limits,
}

impl MemoryType {
    /// Check the page-count invariants.
    pub fn validate(&self) -> Result<()> {
        self.limits.validate()?;
        if self.limits.min > MAX_MEMORY_PAGES
            || self.limits.max.is_some_and(|max| max > MAX_MEMORY_PAGES)
        {
            return Err(Error::validation_error(
                codes::INVALID_LIMIT,
                "memory limit exceeds 65536 pages",
            ));
        }
        Ok(())
    }
}

/// A global type: value type plus mutability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalType {
    /// Value type of the global
    pub value_type: ValueType,
    /// Whether the global may be written
    pub mutability: Mutability,
}

/// The kind of an importable or exportable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternKind {
    /// A function
    Func,
    /// A table
    Table,
    /// A memory
    Memory,
    /// A global
    Global,
}

/// The type of a structured control instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockType {
    /// No result
    #[default]
    Empty,
    /// One result of the given type
    Value(ValueType),
}

impl BlockType {
    /// Number of values a branch to this block carries.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Value(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::vec;

    #[test]
    fn limit_validation() {
        assert!(Limits::bounded(1, 2).validate().is_ok());
        assert!(Limits::bounded(3, 2).validate().is_err());
        assert!(Limits::at_least(u32::MAX).validate().is_ok());
    }

    #[test]
    fn memory_page_cap() {
        assert!(MemoryType {
            limits: Limits::at_least(65536)
        }
        .validate()
        .is_ok());
        assert!(MemoryType {
            limits: Limits::at_least(65537)
        }
        .validate()
        .is_err());
    }

    #[test]
    fn limit_subtyping() {
        // Exporter at least as large, at most as bounded.
        assert!(Limits::bounded(2, 4).is_subtype_of(&Limits::at_least(1)));
        assert!(Limits::bounded(2, 4).is_subtype_of(&Limits::bounded(2, 4)));
        assert!(!Limits::at_least(2).is_subtype_of(&Limits::bounded(2, 4)));
        assert!(!Limits::bounded(1, 4).is_subtype_of(&Limits::bounded(2, 4)));
        assert!(!Limits::bounded(2, 5).is_subtype_of(&Limits::bounded(2, 4)));
    }

    #[test]
    fn func_type_display() {
        let ty = FuncType::new(vec![ValueType::I32, ValueType::I32], vec![ValueType::I32]);
        assert_eq!(crate::prelude::format!("{ty}"), "[i32 i32] -> [i32]");
    }
}
