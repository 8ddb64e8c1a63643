//! The runtime value representation.

use core::fmt;

use wvm_math::{FloatBits32, FloatBits64};

use crate::types::ValueType;

/// A typed 64-bit value as it lives on the operand stack, in locals,
/// and in globals.
///
/// Floats are stored as bit patterns; use [`FloatBits32::value`] to get
/// an `f32` out and [`FloatBits32::from_float`] to put one in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// A 32-bit integer
    I32(i32),
    /// A 64-bit integer
    I64(i64),
    /// A 32-bit float
    F32(FloatBits32),
    /// A 64-bit float
    F64(FloatBits64),
}

impl Value {
    /// The type tag of this value.
    #[must_use]
    pub const fn type_of(&self) -> ValueType {
        match self {
            Self::I32(_) => ValueType::I32,
            Self::I64(_) => ValueType::I64,
            Self::F32(_) => ValueType::F32,
            Self::F64(_) => ValueType::F64,
        }
    }

    /// The zero value of the given type, used for locals and fresh
    /// globals.
    #[must_use]
    pub const fn default_for(ty: ValueType) -> Self {
        match ty {
            ValueType::I32 => Self::I32(0),
            ValueType::I64 => Self::I64(0),
            ValueType::F32 => Self::F32(FloatBits32(0)),
            ValueType::F64 => Self::F64(FloatBits64(0)),
        }
    }

    /// The i32 payload, if this is an i32.
    #[must_use]
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// The i32 payload reinterpreted as unsigned.
    #[must_use]
    pub const fn as_u32(&self) -> Option<u32> {
        match self {
            Self::I32(v) => Some(*v as u32),
            _ => None,
        }
    }

    /// The i64 payload, if this is an i64.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// The i64 payload reinterpreted as unsigned.
    #[must_use]
    pub const fn as_u64(&self) -> Option<u64> {
        match self {
            Self::I64(v) => Some(*v as u64),
            _ => None,
        }
    }

    /// The f32 bits, if this is an f32.
    #[must_use]
    pub const fn as_f32(&self) -> Option<FloatBits32> {
        match self {
            Self::F32(v) => Some(*v),
            _ => None,
        }
    }

    /// The f64 bits, if this is an f64.
    #[must_use]
    pub const fn as_f64(&self) -> Option<FloatBits64> {
        match self {
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::I32(v as i32)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::I64(v as i64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::F32(FloatBits32::from_float(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::F64(FloatBits64::from_float(v))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I32(v) => write!(f, "{v}:i32"),
            Self::I64(v) => write!(f, "{v}:i64"),
            Self::F32(v) => write!(f, "{}:f32", v.value()),
            Self::F64(v) => write!(f, "{}:f64", v.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors() {
        let v = Value::I32(-1);
        assert_eq!(v.type_of(), ValueType::I32);
        assert_eq!(v.as_i32(), Some(-1));
        assert_eq!(v.as_u32(), Some(u32::MAX));
        assert_eq!(v.as_i64(), None);
    }

    #[test]
    fn defaults_are_zero() {
        assert_eq!(Value::default_for(ValueType::F64), Value::from(0.0f64));
        assert_eq!(Value::default_for(ValueType::I64), Value::I64(0));
    }

    #[test]
    fn float_values_keep_bits() {
        let v = Value::F32(FloatBits32::from_bits(0x7fc0_0001));
        assert_eq!(v.as_f32().unwrap().to_bits(), 0x7fc0_0001);
    }
}
