//! WebAssembly global instances.

use wvm_error::{codes, Error, Result};
use wvm_types::{GlobalType, Mutability, Value};

/// A global variable instance.
#[derive(Debug, Clone, Copy)]
pub struct GlobalInstance {
    ty: GlobalType,
    value: Value,
}

impl GlobalInstance {
    /// Create a global holding `value`.
    #[must_use]
    pub const fn new(ty: GlobalType, value: Value) -> Self {
        Self { ty, value }
    }

    /// Declared type and mutability.
    #[must_use]
    pub const fn ty(&self) -> GlobalType {
        self.ty
    }

    /// Current value.
    #[must_use]
    pub const fn get(&self) -> Value {
        self.value
    }

    /// Replace the value.
    ///
    /// Validation statically forbids writing an immutable global, so
    /// the mutability check here is an assertion, not a trap.
    pub fn set(&mut self, value: Value) -> Result<()> {
        debug_assert!(
            self.ty.mutability == Mutability::Var,
            "validated code never writes an immutable global"
        );
        if value.type_of() != self.ty.value_type {
            return Err(Error::runtime_error(
                codes::VALUE_TYPE_MISMATCH,
                "global write with the wrong value type",
            ));
        }
        self.value = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wvm_types::ValueType;

    #[test]
    fn set_rejects_wrong_type() {
        let mut global = GlobalInstance::new(
            GlobalType {
                value_type: ValueType::I32,
                mutability: Mutability::Var,
            },
            Value::I32(1),
        );
        assert!(global.set(Value::I64(2)).is_err());
        global.set(Value::I32(2)).unwrap();
        assert_eq!(global.get(), Value::I32(2));
    }
}
