//! The stack manager: operand, label, and frame stacks as explicit
//! arrays.
//!
//! Frames and labels never live on the host call stack, which makes
//! unwinding on a trap a pair of truncations. A frame records where
//! its locals begin on the operand stack (parameters followed by
//! zeroed locals) and how deep the label stack was at entry; a label
//! records its branch arity, the cursor continuation, and the operand
//! height a branch rewinds to.

use wvm_error::{codes, Error, Result};
use wvm_math::{FloatBits32, FloatBits64};
use wvm_types::Value;

use crate::prelude::Vec;

/// What pushed a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// A `block` (or the function body itself)
    Block,
    /// A `loop`; branches re-enter at the header
    Loop,
    /// An `if`/`else`
    If,
}

/// A control-flow target for branches.
#[derive(Debug, Clone, Copy)]
pub struct Label {
    /// Values a branch to this label carries
    pub arity: u32,
    /// Cursor position execution continues at after a branch
    pub continuation: u32,
    /// What pushed the label
    pub kind: LabelKind,
    /// Operand stack height at label entry
    pub value_base: usize,
}

/// One call frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    /// Store address of the frame's module instance
    pub module_addr: u32,
    /// Number of results the function returns
    pub arity: u32,
    /// Operand stack index where params and locals begin
    pub local_base: usize,
    /// Label stack depth at frame entry
    pub label_base: usize,
}

/// The operand, label, and frame stacks of one execution thread.
#[derive(Debug, Default)]
pub struct StackManager {
    values: Vec<Value>,
    labels: Vec<Label>,
    frames: Vec<Frame>,
}

impl StackManager {
    /// Create empty stacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything.
    pub fn reset(&mut self) {
        self.values.clear();
        self.labels.clear();
        self.frames.clear();
    }

    // --- operand stack ---

    /// Current operand stack height.
    #[must_use]
    pub fn value_height(&self) -> usize {
        self.values.len()
    }

    /// Push a value.
    pub fn push_value(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Pop a value.
    pub fn pop_value(&mut self) -> Result<Value> {
        self.values.pop().ok_or_else(Error::stack_underflow)
    }

    /// Pop an i32 payload.
    pub fn pop_i32(&mut self) -> Result<i32> {
        self.pop_value()?
            .as_i32()
            .ok_or_else(|| value_type_error("i32"))
    }

    /// Pop an i32 payload reinterpreted as unsigned.
    pub fn pop_u32(&mut self) -> Result<u32> {
        self.pop_value()?
            .as_u32()
            .ok_or_else(|| value_type_error("i32"))
    }

    /// Pop an i64 payload.
    pub fn pop_i64(&mut self) -> Result<i64> {
        self.pop_value()?
            .as_i64()
            .ok_or_else(|| value_type_error("i64"))
    }

    /// Pop an i64 payload reinterpreted as unsigned.
    pub fn pop_u64(&mut self) -> Result<u64> {
        self.pop_value()?
            .as_u64()
            .ok_or_else(|| value_type_error("i64"))
    }

    /// Pop an f32 bit pattern.
    pub fn pop_f32(&mut self) -> Result<FloatBits32> {
        self.pop_value()?
            .as_f32()
            .ok_or_else(|| value_type_error("f32"))
    }

    /// Pop an f64 bit pattern.
    pub fn pop_f64(&mut self) -> Result<FloatBits64> {
        self.pop_value()?
            .as_f64()
            .ok_or_else(|| value_type_error("f64"))
    }

    /// Pop `count` values, preserving their stack order.
    pub fn pop_values(&mut self, count: usize) -> Result<Vec<Value>> {
        if self.values.len() < count {
            return Err(Error::stack_underflow());
        }
        Ok(self.values.split_off(self.values.len() - count))
    }

    /// Push a slice of values in order.
    pub fn push_values(&mut self, values: &[Value]) {
        self.values.extend_from_slice(values);
    }

    /// Shrink the operand stack to `height`.
    pub fn truncate_values(&mut self, height: usize) {
        self.values.truncate(height);
    }

    // --- locals ---

    /// Read local `index` of the current frame.
    pub fn get_local(&self, index: u32) -> Result<Value> {
        let frame = self.current_frame()?;
        self.values
            .get(frame.local_base + index as usize)
            .copied()
            .ok_or_else(|| invalid_frame("local index outside the frame"))
    }

    /// Write local `index` of the current frame.
    pub fn set_local(&mut self, index: u32, value: Value) -> Result<()> {
        let base = self.current_frame()?.local_base;
        let slot = self
            .values
            .get_mut(base + index as usize)
            .ok_or_else(|| invalid_frame("local index outside the frame"))?;
        *slot = value;
        Ok(())
    }

    // --- label stack ---

    /// Current label stack depth.
    #[must_use]
    pub fn label_height(&self) -> usize {
        self.labels.len()
    }

    /// Push a label.
    pub fn push_label(&mut self, label: Label) {
        self.labels.push(label);
    }

    /// Pop the innermost label.
    pub fn pop_label(&mut self) -> Result<Label> {
        self.labels
            .pop()
            .ok_or_else(|| invalid_frame("label stack empty"))
    }

    /// The label `depth` levels out from the innermost.
    pub fn label(&self, depth: u32) -> Result<Label> {
        let len = self.labels.len();
        len.checked_sub(1 + depth as usize)
            .and_then(|i| self.labels.get(i))
            .copied()
            .ok_or_else(|| invalid_frame("branch depth outside the frame"))
    }

    /// Drop the innermost `depth + 1` labels (the branch target
    /// included).
    pub fn drop_labels(&mut self, depth: u32) -> Result<()> {
        let len = self.labels.len();
        let keep = len
            .checked_sub(1 + depth as usize)
            .ok_or_else(|| invalid_frame("branch depth outside the frame"))?;
        self.labels.truncate(keep);
        Ok(())
    }

    /// Shrink the label stack to `height`.
    pub fn truncate_labels(&mut self, height: usize) {
        self.labels.truncate(height);
    }

    // --- frame stack ---

    /// Current call depth.
    #[must_use]
    pub fn frame_height(&self) -> usize {
        self.frames.len()
    }

    /// Push a frame whose locals start at `local_base`.
    pub fn push_frame(&mut self, module_addr: u32, arity: u32, local_base: usize) {
        self.frames.push(Frame {
            module_addr,
            arity,
            local_base,
            label_base: self.labels.len(),
        });
    }

    /// Pop the innermost frame.
    pub fn pop_frame(&mut self) -> Result<Frame> {
        self.frames
            .pop()
            .ok_or_else(|| invalid_frame("frame stack empty"))
    }

    /// The innermost frame.
    pub fn current_frame(&self) -> Result<&Frame> {
        self.frames
            .last()
            .ok_or_else(|| invalid_frame("no active frame"))
    }
}

fn value_type_error(_expected: &'static str) -> Error {
    Error::runtime_error(
        codes::VALUE_TYPE_MISMATCH,
        "operand has the wrong value type",
    )
}

fn invalid_frame(message: &'static str) -> Error {
    Error::runtime_error(codes::INVALID_FRAME, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_pops() {
        let mut stack = StackManager::new();
        stack.push_value(Value::I32(-1));
        assert_eq!(stack.pop_u32().unwrap(), u32::MAX);
        stack.push_value(Value::I64(1));
        assert_eq!(
            stack.pop_f32().unwrap_err().code,
            codes::VALUE_TYPE_MISMATCH
        );
    }

    #[test]
    fn locals_live_at_the_frame_base() {
        let mut stack = StackManager::new();
        stack.push_value(Value::I32(10)); // param 0
        stack.push_value(Value::I32(20)); // param 1
        stack.push_frame(0, 1, 0);
        stack.push_value(Value::I32(0)); // a zeroed local
        assert_eq!(stack.get_local(1).unwrap(), Value::I32(20));
        stack.set_local(2, Value::I32(9)).unwrap();
        assert_eq!(stack.get_local(2).unwrap(), Value::I32(9));
    }

    #[test]
    fn pop_values_preserves_order() {
        let mut stack = StackManager::new();
        for v in 1..=3 {
            stack.push_value(Value::I32(v));
        }
        let popped = stack.pop_values(2).unwrap();
        assert_eq!(popped, [Value::I32(2), Value::I32(3)]);
        assert_eq!(stack.value_height(), 1);
    }

    #[test]
    fn label_lookup_by_depth() {
        let mut stack = StackManager::new();
        for continuation in [10, 20] {
            stack.push_label(Label {
                arity: 0,
                continuation,
                kind: LabelKind::Block,
                value_base: 0,
            });
        }
        assert_eq!(stack.label(0).unwrap().continuation, 20);
        assert_eq!(stack.label(1).unwrap().continuation, 10);
        assert!(stack.label(2).is_err());
        stack.drop_labels(1).unwrap();
        assert_eq!(stack.label_height(), 0);
    }
}
