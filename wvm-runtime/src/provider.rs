//! The instruction provider: the engine's view of "the current
//! instruction sequence and a cursor into it".
//!
//! Each call pushes the callee's body; returns pop it. Branches mutate
//! the cursor to the continuation recorded on the target label.
//! Instantiation resets the provider, dropping any stale state from an
//! earlier invocation.

use wvm_error::{codes, Error, Result};
use wvm_format::Instruction;

use crate::prelude::{Arc, Vec};

/// One body being executed.
#[derive(Debug)]
struct ActiveBody {
    instructions: Arc<[Instruction]>,
    pc: usize,
}

/// The stack of bodies matching the frame stack, with a cursor each.
#[derive(Debug, Default)]
pub struct InstructionProvider {
    bodies: Vec<ActiveBody>,
}

impl InstructionProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all cached bodies and cursors.
    pub fn reset(&mut self) {
        self.bodies.clear();
    }

    /// Enter a body at its first instruction.
    pub fn push_body(&mut self, instructions: Arc<[Instruction]>) {
        self.bodies.push(ActiveBody {
            instructions,
            pc: 0,
        });
    }

    /// Leave the current body.
    pub fn pop_body(&mut self) -> Result<()> {
        self.bodies
            .pop()
            .map(|_| ())
            .ok_or_else(|| provider_error("no active body"))
    }

    /// Current cursor position in the active body.
    pub fn pc(&self) -> Result<usize> {
        Ok(self.active()?.pc)
    }

    /// Move the cursor (branch continuation).
    pub fn set_pc(&mut self, pc: usize) -> Result<()> {
        self.active_mut()?.pc = pc;
        Ok(())
    }

    /// Length of the active body.
    pub fn body_len(&self) -> Result<usize> {
        Ok(self.active()?.instructions.len())
    }

    /// Fetch the instruction under the cursor and advance past it.
    /// Returns `None` at the end of the body.
    pub fn fetch(&mut self) -> Result<Option<Instruction>> {
        let body = self.active_mut()?;
        let Some(instruction) = body.instructions.get(body.pc) else {
            return Ok(None);
        };
        body.pc += 1;
        Ok(Some(instruction.clone()))
    }

    /// True when no body is active.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.bodies.is_empty()
    }

    fn active(&self) -> Result<&ActiveBody> {
        self.bodies
            .last()
            .ok_or_else(|| provider_error("no active body"))
    }

    fn active_mut(&mut self) -> Result<&mut ActiveBody> {
        self.bodies
            .last_mut()
            .ok_or_else(|| provider_error("no active body"))
    }

    /// Drop bodies until `depth` remain (trap unwinding).
    pub fn truncate(&mut self, depth: usize) {
        self.bodies.truncate(depth);
    }

    /// Number of active bodies.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.bodies.len()
    }
}

fn provider_error(message: &'static str) -> Error {
    Error::runtime_error(codes::INSTRUCTION_INDEX_OUT_OF_BOUNDS, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_walks_the_body() {
        let body: Arc<[Instruction]> =
            Arc::from([Instruction::Nop, Instruction::End].as_slice());
        let mut provider = InstructionProvider::new();
        provider.push_body(body);
        assert_eq!(provider.fetch().unwrap(), Some(Instruction::Nop));
        assert_eq!(provider.fetch().unwrap(), Some(Instruction::End));
        assert_eq!(provider.fetch().unwrap(), None);
        provider.pop_body().unwrap();
        assert!(provider.is_idle());
    }

    #[test]
    fn set_pc_moves_the_cursor() {
        let body: Arc<[Instruction]> =
            Arc::from([Instruction::Nop, Instruction::Nop, Instruction::End].as_slice());
        let mut provider = InstructionProvider::new();
        provider.push_body(body);
        provider.set_pc(2).unwrap();
        assert_eq!(provider.fetch().unwrap(), Some(Instruction::End));
    }
}
