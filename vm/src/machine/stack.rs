use crate::error::RuntimeError;
use memory::Value;

/// Trait for stack operations (registers)
pub trait StackOps {
    fn get_reg(&self, base: usize, reg: usize) -> Result<Value, RuntimeError>;
    fn set_reg(&mut self, base: usize, reg: usize, val: Value) -> Result<(), RuntimeError>;
}

impl StackOps for super::vm::VM {
    #[inline(always)]
    fn get_reg(&self, base: usize, reg: usize) -> Result<Value, RuntimeError> {
        self.stack
            .get(base + reg)
            .copied()
            .ok_or(RuntimeError::StackOverflow)
    }

    #[inline(always)]
    fn set_reg(&mut self, base: usize, reg: usize, val: Value) -> Result<(), RuntimeError> {
        let slot = self
            .stack
            .get_mut(base + reg)
            .ok_or(RuntimeError::StackOverflow)?;
        *slot = val;
        Ok(())
    }
}
