use crate::error::RuntimeError;
use crate::opcode::{instruction::*, OpCode};
use memory::{Closure, Value};

use super::stack::StackOps;

/// Trait for call, return and closure-creation handlers
pub trait ControlFlowOps {
    /// Returns `Some(value)` once the frame `interpret` was entered with
    /// has returned.
    fn handle_control(
        &mut self,
        op: OpCode,
        instruction: u32,
        base: usize,
        closure: Closure,
        entry_depth: usize,
    ) -> Result<Option<Value>, RuntimeError>;

    fn call_native(&mut self, handle: u32, args: &[Value]) -> Result<Value, RuntimeError>;
}

impl ControlFlowOps for super::vm::VM {
    fn handle_control(
        &mut self,
        op: OpCode,
        instruction: u32,
        base: usize,
        closure: Closure,
        entry_depth: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        match op {
            OpCode::Call => {
                let a = decode_a(instruction) as usize;
                let b = decode_b(instruction) as usize;
                let c = decode_c(instruction) as usize;

                let callee = self.get_reg(base, b)?;
                let mut args = Vec::with_capacity(c);
                for i in 0..c {
                    args.push(self.get_reg(base, b + 1 + i)?);
                }

                match callee {
                    Value::Native(handle) => {
                        let res = self.call_native(handle, &args)?;
                        self.set_reg(base, a, res)?;
                    }
                    Value::Closure(handle) => {
                        self.enter_closure(handle, &args, base + a)?;
                    }
                    other => {
                        return Err(RuntimeError::TypeError(format!(
                            "{} is not a function",
                            self.display_string(other)
                        )));
                    }
                }
            }

            OpCode::Return => {
                let a = decode_a(instruction) as usize;
                let b = decode_b(instruction);
                let value = if b == 1 {
                    self.get_reg(base, a)?
                } else {
                    Value::undefined()
                };
                return self.finish_frame(value, entry_depth);
            }

            OpCode::Closure => {
                let a = decode_a(instruction) as usize;
                let bx = decode_bx(instruction) as usize;
                let proto = self
                    .heap
                    .get_function(closure.function)
                    .and_then(|f| f.protos.get(bx).copied())
                    .ok_or_else(|| RuntimeError::InvalidOperand(format!("prototype index {bx}")))?;
                // Nested functions resolve globals through the same scope
                let handle = self.new_closure(proto, closure.parent);
                self.set_reg(base, a, Value::closure(handle))?;
            }

            _ => unreachable!(),
        }

        Ok(None)
    }

    fn call_native(&mut self, handle: u32, args: &[Value]) -> Result<Value, RuntimeError> {
        let (func, arity, name) = {
            let n = self
                .natives
                .get(handle as usize)
                .ok_or(RuntimeError::FunctionNotFound)?;
            (n.func, n.arity, n.name.clone())
        };

        if let Some(expected) = arity.filter(|n| *n != args.len()) {
            return Err(RuntimeError::TypeError(format!(
                "{name} expects {expected} argument(s), got {}",
                args.len()
            )));
        }

        func(self, args)
    }
}
