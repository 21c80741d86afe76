use crate::error::RuntimeError;
use crate::opcode::{instruction::*, OpCode};
use memory::{Closure, Scope, Value};

use super::stack::StackOps;

/// Trait for global variable instruction handlers.
///
/// Globals live in the scope object the running closure is linked to.
pub trait GlobalOps {
    fn handle_globals(
        &mut self,
        op: OpCode,
        instruction: u32,
        base: usize,
        closure: Closure,
    ) -> Result<(), RuntimeError>;
}

impl GlobalOps for super::vm::VM {
    fn handle_globals(
        &mut self,
        op: OpCode,
        instruction: u32,
        base: usize,
        closure: Closure,
    ) -> Result<(), RuntimeError> {
        let a = decode_a(instruction) as usize;
        let bx = decode_bx(instruction) as usize;

        let name = match self.constant(closure.function, bx)? {
            Value::String(h) => self
                .heap
                .get_string(h)
                .cloned()
                .ok_or_else(|| RuntimeError::InvalidOperand("bad string handle".into()))?,
            _ => {
                return Err(RuntimeError::InvalidOperand(
                    "global name must be a string constant".into(),
                ));
            }
        };

        let scope_handle = closure.parent.ok_or_else(|| {
            let fname = self
                .heap
                .get_function(closure.function)
                .map(|f| f.name.clone())
                .unwrap_or_default();
            RuntimeError::UnboundScope(fname)
        })?;

        match op {
            OpCode::DefGlobal => {
                let val = self.get_reg(base, a)?;
                scope_mut(&mut self.heap, scope_handle)?.define(&name, val, true);
            }

            OpCode::DeclGlobal => {
                let scope = scope_mut(&mut self.heap, scope_handle)?;
                if !scope.contains(&name) {
                    scope.define(&name, Value::undefined(), true);
                }
            }

            OpCode::GetGlobal => {
                let val = self
                    .heap
                    .get_scope(scope_handle)
                    .ok_or_else(|| RuntimeError::InvalidOperand("bad scope handle".into()))?
                    .get(&name)
                    .ok_or(RuntimeError::ReferenceError(name))?;
                self.set_reg(base, a, val)?;
            }

            OpCode::SetGlobal => {
                let val = self.get_reg(base, a)?;
                let scope = scope_mut(&mut self.heap, scope_handle)?;
                // Assignment keeps the binding's enumerability; an unbound
                // name becomes a new enumerable global.
                let enumerable = scope.binding(&name).map_or(true, |b| b.enumerable);
                scope.define(&name, val, enumerable);
            }

            _ => unreachable!(),
        }

        Ok(())
    }
}

fn scope_mut(heap: &mut memory::Heap, handle: u32) -> Result<&mut Scope, RuntimeError> {
    heap.get_scope_mut(handle)
        .ok_or_else(|| RuntimeError::InvalidOperand("bad scope handle".into()))
}
